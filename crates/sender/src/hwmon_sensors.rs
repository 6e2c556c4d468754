//! Sensores de temperatura via `sysinfo` (hwmon no Linux, SMC no macOS).
//!
//! O sysinfo entrega uma lista plana de components com rótulos no formato
//! `"<chip> <sensor>"` (ex: `"k10temp Tctl"`, `"amdgpu edge"`). Os components
//! são agrupados por chip para formar os dispositivos. A temperatura de
//! controle da CPU AMD (`Tctl`/`Tdie`) recebe o mesmo nome do LHM,
//! `"Core (Tctl/Tdie)"`, para valer as mesmas preferências nos dois sistemas.

use crate::provider::{Device, DeviceKind, Sensor};
use parking_lot::Mutex;
use sysinfo::Components;
use tracing::debug;

/// Prefixo do identificador dos dispositivos desta fonte.
const ID_PREFIX: &str = "hwmon/";

/// Fonte de sensores baseada em `sysinfo::Components`.
pub struct HwmonSource {
    components: Mutex<Components>,
}

impl HwmonSource {
    pub fn new() -> Self {
        let components = Components::new_with_refreshed_list();
        debug!("hwmon: {} components", components.list().len());
        Self {
            components: Mutex::new(components),
        }
    }

    /// Dispositivos agrupados por chip, na ordem em que aparecem.
    pub fn devices(&self) -> Vec<Device> {
        let components = self.components.lock();
        let mut devices: Vec<Device> = Vec::new();

        for comp in components.list() {
            let (chip, _) = split_label(comp.label());
            if devices.iter().any(|d| d.name == chip) {
                continue;
            }
            devices.push(Device {
                kind: classify_chip(chip),
                name: chip.to_string(),
                id: format!("{ID_PREFIX}{chip}"),
            });
        }

        devices
    }

    /// Verifica se o identificador pertence a esta fonte.
    pub fn owns(id: &str) -> bool {
        id.starts_with(ID_PREFIX)
    }

    /// Atualiza todos os components (o sysinfo não atualiza por chip).
    pub fn refresh(&self) {
        self.components.lock().refresh(false);
    }

    /// Sensores do chip identificado por `id`.
    pub fn sensors(&self, id: &str) -> Vec<Sensor> {
        let chip = id.strip_prefix(ID_PREFIX).unwrap_or(id);
        self.components
            .lock()
            .list()
            .iter()
            .filter_map(|comp| {
                let (c, name) = split_label(comp.label());
                (c == chip)
                    .then(|| Sensor::temperature(sensor_name(c, name), comp.temperature()))
            })
            .collect()
    }

    /// Descarta a lista de components.
    pub fn close(&self) {
        *self.components.lock() = Components::new();
    }
}

// ──────────────────────────────────────────────
// Helpers de classificação
// ──────────────────────────────────────────────

/// Separa `"<chip> <sensor>"`. Rótulos sem espaço viram chip e sensor.
pub(crate) fn split_label(label: &str) -> (&str, &str) {
    match label.split_once(' ') {
        Some((chip, sensor)) if !sensor.trim().is_empty() => (chip, sensor.trim()),
        _ => (label, label),
    }
}

/// Nome exposto para o sensor `name` do chip `chip`.
pub(crate) fn sensor_name(chip: &str, name: &str) -> String {
    match name {
        "Tctl" | "Tdie" if classify_chip(chip) == DeviceKind::Cpu => "Core (Tctl/Tdie)".into(),
        _ => name.to_string(),
    }
}

/// Classifica o chip hwmon pelo nome do driver.
pub(crate) fn classify_chip(chip: &str) -> DeviceKind {
    let c = chip.to_lowercase();
    match c.as_str() {
        "coretemp" | "k10temp" | "k8temp" | "zenpower" | "cpu_thermal" | "cpu" => DeviceKind::Cpu,
        "amdgpu" | "radeon" => DeviceKind::GpuAmd,
        "nouveau" | "nvidia" => DeviceKind::GpuNvidia,
        "i915" | "xe" => DeviceKind::GpuIntel,
        "nvme" | "drivetemp" => DeviceKind::Storage,
        "acpitz" | "pch_cannonlake" | "pch_skylake" => DeviceKind::Motherboard,
        _ if c.starts_with("nct") || c.starts_with("it87") || c.starts_with("asus") => {
            DeviceKind::Motherboard
        }
        _ => DeviceKind::Other,
    }
}
