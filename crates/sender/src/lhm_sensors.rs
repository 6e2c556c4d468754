//! Sensores detalhados via LibreHardwareMonitor WMI.
//!
//! Quando o LHM roda como admin ou serviço Windows, ele expõe **todos** os
//! sensores de hardware via WMI em `root\LibreHardwareMonitor`. O próprio
//! serviço atualiza os valores; não há refresh do nosso lado.
//!
//! ## Instalação do LHM como serviço
//! 1. Baixe LibreHardwareMonitor: <https://github.com/LibreHardwareMonitor/LibreHardwareMonitor>
//! 2. Execute como admin → Options → "Run On Windows Startup"
//!    **OU** instale como serviço via `sc create` / tarefa agendada.

use crate::provider::{Device, DeviceKind, ProviderError, Sensor, SensorKind};
use serde::Deserialize;
use tracing::debug;
use wmi::{COMLibrary, WMIConnection};

const NAMESPACE: &str = "root\\LibreHardwareMonitor";

// ──────────────────────────────────────────────
// WMI structs de deserialização
// ──────────────────────────────────────────────

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct LhmSensor {
    sensor_type: String,
    value: f32,
    name: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct LhmHardware {
    identifier: String,
    name: String,
    hardware_type: String,
}

// ──────────────────────────────────────────────
// API pública
// ──────────────────────────────────────────────

/// Fonte LHM. Conexões WMI são abertas por consulta, já que a conexão COM
/// pertence à thread que a criou.
pub struct LhmSource;

impl LhmSource {
    /// Retorna a fonte se o namespace do LHM estiver acessível e com dados.
    pub fn try_new() -> Option<Self> {
        let source = LhmSource;
        match source.query_hardware() {
            Ok(hw) if !hw.is_empty() => {
                debug!("LHM WMI: {} dispositivos", hw.len());
                Some(source)
            }
            Ok(_) => None,
            Err(e) => {
                debug!("LHM WMI indisponível: {e}");
                None
            }
        }
    }

    /// Identificadores LHM começam com `/` (ex: `/amdcpu/0`, `/gpu-nvidia/0`).
    pub fn owns(id: &str) -> bool {
        id.starts_with('/')
    }

    pub fn devices(&self) -> Result<Vec<Device>, ProviderError> {
        Ok(self
            .query_hardware()?
            .into_iter()
            .map(|h| Device {
                kind: hardware_kind(&h.hardware_type),
                name: h.name,
                id: h.identifier,
            })
            .collect())
    }

    pub fn sensors(&self, id: &str) -> Result<Vec<Sensor>, ProviderError> {
        let query = format!(
            "SELECT SensorType, Value, Name FROM Sensor WHERE Parent = '{}'",
            id.replace('\'', "")
        );
        let sensors: Vec<LhmSensor> = connect()?
            .raw_query(&query)
            .map_err(|e| ProviderError::Query(format!("LHM Sensor query: {e}")))?;

        Ok(sensors
            .into_iter()
            .map(|s| Sensor {
                kind: sensor_kind(&s.sensor_type),
                name: s.name,
                value: Some(s.value),
            })
            .collect())
    }

    fn query_hardware(&self) -> Result<Vec<LhmHardware>, ProviderError> {
        connect()?
            .raw_query("SELECT Identifier, Name, HardwareType FROM Hardware")
            .map_err(|e| ProviderError::Query(format!("LHM Hardware query: {e}")))
    }
}

fn connect() -> Result<WMIConnection, ProviderError> {
    let com = COMLibrary::new()
        .or_else(|_| COMLibrary::without_security())
        .map_err(|e| ProviderError::Query(format!("COM: {e}")))?;
    WMIConnection::with_namespace_path(NAMESPACE, com)
        .map_err(|e| ProviderError::Query(format!("WMI {NAMESPACE}: {e}")))
}

fn hardware_kind(hardware_type: &str) -> DeviceKind {
    match hardware_type {
        "Cpu" => DeviceKind::Cpu,
        "GpuNvidia" => DeviceKind::GpuNvidia,
        "GpuAmd" => DeviceKind::GpuAmd,
        "GpuIntel" => DeviceKind::GpuIntel,
        "Motherboard" | "SuperIO" | "EmbeddedController" => DeviceKind::Motherboard,
        "Storage" => DeviceKind::Storage,
        _ => DeviceKind::Other,
    }
}

fn sensor_kind(sensor_type: &str) -> SensorKind {
    match sensor_type {
        "Temperature" => SensorKind::Temperature,
        "Fan" => SensorKind::Fan,
        _ => SensorKind::Other,
    }
}
