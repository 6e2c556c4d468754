//! Leitor de temperatura por categoria de hardware.
//!
//! Escolhe o primeiro dispositivo da categoria (CPU, ou a primeira GPU
//! NVIDIA/AMD), atualiza seus valores e seleciona um sensor de temperatura:
//!
//! - sem preferências: o primeiro sensor de temperatura;
//! - com preferências: o primeiro sensor cujo nome contém alguma das
//!   substrings (ex: `"Core"`, `"Tdie"` para preferir core/die ao package).
//!   Se nenhum casar, a leitura é ausente. Não há fallback para "qualquer
//!   sensor".
//!
//! Dispositivo ou sensor ausente resulta em `Ok(None)`; só falhas do
//! provedor viram erro.

use crate::provider::{Device, DeviceKind, HardwareProvider, ProviderError, Sensor, SensorKind};
use std::sync::Arc;
use thermo_core::{HardwareCategory, MonitorConfig, SensorReading};
use tracing::{debug, info, warn};

/// Sensores de temperatura de um dispositivo.
#[derive(Debug, Clone)]
pub struct DeviceTemperatures {
    pub device: Device,
    pub sensors: Vec<Sensor>,
}

/// Leitor de temperatura. Barato de clonar: o provedor é compartilhado.
pub struct SensorReader<P> {
    provider: Arc<P>,
    cpu_preferences: Arc<[String]>,
    gpu_preferences: Arc<[String]>,
}

impl<P> Clone for SensorReader<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            cpu_preferences: Arc::clone(&self.cpu_preferences),
            gpu_preferences: Arc::clone(&self.gpu_preferences),
        }
    }
}

impl<P: HardwareProvider> SensorReader<P> {
    pub fn new(provider: Arc<P>, config: &MonitorConfig) -> Self {
        Self {
            provider,
            cpu_preferences: config.cpu_sensor_preferences.clone().into(),
            gpu_preferences: config.gpu_sensor_preferences.clone().into(),
        }
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    fn preferences(&self, category: HardwareCategory) -> &[String] {
        match category {
            HardwareCategory::Cpu => &self.cpu_preferences,
            HardwareCategory::Gpu => &self.gpu_preferences,
        }
    }

    /// Lê a temperatura atual da categoria.
    ///
    /// Chamada síncrona e potencialmente bloqueante.
    pub fn read_temperature(
        &self,
        category: HardwareCategory,
    ) -> Result<Option<SensorReading>, ProviderError> {
        let Some(device) = self
            .provider
            .devices()?
            .into_iter()
            .find(|d| matches_category(d.kind, category))
        else {
            debug!("{category}: nenhum dispositivo encontrado");
            return Ok(None);
        };

        self.provider.refresh(&device)?;
        let sensors = self.provider.sensors(&device)?;

        let Some(sensor) = select_sensor(&sensors, self.preferences(category)) else {
            debug!("{category}: nenhum sensor de temperatura em {}", device.name);
            return Ok(None);
        };

        let reading = SensorReading::from_raw(category, sensor.name.as_str(), sensor.value);
        if !reading.present {
            debug!("{category}: sensor {} sem valor", sensor.name);
            return Ok(None);
        }

        Ok(Some(reading))
    }

    /// Atualiza todos os dispositivos e lista seus sensores de temperatura.
    ///
    /// Falhas em um dispositivo são logadas e o dispositivo aparece sem sensores.
    pub fn temperature_inventory(&self) -> Result<Vec<DeviceTemperatures>, ProviderError> {
        let devices = self.provider.devices()?;
        let mut inventory = Vec::with_capacity(devices.len());

        for device in devices {
            let sensors = self
                .provider
                .refresh(&device)
                .and_then(|()| self.provider.sensors(&device));

            let sensors = match sensors {
                Ok(all) => all
                    .into_iter()
                    .filter(|s| s.kind == SensorKind::Temperature)
                    .collect(),
                Err(e) => {
                    warn!("Falha ao ler sensores de {}: {e}", device.name);
                    Vec::new()
                }
            };

            inventory.push(DeviceTemperatures { device, sensors });
        }

        Ok(inventory)
    }

    /// Loga todos os sensores de temperatura disponíveis (diagnóstico).
    pub fn log_inventory(&self) {
        match self.temperature_inventory() {
            Ok(inventory) => {
                info!("Sensores de temperatura disponíveis:");
                for entry in &inventory {
                    info!("{}: {}", entry.device.kind, entry.device.name);
                    if entry.sensors.is_empty() {
                        info!("  - Nenhum sensor de temperatura");
                    }
                    for s in &entry.sensors {
                        match s.value {
                            Some(v) => info!("  - {}: {v:.1}°C", s.name),
                            None => info!("  - {}: sem valor", s.name),
                        }
                    }
                }
            }
            Err(e) => warn!("Não foi possível listar sensores: {e}"),
        }
    }
}

/// O tipo de dispositivo atende à categoria?
pub fn matches_category(kind: DeviceKind, category: HardwareCategory) -> bool {
    match category {
        HardwareCategory::Cpu => kind == DeviceKind::Cpu,
        HardwareCategory::Gpu => matches!(kind, DeviceKind::GpuNvidia | DeviceKind::GpuAmd),
    }
}

/// Seleciona o sensor de temperatura conforme as preferências.
pub fn select_sensor<'a>(sensors: &'a [Sensor], preferences: &[String]) -> Option<&'a Sensor> {
    let mut temps = sensors.iter().filter(|s| s.kind == SensorKind::Temperature);

    if preferences.is_empty() {
        return temps.next();
    }

    temps.find(|s| preferences.iter().any(|p| s.name.contains(p.as_str())))
}
