//! NVIDIA GPU via NVML (nvidia-ml).
//!
//! Carrega `nvml.dll` / `libnvidia-ml.so` dinamicamente — funciona com
//! qualquer driver NVIDIA. Sem GPU NVIDIA? `try_new()` retorna `None`.

use crate::provider::{Device, DeviceKind, ProviderError, Sensor};
use nvml_wrapper::Nvml;
use nvml_wrapper::enum_wrappers::device::TemperatureSensor;
use tracing::{debug, info};

const ID_PREFIX: &str = "nvml/";

/// Nome do único sensor exposto por GPU.
pub const CORE_SENSOR: &str = "GPU Core";

/// GPUs NVIDIA via NVML.
pub struct NvmlMonitor {
    nvml: Nvml,
    count: u32,
}

impl NvmlMonitor {
    /// Tenta inicializar NVML. Retorna `None` se não houver GPU NVIDIA.
    pub fn try_new() -> Option<Self> {
        match Nvml::init() {
            Ok(nvml) => {
                let count = nvml.device_count().unwrap_or(0);
                if count > 0 {
                    if let Ok(dev) = nvml.device_by_index(0) {
                        let name = dev.name().unwrap_or_else(|_| "Unknown".into());
                        info!("✓ NVML: {name} ({count} GPU(s))");
                    } else {
                        info!("✓ NVML: {count} GPU(s) NVIDIA");
                    }
                    Some(Self { nvml, count })
                } else {
                    debug!("NVML init OK mas nenhuma GPU encontrada");
                    None
                }
            }
            Err(e) => {
                debug!("NVML não disponível: {e}");
                None
            }
        }
    }

    pub fn owns(id: &str) -> bool {
        id.starts_with(ID_PREFIX)
    }

    pub fn devices(&self) -> Vec<Device> {
        (0..self.count)
            .map(|index| {
                let name = self
                    .nvml
                    .device_by_index(index)
                    .and_then(|d| d.name())
                    .unwrap_or_else(|_| format!("NVIDIA GPU #{index}"));
                Device {
                    kind: DeviceKind::GpuNvidia,
                    name,
                    id: format!("{ID_PREFIX}{index}"),
                }
            })
            .collect()
    }

    /// Temperatura do core. NVML lê valores ao vivo, não há refresh.
    pub fn sensors(&self, id: &str) -> Result<Vec<Sensor>, ProviderError> {
        let index: u32 = id
            .strip_prefix(ID_PREFIX)
            .and_then(|i| i.parse().ok())
            .ok_or_else(|| ProviderError::UnknownDevice(id.to_string()))?;

        let device = self
            .nvml
            .device_by_index(index)
            .map_err(|e| ProviderError::Query(format!("NVML device {index}: {e}")))?;

        let temp = match device.temperature(TemperatureSensor::Gpu) {
            Ok(t) => Some(t as f32),
            Err(e) => {
                debug!("NVML temperatura indisponível (GPU {index}): {e}");
                None
            }
        };

        Ok(vec![Sensor::temperature(CORE_SENSOR, temp)])
    }
}
