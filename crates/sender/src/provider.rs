//! Abstração do provedor de sensores de hardware.
//!
//! O provedor é um colaborador externo: enumera dispositivos, atualiza os
//! valores de um dispositivo e expõe seus sensores. A seleção de sensores
//! fica no [`crate::reader`].

use std::fmt;

/// Erro inesperado do provedor (falha de consulta, driver indisponível…).
///
/// Dispositivo ou sensor ausente **não** é erro.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Consulta ao provedor falhou: {0}")]
    Query(String),

    #[error("Dispositivo {0} não pertence a este provedor")]
    UnknownDevice(String),
}

/// Tipo de dispositivo exposto pelo provedor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Cpu,
    GpuNvidia,
    GpuAmd,
    GpuIntel,
    Motherboard,
    Storage,
    Other,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceKind::Cpu => "Cpu",
            DeviceKind::GpuNvidia => "GpuNvidia",
            DeviceKind::GpuAmd => "GpuAmd",
            DeviceKind::GpuIntel => "GpuIntel",
            DeviceKind::Motherboard => "Motherboard",
            DeviceKind::Storage => "Storage",
            DeviceKind::Other => "Other",
        };
        f.write_str(name)
    }
}

/// Tipo de sensor. Só temperatura é consumida pelo monitor.
// Fan/Other só são produzidos pelo LHM (Windows)
#[cfg_attr(not(windows), allow(dead_code))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Temperature,
    Fan,
    Other,
}

/// Dispositivo de hardware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub kind: DeviceKind,
    /// Nome amigável (ex: "AMD Ryzen 7 5800X", "k10temp")
    pub name: String,
    /// Identificador interno do provedor (ex: "hwmon/k10temp", "/amdcpu/0")
    pub id: String,
}

/// Sensor de um dispositivo.
#[derive(Debug, Clone, PartialEq)]
pub struct Sensor {
    pub kind: SensorKind,
    pub name: String,
    pub value: Option<f32>,
}

impl Sensor {
    pub fn temperature(name: impl Into<String>, value: Option<f32>) -> Self {
        Self {
            kind: SensorKind::Temperature,
            name: name.into(),
            value,
        }
    }
}

/// Capacidade de consultar sensores de hardware.
///
/// `refresh` e `sensors` podem bloquear (chamadas síncronas ao driver);
/// o monitor as executa em threads de bloqueio.
pub trait HardwareProvider: Send + Sync + 'static {
    /// Lista os dispositivos conhecidos, na ordem de prioridade do provedor.
    fn devices(&self) -> Result<Vec<Device>, ProviderError>;

    /// Atualiza os valores dos sensores do dispositivo.
    fn refresh(&self, device: &Device) -> Result<(), ProviderError>;

    /// Sensores do dispositivo com os valores da última atualização.
    fn sensors(&self, device: &Device) -> Result<Vec<Sensor>, ProviderError>;

    /// Libera os recursos do provedor.
    fn close(&self) {}
}

// ──────────────────────────────────────────────
// Provedor fake para testes
// ──────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Provedor em memória com falhas programáveis.
    #[derive(Default)]
    pub struct FakeProvider {
        pub devices: Mutex<Vec<(Device, Vec<Sensor>)>>,
        /// Resultados de `refresh` consumidos em ordem (vazio = Ok)
        pub refresh_faults: Mutex<VecDeque<Option<String>>>,
        /// Duração de cada `refresh` (bloqueia a thread)
        pub refresh_delay: Mutex<Duration>,
        /// `refresh` iniciados
        pub refreshes: AtomicUsize,
        pub closes: AtomicUsize,
        /// "refresh" ao fim de cada atualização, "close" ao fechar
        pub events: Mutex<Vec<&'static str>>,
    }

    impl FakeProvider {
        pub fn with_devices(devices: Vec<(Device, Vec<Sensor>)>) -> Self {
            Self {
                devices: Mutex::new(devices),
                ..Default::default()
            }
        }

        /// CPU e GPU NVIDIA com um sensor de temperatura cada.
        pub fn cpu_and_gpu(cpu: f32, gpu: f32) -> Self {
            Self::with_devices(vec![
                (
                    device(DeviceKind::Cpu, "Test CPU"),
                    vec![Sensor::temperature("Core (Tctl/Tdie)", Some(cpu))],
                ),
                (
                    device(DeviceKind::GpuNvidia, "Test GPU"),
                    vec![Sensor::temperature("GPU Core", Some(gpu))],
                ),
            ])
        }

        pub fn fail_next_refresh(&self, message: &str) {
            self.refresh_faults.lock().push_back(Some(message.to_string()));
        }

        pub fn set_refresh_delay(&self, delay: Duration) {
            *self.refresh_delay.lock() = delay;
        }

        pub fn events(&self) -> Vec<&'static str> {
            self.events.lock().clone()
        }

        pub fn set_value(&self, kind: DeviceKind, value: Option<f32>) {
            for (dev, sensors) in self.devices.lock().iter_mut() {
                if dev.kind == kind {
                    for s in sensors.iter_mut() {
                        s.value = value;
                    }
                }
            }
        }
    }

    pub fn device(kind: DeviceKind, name: &str) -> Device {
        Device {
            kind,
            name: name.to_string(),
            id: format!("fake/{name}"),
        }
    }

    impl HardwareProvider for FakeProvider {
        fn devices(&self) -> Result<Vec<Device>, ProviderError> {
            Ok(self.devices.lock().iter().map(|(d, _)| d.clone()).collect())
        }

        fn refresh(&self, _device: &Device) -> Result<(), ProviderError> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            let delay = *self.refresh_delay.lock();
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
            let result = match self.refresh_faults.lock().pop_front().flatten() {
                Some(msg) => Err(ProviderError::Query(msg)),
                None => Ok(()),
            };
            self.events.lock().push("refresh");
            result
        }

        fn sensors(&self, device: &Device) -> Result<Vec<Sensor>, ProviderError> {
            self.devices
                .lock()
                .iter()
                .find(|(d, _)| d.id == device.id)
                .map(|(_, s)| s.clone())
                .ok_or_else(|| ProviderError::UnknownDevice(device.id.clone()))
        }

        fn close(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
            self.events.lock().push("close");
        }
    }
}
