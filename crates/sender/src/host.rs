//! Provedor do host – combina as fontes de sensores com ordem de prioridade.
//!
//! **Prioridade 1 (Windows):** LibreHardwareMonitor WMI, se o serviço estiver ativo
//! **Prioridade 2:** `sysinfo` components (hwmon / SMC / ACPI)
//! **Prioridade 3:** NVML para GPUs NVIDIA
//!
//! O leitor pega o primeiro dispositivo de cada categoria, então a ordem de
//! [`HostProvider::devices`] define qual fonte vence.

use crate::hwmon_sensors::HwmonSource;
use crate::nvml_gpu::NvmlMonitor;
use crate::provider::{Device, HardwareProvider, ProviderError, Sensor};
use parking_lot::Mutex;
use tracing::{info, warn};

#[cfg(windows)]
use crate::lhm_sensors::LhmSource;

/// Provedor de hardware da máquina local. Recurso explícito, sem estado global.
pub struct HostProvider {
    hwmon: HwmonSource,
    nvml: Mutex<Option<NvmlMonitor>>,
    #[cfg(windows)]
    lhm: Mutex<Option<LhmSource>>,
}

impl HostProvider {
    /// Detecta as fontes disponíveis. Fontes ausentes são apenas logadas.
    pub fn new() -> Self {
        #[cfg(windows)]
        let lhm = {
            let lhm = LhmSource::try_new();
            if lhm.is_some() {
                info!("✓ LHM WMI: disponível");
            } else {
                warn!("✗ LHM WMI: não detectado");
                warn!("  → Para sensores completos de CPU/GPU instale LibreHardwareMonitor");
                warn!("    e rode como admin ou serviço Windows");
            }
            lhm
        };

        let hwmon = HwmonSource::new();
        let nvml = NvmlMonitor::try_new();

        let provider = Self {
            hwmon,
            nvml: Mutex::new(nvml),
            #[cfg(windows)]
            lhm: Mutex::new(lhm),
        };

        match provider.devices() {
            Ok(devs) if devs.is_empty() => warn!("Nenhum dispositivo com sensores detectado"),
            Ok(devs) => info!("Provedor de hardware inicializado ({} dispositivos)", devs.len()),
            Err(e) => warn!("Falha ao enumerar dispositivos: {e}"),
        }

        provider
    }
}

impl HardwareProvider for HostProvider {
    fn devices(&self) -> Result<Vec<Device>, ProviderError> {
        let mut devices = Vec::new();

        #[cfg(windows)]
        if let Some(ref lhm) = *self.lhm.lock() {
            devices.extend(lhm.devices()?);
        }

        devices.extend(self.hwmon.devices());

        if let Some(ref nvml) = *self.nvml.lock() {
            devices.extend(nvml.devices());
        }

        Ok(devices)
    }

    fn refresh(&self, device: &Device) -> Result<(), ProviderError> {
        if HwmonSource::owns(&device.id) {
            self.hwmon.refresh();
        }
        // LHM e NVML entregam valores ao vivo
        Ok(())
    }

    fn sensors(&self, device: &Device) -> Result<Vec<Sensor>, ProviderError> {
        let id = device.id.as_str();

        if HwmonSource::owns(id) {
            return Ok(self.hwmon.sensors(id));
        }

        if NvmlMonitor::owns(id) {
            return match *self.nvml.lock() {
                Some(ref nvml) => nvml.sensors(id),
                None => Err(ProviderError::UnknownDevice(id.to_string())),
            };
        }

        #[cfg(windows)]
        if LhmSource::owns(id) {
            if let Some(ref lhm) = *self.lhm.lock() {
                return lhm.sensors(id);
            }
        }

        Err(ProviderError::UnknownDevice(id.to_string()))
    }

    fn close(&self) {
        self.hwmon.close();
        // Drop do Nvml chama nvmlShutdown
        self.nvml.lock().take();
        #[cfg(windows)]
        self.lhm.lock().take();
        info!("Provedor de hardware fechado");
    }
}
