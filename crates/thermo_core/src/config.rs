//! Configuração unificada via TOML.
//!
//! Um único `config.toml` ao lado do executável. Todas as tabelas usam
//! `#[serde(default)]`, então arquivos parciais funcionam.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::types::HardwareCategory;

/// Erros ao persistir a configuração.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Erro de serialização TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Erro de I/O em {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuração do loop de monitoramento.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    /// Intervalo entre ciclos de polling (ms). 0 = sem espera.
    pub poll_interval_ms: u64,
    /// Substrings preferidas no nome do sensor de CPU (vazio = primeiro sensor)
    pub cpu_sensor_preferences: Vec<String>,
    /// Substrings preferidas no nome do sensor de GPU (vazio = primeiro sensor)
    pub gpu_sensor_preferences: Vec<String>,
    /// Lista todos os sensores de temperatura na inicialização
    pub list_sensors_on_startup: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10_000,
            cpu_sensor_preferences: vec!["Core".into(), "Tdie".into()],
            gpu_sensor_preferences: Vec::new(),
            list_sensors_on_startup: true,
        }
    }
}

impl MonitorConfig {
    /// Preferências de nome de sensor para a categoria.
    pub fn preferences_for(&self, category: HardwareCategory) -> &[String] {
        match category {
            HardwareCategory::Cpu => &self.cpu_sensor_preferences,
            HardwareCategory::Gpu => &self.gpu_sensor_preferences,
        }
    }
}

/// Configuração da porta serial (display do microcontrolador).
///
/// 8 data bits, sem paridade e 1 stop bit são fixos.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SerialConfig {
    /// Nome/caminho da porta (ex: "COM3", "/dev/ttyACM0")
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Timeout de escrita (ms)
    pub write_timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_port().into(),
            baud_rate: 115_200,
            write_timeout_ms: 1_000,
        }
    }
}

#[cfg(windows)]
fn default_port() -> &'static str {
    "COM3"
}

#[cfg(not(windows))]
fn default_port() -> &'static str {
    "/dev/ttyACM0"
}

/// Configuração raiz do aplicativo.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub monitor: MonitorConfig,
    pub serial: SerialConfig,
}

impl AppConfig {
    /// Carrega configuração de um arquivo TOML.
    ///
    /// Arquivo ausente ou inválido resulta na configuração padrão.
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str::<AppConfig>(&content) {
                    Ok(config) => {
                        info!("Configuração carregada de {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        warn!("Erro ao parsear {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    warn!("Erro ao ler {}: {}", path.display(), e);
                }
            }
        }

        info!("Usando configuração padrão");
        AppConfig::default()
    }

    /// Salva configuração em arquivo TOML.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Configuração salva em {}", path.display());
        Ok(())
    }

    /// Retorna o caminho padrão do config.toml.
    pub fn default_path() -> PathBuf {
        let exe_dir = std::env::current_exe()
            .map(|p| p.parent().unwrap_or(Path::new(".")).to_path_buf())
            .unwrap_or_else(|_| PathBuf::from("."));
        exe_dir.join("config.toml")
    }

    /// Valida a configuração e retorna lista de erros.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.serial.port.trim().is_empty() {
            errors.push("Porta serial não pode ser vazia".into());
        }
        if self.serial.baud_rate == 0 {
            errors.push("Baud rate não pode ser 0".into());
        }
        if self.serial.write_timeout_ms == 0 {
            errors.push("Timeout de escrita não pode ser 0".into());
        }

        for category in [HardwareCategory::Cpu, HardwareCategory::Gpu] {
            if self
                .monitor
                .preferences_for(category)
                .iter()
                .any(|p| p.is_empty())
            {
                errors.push(format!("Preferência vazia na lista de sensores de {category}"));
            }
        }

        errors
    }
}
