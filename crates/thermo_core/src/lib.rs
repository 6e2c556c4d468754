//! # Thermo Core
//!
//! Crate compartilhada que define os tipos de leitura, o protocolo de linha
//! serial e a configuração TOML do ThermoDisplay.
//!
//! ## Módulos
//! - [`types`] – Categoria de hardware e leitura de temperatura
//! - [`protocol`] – Formato de linha `CPU:<c>,GPU:<g>\n`
//! - [`config`] – Configuração unificada via TOML

pub mod types;
pub mod protocol;
pub mod config;

// Re-exports convenientes
pub use types::{HardwareCategory, SensorReading};
pub use protocol::{format_line, line_from_readings, parse_line, ProtocolError, TemperatureLine};
pub use config::{AppConfig, ConfigError, MonitorConfig, SerialConfig};
