//! Linha de comando.

use clap::Parser;
use std::path::PathBuf;
use thermo_core::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "thermo_sender")]
#[command(version)]
#[command(about = "ThermoDisplay Sender – envia temperaturas de CPU/GPU para o display serial")]
#[command(long_about = "ThermoDisplay Sender – envia temperaturas de CPU/GPU para o display serial

Envia uma linha `CPU:<c>,GPU:<g>` por ciclo, 115200 baud 8N1.

EXEMPLOS:
    thermo_sender                          Usa config.toml ao lado do executável
    thermo_sender --port /dev/ttyUSB0      Sobrescreve a porta
    thermo_sender --list-ports             Lista portas seriais e sai
    thermo_sender --list-sensors           Lista sensores de temperatura e sai

VARIÁVEIS DE AMBIENTE:
    RUST_LOG=debug         Logs detalhados (leituras ausentes, fontes de sensores)")]
pub struct Cli {
    /// Caminho do config.toml
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Porta serial (sobrescreve o config)
    #[arg(long, short)]
    pub port: Option<String>,

    /// Intervalo entre ciclos em ms (sobrescreve o config)
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Lista as portas seriais detectadas e sai
    #[arg(long)]
    pub list_ports: bool,

    /// Lista os sensores de temperatura e sai
    #[arg(long)]
    pub list_sensors: bool,
}

impl Cli {
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(AppConfig::default_path)
    }

    /// Aplica os overrides da linha de comando.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(ref port) = self.port {
            config.serial.port = port.clone();
        }
        if let Some(ms) = self.interval_ms {
            config.monitor.poll_interval_ms = ms;
        }
    }
}
