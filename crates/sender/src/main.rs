//! # ThermoDisplay Sender
//!
//! Lê temperaturas de CPU e GPU e envia via porta serial para o display
//! do microcontrolador. No Windows, sensores completos exigem o
//! LibreHardwareMonitor rodando como admin/serviço.
//!
//! ## Uso
//! ```bash
//! thermo_sender                       # Usa config.toml ao lado do executável
//! thermo_sender --port /dev/ttyUSB0   # Sobrescreve a porta
//! thermo_sender --list-sensors        # Diagnóstico de sensores
//! ```

mod cli;
mod host;
mod hwmon_sensors;
#[cfg(windows)]
mod lhm_sensors;
mod monitor;
mod nvml_gpu;
mod provider;
mod reader;
mod transport;

use clap::Parser;
use cli::Cli;
use host::HostProvider;
use monitor::{Monitor, MonitorHandle};
use provider::HardwareProvider;
use reader::SensorReader;
use std::process::ExitCode;
use std::sync::Arc;
use thermo_core::AppConfig;
use tracing::{error, info, warn};
use transport::SerialTransport;

#[tokio::main]
async fn main() -> ExitCode {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    if cli.list_ports {
        print_ports();
        return ExitCode::SUCCESS;
    }

    // ── Carregar config ──
    let config_path = cli.config_path();
    let mut config = AppConfig::load(&config_path);

    // Salva config padrão se não existir
    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("Não foi possível salvar config padrão: {e}");
        }
    }

    cli.apply(&mut config);

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!("Configuração inválida: {e}");
        }
        return ExitCode::FAILURE;
    }

    // ── Provedor de sensores ──
    let provider = Arc::new(HostProvider::new());
    let reader = SensorReader::new(Arc::clone(&provider), &config.monitor);

    if cli.list_sensors {
        print_sensors(&reader);
        provider.close();
        return ExitCode::SUCCESS;
    }

    if config.monitor.list_sensors_on_startup {
        reader.log_inventory();
    }

    // ── Porta serial ──
    let ports = transport::available_ports();
    info!("Portas seriais disponíveis: {}", display_list(&ports));
    let transport = SerialTransport::connect(&config.serial);

    // ── Banner ──
    println!();
    println!("══════════════════════════════════════════════");
    println!("   🌡  THERMODISPLAY SENDER – ATIVO (Rust)");
    println!("══════════════════════════════════════════════");
    println!("  Porta:     {} ({} baud, 8N1)", transport.address(), config.serial.baud_rate);
    println!("  Intervalo: {} ms", config.monitor.poll_interval_ms);
    println!("  Ctrl+C para sair");
    println!("══════════════════════════════════════════════");
    println!();

    // ── Loop principal ──
    let handle = MonitorHandle::spawn(Monitor::new(reader, transport, &config.monitor));

    let signal = shutdown_signal().await;
    if let Err(ref e) = signal {
        error!("Falha ao instalar handler de sinal: {e}");
    }

    info!("Encerrando...");
    match handle.stop().await {
        Ok(stats) => info!(
            "Encerrado: {} ciclos, {} linhas, {} sem leitura, {} falhas",
            stats.cycles, stats.lines_sent, stats.skipped, stats.faults
        ),
        Err(e) => error!("Loop de monitoramento terminou com erro: {e}"),
    }

    match signal {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

/// Espera Ctrl+C (e SIGTERM no Unix).
async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result,
            _ = terminate.recv() => Ok(()),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}

fn print_ports() {
    let ports = transport::available_ports();
    if ports.is_empty() {
        println!("Nenhuma porta serial encontrada");
    }
    for p in ports {
        println!("{p}");
    }
}

fn print_sensors(reader: &SensorReader<HostProvider>) {
    let inventory = match reader.temperature_inventory() {
        Ok(inv) => inv,
        Err(e) => {
            error!("Não foi possível listar sensores: {e}");
            return;
        }
    };

    println!("Sensores de temperatura disponíveis:");
    println!("-----------------------------------");
    for entry in inventory {
        println!("\n{}: {}", entry.device.kind, entry.device.name);
        if entry.sensors.is_empty() {
            println!("- Nenhum sensor de temperatura");
        }
        for s in entry.sensors {
            match s.value {
                Some(v) => println!("- {}: {v:.1}°C", s.name),
                None => println!("- {}: sem valor", s.name),
            }
        }
    }
}

fn display_list(items: &[String]) -> String {
    if items.is_empty() {
        "(nenhuma)".into()
    } else {
        items.join(", ")
    }
}
