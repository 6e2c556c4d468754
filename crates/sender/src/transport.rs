//! Transporte serial para o microcontrolador do display.
//!
//! Conexão best-effort: se a porta não abrir, o erro e as portas disponíveis
//! são logados uma vez e o transporte segue fechado. Escritas num transporte
//! fechado são no-op. `close` é idempotente e também roda no `Drop`.

use serialport::{DataBits, Parity, SerialPort, StopBits};
use std::io::Write;
use std::time::Duration;
use thermo_core::SerialConfig;
use tracing::{error, info, warn};

/// Erros do transporte.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Falha ao abrir porta serial {address}: {source}")]
    Open {
        address: String,
        #[source]
        source: serialport::Error,
    },

    #[error("Falha ao escrever na porta serial: {0}")]
    Write(#[from] std::io::Error),
}

/// Canal de saída orientado a linhas.
pub trait Transport: Send {
    fn is_open(&self) -> bool;

    /// Escreve a linha inteira. No-op se o transporte estiver fechado.
    fn write_line(&mut self, line: &str) -> Result<(), TransportError>;

    /// Fecha o transporte. Chamadas repetidas não têm efeito.
    fn close(&mut self);
}

/// Porta serial 8N1.
pub struct SerialTransport {
    address: String,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Abre a porta com a configuração dada.
    pub fn open(config: &SerialConfig) -> Result<Self, TransportError> {
        let port = serialport::new(&config.port, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(Duration::from_millis(config.write_timeout_ms))
            .open()
            .map_err(|source| TransportError::Open {
                address: config.port.clone(),
                source,
            })?;

        Ok(Self {
            address: config.port.clone(),
            port: Some(port),
        })
    }

    /// Transporte sem conexão: toda escrita é descartada.
    pub fn disconnected(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            port: None,
        }
    }

    /// Tenta abrir a porta; em caso de falha loga e retorna transporte fechado.
    pub fn connect(config: &SerialConfig) -> Self {
        match Self::open(config) {
            Ok(transport) => {
                info!("Conectado ao display em {} ({} baud)", config.port, config.baud_rate);
                transport
            }
            Err(e) => {
                error!("{e}");
                warn!("Seguindo sem display: as leituras serão apenas logadas");
                Self::disconnected(config.port.clone())
            }
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl Transport for SerialTransport {
    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        let Some(port) = self.port.as_mut() else {
            return Ok(());
        };
        port.write_all(line.as_bytes())?;
        port.flush()?;
        Ok(())
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            info!("Porta serial {} fechada", self.address);
        }
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        self.close();
    }
}

/// Nomes das portas seriais detectáveis no sistema.
pub fn available_ports() -> Vec<String> {
    match serialport::available_ports() {
        Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
        Err(e) => {
            warn!("Falha ao enumerar portas seriais: {e}");
            Vec::new()
        }
    }
}
