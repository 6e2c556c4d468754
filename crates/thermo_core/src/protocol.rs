//! Protocolo de linha serial consumido pelo microcontrolador do display.
//!
//! Uma linha ASCII por ciclo de polling, sem checksum nem framing extra:
//!
//! ```text
//! CPU:72.5,GPU:65.3\n
//! ```
//!
//! Cada valor tem exatamente uma casa decimal.

use crate::types::{HardwareCategory, SensorReading};

/// Terminador de linha.
pub const LINE_TERMINATOR: char = '\n';

/// Separador entre os campos CPU e GPU.
const FIELD_SEPARATOR: char = ',';

/// Erros ao interpretar uma linha recebida.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ProtocolError {
    #[error("Linha sem terminador '\\n'")]
    MissingTerminator,

    #[error("Número de campos inválido: {0} (esperado 2)")]
    FieldCount(usize),

    #[error("Campo inválido: {0:?} (esperado {1}:<valor>)")]
    BadField(String, &'static str),

    #[error("Valor numérico inválido: {0:?}")]
    BadNumber(String),
}

/// Par de temperaturas transmitido numa linha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureLine {
    pub cpu: f32,
    pub gpu: f32,
}

/// Formata uma linha do protocolo: `CPU:<c>,GPU:<g>\n`.
pub fn format_line(cpu: f32, gpu: f32) -> String {
    format!("CPU:{cpu:.1},GPU:{gpu:.1}\n")
}

/// Formata a linha a partir de duas leituras.
///
/// Retorna `None` se qualquer uma estiver ausente: nunca se envia linha parcial.
pub fn line_from_readings(cpu: Option<&SensorReading>, gpu: Option<&SensorReading>) -> Option<String> {
    let cpu = cpu.and_then(SensorReading::value)?;
    let gpu = gpu.and_then(SensorReading::value)?;
    Some(format_line(cpu, gpu))
}

/// Interpreta uma linha completa (inclusive o `\n`).
///
/// Aceita `\r\n` também, já que terminais seriais costumam inserir `\r`.
pub fn parse_line(line: &str) -> Result<TemperatureLine, ProtocolError> {
    let body = line
        .strip_suffix(LINE_TERMINATOR)
        .ok_or(ProtocolError::MissingTerminator)?;
    let body = body.strip_suffix('\r').unwrap_or(body);

    let fields: Vec<&str> = body.split(FIELD_SEPARATOR).collect();
    if fields.len() != 2 {
        return Err(ProtocolError::FieldCount(fields.len()));
    }

    Ok(TemperatureLine {
        cpu: parse_field(fields[0], HardwareCategory::Cpu)?,
        gpu: parse_field(fields[1], HardwareCategory::Gpu)?,
    })
}

fn parse_field(field: &str, category: HardwareCategory) -> Result<f32, ProtocolError> {
    let tag = category.tag();
    let value = field
        .strip_prefix(tag)
        .and_then(|rest| rest.strip_prefix(':'))
        .ok_or_else(|| ProtocolError::BadField(field.to_string(), tag))?;

    value
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ProtocolError::BadNumber(value.to_string()))
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
