//! Tipos de dados compartilhados entre o sender e as ferramentas de diagnóstico.
//!
//! Leituras são efêmeras: produzidas a cada ciclo de polling, nunca
//! persistidas e nunca alteradas depois de criadas.

use serde::{Deserialize, Serialize};
use std::fmt;

// ──────────────────────────────────────────────
// Categoria de hardware
// ──────────────────────────────────────────────

/// Classe de hardware monitorada.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HardwareCategory {
    Cpu,
    Gpu,
}

impl HardwareCategory {
    /// Prefixo usado no protocolo serial (`CPU:` / `GPU:`).
    pub fn tag(self) -> &'static str {
        match self {
            HardwareCategory::Cpu => "CPU",
            HardwareCategory::Gpu => "GPU",
        }
    }
}

impl fmt::Display for HardwareCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// ──────────────────────────────────────────────
// Leitura
// ──────────────────────────────────────────────

/// Uma leitura de temperatura de um sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub category: HardwareCategory,
    /// Nome do sensor (ex: "Core (Tctl/Tdie)")
    pub label: String,
    /// Temperatura (°C). Sem significado quando `present == false`.
    pub celsius: f32,
    /// O sensor reportou um valor finito neste ciclo
    pub present: bool,
}

impl SensorReading {
    /// Leitura válida.
    pub fn new(category: HardwareCategory, label: impl Into<String>, celsius: f32) -> Self {
        Self {
            category,
            label: label.into(),
            celsius,
            present: true,
        }
    }

    /// Sensor existe mas não tem valor (ou o valor não é finito).
    pub fn missing(category: HardwareCategory, label: impl Into<String>) -> Self {
        Self {
            category,
            label: label.into(),
            celsius: 0.0,
            present: false,
        }
    }

    /// Cria a leitura a partir do valor bruto do provider.
    pub fn from_raw(category: HardwareCategory, label: impl Into<String>, value: Option<f32>) -> Self {
        match value {
            Some(v) if v.is_finite() => Self::new(category, label, v),
            _ => Self::missing(category, label),
        }
    }

    /// Valor em °C, se presente.
    pub fn value(&self) -> Option<f32> {
        self.present.then_some(self.celsius)
    }
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(c) => write!(f, "{} {}: {c:.1}°C", self.category, self.label),
            None => write!(f, "{} {}: sem valor", self.category, self.label),
        }
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
