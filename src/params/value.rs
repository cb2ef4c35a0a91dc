//! Waarden van parameters, zowel aan de hostkant als aan de backendkant.

use std::fmt;

use serde::Serialize;

use crate::error::{EngineError, EngineResult};

/// Getypeerde waarde van een parameter zoals de host die bewaart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Choice(String),
    Vector(Vec<f64>),
}

impl ParamValue {
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(number) => Some(*number as f64),
            Self::Float(number) => Some(*number),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_choice(&self) -> Option<&str> {
        match self {
            Self::Choice(choice) => Some(choice),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_vector(&self) -> Option<&[f64]> {
        match self {
            Self::Vector(components) => Some(components),
            _ => None,
        }
    }

    /// Rondt floats (ook in vectoren) af op twee decimalen. Het resultaat
    /// blijft binnen `[min, max]`, zodat een afgeronde waarde weer geldig is.
    #[must_use]
    pub fn rounded_within(&self, min: Option<f64>, max: Option<f64>) -> Self {
        let round = |number: f64| {
            let rounded = round2(number);
            let rounded = min.map_or(rounded, |min| rounded.max(min));
            max.map_or(rounded, |max| rounded.min(max))
        };
        match self {
            Self::Float(number) => Self::Float(round(*number)),
            Self::Vector(components) => Self::Vector(components.iter().map(|c| round(*c)).collect()),
            other => other.clone(),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(flag) => write!(f, "{flag}"),
            Self::Int(number) => write!(f, "{number}"),
            Self::Float(number) => write!(f, "{number}"),
            Self::Choice(choice) => f.write_str(choice),
            Self::Vector(components) => {
                f.write_str("[")?;
                for (index, component) in components.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{component}")?;
                }
                f.write_str("]")
            }
        }
    }
}

// Te grote waarden lopen bij `* 100` over naar oneindig en blijven dan zoals ze waren.
fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.is_finite() { rounded } else { value }
}

/// Waarde in de aanroepconventie van de geometriebackend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum BackendValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Percentage(f64),
    Pure(f64),
    Color([u8; 3]),
    FloatArray(Vec<f64>),
}

impl BackendValue {
    /// Numerieke lezing, ongeacht de vlag percentage/absoluut.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(number) => Some(*number as f64),
            Self::Float(number) | Self::Percentage(number) | Self::Pure(number) => Some(*number),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Zet een kleur met kanalen in [0, 1] om naar absolute RGB.
pub fn color_to_rgb(components: &[f64]) -> EngineResult<[u8; 3]> {
    let [r, g, b] = components else {
        return Err(EngineError::validation(format!(
            "kleur verwacht 3 kanalen, kreeg {}",
            components.len()
        )));
    };
    let channel = |value: f64| crate::clamp((value * 255.0).round(), 0.0, 255.0) as u8;
    Ok([channel(*r), channel(*g), channel(*b)])
}
