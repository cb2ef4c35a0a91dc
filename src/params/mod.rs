//! Getypeerde parameterbeschrijvingen per algoritme.
//!
//! Een [`ParameterSpec`] wordt eenmalig opgebouwd uit de declaratieve
//! beschrijving in de catalogus en is daarna alleen-lezen.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{EngineError, EngineResult};

pub mod config;
pub mod store;
pub mod value;

pub use config::SavedConfiguration;
pub use store::{ParameterStore, ParameterValues, PropertyGroupRegistrar};
pub use value::{BackendValue, ParamValue};

/// Id van de keuze die elke enum-parameter vooraf krijgt.
pub const UNSET_CHOICE: &str = "unset";
const UNSET_LABEL: &str = "-- kies een optie --";

/// Ondersteunde parametertypen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    Integer,
    Float,
    Boolean,
    Enum,
    /// Float die als percentage naar de backend gaat.
    Percentage,
    /// Float die als absolute waarde naar de backend gaat.
    PureValue,
    Color,
    FloatArray,
}

impl ParameterKind {
    const NAMES: &'static [(&'static str, ParameterKind)] = &[
        ("integer", ParameterKind::Integer),
        ("float", ParameterKind::Float),
        ("boolean", ParameterKind::Boolean),
        ("enum", ParameterKind::Enum),
        ("percentage_value", ParameterKind::Percentage),
        ("percentage", ParameterKind::Percentage),
        ("pure_value", ParameterKind::PureValue),
        ("color", ParameterKind::Color),
        ("float_array", ParameterKind::FloatArray),
    ];

    /// Zoekt het type op basis van de naam in de catalogus.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let key = crate::normalize_name(name).replace('-', "_");
        Self::NAMES
            .iter()
            .find(|(candidate, _)| *candidate == key)
            .map(|(_, kind)| *kind)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Enum => "enum",
            Self::Percentage => "percentage_value",
            Self::PureValue => "pure_value",
            Self::Color => "color",
            Self::FloatArray => "float_array",
        }
    }

    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Integer | Self::Float | Self::Percentage | Self::PureValue
        )
    }

    #[must_use]
    pub fn is_vector(self) -> bool {
        matches!(self, Self::Color | Self::FloatArray)
    }
}

/// Ruwe eigenschapsdata zoals die in de catalogus staat.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertyData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default: Option<JsonValue>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub step: Option<f64>,
    #[serde(default)]
    pub items: Vec<ItemData>,
    #[serde(default)]
    pub subtype: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemData {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Eén keuze binnen een enum-parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumItem {
    pub id: String,
    pub label: String,
    pub description: String,
}

/// Beschrijving van één parameter van een algoritme.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSpec {
    pub id: String,
    pub kind: ParameterKind,
    pub label: String,
    pub description: String,
    pub default: ParamValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<EnumItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    /// Sub-algoritme dat deze waarde ontvangt; `None` betekent dat alleen de
    /// orkestratie de waarde gebruikt.
    pub step_index: Option<usize>,
}

impl ParameterSpec {
    /// Bouwt een parameter op uit de catalogusbeschrijving.
    pub fn build(
        id: &str,
        type_name: &str,
        data: &PropertyData,
        step_index: Option<usize>,
    ) -> EngineResult<Self> {
        let kind = ParameterKind::from_name(type_name).ok_or_else(|| {
            EngineError::configuration(format!(
                "parameter `{id}` heeft onbekend type `{type_name}`"
            ))
        })?;

        if let (Some(min), Some(max)) = (data.min, data.max) {
            if min > max {
                return Err(EngineError::configuration(format!(
                    "parameter `{id}` heeft min {min} groter dan max {max}"
                )));
            }
        }

        let mut items = Vec::new();
        if kind == ParameterKind::Enum {
            items.push(EnumItem {
                id: UNSET_CHOICE.to_owned(),
                label: UNSET_LABEL.to_owned(),
                description: String::new(),
            });
            for item in &data.items {
                if items.iter().any(|known| known.id == item.id) {
                    return Err(EngineError::configuration(format!(
                        "parameter `{id}` bevat keuze `{}` meerdere keren",
                        item.id
                    )));
                }
                items.push(EnumItem {
                    id: item.id.clone(),
                    label: if item.name.is_empty() {
                        item.id.clone()
                    } else {
                        item.name.clone()
                    },
                    description: item.description.clone(),
                });
            }
        }

        let mut spec = Self {
            id: id.to_owned(),
            kind,
            label: if data.name.is_empty() {
                id.to_owned()
            } else {
                data.name.clone()
            },
            description: data.description.clone(),
            default: ParamValue::Bool(false),
            min: data.min,
            max: data.max,
            step: data.step.filter(|step| kind.is_numeric() && *step > 0.0),
            items,
            subtype: data
                .subtype
                .as_ref()
                .filter(|_| kind.is_vector())
                .map(|subtype| subtype.to_uppercase()),
            step_index,
        };
        spec.default = spec.default_from(data.default.as_ref())?;
        Ok(spec)
    }

    fn default_from(&self, raw: Option<&JsonValue>) -> EngineResult<ParamValue> {
        let value = match self.kind {
            ParameterKind::Integer => {
                let number = match raw {
                    None => 0,
                    Some(raw) => json_integer(raw).ok_or_else(|| self.bad_default(raw))?,
                };
                ParamValue::Int(self.clamp(number as f64) as i64)
            }
            ParameterKind::Float | ParameterKind::Percentage | ParameterKind::PureValue => {
                let number = match raw {
                    None => 0.0,
                    Some(raw) => raw.as_f64().ok_or_else(|| self.bad_default(raw))?,
                };
                ParamValue::Float(self.clamp(number))
            }
            ParameterKind::Boolean => ParamValue::Bool(match raw {
                Some(JsonValue::Bool(flag)) => *flag,
                Some(JsonValue::String(text)) => text == "true",
                _ => false,
            }),
            ParameterKind::Enum => ParamValue::Choice(UNSET_CHOICE.to_owned()),
            ParameterKind::Color | ParameterKind::FloatArray => {
                let components = match raw {
                    None => vec![0.0; 3],
                    Some(raw) => json_vector(raw).ok_or_else(|| self.bad_default(raw))?,
                };
                if components.is_empty() {
                    return Err(EngineError::configuration(format!(
                        "parameter `{}` heeft een lege standaardvector",
                        self.id
                    )));
                }
                ParamValue::Vector(components.into_iter().map(|c| self.clamp(c)).collect())
            }
        };
        Ok(value)
    }

    fn bad_default(&self, raw: &JsonValue) -> EngineError {
        EngineError::configuration(format!(
            "parameter `{}` ({}) heeft ongeldige standaardwaarde {raw}",
            self.id,
            self.kind.name()
        ))
    }

    fn clamp(&self, value: f64) -> f64 {
        crate::clamp(
            value,
            self.min.unwrap_or(f64::NEG_INFINITY),
            self.max.unwrap_or(f64::INFINITY),
        )
    }

    /// Zet een JSON-waarde van de host om naar een getypeerde waarde en
    /// controleert de grenzen.
    pub fn coerce(&self, raw: &JsonValue) -> EngineResult<ParamValue> {
        let value = match self.kind {
            ParameterKind::Integer => ParamValue::Int(
                json_integer(raw).ok_or_else(|| self.type_mismatch(raw))?,
            ),
            ParameterKind::Float | ParameterKind::Percentage | ParameterKind::PureValue => {
                ParamValue::Float(raw.as_f64().ok_or_else(|| self.type_mismatch(raw))?)
            }
            ParameterKind::Boolean => match raw {
                JsonValue::Bool(flag) => ParamValue::Bool(*flag),
                JsonValue::String(text) if text == "true" || text == "false" => {
                    ParamValue::Bool(text == "true")
                }
                _ => return Err(self.type_mismatch(raw)),
            },
            ParameterKind::Enum => ParamValue::Choice(
                raw.as_str()
                    .ok_or_else(|| self.type_mismatch(raw))?
                    .to_owned(),
            ),
            ParameterKind::Color | ParameterKind::FloatArray => {
                ParamValue::Vector(json_vector(raw).ok_or_else(|| self.type_mismatch(raw))?)
            }
        };
        self.validate(&value)?;
        Ok(value)
    }

    fn type_mismatch(&self, raw: &JsonValue) -> EngineError {
        EngineError::validation(format!(
            "waarde {raw} past niet bij parameter `{}` van type {}",
            self.id,
            self.kind.name()
        ))
    }

    /// Controleert type, grenzen en keuzes van een waarde.
    pub fn validate(&self, value: &ParamValue) -> EngineResult<()> {
        match (self.kind, value) {
            (ParameterKind::Integer, ParamValue::Int(number)) => self.check_bounds(*number as f64),
            (
                ParameterKind::Float | ParameterKind::Percentage | ParameterKind::PureValue,
                ParamValue::Float(number),
            ) => self.check_bounds(*number),
            (ParameterKind::Boolean, ParamValue::Bool(_)) => Ok(()),
            (ParameterKind::Enum, ParamValue::Choice(choice)) => {
                if self.items.iter().any(|item| &item.id == choice) {
                    Ok(())
                } else {
                    Err(EngineError::validation(format!(
                        "`{choice}` is geen geldige keuze voor parameter `{}`",
                        self.id
                    )))
                }
            }
            (ParameterKind::Color | ParameterKind::FloatArray, ParamValue::Vector(components)) => {
                let expected = self.default.as_vector().map_or(3, <[f64]>::len);
                if components.len() != expected {
                    return Err(EngineError::validation(format!(
                        "parameter `{}` verwacht {expected} componenten, kreeg {}",
                        self.id,
                        components.len()
                    )));
                }
                components
                    .iter()
                    .try_for_each(|component| self.check_bounds(*component))
            }
            (kind, other) => Err(EngineError::validation(format!(
                "waarde {other:?} past niet bij parameter `{}` van type {}",
                self.id,
                kind.name()
            ))),
        }
    }

    fn check_bounds(&self, number: f64) -> EngineResult<()> {
        if !number.is_finite() {
            return Err(EngineError::validation(format!(
                "parameter `{}` moet een eindig getal zijn",
                self.id
            )));
        }
        let below = self.min.is_some_and(|min| number < min);
        let above = self.max.is_some_and(|max| number > max);
        if below || above {
            return Err(EngineError::validation(format!(
                "waarde {number} ligt buiten [{}, {}] voor parameter `{}`",
                self.min.map_or_else(|| "-inf".to_owned(), |min| min.to_string()),
                self.max.map_or_else(|| "inf".to_owned(), |max| max.to_string()),
                self.id
            )));
        }
        Ok(())
    }

    /// Geeft `true` als dit een enum-parameter is die nog op de lege keuze staat.
    #[must_use]
    pub fn is_unset(&self, value: &ParamValue) -> bool {
        self.kind == ParameterKind::Enum && value.as_choice() == Some(UNSET_CHOICE)
    }

    /// Zet een gevalideerde waarde om naar de representatie van de backend.
    pub fn to_backend(&self, value: &ParamValue) -> EngineResult<BackendValue> {
        self.validate(value)?;
        let converted = match (self.kind, value) {
            (ParameterKind::Integer, ParamValue::Int(number)) => BackendValue::Int(*number),
            (ParameterKind::Float, ParamValue::Float(number)) => BackendValue::Float(*number),
            (ParameterKind::Percentage, ParamValue::Float(number)) => {
                BackendValue::Percentage(*number)
            }
            (ParameterKind::PureValue, ParamValue::Float(number)) => BackendValue::Pure(*number),
            (ParameterKind::Boolean, ParamValue::Bool(flag)) => BackendValue::Bool(*flag),
            (ParameterKind::Enum, ParamValue::Choice(choice)) => BackendValue::Text(choice.clone()),
            (ParameterKind::Color, ParamValue::Vector(components)) => {
                BackendValue::Color(value::color_to_rgb(components)?)
            }
            (ParameterKind::FloatArray, ParamValue::Vector(components)) => {
                BackendValue::FloatArray(components.clone())
            }
            (kind, other) => {
                return Err(EngineError::validation(format!(
                    "waarde {other:?} past niet bij parameter `{}` van type {}",
                    self.id,
                    kind.name()
                )));
            }
        };
        Ok(converted)
    }
}

fn json_integer(raw: &JsonValue) -> Option<i64> {
    raw.as_i64().or_else(|| {
        raw.as_f64()
            .filter(|number| number.is_finite() && number.fract() == 0.0)
            .map(|number| number as i64)
    })
}

fn json_vector(raw: &JsonValue) -> Option<Vec<f64>> {
    raw.as_array()?.iter().map(JsonValue::as_f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: JsonValue) -> PropertyData {
        serde_json::from_value(value).expect("geldige eigenschapsdata")
    }

    #[test]
    fn float_default_is_clamped_into_bounds() {
        let spec = ParameterSpec::build(
            "p",
            "float",
            &data(json!({"default": 3.5, "min": 0.0, "max": 1.0})),
            Some(0),
        )
        .expect("float spec");
        assert_eq!(spec.default, ParamValue::Float(1.0));
    }

    #[test]
    fn boolean_default_reads_textual_true() {
        let on = ParameterSpec::build("b", "boolean", &data(json!({"default": "true"})), None)
            .expect("boolean spec");
        let off = ParameterSpec::build("b", "boolean", &data(json!({"default": "yes"})), None)
            .expect("boolean spec");
        assert_eq!(on.default, ParamValue::Bool(true));
        assert_eq!(off.default, ParamValue::Bool(false));
    }

    #[test]
    fn enum_gets_unset_sentinel_first() {
        let spec = ParameterSpec::build(
            "output_option",
            "enum",
            &data(json!({"items": [{"id": "SEGMENTS_COLOR", "name": "Colors"}]})),
            Some(0),
        )
        .expect("enum spec");
        assert_eq!(spec.items[0].id, UNSET_CHOICE);
        assert_eq!(spec.items[1].id, "SEGMENTS_COLOR");
        assert!(spec.is_unset(&spec.default));
    }

    #[test]
    fn unknown_kind_is_configuration_error() {
        let err = ParameterSpec::build("x", "matrix", &PropertyData::default(), None)
            .expect_err("onbekend type");
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn coerce_rejects_out_of_range_values() {
        let spec = ParameterSpec::build(
            "clusters",
            "integer",
            &data(json!({"default": 4, "min": 2, "max": 10})),
            Some(0),
        )
        .expect("integer spec");
        assert_eq!(spec.coerce(&json!(7)).expect("in range"), ParamValue::Int(7));
        assert!(matches!(
            spec.coerce(&json!(11)),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            spec.coerce(&json!(2.5)),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn color_converts_to_absolute_rgb() {
        let spec = ParameterSpec::build(
            "tint",
            "color",
            &data(json!({"default": [1.0, 0.5, 0.0], "subtype": "color"})),
            Some(0),
        )
        .expect("color spec");
        assert_eq!(spec.subtype.as_deref(), Some("COLOR"));
        assert_eq!(
            spec.to_backend(&spec.default).expect("conversie"),
            BackendValue::Color([255, 128, 0])
        );
    }

    #[test]
    fn percentage_keeps_tagged_representation() {
        let spec = ParameterSpec::build("pct", "percentage_value", &data(json!({"default": 1.0})), Some(0))
            .expect("percentage spec");
        assert_eq!(
            spec.to_backend(&ParamValue::Float(1.0)).expect("conversie"),
            BackendValue::Percentage(1.0)
        );
    }
}
