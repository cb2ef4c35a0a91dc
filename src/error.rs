//! Fouttypes die door de hele engine gedeeld worden.

use thiserror::Error;

use crate::registry::BackendId;

/// Result type voor alle publieke engine-operaties.
pub type EngineResult<T> = Result<T, EngineError>;

/// Maximale Levenshtein-afstand waarbinnen een suggestie getoond wordt.
const SUGGESTION_DISTANCE: usize = 3;

/// Foutcategorieën die naar de host doorgegeven worden.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// De catalogus of een parameterbeschrijving is ongeldig.
    #[error("configuratiefout: {0}")]
    Configuration(String),
    /// Invoerdata of parameterwaarden schenden een invariant.
    #[error("validatiefout: {0}")]
    Validation(String),
    /// Het gevraagde algoritme bestaat niet in de registry.
    #[error("onbekend algoritme `{id}`{}", suggestion_suffix(.suggestion))]
    NotFound {
        id: String,
        suggestion: Option<String>,
    },
    /// De aangeroepen functiecombinatie heeft geen bekende uitvoerclassificatie.
    #[error("geen uitvoerclassificatie voor functiecombinatie [{}]", join_names(.0))]
    UnsupportedOperation(Vec<String>),
    /// Fout van de externe geometriebackend, ongewijzigd doorgegeven.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl EngineError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Bouwt een [`EngineError::NotFound`] met de dichtstbijzijnde bekende id als hint.
    pub fn not_found<'a>(id: &str, known: impl IntoIterator<Item = &'a str>) -> Self {
        let suggestion = known
            .into_iter()
            .map(|candidate| (levenshtein::levenshtein(id, candidate), candidate))
            .filter(|(distance, _)| *distance <= SUGGESTION_DISTANCE)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, candidate)| candidate.to_owned());
        Self::NotFound {
            id: id.to_owned(),
            suggestion,
        }
    }
}

fn join_names(names: &[String]) -> String {
    names.join(", ")
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    suggestion
        .as_deref()
        .map(|candidate| format!(" (bedoelde je `{candidate}`?)"))
        .unwrap_or_default()
}

/// Fouten die een backend tijdens een sessie kan melden.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BackendError {
    /// Er is geen backend geregistreerd voor deze identiteit.
    #[error("geen backend geregistreerd voor {0}")]
    Unavailable(BackendId),
    /// De backend kent de gevraagde functie niet.
    #[error("backend {backend} kent functie `{function}` niet")]
    UnknownFunction { backend: BackendId, function: String },
    /// De functie zelf faalde; het bericht komt rechtstreeks van de backend.
    #[error("{message}")]
    Failed { function: String, message: String },
    /// Het resultaat van de sessie voldoet niet aan het verwachte formaat.
    #[error("ongeldig backendresultaat: {0}")]
    MalformedResult(String),
}

impl BackendError {
    pub fn failed(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            function: function.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_suggests_closest_identifier() {
        let err = EngineError::not_found("segmentaton_cgal", ["segmentation_cgal", "test_cpp"]);
        assert_eq!(
            err,
            EngineError::NotFound {
                id: "segmentaton_cgal".to_owned(),
                suggestion: Some("segmentation_cgal".to_owned()),
            }
        );
        assert!(err.to_string().contains("bedoelde je `segmentation_cgal`"));
    }

    #[test]
    fn not_found_without_close_match_has_no_hint() {
        let err = EngineError::not_found("xyz", ["segmentation_cgal"]);
        assert_eq!(err.to_string(), "onbekend algoritme `xyz`");
    }

    #[test]
    fn backend_failure_message_is_verbatim() {
        let err: EngineError = BackendError::failed("f1", "mesh is not manifold").into();
        assert_eq!(err.to_string(), "mesh is not manifold");
    }
}
