//! Grens met de externe geometriebackends.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use super::result::OutputKind;
use crate::error::BackendError;
use crate::mesh::MeshPayload;
use crate::params::BackendValue;
use crate::registry::BackendId;

/// Benoemde parameters voor één sub-algoritme.
pub type StepParams = BTreeMap<String, BackendValue>;

/// Toestand van een sessie nadat alle stappen uitgevoerd zijn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionOutcome {
    /// Huidige mesh binnen de sessie.
    pub mesh: MeshPayload,
    /// Uitvoertypen die de backend zelf opgeeft; leeg betekent dat de engine
    /// ze afleidt uit de aangeroepen functies.
    pub declared: Vec<OutputKind>,
    /// Vrije tekst voor een eventueel bericht.
    pub result_infos: String,
}

/// Een backend opent per aanroep één sessie op een kopie van de mesh.
pub trait Backend {
    fn open_session(&self, mesh: &MeshPayload) -> Result<Box<dyn BackendSession>, BackendError>;

    /// Functienamen die deze backend kent, voor diagnostiek.
    fn functions(&self) -> Vec<&'static str> {
        Vec::new()
    }
}

/// Veranderlijke sessie waarin stappen na elkaar op dezelfde mesh werken.
pub trait BackendSession {
    fn invoke(&mut self, function: &str, params: &StepParams) -> Result<(), BackendError>;
    fn current_result(&mut self) -> Result<SessionOutcome, BackendError>;
}

/// Backends per identiteit.
#[derive(Default)]
pub struct BackendRegistry {
    backends: HashMap<BackendId, Box<dyn Backend>>,
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<String> = self.backends.keys().map(ToString::to_string).collect();
        ids.sort();
        f.debug_struct("BackendRegistry").field("backends", &ids).finish()
    }
}

impl BackendRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registreert of vervangt de backend voor `id`.
    pub fn register(&mut self, id: BackendId, backend: Box<dyn Backend>) {
        log::debug!("backend {id} geregistreerd");
        self.backends.insert(id, backend);
    }

    pub fn get(&self, id: BackendId) -> Result<&dyn Backend, BackendError> {
        self.backends
            .get(&id)
            .map(|backend| &**backend)
            .ok_or(BackendError::Unavailable(id))
    }

    #[must_use]
    pub fn contains(&self, id: BackendId) -> bool {
        self.backends.contains_key(&id)
    }
}
