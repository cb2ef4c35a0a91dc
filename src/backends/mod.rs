//! Ingebouwde backends.
//!
//! Alleen de native router zit in de crate; een Meshlab-backend wordt door de
//! host geregistreerd onder [`BackendId::Meshlab`].

use crate::engine::BackendRegistry;
use crate::registry::BackendId;

pub mod native;

pub use native::NativeRouter;

/// Id van de native router die standaard beschikbaar is.
pub const BUILTIN_NATIVE: BackendId = BackendId::Native(0);

pub fn register_builtin(backends: &mut BackendRegistry) {
    backends.register(BUILTIN_NATIVE, Box::new(NativeRouter::new(BUILTIN_NATIVE)));
}
