//! Store access layer for the semestre service

use scolaris_common::{Error, Result};
use uuid::Uuid;

pub mod references;
pub mod semestres;

pub use references::BackRef;
pub use semestres::SemestrePatch;

/// Parse an id read back from the store
pub(crate) fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| Error::Internal(format!("Corrupt stored id '{}': {}", s, e)))
}
