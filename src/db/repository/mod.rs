//! Repository layer: entity-scoped database operations.
//!
//! Plain functions over a borrowed `Connection`. Callers that need several
//! writes to land together open a transaction and pass it in (a
//! `Transaction` derefs to `Connection`).

mod account;
mod feedback;
mod profile;
mod report;
mod share;

use uuid::Uuid;

use super::DatabaseError;

pub use account::*;
pub use feedback::*;
pub use profile::*;
pub use report::*;
pub use share::*;

/// Parse a TEXT uuid column.
pub(crate) fn parse_id(column: &'static str, value: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(value).map_err(|_| DatabaseError::InvalidId {
        column,
        value: value.to_string(),
    })
}
