//! SQL access, grouped by table. Every function takes a plain `&Connection`
//! so it can run standalone through [`crate::Database::with_conn`] or as one
//! step of a larger [`crate::Database::with_tx`] transaction.

pub mod notifications;
pub mod posts;
pub mod refresh_tokens;
pub mod users;

use anyhow::Result;

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
