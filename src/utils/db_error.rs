//! Translation of SQLx errors into [`StoreError`].

use crate::error::StoreError;

/// PostgreSQL SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    let Some(db_err) = e.as_database_error() else {
        return false;
    };

    db_err.is_unique_violation() || db_err.code().as_deref() == Some(UNIQUE_VIOLATION)
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if is_unique_violation(&e) {
            let constraint = e
                .as_database_error()
                .and_then(|db| db.constraint())
                .map(str::to_string);
            return StoreError::UniqueViolation { constraint };
        }

        StoreError::Unavailable(Box::new(e))
    }
}
