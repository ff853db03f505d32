//! Mapping from sqlx errors to store errors.

use domain::StoreError;

/// Postgres SQLSTATE codes that signal lock or serialization contention.
const CONTENTION_CODES: [&str; 3] = ["40001", "40P01", "55P03"];

/// Classifies a sqlx error for the engine's retry logic.
pub fn store_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) => {
            let code = db.code().map(|c| c.into_owned()).unwrap_or_default();
            if code.starts_with("23") {
                StoreError::Constraint(db.message().to_string())
            } else if CONTENTION_CODES.contains(&code.as_str()) {
                StoreError::Database(format!("contention ({code}): {}", db.message()))
            } else {
                StoreError::Database(err.to_string())
            }
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        _ => StoreError::Database(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_are_unavailable() {
        assert!(matches!(
            store_error(sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            store_error(sqlx::Error::PoolClosed),
            StoreError::Unavailable(_)
        ));
    }

    #[test]
    fn test_row_not_found_is_database_error() {
        assert!(matches!(
            store_error(sqlx::Error::RowNotFound),
            StoreError::Database(_)
        ));
    }
}
