use crate::application::repos::RepoError;

/// Classifies a driver error into the repository taxonomy.
pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::RowNotFound => RepoError::NotFound,
        sqlx::Error::PoolTimedOut => RepoError::Timeout,
        sqlx::Error::Database(db) => {
            let message = db.message();
            if db.is_unique_violation() {
                RepoError::Duplicate {
                    constraint: db.constraint().unwrap_or("unknown").to_string(),
                }
            } else if db.is_foreign_key_violation() || message.contains("invalid input syntax") {
                RepoError::InvalidInput {
                    message: message.to_string(),
                }
            } else if message.contains("violates") {
                RepoError::Integrity {
                    message: message.to_string(),
                }
            } else if message.contains("canceling statement due to") {
                RepoError::Timeout
            } else {
                RepoError::from_persistence(message)
            }
        }
        other => RepoError::from_persistence(other),
    }
}
