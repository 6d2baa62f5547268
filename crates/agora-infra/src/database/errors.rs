//! Mapping from SeaORM errors onto the repository error type.

use sea_orm::{DbErr, SqlErr};

use agora_core::error::RepoError;

pub(crate) fn map_db_err(err: DbErr) -> RepoError {
    if let Some(sql_err) = err.sql_err() {
        match sql_err {
            SqlErr::UniqueConstraintViolation(msg) => return RepoError::Constraint(msg),
            SqlErr::ForeignKeyConstraintViolation(msg) => return RepoError::Constraint(msg),
            _ => {}
        }
    }

    match err {
        DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => RepoError::NotFound,
        DbErr::ConnectionAcquire(e) => RepoError::Connection(e.to_string()),
        DbErr::Conn(e) => RepoError::Connection(e.to_string()),
        other => RepoError::Query(other.to_string()),
    }
}
