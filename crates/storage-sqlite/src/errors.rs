//! Storage-specific error types for SQLite operations.
//!
//! Diesel, r2d2 and I/O errors are wrapped here and converted to the
//! database-agnostic errors of `moexfolio_core` before leaving the crate.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use moexfolio_core::errors::{DatabaseError, Error};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(#[from] diesel::ConnectionError),

    #[error("Connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    #[error("Query execution failed: {0}")]
    QueryFailed(#[from] DieselError),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Stored value is malformed: {0}")]
    SerializationError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A domain error raised inside a write job; passed through untouched.
    #[error(transparent)]
    Core(Error),
}

impl From<Error> for StorageError {
    fn from(err: Error) -> Self {
        StorageError::Core(err)
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ConnectionFailed(e) => {
                Error::Database(DatabaseError::ConnectionFailed(e.to_string()))
            }
            StorageError::PoolError(e) => {
                Error::Database(DatabaseError::PoolCreationFailed(e.to_string()))
            }
            StorageError::QueryFailed(DieselError::NotFound) => {
                Error::Database(DatabaseError::NotFound("Record not found".to_string()))
            }
            StorageError::QueryFailed(DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                info,
            )) => Error::Database(DatabaseError::UniqueViolation(info.message().to_string())),
            StorageError::QueryFailed(e) => {
                Error::Database(DatabaseError::QueryFailed(e.to_string()))
            }
            StorageError::MigrationFailed(e) => Error::Database(DatabaseError::MigrationFailed(e)),
            StorageError::SerializationError(e) => Error::Database(DatabaseError::Internal(e)),
            StorageError::Io(e) => Error::Database(DatabaseError::ConnectionFailed(e.to_string())),
            StorageError::Core(e) => e,
        }
    }
}

/// Extension trait for converting Diesel and pool results to core results.
pub trait IntoCore<T> {
    fn into_core(self) -> moexfolio_core::Result<T>;
}

impl<T> IntoCore<T> for std::result::Result<T, DieselError> {
    fn into_core(self) -> moexfolio_core::Result<T> {
        self.map_err(|e| StorageError::from(e).into())
    }
}

impl<T> IntoCore<T> for std::result::Result<T, r2d2::Error> {
    fn into_core(self) -> moexfolio_core::Result<T> {
        self.map_err(|e| StorageError::from(e).into())
    }
}

impl<T> IntoCore<T> for std::result::Result<T, diesel::ConnectionError> {
    fn into_core(self) -> moexfolio_core::Result<T> {
        self.map_err(|e| StorageError::from(e).into())
    }
}

impl<T> IntoCore<T> for std::result::Result<T, std::io::Error> {
    fn into_core(self) -> moexfolio_core::Result<T> {
        self.map_err(|e| StorageError::from(e).into())
    }
}
