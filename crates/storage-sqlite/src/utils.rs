//! Helpers shared by the repositories.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::errors::StorageError;
use moexfolio_core::Result;

/// Maximum number of parameters for SQLite IN (...) queries.
///
/// SQLite caps bound parameters per statement (SQLITE_MAX_VARIABLE_NUMBER,
/// typically 999); 500 leaves room for the rest of the query.
pub const SQLITE_MAX_PARAMS_CHUNK: usize = 500;

/// Chunk a slice into batches that fit in one statement.
pub fn chunk_for_sqlite<T>(items: &[T]) -> impl Iterator<Item = &[T]> {
    items.chunks(SQLITE_MAX_PARAMS_CHUNK)
}

/// Decimals are stored as TEXT so no precision is lost.
pub fn decimal_to_text(value: Decimal) -> String {
    value.normalize().to_string()
}

pub fn parse_decimal(value: &str, column: &str) -> Result<Decimal> {
    Decimal::from_str(value.trim()).map_err(|e| {
        StorageError::SerializationError(format!("{} = '{}': {}", column, value, e)).into()
    })
}

pub fn parse_optional_decimal(value: Option<&str>, column: &str) -> Result<Option<Decimal>> {
    value.map(|v| parse_decimal(v, column)).transpose()
}
