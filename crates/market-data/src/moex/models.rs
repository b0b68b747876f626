//! ISS response tables.
//!
//! With `iss.meta=off` every ISS block is a `{ "columns": [...], "data": [[...], ...] }`
//! table; rows are positional, so values are looked up through the column list.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct IssTable {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub data: Vec<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct IssSecurityResponse {
    #[serde(default)]
    pub securities: IssTable,
    #[serde(default)]
    pub marketdata: IssTable,
}

#[derive(Clone, Copy)]
pub(crate) struct IssRow<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl IssTable {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn rows(&self) -> impl DoubleEndedIterator<Item = IssRow<'_>> {
        self.data.iter().map(move |values| IssRow {
            columns: &self.columns,
            values,
        })
    }
}

impl<'a> IssRow<'a> {
    /// Non-null, non-empty value of `column`.
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        let index = self.columns.iter().position(|c| c == column)?;
        match self.values.get(index)? {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            value => Some(value),
        }
    }

    pub fn string(&self, column: &str) -> Option<String> {
        match self.get(column)? {
            Value::String(s) => Some(s.trim().to_string()),
            other => Some(other.to_string()),
        }
    }

    pub fn decimal(&self, column: &str) -> Option<Decimal> {
        value_to_decimal(self.get(column)?)
    }

    pub fn integer(&self, column: &str) -> Option<i64> {
        self.decimal(column).and_then(|d| d.trunc().to_i64())
    }
}

/// Parses an ISS number. Numbers go through their shortest textual form so
/// `95.12` stays `95.12` instead of picking up binary float noise.
pub(crate) fn value_to_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}
