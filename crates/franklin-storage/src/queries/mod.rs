// SPDX-FileCopyrightText: 2026 Franklin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed queries for conversation turns and user profiles.
//!
//! Memory rows are owned by `franklin-memory`'s store, which carries the
//! vector-search logic alongside them.

pub mod profiles;
pub mod turns;

use std::str::FromStr;

/// Read a TEXT column and parse it with `FromStr` (enums such as `Channel`).
pub fn parse_column<T>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
