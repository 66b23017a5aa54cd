// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules, one per entity.
//!
//! Every operation runs as a single closure on the write thread, so a
//! multi-statement sequence inside one function is atomic with respect to
//! other callers.

pub mod agents;
pub mod chats;
pub mod messages;

/// Parse a TEXT column into one of the domain enums.
pub(crate) fn column_enum<T>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let text: String = row.get(idx)?;
    text.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
