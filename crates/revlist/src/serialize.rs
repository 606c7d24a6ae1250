#![forbid(unsafe_code)]

//! Structured-text (JSON) and delimited-text (CSV) conversion.
//!
//! # Formats
//!
//! - Live sequence: a JSON array of elements.
//! - History: a JSON array of `{"items": [..], "checkpoints": [{"label": .., "items": [..]}]}`.
//! - CSV: one row per history entry (or a single row for the live
//!   sequence). A row is the entry's elements followed by each checkpoint's
//!   label and elements, all flattened to scalars.
//!
//! Parsing goes through serde, so the shape is checked before anything is
//! trusted: a history document that is not an array of entry objects is a
//! [`ParseError`], never a partially applied import.
//!
//! # CSV Limitations
//!
//! Values are written raw. A string containing the delimiter or a newline
//! is not quoted or escaped, so CSV output is for display and export only
//! and cannot be parsed back. `null` becomes an empty field; object fields
//! are emitted in key order. Nesting deeper than the configured flatten
//! depth is written as compact JSON text inside a single field.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ParseError;
use crate::history::HistoryEntry;

/// Encode a sequence as a JSON array.
pub fn sequence_to_json<T: Serialize>(items: &[T]) -> serde_json::Result<String> {
    serde_json::to_string(items)
}

/// Decode a JSON array of elements.
pub fn parse_sequence<T: DeserializeOwned>(text: &str) -> Result<Vec<T>, ParseError> {
    Ok(serde_json::from_str(text)?)
}

/// Encode history entries, oldest first.
pub fn history_to_json<'a, T, I>(entries: I) -> serde_json::Result<String>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a HistoryEntry<T>>,
{
    let entries: Vec<&HistoryEntry<T>> = entries.into_iter().collect();
    serde_json::to_string(&entries)
}

/// Decode a non-empty JSON array of history entries.
pub fn parse_history<T: DeserializeOwned>(text: &str) -> Result<Vec<HistoryEntry<T>>, ParseError> {
    let entries: Vec<HistoryEntry<T>> = serde_json::from_str(text)?;
    if entries.is_empty() {
        return Err(ParseError::EmptyHistory);
    }
    Ok(entries)
}

// ============================================================================
// CSV
// ============================================================================

/// Flattening options for the CSV writers.
#[derive(Debug, Clone, Copy)]
pub struct CsvOptions<'a> {
    /// Field separator.
    pub delimiter: &'a str,
    /// Container levels to descend into before writing JSON text.
    pub depth: usize,
}

/// Render the live sequence as a single CSV row.
pub fn sequence_to_csv<T: Serialize>(
    items: &[T],
    opts: CsvOptions<'_>,
) -> serde_json::Result<String> {
    let mut fields = Vec::new();
    flatten_items(items, opts.depth, &mut fields)?;
    Ok(fields.join(opts.delimiter))
}

/// Render history entries as CSV, one row per entry.
pub fn history_to_csv<'a, T, I>(entries: I, opts: CsvOptions<'_>) -> serde_json::Result<String>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a HistoryEntry<T>>,
{
    let mut rows = Vec::new();
    for entry in entries {
        let mut fields = Vec::new();
        flatten_items(&entry.items, opts.depth, &mut fields)?;
        for checkpoint in &entry.checkpoints {
            fields.push(checkpoint.label.clone().unwrap_or_default());
            flatten_items(&checkpoint.items, opts.depth, &mut fields)?;
        }
        rows.push(fields.join(opts.delimiter));
    }
    Ok(rows.join("\n"))
}

fn flatten_items<T: Serialize>(
    items: &[T],
    depth: usize,
    out: &mut Vec<String>,
) -> serde_json::Result<()> {
    for item in items {
        flatten(&serde_json::to_value(item)?, depth, out);
    }
    Ok(())
}

/// Append the scalars of `value` to `out`, descending at most `depth`
/// container levels.
pub fn flatten(value: &Value, depth: usize, out: &mut Vec<String>) {
    match value {
        Value::Null => out.push(String::new()),
        Value::Bool(b) => out.push(b.to_string()),
        Value::Number(n) => out.push(n.to_string()),
        Value::String(s) => out.push(s.clone()),
        Value::Array(_) | Value::Object(_) if depth == 0 => out.push(value.to_string()),
        Value::Array(values) => {
            for v in values {
                flatten(v, depth - 1, out);
            }
        }
        Value::Object(map) => {
            for v in map.values() {
                flatten(v, depth - 1, out);
            }
        }
    }
}
