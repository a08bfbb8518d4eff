// src/decode.rs
//! Tolerant decoding of JSON arrays embedded in free-form model output.
//!
//! Order: strict parse of the whole (trimmed) text, then each balanced
//! `[...]` found in it, left to right, then `Unparseable`. Rows are decoded
//! one by one: a malformed row is skipped without losing its neighbours, and
//! a candidate array with no usable row at all is passed over. Never errors.

use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    /// The whole response was valid JSON.
    Strict(T),
    /// A JSON array was found inside surrounding prose or code fences.
    Extracted(T),
    Unparseable,
}

impl<T> Decoded<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Decoded::Strict(v) | Decoded::Extracted(v) => Some(v),
            Decoded::Unparseable => None,
        }
    }

    pub fn is_unparseable(&self) -> bool {
        matches!(self, Decoded::Unparseable)
    }
}

pub fn decode_entries<T: DeserializeOwned>(text: &str) -> Decoded<Vec<T>> {
    let trimmed = text.trim();
    if let Ok(rows) = serde_json::from_str::<Vec<Value>>(trimmed) {
        // An explicit empty answer is an answer.
        if rows.is_empty() {
            return Decoded::Strict(Vec::new());
        }
        let kept = keep_decodable::<T>(rows);
        if !kept.is_empty() {
            return Decoded::Strict(kept);
        }
    }

    let mut from = 0usize;
    while let Some((start, end)) = find_balanced_array(trimmed, from) {
        if let Ok(rows) = serde_json::from_str::<Vec<Value>>(&trimmed[start..=end]) {
            let kept = keep_decodable::<T>(rows);
            if !kept.is_empty() {
                return Decoded::Extracted(kept);
            }
        }
        from = start + 1;
    }

    tracing::debug!(
        target: "translate",
        preview = %truncate_for_log(trimmed, 200),
        "no decodable array in response"
    );
    Decoded::Unparseable
}

/// Rows that deserialize into `T`, in order; the rest are logged and dropped.
fn keep_decodable<T: DeserializeOwned>(rows: Vec<Value>) -> Vec<T> {
    let total = rows.len();
    let mut kept = Vec::with_capacity(total);
    for row in rows {
        match serde_json::from_value::<T>(row.clone()) {
            Ok(v) => kept.push(v),
            Err(e) => tracing::debug!(
                target: "translate",
                error = %e,
                row = %truncate_for_log(&row.to_string(), 120),
                "skipping malformed row"
            ),
        }
    }
    if !kept.is_empty() && kept.len() < total {
        tracing::warn!(
            target: "translate",
            kept = kept.len(),
            skipped = total - kept.len(),
            "partially malformed answer; using the usable rows"
        );
    }
    kept
}

/// Byte span `[start, end]` of the first balanced `[...]` starting at or after
/// `from`. Brackets inside JSON strings are ignored.
fn find_balanced_array(s: &str, from: usize) -> Option<(usize, usize)> {
    let bytes = s.as_bytes();
    let start = from + s.get(from..)?.find('[')?;

    let mut depth = 0usize;
    let mut in_str = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_str {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_str = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_str = true,
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some((start, i));
                }
            }
            _ => {}
        }
    }
    None
}

pub(crate) fn truncate_for_log(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{head}…(+{} chars)", s.chars().count() - max)
    }
}
