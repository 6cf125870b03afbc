//! Chart-spec extraction from accumulated stream text.
//!
//! `extract_last_spec` is a pure function of the full accumulator — the
//! player calls it after every token, so it must tolerate arbitrary
//! mid-write garbage and return the same result for the same input every
//! time. Candidate selection always prefers the *last* region: streamed
//! text is append-only, and earlier candidates are usually incomplete
//! prefixes of a spec still being written.

mod braces;
mod fenced;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where the candidate raw text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecSource {
    /// A fenced ```json block.
    Fenced,
    /// A bare top-level balanced-brace region.
    Braced,
}

/// Outcome of one extraction attempt.
///
/// `NotFound` and `InvalidJson` are expected, frequent states while the
/// buffer is mid-write and are never surfaced as errors. `InvalidSchema` is
/// an advisory hint only.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionResult {
    Found {
        /// The parsed spec object.
        spec: Value,
        /// The exact (trimmed) substring that parsed.
        raw: String,
        source: SpecSource,
    },
    NotFound,
    InvalidJson {
        detail: String,
    },
    InvalidSchema {
        detail: String,
    },
}

/// Fixed diagnostic for specs failing shape validation.
pub const SCHEMA_HINT: &str = "Spec missing required fields: mark/encoding";

/// A renderable spec is an object carrying `mark` and an object-valued
/// `encoding`. Arrays, scalars and null `encoding` all fail.
fn is_renderable_spec(spec: &Value) -> bool {
    let Some(obj) = spec.as_object() else {
        return false;
    };
    if !obj.contains_key("mark") {
        return false;
    }
    obj.get("encoding").is_some_and(Value::is_object)
}

/// Find and validate the most recent candidate spec in `text`.
///
/// Fenced ```json blocks win over bare braced regions: when at least one
/// fenced block exists, the braced fallback is skipped entirely, even if
/// the fenced content turns out to be invalid.
pub fn extract_last_spec(text: &str) -> ExtractionResult {
    let fenced = fenced::last_fenced_json_block(text);
    let source = if fenced.is_some() {
        SpecSource::Fenced
    } else {
        SpecSource::Braced
    };

    let raw = fenced
        .or_else(|| braces::last_balanced_object(text))
        .map(str::trim)
        .unwrap_or_default();

    if raw.is_empty() {
        return ExtractionResult::NotFound;
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(spec) if is_renderable_spec(&spec) => ExtractionResult::Found {
            spec,
            raw: raw.to_string(),
            source,
        },
        Ok(_) => ExtractionResult::InvalidSchema {
            detail: SCHEMA_HINT.to_string(),
        },
        Err(e) => ExtractionResult::InvalidJson {
            detail: e.to_string(),
        },
    }
}
