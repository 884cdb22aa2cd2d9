//! Column-resolution heuristics for tabular dataset uploads.
//!
//! Uploaded spreadsheets rarely name their columns the way a project is
//! configured to expect, so the import pipeline resolves the configured
//! column spec against what the file actually contains before any record
//! is turned into an example. This module owns only that resolution; the
//! caller parses files and extracts cell values.

use std::collections::HashMap;

use thiserror::Error;

pub const DEFAULT_TEXT_COLUMN: &str = "text";
pub const DEFAULT_LABEL_COLUMN: &str = "label";
pub const UPLOAD_NAME_COLUMN: &str = "upload_name";
pub const UUID_COLUMN: &str = "example_uuid";
pub const LINE_NUMBER_COLUMN: &str = "#line_number";

/// Columns the upload pipeline injects for bookkeeping. Never offered or
/// matched as data columns.
const RESERVED_COLUMNS: [&str; 4] = [
    UPLOAD_NAME_COLUMN,
    UUID_COLUMN,
    LINE_NUMBER_COLUMN,
    "filename",
];

/// Header names users commonly give the column holding the text to
/// annotate. Matched case-insensitively.
const TEXT_ALIASES: [&str; 17] = [
    "text",
    "query",
    "question",
    "data",
    "title",
    "subject",
    "description",
    "body",
    "prompt",
    "completion",
    "input",
    "output",
    "context",
    "response",
    "instruction",
    "summary",
    "abstract",
];

const LABEL_ALIASES: [&str; 3] = ["label", "tag", "category"];

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("column(s) '{requested}' not found, available: {available}")]
    ColumnNotFound { requested: String, available: String },
}

/// Resolves the configured data-column spec against the columns an upload
/// actually has. The spec may be a single name, a comma-separated list (the
/// caller concatenates the matched columns per record), or `"*"` for every
/// non-reserved column. When the spec is the default text column and
/// nothing matches directly, common alias headers are tried before giving
/// up.
pub fn resolve_data_columns(
    requested: &str,
    available: &[String],
) -> Result<Vec<String>, ImportError> {
    if requested == "*" {
        let externals = external_columns(available);
        if externals.is_empty() {
            return Err(not_found(requested, available));
        }
        return Ok(externals);
    }

    let wanted = split_column_list(requested);
    // trimmed name -> actual header, so stray whitespace in a file still
    // matches
    let by_trimmed: HashMap<String, &String> = available
        .iter()
        .map(|column| (column.trim().to_string(), column))
        .collect();

    let found: Vec<String> = wanted
        .iter()
        .filter_map(|column| by_trimmed.get(column).map(|actual| (*actual).clone()))
        .collect();
    if !found.is_empty() {
        return Ok(found);
    }

    // The spec itself may be a column name that happens to contain commas.
    if available.iter().any(|column| column == requested) {
        return Ok(vec![requested.to_string()]);
    }

    if requested == DEFAULT_TEXT_COLUMN {
        let exact = alias_columns(available, &TEXT_ALIASES, MatchKind::Exact);
        if !exact.is_empty() {
            return Ok(exact);
        }
        let partial = alias_columns(available, &TEXT_ALIASES, MatchKind::Substring);
        if !partial.is_empty() {
            return Ok(partial);
        }
        let externals = external_columns(available);
        if !externals.is_empty() {
            tracing::debug!(
                columns = ?externals,
                "no text column matched, falling back to every external column"
            );
            return Ok(externals);
        }
    }

    Err(not_found(requested, available))
}

/// Resolves the configured label-column spec. Label columns are optional
/// for many project types, so a spec that matches nothing is `None`, never
/// an error.
pub fn resolve_label_columns(requested: &str, available: &[String]) -> Option<Vec<String>> {
    let wanted = split_column_list(requested);
    let by_trimmed: HashMap<String, &String> = available
        .iter()
        .map(|column| (column.trim().to_string(), column))
        .collect();

    if wanted.len() > 1 {
        let found: Vec<String> = wanted
            .iter()
            .filter_map(|column| by_trimmed.get(column).map(|actual| (*actual).clone()))
            .collect();
        if !found.is_empty() {
            return Some(found);
        }
    }

    if available.iter().any(|column| column == requested) {
        return Some(vec![requested.to_string()]);
    }

    if requested == DEFAULT_LABEL_COLUMN {
        let exact = alias_columns(available, &LABEL_ALIASES, MatchKind::Exact);
        if let Some(column) = exact.into_iter().next() {
            return Some(vec![column]);
        }
        let partial = alias_columns(available, &LABEL_ALIASES, MatchKind::Substring);
        if let Some(column) = partial.into_iter().next() {
            return Some(vec![column]);
        }
    }

    None
}

/// Resolves one optional auxiliary column (comments, corrections) by exact
/// name first, then by each alias in order, case-insensitively.
pub fn resolve_alias_column(
    requested: &str,
    available: &[String],
    aliases: &[&str],
) -> Option<String> {
    if available.iter().any(|column| column == requested) {
        return Some(requested.to_string());
    }

    for alias in aliases {
        for column in available {
            if column.eq_ignore_ascii_case(alias) {
                return Some(column.clone());
            }
        }
    }
    None
}

/// Whether a cell holds no usable data once trimmed. Spreadsheet exports
/// routinely serialize missing values as literal `nan` or `none`.
pub fn is_blank_value(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("nan")
        || trimmed.eq_ignore_ascii_case("none")
}

/// Every column the user supplied, i.e. everything not injected by the
/// upload pipeline itself.
pub fn external_columns(available: &[String]) -> Vec<String> {
    available
        .iter()
        .filter(|column| !is_reserved(column))
        .cloned()
        .collect()
}

fn is_reserved(column: &str) -> bool {
    RESERVED_COLUMNS.contains(&column)
}

/// Splits a column spec on commas, tolerating the full-width comma that
/// spreadsheets localized for CJK locales produce.
fn split_column_list(requested: &str) -> Vec<String> {
    requested
        .replace('，', ",")
        .split(',')
        .map(|column| column.trim().to_string())
        .filter(|column| !column.is_empty())
        .collect()
}

enum MatchKind {
    Exact,
    Substring,
}

fn alias_columns(available: &[String], aliases: &[&str], kind: MatchKind) -> Vec<String> {
    available
        .iter()
        .filter(|column| !is_reserved(column))
        .filter(|column| {
            let lowered = column.to_lowercase();
            aliases.iter().any(|alias| match kind {
                MatchKind::Exact => lowered == *alias,
                MatchKind::Substring => lowered.contains(alias),
            })
        })
        .cloned()
        .collect()
}

fn not_found(requested: &str, available: &[String]) -> ImportError {
    let available = external_columns(available)
        .iter()
        .map(|column| format!("'{}'", column))
        .collect::<Vec<_>>()
        .join(", ");
    ImportError::ColumnNotFound {
        requested: requested.to_string(),
        available,
    }
}
