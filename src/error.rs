use thiserror::Error;

use crate::boxscore::side::Side;

/// Failure to classify one raw line of a box score file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown record kind '{0}'")]
    UnknownKind(String),

    #[error("unknown {kind} sub-kind '{sub_kind}'")]
    UnknownSubKind { kind: &'static str, sub_kind: String },

    #[error("{record} record has {found} fields, expected at least {expected}")]
    TooFewFields {
        record: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("invalid side indicator '{0}' (expected 0 or 1)")]
    InvalidSide(String),

    #[error("field {index} ({what}) is not a number: '{raw}'")]
    InvalidField {
        index: usize,
        what: &'static str,
        raw: String,
    },

    #[error("numeric field {index} holds '{raw}', outside the digit alphabet")]
    InvalidNumber { index: usize, raw: String },
}

/// Fatal ingestion failure. Any of these means the file is corrupt and the
/// run is aborted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error("line {line}: {source}")]
    Parse { line: usize, source: ParseError },

    #[error("line {line}: {kind} record appears before the first version record")]
    NoActiveGame { line: usize, kind: &'static str },

    #[error("line {line}: {side} side referenced before its team is known")]
    UnresolvedSide { line: usize, side: Side },

    #[error("line {line}: stat record appears before info,date")]
    MissingDate { line: usize },

    #[error("line {line}: invalid date '{raw}' (expected YYYY/MM/DD)")]
    InvalidDate { line: usize, raw: String },
}

/// Failure to load the roster directory.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("failed to read roster {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in roster {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("invalid roster pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("cannot list roster files: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("roster {path} line {line}: expected at least 6 fields")]
    ShortRow { path: String, line: u64 },
}
