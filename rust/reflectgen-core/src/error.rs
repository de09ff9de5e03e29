use std::path::PathBuf;
use thiserror::Error;

/// Fatal lexer conditions. The tokenizer keeps scanning after one of these so
/// that later diagnostics still carry positions, but the file is unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unterminated string literal at {line}:{column}")]
    UnterminatedString { line: usize, column: usize },

    #[error("unexpected number literal at {line}:{column}")]
    MalformedNumber { line: usize, column: usize },
}

/// First structural error met while parsing one file. The parser does not
/// resynchronise after it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at {} in line {line}:{column}", .file.display())]
pub struct ParseError {
    pub message: String,
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
}

/// Why a single source file contributed nothing to this run.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("tokenizer failed for {}: {}", .path.display(), join_lex_errors(.errors))]
    Lex { path: PathBuf, errors: Vec<LexError> },

    #[error("parser failed: {0}")]
    Parse(#[from] ParseError),
}

fn join_lex_errors(errors: &[LexError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed cache: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("failed to create output directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    WriteArtifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("can't find '{}'", .0.display())]
    MissingDirectory(PathBuf),

    #[error("failed to resolve {}: {source}", .path.display())]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
