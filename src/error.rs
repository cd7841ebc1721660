use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum KeggError {
    #[error("invalid organism code: {0}")]
    InvalidOrganismCode(String),

    #[error("invalid pathway code: {0}")]
    InvalidPathwayCode(String),

    #[error("invalid compound code: {0}")]
    InvalidCompoundCode(String),

    #[error("missing organism code")]
    #[diagnostic(help("provide a KEGG organism code, e.g. `--organism hsa` for Homo sapiens"))]
    MissingOrganism,

    #[error("KEGG request failed: {0}")]
    KeggHttp(String),

    #[error("pathway list request for {organism} failed with status code {status}")]
    ListFetchFailed { organism: String, status: u16 },

    #[error("KGML request for {pathway} failed with status code {status}")]
    MarkupFetchFailed { pathway: String, status: u16 },

    #[error("malformed KGML for {pathway}: {reason}")]
    MalformedMarkup { pathway: String, reason: String },

    #[error("nothing to export: {0}")]
    EmptyResultSet(String),

    #[error("table row {row} has {found} cells, expected {expected}")]
    RaggedTable {
        expected: usize,
        row: usize,
        found: usize,
    },

    #[error("fetch worker stopped before reporting {0}")]
    WorkerPanicked(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
