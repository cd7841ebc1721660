use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::domain::{OrganismCode, PathwayCode, PathwayCompoundRow};
use crate::error::KeggError;
use crate::fanout::fetch_all;
use crate::kegg::{KeggClient, parse_pathway_list};
use crate::kgml::{dedup_compounds, document_pathway_code, extract_compounds, parse_kgml};
use crate::output::write_table_atomic;
use crate::table::RectangularTable;

pub const DEFAULT_CONCURRENCY: usize = 8;

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub concurrency: usize,
    pub dedup: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            dedup: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportResult {
    pub organism: String,
    pub output_path: String,
    pub pathways_listed: usize,
    pub pathways_exported: usize,
    pub compounds_extracted: usize,
    pub table_rows: usize,
    pub table_columns: usize,
    pub failures: Vec<PathwayFailure>,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PathwayFailure {
    pub pathway: String,
    pub reason: String,
}

/// Rows gathered for one organism before the table is shaped.
#[derive(Debug, Clone)]
pub struct CollectedRows {
    pub pathways_listed: usize,
    pub rows: Vec<PathwayCompoundRow>,
    pub failures: Vec<PathwayFailure>,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink: Send + Sync {
    fn event(&self, event: ProgressEvent);
}

#[derive(Clone)]
pub struct App<K: KeggClient> {
    client: K,
}

impl<K: KeggClient> App<K> {
    pub fn new(client: K) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &K {
        &self.client
    }

    pub fn export(
        &self,
        organism: &OrganismCode,
        output: &Utf8Path,
        options: &ExportOptions,
        sink: &dyn ProgressSink,
    ) -> Result<ExportResult, KeggError> {
        let started = Instant::now();
        let collected = self.collect_rows(organism, options, sink)?;
        if collected.rows.is_empty() {
            return Err(KeggError::EmptyResultSet(format!(
                "none of the {} pathways of {organism} could be parsed",
                collected.pathways_listed
            )));
        }

        let pathways_exported = collected.rows.len();
        let compounds_extracted = collected.rows.iter().map(|row| row.compounds.len()).sum();

        sink.event(ProgressEvent {
            message: format!("phase=Shape; {pathways_exported} pathways"),
            elapsed: Some(started.elapsed()),
        });
        let table = RectangularTable::from_pathway_rows(collected.rows)?;
        let (table_rows, table_columns) = table.dimensions();

        sink.event(ProgressEvent {
            message: format!("phase=Write; {output}"),
            elapsed: Some(started.elapsed()),
        });
        write_table_atomic(output, &table)?;
        info!("Table created: {output}");

        Ok(ExportResult {
            organism: organism.to_string(),
            output_path: output.to_string(),
            pathways_listed: collected.pathways_listed,
            pathways_exported,
            compounds_extracted,
            table_rows,
            table_columns,
            failures: collected.failures,
            elapsed_ms: u64::try_from(started.elapsed().as_millis())
                .unwrap_or(u64::MAX),
        })
    }

    /// Lists, downloads and extracts every pathway of `organism`.
    ///
    /// Only the pathway list is fatal. Download and parse failures are
    /// recorded per pathway and the pathway is left out of `rows`.
    pub fn collect_rows(
        &self,
        organism: &OrganismCode,
        options: &ExportOptions,
        sink: &dyn ProgressSink,
    ) -> Result<CollectedRows, KeggError> {
        sink.event(ProgressEvent {
            message: format!("phase=Resolve; listing pathways of {organism}"),
            elapsed: None,
        });
        let listing = self.client.fetch_pathway_list(organism)?;
        let pathways = parse_pathway_list(&listing)?;
        if pathways.is_empty() {
            return Err(KeggError::EmptyResultSet(format!(
                "KEGG lists no pathways for {organism}"
            )));
        }
        info!(
            "Path List RECEIVED for {organism}: {} Pathways.",
            pathways.len()
        );

        let fetches = fetch_all(&self.client, &pathways, options.concurrency, sink);

        let mut rows = Vec::with_capacity(fetches.len());
        let mut failures = Vec::new();
        for fetch in fetches {
            let extracted = fetch
                .outcome
                .and_then(|body| extract_row(&fetch.pathway, &body));
            match extracted {
                Ok(mut row) => {
                    if options.dedup {
                        dedup_compounds(&mut row);
                    }
                    debug!(
                        pathway = %row.pathway,
                        compounds = row.compounds.len(),
                        "pathway extracted"
                    );
                    rows.push(row);
                }
                Err(err) => {
                    error!(pathway = %fetch.pathway, "{err}");
                    failures.push(PathwayFailure {
                        pathway: fetch.pathway.to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }
        failures.sort_by(|a, b| a.pathway.cmp(&b.pathway));

        Ok(CollectedRows {
            pathways_listed: pathways.len(),
            rows,
            failures,
        })
    }
}

fn extract_row(pathway: &PathwayCode, body: &str) -> Result<PathwayCompoundRow, KeggError> {
    let document = parse_kgml(pathway, body)?;
    if let Some(declared) = document_pathway_code(&document) {
        if declared != pathway.as_str() {
            warn!(pathway = %pathway, declared = %declared, "KGML declares a different pathway");
        }
    }
    extract_compounds(pathway, &document)
}

/// `{organism}_{YYYYmmddHHMMSS}.tsv` in the working directory.
pub fn default_output_path(
    organism: &OrganismCode,
    now: chrono::DateTime<chrono::Local>,
) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{organism}_{}.tsv", now.format("%Y%m%d%H%M%S")))
}
