use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::builder::RangedU64ValueParser;
use clap::{ArgAction, CommandFactory, Parser};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use keggpull::app::{App, ExportOptions, ExportResult, default_output_path};
use keggpull::config::ConfigLoader;
use keggpull::domain::OrganismCode;
use keggpull::error::KeggError;
use keggpull::kegg::{Endpoints, KeggHttpClient};
use keggpull::output::{JsonOutput, LogProgress};

#[derive(Parser)]
#[command(name = "keggpull")]
#[command(about = "Tabulate and export all pathways and their compounds for a given KEGG organism")]
#[command(version)]
struct Cli {
    #[arg(short, long, value_name = "ORG", help = "three letter organism code e.g. hsa")]
    organism: Option<String>,

    #[arg(
        short = 'f',
        long = "output-file",
        value_name = "OUT",
        help = "output file name (default: ORG_YYYYmmddHHMMSS.tsv)"
    )]
    output_file: Option<Utf8PathBuf>,

    #[arg(short, long, action = ArgAction::Count, help = "-v for INFO, -vv for DEBUG")]
    verbose: u8,

    #[arg(long, value_name = "PATH", help = "JSON config file (default: ./keggpull.json if present)")]
    config: Option<String>,

    #[arg(
        long,
        value_name = "N",
        value_parser = RangedU64ValueParser::<usize>::new().range(1..),
        help = "maximum number of concurrent KGML downloads"
    )]
    concurrency: Option<usize>,

    #[arg(long, help = "drop repeated compounds within a pathway")]
    dedup: bool,

    #[arg(long, help = "print the export summary as JSON on stdout")]
    json: bool,
}

fn main() -> ExitCode {
    if std::env::args_os().len() <= 1 {
        let _ = Cli::command().print_help();
        return ExitCode::from(1);
    }

    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<KeggError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &KeggError) -> u8 {
    match error {
        KeggError::MissingOrganism
        | KeggError::InvalidOrganismCode(_)
        | KeggError::ConfigRead(_)
        | KeggError::ConfigParse(_) => 2,
        KeggError::KeggHttp(_)
        | KeggError::ListFetchFailed { .. }
        | KeggError::MarkupFetchFailed { .. } => 3,
        KeggError::EmptyResultSet(_) => 4,
        _ => 1,
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("warn,keggpull={level}")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let organism: OrganismCode = cli
        .organism
        .as_deref()
        .ok_or(KeggError::MissingOrganism)?
        .parse()?;
    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let output = cli
        .output_file
        .unwrap_or_else(|| default_output_path(&organism, chrono::Local::now()));
    let options = ExportOptions {
        concurrency: cli.concurrency.unwrap_or(config.concurrency),
        dedup: cli.dedup,
    };
    tracing::debug!(?config, ?options, %output, "resolved run settings");

    let client = KeggHttpClient::new(Endpoints::new(config.base_url.as_str()), config.timeout)?;
    tracing::info!("Using KEGG REST base {}", client.endpoints().base_url());
    let app = App::new(client);

    if cli.json {
        let result = app.export(&organism, &output, &options, &JsonOutput)?;
        JsonOutput::print_export(&result).into_diagnostic()?;
    } else {
        let result = app.export(&organism, &output, &options, &LogProgress)?;
        print_export_summary(&result);
    }
    Ok(())
}

fn print_export_summary(result: &ExportResult) {
    println!(
        "{}: {}/{} pathways, {} compounds -> {} ({} rows x {} columns)",
        result.organism,
        result.pathways_exported,
        result.pathways_listed,
        result.compounds_extracted,
        result.output_path,
        result.table_rows,
        result.table_columns
    );
    for failure in &result.failures {
        println!("  skipped {}: {}", failure.pathway, failure.reason);
    }
}
