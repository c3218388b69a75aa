use std::process::ExitCode;

use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use bpa_submission_generator::app::{App, ExportOptions};
use bpa_submission_generator::ckan::CkanHttpClient;
use bpa_submission_generator::config::{ConfigLoader, ConfigOverrides};
use bpa_submission_generator::domain::Exporter;
use bpa_submission_generator::error::SubmitError;
use bpa_submission_generator::output::JsonOutput;
use bpa_submission_generator::project::project_for;
use bpa_submission_generator::store::SubmissionStore;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\n\n",
    "Copyright 2017 CCG, Murdoch University\n",
    "License GPLv3+: GNU GPL version 3 or later <http://gnu.org/licenses/gpl.html>.\n",
    "This is free software: you are free to change and redistribute it.\n",
    "There is NO WARRANTY, to the extent permitted by law."
);

#[derive(Parser)]
#[command(name = "bpa-submit")]
#[command(about = "Generate NCBI BioSample and SRA submission files from BPA CKAN metadata")]
#[command(version, long_version = LONG_VERSION, author)]
struct Cli {
    /// CKAN API key
    #[arg(short = 'k', long, env = "CKAN_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// CKAN base url
    #[arg(short = 'u', long)]
    ckan_url: Option<String>,

    #[arg(long)]
    config: Option<String>,

    /// Directory for the generated files
    #[arg(short, long)]
    output_dir: Option<String>,

    /// Maximum SRA rows per output file
    #[arg(long)]
    sra_chunk_size: Option<usize>,

    /// Build the submission without writing files
    #[arg(long)]
    dry_run: bool,

    #[arg(short, long)]
    verbose: bool,

    exporter: Exporter,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<SubmitError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &SubmitError) -> u8 {
    match error {
        SubmitError::ConfigRead(_)
        | SubmitError::ConfigParse(_)
        | SubmitError::InvalidConfig(_)
        | SubmitError::MissingCkanUrl => 2,
        SubmitError::CkanHttp(_) | SubmitError::CkanStatus { .. } | SubmitError::CkanPayload(_) => {
            3
        }
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let resolved = ConfigLoader::resolve(
        cli.config.as_deref(),
        ConfigOverrides {
            ckan_url: cli.ckan_url,
            output_dir: cli.output_dir,
            sra_chunk_size: cli.sra_chunk_size,
        },
    )?;
    let ckan_url = resolved.ckan_url.as_deref().ok_or(SubmitError::MissingCkanUrl)?;
    if cli.api_key.is_none() {
        tracing::warn!("no CKAN API key given; private packages will not be visible");
    }

    let ckan = CkanHttpClient::new(ckan_url, cli.api_key.as_deref())?;
    let store = SubmissionStore::new(resolved.output_dir.clone());
    let app = App::new(store, ckan);
    let project = project_for(cli.exporter);
    let options = ExportOptions {
        dry_run: cli.dry_run,
        sra_chunk_size: resolved.sra_chunk_size,
        search_limit: resolved.search_limit,
        embargo_months: resolved.embargo_months,
        today: chrono::Local::now().date_naive(),
    };

    tracing::info!("exporting {} from {ckan_url}", cli.exporter);
    let report = app.export(project.as_ref(), &options, &JsonOutput)?;
    JsonOutput::print_export(&report).into_diagnostic()?;
    Ok(())
}
