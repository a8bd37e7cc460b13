use std::process::ExitCode;

use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use boltz_manifest::app::{App, RunOptions};
use boltz_manifest::config::{ConfigLoader, ConfigOverrides};
use boltz_manifest::error::ManifestError;
use boltz_manifest::fs::RealFs;
use boltz_manifest::output::{OutputMode, Summary, print_summary};

#[derive(Parser)]
#[command(name = "boltz-manifest")]
#[command(about = "Build a JSON manifest of Boltz-2 structure and FASTA URLs from a UniProt ID spreadsheet")]
#[command(version, author)]
struct Cli {
    /// JSON config file (default: ./boltz-manifest.json)
    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    csv: Option<String>,

    #[arg(long)]
    dataset_root: Option<String>,

    /// Ancestor of the dataset root that URLs are relative to
    #[arg(long)]
    repository_root: Option<String>,

    #[arg(long)]
    output: Option<String>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    owner: Option<String>,

    #[arg(long)]
    repository: Option<String>,

    #[arg(long)]
    branch: Option<String>,

    /// Resolve everything but do not write the manifest
    #[arg(long)]
    dry_run: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<ManifestError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &ManifestError) -> u8 {
    match error {
        ManifestError::MissingIdentifierColumn { .. }
        | ManifestError::MissingConfig
        | ManifestError::ConfigRead(_)
        | ManifestError::ConfigParse(_)
        | ManifestError::MissingConfigValue(_)
        | ManifestError::InvalidConfig(_) => 2,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let overrides = ConfigOverrides {
        csv_path: cli.csv,
        dataset_root: cli.dataset_root,
        repository_root: cli.repository_root,
        output: cli.output,
        host: cli.host,
        owner: cli.owner,
        repository: cli.repository,
        branch: cli.branch,
    };
    let config = ConfigLoader::resolve(cli.config.as_deref(), overrides)?;

    let app = App::new(config, RealFs)?;
    let report = app.run(RunOptions {
        dry_run: cli.dry_run,
    })?;

    print_summary(&Summary::from_report(&report), output_mode).into_diagnostic()?;
    Ok(())
}
