//! publish-registry CLI
//!
//! Publishes a new types-registry release when packages were added.

use anyhow::{Context, Result};
use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use types_registry_publisher::{
    CliOverrides, ConfigLoadOptions, ConfigLoader, FsAdditionsSource, FsPackageReader,
    NpmClientFactory, NpmRegistryClient, RegistryError, RegistryPublisher, RunOutcome,
    init_tracing,
};

/// Publish the types-registry package
#[derive(Parser)]
#[command(name = "publish-registry")]
#[command(version)]
#[command(about = "Publish a new types-registry release when packages were added", long_about = None)]
struct Cli {
    /// Generate and validate the package without uploading it
    #[arg(long)]
    dry: bool,

    /// Config file (defaults to ./.types-registry.yaml if present)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Output root directory
    #[arg(long, value_name = "PATH")]
    output_dir: Option<PathBuf>,

    /// Directory holding typesData.json and additions.json
    #[arg(long, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    /// Directory the run log is written to
    #[arg(long, value_name = "PATH")]
    logs_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let result = run().await;

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            match e.downcast_ref::<RegistryError>() {
                Some(error) => report_error(error),
                None => {
                    eprintln!("\n❌ Error");
                    eprintln!("{:#}", e);
                }
            }
            process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let project_path = std::env::current_dir().context("failed to read current directory")?;
    let env: HashMap<String, String> = std::env::vars().collect();

    let config = ConfigLoader::load(ConfigLoadOptions {
        project_path,
        config_file: cli.config,
        cli: CliOverrides {
            output_root: cli.output_dir,
            data_dir: cli.data_dir,
            logs_dir: cli.logs_dir,
        },
        env,
    })
    .await?;

    let publisher = RegistryPublisher::new(
        &config,
        Arc::new(FsPackageReader::new(&config.paths.data_dir)),
        Arc::new(FsAdditionsSource::new(&config.paths.data_dir)),
        Arc::new(NpmRegistryClient::new(&config.npm)),
        Arc::new(NpmClientFactory::new(config.npm.clone())),
    );

    let result = publisher
        .run_and_persist(cli.dry, &config.paths.logs_dir)
        .await;

    match result {
        Ok(RunOutcome::Skipped) => {
            println!("\n✅ No new packages, nothing to publish");
            Ok(0)
        }
        Ok(RunOutcome::Published { version, dry }) => {
            if dry {
                println!("\n✅ Dry run of {}@{} completed", config.package.name, version);
            } else {
                println!("\n✅ Published {}@{}", config.package.name, version);
            }
            Ok(0)
        }
        Err(e) => {
            report_error(&e);
            Ok(1)
        }
    }
}

fn report_error(error: &RegistryError) {
    eprintln!("\n❌ Publishing failed [{}]", error.code());
    eprintln!("{}", error);

    let actions = error.suggested_actions();
    if !actions.is_empty() {
        eprintln!("\nSuggested actions:");
        for action in actions {
            eprintln!("  - {}", action);
        }
    }
}
