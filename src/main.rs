//! ctgov - Download and cache the ClinicalTrials.gov registry
//!
//! `get` loads the cached dump (downloading it first if needed), `stream`
//! prints studies straight from the API as JSON lines, and `republish`
//! refreshes the dump for upload to Zenodo.

use std::io::{self, Write};
use std::pin::pin;
use std::process::ExitCode;

use clap::Parser;
use futures::TryStreamExt;

use ctgov::archive::{self, ZenodoClient};
use ctgov::cli::{Cli, Command, StreamArgs};
use ctgov::config::Config;
use ctgov::data::StudyPager;
use ctgov::logging;

/// Writes studies from the API to stdout, one JSON object per line
async fn stream_studies(
    config: &Config,
    args: &StreamArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = config.studies_client()?;
    let mut studies = pin!(StudyPager::new(&client, args.fetch_options()).into_stream());
    let mut stdout = io::stdout().lock();
    let mut written = 0;

    while args.limit.map_or(true, |limit| written < limit) {
        let Some(study) = studies.try_next().await? else {
            break;
        };
        serde_json::to_writer(&mut stdout, &study)?;
        writeln!(stdout)?;
        written += 1;
    }

    stdout.flush()?;
    Ok(())
}

async fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = cli.config()?;

    match &cli.command {
        Command::Get { force } => {
            let cache = config.study_cache()?;
            let studies = cache.get_studies(*force).await?;
            println!(
                "{} studies cached at {}",
                studies.len(),
                cache.results_path().display()
            );
        }
        Command::Stream(args) => {
            stream_studies(&config, args).await?;
        }
        Command::Republish => {
            let cache = config.study_cache()?;
            archive::republish::<_, ZenodoClient>(&cache, None).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_json);

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
