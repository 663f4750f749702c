mod cli;

use crate::cli::{Command, LogFormat, CLI};
use clap::Parser;
use snip_core::Backend;
use snip_shortener::{LinkStore, Resolution, StoreError, SubmitOutcome};
use snip_storage::open_backend;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = CLI::parse();
    init_tracing(config.log_format);

    let backend_config = config.store.backend_config()?;
    info!(storage_backend = backend_config.name(), "opening link store");

    let backend = open_backend(&backend_config).await?;
    let store = LinkStore::open(backend).await?;

    let status = run(&store, config.command).await?;
    store.close().await;

    Ok(status)
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run<B: Backend>(store: &LinkStore<B>, command: Command) -> anyhow::Result<ExitCode> {
    match command {
        Command::Shorten {
            owner,
            base_url,
            urls,
        } => {
            let mut status = ExitCode::SUCCESS;
            let display = |code: &snip_shortener::ShortCode| match &base_url {
                Some(base) => code.to_url(base),
                None => code.to_string(),
            };

            let results = store.submit_batch(&owner, &urls).await;
            for (url, result) in urls.iter().zip(results) {
                match result {
                    Ok(submission) => {
                        let label = match submission.outcome {
                            SubmitOutcome::Created => "created",
                            SubmitOutcome::AlreadyOwned => "exists",
                        };
                        println!("{label}\t{}\t{url}", display(&submission.code));
                    }
                    Err(StoreError::Conflict(code)) => {
                        println!("conflict\t{}\t{url}", display(&code));
                        status = ExitCode::FAILURE;
                    }
                    Err(e) => {
                        eprintln!("error\t{url}\t{e}");
                        status = ExitCode::FAILURE;
                    }
                }
            }
            Ok(status)
        }
        Command::Resolve { code } => match store.resolve(&code).await {
            Resolution::Active(url) => {
                println!("{url}");
                Ok(ExitCode::SUCCESS)
            }
            Resolution::Deleted => {
                eprintln!("{code}: deleted");
                Ok(ExitCode::FAILURE)
            }
            Resolution::NotFound => {
                eprintln!("{code}: not found");
                Ok(ExitCode::FAILURE)
            }
        },
        Command::List {
            owner,
            include_deleted,
        } => {
            let Some(entries) = store.list(&owner).await else {
                eprintln!("{owner} has no links");
                return Ok(ExitCode::SUCCESS);
            };

            for entry in entries
                .into_iter()
                .filter(|entry| include_deleted || !entry.deleted)
            {
                let marker = if entry.deleted { "\tdeleted" } else { "" };
                println!("{}\t{}{marker}", entry.code, entry.url);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Delete { owner, codes } => {
            for code in &codes {
                let flipped = store.mark_deleted(&owner, code).await?;
                println!("{}\t{code}", if flipped { "deleted" } else { "unchanged" });
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Ping => {
            if store.health_check().await {
                println!("ok");
                Ok(ExitCode::SUCCESS)
            } else {
                eprintln!("storage backend unreachable");
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
