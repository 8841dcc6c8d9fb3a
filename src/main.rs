mod cli;
mod error;
mod logging;

use crate::cli::{Args, Command, PackageArgs};
use crate::error::{ErrorKind, Result};
use burrow_catalog::{Database, Repository};
use burrow_config::{Config, DeletionMode};
use burrow_frameworks::compatible_frameworks;
use burrow_indexing::{
    DeletionBehavior, IndexEvent, IndexResult, OrphanEvent, Registry, RegistryOptions, index_files, orphans,
};
use burrow_protocol::service_index;
use burrow_storage::PackageStorage;
use burrow_storage::backend::{BoxSyncRead, LocalBackend};
use clap::Parser;
use exn::ResultExt;
use futures::StreamExt;
use serde::Serialize;
use serde_json::json;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let config = match Config::load(args.config.as_deref()).or_raise(|| ErrorKind::Config) {
        Ok(config) => config,
        Err(err) => {
            // Logging is configured by the file that just failed to load.
            eprintln!("{err:?}");
            return ExitCode::FAILURE;
        },
    };
    if let Err(err) = logging::init(&config.logging, args.verbose) {
        eprintln!("{err:?}");
        return ExitCode::FAILURE;
    }
    match run(args.command, &config).await {
        Ok(code) => code,
        Err(err) => {
            error!("{err:?}");
            ExitCode::FAILURE
        },
    }
}

async fn open(config: &Config) -> Result<(Database, Registry)> {
    let storage_root = std::path::absolute(&config.storage.path).or_raise(|| ErrorKind::Storage)?;
    let backend = LocalBackend::new("local", storage_root).or_raise(|| ErrorKind::Storage)?;
    if let Some(parent) = config.database.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Catalog)?;
    }
    let db = Database::connect(&config.database.path).await.or_raise(|| ErrorKind::Catalog)?;
    let options = RegistryOptions {
        base_url: config.base_url.clone(),
        allow_package_overwrites: config.allow_package_overwrites,
        deletion: match config.deletion {
            DeletionMode::Unlist => DeletionBehavior::Unlist,
            DeletionMode::HardDelete => DeletionBehavior::HardDelete,
        },
    };
    let registry = Registry::new(PackageStorage::new(Arc::new(backend)), Repository::from(&db), options);
    Ok((db, registry))
}

async fn run(command: Command, config: &Config) -> Result<ExitCode> {
    // Commands that do not need the catalog or blob store.
    match &command {
        Command::Frameworks { moniker } => {
            print_json(&*compatible_frameworks(moniker))?;
            return Ok(ExitCode::SUCCESS);
        },
        Command::ServiceIndex => {
            print_json(&service_index(&burrow_protocol::UrlGenerator::new(&config.base_url)))?;
            return Ok(ExitCode::SUCCESS);
        },
        _ => (),
    }

    let (db, registry) = open(config).await?;
    let result = dispatch(command, &registry).await;
    db.close().await;
    result
}

async fn dispatch(command: Command, registry: &Registry) -> Result<ExitCode> {
    match command {
        Command::Push { files } => return push(registry, files).await,
        Command::Search { query, filter } => {
            let response = registry.search().search(&filter.query(query)).await.or_raise(|| ErrorKind::Registry)?;
            print_json(&response)?;
        },
        Command::Autocomplete { id: Some(id), filter, .. } => {
            let search = registry.search();
            let response =
                search.versions(&id, filter.prerelease, filter.semver2).await.or_raise(|| ErrorKind::Registry)?;
            print_json(&response)?;
        },
        Command::Autocomplete { query, id: None, filter } => {
            let query = filter.query(query);
            let response = registry.search().autocomplete(&query).await.or_raise(|| ErrorKind::Registry)?;
            print_json(&response)?;
        },
        Command::Versions { id } => {
            let versions = registry.content().versions(&id).await.or_raise(|| ErrorKind::Registry)?;
            print_json(&found(versions, &id)?)?;
        },
        Command::Registration { id } => {
            let index = registry.metadata().registration_index(&id).await.or_raise(|| ErrorKind::Registry)?;
            print_json(&found(index, &id)?)?;
        },
        Command::Leaf { id, version } => {
            let leaf = registry.metadata().registration_leaf(&id, &version).await.or_raise(|| ErrorKind::Registry)?;
            print_json(&found(leaf, format!("{id} {version}"))?)?;
        },
        Command::Download { package: PackageArgs { id, version }, out } => {
            let reader = registry.content().download(&id, &version).await.or_raise(|| ErrorKind::Registry)?;
            let reader = found(reader, format!("{id} {version}"))?;
            let out = out.unwrap_or_else(|| {
                PathBuf::from(format!("{}.{}.nupkg", id.to_lowercase(), version.to_lower_normalized()))
            });
            save(reader, out).await?;
        },
        Command::Manifest { package: PackageArgs { id, version } } => {
            let reader = registry.content().manifest(&id, &version).await.or_raise(|| ErrorKind::Registry)?;
            print_blob(found(reader, format!("{id} {version}"))?).await?;
        },
        Command::Readme { package: PackageArgs { id, version } } => {
            let reader = registry.content().readme(&id, &version).await.or_raise(|| ErrorKind::Registry)?;
            print_blob(found(reader, format!("readme of {id} {version}"))?).await?;
        },
        Command::Icon { package: PackageArgs { id, version }, out } => {
            let reader = registry.content().icon(&id, &version).await.or_raise(|| ErrorKind::Registry)?;
            save(found(reader, format!("icon of {id} {version}"))?, out).await?;
        },
        Command::Unlist { package: PackageArgs { id, version } } => {
            let done = registry.deletion().unlist(&id, &version).await.or_raise(|| ErrorKind::Registry)?;
            found(done.then_some(()), format!("{id} {version}"))?;
        },
        Command::Relist { package: PackageArgs { id, version } } => {
            let done = registry.deletion().relist(&id, &version).await.or_raise(|| ErrorKind::Registry)?;
            found(done.then_some(()), format!("{id} {version}"))?;
        },
        Command::Delete { package: PackageArgs { id, version }, hard } => {
            let deletion = registry.deletion();
            let done = if hard {
                deletion.hard_delete(&id, &version).await
            } else {
                deletion.delete(&id, &version).await
            }
            .or_raise(|| ErrorKind::Registry)?;
            found(done.then_some(()), format!("{id} {version}"))?;
        },
        Command::Dependents { id } => {
            let response = registry.search().dependents(&id).await.or_raise(|| ErrorKind::Registry)?;
            print_json(&response)?;
        },
        Command::Orphans => {
            let mut events = std::pin::pin!(orphans(registry.storage(), registry.catalog()));
            while let Some(event) = events.next().await {
                match event.or_raise(|| ErrorKind::Registry)? {
                    OrphanEvent::Orphan { id, version } => print_line(&json!({ "id": id, "version": version }))?,
                    OrphanEvent::Complete(found) => info!(found, "orphan report complete"),
                    OrphanEvent::Started => (),
                }
            }
        },
        Command::Frameworks { .. } | Command::ServiceIndex => (),
    }
    Ok(ExitCode::SUCCESS)
}

/// Index every file, printing one JSON line per upload. Fails if any upload
/// was not indexed.
async fn push(registry: &Registry, files: Vec<PathBuf>) -> Result<ExitCode> {
    let mut failed = 0u64;
    let mut events = std::pin::pin!(index_files(registry.indexer(), files));
    while let Some(event) = events.next().await {
        match event {
            Ok(IndexEvent::Indexed { path, result }) => {
                if result != IndexResult::Success {
                    failed += 1;
                }
                print_line(&json!({ "path": path.display().to_string(), "result": format!("{result:?}") }))?;
            },
            Ok(IndexEvent::Started(total)) => info!(total, "indexing uploads"),
            Ok(IndexEvent::Complete) => info!(failed, "indexing complete"),
            Err(err) => {
                failed += 1;
                error!("{err:?}");
            },
        }
    }
    Ok(if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn found<T>(value: Option<T>, what: impl Into<String>) -> Result<T> {
    match value {
        Some(value) => Ok(value),
        None => exn::bail!(ErrorKind::NotFound(what.into())),
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).or_raise(|| ErrorKind::Output)?;
    writeln!(stdout).or_raise(|| ErrorKind::Output)
}

fn print_line(value: &impl Serialize) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer(&mut stdout, value).or_raise(|| ErrorKind::Output)?;
    writeln!(stdout).or_raise(|| ErrorKind::Output)
}

async fn print_blob(mut reader: BoxSyncRead) -> Result<()> {
    tokio::task::spawn_blocking(move || std::io::copy(&mut reader, &mut std::io::stdout().lock()))
        .await
        .or_raise(|| ErrorKind::Output)?
        .or_raise(|| ErrorKind::Output)?;
    Ok(())
}

async fn save(mut reader: BoxSyncRead, out: impl AsRef<Path>) -> Result<()> {
    let out = out.as_ref().to_path_buf();
    let written = tokio::task::spawn_blocking({
        let out = out.clone();
        move || std::io::copy(&mut reader, &mut std::fs::File::create(out)?)
    })
    .await
    .or_raise(|| ErrorKind::Output)?
    .or_raise(|| ErrorKind::Output)?;
    info!(path = %out.display(), written, "saved blob");
    Ok(())
}
