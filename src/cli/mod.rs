//! CLI command handling
//!
//! Dispatches CLI commands: catalog queries and authoring run locally,
//! `run` and `exec` bring up transports against a target.

use std::io::Read;
use std::path::PathBuf;

use tracing::debug;

use crate::catalog::{Catalog, SpecKind};
use crate::client::{self, Client, LocalClient};
use crate::commands::{Commands, EntryKind, ListKind};
use crate::common::{config::Config, paths, Error, Result};
use crate::resolver;
use crate::router::{CommandRouter, HOST_CONTEXT, TARGET_CONTEXT};
use crate::runner::{EventFormat, Runner};
use crate::target::TargetUri;

/// Output delimiters for `exec --delimited`
const OUTPUT_START: &str = "--8<--";
const OUTPUT_END: &str = "-->8--";

impl From<EntryKind> for SpecKind {
    fn from(kind: EntryKind) -> Self {
        match kind {
            EntryKind::Test => SpecKind::Test,
            EntryKind::Suite => SpecKind::Suite,
        }
    }
}

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, config: &Config, extra_paths: &[PathBuf]) -> Result<()> {
    match command {
        Commands::List { kind } => {
            let catalog = load_catalog(config, extra_paths)?;
            match kind {
                ListKind::Tests { details } => {
                    for spec in catalog.tests() {
                        print_entry(&spec.name, &spec.brief, details);
                    }
                }
                ListKind::Suites { details } => {
                    for spec in catalog.suites() {
                        print_entry(&spec.name, &spec.brief, details);
                    }
                }
            }
            Ok(())
        }

        Commands::Show { kind, name } => {
            let catalog = load_catalog(config, extra_paths)?;
            println!("{}", catalog.describe(kind.into(), &name)?);
            Ok(())
        }

        Commands::New {
            kind,
            name,
            output,
            template,
        } => {
            let mut catalog = load_catalog(config, extra_paths)?;
            let dir = output
                .or_else(|| spec_dir(config, extra_paths))
                .ok_or_else(|| {
                    Error::Config("no spec directory configured; pass --output".to_string())
                })?;
            catalog.create(kind.into(), &name, &dir, template.as_deref())
        }

        Commands::Edit { kind, name } => {
            let catalog = load_catalog(config, extra_paths)?;
            catalog.edit(kind.into(), &name)
        }

        Commands::Run {
            format,
            target,
            names,
        } => {
            // Resolve everything before touching any transport
            let format = format.as_deref().unwrap_or(&config.events.format);
            let format = EventFormat::parse(format)?;

            let catalog = load_catalog(config, extra_paths)?;
            let names = expand_names(names)?;
            let root = resolver::build(&names, &catalog)?;

            let uri = target_uri(target, config)?;
            let mut router =
                CommandRouter::new(TARGET_CONTEXT, client::create_client(&uri, config)?);
            router.register(HOST_CONTEXT, Box::new(LocalClient::new()));

            let mut sink = format.into_sink();
            let result = Runner::new(&mut router, sink.as_mut()).run(&root).await?;

            debug!(
                "{} of {} tests failed",
                result.failure_count(),
                result.test_count()
            );
            if result.is_success() {
                Ok(())
            } else {
                Err(Error::RunFailed)
            }
        }

        Commands::Exec {
            delimited,
            target,
            commands,
        } => {
            let uri = target_uri(target, config)?;
            let mut client = client::create_client(&uri, config)?;

            client.connect().await?;
            let result = exec_commands(client.as_mut(), &commands, delimited).await;
            client.disconnect().await;
            result
        }
    }
}

async fn exec_commands(
    client: &mut dyn Client,
    commands: &[String],
    delimited: bool,
) -> Result<()> {
    for command in commands {
        let output = client.execute(command).await?;
        if delimited {
            println!("{OUTPUT_START}\n{}\n{OUTPUT_END}", output.trim_end());
        } else {
            print!("{output}");
        }
    }
    Ok(())
}

/// Build and scan the spec catalog
///
/// Search order: paths given on the command line, then configured
/// paths, then the per-user default directory. First loaded name wins
/// on duplicates.
fn load_catalog(config: &Config, extra_paths: &[PathBuf]) -> Result<Catalog> {
    let mut catalog = Catalog::new(config.editor());
    for path in extra_paths {
        catalog.add_search_path(path.clone());
    }
    for path in &config.paths {
        catalog.add_search_path(path.clone());
    }
    if let Some(path) = paths::default_specs_dir() {
        catalog.add_search_path(path);
    }
    catalog.scan()?;
    Ok(catalog)
}

/// Directory for newly created spec files
fn spec_dir(config: &Config, extra_paths: &[PathBuf]) -> Option<PathBuf> {
    extra_paths
        .first()
        .or_else(|| config.paths.first())
        .cloned()
        .or_else(paths::default_specs_dir)
}

/// Parse the target URI, falling back to the configured default, and
/// merge in configured default credentials
fn target_uri(target: Option<String>, config: &Config) -> Result<TargetUri> {
    let uri = match target.or_else(|| config.target.uri.clone()) {
        Some(uri) => uri,
        None => {
            return Err(Error::Config(
                "no target given and no default target configured".to_string(),
            ))
        }
    };
    Ok(TargetUri::parse(&uri)?.with_credentials(&config.target))
}

/// Replace a literal "-" in the selection with names read from stdin
fn expand_names(names: Vec<String>) -> Result<Vec<String>> {
    if !names.iter().any(|n| n == "-") {
        return Ok(names);
    }

    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    let piped: Vec<String> = input.split_whitespace().map(str::to_string).collect();

    let mut expanded = Vec::new();
    for name in names {
        if name == "-" {
            expanded.extend(piped.iter().cloned());
        } else {
            expanded.push(name);
        }
    }
    Ok(expanded)
}

fn print_entry(name: &str, brief: &str, details: bool) {
    if details {
        println!("{name:<32} {brief}");
    } else {
        println!("{name}");
    }
}
