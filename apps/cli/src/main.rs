//! fhirmap command-line interface
//!
//! Usage:
//!   fhirmap normalize profile.json --pretty
//!   fhirmap children profile.json Observation.component --package core/*.json
//!   fhirmap has-type string code uri --package core/*.json

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fhirmap_context::InMemoryContext;
use fhirmap_fhirpath::{CollectionStatus, TypeDetails};
use fhirmap_models::StructureDefinition;
use fhirmap_snapshot::{normalize, ChildMapResolver};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fhirmap")]
#[command(about = "Normalize and navigate FHIR StructureDefinitions")]
#[command(version)]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rewrite repeated differential paths into explicit slicing
    Normalize {
        /// StructureDefinition JSON file
        file: PathBuf,
    },
    /// List the direct children of a snapshot element
    Children {
        /// StructureDefinition JSON file with a snapshot
        file: PathBuf,
        /// Element id, e.g. Observation.component
        element_id: String,
        /// Additional conformance resources for resolving external contentReferences
        #[arg(short, long = "package")]
        packages: Vec<PathBuf>,
    },
    /// Check whether any of the names is the type or one of its base types
    HasType {
        /// Type name or canonical URL
        type_name: String,
        /// Candidate type names
        #[arg(required = true)]
        names: Vec<String>,
        /// StructureDefinitions providing the base-definition chain
        #[arg(short, long = "package")]
        packages: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match &cli.command {
        Commands::Normalize { file } => run_normalize(file, cli.pretty),
        Commands::Children {
            file,
            element_id,
            packages,
        } => run_children(file, element_id, packages, cli.pretty),
        Commands::HasType {
            type_name,
            names,
            packages,
        } => run_has_type(type_name, names, packages),
    }
}

fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run_normalize(file: &Path, pretty: bool) -> Result<()> {
    let mut sd = read_structure_definition(file)?;
    normalize(&mut sd).with_context(|| format!("failed to normalize {}", sd.url))?;
    info!(url = %sd.url, elements = sd.differential_elements().len(), "normalized differential");

    print_json(&serde_json::to_value(&sd)?, pretty)
}

fn run_children(file: &Path, element_id: &str, packages: &[PathBuf], pretty: bool) -> Result<()> {
    let sd = read_structure_definition(file)?;
    let mut context = load_context(packages)?;
    context.add_structure_definition(&sd)?;

    let element = sd
        .snapshot
        .as_ref()
        .and_then(|s| s.get_element_by_id(element_id))
        .with_context(|| format!("element '{}' not found in snapshot of {}", element_id, sd.url))?;

    let mut resolver = ChildMapResolver::new(&context);
    let children = resolver.children(&sd, element)?;
    let ids: Vec<Value> = children
        .iter()
        .map(|e| Value::String(e.id.clone().unwrap_or_else(|| e.key())))
        .collect();

    print_json(&Value::Array(ids), pretty)
}

fn run_has_type(type_name: &str, names: &[String], packages: &[PathBuf]) -> Result<()> {
    let context = load_context(packages)?;
    let details = TypeDetails::new(CollectionStatus::Singleton, [type_name]);
    let names: Vec<&str> = names.iter().map(String::as_str).collect();

    let found = details.has_type(&context, &names)?;
    debug!(types = %details, ?names, found, "type membership");
    println!("{}", found);
    Ok(())
}

fn read_json(path: &Path) -> Result<Value> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn read_structure_definition(path: &Path) -> Result<StructureDefinition> {
    let value = read_json(path)?;
    StructureDefinition::from_value(&value)
        .with_context(|| format!("{} is not a StructureDefinition", path.display()))
}

/// Load conformance resources from files; a Bundle contributes each entry resource.
fn load_context(paths: &[PathBuf]) -> Result<InMemoryContext> {
    let mut context = InMemoryContext::new();
    for path in paths {
        let value = read_json(path)?;
        let resources = match value.get("resourceType").and_then(Value::as_str) {
            Some("Bundle") => value
                .get("entry")
                .and_then(Value::as_array)
                .map(|entries| {
                    entries
                        .iter()
                        .filter_map(|e| e.get("resource").cloned())
                        .collect()
                })
                .unwrap_or_default(),
            Some(_) => vec![value],
            None => bail!("{} is not a FHIR resource", path.display()),
        };

        for resource in resources {
            if resource.get("url").is_none() {
                debug!(path = %path.display(), "skipping resource without url");
                continue;
            }
            context.add_resource(resource)?;
        }
    }
    info!(resources = context.len(), "loaded conformance resources");
    Ok(context)
}

fn print_json(value: &Value, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", out);
    Ok(())
}
