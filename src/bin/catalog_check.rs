//! Lint step catalogs.
//!
//! Validates every catalog named on the command line (or, with no paths, every
//! `*.json` under the content root's `catalogs/`) and prints each violation.
//! Unreachable graph nodes are reported as warnings. Exits 1 when any catalog
//! fails to load.

use anyhow::{Result, bail};
use dirt_guide::catalog::CatalogBody;
use dirt_guide::catalog::model::read_catalog_value;
use dirt_guide::schema_loader::CatalogSchema;
use dirt_guide::{SchemaError, StepCatalog, builtin, find_content_root, list_catalog_files};
use std::env;
use std::path::PathBuf;

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<bool> {
    dirt_guide::init_logging();
    let args = CliArgs::parse()?;
    let schema = match &args.schema {
        Some(path) => CatalogSchema::load(path)?,
        None => CatalogSchema::embedded()?,
    };

    let mut all_ok = true;
    if args.builtin {
        for (key, raw) in builtin::CATALOGS {
            let value = serde_json::from_str(raw)?;
            all_ok &= report(&format!("builtin:{key}"), StepCatalog::load_with_schema(&value, &schema));
        }
    }

    let files = if args.files.is_empty() && !args.builtin {
        list_catalog_files(&find_content_root()?)?
    } else {
        args.files
    };
    for path in files {
        let label = path.display().to_string();
        match read_catalog_value(&path) {
            Ok(value) => all_ok &= report(&label, StepCatalog::load_with_schema(&value, &schema)),
            Err(err) => {
                println!("FAIL  {label}");
                println!("  - {err:#}");
                all_ok = false;
            }
        }
    }
    Ok(all_ok)
}

fn report(label: &str, loaded: Result<StepCatalog, SchemaError>) -> bool {
    match loaded {
        Ok(catalog) => {
            let size = match catalog.body() {
                CatalogBody::Linear(linear) => format!("{} sections", linear.sections().len()),
                CatalogBody::Graph(graph) => format!("{} nodes", graph.len()),
            };
            println!("ok    {label} ({}, {}, {size})", catalog.key(), catalog.kind().as_str());
            if let Some(graph) = catalog.as_graph() {
                for node in graph.unreachable_nodes() {
                    println!("  warning: node '{node}' is unreachable from '{}'", graph.start());
                }
            }
            true
        }
        Err(err) => {
            println!("FAIL  {label}");
            for violation in err.violations() {
                println!("  - {violation}");
            }
            false
        }
    }
}

struct CliArgs {
    files: Vec<PathBuf>,
    schema: Option<PathBuf>,
    builtin: bool,
}

impl CliArgs {
    fn parse() -> Result<Self> {
        let mut args = env::args_os().skip(1);
        let mut files = Vec::new();
        let mut schema = None;
        let mut builtin = false;

        while let Some(arg_os) = args.next() {
            let arg = arg_os
                .into_string()
                .map_err(|_| anyhow::anyhow!("argument is not valid UTF-8"))?;
            match arg.as_str() {
                "--schema" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow::anyhow!("missing value for --schema"))?;
                    schema = Some(PathBuf::from(value));
                }
                "--builtin" => builtin = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                other if other.starts_with("--") => bail!("unknown flag: {other}"),
                path => files.push(PathBuf::from(path)),
            }
        }
        Ok(CliArgs {
            files,
            schema,
            builtin,
        })
    }
}

fn print_usage() {
    println!(
        "Usage: catalog-check [--schema PATH] [--builtin] [CATALOG.json ...]\n\n\
With no catalog paths and no --builtin, checks every catalogs/*.json under\n\
the content root ({}).",
        dirt_guide::ROOT_ENV
    );
}
