//! Walk a step catalog from the terminal.
//!
//! Loads a builtin catalog (`--catalog KEY`) or a catalog file (`--file PATH`),
//! prints the current snapshot, then applies one command per stdin line
//! (`next`, `back`, `2`, `jump finish:2`, `path alt`, `all`, `reset`, `quit`).
//! Rejected commands are reported on stderr and leave the navigator as it was.

use anyhow::{Context, Result, bail};
use dirt_guide::{Command, Navigator, Snapshot, builtin, load_catalog_from_path, render};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    dirt_guide::init_logging();
    let args = CliArgs::parse()?;
    if args.list {
        for (key, _) in builtin::CATALOGS {
            println!("{key}");
        }
        return Ok(());
    }

    let catalog = match &args.source {
        CatalogSource::Builtin(key) => match builtin::load(key) {
            Some(loaded) => loaded?,
            None => bail!("unknown builtin catalog '{key}' (try --list)"),
        },
        CatalogSource::File(path) => load_catalog_from_path(path)?,
    };
    log::info!("walking catalog '{}'", catalog.key());
    let mut navigator = Navigator::new(Arc::new(catalog));

    let stdout = io::stdout();
    let mut out = stdout.lock();
    emit(&navigator.snapshot(), args.json, &mut out)?;

    for line in io::stdin().lock().lines() {
        let line = line.context("reading stdin")?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if matches!(trimmed, "quit" | "q" | "exit") {
            break;
        }
        let command = match Command::parse(trimmed) {
            Ok(command) => command,
            Err(err) => {
                eprintln!("{err}");
                continue;
            }
        };
        match navigator.apply(&command) {
            Ok(snapshot) => emit(&snapshot, args.json, &mut out)?,
            Err(err) => eprintln!("{err}"),
        }
    }
    Ok(())
}

fn emit(snapshot: &Snapshot<'_>, json: bool, out: &mut impl Write) -> Result<()> {
    if json {
        serde_json::to_writer(&mut *out, snapshot).context("serializing snapshot")?;
        writeln!(out)?;
    } else {
        writeln!(out, "{}", render::snapshot_to_string(snapshot))?;
    }
    out.flush()?;
    Ok(())
}

enum CatalogSource {
    Builtin(String),
    File(PathBuf),
}

struct CliArgs {
    source: CatalogSource,
    json: bool,
    list: bool,
}

impl CliArgs {
    fn parse() -> Result<Self> {
        let mut args = env::args_os().skip(1);
        let mut source: Option<CatalogSource> = None;
        let mut json = false;
        let mut list = false;

        while let Some(arg_os) = args.next() {
            let arg = arg_os
                .into_string()
                .map_err(|_| anyhow::anyhow!("argument is not valid UTF-8"))?;
            match arg.as_str() {
                "--catalog" => {
                    let key = next_value(&mut args, "--catalog")?;
                    if source.is_some() {
                        bail!("--catalog/--file may only be provided once");
                    }
                    source = Some(CatalogSource::Builtin(key));
                }
                "--file" => {
                    let path = next_value(&mut args, "--file")?;
                    if source.is_some() {
                        bail!("--catalog/--file may only be provided once");
                    }
                    source = Some(CatalogSource::File(PathBuf::from(path)));
                }
                "--json" => json = true,
                "--list" => list = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                other => bail!("unknown flag: {other}"),
            }
        }

        let source = match source {
            Some(source) => source,
            None if list => CatalogSource::Builtin(String::new()),
            None => bail!("one of --catalog or --file is required (see --help)"),
        };
        Ok(CliArgs { source, json, list })
    }
}

fn next_value(args: &mut impl Iterator<Item = std::ffi::OsString>, flag: &str) -> Result<String> {
    args.next()
        .map(|os| {
            os.into_string()
                .map_err(|_| anyhow::anyhow!("value for {flag} is not valid UTF-8"))
        })
        .transpose()?
        .ok_or_else(|| anyhow::anyhow!("missing value for {flag}"))
}

fn print_usage() {
    println!(
        "Usage: guide-walk (--catalog KEY | --file PATH) [--json]\n       guide-walk --list\n\n\
Reads one command per line from stdin and prints the resulting snapshot.\n\n\
Commands:\n  next | n            advance one step\n  back | prev | b     go back one step (or one choice)\n  N | choose N        follow choice N (1-based)\n  jump KEY[:INDEX]    jump to a section step or node\n  path NAME | main    switch to an alternative path or back\n  all                 toggle the show-all view\n  reset               start over\n  quit                stop reading input"
    );
}
