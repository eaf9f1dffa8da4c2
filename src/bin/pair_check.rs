//! Check whether a participant's DIRT watch is paired with this machine.
//!
//! Validates the 4-character participant code, builds the expected device name
//! and looks for it in `bluetoothctl devices Paired`. Prints the same one-line
//! message the guide shows; exits 1 unless the device is paired.

use anyhow::{Result, bail};
use dirt_guide::pairing::{BluetoothctlProbe, check_pairing, default_device_prefix};
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
    let probe = match args.bluetoothctl {
        Some(path) => BluetoothctlProbe::with_binary(path),
        None => BluetoothctlProbe::new(),
    };
    let prefix = args.prefix.unwrap_or_else(default_device_prefix);
    let report = check_pairing(&probe, &prefix, &args.code);

    if args.json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!("{}", report.message);
    }
    Ok(report.is_paired())
}

struct CliArgs {
    code: String,
    prefix: Option<String>,
    bluetoothctl: Option<PathBuf>,
    json: bool,
}

impl CliArgs {
    fn parse() -> Result<Self> {
        let mut args = env::args_os().skip(1);
        let mut code = None;
        let mut prefix = None;
        let mut bluetoothctl = None;
        let mut json = false;

        while let Some(arg_os) = args.next() {
            let arg = arg_os
                .into_string()
                .map_err(|_| anyhow::anyhow!("argument is not valid UTF-8"))?;
            match arg.as_str() {
                "--code" => code = Some(next_value(&mut args, "--code")?),
                "--prefix" => prefix = Some(next_value(&mut args, "--prefix")?),
                "--bluetoothctl" => {
                    bluetoothctl = Some(PathBuf::from(next_value(&mut args, "--bluetoothctl")?))
                }
                "--json" => json = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                other if other.starts_with("--") => bail!("unknown flag: {other}"),
                positional => {
                    if code.is_some() {
                        bail!("participant code may only be provided once");
                    }
                    code = Some(positional.to_string());
                }
            }
        }

        // An empty code still reaches check_pairing so the user sees the usual message.
        Ok(CliArgs {
            code: code.unwrap_or_default(),
            prefix,
            bluetoothctl,
            json,
        })
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
        "Usage: pair-check [--code] CODE [--prefix PREFIX] [--bluetoothctl PATH] [--json]\n\n\
CODE is the 4-character participant ID. PREFIX defaults to ${} or {}.",
        dirt_guide::pairing::DEVICE_PREFIX_ENV,
        dirt_guide::pairing::DEFAULT_DEVICE_PREFIX
    );
}
