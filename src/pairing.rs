//! Bluetooth pairing check for a participant's watch.
//!
//! Each participant has a 4-character code; their watch advertises as the
//! study's device prefix followed by that code. The check only reads the
//! operating system's list of paired devices. It never talks to the watch.

use crate::runtime::{env_override, find_on_path};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::process::Command;

pub const DEFAULT_DEVICE_PREFIX: &str = "Verisense-01-22011801";
pub const DEVICE_PREFIX_ENV: &str = "DIRT_GUIDE_DEVICE_PREFIX";
const CODE_LEN: usize = 4;

pub const MSG_INVALID_CODE: &str = "❌ Please enter a 4-character ID.";
pub const MSG_NOT_FOUND: &str = "❌ Device not found or user cancelled.";

#[derive(Debug)]
pub enum PairingError {
    InvalidCode { raw: String },
    ProbeUnavailable { tool: &'static str },
    ProbeFailed { detail: String },
}

impl fmt::Display for PairingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairingError::InvalidCode { raw } => {
                write!(f, "participant code '{raw}' is not {CODE_LEN} letters or digits")
            }
            PairingError::ProbeUnavailable { tool } => write!(f, "{tool} not found on PATH"),
            PairingError::ProbeFailed { detail } => write!(f, "pairing probe failed: {detail}"),
        }
    }
}

impl std::error::Error for PairingError {}

/// Normalized participant code: trimmed, uppercased, 4 ASCII letters or digits.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParticipantCode(String);

impl ParticipantCode {
    pub fn parse(raw: &str) -> Result<Self, PairingError> {
        let code = raw.trim().to_ascii_uppercase();
        if code.len() != CODE_LEN || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(PairingError::InvalidCode {
                raw: raw.to_string(),
            });
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn device_name(prefix: &str, code: &ParticipantCode) -> String {
    format!("{prefix}{code}")
}

/// Device prefix from `DIRT_GUIDE_DEVICE_PREFIX`, else the study default.
pub fn default_device_prefix() -> String {
    env_override(DEVICE_PREFIX_ENV).unwrap_or_else(|| DEFAULT_DEVICE_PREFIX.to_string())
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PairedDevice {
    pub address: String,
    pub name: String,
}

/// Source of the OS's paired-device list.
pub trait PairingProbe {
    fn paired_devices(&self) -> Result<Vec<PairedDevice>, PairingError>;
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PairingOutcome {
    Paired { device: String },
    /// Covers both "not paired" and "probe failed or was cancelled".
    NotFound,
    InvalidCode,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PairingReport {
    pub outcome: PairingOutcome,
    pub message: String,
}

impl PairingReport {
    fn new(outcome: PairingOutcome) -> Self {
        let message = match &outcome {
            PairingOutcome::Paired { device } => format!("✅ Device \"{device}\" is paired."),
            PairingOutcome::NotFound => MSG_NOT_FOUND.to_string(),
            PairingOutcome::InvalidCode => MSG_INVALID_CODE.to_string(),
        };
        Self { outcome, message }
    }

    pub fn is_paired(&self) -> bool {
        matches!(self.outcome, PairingOutcome::Paired { .. })
    }
}

/// Validate `raw`, build the device name and ask the probe once.
pub fn check_pairing(probe: &dyn PairingProbe, prefix: &str, raw: &str) -> PairingReport {
    let code = match ParticipantCode::parse(raw) {
        Ok(code) => code,
        Err(err) => {
            log::debug!("{err}");
            return PairingReport::new(PairingOutcome::InvalidCode);
        }
    };
    let target = device_name(prefix, &code);
    match probe.paired_devices() {
        Ok(devices) if devices.iter().any(|d| d.name == target) => {
            PairingReport::new(PairingOutcome::Paired { device: target })
        }
        Ok(_) => PairingReport::new(PairingOutcome::NotFound),
        Err(err) => {
            log::warn!("pairing check for {target} failed: {err}");
            PairingReport::new(PairingOutcome::NotFound)
        }
    }
}

/// Reads paired devices from BlueZ via `bluetoothctl devices Paired`.
#[derive(Clone, Debug, Default)]
pub struct BluetoothctlProbe {
    binary: Option<PathBuf>,
}

impl BluetoothctlProbe {
    pub const TOOL: &'static str = "bluetoothctl";

    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit binary instead of searching PATH.
    pub fn with_binary(binary: PathBuf) -> Self {
        Self {
            binary: Some(binary),
        }
    }

    fn binary(&self) -> Result<PathBuf, PairingError> {
        match &self.binary {
            Some(path) => Ok(path.clone()),
            None => find_on_path(Self::TOOL)
                .ok_or(PairingError::ProbeUnavailable { tool: Self::TOOL }),
        }
    }
}

impl PairingProbe for BluetoothctlProbe {
    fn paired_devices(&self) -> Result<Vec<PairedDevice>, PairingError> {
        let binary = self.binary()?;
        let output = Command::new(&binary)
            .args(["devices", "Paired"])
            .output()
            .map_err(|err| PairingError::ProbeFailed {
                detail: format!("{}: {err}", binary.display()),
            })?;
        if !output.status.success() {
            return Err(PairingError::ProbeFailed {
                detail: format!(
                    "{} exited with {}: {}",
                    binary.display(),
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(parse_paired_devices(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Parse `Device <address> <name>` lines; anything else is ignored.
pub fn parse_paired_devices(output: &str) -> Vec<PairedDevice> {
    output
        .lines()
        .filter_map(|line| {
            let rest = line.trim().strip_prefix("Device ")?;
            let (address, name) = rest.trim_start().split_once(char::is_whitespace)?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some(PairedDevice {
                address: address.to_string(),
                name: name.to_string(),
            })
        })
        .collect()
}
