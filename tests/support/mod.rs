#![allow(dead_code)]

use anyhow::{Context, Result, bail};
use dirt_guide::{Navigator, StepCatalog, find_content_root};
use serde_json::{Value, json};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

pub fn repo_root() -> PathBuf {
    find_content_root().expect("tests require the content root")
}

pub fn helper_binary(repo_root: &Path, name: &str) -> PathBuf {
    ensure_helpers_built(repo_root).expect("failed to build helper binaries");
    let candidates = [
        repo_root.join("target").join("debug").join(name),
        repo_root.join("target").join("release").join(name),
    ];
    for candidate in candidates {
        if candidate.is_file() {
            return candidate;
        }
    }
    panic!(
        "unable to locate helper {} (checked target/debug, target/release)",
        name
    );
}

/// Run `cmd` and return its output whatever the exit status.
pub fn run_raw(mut cmd: Command) -> Result<Output> {
    cmd.output()
        .with_context(|| format!("failed to run command: {:?}", cmd))
}

pub fn run_command(cmd: Command) -> Result<Output> {
    let output = run_raw(cmd)?;
    if output.status.success() {
        Ok(output)
    } else {
        bail!(
            "command failed: status {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    }
}

/// Run `cmd` with `input` on stdin.
pub fn run_with_stdin(mut cmd: Command, input: &str) -> Result<Output> {
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = cmd
        .spawn()
        .with_context(|| format!("failed to spawn command: {:?}", cmd))?;
    child
        .stdin
        .take()
        .context("child stdin unavailable")?
        .write_all(input.as_bytes())?;
    Ok(child.wait_with_output()?)
}

pub fn make_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(path)?.permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(path, perms)?;
    }
    Ok(())
}

fn ensure_helpers_built(repo_root: &Path) -> Result<()> {
    static BUILT: AtomicBool = AtomicBool::new(false);
    if BUILT.load(Ordering::SeqCst) {
        return Ok(());
    }

    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let mutex = LOCK.get_or_init(|| Mutex::new(()));
    let _guard = mutex.lock().unwrap_or_else(|err| err.into_inner());

    if BUILT.load(Ordering::SeqCst) {
        return Ok(());
    }

    let status = Command::new("cargo")
        .arg("build")
        .arg("--bins")
        .arg("--quiet")
        .current_dir(repo_root)
        .status()
        .context("failed to compile helper binaries")?;
    if status.success() {
        BUILT.store(true, Ordering::SeqCst);
        Ok(())
    } else {
        bail!("cargo build --bins exited with {}", status);
    }
}

/// Linear catalog with `sections` of the given sizes, keys `s0`, `s1`, ...
pub fn linear_catalog(key: &str, sizes: &[usize]) -> Value {
    let sections: Vec<Value> = sizes
        .iter()
        .enumerate()
        .map(|(idx, size)| {
            let steps: Vec<Value> = (0..*size)
                .map(|step| json!({"title": format!("s{idx} step {step}")}))
                .collect();
            json!({"key": format!("s{idx}"), "label": format!("Section {idx}"), "steps": steps})
        })
        .collect();
    json!({
        "schema_version": "step_catalog_v1",
        "key": key,
        "kind": "linear",
        "sections": sections
    })
}

/// Three-level question tree: q1 -> q2 -> q3 -> r_end, each with one extra
/// choice straight to r_side.
pub fn deep_tree() -> Value {
    json!({
        "schema_version": "step_catalog_v1",
        "key": "deep",
        "kind": "graph",
        "start": "q1",
        "nodes": [
            {"id": "q1", "type": "question", "title": "Q1",
             "choices": [{"label": "deeper", "next": "q2"}, {"label": "side", "next": "r_side"}]},
            {"id": "q2", "type": "question", "title": "Q2",
             "choices": [{"label": "deeper", "next": "q3"}, {"label": "side", "next": "r_side"}]},
            {"id": "q3", "type": "question", "title": "Q3",
             "choices": [{"label": "end", "next": "r_end"}, {"label": "side", "next": "r_side"}]},
            {"id": "r_end", "type": "result", "title": "End"},
            {"id": "r_side", "type": "result", "title": "Side"}
        ]
    })
}

pub fn navigator(raw: &Value) -> Navigator {
    let catalog = StepCatalog::load(raw).expect("fixture catalog is valid");
    Navigator::new(Arc::new(catalog))
}
