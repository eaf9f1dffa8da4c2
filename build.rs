use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-env-changed=DIRT_GUIDE_ROOT_HINT");
    println!("cargo:rerun-if-changed=catalogs");
    println!("cargo:rerun-if-changed=schema");

    let hint = env::var("DIRT_GUIDE_ROOT_HINT")
        .ok()
        .or_else(|| env::var("CARGO_MANIFEST_DIR").ok());

    if let Some(raw_hint) = hint {
        let candidate = PathBuf::from(raw_hint);
        let canonical = candidate.canonicalize().unwrap_or(candidate);

        println!(
            "cargo:rustc-env=DIRT_GUIDE_ROOT_HINT={}",
            canonical.display()
        );
    }
}
