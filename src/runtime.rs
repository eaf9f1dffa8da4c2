//! Runtime helpers shared across binaries.
//!
//! Executable detection and PATH resolution for the external tools the host
//! side shells out to (currently only `bluetoothctl`).

use std::env;
use std::path::{Path, PathBuf};

/// Returns true when a file exists and has any execute bit set.
pub fn helper_is_executable(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(meta) = std::fs::metadata(path) {
            return meta.permissions().mode() & 0o111 != 0;
        }
        false
    }
    #[cfg(not(unix))]
    {
        true
    }
}

/// Find an executable by name somewhere on PATH.
pub fn find_on_path(name: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    find_in_dirs(env::split_paths(&paths), name)
}

/// Find an executable by name in an explicit list of directories.
pub fn find_in_dirs<I>(dirs: I, name: &str) -> Option<PathBuf>
where
    I: IntoIterator<Item = PathBuf>,
{
    dirs.into_iter()
        .map(|dir| dir.join(name))
        .find(|candidate| helper_is_executable(candidate))
}

/// Read an environment override, treating empty or whitespace-only values as unset.
pub fn env_override(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn only_executable_files_are_found() {
        let dir = TempDir::new().unwrap();
        let plain = dir.path().join("plain");
        fs::write(&plain, "#!/bin/sh\n").unwrap();
        assert!(!helper_is_executable(dir.path()));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            assert!(!helper_is_executable(&plain));
            assert!(find_in_dirs(vec![dir.path().to_path_buf()], "plain").is_none());
            fs::set_permissions(&plain, fs::Permissions::from_mode(0o755)).unwrap();
        }

        assert_eq!(
            find_in_dirs(vec![dir.path().to_path_buf()], "plain"),
            Some(plain)
        );
        assert!(find_in_dirs(vec![dir.path().to_path_buf()], "missing").is_none());
    }
}
