//! Fragment loading with a page back stack.
//!
//! Guide pages are HTML fragments addressed by name (`welcome.html`,
//! `troubleshooting.html`). `PageLoader` tracks which fragment is current and
//! a LIFO stack of the pages visited before it. A fragment that cannot be
//! fetched is replaced by an inline error block so the page still renders.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

#[derive(Debug)]
pub enum FragmentError {
    EmptyName,
    OutsideRoot { name: String },
    NotFound { name: String },
    Io { name: String, source: io::Error },
}

impl fmt::Display for FragmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FragmentError::EmptyName => write!(f, "empty fragment name"),
            FragmentError::OutsideRoot { name } => {
                write!(f, "fragment '{name}' resolves outside the content root")
            }
            FragmentError::NotFound { name } => write!(f, "fragment '{name}' not found"),
            FragmentError::Io { name, source } => {
                write!(f, "failed to read fragment '{name}': {source}")
            }
        }
    }
}

impl std::error::Error for FragmentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FragmentError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Anything that can hand back the markup for a named fragment.
pub trait FragmentSource {
    fn fetch(&self, name: &str) -> Result<String, FragmentError>;
}

/// In-memory fragments, keyed by name.
impl FragmentSource for BTreeMap<String, String> {
    fn fetch(&self, name: &str) -> Result<String, FragmentError> {
        self.get(name).cloned().ok_or_else(|| FragmentError::NotFound {
            name: name.to_string(),
        })
    }
}

/// Serves fragment files below a directory.
///
/// Names are resolved relative to the root and canonicalized; anything that
/// lands outside the root (absolute paths, `..`, symlinks) is rejected.
#[derive(Clone, Debug)]
pub struct DirFragmentSource {
    root: PathBuf,
}

impl DirFragmentSource {
    pub fn new(root: &Path) -> Result<Self, FragmentError> {
        let root = fs::canonicalize(root).map_err(|source| FragmentError::Io {
            name: root.display().to_string(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, FragmentError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(FragmentError::EmptyName);
        }
        let trimmed = trimmed.strip_prefix("./").unwrap_or(trimmed);
        let relative = Path::new(trimmed);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(FragmentError::OutsideRoot {
                name: name.to_string(),
            });
        }

        let candidate = self.root.join(relative);
        let canonical = match fs::canonicalize(&candidate) {
            Ok(path) => path,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(FragmentError::NotFound {
                    name: name.to_string(),
                });
            }
            Err(source) => {
                return Err(FragmentError::Io {
                    name: name.to_string(),
                    source,
                });
            }
        };
        if !canonical.starts_with(&self.root) {
            return Err(FragmentError::OutsideRoot {
                name: name.to_string(),
            });
        }
        if !canonical.is_file() {
            return Err(FragmentError::NotFound {
                name: name.to_string(),
            });
        }
        Ok(canonical)
    }
}

impl FragmentSource for DirFragmentSource {
    fn fetch(&self, name: &str) -> Result<String, FragmentError> {
        let path = self.resolve(name)?;
        fs::read_to_string(&path).map_err(|source| FragmentError::Io {
            name: name.to_string(),
            source,
        })
    }
}

/// Result of a page load. `ok == false` means `html` is the inline error block.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LoadedSection {
    pub name: String,
    pub html: String,
    pub anchor: Option<String>,
    pub ok: bool,
}

#[derive(Clone, Debug, Default)]
pub struct PageLoader {
    current: Option<String>,
    history: Vec<String>,
}

impl PageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Pages behind the current one, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Load `name`, pushing the current page first when it differs.
    pub fn load_section(
        &mut self,
        source: &dyn FragmentSource,
        name: &str,
        anchor: Option<&str>,
    ) -> LoadedSection {
        if let Some(current) = &self.current {
            if current != name {
                self.history.push(current.clone());
            }
        }
        self.fetch_into(source, name, anchor)
    }

    /// Reload the previous page without pushing the current one.
    /// Returns `None` when there is nothing to go back to.
    pub fn go_back(&mut self, source: &dyn FragmentSource) -> Option<LoadedSection> {
        let previous = self.history.pop()?;
        Some(self.fetch_into(source, &previous, None))
    }

    fn fetch_into(
        &mut self,
        source: &dyn FragmentSource,
        name: &str,
        anchor: Option<&str>,
    ) -> LoadedSection {
        let anchor = anchor.filter(|a| !a.is_empty()).map(str::to_string);
        match source.fetch(name) {
            Ok(html) => {
                self.current = Some(name.to_string());
                LoadedSection {
                    name: name.to_string(),
                    html,
                    anchor,
                    ok: true,
                }
            }
            Err(err) => {
                log::error!("Error loading section: {err}");
                LoadedSection {
                    name: name.to_string(),
                    html: error_block(name),
                    anchor,
                    ok: false,
                }
            }
        }
    }
}

/// Inline markup shown in place of a fragment that failed to load.
pub fn error_block(name: &str) -> String {
    format!(
        "<div class=\"alert alert-danger\">Error loading section: {}</div>",
        escape_html(name)
    )
}

/// Escape the five HTML-significant characters.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    out
}
