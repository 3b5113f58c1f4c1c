use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::{errors::{FlipError, FlipResult}, parsers::prelude::*, types::*};

pub const BYTES_PER_MEBIBYTE: u64 = 1024 * 1024;
/// Files above this size are refused so a stray multi-gigabyte file cannot
/// be pulled into memory by accident.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * BYTES_PER_MEBIBYTE;

#[derive(Default)]
pub struct FlipperBuilder {
    tag: Option<String>,
    scope: Option<Option<String>>,
    mode: Option<Mode>,
    max_file_size: Option<u64>,
}

impl FlipperBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    pub fn scope(mut self, scope: &str) -> Self {
        self.scope = Some(Some(scope.to_string()));
        self
    }

    /// Match the tag wherever it appears, not only inside the scope aggregate.
    pub fn any_scope(mut self) -> Self {
        self.scope = Some(None);
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    pub fn build(self) -> BalanceFlipper {
        let defaults = LocatorConfig::default();
        let config = LocatorConfig {
            tag: self.tag.unwrap_or(defaults.tag),
            scope: self.scope.unwrap_or(defaults.scope),
        };

        BalanceFlipper {
            locator: QfxLocator::new(config),
            mode: self.mode.unwrap_or_default(),
            max_file_size: self.max_file_size.unwrap_or(DEFAULT_MAX_FILE_SIZE),
        }
    }
}

/// Flips the balance sign of OFX/QFX content and files.
#[derive(Debug, Clone)]
pub struct BalanceFlipper {
    locator: QfxLocator,
    mode: Mode,
    max_file_size: u64,
}

impl Default for BalanceFlipper {
    fn default() -> Self {
        FlipperBuilder::new().build()
    }
}

impl BalanceFlipper {
    pub fn builder() -> FlipperBuilder {
        FlipperBuilder::new()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn flip_content(&self, content: &str) -> FlipResult<FlipSummary> {
        let fields = self.locator.locate(content)?;
        apply(content, &fields, self.mode)
    }

    /// Flips one file in place. The file is only rewritten when at least one
    /// balance changed, and is left as it was on any error.
    pub fn process_file(&self, path: &Path) -> FlipResult<Outcome> {
        let metadata = fs::metadata(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => FlipError::NotAFile(path.to_path_buf()),
            _ => err.into(),
        })?;
        if !metadata.is_file() {
            return Err(FlipError::NotAFile(path.to_path_buf()));
        }
        if metadata.len() > self.max_file_size {
            return Err(FlipError::FileTooLarge {
                size: metadata.len(),
                limit: self.max_file_size,
            });
        }

        let content = fs::read_to_string(path)?;
        let filename = path.file_name().and_then(|name| name.to_str());
        if !QfxLocator::is_supported(filename, &content) {
            return Err(FlipError::UnsupportedFormat);
        }

        let summary = self.flip_content(&content)?;
        if !summary.is_changed() {
            tracing::info!(path = %path.display(), "balance already {}", self.mode.target());
            return Ok(Outcome::Unchanged {
                fields: summary.found,
                balances: summary.balances,
            });
        }

        write_atomic(path, &summary.content)?;
        tracing::info!(path = %path.display(), changed = summary.changed, "balance made {}", self.mode.target());

        Ok(Outcome::Updated {
            fields: summary.changed,
            balances: summary.balances,
        })
    }

    /// Processes every path, recording failures instead of stopping at them.
    pub fn process_files<P: AsRef<Path>>(&self, paths: &[P]) -> BatchReport {
        let results = paths
            .iter()
            .map(|path| {
                let path = path.as_ref();
                match self.process_file(path) {
                    Ok(outcome) => ProcessingResult {
                        path: path.to_path_buf(),
                        outcome,
                    },
                    Err(err) => {
                        tracing::warn!(path = %path.display(), error = %err, "failed to flip balance");
                        ProcessingResult::failed(path.to_path_buf(), &err)
                    }
                }
            })
            .collect();

        BatchReport {
            mode: self.mode,
            results,
        }
    }
}

/// Writes `content` next to `path` and renames it over the original, so an
/// interrupted write never leaves a truncated statement behind.
fn write_atomic(path: &Path, content: &str) -> FlipResult<()> {
    let tmp = temp_path(path);

    let result = (|| -> std::io::Result<()> {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        drop(file);

        let permissions = fs::metadata(path)?.permissions();
        fs::set_permissions(&tmp, permissions)?;
        fs::rename(&tmp, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }

    result.map_err(FlipError::from)
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}
