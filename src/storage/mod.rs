//! Upload storage module
//!
//! Owns the flat upload directory: naming new files, creating them, and
//! resolving stored names back to paths without escaping the directory.

use rand::Rng;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;

/// Upper bound (inclusive) of the random part of a generated name
const RANDOM_SUFFIX_MAX: u32 = 1_000_000_000;

/// Handle to the upload directory
#[derive(Debug, Clone)]
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    /// Open the storage directory, creating it if it does not exist yet
    pub fn open(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create a new file named after `original_name`'s extension
    ///
    /// Returns the generated name and the open handle. Nothing is written yet.
    pub async fn create(&self, original_name: &str) -> io::Result<(String, fs::File)> {
        let name = generate_filename(original_name);
        let file = fs::File::create(self.dir.join(&name)).await?;
        Ok((name, file))
    }

    /// Best-effort removal of a file this server created
    pub async fn remove(&self, name: &str) {
        if let Err(e) = fs::remove_file(self.dir.join(name)).await {
            crate::logger::log_warning(&format!("Failed to remove partial upload '{name}': {e}"));
        }
    }

    /// Map a stored file name to its path inside the storage directory
    ///
    /// Returns `None` for anything that is not a plain file name, or that
    /// resolves (through symlinks) outside the directory.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        if !is_plain_file_name(name) {
            return None;
        }

        let candidate = self.dir.join(name);
        let dir_canonical = self.dir.canonicalize().ok()?;
        let file_canonical = candidate.canonicalize().ok()?;
        if !file_canonical.starts_with(&dir_canonical) || !file_canonical.is_file() {
            return None;
        }
        Some(file_canonical)
    }
}

/// Build `<millis>-<random><ext>` for an upload
pub fn generate_filename(original_name: &str) -> String {
    format!("{}{}", unique_token(), extension_of(original_name))
}

/// Time-plus-entropy token; unique in practice, not cryptographically
pub fn unique_token() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis());
    let suffix = rand::thread_rng().gen_range(0..=RANDOM_SUFFIX_MAX);
    format!("{millis}-{suffix}")
}

/// Extension of the client-supplied name, including the leading dot
///
/// Only the last path segment is considered. Leading dots mark hidden files,
/// not extensions, so `.bashrc` has none while `archive.tar.gz` keeps `.gz`.
pub fn extension_of(original_name: &str) -> &str {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_name);
    let stem_start = base.len() - base.trim_start_matches('.').len();
    base[stem_start..]
        .rfind('.')
        .map_or("", |idx| &base[stem_start + idx..])
}

fn is_plain_file_name(name: &str) -> bool {
    if name.is_empty() || name.contains(['/', '\\', '\0']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
