use std::path::{Path, PathBuf};

pub const DOWNLOADER_RELEASES_URL: &str = "https://github.com/nilaoda/N_m3u8DL-RE/releases";

#[derive(Debug, thiserror::Error)]
pub enum DependencyError {
    #[error("{} not found! Download the binary here: {}", .path.display(), DOWNLOADER_RELEASES_URL)]
    DownloaderMissing { path: PathBuf },
    #[error("could not resolve working directory: {0}")]
    WorkingDir(#[from] std::io::Error),
}

/// Resolves the downloader executable against the working directory and
/// fails if it is not there. Returns an absolute path so the process can be
/// spawned without relying on `PATH` lookup.
pub fn require_downloader(configured: &Path) -> Result<PathBuf, DependencyError> {
    let path = if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        std::env::current_dir()?.join(configured)
    };

    if !path.is_file() {
        return Err(DependencyError::DownloaderMissing {
            path: configured.to_path_buf(),
        });
    }

    tracing::debug!("[deps] downloader found at {}", path.display());
    Ok(path)
}
