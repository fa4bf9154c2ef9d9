use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

const APP_DIR: &str = "InvigilateAI";

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Locate the face model, downloading it into the cache on first use.
///
/// Lookup order: explicit override, user cache, download.
pub fn resolve(
    name: &str,
    url: &str,
    override_path: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    if let Some(path) = override_path {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        log::warn!(
            "Model override {} does not exist, falling back to cache",
            path.display()
        );
    }
    resolve_in(&model_cache_dir()?, name, url, progress)
}

fn resolve_in(
    cache_dir: &Path,
    name: &str,
    url: &str,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let cached_path = cache_dir.join(name);
    if cached_path.exists() {
        return Ok(cached_path);
    }

    fs::create_dir_all(cache_dir).map_err(ModelResolveError::CacheDir)?;
    log::info!("Downloading {name} from {url}");
    download(url, &cached_path, progress)?;
    Ok(cached_path)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/InvigilateAI/models/`
/// - Linux: `$XDG_CACHE_HOME/InvigilateAI/models/` or `~/.cache/InvigilateAI/models/`
/// - Windows: `%LOCALAPPDATA%/InvigilateAI/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    let base = dirs::data_dir();
    #[cfg(not(target_os = "macos"))]
    let base = dirs::cache_dir();

    base.map(|d| d.join(APP_DIR).join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let download_err = |source| ModelResolveError::Download {
        url: url.to_string(),
        source,
    };
    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(download_err)?;
    let total = response.content_length().unwrap_or(0);
    let bytes = response.bytes().map_err(download_err)?;

    // Written under a temporary name and renamed so a crash never leaves
    // a truncated model in the cache.
    let temp_path = dest.with_extension("part");
    let write_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| ModelResolveError::Write { path, source }
    };

    let mut file = fs::File::create(&temp_path).map_err(write_err(&temp_path))?;
    let mut downloaded: u64 = 0;
    for chunk in bytes.chunks(1024 * 1024) {
        file.write_all(chunk).map_err(write_err(&temp_path))?;
        downloaded += chunk.len() as u64;
        if let Some(ref cb) = progress {
            cb(downloaded, total);
        }
    }
    file.flush().map_err(write_err(&temp_path))?;
    drop(file);

    fs::rename(&temp_path, dest).map_err(write_err(dest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_in_returns_cached_file_without_download() {
        let tmp = TempDir::new().unwrap();
        let model_path = tmp.path().join("face.onnx");
        fs::write(&model_path, b"fake model data").unwrap();

        let resolved = resolve_in(
            tmp.path(),
            "face.onnx",
            "http://invalid.nonexistent.example.com/face.onnx",
            None,
        )
        .unwrap();
        assert_eq!(resolved, model_path);
    }

    #[test]
    fn test_resolve_prefers_existing_override() {
        let tmp = TempDir::new().unwrap();
        let override_path = tmp.path().join("custom.onnx");
        fs::write(&override_path, b"custom").unwrap();

        let resolved = resolve(
            "face.onnx",
            "http://invalid.nonexistent.example.com/face.onnx",
            Some(&override_path),
            None,
        )
        .unwrap();
        assert_eq!(resolved, override_path);
    }

    #[test]
    fn test_model_cache_dir_is_app_scoped() {
        let path = model_cache_dir().unwrap();
        assert!(path.to_string_lossy().contains(APP_DIR));
        assert!(path.ends_with("models"));
    }

    #[test]
    fn test_download_invalid_url_leaves_no_partial_file() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.onnx");
        let result = download("http://invalid.nonexistent.example.com/model", &dest, None);
        assert!(result.is_err());
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }
}
