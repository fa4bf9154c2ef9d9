use std::path::PathBuf;

use chrono::{DateTime, Local};

use crate::evidence::domain::evidence_store::EvidenceStore;
use crate::shared::frame::Frame;
use crate::shared::paths::{ensure_dir, unique_path};
use crate::shared::storage_error::StorageError;
use crate::video::domain::image_writer::ImageWriter;

/// Saves evidence snapshots as `absent_<YYYYmmdd_HHMMSS_mmm>.jpg`.
pub struct FsEvidenceStore {
    dir: PathBuf,
    writer: Box<dyn ImageWriter>,
}

impl FsEvidenceStore {
    pub fn new(dir: impl Into<PathBuf>, writer: Box<dyn ImageWriter>) -> Self {
        Self {
            dir: dir.into(),
            writer,
        }
    }
}

impl EvidenceStore for FsEvidenceStore {
    fn persist(
        &self,
        frame: &Frame,
        captured_at: &DateTime<Local>,
    ) -> Result<PathBuf, StorageError> {
        ensure_dir(&self.dir)?;
        let stem = format!("absent_{}", captured_at.format("%Y%m%d_%H%M%S_%3f"));
        let path = unique_path(&self.dir, &stem, "jpg");

        self.writer
            .write(&path, frame, None)
            .map_err(|e| StorageError::Encode {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::infrastructure::image_file_writer::ImageFileWriter;
    use chrono::TimeZone;
    use std::path::Path;

    fn store(dir: &Path) -> FsEvidenceStore {
        FsEvidenceStore::new(dir.join("screenshots"), Box::new(ImageFileWriter::new()))
    }

    fn captured_at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 6, 10, 15, 30).unwrap()
            + chrono::Duration::milliseconds(250)
    }

    #[test]
    fn test_persist_names_file_by_capture_time() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let frame = Frame::filled(32, 24, [10, 10, 10], 0);

        let path = store.persist(&frame, &captured_at()).unwrap();
        assert_eq!(
            path,
            dir.path().join("screenshots").join("absent_20240506_101530_250.jpg")
        );
        assert!(path.exists());
    }

    #[test]
    fn test_same_timestamp_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let frame = Frame::filled(32, 24, [10, 10, 10], 0);

        let a = store.persist(&frame, &captured_at()).unwrap();
        let b = store.persist(&frame, &captured_at()).unwrap();
        assert_ne!(a, b);
        assert!(a.exists() && b.exists());
    }

    #[test]
    fn test_unwritable_dir_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"not a dir").unwrap();
        let store = FsEvidenceStore::new(blocker.join("sub"), Box::new(ImageFileWriter::new()));
        let frame = Frame::filled(8, 8, [0, 0, 0], 0);

        assert!(matches!(
            store.persist(&frame, &captured_at()),
            Err(StorageError::CreateDir { .. })
        ));
    }
}
