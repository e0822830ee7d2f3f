//! Local disk store for uploaded listing images

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

/// Local image store.
///
/// Files are written under an uploads directory with a random name that
/// keeps the original extension; the returned path is the stable
/// identifier recorded against the listing.
#[derive(Clone)]
pub struct LocalImageStore {
    uploads_dir: PathBuf,
}

impl LocalImageStore {
    /// Create the store, making the uploads directory if needed
    pub async fn new(uploads_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let uploads_dir = uploads_dir.as_ref().to_path_buf();
        fs::create_dir_all(&uploads_dir).await?;

        info!("Initialized image store at {:?}", uploads_dir);
        Ok(Self { uploads_dir })
    }

    /// Persist image bytes; returns the stored path identifier.
    ///
    /// The filename hint contributes only its extension, so client-supplied
    /// names never reach the filesystem.
    pub async fn save(&self, filename_hint: &str, data: &[u8]) -> std::io::Result<String> {
        let file_name = match Path::new(filename_hint).extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };

        let path = self.uploads_dir.join(&file_name);
        fs::write(&path, data).await?;

        debug!("Stored image at {:?}", path);
        Ok(path.to_string_lossy().into_owned())
    }

    /// Delete a stored file by its path identifier.
    /// An already-missing file is treated as deleted.
    pub async fn delete(&self, stored_path: &str) -> std::io::Result<()> {
        match fs::remove_file(stored_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
