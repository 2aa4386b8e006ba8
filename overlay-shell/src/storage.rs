//! Directory-backed export storage.

use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use overlay_core::persistence::resolve_folder;
use overlay_core::{Persistence, RasterHandle, SaveError};
use overlay_renderer::raster::encode_png;
use tracing::{debug, warn};

/// Writes exports as `<root>/<folder>/<millis>.png`.
#[derive(Debug, Clone)]
pub struct DirectoryPersistence {
    root: PathBuf,
}

impl DirectoryPersistence {
    /// Store exports under `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for `folder_name`, kept inside the root.
    ///
    /// Root, prefix, `.` and `..` components are dropped; a name with nothing
    /// left falls back to the default folder.
    fn folder_dir(&self, folder_name: &str) -> PathBuf {
        let relative: PathBuf = Path::new(resolve_folder(folder_name))
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part),
                _ => None,
            })
            .collect();
        if relative.as_os_str().is_empty() {
            warn!(folder_name, "folder name has no usable components");
            return self.root.join(resolve_folder(""));
        }
        if relative.as_path() != Path::new(folder_name.trim()) {
            warn!(folder_name, folder = %relative.display(), "folder name sanitised");
        }
        self.root.join(relative)
    }

    /// First free `<millis>[-n].png` path in `dir`.
    fn next_path(dir: &Path) -> PathBuf {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis());
        let mut path = dir.join(format!("{millis}.png"));
        let mut n = 1;
        while path.exists() {
            path = dir.join(format!("{millis}-{n}.png"));
            n += 1;
        }
        path
    }
}

impl Persistence for DirectoryPersistence {
    fn save(&self, raster: &RasterHandle, folder_name: &str) -> Result<String, SaveError> {
        let dir = self.folder_dir(folder_name);
        std::fs::create_dir_all(&dir)?;

        let png = encode_png(raster).map_err(|e| SaveError::Encode(e.to_string()))?;
        let path = Self::next_path(&dir);
        std::fs::write(&path, png)?;
        debug!(path = %path.display(), "export written");

        let absolute = path.canonicalize().unwrap_or(path);
        Ok(format!("file://{}", absolute.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay_core::{ColorRef, DEFAULT_FOLDER_NAME};

    #[test]
    fn test_save_writes_png_under_folder() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DirectoryPersistence::new(dir.path());
        let raster = RasterHandle::solid(2, 2, ColorRef::WHITE);

        let reference = store.save(&raster, "Trips").expect("save");
        let path = PathBuf::from(reference.strip_prefix("file://").expect("file uri"));
        assert!(path.starts_with(dir.path().canonicalize().expect("canonical")));
        assert_eq!(
            path.parent().and_then(Path::file_name),
            Some(std::ffi::OsStr::new("Trips"))
        );
        let bytes = std::fs::read(&path).expect("read");
        assert_eq!(&bytes[0..4], &[137, 80, 78, 71]);
    }

    #[test]
    fn test_blank_folder_uses_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DirectoryPersistence::new(dir.path());
        let raster = RasterHandle::solid(1, 1, ColorRef::BLACK);

        store.save(&raster, "").expect("save");
        assert!(dir.path().join(DEFAULT_FOLDER_NAME).is_dir());
    }

    #[test]
    fn test_rapid_saves_do_not_collide() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DirectoryPersistence::new(dir.path());
        let raster = RasterHandle::solid(1, 1, ColorRef::BLACK);

        let a = store.save(&raster, "x").expect("first");
        let b = store.save(&raster, "x").expect("second");
        assert_ne!(a, b);
    }

    #[test]
    fn test_folder_name_cannot_escape_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("exports");
        std::fs::create_dir_all(&root).expect("root");
        let canonical_root = root.canonicalize().expect("canonical");
        let store = DirectoryPersistence::new(&root);
        let raster = RasterHandle::solid(1, 1, ColorRef::BLACK);

        for folder in ["/tmp/elsewhere", "../outside", "a/../../b", "..", "/"] {
            let reference = store.save(&raster, folder).expect("save");
            let path = PathBuf::from(reference.strip_prefix("file://").expect("file uri"));
            assert!(path.starts_with(&canonical_root), "{folder} escaped to {path:?}");
        }
        assert!(root.join("tmp/elsewhere").is_dir());
        assert!(root.join("outside").is_dir());
        assert!(root.join(DEFAULT_FOLDER_NAME).is_dir());
        assert!(!dir.path().join("outside").exists());
    }
}
