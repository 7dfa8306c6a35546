//! Media gallery collaborator and a directory-backed implementation

use log::debug;
use std::future::Future;
use std::io;
use std::path::{Component, Path, PathBuf};

use super::platform::GalleryPermission;
use crate::error::DispatchError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryAsset {
    pub file_name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    pub name: String,
    pub path: PathBuf,
}

/// Host media library. Moving an asset into an album relocates it.
pub trait MediaGallery: Send + Sync {
    fn request_permission(
        &self,
    ) -> impl Future<Output = Result<GalleryPermission, DispatchError>> + Send;

    /// Register `file` as a new asset. The original file is left in place.
    fn create_asset(
        &self,
        file: &Path,
    ) -> impl Future<Output = Result<GalleryAsset, DispatchError>> + Send;

    fn find_album(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Album>, DispatchError>> + Send;

    /// Create album `name` holding `asset`; returns the asset as stored there
    fn create_album(
        &self,
        name: &str,
        asset: &GalleryAsset,
    ) -> impl Future<Output = Result<GalleryAsset, DispatchError>> + Send;

    fn add_to_album(
        &self,
        asset: &GalleryAsset,
        album: &Album,
    ) -> impl Future<Output = Result<GalleryAsset, DispatchError>> + Send;

    /// Drop an asset that never made it into an album
    fn remove_asset(
        &self,
        asset: &GalleryAsset,
    ) -> impl Future<Output = Result<(), DispatchError>> + Send;
}

/// New assets wait here until they are moved into an album
const STAGING_DIR: &str = ".staging";

/// Gallery rooted at a directory: albums are subdirectories, assets are copies
/// staged under a hidden directory so they never shadow an album name.
#[derive(Debug, Clone)]
pub struct DirectoryGallery {
    root: PathBuf,
    permission: GalleryPermission,
}

impl DirectoryGallery {
    pub fn new(root: impl Into<PathBuf>, permission: GalleryPermission) -> Self {
        Self {
            root: root.into(),
            permission,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Albums are single directories directly under the root
    fn album_path(&self, name: &str) -> io::Result<PathBuf> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) if name != STAGING_DIR => Ok(self.root.join(name)),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{name:?} is not a usable album name"),
            )),
        }
    }

    async fn move_into(&self, asset: &GalleryAsset, dir: &Path) -> io::Result<GalleryAsset> {
        let target = unique_path(dir, &asset.file_name).await?;
        tokio::fs::rename(&asset.path, &target).await?;
        debug!(
            "gallery: moved {} -> {}",
            asset.path.display(),
            target.display()
        );
        Ok(GalleryAsset {
            file_name: file_name_of(&target),
            path: target,
        })
    }
}

impl MediaGallery for DirectoryGallery {
    async fn request_permission(&self) -> Result<GalleryPermission, DispatchError> {
        Ok(self.permission)
    }

    async fn create_asset(&self, file: &Path) -> Result<GalleryAsset, DispatchError> {
        let name = file
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} has no file name", file.display()),
                )
            })?;

        let staging = self.root.join(STAGING_DIR);
        tokio::fs::create_dir_all(&staging).await?;
        let target = unique_path(&staging, name).await?;
        tokio::fs::copy(file, &target).await?;
        debug!("gallery: asset {} created", target.display());

        Ok(GalleryAsset {
            file_name: file_name_of(&target),
            path: target,
        })
    }

    async fn find_album(&self, name: &str) -> Result<Option<Album>, DispatchError> {
        let path = self.album_path(name)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => Ok(Some(Album {
                name: name.to_string(),
                path,
            })),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn create_album(
        &self,
        name: &str,
        asset: &GalleryAsset,
    ) -> Result<GalleryAsset, DispatchError> {
        let path = self.album_path(name)?;
        tokio::fs::create_dir_all(&path).await?;
        debug!("gallery: album {} created", name);
        Ok(self.move_into(asset, &path).await?)
    }

    async fn add_to_album(
        &self,
        asset: &GalleryAsset,
        album: &Album,
    ) -> Result<GalleryAsset, DispatchError> {
        Ok(self.move_into(asset, &album.path).await?)
    }

    async fn remove_asset(&self, asset: &GalleryAsset) -> Result<(), DispatchError> {
        match tokio::fs::remove_file(&asset.path).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `name`, or `stem (n).ext` for the first n that is free in `dir`
async fn unique_path(dir: &Path, name: &str) -> io::Result<PathBuf> {
    let candidate = dir.join(name);
    if !tokio::fs::try_exists(&candidate).await? {
        return Ok(candidate);
    }

    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };

    let mut n = 1u32;
    loop {
        let file_name = match ext {
            Some(ext) => format!("{stem} ({n}).{ext}"),
            None => format!("{stem} ({n})"),
        };
        let candidate = dir.join(file_name);
        if !tokio::fs::try_exists(&candidate).await? {
            return Ok(candidate);
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn asset_is_a_copy_under_root() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("report.pdf");
        std::fs::write(&source, b"%PDF").unwrap();
        let gallery = DirectoryGallery::new(dir.path().join("gallery"), GalleryPermission::Granted);

        let asset = gallery.create_asset(&source).await.unwrap();

        assert_eq!(
            asset.path,
            dir.path().join("gallery").join(STAGING_DIR).join("report.pdf")
        );
        assert_eq!(std::fs::read(&asset.path).unwrap(), b"%PDF");
        assert!(source.exists());
    }

    #[tokio::test]
    async fn colliding_names_get_a_counter() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("photo.jpg");
        std::fs::write(&source, b"jpg").unwrap();
        let gallery = DirectoryGallery::new(dir.path().join("gallery"), GalleryPermission::Granted);

        let first = gallery.create_asset(&source).await.unwrap();
        let second = gallery.create_asset(&source).await.unwrap();

        assert_eq!(first.file_name, "photo.jpg");
        assert_eq!(second.file_name, "photo (1).jpg");
    }

    #[tokio::test]
    async fn album_lifecycle() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.txt");
        std::fs::write(&source, b"a").unwrap();
        let gallery = DirectoryGallery::new(dir.path().join("gallery"), GalleryPermission::Granted);

        assert!(gallery.find_album("Download").await.unwrap().is_none());

        let asset = gallery.create_asset(&source).await.unwrap();
        let stored = gallery.create_album("Download", &asset).await.unwrap();
        let album_dir = dir.path().join("gallery").join("Download");
        assert_eq!(stored.path, album_dir.join("a.txt"));
        assert!(stored.path.exists());
        assert!(!asset.path.exists());

        let album = gallery.find_album("Download").await.unwrap().unwrap();
        assert_eq!(album.path, album_dir);

        let asset = gallery.create_asset(&source).await.unwrap();
        let moved = gallery.add_to_album(&asset, &album).await.unwrap();
        assert_eq!(moved.path, album_dir.join("a (1).txt"));
    }

    #[tokio::test]
    async fn asset_named_like_the_album_does_not_block_it() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("Download");
        std::fs::write(&source, b"no extension").unwrap();
        let gallery = DirectoryGallery::new(dir.path().join("gallery"), GalleryPermission::Granted);

        let asset = gallery.create_asset(&source).await.unwrap();
        assert!(gallery.find_album("Download").await.unwrap().is_none());
        let stored = gallery.create_album("Download", &asset).await.unwrap();

        assert_eq!(
            stored.path,
            dir.path().join("gallery").join("Download").join("Download")
        );
        assert_eq!(std::fs::read(&stored.path).unwrap(), b"no extension");
    }

    #[tokio::test]
    async fn album_names_stay_under_the_root() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.txt");
        std::fs::write(&source, b"a").unwrap();
        let gallery = DirectoryGallery::new(dir.path().join("gallery"), GalleryPermission::Granted);
        let asset = gallery.create_asset(&source).await.unwrap();

        for name in ["../outside", STAGING_DIR, ""] {
            let err = gallery.create_album(name, &asset).await.unwrap_err();
            assert!(matches!(err, DispatchError::Io(_)), "{name:?} should be rejected");
        }
        assert!(asset.path.exists());

        gallery.remove_asset(&asset).await.unwrap();
        assert!(!asset.path.exists());
        // already gone is fine
        gallery.remove_asset(&asset).await.unwrap();
    }
}
