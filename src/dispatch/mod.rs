//! Hand a finished download to the host: gallery, share sheet, or nowhere

mod gallery;
mod platform;
mod share;

pub use gallery::{Album, DirectoryGallery, GalleryAsset, MediaGallery};
pub use platform::{GalleryPermission, Platform};
pub use share::{CommandShareSheet, ShareSheet};

use log::{info, warn};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::config::ClientConfig;
use crate::download::LocalArtifact;
use crate::error::DispatchError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispatchResult {
    SavedToGallery { album: String, location: PathBuf },
    Shared { path: PathBuf },
    SavedLocally { path: PathBuf },
}

impl DispatchResult {
    /// Confirmation for the user
    pub fn message(&self) -> String {
        match self {
            DispatchResult::SavedToGallery { album, .. } => {
                format!("File downloaded to {} folder", album)
            }
            DispatchResult::Shared { path } => format!("Shared {}", path.display()),
            DispatchResult::SavedLocally { path } => {
                format!("File downloaded to {}", path.display())
            }
        }
    }
}

impl fmt::Display for DispatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

pub struct PlatformDispatcher<G, S> {
    gallery: G,
    share: S,
    album: String,
}

impl PlatformDispatcher<DirectoryGallery, CommandShareSheet> {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            DirectoryGallery::new(&config.gallery.root, config.gallery.permission),
            CommandShareSheet::new(&config.share.command, config.share.args.clone()),
            &config.gallery.album,
        )
    }
}

impl<G: MediaGallery, S: ShareSheet> PlatformDispatcher<G, S> {
    pub fn new(gallery: G, share: S, album: impl Into<String>) -> Self {
        Self {
            gallery,
            share,
            album: album.into(),
        }
    }

    pub fn album(&self) -> &str {
        &self.album
    }

    /// Exactly one branch runs per call; a failure is returned, never retried
    /// through another branch.
    pub async fn dispatch(
        &self,
        artifact: &LocalArtifact,
        platform: Platform,
    ) -> Result<DispatchResult, DispatchError> {
        info!("dispatch: {} -> {}", artifact.path.display(), platform);

        match platform {
            Platform::GalleryCapable => self.save_to_gallery(artifact).await,
            Platform::ShareCapable => {
                self.share.share(&artifact.path).await?;
                Ok(DispatchResult::Shared {
                    path: artifact.path.clone(),
                })
            }
            Platform::Generic => Ok(DispatchResult::SavedLocally {
                path: artifact.path.clone(),
            }),
        }
    }

    async fn save_to_gallery(&self, artifact: &LocalArtifact) -> Result<DispatchResult, DispatchError> {
        if self.gallery.request_permission().await? == GalleryPermission::Denied {
            warn!("dispatch: gallery permission denied for {}", artifact.filename);
            return Err(DispatchError::PermissionDenied);
        }

        let asset = self.gallery.create_asset(&artifact.path).await?;
        let stored = match self.file_into_album(&asset).await {
            Ok(stored) => stored,
            Err(e) => {
                if let Err(cleanup) = self.gallery.remove_asset(&asset).await {
                    warn!(
                        "dispatch: failed to remove unfiled asset {}: {}",
                        asset.path.display(),
                        cleanup
                    );
                }
                return Err(e);
            }
        };

        info!("dispatch: {} saved to album {}", artifact.filename, self.album);
        Ok(DispatchResult::SavedToGallery {
            album: self.album.clone(),
            location: stored.path,
        })
    }

    async fn file_into_album(&self, asset: &GalleryAsset) -> Result<GalleryAsset, DispatchError> {
        match self.gallery.find_album(&self.album).await? {
            Some(album) => self.gallery.add_to_album(asset, &album).await,
            None => self.gallery.create_album(&self.album, asset).await,
        }
    }
}
