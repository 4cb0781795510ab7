use std::path::{Path, PathBuf};

use reqwest::Client;
use tracing::info;

use super::resolver::LoaderProfile;
use crate::core::error::{InstallerError, InstallerResult};

/// Where a loader profile ended up on disk.
#[derive(Debug, Clone)]
pub struct StagedProfile {
    pub path: PathBuf,
    /// The metadata file was already present, so nothing was fetched.
    pub already_installed: bool,
}

/// Fetches loader profile JSON and stores it in the launcher's `versions/`.
pub struct LoaderInstaller {
    client: Client,
}

impl LoaderInstaller {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// `<launcher>/versions/<id>/<id>.json`
    pub fn profile_path(launcher_root: &Path, profile: &LoaderProfile) -> PathBuf {
        launcher_root
            .join("versions")
            .join(&profile.profile_id)
            .join(format!("{}.json", profile.profile_id))
    }

    /// Download the profile document verbatim unless it is already staged.
    pub async fn stage(
        &self,
        profile: &LoaderProfile,
        launcher_root: &Path,
    ) -> InstallerResult<StagedProfile> {
        let path = Self::profile_path(launcher_root, profile);

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            info!("Loader profile {} already installed", profile.profile_id);
            return Ok(StagedProfile {
                path,
                already_installed: true,
            });
        }

        let resp = self.client.get(&profile.metadata_url).send().await?;
        if !resp.status().is_success() {
            return Err(InstallerError::LoaderApi(format!(
                "{} returned {} for {}",
                profile.kind,
                resp.status(),
                profile.metadata_url
            )));
        }
        let body = resp.bytes().await?;

        // Stored as-is; only checked to be JSON so an error page is never staged.
        serde_json::from_slice::<serde_json::Value>(&body)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| InstallerError::io(parent, e))?;
        }
        tokio::fs::write(&path, &body)
            .await
            .map_err(|e| InstallerError::io(&path, e))?;

        info!("Staged {} at {:?}", profile.profile_id, path);
        Ok(StagedProfile {
            path,
            already_installed: false,
        })
    }
}
