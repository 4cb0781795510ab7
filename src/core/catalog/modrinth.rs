use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

use super::release::ReleaseRecord;
use crate::core::error::{InstallerError, InstallerResult};
use crate::core::state::InstallerConfig;

/// Source of release records for the modpack project.
///
/// Implementations should list newest releases first; [`GameVersionIndex`]
/// additionally orders by publication date when records carry one.
///
/// [`GameVersionIndex`]: super::GameVersionIndex
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn fetch_releases(&self) -> InstallerResult<Vec<ReleaseRecord>>;
}

/// Modrinth `GET /project/{id}/version` listing.
pub struct ModrinthCatalog {
    client: Client,
    api_base: String,
    project: String,
    featured_only: bool,
}

impl ModrinthCatalog {
    pub fn new(client: Client, config: &InstallerConfig) -> Self {
        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            project: config.project.clone(),
            featured_only: config.featured_only,
        }
    }

    fn versions_url(&self) -> String {
        let url = format!("{}/project/{}/version", self.api_base, self.project);
        if self.featured_only {
            format!("{}?featured=true", url)
        } else {
            url
        }
    }
}

#[async_trait]
impl CatalogClient for ModrinthCatalog {
    async fn fetch_releases(&self) -> InstallerResult<Vec<ReleaseRecord>> {
        let url = self.versions_url();
        info!("Fetching releases of {} from {}", self.project, url);

        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(InstallerError::Other(format!(
                "Catalog returned {} for {}",
                resp.status(),
                url
            )));
        }

        let records: Vec<ReleaseRecord> = resp.json().await?;
        info!("Loaded {} releases", records.len());
        Ok(records)
    }
}
