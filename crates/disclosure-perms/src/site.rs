//! Requesting sites and the collaborators that describe them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use disclosure_core::{DataRequest, PublicKey};

use crate::error::Result;

/// A requesting context, such as a website.
///
/// A confidential site may read every field without individual grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub origin: String,
    pub public_key: PublicKey,
    pub confidential: bool,
}

impl Site {
    /// A site that needs explicit grants.
    pub fn new(origin: impl Into<String>, public_key: PublicKey) -> Self {
        Self {
            origin: origin.into(),
            public_key,
            confidential: false,
        }
    }

    /// Mark this site as confidential.
    pub fn confidential(mut self) -> Self {
        self.confidential = true;
        self
    }
}

/// Looks up site descriptions by origin.
#[async_trait]
pub trait SiteDataSource: Send + Sync {
    /// Fetch the site registered for `origin`.
    async fn get_site_data(&self, origin: &str) -> Result<Site>;
}

/// Lists grant records a site holds from an identity.
#[async_trait]
pub trait PermissionsSource: Send + Sync {
    /// Records sent from `site.public_key` to `own_public_key`.
    async fn grant_access_records(
        &self,
        site: &Site,
        own_public_key: &PublicKey,
    ) -> Result<Vec<DataRequest>>;
}
