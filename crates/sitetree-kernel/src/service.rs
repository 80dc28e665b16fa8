//! Listing service: the per-process context a transport sits on.
//!
//! Built once at startup from a [`SiteConfig`]. Owns the engine and the
//! metadata store so the table is loaded at most once for the life of the
//! process.

use std::sync::Arc;

use serde::Serialize;
use sitetree_types::ListingResult;

use crate::config::SiteConfig;
use crate::error::{TreeError, TreeResult};
use crate::listing::ListingEngine;
use crate::meta::MetadataStore;

/// Error body returned in place of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    /// Human-readable message.
    pub error: String,
    /// Machine-readable tag (see [`TreeError::kind`]).
    pub kind: &'static str,
}

impl From<&TreeError> for ErrorPayload {
    fn from(err: &TreeError) -> Self {
        Self {
            error: err.to_string(),
            kind: err.kind(),
        }
    }
}

/// Response body: a listing or an error.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Listing(ListingResult),
    Error(ErrorPayload),
}

/// A listing outcome ready for a transport.
#[derive(Debug, Clone)]
pub struct ListingResponse {
    /// HTTP-style status code.
    pub status: u16,
    /// JSON body.
    pub body: ResponseBody,
}

impl ListingResponse {
    /// True for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Startup context for listing requests.
#[derive(Debug)]
pub struct ListingService {
    config: Arc<SiteConfig>,
    engine: ListingEngine,
    store: MetadataStore,
}

impl ListingService {
    /// Create a service; the metadata table is loaded on first need.
    pub fn new(config: SiteConfig) -> Self {
        let config = Arc::new(config);
        let engine = ListingEngine::new(config.clone());
        let store = MetadataStore::new(
            engine.sandbox().root().join(&config.meta_file),
            config.metadata_policy,
        );
        Self {
            config,
            engine,
            store,
        }
    }

    /// Create a service around an existing store.
    pub fn with_store(config: SiteConfig, store: MetadataStore) -> Self {
        let config = Arc::new(config);
        let engine = ListingEngine::new(config.clone());
        Self {
            config,
            engine,
            store,
        }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    /// List the children of `path` (relative to the root).
    #[tracing::instrument(skip(self), name = "listing.list")]
    pub async fn list(&self, path: &str) -> TreeResult<ListingResult> {
        let result = self.engine.list(&self.store, path).await;
        match &result {
            Ok(listing) => tracing::debug!(items = listing.items.len(), "listed"),
            Err(e) => match e.class().status_code() {
                500 => tracing::error!(error = %e, "listing failed"),
                _ => tracing::debug!(error = %e, "listing rejected"),
            },
        }
        result
    }

    /// List `path` and fold the outcome into a status code and body.
    pub async fn respond(&self, path: &str) -> ListingResponse {
        match self.list(path).await {
            Ok(listing) => ListingResponse {
                status: 200,
                body: ResponseBody::Listing(listing),
            },
            Err(e) => ListingResponse {
                status: e.class().status_code(),
                body: ResponseBody::Error(ErrorPayload::from(&e)),
            },
        }
    }
}
