//! JSON-over-HTTP feature backend.
//!
//! Each operation is a `POST` of a JSON body to a fixed path under the base
//! URL. A JSON `null` or empty body is "no reply"; transport failures,
//! timeouts and non-2xx statuses are logged and degrade to "no reply" too.

use crate::error::BackendError;
use crate::memory::StaticDataset;
use crate::protocol::{
    DatasetListReply, FeatureQuery, FeatureReply, MarkerQuery, RegulonMetadata,
    RegulonMetadataReply, RegulonQuery,
};
use crate::FeatureBackend;
use bytes::Bytes;
use featsearch_core::config::BackendConfig;
use featsearch_core::{DatasetMetadata, Metadata};
use http_body_util::{BodyExt, Full};
use hyper::{header, Method, Request, Uri};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

pub const FEATURES_PATH: &str = "/getFeatures";
pub const REGULON_METADATA_PATH: &str = "/getRegulonMetaData";
pub const MARKER_GENES_PATH: &str = "/getMarkerGenes";
pub const DATASETS_PATH: &str = "/getMyLooms";

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client<HttpConnector, Full<Bytes>>,
    base_url: String,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build_http();
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url, timeout }
    }

    pub fn from_config(cfg: &BackendConfig) -> Self {
        Self::new(cfg.base_url.clone(), cfg.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Cell metadata of `dataset` from the backend's dataset listing.
    pub async fn dataset_metadata(&self, dataset: &str) -> Option<DatasetMetadata> {
        self.post::<_, DatasetListReply>(DATASETS_PATH, &serde_json::json!({}))
            .await
            .unwrap_or_else(|e| degrade(DATASETS_PATH, e))
            .and_then(|reply| reply.metadata_for(dataset))
    }

    /// Dataset context for `dataset`, with its clusterings fetched once.
    ///
    /// A dataset missing from the listing is still searchable; cluster labels
    /// stay empty and clustering hits commit without marker genes.
    pub async fn load_dataset(&self, dataset: impl Into<String>) -> StaticDataset {
        let dataset = dataset.into();
        let metadata = self.dataset_metadata(&dataset).await;
        match &metadata {
            Some(meta) => tracing::debug!(
                %dataset,
                clusterings = meta.clusterings.len(),
                "backend: dataset metadata loaded"
            ),
            None => tracing::warn!(%dataset, "backend: dataset not listed; no clustering metadata"),
        }
        StaticDataset::new(dataset, metadata)
    }

    /// POST `body` as JSON to `path` and decode the reply.
    async fn post<Q, R>(&self, path: &'static str, body: &Q) -> Result<Option<R>, BackendError>
    where
        Q: Serialize,
        R: DeserializeOwned,
    {
        let uri: Uri = format!("{}{}", self.base_url, path)
            .parse()
            .map_err(|_| BackendError::Url(self.base_url.clone()))?;
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(serde_json::to_vec(body)?)))?;

        tracing::debug!(path, "backend: request");
        let exchange = async {
            let response = self.client.request(request).await?;
            let status = response.status();
            let bytes = response.into_body().collect().await?.to_bytes();
            Ok::<_, BackendError>((status, bytes))
        };
        let (status, bytes) = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| BackendError::Timeout { path, timeout: self.timeout })??;

        if !status.is_success() {
            return Err(BackendError::Status { path, status });
        }
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Ok(serde_json::from_slice::<Option<R>>(&bytes)?)
    }
}

/// Log a failed exchange and report it as "no reply".
fn degrade<T>(path: &'static str, err: BackendError) -> Option<T> {
    tracing::warn!(path, error = %err, "backend: request failed; treating as no reply");
    None
}

impl FeatureBackend for HttpBackend {
    async fn search(&self, query: FeatureQuery) -> Option<FeatureReply> {
        self.post(FEATURES_PATH, &query)
            .await
            .unwrap_or_else(|e| degrade(FEATURES_PATH, e))
    }

    async fn regulon_metadata(&self, query: RegulonQuery) -> Option<RegulonMetadata> {
        self.post::<_, RegulonMetadataReply>(REGULON_METADATA_PATH, &query)
            .await
            .unwrap_or_else(|e| degrade(REGULON_METADATA_PATH, e))
            .and_then(|reply| reply.regulon_meta)
    }

    async fn marker_genes(&self, query: MarkerQuery) -> Option<Metadata> {
        self.post(MARKER_GENES_PATH, &query)
            .await
            .unwrap_or_else(|e| degrade(MARKER_GENES_PATH, e))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
