//! Fake feature backend HTTP server for integration tests.
//!
//! Spins up a minimal `axum` server on a random TCP port bound to 127.0.0.1.
//! Serves the JSON endpoints the HTTP backend posts to:
//! - `POST /getFeatures`: substring search over the configured features
//! - `POST /getRegulonMetaData`: `{"regulonMeta": ...}` for a known regulon
//! - `POST /getMarkerGenes`: marker genes for a `(clusteringID, clusterID)`
//! - `POST /getMyLooms`: the dataset listing with each dataset's cell metadata
//!
//! Every request body is recorded so tests can assert on what was sent.
//!
//! # Example
//!
//! ```rust,no_run
//! let api = FakeScopeApi::start().await.unwrap();
//! api.add_feature("ACTB", "gene", "actin beta").await;
//! let backend = HttpBackend::new(api.base_url(), Duration::from_secs(1));
//! ```

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

#[derive(Default)]
struct ApiState {
    features: Vec<(String, String, String)>,
    regulons: HashMap<String, Value>,
    markers: HashMap<(i64, i64), Value>,
    datasets: Vec<Value>,
    /// Send `featureTypes`/`features` and no description array.
    legacy_feature_reply: bool,
    status: Option<StatusCode>,
    delay: Duration,
    requests: Vec<(String, Value)>,
}

type Shared = Arc<Mutex<ApiState>>;

/// Handle to the running fake backend.
pub struct FakeScopeApi {
    addr: SocketAddr,
    state: Shared,
}

impl FakeScopeApi {
    /// Start the server on a random port. Returns once it is listening.
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state: Shared = Arc::new(Mutex::new(ApiState::default()));

        let app = Router::new()
            .route("/getFeatures", post(get_features))
            .route("/getRegulonMetaData", post(get_regulon_metadata))
            .route("/getMarkerGenes", post(get_marker_genes))
            .route("/getMyLooms", post(get_my_looms))
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Ok(Self { addr, state })
    }

    /// Base URL for the API (e.g. `http://127.0.0.1:PORT`).
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn add_feature(&self, title: &str, feature_type: &str, description: &str) {
        self.state.lock().await.features.push((
            title.to_string(),
            feature_type.to_string(),
            description.to_string(),
        ));
    }

    /// Serve `meta` as the `regulonMeta` object for `regulon`.
    pub async fn add_regulon(&self, regulon: &str, meta: Value) {
        self.state.lock().await.regulons.insert(regulon.to_string(), meta);
    }

    pub async fn add_markers(&self, clustering_id: i64, cluster_id: i64, reply: Value) {
        self.state.lock().await.markers.insert((clustering_id, cluster_id), reply);
    }

    /// List `loom_file_path` with `cell_metadata` as its `cellMetaData`.
    pub async fn add_dataset(&self, loom_file_path: &str, cell_metadata: Value) {
        self.state.lock().await.datasets.push(json!({
            "loomFilePath": loom_file_path,
            "cellMetaData": cell_metadata,
            "fileMetaData": { "hasGlobalMeta": true },
        }));
    }

    /// Reply to searches with the plural key spellings and no descriptions.
    pub async fn use_legacy_feature_reply(&self) {
        self.state.lock().await.legacy_feature_reply = true;
    }

    /// Answer every request with this status and a `null` body.
    pub async fn fail_with(&self, status: StatusCode) {
        self.state.lock().await.status = Some(status);
    }

    /// Delay every reply.
    pub async fn delay_replies(&self, delay: Duration) {
        self.state.lock().await.delay = delay;
    }

    /// `(path, body)` of every request received, in arrival order.
    pub async fn requests(&self) -> Vec<(String, Value)> {
        self.state.lock().await.requests.clone()
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// Record the request and apply the configured delay and failure status.
async fn intercept(state: &Shared, path: &str, body: &Value) -> Option<StatusCode> {
    let (delay, status) = {
        let mut s = state.lock().await;
        s.requests.push((path.to_string(), body.clone()));
        (s.delay, s.status)
    };
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    status
}

async fn get_features(State(state): State<Shared>, Json(body): Json<Value>) -> impl IntoResponse {
    if let Some(status) = intercept(&state, "/getFeatures", &body).await {
        return (status, Json(Value::Null));
    }
    let needle = body["query"].as_str().unwrap_or_default().to_lowercase();
    let s = state.lock().await;
    let hits: Vec<_> = s
        .features
        .iter()
        .filter(|(title, _, _)| title.to_lowercase().contains(&needle))
        .collect();
    let titles: Vec<_> = hits.iter().map(|h| h.0.clone()).collect();
    let types: Vec<_> = hits.iter().map(|h| h.1.clone()).collect();
    let descriptions: Vec<_> = hits.iter().map(|h| h.2.clone()).collect();

    let reply = if s.legacy_feature_reply {
        json!({ "features": titles, "featureTypes": types })
    } else {
        json!({ "feature": titles, "featureType": types, "featureDescription": descriptions })
    };
    (StatusCode::OK, Json(reply))
}

async fn get_regulon_metadata(
    State(state): State<Shared>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if let Some(status) = intercept(&state, "/getRegulonMetaData", &body).await {
        return (status, Json(Value::Null));
    }
    let regulon = body["regulon"].as_str().unwrap_or_default();
    let s = state.lock().await;
    match s.regulons.get(regulon) {
        Some(meta) => (StatusCode::OK, Json(json!({ "regulonMeta": meta }))),
        None => (StatusCode::OK, Json(Value::Null)),
    }
}

async fn get_marker_genes(
    State(state): State<Shared>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if let Some(status) = intercept(&state, "/getMarkerGenes", &body).await {
        return (status, Json(Value::Null));
    }
    let ids = (
        body["clusteringID"].as_i64().unwrap_or(-1),
        body["clusterID"].as_i64().unwrap_or(-1),
    );
    let s = state.lock().await;
    (StatusCode::OK, Json(s.markers.get(&ids).cloned().unwrap_or(Value::Null)))
}

async fn get_my_looms(State(state): State<Shared>, Json(body): Json<Value>) -> impl IntoResponse {
    if let Some(status) = intercept(&state, "/getMyLooms", &body).await {
        return (status, Json(Value::Null));
    }
    let s = state.lock().await;
    (StatusCode::OK, Json(json!({ "myLooms": s.datasets })))
}
