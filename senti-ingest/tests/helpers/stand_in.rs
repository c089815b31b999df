//! In-process HTTP stand-ins for the WebHDFS namenode/datanode pair and the
//! remote inference API

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, post, put};
use axum::Router;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

/// Serve `app` on an ephemeral local port
pub async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// An address nothing listens on
pub async fn unreachable_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

// ============================================================================
// WebHDFS
// ============================================================================

/// Filesystem state of the fake cluster
#[derive(Default)]
pub struct FakeHdfs {
    pub dirs: Mutex<BTreeSet<String>>,
    pub files: Mutex<BTreeMap<String, Vec<u8>>>,
    /// Bytes that reached the namenode on CREATE (must stay empty)
    pub namenode_create_bytes: Mutex<usize>,
    pub requests: Mutex<Vec<String>>,
}

impl FakeHdfs {
    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.dirs.lock().unwrap().contains(path)
    }

    pub fn request_count(&self, op: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.as_str() == op)
            .count()
    }
}

fn normalize(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

/// Start a fake WebHDFS endpoint; returns its base URL and state
pub async fn start_webhdfs() -> (String, Arc<FakeHdfs>) {
    let state = Arc::new(FakeHdfs::default());
    let app = Router::new()
        .route("/webhdfs/v1/", any(namenode_root))
        .route("/webhdfs/v1/*path", any(namenode))
        .route("/datanode/*path", put(datanode))
        .with_state(Arc::clone(&state));
    let addr = serve(app).await;
    (format!("http://{}", addr), state)
}

async fn namenode_root(
    State(state): State<Arc<FakeHdfs>>,
    method: Method,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    handle_namenode(&state, method, String::new(), query, body)
}

async fn namenode(
    State(state): State<Arc<FakeHdfs>>,
    method: Method,
    Path(path): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    handle_namenode(&state, method, path, query, body)
}

fn handle_namenode(
    state: &FakeHdfs,
    method: Method,
    path: String,
    query: HashMap<String, String>,
    body: Bytes,
) -> Response {
    let path = normalize(&path);
    let op = query.get("op").cloned().unwrap_or_default();
    state.requests.lock().unwrap().push(op.clone());

    match (method, op.as_str()) {
        (Method::PUT, "MKDIRS") => {
            let mut dirs = state.dirs.lock().unwrap();
            let mut current = String::new();
            for segment in path.split('/').filter(|s| !s.is_empty()) {
                current.push('/');
                current.push_str(segment);
                dirs.insert(current.clone());
            }
            (StatusCode::OK, r#"{"boolean":true}"#).into_response()
        }
        (Method::PUT, "CREATE") => {
            *state.namenode_create_bytes.lock().unwrap() += body.len();
            if query.get("overwrite").map(String::as_str) != Some("true") {
                return (StatusCode::BAD_REQUEST, "overwrite=true expected").into_response();
            }
            let location = format!("/datanode{}?op=CREATE", path);
            (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, location)]).into_response()
        }
        (Method::GET, "GETFILESTATUS") => {
            let known = path == "/"
                || state.dirs.lock().unwrap().contains(&path)
                || state.files.lock().unwrap().contains_key(&path);
            if known {
                (StatusCode::OK, r#"{"FileStatus":{}}"#).into_response()
            } else {
                (StatusCode::NOT_FOUND, r#"{"RemoteException":{}}"#).into_response()
            }
        }
        _ => (StatusCode::BAD_REQUEST, "unsupported operation").into_response(),
    }
}

async fn datanode(
    State(state): State<Arc<FakeHdfs>>,
    Path(path): Path<String>,
    body: Bytes,
) -> StatusCode {
    state
        .files
        .lock()
        .unwrap()
        .insert(normalize(&path), body.to_vec());
    StatusCode::CREATED
}

// ============================================================================
// Inference API
// ============================================================================

/// Scripted inference endpoint
///
/// Responses are served in order; the last one repeats.
pub struct FakeInference {
    responses: Mutex<VecDeque<(u16, String)>>,
    pub authorizations: Mutex<Vec<Option<String>>>,
    pub bodies: Mutex<Vec<serde_json::Value>>,
}

impl FakeInference {
    pub fn request_count(&self) -> usize {
        self.bodies.lock().unwrap().len()
    }
}

/// Start a fake inference API; returns the model endpoint URL and state
pub async fn start_inference(responses: Vec<(u16, &str)>) -> (String, Arc<FakeInference>) {
    let state = Arc::new(FakeInference {
        responses: Mutex::new(
            responses
                .into_iter()
                .map(|(status, body)| (status, body.to_string()))
                .collect(),
        ),
        authorizations: Mutex::new(Vec::new()),
        bodies: Mutex::new(Vec::new()),
    });
    let app = Router::new()
        .route("/models/sentiment", post(inference))
        .with_state(Arc::clone(&state));
    let addr = serve(app).await;
    (format!("http://{}/models/sentiment", addr), state)
}

async fn inference(
    State(state): State<Arc<FakeInference>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.authorizations.lock().unwrap().push(
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    );
    state
        .bodies
        .lock()
        .unwrap()
        .push(serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null));

    let (status, body) = {
        let mut responses = state.responses.lock().unwrap();
        if responses.len() > 1 {
            responses.pop_front().unwrap()
        } else {
            responses.front().cloned().unwrap_or((500, String::new()))
        }
    };
    (StatusCode::from_u16(status).unwrap(), body).into_response()
}
