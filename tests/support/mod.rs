//! In-process mock of the release tracker REST API
//!
//! Keeps users, releases and deployment logs in memory, walks releases
//! through DEV -> QA -> UAT -> PROD on promote/rollback and appends a
//! deployment log for each transition. Individual routes can be made to
//! fail with a fixed status and body, and every request is recorded.

#![allow(dead_code)]

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as AutoBuilder;
use releasedeck::client::ApiClient;
use releasedeck::config::ApiConfig;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::watch;

pub const STAGES: [&str; 4] = ["DEV", "QA", "UAT", "PROD"];

#[derive(Debug, Default)]
struct Store {
    users: Vec<Value>,
    releases: Vec<Value>,
    logs: Vec<Value>,
    next_id: i64,
    /// (method, path) -> (status, body)
    failures: HashMap<(String, String), (u16, String)>,
    /// "METHOD /path?query" in arrival order
    requests: Vec<String>,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn user(&self, id: i64) -> Option<Value> {
        self.users.iter().find(|u| u["id"] == id).cloned()
    }

    fn release_index(&self, id: i64) -> Option<usize> {
        self.releases.iter().position(|r| r["id"] == id)
    }
}

pub struct MockApi {
    pub addr: SocketAddr,
    store: Arc<Mutex<Store>>,
    shutdown_tx: watch::Sender<bool>,
}

impl MockApi {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock api");
        let addr = listener.local_addr().expect("mock api addr");
        let store = Arc::new(Mutex::new(Store::default()));
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let accept_store = Arc::clone(&store);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        let Ok((stream, _)) = result else { continue };
                        let store = Arc::clone(&accept_store);
                        tokio::spawn(async move {
                            let service = service_fn(move |req| {
                                let store = Arc::clone(&store);
                                async move { Ok::<_, hyper::Error>(handle(req, store).await) }
                            });
                            let _ = AutoBuilder::new(TokioExecutor::new())
                                .serve_connection(TokioIo::new(stream), service)
                                .await;
                        });
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
        });

        Self {
            addr,
            store,
            shutdown_tx,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.base_url(),
            timeout_secs: Some(5),
        }
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.api_config()).expect("client")
    }

    pub fn add_user(&self, username: &str, full_name: &str, role: &str) -> i64 {
        let mut store = self.store.lock().unwrap();
        let id = store.next_id();
        store.users.push(json!({
            "id": id,
            "username": username,
            "email": format!("{}@example.com", username),
            "fullName": full_name,
            "role": role,
        }));
        id
    }

    pub fn add_release(&self, version: &str, owner_id: i64, environment: &str) -> i64 {
        let mut store = self.store.lock().unwrap();
        let owner = store.user(owner_id).expect("owner exists");
        let id = store.next_id();
        store.releases.push(json!({
            "id": id,
            "versionNumber": version,
            "description": format!("Release {}", version),
            "owner": owner,
            "currentEnvironment": environment,
            "createdAt": "2024-03-15T10:30:00",
            "updatedAt": "2024-03-15T10:30:00",
        }));
        id
    }

    pub fn add_log(
        &self,
        release_id: i64,
        environment: &str,
        user_id: i64,
        success: bool,
        notes: &str,
    ) {
        let mut store = self.store.lock().unwrap();
        let idx = store.release_index(release_id).expect("release exists");
        let release = store.releases[idx].clone();
        let user = store.user(user_id).expect("user exists");
        let id = store.next_id();
        store.logs.push(json!({
            "id": id,
            "release": release,
            "environment": environment,
            "deployedBy": user,
            "deploymentTimestamp": "2024-03-15T10:30:00",
            "success": success,
            "notes": notes,
        }));
    }

    /// Make `method path` answer with `status` and `body`
    pub fn fail(&self, method: &str, path: &str, status: u16, body: &str) {
        self.store.lock().unwrap().failures.insert(
            (method.to_string(), format!("/api{}", path)),
            (status, body.to_string()),
        );
    }

    pub fn clear_failures(&self) {
        self.store.lock().unwrap().failures.clear();
    }

    pub fn requests(&self) -> Vec<String> {
        self.store.lock().unwrap().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.store.lock().unwrap().requests.len()
    }

    /// Requests whose "METHOD /path" starts with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.starts_with(prefix))
            .count()
    }

    pub fn release_environment(&self, id: i64) -> Option<String> {
        let store = self.store.lock().unwrap();
        let idx = store.release_index(id)?;
        store.releases[idx]["currentEnvironment"]
            .as_str()
            .map(String::from)
    }

    pub fn user_count(&self) -> usize {
        self.store.lock().unwrap().users.len()
    }
}

impl Drop for MockApi {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}

fn reply(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Full::new(body.into()))
        .unwrap()
}

fn json_reply(value: &Value) -> Response<Full<Bytes>> {
    reply(StatusCode::OK, value.to_string())
}

fn bad_request(message: String) -> Response<Full<Bytes>> {
    reply(StatusCode::BAD_REQUEST, message)
}

fn not_found() -> Response<Full<Bytes>> {
    reply(StatusCode::NOT_FOUND, "")
}

fn query_param(query: &str, name: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name).then(|| {
            urlencoding::decode(value)
                .map(|v| v.into_owned())
                .unwrap_or_default()
        })
    })
}

async fn handle(
    req: Request<hyper::body::Incoming>,
    store: Arc<Mutex<Store>>,
) -> Response<Full<Bytes>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().unwrap_or("").to_string();
    let body = req
        .into_body()
        .collect()
        .await
        .map(|b| b.to_bytes())
        .unwrap_or_default();
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    let mut store = store.lock().unwrap();
    store.requests.push(if query.is_empty() {
        format!("{} {}", method, path)
    } else {
        format!("{} {}?{}", method, path, query)
    });

    if let Some((status, body)) = store.failures.get(&(method.to_string(), path.clone())) {
        return reply(StatusCode::from_u16(*status).unwrap(), body.clone());
    }

    let segments: Vec<&str> = path
        .trim_start_matches("/api/")
        .split('/')
        .collect();

    match (&method, segments.as_slice()) {
        (&Method::GET, ["users"]) => json_reply(&Value::Array(store.users.clone())),
        (&Method::GET, ["users", id]) => match store.user(id.parse().unwrap_or(-1)) {
            Some(user) => json_reply(&user),
            None => not_found(),
        },
        (&Method::POST, ["users"]) => {
            let username = body["username"].as_str().unwrap_or_default().to_string();
            if store.users.iter().any(|u| u["username"] == username.as_str()) {
                return bad_request(format!("Username already exists: {}", username));
            }
            let id = store.next_id();
            let mut user = body.clone();
            user["id"] = json!(id);
            store.users.push(user.clone());
            json_reply(&user)
        }
        (&Method::PUT, ["users", id]) => {
            let id: i64 = id.parse().unwrap_or(-1);
            let Some(existing) = store.users.iter_mut().find(|u| u["id"] == id) else {
                return not_found();
            };
            let mut user = body.clone();
            user["id"] = json!(id);
            *existing = user.clone();
            json_reply(&user)
        }
        (&Method::DELETE, ["users", id]) => {
            let id: i64 = id.parse().unwrap_or(-1);
            let before = store.users.len();
            store.users.retain(|u| u["id"] != id);
            if store.users.len() == before {
                return not_found();
            }
            reply(StatusCode::NO_CONTENT, "")
        }

        (&Method::GET, ["releases"]) => json_reply(&Value::Array(store.releases.clone())),
        (&Method::GET, ["releases", "version", version]) => {
            let version = urlencoding::decode(version).map(|v| v.into_owned()).unwrap_or_default();
            match store.releases.iter().find(|r| r["versionNumber"] == version.as_str()) {
                Some(release) => json_reply(release),
                None => not_found(),
            }
        }
        (&Method::GET, ["releases", id]) => match store.release_index(id.parse().unwrap_or(-1)) {
            Some(idx) => json_reply(&store.releases[idx]),
            None => not_found(),
        },
        (&Method::POST, ["releases"]) => {
            if body["owner"].is_null() {
                return bad_request("Owner is required".to_string());
            }
            let id = store.next_id();
            let mut release = body.clone();
            release["id"] = json!(id);
            release["currentEnvironment"] = json!(STAGES[0]);
            release["createdAt"] = json!("2024-03-15T10:30:00");
            release["updatedAt"] = json!("2024-03-15T10:30:00");
            store.releases.push(release.clone());
            json_reply(&release)
        }
        (&Method::PUT, ["releases", id]) => {
            let Some(idx) = store.release_index(id.parse().unwrap_or(-1)) else {
                return not_found();
            };
            let release = &mut store.releases[idx];
            release["versionNumber"] = body["versionNumber"].clone();
            release["description"] = body["description"].clone();
            if !body["owner"].is_null() {
                release["owner"] = body["owner"].clone();
            }
            json_reply(&release.clone())
        }
        (&Method::POST, ["releases", id, action @ ("promote" | "rollback")]) => {
            let param = if *action == "promote" { "promotedById" } else { "rolledBackById" };
            let Some(actor) = query_param(&query, param).and_then(|a| a.parse::<i64>().ok()) else {
                return bad_request(format!("Invalid {}", param));
            };
            let Some(user) = store.user(actor) else {
                return bad_request(format!("User not found: {}", actor));
            };
            let Some(idx) = store.release_index(id.parse().unwrap_or(-1)) else {
                return not_found();
            };

            let current = store.releases[idx]["currentEnvironment"]
                .as_str()
                .unwrap_or("DEV")
                .to_string();
            let pos = STAGES.iter().position(|s| *s == current).unwrap_or(0);
            let target = if *action == "promote" {
                if pos + 1 >= STAGES.len() {
                    return bad_request(format!("Release is already in {}", current));
                }
                STAGES[pos + 1]
            } else {
                if pos == 0 {
                    return bad_request(format!("Cannot rollback from {}", current));
                }
                STAGES[pos - 1]
            };

            let notes = if *action == "promote" {
                format!("Promoted from {} to {}", current, target)
            } else {
                format!("Rolled back from {} to {}", current, target)
            };

            store.releases[idx]["currentEnvironment"] = json!(target);
            let release = store.releases[idx].clone();
            let log_id = store.next_id();
            store.logs.push(json!({
                "id": log_id,
                "release": release,
                "environment": target,
                "deployedBy": user,
                "deploymentTimestamp": "2024-03-16T09:00:00",
                "success": true,
                "notes": notes,
            }));
            json_reply(&release)
        }
        (&Method::DELETE, ["releases", id]) => {
            let id: i64 = id.parse().unwrap_or(-1);
            let before = store.releases.len();
            store.releases.retain(|r| r["id"] != id);
            if store.releases.len() == before {
                return not_found();
            }
            reply(StatusCode::NO_CONTENT, "")
        }

        (&Method::GET, ["deployment-logs"]) => json_reply(&Value::Array(store.logs.clone())),
        (&Method::GET, ["deployment-logs", "release", id]) => {
            let id: i64 = id.parse().unwrap_or(-1);
            let logs: Vec<Value> = store
                .logs
                .iter()
                .filter(|l| l["release"]["id"] == id)
                .cloned()
                .collect();
            json_reply(&Value::Array(logs))
        }

        _ => not_found(),
    }
}

/// Address nothing listens on
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
