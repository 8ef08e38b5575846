//! HTTP client for the release-tracking REST API
//!
//! One request per call, no retries. Non-success responses surface the raw
//! body text; success bodies are decoded as JSON without further checks.

use crate::config::ApiConfig;
use crate::error::ClientError;
use crate::model::{DeploymentLog, NewRelease, NewUser, Release, User};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// Client bound to a fixed API base URL
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    /// Send a request and return the body of a success response
    async fn send(
        &self,
        req: RequestBuilder,
        method: &Method,
        path: &str,
    ) -> Result<String, ClientError> {
        let resp = req.send().await.map_err(|e| {
            debug!(%method, path, error = %e, "API request failed before a response");
            ClientError::from(e)
        })?;

        let status = resp.status();
        let body = resp.text().await?;
        debug!(%method, path, status = status.as_u16(), "API request completed");

        if !status.is_success() {
            return Err(ClientError::Server {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }

    fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ClientError> {
        Ok(serde_json::from_str(body)?)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let body = self
            .send(self.request(Method::GET, path), &Method::GET, path)
            .await?;
        Self::decode(&body)
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.request(Method::POST, path).json(body);
        let body = self.send(req, &Method::POST, path).await?;
        Self::decode(&body)
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.request(Method::PUT, path).json(body);
        let body = self.send(req, &Method::PUT, path).await?;
        Self::decode(&body)
    }

    /// POST without a request body
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let body = self.send(self.request(Method::POST, path), &Method::POST, path).await?;
        Self::decode(&body)
    }

    /// DELETE; the success body is plain text and is discarded
    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        self.send(self.request(Method::DELETE, path), &Method::DELETE, path).await?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------------

    pub async fn list_users(&self) -> Result<Vec<User>, ClientError> {
        self.get_json("/users").await
    }

    pub async fn get_user(&self, id: i64) -> Result<User, ClientError> {
        self.get_json(&format!("/users/{}", id)).await
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<User, ClientError> {
        self.post_json("/users", user).await
    }

    pub async fn update_user(&self, id: i64, user: &NewUser) -> Result<User, ClientError> {
        self.put_json(&format!("/users/{}", id), user).await
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), ClientError> {
        self.delete(&format!("/users/{}", id)).await
    }

    // ------------------------------------------------------------------------
    // Releases
    // ------------------------------------------------------------------------

    pub async fn list_releases(&self) -> Result<Vec<Release>, ClientError> {
        self.get_json("/releases").await
    }

    pub async fn get_release(&self, id: i64) -> Result<Release, ClientError> {
        self.get_json(&format!("/releases/{}", id)).await
    }

    pub async fn get_release_by_version(&self, version: &str) -> Result<Release, ClientError> {
        self.get_json(&format!("/releases/version/{}", urlencoding::encode(version)))
            .await
    }

    pub async fn create_release(&self, release: &NewRelease) -> Result<Release, ClientError> {
        self.post_json("/releases", release).await
    }

    pub async fn update_release(
        &self,
        id: i64,
        release: &NewRelease,
    ) -> Result<Release, ClientError> {
        self.put_json(&format!("/releases/{}", id), release).await
    }

    /// The actor is passed through as entered; the server resolves it
    pub async fn promote_release(
        &self,
        id: i64,
        promoted_by: &str,
    ) -> Result<Release, ClientError> {
        self.post_empty(&format!(
            "/releases/{}/promote?promotedById={}",
            id,
            urlencoding::encode(promoted_by)
        ))
        .await
    }

    pub async fn rollback_release(
        &self,
        id: i64,
        rolled_back_by: &str,
    ) -> Result<Release, ClientError> {
        self.post_empty(&format!(
            "/releases/{}/rollback?rolledBackById={}",
            id,
            urlencoding::encode(rolled_back_by)
        ))
        .await
    }

    pub async fn delete_release(&self, id: i64) -> Result<(), ClientError> {
        self.delete(&format!("/releases/{}", id)).await
    }

    // ------------------------------------------------------------------------
    // Deployment logs
    // ------------------------------------------------------------------------

    pub async fn list_deployment_logs(&self) -> Result<Vec<DeploymentLog>, ClientError> {
        self.get_json("/deployment-logs").await
    }

    pub async fn list_deployment_logs_for_release(
        &self,
        release_id: i64,
    ) -> Result<Vec<DeploymentLog>, ClientError> {
        self.get_json(&format!("/deployment-logs/release/{}", release_id))
            .await
    }
}
