//! HTTP client for the grudge server's REST surface.

use anyhow::{Result, bail};
use serde::de::DeserializeOwned;

use grudge_types::api::{
    LoginRequest, LoginResponse, PositionResponse, RegisterRequest, RegisterResponse,
    SyncResponse,
};
use grudge_types::models::MirrorSnapshot;

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<RegisterResponse> {
        let resp = self
            .http
            .post(self.url("/auth/register"))
            .json(&RegisterRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;
        expect_json(resp).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let resp = self
            .http
            .post(self.url("/auth/login"))
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;
        expect_json(resp).await
    }

    /// `POST /sync` — push a full mirror snapshot. The server replies 200
    /// with counts even when some records were skipped; only a malformed or
    /// unauthorized request errors here.
    pub async fn sync(&self, snapshot: &MirrorSnapshot) -> Result<SyncResponse> {
        let resp = self
            .authed(self.http.post(self.url("/sync")))?
            .json(snapshot)
            .send()
            .await?;
        expect_json(resp).await
    }

    pub async fn update_position(&self, enemy_id: &str, x: f64, y: f64) -> Result<PositionResponse> {
        let resp = self
            .authed(self.http.post(self.url("/position")))?
            .json(&serde_json::json!({ "enemyId": enemy_id, "x": x, "y": y }))
            .send()
            .await?;
        expect_json(resp).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        match &self.token {
            Some(token) => Ok(builder.bearer_auth(token)),
            None => bail!("not logged in (no session token)"),
        }
    }
}

async fn expect_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }
    let body: serde_json::Value = resp.json().await.unwrap_or_default();
    let message = body["error"].as_str().unwrap_or("unknown error");
    bail!("server returned {status}: {message}")
}
