//! HTTP adapter for a reqres-compatible user API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::domain::{CreateCandidate, CreatedUser, Credentials, DeleteStatus, LoginToken, UserRecord};
use crate::error::UserError;
use crate::ports::RemoteSource;

const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Deserialize)]
struct UserPage {
    #[serde(default)]
    data: Vec<UserRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct LoginFailure {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Clone)]
pub struct ReqresClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl ReqresClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, UserError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UserError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(API_KEY_HEADER, &self.api_key)
    }
}

fn classify(error: reqwest::Error) -> UserError {
    if error.is_decode() {
        UserError::Logical(format!("unusable response body: {error}"))
    } else {
        UserError::Network(error.to_string())
    }
}

#[async_trait]
impl RemoteSource for ReqresClient {
    #[instrument(skip(self))]
    async fn list_users(&self, page: u32, per_page: u32) -> Result<Vec<UserRecord>, UserError> {
        debug!("Fetching users");
        let page = self
            .authorized(self.http.get(self.url("users")))
            .query(&[("page", page), ("per_page", per_page)])
            .send()
            .await
            .map_err(classify)?
            .error_for_status()
            .map_err(classify)?
            .json::<UserPage>()
            .await
            .map_err(classify)?;
        debug!(user_count = page.data.len(), "Users fetched");
        Ok(page.data)
    }

    #[instrument(skip(self), fields(name = %candidate.name))]
    async fn create_user(&self, candidate: &CreateCandidate) -> Result<CreatedUser, UserError> {
        debug!("Creating user");
        self.authorized(self.http.post(self.url("users")))
            .json(candidate)
            .send()
            .await
            .map_err(classify)?
            .error_for_status()
            .map_err(classify)?
            .json::<CreatedUser>()
            .await
            .map_err(classify)
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, id: i64) -> Result<DeleteStatus, UserError> {
        debug!("Deleting user");
        let response = self
            .authorized(self.http.delete(self.url(&format!("users/{id}"))))
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if status.is_success() {
            return Ok(DeleteStatus::new(DeleteStatus::OK));
        }
        warn!(status = %status, "Delete rejected");
        Ok(DeleteStatus::new(
            status.canonical_reason().unwrap_or(status.as_str()),
        ))
    }

    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn login(&self, credentials: &Credentials) -> Result<String, UserError> {
        debug!("Logging in");
        let response = self
            .authorized(self.http.post(self.url("login")))
            .json(credentials)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if status.is_client_error() {
            let failure = response.json::<LoginFailure>().await.unwrap_or_default();
            let reason = failure
                .error
                .unwrap_or_else(|| status.canonical_reason().unwrap_or(status.as_str()).to_string());
            warn!(status = %status, reason = %reason, "Login rejected");
            return Err(UserError::Logical(format!("login rejected: {reason}")));
        }

        let login = response
            .error_for_status()
            .map_err(classify)?
            .json::<LoginToken>()
            .await
            .map_err(classify)?;
        token_from(login)
    }
}

fn token_from(login: LoginToken) -> Result<String, UserError> {
    login
        .token
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| UserError::Logical("login response carried no token".to_string()))
}
