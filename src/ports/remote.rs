use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{CreateCandidate, CreatedUser, Credentials, DeleteStatus, UserRecord};
use crate::error::UserError;

/// The remote user service.
///
/// Transport and HTTP errors surface as [`UserError::Network`]; a response
/// that arrived but cannot be used surfaces as [`UserError::Logical`].
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// One page of users, in the service's order.
    async fn list_users(&self, page: u32, per_page: u32) -> Result<Vec<UserRecord>, UserError>;

    /// Asks the service to create a user. A response without `id` is not a
    /// confirmation; callers decide what to do with it.
    async fn create_user(&self, candidate: &CreateCandidate) -> Result<CreatedUser, UserError>;

    async fn delete_user(&self, id: i64) -> Result<DeleteStatus, UserError>;

    /// Exchanges credentials for a session token. A rejection is
    /// [`UserError::Logical`].
    async fn login(&self, credentials: &Credentials) -> Result<String, UserError>;
}

/// Bounds a remote call; running out of time is a network failure.
pub async fn bounded<T>(
    timeout: Duration,
    call: impl Future<Output = Result<T, UserError>>,
) -> Result<T, UserError> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(UserError::Network(format!(
            "request timed out after {}ms",
            timeout.as_millis()
        ))),
    }
}
