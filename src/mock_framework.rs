//! # Mock Framework
//!
//! Utilities for testing the listing against a remote source the test drives.
//!
//! Use [`create_scripted_remote`] to get a [`RemoteSource`] and a receiver.
//! Every remote call shows up on the receiver with a oneshot responder; the
//! test answers it (or drops it) with helpers like [`expect_list`] or
//! [`expect_delete`]. Answers can be given in any order, which is how stale
//! loads and in-flight mutations are simulated.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::domain::{CreateCandidate, CreatedUser, Credentials, DeleteStatus, UserRecord};
use crate::error::UserError;
use crate::ports::RemoteSource;

pub type Responder<T> = oneshot::Sender<Result<T, UserError>>;

#[derive(Debug)]
pub enum RemoteCall {
    List {
        page: u32,
        per_page: u32,
        respond_to: Responder<Vec<UserRecord>>,
    },
    Create {
        candidate: CreateCandidate,
        respond_to: Responder<CreatedUser>,
    },
    Delete {
        id: i64,
        respond_to: Responder<DeleteStatus>,
    },
    Login {
        credentials: Credentials,
        respond_to: Responder<String>,
    },
}

pub struct ScriptedRemote {
    sender: mpsc::Sender<RemoteCall>,
}

impl ScriptedRemote {
    async fn call<T>(&self, build: impl FnOnce(Responder<T>) -> RemoteCall) -> Result<T, UserError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| UserError::Network("scripted remote closed".to_string()))?;
        // A dropped responder plays the part of a connection reset.
        response
            .await
            .map_err(|_| UserError::Network("scripted remote dropped the call".to_string()))?
    }
}

#[async_trait]
impl RemoteSource for ScriptedRemote {
    async fn list_users(&self, page: u32, per_page: u32) -> Result<Vec<UserRecord>, UserError> {
        self.call(|respond_to| RemoteCall::List {
            page,
            per_page,
            respond_to,
        })
        .await
    }

    async fn create_user(&self, candidate: &CreateCandidate) -> Result<CreatedUser, UserError> {
        let candidate = candidate.clone();
        self.call(|respond_to| RemoteCall::Create {
            candidate,
            respond_to,
        })
        .await
    }

    async fn delete_user(&self, id: i64) -> Result<DeleteStatus, UserError> {
        self.call(|respond_to| RemoteCall::Delete { id, respond_to }).await
    }

    async fn login(&self, credentials: &Credentials) -> Result<String, UserError> {
        let credentials = credentials.clone();
        self.call(|respond_to| RemoteCall::Login {
            credentials,
            respond_to,
        })
        .await
    }
}

/// Creates a scripted remote source and the receiver its calls arrive on.
pub fn create_scripted_remote(buffer_size: usize) -> (Arc<dyn RemoteSource>, mpsc::Receiver<RemoteCall>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (Arc::new(ScriptedRemote { sender }), receiver)
}

/// Helper to verify that the next call is a list request
pub async fn expect_list(receiver: &mut mpsc::Receiver<RemoteCall>) -> Option<Responder<Vec<UserRecord>>> {
    match receiver.recv().await {
        Some(RemoteCall::List { respond_to, .. }) => Some(respond_to),
        _ => None,
    }
}

/// Helper to verify that the next call is a create request
pub async fn expect_create(
    receiver: &mut mpsc::Receiver<RemoteCall>,
) -> Option<(CreateCandidate, Responder<CreatedUser>)> {
    match receiver.recv().await {
        Some(RemoteCall::Create { candidate, respond_to }) => Some((candidate, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next call is a delete request
pub async fn expect_delete(receiver: &mut mpsc::Receiver<RemoteCall>) -> Option<(i64, Responder<DeleteStatus>)> {
    match receiver.recv().await {
        Some(RemoteCall::Delete { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next call is a login request
pub async fn expect_login(receiver: &mut mpsc::Receiver<RemoteCall>) -> Option<(Credentials, Responder<String>)> {
    match receiver.recv().await {
        Some(RemoteCall::Login { credentials, respond_to }) => Some((credentials, respond_to)),
        _ => None,
    }
}

/// `count` remote users with ids `1..=count`.
pub fn remote_users(count: i64) -> Vec<UserRecord> {
    (1..=count)
        .map(|id| UserRecord::new(id, format!("Remote{id}"), "User", format!("remote{id}@reqres.in")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_remote() {
        let (remote, mut receiver) = create_scripted_remote(10);

        let list_task = tokio::spawn(async move { remote.list_users(1, 6).await });

        match receiver.recv().await.expect("Expected List call") {
            RemoteCall::List {
                page,
                per_page,
                respond_to,
            } => {
                assert_eq!((page, per_page), (1, 6));
                respond_to.send(Ok(remote_users(2))).unwrap();
            }
            other => panic!("Unexpected call: {:?}", other),
        }

        let result = list_task.await.unwrap().unwrap();
        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn dropped_responder_is_a_network_failure() {
        let (remote, mut receiver) = create_scripted_remote(10);

        let delete_task = tokio::spawn(async move { remote.delete_user(4).await });

        let (id, responder) = expect_delete(&mut receiver).await.expect("Expected Delete call");
        assert_eq!(id, 4);
        drop(responder);

        assert!(matches!(delete_task.await.unwrap(), Err(UserError::Network(_))));
    }
}
