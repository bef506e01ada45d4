use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, instrument};

use super::messages::ListRequest;
use super::service::ListingSnapshot;
use crate::domain::{CreateCandidate, PageView, UserRecord};
use crate::error::UserError;
use crate::sync::ContextId;

/// Handle to a running [`UserListService`](super::UserListService).
#[derive(Clone)]
pub struct UserListClient {
    sender: mpsc::Sender<ListRequest>,
    snapshot: watch::Receiver<ListingSnapshot>,
    context: ContextId,
}

impl UserListClient {
    pub(super) fn new(
        sender: mpsc::Sender<ListRequest>,
        snapshot: watch::Receiver<ListingSnapshot>,
        context: ContextId,
    ) -> Self {
        Self {
            sender,
            snapshot,
            context,
        }
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Follows every state and page change of the listing.
    pub fn subscribe_view(&self) -> watch::Receiver<ListingSnapshot> {
        self.snapshot.clone()
    }

    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<(), UserError> {
        debug!("Sending request");
        self.sender
            .send(ListRequest::Shutdown)
            .await
            .map_err(|_| UserError::ActorCommunicationError("Actor closed".to_string()))
    }
}

macro_rules! client_method {
    ($client:ty => fn $method:ident($($param:ident: $param_type:ty),*) -> $return_type:ty as $request:ident::$variant:ident) => {
        impl $client {
            #[instrument(skip(self))]
            pub async fn $method(&self, $($param: $param_type),*) -> Result<$return_type, UserError> {
                debug!("Sending request");
                let (respond_to, response) = oneshot::channel();
                self.sender.send($request::$variant {
                    $($param,)*
                    respond_to,
                }).await.map_err(|_| UserError::ActorCommunicationError("Actor closed".to_string()))?;

                response.await.map_err(|_| UserError::ActorCommunicationError("Actor dropped".to_string()))?
            }
        }
    };
}

client_method!(UserListClient => fn activate() -> PageView as ListRequest::Activate);
client_method!(UserListClient => fn deactivate() -> () as ListRequest::Deactivate);
client_method!(UserListClient => fn reload() -> PageView as ListRequest::Reload);
client_method!(UserListClient => fn search(term: String) -> PageView as ListRequest::Search);
client_method!(UserListClient => fn go_to_page(page: usize) -> PageView as ListRequest::GoToPage);
client_method!(UserListClient => fn next_page() -> PageView as ListRequest::NextPage);
client_method!(UserListClient => fn previous_page() -> PageView as ListRequest::PreviousPage);
client_method!(UserListClient => fn current_page() -> PageView as ListRequest::CurrentPage);
client_method!(UserListClient => fn find_user(id: i64) -> Option<UserRecord> as ListRequest::FindUser);
client_method!(UserListClient => fn create_user(candidate: CreateCandidate) -> UserRecord as ListRequest::CreateUser);
client_method!(UserListClient => fn delete_user(record: UserRecord) -> () as ListRequest::DeleteUser);

// Test-only view of the reconciled collection size
#[cfg(test)]
client_method!(UserListClient => fn user_count() -> usize as ListRequest::UserCount);
