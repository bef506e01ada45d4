use tokio::sync::oneshot;

use crate::domain::{CreateCandidate, CreatedUser, DeleteStatus, PageView, UserRecord};
use crate::error::UserError;

pub type ServiceResult<T> = std::result::Result<T, UserError>;
pub type ServiceResponse<T> = oneshot::Sender<ServiceResult<T>>;

/// Requests accepted by the user listing. Each variant carries a oneshot
/// channel for its response.
#[derive(Debug)]
pub enum ListRequest {
    /// Registers the cross-context listeners and loads from page 1. Answers
    /// once the load has been applied.
    Activate {
        respond_to: ServiceResponse<PageView>,
    },
    /// Drops the listeners and discards loads still in flight.
    Deactivate {
        respond_to: ServiceResponse<()>,
    },
    /// Reloads both sources, keeping the current page when still valid.
    Reload {
        respond_to: ServiceResponse<PageView>,
    },
    Search {
        term: String,
        respond_to: ServiceResponse<PageView>,
    },
    GoToPage {
        page: usize,
        respond_to: ServiceResponse<PageView>,
    },
    NextPage {
        respond_to: ServiceResponse<PageView>,
    },
    PreviousPage {
        respond_to: ServiceResponse<PageView>,
    },
    CurrentPage {
        respond_to: ServiceResponse<PageView>,
    },
    FindUser {
        id: i64,
        respond_to: ServiceResponse<Option<UserRecord>>,
    },
    CreateUser {
        candidate: CreateCandidate,
        respond_to: ServiceResponse<UserRecord>,
    },
    DeleteUser {
        record: UserRecord,
        respond_to: ServiceResponse<()>,
    },
    Shutdown,
    #[cfg(test)]
    UserCount {
        respond_to: ServiceResponse<usize>,
    },
}

/// Results of remote calls running in spawned tasks, fed back to the actor.
#[derive(Debug)]
pub(crate) enum Completion {
    Loaded {
        generation: u64,
        reset_page: bool,
        result: ServiceResult<Vec<UserRecord>>,
    },
    Created {
        candidate: CreateCandidate,
        result: ServiceResult<CreatedUser>,
        respond_to: ServiceResponse<UserRecord>,
    },
    Deleted {
        record: UserRecord,
        result: ServiceResult<DeleteStatus>,
        respond_to: ServiceResponse<()>,
    },
}
