use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, info_span, instrument, warn, Instrument};

use super::client::UserListClient;
use super::messages::{Completion, ListRequest, ServiceResponse, ServiceResult};
use crate::domain::{CreateCandidate, CreatedUser, DeleteStatus, OverlayEntry, PageView, SearchState, UserRecord};
use crate::engine::{paginate, reconcile};
use crate::error::UserError;
use crate::notify::{Notification, Notifier};
use crate::ports::{bounded, OverlayRepository, RemoteSource};
use crate::sync::{ContextId, SignalBus, SignalSubscription, SyncTrigger};

/// Macro for clean error response handling
macro_rules! send_error {
    ($respond_to:expr, $error:expr) => {{
        let _ = $respond_to.send(Err($error));
        return;
    }};
}

const DEFAULT_PAGE_SIZE: NonZeroUsize = match NonZeroUsize::new(6) {
    Some(size) => size,
    None => unreachable!(),
};

/// Tunables of one listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListSettings {
    pub page_size: NonZeroUsize,
    /// Page and page size requested from the remote service on every load.
    pub remote_page: u32,
    pub remote_per_page: u32,
    /// Upper bound for every remote call.
    pub request_timeout: Duration,
}

impl Default for ListSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            remote_page: 1,
            remote_per_page: 6,
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadState {
    Idle,
    Loading,
    /// `degraded` when the remote source failed and only local users show.
    Ready { degraded: bool },
}

/// What the display layer renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingSnapshot {
    pub state: LoadState,
    pub view: PageView,
}

/// Collaborators of a listing.
#[derive(Clone)]
pub struct ListDeps {
    pub remote: Arc<dyn RemoteSource>,
    pub overlay: Arc<dyn OverlayRepository>,
    pub notifier: Notifier,
    pub bus: SignalBus,
    pub context: ContextId,
}

/// The user listing of one context.
///
/// Owns the reconciled collection, the search term and the current page.
/// Requests are handled one at a time; remote calls run in spawned tasks and
/// come back as [`Completion`]s, so navigation stays responsive while a load
/// is outstanding.
pub struct UserListService {
    receiver: mpsc::Receiver<ListRequest>,
    completions: mpsc::UnboundedReceiver<Completion>,
    completion_sender: mpsc::UnboundedSender<Completion>,
    deps: ListDeps,
    settings: ListSettings,
    subscription: Option<SignalSubscription>,
    users: Vec<UserRecord>,
    search: SearchState,
    current_page: usize,
    state: LoadState,
    /// Bumped by every load and by deactivation; completions carrying an
    /// older value are stale.
    generation: u64,
    waiters: Vec<ServiceResponse<PageView>>,
    deletes_in_flight: HashSet<i64>,
    snapshot: watch::Sender<ListingSnapshot>,
}

impl UserListService {
    pub fn new(buffer_size: usize, deps: ListDeps, settings: ListSettings) -> (Self, UserListClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let (completion_sender, completions) = mpsc::unbounded_channel();
        let (snapshot, snapshot_rx) = watch::channel(ListingSnapshot {
            state: LoadState::Idle,
            view: PageView::empty(settings.page_size),
        });
        let client = UserListClient::new(sender, snapshot_rx, deps.context);

        let service = Self {
            receiver,
            completions,
            completion_sender,
            deps,
            settings,
            subscription: None,
            users: Vec::new(),
            search: SearchState::default(),
            current_page: 1,
            state: LoadState::Idle,
            generation: 0,
            waiters: Vec::new(),
            deletes_in_flight: HashSet::new(),
            snapshot,
        };
        (service, client)
    }

    /// Main actor loop.
    ///
    /// Remote completions are drained before new requests so a caller that
    /// saw its mutation acknowledged also sees its effect.
    #[instrument(name = "user_list_service", skip(self), fields(context = %self.deps.context))]
    pub async fn run(mut self) {
        info!("UserListService starting");

        loop {
            tokio::select! {
                biased;
                Some(done) = self.completions.recv() => self.handle_completion(done),
                trigger = next_trigger(&mut self.subscription) => self.handle_trigger(trigger),
                msg = self.receiver.recv() => {
                    let Some(msg) = msg else {
                        info!("All clients dropped");
                        break;
                    };
                    match msg {
                        ListRequest::Activate { respond_to } => self.handle_activate(respond_to),
                        ListRequest::Deactivate { respond_to } => self.handle_deactivate(respond_to),
                        ListRequest::Reload { respond_to } => {
                            self.waiters.push(respond_to);
                            self.start_load(false);
                        }
                        ListRequest::Search { term, respond_to } => self.handle_search(term, respond_to),
                        ListRequest::GoToPage { page, respond_to } => self.handle_go_to_page(page, respond_to),
                        ListRequest::NextPage { respond_to } => {
                            self.handle_go_to_page(self.current_page + 1, respond_to);
                        }
                        ListRequest::PreviousPage { respond_to } => {
                            self.handle_go_to_page(self.current_page.saturating_sub(1), respond_to);
                        }
                        ListRequest::CurrentPage { respond_to } => {
                            let _ = respond_to.send(Ok(self.view()));
                        }
                        ListRequest::FindUser { id, respond_to } => {
                            let user = self.users.iter().find(|user| user.id == id).cloned();
                            let _ = respond_to.send(Ok(user));
                        }
                        ListRequest::CreateUser { candidate, respond_to } => {
                            self.handle_create_user(candidate, respond_to);
                        }
                        ListRequest::DeleteUser { record, respond_to } => {
                            self.handle_delete_user(record, respond_to);
                        }
                        ListRequest::Shutdown => {
                            info!("UserListService shutting down");
                            break;
                        }
                        #[cfg(test)]
                        ListRequest::UserCount { respond_to } => {
                            let _ = respond_to.send(Ok(self.users.len()));
                        }
                    }
                }
            }
        }

        // Deregisters the listeners on every way out of the loop.
        self.subscription = None;
        info!("UserListService stopped");
    }

    fn handle_completion(&mut self, done: Completion) {
        match done {
            Completion::Loaded { generation, reset_page, result } => {
                self.handle_loaded(generation, reset_page, result);
            }
            Completion::Created { candidate, result, respond_to } => {
                self.handle_created(candidate, result, respond_to);
            }
            Completion::Deleted { record, result, respond_to } => {
                self.handle_deleted(record, result, respond_to);
            }
        }
    }

    // =========================================================================
    // Lifecycle and cross-context sync
    // =========================================================================

    #[instrument(skip(self, respond_to))]
    fn handle_activate(&mut self, respond_to: ServiceResponse<PageView>) {
        if self.subscription.is_none() {
            let key = self.deps.overlay.key().to_string();
            self.subscription = Some(self.deps.bus.subscribe(self.deps.context, key));
        } else {
            debug!("Listeners already registered");
        }
        self.waiters.push(respond_to);
        self.start_load(true);
    }

    #[instrument(skip(self, respond_to))]
    fn handle_deactivate(&mut self, respond_to: ServiceResponse<()>) {
        self.subscription = None;
        self.generation += 1;
        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(Err(UserError::ActorCommunicationError(
                "listing deactivated".to_string(),
            )));
        }
        self.set_state(LoadState::Idle);
        info!("Listing deactivated");
        let _ = respond_to.send(Ok(()));
    }

    fn handle_trigger(&mut self, trigger: Option<SyncTrigger>) {
        match trigger {
            Some(trigger) => {
                info!(?trigger, "Cross-context signal, reloading");
                self.start_load(false);
            }
            None => {
                warn!("Signal bus closed, dropping listeners");
                self.subscription = None;
            }
        }
    }

    // =========================================================================
    // Loading and reconciliation
    // =========================================================================

    /// Starts a fresh load. Any load still in flight becomes stale.
    fn start_load(&mut self, reset_page: bool) {
        self.generation += 1;
        let generation = self.generation;
        self.set_state(LoadState::Loading);

        let remote = Arc::clone(&self.deps.remote);
        let completions = self.completion_sender.clone();
        let ListSettings {
            remote_page,
            remote_per_page,
            request_timeout,
            ..
        } = self.settings;

        debug!(generation, reset_page, "Load started");
        tokio::spawn(
            async move {
                let result = bounded(request_timeout, remote.list_users(remote_page, remote_per_page)).await;
                let _ = completions.send(Completion::Loaded {
                    generation,
                    reset_page,
                    result,
                });
            }
            .instrument(info_span!("load_users", generation)),
        );
    }

    #[instrument(skip(self, result), fields(current = self.generation))]
    fn handle_loaded(&mut self, generation: u64, reset_page: bool, result: ServiceResult<Vec<UserRecord>>) {
        if generation != self.generation {
            debug!("Discarding stale load");
            return;
        }

        let overlay = self.deps.overlay.load();
        let (remote, degraded) = match result {
            Ok(users) => (users, false),
            Err(e) => {
                warn!(error = %e, "Remote load failed, showing local users only");
                self.deps.notifier.notify(Notification::warning(
                    "Could not load users from the server, showing local users only",
                ));
                (Vec::new(), true)
            }
        };

        self.users = reconcile(&overlay, remote);
        if reset_page {
            self.current_page = 1;
        }
        self.state = LoadState::Ready { degraded };
        let view = self.refresh();
        info!(user_count = self.users.len(), degraded, "Users loaded");

        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(Ok(view.clone()));
        }
    }

    // =========================================================================
    // Filter and pagination
    // =========================================================================

    #[instrument(skip(self, respond_to))]
    fn handle_search(&mut self, term: String, respond_to: ServiceResponse<PageView>) {
        self.search = SearchState::new(term);
        let view = self.refresh();
        debug!(active = self.search.is_active(), total_pages = view.total_pages, "Search applied");
        let _ = respond_to.send(Ok(view));
    }

    #[instrument(skip(self, respond_to))]
    fn handle_go_to_page(&mut self, page: usize, respond_to: ServiceResponse<PageView>) {
        self.current_page = page;
        let view = self.refresh();
        let _ = respond_to.send(Ok(view));
    }

    fn view(&self) -> PageView {
        paginate::apply(&self.users, &self.search, self.settings.page_size, self.current_page)
    }

    /// Recomputes the page from the current state and publishes it.
    fn refresh(&mut self) -> PageView {
        let view = self.view();
        self.current_page = view.current_page;
        self.snapshot.send_replace(ListingSnapshot {
            state: self.state,
            view: view.clone(),
        });
        view
    }

    fn set_state(&mut self, state: LoadState) {
        self.state = state;
        self.snapshot.send_modify(|snapshot| snapshot.state = state);
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    #[instrument(fields(name = %candidate.name, job = %candidate.job), skip(self, candidate, respond_to))]
    fn handle_create_user(&mut self, candidate: CreateCandidate, respond_to: ServiceResponse<UserRecord>) {
        debug!("Processing create_user request");

        if candidate.name.trim().is_empty() || candidate.job.trim().is_empty() {
            warn!("Validation failed: name and job are required");
            send_error!(
                respond_to,
                UserError::ValidationError("name and job are required".to_string())
            );
        }

        let remote = Arc::clone(&self.deps.remote);
        let completions = self.completion_sender.clone();
        let timeout = self.settings.request_timeout;
        tokio::spawn(
            async move {
                let result = bounded(timeout, remote.create_user(&candidate)).await;
                let _ = completions.send(Completion::Created {
                    candidate,
                    result,
                    respond_to,
                });
            }
            .in_current_span(),
        );
    }

    #[instrument(fields(name = %candidate.name), skip(self, candidate, result, respond_to))]
    fn handle_created(
        &mut self,
        candidate: CreateCandidate,
        result: ServiceResult<CreatedUser>,
        respond_to: ServiceResponse<UserRecord>,
    ) {
        let failure_message = format!("There was an error creating the user {}", candidate.name);

        let created = match result {
            Ok(created) => created,
            Err(e) => {
                error!(error = %e, "Create failed");
                self.deps.notifier.notify(Notification::error(failure_message));
                send_error!(respond_to, e);
            }
        };

        let Some(id) = created.id else {
            error!("Create response carried no id");
            self.deps.notifier.notify(Notification::error(failure_message));
            send_error!(
                respond_to,
                UserError::Logical("create response carried no id".to_string())
            );
        };

        let name = created
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(candidate.name);
        let job = created.job.unwrap_or(candidate.job);
        let created_at = created.created_at.unwrap_or_else(|| Utc::now().to_rfc3339());

        let entry = OverlayEntry::confirmed(id, &name, &job, created_at);
        let record = entry.stored_record();
        match self.deps.overlay.append(entry) {
            Ok(()) => {
                info!(user_id = id, "User created successfully");
                self.deps
                    .notifier
                    .notify(Notification::success(format!("The user {name} was created successfully")));
            }
            Err(e) => {
                error!(error = %e, "Failed to persist created user");
                self.deps.notifier.notify(Notification::warning(format!(
                    "The user {name} was created but could not be saved locally"
                )));
            }
        }

        self.start_load(true);
        let _ = respond_to.send(Ok(record));
    }

    #[instrument(fields(user_id = record.id), skip(self, record, respond_to))]
    fn handle_delete_user(&mut self, record: UserRecord, respond_to: ServiceResponse<()>) {
        debug!("Processing delete_user request");

        if !self.deletes_in_flight.insert(record.id) {
            warn!("Delete already in flight");
            send_error!(respond_to, UserError::DeleteInFlight(record.id));
        }

        let remote = Arc::clone(&self.deps.remote);
        let completions = self.completion_sender.clone();
        let timeout = self.settings.request_timeout;
        tokio::spawn(
            async move {
                let result = bounded(timeout, remote.delete_user(record.id)).await;
                let _ = completions.send(Completion::Deleted {
                    record,
                    result,
                    respond_to,
                });
            }
            .in_current_span(),
        );
    }

    #[instrument(fields(user_id = record.id), skip(self, record, result, respond_to))]
    fn handle_deleted(
        &mut self,
        record: UserRecord,
        result: ServiceResult<DeleteStatus>,
        respond_to: ServiceResponse<()>,
    ) {
        self.deletes_in_flight.remove(&record.id);
        let name = record.display_name();

        match result {
            Ok(status) if status.is_ok() => {
                self.users.retain(|user| user.id != record.id);
                match self.deps.overlay.remove(record.id) {
                    Ok(true) => debug!("Removed from overlay"),
                    Ok(false) => debug!("Not in overlay"),
                    Err(e) => error!(error = %e, "Failed to remove user from overlay"),
                }
                self.refresh();

                info!("User deleted successfully");
                self.deps
                    .notifier
                    .notify(Notification::success(format!("The user {name} was successfully deleted")));
                let _ = respond_to.send(Ok(()));
            }
            Ok(status) => {
                warn!(status = %status.status, "Delete not confirmed");
                self.deps
                    .notifier
                    .notify(Notification::error(format!("Failed to delete the user {name}")));
                let _ = respond_to.send(Err(UserError::Logical(format!(
                    "delete answered with status {}",
                    status.status
                ))));
            }
            Err(e) => {
                error!(error = %e, "Delete failed");
                self.deps.notifier.notify(Notification::error(format!(
                    "An error occurred while deleting the user {name}"
                )));
                let _ = respond_to.send(Err(e));
            }
        }
    }
}

async fn next_trigger(subscription: &mut Option<SignalSubscription>) -> Option<SyncTrigger> {
    match subscription {
        Some(subscription) => subscription.recv().await,
        None => std::future::pending().await,
    }
}
