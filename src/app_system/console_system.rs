use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::auth::AuthService;
use crate::domain::Credentials;
use crate::error::UserError;
use crate::list_actor::{ListDeps, ListSettings, UserListClient, UserListService};
use crate::notify::{Notification, Notifier};
use crate::ports::{bounded, OverlayRepository, OverlayStore, RemoteSource, StorageSlot, OVERLAY_KEY};
use crate::sync::{ContextId, ContextSignal, SignalBus};

const LIST_BUFFER: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    LoggedIn,
    /// A token was already stored; nothing was sent.
    AlreadyLoggedIn,
}

/// One console context: its storage view, auth gate, notifications and the
/// listing actor once opened.
///
/// Several systems built on the same slot and bus behave like several tabs of
/// the same console.
pub struct ConsoleSystem {
    pub auth: AuthService,
    pub notifier: Notifier,
    context: ContextId,
    settings: ListSettings,
    remote: Arc<dyn RemoteSource>,
    overlay: Arc<dyn OverlayRepository>,
    bus: SignalBus,
    handles: Vec<tokio::task::JoinHandle<()>>,
    lists: Vec<UserListClient>,
}

impl ConsoleSystem {
    pub fn new(
        settings: ListSettings,
        remote: Arc<dyn RemoteSource>,
        slot: Arc<dyn StorageSlot>,
        bus: SignalBus,
    ) -> Self {
        let context = ContextId::next();
        let overlay = OverlayStore::new(Arc::clone(&slot), context).with_bus(bus.clone());
        info!(%context, "Console context created");

        Self {
            auth: AuthService::new(slot),
            notifier: Notifier::default(),
            context,
            settings,
            remote,
            overlay: Arc::new(overlay),
            bus,
            handles: Vec::new(),
            lists: Vec::new(),
        }
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn overlay(&self) -> Arc<dyn OverlayRepository> {
        Arc::clone(&self.overlay)
    }

    /// Logs in against the remote service and stores the returned token.
    ///
    /// Credentials are validated before anything is sent. A context that
    /// already holds a token skips the login entirely.
    #[instrument(skip(self, credentials), fields(context = %self.context, email = %credentials.email))]
    pub async fn login(&self, credentials: Credentials) -> Result<LoginOutcome, UserError> {
        if self.auth.is_authenticated() {
            info!("Token already stored, skipping login");
            self.notifier.notify(Notification::info("You are already logged in"));
            return Ok(LoginOutcome::AlreadyLoggedIn);
        }

        credentials.validate()?;

        let token = match bounded(self.settings.request_timeout, self.remote.login(&credentials)).await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Login failed");
                return Err(e);
            }
        };
        self.auth
            .set_token(&token)
            .map_err(|e| UserError::Storage(e.to_string()))?;

        info!("Logged in");
        Ok(LoginOutcome::LoggedIn)
    }

    /// Starts the listing actor. Refused unless a token is stored.
    ///
    /// The returned client still has to be activated.
    #[instrument(skip(self), fields(context = %self.context))]
    pub fn open_user_list(&mut self) -> Result<UserListClient, UserError> {
        self.auth.require()?;

        let deps = ListDeps {
            remote: Arc::clone(&self.remote),
            overlay: Arc::clone(&self.overlay),
            notifier: self.notifier.clone(),
            bus: self.bus.clone(),
            context: self.context,
        };
        let (service, client) = UserListService::new(LIST_BUFFER, deps, self.settings);
        self.handles.push(tokio::spawn(service.run()));
        self.lists.push(client.clone());
        info!(key = OVERLAY_KEY, "User list opened");
        Ok(client)
    }

    /// This context came back to the foreground.
    pub fn focus_regained(&self) {
        self.bus.publish(ContextSignal::FocusRegained {
            context: self.context,
        });
    }

    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down console...");

        for list in &self.lists {
            // An actor that already stopped has nothing left to shut down.
            let _ = list.shutdown().await;
        }
        drop(self.lists);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("Console shutdown complete.");
        Ok(())
    }
}
