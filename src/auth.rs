use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{StorageError, UserError};
use crate::ports::StorageSlot;

/// Storage key of the session token.
pub const TOKEN_KEY: &str = "token";

/// Token-presence authentication: a non-empty stored token means the user is
/// logged in.
#[derive(Clone)]
pub struct AuthService {
    slot: Arc<dyn StorageSlot>,
}

impl AuthService {
    pub fn new(slot: Arc<dyn StorageSlot>) -> Self {
        Self { slot }
    }

    pub fn is_authenticated(&self) -> bool {
        match self.slot.read(TOKEN_KEY) {
            Ok(token) => token.is_some_and(|t| !t.trim().is_empty()),
            Err(e) => {
                warn!(error = %e, "Token unreadable");
                false
            }
        }
    }

    pub fn set_token(&self, token: &str) -> Result<(), StorageError> {
        self.slot.write(TOKEN_KEY, token)?;
        info!("Token stored");
        Ok(())
    }

    /// Gate for views that need a logged-in user.
    pub fn require(&self) -> Result<(), UserError> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(UserError::Unauthenticated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MemorySlot;

    #[test]
    fn token_presence_decides() {
        let auth = AuthService::new(Arc::new(MemorySlot::new()));
        assert!(!auth.is_authenticated());
        assert_eq!(auth.require(), Err(UserError::Unauthenticated));

        auth.set_token("   ").unwrap();
        assert!(!auth.is_authenticated());

        auth.set_token("QpwL5tke4Pnpja7X4").unwrap();
        assert!(auth.is_authenticated());
        assert_eq!(auth.require(), Ok(()));
    }
}
