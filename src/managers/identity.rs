//! Identity handle for repomark.
//!
//! The host application (desktop shell, CLI) owns authentication. This module
//! only publishes "which user is signed in, if any" and lets consumers observe
//! changes through a `tokio::sync::watch` channel.

use tokio::sync::watch;

/// Trait defining the identity capability consumed by the bookmark core.
pub trait IdentityTrait {
    fn current_user(&self) -> Option<String>;
    fn is_signed_in(&self) -> bool;
    fn subscribe(&self) -> watch::Receiver<Option<String>>;
}

/// Watch-backed identity provider.
#[derive(Clone)]
pub struct Identity {
    sender: watch::Sender<Option<String>>,
}

impl Identity {
    /// Creates an identity with nobody signed in.
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    /// Creates an identity already signed in as `user_id`.
    pub fn signed_in(user_id: impl Into<String>) -> Self {
        let (sender, _) = watch::channel(Some(user_id.into()));
        Self { sender }
    }

    /// Signs in as `user_id`. Re-signing in as the current user does not notify.
    pub fn sign_in(&self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        self.sender.send_if_modified(|current| {
            if current.as_deref() == Some(user_id.as_str()) {
                return false;
            }
            tracing::info!(user = %user_id, "identity signed in");
            *current = Some(user_id);
            true
        });
    }

    /// Signs the current user out. Does nothing when already signed out.
    pub fn sign_out(&self) {
        self.sender.send_if_modified(|current| {
            if current.is_none() {
                return false;
            }
            tracing::info!("identity signed out");
            *current = None;
            true
        });
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityTrait for Identity {
    fn current_user(&self) -> Option<String> {
        self.sender.borrow().clone()
    }

    fn is_signed_in(&self) -> bool {
        self.sender.borrow().is_some()
    }

    fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.sender.subscribe()
    }
}
