//! Session Controller
//!
//! Owns the client's belief about who is signed in. Reconstructs the session
//! from the Credential Store at startup (hydration), runs the
//! login/register/logout transactions, and publishes every state change
//! through a watch channel for the UI to render from.
//!
//! Failure policy: a hydration-time profile fetch that fails — network down,
//! server error, even a 401 — never destroys the stored session. Only an
//! explicit logout (or a corrupted store document) ends it. A temporarily
//! unreachable backend must not log users out.

use gh_common::User;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::dto::Registration;
use crate::error::Result;
use crate::gateway::ApiGateway;
use crate::store::CredentialStore;

/// Where the controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Not yet activated
    Uninitialized,
    /// Stored identity loaded, backend confirmation in flight
    Hydrating,
    /// No session
    Anonymous,
    /// Session established
    Authenticated,
    /// Login transaction in flight
    Authenticating,
    /// Registration transaction in flight
    Registering,
}

/// Snapshot published to subscribers.
///
/// Invariant: `user` is `Some` only while `is_authenticated` is true.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub loading: bool,
}

impl SessionState {
    fn uninitialized() -> Self {
        Self {
            phase: SessionPhase::Uninitialized,
            user: None,
            is_authenticated: false,
            loading: true,
        }
    }

    fn anonymous() -> Self {
        Self {
            phase: SessionPhase::Anonymous,
            user: None,
            is_authenticated: false,
            loading: false,
        }
    }

    fn authenticated(user: User) -> Self {
        Self {
            phase: SessionPhase::Authenticated,
            user: Some(user),
            is_authenticated: true,
            loading: false,
        }
    }
}

/// The stateful core of the client.
///
/// Construct one per application activation, with its own store reference —
/// there is no ambient singleton, so tests build isolated controllers.
#[derive(Debug)]
pub struct SessionController {
    gateway: ApiGateway,
    store: Arc<dyn CredentialStore>,
    state: watch::Sender<SessionState>,
    /// Monotonic transaction counter. Async completions capture the value
    /// current when they started and are discarded if it moved since —
    /// a logout fired while a login is in flight wins regardless of which
    /// response lands first.
    seq: AtomicU64,
    hydrate_started: AtomicBool,
    /// When the backend last confirmed the profile.
    verified_at: Mutex<Option<Instant>>,
}

impl SessionController {
    pub fn new(gateway: ApiGateway, store: Arc<dyn CredentialStore>) -> Self {
        let (state, _) = watch::channel(SessionState::uninitialized());
        Self {
            gateway,
            store,
            state,
            seq: AtomicU64::new(0),
            hydrate_started: AtomicBool::new(false),
            verified_at: Mutex::new(None),
        }
    }

    /// Current snapshot.
    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Subscribe to state changes. Publishing to dropped receivers is a
    /// no-op, so a completion landing after the last subscriber unmounted
    /// is silently discarded.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    fn publish(&self, state: SessionState) {
        self.state.send_replace(state);
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, seq: u64) -> bool {
        self.seq.load(Ordering::SeqCst) == seq
    }

    fn mark_verified(&self) {
        *self.verified_at.lock() = Some(Instant::now());
    }

    // ------------------------------------------------------------------
    // Hydration
    // ------------------------------------------------------------------

    /// Reconstruct session state from the Credential Store, then confirm it
    /// against the backend. Runs at most once per controller; later calls
    /// return immediately.
    ///
    /// The stored identity is published before the profile fetch resolves,
    /// so the UI is usable immediately with the last-known user. A fetch
    /// failure of any kind leaves that identity in place.
    pub async fn hydrate(&self) {
        if self.hydrate_started.swap(true, Ordering::SeqCst) {
            return;
        }

        let stored = match self.store.load() {
            Some(stored) => stored,
            None => {
                self.publish(SessionState::anonymous());
                return;
            }
        };

        let seq = self.next_seq();
        self.publish(SessionState {
            phase: SessionPhase::Hydrating,
            user: Some(stored.user.clone()),
            is_authenticated: true,
            loading: true,
        });

        match self.gateway.get_profile().await {
            Ok(fresh) => {
                if !self.is_current(seq) {
                    debug!("Discarding hydration result superseded by a later transaction");
                    return;
                }
                self.store.save(&stored.token, &fresh);
                self.mark_verified();
                self.publish(SessionState::authenticated(fresh));
            }
            Err(e) => {
                warn!(error = %e, "Profile verification failed, keeping stored session");
                if self.is_current(seq) {
                    self.publish(SessionState::authenticated(stored.user));
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------

    /// Authenticate with email and password.
    ///
    /// On success the `{token, user}` pair is persisted as one write and the
    /// user is returned. On failure the state stays unauthenticated and the
    /// error carries the message to display. `loading` drops on every exit.
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let seq = self.next_seq();
        let _loading = self.begin(seq, SessionPhase::Authenticating);

        match self.gateway.login(email, password).await {
            Ok(session) => {
                if self.is_current(seq) {
                    self.store.save(&session.token, &session.user);
                    self.mark_verified();
                    info!(user = %session.user.email, "Logged in");
                    self.publish(SessionState::authenticated(session.user.clone()));
                } else {
                    debug!("Discarding login result superseded by a later transaction");
                }
                Ok(session.user)
            }
            Err(e) => {
                if self.is_current(seq) {
                    self.publish(SessionState::anonymous());
                }
                Err(e)
            }
        }
    }

    /// Create an account. A successful registration is an implicit login:
    /// the returned token and user are stored immediately.
    pub async fn register(&self, registration: &Registration) -> Result<User> {
        let seq = self.next_seq();
        let _loading = self.begin(seq, SessionPhase::Registering);

        match self.gateway.register(registration).await {
            Ok(session) => {
                if self.is_current(seq) {
                    self.store.save(&session.token, &session.user);
                    self.mark_verified();
                    info!(user = %session.user.email, "Registered");
                    self.publish(SessionState::authenticated(session.user.clone()));
                } else {
                    debug!("Discarding registration result superseded by a later transaction");
                }
                Ok(session.user)
            }
            Err(e) => {
                if self.is_current(seq) {
                    self.publish(SessionState::anonymous());
                }
                Err(e)
            }
        }
    }

    /// End the session. Synchronous and infallible: the in-memory state is
    /// dropped even if the store cannot be written, so the UI never claims
    /// an authentication it cannot prove.
    pub fn logout(&self) {
        self.next_seq();
        self.store.clear();
        *self.verified_at.lock() = None;
        info!("Logged out");
        self.publish(SessionState::anonymous());
    }

    /// Replace the in-memory user after a local edit and re-persist it with
    /// the existing token. Ignored while unauthenticated — a user record
    /// must never exist without a token.
    pub fn update_user(&self, user: User) {
        if !self.current().is_authenticated {
            warn!("update_user ignored: no active session");
            return;
        }
        if let Some(stored) = self.store.load() {
            self.store.save(&stored.token, &user);
        }
        self.publish(SessionState::authenticated(user));
    }

    // ------------------------------------------------------------------
    // Re-verification
    // ------------------------------------------------------------------

    /// Re-confirm the profile against the backend when the last confirmation
    /// is older than `interval`. Returns whether a request was issued.
    ///
    /// Exactly as non-destructive as hydration: a failure changes nothing.
    pub async fn reverify(&self, interval: Duration) -> bool {
        if !self.current().is_authenticated {
            return false;
        }
        if let Some(at) = *self.verified_at.lock() {
            if at.elapsed() < interval {
                return false;
            }
        }

        let seq = self.seq.load(Ordering::SeqCst);
        match self.gateway.get_profile().await {
            Ok(fresh) => {
                if !self.is_current(seq) {
                    debug!("Discarding re-verification result superseded by a later transaction");
                    return true;
                }
                if let Some(stored) = self.store.load() {
                    self.store.save(&stored.token, &fresh);
                }
                self.mark_verified();
                self.publish(SessionState::authenticated(fresh));
            }
            Err(e) => {
                debug!(error = %e, "Re-verification failed, keeping current session");
            }
        }
        true
    }

    /// Enter a transient phase with `loading` held high; the returned guard
    /// drops `loading` on scope exit unless a later transaction took over.
    fn begin(&self, seq: u64, phase: SessionPhase) -> LoadingGuard<'_> {
        self.state.send_modify(|s| {
            s.phase = phase;
            s.loading = true;
        });
        LoadingGuard { controller: self, seq }
    }
}

/// Always-run-on-exit cleanup for `loading`.
struct LoadingGuard<'a> {
    controller: &'a SessionController,
    seq: u64,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.controller.is_current(self.seq) {
            self.controller.state.send_modify(|s| s.loading = false);
        }
    }
}
