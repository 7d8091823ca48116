//! Auth-to-profile synchronization.
//!
//! Watches the external authentication stream and mirrors the signed-in
//! user's profile document, publishing a fresh [`SyncState`] on every
//! transition. At most two subscriptions are live at any time: the outer
//! auth stream (for the life of the task) and zero-or-one inner document
//! subscription scoped to the current identity.
//!
//! A missing or unreadable profile document never blocks the caller: the
//! state machine substitutes a plain customer profile built from the
//! identity and carries on.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::domain::profile::{Identity, ProfileRecord, SyncState};

/// Failures reported by a profile document subscription.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProfileStoreError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Change notification from one identity's profile document.
#[derive(Clone, Debug, PartialEq)]
pub enum ProfileEvent {
    /// A document snapshot; `None` means the document does not exist.
    Snapshot(Option<ProfileRecord>),
    Error(ProfileStoreError),
}

/// Runs the store-side unsubscribe when dropped.
pub struct SubscriptionGuard(Option<Box<dyn FnOnce() + Send>>);

impl SubscriptionGuard {
    pub fn new(on_release: impl FnOnce() + Send + 'static) -> Self {
        Self(Some(Box::new(on_release)))
    }

    pub fn noop() -> Self {
        Self(None)
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(release) = self.0.take() {
            release();
        }
    }
}

/// Live subscription to one identity's profile document. Dropping it releases
/// the underlying listener, so no event can be delivered for a discarded
/// identity.
pub struct ProfileSubscription {
    events: mpsc::UnboundedReceiver<ProfileEvent>,
    _guard: SubscriptionGuard,
}

impl ProfileSubscription {
    pub fn new(events: mpsc::UnboundedReceiver<ProfileEvent>, guard: SubscriptionGuard) -> Self {
        Self {
            events,
            _guard: guard,
        }
    }
}

/// External profile document store (document database adapter).
pub trait ProfileStore: Send + 'static {
    /// Open a change subscription for `identity`'s profile document. The
    /// store must deliver an initial [`ProfileEvent::Snapshot`] and one event
    /// per subsequent document change, in store order.
    fn subscribe(&self, identity: &Identity) -> ProfileSubscription;
}

/// Stream of authentication transitions; `None` means signed out. The sender
/// side belongs to the external auth adapter.
pub type AuthEvents = mpsc::UnboundedReceiver<Option<Identity>>;

/// The sync state machine. Owned by a single cooperative task; transitions
/// are serialized by event delivery, so no locking is involved.
pub struct ProfileSync<S: ProfileStore> {
    store: S,
    auth_events: AuthEvents,
    // Declared before `publisher` so the store guard releases before
    // consumers observe the state channel closing.
    inner: Option<ProfileSubscription>,
    state: SyncState,
    publisher: watch::Sender<SyncState>,
}

impl<S: ProfileStore> ProfileSync<S> {
    /// Spawn the sync task. Returns the continuously updated state and a
    /// handle whose [`ProfileSyncHandle::teardown`] releases both
    /// subscriptions.
    pub fn spawn(auth_events: AuthEvents, store: S) -> (watch::Receiver<SyncState>, ProfileSyncHandle) {
        let (publisher, states) = watch::channel(SyncState::logged_out());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let sync = Self {
            store,
            auth_events,
            inner: None,
            state: SyncState::logged_out(),
            publisher,
        };
        let task = tokio::spawn(sync.run(shutdown_rx));

        (
            states,
            ProfileSyncHandle {
                shutdown: Some(shutdown_tx),
                task,
            },
        )
    }

    /// Event loop. Ends on teardown, on handle drop, or when the auth stream
    /// closes; dropping `self` then releases the inner subscription.
    async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                auth = self.auth_events.recv() => match auth {
                    Some(identity) => self.on_auth_change(identity),
                    None => break,
                },
                event = next_event(&mut self.inner) => match event {
                    Some(event) => self.on_profile_event(event),
                    None => self.on_subscription_closed(),
                },
            }
        }
    }

    fn on_auth_change(&mut self, identity: Option<Identity>) {
        // Drop the previous document subscription before anything else so a
        // late event for the old identity can never be delivered.
        self.inner = None;

        match identity {
            Some(identity) => {
                tracing::debug!(uid = %identity.uid, "signed in, loading profile");
                self.state = SyncState {
                    identity: Some(identity.clone()),
                    profile: None,
                    loading: true,
                };
                self.publish();
                self.inner = Some(self.store.subscribe(&identity));
            }
            None => {
                tracing::debug!("signed out");
                self.state = SyncState::logged_out();
                self.publish();
            }
        }
    }

    fn on_profile_event(&mut self, event: ProfileEvent) {
        let Some(identity) = self.state.identity.clone() else {
            // No inner subscription exists without an identity.
            return;
        };

        match event {
            ProfileEvent::Snapshot(Some(profile)) => {
                tracing::debug!(uid = %identity.uid, role = %profile.role, "profile snapshot");
                // Update in place: an existing document changing does not
                // re-enter the loading window, since the identity is the same.
                self.state.profile = Some(profile);
            }
            ProfileEvent::Snapshot(None) => {
                tracing::debug!(uid = %identity.uid, "profile document missing, using customer defaults");
                self.state.profile = Some(ProfileRecord::default_for(&identity));
            }
            ProfileEvent::Error(error) => {
                // Availability over consistency: a failed read grants the
                // baseline customer profile instead of blocking the app.
                tracing::warn!(uid = %identity.uid, %error, "profile subscription failed, using customer defaults");
                self.state.profile = Some(ProfileRecord::default_for(&identity));
            }
        }

        self.state.loading = false;
        self.publish();
    }

    fn on_subscription_closed(&mut self) {
        self.inner = None;
        if self.state.loading {
            // The store closed the stream before delivering anything; treat
            // it like a missing document rather than leaving the consumer
            // loading forever.
            self.on_profile_event(ProfileEvent::Snapshot(None));
        }
    }

    fn publish(&self) {
        self.publisher.send_replace(self.state.clone());
    }
}

async fn next_event(subscription: &mut Option<ProfileSubscription>) -> Option<ProfileEvent> {
    match subscription {
        Some(subscription) => subscription.events.recv().await,
        None => std::future::pending().await,
    }
}

/// Teardown handle for a spawned [`ProfileSync`].
pub struct ProfileSyncHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ProfileSyncHandle {
    /// Stop the sync task and release both subscriptions. After this returns
    /// no further state is published, regardless of late external events.
    pub async fn teardown(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tokio::sync::{mpsc, watch};
    use tokio::time::timeout;

    use super::*;
    use crate::domain::profile::Role;

    #[derive(Default)]
    struct StoreInner {
        senders: Vec<(String, mpsc::UnboundedSender<ProfileEvent>)>,
        active: usize,
        overlapped: bool,
    }

    /// Store double that hands out channel-backed subscriptions and records
    /// how many are live at once.
    #[derive(Clone, Default)]
    struct MockStore(Arc<Mutex<StoreInner>>);

    impl MockStore {
        fn sender_for(&self, uid: &str) -> mpsc::UnboundedSender<ProfileEvent> {
            // Hand out the stored sender itself (not a clone) so the caller
            // holds the only strong sender and dropping it closes the stream.
            let mut inner = self.0.lock().unwrap();
            let index = inner
                .senders
                .iter()
                .rposition(|(sub_uid, _)| sub_uid == uid)
                .expect("no subscription opened for uid");
            inner.senders.remove(index).1
        }

        fn active(&self) -> usize {
            self.0.lock().unwrap().active
        }

        fn overlapped(&self) -> bool {
            self.0.lock().unwrap().overlapped
        }
    }

    impl ProfileStore for MockStore {
        fn subscribe(&self, identity: &Identity) -> ProfileSubscription {
            let (sender, events) = mpsc::unbounded_channel();
            let mut inner = self.0.lock().unwrap();
            if inner.active > 0 {
                inner.overlapped = true;
            }
            inner.active += 1;
            inner.senders.push((identity.uid.clone(), sender));

            let shared = Arc::clone(&self.0);
            ProfileSubscription::new(
                events,
                SubscriptionGuard::new(move || {
                    shared.lock().unwrap().active -= 1;
                }),
            )
        }
    }

    fn identity(uid: &str) -> Identity {
        Identity {
            uid: uid.to_string(),
            display_name: Some(format!("{uid} name")),
            email: Some(format!("{uid}@example.com")),
        }
    }

    fn staff_profile(station: &str) -> ProfileRecord {
        ProfileRecord {
            role: Role::Staff,
            station_id: Some("st-1".to_string()),
            station_name: Some(station.to_string()),
            display_name: Some("Staff".to_string()),
            ..ProfileRecord::default()
        }
    }

    async fn wait_for(
        states: &mut watch::Receiver<SyncState>,
        pred: impl Fn(&SyncState) -> bool,
    ) -> SyncState {
        timeout(Duration::from_secs(1), async {
            loop {
                {
                    let state = states.borrow_and_update().clone();
                    if pred(&state) {
                        return state;
                    }
                }
                states.changed().await.expect("sync task ended early");
            }
        })
        .await
        .expect("timed out waiting for sync state")
    }

    fn uid_of(state: &SyncState) -> Option<&str> {
        state.identity.as_ref().map(|identity| identity.uid.as_str())
    }

    #[tokio::test]
    async fn starts_logged_out() {
        let store = MockStore::default();
        let (_auth, auth_events) = mpsc::unbounded_channel();
        let (states, handle) = ProfileSync::spawn(auth_events, store);

        assert_eq!(*states.borrow(), SyncState::logged_out());
        handle.teardown().await;
    }

    #[tokio::test]
    async fn sign_in_enters_loading_then_caches_the_document() {
        let store = MockStore::default();
        let (auth, auth_events) = mpsc::unbounded_channel();
        let (mut states, handle) = ProfileSync::spawn(auth_events, store.clone());

        auth.send(Some(identity("u1"))).unwrap();
        let loading = wait_for(&mut states, |s| s.loading).await;
        assert_eq!(uid_of(&loading), Some("u1"));
        assert_eq!(loading.profile, None);

        store
            .sender_for("u1")
            .send(ProfileEvent::Snapshot(Some(staff_profile("Hledan"))))
            .unwrap();
        let ready = wait_for(&mut states, |s| !s.loading).await;
        assert_eq!(ready.profile, Some(staff_profile("Hledan")));

        handle.teardown().await;
    }

    #[tokio::test]
    async fn missing_document_defaults_to_customer() {
        let store = MockStore::default();
        let (auth, auth_events) = mpsc::unbounded_channel();
        let (mut states, handle) = ProfileSync::spawn(auth_events, store.clone());

        auth.send(Some(identity("u1"))).unwrap();
        wait_for(&mut states, |s| s.loading).await;
        store
            .sender_for("u1")
            .send(ProfileEvent::Snapshot(None))
            .unwrap();

        let state = wait_for(&mut states, |s| !s.loading).await;
        let profile = state.profile.expect("defaulted profile");
        assert_eq!(profile.role, Role::Customer);
        assert_eq!(profile.display_name.as_deref(), Some("u1 name"));
        assert_eq!(profile.email.as_deref(), Some("u1@example.com"));

        handle.teardown().await;
    }

    #[tokio::test]
    async fn store_error_defaults_to_customer_instead_of_failing() {
        let store = MockStore::default();
        let (auth, auth_events) = mpsc::unbounded_channel();
        let (mut states, handle) = ProfileSync::spawn(auth_events, store.clone());

        auth.send(Some(identity("u1"))).unwrap();
        wait_for(&mut states, |s| s.loading).await;
        store
            .sender_for("u1")
            .send(ProfileEvent::Error(ProfileStoreError::PermissionDenied(
                "rules".to_string(),
            )))
            .unwrap();

        let state = wait_for(&mut states, |s| !s.loading).await;
        assert_eq!(state.role(), Some(&Role::Customer));

        handle.teardown().await;
    }

    #[tokio::test]
    async fn in_place_document_update_replaces_without_loading_flash() {
        let store = MockStore::default();
        let (auth, auth_events) = mpsc::unbounded_channel();
        let (mut states, handle) = ProfileSync::spawn(auth_events, store.clone());

        auth.send(Some(identity("u1"))).unwrap();
        wait_for(&mut states, |s| s.loading).await;
        let sender = store.sender_for("u1");
        sender
            .send(ProfileEvent::Snapshot(Some(staff_profile("Hledan"))))
            .unwrap();
        wait_for(&mut states, |s| !s.loading).await;

        sender
            .send(ProfileEvent::Snapshot(Some(staff_profile("Kamayut"))))
            .unwrap();
        let updated = wait_for(&mut states, |s| {
            s.profile
                .as_ref()
                .and_then(|p| p.station_name.as_deref())
                == Some("Kamayut")
        })
        .await;
        assert!(!updated.loading);

        handle.teardown().await;
    }

    #[tokio::test]
    async fn sign_out_clears_state_and_releases_the_subscription() {
        let store = MockStore::default();
        let (auth, auth_events) = mpsc::unbounded_channel();
        let (mut states, handle) = ProfileSync::spawn(auth_events, store.clone());

        auth.send(Some(identity("u1"))).unwrap();
        wait_for(&mut states, |s| s.loading).await;
        assert_eq!(store.active(), 1);

        auth.send(None).unwrap();
        let state = wait_for(&mut states, |s| !s.is_authenticated()).await;
        assert_eq!(state, SyncState::logged_out());
        assert_eq!(store.active(), 0);

        handle.teardown().await;
    }

    #[tokio::test]
    async fn identity_switch_drops_the_stale_subscription() {
        let store = MockStore::default();
        let (auth, auth_events) = mpsc::unbounded_channel();
        let (mut states, handle) = ProfileSync::spawn(auth_events, store.clone());

        // Switch to V before U's first snapshot resolves.
        auth.send(Some(identity("u"))).unwrap();
        wait_for(&mut states, |s| uid_of(s) == Some("u") && s.loading).await;
        let stale = store.sender_for("u");

        auth.send(Some(identity("v"))).unwrap();
        wait_for(&mut states, |s| uid_of(s) == Some("v")).await;

        // U's receiver was dropped on the switch, and the new subscription
        // only opened after the old guard released.
        assert!(stale
            .send(ProfileEvent::Snapshot(Some(staff_profile("Hledan"))))
            .is_err());
        assert!(!store.overlapped());

        store
            .sender_for("v")
            .send(ProfileEvent::Snapshot(Some(staff_profile("Insein"))))
            .unwrap();
        let state = wait_for(&mut states, |s| !s.loading).await;
        assert_eq!(uid_of(&state), Some("v"));
        assert_eq!(
            state.profile.and_then(|p| p.station_name),
            Some("Insein".to_string())
        );

        handle.teardown().await;
    }

    #[tokio::test]
    async fn store_closing_the_stream_mid_load_defaults_the_profile() {
        let store = MockStore::default();
        let (auth, auth_events) = mpsc::unbounded_channel();
        let (mut states, handle) = ProfileSync::spawn(auth_events, store.clone());

        auth.send(Some(identity("u1"))).unwrap();
        wait_for(&mut states, |s| s.loading).await;
        drop(store.sender_for("u1"));

        let state = wait_for(&mut states, |s| !s.loading).await;
        assert_eq!(state.role(), Some(&Role::Customer));

        handle.teardown().await;
    }

    #[tokio::test]
    async fn teardown_silences_late_events() {
        let store = MockStore::default();
        let (auth, auth_events) = mpsc::unbounded_channel();
        let (mut states, handle) = ProfileSync::spawn(auth_events, store.clone());

        auth.send(Some(identity("u1"))).unwrap();
        wait_for(&mut states, |s| s.loading).await;

        handle.teardown().await;
        assert_eq!(store.active(), 0);

        // Late auth transition after teardown: the receiver is gone, the
        // send fails, and the last observed state stays as it was.
        let _ = auth.send(Some(identity("u2")));
        assert!(states.changed().await.is_err());
        assert_eq!(uid_of(&states.borrow()), Some("u1"));
    }

    #[tokio::test]
    async fn auth_stream_closing_stops_the_task() {
        let store = MockStore::default();
        let (auth, auth_events) = mpsc::unbounded_channel();
        let (mut states, _handle) = ProfileSync::spawn(auth_events, store.clone());

        auth.send(Some(identity("u1"))).unwrap();
        wait_for(&mut states, |s| s.loading).await;

        drop(auth);
        let closed = timeout(Duration::from_secs(1), states.changed())
            .await
            .expect("task did not stop");
        assert!(closed.is_err());
        assert_eq!(store.active(), 0);
    }
}
