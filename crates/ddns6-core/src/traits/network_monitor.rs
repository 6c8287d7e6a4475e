// # Network Monitor Trait
//
// Defines the interface for receiving "something about the network changed"
// notifications from the OS.
//
// Notifications carry no payload. The engine's only obligation on receipt is
// to re-run address selection and reconciliation.
//
// ## Subscription lifecycle
//
// `subscribe()` registers with the notification source and returns a
// [`NetworkChanges`] guard. Dropping the guard deregisters. Dropping never
// fails, so deregistration always happens on shutdown, including when
// startup fails after subscribing.

use async_trait::async_trait;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_stream::Stream;

/// A payload-less network change notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkChange;

type ChangeStream = Pin<Box<dyn Stream<Item = NetworkChange> + Send + 'static>>;

/// Active subscription to network change notifications
///
/// Yields one [`NetworkChange`] per notification. Ends only if the
/// underlying source goes away. Any cleanup registered with
/// [`NetworkChanges::on_drop`] runs when the subscription is dropped.
pub struct NetworkChanges {
    stream: ChangeStream,
    on_drop: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl NetworkChanges {
    /// Wrap a stream of notifications
    pub fn new(stream: impl Stream<Item = NetworkChange> + Send + 'static) -> Self {
        Self {
            stream: Box::pin(stream),
            on_drop: None,
        }
    }

    /// Register the deregistration step to run when the subscription is dropped
    pub fn on_drop(mut self, cleanup: impl FnOnce() + Send + 'static) -> Self {
        self.on_drop = Some(Box::new(cleanup));
        self
    }
}

impl Stream for NetworkChanges {
    type Item = NetworkChange;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.stream.as_mut().poll_next(cx)
    }
}

impl Drop for NetworkChanges {
    fn drop(&mut self) {
        if let Some(cleanup) = self.on_drop.take() {
            cleanup();
        }
    }
}

impl std::fmt::Debug for NetworkChanges {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkChanges")
            .field("has_cleanup", &self.on_drop.is_some())
            .finish()
    }
}

/// Trait for network change notification sources
///
/// # Task Spawning Rules
///
/// If an implementation spawns tasks to read notifications:
/// - The task MUST wait for OS events, not poll periodically
/// - The task MUST be stopped by the guard's drop cleanup
#[async_trait]
pub trait NetworkMonitor: Send + Sync {
    /// Register for notifications
    ///
    /// # Returns
    ///
    /// - `Ok(NetworkChanges)`: Active subscription
    /// - `Err(Error)`: Registration failed (fatal at startup)
    async fn subscribe(&self) -> Result<NetworkChanges, crate::Error>;
}
