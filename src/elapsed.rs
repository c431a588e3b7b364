use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::errors::TimerError;
use crate::sync::lock;

/// A trait for timer callbacks.
#[async_trait]
pub trait TimerCallback: Send + Sync {
    /// The function to execute when the timer elapses.
    async fn execute(&self) -> Result<(), TimerError>;
}

#[async_trait]
impl<F> TimerCallback for F
where
    F: Fn() + Send + Sync,
{
    async fn execute(&self) -> Result<(), TimerError> {
        (self)();
        Ok(())
    }
}

/// Identifies one registration on an [`Elapsed`] hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    callbacks: Vec<(SubscriptionId, Arc<dyn TimerCallback>)>,
}

/// Notification hook raised each time a timer fires.
///
/// Callbacks are kept in registration order and every firing invokes them in
/// that order, one after another. Clones share the same subscriber list.
#[derive(Clone, Default)]
pub struct Elapsed {
    subscribers: Arc<Mutex<Subscribers>>,
}

impl Elapsed {
    /// Creates a hook with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback and returns the id needed to remove it again.
    pub fn subscribe<C>(&self, callback: C) -> SubscriptionId
    where
        C: TimerCallback + 'static,
    {
        let mut subscribers = lock(&self.subscribers);
        let id = SubscriptionId(subscribers.next_id);
        subscribers.next_id += 1;
        subscribers.callbacks.push((id, Arc::new(callback)));
        id
    }

    /// Removes a registration. Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = lock(&self.subscribers);
        let before = subscribers.callbacks.len();
        subscribers.callbacks.retain(|(existing, _)| *existing != id);
        subscribers.callbacks.len() != before
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        lock(&self.subscribers).callbacks.len()
    }

    /// Whether no callback is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs every callback registered at the time of the call, in order.
    ///
    /// Errors are logged and do not stop later callbacks. Panics are not caught.
    pub(crate) async fn raise(&self) {
        let callbacks: Vec<Arc<dyn TimerCallback>> = lock(&self.subscribers)
            .callbacks
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in callbacks {
            if let Err(err) = callback.execute().await {
                #[cfg(feature = "logging")]
                log::error!("Callback execution error: {}", err);
                #[cfg(not(feature = "logging"))]
                drop(err);
            }
        }
    }
}

impl std::fmt::Debug for Elapsed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Elapsed")
            .field("subscribers", &self.len())
            .finish()
    }
}
