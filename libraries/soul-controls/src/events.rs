//! Control Events
//!
//! Name-keyed publish/subscribe bus that decouples media-source events
//! from consumer callbacks. The controller relays every media event here,
//! plus `"updateui"` after each synchronizer pass.
//!
//! - Names are case-sensitive and restricted to `[a-zA-Z0-9.*-]`
//! - Matching is exact; `*` is an ordinary character, not a wildcard
//! - Handlers run synchronously, in subscription order
//! - Emitting a name nobody subscribed to is a no-op

use crate::error::{ControlsError, Result};
use crate::types::PlaybackSession;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Emitted after every synchronizer pass
pub const UPDATE_UI_EVENT: &str = "updateui";

/// Default limit on nested emissions
const DEFAULT_MAX_EMIT_DEPTH: usize = 8;

/// What a handler sees when it runs
#[derive(Debug, Clone, Copy)]
pub struct EventContext<'a> {
    /// Name the event was emitted under
    pub name: &'a str,

    /// Payload passed to `emit`
    pub args: &'a [Value],

    /// Session that emitted the event
    pub session: &'a PlaybackSession,
}

/// Shared, type-erased handler
pub type Handler = Arc<dyn Fn(&EventContext<'_>) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// One entry in a name's handler list
///
/// `None` marks an unsubscribed handler. The slot is kept so the
/// remaining handlers keep their positions; `emit` skips it.
struct Subscriber {
    id: SubscriptionId,
    handler: Option<Handler>,
}

type Table = HashMap<String, Vec<Subscriber>>;

/// Check an event name against `[a-zA-Z0-9.*-]+`
pub fn validate_event_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '*' | '-'));

    if valid {
        Ok(())
    } else {
        Err(ControlsError::InvalidEventName(name.to_string()))
    }
}

/// Publish/subscribe registry
///
/// Cloning yields another handle onto the same subscription table, so a
/// handler may hold a clone and subscribe or emit from inside a callback.
/// Handlers are snapshotted before they run; subscriptions made during an
/// emission take effect from the next one.
#[derive(Clone)]
pub struct EventBus {
    table: Arc<RwLock<Table>>,
    next_id: Arc<AtomicU64>,
    depth: Arc<AtomicUsize>,
    max_depth: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("event_names", &self.read().len())
            .field("depth", &self.depth.load(Ordering::SeqCst))
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

/// Decrements the emission depth when an emission unwinds
struct DepthGuard<'a>(&'a AtomicUsize);

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_EMIT_DEPTH)
    }

    /// Create a bus that drops emissions nested deeper than `max_depth`
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            table: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(0)),
            depth: Arc::new(AtomicUsize::new(0)),
            max_depth: max_depth.max(1),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Table> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Table> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe a closure to `name`
    pub fn subscribe<F>(&self, name: &str, handler: F) -> Result<SubscriptionId>
    where
        F: Fn(&EventContext<'_>) + Send + Sync + 'static,
    {
        self.subscribe_handler(name, Arc::new(handler))
    }

    /// Subscribe an already-shared handler to `name`
    ///
    /// The handler is appended to the name's list, which is created on
    /// first use.
    pub fn subscribe_handler(&self, name: &str, handler: Handler) -> Result<SubscriptionId> {
        validate_event_name(name)?;

        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.write()
            .entry(name.to_string())
            .or_default()
            .push(Subscriber {
                id,
                handler: Some(handler),
            });

        tracing::debug!(event = name, ?id, "Subscribed handler");
        Ok(id)
    }

    /// Remove a handler
    ///
    /// Returns false if the subscription was unknown or already removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut table = self.write();
        for subscribers in table.values_mut() {
            if let Some(subscriber) = subscribers.iter_mut().find(|s| s.id == id) {
                return subscriber.handler.take().is_some();
            }
        }
        false
    }

    /// Invoke every live handler for `name`, in subscription order
    ///
    /// Returns the number of handlers invoked.
    pub fn emit(&self, name: &str, args: &[Value], session: &PlaybackSession) -> usize {
        let handlers: Vec<Handler> = {
            let table = self.read();
            let Some(subscribers) = table.get(name) else {
                return 0;
            };
            subscribers
                .iter()
                .filter_map(|s| s.handler.clone())
                .collect()
        };

        if handlers.is_empty() {
            return 0;
        }

        let depth = self.depth.fetch_add(1, Ordering::SeqCst);
        let _guard = DepthGuard(&self.depth);
        if depth >= self.max_depth {
            tracing::warn!(
                event = name,
                depth,
                max_depth = self.max_depth,
                "Dropping re-entrant emission"
            );
            return 0;
        }

        let context = EventContext {
            name,
            args,
            session,
        };
        for handler in &handlers {
            handler(&context);
        }

        handlers.len()
    }

    /// Number of live handlers for `name`
    pub fn subscriber_count(&self, name: &str) -> usize {
        self.read()
            .get(name)
            .map(|subscribers| subscribers.iter().filter(|s| s.handler.is_some()).count())
            .unwrap_or(0)
    }

    /// Drop every subscription
    pub fn clear(&self) {
        self.write().clear();
    }
}
