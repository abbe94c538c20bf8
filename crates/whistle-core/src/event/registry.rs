use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::event::Priority;
use crate::event::error::{EventError, Result};
use crate::event::listener::Listener;

/// Immutable, priority-ordered listener sequence for one event identifier.
pub type Listeners<L> = Arc<[L]>;

/// Listeners keyed by event identifier and priority bucket.
///
/// `get` flattens the buckets of an identifier in ascending priority order,
/// keeping registration order inside a bucket, and caches the result until
/// the next `add`/`remove` for that identifier.
///
/// Mutation needs `&mut self`; the dispatchers keep the registry behind a
/// lock and never hold it while a listener runs.
pub struct ListenerRegistry<L = Listener> {
    items: BTreeMap<String, BTreeMap<Priority, Vec<L>>>,
    sorted: HashMap<String, Listeners<L>>,
}

impl<L> fmt::Debug for ListenerRegistry<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listener_count: usize = self
            .items
            .values()
            .flat_map(|buckets| buckets.values())
            .map(Vec::len)
            .sum();
        f.debug_struct("ListenerRegistry")
            .field("event_ids", &self.items.len())
            .field("listener_count", &listener_count)
            .field("cached", &self.sorted.len())
            .finish()
    }
}

impl<L> Default for ListenerRegistry<L> {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
            sorted: HashMap::new(),
        }
    }
}

impl<L: Clone + PartialEq> ListenerRegistry<L> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener for the given event id, with the given priority.
    ///
    /// The same listener may be added more than once; it is then invoked
    /// once per registration.
    pub fn add(&mut self, event_id: &str, listener: L, priority: Priority) {
        self.items
            .entry(event_id.to_owned())
            .or_default()
            .entry(priority)
            .or_default()
            .push(listener);
        self.sorted.remove(event_id);
    }

    /// Listeners for the given event id, in order of priority.
    ///
    /// Unknown ids yield an empty sequence.
    pub fn get(&mut self, event_id: &str) -> Listeners<L> {
        if let Some(sorted) = self.sorted.get(event_id) {
            return Arc::clone(sorted);
        }

        let Some(buckets) = self.items.get(event_id) else {
            return Arc::from(Vec::new());
        };

        let sorted: Listeners<L> = buckets.values().flatten().cloned().collect();
        self.sorted.insert(event_id.to_owned(), Arc::clone(&sorted));
        sorted
    }

    /// Every known event id mapped to its ordered listeners.
    pub fn all(&mut self) -> BTreeMap<String, Listeners<L>> {
        self.items().collect()
    }

    /// Whether `get(event_id)` would be non-empty. Never sorts.
    pub fn has(&self, event_id: &str) -> bool {
        if let Some(sorted) = self.sorted.get(event_id) {
            return !sorted.is_empty();
        }
        self.items
            .get(event_id)
            .is_some_and(|buckets| buckets.values().any(|bucket| !bucket.is_empty()))
    }

    /// Remove every occurrence of `listener` registered under `event_id`,
    /// across all priorities, and return how many were removed.
    ///
    /// Fails with [`EventError::UnknownEvent`] when nothing was ever
    /// registered for `event_id`. Emptied buckets are kept, so the id stays
    /// in [`keys`](Self::keys).
    pub fn remove(&mut self, event_id: &str, listener: &L) -> Result<usize> {
        let Some(buckets) = self.items.get_mut(event_id) else {
            return Err(EventError::UnknownEvent {
                event_id: event_id.to_owned(),
            });
        };

        let mut removed = 0;
        for bucket in buckets.values_mut() {
            let len_before = bucket.len();
            bucket.retain(|registered| registered != listener);
            removed += len_before - bucket.len();
        }

        self.sorted.remove(event_id);
        debug!("Removed {removed} listener(s) from event '{event_id}'");
        Ok(removed)
    }

    /// Event ids that have at least one bucket, emptied or not.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.items.keys().map(String::as_str)
    }

    /// Lazy `(event id, ordered listeners)` pairs, one per key.
    pub fn items(&mut self) -> Items<'_, L> {
        let pending = self.items.keys().rev().cloned().collect();
        Items {
            registry: self,
            pending,
        }
    }

    pub fn contains_key(&self, event_id: &str) -> bool {
        self.items.contains_key(event_id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Iterator returned by [`ListenerRegistry::items`].
pub struct Items<'a, L> {
    registry: &'a mut ListenerRegistry<L>,
    // Reversed so `pop` yields ids in ascending order
    pending: Vec<String>,
}

impl<L: Clone + PartialEq> Iterator for Items<'_, L> {
    type Item = (String, Listeners<L>);

    fn next(&mut self) -> Option<Self::Item> {
        let event_id = self.pending.pop()?;
        let listeners = self.registry.get(&event_id);
        Some((event_id, listeners))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.pending.len(), Some(self.pending.len()))
    }
}
