//! Subscriber callbacks and their per-class registry

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use beefweb_api::{PlayerSnapshot, PlaylistItemsSnapshot, PlaylistsSnapshot};
use beefweb_stream::UpdateClass;
use parking_lot::RwLock;

/// An accepted update as handed to subscribers
#[derive(Debug, Clone)]
pub enum Update {
    PlayerState(Arc<PlayerSnapshot>),
    PlaylistItems(Arc<PlaylistItemsSnapshot>),
    Playlists(Arc<PlaylistsSnapshot>),
}

impl Update {
    pub fn class(&self) -> UpdateClass {
        match self {
            Update::PlayerState(_) => UpdateClass::PlayerState,
            Update::PlaylistItems(_) => UpdateClass::PlaylistItems,
            Update::Playlists(_) => UpdateClass::Playlists,
        }
    }

    pub fn player_state(&self) -> Option<&Arc<PlayerSnapshot>> {
        match self {
            Update::PlayerState(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn playlist_items(&self) -> Option<&Arc<PlaylistItemsSnapshot>> {
        match self {
            Update::PlaylistItems(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn playlists(&self) -> Option<&Arc<PlaylistsSnapshot>> {
        match self {
            Update::Playlists(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}

/// A subscriber callback
///
/// Callbacks compare by identity: clones of one `Callback` are the same
/// subscriber, while two callbacks built from identical closures are not.
/// Keep a clone around to remove the subscriber later.
#[derive(Clone)]
pub struct Callback(Arc<dyn Fn(&Update) + Send + Sync>);

impl Callback {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Update) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    pub(crate) fn call(&self, update: &Update) {
        (self.0)(update)
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Callback {}

impl Hash for Callback {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:#x})", self.id())
    }
}

/// Unordered callback sets, one per update class
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    subscribers: RwLock<HashMap<UpdateClass, HashSet<Callback>>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback, returning false if it was already registered
    pub fn add(&self, class: UpdateClass, callback: Callback) -> bool {
        self.subscribers
            .write()
            .entry(class)
            .or_default()
            .insert(callback)
    }

    /// Unregister a callback, returning false if it was not registered
    pub fn remove(&self, class: UpdateClass, callback: &Callback) -> bool {
        let mut subscribers = self.subscribers.write();
        match subscribers.get_mut(&class) {
            Some(set) => set.remove(callback),
            None => false,
        }
    }

    pub fn remove_all(&self) {
        self.subscribers.write().clear();
    }

    pub fn count(&self, class: UpdateClass) -> usize {
        self.subscribers
            .read()
            .get(&class)
            .map_or(0, HashSet::len)
    }

    /// Invoke every callback registered for the update's class
    ///
    /// The set is copied first so callbacks may add or remove subscribers
    /// without deadlocking.
    pub fn dispatch(&self, update: &Update) -> usize {
        let callbacks: Vec<Callback> = match self.subscribers.read().get(&update.class()) {
            Some(set) => set.iter().cloned().collect(),
            None => return 0,
        };

        for callback in &callbacks {
            callback.call(update);
        }
        callbacks.len()
    }
}
