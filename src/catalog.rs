//! # catalog
//!
//! Registry of the loaded databases, keyed by their source path.
//!
//! A key is present at most once; re-importing a path requires an explicit
//! [`Catalog::unload`] first. Subscribers are notified synchronously, before
//! the mutating call returns.

use std::collections::HashMap;
use std::rc::Rc;

use slotmap::{SlotMap, new_key_type};
use tracing::{info, warn};

use crate::types::{
    database::Database,
    errors::{CatalogError, DecodeError},
};

/// Decoding collaborator: turns a path into a fully populated [`Database`].
pub trait Decode {
    fn decode(&self, path: &str) -> Result<Database, DecodeError>;
}

impl<F> Decode for F
where
    F: Fn(&str) -> Result<Database, DecodeError>,
{
    fn decode(&self, path: &str) -> Result<Database, DecodeError> {
        self(path)
    }
}

/// Change notification emitted by the [`Catalog`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum CatalogEvent {
    Loaded { key: String },
    LoadFailed { key: String, reason: String },
    Unloaded { key: String },
}

impl CatalogEvent {
    /// One-line, human-readable description for a status bar.
    pub fn status_line(&self) -> String {
        match self {
            CatalogEvent::Loaded { key } => format!("Loaded DBC file: {}", key),
            CatalogEvent::LoadFailed { reason, .. } => format!("Error: {}", reason),
            CatalogEvent::Unloaded { key } => format!("Removed DBC file: {}", key),
        }
    }
}

new_key_type! { pub struct SubscriptionKey; }

type Listener = Box<dyn FnMut(&CatalogEvent)>;

/// Loaded databases in insertion order.
#[derive(Default)]
pub struct Catalog {
    databases: HashMap<String, Rc<Database>>,
    order: Vec<String>,
    listeners: SlotMap<SubscriptionKey, Listener>,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("keys", &self.order)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `db` under `key`.
    ///
    /// # Errors
    /// [`CatalogError::DuplicateKey`] if `key` is already loaded; the stored
    /// database is left untouched.
    pub fn load(&mut self, key: &str, db: Database) -> Result<Rc<Database>, CatalogError> {
        if self.contains(key) {
            return Err(self.reject_duplicate(key));
        }

        let db: Rc<Database> = Rc::new(db);
        self.databases.insert(key.to_string(), Rc::clone(&db));
        self.order.push(key.to_string());
        info!(
            key,
            messages = db.messages.len(),
            signals = db.signals.len(),
            "database loaded"
        );
        self.emit(&CatalogEvent::Loaded {
            key: key.to_string(),
        });
        Ok(db)
    }

    /// Decodes `key` with `decoder` and registers the result.
    ///
    /// The duplicate check runs before decoding; nothing is registered when decoding fails.
    pub fn load_with<D: Decode + ?Sized>(
        &mut self,
        key: &str,
        decoder: &D,
    ) -> Result<Rc<Database>, CatalogError> {
        if self.contains(key) {
            return Err(self.reject_duplicate(key));
        }
        match decoder.decode(key) {
            Ok(db) => self.load(key, db),
            Err(source) => {
                warn!(key, error = %source, "database decoding failed");
                self.emit(&CatalogEvent::LoadFailed {
                    key: key.to_string(),
                    reason: source.to_string(),
                });
                Err(CatalogError::Decode {
                    key: key.to_string(),
                    source,
                })
            }
        }
    }

    /// Removes `key` and notifies subscribers.
    pub fn unload(&mut self, key: &str) -> Result<Rc<Database>, CatalogError> {
        let Some(db) = self.databases.remove(key) else {
            return Err(CatalogError::NotFound {
                key: key.to_string(),
            });
        };
        self.order.retain(|k| k != key);
        info!(key, "database unloaded");
        self.emit(&CatalogEvent::Unloaded {
            key: key.to_string(),
        });
        Ok(db)
    }

    pub fn get(&self, key: &str) -> Result<Rc<Database>, CatalogError> {
        self.databases
            .get(key)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound {
                key: key.to_string(),
            })
    }

    /// Keys in insertion order.
    pub fn list_keys(&self) -> &[String] {
        &self.order
    }

    pub fn contains(&self, key: &str) -> bool {
        self.databases.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Registers a listener called synchronously for every [`CatalogEvent`].
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionKey
    where
        F: FnMut(&CatalogEvent) + 'static,
    {
        self.listeners.insert(Box::new(listener))
    }

    /// Returns `false` if `key` was not subscribed.
    pub fn unsubscribe(&mut self, key: SubscriptionKey) -> bool {
        self.listeners.remove(key).is_some()
    }

    fn reject_duplicate(&mut self, key: &str) -> CatalogError {
        let err: CatalogError = CatalogError::DuplicateKey {
            key: key.to_string(),
        };
        warn!(key, "rejected load of an already loaded database");
        self.emit(&CatalogEvent::LoadFailed {
            key: key.to_string(),
            reason: err.to_string(),
        });
        err
    }

    fn emit(&mut self, event: &CatalogEvent) {
        for listener in self.listeners.values_mut() {
            listener(event);
        }
    }
}
