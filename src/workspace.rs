//! # workspace
//!
//! Entry point wiring the [`Catalog`], the [`SessionRegistry`] and a decoder together,
//! the way an application window drives them: import, remove, open/close explorers,
//! and a one-line status message after every catalog change.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::info;

use crate::catalog::{Catalog, CatalogEvent, Decode};
use crate::config::ViewConfig;
use crate::session::{ExplorerSession, SessionKey, SessionRegistry};
use crate::types::{
    database::Database,
    errors::{CatalogError, SessionError},
};

pub struct Workspace<D: Decode> {
    catalog: Catalog,
    sessions: SessionRegistry,
    decoder: D,
    status: Rc<RefCell<String>>,
}

#[cfg(feature = "dbc")]
impl Workspace<crate::dbc::DbcDecoder> {
    /// Workspace importing `.dbc` files with the built-in decoder.
    pub fn with_dbc(config: ViewConfig) -> Self {
        Workspace::new(crate::dbc::DbcDecoder, config)
    }
}

impl<D: Decode> Workspace<D> {
    pub fn new(decoder: D, config: ViewConfig) -> Self {
        let mut catalog: Catalog = Catalog::new();
        let status: Rc<RefCell<String>> = Rc::new(RefCell::new(String::new()));
        let sink = Rc::clone(&status);
        catalog.subscribe(move |event: &CatalogEvent| {
            *sink.borrow_mut() = event.status_line();
        });

        Workspace {
            catalog,
            sessions: SessionRegistry::new(config),
            decoder,
            status,
        }
    }

    /// Decodes `path` and registers it under that key.
    ///
    /// # Errors
    /// - [`CatalogError::DuplicateKey`] if `path` is already loaded.
    /// - [`CatalogError::Decode`] if the decoder rejects the file.
    pub fn import(&mut self, path: &str) -> Result<Rc<Database>, CatalogError> {
        info!(path, "importing database");
        self.catalog.load_with(path, &self.decoder)
    }

    /// Unloads `key`; its explorer and inspectors are closed before this returns.
    pub fn remove(&mut self, key: &str) -> Result<(), CatalogError> {
        self.catalog.unload(key)?;
        self.sessions.on_catalog_event(&CatalogEvent::Unloaded {
            key: key.to_string(),
        });
        Ok(())
    }

    /// Returns the explorer of `key`, opening it if needed.
    pub fn open_explorer(&mut self, key: &str) -> Result<SessionKey, SessionError> {
        self.sessions.open_session(&self.catalog, key)
    }

    /// Returns how many inspectors were closed along with the explorer.
    pub fn close_explorer(&mut self, key: &str) -> Result<usize, SessionError> {
        self.sessions.close_session(key)
    }

    pub fn explorer(&self, key: &str) -> Option<&ExplorerSession> {
        self.sessions.by_database(key)
    }

    /// Explorer of `key` together with its database, for the mutating session calls.
    pub fn explorer_mut(&mut self, key: &str) -> Option<(&mut ExplorerSession, Rc<Database>)> {
        let db: Rc<Database> = self.catalog.get(key).ok()?;
        let session: &mut ExplorerSession = self.sessions.by_database_mut(key)?;
        Some((session, db))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Status line of the last catalog change, empty before the first one.
    pub fn status(&self) -> String {
        self.status.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::engine_brake_db;
    use crate::types::errors::DecodeError;
    use crate::view::DisplayMode;

    fn fake_decoder(path: &str) -> Result<Database, DecodeError> {
        if path.ends_with(".dbc") {
            Ok(engine_brake_db())
        } else {
            Err(DecodeError::InvalidExtension {
                path: path.to_string(),
            })
        }
    }

    type FakeDecoder = fn(&str) -> Result<Database, DecodeError>;

    fn workspace() -> Workspace<FakeDecoder> {
        Workspace::new(fake_decoder as FakeDecoder, ViewConfig::default())
    }

    #[test]
    fn test_import_and_status() {
        let mut ws = workspace();
        assert_eq!(ws.status(), "");

        ws.import("car.dbc").unwrap();
        assert_eq!(ws.status(), "Loaded DBC file: car.dbc");
        assert_eq!(ws.catalog().list_keys(), ["car.dbc"]);

        assert!(matches!(
            ws.import("car.dbc"),
            Err(CatalogError::DuplicateKey { .. })
        ));
        assert_eq!(ws.status(), "Error: Database 'car.dbc' is already loaded");

        assert!(ws.import("car.txt").is_err());
        assert_eq!(ws.status(), "Error: Not a valid .dbc file: car.txt");
        assert_eq!(ws.catalog().len(), 1);
    }

    #[test]
    fn test_remove_cascades_to_explorer() {
        let mut ws = workspace();
        ws.import("car.dbc").unwrap();
        let key: SessionKey = ws.open_explorer("car.dbc").unwrap();
        assert_eq!(ws.open_explorer("car.dbc").unwrap(), key);

        {
            let (session, db) = ws.explorer_mut("car.dbc").unwrap();
            session.set_mode(&db, DisplayMode::MessagesTable).unwrap();
            session.open_inspector_for_row(&db, 0).unwrap();
        }
        assert_eq!(ws.explorer("car.dbc").unwrap().inspector_count(), 1);

        ws.remove("car.dbc").unwrap();
        assert_eq!(ws.status(), "Removed DBC file: car.dbc");
        assert!(ws.explorer("car.dbc").is_none());
        assert!(ws.sessions().is_empty());
        assert!(matches!(ws.remove("car.dbc"), Err(CatalogError::NotFound { .. })));

        // re-import after an explicit removal is accepted
        ws.import("car.dbc").unwrap();
        assert_ne!(ws.open_explorer("car.dbc").unwrap(), key);
    }

    #[test]
    fn test_close_explorer() {
        let mut ws = workspace();
        ws.import("car.dbc").unwrap();
        assert!(matches!(
            ws.close_explorer("car.dbc"),
            Err(SessionError::SessionNotFound)
        ));
        ws.open_explorer("car.dbc").unwrap();
        assert_eq!(ws.close_explorer("car.dbc").unwrap(), 0);
        assert!(matches!(
            ws.open_explorer("other.dbc"),
            Err(SessionError::Catalog(CatalogError::NotFound { .. }))
        ));
    }

    #[cfg(feature = "dbc")]
    #[test]
    fn test_with_dbc_decoder() {
        let mut ws = Workspace::with_dbc(ViewConfig::default());
        assert!(matches!(
            ws.import("/definitely/not/here.dbc"),
            Err(CatalogError::Decode { .. })
        ));
        assert!(ws.status().starts_with("Error: Failed to open"));
    }
}
