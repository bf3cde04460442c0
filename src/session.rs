//! # session
//!
//! Live explorer state per loaded database, and the registry keeping at most one
//! explorer per database key.

use std::collections::HashMap;

use slotmap::{SlotMap, new_key_type};
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, CatalogEvent};
use crate::config::ViewConfig;
use crate::types::{
    database::{Database, MessageKey, SignalKey},
    errors::{SessionError, ViewError},
};
use crate::view::{
    DisplayMode,
    expansion::{RowHandle, TableView, Toggle},
    filter::{self, Filters, Predicate, SortState},
    inspector::DetailInspector,
    table::{self, Column, MESSAGE_COLUMNS, Row, SIGNAL_COLUMNS},
    tree::{self, TreeNode},
};

new_key_type! {
    pub struct SessionKey;
    pub struct InspectorKey;
}

/// View state of one database: display mode, per-mode filters and sort,
/// displayed rows with their expansions, and the open inspectors.
#[derive(Debug)]
pub struct ExplorerSession {
    database_key: String,
    config: ViewConfig,
    mode: DisplayMode,
    filters: HashMap<DisplayMode, Filters>,
    sorts: HashMap<DisplayMode, SortState>,
    /// Unfiltered projection of the current table mode.
    base_rows: Vec<Row>,
    table: TableView,
    tree: TreeNode,
    inspectors: SlotMap<InspectorKey, DetailInspector>,
}

impl ExplorerSession {
    /// New session showing the outline of `db`.
    pub fn new(database_key: &str, db: &Database, config: ViewConfig) -> Self {
        ExplorerSession {
            database_key: database_key.to_string(),
            tree: tree::build_tree(database_key, db, &config),
            config,
            mode: DisplayMode::Tree,
            filters: HashMap::new(),
            sorts: HashMap::new(),
            base_rows: Vec::new(),
            table: TableView::default(),
            inspectors: SlotMap::with_key(),
        }
    }

    pub fn database_key(&self) -> &str {
        &self.database_key
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn tree(&self) -> &TreeNode {
        &self.tree
    }

    /// Displayed rows of the current table mode, sub-rows included.
    pub fn rows(&self) -> &[Row] {
        self.table.rows()
    }

    /// Column schema of the current mode; empty in tree mode.
    pub fn columns(&self) -> &'static [Column] {
        match self.mode {
            DisplayMode::Tree => &[],
            DisplayMode::MessagesTable => &MESSAGE_COLUMNS,
            DisplayMode::SignalsTable => &SIGNAL_COLUMNS,
        }
    }

    pub fn filters(&self) -> Option<&Filters> {
        self.filters.get(&self.mode)
    }

    pub fn sort_state(&self) -> Option<SortState> {
        self.sorts.get(&self.mode).copied()
    }

    fn require_table(&self) -> Result<(), ViewError> {
        if !self.mode.is_table() {
            return Err(ViewError::WrongMode {
                expected: "table",
                actual: self.mode.name(),
            });
        }
        Ok(())
    }

    /// Switches the display mode and re-projects.
    pub fn set_mode(&mut self, db: &Database, mode: DisplayMode) -> Result<(), ViewError> {
        self.mode = mode;
        debug!(database = %self.database_key, mode = mode.name(), "display mode changed");
        self.reproject(db)
    }

    /// Rebuilds the current projection from `db`, then re-applies filters and sort.
    pub fn reproject(&mut self, db: &Database) -> Result<(), ViewError> {
        self.table.collapse_all();
        self.base_rows = match self.mode {
            DisplayMode::Tree => {
                self.tree = tree::build_tree(&self.database_key, db, &self.config);
                Vec::new()
            }
            DisplayMode::MessagesTable => table::project_messages(db, &self.config),
            DisplayMode::SignalsTable => table::project_all_signals(db, &self.config),
        };
        self.refresh()
    }

    fn refresh(&mut self) -> Result<(), ViewError> {
        // expansions must be gone before rows are filtered or reordered
        self.table.collapse_all();
        let unfiltered: Filters = Filters::default();
        let filters: &Filters = self.filters.get(&self.mode).unwrap_or(&unfiltered);
        let rows: Vec<Row> = filter::apply(
            &self.base_rows,
            self.columns(),
            filters,
            self.sort_state(),
            &self.config,
        )?;
        self.table.set_rows(rows);
        Ok(())
    }

    /// Sets the predicate of `column` from its text, typed after the column kind.
    pub fn set_filter(&mut self, column: usize, value: &str) -> Result<(), ViewError> {
        self.require_table()?;
        let columns: &[Column] = self.columns();
        filter::check_column(columns, column)?;
        let predicate: Predicate = Predicate::for_column(&columns[column], value);
        self.filters.entry(self.mode).or_default().set(column, predicate);
        self.refresh()
    }

    pub fn clear_filters(&mut self) -> Result<(), ViewError> {
        self.require_table()?;
        self.filters.remove(&self.mode);
        self.refresh()
    }

    /// Sorts the current table by `column`: ascending first, then alternating.
    pub fn request_sort(&mut self, column: usize) -> Result<SortState, ViewError> {
        self.require_table()?;
        filter::check_column(self.columns(), column)?;
        let next: SortState = SortState::request(self.sort_state(), column);
        self.sorts.insert(self.mode, next);
        self.refresh()?;
        Ok(next)
    }

    /// Expands or collapses a message row of the messages table.
    pub fn toggle_expansion(&mut self, db: &Database, index: usize) -> Result<Toggle, ViewError> {
        if self.mode != DisplayMode::MessagesTable {
            return Err(ViewError::WrongMode {
                expected: DisplayMode::MessagesTable.name(),
                actual: self.mode.name(),
            });
        }
        self.table.toggle_expansion(db, index, &self.config)
    }

    pub fn track_row(&mut self, index: usize) -> Result<RowHandle, ViewError> {
        self.table.track(index)
    }

    pub fn resolve_row(&self, handle: RowHandle) -> Option<usize> {
        self.table.resolve(handle)
    }

    /// Message (and signal, for signal rows) behind a displayed row.
    pub fn row_target(&self, index: usize) -> Result<(MessageKey, Option<SignalKey>), ViewError> {
        self.require_table()?;
        self.table.target(index)
    }

    /// Opens a new inspector; several may show the same message.
    pub fn open_inspector(
        &mut self,
        db: &Database,
        message: MessageKey,
        signal: Option<SignalKey>,
    ) -> Result<InspectorKey, ViewError> {
        let inspector: DetailInspector =
            DetailInspector::new(&self.database_key, db, message, signal, &self.config)?;
        Ok(self.inspectors.insert(inspector))
    }

    /// Opens an inspector on the row at `index` (double-click).
    pub fn open_inspector_for_row(
        &mut self,
        db: &Database,
        index: usize,
    ) -> Result<InspectorKey, ViewError> {
        let (message, signal) = self.row_target(index)?;
        self.open_inspector(db, message, signal)
    }

    pub fn inspector(&self, key: InspectorKey) -> Option<&DetailInspector> {
        self.inspectors.get(key)
    }

    pub fn inspector_mut(&mut self, key: InspectorKey) -> Option<&mut DetailInspector> {
        self.inspectors.get_mut(key)
    }

    pub fn inspector_count(&self) -> usize {
        self.inspectors.len()
    }

    /// Returns `false` when `key` was already closed.
    pub fn close_inspector(&mut self, key: InspectorKey) -> bool {
        let closed: bool = self.inspectors.remove(key).is_some();
        if closed {
            debug!(database = %self.database_key, "inspector closed");
        }
        closed
    }

    /// Closes every inspector, returning how many were open.
    pub fn close_all_inspectors(&mut self) -> usize {
        let count: usize = self.inspectors.len();
        self.inspectors.clear();
        count
    }
}

/// At most one [`ExplorerSession`] per database key.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: SlotMap<SessionKey, ExplorerSession>,
    by_database: HashMap<String, SessionKey>,
    config: ViewConfig,
}

impl SessionRegistry {
    pub fn new(config: ViewConfig) -> Self {
        SessionRegistry {
            config,
            ..Default::default()
        }
    }

    /// Returns the live session of `key`, creating it if there is none.
    ///
    /// # Errors
    /// [`CatalogError::NotFound`](crate::CatalogError::NotFound) if `key` is not loaded.
    pub fn open_session(&mut self, catalog: &Catalog, key: &str) -> Result<SessionKey, SessionError> {
        if let Some(&existing) = self.by_database.get(key) {
            debug!(database = key, "explorer already open");
            return Ok(existing);
        }
        let db = catalog.get(key)?;
        let session: ExplorerSession = ExplorerSession::new(key, &db, self.config.clone());
        let session_key: SessionKey = self.sessions.insert(session);
        self.by_database.insert(key.to_string(), session_key);
        info!(database = key, "explorer opened");
        Ok(session_key)
    }

    /// Closes the inspectors of `key`'s session, then the session itself.
    /// Returns how many inspectors were closed.
    pub fn close_session(&mut self, key: &str) -> Result<usize, SessionError> {
        let session_key: SessionKey = self
            .by_database
            .remove(key)
            .ok_or(SessionError::SessionNotFound)?;
        let mut session: ExplorerSession = self
            .sessions
            .remove(session_key)
            .ok_or(SessionError::SessionNotFound)?;
        let inspectors: usize = session.close_all_inspectors();
        info!(database = key, inspectors, "explorer closed");
        Ok(inspectors)
    }

    /// Catalog listener: an unloaded database loses its explorer.
    ///
    /// The registry does not subscribe to the [`Catalog`] itself: catalog listeners cannot
    /// reach back into the registry, so whoever unloads must forward the
    /// [`CatalogEvent::Unloaded`] here ([`Workspace::remove`](crate::Workspace::remove) does).
    pub fn on_catalog_event(&mut self, event: &CatalogEvent) {
        if let CatalogEvent::Unloaded { key } = event {
            match self.close_session(key) {
                Ok(_) | Err(SessionError::SessionNotFound) => {}
                Err(err) => warn!(database = %key, error = %err, "explorer not closed on unload"),
            }
        }
    }

    pub fn session_key(&self, database_key: &str) -> Option<SessionKey> {
        self.by_database.get(database_key).copied()
    }

    pub fn get(&self, key: SessionKey) -> Option<&ExplorerSession> {
        self.sessions.get(key)
    }

    pub fn get_mut(&mut self, key: SessionKey) -> Option<&mut ExplorerSession> {
        self.sessions.get_mut(key)
    }

    pub fn by_database(&self, database_key: &str) -> Option<&ExplorerSession> {
        self.session_key(database_key).and_then(|k| self.sessions.get(k))
    }

    pub fn by_database_mut(&mut self, database_key: &str) -> Option<&mut ExplorerSession> {
        let key: SessionKey = self.session_key(database_key)?;
        self.sessions.get_mut(key)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
