//! In-place expansion of message rows into their signal sub-rows.
//!
//! [`TableView`] owns the displayed rows of a table. Inserting or removing
//! sub-rows shifts every later row, so callers that need to remember a row hold a
//! [`RowHandle`] instead of an index: handles are renumbered on every mutation.

use std::collections::HashSet;

use slotmap::{SlotMap, new_key_type};
use tracing::debug;

use crate::config::ViewConfig;
use crate::types::{
    database::{Database, MessageKey, SignalKey},
    errors::ViewError,
    message::Message,
};
use crate::view::table::{Row, RowOrigin, signal_sub_row};

new_key_type! {
    /// Tracked row position that survives expand/collapse.
    pub struct RowHandle;
}

/// Result of [`TableView::toggle_expansion`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Toggle {
    Expanded { parent: usize, inserted: usize },
    Collapsed { parent: usize, removed: usize },
}

#[derive(Default, Clone, Debug)]
pub struct TableView {
    rows: Vec<Row>,
    expanded: HashSet<MessageKey>,
    handles: SlotMap<RowHandle, usize>,
}

impl TableView {
    pub fn new(rows: Vec<Row>) -> Self {
        TableView {
            rows,
            ..Default::default()
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_expanded(&self, message: MessageKey) -> bool {
        self.expanded.contains(&message)
    }

    /// Replaces the displayed rows. Expansions are collapsed and handles dropped first.
    pub fn set_rows(&mut self, rows: Vec<Row>) {
        self.collapse_all();
        self.handles.clear();
        self.rows = rows;
    }

    fn check_index(&self, index: usize) -> Result<(), ViewError> {
        if index >= self.rows.len() {
            return Err(ViewError::RowOutOfRange {
                index,
                len: self.rows.len(),
            });
        }
        Ok(())
    }

    /// Nearest row at or above `index` that is not a sub-row.
    pub fn parent_index(&self, index: usize) -> Result<usize, ViewError> {
        self.check_index(index)?;
        let mut i: usize = index;
        while self.rows[i].is_sub_row() && i > 0 {
            i -= 1;
        }
        Ok(i)
    }

    /// Expands or collapses the message row at `index`. A sub-row index acts on its parent.
    ///
    /// # Errors
    /// - [`ViewError::RowOutOfRange`] for an index past the end.
    /// - [`ViewError::WrongMode`] if the row is not a message row.
    /// - [`ViewError::UnknownMessage`] if the message is not in `db`.
    pub fn toggle_expansion(
        &mut self,
        db: &Database,
        index: usize,
        config: &ViewConfig,
    ) -> Result<Toggle, ViewError> {
        let parent: usize = self.parent_index(index)?;
        let RowOrigin::Message(msg_key) = self.rows[parent].origin else {
            return Err(ViewError::WrongMode {
                expected: "messages-table",
                actual: "signals-table",
            });
        };

        if self.expanded.remove(&msg_key) {
            let removed: usize = self.sub_rows_below(parent);
            self.rows.drain(parent + 1..parent + 1 + removed);
            for idx in self.handles.values_mut() {
                if *idx > parent + removed {
                    *idx -= removed;
                } else if *idx > parent {
                    *idx = parent;
                }
            }
            debug!(parent, removed, "message row collapsed");
            return Ok(Toggle::Collapsed { parent, removed });
        }

        let msg: &Message = db
            .get_message_by_key(msg_key)
            .ok_or(ViewError::UnknownMessage)?;
        let sub_rows: Vec<Row> = msg
            .signals
            .iter()
            .filter_map(|&sk| db.get_sig_by_key(sk).map(|sig| signal_sub_row(sk, sig, config)))
            .collect();
        let inserted: usize = sub_rows.len();

        self.rows.splice(parent + 1..parent + 1, sub_rows);
        for idx in self.handles.values_mut() {
            if *idx > parent {
                *idx += inserted;
            }
        }
        self.expanded.insert(msg_key);
        debug!(parent, inserted, "message row expanded");
        Ok(Toggle::Expanded { parent, inserted })
    }

    fn sub_rows_below(&self, parent: usize) -> usize {
        self.rows[parent + 1..]
            .iter()
            .take_while(|r| r.is_sub_row())
            .count()
    }

    /// Collapses every expanded row, keeping handles on the surviving rows.
    pub fn collapse_all(&mut self) {
        if self.expanded.is_empty() {
            return;
        }
        // old index -> new index; sub-rows map to their parent
        let mut remap: Vec<usize> = Vec::with_capacity(self.rows.len());
        let mut next: usize = 0;
        for row in &self.rows {
            if row.is_sub_row() {
                remap.push(next.saturating_sub(1));
            } else {
                remap.push(next);
                next += 1;
            }
        }
        for idx in self.handles.values_mut() {
            if let Some(&new) = remap.get(*idx) {
                *idx = new;
            }
        }
        self.rows.retain(|r| !r.is_sub_row());
        debug!(collapsed = self.expanded.len(), "all rows collapsed");
        self.expanded.clear();
    }

    /// Starts tracking the row at `index`.
    pub fn track(&mut self, index: usize) -> Result<RowHandle, ViewError> {
        self.check_index(index)?;
        Ok(self.handles.insert(index))
    }

    /// Current index of a tracked row.
    pub fn resolve(&self, handle: RowHandle) -> Option<usize> {
        self.handles.get(handle).copied()
    }

    pub fn untrack(&mut self, handle: RowHandle) -> bool {
        self.handles.remove(handle).is_some()
    }

    /// Message and optional signal behind the row at `index`.
    ///
    /// The message of a sub-row is taken from its parent row.
    pub fn target(&self, index: usize) -> Result<(MessageKey, Option<SignalKey>), ViewError> {
        let parent: usize = self.parent_index(index)?;
        let row: &Row = &self.rows[index];
        let message: MessageKey = if row.is_sub_row() {
            self.rows[parent].origin.message()
        } else {
            row.origin.message()
        };
        Ok((message, row.origin.signal()))
    }
}
