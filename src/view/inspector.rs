//! Read-only detail view of one message, optionally highlighting one of its signals.

use serde::Serialize;
use tracing::debug;

use crate::config::ViewConfig;
use crate::types::{
    database::{Database, MessageKey, SignalKey},
    errors::ViewError,
    message::Message,
    signal::Signal,
};
use crate::view::filter::{SortState, sort_rows};
use crate::view::table::{Column, ColumnKind, Row, RowKind, RowOrigin};
use crate::view::{fmt_opt, yes_no};

pub const INSPECTOR_SIGNAL_COLUMNS: [Column; 10] = [
    Column { title: "Name", kind: ColumnKind::Text },
    Column { title: "Start Bit", kind: ColumnKind::Number },
    Column { title: "Length", kind: ColumnKind::Number },
    Column { title: "Byte Order", kind: ColumnKind::Choice },
    Column { title: "Signed", kind: ColumnKind::Choice },
    Column { title: "Scale", kind: ColumnKind::Number },
    Column { title: "Offset", kind: ColumnKind::Number },
    Column { title: "Min", kind: ColumnKind::Number },
    Column { title: "Max", kind: ColumnKind::Number },
    Column { title: "Unit", kind: ColumnKind::Text },
];

#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct Property {
    pub label: &'static str,
    pub value: String,
}

/// Everything the inspector shows, rendered.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct InspectorSnapshot {
    /// `Message Details: <name>`
    pub title: String,
    /// File name part of the database key.
    pub database_label: String,
    pub properties: Vec<Property>,
    pub signal_rows: Vec<Row>,
    /// Index of the highlighted signal in `signal_rows`.
    pub highlighted: Option<usize>,
}

/// Detail inspector bound to a message of a loaded database.
#[derive(Clone, Debug)]
pub struct DetailInspector {
    database_key: String,
    message: MessageKey,
    signal: Option<SignalKey>,
    sort: Option<SortState>,
    snapshot: InspectorSnapshot,
}

impl DetailInspector {
    /// # Errors
    /// - [`ViewError::UnknownMessage`] if `message` is not in `db`.
    /// - [`ViewError::UnknownSignal`] if `signal` does not belong to `message`.
    pub fn new(
        database_key: &str,
        db: &Database,
        message: MessageKey,
        signal: Option<SignalKey>,
        config: &ViewConfig,
    ) -> Result<Self, ViewError> {
        let msg: &Message = db
            .get_message_by_key(message)
            .ok_or(ViewError::UnknownMessage)?;
        if let Some(sk) = signal
            && !msg.signals.contains(&sk)
        {
            return Err(ViewError::UnknownSignal);
        }

        let signal_rows: Vec<Row> = msg
            .signals
            .iter()
            .filter_map(|&sk| db.get_sig_by_key(sk).map(|sig| inspector_row(sk, sig)))
            .collect();

        let mut inspector: DetailInspector = DetailInspector {
            database_key: database_key.to_string(),
            message,
            signal,
            sort: None,
            snapshot: InspectorSnapshot {
                title: format!("Message Details: {}", msg.name),
                database_label: file_label(database_key),
                properties: properties(msg, config),
                signal_rows,
                highlighted: None,
            },
        };
        inspector.locate_highlight();
        debug!(database = database_key, message = %msg.name, "inspector opened");
        Ok(inspector)
    }

    pub fn database_key(&self) -> &str {
        &self.database_key
    }

    pub fn message(&self) -> MessageKey {
        self.message
    }

    pub fn signal(&self) -> Option<SignalKey> {
        self.signal
    }

    pub fn snapshot(&self) -> &InspectorSnapshot {
        &self.snapshot
    }

    pub fn sort_state(&self) -> Option<SortState> {
        self.sort
    }

    /// Sorts the signal table by `column`; repeated requests alternate direction.
    pub fn request_sort(&mut self, column: usize) -> Result<SortState, ViewError> {
        let next: SortState = SortState::request(self.sort, column);
        sort_rows(&mut self.snapshot.signal_rows, &INSPECTOR_SIGNAL_COLUMNS, next)?;
        self.sort = Some(next);
        self.locate_highlight();
        Ok(next)
    }

    fn locate_highlight(&mut self) {
        self.snapshot.highlighted = self.signal.and_then(|sk| {
            self.snapshot
                .signal_rows
                .iter()
                .position(|r| r.origin.signal() == Some(sk))
        });
    }
}

fn file_label(key: &str) -> String {
    // keys may use either separator
    match key.rsplit(['/', '\\']).next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => key.to_string(),
    }
}

fn properties(msg: &Message, config: &ViewConfig) -> Vec<Property> {
    let prop = |label: &'static str, value: String| Property { label, value };
    let mut out: Vec<Property> = vec![
        prop("Name", msg.name.clone()),
        prop("ID (Hex)", msg.id_hex.clone()),
        prop("ID (Decimal)", msg.id.to_string()),
        prop("Length (Bytes)", msg.byte_length.to_string()),
        prop("Extended Frame", yes_no(msg.is_extended())),
        prop("Signal Count", msg.signals.len().to_string()),
        prop(
            "Cycle Time (ms)",
            msg.cycle_time
                .map_or_else(|| config.placeholder.clone(), |c| c.to_string()),
        ),
    ];
    if !msg.senders.is_empty() {
        out.push(prop("Senders", msg.senders.join(", ")));
    }
    if let Some(bus) = msg.bus_name.as_ref().filter(|b| !b.is_empty()) {
        out.push(prop("Bus Name", bus.clone()));
    }
    if let Some(comment) = msg.comment.as_ref().filter(|c| !c.is_empty()) {
        out.push(prop("Comment", comment.clone()));
    }
    out
}

fn inspector_row(key: SignalKey, sig: &Signal) -> Row {
    Row {
        cells: vec![
            sig.name.clone(),
            sig.bit_start.to_string(),
            sig.bit_length.to_string(),
            sig.byte_order.to_string(),
            yes_no(sig.is_signed),
            sig.factor.to_string(),
            sig.offset.to_string(),
            fmt_opt(sig.minimum, "N/A"),
            fmt_opt(sig.maximum, "N/A"),
            sig.unit.clone().unwrap_or_default(),
        ],
        origin: RowOrigin::Signal {
            message: sig.message,
            signal: key,
        },
        kind: RowKind::Primary,
    }
}
