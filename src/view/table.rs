//! Flat tabular projections of a [`Database`].
//!
//! Rows carry their rendered cells plus a [`RowOrigin`] back-reference, so the
//! presentation layer never has to recover identity from widgets. When only the
//! rendered text is at hand, [`resolve_message_cells`] and [`resolve_signal_cells`]
//! recover it through the database lookups.

use serde::Serialize;
use tracing::debug;

use crate::config::ViewConfig;
use crate::types::{
    database::{Database, MessageKey, SignalKey, normalize_id_hex},
    message::Message,
    signal::Signal,
};
use crate::view::{fmt_opt, signals_by_name, yes_no};

/// How the filter/sort engine treats the cells of a column.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize)]
pub enum ColumnKind {
    /// Free text, compared case-insensitively.
    Text,
    /// `0x…` identifiers, compared as base-16 integers.
    Hex,
    /// Numbers, compared as floating point; unparsable cells count as `0`.
    Number,
    /// Small closed set of values, filtered by exact match.
    Choice,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize)]
pub struct Column {
    pub title: &'static str,
    pub kind: ColumnKind,
}

const fn col(title: &'static str, kind: ColumnKind) -> Column {
    Column { title, kind }
}

pub const MESSAGE_COLUMNS: [Column; 9] = [
    col("ID (Hex)", ColumnKind::Hex),
    col("Name", ColumnKind::Text),
    col("Length", ColumnKind::Number),
    col("Signals", ColumnKind::Number),
    col("Extended", ColumnKind::Choice),
    col("Cycle Time", ColumnKind::Number),
    col("Senders", ColumnKind::Text),
    col("Bus", ColumnKind::Text),
    col("Comment", ColumnKind::Text),
];

pub const SIGNAL_COLUMNS: [Column; 16] = [
    col("Name", ColumnKind::Text),
    col("Message", ColumnKind::Text),
    col("Start Bit", ColumnKind::Number),
    col("Length", ColumnKind::Number),
    col("Byte Order", ColumnKind::Choice),
    col("Signed", ColumnKind::Choice),
    col("Initial", ColumnKind::Number),
    col("Scale", ColumnKind::Number),
    col("Offset", ColumnKind::Number),
    col("Min", ColumnKind::Number),
    col("Max", ColumnKind::Number),
    col("Unit", ColumnKind::Text),
    col("Multiplexer", ColumnKind::Text),
    col("Choices", ColumnKind::Text),
    col("Comment", ColumnKind::Text),
    col("Receivers", ColumnKind::Text),
];

/// Domain object a row was projected from.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize)]
pub enum RowOrigin {
    Message(MessageKey),
    Signal {
        message: MessageKey,
        signal: SignalKey,
    },
}

impl RowOrigin {
    pub fn message(&self) -> MessageKey {
        match *self {
            RowOrigin::Message(key) => key,
            RowOrigin::Signal { message, .. } => message,
        }
    }

    pub fn signal(&self) -> Option<SignalKey> {
        match *self {
            RowOrigin::Message(_) => None,
            RowOrigin::Signal { signal, .. } => Some(signal),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize)]
pub enum RowKind {
    /// Regular table row.
    Primary,
    /// Signal row inserted below its expanded message row.
    SubRow,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct Row {
    pub cells: Vec<String>,
    pub origin: RowOrigin,
    pub kind: RowKind,
}

impl Row {
    /// Cell text, empty when `column` is past the end of the row.
    pub fn cell(&self, column: usize) -> &str {
        self.cells.get(column).map_or("", String::as_str)
    }

    pub fn is_sub_row(&self) -> bool {
        self.kind == RowKind::SubRow
    }
}

/// One row per message, in database order.
pub fn project_messages(db: &Database, config: &ViewConfig) -> Vec<Row> {
    let rows: Vec<Row> = db
        .iter_messages()
        .map(|(key, msg)| message_row(key, msg, config))
        .collect();
    debug!(rows = rows.len(), "messages projected");
    rows
}

/// One row per signal across all messages, ordered by signal name.
pub fn project_all_signals(db: &Database, config: &ViewConfig) -> Vec<Row> {
    let rows: Vec<Row> = signals_by_name(db, config.collation)
        .into_iter()
        .filter_map(|(sk, sig)| {
            let msg: &Message = db.get_message_by_key(sig.message)?;
            Some(signal_row(sk, sig, msg))
        })
        .collect();
    debug!(rows = rows.len(), "signals projected");
    rows
}

fn message_row(key: MessageKey, msg: &Message, config: &ViewConfig) -> Row {
    let or_placeholder = |value: Option<String>| value.unwrap_or_else(|| config.placeholder.clone());
    let senders: Option<String> = (!msg.senders.is_empty()).then(|| msg.senders.join(", "));

    Row {
        cells: vec![
            msg.id_hex.clone(),
            msg.name.clone(),
            msg.byte_length.to_string(),
            msg.signals.len().to_string(),
            yes_no(msg.is_extended()),
            or_placeholder(msg.cycle_time.map(|c| c.to_string())),
            or_placeholder(senders),
            or_placeholder(msg.bus_name.clone()),
            msg.comment.clone().unwrap_or_default(),
        ],
        origin: RowOrigin::Message(key),
        kind: RowKind::Primary,
    }
}

fn signal_row(key: SignalKey, sig: &Signal, msg: &Message) -> Row {
    Row {
        cells: vec![
            sig.name.clone(),
            msg.label(),
            sig.bit_start.to_string(),
            sig.bit_length.to_string(),
            sig.byte_order.to_string(),
            yes_no(sig.is_signed),
            fmt_opt(sig.initial, ""),
            sig.factor.to_string(),
            sig.offset.to_string(),
            fmt_opt(sig.minimum, ""),
            fmt_opt(sig.maximum, ""),
            sig.unit.clone().unwrap_or_default(),
            sig.multiplexer_descriptor(),
            sig.choices_to_string(),
            sig.comment.clone().unwrap_or_default(),
            sig.receivers.join(", "),
        ],
        origin: RowOrigin::Signal {
            message: sig.message,
            signal: key,
        },
        kind: RowKind::Primary,
    }
}

/// Indented row shown below an expanded message: signal name, then its bit range.
/// Padded to the message table width.
pub fn signal_sub_row(key: SignalKey, sig: &Signal, config: &ViewConfig) -> Row {
    let mut cells: Vec<String> = vec![String::new(); MESSAGE_COLUMNS.len()];
    cells[0] = format!("{}{}", config.sub_row_indent, sig.name);
    cells[1] = sig.bit_range();
    Row {
        cells,
        origin: RowOrigin::Signal {
            message: sig.message,
            signal: key,
        },
        kind: RowKind::SubRow,
    }
}

/// Splits a `name (0xHEX)` label into `(name, hex)`.
pub fn parse_message_label(label: &str) -> Option<(&str, &str)> {
    let (name, rest) = label.trim().rsplit_once(" (")?;
    let hex: &str = rest.strip_suffix(')')?;
    if name.is_empty() || hex.is_empty() {
        return None;
    }
    Some((name, hex))
}

/// Finds the message rendered as `id_hex` / `name`. Both must match.
///
/// An exact name match wins over a case-insensitive one.
pub fn resolve_message_cells(db: &Database, id_hex: &str, name: &str) -> Option<MessageKey> {
    let id_hex: String = normalize_id_hex(id_hex);
    let name: &str = name.trim();

    let find = |same_name: &dyn Fn(&str) -> bool| {
        db.iter_messages()
            .find(|(_, m)| m.id_hex == id_hex && same_name(&m.name))
            .map(|(k, _)| k)
    };
    find(&|n: &str| n == name).or_else(|| find(&|n: &str| n.eq_ignore_ascii_case(name)))
}

/// Finds the signal rendered as `signal_name` in a row whose message cell reads `message_label`.
pub fn resolve_signal_cells(
    db: &Database,
    signal_name: &str,
    message_label: &str,
) -> Option<(MessageKey, SignalKey)> {
    let (name, hex) = parse_message_label(message_label)?;
    let msg_key: MessageKey = resolve_message_cells(db, hex, name)?;
    let sig_key: SignalKey = db.get_signal_in_message(msg_key, signal_name.trim())?;
    Some((msg_key, sig_key))
}
