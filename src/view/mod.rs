//! # view
//!
//! Display structures derived from a loaded [`Database`]: the outline tree, the
//! message and signal tables, the filter/sort engine, the in-place expansion index
//! and the detail inspector.
//!
//! Everything here is a pure projection of the database plus the explicit view
//! state handed in by the caller; nothing is cached behind the caller's back.

pub mod expansion;
pub mod filter;
pub mod inspector;
pub mod table;
pub mod tree;

use serde::Serialize;

use crate::config::Collation;
use crate::types::{
    database::{Database, SignalKey},
    signal::Signal,
};

/// What an explorer session currently shows.
#[derive(Default, Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayMode {
    #[default]
    Tree,
    MessagesTable,
    SignalsTable,
}

impl DisplayMode {
    pub fn name(&self) -> &'static str {
        match self {
            DisplayMode::Tree => "tree",
            DisplayMode::MessagesTable => "messages-table",
            DisplayMode::SignalsTable => "signals-table",
        }
    }

    pub fn is_table(&self) -> bool {
        !matches!(self, DisplayMode::Tree)
    }
}

/// Every signal of `db` ordered by name under `collation`; ties keep database order.
pub(crate) fn signals_by_name(db: &Database, collation: Collation) -> Vec<(SignalKey, &Signal)> {
    let mut sigs: Vec<(SignalKey, &Signal)> = db.iter_signals().collect();
    sigs.sort_by_cached_key(|(_, s)| collation.key(&s.name));
    sigs
}

/// Renders an optional number with `to_string`, or `absent`.
pub(crate) fn fmt_opt(value: Option<f64>, absent: &str) -> String {
    value.map_or_else(|| absent.to_string(), |v| v.to_string())
}

pub(crate) fn yes_no(flag: bool) -> String {
    (if flag { "Yes" } else { "No" }).to_string()
}
