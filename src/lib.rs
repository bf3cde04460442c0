//! # dbc_master
//!
//! Catalog view engine for exploring loaded **CAN databases**.
//!
//! ## Highlights
//! - **Catalog**: loaded databases keyed by path, at most once each, with synchronous change events.
//! - **Outline**: nodes → messages → signals tree, plus a name-ordered index of every signal.
//! - **Tables**: message and all-signals projections with rendered cells and row identity.
//! - **Filter/sort**: per-column text and choice predicates, stable type-aware sorting.
//! - **Expansion**: in-place signal sub-rows under message rows, with row handles that follow inserts.
//! - **Sessions**: one explorer per database, each tracking its open detail inspectors.
//! - **DBC decoder** (`dbc` feature): load `.dbc` files into a SlotMap-backed [`Database`].
//!

pub mod catalog;
pub mod config;
#[cfg(feature = "dbc")]
pub mod dbc;
pub mod session;
#[doc(hidden)]
pub mod types;
pub mod view;
pub mod workspace;

// Top-level re-exports (appear under Crate Items → Structs)
#[doc(inline)]
pub use crate::types::{
    database::{Database, MessageKey, NodeKey, SignalKey},
    errors::{CatalogError, DecodeError, SessionError, ViewError},
    message::{IdFormat, Message},
    node::Node,
    signal::{ByteOrder, Signal},
};

pub use crate::catalog::{Catalog, CatalogEvent, Decode};
pub use crate::config::{Collation, ViewConfig};
#[cfg(feature = "dbc")]
pub use crate::dbc::DbcDecoder;
pub use crate::session::{ExplorerSession, InspectorKey, SessionKey, SessionRegistry};
pub use crate::view::DisplayMode;
pub use crate::workspace::Workspace;

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::BTreeMap;

    use crate::types::{
        database::{Database, MessageKey},
        message::Message,
        signal::{ByteOrder, Signal},
    };

    /// `Engine` (0x100) with signals `A` and `B`, then `Brake` (0x200) without signals.
    pub(crate) fn engine_brake_db() -> Database {
        let mut db: Database = Database::default();
        db.add_node_if_absent("ECU");
        if let Some(node) = db.get_node_by_name_mut("ECU") {
            node.comment = Some("Engine control unit".into());
        }
        db.add_node_if_absent("Dash");

        let engine: MessageKey = db.add_message(Message {
            id: 0x100,
            name: "Engine".into(),
            byte_length: 8,
            cycle_time: Some(10),
            senders: vec!["ECU".into()],
            bus_name: Some("Powertrain".into()),
            comment: Some("Engine state".into()),
            ..Default::default()
        });
        db.add_signal(
            engine,
            Signal {
                name: "A".into(),
                bit_start: 0,
                bit_length: 8,
                minimum: Some(0.0),
                maximum: Some(8000.0),
                unit: Some("rpm".into()),
                comment: Some("Engine speed".into()),
                receivers: vec!["Dash".into()],
                ..Default::default()
            },
        );
        db.add_signal(
            engine,
            Signal {
                name: "B".into(),
                bit_start: 8,
                bit_length: 4,
                byte_order: ByteOrder::BigEndian,
                is_signed: true,
                choices: BTreeMap::from([(0, "Off".to_string()), (1, "On".to_string())]),
                ..Default::default()
            },
        );

        db.add_message(Message {
            id: 0x200,
            name: "Brake".into(),
            byte_length: 2,
            ..Default::default()
        });
        db
    }
}
