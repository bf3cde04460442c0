use crate::types::{
    database::{Database, SignalKey},
    signal::Signal,
};

/// CAN message defined in the database.
///
/// Maintains the numeric ID (`id`), the normalized hexadecimal ID (`id_hex`),
/// the `name`, payload length (`byte_length`), and metadata such as `cycle_time`,
/// the transmitting nodes (`senders`), and the list of composing signals (`signals`).
#[derive(Default, Clone, PartialEq, Debug)]
pub struct Message {
    /// ID Format (Standard or Extended)
    pub id_format: IdFormat,
    /// Numeric CAN ID, without the extended-frame flag bit.
    pub id: u32,
    /// **Normalized** hexadecimal CAN ID (`"0x..."`, uppercase). Set by [`Database::add_message`].
    pub id_hex: String,
    /// Message name, unique within its database.
    pub name: String,
    /// Payload length in bytes.
    pub byte_length: u16,
    /// Cycle time in milliseconds, if declared.
    pub cycle_time: Option<u32>,
    /// Names of the transmitting nodes.
    pub senders: Vec<String>,
    /// Bus this message travels on, if known.
    pub bus_name: Option<String>,
    /// Associated comment (DBC `CM_ BO_` section).
    pub comment: Option<String>,
    /// Signals that belong to this message, in definition order.
    pub signals: Vec<SignalKey>,
}

impl Message {
    pub fn is_extended(&self) -> bool {
        self.id_format == IdFormat::Extended
    }

    /// `name (0xHEX)`, the label used by the outline and the all-signals table.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.id_hex)
    }

    /// Convenience iterator over the `Signal`s belonging to this message.
    pub fn signals<'a>(&'a self, db: &'a Database) -> impl Iterator<Item = &'a Signal> + 'a {
        self.signals
            .iter()
            .filter_map(move |&key| db.get_sig_by_key(key))
    }
}

#[derive(Default, Copy, Clone, PartialEq, Eq, Debug)]
pub enum IdFormat {
    #[default]
    Standard,
    Extended,
}
