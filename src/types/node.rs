/// Node/ECU defined in the database.
///
/// Messages and signals refer to nodes by name only (`Message::senders`, `Signal::receivers`).
#[derive(Default, Clone, PartialEq, Debug)]
pub struct Node {
    /// Node/ECU name.
    pub name: String,
    /// Associated comment (DBC `CM_ BU_` section).
    pub comment: Option<String>,
}
