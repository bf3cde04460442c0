//! View configuration shared by the projectors and the explorer sessions.

use serde::{Deserialize, Serialize};

/// How signal names are ordered in the outline and in the all-signals table.
#[derive(Default, Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collation {
    /// Unicode lowercase fold, ties keep the database order.
    #[default]
    CaseInsensitive,
    /// Plain byte order of the names.
    CaseSensitive,
}

impl Collation {
    /// Key used to order names under this collation.
    pub fn key(&self, name: &str) -> String {
        match self {
            Collation::CaseInsensitive => name.to_lowercase(),
            Collation::CaseSensitive => name.to_string(),
        }
    }
}

/// Rendering knobs of the catalog views.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Text shown in message columns whose value is absent.
    pub placeholder: String,
    /// Prefix of the first cell of an expanded signal sub-row.
    pub sub_row_indent: String,
    /// Value of an enumerated filter that leaves its column unconstrained.
    pub all_sentinel: String,
    /// Signal name ordering.
    pub collation: Collation,
}

impl Default for ViewConfig {
    fn default() -> Self {
        ViewConfig {
            placeholder: "N/A".to_string(),
            sub_row_indent: "    ".to_string(),
            all_sentinel: "All".to_string(),
            collation: Collation::CaseInsensitive,
        }
    }
}
