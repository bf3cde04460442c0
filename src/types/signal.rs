use std::collections::BTreeMap;
use std::fmt;

use crate::types::database::MessageKey;

/// Definition of a signal within a CAN message.
///
/// Describes position/bit-length, byte order, sign, scaling (factor/offset),
/// valid range, unit of measure, value choices, multiplexing and receiver nodes.
/// Every optional attribute of the source file is an explicit `Option` here; the
/// views decide how an absent value is rendered.
#[derive(Clone, PartialEq, Debug)]
pub struct Signal {
    /// Parent message key (back-reference, set by [`Database::add_signal`](crate::Database::add_signal)).
    pub message: MessageKey,
    /// Signal name, unique within its message.
    pub name: String,
    /// Start bit in the payload as written in the source file.
    pub bit_start: u16,
    /// Bit length.
    pub bit_length: u16,
    pub byte_order: ByteOrder,
    pub is_signed: bool,
    /// Initial (start) raw value, if declared.
    pub initial: Option<f64>,
    /// Scaling factor.
    pub factor: f64,
    /// Scaling offset.
    pub offset: f64,
    /// Minimum physical value.
    pub minimum: Option<f64>,
    /// Maximum physical value.
    pub maximum: Option<f64>,
    /// Unit of measure.
    pub unit: Option<String>,
    /// `true` for the multiplexer switch itself (`M` in DBC).
    pub is_multiplexer: bool,
    /// Name of the switch gating this signal (`mX` in DBC).
    pub multiplexer_signal: Option<String>,
    /// Switch values for which this signal is present.
    pub multiplexer_ids: Option<Vec<u32>>,
    /// Raw value → label mapping (DBC `VAL_`).
    pub choices: BTreeMap<i64, String>,
    /// Associated comment (DBC `CM_ SG_` section).
    pub comment: Option<String>,
    /// Names of the receiving nodes.
    pub receivers: Vec<String>,
}

impl Default for Signal {
    fn default() -> Self {
        Signal {
            message: MessageKey::default(),
            name: String::new(),
            bit_start: 0,
            bit_length: 0,
            byte_order: ByteOrder::default(),
            is_signed: false,
            initial: None,
            factor: 1.0,
            offset: 0.0,
            minimum: None,
            maximum: None,
            unit: None,
            is_multiplexer: false,
            multiplexer_signal: None,
            multiplexer_ids: None,
            choices: BTreeMap::new(),
            comment: None,
            receivers: Vec::new(),
        }
    }
}

impl Signal {
    /// `start|length`, the bit range notation of the source file.
    pub fn bit_range(&self) -> String {
        format!("{}|{}", self.bit_start, self.bit_length)
    }

    /// Short multiplexing description, empty for plain signals.
    ///
    /// - switch: `"Multiplexor"`
    /// - gated signal: `"<switch> = 1,2"` (switch name `?` when unknown)
    /// - gated switch (nested multiplexing): both, separated by `"; "`
    pub fn multiplexer_descriptor(&self) -> String {
        let gated: Option<String> = self.multiplexer_ids.as_ref().map(|ids| {
            let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
            format!(
                "{} = {}",
                self.multiplexer_signal.as_deref().unwrap_or("?"),
                ids.join(",")
            )
        });
        match (self.is_multiplexer, gated) {
            (true, Some(g)) => format!("Multiplexor; {}", g),
            (true, None) => "Multiplexor".to_string(),
            (false, Some(g)) => g,
            (false, None) => String::new(),
        }
    }

    /// Choices rendered as `value=label` pairs in ascending raw value order, comma separated.
    pub fn choices_to_string(&self) -> String {
        self.choices
            .iter()
            .map(|(value, label)| format!("{}={}", value, label))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Bit layout of a signal inside the payload.
#[derive(Default, Copy, Clone, PartialEq, Eq, Debug)]
pub enum ByteOrder {
    /// Intel (`@1` in DBC).
    #[default]
    LittleEndian,
    /// Motorola (`@0` in DBC).
    BigEndian,
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ByteOrder::LittleEndian => "little_endian",
            ByteOrder::BigEndian => "big_endian",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_test_signal() -> Signal {
        Signal {
            name: "Speed".into(),
            bit_start: 8,
            bit_length: 16,
            choices: BTreeMap::from([(255, "Error".to_string()), (0, "Stop".to_string())]),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_scaling() {
        let sig: Signal = Signal::default();
        assert_eq!(sig.factor, 1.0);
        assert_eq!(sig.offset, 0.0);
        assert_eq!(sig.byte_order.to_string(), "little_endian");
    }

    #[test]
    fn test_bit_range_and_choices() {
        let sig: Signal = build_test_signal();
        assert_eq!(sig.bit_range(), "8|16");
        assert_eq!(sig.choices_to_string(), "0=Stop,255=Error");
    }

    #[test]
    fn test_multiplexer_descriptor() {
        let mut sig: Signal = build_test_signal();
        assert_eq!(sig.multiplexer_descriptor(), "");

        sig.is_multiplexer = true;
        assert_eq!(sig.multiplexer_descriptor(), "Multiplexor");

        sig.is_multiplexer = false;
        sig.multiplexer_signal = Some("Mux_Sel".into());
        sig.multiplexer_ids = Some(vec![0, 2]);
        assert_eq!(sig.multiplexer_descriptor(), "Mux_Sel = 0,2");
    }
}
