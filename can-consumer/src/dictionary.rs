//! Decoder dictionary
//!
//! The dictionary is the active decoding configuration: for each CAN channel
//! it maps message ids to a decode method (message format + collect policy),
//! and it carries the set of signal ids the inspection stage wants. A
//! dictionary snapshot is immutable once published; the configuration actor
//! replaces the whole snapshot atomically and may leave it absent while a new
//! one is being built.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::types::{ChannelId, SignalId};

/// Mask recovering the 29-bit identifier from an id carrying the
/// extended-format marker bit
pub const CAN_EFF_MASK: u32 = 0x1FFF_FFFF;

/// Byte order for signal extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ByteOrder {
    /// Little-endian (Intel format)
    LittleEndian,
    /// Big-endian (Motorola format)
    BigEndian,
}

/// Value type for signal interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    /// Signed integer
    Signed,
    /// Unsigned integer
    Unsigned,
}

/// How a configured message should be captured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectType {
    /// Capture the raw frame bytes only
    Raw,
    /// Decode signals only
    Decode,
    /// Capture the raw frame and decode signals
    RawAndDecode,
}

impl CollectType {
    /// True if raw frame capture is requested
    pub fn wants_raw(&self) -> bool {
        matches!(self, CollectType::Raw | CollectType::RawAndDecode)
    }

    /// True if signal decoding is requested
    pub fn wants_decode(&self) -> bool {
        matches!(self, CollectType::Decode | CollectType::RawAndDecode)
    }
}

/// Layout of one signal within a CAN message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanSignalFormat {
    /// Signal id the decoded value is published under
    pub signal_id: SignalId,
    /// Start bit in the CAN frame
    pub start_bit: u16,
    /// Length in bits
    pub length: u16,
    /// Byte order for extraction
    pub byte_order: ByteOrder,
    /// Signedness of the raw value
    pub value_type: ValueType,
    /// Scale factor to convert raw value to physical value
    pub factor: f64,
    /// Offset added after scaling
    pub offset: f64,
}

/// Layout of a complete CAN message
///
/// A default-constructed format (message id zero, no signals) is invalid and
/// means the configuration source never provided a usable layout for the
/// message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanMessageFormat {
    /// CAN message id this format was authored for
    pub message_id: u32,
    /// Expected message size in bytes
    pub size: usize,
    /// All signals in this message
    pub signals: Vec<CanSignalFormat>,
}

impl CanMessageFormat {
    /// True if this format can be used for decoding
    pub fn is_valid(&self) -> bool {
        self.message_id != 0 && !self.signals.is_empty()
    }
}

/// Decode method for one configured message: its format and collect policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanMessageDecoderMethod {
    /// How the message should be captured
    pub collect_type: CollectType,
    /// Message layout; may be invalid when only raw capture is configured
    pub format: CanMessageFormat,
}

/// Per-channel map of message id to decode method
pub type CanMsgDecoderMethods = HashMap<ChannelId, HashMap<u32, CanMessageDecoderMethod>>;

/// An immutable decoding configuration snapshot
///
/// Built by the configuration actor, shared read-only with every channel's
/// consumer thread. Lookups never mutate the dictionary.
#[derive(Debug, Clone, Default)]
pub struct CanDecoderDictionary {
    /// channel -> (message id -> decode method)
    pub decoder_methods: CanMsgDecoderMethods,
    /// Signal ids the inspection stage wants collected
    pub signal_ids_to_collect: HashSet<SignalId>,
}

impl CanDecoderDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a decode method for a message on a channel
    pub fn add_decoder_method(
        &mut self,
        channel_id: ChannelId,
        message_id: u32,
        method: CanMessageDecoderMethod,
    ) {
        self.decoder_methods
            .entry(channel_id)
            .or_default()
            .insert(message_id, method);
    }

    /// Mark a signal id as wanted by the inspection stage
    pub fn add_signal_to_collect(&mut self, signal_id: SignalId) {
        self.signal_ids_to_collect.insert(signal_id);
    }

    /// Number of configured messages across all channels
    pub fn num_messages(&self) -> usize {
        self.decoder_methods.values().map(|m| m.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_type_gating() {
        assert!(CollectType::Raw.wants_raw());
        assert!(!CollectType::Raw.wants_decode());
        assert!(!CollectType::Decode.wants_raw());
        assert!(CollectType::Decode.wants_decode());
        assert!(CollectType::RawAndDecode.wants_raw());
        assert!(CollectType::RawAndDecode.wants_decode());
    }

    #[test]
    fn test_default_format_is_invalid() {
        assert!(!CanMessageFormat::default().is_valid());
    }

    #[test]
    fn test_format_with_signals_is_valid() {
        let format = CanMessageFormat {
            message_id: 0x123,
            size: 8,
            signals: vec![CanSignalFormat {
                signal_id: 7,
                start_bit: 0,
                length: 8,
                byte_order: ByteOrder::LittleEndian,
                value_type: ValueType::Unsigned,
                factor: 1.0,
                offset: 0.0,
            }],
        };
        assert!(format.is_valid());
    }

    #[test]
    fn test_dictionary_insertion() {
        let mut dictionary = CanDecoderDictionary::new();
        dictionary.add_decoder_method(
            0,
            0x123,
            CanMessageDecoderMethod {
                collect_type: CollectType::Raw,
                format: CanMessageFormat::default(),
            },
        );
        dictionary.add_signal_to_collect(7);
        assert_eq!(dictionary.num_messages(), 1);
        assert!(dictionary.signal_ids_to_collect.contains(&7));
    }
}
