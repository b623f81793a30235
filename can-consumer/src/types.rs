//! Core types for the CAN data consumer
//!
//! This module defines the output-facing values the pipeline hands to the
//! inspection stage: decoded signals, raw frame captures, and the data frame
//! that groups them. The pipeline builds one `CollectedDataFrame` per incoming
//! CAN message and immediately moves it into the signal buffer.

use std::fmt;

/// Numeric identifier of a physical or logical CAN channel
pub type ChannelId = u32;

/// Identifier of a signal within the decoder dictionary
pub type SignalId = u32;

/// Receive timestamp in milliseconds, as supplied by the transport layer
pub type Timestamp = u64;

/// Sentinel signal id marking an entry that must never reach the output
pub const INVALID_SIGNAL_ID: SignalId = 0;

/// Maximum number of raw payload bytes captured per frame (CAN-FD limit)
pub const MAX_CAN_FRAME_BYTE_SIZE: usize = 64;

/// A decoded signal value tagged with its numeric kind
///
/// Exactly three kinds are recognized: unsigned 64-bit, signed 64-bit, and
/// floating point. Anything a decoder produces outside the two integer kinds
/// is represented as floating point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SignalValue {
    /// Unsigned integer value
    Uint64(u64),
    /// Signed integer value
    Int64(i64),
    /// Floating-point value (the default representation)
    Double(f64),
}

impl SignalValue {
    /// Convert the value to f64 regardless of kind
    pub fn as_f64(&self) -> f64 {
        match self {
            SignalValue::Uint64(v) => *v as f64,
            SignalValue::Int64(v) => *v as f64,
            SignalValue::Double(v) => *v,
        }
    }
}

impl fmt::Display for SignalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalValue::Uint64(v) => write!(f, "{}", v),
            SignalValue::Int64(v) => write!(f, "{}", v),
            SignalValue::Double(v) => write!(f, "{:.3}", v),
        }
    }
}

/// A signal collected for the inspection stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollectedSignal {
    /// Signal id from the decoder dictionary
    pub signal_id: SignalId,
    /// Receive time of the frame the signal was decoded from
    pub receive_time: Timestamp,
    /// Decoded value, coerced into its numeric kind
    pub value: SignalValue,
}

impl CollectedSignal {
    pub fn new(signal_id: SignalId, receive_time: Timestamp, value: SignalValue) -> Self {
        Self {
            signal_id,
            receive_time,
            value,
        }
    }
}

/// A raw CAN frame captured for the inspection stage
///
/// Holds up to [`MAX_CAN_FRAME_BYTE_SIZE`] payload bytes inline; longer
/// payloads are truncated at capture time.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedCanRawFrame {
    /// CAN message id (after any extended-id adjustment)
    pub frame_id: u32,
    /// Channel the frame was received on
    pub channel_id: ChannelId,
    /// Receive time of the frame
    pub receive_time: Timestamp,
    /// Number of valid bytes in `data`
    pub size: u8,
    /// Payload bytes; only the first `size` bytes are valid
    pub data: [u8; MAX_CAN_FRAME_BYTE_SIZE],
}

impl CollectedCanRawFrame {
    /// Capture a raw frame, copying at most [`MAX_CAN_FRAME_BYTE_SIZE`]
    /// payload bytes from the start of `payload`
    pub fn new(
        frame_id: u32,
        channel_id: ChannelId,
        receive_time: Timestamp,
        payload: &[u8],
    ) -> Self {
        let size = payload.len().min(MAX_CAN_FRAME_BYTE_SIZE);
        let mut data = [0u8; MAX_CAN_FRAME_BYTE_SIZE];
        data[..size].copy_from_slice(&payload[..size]);
        Self {
            frame_id,
            channel_id,
            receive_time,
            size: size as u8,
            data,
        }
    }

    /// The valid portion of the captured payload
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.size as usize]
    }
}

/// The unit handed to the signal buffer for the inspection stage
///
/// May carry a raw capture, decoded signals, both, or an empty signal
/// sequence when decoding yielded nothing usable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectedDataFrame {
    /// Raw frame capture, present when the collect type requested it
    pub collected_can_raw_frame: Option<CollectedCanRawFrame>,
    /// Decoded signals in decoder output order
    pub collected_signals: Vec<CollectedSignal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_frame_caps_payload_at_64_bytes() {
        let payload = vec![0xAA; 100];
        let frame = CollectedCanRawFrame::new(0x123, 0, 1000, &payload);
        assert_eq!(frame.size as usize, MAX_CAN_FRAME_BYTE_SIZE);
        assert_eq!(frame.payload(), &payload[..64]);
    }

    #[test]
    fn test_raw_frame_short_payload() {
        let frame = CollectedCanRawFrame::new(0x123, 1, 1000, &[0x01, 0x02]);
        assert_eq!(frame.size, 2);
        assert_eq!(frame.payload(), &[0x01, 0x02]);
        assert_eq!(frame.data[2], 0);
    }

    #[test]
    fn test_signal_value_as_f64() {
        assert_eq!(SignalValue::Uint64(42).as_f64(), 42.0);
        assert_eq!(SignalValue::Int64(-5).as_f64(), -5.0);
        assert_eq!(SignalValue::Double(3.5).as_f64(), 3.5);
    }

    #[test]
    fn test_signal_value_display() {
        assert_eq!(format!("{}", SignalValue::Int64(-5)), "-5");
        assert_eq!(format!("{}", SignalValue::Double(3.14159)), "3.142");
    }
}
