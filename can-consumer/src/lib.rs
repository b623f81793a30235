//! CAN Data Consumer Library
//!
//! Edge-side decode-and-dispatch pipeline for live CAN bus traffic. Each
//! channel's read loop feeds received frames into a [`CanDataConsumer`],
//! which looks up the frame's decode method in the active decoder
//! dictionary, captures raw bytes and/or decodes signal values, and hands
//! the result to a shared bounded buffer for the inspection stage.
//!
//! # Architecture
//!
//! The pipeline is intentionally small and synchronous:
//! - Resolves decode methods per (channel, message id), with a fallback for
//!   extended-format ids the configuration never marked as extended
//! - Captures up to 64 raw payload bytes and/or decodes wanted signals,
//!   depending on the configured collect type
//! - Pushes collected data frames into the buffer without blocking, keeping
//!   queue-depth counters exact even when the buffer rejects the push
//!
//! The library does NOT:
//! - Build or hot-swap decoder dictionaries (the configuration actor does)
//! - Inspect, persist, or upload collected data
//! - Own the CAN transport or its read loops
//!
//! # Example Usage
//!
//! ```
//! use can_consumer::{
//!     ByteOrder, CanDataConsumer, CanDecoderDictionary, CanMessageDecoderMethod,
//!     CanMessageFormat, CanSignalFormat, CollectType, SignalBuffer, ValueType,
//! };
//! use std::sync::Arc;
//!
//! // Built by the configuration actor, shared with every channel thread
//! let mut dictionary = CanDecoderDictionary::new();
//! dictionary.add_decoder_method(
//!     0,
//!     0x123,
//!     CanMessageDecoderMethod {
//!         collect_type: CollectType::RawAndDecode,
//!         format: CanMessageFormat {
//!             message_id: 0x123,
//!             size: 2,
//!             signals: vec![CanSignalFormat {
//!                 signal_id: 7,
//!                 start_bit: 0,
//!                 length: 8,
//!                 byte_order: ByteOrder::LittleEndian,
//!                 value_type: ValueType::Unsigned,
//!                 factor: 1.0,
//!                 offset: 0.0,
//!             }],
//!         },
//!     },
//! );
//! dictionary.add_signal_to_collect(7);
//!
//! let buffer = Arc::new(SignalBuffer::new(1024));
//! let consumer = CanDataConsumer::new(Some(Arc::clone(&buffer)));
//!
//! // Called by the channel read loop once per received frame
//! consumer.process_message(0, Some(&dictionary), 0x123, &[0x2A, 0x00], 1_000);
//!
//! let frame = buffer.pop().expect("frame was queued");
//! assert_eq!(frame.collected_signals.len(), 1);
//! ```

pub mod buffer;
pub mod consumer;
pub mod decoder;
pub mod dictionary;
pub mod trace;
pub mod types;

// Re-export main types for convenience
pub use buffer::SignalBuffer;
pub use consumer::CanDataConsumer;
pub use decoder::{CanDecodedSignal, CanSignalDecoder, DecodeError, SignalDecoder};
pub use dictionary::{
    ByteOrder, CanDecoderDictionary, CanMessageDecoderMethod, CanMessageFormat, CanSignalFormat,
    CollectType, ValueType, CAN_EFF_MASK,
};
pub use trace::{TraceModule, TraceVariable, MAX_DECODER_SECTIONS};
pub use types::{
    ChannelId, CollectedCanRawFrame, CollectedDataFrame, CollectedSignal, SignalId, SignalValue,
    Timestamp, INVALID_SIGNAL_ID, MAX_CAN_FRAME_BYTE_SIZE,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: a consumer without a buffer can still be created
        let consumer = CanDataConsumer::new(None);
        consumer.process_message(0, None, 0x123, &[], 0);
    }
}
