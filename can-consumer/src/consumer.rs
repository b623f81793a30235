//! CAN data consumer pipeline
//!
//! One consumer serves the read loops of the CAN transport: for every
//! received frame it resolves the decode method from the active dictionary
//! snapshot, captures the raw frame and/or decodes signals according to the
//! configured collect type, and hands the result to the shared signal buffer
//! with backpressure-safe queue accounting. Every call is self-contained; no
//! state persists between frames.

use std::sync::Arc;

use crate::buffer::SignalBuffer;
use crate::decoder::{CanSignalDecoder, SignalDecoder};
use crate::dictionary::{
    CanDecoderDictionary, CanMessageDecoderMethod, CanMsgDecoderMethods, CAN_EFF_MASK,
};
use crate::trace::{TraceModule, TraceVariable};
use crate::types::{
    ChannelId, CollectedCanRawFrame, CollectedDataFrame, CollectedSignal, SignalValue, Timestamp,
    INVALID_SIGNAL_ID,
};

/// Per-message decode-and-dispatch pipeline
///
/// Shared by the channel read loops; `process_message` may be called
/// concurrently from one thread per channel against the same buffer and
/// trace module.
pub struct CanDataConsumer<D: SignalDecoder = CanSignalDecoder> {
    signal_buffer: Option<Arc<SignalBuffer>>,
    decoder: D,
    trace: Arc<TraceModule>,
}

impl CanDataConsumer {
    /// Create a consumer using the bit-extraction decoder and the
    /// process-wide trace module
    pub fn new(signal_buffer: Option<Arc<SignalBuffer>>) -> Self {
        Self {
            signal_buffer,
            decoder: CanSignalDecoder,
            trace: TraceModule::get(),
        }
    }
}

impl<D: SignalDecoder> CanDataConsumer<D> {
    /// Create a consumer with an explicit decoder and trace module
    pub fn with_parts(
        signal_buffer: Option<Arc<SignalBuffer>>,
        decoder: D,
        trace: Arc<TraceModule>,
    ) -> Self {
        Self {
            signal_buffer,
            decoder,
            trace,
        }
    }

    /// Resolve the decode method for a message on a channel
    ///
    /// Returns the method together with the message id to use for the rest
    /// of the call. Some configuration sources never mark extended-format
    /// ids, so a frame arriving with the extended bit set must still match a
    /// dictionary entry authored without it; when the direct lookup misses,
    /// the id masked to the 29-bit identifier space is tried and, on a hit,
    /// replaces the original id.
    fn find_decoder_method(
        channel_id: ChannelId,
        message_id: u32,
        decoder_methods: &CanMsgDecoderMethods,
    ) -> Option<(u32, &CanMessageDecoderMethod)> {
        let channel_methods = decoder_methods.get(&channel_id)?;

        if let Some(method) = channel_methods.get(&message_id) {
            return Some((message_id, method));
        }

        let masked_id = message_id & CAN_EFF_MASK;
        channel_methods
            .get(&masked_id)
            .map(|method| (masked_id, method))
    }

    /// Process one received CAN frame
    ///
    /// `dictionary` is the caller's borrowed snapshot of the active
    /// configuration; `None` means no configuration is published right now
    /// and the frame is skipped silently. Unconfigured messages are skipped
    /// silently as well. All other failure modes degrade to a warning plus
    /// consistent metrics; nothing is surfaced to the caller.
    pub fn process_message(
        &self,
        channel_id: ChannelId,
        dictionary: Option<&CanDecoderDictionary>,
        message_id: u32,
        data: &[u8],
        timestamp: Timestamp,
    ) {
        // Skip if the dictionary was invalidated during message processing
        let Some(dictionary) = dictionary else {
            return;
        };

        let section = TraceModule::section_for_channel(channel_id);
        self.trace.section_begin(section);

        let Some((message_id, method)) =
            Self::find_decoder_method(channel_id, message_id, &dictionary.decoder_methods)
        else {
            self.trace.section_end(section);
            return;
        };

        // A data frame is only assembled when somewhere to put it exists
        let Some(buffer) = self.signal_buffer.as_ref() else {
            self.trace.section_end(section);
            return;
        };

        let mut collected_data_frame = CollectedDataFrame::default();

        if method.collect_type.wants_raw() {
            collected_data_frame.collected_can_raw_frame = Some(CollectedCanRawFrame::new(
                message_id, channel_id, timestamp, data,
            ));
        }

        if method.collect_type.wants_decode() {
            if method.format.is_valid() {
                match self
                    .decoder
                    .decode(data, &method.format, &dictionary.signal_ids_to_collect)
                {
                    Ok(decoded_signals) => {
                        let mut collected_signals_group =
                            Vec::with_capacity(decoded_signals.len());
                        for signal in decoded_signals {
                            let value = match signal.value {
                                v @ SignalValue::Uint64(_) => v,
                                v @ SignalValue::Int64(_) => v,
                                // Any other kind is carried as floating point
                                other => SignalValue::Double(other.as_f64()),
                            };
                            let collected_signal =
                                CollectedSignal::new(signal.signal_id, timestamp, value);
                            // Only valid signals reach the output
                            if collected_signal.signal_id != INVALID_SIGNAL_ID {
                                collected_signals_group.push(collected_signal);
                            }
                        }
                        log::debug!(
                            "Decoded {} signals from CAN frame {}",
                            collected_signals_group.len(),
                            message_id
                        );
                        collected_data_frame.collected_signals = collected_signals_group;
                    }
                    Err(e) => {
                        log::warn!("CAN Frame {} decoding failed: {}", message_id, e);
                    }
                }
            } else {
                log::warn!(
                    "CanMessageFormat invalid for format message id: {} can message id: {} on CAN channel id: {}",
                    method.format.message_id,
                    message_id,
                    channel_id
                );
            }
        }

        self.trace.section_end(section);

        // Increase all queue metrics before pushing data to the buffer
        self.trace.increment(TraceVariable::QueuedDataFrames);

        let collected_signals = collected_data_frame.collected_signals.len() as u64;
        self.trace.add(TraceVariable::QueuedSignals, collected_signals);

        let can_raw_frame_collected = collected_data_frame.collected_can_raw_frame.is_some();
        if can_raw_frame_collected {
            self.trace.increment(TraceVariable::QueuedCanRawFrames);
        }

        if !buffer.push(collected_data_frame) {
            self.trace.decrement(TraceVariable::QueuedDataFrames);

            if can_raw_frame_collected {
                self.trace.decrement(TraceVariable::QueuedCanRawFrames);
            }

            self.trace.subtract(TraceVariable::QueuedSignals, collected_signals);

            log::warn!("Signal buffer full");
        }
    }
}
