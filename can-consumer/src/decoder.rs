//! Signal decoding engine
//!
//! Extracts signal values from raw CAN payloads according to a
//! [`CanMessageFormat`]. Handles bit extraction with both byte orders, sign
//! extension, and physical value conversion. The consumer talks to the
//! decoder through the [`SignalDecoder`] trait so the decode step can be
//! replaced (or made to fail) in tests.

use std::collections::HashSet;

use crate::dictionary::{ByteOrder, CanMessageFormat, CanSignalFormat, ValueType};
use crate::types::{SignalId, SignalValue};

/// Errors reported by a signal decoder
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("signal {signal_id} requires {required} bytes but frame only has {actual}")]
    SignalOutOfRange {
        signal_id: SignalId,
        required: usize,
        actual: usize,
    },

    #[error("message format for CAN ID 0x{0:X} has no signals")]
    EmptyFormat(u32),
}

/// A signal extracted from a frame, tagged with its numeric kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanDecodedSignal {
    /// Signal id from the message format
    pub signal_id: SignalId,
    /// Extracted value in its natural representation
    pub value: SignalValue,
}

/// The decode operation consumed by the frame consumer
pub trait SignalDecoder {
    /// Decode the wanted signals of one message
    ///
    /// Only signals whose id appears in `signal_ids_to_collect` are
    /// extracted; an empty result is a successful decode of a message none
    /// of whose signals are wanted.
    fn decode(
        &self,
        data: &[u8],
        format: &CanMessageFormat,
        signal_ids_to_collect: &HashSet<SignalId>,
    ) -> Result<Vec<CanDecodedSignal>, DecodeError>;
}

/// Bit-extraction decoder for classic CAN and CAN-FD payloads
#[derive(Debug, Default, Clone, Copy)]
pub struct CanSignalDecoder;

impl SignalDecoder for CanSignalDecoder {
    fn decode(
        &self,
        data: &[u8],
        format: &CanMessageFormat,
        signal_ids_to_collect: &HashSet<SignalId>,
    ) -> Result<Vec<CanDecodedSignal>, DecodeError> {
        if format.signals.is_empty() {
            return Err(DecodeError::EmptyFormat(format.message_id));
        }

        let mut decoded = Vec::new();
        for signal in &format.signals {
            if !signal_ids_to_collect.contains(&signal.signal_id) {
                continue;
            }

            let required = (signal.start_bit as usize + signal.length as usize + 7) / 8;
            if required > data.len() {
                log::warn!(
                    "Signal {} requires {} bytes but frame only has {} bytes",
                    signal.signal_id,
                    required,
                    data.len()
                );
                return Err(DecodeError::SignalOutOfRange {
                    signal_id: signal.signal_id,
                    required,
                    actual: data.len(),
                });
            }

            decoded.push(CanDecodedSignal {
                signal_id: signal.signal_id,
                value: Self::extract_signal(data, signal),
            });
        }
        Ok(decoded)
    }
}

impl CanSignalDecoder {
    /// Extract one signal and classify it by numeric kind
    ///
    /// Unscaled signals keep their integer representation (unsigned or
    /// signed per the format); any scaling produces a floating-point value.
    fn extract_signal(data: &[u8], signal: &CanSignalFormat) -> SignalValue {
        let start_bit = signal.start_bit as usize;
        let length = signal.length as usize;

        let raw_value = match signal.byte_order {
            ByteOrder::LittleEndian => Self::extract_little_endian(data, start_bit, length),
            ByteOrder::BigEndian => Self::extract_big_endian(data, start_bit, length),
        };

        let unscaled = signal.factor == 1.0 && signal.offset == 0.0;
        match signal.value_type {
            ValueType::Unsigned if unscaled => SignalValue::Uint64(raw_value),
            ValueType::Unsigned => {
                SignalValue::Double(signal.offset + signal.factor * raw_value as f64)
            }
            ValueType::Signed => {
                let signed = Self::sign_extend(raw_value, length);
                if unscaled {
                    SignalValue::Int64(signed)
                } else {
                    SignalValue::Double(signal.offset + signal.factor * signed as f64)
                }
            }
        }
    }

    /// Extract signal with little-endian (Intel) byte order
    ///
    /// Start bit points to the LSB; bits are numbered LSB to MSB within each
    /// byte.
    fn extract_little_endian(data: &[u8], start_bit: usize, length: usize) -> u64 {
        let mut result: u64 = 0;

        for i in 0..length {
            let bit_pos = start_bit + i;
            let byte_idx = bit_pos / 8;
            let bit_in_byte = bit_pos % 8;

            if byte_idx < data.len() {
                let bit_value = (data[byte_idx] >> bit_in_byte) & 0x01;
                result |= (bit_value as u64) << i;
            }
        }

        result
    }

    /// Extract signal with big-endian (Motorola) byte order
    ///
    /// Start bit points to the MSB of the signal; bit 0 is the MSB of byte 0.
    fn extract_big_endian(data: &[u8], start_bit: usize, length: usize) -> u64 {
        let mut result: u64 = 0;

        for i in 0..length {
            let bit_pos = start_bit + i;
            let byte_idx = bit_pos / 8;
            let bit_in_byte = 7 - (bit_pos % 8);

            if byte_idx < data.len() {
                let bit_value = (data[byte_idx] >> bit_in_byte) & 0x01;
                result |= (bit_value as u64) << (length - 1 - i);
            }
        }

        result
    }

    /// Sign-extend a value from N bits to 64 bits
    fn sign_extend(value: u64, bit_length: usize) -> i64 {
        if bit_length >= 64 {
            return value as i64;
        }

        let sign_bit = 1u64 << (bit_length - 1);
        if (value & sign_bit) != 0 {
            let mask = !0u64 << bit_length;
            (value | mask) as i64
        } else {
            value as i64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unsigned_signal(signal_id: SignalId, start_bit: u16, length: u16) -> CanSignalFormat {
        CanSignalFormat {
            signal_id,
            start_bit,
            length,
            byte_order: ByteOrder::LittleEndian,
            value_type: ValueType::Unsigned,
            factor: 1.0,
            offset: 0.0,
        }
    }

    #[test]
    fn test_extract_little_endian_simple() {
        let data = vec![0xAB, 0xCD, 0xEF, 0x12];
        let value = CanSignalDecoder::extract_little_endian(&data, 0, 8);
        assert_eq!(value, 0xAB);
    }

    #[test]
    fn test_extract_little_endian_cross_byte() {
        let data = vec![0xAB, 0xCD, 0xEF, 0x12];
        let value = CanSignalDecoder::extract_little_endian(&data, 0, 16);
        assert_eq!(value, 0xCDAB);
    }

    #[test]
    fn test_extract_big_endian_simple() {
        let data = vec![0xAB, 0xCD, 0xEF, 0x12];
        let value = CanSignalDecoder::extract_big_endian(&data, 7, 8);
        assert_eq!(value, 0xAB);
    }

    #[test]
    fn test_sign_extend_positive() {
        assert_eq!(CanSignalDecoder::sign_extend(0x7F, 8), 127);
    }

    #[test]
    fn test_sign_extend_negative() {
        assert_eq!(CanSignalDecoder::sign_extend(0xFF, 8), -1);
    }

    #[test]
    fn test_sign_extend_negative_16bit() {
        assert_eq!(CanSignalDecoder::sign_extend(0x8000, 16), -32768);
    }

    #[test]
    fn test_decode_filters_unwanted_signals() {
        let format = CanMessageFormat {
            message_id: 0x123,
            size: 2,
            signals: vec![unsigned_signal(1, 0, 8), unsigned_signal(2, 8, 8)],
        };
        let wanted: HashSet<SignalId> = [2].into_iter().collect();

        let decoded = CanSignalDecoder
            .decode(&[0x11, 0x22], &format, &wanted)
            .unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].signal_id, 2);
        assert_eq!(decoded[0].value, SignalValue::Uint64(0x22));
    }

    #[test]
    fn test_decode_signed_signal() {
        let format = CanMessageFormat {
            message_id: 0x123,
            size: 1,
            signals: vec![CanSignalFormat {
                value_type: ValueType::Signed,
                ..unsigned_signal(7, 0, 8)
            }],
        };
        let wanted: HashSet<SignalId> = [7].into_iter().collect();

        let decoded = CanSignalDecoder.decode(&[0xFB], &format, &wanted).unwrap();
        assert_eq!(decoded[0].value, SignalValue::Int64(-5));
    }

    #[test]
    fn test_decode_scaled_signal_is_floating_point() {
        let format = CanMessageFormat {
            message_id: 0x123,
            size: 1,
            signals: vec![CanSignalFormat {
                factor: 0.5,
                offset: -40.0,
                ..unsigned_signal(9, 0, 8)
            }],
        };
        let wanted: HashSet<SignalId> = [9].into_iter().collect();

        let decoded = CanSignalDecoder.decode(&[200], &format, &wanted).unwrap();
        assert_eq!(decoded[0].value, SignalValue::Double(60.0));
    }

    #[test]
    fn test_decode_short_payload_fails() {
        let format = CanMessageFormat {
            message_id: 0x123,
            size: 4,
            signals: vec![unsigned_signal(7, 16, 16)],
        };
        let wanted: HashSet<SignalId> = [7].into_iter().collect();

        let result = CanSignalDecoder.decode(&[0x01, 0x02], &format, &wanted);
        assert_eq!(
            result,
            Err(DecodeError::SignalOutOfRange {
                signal_id: 7,
                required: 4,
                actual: 2,
            })
        );
    }

    #[test]
    fn test_decode_nothing_wanted_is_empty_success() {
        let format = CanMessageFormat {
            message_id: 0x123,
            size: 1,
            signals: vec![unsigned_signal(7, 0, 8)],
        };
        let decoded = CanSignalDecoder
            .decode(&[0xAA], &format, &HashSet::new())
            .unwrap();
        assert!(decoded.is_empty());
    }
}
