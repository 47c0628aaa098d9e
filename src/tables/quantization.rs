//! Excitation quantization-offset constants.
//!
//! These four values (25/60/8/25 in Q23, keyed by signal type and
//! quantization-offset type) are ported verbatim from the teacher's
//! `silk/excitation.rs::get_quantization_offset`, itself grounded in the
//! RFC6716 SILK excitation tables that match the original SKP_Silk
//! constants exactly for this parameter.

use crate::params::{QuantOffsetType, SignalType};

pub fn quantization_offset_q23(signal_type: SignalType, offset_type: QuantOffsetType) -> i32 {
    match (signal_type, offset_type) {
        (SignalType::Inactive, QuantOffsetType::Low) => 25,
        (SignalType::Inactive, QuantOffsetType::High) => 60,
        (SignalType::Unvoiced, QuantOffsetType::Low) => 25,
        (SignalType::Unvoiced, QuantOffsetType::High) => 60,
        (SignalType::Voiced, QuantOffsetType::Low) => 8,
        (SignalType::Voiced, QuantOffsetType::High) => 25,
    }
}
