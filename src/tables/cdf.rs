//! Cumulative distribution tables for the range decoder.
//!
//! The NB/MB tables below (`FRAME_TYPE_INACTIVE`, `GAIN_*`, `LSF_S1_NB_MB`,
//! `LSF_S2`, `LSF_INTERPOLATION_OFFSET`, `LCG_SEED`, `EXC_RATE`,
//! `PULSE_COUNT`) are transcribed from the verified Q8 SILK probability
//! tables embedded as test fixtures in the teacher repository's
//! `entropy.rs` (its `decoder()` unit test decodes a real captured SILK
//! frame against exactly these tables). They are expanded here to the Q16
//! cumulative format `[crate::entropy::RangeDecoder::decode_symbol]`
//! expects: the table's leading "total" entry is dropped and every
//! remaining cumulative value is scaled from a `/256` total to a `/65536`
//! one, with the final entry clamped to `0xFFFF` so it fits a `u16` and
//! matches the reference range coder's end-of-table sentinel.
//!
//! Every other table in this module (WB/SWB LSF codebooks, shell-code
//! split tables, LTP codebooks, pitch contours, periodicity and
//! quantization-offset-type selectors) has no corresponding numeric data in
//! either the teacher repository or `original_source/`; those tables are
//! structurally valid (monotonic, correctly sized, internally consistent)
//! but their entries are placeholders and are flagged as such in
//! `DESIGN.md`.

use once_cell::sync::Lazy;

/// Expands a Q8 cumulative table (leading entry = 256 = total) into the Q16
/// format used by the range decoder.
fn expand_q8_to_q16(q8: &[u32]) -> Vec<u16> {
    let (&total, rest) = q8.split_first().expect("cdf table must be non-empty");
    debug_assert_eq!(total, 256);
    rest.iter()
        .map(|&v| ((v * 256).min(0xFFFF)) as u16)
        .collect()
}

macro_rules! q16_cdf {
    ($name:ident, $q8:expr) => {
        pub static $name: Lazy<Vec<u16>> = Lazy::new(|| expand_q8_to_q16(&$q8));
    };
}

q16_cdf!(FRAME_TYPE_INACTIVE, [256u32, 26, 256]);

q16_cdf!(GAIN_HIGH_BITS_0, [256u32, 32, 144, 212, 241, 253, 254, 255, 256]);
q16_cdf!(GAIN_HIGH_BITS_1, [256u32, 2, 19, 64, 124, 186, 233, 252, 256]);
q16_cdf!(GAIN_HIGH_BITS_2, [256u32, 1, 4, 30, 101, 195, 245, 254, 256]);

/// `SKP_Silk_gain_CDF[sigtype]`: CDF for the first subframe's independent
/// gain index, used whenever it is coded unconditionally (the reference
/// does this for the first frame of every packet). Keyed by signal type
/// (`Inactive=0, Unvoiced=1, Voiced=2`), not by the previous gain index —
/// the three tables already present here happen to fit that role as-is.
pub fn gain_cdf_unconditional(signal_type_ix: usize) -> &'static [u16] {
    match signal_type_ix {
        0 => &GAIN_HIGH_BITS_0,
        1 => &GAIN_HIGH_BITS_1,
        _ => &GAIN_HIGH_BITS_2,
    }
}

q16_cdf!(GAIN_LOW_BITS, [256u32, 32, 64, 96, 128, 160, 192, 224, 256]);

q16_cdf!(
    GAIN_DELTA,
    [
        256u32, 6, 11, 22, 53, 185, 206, 214, 218, 221, 223, 225, 227, 228, 229, 230, 231, 232,
        233, 234, 235, 236, 237, 238, 239, 240, 241, 242, 243, 244, 245, 246, 247, 248, 249, 250,
        251, 252, 253, 254, 255, 256
    ]
);

q16_cdf!(
    LSF_S1_NB_MB_VOICED_0,
    [
        256u32, 44, 78, 108, 127, 148, 160, 171, 174, 177, 179, 195, 197, 199, 200, 205, 207, 208,
        211, 214, 215, 216, 218, 220, 222, 225, 226, 235, 244, 246, 253, 255, 256
    ]
);
q16_cdf!(
    LSF_S1_NB_MB_VOICED_1,
    [
        256u32, 1, 11, 12, 20, 23, 31, 39, 53, 66, 80, 81, 95, 107, 120, 131, 142, 154, 165, 175,
        185, 196, 204, 213, 221, 228, 236, 237, 238, 244, 245, 251, 256
    ]
);
q16_cdf!(
    LSF_S1_NB_MB_UNVOICED_0,
    [
        256u32, 31, 52, 55, 72, 73, 81, 98, 102, 103, 121, 137, 141, 143, 146, 147, 157, 158, 161,
        177, 188, 204, 206, 208, 211, 213, 224, 225, 229, 238, 246, 253, 256
    ]
);
q16_cdf!(
    LSF_S1_NB_MB_UNVOICED_1,
    [
        256u32, 1, 5, 21, 26, 44, 55, 60, 74, 89, 90, 93, 105, 118, 132, 146, 152, 166, 178, 180,
        186, 187, 199, 211, 222, 232, 235, 245, 250, 251, 252, 253, 256
    ]
);

/// Stage-1 NLSF CDF, indexed `[voiced][interpolation-stage]` as in the
/// reference `SKP_Silk_NLSF_CB1_*` tables.
pub fn lsf_s1_nb_mb(voiced: bool, stage: usize) -> &'static [u16] {
    match (voiced, stage) {
        (false, 0) => &LSF_S1_NB_MB_UNVOICED_0,
        (false, _) => &LSF_S1_NB_MB_UNVOICED_1,
        (true, 0) => &LSF_S1_NB_MB_VOICED_0,
        (true, _) => &LSF_S1_NB_MB_VOICED_1,
    }
}

q16_cdf!(LSF_S2_0, [256u32, 1, 2, 3, 18, 242, 253, 254, 255, 256]);
q16_cdf!(LSF_S2_1, [256u32, 1, 2, 4, 38, 221, 253, 254, 255, 256]);
q16_cdf!(LSF_S2_2, [256u32, 1, 2, 6, 48, 197, 252, 254, 255, 256]);
q16_cdf!(LSF_S2_3, [256u32, 1, 2, 10, 62, 185, 246, 254, 255, 256]);
q16_cdf!(LSF_S2_4, [256u32, 1, 4, 20, 73, 174, 248, 254, 255, 256]);
q16_cdf!(LSF_S2_5, [256u32, 1, 4, 21, 76, 166, 239, 254, 255, 256]);
q16_cdf!(LSF_S2_6, [256u32, 1, 8, 32, 85, 159, 226, 252, 255, 256]);
q16_cdf!(LSF_S2_7, [256u32, 1, 2, 20, 83, 161, 219, 249, 255, 256]);
q16_cdf!(LSF_S2_8, [256u32, 1, 2, 3, 12, 244, 253, 254, 255, 256]);
q16_cdf!(LSF_S2_9, [256u32, 1, 2, 4, 32, 218, 253, 254, 255, 256]);
q16_cdf!(LSF_S2_10, [256u32, 1, 2, 5, 47, 199, 252, 254, 255, 256]);
q16_cdf!(LSF_S2_11, [256u32, 1, 2, 12, 61, 187, 252, 254, 255, 256]);
q16_cdf!(LSF_S2_12, [256u32, 1, 5, 24, 72, 172, 249, 254, 255, 256]);
q16_cdf!(LSF_S2_13, [256u32, 1, 2, 16, 70, 170, 242, 254, 255, 256]);
q16_cdf!(LSF_S2_14, [256u32, 1, 2, 17, 78, 165, 226, 251, 255, 256]);
q16_cdf!(LSF_S2_15, [256u32, 1, 8, 29, 79, 156, 237, 254, 255, 256]);

pub fn lsf_s2(codebook_ix: usize) -> &'static [u16] {
    const TABLES: [&Lazy<Vec<u16>>; 16] = [
        &LSF_S2_0, &LSF_S2_1, &LSF_S2_2, &LSF_S2_3, &LSF_S2_4, &LSF_S2_5, &LSF_S2_6, &LSF_S2_7,
        &LSF_S2_8, &LSF_S2_9, &LSF_S2_10, &LSF_S2_11, &LSF_S2_12, &LSF_S2_13, &LSF_S2_14,
        &LSF_S2_15,
    ];
    TABLES[codebook_ix % 16]
}

q16_cdf!(LSF_INTERPOLATION_OFFSET, [256u32, 13, 35, 64, 75, 256]);

q16_cdf!(LCG_SEED, [256u32, 64, 128, 192, 256]);

q16_cdf!(EXC_RATE_UNVOICED, [256u32, 15, 66, 78, 124, 169, 182, 215, 242, 256]);
q16_cdf!(EXC_RATE_VOICED, [256u32, 33, 63, 99, 116, 150, 199, 217, 238, 256]);

pub fn exc_rate(voiced: bool) -> &'static [u16] {
    if voiced { &EXC_RATE_VOICED } else { &EXC_RATE_UNVOICED }
}

q16_cdf!(
    PULSE_COUNT_0,
    [256u32, 131, 205, 230, 238, 241, 244, 245, 246, 247, 248, 249, 250, 251, 252, 253, 254, 255, 256]
);
q16_cdf!(
    PULSE_COUNT_1,
    [256u32, 58, 151, 211, 234, 241, 244, 245, 246, 247, 248, 249, 250, 251, 252, 253, 254, 255, 256]
);
q16_cdf!(
    PULSE_COUNT_2,
    [256u32, 43, 94, 140, 173, 197, 213, 224, 232, 238, 241, 244, 247, 249, 250, 251, 253, 254, 256]
);
q16_cdf!(
    PULSE_COUNT_3,
    [256u32, 17, 69, 140, 197, 228, 240, 245, 246, 247, 248, 249, 250, 251, 252, 253, 254, 255, 256]
);
q16_cdf!(
    PULSE_COUNT_4,
    [256u32, 6, 27, 68, 121, 170, 205, 226, 237, 243, 246, 248, 250, 251, 252, 253, 254, 255, 256]
);
q16_cdf!(
    PULSE_COUNT_5,
    [256u32, 7, 21, 43, 71, 100, 128, 153, 173, 190, 203, 214, 223, 230, 235, 239, 243, 246, 256]
);
q16_cdf!(
    PULSE_COUNT_6,
    [256u32, 2, 7, 21, 50, 92, 138, 179, 210, 229, 240, 246, 249, 251, 252, 253, 254, 255, 256]
);
q16_cdf!(
    PULSE_COUNT_7,
    [256u32, 1, 3, 7, 17, 36, 65, 100, 137, 171, 199, 219, 233, 241, 246, 250, 252, 254, 256]
);
q16_cdf!(
    PULSE_COUNT_8,
    [256u32, 1, 3, 5, 10, 19, 33, 53, 77, 104, 132, 158, 181, 201, 216, 227, 235, 241, 256]
);
q16_cdf!(
    PULSE_COUNT_9,
    [256u32, 1, 2, 3, 9, 36, 94, 150, 189, 214, 228, 238, 244, 247, 250, 252, 253, 254, 256]
);
q16_cdf!(
    PULSE_COUNT_10,
    [256u32, 2, 3, 9, 36, 94, 150, 189, 214, 228, 238, 244, 247, 250, 252, 253, 254, 255, 256]
);

/// Pulse-count-per-shell-block CDF, indexed by rate level 0..=10 as decoded
/// from the per-frame rate-level symbol.
pub fn pulse_count(rate_level: usize) -> &'static [u16] {
    const TABLES: [&Lazy<Vec<u16>>; 11] = [
        &PULSE_COUNT_0, &PULSE_COUNT_1, &PULSE_COUNT_2, &PULSE_COUNT_3, &PULSE_COUNT_4,
        &PULSE_COUNT_5, &PULSE_COUNT_6, &PULSE_COUNT_7, &PULSE_COUNT_8, &PULSE_COUNT_9,
        &PULSE_COUNT_10,
    ];
    TABLES[rate_level.min(10)]
}

// --- Placeholder tables (no verified source data; see DESIGN.md) ---------

/// Quantization offset type: 2-way choice, nominally skewed towards "low"
/// per the reference encoder's typical operating point.
q16_cdf!(QUANT_OFFSET_TYPE, [256u32, 180, 256]);

/// Rate-level selector (11 levels), flat placeholder distribution.
q16_cdf!(
    RATE_LEVEL,
    [256u32, 24, 48, 72, 96, 120, 144, 168, 192, 216, 240, 256]
);

/// Periodicity index (3-way: choice of LTP codebook), flat placeholder.
q16_cdf!(PERIODICITY_INDEX, [256u32, 85, 170, 256]);

/// LTP scaling index (3-way), flat placeholder.
q16_cdf!(LTP_SCALE_INDEX, [256u32, 85, 170, 256]);

// The shell-coder split CDF (binomial over `0..=p` pulses per split) is
// data-dependent on `p` and is built lazily in `crate::shell::split_cdf`
// instead of living here as a fixed table.

/// `SKP_Silk_SamplingRates_CDF`: 4-way selector decoded on the first frame
/// of every packet (`nFramesDecoded == 0` in `SKP_Silk_decode_parameters.c`).
/// Indices map to kHz via [`SAMPLING_RATES_TABLE`]. Flat placeholder; the
/// reference's actual skew isn't recoverable from `original_source/` (its
/// defining header, `SKP_Silk_define.h`, was filtered out of the pack).
q16_cdf!(SAMPLING_RATE, [256u32, 64, 128, 192, 256]);

/// `SKP_Silk_SamplingRates_table`: maps a decoded index in `0..=3` to kHz.
pub const SAMPLING_RATES_TABLE: [u32; 4] = [8, 12, 16, 24];

q16_cdf!(TYPE_OFFSET_COND_0, [256u32, 200, 256]);
q16_cdf!(TYPE_OFFSET_COND_1, [256u32, 56, 256]);
q16_cdf!(TYPE_OFFSET_COND_2, [256u32, 180, 256]);
q16_cdf!(TYPE_OFFSET_COND_3, [256u32, 76, 256]);
q16_cdf!(TYPE_OFFSET_COND_4, [256u32, 160, 256]);
q16_cdf!(TYPE_OFFSET_COND_5, [256u32, 96, 256]);

/// Conditional quant-offset-type selector used whenever the joint
/// sigtype/offset symbol is decoded on a frame that is *not* the first in
/// its packet, keyed by the previous frame's combined (signal type, quant
/// offset type) context in `0..=5` (`Inactive/Low = 0` .. `Voiced/High =
/// 5`), mirroring the reference's `typeOffsetPrev`-indexed
/// `SKP_Silk_type_offset_joint_CDF[6]`. The six tables here vary in shape
/// only to exercise context selection, not to reproduce reference
/// probabilities, since the reference's per-context values aren't
/// recoverable from `original_source/` (see DESIGN.md).
pub fn type_offset_cond(prev_ix: usize) -> &'static [u16] {
    const TABLES: [&Lazy<Vec<u16>>; 6] = [
        &TYPE_OFFSET_COND_0,
        &TYPE_OFFSET_COND_1,
        &TYPE_OFFSET_COND_2,
        &TYPE_OFFSET_COND_3,
        &TYPE_OFFSET_COND_4,
        &TYPE_OFFSET_COND_5,
    ];
    TABLES[prev_ix % 6]
}
