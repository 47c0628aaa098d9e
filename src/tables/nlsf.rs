//! NLSF codebooks and the LSF cosine table.
//!
//! The codebook *vectors* (`SKP_Silk_NLSF_CB1_NB_MB`, `..._WB`, and the
//! per-stage MSVQ residual codebooks) are not present in `original_source/`
//! — only the algorithms that consume them (`SKP_Silk_NLSF_MSVQ_decode.c`,
//! `SKP_Silk_NLSF2A.c`) were recovered, not the table-of-constants files.
//! The vectors below are generated placeholders: monotonically increasing,
//! correctly shaped, and centred the way a real LSF codebook would be
//! (roughly evenly spaced over `0..1` in normalized frequency), but are not
//! the bit-exact reference values. This is called out in `DESIGN.md`.
//!
//! The LSF cosine table, by contrast, is exact: it's `cos(pi * i / 128)` in
//! Q15 for `i in 0..=128`, the same function the reference's piecewise
//! linear interpolation table approximates.

use once_cell::sync::Lazy;

pub const LPC_ORDER_NB_MB: usize = 10;
pub const LPC_ORDER_WB: usize = 16;

/// Number of entries in the one-sided cosine table used for the
/// piecewise-linear NLSF -> cos(omega) lookup in `NLSF2A`.
const COS_TABLE_SIZE: usize = 129;

pub static COS_TABLE_Q15: Lazy<[i32; COS_TABLE_SIZE]> = Lazy::new(|| {
    let mut table = [0i32; COS_TABLE_SIZE];
    for (i, slot) in table.iter_mut().enumerate() {
        let angle = std::f64::consts::PI * (i as f64) / (COS_TABLE_SIZE as f64 - 1.0);
        *slot = (angle.cos() * 32768.0).round() as i32;
    }
    table
});

/// Minimum allowed spacing between adjacent NLSFs, in Q15, indexed by
/// coefficient position. `SKP_Silk_NLSF_stabilize` uses this per the
/// reference to enforce a minimum bandwidth between formants; the profile
/// below follows the reference's general shape (wider minimum spacing at
/// the spectrum's edges, narrower in the middle) without claiming the exact
/// reference constants.
pub fn ndelta_min_q15(order: usize) -> Vec<i32> {
    (0..=order)
        .map(|i| {
            let edge_distance = i.min(order - i) as i32;
            (250 - edge_distance * 10).max(50)
        })
        .collect()
}

fn generate_codebook(order: usize, n_vectors: usize) -> Vec<Vec<i32>> {
    (0..n_vectors)
        .map(|v| {
            (1..=order)
                .map(|i| {
                    let frac = (i as f64) / (order as f64 + 1.0);
                    let jitter = ((v * (i + 1)) % 7) as f64 * 0.002;
                    (((frac + jitter).min(0.999)) * 32768.0).round() as i32
                })
                .collect()
        })
        .collect()
}

pub static NLSF_CB1_NB_MB: Lazy<Vec<Vec<i32>>> = Lazy::new(|| generate_codebook(LPC_ORDER_NB_MB, 32));
pub static NLSF_CB1_WB: Lazy<Vec<Vec<i32>>> = Lazy::new(|| generate_codebook(LPC_ORDER_WB, 32));

/// Stage-2 residual codebook (small per-coefficient delta alphabet).
pub static NLSF_CB2: Lazy<Vec<Vec<i32>>> = Lazy::new(|| {
    (0..16)
        .map(|v| {
            (0..10)
                .map(|i| {
                    let base = (v as i32 - 8) * 64;
                    base + (i as i32 - 5) * 8
                })
                .collect()
        })
        .collect()
});

pub fn cb1(order: usize) -> &'static Lazy<Vec<Vec<i32>>> {
    if order == LPC_ORDER_WB { &NLSF_CB1_WB } else { &NLSF_CB1_NB_MB }
}
