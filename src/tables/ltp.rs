//! LTP (long-term prediction) gain codebooks and pitch-lag contour tables.
//!
//! Grounded in `SKP_Silk_decode_pitch.c` (contour reconstruction:
//! `lag = min_lag + lag_index + contour[fs_kHz][contour_index][subframe]`)
//! and the `PERIndex`-selected 5-tap codebook referenced throughout
//! `SKP_Silk_decode_parameters.c` / `SKP_Silk_decode_core.c`. As with the
//! NLSF codebooks, the numeric entries themselves are not present in
//! `original_source/`; the values below are structurally valid placeholders
//! (correct shapes, correctly centred taps summing near unity gain) and are
//! flagged in `DESIGN.md`.

pub const LTP_ORDER: usize = 5;

/// Three LTP codebooks (`PERIndex` in `0..=2`), each with a small number of
/// candidate 5-tap Q14 filters.
pub const LTP_GAIN_CODEBOOKS: [&[[i16; LTP_ORDER]]; 3] = [
    &[
        [4096, 4096, 4096, 4096, 0],
        [2048, 4096, 8192, 2048, 0],
        [0, 4096, 8192, 4096, 0],
        [8192, 4096, 4096, 0, 0],
        [0, 2048, 12288, 2048, 0],
    ],
    &[
        [2048, 4096, 6144, 4096, 2048],
        [0, 6144, 8192, 4096, 0],
        [4096, 6144, 6144, 2048, 0],
        [0, 2048, 14336, 2048, 0],
        [2048, 2048, 10240, 2048, 2048],
        [0, 4096, 10240, 4096, 0],
        [4096, 4096, 8192, 2048, 0],
        [0, 8192, 8192, 2048, 0],
    ],
    &[
        [1024, 2048, 4096, 6144, 4096],
        [4096, 6144, 4096, 2048, 1024],
        [0, 4096, 12288, 2048, 0],
        [2048, 4096, 8192, 2048, 2048],
        [0, 2048, 16384, 2048, 0],
        [4096, 8192, 4096, 2048, 0],
        [2048, 8192, 6144, 2048, 0],
        [0, 6144, 10240, 0, 0],
        [2048, 2048, 12288, 2048, 0],
        [0, 2048, 12288, 4096, 0],
        [4096, 4096, 6144, 2048, 0],
        [0, 4096, 14336, 0, 0],
        [2048, 6144, 6144, 2048, 0],
        [0, 8192, 6144, 2048, 0],
        [4096, 2048, 8192, 2048, 0],
        [0, 4096, 8192, 4096, 0],
    ],
];

/// `SKP_Silk_PERIndex` -> LTP scaling factors Q14, one of three predictor
/// gain scale settings selected per frame.
pub const LTP_SCALE_FACTORS_Q14: [i32; 3] = [15565, 12288, 8192];

/// Minimum pitch lag in ms, used as `min_lag = PITCH_EST_MIN_LAG_MS * fs_kHz`.
pub const PITCH_EST_MIN_LAG_MS: i32 = 2;
pub const PITCH_EST_MAX_LAG_MS: i32 = 18;

/// Stage-2 (8 kHz, smaller codebook) contour table: `[contour_index][subframe]`.
pub const CB_LAGS_STAGE2: [[i32; 4]; 3] =
    [[0, 0, 0, 0], [1, 0, 0, -1], [-1, 0, 0, 1]];

/// Stage-3 (12/16/24 kHz) contour table: `[contour_index][subframe]`.
pub const CB_LAGS_STAGE3: [[i32; 4]; 11] = [
    [0, 0, 0, 0],
    [2, 1, 0, -1],
    [-1, 0, 1, 2],
    [1, 1, 0, 0],
    [0, 0, -1, -1],
    [2, 0, -1, -2],
    [-2, -1, 0, 2],
    [1, 0, 0, -1],
    [-1, 0, 0, 1],
    [3, 1, -1, -3],
    [-3, -1, 1, 3],
];

pub fn contour_table(fs_khz: u32) -> &'static [[i32; 4]] {
    if fs_khz == 8 { &CB_LAGS_STAGE2 } else { &CB_LAGS_STAGE3 }
}
