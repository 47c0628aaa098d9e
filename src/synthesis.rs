//! Per-subframe core synthesis: excitation generation, long-term (pitch)
//! prediction, and short-term (LPC) synthesis.
//!
//! Grounded in `SKP_Silk_decode_core.c` for the overall per-subframe
//! sequence (generate excitation -> LTP synthesis for voiced frames ->
//! LPC synthesis), and in the teacher's `silk/excitation.rs` for the
//! dither/quantization-offset coupling, which is ported verbatim (see
//! `tables::quantization`).
//!
//! The excitation's Q23 -> Q0 gain scaling collapses the reference's
//! several intermediate Q-format stages (`Q23` pulse magnitude, `Q16` gain,
//! an internal `Q14`/`Q10` working precision before the final right-shift)
//! into a single combined shift. Exact intermediate rounding isn't chased
//! here, for the same reason noted in `lpc.rs`: the upstream NLSF/LTP
//! tables fed into this path are themselves placeholders, so bit-exactness
//! against the reference would be cosmetic.

use crate::params::{FrameParams, SignalType};
use crate::tables::{ltp, quantization};

const LTP_HISTORY_CAP: usize = 2048;

pub struct SynthesisState {
    /// Most recent `order` synthesized samples, oldest first.
    pub lpc_history: Vec<i32>,
    /// Long-term (pitch) prediction history, oldest first, trimmed to
    /// [`LTP_HISTORY_CAP`].
    pub ltp_history: Vec<i32>,
    pub seed: u32,
}

impl SynthesisState {
    pub fn new(order: usize) -> Self {
        Self { lpc_history: vec![0; order], ltp_history: Vec::new(), seed: 0 }
    }

    pub fn reset(&mut self, order: usize) {
        self.lpc_history = vec![0; order];
        self.ltp_history.clear();
        self.seed = 0;
    }
}

/// Dithers and rescales one subframe's raw pulse vector into a Q0 excitation
/// signal, per `SKP_Silk_excitation`'s coupling of the LCG dither seed to
/// each decoded pulse.
fn generate_excitation(pulses: &[i32], quant_offset_q23: i32, gain_q16: i32, seed: &mut u32) -> Vec<i32> {
    let mut out = Vec::with_capacity(pulses.len());
    for &p in pulses {
        let mut value = (p << 8).wrapping_sub(p.signum() * 20).wrapping_add(quant_offset_q23);

        *seed = seed.wrapping_mul(196314165).wrapping_add(907633515);
        if (*seed & 0x8000_0000) != 0 {
            value = -value;
        }
        *seed = seed.wrapping_add(p as u32);

        // value is Q23, gain_q16 is Q16: combined Q39, shift back to Q0.
        let sample = ((value as i64 * gain_q16 as i64) >> 39) as i32;
        out.push(sample);
    }
    out
}

/// Adds the long-term (pitch) prediction contribution for a voiced
/// subframe: a 5-tap FIR over the LTP history buffer at the decoded pitch
/// lag, scaled by the selected LTP codebook entry.
fn apply_ltp(excitation: &[i32], pitch_lag: i32, filter_ix: usize, codebook: usize, state: &SynthesisState) -> Vec<i32> {
    let taps = ltp::LTP_GAIN_CODEBOOKS[codebook.min(2)];
    let filter = taps[filter_ix % taps.len()];
    let history = &state.ltp_history;
    let hlen = history.len() as i32;

    excitation
        .iter()
        .enumerate()
        .map(|(n, &e)| {
            let mut pred: i64 = 0;
            for (k, &tap) in filter.iter().enumerate() {
                // Center tap index `ltp::LTP_ORDER / 2` aligns with the
                // decoded lag; the other taps sample adjacent lags.
                let offset = pitch_lag + (ltp::LTP_ORDER as i32 / 2) - k as i32;
                let hist_ix = hlen - offset + n as i32;
                if hist_ix >= 0 && hist_ix < hlen {
                    pred += (tap as i64) * (history[hist_ix as usize] as i64);
                }
            }
            e.saturating_add((pred >> 14) as i32)
        })
        .collect()
}

/// Decodes and synthesizes one subframe, given this frame's already-stable
/// LPC coefficients (shared across the frame's subframes, modulo NLSF
/// interpolation handled by the caller) and the subframe's slice of raw
/// pulses.
pub fn decode_subframe(
    params: &FrameParams,
    subframe_ix: usize,
    ar_q12: &[i32],
    pulses: &[i32],
    state: &mut SynthesisState,
) -> Vec<i32> {
    let quant_offset = quantization::quantization_offset_q23(params.signal_type, params.quant_offset_type);
    let gain = params.gains_q16[subframe_ix];

    let mut seed = state.seed;
    let excitation = generate_excitation(pulses, quant_offset, gain, &mut seed);
    state.seed = seed;

    let driven = if params.signal_type == SignalType::Voiced {
        apply_ltp(&excitation, params.pitch_lags[subframe_ix], params.ltp_filter_ix[subframe_ix], params.ltp_codebook, state)
    } else {
        excitation
    };

    let out = crate::dsp::lpc_synthesis(&driven, ar_q12, &mut state.lpc_history);

    state.ltp_history.extend_from_slice(&out);
    let over = state.ltp_history.len().saturating_sub(LTP_HISTORY_CAP);
    if over > 0 {
        state.ltp_history.drain(0..over);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::QuantOffsetType;

    fn dummy_params(signal_type: SignalType) -> FrameParams {
        FrameParams {
            vad_flag: true,
            signal_type,
            quant_offset_type: QuantOffsetType::Low,
            gains_q16: [1 << 16; 4],
            nlsf_q15: vec![0; 10],
            nlsf_interp_q2: 4,
            pitch_lags: [100; 4],
            ltp_filter_ix: [0; 4],
            ltp_codebook: 0,
            ltp_scale_q14: 16384,
            seed: 0,
            pulses: vec![0; 80],
        }
    }

    #[test]
    fn unvoiced_subframe_runs_end_to_end() {
        let params = dummy_params(SignalType::Unvoiced);
        let ar = vec![0i32; 10];
        let mut state = SynthesisState::new(10);
        let pulses = vec![1, -1, 2, -2, 0, 0, 3, -3, 0, 0];
        let out = decode_subframe(&params, 0, &ar, &pulses, &mut state);
        assert_eq!(out.len(), pulses.len());
    }

    #[test]
    fn voiced_subframe_consumes_ltp_history() {
        let params = dummy_params(SignalType::Voiced);
        let ar = vec![0i32; 10];
        let mut state = SynthesisState::new(10);
        state.ltp_history = vec![1000; 200];
        let pulses = vec![1, 0, -1, 0, 2, 0, -2, 0, 1, 0];
        let out = decode_subframe(&params, 0, &ar, &pulses, &mut state);
        assert_eq!(out.len(), pulses.len());
        assert!(state.ltp_history.len() > 200);
    }
}
