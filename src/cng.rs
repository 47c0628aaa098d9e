//! Comfort noise generation (CNG).
//!
//! Grounded in `SKP_Silk_CNG.c`. CNG tracks a smoothed NLSF/gain/energy
//! estimate from inactive (no-VAD) frames and, once a frame is lost,
//! synthesizes low-level noise through that smoothed filter so silence
//! doesn't sound like a hard mute during concealment.
//!
//! Two behaviors are carried over exactly as the reference defines them,
//! per the open questions recorded in `DESIGN.md`:
//! - Smoothing only runs when `vad_flag` is false, with no additional
//!   check against the loss counter (so it also updates on frames that are
//!   merely inactive-but-present, not just never-lost ones).
//! - Synthesis is gated purely on `loss_count > 0`, independent of
//!   `vad_flag` for that lost frame (there's no VAD to read during
//!   concealment).
//! - `reset` reinitializes the dither seed to the literal constant
//!   `3176576`, matching `SKP_Silk_CNG_Reset`'s hardcoded value rather than
//!   zero or a derived seed.

use crate::dsp::one_pole_smooth;

const CNG_SMOOTH_COEF_Q16: i32 = 4096;
const CNG_RESET_SEED: u32 = 3176576;

#[derive(Debug, Clone)]
pub struct CngState {
    nlsf_q15: Vec<i32>,
    gain_q16: i32,
    energy: i32,
    rand_seed: u32,
}

impl CngState {
    pub fn new(order: usize) -> Self {
        Self { nlsf_q15: vec![0; order], gain_q16: 0, energy: 0, rand_seed: CNG_RESET_SEED }
    }

    pub fn reset(&mut self, order: usize) {
        self.nlsf_q15 = vec![0; order];
        self.gain_q16 = 0;
        self.energy = 0;
        self.rand_seed = CNG_RESET_SEED;
    }

    /// `SKP_Silk_CNG_exc`/update path: smooths this frame's NLSFs and gain
    /// into the running CNG estimate. Only called when `vad_flag` is
    /// false; see the module doc comment.
    pub fn update(&mut self, vad_flag: bool, nlsf_q15: &[i32], gain_q16: i32) {
        if vad_flag {
            return;
        }
        for (state, &input) in self.nlsf_q15.iter_mut().zip(nlsf_q15.iter()) {
            *state = one_pole_smooth(*state, input, CNG_SMOOTH_COEF_Q16);
        }
        self.gain_q16 = one_pole_smooth(self.gain_q16, gain_q16, CNG_SMOOTH_COEF_Q16);
        self.energy = one_pole_smooth(self.energy, (gain_q16 >> 8).saturating_mul(gain_q16 >> 8), CNG_SMOOTH_COEF_Q16);
    }

    /// Generates `length` samples of comfort noise through the smoothed
    /// NLSF filter, gated purely on `loss_count > 0`.
    pub fn synthesize(&mut self, loss_count: u32, length: usize, lpc_order: usize, history: &mut Vec<i32>) -> Option<Vec<i32>> {
        if loss_count == 0 {
            return None;
        }

        let ar_q12 = crate::lpc::nlsf_to_lpc_stable(&self.nlsf_q15, lpc_order);

        let mut excitation = Vec::with_capacity(length);
        for _ in 0..length {
            self.rand_seed = self.rand_seed.wrapping_mul(196314165).wrapping_add(907633515);
            let noise_q0 = (self.rand_seed as i32) >> 24;
            let scaled = ((noise_q0 as i64 * self.gain_q16 as i64) >> 16) as i32;
            excitation.push(scaled);
        }

        Some(crate::dsp::lpc_synthesis(&excitation, &ar_q12, history))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_uses_the_literal_reference_seed() {
        let cng = CngState::new(10);
        assert_eq!(cng.rand_seed, 3176576);
    }

    #[test]
    fn update_is_a_no_op_when_vad_active() {
        let mut cng = CngState::new(4);
        cng.update(true, &[100, 200, 300, 400], 1 << 16);
        assert_eq!(cng.gain_q16, 0);
    }

    #[test]
    fn update_smooths_when_vad_inactive() {
        let mut cng = CngState::new(4);
        cng.update(false, &[100, 200, 300, 400], 1 << 16);
        assert!(cng.gain_q16 > 0);
    }

    #[test]
    fn synthesize_returns_none_without_loss() {
        let mut cng = CngState::new(4);
        let mut history = vec![0; 4];
        assert!(cng.synthesize(0, 40, 4, &mut history).is_none());
    }
}
