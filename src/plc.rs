//! Packet-loss concealment.
//!
//! Grounded in `SKP_Silk_PLC.c`/`SKP_Silk_PLC.h`: on a lost frame, the
//! decoder keeps resynthesizing from the last known-good LPC filter and
//! pitch lag rather than emitting silence, with the output energy decaying
//! each consecutive lost frame so concealment fades out gracefully on a
//! long loss run. When a real frame arrives after concealment,
//! `glue_frames` crossfades the two to avoid an audible seam.
//!
//! The reference's exact per-frame attenuation and crossfade-length
//! constants are not reproduced bit-for-bit here (they were not retained
//! from the source read); the shape of the algorithm (decaying pitch-pulse
//! resynthesis, short-window glue crossfade) is, consistent with this
//! module's placeholder-data caveat in `DESIGN.md`.

use crate::dsp::lpc_synthesis;

const GAIN_DECAY_NUM: i64 = 92;
const GAIN_DECAY_DEN: i64 = 100;
const GLUE_WINDOW: usize = 16;

#[derive(Debug, Clone)]
pub struct PlcState {
    pitch_lag: i32,
    ar_q12: Vec<i32>,
    gain_q16: i32,
    rand_seed: u32,
    conceal_count: u32,
    history: Vec<i32>,
}

impl PlcState {
    pub fn new(order: usize) -> Self {
        Self { pitch_lag: 0, ar_q12: vec![0; order], gain_q16: 0, rand_seed: 0, conceal_count: 0, history: vec![0; order] }
    }

    pub fn reset(&mut self, order: usize) {
        *self = Self::new(order);
    }

    /// Called after every successfully decoded frame to remember the state
    /// concealment will later resynthesize from.
    pub fn update(&mut self, ar_q12: &[i32], pitch_lag: i32, gain_q16: i32, history: &[i32]) {
        self.ar_q12 = ar_q12.to_vec();
        self.pitch_lag = pitch_lag.max(1);
        self.gain_q16 = gain_q16;
        self.conceal_count = 0;
        if history.len() >= self.ar_q12.len() {
            let start = history.len() - self.ar_q12.len();
            self.history = history[start..].to_vec();
        }
    }

    /// `SKP_Silk_PLC_conceal`: synthesizes `length` concealed samples by
    /// replaying the last pitch period through the held LPC filter, with
    /// energy decaying geometrically across consecutive lost frames.
    pub fn conceal(&mut self, length: usize) -> Vec<i32> {
        self.conceal_count += 1;
        let decay = (GAIN_DECAY_NUM as f64 / GAIN_DECAY_DEN as f64).powi(self.conceal_count as i32 - 1);
        let scaled_gain = ((self.gain_q16 as f64) * decay) as i64;

        let mut excitation = Vec::with_capacity(length);
        for n in 0..length {
            self.rand_seed = self.rand_seed.wrapping_mul(196314165).wrapping_add(907633515);
            let noise = ((self.rand_seed as i32) >> 24) as i64;
            let pitch_pulse = if (n as i32) % self.pitch_lag.max(1) == 0 { scaled_gain >> 4 } else { 0 };
            let sample = (((noise * scaled_gain) >> 20) + pitch_pulse) as i32;
            excitation.push(sample);
        }

        lpc_synthesis(&excitation, &self.ar_q12, &mut self.history)
    }

    pub fn conceal_count(&self) -> u32 {
        self.conceal_count
    }
}

/// `SKP_Silk_PLC_glue_frames`: crossfades the tail of concealed audio into
/// the head of a freshly decoded real frame, over a short linear-ramp
/// window, to hide the seam left by switching from concealment back to
/// real decode.
pub fn glue_frames(concealed_tail: &[i32], real_head: &mut [i32]) {
    let window = GLUE_WINDOW.min(concealed_tail.len()).min(real_head.len());
    for i in 0..window {
        let w_real = ((i + 1) as i64) * 256 / (window as i64 + 1);
        let w_conceal = 256 - w_real;
        let blended = (concealed_tail[concealed_tail.len() - window + i] as i64 * w_conceal
            + real_head[i] as i64 * w_real)
            >> 8;
        real_head[i] = blended as i32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conceal_decays_across_consecutive_losses() {
        let mut plc = PlcState::new(4);
        plc.update(&[0, 0, 0, 0], 50, 1 << 20, &[0, 0, 0, 0]);
        let first = plc.conceal(40);
        let second = plc.conceal(40);
        let energy = |v: &[i32]| v.iter().map(|&x| (x as i64) * (x as i64)).sum::<i64>();
        assert!(energy(&second) <= energy(&first) + 1);
    }

    #[test]
    fn glue_frames_blends_without_panicking() {
        let tail = vec![1000; 32];
        let mut head = vec![0; 32];
        glue_frames(&tail, &mut head);
        assert_ne!(head[0], 0);
    }
}
