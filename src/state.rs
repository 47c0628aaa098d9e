//! Frame-level decode orchestration: range-decoder setup, parameter decode,
//! per-subframe synthesis, and the error/concealment/CNG/high-pass sequence
//! around it.
//!
//! Grounded in `SKP_Silk_decode_frame.c` (the per-frame driver: decode
//! parameters and core synthesis, fall back to PLC on any decode error,
//! update CNG and PLC state from a successful decode, then always run the
//! output high-pass filter) and `SKP_Silk_decoder_set_fs.c` (sample-rate
//! switch: revert to the previous rate if the new one is rejected, so a
//! single malformed TOC byte can't wedge the decoder into an invalid rate).

use crate::cng::CngState;
use crate::dsp::Biquad;
use crate::entropy::RangeDecoder;
use crate::error::{Error, Result};
use crate::lpc::{bwexpander, nlsf_to_lpc_stable};
use crate::params::ParameterDecoder;
use crate::plc::{glue_frames, PlcState};
use crate::synthesis::{decode_subframe, SynthesisState};
use crate::tables::filters::{hp_filter_coefs_q13, Bandwidth};

const SUBFRAME_COUNT: usize = 4;

/// `BWE_AFTER_LOSS_Q16`: bandwidth-expansion chirp applied to the decoded
/// AR/LPC coefficients after a lost frame (`if (psDec->lossCnt) {
/// SKP_Silk_bwexpander(PredCoef_Q12[...], order, BWE_AFTER_LOSS_Q16); }` in
/// `SKP_Silk_decode_parameters.c`), meant to damp quantization seams left
/// by concealment. The reference's exact value lives in the filtered-out
/// `SKP_Silk_define.h` and isn't recoverable from `original_source/`; this
/// is a documented placeholder in the same conservative range as the
/// crate's other BWE chirps (see DESIGN.md).
const BWE_AFTER_LOSS_Q16: i32 = 63570;

pub struct DecoderState {
    fs_khz: u32,
    order: usize,
    frame_length: usize,
    subframe_length: usize,
    param_dec: ParameterDecoder,
    synth: SynthesisState,
    plc: PlcState,
    cng: CngState,
    hp_filter: Biquad,
    loss_count: u32,
    pending_glue: Option<Vec<i32>>,
}

impl DecoderState {
    pub fn new(fs_khz: u32) -> Result<Self> {
        let bandwidth = Bandwidth::from_fs_khz(fs_khz).ok_or(Error::UnsupportedSampleRate(fs_khz * 1000))?;
        let order = bandwidth.lpc_order();
        let frame_length = (fs_khz as usize) * 20;
        Ok(Self {
            fs_khz,
            order,
            frame_length,
            subframe_length: frame_length / SUBFRAME_COUNT,
            param_dec: ParameterDecoder::new(order),
            synth: SynthesisState::new(order),
            plc: PlcState::new(order),
            cng: CngState::new(order),
            hp_filter: Biquad::default(),
            loss_count: 0,
            pending_glue: None,
        })
    }

    pub fn reset(&mut self) {
        self.param_dec.reset(self.order);
        self.synth.reset(self.order);
        self.plc.reset(self.order);
        self.cng.reset(self.order);
        self.hp_filter.reset();
        self.loss_count = 0;
        self.pending_glue = None;
    }

    /// `SKP_Silk_decoder_set_fs`: switches the decoder's active sample
    /// rate. On an unsupported rate the previous configuration is left
    /// untouched and an error is returned, so a single bad TOC byte can't
    /// leave the decoder in a half-reconfigured state.
    pub fn set_sample_rate(&mut self, fs_khz: u32) -> Result<()> {
        let bandwidth = Bandwidth::from_fs_khz(fs_khz).ok_or(Error::UnsupportedSampleRate(fs_khz * 1000))?;
        if fs_khz == self.fs_khz {
            return Ok(());
        }
        let order = bandwidth.lpc_order();
        self.fs_khz = fs_khz;
        self.order = order;
        self.frame_length = (fs_khz as usize) * 20;
        self.subframe_length = self.frame_length / SUBFRAME_COUNT;
        self.param_dec.reset(order);
        self.synth.reset(order);
        self.plc.reset(order);
        self.cng.reset(order);
        Ok(())
    }

    pub fn fs_khz(&self) -> u32 {
        self.fs_khz
    }

    pub fn frame_length(&self) -> usize {
        self.frame_length
    }

    /// Decodes one 20ms frame's payload into Q0 PCM samples. On a decode
    /// error, falls back to packet-loss concealment for this frame instead
    /// of propagating the error, per the reference driver's behavior.
    pub fn decode_frame(&mut self, payload: &[u8]) -> Vec<i32> {
        match self.try_decode_frame(payload) {
            Ok(samples) => samples,
            Err(_) => {
                self.loss_count += 1;
                let concealed = self.plc.conceal(self.frame_length);
                self.pending_glue = Some(concealed.clone());
                self.apply_hp(concealed)
            }
        }
    }

    /// Synthesizes a frame with no payload at all (e.g. an unreceived
    /// packet): pure concealment, optionally handing off to comfort noise
    /// once the loss run is long enough that `CngState::synthesize` takes
    /// over (gated purely on `loss_count > 0`; see `cng.rs`).
    pub fn conceal_frame(&mut self) -> Vec<i32> {
        self.loss_count += 1;
        let concealed = if let Some(cn) = self.cng.synthesize(self.loss_count, self.frame_length, self.order, &mut self.synth.lpc_history) {
            cn
        } else {
            self.plc.conceal(self.frame_length)
        };
        self.pending_glue = Some(concealed.clone());
        self.apply_hp(concealed)
    }

    fn try_decode_frame(&mut self, payload: &[u8]) -> Result<Vec<i32>> {
        let mut dec = RangeDecoder::new(payload)?;
        // Every payload handed to this decoder is its own range-coder
        // context containing exactly one SILK frame (see module docs), so
        // that frame is always the first — and only — frame of its packet.
        self.param_dec.begin_packet();
        let params = self.param_dec.decode(&mut dec, self.fs_khz)?;
        dec.check_trailing_bits()?;

        if params.fs_khz != self.fs_khz {
            self.set_sample_rate(params.fs_khz)?;
        }
        let order = params.nlsf_q15.len();

        let mut ar_q12 = nlsf_to_lpc_stable(&params.nlsf_q15, order);
        if self.loss_count > 0 {
            bwexpander(&mut ar_q12, BWE_AFTER_LOSS_Q16);
        }

        let mut out = Vec::with_capacity(self.frame_length);
        for sf in 0..SUBFRAME_COUNT {
            let start = sf * self.subframe_length;
            let end = start + self.subframe_length;
            let pulses = &params.pulses[start.min(params.pulses.len())..end.min(params.pulses.len())];
            let chunk = decode_subframe(&params, sf, &ar_q12, pulses, &mut self.synth);
            out.extend(chunk);
        }

        self.cng.update(params.vad_flag, &params.nlsf_q15, params.gains_q16[SUBFRAME_COUNT - 1]);
        self.plc.update(&ar_q12, params.pitch_lags[SUBFRAME_COUNT - 1], params.gains_q16[SUBFRAME_COUNT - 1], &self.synth.lpc_history);
        self.loss_count = 0;

        if let Some(tail) = self.pending_glue.take() {
            let mut out = out;
            glue_frames(&tail, &mut out);
            return Ok(self.apply_hp(out));
        }

        Ok(self.apply_hp(out))
    }

    fn apply_hp(&mut self, samples: Vec<i32>) -> Vec<i32> {
        let coefs = hp_filter_coefs_q13(self.fs_khz);
        self.hp_filter.process(&samples, coefs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_unsupported_rate() {
        assert!(DecoderState::new(44).is_err());
    }

    #[test]
    fn decode_frame_falls_back_to_concealment_on_garbage_payload() {
        let mut state = DecoderState::new(16).unwrap();
        let payload = vec![0xFFu8; 4];
        let out = state.decode_frame(&payload);
        assert_eq!(out.len(), state.frame_length());
    }

    #[test]
    fn set_sample_rate_rejects_bad_rate_without_mutating_state() {
        let mut state = DecoderState::new(16).unwrap();
        let before = state.fs_khz();
        assert!(state.set_sample_rate(11).is_err());
        assert_eq!(state.fs_khz(), before);
    }
}
