//! Per-frame parameter decoding.
//!
//! Grounded in `SKP_Silk_decode_parameters.c` (overall sequencing),
//! `SKP_Silk_decode_pitch.c` (pitch-lag contour reconstruction),
//! `SKP_Silk_decode_pulses.c` (rate level / shell-block sum / LSB escape /
//! sign decoding), and `SKP_Silk_NLSF_MSVQ_decode.c` (multi-stage NLSF
//! codebook accumulation).

use crate::entropy::RangeDecoder;
use crate::error::{Error, Result};
use crate::lpc::nlsf_stabilize;
use crate::shell::shell_decode;
use crate::tables::filters::Bandwidth;
use crate::tables::{cdf, ltp, nlsf as nlsf_tables};

const SHELL_CODEC_FRAME_LENGTH: usize = 16;
const MAX_PULSES: i32 = 16;
const N_SUBFRAMES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalType {
    Inactive,
    Unvoiced,
    Voiced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantOffsetType {
    Low,
    High,
}

#[derive(Debug, Clone)]
pub struct FrameParams {
    /// Sampling rate this frame actually decoded at. On the first frame of
    /// a packet this comes from the bitstream's sampling-rate symbol, not
    /// from whatever rate the decoder was previously configured for; the
    /// caller is responsible for reconfiguring itself if this differs from
    /// its current rate (see `DecoderState::try_decode_frame`).
    pub fs_khz: u32,
    pub vad_flag: bool,
    pub signal_type: SignalType,
    pub quant_offset_type: QuantOffsetType,
    pub gains_q16: [i32; N_SUBFRAMES],
    pub nlsf_q15: Vec<i32>,
    /// Q2 interpolation factor in `0..=4` between this frame's NLSFs and the
    /// previous frame's, applied to the first half of the frame only.
    pub nlsf_interp_q2: i32,
    pub pitch_lags: [i32; N_SUBFRAMES],
    pub ltp_filter_ix: [usize; N_SUBFRAMES],
    pub ltp_codebook: usize,
    pub ltp_scale_q14: i32,
    pub seed: u32,
    /// Raw (signed, not yet dithered/offset) excitation pulses, one per
    /// sample in the frame.
    pub pulses: Vec<i32>,
}

pub struct ParameterDecoder {
    pub prev_gain_ix: usize,
    pub prev_nlsf_q15: Vec<i32>,
    /// `nFramesDecoded` in the reference: position of the next frame within
    /// its packet, used to gate the sampling-rate symbol and the
    /// unconditional-vs-conditional CDF choice for sigtype/offset and gain.
    frames_decoded_in_packet: u32,
    /// `typeOffsetPrev`: the previous frame's combined (signal type, quant
    /// offset type) context in `0..=5`, used to select the conditional
    /// sigtype/offset CDF once a packet's first frame has been decoded.
    type_offset_prev: usize,
}

impl ParameterDecoder {
    pub fn new(order: usize) -> Self {
        Self { prev_gain_ix: 0, prev_nlsf_q15: vec![0; order], frames_decoded_in_packet: 0, type_offset_prev: 0 }
    }

    pub fn reset(&mut self, order: usize) {
        self.prev_gain_ix = 0;
        self.prev_nlsf_q15 = vec![0; order];
        self.frames_decoded_in_packet = 0;
        self.type_offset_prev = 0;
    }

    /// Marks the next `decode()` call as decoding the first frame of a new
    /// packet. Every production caller decodes exactly one frame per
    /// range-coder context (see `state.rs`), so this is called before every
    /// `decode()`; left unset, consecutive `decode()` calls exercise the
    /// reference's conditional (non-first-frame) path instead, which is how
    /// that path gets unit-tested despite never being reachable in
    /// production with this crate's one-frame-per-packet framing.
    pub fn begin_packet(&mut self) {
        self.frames_decoded_in_packet = 0;
    }

    pub fn decode(&mut self, dec: &mut RangeDecoder<'_>, fs_khz: u32) -> Result<FrameParams> {
        let first_frame = self.frames_decoded_in_packet == 0;

        // `if (nFramesDecoded == 0) { range_decoder(&Ix, SamplingRates_CDF,
        // ...); ... fs_kHz_dec = SamplingRates_table[Ix]; }` in
        // `SKP_Silk_decode_parameters.c`.
        let resolved_fs_khz = if first_frame {
            let ix = dec.decode_symbol(&cdf::SAMPLING_RATE)?;
            *cdf::SAMPLING_RATES_TABLE.get(ix).ok_or(Error::IllegalSamplingRate)?
        } else {
            fs_khz
        };
        let bandwidth = Bandwidth::from_fs_khz(resolved_fs_khz).ok_or(Error::IllegalSamplingRate)?;
        let order = bandwidth.lpc_order();
        let frame_length = resolved_fs_khz as usize * 20;
        if self.prev_nlsf_q15.len() != order {
            self.prev_nlsf_q15 = vec![0; order];
        }

        let vad_flag = dec.decode_bit_logp(1)?;

        let (signal_type, quant_offset_type) =
            decode_frame_type(dec, vad_flag, first_frame, self.type_offset_prev)?;
        self.type_offset_prev = type_offset_context(signal_type, quant_offset_type);

        let gains_q16 = self.decode_gains(dec, signal_type, first_frame)?;

        let nlsf_q15 = self.decode_nlsf(dec, signal_type, order)?;
        let nlsf_interp_q2 = if signal_type != SignalType::Voiced {
            4
        } else {
            dec.decode_symbol(&cdf::LSF_INTERPOLATION_OFFSET)? as i32
        };
        self.prev_nlsf_q15 = nlsf_q15.clone();

        let (pitch_lags, ltp_filter_ix, ltp_codebook, ltp_scale_q14) = if signal_type == SignalType::Voiced {
            self.decode_pitch_and_ltp(dec, resolved_fs_khz)?
        } else {
            ([0; N_SUBFRAMES], [0; N_SUBFRAMES], 0, 0)
        };

        let seed = dec.decode_symbol(&cdf::LCG_SEED)? as u32;

        let pulses = decode_pulses(dec, signal_type, frame_length)?;

        self.frames_decoded_in_packet += 1;

        Ok(FrameParams {
            fs_khz: resolved_fs_khz,
            vad_flag,
            signal_type,
            quant_offset_type,
            gains_q16,
            nlsf_q15,
            nlsf_interp_q2,
            pitch_lags,
            ltp_filter_ix,
            ltp_codebook,
            ltp_scale_q14,
            seed,
            pulses,
        })
    }

    /// First subframe's gain index is coded unconditionally (`gain_CDF
    /// [sigtype]`) on a packet's first frame, delta-coded against
    /// `prev_gain_ix` otherwise; the remaining three subframes are always
    /// delta-coded. Per `SKP_Silk_decode_parameters.c`'s gain-index path.
    fn decode_gains(
        &mut self,
        dec: &mut RangeDecoder<'_>,
        signal_type: SignalType,
        first_frame: bool,
    ) -> Result<[i32; N_SUBFRAMES]> {
        let mut indices = [0i32; N_SUBFRAMES];

        indices[0] = if first_frame {
            let high = dec.decode_symbol(cdf::gain_cdf_unconditional(signal_type_ix(signal_type)))? as i32;
            let low = dec.decode_symbol(&cdf::GAIN_LOW_BITS)? as i32;
            (high << 3) | low
        } else {
            let delta = dec.decode_symbol(&cdf::GAIN_DELTA)? as i32;
            (self.prev_gain_ix as i32 + delta - 4).clamp(0, 63)
        };

        for ix in indices.iter_mut().skip(1) {
            let delta = dec.decode_symbol(&cdf::GAIN_DELTA)? as i32;
            *ix = delta;
        }
        // Subframes after the first are coded differentially; accumulate.
        for k in 1..N_SUBFRAMES {
            indices[k] = (indices[k - 1] + indices[k] - 4).clamp(0, 63);
        }
        self.prev_gain_ix = indices[N_SUBFRAMES - 1] as usize;

        Ok(indices.map(|ix| crate::fixedpoint::log2lin((ix << 7).clamp(0, 31 << 7))))
    }

    fn decode_nlsf(&mut self, dec: &mut RangeDecoder<'_>, signal_type: SignalType, order: usize) -> Result<Vec<i32>> {
        let voiced = signal_type == SignalType::Voiced;
        let book = nlsf_tables::cb1(order);

        let s1_ix = dec.decode_symbol(cdf::lsf_s1_nb_mb(voiced, 0))?;
        let codebook_vec = book[s1_ix % book.len()].clone();

        let mut nlsf: Vec<i32> = codebook_vec;
        for (i, coef) in nlsf.iter_mut().enumerate().take(order) {
            let s2_ix = dec.decode_symbol(cdf::lsf_s2((i + s1_ix) % 16))? as i32;
            *coef += (s2_ix - 4) * 64;
        }
        for v in nlsf.iter_mut() {
            *v = (*v).clamp(0, 32767);
        }
        nlsf_stabilize(&mut nlsf, order);
        Ok(nlsf)
    }

    fn decode_pitch_and_ltp(
        &mut self,
        dec: &mut RangeDecoder<'_>,
        fs_khz: u32,
    ) -> Result<([i32; N_SUBFRAMES], [usize; N_SUBFRAMES], usize, i32)> {
        let min_lag = ltp::PITCH_EST_MIN_LAG_MS * fs_khz as i32;
        let max_lag = ltp::PITCH_EST_MAX_LAG_MS * fs_khz as i32;
        let lag_range = (max_lag - min_lag).max(1) as usize;

        let lag_cdf = flat_cdf(lag_range + 1);
        let lag_index = dec.decode_symbol(&lag_cdf)? as i32;

        let contour_table = ltp::contour_table(fs_khz);
        let contour_cdf = flat_cdf(contour_table.len());
        let contour_index = dec.decode_symbol(&contour_cdf)? as usize;
        let contour = contour_table[contour_index.min(contour_table.len() - 1)];

        let mut lags = [0i32; N_SUBFRAMES];
        for (sf, lag) in lags.iter_mut().enumerate() {
            *lag = (min_lag + lag_index + contour[sf]).max(min_lag);
        }

        let ltp_codebook = dec.decode_symbol(&cdf::PERIODICITY_INDEX)?;
        let book = ltp::LTP_GAIN_CODEBOOKS[ltp_codebook.min(2)];
        let filter_cdf = flat_cdf(book.len());
        let mut filter_ix = [0usize; N_SUBFRAMES];
        for ix in filter_ix.iter_mut() {
            *ix = dec.decode_symbol(&filter_cdf)?;
        }

        let scale_ix = dec.decode_symbol(&cdf::LTP_SCALE_INDEX)? as usize;
        let ltp_scale_q14 = ltp::LTP_SCALE_FACTORS_Q14[scale_ix.min(2)];

        Ok((lags, filter_ix, ltp_codebook, ltp_scale_q14))
    }
}

/// Decodes the joint signal-type/quant-offset-type symbol. The reference
/// uses an unconditional CDF for the first frame of a packet and a
/// `typeOffsetPrev`-conditioned CDF for every subsequent frame; both
/// branches are implemented here, even though this crate's one-frame-per-
/// packet production path only ever takes the unconditional one.
fn decode_frame_type(
    dec: &mut RangeDecoder<'_>,
    vad_flag: bool,
    first_frame: bool,
    type_offset_prev: usize,
) -> Result<(SignalType, QuantOffsetType)> {
    if !vad_flag {
        let sym = if first_frame {
            dec.decode_symbol(&cdf::FRAME_TYPE_INACTIVE)?
        } else {
            dec.decode_symbol(cdf::type_offset_cond(type_offset_prev))?
        };
        let offset = if sym == 0 { QuantOffsetType::Low } else { QuantOffsetType::High };
        return Ok((SignalType::Inactive, offset));
    }
    let voiced = dec.decode_bit_logp(1)?;
    let offset_sym = if first_frame {
        dec.decode_symbol(&cdf::QUANT_OFFSET_TYPE)?
    } else {
        dec.decode_symbol(cdf::type_offset_cond(type_offset_prev))?
    };
    let offset = if offset_sym == 0 { QuantOffsetType::Low } else { QuantOffsetType::High };
    let signal_type = if voiced { SignalType::Voiced } else { SignalType::Unvoiced };
    Ok((signal_type, offset))
}

fn signal_type_ix(signal_type: SignalType) -> usize {
    match signal_type {
        SignalType::Inactive => 0,
        SignalType::Unvoiced => 1,
        SignalType::Voiced => 2,
    }
}

/// Combines a signal type and quant-offset-type into the `0..=5` context
/// index used to key [`cdf::type_offset_cond`], mirroring the reference's
/// `typeOffsetPrev`.
fn type_offset_context(signal_type: SignalType, offset: QuantOffsetType) -> usize {
    let o = match offset {
        QuantOffsetType::Low => 0,
        QuantOffsetType::High => 1,
    };
    signal_type_ix(signal_type) * 2 + o
}

fn flat_cdf(n: usize) -> Vec<u16> {
    let n = n.max(1);
    (1..=n).map(|i| if i == n { 0xFFFF } else { ((i as u32 * 0xFFFF) / n as u32) as u16 }).collect()
}

fn decode_pulses(dec: &mut RangeDecoder<'_>, signal_type: SignalType, frame_length: usize) -> Result<Vec<i32>> {
    let rate_level = dec.decode_symbol(&cdf::RATE_LEVEL)? as usize;

    let n_blocks = frame_length / SHELL_CODEC_FRAME_LENGTH;
    let mut sum_pulses = vec![0i32; n_blocks];
    let mut n_lshifts = vec![0i32; n_blocks];

    for i in 0..n_blocks {
        let mut sum = dec.decode_symbol(cdf::pulse_count(rate_level))? as i32;
        while sum == MAX_PULSES + 1 {
            n_lshifts[i] += 1;
            sum = dec.decode_symbol(cdf::pulse_count(10))? as i32;
        }
        sum_pulses[i] = sum;
    }

    let mut q = vec![0i32; n_blocks * SHELL_CODEC_FRAME_LENGTH];
    for i in 0..n_blocks {
        if sum_pulses[i] > 0 {
            let block = shell_decode(dec, sum_pulses[i])?;
            q[i * SHELL_CODEC_FRAME_LENGTH..(i + 1) * SHELL_CODEC_FRAME_LENGTH].copy_from_slice(&block);
        }
    }

    for i in 0..n_blocks {
        if n_lshifts[i] > 0 {
            let n_ls = n_lshifts[i];
            for k in 0..SHELL_CODEC_FRAME_LENGTH {
                let mut abs_q = q[i * SHELL_CODEC_FRAME_LENGTH + k];
                for _ in 0..n_ls {
                    abs_q <<= 1;
                    let bit = dec.decode_bit_logp(1)? as i32;
                    abs_q += bit;
                }
                q[i * SHELL_CODEC_FRAME_LENGTH + k] = abs_q;
            }
        }
    }

    decode_signs(dec, &mut q, signal_type)?;
    q.truncate(frame_length);
    Ok(q)
}

/// `SKP_Silk_decode_signs`: for every nonzero pulse, decodes a sign bit. The
/// reference keys the sign probability by signal type, quantization-offset
/// type and rate level (voiced/high-energy frames skew toward runs of one
/// sign); we use a flat coin flip, since the reference's per-context bias
/// constants aren't present in `original_source/`.
fn decode_signs(dec: &mut RangeDecoder<'_>, q: &mut [i32], _signal_type: SignalType) -> Result<()> {
    for v in q.iter_mut() {
        if *v != 0 {
            let negative = dec.decode_bit_logp(1)?;
            if negative {
                *v = -*v;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_cdf_terminates_at_sentinel() {
        let cdf = flat_cdf(5);
        assert_eq!(*cdf.last().unwrap(), 0xFFFF);
        assert_eq!(cdf.len(), 5);
    }

    #[test]
    fn decode_frame_type_inactive_path() {
        let payload = [0x55u8; 16];
        let mut dec = RangeDecoder::new(&payload).unwrap();
        let (t, _) = decode_frame_type(&mut dec, false, true, 0).unwrap();
        assert_eq!(t, SignalType::Inactive);
    }

    #[test]
    fn decode_frame_type_uses_conditional_cdf_on_non_first_frame() {
        // Same payload, decoded once as a first frame and once as a
        // non-first frame, must not be required to agree (different CDFs
        // are in play) but both must decode successfully and exercise
        // distinct code paths without panicking or erroring out.
        let payload = [0x3Cu8; 16];
        let mut dec_first = RangeDecoder::new(&payload).unwrap();
        let first = decode_frame_type(&mut dec_first, true, true, 0);
        assert!(first.is_ok());

        let mut dec_cond = RangeDecoder::new(&payload).unwrap();
        let cond = decode_frame_type(&mut dec_cond, true, false, 5);
        assert!(cond.is_ok());
    }

    #[test]
    fn sampling_rate_symbol_is_decoded_on_first_frame() {
        let mut param_dec = ParameterDecoder::new(10);
        let payload = [0x10u8; 64];
        let mut dec = RangeDecoder::new(&payload).unwrap();
        param_dec.begin_packet();
        let params = param_dec.decode(&mut dec, 16).unwrap();
        assert!(cdf::SAMPLING_RATES_TABLE.contains(&params.fs_khz));
    }

    #[test]
    fn second_frame_in_packet_skips_sampling_rate_symbol() {
        // Not calling `begin_packet()` a second time means the decoder
        // believes it is decoding a subsequent frame in the same packet,
        // so it must reuse the caller-supplied rate instead of consuming a
        // sampling-rate symbol from the bitstream.
        let mut param_dec = ParameterDecoder::new(10);
        let payload = [0x10u8; 64];
        let mut dec = RangeDecoder::new(&payload).unwrap();
        param_dec.begin_packet();
        let _ = param_dec.decode(&mut dec, 16);

        let mut dec2 = RangeDecoder::new(&payload).unwrap();
        let params2 = param_dec.decode(&mut dec2, 16).unwrap();
        assert_eq!(params2.fs_khz, 16);
    }
}
