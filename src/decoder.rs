//! The `symphonia_core::codecs::Decoder` implementation for the standalone
//! SKP_Silk decoder.
//!
//! Grounded in the teacher's Opus `OpusDecoder`/`silk::Decoder` wiring: a
//! lazily-built static [`CodecDescriptor`] table plus a thin struct holding
//! decode state and the most recently rendered buffer, exactly as
//! `OpusDecoder` does for its inner `silk::Decoder`. `CodecType` has no
//! public constructor in `symphonia-core` (its only field is private), so
//! there is no way to mint a dedicated SILK-standalone type code from
//! outside the crate; this decoder advertises itself under
//! [`CODEC_TYPE_OPUS`], the closest existing constant, same as the teacher
//! repo's own in-progress `silk::Decoder` stub did. See `DESIGN.md`.

use crate::state::DecoderState;
use std::sync::LazyLock;
use symphonia_core::audio::{AsAudioBufferRef, AudioBuffer, AudioBufferRef, Channels, Signal, SignalSpec};
use symphonia_core::codecs::{
    CodecDescriptor, CodecParameters, Decoder, DecoderOptions, FinalizeResult, CODEC_TYPE_OPUS,
};
use symphonia_core::errors::{unsupported_error, Result};
use symphonia_core::formats::Packet;

static SILK_CODEC_DESCRIPTOR: LazyLock<CodecDescriptor> = LazyLock::new(|| CodecDescriptor {
    codec: CODEC_TYPE_OPUS,
    short_name: "silk",
    long_name: "Standalone SKP_Silk Speech Codec",
    inst_func: |params: &CodecParameters, options: &DecoderOptions| -> Result<Box<dyn Decoder>> {
        Ok(Box::new(SilkDecoder::try_new(params, options)?))
    },
});

pub fn get_codecs() -> &'static [CodecDescriptor] {
    std::slice::from_ref(&SILK_CODEC_DESCRIPTOR)
}

pub struct SilkDecoder {
    params: CodecParameters,
    state: DecoderState,
    buf: AudioBuffer<i32>,
}

impl SilkDecoder {
    fn fs_khz_from_params(params: &CodecParameters) -> Result<u32> {
        match params.sample_rate {
            Some(8_000) => Ok(8),
            Some(12_000) => Ok(12),
            Some(16_000) => Ok(16),
            Some(24_000) => Ok(24),
            Some(other) => unsupported_error_rate(other),
            None => Ok(16),
        }
    }
}

fn unsupported_error_rate(rate: u32) -> Result<u32> {
    let _ = rate;
    unsupported_error("silk: sample rate must be one of 8000/12000/16000/24000 Hz")
}

impl Decoder for SilkDecoder {
    fn try_new(params: &CodecParameters, _options: &DecoderOptions) -> Result<Self>
    where
        Self: Sized,
    {
        let fs_khz = Self::fs_khz_from_params(params)?;
        let state = DecoderState::new(fs_khz).map_err(Into::into)?;

        let spec = SignalSpec::new(fs_khz * 1000, Channels::FRONT_LEFT);
        let buf = AudioBuffer::new(state.frame_length() as u64, spec);

        Ok(Self { params: params.clone(), state, buf })
    }

    fn supported_codecs() -> &'static [CodecDescriptor]
    where
        Self: Sized,
    {
        get_codecs()
    }

    fn reset(&mut self) {
        self.state.reset();
    }

    fn codec_params(&self) -> &CodecParameters {
        &self.params
    }

    fn decode(&mut self, packet: &Packet) -> Result<AudioBufferRef<'_>> {
        let samples = if packet.data.is_empty() {
            self.state.conceal_frame()
        } else {
            self.state.decode_frame(packet.data.as_ref())
        };

        self.buf.fill(|planes, idx| {
            planes.planes()[0][idx] = samples[idx];
            Ok(())
        })?;

        Ok(self.buf.as_audio_buffer_ref())
    }

    fn finalize(&mut self) -> FinalizeResult {
        FinalizeResult::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(rate: u32) -> CodecParameters {
        let mut p = CodecParameters::new();
        p.with_sample_rate(rate);
        p
    }

    #[test]
    fn try_new_rejects_unsupported_rate() {
        let opts = DecoderOptions::default();
        assert!(SilkDecoder::try_new(&params(44_100), &opts).is_err());
    }

    #[test]
    fn try_new_accepts_supported_rates() {
        let opts = DecoderOptions::default();
        for rate in [8_000, 12_000, 16_000, 24_000] {
            assert!(SilkDecoder::try_new(&params(rate), &opts).is_ok());
        }
    }

    #[test]
    fn decode_produces_one_frame_of_audio() {
        let opts = DecoderOptions::default();
        let mut dec = SilkDecoder::try_new(&params(16_000), &opts).unwrap();
        let packet = Packet::new_from_slice(0, 0, 0, &[0u8; 8]);
        let out = dec.decode(&packet).unwrap();
        assert_eq!(out.spec().rate, 16_000);
    }

    #[test]
    fn decode_conceals_empty_packets() {
        let opts = DecoderOptions::default();
        let mut dec = SilkDecoder::try_new(&params(16_000), &opts).unwrap();
        let packet = Packet::new_from_slice(0, 0, 0, &[]);
        assert!(dec.decode(&packet).is_ok());
    }
}
