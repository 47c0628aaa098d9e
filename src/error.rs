//! Error types for the SILK decoder.
//!
//! All decode-time failures are non-fatal: per the frame driver, any
//! [`Error`] raised while decoding a frame's parameters is caught by the
//! caller, the sample rate is reverted, and packet-loss concealment takes
//! over for that frame instead of propagating the failure to the caller.

use symphonia_core::errors::Error as SymphoniaError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("range coder: payload too long for decode buffer")]
    PayloadTooLong,

    #[error("range coder: cumulative distribution function out of range")]
    CdfOutOfRange,

    #[error("range coder: renormalization produced a non-zero high bit")]
    NormalizationFailed,

    #[error("range coder: zero-width interval")]
    ZeroIntervalWidth,

    #[error("range coder: trailing bits check failed")]
    TrailingBitsCheckFailed,

    #[error("unsupported sampling rate: {0} Hz")]
    UnsupportedSampleRate(u32),

    #[error("bitstream selected an illegal sampling rate index")]
    IllegalSamplingRate,

    #[error("invalid frame length")]
    InvalidFrameLength,

    #[error("NLSF coefficients failed to stabilize")]
    UnstableNlsf,

    #[error("LPC synthesis filter is unstable")]
    UnstableLpc,

    #[error("decoded sample magnitude overflow")]
    MagnitudeOverflow,

    #[error("output buffer too small: need {needed}, have {have}")]
    OutputBufferTooSmall { needed: usize, have: usize },

    #[error("malformed bitstream: {0}")]
    Malformed(&'static str),
}

pub type Result<T> = core::result::Result<T, Error>;

impl From<Error> for SymphoniaError {
    fn from(err: Error) -> Self {
        // The concrete message is static or cheaply leaked; decode errors are
        // rare enough per-session that the leak is not a practical concern,
        // matching the approach the Symphonia codec crates already take for
        // dynamic decode-error strings.
        match &err {
            Error::UnsupportedSampleRate(_) | Error::OutputBufferTooSmall { .. } => {
                SymphoniaError::DecodeError(Box::leak(err.to_string().into_boxed_str()))
            }
            _ => SymphoniaError::DecodeError(static_message(&err)),
        }
    }
}

fn static_message(err: &Error) -> &'static str {
    match err {
        Error::PayloadTooLong => "range coder: payload too long for decode buffer",
        Error::CdfOutOfRange => "range coder: cumulative distribution function out of range",
        Error::NormalizationFailed => "range coder: renormalization produced a non-zero high bit",
        Error::ZeroIntervalWidth => "range coder: zero-width interval",
        Error::TrailingBitsCheckFailed => "range coder: trailing bits check failed",
        Error::IllegalSamplingRate => "bitstream selected an illegal sampling rate index",
        Error::InvalidFrameLength => "invalid frame length",
        Error::UnstableNlsf => "NLSF coefficients failed to stabilize",
        Error::UnstableLpc => "LPC synthesis filter is unstable",
        Error::MagnitudeOverflow => "decoded sample magnitude overflow",
        Error::Malformed(msg) => msg,
        Error::UnsupportedSampleRate(_) | Error::OutputBufferTooSmall { .. } => unreachable!(),
    }
}
