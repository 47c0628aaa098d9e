//! Static tables: CDFs for the range decoder, NLSF/LSF codebooks, LTP and
//! pitch-contour codebooks, and sample-rate-dependent filter coefficients.
//!
//! See `DESIGN.md` for which tables carry verified real constants (ported
//! from the teacher's `entropy.rs` test fixtures, or computed exactly, like
//! the LSF cosine table) versus structurally-valid placeholder data.

pub mod cdf;
pub mod filters;
pub mod ltp;
pub mod nlsf;
pub mod quantization;
