//! Shell pulse-vector decoder.
//!
//! Grounded in `SKP_Silk_shell_coder.c`: one shell-code frame always covers
//! exactly 16 pulse-count "leaves", combined pairwise up a 4-level binary
//! tree (16->8->4->2->1). Decoding walks the tree top-down with
//! `decode_split`, in the exact traversal order the reference uses so that
//! range-coder state consumption matches bit-for-bit (the tree shape and
//! traversal order are structural, not data-dependent, so this part is
//! exact regardless of the split-CDF placeholder note below).
//!
//! Each split of `p` pulses into two children is drawn from a dedicated CDF
//! indexed by `p` (the reference's `SKP_Silk_shell_code_table_offsets`
//! picks one of four tables by tree level, then offsets into it by `p`).
//! The reference's exact per-`p` frequencies are not present in
//! `original_source/`; [`split_cdf`] instead builds the info-theoretically
//! natural model for this situation — a `Binomial(p, 1/2)` distribution,
//! since each of the `p` unit pulses independently lands in the left or
//! right half of the block with equal probability. This is flagged as a
//! placeholder (real SILK almost certainly uses empirically-trained
//! frequencies instead) in `DESIGN.md`.

use crate::entropy::RangeDecoder;
use crate::error::Result;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;

const SHELL_CODEC_FRAME_LENGTH: usize = 16;

fn binomial_coefficients(p: usize) -> Vec<u64> {
    let mut row = vec![1u64; p + 1];
    for k in 1..=p {
        row[k] = row[k - 1] * (p - k + 1) as u64 / k as u64;
    }
    row
}

static SPLIT_CDF_CACHE: Lazy<Mutex<HashMap<usize, Vec<u16>>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Builds (and caches) the Q16 cumulative distribution for splitting `p`
/// pulses into two children, over `child1 in 0..=p`.
fn split_cdf(p: usize) -> Vec<u16> {
    if let Some(cached) = SPLIT_CDF_CACHE.lock().unwrap().get(&p) {
        return cached.clone();
    }

    let coefs = binomial_coefficients(p);
    let total: u64 = coefs.iter().sum();
    let mut cumulative = 0u64;
    let mut cdf = Vec::with_capacity(p + 1);
    for (i, &c) in coefs.iter().enumerate() {
        cumulative += c;
        let scaled = ((cumulative * 0xFFFF) / total) as u16;
        cdf.push(if i == coefs.len() - 1 { 0xFFFF } else { scaled });
    }
    SPLIT_CDF_CACHE.lock().unwrap().insert(p, cdf.clone());
    cdf
}

fn decode_split(dec: &mut RangeDecoder<'_>, p: i32) -> Result<(i32, i32)> {
    if p > 0 {
        let cdf = split_cdf(p as usize);
        let child1 = dec.decode_symbol(&cdf)? as i32;
        Ok((child1, p - child1))
    } else {
        Ok((0, 0))
    }
}

/// `SKP_Silk_shell_decoder`: decodes one 16-pulse shell-code frame given the
/// total pulse count `pulses4` for the block.
pub fn shell_decode(dec: &mut RangeDecoder<'_>, pulses4: i32) -> Result<[i32; SHELL_CODEC_FRAME_LENGTH]> {
    let mut pulses1 = [0i32; 8];
    let mut pulses2 = [0i32; 4];
    let mut pulses3 = [0i32; 2];
    let mut pulses0 = [0i32; SHELL_CODEC_FRAME_LENGTH];

    let (p3_0, p3_1) = decode_split(dec, pulses4)?;
    pulses3[0] = p3_0;
    pulses3[1] = p3_1;

    let (p2_0, p2_1) = decode_split(dec, pulses3[0])?;
    pulses2[0] = p2_0;
    pulses2[1] = p2_1;

    let (p1_0, p1_1) = decode_split(dec, pulses2[0])?;
    pulses1[0] = p1_0;
    pulses1[1] = p1_1;
    let (p0_0, p0_1) = decode_split(dec, pulses1[0])?;
    pulses0[0] = p0_0;
    pulses0[1] = p0_1;
    let (p0_2, p0_3) = decode_split(dec, pulses1[1])?;
    pulses0[2] = p0_2;
    pulses0[3] = p0_3;

    let (p1_2, p1_3) = decode_split(dec, pulses2[1])?;
    pulses1[2] = p1_2;
    pulses1[3] = p1_3;
    let (p0_4, p0_5) = decode_split(dec, pulses1[2])?;
    pulses0[4] = p0_4;
    pulses0[5] = p0_5;
    let (p0_6, p0_7) = decode_split(dec, pulses1[3])?;
    pulses0[6] = p0_6;
    pulses0[7] = p0_7;

    let (p2_2, p2_3) = decode_split(dec, pulses3[1])?;
    pulses2[2] = p2_2;
    pulses2[3] = p2_3;

    let (p1_4, p1_5) = decode_split(dec, pulses2[2])?;
    pulses1[4] = p1_4;
    pulses1[5] = p1_5;
    let (p0_8, p0_9) = decode_split(dec, pulses1[4])?;
    pulses0[8] = p0_8;
    pulses0[9] = p0_9;
    let (p0_10, p0_11) = decode_split(dec, pulses1[5])?;
    pulses0[10] = p0_10;
    pulses0[11] = p0_11;

    let (p1_6, p1_7) = decode_split(dec, pulses2[3])?;
    pulses1[6] = p1_6;
    pulses1[7] = p1_7;
    let (p0_12, p0_13) = decode_split(dec, pulses1[6])?;
    pulses0[12] = p0_12;
    pulses0[13] = p0_13;
    let (p0_14, p0_15) = decode_split(dec, pulses1[7])?;
    pulses0[14] = p0_14;
    pulses0[15] = p0_15;

    Ok(pulses0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_cdf_is_monotonic_and_terminates_at_max() {
        let cdf = split_cdf(5);
        assert_eq!(cdf.len(), 6);
        assert_eq!(*cdf.last().unwrap(), 0xFFFF);
        for w in cdf.windows(2) {
            assert!(w[1] >= w[0]);
        }
    }

    #[test]
    fn decode_split_with_zero_pulses_is_always_zero() {
        let payload = [0u8; 8];
        let mut dec = RangeDecoder::new(&payload).unwrap();
        let (a, b) = decode_split(&mut dec, 0).unwrap();
        assert_eq!((a, b), (0, 0));
    }
}
