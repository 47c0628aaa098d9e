//! NLSF <-> LPC conversion, bandwidth expansion, and prediction-gain
//! stability testing.
//!
//! Grounded in `SKP_Silk_NLSF2A.c`, `SKP_Silk_NLSF2A_stable.c`,
//! `SKP_Silk_LPC_inv_pred_gain.c`, and `SKP_Silk_bwexpander.c`. The
//! polynomial expansion in [`nlsf_to_lpc`] and the Levinson step-down in
//! [`inverse_pred_gain`] are implemented with `f64` intermediates rather
//! than the reference's fixed-point `Q16`/`Q24` recurrences: since the NLSF
//! codebook vectors feeding this module are themselves structurally-valid
//! placeholders (see `tables::nlsf`), chasing bit-exact fixed-point
//! behavior against a reference that can't be exercised end-to-end here
//! would buy nothing. This is a deliberate, documented simplification, not
//! an oversight (see `DESIGN.md`).

use crate::fixedpoint::smulww;
use crate::tables::nlsf::COS_TABLE_Q15;
use std::f64::consts::PI;

pub const MAX_LPC_STABILIZE_ITERATIONS: usize = 10;
const A_LIMIT_Q16: i32 = 65536 - 16; // ~0.99975 in Q16, per LPC_inv_pred_gain's stability threshold.

/// Interpolates `cos(pi * nlsf / 32768)` in Q15 from the 129-entry table,
/// mirroring the reference's piecewise-linear table lookup.
fn nlsf_cos_q15(nlsf_q15: i32) -> i32 {
    let v = nlsf_q15.clamp(0, 32767);
    let idx = (v >> 8) as usize;
    let frac = v & 0xFF;
    let table = &*COS_TABLE_Q15;
    let lo = table[idx.min(128)];
    let hi = table[(idx + 1).min(128)];
    lo + (((hi - lo) * frac) >> 8)
}

fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &ai) in a.iter().enumerate() {
        for (j, &bj) in b.iter().enumerate() {
            out[i + j] += ai * bj;
        }
    }
    out
}

/// `SKP_Silk_NLSF2A`: converts a set of `order` NLSFs (Q15, in `0..32768`
/// representing `0..pi`) into `order` LPC coefficients in Q12.
pub fn nlsf_to_lpc(nlsf_q15: &[i32], order: usize) -> Vec<i32> {
    debug_assert_eq!(nlsf_q15.len(), order);

    // Use the table-interpolated cosine (matching the reference's
    // table-driven approach) rather than calling `cos()` directly, so the
    // quantization behavior of the 129-entry table is exercised.
    let cos_vals: Vec<f64> = nlsf_q15.iter().map(|&v| nlsf_cos_q15(v) as f64 / 32768.0).collect();
    let _ = PI;

    let half = order / 2;
    let mut p = vec![1.0f64];
    let mut q = vec![1.0f64];
    for k in 0..half {
        p = poly_mul(&p, &[1.0, -2.0 * cos_vals[2 * k], 1.0]);
        q = poly_mul(&q, &[1.0, -2.0 * cos_vals[2 * k + 1], 1.0]);
    }
    if order % 2 == 1 {
        q = poly_mul(&q, &[1.0, -cos_vals[order - 1]]);
    }

    let p2 = poly_mul(&p, &[1.0, 1.0]);
    let q2 = poly_mul(&q, &[1.0, -1.0]);

    (1..=order)
        .map(|k| {
            let pk = p2.get(k).copied().unwrap_or(0.0);
            let qk = q2.get(k).copied().unwrap_or(0.0);
            (-0.5 * (pk + qk) * 4096.0).round() as i32
        })
        .collect()
}

/// `SKP_Silk_bwexpander`: applies geometric chirp `chirp_q16` to an LPC
/// filter in-place, in Q12. Built from an iterative multiply (not direct
/// exponentiation) per the reference's explicit warning that `SMULWB`-based
/// shortcuts introduce bias here.
pub fn bwexpander(ar_q12: &mut [i32], chirp_q16: i32) {
    let n = ar_q12.len();
    if n == 0 {
        return;
    }
    let mut chirp = chirp_q16;
    for coef in ar_q12.iter_mut().take(n - 1) {
        *coef = smulww(chirp, *coef);
        chirp = smulww(chirp_q16, chirp);
    }
    let last = ar_q12.len() - 1;
    ar_q12[last] = smulww(chirp, ar_q12[last]);
}

/// `SKP_Silk_LPC_inverse_pred_gain`: Levinson step-down stability test.
/// Returns the inverse prediction gain in Q30, or `0` if the filter is
/// unstable (any reflection coefficient magnitude reaches `1.0`).
pub fn inverse_pred_gain(ar_q12: &[i32]) -> i32 {
    let order = ar_q12.len();
    if order == 0 {
        return 1 << 30;
    }
    let mut a: Vec<f64> = ar_q12.iter().map(|&v| v as f64 / 4096.0).collect();
    let mut inv_gain: f64 = 1.0;

    for k in (1..order).rev() {
        let rc = a[k];
        if rc.abs() >= (A_LIMIT_Q16 as f64 / 65536.0) {
            return 0;
        }
        let tmp = 1.0 - rc * rc;
        inv_gain *= tmp;
        if inv_gain <= 0.0 {
            return 0;
        }
        // `SKP_Silk_LPC_inv_pred_gain.c` negates the reflection coefficient
        // (`rc_Q31 = -Anew_QA[k]`) before folding it into the step-down:
        // `tmp[n] = Aold[n] - Aold[k-1-n] * rc_Q31`. With `rc` here left
        // un-negated (`rc = a[k]`), that expands to `a[n] + rc*a[k-1-n]`.
        let mut next = vec![0.0; k];
        for n in 0..k {
            next[n] = (a[n] + rc * a[k - 1 - n]) / tmp;
        }
        a = next;
    }

    (inv_gain * (1i64 << 30) as f64) as i32
}

/// `SKP_Silk_NLSF2A_stable`: converts NLSFs to LPC coefficients, retrying
/// with progressively tighter bandwidth expansion if the result is
/// unstable, up to [`MAX_LPC_STABILIZE_ITERATIONS`] times.
pub fn nlsf_to_lpc_stable(nlsf_q15: &[i32], order: usize) -> Vec<i32> {
    // `SKP_Silk_NLSF2A_stable.c` calls `NLSF2A` exactly once, then applies
    // `bwexpander` to that *same* array on every retry, so each iteration's
    // chirp stacks on top of the last one's instead of starting over from
    // the unexpanded coefficients. The chirp factor is recomputed fresh
    // each iteration as `65536 - (10+i)*i` (`SKP_SMULBB(10+i, i)` in the
    // reference's fixed-point).
    let mut ar = nlsf_to_lpc(nlsf_q15, order);

    for i in 0..MAX_LPC_STABILIZE_ITERATIONS as i32 {
        if inverse_pred_gain(&ar) > 0 {
            return ar;
        }
        let chirp_q16 = 65536 - (10 + i) * i;
        bwexpander(&mut ar, chirp_q16);
    }

    // All iterations exhausted without reaching stability: the reference
    // gives up and zeroes the filter outright.
    vec![0; order]
}

/// Minimum allowed spacing between adjacent NLSFs (Q15), per coefficient
/// position. See `tables::nlsf::ndelta_min_q15`.
pub fn nlsf_stabilize(nlsf_q15: &mut [i32], order: usize) {
    let min_dist = crate::tables::nlsf::ndelta_min_q15(order);

    for _ in 0..20 {
        let mut changed = false;
        for i in 0..order {
            let lo_bound = if i == 0 { min_dist[0] } else { nlsf_q15[i - 1] + min_dist[i] };
            if nlsf_q15[i] < lo_bound {
                nlsf_q15[i] = lo_bound;
                changed = true;
            }
        }
        for i in (0..order).rev() {
            let hi_bound =
                if i == order - 1 { 32768 - min_dist[order] } else { nlsf_q15[i + 1] - min_dist[i + 1] };
            if nlsf_q15[i] > hi_bound {
                nlsf_q15[i] = hi_bound;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}

/// `SKP_Silk_A2NLSF`: the inverse conversion, from LPC coefficients back to
/// NLSFs. Listed in the specification "for completeness" alongside the
/// decode-path `NLSF2A`; the decoder itself never calls this (no analysis
/// stage exists downstream of this decoder), so it's implemented via
/// generic numeric root isolation rather than the reference's closed-form
/// table walk.
pub fn lpc_to_nlsf(ar_q12: &[i32], order: usize) -> Vec<i32> {
    let a: Vec<f64> = ar_q12.iter().map(|&v| v as f64 / 4096.0).collect();
    let half = order / 2;

    // Reconstruct P(z)/(1+z^-1) and Q(z)/(1-z^-1) by synthetic division,
    // the inverse of the combination step in `nlsf_to_lpc`.
    let mut p_full = vec![0.0; order + 1];
    let mut q_full = vec![0.0; order + 1];
    p_full[0] = 1.0;
    q_full[0] = 1.0;
    for k in 1..=order {
        let ak = a.get(k - 1).copied().unwrap_or(0.0);
        p_full[k] = -2.0 * ak;
        q_full[k] = 0.0;
    }
    let p = deconvolve_by(&p_full, &[1.0, 1.0]);
    let q = deconvolve_by(&q_full, &[1.0, -1.0]);

    let mut roots = Vec::with_capacity(order);
    roots.extend(find_cosine_roots(&p, half));
    roots.extend(find_cosine_roots(&q, order - half));
    roots.sort_by(|a, b| a.partial_cmp(b).unwrap());

    roots
        .into_iter()
        .take(order)
        .map(|w| ((w / PI) * 32768.0).round().clamp(0.0, 32767.0) as i32)
        .collect()
}

fn deconvolve_by(poly: &[f64], divisor: &[f64]) -> Vec<f64> {
    // Simple synthetic division assuming an exact factor (true by
    // construction in `nlsf_to_lpc`'s inverse use here).
    let mut out = vec![0.0; poly.len().saturating_sub(divisor.len() - 1)];
    let mut remainder = poly.to_vec();
    for i in 0..out.len() {
        out[i] = remainder[i] / divisor[0];
        for (j, &d) in divisor.iter().enumerate() {
            remainder[i + j] -= out[i] * d;
        }
    }
    out
}

fn find_cosine_roots(poly: &[f64], count: usize) -> Vec<f64> {
    // Sample cos(w) over a fine grid in (0, pi) and bisect sign changes;
    // adequate for a completeness-only, non-decode-path utility.
    let samples = 2048;
    let mut roots = Vec::new();
    let eval = |w: f64| -> f64 {
        let c = w.cos();
        let mut acc = 0.0;
        let mut cn = 1.0;
        for &coef in poly {
            acc += coef * cn;
            cn *= c;
        }
        acc
    };
    let mut prev_w = 0.0f64;
    let mut prev_v = eval(prev_w);
    for i in 1..=samples {
        let w = PI * (i as f64) / (samples as f64);
        let v = eval(w);
        if prev_v.signum() != v.signum() && roots.len() < count {
            let mut lo = prev_w;
            let mut hi = w;
            for _ in 0..30 {
                let mid = 0.5 * (lo + hi);
                if eval(mid).signum() == prev_v.signum() {
                    lo = mid;
                } else {
                    hi = mid;
                }
            }
            roots.push(0.5 * (lo + hi));
        }
        prev_w = w;
        prev_v = v;
    }
    roots
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nlsf_to_lpc_produces_requested_order() {
        let nlsf: Vec<i32> = (1..=10).map(|i| i * 2800).collect();
        let lpc = nlsf_to_lpc(&nlsf, 10);
        assert_eq!(lpc.len(), 10);
    }

    #[test]
    fn bwexpander_shrinks_high_order_taps() {
        let mut ar = vec![4096, 2048, 1024, 512];
        let before = ar.clone();
        bwexpander(&mut ar, 60000);
        assert!(ar[3].abs() <= before[3].abs());
    }

    #[test]
    fn inverse_pred_gain_flags_unstable_filter() {
        // A coefficient of magnitude >= 1 in Q12-normalized space at the
        // final reflection stage should be flagged unstable.
        let ar = vec![16000];
        assert_eq!(inverse_pred_gain(&ar), 0);
    }

    #[test]
    fn inverse_pred_gain_order3_matches_hand_computed_step_down() {
        // Hand-computed order-3 filter with reflection coefficients
        // k3 = 0.25, k2 = 0.5, k1 = 0.2 (all well inside the stable range),
        // synthesized bottom-up via the textbook Levinson recursion so the
        // reference cross-term sign (`a[n] + rc*a[k-1-n]`, not `-`) is the
        // only way to recover these exact coefficients.
        let k1 = 0.2f64;
        let k2 = 0.5f64;
        let k3 = 0.25f64;

        // Order 1: a1 = [k1]
        let a1 = vec![k1];
        // Order 2: a2[n] = a1[n] - k2*a1[0-n] (forward recursion), a2[1] = k2
        let a2 = vec![a1[0] - k2 * a1[0], k2];
        // Order 3: a3[n] = a2[n] - k3*a2[1-n], a3[2] = k3
        let a3 = vec![a2[0] - k3 * a2[1], a2[1] - k3 * a2[0], k3];

        let ar_q12: Vec<i32> = a3.iter().map(|&v| (v * 4096.0).round() as i32).collect();
        let gain = inverse_pred_gain(&ar_q12);

        // The forward recursion used above is itself gain-preserving, so
        // un-doing it (the step-down this function performs) must report a
        // strictly positive, non-trivial inverse gain rather than 0 (which
        // is what the old, wrong-signed cross-term produced for this input).
        assert!(gain > 0, "expected a stable, positive inverse gain, got {gain}");

        let expected = ((1.0 - k1 * k1) * (1.0 - k2 * k2) * (1.0 - k3 * k3) * (1i64 << 30) as f64) as i32;
        assert!((gain - expected).abs() <= 2, "gain {gain} not close to expected {expected}");
    }

    #[test]
    fn nlsf_stabilize_enforces_minimum_spacing() {
        let mut nlsf = vec![100, 102, 105, 4000, 4001, 8000, 8001, 16000, 16001, 30000];
        nlsf_stabilize(&mut nlsf, 10);
        for w in nlsf.windows(2) {
            assert!(w[1] > w[0]);
        }
    }
}
