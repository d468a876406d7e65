/*
 * // Copyright (c) Radzivon Bartoshyk 3/2025. All rights reserved.
 * //
 * // Redistribution and use in source and binary forms, with or without modification,
 * // are permitted provided that the following conditions are met:
 * //
 * // 1.  Redistributions of source code must retain the above copyright notice, this
 * // list of conditions and the following disclaimer.
 * //
 * // 2.  Redistributions in binary form must reproduce the above copyright notice,
 * // this list of conditions and the following disclaimer in the documentation
 * // and/or other materials provided with the distribution.
 * //
 * // 3.  Neither the name of the copyright holder nor the names of its
 * // contributors may be used to endorse or promote products derived from
 * // this software without specific prior written permission.
 * //
 * // THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS"
 * // AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE
 * // IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
 * // DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE
 * // FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL
 * // DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
 * // SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER
 * // CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY,
 * // OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
 * // OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.
 */

//! Least-squares approximation of tabulated tone curves with a single
//! seven parameter transfer function. The curve splits into a linear head
//! solved by ordinary least squares and a power tail refined with
//! Gauss-Newton, the offset `e` being anchored so both branches meet at `d`.

use crate::err::CmsError;
use crate::matrix::{Matrix3d, Vector3d};
use crate::trc::{Curve, TransferFunction};
use pxfm::{f_exp, f_log, f_pow};

const FIT_TOLERANCE: f32 = 1. / 512.;
const STEP_TOLERANCE: f64 = 1. / 16384.;
const MAX_GAUSS_NEWTON_STEPS: usize = 40;
const NO_IMPROVEMENT_LIMIT: usize = 3;

/// Approximates a tabulated curve, returning the fitted function and its
/// maximum absolute error over the samples. Parametric curves are already
/// in that form and are rejected.
pub fn approximate_curve(curve: &Curve) -> Result<(TransferFunction, f32), CmsError> {
    let entries = curve.table_entries();
    if entries < 2 {
        return Err(CmsError::UnsupportedFeature);
    }
    let mut xs = Vec::with_capacity(entries);
    let mut ts = Vec::with_capacity(entries);
    for i in 0..entries {
        let x = i as f32 / (entries - 1) as f32;
        xs.push(x);
        ts.push(curve.eval(x));
    }
    approximate_samples(&xs, &ts)
}

pub(crate) fn approximate_samples(
    xs: &[f32],
    ts: &[f32],
) -> Result<(TransferFunction, f32), CmsError> {
    let n = xs.len();
    if n < 2 || n != ts.len() {
        return Err(CmsError::UnsupportedFeature);
    }
    if ts.windows(2).any(|w| w[1] < w[0]) {
        return Err(CmsError::ArithmeticFailure);
    }

    if let Some(linear) = try_pure_linear(xs, ts) {
        let err = max_error(&linear, xs, ts);
        if err < FIT_TOLERANCE {
            return Ok((linear, err));
        }
    }

    // A handful of deterministic split candidates: the residual scan plus
    // the exact linear-prefix growth at a few tolerances. The winner is
    // whichever full fit ends up with the smallest max error.
    let mut candidates = [
        choose_split(xs, ts),
        fit_linear_prefix(xs, ts, 1. / 16384.),
        fit_linear_prefix(xs, ts, 1. / 4096.),
        fit_linear_prefix(xs, ts, 1. / 256.),
        0,
    ];
    for candidate in candidates.iter_mut() {
        *candidate = normalize_split(*candidate, n);
    }

    let mut best: Option<(TransferFunction, f32)> = None;
    for (i, &split) in candidates.iter().enumerate() {
        if candidates[..i].contains(&split) {
            continue;
        }
        let (c, f, d) = if split == 0 {
            (0., 0., 0.)
        } else {
            let (c, f) = linear_least_squares(&xs[..split], &ts[..split]);
            (c, f, xs[split] as f64)
        };
        let Some(mut tf) = fit_power_tail(xs, ts, split, c, f, d) else {
            continue;
        };
        tf.c = c as f32;
        tf.d = d as f32;
        tf.f = f as f32;
        let err = max_error(&tf, xs, ts);
        if !err.is_finite() {
            continue;
        }
        if best.as_ref().is_none_or(|(_, best_err)| err < *best_err) {
            best = Some((tf, err));
        }
    }

    let (tf, err) = best.ok_or(CmsError::ArithmeticFailure)?;
    if err >= FIT_TOLERANCE {
        return Err(CmsError::ArithmeticFailure);
    }
    Ok((tf, err))
}

/// A split needs at least two linear points, or none at all, and must leave
/// enough of a tail for the nonlinear fit.
fn normalize_split(split: usize, n: usize) -> usize {
    let split = split.min(n.saturating_sub(4));
    if split < 2 { 0 } else { split }
}

/// Longest prefix a single line fits within `tolerance`, found by
/// intersecting the feasible slope interval through the first sample.
fn fit_linear_prefix(xs: &[f32], ts: &[f32], tolerance: f64) -> usize {
    let x0 = xs[0] as f64;
    let t0 = ts[0] as f64;
    let mut lo = f64::NEG_INFINITY;
    let mut hi = f64::INFINITY;
    let mut count = 1usize;
    for i in 1..xs.len() {
        let dx = xs[i] as f64 - x0;
        if dx <= 0. {
            break;
        }
        lo = lo.max((ts[i] as f64 - tolerance - t0) / dx);
        hi = hi.min((ts[i] as f64 + tolerance - t0) / dx);
        if lo > hi {
            break;
        }
        count = i + 1;
    }
    count
}

fn try_pure_linear(xs: &[f32], ts: &[f32]) -> Option<TransferFunction> {
    let (c, f) = linear_least_squares(xs, ts);
    let worst = xs
        .iter()
        .zip(ts.iter())
        .map(|(&x, &t)| (c * x as f64 + f - t as f64).abs())
        .fold(0f64, f64::max);
    if worst > 1e-4 {
        return None;
    }
    // (a*x + b)^1 expresses the line with the linear branch unreachable.
    Some(TransferFunction::new(
        1.,
        c as f32,
        f as f32,
        0.,
        0.,
        0.,
        0.,
    ))
}

fn linear_least_squares(xs: &[f32], ts: &[f32]) -> (f64, f64) {
    let n = xs.len();
    if n == 0 {
        return (0., 0.);
    }
    if n == 1 {
        return (0., ts[0] as f64);
    }
    let mut sx = 0f64;
    let mut st = 0f64;
    let mut sxx = 0f64;
    let mut sxt = 0f64;
    for (&x, &t) in xs.iter().zip(ts.iter()) {
        let x = x as f64;
        let t = t as f64;
        sx += x;
        st += t;
        sxx += x * x;
        sxt += x * t;
    }
    let n = n as f64;
    let denom = n * sxx - sx * sx;
    if denom.abs() < 1e-12 {
        return (0., st / n);
    }
    let c = (n * sxt - sx * st) / denom;
    let f = (st - c * sx) / n;
    (c, f)
}

/// Picks the number of samples belonging to the linear head by scanning
/// candidate split indices and summing a closed-form linear residual with a
/// log-log power residual for the tail.
fn choose_split(xs: &[f32], ts: &[f32]) -> usize {
    let n = xs.len();

    // Suffix sums of the log-log regression terms, weighted by t^2 so the
    // residual approximates value space, skipping samples where a
    // logarithm is undefined.
    let mut suf_count = vec![0usize; n + 1];
    let mut suf_w = vec![0f64; n + 1];
    let mut suf_wx = vec![0f64; n + 1];
    let mut suf_wt = vec![0f64; n + 1];
    let mut suf_wxx = vec![0f64; n + 1];
    let mut suf_wxt = vec![0f64; n + 1];
    let mut suf_wtt = vec![0f64; n + 1];
    for i in (0..n).rev() {
        suf_count[i] = suf_count[i + 1];
        suf_w[i] = suf_w[i + 1];
        suf_wx[i] = suf_wx[i + 1];
        suf_wt[i] = suf_wt[i + 1];
        suf_wxx[i] = suf_wxx[i + 1];
        suf_wxt[i] = suf_wxt[i + 1];
        suf_wtt[i] = suf_wtt[i + 1];
        if xs[i] > 0. && ts[i] > 0. {
            let w = (ts[i] as f64) * (ts[i] as f64);
            let lx = f_log(xs[i] as f64);
            let lt = f_log(ts[i] as f64);
            suf_count[i] += 1;
            suf_w[i] += w;
            suf_wx[i] += w * lx;
            suf_wt[i] += w * lt;
            suf_wxx[i] += w * lx * lx;
            suf_wxt[i] += w * lx * lt;
            suf_wtt[i] += w * lt * lt;
        }
    }

    let tail_residual = |start: usize| -> Option<f64> {
        if suf_count[start] < 3 {
            return None;
        }
        let sw = suf_w[start];
        let denom = sw * suf_wxx[start] - suf_wx[start] * suf_wx[start];
        if denom.abs() < 1e-24 {
            return None;
        }
        let g = (sw * suf_wxt[start] - suf_wx[start] * suf_wt[start]) / denom;
        let q = (suf_wt[start] - g * suf_wx[start]) / sw;
        let sse = suf_wtt[start] + g * g * suf_wxx[start] + q * q * sw
            - 2. * g * suf_wxt[start]
            - 2. * q * suf_wt[start]
            + 2. * g * q * suf_wx[start];
        Some(sse.max(0.))
    };

    let mut best_split = 0usize;
    let mut best_score = tail_residual(0).unwrap_or(f64::INFINITY);

    // Running sums for the linear head residual.
    let mut sx = 0f64;
    let mut st = 0f64;
    let mut sxx = 0f64;
    let mut sxt = 0f64;
    let mut stt = 0f64;
    for split in 1..n.saturating_sub(3) {
        let x = xs[split - 1] as f64;
        let t = ts[split - 1] as f64;
        sx += x;
        st += t;
        sxx += x * x;
        sxt += x * t;
        stt += t * t;
        if split < 2 {
            continue;
        }
        let lf = split as f64;
        let denom = lf * sxx - sx * sx;
        let (c, f) = if denom.abs() < 1e-12 {
            (0., st / lf)
        } else {
            let c = (lf * sxt - sx * st) / denom;
            (c, (st - c * sx) / lf)
        };
        let head = (stt + c * c * sxx + lf * f * f + 2. * c * f * sx
            - 2. * c * sxt
            - 2. * f * st)
            .max(0.);
        if let Some(tail) = tail_residual(split) {
            let score = head + tail;
            if score < best_score {
                best_score = score;
                best_split = split;
            }
        }
    }
    best_split
}

/// Gauss-Newton refinement of `(g, a, b)` over the power tail. The offset is
/// eliminated by anchoring continuity: `e = c*d + f - (a*d + b)^g`.
fn fit_power_tail(
    xs: &[f32],
    ts: &[f32],
    start: usize,
    c: f64,
    f: f64,
    d: f64,
) -> Option<TransferFunction> {
    let anchor = c * d + f;

    let (mut g, mut a, mut b) = log_log_seed(&xs[start..], &ts[start..]);
    let mut best = (g, a, b);
    let mut best_sse = f64::INFINITY;
    let mut stale = 0usize;

    for _ in 0..MAX_GAUSS_NEWTON_STEPS {
        let mut jtj = Matrix3d::default();
        let mut jtr = Vector3d::default();
        let mut sse = 0f64;

        let dd = (a * d + b).max(0.);
        let dd_g = if dd > 0. { f_pow(dd, g) } else { 0. };
        let dd_g1 = if dd > 0. { f_pow(dd, g - 1.) } else { 0. };
        let dd_ln = if dd > 0. { f_log(dd) * dd_g } else { 0. };

        for (&x, &t) in xs[start..].iter().zip(ts[start..].iter()) {
            let x = x as f64;
            let t = t as f64;
            let y = (a * x + b).max(0.);
            let (y_g, y_g1, y_ln) = if y > 0. {
                let y_g = f_pow(y, g);
                (y_g, f_pow(y, g - 1.), f_log(y) * y_g)
            } else {
                (0., 0., 0.)
            };

            let r = y_g - dd_g + anchor - t;
            let grad = [
                y_ln - dd_ln,
                g * (x * y_g1 - d * dd_g1),
                g * (y_g1 - dd_g1),
            ];

            sse += r * r;
            for (row, &gi) in jtj.v.iter_mut().zip(grad.iter()) {
                for (cell, &gj) in row.iter_mut().zip(grad.iter()) {
                    *cell += gi * gj;
                }
            }
            for (cell, &gi) in jtr.v.iter_mut().zip(grad.iter()) {
                *cell += gi * r;
            }
        }

        if sse < best_sse {
            best_sse = sse;
            best = (g, a, b);
            stale = 0;
        } else {
            stale += 1;
            if stale >= NO_IMPROVEMENT_LIMIT {
                break;
            }
        }

        let delta = jtj.inverse()?.mul_vector(jtr);
        g -= delta.v[0];
        a -= delta.v[1];
        b -= delta.v[2];
        if !(g.is_finite() && a.is_finite() && b.is_finite()) {
            return None;
        }
        let norm =
            (delta.v[0] * delta.v[0] + delta.v[1] * delta.v[1] + delta.v[2] * delta.v[2]).sqrt();
        if norm < STEP_TOLERANCE {
            break;
        }
    }

    let (g, a, b) = best;
    let dd = (a * d + b).max(0.);
    let e = anchor - if dd > 0. { f_pow(dd, g) } else { 0. };
    let tf = TransferFunction::new(g as f32, a as f32, b as f32, 0., 0., e as f32, 0.);
    if !(tf.g.is_finite() && tf.a.is_finite() && tf.b.is_finite() && tf.e.is_finite()) {
        return None;
    }
    Some(tf)
}

/// Seed from `log(t) = g*log(x) + g*log(a)`, assuming `b` starts at zero.
fn log_log_seed(xs: &[f32], ts: &[f32]) -> (f64, f64, f64) {
    let mut count = 0f64;
    let mut slx = 0f64;
    let mut slt = 0f64;
    let mut slxlx = 0f64;
    let mut slxlt = 0f64;
    for (&x, &t) in xs.iter().zip(ts.iter()) {
        if x > 0. && t > 0. {
            let lx = f_log(x as f64);
            let lt = f_log(t as f64);
            count += 1.;
            slx += lx;
            slt += lt;
            slxlx += lx * lx;
            slxlt += lx * lt;
        }
    }
    if count < 2. {
        return (2., 1., 0.);
    }
    let denom = count * slxlx - slx * slx;
    if denom.abs() < 1e-12 {
        return (2., 1., 0.);
    }
    let g = (count * slxlt - slx * slt) / denom;
    let q = (slt - g * slx) / count;
    if !g.is_finite() || g <= 0. {
        return (2., 1., 0.);
    }
    let a = f_exp(q / g);
    if !a.is_finite() || a <= 0. {
        return (g, 1., 0.);
    }
    (g, a, 0.)
}

fn max_error(tf: &TransferFunction, xs: &[f32], ts: &[f32]) -> f32 {
    let mut worst = 0f32;
    for (&x, &t) in xs.iter().zip(ts.iter()) {
        let err = (tf.eval(x) - t).abs();
        if err > worst {
            worst = err;
        }
    }
    worst
}
