/*
 * // Copyright (c) Radzivon Bartoshyk 2/2025. All rights reserved.
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

//! Pipeline stages applied to `[r, g, b, a]` f32 lanes between pixel decode
//! and encode. Each stage is stateless per pixel and runs stage-major over
//! the working chunk.

use crate::clut::eval_a_to_b;
use crate::mab::AToB;
use crate::matrix::Matrix3f;
use crate::mlaf::mlaf;
use crate::pixel::clamp01;
use crate::trc::{Curve, TransferFunction};

pub(crate) enum Op<'a> {
    SwapRb,
    ForceOpaque,
    /// Divide color by alpha, emitting 0 where alpha is 0.
    Unpremul,
    Premul,
    /// Inverted ink coverage, applied to all four channels of CMYK input.
    Invert,
    Linearize([Curve<'a>; 3]),
    DeviceToPcs(AToB<'a>),
    LabToXyz,
    Matrix(Matrix3f),
    /// Inverse destination curves; the input is clamped before encoding.
    Encode([TransferFunction; 3]),
}

#[inline]
fn lab_to_xyz(px: &mut [f32]) {
    let l = px[0] * 100.;
    let a = px[1] * 255. - 128.;
    let b = px[2] * 255. - 128.;
    let fy = (l + 16.) * (1. / 116.);
    let fx = fy + a * (1. / 500.);
    let fz = fy - b * (1. / 200.);
    let f_inv = |t: f32| {
        let cube = t * t * t;
        if cube > 0.008856 {
            cube
        } else {
            (t - 16. / 116.) * (1. / 7.787)
        }
    };
    px[0] = f_inv(fx) * 0.9642;
    px[1] = f_inv(fy);
    px[2] = f_inv(fz) * 0.8249;
}

impl Op<'_> {
    pub(crate) fn apply(&self, lane: &mut [f32]) {
        match self {
            Op::SwapRb => {
                for px in lane.chunks_exact_mut(4) {
                    px.swap(0, 2);
                }
            }
            Op::ForceOpaque => {
                for px in lane.chunks_exact_mut(4) {
                    px[3] = 1.0;
                }
            }
            Op::Unpremul => {
                for px in lane.chunks_exact_mut(4) {
                    let scale = if px[3] != 0. { 1. / px[3] } else { 0. };
                    px[0] *= scale;
                    px[1] *= scale;
                    px[2] *= scale;
                }
            }
            Op::Premul => {
                for px in lane.chunks_exact_mut(4) {
                    let alpha = px[3];
                    px[0] *= alpha;
                    px[1] *= alpha;
                    px[2] *= alpha;
                }
            }
            Op::Invert => {
                for value in lane.iter_mut() {
                    *value = 1.0 - *value;
                }
            }
            Op::Linearize(curves) => {
                for px in lane.chunks_exact_mut(4) {
                    px[0] = curves[0].eval(px[0]);
                    px[1] = curves[1].eval(px[1]);
                    px[2] = curves[2].eval(px[2]);
                }
            }
            Op::DeviceToPcs(a_to_b) => {
                for px in lane.chunks_exact_mut(4) {
                    eval_a_to_b(a_to_b, px);
                }
            }
            Op::LabToXyz => {
                for px in lane.chunks_exact_mut(4) {
                    lab_to_xyz(px);
                }
            }
            Op::Matrix(m) => {
                for px in lane.chunks_exact_mut(4) {
                    let r = px[0];
                    let g = px[1];
                    let b = px[2];
                    px[0] = mlaf(mlaf(r * m.v[0][0], g, m.v[0][1]), b, m.v[0][2]);
                    px[1] = mlaf(mlaf(r * m.v[1][0], g, m.v[1][1]), b, m.v[1][2]);
                    px[2] = mlaf(mlaf(r * m.v[2][0], g, m.v[2][1]), b, m.v[2][2]);
                }
            }
            Op::Encode(curves) => {
                for px in lane.chunks_exact_mut(4) {
                    px[0] = curves[0].eval(clamp01(px[0]));
                    px[1] = curves[1].eval(clamp01(px[1]));
                    px[2] = curves[2].eval(clamp01(px[2]));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_is_involution() {
        let mut lane = [0.1f32, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8];
        let expected = lane;
        Op::SwapRb.apply(&mut lane);
        assert_eq!(lane[0], 0.3);
        assert_eq!(lane[4], 0.7);
        Op::SwapRb.apply(&mut lane);
        assert_eq!(lane, expected);
    }

    #[test]
    fn test_unpremul_handles_zero_alpha() {
        let mut lane = [0.5f32, 0.25, 0.125, 0.5, 0.3, 0.3, 0.3, 0.0];
        Op::Unpremul.apply(&mut lane);
        assert_eq!(&lane[0..4], &[1.0, 0.5, 0.25, 0.5]);
        assert_eq!(&lane[4..8], &[0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_premul_unpremul_roundtrip() {
        let mut lane = [0.8f32, 0.6, 0.4, 0.5];
        Op::Premul.apply(&mut lane);
        Op::Unpremul.apply(&mut lane);
        for (got, want) in lane.iter().zip([0.8f32, 0.6, 0.4, 0.5].iter()) {
            assert!((got - want).abs() < 1e-6);
        }
    }

    #[test]
    fn test_invert_covers_all_channels() {
        let mut lane = [0.0f32, 0.25, 0.75, 1.0];
        Op::Invert.apply(&mut lane);
        assert_eq!(lane, [1.0, 0.75, 0.25, 0.0]);
    }

    #[test]
    fn test_lab_white_maps_to_d50() {
        // L* = 100, a* = b* = 0 encoded in [0, 1].
        let mut px = [1.0f32, 128. / 255., 128. / 255., 1.0];
        lab_to_xyz(&mut px);
        assert!((px[0] - 0.9642).abs() < 1e-3);
        assert!((px[1] - 1.0).abs() < 1e-3);
        assert!((px[2] - 0.8249).abs() < 1e-3);
    }
}
