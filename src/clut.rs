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

//! CLUT sampling and full A2B evaluation. 3D grids interpolate
//! tetrahedrally, other dimensionalities multi-linearly.

use crate::mab::{AToB, ClutGrid};
use crate::matrix::Vector3f;
use crate::pixel::clamp01;
use crate::reader::{read_u16_be, uint8_number_to_float, uint16_number_to_float};

impl ClutGrid<'_> {
    /// Fetches the 3-channel node at entry offset `index` (in entries).
    #[inline(always)]
    fn fetch(&self, index: usize) -> Vector3f {
        match *self {
            ClutGrid::Grid8(table) => {
                let node = &table[index..index + 3];
                Vector3f {
                    v: [
                        uint8_number_to_float(node[0]),
                        uint8_number_to_float(node[1]),
                        uint8_number_to_float(node[2]),
                    ],
                }
            }
            ClutGrid::Grid16(table) => {
                let node = &table[index * 2..index * 2 + 6];
                Vector3f {
                    v: [
                        uint16_number_to_float(read_u16_be(&node[0..2])),
                        uint16_number_to_float(read_u16_be(&node[2..4])),
                        uint16_number_to_float(read_u16_be(&node[4..6])),
                    ],
                }
            }
        }
    }
}

/// Entry strides per axis; the last input channel varies fastest and every
/// node carries three output channels.
fn grid_strides(grid_points: &[u8; 4], channels: usize) -> [usize; 4] {
    let mut strides = [0usize; 4];
    let mut acc = 3usize;
    for i in (0..channels).rev() {
        strides[i] = acc;
        acc *= grid_points[i] as usize;
    }
    strides
}

struct AxisPosition {
    lower: usize,
    upper: usize,
    weight: f32,
}

#[inline]
fn axis_position(value: f32, points: u8) -> AxisPosition {
    let scaled = value * (points - 1) as f32;
    let lower = scaled.floor() as usize;
    let upper = (lower + 1).min(points as usize - 1);
    AxisPosition {
        lower,
        upper,
        weight: scaled - lower as f32,
    }
}

fn interp_multilinear(
    grid: &ClutGrid,
    grid_points: &[u8; 4],
    channels: usize,
    input: &[f32],
) -> Vector3f {
    let strides = grid_strides(grid_points, channels);
    let mut axes = [
        AxisPosition { lower: 0, upper: 0, weight: 0. },
        AxisPosition { lower: 0, upper: 0, weight: 0. },
        AxisPosition { lower: 0, upper: 0, weight: 0. },
        AxisPosition { lower: 0, upper: 0, weight: 0. },
    ];
    for (i, axis) in axes.iter_mut().enumerate().take(channels) {
        *axis = axis_position(input[i], grid_points[i]);
    }
    let mut acc = Vector3f::default();
    for corner in 0..(1usize << channels) {
        let mut weight = 1f32;
        let mut offset = 0usize;
        for (i, axis) in axes.iter().enumerate().take(channels) {
            if corner & (1 << i) != 0 {
                weight *= axis.weight;
                offset += axis.upper * strides[i];
            } else {
                weight *= 1. - axis.weight;
                offset += axis.lower * strides[i];
            }
        }
        if weight != 0. {
            acc = acc.mla(grid.fetch(offset), weight);
        }
    }
    acc
}

fn interp_tetrahedral(grid: &ClutGrid, grid_points: &[u8; 4], input: &[f32]) -> Vector3f {
    let strides = grid_strides(grid_points, 3);
    let x = axis_position(input[0], grid_points[0]);
    let y = axis_position(input[1], grid_points[1]);
    let z = axis_position(input[2], grid_points[2]);

    let fetch = |ix: usize, iy: usize, iz: usize| -> Vector3f {
        grid.fetch(ix * strides[0] + iy * strides[1] + iz * strides[2])
    };

    let rx = x.weight;
    let ry = y.weight;
    let rz = z.weight;
    let c0 = fetch(x.lower, y.lower, z.lower);
    let c1;
    let c2;
    let c3;
    if rx >= ry {
        if ry >= rz {
            c1 = fetch(x.upper, y.lower, z.lower) - c0;
            c2 = fetch(x.upper, y.upper, z.lower) - fetch(x.upper, y.lower, z.lower);
            c3 = fetch(x.upper, y.upper, z.upper) - fetch(x.upper, y.upper, z.lower);
        } else if rx >= rz {
            c1 = fetch(x.upper, y.lower, z.lower) - c0;
            c2 = fetch(x.upper, y.upper, z.upper) - fetch(x.upper, y.lower, z.upper);
            c3 = fetch(x.upper, y.lower, z.upper) - fetch(x.upper, y.lower, z.lower);
        } else {
            c1 = fetch(x.upper, y.lower, z.upper) - fetch(x.lower, y.lower, z.upper);
            c2 = fetch(x.upper, y.upper, z.upper) - fetch(x.upper, y.lower, z.upper);
            c3 = fetch(x.lower, y.lower, z.upper) - c0;
        }
    } else if rx >= rz {
        c1 = fetch(x.upper, y.upper, z.lower) - fetch(x.lower, y.upper, z.lower);
        c2 = fetch(x.lower, y.upper, z.lower) - c0;
        c3 = fetch(x.upper, y.upper, z.upper) - fetch(x.upper, y.upper, z.lower);
    } else if ry >= rz {
        c1 = fetch(x.upper, y.upper, z.upper) - fetch(x.lower, y.upper, z.upper);
        c2 = fetch(x.lower, y.upper, z.lower) - c0;
        c3 = fetch(x.lower, y.upper, z.upper) - fetch(x.lower, y.upper, z.lower);
    } else {
        c1 = fetch(x.upper, y.upper, z.upper) - fetch(x.lower, y.upper, z.upper);
        c2 = fetch(x.lower, y.upper, z.upper) - fetch(x.lower, y.lower, z.upper);
        c3 = fetch(x.lower, y.lower, z.upper) - c0;
    }
    let s0 = c0.mla(c1, rx);
    let s1 = s0.mla(c2, ry);
    s1.mla(c3, rz)
}

/// Runs the full device-to-PCS pipeline over one pixel's channels.
pub(crate) fn eval_a_to_b(a_to_b: &AToB, px: &mut [f32]) {
    let mut v = [0f32; 4];
    if a_to_b.input_channels > 0 {
        let channels = a_to_b.input_channels as usize;
        for (value, (curve, &src)) in v
            .iter_mut()
            .zip(a_to_b.input_curves.iter().zip(px.iter()))
            .take(channels)
        {
            *value = curve.eval(clamp01(src));
        }
        let sampled = if channels == 3 {
            interp_tetrahedral(&a_to_b.grid, &a_to_b.grid_points, &v[..channels])
        } else {
            interp_multilinear(&a_to_b.grid, &a_to_b.grid_points, channels, &v[..channels])
        };
        v[..3].copy_from_slice(&sampled.v);
    } else {
        for (value, &src) in v.iter_mut().zip(px.iter()).take(3) {
            *value = clamp01(src);
        }
    }

    if a_to_b.matrix_channels == 3 {
        for (value, curve) in v.iter_mut().zip(a_to_b.matrix_curves.iter()) {
            *value = curve.eval(*value);
        }
        let out = a_to_b.matrix.transform_vector(Vector3f {
            v: [v[0], v[1], v[2]],
        });
        v[..3].copy_from_slice(&out.v);
    }

    for (dst, (curve, &value)) in px
        .iter_mut()
        .zip(a_to_b.output_curves.iter().zip(v.iter()))
    {
        *dst = curve.eval(value);
    }
    if a_to_b.input_channels == 4 {
        px[3] = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mab::read_a_to_b;
    use crate::profile::ProfileTag;
    use crate::reader::read_u32_be;

    fn identity_a2b() -> Vec<u8> {
        crate::mab::tests::identity_mft2()
    }

    #[test]
    fn test_identity_clut_roundtrip() {
        let payload = identity_a2b();
        let tag = ProfileTag {
            signature: 0,
            tag_type: read_u32_be(&payload[0..4]),
            size: payload.len() as u32,
            data: &payload,
        };
        let a2b = read_a_to_b(&tag).unwrap();
        for probe in [
            [0.0f32, 0.0, 0.0, 1.0],
            [1.0, 1.0, 1.0, 1.0],
            [0.25, 0.5, 0.75, 1.0],
            [0.9, 0.1, 0.4, 1.0],
        ] {
            let mut px = probe;
            eval_a_to_b(&a2b, &mut px);
            for (got, want) in px.iter().zip(probe.iter()).take(3) {
                assert!(
                    (got - want).abs() < 1e-3,
                    "probe {probe:?} produced {px:?}"
                );
            }
        }
    }

    #[test]
    fn test_grid_fetch_16() {
        let bytes = [0x00u8, 0x00, 0x80, 0x00, 0xff, 0xff];
        let grid = ClutGrid::Grid16(&bytes);
        let node = grid.fetch(0);
        assert!((node.v[0] - 0.0).abs() < 1e-6);
        assert!((node.v[1] - 32768. / 65535.).abs() < 1e-6);
        assert!((node.v[2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_axis_position_clamps_top() {
        let position = axis_position(1.0, 5);
        assert_eq!(position.lower, 4);
        assert_eq!(position.upper, 4);
        assert_eq!(position.weight, 0.0);
    }
}
