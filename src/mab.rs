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

//! 'A2B0' multi-dimensional transforms: the legacy 'mft1'/'mft2' containers
//! and the v4 'mAB ' variant. All tables stay borrowed from the profile
//! buffer; only the record itself is owned.

use crate::err::CmsError;
use crate::matrix::Matrix3x4;
use crate::profile::{LUT_MAB, LUT_MBA, LUT_MFT1, LUT_MFT2, ProfileTag, read_curve};
use crate::reader::{read_s15_fixed16_be, read_u16_be, read_u32_be};
use crate::trc::{Curve, TransferFunction};

pub(crate) const IDENTITY_CURVE: Curve<'static> =
    Curve::Parametric(TransferFunction::new(1., 1., 0., 0., 0., 0., 0.));

/// Multi-dimensional grid samples, 8 or 16 bit normalized to `[0, 1]`.
#[derive(Debug, Clone, Copy)]
pub enum ClutGrid<'a> {
    Grid8(&'a [u8]),
    /// Big-endian 16-bit entries.
    Grid16(&'a [u8]),
}

/// Device-to-PCS transform: optional input curves + CLUT, an optional
/// matrix stage, and the mandatory three output curves.
#[derive(Debug, Clone, Copy)]
pub struct AToB<'a> {
    /// 0 skips the CLUT stage entirely, otherwise in `[1, 4]`.
    pub input_channels: u32,
    pub input_curves: [Curve<'a>; 4],
    /// Per-axis grid sizes; axes past `input_channels` stay 0.
    pub grid_points: [u8; 4],
    pub grid: ClutGrid<'a>,
    /// 0 or 3.
    pub matrix_channels: u32,
    pub matrix_curves: [Curve<'a>; 3],
    pub matrix: Matrix3x4,
    /// Always 3.
    pub output_channels: u32,
    pub output_curves: [Curve<'a>; 3],
}

pub(crate) fn read_a_to_b<'a>(tag: &ProfileTag<'a>) -> Result<AToB<'a>, CmsError> {
    if tag.tag_type == LUT_MFT1 {
        read_mft(tag.data, 1)
    } else if tag.tag_type == LUT_MFT2 {
        read_mft(tag.data, 2)
    } else if tag.tag_type == LUT_MAB {
        read_mab(tag.data)
    } else if tag.tag_type == LUT_MBA {
        // PCS-to-device direction is of no use as an A2B0 payload.
        Err(CmsError::UnsupportedFeature)
    } else {
        Err(CmsError::UnsupportedFeature)
    }
}

fn read_mft(data: &[u8], width: usize) -> Result<AToB<'_>, CmsError> {
    let header_len = if width == 2 { 52 } else { 48 };
    if data.len() < header_len {
        return Err(CmsError::InvalidTag);
    }
    let input_channels = data[8] as usize;
    let output_channels = data[9] as usize;
    let grid_size = data[10];
    if !(1..=4).contains(&input_channels) || output_channels != 3 || grid_size < 2 {
        return Err(CmsError::InvalidTag);
    }

    let mut matrix = Matrix3x4::default();
    for (i, chunk) in data[12..48].chunks_exact(4).enumerate() {
        matrix.v[i / 3][i % 3] = read_s15_fixed16_be(chunk);
    }

    let (input_table_size, output_table_size) = if width == 2 {
        let input = read_u16_be(&data[48..50]) as usize;
        let output = read_u16_be(&data[50..52]) as usize;
        if !(2..=4096).contains(&input) || !(2..=4096).contains(&output) {
            return Err(CmsError::InvalidTag);
        }
        (input, output)
    } else {
        (256, 256)
    };

    let mut clut_entries = 1u64;
    for _ in 0..input_channels {
        clut_entries *= grid_size as u64;
    }
    let input_bytes = (input_channels * input_table_size * width) as u64;
    let grid_bytes = clut_entries * (output_channels * width) as u64;
    let output_bytes = (output_channels * output_table_size * width) as u64;
    let available = (data.len() - header_len) as u64;
    if input_bytes + grid_bytes + output_bytes > available {
        return Err(CmsError::InvalidTag);
    }

    fn make_table(width: usize, slice: &[u8]) -> Curve<'_> {
        if width == 2 {
            Curve::Table16(slice)
        } else {
            Curve::Table8(slice)
        }
    }

    let mut input_curves = [IDENTITY_CURVE; 4];
    let per_input = input_table_size * width;
    for (i, curve) in input_curves.iter_mut().enumerate().take(input_channels) {
        let start = header_len + i * per_input;
        *curve = make_table(width, &data[start..start + per_input]);
    }

    let grid_start = header_len + input_bytes as usize;
    let grid_slice = &data[grid_start..grid_start + grid_bytes as usize];
    let grid = if width == 2 {
        ClutGrid::Grid16(grid_slice)
    } else {
        ClutGrid::Grid8(grid_slice)
    };

    let mut output_curves = [IDENTITY_CURVE; 3];
    let per_output = output_table_size * width;
    let output_start = grid_start + grid_bytes as usize;
    for (i, curve) in output_curves.iter_mut().enumerate() {
        let start = output_start + i * per_output;
        *curve = make_table(width, &data[start..start + per_output]);
    }

    let mut grid_points = [0u8; 4];
    for axis in grid_points.iter_mut().take(input_channels) {
        *axis = grid_size;
    }

    // The lutType matrix only applies to XYZ sources, which never reach the
    // transform path here, so the stage stays disabled.
    Ok(AToB {
        input_channels: input_channels as u32,
        input_curves,
        grid_points,
        grid,
        matrix_channels: 0,
        matrix_curves: [IDENTITY_CURVE; 3],
        matrix,
        output_channels: output_channels as u32,
        output_curves,
    })
}

fn read_curve_sequence<'a>(
    data: &'a [u8],
    mut offset: usize,
    slots: &mut [Curve<'a>],
    count: usize,
) -> Result<(), CmsError> {
    for slot in slots.iter_mut().take(count) {
        if offset >= data.len() {
            return Err(CmsError::InvalidTag);
        }
        let (curve, consumed) = read_curve(&data[offset..])?;
        *slot = curve;
        offset += consumed;
        if offset % 4 != 0 {
            offset += 4 - offset % 4;
        }
    }
    Ok(())
}

fn read_mab(data: &[u8]) -> Result<AToB<'_>, CmsError> {
    if data.len() < 32 {
        return Err(CmsError::InvalidTag);
    }
    let input_channels = data[8] as usize;
    let output_channels = data[9] as usize;
    if !(1..=4).contains(&input_channels) || output_channels != 3 {
        return Err(CmsError::InvalidTag);
    }
    let b_curve_offset = read_u32_be(&data[12..16]) as usize;
    let matrix_offset = read_u32_be(&data[16..20]) as usize;
    let m_curve_offset = read_u32_be(&data[20..24]) as usize;
    let clut_offset = read_u32_be(&data[24..28]) as usize;
    let a_curve_offset = read_u32_be(&data[28..32]) as usize;

    if b_curve_offset == 0 {
        return Err(CmsError::InvalidTag);
    }
    let mut output_curves = [IDENTITY_CURVE; 3];
    read_curve_sequence(data, b_curve_offset, &mut output_curves, 3)?;

    let mut matrix = Matrix3x4::default();
    let mut matrix_curves = [IDENTITY_CURVE; 3];
    let mut matrix_channels = 0u32;
    if matrix_offset != 0 {
        let end = matrix_offset
            .checked_add(12 * size_of::<u32>())
            .ok_or(CmsError::InvalidTag)?;
        if data.len() < end {
            return Err(CmsError::InvalidTag);
        }
        for (i, chunk) in data[matrix_offset..end].chunks_exact(4).enumerate() {
            if i < 9 {
                matrix.v[i / 3][i % 3] = read_s15_fixed16_be(chunk);
            } else {
                matrix.v[i - 9][3] = read_s15_fixed16_be(chunk);
            }
        }
        if m_curve_offset != 0 {
            read_curve_sequence(data, m_curve_offset, &mut matrix_curves, 3)?;
        }
        matrix_channels = 3;
    }

    let mut input_curves = [IDENTITY_CURVE; 4];
    let mut grid_points = [0u8; 4];
    let mut grid = ClutGrid::Grid8(&[]);
    let mut clut_channels = 0u32;
    if clut_offset != 0 {
        let header_end = clut_offset.checked_add(20).ok_or(CmsError::InvalidTag)?;
        if a_curve_offset == 0 || data.len() < header_end {
            return Err(CmsError::InvalidTag);
        }
        let mut entries = 1u64;
        for axis in 0..input_channels {
            let points = data[clut_offset + axis];
            if points < 2 {
                return Err(CmsError::InvalidTag);
            }
            grid_points[axis] = points;
            entries *= points as u64;
        }
        let precision = data[clut_offset + 16] as usize;
        if precision != 1 && precision != 2 {
            return Err(CmsError::InvalidTag);
        }
        let bytes = entries * (output_channels * precision) as u64;
        let grid_start = header_end;
        if ((data.len() - grid_start) as u64) < bytes {
            return Err(CmsError::InvalidTag);
        }
        let slice = &data[grid_start..grid_start + bytes as usize];
        grid = if precision == 2 {
            ClutGrid::Grid16(slice)
        } else {
            ClutGrid::Grid8(slice)
        };
        read_curve_sequence(data, a_curve_offset, &mut input_curves, input_channels)?;
        clut_channels = input_channels as u32;
    }

    Ok(AToB {
        input_channels: clut_channels,
        input_curves,
        grid_points,
        grid,
        matrix_channels,
        matrix_curves,
        matrix,
        output_channels: output_channels as u32,
        output_curves,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn push_u32(out: &mut Vec<u8>, value: u32) {
        out.extend_from_slice(&value.to_be_bytes());
    }

    /// 2x2x2 identity-ish mft2 with 3 input channels.
    pub(crate) fn identity_mft2() -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"mft2");
        push_u32(&mut out, 0);
        out.push(3); // input channels
        out.push(3); // output channels
        out.push(2); // grid points
        out.push(0);
        // identity matrix
        for i in 0..9u32 {
            push_u32(&mut out, if i % 4 == 0 { 0x00010000 } else { 0 });
        }
        out.extend_from_slice(&2u16.to_be_bytes()); // input table size
        out.extend_from_slice(&2u16.to_be_bytes()); // output table size
        // three identity input tables
        for _ in 0..3 {
            out.extend_from_slice(&0u16.to_be_bytes());
            out.extend_from_slice(&0xffffu16.to_be_bytes());
        }
        // 2^3 grid nodes, each node stores its own coordinates
        for r in 0..2u16 {
            for g in 0..2u16 {
                for b in 0..2u16 {
                    for v in [r, g, b] {
                        out.extend_from_slice(&(v * 0xffff).to_be_bytes());
                    }
                }
            }
        }
        // three identity output tables
        for _ in 0..3 {
            out.extend_from_slice(&0u16.to_be_bytes());
            out.extend_from_slice(&0xffffu16.to_be_bytes());
        }
        out
    }

    fn tag_of(data: &[u8]) -> ProfileTag<'_> {
        ProfileTag {
            signature: 0,
            tag_type: read_u32_be(&data[0..4]),
            size: data.len() as u32,
            data,
        }
    }

    #[test]
    fn test_mft2_parses() {
        let payload = identity_mft2();
        let a2b = read_a_to_b(&tag_of(&payload)).unwrap();
        assert_eq!(a2b.input_channels, 3);
        assert_eq!(a2b.output_channels, 3);
        assert_eq!(a2b.grid_points, [2, 2, 2, 0]);
        assert_eq!(a2b.matrix_channels, 0);
        assert_eq!(a2b.input_curves[0].table_entries(), 2);
        assert_eq!(a2b.output_curves[2].table_entries(), 2);
        match a2b.grid {
            ClutGrid::Grid16(slice) => assert_eq!(slice.len(), 8 * 3 * 2),
            ClutGrid::Grid8(_) => panic!("expected 16-bit grid"),
        }
    }

    #[test]
    fn test_mft2_truncated_fails() {
        let payload = identity_mft2();
        assert!(read_a_to_b(&tag_of(&payload[..payload.len() - 4])).is_err());
    }

    #[test]
    fn test_mft2_bad_channels_fail() {
        let mut payload = identity_mft2();
        payload[8] = 5;
        assert!(read_a_to_b(&tag_of(&payload)).is_err());
        let mut payload = identity_mft2();
        payload[9] = 4;
        assert!(read_a_to_b(&tag_of(&payload)).is_err());
        let mut payload = identity_mft2();
        payload[10] = 1;
        assert!(read_a_to_b(&tag_of(&payload)).is_err());
    }

    #[test]
    fn test_mba_is_unsupported() {
        let mut payload = identity_mft2();
        payload[0..4].copy_from_slice(b"mBA ");
        assert_eq!(
            read_a_to_b(&tag_of(&payload)).unwrap_err(),
            CmsError::UnsupportedFeature
        );
    }

    /// Minimal mAB: B curves only (identity 'curv' with zero entries).
    #[test]
    fn test_mab_b_curves_only() {
        let mut payload = Vec::new();
        payload.extend_from_slice(b"mAB ");
        push_u32(&mut payload, 0);
        payload.push(3);
        payload.push(3);
        payload.extend_from_slice(&[0u8; 2]);
        push_u32(&mut payload, 32); // b curves
        push_u32(&mut payload, 0); // matrix
        push_u32(&mut payload, 0); // m curves
        push_u32(&mut payload, 0); // clut
        push_u32(&mut payload, 0); // a curves
        for _ in 0..3 {
            payload.extend_from_slice(b"curv");
            push_u32(&mut payload, 0);
            push_u32(&mut payload, 0);
        }
        let a2b = read_a_to_b(&tag_of(&payload)).unwrap();
        assert_eq!(a2b.input_channels, 0);
        assert_eq!(a2b.matrix_channels, 0);
        assert!(matches!(a2b.output_curves[0], Curve::Parametric(_)));
    }
}
