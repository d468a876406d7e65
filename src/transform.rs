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

//! The pixel transform entry points: pipeline assembly from the source and
//! destination descriptions, and the chunked executor that runs the stages
//! over a raster.

use crate::err::CmsError;
use crate::pixel::{load_pixels, store_pixels};
use crate::profile::{ColorProfile, DataColorSpace};
use crate::stages::Op;
use crate::trc::{Curve, TransferFunction};

/// Pixel memory layouts. 16-bit integer channels are big-endian, halfs are
/// 1-5-10 in native order, floats are native single precision.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub enum PixelLayout {
    Rgb565,
    Bgr565,
    Rgb8,
    Bgr8,
    Rgba8,
    Bgra8,
    Rgba1010102,
    Bgra1010102,
    Rgb101010x,
    Bgr101010x,
    Rgb16,
    Bgr16,
    Rgba16,
    Bgra16,
    RgbF16,
    BgrF16,
    RgbaF16,
    BgraF16,
    RgbF32,
    BgrF32,
    RgbaF32,
    BgraF32,
}

/// Alpha is always carried linearly between stages.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub enum AlphaFormat {
    /// Source alpha is ignored, destination alpha is written as 1.0.
    Opaque,
    /// Alpha and color are unassociated.
    Unpremul,
    /// Color was premultiplied while encoded.
    PremulAsEncoded,
    /// Color was premultiplied after linearization.
    PremulLinear,
}

/// 168 pixels of 4 lanes per working chunk.
const CHUNK_PIXELS: usize = 168;

fn inverted_destination_trc(profile: &ColorProfile) -> Result<[TransferFunction; 3], CmsError> {
    let trc = profile.trc.ok_or(CmsError::UnsupportedFeature)?;
    let mut inverted = [TransferFunction::default(); 3];
    for (slot, curve) in inverted.iter_mut().zip(trc.iter()) {
        match curve {
            Curve::Parametric(parametric) => *slot = parametric.invert()?,
            _ => return Err(CmsError::UnsupportedFeature),
        }
    }
    Ok(inverted)
}

fn build_ops<'a>(
    src_alpha: AlphaFormat,
    src_profile: Option<&ColorProfile<'a>>,
    dst_alpha: AlphaFormat,
    dst_profile: Option<&ColorProfile<'a>>,
    src_swapped: bool,
    dst_swapped: bool,
) -> Result<Vec<Op<'a>>, CmsError> {
    let profiles = match (src_profile, dst_profile) {
        (None, None) => None,
        (Some(src), Some(dst)) => Some((src, dst)),
        _ => return Err(CmsError::UnsupportedFeature),
    };

    let mut ops = Vec::new();
    if src_swapped {
        ops.push(Op::SwapRb);
    }

    let mut src_alpha = src_alpha;
    if let Some((src, _)) = profiles {
        if src.data_color_space == DataColorSpace::Cmyk {
            // Ink coverage arrives inverted and K travels in the alpha
            // lane, so alpha semantics must not touch it.
            ops.push(Op::Invert);
            src_alpha = AlphaFormat::Unpremul;
        }
    }
    if src_alpha == AlphaFormat::Opaque {
        ops.push(Op::ForceOpaque);
    } else if src_alpha == AlphaFormat::PremulAsEncoded {
        ops.push(Op::Unpremul);
    }

    if let Some((src, dst)) = profiles {
        if !dst.is_usable_as_destination() {
            return Err(CmsError::UnsupportedFeature);
        }
        let encode = inverted_destination_trc(dst)?;

        if src.approximately_equal(dst) {
            let trc = src.trc.ok_or(CmsError::UnsupportedFeature)?;
            ops.push(Op::Linearize(trc));
            if src_alpha == AlphaFormat::PremulLinear {
                ops.push(Op::Unpremul);
            }
            if dst_alpha == AlphaFormat::PremulLinear {
                ops.push(Op::Premul);
            }
            ops.push(Op::Encode(encode));
        } else {
            let dst_inverse = dst
                .to_xyz_d50
                .ok_or(CmsError::UnsupportedFeature)?
                .inverse()
                .ok_or(CmsError::ArithmeticFailure)?;
            if let Some(a_to_b) = src.a_to_b {
                ops.push(Op::DeviceToPcs(a_to_b));
                if src.pcs == DataColorSpace::Lab {
                    ops.push(Op::LabToXyz);
                }
                if src_alpha == AlphaFormat::PremulLinear {
                    ops.push(Op::Unpremul);
                }
                ops.push(Op::Matrix(dst_inverse));
            } else {
                let trc = src.trc.ok_or(CmsError::UnsupportedFeature)?;
                let src_matrix = src.to_xyz_d50.ok_or(CmsError::UnsupportedFeature)?;
                ops.push(Op::Linearize(trc));
                if src_alpha == AlphaFormat::PremulLinear {
                    ops.push(Op::Unpremul);
                }
                ops.push(Op::Matrix(dst_inverse.mat_mul(src_matrix)));
            }
            if dst_alpha == AlphaFormat::PremulLinear {
                ops.push(Op::Premul);
            }
            ops.push(Op::Encode(encode));
        }
    } else {
        // Pure layout conversion; premul-linear collapses to the encoded
        // variant because there is nothing to linearize against.
        if src_alpha == AlphaFormat::PremulLinear {
            ops.push(Op::Unpremul);
        }
        if dst_alpha == AlphaFormat::PremulLinear {
            ops.push(Op::Premul);
        }
    }

    if dst_alpha == AlphaFormat::PremulAsEncoded {
        ops.push(Op::Premul);
    } else if dst_alpha == AlphaFormat::Opaque {
        ops.push(Op::ForceOpaque);
    }
    if dst_swapped {
        ops.push(Op::SwapRb);
    }
    Ok(ops)
}

fn run(
    ops: &[Op],
    src: &[u8],
    src_layout: PixelLayout,
    dst: &mut [u8],
    dst_layout: PixelLayout,
    num_pixels: usize,
) {
    let mut working = [0f32; CHUNK_PIXELS * 4];
    let src_bpp = src_layout.bytes_per_pixel();
    let dst_bpp = dst_layout.bytes_per_pixel();
    let mut start = 0usize;
    while start < num_pixels {
        let count = (num_pixels - start).min(CHUNK_PIXELS);
        let lanes = &mut working[..count * 4];
        load_pixels(&src[start * src_bpp..(start + count) * src_bpp], src_layout, lanes);
        for op in ops {
            op.apply(lanes);
        }
        store_pixels(
            lanes,
            dst_layout,
            &mut dst[start * dst_bpp..(start + count) * dst_bpp],
        );
        start += count;
    }
}

/// Converts `num_pixels` pixels from the source layout, alpha handling and
/// profile to the destination ones. Both buffers must hold exactly
/// `num_pixels` pixels of their layout. Profiles must be supplied for both
/// sides or neither; with neither this is a pure layout conversion.
#[allow(clippy::too_many_arguments)]
pub fn transform(
    src: &[u8],
    src_layout: PixelLayout,
    src_alpha: AlphaFormat,
    src_profile: Option<&ColorProfile>,
    dst: &mut [u8],
    dst_layout: PixelLayout,
    dst_alpha: AlphaFormat,
    dst_profile: Option<&ColorProfile>,
    num_pixels: usize,
) -> Result<(), CmsError> {
    let src_len = num_pixels
        .checked_mul(src_layout.bytes_per_pixel())
        .ok_or(CmsError::LaneSizeMismatch)?;
    let dst_len = num_pixels
        .checked_mul(dst_layout.bytes_per_pixel())
        .ok_or(CmsError::LaneSizeMismatch)?;
    if src.len() != src_len || dst.len() != dst_len {
        return Err(CmsError::LaneSizeMismatch);
    }
    let ops = build_ops(
        src_alpha,
        src_profile,
        dst_alpha,
        dst_profile,
        src_layout.is_swapped(),
        dst_layout.is_swapped(),
    )?;
    run(&ops, src, src_layout, dst, dst_layout, num_pixels);
    Ok(())
}

/// In-place variant of [`transform`]: the buffer serves as both source and
/// destination, which requires identical bytes per pixel on both layouts.
/// Pixels are processed strictly left to right.
#[allow(clippy::too_many_arguments)]
pub fn transform_in_place(
    buffer: &mut [u8],
    src_layout: PixelLayout,
    src_alpha: AlphaFormat,
    src_profile: Option<&ColorProfile>,
    dst_layout: PixelLayout,
    dst_alpha: AlphaFormat,
    dst_profile: Option<&ColorProfile>,
    num_pixels: usize,
) -> Result<(), CmsError> {
    let bpp = src_layout.bytes_per_pixel();
    if bpp != dst_layout.bytes_per_pixel() {
        return Err(CmsError::AliasingViolation);
    }
    let expected = num_pixels
        .checked_mul(bpp)
        .ok_or(CmsError::LaneSizeMismatch)?;
    if buffer.len() != expected {
        return Err(CmsError::LaneSizeMismatch);
    }
    let ops = build_ops(
        src_alpha,
        src_profile,
        dst_alpha,
        dst_profile,
        src_layout.is_swapped(),
        dst_layout.is_swapped(),
    )?;

    let mut working = [0f32; CHUNK_PIXELS * 4];
    let mut start = 0usize;
    while start < num_pixels {
        let count = (num_pixels - start).min(CHUNK_PIXELS);
        let lanes = &mut working[..count * 4];
        let chunk = start * bpp..(start + count) * bpp;
        load_pixels(&buffer[chunk.clone()], src_layout, lanes);
        for op in &ops {
            op.apply(lanes);
        }
        store_pixels(lanes, dst_layout, &mut buffer[chunk]);
        start += count;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::{srgb_profile, xyz_d50_profile};
    use crate::profile::tests::build_profile;
    use rand::Rng;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn format_convert(
        src: &[u8],
        src_layout: PixelLayout,
        dst: &mut [u8],
        dst_layout: PixelLayout,
        num_pixels: usize,
    ) {
        transform(
            src,
            src_layout,
            AlphaFormat::Unpremul,
            None,
            dst,
            dst_layout,
            AlphaFormat::Unpremul,
            None,
            num_pixels,
        )
        .unwrap();
    }

    #[test]
    fn test_565_expansion() {
        let mut src = [0u8; 128];
        for i in 0..64u16 {
            let word = (i / 2) | (i << 5) | ((i / 2) << 11);
            src[i as usize * 2..i as usize * 2 + 2].copy_from_slice(&word.to_ne_bytes());
        }
        let mut dst = [0u8; 256];
        format_convert(&src, PixelLayout::Rgb565, &mut dst, PixelLayout::Rgba8, 64);
        let px = |i: usize| u32::from_le_bytes(dst[i * 4..i * 4 + 4].try_into().unwrap());
        for i in 0..64 {
            assert_eq!(px(i) >> 24, 0xff);
        }
        assert_eq!(px(0), 0xff000000);
        assert_eq!(px(20), 0xff525152);
        assert_eq!(px(62), 0xfffffbff);
        assert_eq!(px(63), 0xffffffff);
    }

    #[test]
    fn test_1010102_expansion() {
        let word: u32 = 1023 | (511 << 10) | (4 << 20) | (1 << 30);
        let src = word.to_ne_bytes();
        let mut dst = [0u8; 4];
        format_convert(&src, PixelLayout::Rgba1010102, &mut dst, PixelLayout::Rgba8, 1);
        assert_eq!(u32::from_le_bytes(dst), 0x55017fff);

        format_convert(&src, PixelLayout::Rgb101010x, &mut dst, PixelLayout::Rgba8, 1);
        assert_eq!(u32::from_le_bytes(dst), 0xff017fff);
    }

    #[test]
    fn test_half_float_rounding() {
        let halves: [u16; 4] = [0x3c00, 0x3800, 0x1805, 0x1804];
        let mut src = [0u8; 8];
        for (i, h) in halves.iter().enumerate() {
            src[i * 2..i * 2 + 2].copy_from_slice(&h.to_ne_bytes());
        }
        let mut dst = [0u8; 4];
        format_convert(&src, PixelLayout::RgbaF16, &mut dst, PixelLayout::Rgba8, 1);
        assert_eq!(u32::from_le_bytes(dst), 0x000180ff);

        let clamped: [u16; 4] = [0x4000, 0xbc00, 0x3c00, 0x3c00];
        for (i, h) in clamped.iter().enumerate() {
            src[i * 2..i * 2 + 2].copy_from_slice(&h.to_ne_bytes());
        }
        format_convert(&src, PixelLayout::RgbaF16, &mut dst, PixelLayout::Rgba8, 1);
        assert_eq!(dst[0], 0xff);
        assert_eq!(dst[1], 0x00);
    }

    #[test]
    fn test_16bit_big_endian_rounding() {
        let src = 0x7eff7efe7efd7efcu64.to_le_bytes();
        let mut dst = [0u8; 4];
        format_convert(&src, PixelLayout::Rgba16, &mut dst, PixelLayout::Rgba8, 1);
        assert_eq!(u32::from_le_bytes(dst), 0xfefefdfc);
    }

    #[test]
    fn test_format_identity_roundtrips() {
        let mut rng = StdRng::seed_from_u64(0x1337);
        for layout in [
            PixelLayout::Rgb565,
            PixelLayout::Bgr565,
            PixelLayout::Rgb8,
            PixelLayout::Rgba8,
            PixelLayout::Bgra8,
            PixelLayout::Rgba1010102,
            PixelLayout::Rgb16,
            PixelLayout::Rgba16,
        ] {
            let bytes = 64 * layout.bytes_per_pixel();
            let src: Vec<u8> = (0..bytes).map(|_| rng.random()).collect();
            let mut dst = vec![0u8; bytes];
            format_convert(&src, layout, &mut dst, layout, 64);
            assert_eq!(src, dst, "layout {layout:?}");
        }
    }

    #[test]
    fn test_swap_is_involution() {
        let mut rng = StdRng::seed_from_u64(7);
        let src: Vec<u8> = (0..256).map(|_| rng.random()).collect();
        let mut swapped = vec![0u8; 256];
        let mut back = vec![0u8; 256];
        format_convert(&src, PixelLayout::Rgba8, &mut swapped, PixelLayout::Bgra8, 64);
        format_convert(&swapped, PixelLayout::Bgra8, &mut back, PixelLayout::Rgba8, 64);
        assert_eq!(src, back);
        for (rgba, bgra) in src.chunks_exact(4).zip(swapped.chunks_exact(4)) {
            assert_eq!(rgba[0], bgra[2]);
            assert_eq!(rgba[1], bgra[1]);
            assert_eq!(rgba[2], bgra[0]);
            assert_eq!(rgba[3], bgra[3]);
        }
    }

    #[test]
    fn test_rgb_to_rgba_fills_opaque() {
        let src: Vec<u8> = (0..255).collect();
        let mut dst = vec![0u8; 85 * 4];
        format_convert(&src, PixelLayout::Rgb8, &mut dst, PixelLayout::Rgba8, 85);
        for (i, px) in dst.chunks_exact(4).enumerate() {
            assert_eq!(px[0] as usize, 3 * i);
            assert_eq!(px[1] as usize, 3 * i + 1);
            assert_eq!(px[2] as usize, 3 * i + 2);
            assert_eq!(px[3], 255);
        }
    }

    #[test]
    fn test_in_place_swap() {
        let mut buffer: Vec<u8> = (0..=255).collect();
        let expected: Vec<u8> = buffer
            .chunks_exact(4)
            .flat_map(|px| [px[2], px[1], px[0], px[3]])
            .collect();
        transform_in_place(
            &mut buffer,
            PixelLayout::Rgba8,
            AlphaFormat::Unpremul,
            None,
            PixelLayout::Bgra8,
            AlphaFormat::Unpremul,
            None,
            64,
        )
        .unwrap();
        assert_eq!(buffer, expected);
    }

    #[test]
    fn test_in_place_rejects_stride_mismatch() {
        let mut buffer = vec![0u8; 256];
        assert_eq!(
            transform_in_place(
                &mut buffer,
                PixelLayout::Rgba8,
                AlphaFormat::Unpremul,
                None,
                PixelLayout::Rgb8,
                AlphaFormat::Unpremul,
                None,
                64,
            ),
            Err(CmsError::AliasingViolation)
        );
    }

    #[test]
    fn test_buffer_length_is_validated() {
        let src = [0u8; 12];
        let mut dst = [0u8; 12];
        assert_eq!(
            transform(
                &src,
                PixelLayout::Rgba8,
                AlphaFormat::Unpremul,
                None,
                &mut dst,
                PixelLayout::Rgba8,
                AlphaFormat::Unpremul,
                None,
                4,
            ),
            Err(CmsError::LaneSizeMismatch)
        );
    }

    #[test]
    fn test_zero_pixels_is_noop() {
        let src = [0u8; 0];
        let mut dst = [0u8; 0];
        transform(
            &src,
            PixelLayout::Rgba8,
            AlphaFormat::Unpremul,
            None,
            &mut dst,
            PixelLayout::Rgb565,
            AlphaFormat::Unpremul,
            None,
            0,
        )
        .unwrap();
    }

    #[test]
    fn test_single_profile_is_rejected() {
        let src = [0u8; 4];
        let mut dst = [0u8; 4];
        assert_eq!(
            transform(
                &src,
                PixelLayout::Rgba8,
                AlphaFormat::Unpremul,
                Some(srgb_profile()),
                &mut dst,
                PixelLayout::Rgba8,
                AlphaFormat::Unpremul,
                None,
                1,
            ),
            Err(CmsError::UnsupportedFeature)
        );
    }

    #[test]
    fn test_unusable_destination_is_rejected() {
        let src = [0u8; 4];
        let mut dst = [0u8; 4];
        let blank = ColorProfile::new();
        assert_eq!(
            transform(
                &src,
                PixelLayout::Rgba8,
                AlphaFormat::Unpremul,
                Some(srgb_profile()),
                &mut dst,
                PixelLayout::Rgba8,
                AlphaFormat::Unpremul,
                Some(&blank),
                1,
            ),
            Err(CmsError::UnsupportedFeature)
        );
    }

    #[test]
    fn test_srgb_to_srgb_is_near_identity() {
        let src: Vec<u8> = (0..=255).flat_map(|v| [v, v, v, 255 - v]).collect();
        let mut dst = vec![0u8; src.len()];
        transform(
            &src,
            PixelLayout::Rgba8,
            AlphaFormat::Unpremul,
            Some(srgb_profile()),
            &mut dst,
            PixelLayout::Rgba8,
            AlphaFormat::Unpremul,
            Some(srgb_profile()),
            256,
        )
        .unwrap();
        for (got, want) in dst.iter().zip(src.iter()) {
            assert!(
                (*got as i32 - *want as i32).abs() <= 1,
                "got {got}, want {want}"
            );
        }
    }

    #[test]
    fn test_srgb_white_maps_to_d50() {
        let src: Vec<u8> = [1.0f32, 1.0, 1.0, 1.0]
            .iter()
            .flat_map(|v| v.to_ne_bytes())
            .collect();
        let mut dst = vec![0u8; 16];
        transform(
            &src,
            PixelLayout::RgbaF32,
            AlphaFormat::Unpremul,
            Some(srgb_profile()),
            &mut dst,
            PixelLayout::RgbaF32,
            AlphaFormat::Unpremul,
            Some(xyz_d50_profile()),
            1,
        )
        .unwrap();
        let out: Vec<f32> = dst
            .chunks_exact(4)
            .map(|c| f32::from_ne_bytes(c.try_into().unwrap()))
            .collect();
        assert!((out[0] - 0.9642).abs() < 2e-3);
        assert!((out[1] - 1.0).abs() < 2e-3);
        assert!((out[2] - 0.8249).abs() < 2e-3);
        assert!((out[3] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_a2b_identity_profile_passes_values_through() {
        let payload = crate::mab::tests::identity_mft2();
        let bytes = build_profile(0x02400000, &[(b"A2B0", payload)]);
        let profile = ColorProfile::new_from_slice(&bytes).unwrap();
        assert!(profile.a_to_b.is_some());

        let values = [0.25f32, 0.5, 0.75, 1.0];
        let src: Vec<u8> = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
        let mut dst = vec![0u8; 16];
        transform(
            &src,
            PixelLayout::RgbaF32,
            AlphaFormat::Unpremul,
            Some(&profile),
            &mut dst,
            PixelLayout::RgbaF32,
            AlphaFormat::Unpremul,
            Some(xyz_d50_profile()),
            1,
        )
        .unwrap();
        let out: Vec<f32> = dst
            .chunks_exact(4)
            .map(|c| f32::from_ne_bytes(c.try_into().unwrap()))
            .collect();
        for (got, want) in out.iter().zip(values.iter()).take(3) {
            assert!((got - want).abs() < 1e-3, "got {got}, want {want}");
        }
    }

    #[test]
    fn test_premul_alpha_roundtrip() {
        // 0x80 color premultiplied by 0x80 alpha unpremultiplies to 1.0.
        let src = [0x80u8, 0x80, 0x80, 0x80];
        let mut dst = [0u8; 4];
        transform(
            &src,
            PixelLayout::Rgba8,
            AlphaFormat::PremulAsEncoded,
            None,
            &mut dst,
            PixelLayout::Rgba8,
            AlphaFormat::Unpremul,
            None,
            1,
        )
        .unwrap();
        assert_eq!(dst, [0xff, 0xff, 0xff, 0x80]);
    }

    #[test]
    fn test_opaque_destination_forces_alpha() {
        let src = [10u8, 20, 30, 40];
        let mut dst = [0u8; 4];
        transform(
            &src,
            PixelLayout::Rgba8,
            AlphaFormat::Unpremul,
            None,
            &mut dst,
            PixelLayout::Rgba8,
            AlphaFormat::Opaque,
            None,
            1,
        )
        .unwrap();
        assert_eq!(dst, [10, 20, 30, 255]);
    }

    #[test]
    fn test_large_raster_crosses_chunks() {
        let n = CHUNK_PIXELS * 3 + 17;
        let mut rng = StdRng::seed_from_u64(99);
        let src: Vec<u8> = (0..n * 4).map(|_| rng.random()).collect();
        let mut dst = vec![0u8; n * 4];
        format_convert(&src, PixelLayout::Rgba8, &mut dst, PixelLayout::Rgba8, n);
        assert_eq!(src, dst);
    }
}
