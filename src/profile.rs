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
use crate::chad::adapt_to_d50;
use crate::dat::ProfileDateTime;
use crate::err::CmsError;
use crate::mab::{AToB, read_a_to_b};
use crate::matrix::{Chromaticity, Matrix3f, XyY, Xyz};
use crate::reader::{
    read_s15_fixed16_be, read_u16_be, read_u32_be, read_u64_be, u8_fixed8_number_to_float,
};
use crate::trc::{Curve, TransferFunction};

/// 128 byte header plus the 4 byte tag count.
pub(crate) const HEADER_SIZE: usize = 132;
pub(crate) const TAG_SIZE: usize = 12;
const MAX_PROFILE_SIZE: usize = 1024 * 1024 * 3;

const ACSP_SIGNATURE: u32 = u32::from_ne_bytes(*b"acsp").to_be();
pub(crate) const MARK_TRC_CURV: u32 = u32::from_ne_bytes(*b"curv").to_be();
pub(crate) const MARK_TRC_PARAM: u32 = u32::from_ne_bytes(*b"para").to_be();
const XYZ_TYPE: u32 = u32::from_ne_bytes(*b"XYZ ").to_be();

const R_TAG_XYZ: u32 = u32::from_ne_bytes(*b"rXYZ").to_be();
const G_TAG_XYZ: u32 = u32::from_ne_bytes(*b"gXYZ").to_be();
const B_TAG_XYZ: u32 = u32::from_ne_bytes(*b"bXYZ").to_be();
const R_TAG_TRC: u32 = u32::from_ne_bytes(*b"rTRC").to_be();
const G_TAG_TRC: u32 = u32::from_ne_bytes(*b"gTRC").to_be();
const B_TAG_TRC: u32 = u32::from_ne_bytes(*b"bTRC").to_be();
const ATOB0_TAG: u32 = u32::from_ne_bytes(*b"A2B0").to_be();

pub(crate) const LUT_MFT1: u32 = u32::from_ne_bytes(*b"mft1").to_be();
pub(crate) const LUT_MFT2: u32 = u32::from_ne_bytes(*b"mft2").to_be();
pub(crate) const LUT_MAB: u32 = u32::from_ne_bytes(*b"mAB ").to_be();
pub(crate) const LUT_MBA: u32 = u32::from_ne_bytes(*b"mBA ").to_be();

#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Default, Hash)]
pub enum DataColorSpace {
    #[default]
    Xyz,
    Lab,
    Rgb,
    Gray,
    Cmyk,
}

impl TryFrom<u32> for DataColorSpace {
    type Error = CmsError;
    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value == u32::from_ne_bytes(*b"XYZ ").to_be() {
            return Ok(DataColorSpace::Xyz);
        } else if value == u32::from_ne_bytes(*b"Lab ").to_be() {
            return Ok(DataColorSpace::Lab);
        } else if value == u32::from_ne_bytes(*b"RGB ").to_be() {
            return Ok(DataColorSpace::Rgb);
        } else if value == u32::from_ne_bytes(*b"GRAY").to_be() {
            return Ok(DataColorSpace::Gray);
        } else if value == u32::from_ne_bytes(*b"CMYK").to_be() {
            return Ok(DataColorSpace::Cmyk);
        }
        Err(CmsError::InvalidHeader)
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub enum RenderingIntent {
    AbsoluteColorimetric = 3,
    Saturation = 2,
    RelativeColorimetric = 1,
    #[default]
    Perceptual = 0,
}

impl TryFrom<u32> for RenderingIntent {
    type Error = CmsError;
    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(RenderingIntent::Perceptual),
            1 => Ok(RenderingIntent::RelativeColorimetric),
            2 => Ok(RenderingIntent::Saturation),
            3 => Ok(RenderingIntent::AbsoluteColorimetric),
            _ => Err(CmsError::InvalidHeader),
        }
    }
}

/// One tag table entry with its borrowed payload.
#[derive(Debug, Clone, Copy)]
pub struct ProfileTag<'a> {
    pub signature: u32,
    pub tag_type: u32,
    pub size: u32,
    pub data: &'a [u8],
}

/// Parsed ICC profile. The profile borrows the byte buffer it was parsed
/// from; curves and LUT tables are slices into that buffer.
#[derive(Debug, Clone)]
pub struct ColorProfile<'a> {
    pub(crate) buffer: &'a [u8],
    pub size: u32,
    pub version: u32,
    pub data_color_space: DataColorSpace,
    pub pcs: DataColorSpace,
    pub rendering_intent: RenderingIntent,
    pub creation_date_time: ProfileDateTime,
    pub device_attributes: u64,
    pub tag_count: u32,
    /// True when all three TRC tags resolved to byte-identical parametric
    /// curves. Tabulated TRCs are still stored in `trc` when this is false.
    pub has_trc: bool,
    pub trc: Option<[Curve<'a>; 3]>,
    pub to_xyz_d50: Option<Matrix3f>,
    pub a_to_b: Option<AToB<'a>>,
}

/// Parses both curveType and parametricCurveType payloads. Returns the curve
/// together with the number of bytes it occupied, so 'mAB ' curve sequences
/// can walk to the next element.
pub(crate) fn read_curve(tag: &[u8]) -> Result<(Curve<'_>, usize), CmsError> {
    if tag.len() < 12 {
        return Err(CmsError::InvalidTag);
    }
    let curve_type = read_u32_be(&tag[0..4]);
    if curve_type == MARK_TRC_PARAM {
        let function_type = read_u16_be(&tag[8..10]) as usize;
        const COUNT_TO_LENGTH: [usize; 5] = [1, 3, 4, 5, 7];
        if function_type >= COUNT_TO_LENGTH.len() {
            return Err(CmsError::InvalidTag);
        }
        let param_count = COUNT_TO_LENGTH[function_type];
        let end = 12 + param_count * size_of::<u32>();
        if tag.len() < end {
            return Err(CmsError::InvalidTag);
        }
        let mut params = [0f32; 7];
        for (value, param) in tag[12..end].chunks_exact(4).zip(params.iter_mut()) {
            *param = read_s15_fixed16_be(value);
        }
        let mut parametric = TransferFunction::new(params[0], 1., 0., 0., 0., 0., 0.);
        match function_type {
            0 => {}
            1 => {
                parametric.a = params[1];
                parametric.b = params[2];
                if parametric.a == 0. {
                    return Err(CmsError::InvalidTag);
                }
                parametric.d = -parametric.b / parametric.a;
            }
            2 => {
                parametric.a = params[1];
                parametric.b = params[2];
                parametric.e = params[3];
                if parametric.a == 0. {
                    return Err(CmsError::InvalidTag);
                }
                parametric.d = -parametric.b / parametric.a;
                parametric.f = parametric.e;
            }
            3 => {
                parametric.a = params[1];
                parametric.b = params[2];
                parametric.c = params[3];
                parametric.d = params[4];
            }
            _ => {
                parametric.a = params[1];
                parametric.b = params[2];
                parametric.c = params[3];
                parametric.d = params[4];
                parametric.e = params[5];
                parametric.f = params[6];
            }
        }
        Ok((Curve::Parametric(parametric), end))
    } else if curve_type == MARK_TRC_CURV {
        let value_count = read_u32_be(&tag[8..12]) as usize;
        if value_count > 40000 {
            return Err(CmsError::InvalidTag);
        }
        let end = 12 + value_count * size_of::<u16>();
        if tag.len() < end {
            return Err(CmsError::InvalidTag);
        }
        if value_count == 0 {
            // Empty tables are a shorthand for linear.
            Ok((
                Curve::Parametric(TransferFunction::new(1., 1., 0., 0., 0., 0., 0.)),
                12,
            ))
        } else if value_count == 1 {
            // Single entry tables are a shorthand for simple gamma.
            let gamma = u8_fixed8_number_to_float(read_u16_be(&tag[12..14]));
            Ok((
                Curve::Parametric(TransferFunction::new(gamma, 1., 0., 0., 0., 0., 0.)),
                end,
            ))
        } else {
            Ok((Curve::Table16(&tag[12..end]), end))
        }
    } else {
        Err(CmsError::InvalidTag)
    }
}

fn read_xyz_tag(tag: &ProfileTag) -> Result<Xyz, CmsError> {
    if tag.tag_type != XYZ_TYPE || tag.data.len() < 20 {
        return Err(CmsError::InvalidTag);
    }
    Ok(Xyz::new(
        read_s15_fixed16_be(&tag.data[8..12]),
        read_s15_fixed16_be(&tag.data[12..16]),
        read_s15_fixed16_be(&tag.data[16..20]),
    ))
}

impl<'a> ColorProfile<'a> {
    /// Parses an ICC v2/v4 profile. The buffer is not copied and must
    /// outlive the returned profile.
    pub fn new_from_slice(slice: &'a [u8]) -> Result<Self, CmsError> {
        if slice.len() < HEADER_SIZE || slice.len() >= MAX_PROFILE_SIZE {
            return Err(CmsError::InvalidHeader);
        }
        let signature = read_u32_be(&slice[36..40]);
        if signature != ACSP_SIGNATURE {
            return Err(CmsError::InvalidHeader);
        }
        let version = read_u32_be(&slice[8..12]);
        if (version >> 24) > 4 {
            // iccMAX and anything newer is recognized but rejected.
            return Err(CmsError::UnsupportedVersion);
        }
        let size = read_u32_be(&slice[0..4]);
        let tag_count = read_u32_be(&slice[128..132]);
        let tag_table_end = HEADER_SIZE as u64 + tag_count as u64 * TAG_SIZE as u64;
        if size as usize > slice.len() || (size as u64) < tag_table_end {
            return Err(CmsError::InvalidHeader);
        }

        let data_color_space = DataColorSpace::try_from(read_u32_be(&slice[16..20]))?;
        if !matches!(
            data_color_space,
            DataColorSpace::Rgb | DataColorSpace::Gray | DataColorSpace::Cmyk
        ) {
            return Err(CmsError::InvalidHeader);
        }
        let pcs = DataColorSpace::try_from(read_u32_be(&slice[20..24]))?;
        if !matches!(pcs, DataColorSpace::Xyz | DataColorSpace::Lab) {
            return Err(CmsError::InvalidHeader);
        }

        let illuminant = Xyz::new(
            read_s15_fixed16_be(&slice[68..72]),
            read_s15_fixed16_be(&slice[72..76]),
            read_s15_fixed16_be(&slice[76..80]),
        );
        if (illuminant.x - 0.9642).abs() > 0.0100
            || (illuminant.y - 1.0000).abs() > 0.0100
            || (illuminant.z - 0.8249).abs() > 0.0100
        {
            return Err(CmsError::InvalidHeader);
        }

        let mut profile = ColorProfile {
            buffer: slice,
            size,
            version,
            data_color_space,
            pcs,
            rendering_intent: RenderingIntent::try_from(read_u32_be(&slice[64..68]))
                .unwrap_or_default(),
            creation_date_time: ProfileDateTime::new_from_slice(&slice[24..36])?,
            device_attributes: read_u64_be(&slice[56..64]),
            tag_count,
            has_trc: false,
            trc: None,
            to_xyz_d50: None,
            a_to_b: None,
        };

        for i in 0..tag_count {
            let entry = HEADER_SIZE + i as usize * TAG_SIZE;
            let table = &slice[entry..entry + TAG_SIZE];
            let tag_offset = read_u32_be(&table[4..8]) as u64;
            let tag_size = read_u32_be(&table[8..12]) as u64;
            if tag_size < 4 || tag_offset + tag_size > size as u64 {
                return Err(CmsError::InvalidTagTable);
            }
        }

        profile.extract_trc();
        profile.extract_to_xyz_d50();
        profile.a_to_b = profile
            .tag_by_signature(ATOB0_TAG)
            .and_then(|tag| read_a_to_b(&tag).ok());

        Ok(profile)
    }

    fn extract_trc(&mut self) {
        let tags = (
            self.tag_by_signature(R_TAG_TRC),
            self.tag_by_signature(G_TAG_TRC),
            self.tag_by_signature(B_TAG_TRC),
        );
        let (Some(r), Some(g), Some(b)) = tags else {
            return;
        };
        let curves = (
            read_curve(r.data),
            read_curve(g.data),
            read_curve(b.data),
        );
        let (Ok((r, _)), Ok((g, _)), Ok((b, _))) = curves else {
            return;
        };
        self.has_trc = match (&r, &g, &b) {
            (Curve::Parametric(pr), Curve::Parametric(pg), Curve::Parametric(pb)) => {
                pr.bit_eq(pg) && pr.bit_eq(pb)
            }
            _ => false,
        };
        self.trc = Some([r, g, b]);
    }

    fn extract_to_xyz_d50(&mut self) {
        let tags = (
            self.tag_by_signature(R_TAG_XYZ),
            self.tag_by_signature(G_TAG_XYZ),
            self.tag_by_signature(B_TAG_XYZ),
        );
        let (Some(rt), Some(gt), Some(bt)) = tags else {
            return;
        };
        let (Ok(r), Ok(g), Ok(b)) = (read_xyz_tag(&rt), read_xyz_tag(&gt), read_xyz_tag(&bt))
        else {
            return;
        };
        self.to_xyz_d50 = Some(Matrix3f {
            v: [[r.x, g.x, b.x], [r.y, g.y, b.y], [r.z, g.z, b.z]],
        });
    }

    /// Fetches a tag table entry by position.
    pub fn tag_by_index(&self, index: u32) -> Option<ProfileTag<'a>> {
        if index >= self.tag_count {
            return None;
        }
        let entry = HEADER_SIZE + index as usize * TAG_SIZE;
        let table = &self.buffer[entry..entry + TAG_SIZE];
        let signature = read_u32_be(&table[0..4]);
        let offset = read_u32_be(&table[4..8]) as usize;
        let size = read_u32_be(&table[8..12]);
        let data = &self.buffer[offset..offset + size as usize];
        Some(ProfileTag {
            signature,
            tag_type: read_u32_be(&data[0..4]),
            size,
            data,
        })
    }

    /// Fetches the first tag carrying `signature`.
    pub fn tag_by_signature(&self, signature: u32) -> Option<ProfileTag<'a>> {
        (0..self.tag_count)
            .filter_map(|i| self.tag_by_index(i))
            .find(|tag| tag.signature == signature)
    }

    /// Practical equality test: can one profile substitute for the other?
    pub fn approximately_equal(&self, other: &ColorProfile<'_>) -> bool {
        const MATRIX_TOLERANCE: f32 = 1. / 512.;
        if std::ptr::eq(
            self as *const ColorProfile<'a> as *const u8,
            other as *const ColorProfile<'_> as *const u8,
        ) {
            return true;
        }
        if let (Some(a), Some(b)) = (self.to_xyz_d50, other.to_xyz_d50) {
            if self.has_trc && other.has_trc && a.test_equality(b, MATRIX_TOLERANCE) {
                if let (Some(lhs), Some(rhs)) = (&self.trc, &other.trc) {
                    let trc_equal = lhs.iter().zip(rhs.iter()).all(|(x, y)| match (x, y) {
                        (Curve::Parametric(p), Curve::Parametric(q)) => p.bit_eq(q),
                        _ => false,
                    });
                    if trc_equal {
                        return true;
                    }
                }
            }
        }
        !self.buffer.is_empty()
            && self.buffer.len() == other.buffer.len()
            && self.buffer == other.buffer
    }

    /// Replaces the TRC trio with a single parametric curve.
    pub fn set_transfer_function(&mut self, parametric: TransferFunction) {
        self.has_trc = true;
        self.trc = Some([Curve::Parametric(parametric); 3]);
    }

    pub fn set_to_xyz_d50(&mut self, to_xyz_d50: Matrix3f) {
        self.to_xyz_d50 = Some(to_xyz_d50);
    }
}

impl ColorProfile<'static> {
    /// Blank RGB/XYZ profile for programmatic construction.
    pub fn new() -> ColorProfile<'static> {
        ColorProfile {
            buffer: &[],
            size: 0,
            version: 0,
            data_color_space: DataColorSpace::Rgb,
            pcs: DataColorSpace::Xyz,
            rendering_intent: RenderingIntent::Perceptual,
            creation_date_time: ProfileDateTime::ZERO,
            device_attributes: 0,
            tag_count: 0,
            has_trc: false,
            trc: None,
            to_xyz_d50: None,
            a_to_b: None,
        }
    }
}

impl Default for ColorProfile<'static> {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes an RGB to XYZ-D50 matrix from chromaticities and a white point,
/// Bradford adapting the result from the given white to D50.
#[allow(clippy::too_many_arguments)]
pub fn primaries_to_xyz_d50(
    rx: f32,
    ry: f32,
    gx: f32,
    gy: f32,
    bx: f32,
    by: f32,
    wx: f32,
    wy: f32,
) -> Result<Matrix3f, CmsError> {
    let red = Chromaticity::new(rx, ry).to_xyz();
    let green = Chromaticity::new(gx, gy).to_xyz();
    let blue = Chromaticity::new(bx, by).to_xyz();
    let primaries = Matrix3f {
        v: [
            [red.x, green.x, blue.x],
            [red.y, green.y, blue.y],
            [red.z, green.z, blue.z],
        ],
    };
    let white = Chromaticity::new(wx, wy).to_xyz();
    let inverse = primaries.inverse().ok_or(CmsError::ArithmeticFailure)?;
    let scale = inverse.mul_vector(white.to_vector());
    let scaled = primaries
        .mul_row_vector::<0>(scale)
        .mul_row_vector::<1>(scale)
        .mul_row_vector::<2>(scale);
    adapt_to_d50(Some(scaled), XyY { x: wx, y: wy, yb: 1. }).ok_or(CmsError::ArithmeticFailure)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::defaults::SRGB_TRANSFER_FUNCTION;
    use crate::matrix::SRGB_MATRIX;

    fn push_u32(out: &mut Vec<u8>, value: u32) {
        out.extend_from_slice(&value.to_be_bytes());
    }

    fn fixed(value: f32) -> u32 {
        ((value * 65536.0).round() as i32) as u32
    }

    fn para_type4(tf: &TransferFunction) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"para");
        push_u32(&mut out, 0);
        out.extend_from_slice(&4u16.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        for p in [tf.g, tf.a, tf.b, tf.c, tf.d, tf.e, tf.f] {
            push_u32(&mut out, fixed(p));
        }
        out
    }

    fn xyz_tag(x: f32, y: f32, z: f32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"XYZ ");
        push_u32(&mut out, 0);
        push_u32(&mut out, fixed(x));
        push_u32(&mut out, fixed(y));
        push_u32(&mut out, fixed(z));
        out
    }

    fn curv_tag(values: &[u16]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"curv");
        push_u32(&mut out, 0);
        push_u32(&mut out, values.len() as u32);
        for v in values {
            out.extend_from_slice(&v.to_be_bytes());
        }
        out
    }

    /// Assembles a valid profile around the supplied tags.
    pub(crate) fn build_profile(version: u32, tags: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
        let mut header = Vec::with_capacity(128);
        push_u32(&mut header, 0); // size, patched below
        push_u32(&mut header, 0); // cmm
        push_u32(&mut header, version);
        header.extend_from_slice(b"mntr");
        header.extend_from_slice(b"RGB ");
        header.extend_from_slice(b"XYZ ");
        header.extend_from_slice(&[0u8; 12]); // creation date
        header.extend_from_slice(b"acsp");
        push_u32(&mut header, 0); // platform
        push_u32(&mut header, 0); // flags
        push_u32(&mut header, 0); // manufacturer
        push_u32(&mut header, 0); // model
        header.extend_from_slice(&[0u8; 8]); // attributes
        push_u32(&mut header, 1); // rendering intent
        push_u32(&mut header, 0x0000F6D6); // D50 X
        push_u32(&mut header, 0x00010000); // D50 Y
        push_u32(&mut header, 0x0000D32D); // D50 Z
        push_u32(&mut header, 0); // creator
        header.extend_from_slice(&[0u8; 16]); // profile id
        header.extend_from_slice(&[0u8; 28]); // reserved
        assert_eq!(header.len(), 128);

        let mut table = Vec::new();
        let mut payloads = Vec::new();
        let payload_base = HEADER_SIZE + tags.len() * TAG_SIZE;
        for (signature, payload) in tags {
            table.extend_from_slice(*signature);
            push_u32(&mut table, (payload_base + payloads.len()) as u32);
            push_u32(&mut table, payload.len() as u32);
            payloads.extend_from_slice(payload);
        }

        let mut profile = header;
        push_u32(&mut profile, tags.len() as u32);
        profile.extend_from_slice(&table);
        profile.extend_from_slice(&payloads);
        let total = profile.len() as u32;
        profile[0..4].copy_from_slice(&total.to_be_bytes());
        profile
    }

    pub(crate) fn srgb_profile_bytes() -> Vec<u8> {
        let para = para_type4(&SRGB_TRANSFER_FUNCTION);
        let m = SRGB_MATRIX;
        build_profile(
            0x02400000,
            &[
                (b"rTRC", para.clone()),
                (b"gTRC", para.clone()),
                (b"bTRC", para),
                (b"rXYZ", xyz_tag(m.v[0][0], m.v[1][0], m.v[2][0])),
                (b"gXYZ", xyz_tag(m.v[0][1], m.v[1][1], m.v[2][1])),
                (b"bXYZ", xyz_tag(m.v[0][2], m.v[1][2], m.v[2][2])),
            ],
        )
    }

    #[test]
    fn test_srgb_profile_parses() {
        let bytes = srgb_profile_bytes();
        let profile = ColorProfile::new_from_slice(&bytes).unwrap();
        assert!(profile.has_trc);
        assert!(profile.to_xyz_d50.is_some());
        assert!(profile.a_to_b.is_none());
        assert_eq!(profile.data_color_space, DataColorSpace::Rgb);
        assert_eq!(profile.pcs, DataColorSpace::Xyz);
        assert_eq!(profile.tag_count, 6);

        let matrix = profile.to_xyz_d50.unwrap();
        assert!(matrix.test_equality(SRGB_MATRIX, 1. / 512.));

        let Some([Curve::Parametric(r), Curve::Parametric(g), Curve::Parametric(b)]) = profile.trc
        else {
            panic!("expected parametric curves");
        };
        assert!(r.bit_eq(&g) && r.bit_eq(&b));
        assert!((r.g - SRGB_TRANSFER_FUNCTION.g).abs() < 1e-4);
        assert!((r.a - SRGB_TRANSFER_FUNCTION.a).abs() < 1e-4);
        assert!((r.d - SRGB_TRANSFER_FUNCTION.d).abs() < 1e-4);
    }

    #[test]
    fn test_iccmax_is_rejected() {
        let bytes = srgb_profile_bytes();
        let mut iccmax = bytes.clone();
        iccmax[8] = 5;
        assert_eq!(
            ColorProfile::new_from_slice(&iccmax).unwrap_err(),
            CmsError::UnsupportedVersion
        );
    }

    #[test]
    fn test_truncated_buffer_is_rejected() {
        let bytes = srgb_profile_bytes();
        assert_eq!(
            ColorProfile::new_from_slice(&bytes[..64]).unwrap_err(),
            CmsError::InvalidHeader
        );
        assert_eq!(
            ColorProfile::new_from_slice(&[0x42u8]).unwrap_err(),
            CmsError::InvalidHeader
        );
    }

    #[test]
    fn test_bad_signature_is_rejected() {
        let mut bytes = srgb_profile_bytes();
        bytes[36] = b'x';
        assert_eq!(
            ColorProfile::new_from_slice(&bytes).unwrap_err(),
            CmsError::InvalidHeader
        );
    }

    #[test]
    fn test_wrong_illuminant_is_rejected() {
        let mut bytes = srgb_profile_bytes();
        // D65-ish X instead of D50.
        bytes[68..72].copy_from_slice(&0x0000F351u32.to_be_bytes());
        assert_eq!(
            ColorProfile::new_from_slice(&bytes).unwrap_err(),
            CmsError::InvalidHeader
        );
    }

    #[test]
    fn test_tag_overflow_is_rejected() {
        let mut bytes = srgb_profile_bytes();
        // Blow up the first tag's size so offset + size passes the end.
        let entry = HEADER_SIZE + 8;
        bytes[entry..entry + 4].copy_from_slice(&0x00ffffffu32.to_be_bytes());
        assert_eq!(
            ColorProfile::new_from_slice(&bytes).unwrap_err(),
            CmsError::InvalidTagTable
        );
    }

    #[test]
    fn test_tag_lookup() {
        let bytes = srgb_profile_bytes();
        let profile = ColorProfile::new_from_slice(&bytes).unwrap();
        let tag = profile.tag_by_signature(R_TAG_TRC).unwrap();
        assert_eq!(tag.tag_type, MARK_TRC_PARAM);
        assert!(tag.size > 12);
        assert!(profile.tag_by_index(6).is_none());
        assert_eq!(profile.tag_by_index(0).unwrap().signature, R_TAG_TRC);
        assert!(profile.tag_by_signature(0x41424344).is_none());
    }

    #[test]
    fn test_empty_curv_means_identity() {
        let payload = curv_tag(&[]);
        let (curve, _) = read_curve(&payload).unwrap();
        let Curve::Parametric(tf) = curve else {
            panic!("expected parametric");
        };
        for i in 0..=16 {
            let x = i as f32 / 16.;
            assert!((tf.eval(x) - x).abs() < 1e-6);
        }
    }

    #[test]
    fn test_single_entry_curv_means_gamma() {
        // 2.2 gamma in 8.8 fixed point.
        let payload = curv_tag(&[0x0233]);
        let (curve, _) = read_curve(&payload).unwrap();
        let Curve::Parametric(tf) = curve else {
            panic!("expected parametric");
        };
        assert!((tf.g - 563. / 256.).abs() < 1e-6);
        let x = 0.5f32;
        assert!((tf.eval(x) - x.powf(563. / 256.)).abs() < 1e-4);
    }

    #[test]
    fn test_gamut_tags_read_for_any_color_space() {
        let mut bytes = srgb_profile_bytes();
        bytes[16..20].copy_from_slice(b"GRAY");
        let profile = ColorProfile::new_from_slice(&bytes).unwrap();
        assert_eq!(profile.data_color_space, DataColorSpace::Gray);
        assert!(profile.to_xyz_d50.is_some());
        let matrix = profile.to_xyz_d50.unwrap();
        assert!(matrix.test_equality(SRGB_MATRIX, 1. / 512.));
    }

    #[test]
    fn test_tabulated_trc_disables_has_trc() {
        let table: Vec<u16> = (0..256).map(|i| (i * 257) as u16).collect();
        let para = para_type4(&SRGB_TRANSFER_FUNCTION);
        let m = SRGB_MATRIX;
        let bytes = build_profile(
            0x02400000,
            &[
                (b"rTRC", curv_tag(&table)),
                (b"gTRC", para.clone()),
                (b"bTRC", para),
                (b"rXYZ", xyz_tag(m.v[0][0], m.v[1][0], m.v[2][0])),
                (b"gXYZ", xyz_tag(m.v[0][1], m.v[1][1], m.v[2][1])),
                (b"bXYZ", xyz_tag(m.v[0][2], m.v[1][2], m.v[2][2])),
            ],
        );
        let profile = ColorProfile::new_from_slice(&bytes).unwrap();
        assert!(!profile.has_trc);
        assert!(profile.trc.is_some());
    }

    #[test]
    fn test_primaries_to_xyz_d50_matches_srgb() {
        let m = primaries_to_xyz_d50(0.64, 0.33, 0.30, 0.60, 0.15, 0.06, 0.3127, 0.3290)
            .unwrap();
        assert!(m.test_equality(SRGB_MATRIX, 1e-4));
    }

    #[test]
    fn test_degenerate_primaries_fail() {
        assert_eq!(
            primaries_to_xyz_d50(0.3, 0.3, 0.3, 0.3, 0.3, 0.3, 0.3127, 0.3290),
            Err(CmsError::ArithmeticFailure)
        );
    }
}
