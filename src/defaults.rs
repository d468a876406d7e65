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

//! Canonical transfer functions and the two process-wide profile
//! singletons. Both singletons are plain statics, immutable and safe for
//! concurrent reads.

use crate::dat::ProfileDateTime;
use crate::matrix::{Matrix3f, SRGB_MATRIX};
use crate::profile::{ColorProfile, DataColorSpace, RenderingIntent};
use crate::trc::{Curve, TransferFunction};

/// IEC 61966-2.1.
pub(crate) const SRGB_TRANSFER_FUNCTION: TransferFunction =
    TransferFunction::new(2.4, 1. / 1.055, 0.055 / 1.055, 1. / 12.92, 0.04045, 0., 0.);

const SRGB_INVERSE_TRANSFER_FUNCTION: TransferFunction = TransferFunction::new(
    1. / 2.4,
    1.137119,
    0.,
    12.92,
    0.0031308,
    -0.055,
    0.,
);

const LINEAR_TRANSFER_FUNCTION: TransferFunction =
    TransferFunction::new(1., 1., 0., 0., 0., 0., 0.);

pub fn srgb_transfer_function() -> &'static TransferFunction {
    &SRGB_TRANSFER_FUNCTION
}

pub fn srgb_inverse_transfer_function() -> &'static TransferFunction {
    &SRGB_INVERSE_TRANSFER_FUNCTION
}

pub fn linear_transfer_function() -> &'static TransferFunction {
    &LINEAR_TRANSFER_FUNCTION
}

const fn singleton(parametric: TransferFunction, to_xyz_d50: Matrix3f) -> ColorProfile<'static> {
    ColorProfile {
        buffer: &[],
        size: 0,
        version: 0x04300000,
        data_color_space: DataColorSpace::Rgb,
        pcs: DataColorSpace::Xyz,
        rendering_intent: RenderingIntent::Perceptual,
        creation_date_time: ProfileDateTime::ZERO,
        device_attributes: 0,
        tag_count: 0,
        has_trc: true,
        trc: Some([Curve::Parametric(parametric); 3]),
        to_xyz_d50: Some(to_xyz_d50),
        a_to_b: None,
    }
}

static SRGB_PROFILE: ColorProfile<'static> = singleton(SRGB_TRANSFER_FUNCTION, SRGB_MATRIX);
static XYZ_D50_PROFILE: ColorProfile<'static> =
    singleton(LINEAR_TRANSFER_FUNCTION, Matrix3f::IDENTITY);

/// The sRGB color profile is so commonly used that we offer a canonical
/// instance of it.
pub fn srgb_profile() -> &'static ColorProfile<'static> {
    &SRGB_PROFILE
}

/// Ditto for XYZ-D50, the most common profile connection space.
pub fn xyz_d50_profile() -> &'static ColorProfile<'static> {
    &XYZ_D50_PROFILE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::primaries_to_xyz_d50;

    #[test]
    fn test_srgb_equals_itself() {
        assert!(srgb_profile().approximately_equal(srgb_profile()));
    }

    #[test]
    fn test_srgb_is_not_xyz_d50() {
        assert!(!srgb_profile().approximately_equal(xyz_d50_profile()));
    }

    #[test]
    fn test_singletons_are_usable_destinations() {
        let srgb = srgb_profile();
        assert!(srgb.has_trc);
        let Some([Curve::Parametric(tf), _, _]) = srgb.trc else {
            panic!("expected parametric trc");
        };
        assert!(tf.invert().is_ok());
        assert!(xyz_d50_profile().to_xyz_d50.is_some());
    }

    #[test]
    fn test_srgb_matrix_matches_primaries() {
        let m = primaries_to_xyz_d50(0.64, 0.33, 0.30, 0.60, 0.15, 0.06, 0.3127, 0.3290)
            .unwrap();
        assert!(m.test_equality(SRGB_MATRIX, 1e-4));
    }

    #[test]
    fn test_published_inverse_matches_analytic() {
        let analytic = SRGB_TRANSFER_FUNCTION.invert().unwrap();
        for i in 0..=256 {
            let x = i as f32 / 256.;
            let published = SRGB_INVERSE_TRANSFER_FUNCTION.eval(x);
            assert!((published - analytic.eval(x)).abs() < 1e-4);
        }
    }
}
