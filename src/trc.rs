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
use crate::err::CmsError;
use crate::mlaf::mlaf;
use crate::reader::{read_u16_be, uint8_number_to_float, uint16_number_to_float};
use pxfm::f_powf;

/// Two branches must agree at `x = d` for a function to count as well-defined.
const WELL_DEFINED_TOLERANCE: f32 = 1e-5;

/// A transfer function mapping encoded values to linear values, represented
/// by this 7-parameter piecewise function:
///
/// ```text
/// linear = sign(encoded) *  (c*|encoded| + f)       , 0 <= |encoded| < d
///        = sign(encoded) * ((a*|encoded| + b)^g + e), d <= |encoded|
/// ```
///
/// A simple gamma curve sets `g` to the gamma and `a` to 1.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransferFunction {
    pub g: f32,
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl TransferFunction {
    #[allow(clippy::many_single_char_names)]
    pub const fn new(g: f32, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { g, a, b, c, d, e, f }
    }

    #[inline]
    pub fn eval(&self, x: f32) -> f32 {
        let sign = if x < 0. { -1f32 } else { 1f32 };
        let x = x * sign;
        let v = if x < self.d {
            mlaf(self.f, self.c, x)
        } else {
            f_powf(mlaf(self.b, self.a, x).max(0.), self.g) + self.e
        };
        sign * v
    }

    /// True when both branches are finite and meet at the crossover point.
    pub fn is_well_defined(&self) -> bool {
        if !(self.d >= 0.) {
            return false;
        }
        let linear = mlaf(self.f, self.c, self.d);
        let nonlinear = f_powf(mlaf(self.b, self.a, self.d).max(0.), self.g) + self.e;
        linear.is_finite()
            && nonlinear.is_finite()
            && (linear - nonlinear).abs() <= WELL_DEFINED_TOLERANCE
    }

    /// Analytic inverse of a well-defined, monotone increasing function.
    pub fn invert(&self) -> Result<TransferFunction, CmsError> {
        if !self.is_well_defined() {
            return Err(CmsError::ArithmeticFailure);
        }
        if self.g <= 0. || self.a <= 0. {
            return Err(CmsError::ArithmeticFailure);
        }
        if self.d > 0. && self.c <= 0. {
            return Err(CmsError::ArithmeticFailure);
        }

        let mut inverted = TransferFunction::default();
        if self.d > 0. {
            // y = c*x + f  =>  x = y/c - f/c
            inverted.c = 1. / self.c;
            inverted.f = -self.f / self.c;
            inverted.d = mlaf(self.f, self.c, self.d);
        }

        // y = (a*x + b)^g + e
        // ((y - e) / a^g)^(1/g) - b/a = x
        let a_pow_g = f_powf(self.a, self.g);
        inverted.g = 1. / self.g;
        inverted.a = 1. / a_pow_g;
        inverted.b = -self.e / a_pow_g;
        inverted.e = -self.b / self.a;

        let finite = inverted.g.is_finite()
            && inverted.a.is_finite()
            && inverted.b.is_finite()
            && inverted.c.is_finite()
            && inverted.d.is_finite()
            && inverted.e.is_finite()
            && inverted.f.is_finite();
        if !finite {
            return Err(CmsError::ArithmeticFailure);
        }
        Ok(inverted)
    }

    /// Bit-exact comparison, as required for caching byte-equal channel TRCs.
    pub(crate) fn bit_eq(&self, other: &TransferFunction) -> bool {
        self.g.to_bits() == other.g.to_bits()
            && self.a.to_bits() == other.a.to_bits()
            && self.b.to_bits() == other.b.to_bits()
            && self.c.to_bits() == other.c.to_bits()
            && self.d.to_bits() == other.d.to_bits()
            && self.e.to_bits() == other.e.to_bits()
            && self.f.to_bits() == other.f.to_bits()
    }
}

/// Unified representation of 'curv' or 'para' tag data, or a 1D table from
/// 'mft1'/'mft2'. Tables borrow the profile buffer and share its lifetime.
#[derive(Debug, Clone, Copy)]
pub enum Curve<'a> {
    Parametric(TransferFunction),
    /// 8-bit samples, evenly spaced on [0, 1].
    Table8(&'a [u8]),
    /// Big-endian 16-bit samples, evenly spaced on [0, 1].
    Table16(&'a [u8]),
}

#[inline]
fn eval_table(x: f32, entries: usize, sample: impl Fn(usize) -> f32) -> f32 {
    let ix = x.clamp(0., 1.) * (entries - 1) as f32;
    let lower = ix.floor() as usize;
    let upper = ix.ceil() as usize;
    let w = ix - lower as f32;
    mlaf(sample(lower) * (1. - w), sample(upper), w)
}

impl Curve<'_> {
    /// Number of table samples, 0 for a parametric curve.
    pub fn table_entries(&self) -> usize {
        match self {
            Curve::Parametric(_) => 0,
            Curve::Table8(table) => table.len(),
            Curve::Table16(table) => table.len() / 2,
        }
    }

    #[inline]
    pub fn eval(&self, x: f32) -> f32 {
        match *self {
            Curve::Parametric(parametric) => parametric.eval(x),
            Curve::Table8(table) => {
                eval_table(x, table.len(), |i| uint8_number_to_float(table[i]))
            }
            Curve::Table16(table) => {
                let entries = table.len() / 2;
                eval_table(x, entries, |i| {
                    uint16_number_to_float(read_u16_be(&table[i * 2..i * 2 + 2]))
                })
            }
        }
    }
}

/// Practical test that answers: is `curve` roughly the inverse of `inverse`?
/// Typically called with the inverse of a known parametric transfer function
/// (like sRGB) to detect whether a particular curve is very close to it.
pub fn are_approximate_inverses(curve: &Curve, inverse: &TransferFunction) -> bool {
    const TOLERANCE: f32 = 1. / 512.;
    let entries = match curve.table_entries() {
        0 => 256,
        n => n,
    };
    if entries < 2 {
        return false;
    }
    for i in 0..entries {
        let x = i as f32 / (entries - 1) as f32;
        let roundtrip = inverse.eval(curve.eval(x));
        if (roundtrip - x).abs() > TOLERANCE {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::{SRGB_TRANSFER_FUNCTION, srgb_inverse_transfer_function};

    #[test]
    fn test_srgb_inverse_composes_to_identity() {
        let tf = SRGB_TRANSFER_FUNCTION;
        let inverted = tf.invert().unwrap();
        for i in 0..=4096 {
            let x = i as f32 / 4096.;
            let roundtrip = inverted.eval(tf.eval(x));
            assert!(
                (roundtrip - x).abs() < 1e-6,
                "x = {x}, roundtrip = {roundtrip}"
            );
        }
    }

    #[test]
    fn test_analytic_inverse_matches_published() {
        let inverted = SRGB_TRANSFER_FUNCTION.invert().unwrap();
        let published = srgb_inverse_transfer_function();
        assert!((inverted.g - published.g).abs() < 1e-5);
        assert!((inverted.a - published.a).abs() < 1e-4);
        assert!((inverted.c - published.c).abs() < 1e-3);
        assert!((inverted.d - published.d).abs() < 1e-5);
        assert!((inverted.e - published.e).abs() < 1e-4);
    }

    #[test]
    fn test_non_monotone_rejected() {
        let tf = TransferFunction::new(2.2, -1., 0., 1., 0.5, 0., 0.);
        assert!(tf.invert().is_err());
    }

    #[test]
    fn test_discontinuous_rejected() {
        let tf = TransferFunction::new(2.2, 1., 0., 1., 0.5, 0.25, 0.);
        assert!(!tf.is_well_defined());
        assert!(tf.invert().is_err());
    }

    #[test]
    fn test_table16_interpolation() {
        // Two samples 0 and 65535, interpolation is the identity.
        let table = [0x00u8, 0x00, 0xff, 0xff];
        let curve = Curve::Table16(&table);
        assert_eq!(curve.table_entries(), 2);
        assert!((curve.eval(0.25) - 0.25).abs() < 1e-6);
        assert!((curve.eval(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_table8_interpolation() {
        let table = [0u8, 128, 255];
        let curve = Curve::Table8(&table);
        let mid = curve.eval(0.25);
        assert!((mid - 0.5 * (128. / 255.)).abs() < 1e-6);
    }

    #[test]
    fn test_srgb_table_is_recognized() {
        let mut table = [0u8; 512];
        for i in 0..256 {
            let x = i as f32 / 255.;
            let v = (SRGB_TRANSFER_FUNCTION.eval(x) * 65535.).round() as u16;
            table[i * 2..i * 2 + 2].copy_from_slice(&v.to_be_bytes());
        }
        let curve = Curve::Table16(&table);
        assert!(are_approximate_inverses(
            &curve,
            srgb_inverse_transfer_function()
        ));
        // A pure gamma 2.2 curve is not close enough to sRGB.
        let mut gamma = [0u8; 512];
        for i in 0..256 {
            let x = i as f32 / 255.;
            let v = (x.powf(2.2) * 65535.).round() as u16;
            gamma[i * 2..i * 2 + 2].copy_from_slice(&v.to_be_bytes());
        }
        let curve = Curve::Table16(&gamma);
        assert!(!are_approximate_inverses(
            &curve,
            srgb_inverse_transfer_function()
        ));
    }
}
