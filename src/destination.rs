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

//! Destination rewriting: a transform destination needs a gamut matrix and
//! invertible parametric curves, so tabulated TRCs get replaced by fitted
//! approximations and any A2B data is discarded.

use crate::err::CmsError;
use crate::fit::approximate_curve;
use crate::profile::ColorProfile;
use crate::trc::{Curve, TransferFunction};

fn max_curve_error(parametric: &TransferFunction, curve: &Curve) -> f32 {
    let entries = match curve.table_entries() {
        0 => 256,
        n => n,
    };
    let mut worst = 0f32;
    for i in 0..entries {
        let x = i as f32 / (entries - 1) as f32;
        let err = (parametric.eval(x) - curve.eval(x)).abs();
        if err > worst {
            worst = err;
        }
    }
    worst
}

impl ColorProfile<'_> {
    /// True when the profile can already serve as a transform destination:
    /// a gamut matrix plus invertible parametric curves on every channel.
    pub fn is_usable_as_destination(&self) -> bool {
        if self.to_xyz_d50.is_none() {
            return false;
        }
        let Some(trc) = &self.trc else {
            return false;
        };
        trc.iter().all(|curve| match curve {
            Curve::Parametric(parametric) => parametric.invert().is_ok(),
            _ => false,
        })
    }

    /// Rewrites the profile so it can be used as a destination, fitting
    /// each tabulated TRC with a parametric approximation. A2B data cannot
    /// be inverted and is dropped.
    pub fn make_usable_as_destination(&mut self) -> Result<(), CmsError> {
        if self.is_usable_as_destination() {
            self.a_to_b = None;
            return Ok(());
        }
        if self.to_xyz_d50.is_none() {
            return Err(CmsError::UnsupportedFeature);
        }
        let trc = self.trc.ok_or(CmsError::UnsupportedFeature)?;

        let mut fitted = [TransferFunction::default(); 3];
        for (slot, curve) in fitted.iter_mut().zip(trc.iter()) {
            let parametric = match curve {
                Curve::Parametric(parametric) => *parametric,
                tabulated => approximate_curve(tabulated)?.0,
            };
            parametric.invert()?;
            *slot = parametric;
        }

        self.has_trc = fitted[0].bit_eq(&fitted[1]) && fitted[0].bit_eq(&fitted[2]);
        self.trc = Some([
            Curve::Parametric(fitted[0]),
            Curve::Parametric(fitted[1]),
            Curve::Parametric(fitted[2]),
        ]);
        self.a_to_b = None;
        Ok(())
    }

    /// Like [`Self::make_usable_as_destination`], but all three channels end
    /// up sharing one curve: the candidate minimizing the summed per-channel
    /// max errors, rejected if its worst channel error exceeds 1/256.
    pub fn make_usable_as_destination_with_single_curve(&mut self) -> Result<(), CmsError> {
        const SHARED_TOLERANCE: f32 = 1. / 256.;
        if self.to_xyz_d50.is_none() {
            return Err(CmsError::UnsupportedFeature);
        }
        let trc = self.trc.ok_or(CmsError::UnsupportedFeature)?;

        let mut best: Option<(TransferFunction, f32, f32)> = None;
        for candidate_curve in trc.iter() {
            let candidate = match candidate_curve {
                Curve::Parametric(parametric) => *parametric,
                tabulated => match approximate_curve(tabulated) {
                    Ok((parametric, _)) => parametric,
                    Err(_) => continue,
                },
            };
            if candidate.invert().is_err() {
                continue;
            }
            let mut sum = 0f32;
            let mut worst = 0f32;
            for channel in trc.iter() {
                let err = max_curve_error(&candidate, channel);
                sum += err;
                worst = worst.max(err);
            }
            if best.as_ref().is_none_or(|(_, best_sum, _)| sum < *best_sum) {
                best = Some((candidate, sum, worst));
            }
        }

        let (shared, _, worst) = best.ok_or(CmsError::ArithmeticFailure)?;
        if worst > SHARED_TOLERANCE {
            return Err(CmsError::ArithmeticFailure);
        }
        self.set_transfer_function(shared);
        self.a_to_b = None;
        Ok(())
    }
}
