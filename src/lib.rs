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
#![allow(clippy::manual_clamp, clippy::excessive_precision)]
#![deny(unreachable_pub)]
#![forbid(unsafe_code)]
mod chad;
mod clut;
mod dat;
mod defaults;
mod destination;
mod err;
mod fit;
mod mab;
mod matrix;
mod mlaf;
mod pixel;
mod profile;
mod reader;
mod stages;
mod transform;
mod trc;

pub use dat::ProfileDateTime;
pub use defaults::{
    linear_transfer_function, srgb_inverse_transfer_function, srgb_profile,
    srgb_transfer_function, xyz_d50_profile,
};
pub use err::CmsError;
pub use fit::approximate_curve;
pub use mab::{AToB, ClutGrid};
pub use matrix::{Chromaticity, Matrix3f, Matrix3x4, Vector3, Vector3f, XyY, Xyz};
pub use profile::{
    ColorProfile, DataColorSpace, ProfileTag, RenderingIntent, primaries_to_xyz_d50,
};
pub use transform::{AlphaFormat, PixelLayout, transform, transform_in_place};
pub use trc::{Curve, TransferFunction, are_approximate_inverses};
