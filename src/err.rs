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
use thiserror::Error;

/// Failure classes reported by profile parsing and transform building.
///
/// Parsing is all-or-nothing: a failed parse returns the error and no
/// profile. Transform construction fails before any destination byte is
/// written.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum CmsError {
    #[error("ICC header is malformed or not D50 referenced")]
    InvalidHeader,
    #[error("profile major version is not supported")]
    UnsupportedVersion,
    #[error("tag table entry overflows the profile")]
    InvalidTagTable,
    #[error("tag payload failed validation")]
    InvalidTag,
    #[error("profile lacks the data required for this operation")]
    UnsupportedFeature,
    #[error("curve fit diverged or matrix is singular")]
    ArithmeticFailure,
    #[error("in-place transform requires identical pixel strides")]
    AliasingViolation,
    #[error("buffer length does not match the requested pixel count")]
    LaneSizeMismatch,
}
