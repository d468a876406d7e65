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

//! Big-endian primitive decoding. Every reader expects a slice the caller
//! has already bounds-checked against the tag or header it came from.

#[inline]
pub(crate) fn read_u16_be(slice: &[u8]) -> u16 {
    u16::from_be_bytes([slice[0], slice[1]])
}

#[inline]
pub(crate) fn read_u32_be(slice: &[u8]) -> u32 {
    u32::from_be_bytes([slice[0], slice[1], slice[2], slice[3]])
}

#[inline]
pub(crate) fn read_u64_be(slice: &[u8]) -> u64 {
    u64::from_be_bytes([
        slice[0], slice[1], slice[2], slice[3], slice[4], slice[5], slice[6], slice[7],
    ])
}

#[inline]
pub(crate) fn read_i32_be(slice: &[u8]) -> i32 {
    i32::from_be_bytes([slice[0], slice[1], slice[2], slice[3]])
}

/// Produces the nearest float to `a` with a maximum error of 1/1024 which
/// happens for large values like 0x40000040.
#[inline]
pub(crate) const fn s15_fixed16_number_to_float(a: i32) -> f32 {
    a as f32 / 65536.
}

#[inline]
pub(crate) fn read_s15_fixed16_be(slice: &[u8]) -> f32 {
    s15_fixed16_number_to_float(read_i32_be(slice))
}

#[inline]
pub(crate) fn uint8_number_to_float(a: u8) -> f32 {
    a as f32 * (1. / 255.0)
}

#[inline]
pub(crate) fn uint16_number_to_float(a: u16) -> f32 {
    a as f32 * (1. / 65535.0)
}

/// 8.8 fixed point used by single entry 'curv' tags.
#[inline]
pub(crate) fn u8_fixed8_number_to_float(x: u16) -> f32 {
    (x as f64 / 256.0) as f32
}
