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
use crate::CmsError;
use crate::reader::read_u16_be;
use chrono::{Datelike, Timelike, Utc};

/// ICC `dateTimeNumber`, six big-endian u16 fields.
#[repr(C)]
#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Default)]
pub struct ProfileDateTime {
    pub year: u16,
    pub month: u16,
    pub day_of_the_month: u16,
    pub hours: u16,
    pub minutes: u16,
    pub seconds: u16,
}

impl ProfileDateTime {
    pub(crate) const ZERO: ProfileDateTime = ProfileDateTime {
        year: 0,
        month: 0,
        day_of_the_month: 0,
        hours: 0,
        minutes: 0,
        seconds: 0,
    };

    /// Parses slice for date time
    pub fn new_from_slice(slice: &[u8]) -> Result<ProfileDateTime, CmsError> {
        if slice.len() != 12 {
            return Err(CmsError::InvalidHeader);
        }
        let year = read_u16_be(&slice[0..2]);
        let month = read_u16_be(&slice[2..4]);
        let day_of_the_month = read_u16_be(&slice[4..6]);
        let hours = read_u16_be(&slice[6..8]);
        let minutes = read_u16_be(&slice[8..10]);
        let seconds = read_u16_be(&slice[10..12]);
        Ok(ProfileDateTime {
            year,
            month,
            day_of_the_month,
            hours,
            minutes,
            seconds,
        })
    }

    /// Creates a new `ProfileDateTime` from the current system time (UTC)
    pub fn now() -> Self {
        let now = Utc::now();
        Self {
            year: now.year() as u16,
            month: now.month() as u16,
            day_of_the_month: now.day() as u16,
            hours: now.hour() as u16,
            minutes: now.minute() as u16,
            seconds: now.second() as u16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_time_from_slice() {
        let bytes = [
            0x07, 0xd8, 0x00, 0x02, 0x00, 0x1d, 0x00, 0x0c, 0x00, 0x1e, 0x00, 0x3b,
        ];
        let dt = ProfileDateTime::new_from_slice(&bytes).unwrap();
        assert_eq!(dt.year, 2008);
        assert_eq!(dt.month, 2);
        assert_eq!(dt.day_of_the_month, 29);
        assert_eq!(dt.hours, 12);
        assert_eq!(dt.minutes, 30);
        assert_eq!(dt.seconds, 59);
    }

    #[test]
    fn test_date_time_rejects_short_slice() {
        assert!(ProfileDateTime::new_from_slice(&[0u8; 11]).is_err());
    }
}
