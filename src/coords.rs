// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
 * Coordinate conversions.
 */

use std::os::raw::c_char;

use thiserror::Error;

use crate::RaDec;

/// The Julian date of the Unix epoch (1970-01-01T00:00:00 UTC).
const UNIX_EPOCH_JD: f64 = 2440587.5;

const SECONDS_PER_DAY: f64 = 86400.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordsError {
    #[error("Elevation must be between -90 and 90 degrees (got {0})")]
    BadElevation(f64),

    /// An error associated with ERFA.
    #[error("{source_file}:{source_line} Call to ERFA function {function} returned status code {status}")]
    Erfa {
        source_file: String,
        source_line: u32,
        status: i32,
        function: String,
    },
}

/// A location on the Earth.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Site {
    /// Geodetic latitude [degrees]
    pub latitude: f64,
    /// East longitude [degrees]
    pub longitude: f64,
    /// Height above the ellipsoid [metres]
    pub height: f64,
}

impl Site {
    /// The Murchison Widefield Array.
    pub fn mwa() -> Self {
        Self {
            latitude: -26.70331,
            longitude: 116.6708,
            height: 377.0,
        }
    }
}

/// Convert a horizontal position (azimuth measured north through east, and
/// elevation, both in degrees) seen from `site` at `unix_time` into ICRS RA
/// and Dec [degrees]. Refraction, UT1-UTC and polar motion are ignored.
pub fn azel_to_radec(
    azimuth: f64,
    elevation: f64,
    unix_time: f64,
    site: &Site,
) -> Result<RaDec, CoordsError> {
    if !(-90.0..=90.0).contains(&elevation) {
        return Err(CoordsError::BadElevation(elevation));
    }

    let zenith_distance = (90.0 - elevation).to_radians();
    let mut ra = 0.0;
    let mut dec = 0.0;
    let status = unsafe {
        erfa_sys::eraAtoc13(
            b"A\0".as_ptr() as *const c_char, // observed coordinates are az, ZD
            azimuth.to_radians(),
            zenith_distance,
            UNIX_EPOCH_JD,
            unix_time / SECONDS_PER_DAY,
            0.0, // dut1
            site.longitude.to_radians(),
            site.latitude.to_radians(),
            site.height,
            0.0, // xp
            0.0, // yp
            0.0, // pressure; 0 disables refraction
            0.0, // temperature
            0.0, // relative humidity
            0.0, // wavelength
            &mut ra,
            &mut dec,
        )
    };
    // Status 1 means "dubious year", which isn't fatal.
    if status < 0 {
        return Err(CoordsError::Erfa {
            source_file: file!().to_string(),
            source_line: line!(),
            status,
            function: "eraAtoc13".to_string(),
        });
    }

    Ok(RaDec {
        ra: ra.to_degrees().rem_euclid(360.0),
        dec: dec.to_degrees(),
    })
}
