// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
 * Reading and patching MWA metafits files.
 */

use std::collections::{BTreeMap, BTreeSet};
use std::convert::TryFrom;
use std::path::Path;

use fitsio::FitsFile;
use log::debug;

use super::{error::FitsError, modify_key, KeyValue};
use crate::flags::Antenna;
use crate::RaDec;

/// Observation details needed to set up BLINK jobs.
#[derive(Clone, Debug)]
pub struct ObsInfo {
    /// PROJECT, e.g. "G0057".
    pub project: String,

    /// The phase centre (RA and DEC) [degrees].
    pub phase_centre: RaDec,

    /// AZIMUTH [degrees].
    pub azimuth: f64,

    /// ALTITUDE [degrees].
    pub altitude: f64,

    /// The number of TILEDATA rows divided by two.
    pub num_antennas: usize,

    /// One entry per antenna (identified by its metafits "Antenna" index),
    /// sorted by index. An antenna is flagged if either of its polarisations
    /// is flagged.
    pub antennas: Vec<Antenna<u32>>,
}

/// The telescope pointing of an observation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pointing {
    /// AZIMUTH [degrees].
    pub azimuth: f64,

    /// ALTITUDE [degrees].
    pub altitude: f64,
}

impl Pointing {
    /// Read only AZIMUTH and ALTITUDE from the primary header; nothing else in
    /// the metafits needs to be present.
    pub fn from_metafits<T: AsRef<Path>>(metafits: T) -> Result<Self, FitsError> {
        let mut fits = FitsFile::open(metafits.as_ref())?;
        let hdu = fits.hdu(0)?;
        Ok(Self {
            azimuth: hdu.read_key(&mut fits, "AZIMUTH")?,
            altitude: hdu.read_key(&mut fits, "ALTITUDE")?,
        })
    }
}

impl ObsInfo {
    pub fn from_metafits<T: AsRef<Path>>(metafits: T) -> Result<Self, FitsError> {
        let metafits = metafits.as_ref();
        debug!("Reading {}", metafits.display());
        let mut fits = FitsFile::open(metafits)?;
        let hdu = fits.hdu(0)?;
        let project: String = hdu.read_key(&mut fits, "PROJECT")?;
        let ra: f64 = hdu.read_key(&mut fits, "RA")?;
        let dec: f64 = hdu.read_key(&mut fits, "DEC")?;
        let azimuth: f64 = hdu.read_key(&mut fits, "AZIMUTH")?;
        let altitude: f64 = hdu.read_key(&mut fits, "ALTITUDE")?;

        let hdu = fits.hdu(1)?;
        let indices: Vec<i32> = hdu.read_col(&mut fits, "Antenna")?;
        let flags: Vec<i32> = hdu.read_col(&mut fits, "Flag")?;
        let north: Vec<f64> = hdu.read_col(&mut fits, "North")?;
        let east: Vec<f64> = hdu.read_col(&mut fits, "East")?;
        let height: Vec<f64> = hdu.read_col(&mut fits, "Height")?;

        let rows = indices.len();
        if rows % 2 != 0 {
            return Err(FitsError::OddTileRows {
                file: metafits.display().to_string(),
                rows,
            });
        }
        for &(column, len) in [
            ("Flag", flags.len()),
            ("North", north.len()),
            ("East", east.len()),
            ("Height", height.len()),
        ]
        .iter()
        {
            if len != rows {
                return Err(FitsError::ColumnLength {
                    file: metafits.display().to_string(),
                    column,
                    len,
                    rows,
                });
            }
        }

        // The first row for an antenna gives its position; any flagged row
        // flags it.
        let mut antennas: BTreeMap<u32, Antenna<u32>> = BTreeMap::new();
        for (row, &index) in indices.iter().enumerate() {
            let id = u32::try_from(index).map_err(|_| FitsError::BadAntennaIndex {
                file: metafits.display().to_string(),
                row,
                index,
            })?;
            let ant = antennas
                .entry(id)
                .or_insert_with(|| Antenna::new(id, east[row], north[row], height[row]));
            ant.flagged |= flags[row] > 0;
        }
        let antennas: Vec<_> = antennas.into_values().collect();
        debug!(
            "{}: project {}, {} antennas ({} flagged)",
            metafits.display(),
            project,
            antennas.len(),
            antennas.iter().filter(|a| a.flagged).count()
        );

        Ok(Self {
            project,
            phase_centre: RaDec { ra, dec },
            azimuth,
            altitude,
            num_antennas: rows / 2,
            antennas,
        })
    }

    /// The indices of the antennas flagged in the metafits.
    pub fn flagged_antennas(&self) -> BTreeSet<u32> {
        self.antennas
            .iter()
            .filter(|a| a.flagged)
            .map(|a| a.id)
            .collect()
    }
}

/// Primary header values to overwrite so that a metafits describes a single
/// snapshot of an observation.
#[derive(Clone, Debug)]
pub struct ObsKeyUpdate {
    /// RA and DEC [degrees].
    pub phase_centre: RaDec,
    /// NSCANS
    pub num_timesteps: i64,
    /// INTTIME [seconds]
    pub int_time: i64,
    /// NCHANS
    pub num_channels: i64,
}

/// Overwrite RA, DEC, NSCANS, INTTIME and NCHANS in a metafits file. All of
/// the keys must already exist.
pub fn update_obs_keys<T: AsRef<Path>>(metafits: T, update: &ObsKeyUpdate) -> Result<(), FitsError> {
    let mut fits = FitsFile::edit(metafits.as_ref())?;
    fits.hdu(0)?;
    let keys = [
        ("RA", KeyValue::Float(update.phase_centre.ra)),
        ("DEC", KeyValue::Float(update.phase_centre.dec)),
        ("NSCANS", KeyValue::Int(update.num_timesteps)),
        ("INTTIME", KeyValue::Int(update.int_time)),
        ("NCHANS", KeyValue::Int(update.num_channels)),
    ];
    for (key, value) in keys.iter() {
        debug!("Setting {} to {:?}", key, value);
        modify_key(&mut fits, key, value)?;
    }
    Ok(())
}
