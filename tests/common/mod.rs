// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Helpers shared by the command-line tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use fitsio::{
    tables::{ColumnDataType, ColumnDescription},
    FitsFile,
};

pub const OBSID: u32 = 1234567890;

/// Write a cut-down metafits with four antennas (eight rows) into `dir`.
/// Antenna 2 is flagged, and antenna 3 is 1 km north of the others.
pub fn write_metafits(dir: &Path, project: &str) -> PathBuf {
    let path = dir.join(format!("{}.metafits", OBSID));
    let mut fits = FitsFile::create(&path).open().unwrap();
    let hdu = fits.hdu(0).unwrap();
    hdu.write_key(&mut fits, "PROJECT", project).unwrap();
    hdu.write_key(&mut fits, "RA", 60.5).unwrap();
    hdu.write_key(&mut fits, "DEC", -26.75).unwrap();
    hdu.write_key(&mut fits, "AZIMUTH", 0.0).unwrap();
    hdu.write_key(&mut fits, "ALTITUDE", 90.0).unwrap();
    hdu.write_key(&mut fits, "NSCANS", 56_i64).unwrap();
    hdu.write_key(&mut fits, "INTTIME", 2_i64).unwrap();
    hdu.write_key(&mut fits, "NCHANS", 768_i64).unwrap();

    let columns = vec![
        ("Antenna", ColumnDataType::Int),
        ("Flag", ColumnDataType::Int),
        ("North", ColumnDataType::Double),
        ("East", ColumnDataType::Double),
        ("Height", ColumnDataType::Double),
    ];
    let descriptions: Vec<_> = columns
        .into_iter()
        .map(|(name, t)| ColumnDescription::new(name).with_type(t).create().unwrap())
        .collect();
    let hdu = fits
        .create_table("TILEDATA".to_string(), &descriptions)
        .unwrap();
    let antenna: Vec<i32> = vec![1, 1, 0, 0, 3, 3, 2, 2];
    let flag: Vec<i32> = vec![0, 0, 0, 0, 0, 0, 1, 1];
    let north: Vec<f64> = vec![10.0, 10.0, 0.0, 0.0, 1000.0, 1000.0, -10.0, -10.0];
    let east: Vec<f64> = vec![5.0, 5.0, 0.0, 0.0, 0.0, 0.0, -5.0, -5.0];
    let height: Vec<f64> = vec![377.0; 8];
    hdu.write_col(&mut fits, "Antenna", &antenna).unwrap();
    hdu.write_col(&mut fits, "Flag", &flag).unwrap();
    hdu.write_col(&mut fits, "North", &north).unwrap();
    hdu.write_col(&mut fits, "East", &east).unwrap();
    hdu.write_col(&mut fits, "Height", &height).unwrap();
    path
}

/// Write a metafits with only the primary header keys that
/// fix-metafits-time-radec reads or overwrites.
pub fn write_header_only_metafits(dir: &Path) -> PathBuf {
    let path = dir.join("header-only.metafits");
    let mut fits = FitsFile::create(&path).open().unwrap();
    let hdu = fits.hdu(0).unwrap();
    hdu.write_key(&mut fits, "RA", 0.0).unwrap();
    hdu.write_key(&mut fits, "DEC", 0.0).unwrap();
    hdu.write_key(&mut fits, "AZIMUTH", 0.0).unwrap();
    hdu.write_key(&mut fits, "ALTITUDE", 90.0).unwrap();
    hdu.write_key(&mut fits, "NSCANS", 56_i64).unwrap();
    hdu.write_key(&mut fits, "INTTIME", 2_i64).unwrap();
    hdu.write_key(&mut fits, "NCHANS", 768_i64).unwrap();
    path
}

/// Lay out an observation directory (metafits and solutions) under `data_dir`.
pub fn write_obs_dir(data_dir: &Path, project: &str) -> PathBuf {
    let obs_dir = data_dir.join(OBSID.to_string());
    std::fs::create_dir(&obs_dir).unwrap();
    write_metafits(&obs_dir, project);
    std::fs::write(obs_dir.join("solutions.bin"), b"").unwrap();
    obs_dir
}
