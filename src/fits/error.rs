// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
 * Error handling for fits functions.
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FitsError {
    /// The metafits TILEDATA HDU should have an X and Y row for every antenna.
    #[error("{file}: TILEDATA has {rows} rows; expected an even number (two polarisations per antenna)")]
    OddTileRows { file: String, rows: usize },

    /// A TILEDATA column doesn't have a value for every row.
    #[error("{file}: TILEDATA column {column} has {len} values, but there are {rows} rows")]
    ColumnLength {
        file: String,
        column: &'static str,
        len: usize,
        rows: usize,
    },

    /// TILEDATA antenna indices can't be negative.
    #[error("{file}: TILEDATA row {row} has antenna index {index}")]
    BadAntennaIndex { file: String, row: usize, index: i32 },

    /// An error associated the fitsio-crate.
    #[error("{0}")]
    Fitsio(#[from] fitsio::errors::Error),

    /// An error when converting a Rust string to a C string.
    #[error("{0}")]
    BadString(#[from] std::ffi::NulError),

    /// An IO error.
    #[error("{0}")]
    IO(#[from] std::io::Error),
}
