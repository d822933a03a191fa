// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
 * Helper fits functions.
 */

pub mod error;
pub mod metafits;

use std::ffi::CString;

use fitsio::{errors::check_status as fits_check_status, FitsFile};

use error::FitsError;

/// A value to be written over an existing header key.
#[derive(Clone, Debug, PartialEq)]
pub enum KeyValue {
    Float(f64),
    Int(i64),
}

/// Overwrite an existing key in the current HDU, keeping its comment.
///
/// `hdu.write_key` does not overwrite an existing key, so cfitsio-internal
/// functions are used instead. The key must already exist.
pub fn modify_key(fits: &mut FitsFile, key: &str, value: &KeyValue) -> Result<(), FitsError> {
    let key_cstr = CString::new(key)?;
    let preserve_comment_cstr = CString::new("&")?;
    let mut status = 0;
    match value {
        KeyValue::Float(f) => unsafe {
            fitsio_sys::ffmkyd(
                fits.as_raw(),                  /* I - FITS file pointer  */
                key_cstr.as_ptr(),              /* I - keyword name       */
                *f,                             /* I - keyword value      */
                -15,                            /* I - no of decimals     */
                preserve_comment_cstr.as_ptr(), /* I - keyword comment    */
                &mut status,                    /* IO - error status      */
            );
        },
        KeyValue::Int(i) => unsafe {
            fitsio_sys::ffmkyj(
                fits.as_raw(),                  /* I - FITS file pointer  */
                key_cstr.as_ptr(),              /* I - keyword name       */
                *i,                             /* I - keyword value      */
                preserve_comment_cstr.as_ptr(), /* I - keyword comment    */
                &mut status,                    /* IO - error status      */
            );
        },
    }
    fits_check_status(status)?;
    Ok(())
}
