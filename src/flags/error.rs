// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
 * Error handling for antenna flagging.
 */

use thiserror::Error;

/// Every way the antenna data handed to the flag selector can be unusable.
/// Nothing is returned when any of these are hit.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidInput {
    /// The maximum allowed baseline length was negative.
    #[error("The maximum baseline length cannot be negative (got {0} m)")]
    NegativeMaxDistance(f64),

    /// The maximum allowed baseline length was NaN.
    #[error("The maximum baseline length is not a number")]
    NanMaxDistance,

    /// An antenna position component is missing (NaN) or infinite.
    #[error("Antenna {id} has no usable {component} position component")]
    MissingPosition { id: String, component: &'static str },

    /// The same antenna identifier was supplied more than once.
    #[error("Antenna {0} was supplied more than once")]
    DuplicateId(String),
}
