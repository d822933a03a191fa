// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

pub mod blink;
pub mod coords;
pub mod fits;
pub mod flags;
pub mod tiling;

use std::str::FromStr;

use thiserror::Error;

/// A sky position [degrees].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RaDec {
    pub ra: f64,
    pub dec: f64,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Couldn't parse '{0}' as RA,DEC in degrees")]
pub struct ParseRaDecError(String);

/// Parse "RA,DEC", e.g. "60.5,-26.7".
impl FromStr for RaDec {
    type Err = ParseRaDecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut iter = s.split(',');
        match (iter.next(), iter.next(), iter.next()) {
            (Some(ra), Some(dec), None) => match (ra.trim().parse(), dec.trim().parse()) {
                (Ok(ra), Ok(dec)) => Ok(RaDec { ra, dec }),
                _ => Err(ParseRaDecError(s.to_string())),
            },
            _ => Err(ParseRaDecError(s.to_string())),
        }
    }
}

/// Set up `env_logger` for the binaries. Logs go to stderr, so that stdout
/// only has the program output. `RUST_LOG` is respected, but the verbosity
/// sets the level.
pub fn setup_logging(verbosity: u8) {
    let mut builder = env_logger::Builder::from_default_env();
    builder.target(env_logger::Target::Stderr);
    builder.format_target(false);
    match verbosity {
        0 => builder.filter_level(log::LevelFilter::Info),
        1 => builder.filter_level(log::LevelFilter::Debug),
        _ => builder.filter_level(log::LevelFilter::Trace),
    };
    builder.init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_radec() {
        assert_eq!(
            "60.5,-26.7".parse::<RaDec>(),
            Ok(RaDec {
                ra: 60.5,
                dec: -26.7
            })
        );
        assert_eq!(
            " 0, 0 ".parse::<RaDec>(),
            Ok(RaDec { ra: 0.0, dec: 0.0 })
        );
        assert!("60.5".parse::<RaDec>().is_err());
        assert!("60.5,-26.7,1".parse::<RaDec>().is_err());
        assert!("sixty,-26.7".parse::<RaDec>().is_err());
    }
}
