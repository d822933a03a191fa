// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use anyhow::ensure;
use log::info;
use structopt::{clap::AppSettings, StructOpt};

use blink_tools::{
    coords::{azel_to_radec, Site},
    fits::metafits::{update_obs_keys, ObsKeyUpdate, Pointing},
    setup_logging,
};

/// Update a metafits file to describe a single moment of an MWA observation.
/// The pointing (AZIMUTH and ALTITUDE) is converted to RA and DEC at the given
/// time, and NSCANS, INTTIME and NCHANS are overwritten. The file is modified
/// in place.
#[derive(StructOpt, Debug)]
#[structopt(name = "fix-metafits-time-radec", global_settings = &[AppSettings::ColoredHelp, AppSettings::ArgRequiredElseHelp])]
struct Opts {
    /// The path to the metafits file to be altered.
    #[structopt(parse(from_os_str))]
    metafits: PathBuf,

    /// The date and time that the metadata refers to (Unix time).
    #[structopt(short, long)]
    datetime: i64,

    /// Number of channels.
    #[structopt(short = "c", long, alias = "n-chans", default_value = "768")]
    n_channels: i64,

    /// Number of timesteps.
    #[structopt(short = "t", long, alias = "n-scans", default_value = "1")]
    n_timesteps: i64,

    /// Integration time in seconds.
    #[structopt(short, long, default_value = "4")]
    inttime: i64,

    /// The verbosity of the program. Increase by specifying multiple times
    /// (e.g. -vv).
    #[structopt(short, long, parse(from_occurrences))]
    verbosity: u8,
}

fn main() -> Result<(), anyhow::Error> {
    let opts = Opts::from_args();
    setup_logging(opts.verbosity);
    ensure!(opts.n_channels > 0, "The number of channels must be positive");
    ensure!(opts.n_timesteps > 0, "The number of timesteps must be positive");
    ensure!(opts.inttime > 0, "The integration time must be positive");

    let pointing = Pointing::from_metafits(&opts.metafits)?;
    let phase_centre = azel_to_radec(
        pointing.azimuth,
        pointing.altitude,
        opts.datetime as f64,
        &Site::mwa(),
    )?;
    info!(
        "Az {} El {} at {} -> RA {} DEC {}",
        pointing.azimuth,
        pointing.altitude,
        opts.datetime,
        phase_centre.ra,
        phase_centre.dec
    );

    let update = ObsKeyUpdate {
        phase_centre,
        num_timesteps: opts.n_timesteps,
        int_time: opts.inttime,
        num_channels: opts.n_channels,
    };
    println!("Writing fits {}", opts.metafits.display());
    update_obs_keys(&opts.metafits, &update)?;

    Ok(())
}
