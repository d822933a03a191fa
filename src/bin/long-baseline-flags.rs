// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use itertools::Itertools;
use log::{debug, info};
use structopt::{clap::AppSettings, StructOpt};

use blink_tools::{fits::metafits::ObsInfo, flags::select_flags, setup_logging};

/// Given a metafits file, print the antennas to flag so that no baseline is
/// longer than a maximum length. Antennas already flagged in the metafits are
/// included. The output is a comma-separated list of antenna indices.
#[derive(StructOpt, Debug)]
#[structopt(name = "long-baseline-flags", global_settings = &[AppSettings::ColoredHelp, AppSettings::ArgRequiredElseHelp])]
struct Opts {
    #[structopt(parse(from_os_str))]
    metafits: PathBuf,

    /// The longest baseline to keep [metres].
    #[structopt(short, long)]
    max_baseline: f64,

    /// Ignore the flags in the metafits file.
    #[structopt(long)]
    no_flags: bool,

    /// Report how many flagged antennas are further than this from the array
    /// centre [metres].
    #[structopt(long)]
    core_radius: Option<f64>,

    /// The verbosity of the program. Increase by specifying multiple times
    /// (e.g. -vv).
    #[structopt(short, long, parse(from_occurrences))]
    verbosity: u8,
}

fn main() -> Result<(), anyhow::Error> {
    let opts = Opts::from_args();
    setup_logging(opts.verbosity);

    let mut obs = ObsInfo::from_metafits(&opts.metafits)?;
    if opts.no_flags {
        for ant in obs.antennas.iter_mut() {
            ant.flagged = false;
        }
    }

    let unflagged: Vec<_> = obs.antennas.iter().filter(|a| !a.flagged).cloned().collect();
    let long = select_flags(&unflagged, opts.max_baseline)?;
    debug!("Removal order: {:?}", long);
    let mut all = obs.flagged_antennas();
    info!(
        "{} antennas flagged in the metafits, {} more for baselines longer than {} m",
        all.len(),
        long.len(),
        opts.max_baseline
    );
    all.extend(long);

    if let Some(r) = opts.core_radius {
        let outside = obs
            .antennas
            .iter()
            .filter(|a| all.contains(&a.id) && a.is_outside_core(r))
            .count();
        info!(
            "{} of {} flagged antennas are outside the {} m core",
            outside,
            all.len(),
            r
        );
    }

    println!("{}", all.iter().join(","));
    Ok(())
}
