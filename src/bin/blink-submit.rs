// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{anyhow, bail};
use itertools::Itertools;
use log::{debug, info};
use structopt::{clap::AppSettings, StructOpt};

use blink_tools::{
    blink::*,
    fits::metafits::ObsInfo,
    flags::combined_flags,
    setup_logging,
    tiling::compute_tiling,
    RaDec,
};

/// Submit BLINK pipeline jobs for an MWA observation to Slurm.
///
/// The observation is expected in <data-dir>/<obsid>, containing the metafits
/// file (<obsid>.metafits), a calibration solutions file (*.bin) and the
/// combined visibility files (combined/).
#[derive(StructOpt, Debug)]
#[structopt(name = "blink-submit", global_settings = &[AppSettings::ColoredHelp, AppSettings::ArgRequiredElseHelp])]
struct Opts {
    // Observation information.
    /// The observation ID.
    #[structopt(long)]
    obsid: u32,

    /// The directory containing observation directories. The default is
    /// /scratch/$PAWSEY_PROJECT/$USER.
    #[structopt(long, parse(from_os_str))]
    data_dir: Option<PathBuf>,

    /// The size of a pixel (side) in degrees. Required for tiling.
    #[structopt(long)]
    pixsize: Option<f64>,

    /// It is an MWAX observation (the visibilities don't need reordering).
    #[structopt(long)]
    mwax: bool,

    /// Do NOT flag the tiles flagged in the metafits.
    #[structopt(long)]
    no_flags: bool,

    /// Also flag antennas so that no baseline is longer than this many metres.
    #[structopt(long)]
    max_baseline: Option<f64>,

    // BLINK pipeline args.
    /// Number of seconds to skip from the start of the observation.
    #[structopt(long, default_value = "0")]
    offset: u32,

    /// Number of seconds to process. Default: all seconds.
    #[structopt(long)]
    duration: Option<u32>,

    /// Enable field-of-view tiling by specifying the size of the tile (side)
    /// in pixels. One job is submitted per tile.
    #[structopt(long)]
    tilesize: Option<u32>,

    /// Size of the image (side, e.g. 4096).
    #[structopt(long, default_value = "256")]
    imgsize: u32,

    /// Specify the phase centre coordinates as RA,DEC in degrees. The default
    /// is the metafits phase centre.
    #[structopt(long)]
    centre: Option<RaDec>,

    /// SNR threshold for detections in dedispersion mode.
    #[structopt(long, default_value = "10")]
    snr: f64,

    /// Time resolution in seconds.
    #[structopt(long, default_value = "0.02")]
    time_res: f64,

    /// Frequency averaging factor.
    #[structopt(long, default_value = "4")]
    freq_avg: u32,

    /// Imaging oversampling factor.
    #[structopt(long, default_value = "2")]
    oversampling: f64,

    /// Enable image averaging across the entire coarse channel and second.
    #[structopt(long)]
    avg_images: bool,

    /// Image RMS flagging threshold. Disabled if not positive.
    #[structopt(long, default_value = "8")]
    img_flag: f64,

    // Execution modes.
    /// Enable dynamic spectrum mode by passing pixel coordinates
    /// (x1,y1:x2,y2:x3,y3).
    #[structopt(long)]
    dyspec: Option<String>,

    /// Enable dedispersion mode by passing the DM range in the format
    /// min:max:step (e.g. 50:60:1).
    #[structopt(long)]
    dedisp: Option<DmRange>,

    /// Do not actually submit jobs; only print them.
    #[structopt(long)]
    dry_run: bool,

    /// Adds the specified postfix to the output directory.
    #[structopt(long)]
    dir_postfix: Option<String>,

    /// Run an FRB search over the entire parameter space of the observation's
    /// project.
    #[structopt(long)]
    search: bool,

    /// Limit the search to the specified time intervals (0-based indices).
    #[structopt(long)]
    time_bins: Vec<usize>,

    /// Limit the search to the specified DM intervals (0-based indices).
    #[structopt(long)]
    dm_bins: Vec<usize>,

    // Slurm configuration.
    /// Setonix GPU partition where to submit the jobs.
    #[structopt(long, default_value = "gpu")]
    partition: String,

    /// Setonix account billed for the jobs.
    #[structopt(long, default_value = "pawsey1154")]
    account: String,

    /// Slurm job walltime.
    #[structopt(long, default_value = "24:00:00")]
    time: String,

    /// The verbosity of the program. Increase by specifying multiple times
    /// (e.g. -vv).
    #[structopt(short, long, parse(from_occurrences))]
    verbosity: u8,
}

fn main() -> Result<(), anyhow::Error> {
    let opts = Opts::from_args();
    setup_logging(opts.verbosity);

    if opts.search && opts.dedisp.is_some() {
        bail!("--search and --dedisp can't be used together; the search picks its own DM ranges");
    }
    if !opts.search && !(opts.time_bins.is_empty() && opts.dm_bins.is_empty()) {
        bail!("--time-bins and --dm-bins only apply to --search");
    }

    let data_dir = match &opts.data_dir {
        Some(d) => d.clone(),
        None => default_data_dir()?,
    };
    let metafits = data_dir
        .join(opts.obsid.to_string())
        .join(format!("{}.metafits", opts.obsid));
    let mut obs = ObsInfo::from_metafits(&metafits)?;
    info!(
        "Observation {} (project {}), {} antennas",
        opts.obsid, obs.project, obs.num_antennas
    );

    if opts.no_flags {
        for ant in obs.antennas.iter_mut() {
            ant.flagged = false;
        }
    }
    let flagged_antennas: BTreeSet<u32> = match opts.max_baseline {
        Some(max) => combined_flags(&obs.antennas, max)?,
        None => obs.flagged_antennas(),
    };
    info!(
        "Flagging {} antennas: {}",
        flagged_antennas.len(),
        flagged_antennas.iter().join(",")
    );

    let centre = opts.centre.unwrap_or(obs.phase_centre);
    let centres = match opts.tilesize {
        Some(tile_size) => {
            let pix_size = opts
                .pixsize
                .ok_or_else(|| anyhow!("--tilesize needs --pixsize"))?;
            let tiles = compute_tiling(centre, opts.imgsize, tile_size, pix_size)?;
            info!("Tiling the field of view into {} phase centres", tiles.len());
            tiles
        }
        None => vec![centre],
    };

    let search = if opts.search {
        let params = SearchParams::for_project(&obs.project)?;
        let cells = params.cells(&opts.dm_bins, &opts.time_bins)?;
        info!("Searching {} DM range/time bin combinations", cells.len());
        Some((params, cells))
    } else {
        None
    };

    let slurm = SlurmParams {
        partition: opts.partition.clone(),
        account: opts.account.clone(),
        walltime: opts.time.clone(),
    };
    let mut jobs = vec![];
    for phase_centre in centres {
        let paths = ObsPaths::new(
            &data_dir,
            opts.obsid,
            phase_centre,
            opts.dir_postfix.as_deref(),
        )?;
        let job = BlinkJob {
            obsid: opts.obsid,
            num_antennas: obs.num_antennas,
            image_size: opts.imgsize,
            phase_centre,
            reorder: !opts.mwax,
            start_offset: opts.offset,
            duration: opts.duration,
            time_res: opts.time_res,
            freq_avg: opts.freq_avg,
            oversampling: opts.oversampling,
            average_images: opts.avg_images,
            img_flag_threshold: opts.img_flag,
            flagged_antennas: flagged_antennas.clone(),
            dedispersion: opts.dedisp.clone().map(|dm_range| Dedispersion {
                dm_range,
                snr: opts.snr,
            }),
            dynamic_spectrum: opts.dyspec.clone(),
            paths,
        };

        match &search {
            None => jobs.push(job),
            Some((params, cells)) => {
                for cell in cells {
                    let mut job = job.clone();
                    job.image_size = params.image_size;
                    job.oversampling = params.oversampling;
                    job.start_offset = cell.start_offset;
                    job.duration = cell.duration;
                    job.dedispersion = Some(Dedispersion {
                        dm_range: cell.dm_range.clone(),
                        snr: opts.snr,
                    });
                    jobs.push(job);
                }
            }
        }
    }

    for job in &jobs {
        let slurm_job = SlurmJob::new(job, &slurm);
        println!(
            "Submitting BLINK job with the following command:\n{}",
            slurm_job
        );
        if opts.dry_run {
            debug!("Dry run; not submitting");
        } else {
            slurm_job.submit()?;
        }
    }
    info!(
        "{} {} job(s)",
        if opts.dry_run { "Printed" } else { "Submitted" },
        jobs.len()
    );

    Ok(())
}
