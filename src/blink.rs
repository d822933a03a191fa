// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
 * BLINK pipeline jobs and their submission to Slurm.
 */

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;

use itertools::Itertools;
use log::debug;
use thiserror::Error;

use crate::RaDec;

/// The environment module providing `blink_pipeline` on the GPU nodes.
const BLINK_MODULE: &str = "blink-pipeline-gpu/main";

#[derive(Error, Debug)]
pub enum BlinkError {
    #[error("Dedispersion range is malformed: '{0}' (expected min:max:step)")]
    BadDmRange(String),

    #[error("No .bin calibration solutions file found in {0}")]
    NoSolutions(String),

    #[error("There are no search parameters for project {0}")]
    UnknownSearchProject(String),

    #[error("{kind} bin {bin} doesn't exist; there are only {num} {kind} bins")]
    BadSearchBin {
        kind: &'static str,
        bin: usize,
        num: usize,
    },

    #[error("Couldn't read the {0} environment variable")]
    MissingEnv(&'static str),

    #[error("sbatch failed: {0}")]
    Sbatch(String),

    #[error("{0}")]
    Glob(#[from] globset::Error),

    /// An IO error.
    #[error("{0}")]
    IO(#[from] std::io::Error),
}

/// Where observations live on the cluster: /scratch/$PAWSEY_PROJECT/$USER
pub fn default_data_dir() -> Result<PathBuf, BlinkError> {
    let project =
        std::env::var("PAWSEY_PROJECT").map_err(|_| BlinkError::MissingEnv("PAWSEY_PROJECT"))?;
    let user = std::env::var("USER").map_err(|_| BlinkError::MissingEnv("USER"))?;
    Ok(PathBuf::from("/scratch").join(project).join(user))
}

/// A dispersion measure range to search, written like "min:max:step".
#[derive(Clone, Debug, PartialEq)]
pub struct DmRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,

    /// What was parsed, to be passed on untouched.
    text: String,
}

impl DmRange {
    /// Used to label the outputs of a job, e.g. "dm_range_10_100_1".
    pub fn postfix(&self) -> String {
        format!("dm_range_{}", self.text.replace(':', "_"))
    }
}

impl FromStr for DmRange {
    type Err = BlinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<f64> = s
            .split(':')
            .map(|t| t.trim().parse())
            .collect::<Result<_, _>>()
            .map_err(|_| BlinkError::BadDmRange(s.to_string()))?;
        match tokens.as_slice() {
            &[min, max, step] => Ok(Self {
                min,
                max,
                step,
                text: s.trim().to_string(),
            }),
            _ => Err(BlinkError::BadDmRange(s.to_string())),
        }
    }
}

impl std::fmt::Display for DmRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Dedispersion {
    pub dm_range: DmRange,

    /// The detection threshold.
    pub snr: f64,
}

/// The files and directories belonging to an observation.
#[derive(Clone, Debug, PartialEq)]
pub struct ObsPaths {
    /// <data dir>/<obsid>
    pub obs_dir: PathBuf,

    /// Where the combined visibility files are.
    pub combined_dir: PathBuf,

    pub metafits: PathBuf,

    /// The calibration solutions.
    pub solutions: PathBuf,

    /// <obs dir>_output_ra<RA>_dec<DEC>[_<postfix>]
    pub output_dir: PathBuf,
}

impl ObsPaths {
    /// Work out the paths for a job imaging around `phase_centre`. The
    /// observation directory must contain a calibration solutions file
    /// (*.bin); if there are several, the first by name is used.
    pub fn new(
        data_dir: &Path,
        obsid: u32,
        phase_centre: RaDec,
        postfix: Option<&str>,
    ) -> Result<Self, BlinkError> {
        let obs_dir = data_dir.join(obsid.to_string());

        let glob = globset::Glob::new("*.bin")?.compile_matcher();
        let mut bin_files = vec![];
        for entry in std::fs::read_dir(&obs_dir)? {
            let entry = entry?.path();
            if entry.file_name().map(|f| glob.is_match(f)).unwrap_or(false) {
                bin_files.push(entry);
            }
        }
        bin_files.sort_unstable();
        let solutions = match bin_files.into_iter().next() {
            Some(s) => s,
            None => return Err(BlinkError::NoSolutions(obs_dir.display().to_string())),
        };
        debug!("Using solutions {}", solutions.display());

        let mut output_dir = format!(
            "{}_output_ra{:.3}_dec{:.3}",
            obs_dir.display(),
            phase_centre.ra,
            phase_centre.dec
        );
        if let Some(p) = postfix {
            output_dir.push('_');
            output_dir.push_str(p);
        }

        Ok(Self {
            combined_dir: obs_dir.join("combined"),
            metafits: obs_dir.join(format!("{}.metafits", obsid)),
            solutions,
            output_dir: PathBuf::from(output_dir),
            obs_dir,
        })
    }
}

/// Everything needed to run `blink_pipeline` on one observation.
#[derive(Clone, Debug)]
pub struct BlinkJob {
    pub obsid: u32,

    /// -R: The number of antennas in the observation.
    pub num_antennas: usize,

    /// -n: The side length of the image [pixels].
    pub image_size: u32,

    /// -P: The phase centre of the image.
    pub phase_centre: RaDec,

    /// -r: Reorder the visibilities. Needed for legacy (non-MWAX) data.
    pub reorder: bool,

    /// -X: Seconds to skip from the start of the observation.
    pub start_offset: u32,

    /// -Q: Seconds to process. `None` means all of them.
    pub duration: Option<u32>,

    /// -t: Time resolution [seconds].
    pub time_res: f64,

    /// -c: Frequency averaging factor.
    pub freq_avg: u32,

    /// -O: Imaging oversampling factor.
    pub oversampling: f64,

    /// -u: Average images across each coarse channel and second.
    pub average_images: bool,

    /// -f: Image RMS flagging threshold. Not used unless positive.
    pub img_flag_threshold: f64,

    /// -A: Antenna indices to flag.
    pub flagged_antennas: BTreeSet<u32>,

    /// -D, -S, -p
    pub dedispersion: Option<Dedispersion>,

    /// -d: Dynamic spectrum pixel coordinates (x1,y1:x2,y2:...).
    pub dynamic_spectrum: Option<String>,

    pub paths: ObsPaths,
}

impl BlinkJob {
    /// The Slurm job name.
    pub fn title(&self) -> String {
        if let Some(d) = &self.dedispersion {
            format!(
                "BLINK Dedispersion - {} -  RA {:.3} DEC {:.3} - DM range {}",
                self.obsid, self.phase_centre.ra, self.phase_centre.dec, d.dm_range
            )
        } else if let Some(pixels) = &self.dynamic_spectrum {
            format!("BLINK Dynamic Spectrum - {} - {}", self.obsid, pixels)
        } else {
            format!("BLINK Imaging - {}", self.obsid)
        }
    }

    /// The `blink_pipeline` switches, each with its value.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            format!("-R {}", self.num_antennas),
            format!("-c {}", self.freq_avg),
            format!("-t {}s", self.time_res),
            format!("-o {}", self.paths.output_dir.display()),
            format!("-n {}", self.image_size),
            format!("-O {}", self.oversampling),
            format!("-M {}", self.paths.metafits.display()),
        ];
        if self.reorder {
            args.push("-r".to_string());
        }
        args.push(format!("-s {}", self.paths.solutions.display()));
        args.push("-b 0".to_string());
        args.push(format!("-I {}", self.paths.combined_dir.display()));
        args.push(format!("-X {}", self.start_offset));
        if self.average_images {
            args.push("-u".to_string());
        }
        if self.img_flag_threshold > 0.0 {
            args.push(format!("-f {}", self.img_flag_threshold));
        }
        if let Some(d) = self.duration {
            args.push(format!("-Q {}", d));
        }
        args.push(format!(
            "-P {},{}",
            self.phase_centre.ra, self.phase_centre.dec
        ));
        if !self.flagged_antennas.is_empty() {
            args.push(format!("-A {}", self.flagged_antennas.iter().join(",")));
        }
        if let Some(d) = &self.dedispersion {
            args.push(format!(
                "-D {} -S {} -p {}",
                d.dm_range,
                d.snr,
                d.dm_range.postfix()
            ));
        }
        if let Some(pixels) = &self.dynamic_spectrum {
            args.push(format!("-d {}", pixels));
        }
        args
    }
}

/// The `blink_pipeline` command line.
impl std::fmt::Display for BlinkJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "blink_pipeline {}", self.args().join(" "))
    }
}

#[derive(Clone, Debug)]
pub struct SlurmParams {
    /// The GPU partition to submit to.
    pub partition: String,

    /// The account billed for the job; "-gpu" is appended.
    pub account: String,

    /// The job walltime, e.g. "24:00:00".
    pub walltime: String,
}

/// An `sbatch` invocation wrapping a BLINK job.
#[derive(Clone, Debug)]
pub struct SlurmJob {
    title: String,
    partition: String,
    account: String,
    output: PathBuf,
    walltime: String,
    wrap: String,
}

impl SlurmJob {
    pub fn new(job: &BlinkJob, slurm: &SlurmParams) -> Self {
        Self {
            title: job.title(),
            partition: slurm.partition.clone(),
            account: format!("{}-gpu", slurm.account),
            output: job.paths.output_dir.join("slurm-%A.out"),
            walltime: slurm.walltime.clone(),
            wrap: format!("module load {} ; {} ;", BLINK_MODULE, job),
        }
    }

    /// The arguments to `sbatch`.
    pub fn args(&self) -> Vec<String> {
        vec![
            "--gres=gpu:8".to_string(),
            format!("--partition={}", self.partition),
            format!("--job-name={}", self.title),
            format!("--account={}", self.account),
            format!("--output={}", self.output.display()),
            format!("--time={}", self.walltime),
            "--wrap".to_string(),
            self.wrap.clone(),
        ]
    }

    /// Run `sbatch`. The job output directory is created first, as Slurm won't
    /// create it for the log file.
    pub fn submit(&self) -> Result<(), BlinkError> {
        if let Some(dir) = self.output.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let output = Command::new("sbatch").args(self.args()).output()?;
        if !output.status.success() {
            return Err(BlinkError::Sbatch(format!(
                "{}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        debug!("{}", String::from_utf8_lossy(&output.stdout).trim());
        Ok(())
    }
}

/// A copy-and-pasteable shell command.
impl std::fmt::Display for SlurmJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "sbatch --gres=gpu:8 --partition={} --job-name=\"{}\" --account={} --output={} --time={} --wrap \"{}\"",
            self.partition,
            self.title,
            self.account,
            self.output.display(),
            self.walltime,
            self.wrap
        )
    }
}

/// A grid of dedispersion jobs covering a whole observation.
#[derive(Clone, Debug)]
pub struct SearchParams {
    pub oversampling: f64,
    pub image_size: u32,
    pub dm_ranges: Vec<DmRange>,

    /// How long each time bin is [seconds]. The last bin runs to the end of
    /// the observation.
    pub duration: u32,

    /// The start of each time bin [seconds].
    pub offsets: Vec<u32>,
}

/// One cell of a search grid.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchCell {
    pub dm_range: DmRange,
    pub start_offset: u32,
    pub duration: Option<u32>,
}

impl SearchParams {
    pub fn for_project(project: &str) -> Result<Self, BlinkError> {
        match project {
            // SMART
            "G0057" => Ok(Self {
                oversampling: 1.0,
                image_size: 256,
                dm_ranges: [
                    "10:100:1",
                    "101:200:1",
                    "201:300:1",
                    "301:350:1",
                    "351:400:1",
                    "401:450:1",
                    "451:500:1",
                ]
                .iter()
                .map(|s| s.parse::<DmRange>())
                .collect::<Result<_, _>>()?,
                duration: 1196,
                // Consecutive bins overlap by 26 seconds.
                offsets: vec![0, 1170, 2340, 3510, 4680],
            }),

            _ => Err(BlinkError::UnknownSearchProject(project.to_string())),
        }
    }

    /// Get the selected cells of the grid, DM ranges varying slowest. Empty
    /// selections mean all DM or time bins.
    pub fn cells(
        &self,
        dm_bins: &[usize],
        time_bins: &[usize],
    ) -> Result<Vec<SearchCell>, BlinkError> {
        let check = |kind, bins: &[usize], num| -> Result<Vec<usize>, BlinkError> {
            if bins.is_empty() {
                return Ok((0..num).collect());
            }
            match bins.iter().find(|&&b| b >= num) {
                Some(&bin) => Err(BlinkError::BadSearchBin { kind, bin, num }),
                None => Ok(bins.iter().copied().sorted().dedup().collect()),
            }
        };
        let dm_bins = check("DM", dm_bins, self.dm_ranges.len())?;
        let time_bins = check("time", time_bins, self.offsets.len())?;

        let last_time_bin = self.offsets.len() - 1;
        let cells = dm_bins
            .iter()
            .cartesian_product(time_bins.iter())
            .map(|(&d, &t)| SearchCell {
                dm_range: self.dm_ranges[d].clone(),
                start_offset: self.offsets[t],
                duration: if t == last_time_bin {
                    None
                } else {
                    Some(self.duration)
                },
            })
            .collect();
        Ok(cells)
    }
}
