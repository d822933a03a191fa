// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
 * This module tests the blink-submit command-line interface. Every run is a
 * dry run against a temporary observation directory, so nothing is submitted.
 */

mod common;

#[cfg(test)]
mod tests {
    use assert_cmd::Command;

    use super::common::*;

    fn cmd() -> Command {
        Command::cargo_bin("blink-submit").unwrap()
    }

    fn stdout(cmd: &mut Command) -> String {
        let output = cmd.output().unwrap();
        assert!(
            output.status.success(),
            "{}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).unwrap()
    }

    fn sbatch_lines(output: &str) -> Vec<&str> {
        output.lines().filter(|l| l.starts_with("sbatch ")).collect()
    }

    #[test]
    fn imaging_dry_run() {
        let dir = tempfile::tempdir().unwrap();
        let obs_dir = write_obs_dir(dir.path(), "G0057");

        let output = stdout(
            cmd()
                .arg(format!("--obsid={}", OBSID))
                .arg(format!("--data-dir={}", dir.path().display()))
                .arg("--dry-run"),
        );
        let lines = sbatch_lines(&output);
        assert_eq!(lines.len(), 1);
        let line = lines[0];
        assert!(line.contains(&format!("--job-name=\"BLINK Imaging - {}\"", OBSID)));
        assert!(line.contains("--account=pawsey1154-gpu"));
        assert!(line.contains("blink_pipeline -R 4 -c 4 -t 0.02s"));
        assert!(line.contains(&format!(" -s {}/solutions.bin ", obs_dir.display())));
        assert!(line.contains(" -r "));
        assert!(line.contains(" -P 60.5,-26.75"));
        // Antenna 2 is flagged in the metafits.
        assert!(line.contains(" -A 2 "));

        // Nothing is created on a dry run.
        assert!(!dir
            .path()
            .join(format!("{}_output_ra60.500_dec-26.750", OBSID))
            .exists());
    }

    #[test]
    fn flags() {
        let dir = tempfile::tempdir().unwrap();
        write_obs_dir(dir.path(), "G0057");

        let output = stdout(
            cmd()
                .arg(format!("--obsid={}", OBSID))
                .arg(format!("--data-dir={}", dir.path().display()))
                .arg("--max-baseline=100")
                .arg("--mwax")
                .arg("--dry-run"),
        );
        let line = sbatch_lines(&output)[0];
        assert!(line.contains(" -A 2,3 "));
        assert!(!line.contains(" -r "));

        let output = stdout(
            cmd()
                .arg(format!("--obsid={}", OBSID))
                .arg(format!("--data-dir={}", dir.path().display()))
                .arg("--no-flags")
                .arg("--dry-run"),
        );
        assert!(!sbatch_lines(&output)[0].contains(" -A "));
    }

    #[test]
    fn tiling() {
        let dir = tempfile::tempdir().unwrap();
        write_obs_dir(dir.path(), "G0057");

        let output = stdout(
            cmd()
                .arg(format!("--obsid={}", OBSID))
                .arg(format!("--data-dir={}", dir.path().display()))
                .arg("--imgsize=256")
                .arg("--tilesize=128")
                .arg("--pixsize=0.1")
                .arg("--centre=60,-27")
                .arg("--dry-run"),
        );
        let lines = sbatch_lines(&output);
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("_output_ra53.600_dec-20.600"));
        assert!(lines[3].contains("_output_ra66.400_dec-33.400"));

        // Tiling without a pixel size.
        cmd()
            .arg(format!("--obsid={}", OBSID))
            .arg(format!("--data-dir={}", dir.path().display()))
            .arg("--tilesize=128")
            .arg("--dry-run")
            .assert()
            .failure();
    }

    #[test]
    fn dedispersion_and_search() {
        let dir = tempfile::tempdir().unwrap();
        write_obs_dir(dir.path(), "G0057");

        let output = stdout(
            cmd()
                .arg(format!("--obsid={}", OBSID))
                .arg(format!("--data-dir={}", dir.path().display()))
                .arg("--dedisp=50:60:1")
                .arg("--dir-postfix=frb")
                .arg("--dry-run"),
        );
        let line = sbatch_lines(&output)[0];
        assert!(line.contains("DM range 50:60:1"));
        assert!(line.contains(" -D 50:60:1 -S 10 -p dm_range_50_60_1"));
        assert!(line.contains("_output_ra60.500_dec-26.750_frb"));

        let output = stdout(
            cmd()
                .arg(format!("--obsid={}", OBSID))
                .arg(format!("--data-dir={}", dir.path().display()))
                .arg("--search")
                .arg("--dm-bins")
                .arg("0")
                .arg("--dry-run"),
        );
        let lines = sbatch_lines(&output);
        assert_eq!(lines.len(), 5);
        assert!(lines.iter().all(|l| l.contains(" -n 256 -O 1 ")));
        assert!(lines[0].contains(" -X 0 ") && lines[0].contains(" -Q 1196 "));
        assert!(lines[4].contains(" -X 4680 ") && !lines[4].contains(" -Q "));

        // Malformed DM range.
        cmd()
            .arg(format!("--obsid={}", OBSID))
            .arg(format!("--data-dir={}", dir.path().display()))
            .arg("--dedisp=50:60")
            .arg("--dry-run")
            .assert()
            .failure();
    }

    #[test]
    fn search_needs_known_project() {
        let dir = tempfile::tempdir().unwrap();
        write_obs_dir(dir.path(), "D0006");

        cmd()
            .arg(format!("--obsid={}", OBSID))
            .arg(format!("--data-dir={}", dir.path().display()))
            .arg("--search")
            .arg("--dry-run")
            .assert()
            .failure();
    }

    #[test]
    fn bad_inputs() {
        let dir = tempfile::tempdir().unwrap();

        // No observation directory.
        cmd()
            .arg(format!("--obsid={}", OBSID))
            .arg(format!("--data-dir={}", dir.path().display()))
            .arg("--dry-run")
            .assert()
            .failure();

        // No solutions.
        let obs_dir = dir.path().join(OBSID.to_string());
        std::fs::create_dir(&obs_dir).unwrap();
        write_metafits(&obs_dir, "G0057");
        cmd()
            .arg(format!("--obsid={}", OBSID))
            .arg(format!("--data-dir={}", dir.path().display()))
            .arg("--dry-run")
            .assert()
            .failure();

        // Malformed phase centre.
        std::fs::write(obs_dir.join("solutions.bin"), b"").unwrap();
        cmd()
            .arg(format!("--obsid={}", OBSID))
            .arg(format!("--data-dir={}", dir.path().display()))
            .arg("--centre=60.5")
            .arg("--dry-run")
            .assert()
            .failure();

        // Negative maximum baseline.
        cmd()
            .arg(format!("--obsid={}", OBSID))
            .arg(format!("--data-dir={}", dir.path().display()))
            .arg("--max-baseline=-5")
            .arg("--dry-run")
            .assert()
            .failure();
    }
}
