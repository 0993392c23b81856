use std::{
    fs::{self, File},
    io::BufReader,
    path::Path,
};

use anyhow::Result;
use clap_serde_derive::{
    clap::{self, Parser},
    ClapSerde,
};
use flock_lib::options::{Bounds, FlockOptions, OptionsError};
use serde::Serialize;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
/// Headless driver for a three-rule (separation, cohesion, alignment) particle flock.
pub struct Args {
    /// Config file, YAML unless the extension is `.toml`
    #[arg(short, long = "config", default_value = "config.yaml")]
    pub config_path: std::path::PathBuf,

    /// Rest of arguments
    #[command(flatten)]
    pub config: <Config as ClapSerde>::Opt,
}

#[derive(ClapSerde, Serialize)]
/// Programatic configuration
///
/// Uses defaults, which can be overwritten by specifying a filepath
/// for the `-c` or `--config` arg option
pub struct Config {
    #[default(20)]
    #[arg(short = 'n', long)]
    /// number of particles
    pub no_agents: usize,

    #[default(0)]
    #[arg(short = 't', long)]
    /// ticks to run, 0 runs until interrupted
    pub ticks: u64,

    #[default(0)]
    #[arg(long)]
    /// seed for the initial placement, 0 draws one from the OS
    pub seed: u64,

    #[default(1000.)]
    #[arg(short = 'x', long)]
    pub width: f32,

    #[default(1000.)]
    #[arg(short = 'y', long)]
    pub height: f32,

    #[default(20.)]
    #[arg(long)]
    /// gap kept free along the edges when placing particles
    pub margin: f32,

    #[default(20.)]
    #[arg(long)]
    /// particle extent used for bouncing off the edges
    pub size: f32,

    #[default(30.)]
    #[arg(long)]
    pub max_speed: f32,

    #[default(500.)]
    #[arg(long = "neigh_dist")]
    pub neighbour_distance: f32,

    #[default(100.)]
    #[arg(long = "sep_dist")]
    pub desired_separation: f32,

    #[default(20)]
    #[arg(long = "neigh_count")]
    pub desired_neighbours: u32,

    #[default(1.0)]
    #[arg(long = "sep_weight")]
    pub separation_weight: f32,
    #[default(1.0)]
    #[arg(long = "coh_weight")]
    pub cohesion_weight: f32,
    #[default(1.0)]
    #[arg(long = "ali_weight")]
    pub alignment_weight: f32,

    #[default(5.)]
    #[arg(long)]
    pub mass: f32,

    #[default("magnitude".to_owned())]
    #[arg(long)]
    /// magnitude | axis_upper
    pub speed_limit: String,

    #[default("non_zero".to_owned())]
    #[arg(long)]
    /// non_zero | both_axes
    pub separation_guard: String,

    #[default(false)]
    #[arg(long)]
    pub parallel: bool,

    #[default(25)]
    #[arg(short = 'd', long)]
    /// pause between ticks in milliseconds
    pub delay_ms: u64,

    #[default(1)]
    #[arg(long)]
    /// draw every n-th tick, 0 disables drawing
    pub render_every: u64,

    #[default(80)]
    #[arg(long)]
    pub cols: usize,

    #[default(40)]
    #[arg(long)]
    pub rows: usize,

    #[default(10)]
    #[arg(short = 'r', long)]
    /// ratio of ticks/sample_rate, e,g, 10 = sample every 10th tick
    pub sample_rate: u64,
}

/// Reads a partial config, TOML for `.toml` files and YAML otherwise.
pub fn read_config_file(path: &Path) -> Result<<Config as ClapSerde>::Opt> {
    let is_toml = path.extension().map_or(false, |ext| ext == "toml");

    if is_toml {
        let raw = fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    } else {
        let f = File::open(path)?;
        Ok(serde_yaml::from_reader(BufReader::new(f))?)
    }
}

impl Config {
    pub fn flock_options(&self) -> Result<FlockOptions, OptionsError> {
        let options = FlockOptions {
            max_speed: self.max_speed,
            neighbour_distance: self.neighbour_distance,
            desired_separation: self.desired_separation,
            desired_neighbours: self.desired_neighbours,
            separation_weight: self.separation_weight,
            cohesion_weight: self.cohesion_weight,
            alignment_weight: self.alignment_weight,
            mass: self.mass,
            size: self.size,
            bounds: Bounds::new(self.width, self.height),
            margin: self.margin,
            speed_limit: self.speed_limit.parse()?,
            separation_guard: self.separation_guard.parse()?,
            parallel: self.parallel,
        };

        options.validate()?;
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf, process};

    use clap_serde_derive::{clap::Parser, ClapSerde};
    use flock_lib::options::{FlockOptions, OptionsError, SpeedLimit};

    use super::{read_config_file, Args, Config};

    fn scratch_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("flock_app_{}_{name}", process::id()));
        fs::write(&path, contents).unwrap();
        path
    }

    fn parse(args: &[&str]) -> Config {
        let mut args = Args::try_parse_from(args).unwrap();
        Config::from(&mut args.config)
    }

    #[test]
    fn defaults_match_library_defaults() {
        let config = parse(&["flock_app"]);

        assert_eq!(config.no_agents, 20);
        assert_eq!(config.flock_options().unwrap(), FlockOptions::default());
    }

    #[test]
    fn flags_override_defaults() {
        let config = parse(&[
            "flock_app",
            "-n",
            "64",
            "--max-speed",
            "12.5",
            "--speed-limit",
            "axis_upper",
            "--sep_dist",
            "40",
        ]);
        let options = config.flock_options().unwrap();

        assert_eq!(config.no_agents, 64);
        assert_eq!(options.max_speed, 12.5);
        assert_eq!(options.desired_separation, 40.);
        assert_eq!(options.speed_limit, SpeedLimit::AxisUpper);
    }

    #[test]
    fn unknown_mode_is_a_config_error() {
        let config = parse(&["flock_app", "--separation-guard", "sometimes"]);

        assert!(matches!(
            config.flock_options(),
            Err(OptionsError::UnknownMode { .. })
        ));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let config = parse(&["flock_app", "--mass", "0"]);

        assert_eq!(config.flock_options(), Err(OptionsError::InvalidMass(0.)));
    }

    #[test]
    fn yaml_file_is_merged_under_flags() {
        let file: <Config as ClapSerde>::Opt =
            serde_yaml::from_str("no_agents: 7\nmax_speed: 3.5\n").unwrap();
        let mut args = Args::try_parse_from(["flock_app", "--max-speed", "9"]).unwrap();

        let config = Config::from(file).merge(&mut args.config);

        assert_eq!(config.no_agents, 7);
        assert_eq!(config.max_speed, 9.);
    }

    #[test]
    fn toml_file_is_read_as_toml() {
        let path = scratch_file(
            "config.toml",
            "no_agents = 12\nspeed_limit = \"axis_upper\"\nwidth = 640.0\n",
        );
        let file = read_config_file(&path);
        fs::remove_file(&path).unwrap();

        let mut args = Args::try_parse_from(["flock_app", "-n", "3"]).unwrap();
        let config = Config::from(file.unwrap()).merge(&mut args.config);

        assert_eq!(config.no_agents, 3);
        assert_eq!(config.width, 640.);
        assert_eq!(
            config.flock_options().unwrap().speed_limit,
            SpeedLimit::AxisUpper
        );
    }

    #[test]
    fn other_extensions_are_read_as_yaml() {
        let path = scratch_file("config.yaml", "no_agents: 9\nmass: 2.5\nrows: 12\n");
        let file = read_config_file(&path);
        fs::remove_file(&path).unwrap();

        let mut args = Args::try_parse_from(["flock_app", "--mass", "4"]).unwrap();
        let config = Config::from(file.unwrap()).merge(&mut args.config);

        assert_eq!(config.no_agents, 9);
        assert_eq!(config.rows, 12);
        assert_eq!(config.mass, 4.);
    }

    #[test]
    fn yaml_in_a_toml_file_is_rejected() {
        let path = scratch_file("broken.toml", "no_agents: 9\n");
        let file = read_config_file(&path);
        fs::remove_file(&path).unwrap();

        assert!(file.is_err());
    }
}
