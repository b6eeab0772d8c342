use anyhow::{Context, bail};
use clap::Parser;
use core::time::Duration;
use galley::PipelineConfig;

/// Runtime configuration for the `galley-sim` binary.
///
/// Every value is parsed from CLI arguments or environment variables. The
/// defaults reproduce the reference restaurant: ten customers, three cooks, a
/// waiter who can hold three orders, and five meals per customer.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "galley-sim",
    version,
    about = "Simulates a restaurant on top of a bounded admission queue"
)]
pub struct CliArgs {
    /// Names of the requesters (customers), comma separated. One task is
    /// started per name.
    ///
    /// Environment variable: `GALLEY_REQUESTERS`
    #[arg(
        long,
        env = "GALLEY_REQUESTERS",
        value_delimiter = ',',
        default_value = "Ani,Bai,Cat,Dao,Eve,Fay,Gus,Hua,Iza,Jai"
    )]
    pub requesters: Vec<String>,

    /// Names of the workers (cooks), comma separated.
    ///
    /// Environment variable: `GALLEY_WORKERS`
    #[arg(
        long,
        env = "GALLEY_WORKERS",
        value_delimiter = ',',
        default_value = "Remy,Colette,Linguini"
    )]
    pub workers: Vec<String>,

    /// Number of items the admission queue holds at once.
    ///
    /// Environment variable: `GALLEY_CAPACITY`
    #[arg(long, env = "GALLEY_CAPACITY", default_value_t = 3)]
    pub capacity: usize,

    /// Successful replies each requester consumes before going home.
    ///
    /// Environment variable: `GALLEY_TARGET`
    #[arg(long, env = "GALLEY_TARGET", default_value_t = 5)]
    pub target: usize,

    /// How long a requester waits for a free slot before abandoning an item.
    ///
    /// Environment variable: `GALLEY_ADMIT_TIMEOUT_MS`
    #[arg(long, env = "GALLEY_ADMIT_TIMEOUT_MS", default_value_t = 7_000)]
    pub admit_timeout_ms: u64,

    /// Base duration of one unit of work. Each item takes a random duration
    /// between half and one and a half times this.
    ///
    /// Environment variable: `GALLEY_WORK_MS`
    #[arg(long, env = "GALLEY_WORK_MS", default_value_t = 10_000)]
    pub work_ms: u64,

    /// Base duration a requester spends consuming a reply.
    ///
    /// Environment variable: `GALLEY_CONSUME_MS`
    #[arg(long, env = "GALLEY_CONSUME_MS", default_value_t = 2_000)]
    pub consume_ms: u64,

    /// Base duration a requester stays away after abandoning an item.
    ///
    /// Environment variable: `GALLEY_ABANDON_MS`
    #[arg(long, env = "GALLEY_ABANDON_MS", default_value_t = 5_000)]
    pub abandon_ms: u64,

    /// Multiplier applied to every duration, the admission timeout included.
    /// `0.1` runs the simulation ten times faster.
    ///
    /// Environment variable: `GALLEY_TIME_SCALE`
    #[arg(long, env = "GALLEY_TIME_SCALE", default_value_t = 1.0)]
    pub time_scale: f64,

    /// Probability in `[0, 1)` that a unit of work fails. Failed items are
    /// reported back and ordered again.
    ///
    /// Environment variable: `GALLEY_FAILURE_RATE`
    #[arg(long, env = "GALLEY_FAILURE_RATE", default_value_t = 0.0)]
    pub failure_rate: f64,

    /// Print the final report as JSON instead of a text summary.
    ///
    /// Environment variable: `GALLEY_JSON`
    #[arg(long, env = "GALLEY_JSON", default_value_t = false)]
    pub json: bool,
}

#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Pipeline settings. The base durations are unscaled; the admission
    /// timeout is already scaled.
    pub pipeline: PipelineConfig,
    pub time_scale: f64,
    pub failure_rate: f64,
    pub json: bool,
}

impl TryFrom<CliArgs> for SimConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.capacity == 0 {
            bail!("GALLEY_CAPACITY must be greater than 0");
        }
        if args.target == 0 {
            bail!("GALLEY_TARGET must be greater than 0");
        }
        if args.workers.is_empty() {
            bail!("GALLEY_WORKERS must name at least one worker");
        }
        if args.requesters.is_empty() {
            bail!("GALLEY_REQUESTERS must name at least one requester");
        }
        if !args.time_scale.is_finite() || args.time_scale <= 0.0 {
            bail!(
                "GALLEY_TIME_SCALE must be a positive number, got {}",
                args.time_scale
            );
        }
        if !(0.0..1.0).contains(&args.failure_rate) {
            bail!(
                "GALLEY_FAILURE_RATE must be in [0, 1), got {}",
                args.failure_rate
            );
        }

        let admit_timeout =
            Duration::try_from_secs_f64(args.admit_timeout_ms as f64 / 1_000.0 * args.time_scale)
                .context("scaled admission timeout is out of range")?;

        let pipeline = PipelineConfig {
            capacity: args.capacity,
            admit_timeout,
            completion_target: args.target,
            requesters: trimmed(args.requesters),
            workers: trimmed(args.workers),
            work_base: Duration::from_millis(args.work_ms),
            consume_base: Duration::from_millis(args.consume_ms),
            abandon_base: Duration::from_millis(args.abandon_ms),
        };
        // Catches duplicate and blank names.
        pipeline.validate()?;

        Ok(Self {
            pipeline,
            time_scale: args.time_scale,
            failure_rate: args.failure_rate,
            json: args.json,
        })
    }
}

fn trimmed(names: Vec<String>) -> Vec<String> {
    names.into_iter().map(|name| name.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<SimConfig> {
        let argv = core::iter::once("galley-sim").chain(args.iter().copied());
        SimConfig::try_from(CliArgs::try_parse_from(argv)?)
    }

    #[test]
    fn defaults_match_the_reference_restaurant() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.pipeline, PipelineConfig::default());
        assert_eq!(config.time_scale, 1.0);
        assert_eq!(config.failure_rate, 0.0);
        assert!(!config.json);
    }

    #[test]
    fn lists_are_comma_separated_and_trimmed() {
        let config = parse(&["--workers", "Remy, Colette", "--requesters", "Ani"]).unwrap();
        assert_eq!(config.pipeline.workers, ["Remy", "Colette"]);
        assert_eq!(config.pipeline.requesters, ["Ani"]);
    }

    #[test]
    fn time_scale_applies_to_the_admission_timeout() {
        let config = parse(&["--time-scale", "0.5", "--admit-timeout-ms", "7000"]).unwrap();
        assert_eq!(config.pipeline.admit_timeout, Duration::from_millis(3_500));
        // Base durations stay unscaled; the simulator scales them.
        assert_eq!(config.pipeline.work_base, Duration::from_secs(10));
    }

    #[test]
    fn rejects_invalid_values() {
        for args in [
            &["--capacity", "0"][..],
            &["--target", "0"],
            &["--time-scale", "0"],
            &["--time-scale", "-1"],
            &["--time-scale", "NaN"],
            &["--failure-rate", "1.0"],
            &["--failure-rate", "-0.1"],
            &["--workers", "Remy,Remy"],
            &["--requesters", "Ani,,Bai"],
        ] {
            assert!(parse(args).is_err(), "accepted {args:?}");
        }
    }
}
