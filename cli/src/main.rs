#[macro_use]
extern crate log;

use std::path::Path;

use abstutil::Timer;
use anyhow::Result;
use structopt::StructOpt;

use model::{
    export_final_delays_csv, export_summary_csv, summarize_by_time_of_day, Config, DelayModel,
};

#[derive(StructOpt)]
struct Args {
    /// The path to a CSV dump of the prediction table
    #[structopt(long)]
    input: String,
    /// A JSON file with model settings. Anything unspecified uses the defaults.
    #[structopt(long)]
    config: Option<String>,
    /// In minutes. A jump in predicted arrival bigger than this starts a new trip. The live feed
    /// is usually analyzed with 10.
    #[structopt(long)]
    max_delta: Option<f64>,
    /// In minutes. The smallest deviation from the initial prediction that counts as departing.
    #[structopt(long)]
    epsilon: Option<f64>,
    /// Where to write the output CSV files
    #[structopt(long, default_value = "data/output")]
    output: String,
    /// Include each trajectory point alongside its extrapolated delay
    #[structopt(long)]
    join: bool,
}

impl Args {
    fn config(&self) -> Result<Config> {
        let mut config = match self.config {
            Some(ref path) => Config::from_json(&fs_err::read_to_string(path)?)?,
            None => Config::default(),
        };
        if let Some(max_delta) = self.max_delta {
            config.max_delta = max_delta;
        }
        if let Some(epsilon) = self.epsilon {
            config.epsilon = epsilon;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    abstutil::logger::setup();
    let args = Args::from_iter(abstutil::cli_args());
    let config = args.config()?;
    let mut timer = Timer::new("calculate delays");

    timer.start("load predictions");
    let records = feed::load(fs_err::File::open(&args.input)?)?;
    timer.stop("load predictions");

    let model = DelayModel::new(&records, config, &mut timer)?;

    timer.start("final delays");
    let final_delays = model.final_delays();
    let summary = summarize_by_time_of_day(&final_delays);
    for x in &summary {
        info!(
            "{}: {} trips, mean final delay of {:.2} minutes",
            x.time_of_day, x.trips, x.mean_final_delay
        );
    }
    timer.stop("final delays");

    timer.start("extrapolate delays");
    let extrapolated = model.extrapolated_delays();
    let report = model.evaluate_extrapolation(&extrapolated)?;
    match report.mean_absolute_error {
        Some(error) => info!(
            "{} good fits (off by {:.2} minutes on average), {} bad fits",
            report.good_fits, error, report.bad_fits
        ),
        None => warn!("No good fits at all, {} bad fits", report.bad_fits),
    }
    timer.stop("extrapolate delays");

    let dir = Path::new(&args.output);
    fs_err::create_dir_all(dir)?;
    fs_err::write(dir.join("trajectories.csv"), model.export_trajectories_csv()?)?;
    fs_err::write(
        dir.join("final_delays.csv"),
        export_final_delays_csv(&final_delays)?,
    )?;
    fs_err::write(
        dir.join("time_of_day.csv"),
        export_summary_csv(&summary)?,
    )?;
    fs_err::write(
        dir.join("extrapolated_delays.csv"),
        model.export_extrapolated_csv(&extrapolated, args.join)?,
    )?;
    info!("Wrote results to {}", dir.display());

    Ok(())
}
