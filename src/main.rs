//! Entry point for the roms-monthly application.
//! Handles CLI parsing, logging setup, and dispatches the annual assembly.

use clap::Parser;
use roms_monthly::data_source::SnapshotSource;
use roms_monthly::metadata::print_layout;
use roms_monthly::{AnnualSeries, NetCDFSnapshotSource, NetCDFWriter};
mod cli;

use cli::Args;

fn main() {
    let args = Args::parse();

    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(level)
        .parse_default_env()
        .init();

    if let Err(error) = run(&args) {
        log::error!("{error}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    println!(
        r#"
------------------------------------------------------------------
      ____  ___  __  ___ ____    __  ___            __  __    __
     / __ \/ _ \/  |/  / ___/   /  |/  /__  ___  / /_/ /  / /_ __
    / /_/ / // / /|_/ /\__ \   / /|_/ / _ \/ _ \/ __/ _ \/ / // /
   / _, _/\___/_/  /_/____/  /_/  /_/\___/_//_/\__/_//_/_/\_, /
  /_/ |_|                                                /___/
              Calendar-month means of ROMS output
------------------------------------------------------------------
                        "#
    );
    log::debug!("{args:#?}");

    let config = args.to_config();

    if args.list_vars {
        let source = NetCDFSnapshotSource::new(&config.directory, config.naming.clone(), &config.time_variable);
        let layout = source.layout(config.file_start)?;
        print_layout(&layout);
    }

    let series = config.run()?;

    if let Some(output_path) = &args.output {
        NetCDFWriter::new(output_path).write_series(&series)?;
        println!("✅ Saved result to {}", output_path.display());
    } else {
        print_summary(&series);
    }

    Ok(())
}

fn print_summary(series: &AnnualSeries) {
    println!("Monthly means for {} ({} files processed):", series.year, series.files_processed);
    for (i, time) in series.times.iter().enumerate() {
        let month = i as u32 + 1;
        let status = if series.is_month_missing(month) {
            "no data".to_string()
        } else {
            format!("{} contribution(s)", series.contributions[i])
        };
        println!("  {} - {}", time.format("%Y-%m-%d %H:%M"), status);
    }
    println!("Variables:");
    for var in &series.variables {
        println!("  {} {:?}", var.name, var.data.shape());
    }
}
