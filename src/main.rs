use env_logger::Env;
use log::info;
use std::io;
use std::process;

use csv_knife::config::{self, Config};
use csv_knife::Pipeline;

fn run() -> csv_knife::Result<()> {
    let matches = config::app().get_matches();

    // Step 1. Resolve the whole configuration before touching any row
    let config = Config::from_matches(&matches)?;

    // Step 2. Stream stdin to stdout
    let report = Pipeline::new(&config).run(io::stdin(), io::stdout())?;

    info!(
        "{} rows read, {} rows written",
        report.rows_read, report.rows_written
    );

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    if let Err(e) = run() {
        eprintln!("csv-knife: {}", e);
        process::exit(1);
    }
}
