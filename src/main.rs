use clap::Parser;
use inmet_processor::cli::{self, Args};
use std::process;

fn main() {
    let args = Args::parse();

    if let Err(error) = cli::setup_logging(&args) {
        eprintln!("Warning: {:#}", error);
    }

    match cli::run(&args) {
        Ok(stats) => {
            cli::print_summary(&stats);
            process::exit(0);
        }
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}
