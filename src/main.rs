#[macro_use] extern crate clap;

pub mod demos;
pub mod frame;
pub mod graphics;
pub mod interface;
pub mod logging;
pub mod math;
pub mod profiling;
pub mod window;

use std::env;
use std::process;

use interface::cli;
use logging::{init_logging, LogSettings};

fn main() {
    let config = match cli::parse_from(env::args_os()) {
        Ok(config) => config,
        Err(e) => e.exit(),
    };

    init_logging(&LogSettings::for_demo(&config));
    log::debug!("{:?}", config);

    if let Err(e) = demos::run(&config) {
        log::error!("{:#}", e);
        process::exit(1);
    }
}
