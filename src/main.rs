use std::io;
use std::process::ExitCode;

use clap::Parser;

use oxyping::app;
use oxyping::config::{AppConfig, Args};
use oxyping::dns_probe::prelude::*;
use oxyping::probe::{cancel, install_interrupt_handler};

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not errors
            return match e.use_stderr() {
                true => ExitCode::from(1),
                false => ExitCode::SUCCESS,
            };
        }
    };
    init_logging(args.verbose);
    log::debug!("got arguments: {:?}", args);

    let config = match AppConfig::load(args) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::from(1);
        }
    };

    let (handle, mut signal) = cancel::channel();
    install_interrupt_handler(handle);
    let exchanger = UdpExchanger::new(config.timeout);

    let result = app::run(&config, &exchanger, &mut signal, &mut io::stdout().lock()).await;
    if let Err(e) = &result {
        log::error!("{e:#}");
    }
    ExitCode::from(app::exit_status(&result))
}
