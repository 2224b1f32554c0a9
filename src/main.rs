use std::process::ExitCode;
use clap::Parser as ClapParser;
use log::LevelFilter;
use nu_ansi_term::Color;
use purah_lang::{paint, run, Config};

fn main() -> ExitCode {
    let config: Config = Config::parse();

    let mut logger = env_logger::Builder::new();
    logger.filter_level(if config.verbose { LevelFilter::Debug } else { LevelFilter::Warn });
    logger.parse_default_env();
    logger.init();

    if !config.no_hello {
        println!("Welcome back to {}!", paint(config.colorful, Color::Red, "Purah"));
    }

    match run(&config) {
        Ok(result) => {
            if config.yes_goodbye {
                println!("\nGoodbye! Have a {} day!", paint(config.colorful, Color::Red, "great"));
            }

            // Exit statuses only keep the low byte
            ExitCode::from(result as u8)
        },
        Err(err) => {
            println!("{}", paint(config.colorful, Color::Purple, &format!("|| Purah: {}", err)));
            ExitCode::from(255)
        },
    }
}
