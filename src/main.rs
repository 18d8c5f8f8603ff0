use clap::Parser;
use dc_servers::cli::{run, Cli};
use dc_servers::Settings;
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use std::error::Error;

fn init_logging() -> Result<(), Box<dyn Error>> {
    if std::path::Path::new("log4rs.yml").exists() {
        log4rs::init_file("log4rs.yml", Default::default())?;
    } else {
        let stderr = ConsoleAppender::builder()
            .target(log4rs::append::console::Target::Stderr)
            .build();
        let config = Config::builder()
            .appender(Appender::builder().build("stderr", Box::new(stderr)))
            .build(Root::builder().appender("stderr").build(LevelFilter::Warn))?;
        log4rs::init_config(config)?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    // Do as little as possible in main.rs as it can't contain any tests
    init_logging()?;
    dotenv::dotenv().ok();
    log::info!("#Start main()");

    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    let stdout = std::io::stdout();
    run(cli, settings, &mut stdout.lock())
}
