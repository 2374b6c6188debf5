use instance_data::bootstrap::{BootstrapState, InstanceDataBootstrap};
use instance_data::cli::Cli;
use instance_data::config::loader::{ConfigLoader, ConfigLoaderFile};
use instance_data::property_source::instance_data::INSTANCE_DATA_SOURCE_NAME;
use instance_data::property_source::sources::PropertySources;
use std::error::Error;
use std::process;
use tracing::{error, warn};

fn main() {
    let cli = Cli::init();

    // Configuration errors are reported before logging is set up and before any request is sent.
    let config = match ConfigLoaderFile::new(cli.config_path().as_deref()).load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Could not load the configuration: {err}");
            process::exit(1);
        }
    };

    if let Err(err) = config.log.try_init() {
        eprintln!("{err}");
        process::exit(1);
    }

    if let Err(err) = run(&cli, &config) {
        error!("{err}");
        process::exit(1);
    }
}

fn run(
    cli: &Cli,
    config: &instance_data::config::InstanceDataConfig,
) -> Result<(), Box<dyn Error>> {
    let mut sources = PropertySources::new();
    sources.add_first(cli.command_line_source());

    let bootstrap = InstanceDataBootstrap::try_new(config)?;
    if bootstrap.run(&mut sources) == BootstrapState::Inactive {
        warn!("not a cloud environment, only explicit properties are resolved");
    }

    let names: Vec<String> = if cli.names().is_empty() {
        sources
            .get(INSTANCE_DATA_SOURCE_NAME)
            .map(|source| source.property_names())
            .unwrap_or_default()
    } else {
        cli.names().to_vec()
    };

    for name in names {
        match sources.get_property(&name) {
            Some(value) => println!("{name}={value}"),
            None => warn!(property = %name, "property not resolved"),
        }
    }
    Ok(())
}
