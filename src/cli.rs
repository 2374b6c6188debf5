use std::path::PathBuf;

use clap::Parser;

use crate::parser::ConfigEntry;
use crate::property_source::MapPropertySource;

/// Name of the source holding the `--set` properties.
pub const COMMAND_LINE_SOURCE_NAME: &str = "command-line";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)] // Read from `Cargo.toml`
pub struct Cli {
    /// YAML configuration file. Every setting can be overridden with `INSTANCE_DATA_` variables.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Explicit properties, taking precedence over the instance data.
    #[arg(short = 's', long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    properties: Vec<ConfigEntry>,

    /// Properties to resolve. All user-data entries are printed when none is given.
    names: Vec<String>,
}

impl Cli {
    /// Parses command line arguments
    pub fn init() -> Self {
        Self::parse()
    }

    pub fn config_path(&self) -> Option<PathBuf> {
        self.config.clone()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Source built from the `--set` arguments.
    pub fn command_line_source(&self) -> MapPropertySource {
        MapPropertySource::from_entries(COMMAND_LINE_SOURCE_NAME, self.properties.clone())
    }
}

fn parse_key_value(arg: &str) -> Result<ConfigEntry, String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok(ConfigEntry::new(key.trim(), value.trim()))
        }
        _ => Err(format!("`{arg}` is not a KEY=VALUE pair")),
    }
}
