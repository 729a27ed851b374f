//! Standard tap arguments
//!
//! Every tap accepts the same flags: a config file, an optional state file
//! and an optional catalog, plus `--discover` to run discovery instead of a
//! sync.

use crate::catalog::Catalog;
use crate::config::{check_config, load_json};
use crate::error::{Error, Result};
use crate::state::State;
use crate::types::{JsonObject, JsonValue};
use clap::Parser;
use std::path::PathBuf;

/// Command-line flags shared by every tap
#[derive(Parser, Debug, Clone, Default)]
#[command(about, long_about = None)]
pub struct TapArgs {
    /// Config file
    #[arg(short, long)]
    pub config: PathBuf,

    /// State file
    #[arg(short, long)]
    pub state: Option<PathBuf>,

    /// Property selections: DEPRECATED, Please use --catalog instead
    #[arg(short, long)]
    pub properties: Option<PathBuf>,

    /// Catalog file
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Do schema discovery
    #[arg(short, long)]
    pub discover: bool,

    /// Runs the tap in dev mode
    #[arg(long)]
    pub dev: bool,
}

/// Tap arguments with every file loaded
#[derive(Debug, Clone)]
pub struct ParsedArgs {
    /// Path of the config file
    pub config_path: PathBuf,
    /// The config object
    pub config: JsonObject,
    /// Path of the state file, if one was given
    pub state_path: Option<PathBuf>,
    /// The state; empty without a state file
    pub state: State,
    /// Path of the properties file, if one was given
    pub properties_path: Option<PathBuf>,
    /// The deprecated properties document
    pub properties: Option<JsonValue>,
    /// Path of the catalog file, if one was given
    pub catalog_path: Option<PathBuf>,
    /// The catalog
    pub catalog: Option<Catalog>,
    pub discover: bool,
    pub dev: bool,
}

impl ParsedArgs {
    /// Load every file named by `args` and check the config for
    /// `required_config_keys`
    pub fn from_tap_args<S: AsRef<str>>(args: TapArgs, required_config_keys: &[S]) -> Result<Self> {
        let config = match load_json(&args.config)? {
            JsonValue::Object(map) => map,
            other => {
                return Err(Error::config(format!(
                    "Config file must hold a JSON object, got {other}"
                )))
            }
        };

        let state = match &args.state {
            Some(path) => State::from_value(load_json(path)?)?,
            None => State::new(),
        };

        let properties = args.properties.as_ref().map(load_json).transpose()?;
        if properties.is_some() {
            tracing::warn!("--properties is deprecated, use --catalog instead");
        }

        let catalog = args.catalog.as_ref().map(Catalog::load).transpose()?;

        check_config(&config, required_config_keys)?;

        Ok(Self {
            config_path: args.config,
            config,
            state_path: args.state,
            state,
            properties_path: args.properties,
            properties,
            catalog_path: args.catalog,
            catalog,
            discover: args.discover,
            dev: args.dev,
        })
    }
}

/// Parse the process arguments and load every file they name.
///
/// Exits with a usage message on invalid flags, like any clap parser.
pub fn parse_args<S: AsRef<str>>(required_config_keys: &[S]) -> Result<ParsedArgs> {
    ParsedArgs::from_tap_args(TapArgs::parse(), required_config_keys)
}
