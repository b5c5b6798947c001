use serde_derive::Deserialize;

use formlang::GrammarOptions;

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub verbose: bool,

    pub grammar: GrammarOptions,

    pub output: OutputOptions,

    pub sample: SampleOptions,
}

#[derive(Copy, Clone, Debug, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(default)]
pub struct OutputOptions {
    pub format: OutputFormat,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SampleOptions {
    pub count: usize,
    pub depth_limit: usize,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            count: 10,
            depth_limit: 30,
        }
    }
}

pub enum ConfigReadError {
    ReadError(std::io::Error),
    ParseError(toml::de::Error),
}

/// Reads the configuration file; a missing file yields the defaults.
pub fn load_config<P: AsRef<std::path::Path>>(path: P) -> Result<Config, ConfigReadError> {
    let config = match std::fs::read_to_string(path) {
        Ok(config) => config,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(e) => return Err(ConfigReadError::ReadError(e)),
    };

    toml::from_str::<Config>(&config).map_err(ConfigReadError::ParseError)
}
