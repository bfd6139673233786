use std::{path::Path, path::PathBuf, str::FromStr};

use issue_search::SearchLimits;
use serde::Deserialize;
use serde_with::serde_as;
use strum::{Display, EnumString};

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub search: SearchSettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    /// Default `EnvFilter` directives; `RUST_LOG` wins when set.
    pub log_level: String,
    pub fixture_path: PathBuf,
}

#[serde_as]
#[derive(Deserialize, Clone, Debug)]
pub struct SearchSettings {
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub default_page_size: u32,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub max_page_size: u32,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub facet_page_size: u32,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub max_facet_scan: u32,
}

impl From<&SearchSettings> for SearchLimits {
    fn from(settings: &SearchSettings) -> Self {
        Self {
            default_page_size: settings.default_page_size,
            max_page_size: settings.max_page_size,
            facet_page_size: settings.facet_page_size,
            max_facet_scan: settings.max_facet_scan,
        }
    }
}

pub fn read_config(config_directory: &Path) -> Result<Settings, config::ConfigError> {
    let environment = Environment::from_str(
        std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .as_str(),
    )
    .map_err(|e| config::ConfigError::Message(format!("Failed to parse APP_ENVIRONMENT: {e}")))?;
    let environment_filename = format!("{}.yaml", environment);

    let settings = config::Config::builder()
        .add_source(config::File::from(config_directory.join("base.yaml")))
        .add_source(
            config::File::from(config_directory.join(environment_filename)).required(false),
        )
        .add_source(
            config::Environment::with_prefix("ISSUE_SEARCH")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

#[derive(Display, Debug, EnumString)]
pub enum Environment {
    #[strum(ascii_case_insensitive, serialize = "local")]
    Local,
    #[strum(ascii_case_insensitive, serialize = "production")]
    Production,
}
