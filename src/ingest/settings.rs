//! Runtime configuration.
//!
//! Loaded from an optional TOML file and `FATTURA__`-prefixed environment
//! variables (e.g. `FATTURA__LOCALE=en`, `FATTURA__OPERATING_VAT_ID=IT00000000099`).

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use super::messages::Locale;
use crate::fatturapa::{DEFAULT_DISCOUNT_DESCRIPTION, ExtractOptions, FixedDiscountDescription};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct IngestConfig {
    /// Language of outcome messages.
    #[serde(default)]
    pub locale: Locale,

    /// Select the operating company by VAT id instead of by flag.
    #[serde(default)]
    pub operating_vat_id: Option<String>,

    /// Description stored on discounts discovered in invoices.
    #[serde(default = "default_discount_description")]
    pub discount_description: String,

    /// Refuse uploads whose file name does not end in `.xml`.
    #[serde(default = "default_true")]
    pub require_xml_extension: bool,

    /// JSON snapshot used by the command line tool.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

fn default_discount_description() -> String {
    DEFAULT_DISCOUNT_DESCRIPTION.to_string()
}

fn default_true() -> bool {
    true
}

fn default_store_path() -> PathBuf {
    PathBuf::from("fattura-store.json")
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            operating_vat_id: None,
            discount_description: default_discount_description(),
            require_xml_extension: true,
            store_path: default_store_path(),
        }
    }
}

impl IngestConfig {
    /// Load from `path` (optional file) overlaid with `FATTURA__*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder
            .add_source(Environment::with_prefix("FATTURA").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Parse a TOML document, without environment overrides.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    pub fn options(&self) -> IngestOptions {
        IngestOptions {
            locale: self.locale,
            require_xml_extension: self.require_xml_extension,
            extract: ExtractOptions::default().with_discount_description(
                FixedDiscountDescription(self.discount_description.clone()),
            ),
        }
    }
}

/// Options the [`Ingestor`](super::Ingestor) runs with.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub locale: Locale,
    pub require_xml_extension: bool,
    pub extract: ExtractOptions,
}

impl Default for IngestOptions {
    fn default() -> Self {
        IngestConfig::default().options()
    }
}
