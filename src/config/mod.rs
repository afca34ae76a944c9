pub mod cli;

use crate::core::{ConfigProvider, OutputFormat};
use crate::utils::error::{ExtractorError, Result};
use crate::utils::validation::{self, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "dm-extract")]
#[command(about = "Extract decision makers from a company directory API")]
pub struct CliConfig {
    #[arg(
        long,
        short = 'c',
        help = "Company page URL, e.g. https://www.linkedin.com/company/acme"
    )]
    pub company: String,

    #[arg(
        long,
        short = 'o',
        default_value = "decision_makers",
        help = "Output file prefix; timestamp and extension are appended"
    )]
    pub output: String,

    #[arg(
        long,
        short = 'f',
        default_value = "both",
        help = "Output format: csv, json or both"
    )]
    pub format: OutputFormat,

    #[arg(long, short = 'k', help = "API key (overrides LINKEDIN_API_KEY)")]
    pub api_key: Option<String>,

    #[arg(long, default_value = "https://api.linkedin.com/v2")]
    pub api_base_url: String,

    #[arg(long, default_value = "100", help = "Employees requested per page")]
    pub page_size: usize,

    #[arg(long, default_value = "50", help = "Safety cap on pages fetched per run")]
    pub max_pages: usize,

    #[arg(long, default_value = "30", help = "Per-request timeout in seconds")]
    pub timeout_seconds: u64,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// Explicit flag first, then the environment. Missing both is fatal.
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Some(key) = &self.api_key {
            if !key.trim().is_empty() {
                return Ok(key.clone());
            }
        }
        match std::env::var("LINKEDIN_API_KEY") {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ExtractorError::MissingConfigError {
                field: "api_key".to_string(),
            }),
        }
    }
}

impl ConfigProvider for CliConfig {
    fn company_url(&self) -> &str {
        &self.company
    }

    fn output_prefix(&self) -> &str {
        &self.output
    }

    fn output_format(&self) -> OutputFormat {
        self.format
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    fn max_pages(&self) -> usize {
        self.max_pages
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("company", &self.company)?;
        validation::validate_url("api_base_url", &self.api_base_url)?;
        validation::validate_non_empty_string("output", &self.output)?;
        validation::validate_range("page_size", self.page_size, 1, 1000)?;
        validation::validate_range("max_pages", self.max_pages, 1, 10_000)?;
        validation::validate_range("timeout_seconds", self.timeout_seconds, 1, 300)?;
        Ok(())
    }
}
