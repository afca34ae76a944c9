pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::config::{cli::LocalStorage, CliConfig};
pub use crate::core::client::{DirectoryClient, RetryPolicy};
pub use crate::core::{engine::ExtractEngine, filter::TitleFilter, pipeline::ExtractorPipeline};
pub use crate::domain::model::{Employee, OutputFormat};
pub use crate::utils::error::{ExtractorError, Result};
