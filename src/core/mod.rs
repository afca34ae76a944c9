pub mod client;
pub mod engine;
pub mod filter;
pub mod pipeline;

pub use crate::domain::model::{Employee, OutputFormat, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
