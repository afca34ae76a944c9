use crate::domain::model::{Employee, OutputFormat, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn company_url(&self) -> &str;
    fn output_prefix(&self) -> &str;
    fn output_format(&self) -> OutputFormat;
    fn page_size(&self) -> usize;
    fn max_pages(&self) -> usize;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Employee>>;
    async fn transform(&self, data: Vec<Employee>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<Vec<String>>;
}
