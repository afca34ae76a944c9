use crate::core::Pipeline;
use crate::utils::error::Result;

/// Drives one extraction run: extract, transform, load. Returns the paths
/// of the files written (empty when nothing matched).
pub struct ExtractEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> ExtractEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<Vec<String>> {
        println!("Fetching employee records...");
        let employees = self.pipeline.extract().await?;
        println!("Fetched {} employees", employees.len());

        println!("Filtering decision makers...");
        let result = self.pipeline.transform(employees).await?;
        println!(
            "Found {} decision makers (of {} employees)",
            result.decision_makers.len(),
            result.total_scanned
        );

        println!("Writing output...");
        let written = self.pipeline.load(result).await?;
        for path in &written {
            println!("Output saved to: {}", path);
        }

        Ok(written)
    }
}
