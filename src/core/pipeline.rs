use crate::core::client::DirectoryClient;
use crate::core::filter::TitleFilter;
use crate::core::{ConfigProvider, Employee, Pipeline, Storage, TransformResult};
use crate::utils::error::{ExtractorError, Result};
use chrono::Local;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;

/// Resolve the company identifier from a company page URL: the trailing
/// non-empty path segment.
pub fn resolve_company_id(company_url: &str) -> Result<String> {
    let parsed = url::Url::parse(company_url).map_err(|e| ExtractorError::InvalidUrlError {
        url: company_url.to_string(),
        reason: format!("not a valid URL: {e}"),
    })?;

    parsed
        .path_segments()
        .and_then(|segments| segments.filter(|segment| !segment.is_empty()).last())
        .map(str::to_string)
        .ok_or_else(|| ExtractorError::InvalidUrlError {
            url: company_url.to_string(),
            reason: "no company identifier in URL path".to_string(),
        })
}

/// Render the records as CSV. Columns are the first-seen union of field
/// names; string values are written raw, other values as compact JSON,
/// missing fields as empty cells.
fn render_csv(records: &[Employee]) -> Result<String> {
    let mut columns: Vec<&str> = Vec::new();
    let mut seen = HashSet::new();
    for record in records {
        for key in record.fields.keys() {
            if seen.insert(key.as_str()) {
                columns.push(key.as_str());
            }
        }
    }
    if columns.is_empty() {
        return Ok(String::new());
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&columns)?;
    for record in records {
        let row: Vec<String> = columns
            .iter()
            .map(|column| match record.fields.get(*column) {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(text)) => text.clone(),
                Some(other) => other.to_string(),
            })
            .collect();
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExtractorError::ProcessingError {
            message: format!("failed to finish CSV buffer: {e}"),
        })?;
    String::from_utf8(bytes).map_err(|e| ExtractorError::ProcessingError {
        message: format!("CSV output was not valid UTF-8: {e}"),
    })
}

pub struct ExtractorPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: DirectoryClient,
    filter: TitleFilter,
}

impl<S: Storage, C: ConfigProvider> ExtractorPipeline<S, C> {
    pub fn new(storage: S, config: C, client: DirectoryClient) -> Self {
        Self {
            storage,
            config,
            client,
            filter: TitleFilter::default(),
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ExtractorPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<Employee>> {
        let company_id = resolve_company_id(self.config.company_url())?;
        tracing::info!(
            "🏢 Resolved company id '{}' from {}",
            company_id,
            self.config.company_url()
        );

        let mut all_employees = Vec::new();
        let page_size = self.config.page_size();

        for page in 1..=self.config.max_pages() {
            let employees = self
                .client
                .fetch_employee_page(&company_id, page, page_size)
                .await?;
            if employees.is_empty() {
                break;
            }

            all_employees.extend(employees);
            tracing::info!("📡 Page {}: {} employees so far", page, all_employees.len());

            if page == self.config.max_pages() {
                tracing::warn!("🔶 Stopping at configured page limit ({})", page);
                break;
            }

            // Brief pause between pages to stay under API rate limits.
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        Ok(all_employees)
    }

    async fn transform(&self, data: Vec<Employee>) -> Result<TransformResult> {
        let total_scanned = data.len();

        let mut seen = HashSet::new();
        let mut unique = data;
        unique.retain(|employee| seen.insert(employee.dedup_key()));
        let duplicates = total_scanned - unique.len();
        if duplicates > 0 {
            tracing::info!("🔄 Dropped {} duplicate records", duplicates);
        }

        let decision_makers: Vec<Employee> = unique
            .into_iter()
            .filter(|employee| self.filter.is_decision_maker(employee))
            .collect();
        tracing::info!(
            "🔎 {} of {} employees match decision-maker titles",
            decision_makers.len(),
            total_scanned
        );

        // Render both bodies up front so nothing is written if either fails.
        let csv_output = render_csv(&decision_makers)?;
        let json_output = serde_json::to_string_pretty(&decision_makers)?;

        Ok(TransformResult {
            decision_makers,
            total_scanned,
            csv_output,
            json_output,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<Vec<String>> {
        if result.decision_makers.is_empty() {
            tracing::info!("📁 No decision makers to write, skipping output");
            return Ok(Vec::new());
        }

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let base = format!("{}_{}", self.config.output_prefix(), timestamp);
        let format = self.config.output_format();
        let mut written = Vec::new();

        if format.includes_csv() {
            let path = format!("{base}.csv");
            self.storage
                .write_file(&path, result.csv_output.as_bytes())
                .await?;
            tracing::info!("💾 Wrote {}", path);
            written.push(path);
        }
        if format.includes_json() {
            let path = format!("{base}.json");
            self.storage
                .write_file(&path, result.json_output.as_bytes())
                .await?;
            tracing::info!("💾 Wrote {}", path);
            written.push(path);
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::client::RetryPolicy;
    use crate::core::OutputFormat;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn file_names(&self) -> Vec<String> {
            let files = self.files.lock().await;
            let mut names: Vec<String> = files.keys().cloned().collect();
            names.sort();
            names
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                ExtractorError::WriteError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        company_url: String,
        output_prefix: String,
        format: OutputFormat,
        page_size: usize,
        max_pages: usize,
    }

    impl MockConfig {
        fn new(format: OutputFormat, page_size: usize, max_pages: usize) -> Self {
            Self {
                company_url: "https://www.linkedin.com/company/acme".to_string(),
                output_prefix: "decision_makers".to_string(),
                format,
                page_size,
                max_pages,
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn company_url(&self) -> &str {
            &self.company_url
        }

        fn output_prefix(&self) -> &str {
            &self.output_prefix
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

    fn test_client(base_url: &str) -> DirectoryClient {
        DirectoryClient::new(
            base_url,
            "test-key",
            Duration::from_secs(5),
            RetryPolicy {
                max_retries: 3,
                base_delay: Duration::from_millis(10),
                rate_limit_delay: Duration::from_millis(10),
            },
        )
        .unwrap()
    }

    fn pipeline(
        server_url: &str,
        config: MockConfig,
    ) -> ExtractorPipeline<MockStorage, MockConfig> {
        ExtractorPipeline::new(MockStorage::new(), config, test_client(server_url))
    }

    fn employee(value: serde_json::Value) -> Employee {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_resolve_company_id_takes_trailing_segment() {
        assert_eq!(
            resolve_company_id("https://www.linkedin.com/company/acme").unwrap(),
            "acme"
        );
        assert_eq!(
            resolve_company_id("https://www.linkedin.com/company/acme/").unwrap(),
            "acme"
        );
        assert_eq!(
            resolve_company_id("https://www.linkedin.com/company/acme?trk=nav").unwrap(),
            "acme"
        );
    }

    #[test]
    fn test_resolve_company_id_rejects_empty_path() {
        assert!(matches!(
            resolve_company_id("https://www.linkedin.com"),
            Err(ExtractorError::InvalidUrlError { .. })
        ));
        assert!(matches!(
            resolve_company_id("https://www.linkedin.com/"),
            Err(ExtractorError::InvalidUrlError { .. })
        ));
        assert!(matches!(
            resolve_company_id("not a url"),
            Err(ExtractorError::InvalidUrlError { .. })
        ));
    }

    #[tokio::test]
    async fn test_extract_pages_until_empty_page() {
        let server = MockServer::start();
        let page1 = server.mock(|when, then| {
            when.method(GET)
                .path("/company_employee")
                .query_param("companyId", "acme")
                .query_param("page", "1")
                .query_param("pageSize", "2");
            then.status(200).json_body(json!({"results": [
                {"name": "John Doe", "title": "CEO"},
                {"name": "Jane Smith", "title": "CTO"}
            ]}));
        });
        let page2 = server.mock(|when, then| {
            when.method(GET)
                .path("/company_employee")
                .query_param("page", "2");
            then.status(200).json_body(json!({"results": [
                {"name": "Bob Johnson", "title": "Software Engineer"},
                {"name": "Alice Williams", "title": "Director of Marketing"}
            ]}));
        });
        let page3 = server.mock(|when, then| {
            when.method(GET)
                .path("/company_employee")
                .query_param("page", "3");
            then.status(200).json_body(json!({"results": []}));
        });

        let pipeline = pipeline(&server.url(""), MockConfig::new(OutputFormat::Both, 2, 50));
        let employees = pipeline.extract().await.unwrap();

        page1.assert();
        page2.assert();
        page3.assert();
        assert_eq!(employees.len(), 4);
        // API return order is preserved across pages
        assert_eq!(employees[0].fields.get("name").unwrap(), "John Doe");
        assert_eq!(employees[3].fields.get("name").unwrap(), "Alice Williams");
    }

    #[tokio::test]
    async fn test_extract_stops_at_page_limit() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/company_employee");
            then.status(200).json_body(json!({"results": [
                {"name": "John Doe", "title": "CEO"}
            ]}));
        });

        let pipeline = pipeline(&server.url(""), MockConfig::new(OutputFormat::Both, 1, 2));
        let employees = pipeline.extract().await.unwrap();

        assert_eq!(api_mock.hits(), 2);
        assert_eq!(employees.len(), 2);
    }

    #[tokio::test]
    async fn test_extract_propagates_permanent_fetch_error() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/company_employee");
            then.status(403);
        });

        let pipeline = pipeline(&server.url(""), MockConfig::new(OutputFormat::Both, 100, 50));
        let err = pipeline.extract().await.unwrap_err();

        assert_eq!(api_mock.hits(), 1);
        assert!(matches!(err, ExtractorError::FetchError { .. }));
    }

    #[tokio::test]
    async fn test_extract_rejects_company_url_without_path() {
        let pipeline = pipeline(
            "http://localhost:1",
            MockConfig {
                company_url: "https://www.linkedin.com/".to_string(),
                ..MockConfig::new(OutputFormat::Both, 100, 50)
            },
        );

        assert!(matches!(
            pipeline.extract().await,
            Err(ExtractorError::InvalidUrlError { .. })
        ));
    }

    #[tokio::test]
    async fn test_transform_keeps_decision_makers_only() {
        let pipeline = pipeline(
            "http://localhost:1",
            MockConfig::new(OutputFormat::Both, 100, 50),
        );
        let input = vec![
            employee(json!({"name": "Bob Johnson", "title": "Senior Engineer"})),
            employee(json!({"name": "Jane Smith", "title": "VP of Sales"})),
        ];

        let result = pipeline.transform(input).await.unwrap();

        assert_eq!(result.total_scanned, 2);
        assert_eq!(result.decision_makers.len(), 1);
        assert_eq!(result.decision_makers[0].title(), Some("VP of Sales"));
        assert_eq!(result.csv_output, "name,title\nJane Smith,VP of Sales\n");

        let parsed: Vec<serde_json::Value> = serde_json::from_str(&result.json_output).unwrap();
        assert_eq!(parsed, vec![json!({"name": "Jane Smith", "title": "VP of Sales"})]);
    }

    #[tokio::test]
    async fn test_transform_dedups_by_profile_link_first_wins() {
        let pipeline = pipeline(
            "http://localhost:1",
            MockConfig::new(OutputFormat::Both, 100, 50),
        );
        let input = vec![
            employee(json!({
                "name": "Jane Smith",
                "title": "VP of Sales",
                "profileUrl": "https://www.linkedin.com/in/jane-smith"
            })),
            employee(json!({
                "name": "Jane Smith",
                "title": "VP of Sales (EMEA)",
                "profileUrl": "https://www.linkedin.com/in/jane-smith"
            })),
            employee(json!({
                "name": "John Doe",
                "title": "CEO",
                "profileUrl": "https://www.linkedin.com/in/john-doe"
            })),
        ];

        let result = pipeline.transform(input).await.unwrap();

        assert_eq!(result.total_scanned, 3);
        assert_eq!(result.decision_makers.len(), 2);
        assert_eq!(result.decision_makers[0].title(), Some("VP of Sales"));
        assert_eq!(result.decision_makers[1].title(), Some("CEO"));
    }

    #[tokio::test]
    async fn test_transform_with_empty_input() {
        let pipeline = pipeline(
            "http://localhost:1",
            MockConfig::new(OutputFormat::Both, 100, 50),
        );

        let result = pipeline.transform(Vec::new()).await.unwrap();

        assert_eq!(result.total_scanned, 0);
        assert!(result.decision_makers.is_empty());
        assert_eq!(result.csv_output, "");
        assert_eq!(result.json_output, "[]");
    }

    #[test]
    fn test_render_csv_unions_columns_across_records() {
        let records = vec![
            employee(json!({"name": "John Doe", "title": "CEO"})),
            employee(json!({"name": "Alice Williams", "title": "Director", "location": "Berlin"})),
        ];

        let output = render_csv(&records).unwrap();
        let mut lines = output.lines();
        assert_eq!(lines.next(), Some("name,title,location"));
        assert_eq!(lines.next(), Some("John Doe,CEO,"));
        assert_eq!(lines.next(), Some("Alice Williams,Director,Berlin"));
    }

    #[test]
    fn test_render_csv_serializes_non_string_values() {
        let records = vec![employee(json!({
            "name": "John Doe",
            "title": "CEO",
            "connections": 500
        }))];

        let output = render_csv(&records).unwrap();
        assert_eq!(output, "connections,name,title\n500,John Doe,CEO\n");
    }

    #[tokio::test]
    async fn test_load_writes_selected_formats() {
        let storage = MockStorage::new();
        let config = MockConfig::new(OutputFormat::Both, 100, 50);
        let pipeline = ExtractorPipeline::new(storage.clone(), config, test_client("http://localhost:1"));

        let decision_makers = vec![employee(json!({"name": "Jane Smith", "title": "VP of Sales"}))];
        let result = TransformResult {
            csv_output: render_csv(&decision_makers).unwrap(),
            json_output: serde_json::to_string_pretty(&decision_makers).unwrap(),
            decision_makers,
            total_scanned: 1,
        };

        let written = pipeline.load(result).await.unwrap();

        assert_eq!(written.len(), 2);
        assert!(written[0].starts_with("decision_makers_") && written[0].ends_with(".csv"));
        assert!(written[1].starts_with("decision_makers_") && written[1].ends_with(".json"));

        let names = storage.file_names().await;
        assert_eq!(names.len(), 2);
        let csv_bytes = storage.read_file(&written[0]).await.unwrap();
        assert_eq!(
            String::from_utf8(csv_bytes).unwrap(),
            "name,title\nJane Smith,VP of Sales\n"
        );
    }

    #[tokio::test]
    async fn test_load_csv_only_writes_single_file() {
        let storage = MockStorage::new();
        let config = MockConfig::new(OutputFormat::Csv, 100, 50);
        let pipeline = ExtractorPipeline::new(storage.clone(), config, test_client("http://localhost:1"));

        let decision_makers = vec![employee(json!({"name": "John Doe", "title": "CEO"}))];
        let result = TransformResult {
            csv_output: render_csv(&decision_makers).unwrap(),
            json_output: serde_json::to_string_pretty(&decision_makers).unwrap(),
            decision_makers,
            total_scanned: 1,
        };

        let written = pipeline.load(result).await.unwrap();

        assert_eq!(written.len(), 1);
        assert!(written[0].ends_with(".csv"));
        assert_eq!(storage.file_names().await.len(), 1);
    }

    #[tokio::test]
    async fn test_load_skips_write_when_nothing_matched() {
        let storage = MockStorage::new();
        let config = MockConfig::new(OutputFormat::Both, 100, 50);
        let pipeline = ExtractorPipeline::new(storage.clone(), config, test_client("http://localhost:1"));

        let result = TransformResult {
            decision_makers: Vec::new(),
            total_scanned: 10,
            csv_output: String::new(),
            json_output: "[]".to_string(),
        };

        let written = pipeline.load(result).await.unwrap();

        assert!(written.is_empty());
        assert!(storage.file_names().await.is_empty());
    }
}
