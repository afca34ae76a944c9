use std::time::Duration;

use clap::Parser;
use dm_extract::utils::{error::ErrorSeverity, logger, validation::Validate};
use dm_extract::{
    CliConfig, DirectoryClient, ExtractEngine, ExtractorPipeline, LocalStorage, RetryPolicy,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting dm-extract CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let api_key = match config.resolve_api_key() {
        Ok(key) => key,
        Err(e) => {
            tracing::error!("❌ {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let client = match DirectoryClient::new(
        &config.api_base_url,
        &api_key,
        Duration::from_secs(config.timeout_seconds),
        RetryPolicy::default(),
    ) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("❌ {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let storage = LocalStorage::new(".".to_string());
    let pipeline = ExtractorPipeline::new(storage, config, client);
    let engine = ExtractEngine::new(pipeline);

    match engine.run().await {
        Ok(written) if written.is_empty() => {
            tracing::info!("No decision makers found");
            println!("No decision makers found.");
        }
        Ok(written) => {
            tracing::info!("✅ Extraction completed successfully!");
            println!("✅ Extraction completed successfully!");
            for path in &written {
                println!("📁 Results saved to {}", path);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Extraction failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
