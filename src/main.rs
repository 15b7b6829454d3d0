use clap::Parser;
use numerology_forecast::adapters::http::{self, ApiState};
use numerology_forecast::app::import::ImageImporter;
use numerology_forecast::config::Command;
use numerology_forecast::domain::ports::ContentStore;
use numerology_forecast::utils::error::ErrorSeverity;
use numerology_forecast::utils::{logger, validation::Validate};
use numerology_forecast::{
    AppConfig, CliConfig, ForecastError, ForecastPackager, ForecastService, LocalStorage,
    NumerologyEngine, SupabaseClient,
};
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 載入配置
    let mut config = match AppConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    match &cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = *port;
            }
            let level = if cli.verbose { "debug" } else { config.logging.level.as_str() };
            logger::init_server_logger(level, config.logging.json);
        }
        _ => logger::init_cli_logger(cli.verbose),
    }

    tracing::info!("Starting numerology-forecast");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(e) = run(cli.command, config).await {
        // 記錄詳細錯誤信息
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        // 輸出用戶友好的錯誤信息
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
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

async fn run(command: Command, config: AppConfig) -> Result<(), ForecastError> {
    // 整個程序共用一個 store 客戶端
    let store = Arc::new(SupabaseClient::new(&config.store)?);
    let engine = NumerologyEngine::new(config.year_offset_table()?);

    match command {
        Command::Serve { .. } => {
            let service = ForecastService::new(
                engine,
                store,
                config.forecast.default_language.clone(),
                config.forecast.variant_clock,
            );
            let router = http::router(ApiState::new(Arc::new(service)));
            http::serve(router, &config.bind_address()).await?;
        }

        Command::Forecast { date, target, lang } => {
            let service = ForecastService::new(
                engine,
                store,
                config.forecast.default_language.clone(),
                config.forecast.variant_clock,
            );
            let result = service
                .daily_forecast(&date, target.as_deref(), lang.as_deref(), chrono::Utc::now())
                .await?;

            println!("🔢 Daily number: {}", result.daily_number);
            match result.forecast {
                Some(forecast) => {
                    println!("📜 {} (variant {})", forecast.title, forecast.variant);
                    println!();
                    println!("{}", forecast.content);
                }
                None => println!("⚠️ No forecast found for this number"),
            }
        }

        Command::Package { date, target, output } => {
            let output_path = output.unwrap_or_else(|| config.package.output_path.clone());
            let storage = LocalStorage::new(output_path);
            let packager = ForecastPackager::new(engine, store, storage, config.forecast.variant_clock)
                .with_star_endpoint(config.package.star_endpoint.clone());

            let (location, summary) = packager
                .build(&date, target.as_deref(), chrono::Utc::now())
                .await?;

            tracing::info!("✅ Package created: {}", location);
            println!("✅ Package created!");
            println!("📁 Output saved to: {}", location);
            println!(
                "🔢 gada_cipars={}, menesa_cipars={} (variant {}, {} files)",
                summary.year_number,
                summary.month_number,
                summary.chosen_variant,
                summary.files.len()
            );
        }

        Command::ImportImages { category, folder } => {
            let importer = ImageImporter::new(store)?;
            let report = importer.import_folder(category, Path::new(&folder)).await?;
            println!(
                "🎉 Uploaded {} {} images ({} skipped)",
                report.uploaded.len(),
                category,
                report.skipped.len()
            );
        }

        Command::Ping => {
            let health = store.ping().await?;
            match health.count {
                Some(count) => println!("✅ Store reachable ({} forecast texts)", count),
                None => println!("✅ Store reachable"),
            }
        }
    }

    Ok(())
}
