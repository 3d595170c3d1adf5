use anyhow::Context;
use clap::Parser;
use reddit_gateway::core::router;
use reddit_gateway::utils::error::ErrorCategory;
use reddit_gateway::utils::{logger, validation::Validate};
use reddit_gateway::{
    CliConfig, Exporter, Gateway, GatewayConfig, GatewayEngine, HttpTransport, LocalStorage,
    WorkItem,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliConfig::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting reddit-gateway");
    if args.verbose {
        tracing::debug!("CLI config: {:?}", args);
    }

    // 載入 TOML 配置（未指定時使用預設值）
    let mut config = match &args.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            match GatewayConfig::from_file(path) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("❌ Failed to load config file '{}': {}", path, e);
                    eprintln!("💡 Make sure the file exists and is valid TOML format");
                    std::process::exit(1);
                }
            }
        }
        None => GatewayConfig::default(),
    };

    if let Some(output_path) = &args.output_path {
        config.output.output_path = output_path.clone();
        tracing::info!("🔧 Output path overridden to: {}", output_path);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let content = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read input file '{}'", args.input))?;
    let items = match WorkItem::from_json_array(&content) {
        Ok(items) => items,
        Err(e) => {
            eprintln!("❌ Input file '{}' is not a JSON array of work items: {}", args.input, e);
            std::process::exit(1);
        }
    };
    tracing::info!("📥 Loaded {} work item(s) from {}", items.len(), args.input);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No API calls will be made");
        return perform_dry_run(&items);
    }

    let transport = HttpTransport::from_config(&config.api)?;
    if config.api.access_token().is_none() {
        tracing::warn!("⚠️ No access token configured, authenticated routes will fail");
    }

    let gateway = Gateway::new(transport)
        .with_page_size(config.listing.page_size)
        .with_concurrency(config.gateway.concurrent_requests);
    let storage = LocalStorage::new(config.output.output_path.clone());
    let exporter = Exporter::new(storage, config.output.clone());
    let engine = GatewayEngine::new(gateway, exporter);

    match engine.run(&items).await {
        Ok(summary) => {
            tracing::info!(
                "✅ Completed: {} item(s), {} record(s)",
                summary.items_processed,
                summary.records_written
            );
            println!("✅ Processed {} item(s) into {} record(s)", summary.items_processed, summary.records_written);
            for file in &summary.files {
                println!("📁 Output saved to: {}/{}", config.output.output_path, file);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("❌ Run failed: {} (Category: {:?})", e, e.category());
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 依錯誤類別決定退出碼
            let exit_code = match e.category() {
                ErrorCategory::Configuration | ErrorCategory::Output => 1,
                ErrorCategory::Transport => 2,
                ErrorCategory::Routing | ErrorCategory::Response => 3,
            };
            std::process::exit(exit_code);
        }
    }
}

/// 只解析路由並印出請求內容，不呼叫 API
fn perform_dry_run(items: &[WorkItem]) -> anyhow::Result<()> {
    let mut failures = 0usize;

    for item in items {
        match router::resolve(item) {
            Ok(route) => {
                println!(
                    "#{} {} {} {}",
                    item.index,
                    route.request.method,
                    route.request.endpoint,
                    serde_json::to_string(&route)?
                );
            }
            Err(e) => {
                failures += 1;
                println!("#{} ❌ {}", item.index, e);
            }
        }
    }

    if failures > 0 {
        eprintln!("❌ {} item(s) cannot be routed", failures);
        std::process::exit(3);
    }
    Ok(())
}
