use anyhow::Context;
use clap::Parser;
use listing_search::config::{build_provider, TomlConfig};
use listing_search::core::query_string;
use listing_search::domain::ports::ConfigProvider;
use listing_search::utils::error::{ErrorSeverity, SearchError};
use listing_search::utils::output::{render_view, OutputFormat};
use listing_search::utils::{logger, validation::Validate};
use listing_search::{CliConfig, SearchSession, SearchSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 載入 TOML 配置 (若有)，命令列參數優先
    let toml_config = match &cli.config {
        Some(path) => match TomlConfig::from_file(path) {
            Ok(mut config) => {
                cli.apply_overrides(&mut config);
                Some(config)
            }
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", path, e);
                eprintln!("💡 Make sure the file exists and is valid TOML format");
                std::process::exit(1);
            }
        },
        None => None,
    };

    match &toml_config {
        Some(config) if config.json_logs() => logger::init_json_logger(config.log_level()),
        _ => logger::init_cli_logger(cli.verbose),
    }

    tracing::info!("Starting listing-search CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let validated = match &toml_config {
        Some(config) => config.validate(),
        None => cli.validate(),
    };
    if let Err(e) = validated {
        fail(&e);
    }

    let config: &dyn ConfigProvider = match &toml_config {
        Some(config) => config,
        None => &cli,
    };

    let format: OutputFormat = match cli.format.parse() {
        Ok(format) => format,
        Err(e) => fail(&e),
    };
    let params = match cli.search_params() {
        Ok(params) => params,
        Err(e) => fail(&e),
    };

    let mut settings = SearchSettings::from_config(config);
    if let Some(sort) = params.sort {
        settings.default_sort = sort;
    }

    tracing::info!(
        "🔎 Search: {} (page {}, size {}, sort {})",
        query_string::to_query_string(&params.criteria),
        params.page.unwrap_or(1),
        settings.page_size,
        settings.default_sort
    );

    if cli.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No catalog request will be made");
        println!("catalog: {:?}", config.catalog_source()?);
        println!("query string: {}", query_string::params_to_query_string(&params));
        println!("settings: {:?}", settings);
        return Ok(());
    }

    let headers = toml_config
        .as_ref()
        .map(TomlConfig::headers)
        .unwrap_or_default();
    let provider = match build_provider(config, headers) {
        Ok(provider) => provider,
        Err(e) => fail(&e),
    };

    let mut handle = SearchSession::spawn(provider, settings);
    let mut view = handle
        .search(params.criteria.clone())
        .await
        .context("search session stopped before publishing")?;

    if let Some(page) = params.page.filter(|p| *p > 1) {
        handle.set_page(page)?;
        view = handle
            .published_after(view.revision)
            .await
            .with_context(|| format!("no results published for page {}", page))?;
    }

    handle.shutdown().await;

    println!(
        "{}",
        render_view(&view, format).context("failed to render search results")?
    );

    if let Some(error) = &view.error {
        tracing::error!("❌ Search failed: {}", error);
        std::process::exit(2);
    }

    tracing::info!("✅ Search completed: {} matching listings", view.page.total_items);
    Ok(())
}

fn fail(e: &SearchError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
