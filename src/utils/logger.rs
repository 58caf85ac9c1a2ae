use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn default_filter(verbose: bool, level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directive = match (verbose, level) {
            (true, _) => "card_etl=debug,info".to_string(),
            (false, Some(level)) => format!("card_etl={}", level),
            (false, None) => "card_etl=info".to_string(),
        };
        EnvFilter::new(directive)
    })
}

/// 初始化 CLI 日誌；`json` 為 true 時輸出 JSON 格式
pub fn init_cli_logger(verbose: bool, json: bool, level: Option<&str>) {
    let filter = default_filter(verbose, level);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .json(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    }
}
