use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn build_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Directive used when neither `RUST_LOG` nor the config sets a level.
pub fn default_directive(verbose: bool, level: Option<&str>) -> String {
    match (verbose, level) {
        (true, _) => "term_sync=debug,info".to_string(),
        (false, Some(level)) => format!("term_sync={}", level),
        (false, None) => "term_sync=info".to_string(),
    }
}

pub fn init_cli_logger(verbose: bool, level: Option<&str>) {
    let filter = build_filter(&default_directive(verbose, level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}

pub fn init_json_logger(level: Option<&str>) {
    let filter = build_filter(&default_directive(false, level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .json(), // 結構化輸出，方便收集 outcome 事件
        )
        .try_init();
}
