use clap::Parser;
use term_sync::config::LogFormat;
use term_sync::utils::error::ErrorSeverity;
use term_sync::utils::logger;
use term_sync::{run_file_sync, CliConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 讀取並合併配置（命令列優先）
    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 初始化日誌
    match config.logging.format {
        LogFormat::Json => logger::init_json_logger(config.logging.level.as_deref()),
        LogFormat::Compact => logger::init_cli_logger(cli.verbose, config.logging.level.as_deref()),
    }

    tracing::info!("Starting term-sync");
    if cli.verbose {
        tracing::debug!("Resolved config: {:?}", config);
    }

    match run_file_sync(&config).await {
        Ok(report) => {
            for outcome in &report.outcomes {
                let mark = if outcome.success { "✅" } else { "❌" };
                println!("{} {} {}", mark, outcome.key, outcome.subject);
            }
            println!(
                "Done: {} succeeded, {} failed",
                report.summary.succeeded, report.summary.failed
            );

            if let Some(path) = &cli.report {
                report.write_file(path)?;
                println!("📁 Report saved to: {}", path);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Sync failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

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

    Ok(())
}
