//! 日志系统配置模块
//! 支持结构化日志和日志级别配置

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::LoggingConfig;

/// 初始化日志系统
///
/// `RUST_LOG` 优先于配置中的级别。重复初始化返回错误而不是 panic。
pub fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if config.format == "json" {
        Registry::default()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()?;
    } else {
        Registry::default()
            .with(filter)
            .with(fmt::layer().with_ansi(true))
            .try_init()?;
    }

    Ok(())
}

/// 简化初始化（使用默认配置）
pub fn init_default_logging() {
    let config = LoggingConfig::default();
    if let Err(e) = init_logging(&config) {
        eprintln!("Failed to initialize logging: {}", e);
    }
}
