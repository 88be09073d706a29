use thiserror::Error;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            enable_file_logs: false,
            log_dir: "./logs".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create rolling file appender: {0}")]
    Appender(#[from] tracing_appender::rolling::InitError),
    #[error("failed to initialize tracing: {0}")]
    Init(String),
}

/// Installs the global subscriber. A subscriber that is already set is not an error.
pub fn init_tracing(config: &LogConfig) -> Result<(), LoggingError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    // stdout 用于 JSON 结果输出，日志统一写 stderr
    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    let registry = Registry::default().with(env_filter).with(stderr_layer);

    let result = if config.enable_file_logs {
        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("brick-srs")
            .filename_suffix("log")
            .max_log_files(30)
            .build(&config.log_dir)?;
        let file_layer = fmt::layer()
            .with_writer(file_appender)
            .with_ansi(false)
            .json();
        registry.with(file_layer).try_init()
    } else {
        registry.try_init()
    };

    // 测试环境中全局 subscriber 可能已被设置，属于正常情况
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.to_string().contains("already been set") => Ok(()),
        Err(e) => Err(LoggingError::Init(e.to_string())),
    }
}
