use chrono::Local;
use fern::Dispatch;
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;
use std::fs;

const LOG_DIR: &str = "logs";
const LOG_FILE: &str = "orchestrator.log";

/// Target used for structured placement and relocation events.
pub const ANALYTICS_TARGET: &str = "analytics";

/// Initializes the global logger.
///
/// Call once at the start of `main`. The library itself never installs a logger.
///
/// Log level is read from `RUST_LOG` (e.g. `RUST_LOG=debug`), defaulting to `info`.
/// Output goes to stderr (colored) and to `logs/orchestrator.log`. `tracing` events are
/// forwarded through the `log` facade and end up in the same sinks.
pub fn init() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let log_level_filter = log_level.parse::<LevelFilter>().unwrap_or(LevelFilter::Info);

    let base_config = Dispatch::new()
        .level(log_level_filter)
        .level_for("tokio", LevelFilter::Warn)
        .level_for("tokio_util", LevelFilter::Warn)
        .level_for("serde", LevelFilter::Warn);

    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::BrightBlack);

    let console_config = Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .chain(std::io::stderr());

    let mut dispatch = base_config.chain(console_config);

    let log_file_path = format!("{}/{}", LOG_DIR, LOG_FILE);
    let file_sink = fs::create_dir_all(LOG_DIR).and_then(|_| fern::log_file(&log_file_path));

    match file_sink {
        Ok(file) => {
            let file_config = Dispatch::new()
                .format(|out, message, record| {
                    out.finish(format_args!("[{} {} {}] {}", Local::now().format("%Y-%m-%d %H:%M:%S"), record.level(), record.target(), message))
                })
                .chain(file);
            dispatch = dispatch.chain(file_config);
        }
        Err(e) => eprintln!("Failed to open log file '{}': {}. Logging to console only.", log_file_path, e),
    }

    if let Err(e) = dispatch.apply() {
        eprintln!("Failed to apply logger configuration: {}", e);
        return;
    }

    log::info!("Logger initialized. Logging to console and '{}'.", log_file_path);
}
