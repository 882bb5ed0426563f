use std::io;
use std::path::Path;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_FILTER: &str = "drive_image_bot=info,tower_http=info,sea_orm=warn,sqlx=warn";

/// Initialize tracing to stdout and to `log_file`. The filter comes from RUST_LOG
/// when set.
pub fn init_tracing(log_file: &str) -> io::Result<()> {
    let path = Path::new(log_file);
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    std::fs::create_dir_all(&dir)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "bot.log".into());
    let file_appender = rolling::never(&dir, file_name);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .map_err(|e| io::Error::other(e.to_string()))?;

    tracing::debug!(
        path = %dir.join(path.file_name().unwrap_or_default()).display(),
        "Tracing initialized with stdout and file output"
    );

    Ok(())
}
