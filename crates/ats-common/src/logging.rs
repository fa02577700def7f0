use std::panic;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Initialize the tracing subscriber for a binary.
///
/// `RUST_LOG` controls filtering (default `info`). When `ATS_LOG_DIR` is set,
/// output goes to `<dir>/<app>.log` with daily rotation; otherwise stdout.
pub fn init(app_name: &'static str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match file_writer(app_name) {
        Some(writer) => {
            let _ = builder.with_writer(writer).try_init();
        }
        None => {
            let _ = builder.try_init();
        }
    }
}

fn file_writer(app_name: &'static str) -> Option<BoxMakeWriter> {
    let dir = std::path::PathBuf::from(std::env::var_os("ATS_LOG_DIR")?);
    if let Err(err) = std::fs::create_dir_all(&dir) {
        // Subscriber is not up yet, so this cannot go through tracing.
        eprintln!("failed to create ATS_LOG_DIR ({err}); logging to stdout");
        return None;
    }

    let appender = tracing_appender::rolling::daily(dir, format!("{app_name}.log"));
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let _ = FILE_GUARD.set(guard);
    Some(BoxMakeWriter::new(non_blocking))
}

/// Route panics through `tracing` so crashes land in the same sink as logs.
/// Installed once per process; repeat calls are no-ops. Set
/// `ATS_LOG_INCLUDE_BACKTRACE=1` to chain into the default hook as well.
pub fn install_panic_hook(app_name: &'static str) {
    static INSTALLED: OnceLock<()> = OnceLock::new();

    INSTALLED.get_or_init(|| {
        let previous = panic::take_hook();
        let chain_default = std::env::var("ATS_LOG_INCLUDE_BACKTRACE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        panic::set_hook(Box::new(move |info| {
            let location = info
                .location()
                .map(|l| format!("{}:{}", l.file(), l.line()));
            let message = info
                .payload()
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| info.payload().downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".into());

            tracing::error!(
                application = app_name,
                location = location.as_deref().unwrap_or("unknown"),
                panic_message = %message,
                "panic captured"
            );

            if chain_default {
                previous(info);
            }
        }));
    });
}
