use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

/// Handle to raise log verbosity once configuration is known.
pub struct LogLevel {
    handle: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

/// Install JSON logging at `info`, or whatever `RUST_LOG` asks for.
pub fn init() -> LogLevel {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let (filter, from_env) = initial_filter(directives.as_deref());
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json())
        .init();

    LogLevel { handle, from_env }
}

/// `RUST_LOG` directives win only when they parse; otherwise fall back to `info`.
fn initial_filter(directives: Option<&str>) -> (EnvFilter, bool) {
    match directives.map(EnvFilter::try_new) {
        Some(Ok(filter)) => (filter, true),
        _ => (EnvFilter::new("info"), false),
    }
}

impl LogLevel {
    /// Switch to `debug`, unless `RUST_LOG` already chose a filter.
    pub fn enable_debug(&self) {
        if self.from_env {
            return;
        }
        match self.handle.reload(EnvFilter::new("debug")) {
            Ok(()) => tracing::debug!("Debug logging enabled"),
            Err(e) => tracing::warn!(error = %e, "Failed to enable debug logging"),
        }
    }
}
