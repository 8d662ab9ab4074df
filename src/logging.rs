// Console logging setup. Modules only emit `tracing` events; the binary
// installs the subscriber once at startup.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Map the `-v` count to a filter directive.
pub fn verbosity_to_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",  // default: one line per completed selection
        1 => "debug", // -v: every step with its paths and sizes
        _ => "trace", // -vv+: remover stdout, encoder details
    }
}

/// Install a compact stderr subscriber. `RUST_LOG` wins over `verbosity`.
pub fn init(verbosity: u8) -> anyhow::Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.is_empty() => EnvFilter::try_new(directives)?,
        _ => EnvFilter::try_new(verbosity_to_filter(verbosity))?,
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_level(true)
        .compact();

    Registry::default().with(filter).with(fmt_layer).try_init()?;
    Ok(())
}
