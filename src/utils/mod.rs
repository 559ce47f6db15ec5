pub mod logs;
pub mod reddit;

pub use logs::*;

use tracing::subscriber::set_global_default;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the compact stderr subscriber used by both binaries.
pub fn init_tracing(debug: bool) -> anyhow::Result<()> {
    let level = if debug { "debug" } else { "info" };
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(format!("chatguard={level}").parse()?))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        );
    set_global_default(subscriber)?;
    Ok(())
}
