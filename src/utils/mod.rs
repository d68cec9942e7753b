pub mod build_info;
pub mod money;
pub mod persistence;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initializes the global tracing subscriber with sensible defaults.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{filter::Directive, fmt, EnvFilter};

        let directive: Directive = match "cashflow_engine=info".parse() {
            Ok(directive) => directive,
            Err(_) => return,
        };
        let filter = EnvFilter::from_default_env().add_directive(directive);

        fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    });
}
