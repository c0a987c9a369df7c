use std::process;
use std::sync::Arc;

use helm::cli::{build_router, output};
use helm::config::GlobalFlags;
use helm::infrastructure::di::ServiceContainer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

fn main() {
    let argv: Vec<String> = std::env::args().collect();
    // Logging and plugin discovery need --debug/--home before the tree exists
    let flags = GlobalFlags::prescan(argv.iter().skip(1));
    setup_logging(flags.debug);

    let router = build_router(&flags, Arc::new(ServiceContainer::new()));
    if let Err(e) = router.dispatch(argv) {
        output::error(&e);
        process::exit(e.exit_code());
    }
}

fn setup_logging(debug: bool) {
    let level = if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };

    // RUST_LOG wins; otherwise our level with noisy dependencies held at WARN
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::builder()
            .with_default_directive(level.into())
            .parse_lossy("rustls=warn")
    });

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(debug)
        .with_thread_names(false)
        .with_span_events(FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .init();

    tracing::debug!("Debug mode: {}", level);
}

#[cfg(test)]
mod tests {
    use super::*;
    use helm::cli::commands::root_command;
    use helm::cli::CommandRouter;
    use helm::util::testing;

    #[test]
    fn verify_cli() {
        testing::init_test_setup();
        let router = CommandRouter::new(root_command(), Arc::new(ServiceContainer::new()));
        router.command().debug_assert();
    }
}
