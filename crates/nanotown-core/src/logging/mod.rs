use tracing_subscriber::{
    EnvFilter, filter::Directive, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Initialize logging.
///
/// Logs go to stderr as JSON. By default only error-level events are
/// emitted so an interactive session's terminal stays clean; `verbose`
/// raises the level to info.
pub fn init_logging(verbose: bool) {
    let level = if verbose { "info" } else { "error" };

    // The core library and the `nt` binary log under different targets.
    let filter = ["nanotown", "nt"]
        .iter()
        .filter_map(|target| format!("{target}={level}").parse::<Directive>().ok())
        .fold(EnvFilter::from_default_env(), |filter, directive| {
            filter.add_directive(directive)
        });

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false)
                .with_span_list(false),
        )
        .with(filter)
        .init();
}
