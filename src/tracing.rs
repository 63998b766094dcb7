use anyhow::Result;
use tracing_subscriber::{Layer, layer::SubscriberExt};

pub fn get_env_filter() -> tracing_subscriber::EnvFilter {
    // RUST_LOG used to control logging level.
    tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::default()
            .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
    })
}

/// Logs go to stderr so `download` can stream object bytes on stdout.
pub fn get_log_layer<S>(json_logs: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    S: tracing::Subscriber,
{
    if json_logs {
        return Box::new(
            tracing_subscriber::fmt::layer()
                .json()
                .flatten_event(true)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        );
    }

    Box::new(
        tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stderr),
    )
}

pub fn setup_tracing(json_logs: bool) -> Result<()> {
    let env_filter = get_env_filter();
    let log_layer = get_log_layer(json_logs).with_filter(env_filter);

    let subscriber = tracing_subscriber::Registry::default().with(log_layer);

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
