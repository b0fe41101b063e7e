use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` overrides the default `info`
/// level; records of the `log` facade are forwarded as well.
pub fn init_logger() {
    let default_level = LevelFilter::INFO;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|err| {
        if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
            eprintln!(
                "invalid {}, falling back to level '{default_level}': {err}",
                EnvFilter::DEFAULT_ENV
            );
        }
        EnvFilter::new(default_level.to_string())
    });

    if let Err(err) = tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        eprintln!("cannot install the tracing subscriber: {err}");
    }
}
