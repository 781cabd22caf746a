use tracing_subscriber::EnvFilter;

/// Log to stderr so `--stdout` output stays a clean document.
///
/// `RUST_LOG` wins when set; otherwise `-v` picks the level.
pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
