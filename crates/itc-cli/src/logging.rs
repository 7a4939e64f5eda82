use tracing_subscriber::filter::LevelFilter;

/// Installs the global stderr logger.
///
/// Verbosity ladder: warnings by default, `-v` info, `-vv` debug, `-vvv`
/// everything.
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
