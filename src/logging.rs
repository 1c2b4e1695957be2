//! Console logging through `tracing`.
//!
//! `RUST_LOG` wins when set; otherwise `verbose` picks between info and debug
//! for this crate.

use tracing_subscriber::{fmt, EnvFilter};

pub fn init_logging(verbose: bool) {
    let default_directive = if verbose {
        "ytdl_player_lib=debug,ytdl_player=debug,ytdl_parser=debug,ytdl_resolver=debug,ytdl_tools=debug,ytdl_session=debug"
    } else {
        "warn,ytdl_parser=info,ytdl_tools=info"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    // Ignore the error when a subscriber is already installed (tests, embedding apps)
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .try_init();
}
