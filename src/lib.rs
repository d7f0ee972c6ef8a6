pub mod cache;
pub mod config;
pub mod pipeline;
pub mod rate_limit;
pub mod recognizer;
pub mod scanner;
pub mod session;

pub use cache::DetectionCache;
pub use config::{RateLimitConfig, ScanConfig};
pub use pipeline::Pipeline;
pub use rate_limit::{RateLimitStatus, RateLimiter};
pub use recognizer::Recognizer;
pub use scanner::Scanner;
pub use session::{ScanOutcome, ScanSession};

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter. Does nothing if a subscriber is already installed.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "mtg_scanner=debug,mtg_capture=debug,mtg_vision=debug,mtg_data=info".into()
            }),
        )
        .try_init();
}
