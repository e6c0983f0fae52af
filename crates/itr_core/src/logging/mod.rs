use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "ITR_LOG";
pub const DEFAULT_DIRECTIVE: &str = "itr_core=info,itr_client=info";

/// Filter from `ITR_LOG`, then `RUST_LOG`, then [`DEFAULT_DIRECTIVE`].
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install a stderr fmt subscriber. Returns `false` when a global subscriber already exists,
/// so hosts and tests may call this more than once.
pub fn init_tracing() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        let _ = init_tracing();
        assert!(!init_tracing());
    }
}
