//! Diagnostic logging
//!
//! Everything goes to stderr so stdout stays clean for replies. The filter
//! comes from `PALAVER_LOG` using the usual `EnvFilter` directive syntax.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "PALAVER_LOG";
const DEFAULT_DIRECTIVE: &str = "warn";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install the global subscriber. Calling this twice is harmless.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::TestEnvVarGuard;

    #[test]
    fn defaults_to_warn() {
        let mut env = TestEnvVarGuard::new();
        env.remove_var(LOG_ENV_VAR);
        assert_eq!(env_filter().to_string(), "warn");
    }

    #[test]
    fn reads_directive_from_environment() {
        let mut env = TestEnvVarGuard::new();
        env.set_var(LOG_ENV_VAR, "palaver=debug");
        assert_eq!(env_filter().to_string(), "palaver=debug");
    }

    #[test]
    fn init_twice_is_harmless() {
        init();
        init();
    }
}
