use std::env;

/// Signing configuration for session tokens.
///
/// Constructed once at startup and cloned into [`crate::state::AppState`];
/// read-only afterwards, so it is safely shared across concurrent
/// encode/decode calls.
#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    /// Access token lifetime in seconds. Always positive.
    pub access_token_expiry: i64,
    /// Refresh token lifetime in seconds. Always positive.
    pub refresh_token_expiry: i64,
}

impl JwtConfig {
    pub fn from_env() -> Self {
        Self {
            secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "your-secret-key-change-in-production".to_string()),
            access_token_expiry: read_positive("JWT_ACCESS_EXPIRY", 3600), // 1 hour
            refresh_token_expiry: read_positive("JWT_REFRESH_EXPIRY", 604800), // 7 days
        }
    }
}

fn read_positive(var: &str, default: i64) -> i64 {
    env::var(var)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_ttl_falls_back_to_default() {
        // SAFETY: tests in this module are the only writers of this variable.
        unsafe { env::set_var("LEKTORA_TEST_TTL", "0") };
        assert_eq!(read_positive("LEKTORA_TEST_TTL", 3600), 3600);
        unsafe { env::set_var("LEKTORA_TEST_TTL", "-5") };
        assert_eq!(read_positive("LEKTORA_TEST_TTL", 3600), 3600);
        unsafe { env::set_var("LEKTORA_TEST_TTL", "120") };
        assert_eq!(read_positive("LEKTORA_TEST_TTL", 3600), 120);
        unsafe { env::remove_var("LEKTORA_TEST_TTL") };
    }
}
