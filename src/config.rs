//! Server configuration from environment variables.
//!
//! HOST (default 0.0.0.0), PORT (8080), DEFAULT_MATCH_MINUTES (40),
//! DEFAULT_BREAK_MINUTES (10).

use crate::models::TournamentSettings;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Timings given to tournaments created without explicit settings.
    pub settings: TournamentSettings,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            settings: TournamentSettings::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparsable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = TournamentSettings::default();
        let number = |key: &str, fallback: u32| {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(fallback)
        };
        Self {
            host: lookup("HOST").unwrap_or_else(default_host),
            port: lookup("PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or_else(default_port),
            settings: TournamentSettings {
                match_duration: number("DEFAULT_MATCH_MINUTES", defaults.match_duration),
                break_duration: number("DEFAULT_BREAK_MINUTES", defaults.break_duration),
            },
        }
    }
}
