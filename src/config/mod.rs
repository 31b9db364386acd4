use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub stripe: StripeConfig,
    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public site origin; checkout redirects are built from it.
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Key for hashing session tokens at rest.
    pub session_secret: String,
    pub session_duration_hours: i64,
    #[serde(default)]
    pub secure_cookies: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StripeConfig {
    pub secret_key: Option<String>,
    pub webhook_secret: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_currency")]
    pub currency: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingConfig {
    #[serde(default = "default_max_bookings")]
    pub max_bookings_per_route_day: i64,
    /// How long an unpaid checkout keeps its seat.
    #[serde(default = "default_hold_minutes")]
    pub hold_minutes: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MediaConfig {
    #[serde(default)]
    pub enabled: bool,
    pub cloud_name: Option<String>,
    #[serde(default = "default_upload_preset")]
    pub upload_preset: String,
}

/// Placeholder key; startup warns while it is still in use.
pub const DEFAULT_SESSION_SECRET: &str = "change-me-in-production";

fn default_currency() -> String {
    "usd".to_string()
}

fn default_max_bookings() -> i64 {
    30
}

fn default_hold_minutes() -> i64 {
    60
}

fn default_upload_preset() -> String {
    "mice_cards".to_string()
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            webhook_secret: None,
            enabled: false,
            currency: default_currency(),
        }
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            max_bookings_per_route_day: default_max_bookings(),
            hold_minutes: default_hold_minutes(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cloud_name: None,
            upload_preset: default_upload_preset(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.base_url", "http://localhost:8080")?
            .set_default("database.url", "sqlite://acetour.db?mode=rwc")?
            .set_default("database.max_connections", 10)?
            .set_default("auth.session_secret", DEFAULT_SESSION_SECRET)?
            .set_default("auth.session_duration_hours", 24)?
            .set_default("stripe.enabled", false)?

            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))

            // Add environment variables (with ACETOUR__ prefix, double underscore separates levels)
            .add_source(Environment::with_prefix("ACETOUR").separator("__"))

            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.booking.validate()?;
        Ok(settings)
    }
}

/// Stripe only accepts checkout sessions expiring 30 minutes to 24 hours out.
pub const MIN_HOLD_MINUTES: i64 = 30;
pub const MAX_HOLD_MINUTES: i64 = 24 * 60;

impl BookingConfig {
    /// Rejects hold lengths Stripe cannot give a checkout session.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_HOLD_MINUTES..=MAX_HOLD_MINUTES).contains(&self.hold_minutes) {
            return Err(ConfigError::Message(format!(
                "booking.hold_minutes must be between {} and {}, got {}",
                MIN_HOLD_MINUTES, MAX_HOLD_MINUTES, self.hold_minutes
            )));
        }
        if self.max_bookings_per_route_day < 1 {
            return Err(ConfigError::Message(
                "booking.max_bookings_per_route_day must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                base_url: "http://localhost:8080".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite://acetour.db?mode=rwc".to_string(),
                max_connections: 10,
            },
            auth: AuthConfig {
                session_secret: DEFAULT_SESSION_SECRET.to_string(),
                session_duration_hours: 24,
                secure_cookies: false,
            },
            stripe: StripeConfig::default(),
            booking: BookingConfig::default(),
            media: MediaConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hold_minutes_must_cover_a_checkout_session() {
        assert!(BookingConfig::default().validate().is_ok());

        let short = BookingConfig { hold_minutes: 15, ..BookingConfig::default() };
        assert!(short.validate().is_err());

        let long = BookingConfig { hold_minutes: MAX_HOLD_MINUTES + 1, ..BookingConfig::default() };
        assert!(long.validate().is_err());

        let edge = BookingConfig { hold_minutes: MIN_HOLD_MINUTES, ..BookingConfig::default() };
        assert!(edge.validate().is_ok());
    }
}
