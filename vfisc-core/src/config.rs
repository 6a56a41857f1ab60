//! Configuration for the MRA gateway client.
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Production token endpoint of the MRA e-invoicing gateway.
pub const DEFAULT_TOKEN_URL: &str =
    "https://vfisc.mra.mu/einvoice-token-service/token-api/generate-token";
/// Production transmit endpoint of the MRA e-invoicing gateway.
pub const DEFAULT_TRANSMIT_URL: &str = "https://vfisc.mra.mu/realtime/invoice/transmit";

/// Error returned when building a [`Config`] from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {name}")]
    MissingVar { name: &'static str },
}

/// Gateway account credentials. The password only ever leaves the process
/// inside the RSA-wrapped credential envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

/// Static seller block stamped into every mapped document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerProfile {
    pub name: String,
    pub trade_name: String,
    pub tan: String,
    pub brn: String,
    pub business_addr: String,
    pub business_phone_no: String,
    pub ebs_counter_no: String,
    pub cashier_id: String,
}

impl SellerProfile {
    fn from_env() -> Result<Self, ConfigError> {
        let name = require_var("SELLER_NAME")?;
        Ok(Self {
            trade_name: env::var("SELLER_TRADE_NAME").unwrap_or_else(|_| name.clone()),
            name,
            tan: require_var("SELLER_TAN")?,
            brn: require_var("SELLER_BRN")?,
            business_addr: env::var("SELLER_ADDR").unwrap_or_default(),
            business_phone_no: env::var("SELLER_PHONE").unwrap_or_default(),
            ebs_counter_no: env::var("EBS_COUNTER_NO").unwrap_or_default(),
            cashier_id: env::var("SELLER_CASHIER_ID").unwrap_or_else(|_| "SYSTEM".into()),
        })
    }
}

/// Configuration for mapping and the submission pipeline, constructed once
/// at startup and passed by reference.
///
/// # Examples
/// ```rust
/// use vfisc_core::config::{Config, Credentials, SellerProfile};
///
/// let seller = SellerProfile {
///     name: "Acme Ltd".into(),
///     trade_name: "Acme Ltd".into(),
///     tan: "27124193".into(),
///     brn: "C11106429".into(),
///     business_addr: "Port Louis".into(),
///     business_phone_no: "2302909090".into(),
///     ebs_counter_no: "".into(),
///     cashier_id: "SYSTEM".into(),
/// };
/// let config = Config::new(
///     Credentials::new("acme", "secret"),
///     "17532654219210ABCDEF",
///     "721",
///     seller,
///     "MRAPublicKey.pem",
/// );
/// # let _ = config;
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    credentials: Credentials,
    ebs_mra_id: String,
    area_code: String,
    seller: SellerProfile,
    public_key_path: PathBuf,
    token_url: String,
    transmit_url: String,
}

impl Config {
    pub fn new(
        credentials: Credentials,
        ebs_mra_id: impl Into<String>,
        area_code: impl Into<String>,
        seller: SellerProfile,
        public_key_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            credentials,
            ebs_mra_id: ebs_mra_id.into(),
            area_code: area_code.into(),
            seller,
            public_key_path: public_key_path.into(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            transmit_url: DEFAULT_TRANSMIT_URL.to_string(),
        }
    }

    /// Build a configuration from `MRA_*` / `SELLER_*` environment
    /// variables. Missing credentials or seller identifiers are fatal;
    /// endpoint URLs fall back to the production gateway.
    ///
    /// # Errors
    /// Returns [`ConfigError::MissingVar`] for any required variable that
    /// is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let credentials = Credentials::new(
            require_var("MRA_USERNAME")?,
            require_var("MRA_PASSWORD")?,
        );
        let mut config = Config::new(
            credentials,
            env::var("EBS_MRA_ID").unwrap_or_default(),
            env::var("AREA_CODE").unwrap_or_default(),
            SellerProfile::from_env()?,
            env::var("MRA_PUBLIC_KEY_PATH").unwrap_or_else(|_| "MRAPublicKey.pem".into()),
        );
        if let Ok(url) = env::var("MRA_TOKEN_URL") {
            config.token_url = url;
        }
        if let Ok(url) = env::var("MRA_TRANSMIT_URL") {
            config.transmit_url = url;
        }
        Ok(config)
    }

    /// Override the token endpoint (sandbox or mock gateways).
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Override the transmit endpoint (sandbox or mock gateways).
    pub fn with_transmit_url(mut self, url: impl Into<String>) -> Self {
        self.transmit_url = url.into();
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn ebs_mra_id(&self) -> &str {
        &self.ebs_mra_id
    }

    pub fn area_code(&self) -> &str {
        &self.area_code
    }

    pub fn seller(&self) -> &SellerProfile {
        &self.seller
    }

    pub fn public_key_path(&self) -> &Path {
        &self.public_key_path
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    pub fn transmit_url(&self) -> &str {
        &self.transmit_url
    }
}

fn require_var(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar { name }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_seller() -> SellerProfile {
        SellerProfile {
            name: "Acme Ltd".into(),
            trade_name: "Acme Ltd".into(),
            tan: "27124193".into(),
            brn: "C11106429".into(),
            business_addr: "Port Louis".into(),
            business_phone_no: "2302909090".into(),
            ebs_counter_no: "".into(),
            cashier_id: "SYSTEM".into(),
        }
    }

    #[test]
    fn defaults_point_at_production_gateway() {
        let config = Config::new(
            Credentials::new("acme", "secret"),
            "EBSID",
            "721",
            test_seller(),
            "MRAPublicKey.pem",
        );
        assert_eq!(config.token_url(), DEFAULT_TOKEN_URL);
        assert_eq!(config.transmit_url(), DEFAULT_TRANSMIT_URL);
    }

    #[test]
    fn endpoint_overrides_apply() {
        let config = Config::new(
            Credentials::new("acme", "secret"),
            "EBSID",
            "721",
            test_seller(),
            "MRAPublicKey.pem",
        )
        .with_token_url("http://localhost:1/token")
        .with_transmit_url("http://localhost:1/transmit");
        assert_eq!(config.token_url(), "http://localhost:1/token");
        assert_eq!(config.transmit_url(), "http://localhost:1/transmit");
    }
}
