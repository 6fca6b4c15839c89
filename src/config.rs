use crate::{
    models::PaymentOptions,
    services::{
        amount::parse_amount_to_wei,
        platform::{platform_url_with, APP_ID_ENV, DEFAULT_PLATFORM_TIMEOUT},
        registry::NATIVE_SYMBOL,
        rpc::DEFAULT_RPC_TIMEOUT,
    },
};
use anyhow::{bail, Context, Result};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Testnet,
    Production,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub host: String,
    pub port: u16,

    // Platform
    pub app_id: Option<String>,
    pub platform_url: String,
    pub platform_timeout: Duration,

    // Payment requirements for the demo route
    pub price: String,
    pub token: String,
    pub network: Option<String>,
    pub testnet: bool,

    // Chain access
    pub rpc_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let environment = Self::parse_environment()?;
        let testnet = match std::env::var("X402_TESTNET") {
            Ok(raw) => Self::parse_bool(&raw).context("Invalid X402_TESTNET")?,
            Err(_) => environment == Environment::Testnet,
        };

        let config = Self {
            environment,
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid PORT")?,

            app_id: std::env::var(APP_ID_ENV).ok().filter(|id| !id.trim().is_empty()),
            platform_url: platform_url_with(|name| std::env::var(name).ok()),
            platform_timeout: Self::parse_secs(
                "X402_PLATFORM_TIMEOUT_SECS",
                DEFAULT_PLATFORM_TIMEOUT,
            )?,

            price: std::env::var("X402_PRICE").unwrap_or_else(|_| "0.01".to_string()),
            token: std::env::var("X402_TOKEN").unwrap_or_else(|_| NATIVE_SYMBOL.to_string()),
            network: std::env::var("X402_NETWORK").ok().filter(|n| !n.trim().is_empty()),
            testnet,

            rpc_timeout: Self::parse_secs("X402_RPC_TIMEOUT_SECS", DEFAULT_RPC_TIMEOUT)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn parse_environment() -> Result<Environment> {
        let env = std::env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string());

        match env.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testnet" | "test" => Ok(Environment::Testnet),
            "production" | "prod" => Ok(Environment::Production),
            _ => bail!("Unknown environment: {}", env),
        }
    }

    fn parse_secs(name: &str, default: Duration) -> Result<Duration> {
        match std::env::var(name) {
            Ok(raw) => Ok(Duration::from_secs(
                raw.trim().parse().with_context(|| format!("Invalid {}", name))?,
            )),
            Err(_) => Ok(default),
        }
    }

    fn parse_bool(raw: &str) -> Result<bool> {
        match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            other => bail!("expected a boolean, got {:?}", other),
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.platform_url.starts_with("http") {
            bail!("X402_PLATFORM_URL must be HTTP(S) URL");
        }
        parse_amount_to_wei(&self.price, 18)
            .with_context(|| format!("X402_PRICE must be a decimal amount, got {}", self.price))?;
        if self.rpc_timeout.is_zero() {
            bail!("X402_RPC_TIMEOUT_SECS must be positive");
        }
        if self.platform_timeout.is_zero() {
            bail!("X402_PLATFORM_TIMEOUT_SECS must be positive");
        }
        if self.app_id.is_none() {
            tracing::warn!("{} is not set; paid routes will fail until it is", APP_ID_ENV);
        }

        tracing::info!(
            "Configuration validated for {:?} environment",
            self.environment
        );

        Ok(())
    }

    /// Requirements for the demo route.
    pub fn payment_options(&self) -> PaymentOptions {
        let mut options = PaymentOptions::new(self.price.clone(), self.token.clone())
            .with_testnet(self.testnet);
        options.network = self.network.clone();
        options
    }
}
