use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::models::EnvironmentKind;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct AfipConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: EnvironmentKind,
    pub gateway: GatewayConfig,
    pub issuer: IssuerConfig,
    pub credentials: CredentialsConfig,
    /// Where the batch binary writes the Prometheus text exposition.
    pub metrics_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub production_url: String,
    pub homologation_url: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssuerConfig {
    /// CUIT of the issuing company, digits only.
    pub cuit: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsConfig {
    pub certificate_path: Option<PathBuf>,
    pub private_key_path: Option<PathBuf>,
    /// Access ticket obtained from the authentication service.
    pub token: Secret<String>,
    pub sign: Secret<String>,
}

impl AfipConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let environment = EnvironmentKind::from_string(&get_env(
            "AFIP_ENVIRONMENT",
            Some("homologation"),
            is_prod,
        )?);

        Ok(AfipConfig {
            common: common_config,
            environment,
            gateway: GatewayConfig {
                production_url: get_env(
                    "AFIP_PRODUCTION_URL",
                    Some("https://afip-gateway.internal/prod"),
                    is_prod,
                )?,
                homologation_url: get_env(
                    "AFIP_HOMOLOGATION_URL",
                    Some("https://afip-gateway.internal/homo"),
                    is_prod,
                )?,
                request_timeout_secs: get_env(
                    "AFIP_REQUEST_TIMEOUT_SECS",
                    Some(&DEFAULT_REQUEST_TIMEOUT_SECS.to_string()),
                    is_prod,
                )?
                .parse()
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
                connect_timeout_secs: get_env(
                    "AFIP_CONNECT_TIMEOUT_SECS",
                    Some(&DEFAULT_CONNECT_TIMEOUT_SECS.to_string()),
                    is_prod,
                )?
                .parse()
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
            },
            issuer: IssuerConfig {
                cuit: get_env("AFIP_ISSUER_CUIT", None, is_prod)?.replace(['-', '.'], ""),
            },
            credentials: CredentialsConfig {
                certificate_path: get_optional_env("AFIP_CERTIFICATE_PATH").map(PathBuf::from),
                private_key_path: get_optional_env("AFIP_PRIVATE_KEY_PATH").map(PathBuf::from),
                token: Secret::new(get_env("AFIP_ACCESS_TOKEN", Some(""), is_prod)?),
                sign: Secret::new(get_env("AFIP_ACCESS_SIGN", Some(""), is_prod)?),
            },
            metrics_path: get_optional_env("AFIP_METRICS_PATH").map(PathBuf::from),
        })
    }

    /// Gateway base URL for the configured environment.
    pub fn base_url(&self) -> &str {
        match self.environment {
            EnvironmentKind::Production => &self.gateway.production_url,
            EnvironmentKind::Homologation => &self.gateway.homologation_url,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway.connect_timeout_secs)
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn get_optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
