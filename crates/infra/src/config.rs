//! Process configuration from `DEALFLOW_*` environment variables.

use std::net::SocketAddr;

use rust_decimal::Decimal;
use thiserror::Error;

use dealflow_commission::{CommissionTerms, SplitType};
use dealflow_observability::LogFormat;

pub const BIND_ADDR: &str = "DEALFLOW_BIND_ADDR";
pub const LOG_FORMAT: &str = "DEALFLOW_LOG_FORMAT";
pub const COMMISSION_RATE: &str = "DEALFLOW_COMMISSION_RATE";
pub const MY_SPLIT_PERCENTAGE: &str = "DEALFLOW_MY_SPLIT_PERCENTAGE";
pub const AGENCY_SPLIT_PERCENTAGE: &str = "DEALFLOW_AGENCY_SPLIT_PERCENTAGE";
pub const ENFORCE_REQUIRED_DOCUMENTS: &str = "DEALFLOW_ENFORCE_REQUIRED_DOCUMENTS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, reason: impl ToString) -> Self {
        ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Settings the deal service needs on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DealSettings {
    /// Rates applied when an offer is accepted without explicit terms.
    pub default_commission: CommissionTerms,
    /// Refuse CPCV signing / escritura completion while required documents
    /// are still pending.
    pub enforce_required_documents: bool,
}

impl Default for DealSettings {
    fn default() -> Self {
        Self {
            default_commission: CommissionTerms {
                commission_rate: Decimal::from(5),
                split_type: SplitType::Full,
                my_split_percentage: Decimal::ONE_HUNDRED,
                agency_split_percentage: Decimal::from(55),
            },
            enforce_required_documents: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DealflowConfig {
    pub bind_addr: SocketAddr,
    pub log_format: LogFormat,
    pub deals: DealSettings,
}

impl Default for DealflowConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            log_format: LogFormat::Json,
            deals: DealSettings::default(),
        }
    }
}

impl DealflowConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unset or blank variables keep
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(raw) = get(BIND_ADDR) {
            config.bind_addr = raw
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid(BIND_ADDR, &raw, e))?;
        }
        if let Some(raw) = get(LOG_FORMAT) {
            config.log_format = raw.parse().map_err(|e| ConfigError::invalid(LOG_FORMAT, &raw, e))?;
        }

        let terms = &mut config.deals.default_commission;
        if let Some(raw) = get(COMMISSION_RATE) {
            terms.commission_rate = parse_percentage(COMMISSION_RATE, &raw)?;
        }
        if let Some(raw) = get(MY_SPLIT_PERCENTAGE) {
            terms.my_split_percentage = parse_percentage(MY_SPLIT_PERCENTAGE, &raw)?;
            if terms.my_split_percentage < Decimal::ONE_HUNDRED {
                terms.split_type = SplitType::Split;
            }
        }
        if let Some(raw) = get(AGENCY_SPLIT_PERCENTAGE) {
            terms.agency_split_percentage = parse_percentage(AGENCY_SPLIT_PERCENTAGE, &raw)?;
        }
        if let Some(raw) = get(ENFORCE_REQUIRED_DOCUMENTS) {
            config.deals.enforce_required_documents = parse_bool(ENFORCE_REQUIRED_DOCUMENTS, &raw)?;
        }

        Ok(config)
    }
}

fn parse_percentage(var: &'static str, raw: &str) -> Result<Decimal, ConfigError> {
    let value: Decimal = raw.trim().parse().map_err(|e| ConfigError::invalid(var, raw, e))?;
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(ConfigError::invalid(var, raw, "must be between 0 and 100"));
    }
    Ok(value)
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(var, raw, "expected true or false")),
    }
}
