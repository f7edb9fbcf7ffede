use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const DEFAULT_WATCHLIST: &[&str] = &["TCS", "INFY", "RELIANCE", "HDFCBANK", "SBIN"];

pub const DEFAULT_SECURITY_IDS: &[(&str, &str)] = &[
    ("RELIANCE", "500325"),
    ("HDFCBANK", "1333"),
    ("INFY", "500209"),
    ("SBIN", "3045"),
    ("TCS", "11536"),
];

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Missing API keys: {}", .0.join(", "))]
    MissingKeys(Vec<String>),
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

impl ConfigError {
    fn invalid(name: &str, reason: impl fmt::Display) -> Self {
        Self::InvalidValue {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    #[default]
    Simulated,
    Live,
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simulated" | "paper" => Ok(Self::Simulated),
            "live" => Ok(Self::Live),
            other => Err(format!("expected 'simulated' or 'live', got {:?}", other)),
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simulated => write!(f, "simulated"),
            Self::Live => write!(f, "live"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrokerCredentials {
    pub client_id: String,
    pub access_token: String,
}

/// Thresholds applied before a decision is auto-executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskLimits {
    pub min_confidence: u8,
    pub max_risk_score: u8,
    pub max_daily_trades: usize,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            min_confidence: 7,
            max_risk_score: 5,
            max_daily_trades: 5,
        }
    }
}

/// Process configuration, read once at startup.
///
/// Credentials are optional here so that commands which do not need a
/// collaborator (ingestion, performance) can still run; `require_broker` and
/// `require_inference` gate the ones that do.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub broker_client_id: Option<String>,
    pub broker_access_token: Option<String>,
    pub inference_api_key: Option<String>,

    pub database_url: String,
    pub market_data_url: Url,
    pub broker_base_url: Url,
    pub inference_base_url: Url,
    pub inference_model: String,
    pub inference_json_mode: bool,

    pub exchange: String,
    pub watchlist: Vec<String>,
    pub security_ids: BTreeMap<String, String>,

    pub execution_mode: ExecutionMode,
    pub auto_execute: bool,
    pub risk_limits: RiskLimits,

    pub http_timeout: Duration,
    pub inference_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let watchlist = match get("WATCHLIST") {
            Some(raw) => parse_watchlist(&raw),
            None => DEFAULT_WATCHLIST.iter().map(|s| s.to_string()).collect(),
        };
        if watchlist.is_empty() {
            return Err(ConfigError::invalid("WATCHLIST", "no symbols configured"));
        }

        let security_ids = match get("SECURITY_IDS") {
            Some(raw) => parse_security_ids(&raw)?,
            None => DEFAULT_SECURITY_IDS
                .iter()
                .map(|(s, id)| (s.to_string(), id.to_string()))
                .collect(),
        };

        let execution_mode = match get("EXECUTION_MODE") {
            Some(raw) => raw
                .parse()
                .map_err(|e| ConfigError::invalid("EXECUTION_MODE", e))?,
            None => ExecutionMode::default(),
        };

        let defaults = RiskLimits::default();
        let risk_limits = RiskLimits {
            min_confidence: parse_score(&get, "MIN_CONFIDENCE", defaults.min_confidence)?,
            max_risk_score: parse_score(&get, "MAX_RISK_SCORE", defaults.max_risk_score)?,
            max_daily_trades: parse_or(&get, "MAX_DAILY_TRADES", defaults.max_daily_trades)?,
        };

        Ok(Self {
            broker_client_id: get("DHAN_CLIENT_ID"),
            broker_access_token: get("DHAN_ACCESS_TOKEN"),
            inference_api_key: get("INFERENCE_API_KEY"),
            database_url: get("DATABASE_URL")
                .unwrap_or_else(|| "sqlite:data/trading_data.db".to_string()),
            market_data_url: parse_url(&get, "MARKET_DATA_URL", "http://localhost:8000")?,
            broker_base_url: parse_url(&get, "BROKER_BASE_URL", "https://api.dhan.co")?,
            inference_base_url: parse_url(
                &get,
                "INFERENCE_BASE_URL",
                "https://cloud.olakrutrim.com/v1",
            )?,
            inference_model: get("INFERENCE_MODEL").unwrap_or_else(|| "DeepSeek-R1".to_string()),
            inference_json_mode: parse_bool(&get, "INFERENCE_JSON_MODE", false),
            exchange: get("EXCHANGE").unwrap_or_else(|| "NSE".to_string()),
            watchlist,
            security_ids,
            execution_mode,
            auto_execute: parse_bool(&get, "AUTO_EXECUTE", false),
            risk_limits,
            http_timeout: Duration::from_secs(parse_or(&get, "HTTP_TIMEOUT_SECS", 30)?),
            inference_timeout: Duration::from_secs(parse_or(&get, "INFERENCE_TIMEOUT_SECS", 120)?),
        })
    }

    /// Names of every credential that is not configured.
    pub fn missing_credentials(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.broker_client_id.is_none() {
            missing.push("DHAN_CLIENT_ID (Dhan Client ID)".to_string());
        }
        if self.broker_access_token.is_none() {
            missing.push("DHAN_ACCESS_TOKEN (Dhan Access Token)".to_string());
        }
        if self.inference_api_key.is_none() {
            missing.push("INFERENCE_API_KEY (Inference API Key)".to_string());
        }
        missing
    }

    pub fn require_broker(&self) -> Result<BrokerCredentials, ConfigError> {
        match (&self.broker_client_id, &self.broker_access_token) {
            (Some(client_id), Some(access_token)) => Ok(BrokerCredentials {
                client_id: client_id.clone(),
                access_token: access_token.clone(),
            }),
            _ => Err(ConfigError::MissingKeys(
                self.missing_credentials()
                    .into_iter()
                    .filter(|k| k.starts_with("DHAN_"))
                    .collect(),
            )),
        }
    }

    pub fn require_inference(&self) -> Result<String, ConfigError> {
        self.inference_api_key.clone().ok_or_else(|| {
            ConfigError::MissingKeys(vec!["INFERENCE_API_KEY (Inference API Key)".to_string()])
        })
    }
}

fn parse_watchlist(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_security_ids(raw: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut ids = BTreeMap::new();
    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((symbol, id)) = pair.split_once('=') else {
            return Err(ConfigError::invalid(
                "SECURITY_IDS",
                format!("expected SYMBOL=ID, got {:?}", pair),
            ));
        };
        let (symbol, id) = (symbol.trim(), id.trim());
        if symbol.is_empty() || id.is_empty() {
            return Err(ConfigError::invalid(
                "SECURITY_IDS",
                format!("empty symbol or id in {:?}", pair),
            ));
        }
        ids.insert(symbol.to_uppercase(), id.to_string());
    }
    Ok(ids)
}

fn parse_or<T, G>(get: &G, name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(raw) => raw.parse().map_err(|e| ConfigError::invalid(name, e)),
        None => Ok(default),
    }
}

fn parse_score<G>(get: &G, name: &str, default: u8) -> Result<u8, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let score = parse_or(get, name, default)?;
    if !(1..=10).contains(&score) {
        return Err(ConfigError::invalid(name, format!("{} is outside 1..=10", score)));
    }
    Ok(score)
}

fn parse_bool<G>(get: &G, name: &str, default: bool) -> bool
where
    G: Fn(&str) -> Option<String>,
{
    get(name)
        .map(|s| matches!(s.to_lowercase().as_str(), "1" | "true" | "yes" | "y" | "on"))
        .unwrap_or(default)
}

fn parse_url<G>(get: &G, name: &str, default: &str) -> Result<Url, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let raw = get(name).unwrap_or_else(|| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::invalid(name, e))
}
