//! Indexer settings read from the environment.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::IndexingError;
use news_indexer_pipeline::{PagingStrategy, PartialFailurePolicy, MAX_BATCH_SIZE};
use news_indexer_repository::checkpoint::DEFAULT_CHECKPOINT_PATH;
use news_indexer_repository::opensearch::DEFAULT_INDEX_NAME;
use news_indexer_repository::postgres::parse_dsn;
use news_indexer_repository::{BasicCredentials, OpenSearchConfig};

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default number of records per page and per bulk request.
const DEFAULT_BATCH_SIZE: usize = 1000;

/// Default wait after a successful cycle, in seconds.
const DEFAULT_INTERVAL_SEC: u64 = 30;

/// Default cool-down after a failed cycle, in seconds.
const DEFAULT_RETRY_DELAY_SEC: u64 = 10;

/// Default cap for exponential cool-downs, in seconds.
const DEFAULT_RETRY_MAX_DELAY_SEC: u64 = 300;

/// Default timeout for every store call, in seconds.
const DEFAULT_TIMEOUT_SEC: u64 = 30;

/// Characters OpenSearch refuses in index names.
const INVALID_INDEX_CHARS: &[char] = &['\\', '/', '*', '?', '"', '<', '>', '|', ' ', ',', '#', ':'];

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = IndexingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(IndexingError::config(format!(
                "LOG_FORMAT must be pretty or json, got {:?}",
                other
            ))),
        }
    }
}

/// Cool-down strategy after a failed cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryBackoff {
    #[default]
    Fixed,
    Exponential,
}

impl FromStr for RetryBackoff {
    type Err = IndexingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "exponential" => Ok(Self::Exponential),
            other => Err(IndexingError::config(format!(
                "INDEXER_RETRY_BACKOFF must be fixed or exponential, got {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for RetryBackoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed => f.write_str("fixed"),
            Self::Exponential => f.write_str("exponential"),
        }
    }
}

/// Everything the indexer needs to start.
#[derive(Debug, Clone)]
pub struct IndexerSettings {
    pub postgres_dsn: String,
    pub opensearch: OpenSearchConfig,
    pub batch_size: usize,
    pub poll_interval: Duration,
    pub checkpoint_file: PathBuf,
    pub retry_delay: Duration,
    pub retry_backoff: RetryBackoff,
    pub retry_max_delay: Duration,
    /// Timeout for every call to Postgres, OpenSearch and the checkpoint.
    pub timeout: Duration,
    pub paging: PagingStrategy,
    pub partial_failures: PartialFailurePolicy,
    pub log_format: LogFormat,
}

impl IndexerSettings {
    /// Read settings from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `POSTGRES_DSN`: source database (required)
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `OPENSEARCH_USER` / `OPENSEARCH_PASS`: basic auth, both or neither
    /// - `OPENSEARCH_VERIFY_CERTS`: validate TLS certificates (default: true)
    /// - `INDEX_NAME`: destination index (default: news)
    /// - `INDEXER_BATCH_SIZE`: page and bulk size (default: 1000)
    /// - `INDEXER_INTERVAL_SEC`: wait between cycles (default: 30)
    /// - `INDEXER_CHECKPOINT_FILE`: checkpoint path (default: /tmp/indexer_checkpoint.txt)
    /// - `INDEXER_RETRY_DELAY_SEC`: cool-down after a failure (default: 10)
    /// - `INDEXER_RETRY_BACKOFF`: fixed or exponential (default: fixed)
    /// - `INDEXER_RETRY_MAX_DELAY_SEC`: exponential cap (default: 300)
    /// - `INDEXER_TIMEOUT_SEC`: per-call timeout (default: 30)
    /// - `INDEXER_PAGING`: keyset or offset (default: keyset)
    /// - `INDEXER_PARTIAL_FAILURES`: advance or withhold (default: advance)
    /// - `LOG_FORMAT`: pretty or json (default: pretty)
    pub fn from_env() -> Result<Self, IndexingError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `lookup`, which returns the raw value of a
    /// variable if it is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, IndexingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let postgres_dsn =
            get("POSTGRES_DSN").ok_or_else(|| IndexingError::config("POSTGRES_DSN is required"))?;
        parse_dsn(&postgres_dsn).map_err(|e| IndexingError::config(e.to_string()))?;

        let index_name = get("INDEX_NAME").unwrap_or_else(|| DEFAULT_INDEX_NAME.to_string());
        validate_index_name(&index_name)?;

        let timeout = Duration::from_secs(parse_number(&get, "INDEXER_TIMEOUT_SEC", DEFAULT_TIMEOUT_SEC, 1)?);

        let mut opensearch = OpenSearchConfig::new(
            get("OPENSEARCH_URL").unwrap_or_else(|| DEFAULT_OPENSEARCH_URL.to_string()),
            index_name,
        )
        .with_timeout(timeout)
        .with_verify_certs(parse_bool(&get, "OPENSEARCH_VERIFY_CERTS", true)?);

        match (get("OPENSEARCH_USER"), get("OPENSEARCH_PASS")) {
            (Some(user), Some(pass)) => {
                opensearch = opensearch.with_credentials(BasicCredentials::new(user, pass));
            }
            (None, None) => {}
            _ => {
                return Err(IndexingError::config(
                    "OPENSEARCH_USER and OPENSEARCH_PASS must be set together",
                ))
            }
        }

        let batch_size = parse_number(&get, "INDEXER_BATCH_SIZE", DEFAULT_BATCH_SIZE as u64, 1)?;
        if batch_size > MAX_BATCH_SIZE as u64 {
            return Err(IndexingError::config(format!(
                "INDEXER_BATCH_SIZE must be at most {}, got {}",
                MAX_BATCH_SIZE, batch_size
            )));
        }

        Ok(Self {
            postgres_dsn,
            opensearch,
            batch_size: batch_size as usize,
            poll_interval: Duration::from_secs(parse_number(
                &get,
                "INDEXER_INTERVAL_SEC",
                DEFAULT_INTERVAL_SEC,
                1,
            )?),
            checkpoint_file: get("INDEXER_CHECKPOINT_FILE")
                .unwrap_or_else(|| DEFAULT_CHECKPOINT_PATH.to_string())
                .into(),
            retry_delay: Duration::from_secs(parse_number(
                &get,
                "INDEXER_RETRY_DELAY_SEC",
                DEFAULT_RETRY_DELAY_SEC,
                1,
            )?),
            retry_backoff: parse_enum(&get, "INDEXER_RETRY_BACKOFF")?,
            retry_max_delay: Duration::from_secs(parse_number(
                &get,
                "INDEXER_RETRY_MAX_DELAY_SEC",
                DEFAULT_RETRY_MAX_DELAY_SEC,
                1,
            )?),
            timeout,
            paging: parse_enum(&get, "INDEXER_PAGING")?,
            partial_failures: parse_enum(&get, "INDEXER_PARTIAL_FAILURES")?,
            log_format: parse_enum(&get, "LOG_FORMAT")?,
        })
    }
}

fn parse_number<G>(get: &G, key: &str, default: u64, min: u64) -> Result<u64, IndexingError>
where
    G: Fn(&str) -> Option<String>,
{
    let value = match get(key) {
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|_| IndexingError::config(format!("{} must be a whole number, got {:?}", key, raw)))?,
        None => default,
    };

    if value < min {
        return Err(IndexingError::config(format!(
            "{} must be at least {}, got {}",
            key, min, value
        )));
    }
    Ok(value)
}

fn parse_bool<G>(get: &G, key: &str, default: bool) -> Result<bool, IndexingError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key).map(|raw| raw.to_ascii_lowercase()) {
        None => Ok(default),
        Some(raw) => match raw.as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(IndexingError::config(format!(
                "{} must be true or false, got {:?}",
                key, raw
            ))),
        },
    }
}

/// Parse an optional variable with a `FromStr` whose errors convert into
/// `IndexingError`, falling back to the type's default.
fn parse_enum<G, T>(get: &G, key: &str) -> Result<T, IndexingError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr + Default,
    T::Err: fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e: T::Err| IndexingError::config(format!("{}: {}", key, e))),
        None => Ok(T::default()),
    }
}

fn validate_index_name(name: &str) -> Result<(), IndexingError> {
    let valid = name == name.to_lowercase()
        && name != "."
        && name != ".."
        && !name.starts_with(['-', '_', '+'])
        && !name.contains(INVALID_INDEX_CHARS)
        && name.len() <= 255;

    if valid {
        Ok(())
    } else {
        Err(IndexingError::config(format!("Invalid INDEX_NAME {:?}", name)))
    }
}
