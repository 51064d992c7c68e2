use std::path::PathBuf;
use std::time::Duration;

/// How executors apply read-modify-write updates to denormalized fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsistencyMode {
    /// Plain read-then-write. Concurrent writers on the same document can
    /// lose updates; matches the remote store's native last-write-wins.
    BestEffort,
    /// Guard the rewritten field with a compare-and-swap, retrying on
    /// interference. Exhausted retries fail the action so it stays queued.
    CompareAndSwap,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub queue_path: PathBuf,
    pub action_timeout: Duration,
    pub consistency: ConsistencyMode,
    pub cas_attempts: u32,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let queue_path = PathBuf::from(env_or("LOUSA_QUEUE_PATH", "lousa-queue.db"));

        let timeout_secs: u64 = env_or("LOUSA_ACTION_TIMEOUT_SECS", "30")
            .parse()
            .map_err(|e| format!("Invalid LOUSA_ACTION_TIMEOUT_SECS: {e}"))?;

        let consistency = match env_or("LOUSA_CONSISTENCY", "best-effort").as_str() {
            "compare-and-swap" => ConsistencyMode::CompareAndSwap,
            _ => ConsistencyMode::BestEffort,
        };

        let cas_attempts: u32 = env_or("LOUSA_CAS_ATTEMPTS", "3")
            .parse()
            .map_err(|e| format!("Invalid LOUSA_CAS_ATTEMPTS: {e}"))?;

        let log_level = env_or("LOUSA_LOG_LEVEL", "info");

        Ok(Config {
            queue_path,
            action_timeout: Duration::from_secs(timeout_secs),
            consistency,
            cas_attempts,
            log_level,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
