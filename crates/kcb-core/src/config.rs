use std::{
    env, fs,
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{domain::UserId, errors::Error, Result};

/// Typed configuration for the gallery bot and its web server.
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,
    pub owner_id: UserId,

    // Storage
    pub public_dir: PathBuf,
    pub static_dir: PathBuf,

    // HTTP
    pub http_addr: SocketAddr,

    // Upload sessions
    pub session_idle_timeout: Duration,
    pub session_sweep_interval: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(env_str)
    }

    /// Build the config from an arbitrary key lookup (the process env in production).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN")
            .and_then(non_empty)
            .or_else(|| get("BOT_TOKEN").and_then(non_empty))
            .ok_or_else(|| {
                Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
            })?;

        let owner_raw = get("OWNER_ID")
            .and_then(non_empty)
            .ok_or_else(|| Error::Config("OWNER_ID environment variable is required".to_string()))?;
        let owner_id = owner_raw
            .trim()
            .parse::<i64>()
            .map(UserId)
            .map_err(|_| Error::Config(format!("OWNER_ID is not an integer: {owner_raw}")))?;

        let public_dir = get("PUBLIC_DIR")
            .and_then(non_empty)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("public"));
        let static_dir = get("STATIC_DIR")
            .and_then(non_empty)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("static"));

        let http_addr = match get("HTTP_ADDR").and_then(non_empty) {
            Some(raw) => raw
                .trim()
                .parse::<SocketAddr>()
                .map_err(|_| Error::Config(format!("HTTP_ADDR is not a socket address: {raw}")))?,
            None => SocketAddr::from(([0, 0, 0, 0], 5000)),
        };

        let session_idle_timeout = Duration::from_secs(
            parse_u64(get("SESSION_IDLE_TIMEOUT_SECS")).unwrap_or(15 * 60),
        );
        let session_sweep_interval = Duration::from_secs(
            parse_u64(get("SESSION_SWEEP_INTERVAL_SECS"))
                .unwrap_or(60)
                .max(1),
        );

        Ok(Self {
            telegram_bot_token,
            owner_id,
            public_dir,
            static_dir,
            http_addr,
            session_idle_timeout,
            session_sweep_interval,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn parse_u64(v: Option<String>) -> Option<u64> {
    v.and_then(|s| s.trim().parse::<u64>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply_when_only_required_keys_are_set() {
        let cfg =
            Config::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "t"), ("OWNER_ID", "42")]))
                .unwrap();
        assert_eq!(cfg.owner_id, UserId(42));
        assert_eq!(cfg.public_dir, PathBuf::from("public"));
        assert_eq!(cfg.static_dir, PathBuf::from("static"));
        assert_eq!(cfg.http_addr, SocketAddr::from(([0, 0, 0, 0], 5000)));
        assert_eq!(cfg.session_idle_timeout, Duration::from_secs(900));
    }

    #[test]
    fn bot_token_falls_back_to_legacy_key() {
        let cfg = Config::from_lookup(lookup(&[("BOT_TOKEN", "legacy"), ("OWNER_ID", "1")]))
            .unwrap();
        assert_eq!(cfg.telegram_bot_token, "legacy");
    }

    #[test]
    fn missing_or_bad_required_values_are_config_errors() {
        assert!(matches!(
            Config::from_lookup(lookup(&[("OWNER_ID", "1")])),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "t")])),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "t"), ("OWNER_ID", "me")])),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[
                ("TELEGRAM_BOT_TOKEN", "t"),
                ("OWNER_ID", "1"),
                ("HTTP_ADDR", "nope"),
            ])),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn dotenv_parsing_strips_quotes_and_comments() {
        let parsed = parse_dotenv("# comment\nA=1\nB = \"two\"\n\nC='3'\nbroken\n=x\n");
        assert_eq!(
            parsed,
            vec![
                ("A".to_string(), "1".to_string()),
                ("B".to_string(), "two".to_string()),
                ("C".to_string(), "3".to_string()),
            ]
        );
    }
}
