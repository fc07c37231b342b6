use std::env;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::{Result, ScoutError};

const DEFAULT_OUTPUT_DIR: &str = "result/information";
const DEFAULT_TIMEOUT_SECS: u64 = 8;
const DEFAULT_PAGE_DELAY_MS: RangeInclusive<u64> = 2500..=5500;

/// Where the session cookie and user agent come from.
///
/// Mirrors `DEFAULT_COOKIE_STRING`, `DEFAULT_COOKIE_FILE` and
/// `DEFAULT_USER_AGENT`; command line flags take their place.
#[derive(Debug, Clone, Default)]
pub struct CredentialSource {
    pub cookie_string: Option<String>,
    pub cookie_file: Option<PathBuf>,
    pub user_agent: Option<String>,
}

impl CredentialSource {
    pub fn from_env() -> Self {
        Self {
            cookie_string: non_empty_var("DEFAULT_COOKIE_STRING"),
            cookie_file: non_empty_var("DEFAULT_COOKIE_FILE").map(PathBuf::from),
            user_agent: non_empty_var("DEFAULT_USER_AGENT"),
        }
    }

    /// Apply command line overrides on top of the environment values.
    ///
    /// A cookie given on the command line replaces both environment cookie
    /// sources, so a stale `DEFAULT_COOKIE_FILE` cannot shadow `--cookie-string`.
    pub fn with_overrides(
        mut self,
        cookie_string: Option<String>,
        cookie_file: Option<PathBuf>,
        user_agent: Option<String>,
    ) -> Self {
        if cookie_string.is_some() || cookie_file.is_some() {
            debug!("Using session cookie from the command line");
            self.cookie_string = cookie_string;
            self.cookie_file = cookie_file;
        }
        if user_agent.is_some() {
            self.user_agent = user_agent;
        }
        self
    }
}

/// Session flags shared by both binaries
#[derive(Debug, Clone, Default, clap::Args)]
pub struct SessionArgs {
    /// Cookie header captured from a logged-in browser session
    #[arg(long)]
    pub cookie_string: Option<String>,

    /// File holding cookies (JSON mapping, JSON pair list, or raw Cookie header)
    #[arg(long)]
    pub cookie_file: Option<PathBuf>,

    /// User-Agent captured together with the cookie
    #[arg(long)]
    pub user_agent: Option<String>,
}

impl SessionArgs {
    pub fn apply(self, source: CredentialSource) -> CredentialSource {
        source.with_overrides(self.cookie_string, self.cookie_file, self.user_agent)
    }
}

/// Cookie header and user agent of a logged-in browser session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    pub cookie: String,
    pub user_agent: String,
}

impl SessionCredentials {
    /// Resolve credentials: the cookie file wins over the inline string.
    pub fn resolve(source: &CredentialSource) -> Result<Self> {
        let mut cookies = Vec::new();

        if let Some(path) = &source.cookie_file {
            match load_cookie_file(path) {
                Ok(pairs) => cookies = pairs,
                Err(err) => debug!("Cookie file unusable, trying inline cookie: {}", err),
            }
        }

        if cookies.is_empty() {
            if let Some(raw) = &source.cookie_string {
                cookies = parse_cookie_string(raw);
            }
        }

        if cookies.is_empty() {
            return Err(ScoutError::Configuration(
                "no session cookie: set DEFAULT_COOKIE_FILE or DEFAULT_COOKIE_STRING".to_string(),
            ));
        }

        let user_agent = source
            .user_agent
            .as_deref()
            .map(str::trim)
            .filter(|ua| !ua.is_empty())
            .ok_or_else(|| {
                ScoutError::Configuration("no user agent: set DEFAULT_USER_AGENT".to_string())
            })?
            .to_string();

        Ok(Self {
            cookie: to_cookie_header(&cookies),
            user_agent,
        })
    }
}

/// Resolve the configured session credentials
pub fn get_credentials(source: &CredentialSource) -> Result<SessionCredentials> {
    SessionCredentials::resolve(source)
}

/// Split a `Cookie` header into name/value pairs, dropping malformed entries.
pub fn parse_cookie_string(raw: &str) -> Vec<(String, String)> {
    raw.split(';')
        .filter_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Load cookies from a JSON object, a JSON list of pairs, or a raw header string.
pub fn load_cookie_file(path: &Path) -> Result<Vec<(String, String)>> {
    let raw = std::fs::read_to_string(path).map_err(|err| {
        ScoutError::Configuration(format!("cookie file {}: {}", path.display(), err))
    })?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map
            .into_iter()
            .map(|(key, value)| (key, json_to_plain(&value)))
            .collect()),
        Ok(Value::Array(items)) => Ok(items
            .iter()
            .filter_map(|item| match item.as_array()?.as_slice() {
                [key, value, ..] => Some((json_to_plain(key), json_to_plain(value))),
                _ => None,
            })
            .collect()),
        _ => Ok(parse_cookie_string(raw)),
    }
}

fn json_to_plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn to_cookie_header(cookies: &[(String, String)]) -> String {
    cookies
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Runtime settings loaded from the environment
#[derive(Debug, Clone)]
pub struct Settings {
    pub credentials: CredentialSource,
    pub output_dir: PathBuf,
    pub request_timeout: Duration,
    /// Milliseconds slept between list pages, drawn uniformly from the range
    pub page_delay_ms: RangeInclusive<u64>,
}

impl Settings {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let request_timeout = match non_empty_var("REQUEST_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.parse().map_err(|_| {
                ScoutError::Configuration(format!("REQUEST_TIMEOUT_SECS must be a number, got `{raw}`"))
            })?),
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let page_delay_ms = match non_empty_var("PAGE_DELAY_MS") {
            Some(raw) => parse_delay_range(&raw)?,
            None => DEFAULT_PAGE_DELAY_MS,
        };

        Ok(Self {
            credentials: CredentialSource::from_env(),
            output_dir: non_empty_var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            request_timeout,
            page_delay_ms,
        })
    }
}

/// Parse `min..max` or a single value in milliseconds
pub fn parse_delay_range(raw: &str) -> Result<RangeInclusive<u64>> {
    let invalid = || ScoutError::Configuration(format!("PAGE_DELAY_MS must be `min..max` or `ms`, got `{raw}`"));
    let (min, max) = match raw.split_once("..") {
        Some((min, max)) => (
            min.trim().parse::<u64>().map_err(|_| invalid())?,
            max.trim().trim_start_matches('=').parse::<u64>().map_err(|_| invalid())?,
        ),
        None => {
            let value = raw.trim().parse::<u64>().map_err(|_| invalid())?;
            (value, value)
        }
    };
    Ok(min..=max.max(min))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn source(cookie: Option<&str>, file: Option<PathBuf>, ua: Option<&str>) -> CredentialSource {
        CredentialSource {
            cookie_string: cookie.map(String::from),
            cookie_file: file,
            user_agent: ua.map(String::from),
        }
    }

    #[test]
    fn cookie_string_is_normalized() {
        let pairs = parse_cookie_string(" lianjia_uuid=abc ; =bad; novalue ;token = x=y ");
        assert_eq!(
            pairs,
            vec![
                ("lianjia_uuid".to_string(), "abc".to_string()),
                ("token".to_string(), "x=y".to_string()),
            ]
        );
    }

    #[test]
    fn inline_cookie_resolves() {
        let creds = SessionCredentials::resolve(&source(Some("a=1;b=2"), None, Some("UA/1.0"))).unwrap();
        assert_eq!(creds.cookie, "a=1; b=2");
        assert_eq!(creds.user_agent, "UA/1.0");
    }

    #[test]
    fn cookie_file_takes_precedence() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"lianjia_token": "t0k", "n": 5}}"#).unwrap();
        let creds = SessionCredentials::resolve(&source(
            Some("inline=1"),
            Some(file.path().to_path_buf()),
            Some("UA"),
        ))
        .unwrap();
        assert!(creds.cookie.contains("lianjia_token=t0k"));
        assert!(creds.cookie.contains("n=5"));
        assert!(!creds.cookie.contains("inline"));
    }

    #[test]
    fn cookie_file_accepts_pair_list_and_raw_header() {
        let mut list = tempfile::NamedTempFile::new().unwrap();
        write!(list, r#"[["a", "1"], ["b"], ["c", "3"]]"#).unwrap();
        assert_eq!(
            load_cookie_file(list.path()).unwrap(),
            vec![("a".to_string(), "1".to_string()), ("c".to_string(), "3".to_string())]
        );

        let mut raw = tempfile::NamedTempFile::new().unwrap();
        writeln!(raw, "x=1; y=2").unwrap();
        assert_eq!(load_cookie_file(raw.path()).unwrap().len(), 2);
    }

    #[test]
    fn missing_file_falls_back_to_inline() {
        let creds = SessionCredentials::resolve(&source(
            Some("inline=1"),
            Some(PathBuf::from("/nonexistent/cookies.json")),
            Some("UA"),
        ))
        .unwrap();
        assert_eq!(creds.cookie, "inline=1");
    }

    #[test]
    fn no_cookie_is_a_configuration_error() {
        let err = SessionCredentials::resolve(&source(Some("  "), None, Some("UA"))).unwrap_err();
        assert!(matches!(err, ScoutError::Configuration(_)));
    }

    #[test]
    fn empty_user_agent_is_a_configuration_error() {
        let err = get_credentials(&source(Some("a=1"), None, Some(" "))).unwrap_err();
        assert!(matches!(err, ScoutError::Configuration(_)));
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let merged = source(Some("a=1"), None, Some("UA")).with_overrides(None, None, Some("Other".into()));
        assert_eq!(merged.cookie_string.as_deref(), Some("a=1"));
        assert_eq!(merged.user_agent.as_deref(), Some("Other"));
    }

    #[test]
    fn cli_cookie_string_beats_env_cookie_file() {
        let mut stale = tempfile::NamedTempFile::new().unwrap();
        writeln!(stale, "stale=env").unwrap();
        let env = source(None, Some(stale.path().to_path_buf()), Some("UA"));
        let args = SessionArgs {
            cookie_string: Some("fresh=cli".to_string()),
            ..Default::default()
        };

        let merged = args.apply(env);
        assert!(merged.cookie_file.is_none());
        let creds = SessionCredentials::resolve(&merged).unwrap();
        assert_eq!(creds.cookie, "fresh=cli");
        assert_eq!(creds.user_agent, "UA");
    }

    #[test]
    fn cli_cookie_file_beats_env_cookie_string() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fresh=file").unwrap();
        let env = source(Some("stale=env"), None, Some("UA"));
        let args = SessionArgs {
            cookie_file: Some(file.path().to_path_buf()),
            ..Default::default()
        };

        let merged = args.apply(env);
        assert!(merged.cookie_string.is_none());
        assert_eq!(SessionCredentials::resolve(&merged).unwrap().cookie, "fresh=file");
    }

    #[test]
    fn delay_range_parses() {
        assert_eq!(parse_delay_range("100..300").unwrap(), 100..=300);
        assert_eq!(parse_delay_range("0").unwrap(), 0..=0);
        assert_eq!(parse_delay_range("500..100").unwrap(), 500..=500);
        assert!(parse_delay_range("fast").is_err());
    }
}
