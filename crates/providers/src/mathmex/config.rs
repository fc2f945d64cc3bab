use anyhow::Context;
use mathmex_core::settings::config_path;
use serde::Deserialize;
use std::{env, fs, time::Duration};

pub const DEFAULT_API_BASE: &str = "http://localhost:440/api";

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MathMexFileConfig {
    pub api_base: Option<String>,
    pub timeout_ms: Option<u64>,
    pub max_retries: Option<u32>,
    pub proxy: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MathMexConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Extra attempts after the first one for transient failures.
    pub max_retries: u32,
    pub proxy: Option<String>,
}

impl Default for MathMexConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_millis(30_000),
            max_retries: 2,
            proxy: None,
        }
    }
}

impl MathMexConfig {
    pub fn from_env_and_file() -> anyhow::Result<Self> {
        let file_text = match config_path() {
            Some(path) if path.exists() => Some(
                fs::read_to_string(&path)
                    .with_context(|| format!("read {}", path.display()))?,
            ),
            _ => None,
        };
        let proxy = env::var("HTTPS_PROXY")
            .ok()
            .or_else(|| env::var("HTTP_PROXY").ok());
        Self::resolve(
            env::var("MATHMEX_API_BASE").ok(),
            file_text.as_deref(),
            proxy,
        )
    }

    /// Precedence: environment, then config file, then defaults.
    pub fn resolve(
        env_base: Option<String>,
        file_text: Option<&str>,
        env_proxy: Option<String>,
    ) -> anyhow::Result<Self> {
        let mut cfg = Self::default();
        if let Some(text) = file_text {
            let file_cfg: MathMexFileConfig =
                toml::from_str(text).context("parse config.toml")?;
            if let Some(b) = file_cfg.api_base {
                cfg.base_url = b;
            }
            if let Some(t) = file_cfg.timeout_ms {
                cfg.timeout = Duration::from_millis(t);
            }
            if let Some(r) = file_cfg.max_retries {
                cfg.max_retries = r;
            }
            cfg.proxy = file_cfg.proxy;
        }
        if let Some(b) = env_base.filter(|b| !b.trim().is_empty()) {
            cfg.base_url = b;
        }
        if env_proxy.is_some() {
            cfg.proxy = env_proxy;
        }
        let parsed = url::Url::parse(&cfg.base_url)
            .with_context(|| format!("invalid api_base '{}'", cfg.base_url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("api_base must be http(s): {}", cfg.base_url);
        }
        cfg.base_url = cfg.base_url.trim_end_matches('/').to_string();
        Ok(cfg)
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file_or_env() {
        let cfg = MathMexConfig::resolve(None, None, None).unwrap();
        assert_eq!(cfg, MathMexConfig::default());
        assert_eq!(cfg.endpoint("search"), "http://localhost:440/api/search");
    }

    #[test]
    fn file_then_env_precedence() {
        let file = "api_base = \"https://mathmex.example/api/\"\ntimeout_ms = 500\nmax_retries = 0\npage_size = 20\n";
        let cfg = MathMexConfig::resolve(None, Some(file), None).unwrap();
        assert_eq!(cfg.base_url, "https://mathmex.example/api");
        assert_eq!(cfg.timeout, Duration::from_millis(500));
        assert_eq!(cfg.max_retries, 0);

        let cfg = MathMexConfig::resolve(
            Some("http://127.0.0.1:5000/api".into()),
            Some(file),
            Some("http://proxy:3128".into()),
        )
        .unwrap();
        assert_eq!(cfg.endpoint("/summarize"), "http://127.0.0.1:5000/api/summarize");
        assert_eq!(cfg.proxy.as_deref(), Some("http://proxy:3128"));
    }

    #[test]
    fn rejects_bad_urls() {
        assert!(MathMexConfig::resolve(Some("not a url".into()), None, None).is_err());
        assert!(MathMexConfig::resolve(Some("ftp://x/api".into()), None, None).is_err());
        assert!(MathMexConfig::resolve(None, Some("api_base = ["), None).is_err());
    }

    #[test]
    fn errors_name_the_failing_step() {
        let e = MathMexConfig::resolve(None, Some("api_base = ["), None).unwrap_err();
        assert_eq!(e.to_string(), "parse config.toml");
        let e = MathMexConfig::resolve(Some("not a url".into()), None, None).unwrap_err();
        assert_eq!(e.to_string(), "invalid api_base 'not a url'");
        assert!(format!("{:#}", e).starts_with("invalid api_base 'not a url': "));
    }
}
