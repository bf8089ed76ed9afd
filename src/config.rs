use icu_locid::{
    Locale,
    extensions::unicode::{key, value},
    subtags::{language, region, script},
};
use std::{env, path::PathBuf, time::Duration};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Where the dashboard gets its data from.
#[derive(Debug, Clone)]
pub enum Backend {
    Http {
        base_url: String,
        timeout: Option<Duration>,
    },
    Mock {
        password: String,
        delay: Duration,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub session_path: PathBuf,
    pub backend: Backend,
    pub list_limit: u32,
    pub locale: Locale,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = parse_or("PORT", lookup("PORT"), 8080u16)?;
        let session_path = lookup("APP_SESSION_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data/session.json"));
        let list_limit = parse_or("HOURS_LIST_LIMIT", lookup("HOURS_LIST_LIMIT"), 500u32)?;

        let locale_value = lookup("APP_LOCALE").unwrap_or_else(|| "zh-TW".to_string());
        let locale = locale_value
            .parse::<Locale>()
            .map(with_traditional_collation)
            .map_err(|_| ConfigError::Invalid {
                name: "APP_LOCALE",
                value: locale_value.clone(),
            })?;

        let backend = match lookup("HOURS_API_URL").filter(|url| !url.trim().is_empty()) {
            Some(url) => {
                let timeout = match lookup("HOURS_API_TIMEOUT_SECS") {
                    Some(value) => match value.trim().parse::<u64>() {
                        Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                        _ => {
                            return Err(ConfigError::Invalid {
                                name: "HOURS_API_TIMEOUT_SECS",
                                value,
                            });
                        }
                    },
                    None => None,
                };
                Backend::Http {
                    base_url: url.trim().trim_end_matches('/').to_string(),
                    timeout,
                }
            }
            None => Backend::Mock {
                password: lookup("MOCK_PASSWORD").unwrap_or_else(|| "1234".to_string()),
                delay: Duration::from_millis(parse_or(
                    "MOCK_DELAY_MS",
                    lookup("MOCK_DELAY_MS"),
                    800u64,
                )?),
            },
        };

        Ok(Self {
            port,
            session_path,
            backend,
            list_limit,
            locale,
        })
    }
}

/// Traditional Chinese sorts by stroke count unless a collation is named.
fn with_traditional_collation(mut locale: Locale) -> Locale {
    let traditional = locale.id.script == Some(script!("Hant"))
        || [region!("TW"), region!("HK"), region!("MO")]
            .iter()
            .any(|tw| locale.id.region == Some(*tw));
    let co = key!("co");
    if locale.id.language == language!("zh")
        && traditional
        && !locale.extensions.unicode.keywords.contains_key(&co)
    {
        locale.extensions.unicode.keywords.set(co, value!("stroke"));
    }
    locale
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_select_mock_backend() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.list_limit, 500);
        assert_eq!(config.session_path, PathBuf::from("data/session.json"));
        assert_eq!(config.locale.to_string(), "zh-TW-u-co-stroke");
        match config.backend {
            Backend::Mock { password, delay } => {
                assert_eq!(password, "1234");
                assert_eq!(delay, Duration::from_millis(800));
            }
            other => panic!("unexpected backend {other:?}"),
        }
    }

    #[test]
    fn api_url_selects_http_backend() {
        let config = Config::from_lookup(lookup(&[
            ("HOURS_API_URL", "https://api.example.org/prod/"),
            ("HOURS_API_TIMEOUT_SECS", "15"),
        ]))
        .unwrap();
        match config.backend {
            Backend::Http { base_url, timeout } => {
                assert_eq!(base_url, "https://api.example.org/prod");
                assert_eq!(timeout, Some(Duration::from_secs(15)));
            }
            other => panic!("unexpected backend {other:?}"),
        }
    }

    #[test]
    fn traditional_chinese_defaults_to_stroke_order() {
        let locale = |value: &str| {
            Config::from_lookup(lookup(&[("APP_LOCALE", value)]))
                .unwrap()
                .locale
                .to_string()
        };
        assert_eq!(locale("zh-Hant"), "zh-Hant-u-co-stroke");
        assert_eq!(locale("zh-TW-u-co-pinyin"), "zh-TW-u-co-pinyin");
        assert_eq!(locale("zh-CN"), "zh-CN");
        assert_eq!(locale("en"), "en");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("HOURS_API_URL", "https://api.example.org/prod"),
            ("HOURS_API_TIMEOUT_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("HOURS_API_TIMEOUT_SECS"));
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = Config::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
