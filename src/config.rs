use serde::Deserialize;

/// Middleware configuration, as supplied by the host.
///
/// ```
/// # use regex_redirect::Config;
/// let config = Config::new(r#"\w+:(\/?\/?)[^\s"]+"#);
/// assert_eq!(config.regex, r#"\w+:(\/?\/?)[^\s"]+"#);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Pattern searched for in upstream response bodies.
    #[serde(default)]
    pub regex: String,
}

impl Config {
    /// Creates a configuration with the given pattern.
    pub fn new(regex: impl Into<String>) -> Self {
        Self {
            regex: regex.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_regex() {
        let config: Config = serde_json::from_str(r#"{"regex": "https?://\\S+"}"#).unwrap();
        assert_eq!(config.regex, r"https?://\S+");
    }

    #[test]
    fn test_deserialize_ignores_unknown_options() {
        let config: Config =
            serde_json::from_str(r#"{"regex": "a+", "statusCode": 301}"#).unwrap();
        assert_eq!(config, Config::new("a+"));
    }

    #[test]
    fn test_default_is_empty_pattern() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.regex.is_empty());
    }
}
