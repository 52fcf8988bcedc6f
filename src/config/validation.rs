use crate::config::types::{CatalogConfig, Config, FetchConfig, ProxyConfig, TorConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_catalog_config(&config.catalog)?;
    validate_proxy_config(&config.proxy)?;
    validate_tor_config(&config.tor)?;
    validate_fetch_config(&config.fetch)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates catalog configuration
fn validate_catalog_config(config: &CatalogConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base-url must be http or https, got '{}'",
            url.scheme()
        )));
    }

    // Page addresses are formed by appending paths to the base
    if !config.base_url.ends_with('/') {
        return Err(ConfigError::Validation(format!(
            "base-url must end with '/', got '{}'",
            config.base_url
        )));
    }

    if config.makers_path.is_empty() {
        return Err(ConfigError::Validation(
            "makers-path cannot be empty".to_string(),
        ));
    }

    if config.vendor_whitelist.is_empty() {
        return Err(ConfigError::Validation(
            "vendor-whitelist cannot be empty; a run with no vendors does nothing".to_string(),
        ));
    }

    for entry in &config.vendor_whitelist {
        if entry.trim().is_empty() {
            return Err(ConfigError::Validation(
                "vendor-whitelist entries cannot be blank".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates proxy configuration
fn validate_proxy_config(config: &ProxyConfig) -> Result<(), ConfigError> {
    if let Some(socks) = &config.socks_url {
        let url = Url::parse(socks)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid socks-url: {}", e)))?;

        if !url.scheme().starts_with("socks") {
            return Err(ConfigError::Validation(format!(
                "socks-url must use a socks scheme, got '{}'",
                url.scheme()
            )));
        }
    }

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates Tor control-port configuration
fn validate_tor_config(config: &TorConfig) -> Result<(), ConfigError> {
    let (host, port) = config
        .control_addr
        .rsplit_once(':')
        .ok_or_else(|| {
            ConfigError::Validation(format!(
                "control-addr must be host:port, got '{}'",
                config.control_addr
            ))
        })?;

    if host.is_empty() {
        return Err(ConfigError::Validation(
            "control-addr host cannot be empty".to_string(),
        ));
    }

    port.parse::<u16>().map_err(|_| {
        ConfigError::Validation(format!(
            "control-addr port must be a number in 1-65535, got '{}'",
            port
        ))
    })?;

    if config.cooldown_secs > 120 {
        return Err(ConfigError::Validation(format!(
            "cooldown-secs must be <= 120, got {}",
            config.cooldown_secs
        )));
    }

    Ok(())
}

/// Validates fetch retry and pacing configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.pause_secs_min > config.pause_secs_max {
        return Err(ConfigError::Validation(format!(
            "pause-secs-min ({}) cannot exceed pause-secs-max ({})",
            config.pause_secs_min, config.pause_secs_max
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &crate::config::types::OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_base_url_must_end_with_slash() {
        let mut config = Config::default();
        config.catalog.base_url = "https://www.gsmarena.com".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_base_url_must_parse() {
        let mut config = Config::default();
        config.catalog.base_url = "not a url".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_empty_whitelist_rejected() {
        let mut config = Config::default();
        config.catalog.vendor_whitelist.clear();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_blank_whitelist_entry_rejected() {
        let mut config = Config::default();
        config.catalog.vendor_whitelist.push("   ".to_string());
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_socks_url_scheme_checked() {
        let mut config = Config::default();
        config.proxy.socks_url = Some("https://127.0.0.1:9050".to_string());
        assert!(validate(&config).is_err());

        config.proxy.socks_url = Some("socks5h://127.0.0.1:9050".to_string());
        assert!(validate(&config).is_ok());

        config.proxy.socks_url = None;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_control_addr_shape() {
        let mut config = Config::default();
        config.tor.control_addr = "localhost".to_string();
        assert!(validate(&config).is_err());

        config.tor.control_addr = "localhost:notaport".to_string();
        assert!(validate(&config).is_err());

        config.tor.control_addr = "localhost:9051".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_attempt_budget_rejected() {
        let mut config = Config::default();
        config.fetch.max_attempts = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_inverted_pause_bounds_rejected() {
        let mut config = Config::default();
        config.fetch.pause_secs_min = 10;
        config.fetch.pause_secs_max = 5;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_pause_allowed() {
        let mut config = Config::default();
        config.fetch.pause_secs_min = 0;
        config.fetch.pause_secs_max = 0;
        assert!(validate(&config).is_ok());
    }
}
