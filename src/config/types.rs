use serde::Deserialize;

/// Main configuration structure for Arena-Harvest
///
/// Every section has compiled-in defaults matching the live catalog and a
/// local Tor daemon, so the binary runs with no config file at all. A TOML
/// file, when given, overrides per section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub proxy: ProxyConfig,
    pub tor: TorConfig,
    pub fetch: FetchConfig,
    pub output: OutputConfig,
}

/// Catalog site layout and vendor selection
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Base URL of the catalog, with trailing slash
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the vendor index page, relative to the base URL
    #[serde(rename = "makers-path")]
    pub makers_path: String,

    /// Vendor-name fragments to keep (case-insensitive substring match)
    #[serde(rename = "vendor-whitelist")]
    pub vendor_whitelist: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.gsmarena.com/".to_string(),
            makers_path: "makers.php3".to_string(),
            vendor_whitelist: [
                "samsung",
                "xiaomi",
                "tecno",
                "infinix",
                "huawei",
                "realme",
                "blackview",
                "itel",
                "google",
                "honor",
                "htc",
                "nothing",
                "oppo",
                "oneplus",
                "vivo",
                "nokia",
                "sony",
                "lg",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Outbound connection configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// SOCKS proxy URL for all catalog traffic; none means a direct
    /// connection (useful against a local test server)
    #[serde(rename = "socks-url")]
    pub socks_url: Option<String>,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            socks_url: Some("socks5h://127.0.0.1:9050".to_string()),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                         AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}

/// Tor control-port configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TorConfig {
    /// Control-port address as host:port
    #[serde(rename = "control-addr")]
    pub control_addr: String,

    /// Control-port password
    #[serde(rename = "control-password")]
    pub control_password: String,

    /// Seconds to wait after NEWNYM before the new circuit is trusted
    #[serde(rename = "cooldown-secs")]
    pub cooldown_secs: u64,
}

impl Default for TorConfig {
    fn default() -> Self {
        Self {
            control_addr: "127.0.0.1:9051".to_string(),
            control_password: "my_password".to_string(),
            cooldown_secs: 15,
        }
    }
}

/// Fetch retry and pacing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Attempt budget per logical fetch
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Lower bound of the randomized post-success pause, in seconds
    #[serde(rename = "pause-secs-min")]
    pub pause_secs_min: u64,

    /// Upper bound (inclusive) of the randomized post-success pause
    #[serde(rename = "pause-secs-max")]
    pub pause_secs_max: u64,

    /// Rotate identity on every non-2xx status. When false, client errors
    /// other than 429 and 408 give up on the item immediately.
    #[serde(rename = "rotate-on-any-error")]
    pub rotate_on_any_error: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 50,
            request_timeout_secs: 15,
            pause_secs_min: 7,
            pause_secs_max: 15,
            rotate_on_any_error: true,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "gsmarena.db".to_string(),
        }
    }
}
