#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub property_id: Option<String>,
    pub source: SourceKind,
    pub output_dir: String,
    pub default_range_days: u32,
    pub top_pages_limit: usize,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    /// Deterministic generated data.
    Sample,
    /// Holds the bundle path read from `WEBINSIGHTS_SOURCE_FILE`.
    File(String),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            property_id: None,
            source: SourceKind::Sample,
            output_dir: ".".to_string(),
            default_range_days: 7,
            top_pages_limit: 10,
            cors_origins: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with an explicit variable lookup.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let defaults = Self::default();
        Ok(Self {
            port: var("WEBINSIGHTS_PORT")
                .unwrap_or_else(|| "5000".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            property_id: var("WEBINSIGHTS_PROPERTY_ID").filter(|v| !v.trim().is_empty()),
            source: {
                let raw = var("WEBINSIGHTS_SOURCE").unwrap_or_else(|| "sample".to_string());
                match raw.as_str() {
                    "file" => {
                        let path = var("WEBINSIGHTS_SOURCE_FILE").ok_or_else(|| {
                            "WEBINSIGHTS_SOURCE_FILE required when SOURCE=file".to_string()
                        })?;
                        SourceKind::File(path)
                    }
                    _ => SourceKind::Sample,
                }
            },
            output_dir: var("WEBINSIGHTS_OUTPUT_DIR").unwrap_or(defaults.output_dir),
            default_range_days: var("WEBINSIGHTS_DEFAULT_RANGE_DAYS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_range_days),
            top_pages_limit: var("WEBINSIGHTS_TOP_PAGES_LIMIT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.top_pages_limit),
            cors_origins: var("WEBINSIGHTS_CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|origin| !origin.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}
