use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_OPEN_METEO_API_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Run mode that publishes only tomorrow's daily values.
pub const MODE_TOMORROW: &str = "tomorrow";

#[derive(Debug, Clone)]
pub struct Config {
    // Request
    pub mode: String,
    pub request: Map<String, Value>,
    pub open_meteo_api_url: String,

    // Weather codes
    pub weather_code_language: String,
    pub weather_code_dir: Option<PathBuf>,

    // Response cache
    pub cache_dir: PathBuf,
    pub cache_expiry: Duration,

    // MQTT
    pub mqtt: MqttConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MqttProtocol {
    V311,
    V5,
}

#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub server: String,
    pub port: u16,
    pub topic: String,
    pub client_id: Option<String>,
    pub protocol: MqttProtocol,
    pub retain: bool,

    // TLS
    pub tls: bool,
    pub tls_insecure: bool,
    pub ca_bundle: Option<PathBuf>,

    // Authentication
    pub username: Option<String>,
    pub password: Option<String>,
}

impl MqttConfig {
    /// Username and password, only when both are configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some((username.as_str(), password.as_str())),
            _ => None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = var("MODE")
            .context("No configuration file specified. Please set the MODE environment variable.")?;
        let config_dir = var("CONFIG_DIR").unwrap_or_else(|| "etc".to_string());

        let mut request = load_request_file(Path::new(&config_dir), &mode)?;
        apply_request_overrides(&mut request, &var)?;

        Ok(Self {
            mode,
            request,
            open_meteo_api_url: var("OPEN_METEO_API_URL")
                .unwrap_or_else(|| DEFAULT_OPEN_METEO_API_URL.to_string()),

            // Weather codes
            weather_code_language: var("WEATHER_CODE_LANGUAGE")
                .unwrap_or_else(|| crate::weather_codes::DEFAULT_LANGUAGE.to_string()),
            weather_code_dir: var("WEATHER_CODE_DIR").map(PathBuf::from),

            // Response cache
            cache_dir: PathBuf::from(var("CACHE_DIR").unwrap_or_else(|| "cache".to_string())),
            cache_expiry: Duration::from_secs(
                var("CACHE_EXPIRY_AFTER_SEC")
                    .map(|v| v.parse::<u64>().context("CACHE_EXPIRY_AFTER_SEC must be an integer"))
                    .transpose()?
                    .unwrap_or(600),
            ),

            mqtt: MqttConfig::from_vars(&var)?,
        })
    }

    /// Open-Meteo query parameters for this run
    pub fn request_params(&self) -> &Map<String, Value> {
        &self.request
    }

    /// Whether only tomorrow's daily values should be published.
    pub fn is_tomorrow_mode(&self) -> bool {
        self.mode == MODE_TOMORROW
    }
}

impl MqttConfig {
    fn from_vars<F>(var: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut password = var("MQTT_PASSWORD");
        if let Some(path) = var("MQTT_PASSWORD_FILE") {
            if !Path::new(&path).is_file() {
                bail!("MQTT password file {} not found.", path);
            }
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read MQTT password file {}", path))?;
            password = Some(content.trim().to_string());
        }

        Ok(Self {
            server: var("MQTT_SERVER").context("MQTT_SERVER not set")?,
            port: var("MQTT_PORT")
                .map(|v| v.parse::<u16>().context("MQTT_PORT must be a port number"))
                .transpose()?
                .unwrap_or(1883),
            topic: var("MQTT_TOPIC").context("MQTT_TOPIC not set")?,
            client_id: var("MQTT_CLIENT_ID").filter(|id| !id.is_empty()),
            protocol: match var("MQTT_PROTOCOL_VERSION").as_deref() {
                Some("5") => MqttProtocol::V5,
                _ => MqttProtocol::V311,
            },
            retain: flag(var("MQTT_RETAIN")),

            // TLS
            tls: flag(var("MQTT_TLS")),
            tls_insecure: flag(var("MQTT_TLS_INSECURE")),
            ca_bundle: var("REQUESTS_CA_BUNDLE").map(PathBuf::from),

            // Authentication
            username: var("MQTT_USERNAME"),
            password,
        })
    }
}

/// Boolean variables are true only for a case-insensitive "true".
fn flag(value: Option<String>) -> bool {
    value
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Load `<dir>/<mode>.json` and return its `data` object.
pub fn load_request_file(dir: &Path, mode: &str) -> Result<Map<String, Value>> {
    let path = dir.join(format!("{}.json", mode));
    if !path.is_file() {
        bail!("Configuration file {} not found.", path.display());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
    let document: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse configuration file {}", path.display()))?;

    match document {
        Value::Object(mut root) => match root.remove("data") {
            Some(Value::Object(data)) => Ok(data),
            Some(_) => bail!("'data' in {} must be an object", path.display()),
            None => Ok(Map::new()),
        },
        _ => bail!("Configuration file {} must contain a JSON object", path.display()),
    }
}

/// Enrich request parameters with location settings from the environment.
fn apply_request_overrides<F>(request: &mut Map<String, Value>, var: &F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    for (key, field) in [
        ("LATITUDE", "latitude"),
        ("LONGITUDE", "longitude"),
        ("ELEVATION", "elevation"),
    ] {
        if let Some(raw) = var(key) {
            let value: f64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number, got '{}'", key, raw))?;
            let number = serde_json::Number::from_f64(value)
                .with_context(|| format!("{} must be finite, got '{}'", key, raw))?;
            request.insert(field.to_string(), Value::Number(number));
        }
    }

    if let Some(models) = var("WEATHER_MODELS") {
        request.insert("models".to_string(), Value::String(models));
    }
    if let Some(timezone) = var("TZ") {
        request.insert("timezone".to_string(), Value::String(timezone));
    }

    Ok(())
}
