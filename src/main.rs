use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;
use weather2mqtt::cache::ResponseCache;
use weather2mqtt::config::Config;
use weather2mqtt::logging;
use weather2mqtt::mqtt::MqttPublisher;
use weather2mqtt::openmeteo::OpenMeteoClient;
use weather2mqtt::payload::WeatherPayload;
use weather2mqtt::weather_codes::WeatherCodes;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when variables come from the service manager)
    let _ = dotenvy::dotenv();

    // Initialize logging
    let rust_log = std::env::var("RUST_LOG").ok();
    let debug = std::env::var("DEBUG").ok();
    tracing_subscriber::fmt()
        .with_env_filter(logging::env_filter(
            rust_log.as_deref(),
            logging::default_directive(debug.as_deref()),
        ))
        .init();

    // Load configuration from environment
    let config = Config::from_env()?;
    info!("Starting weather2mqtt in '{}' mode", config.mode);

    // Step 1: Load weather code translations
    let codes = match &config.weather_code_dir {
        Some(dir) => WeatherCodes::from_dir(dir, &config.weather_code_language),
        None => WeatherCodes::new(&config.weather_code_language),
    }
    .context("Failed to load weather code translations")?;
    info!("Translating weather codes to '{}'", codes.language());

    // Step 2: Fetch forecast from Open-Meteo
    info!("Fetching weather data from Open-Meteo");
    let client = OpenMeteoClient::new(&config.open_meteo_api_url)
        .with_cache(ResponseCache::new(&config.cache_dir, config.cache_expiry));
    let forecast = client.fetch(config.request_params()).await?;

    // Step 3: Build the message
    let now = Utc::now();
    let mut payload = WeatherPayload::build(&forecast, &codes, now);
    if config.is_tomorrow_mode() {
        let today = payload.local_date(now);
        payload.select_tomorrow(today);
    }
    let message = payload.to_json().context("Failed to serialize payload")?;

    // Step 4: Publish via MQTT
    info!(
        "Publishing to {}:{}",
        config.mqtt.server, config.mqtt.port
    );
    let publisher = MqttPublisher::from_config(&config.mqtt)?;
    publisher.publish(message).await?;

    info!("Weather data published successfully!");
    Ok(())
}
