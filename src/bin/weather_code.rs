//! Weather code lookup binary - prints descriptions for weather codes
//!
//! Usage:
//!   cargo run --bin weather-code -- de 45 66     # Translate codes to German
//!   cargo run --bin weather-code -- en 3.0 abc   # Loose input, unknown codes reported
//!   cargo run --bin weather-code -- --list       # Show embedded languages
//!
//! Optional environment variables:
//! - WEATHER_CODE_DIR (read `<lang>.json` tables from this directory)
//! - RUST_LOG (log filter, defaults to weather2mqtt=warn)

use anyhow::{bail, Context, Result};
use weather2mqtt::logging;
use weather2mqtt::weather_codes::{embedded_tables, WeatherCodes};

fn print_usage() {
    eprintln!("Usage: weather-code <language> <code>...");
    eprintln!("       weather-code --list");
}

fn print_languages() {
    for table in embedded_tables() {
        println!("{}  {} ({})", table.code, table.name, table.native_name);
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let rust_log = std::env::var("RUST_LOG").ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(logging::env_filter(rust_log.as_deref(), "weather2mqtt=warn"))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|arg| arg == "--list") {
        print_languages();
        return Ok(());
    }

    let Some((language, codes)) = args.split_first() else {
        print_usage();
        bail!("missing language");
    };
    if codes.is_empty() {
        print_usage();
        bail!("missing weather codes");
    }

    let translator = match std::env::var("WEATHER_CODE_DIR") {
        Ok(dir) => WeatherCodes::from_dir(dir, language),
        Err(_) => WeatherCodes::new(language),
    }
    .context("Failed to load weather code translations")?;

    if translator.fell_back() {
        eprintln!(
            "No complete table for '{}', using '{}'",
            translator.requested_language(),
            translator.language()
        );
    }

    for code in codes {
        println!("{}: {}", code, translator.translate(code.as_str()));
    }
    Ok(())
}
