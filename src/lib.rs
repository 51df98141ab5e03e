pub mod cache;
pub mod config;
pub mod logging;
pub mod mqtt;
pub mod openmeteo;
pub mod payload;
pub mod retry;
pub mod weather_codes;
