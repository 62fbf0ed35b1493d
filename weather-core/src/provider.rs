use crate::{
    Config, LookupError, WeatherReport, WeatherRequest, provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// Source of current conditions for a city.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_weather(
        &self,
        request: &WeatherRequest,
    ) -> Result<WeatherReport, LookupError>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.api_key()?;
    let provider =
        OpenWeatherProvider::new(api_key.to_owned(), config.units, &config.openweather)?;

    Ok(Arc::new(provider))
}
