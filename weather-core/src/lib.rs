//! Core library for the `weather` lookup tool.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather provider and its error taxonomy
//! - The lookup state machine that turns searches into UI phases
//! - Shared domain models (requests, reports, icons)
//!
//! It is used by `weather-cli`, but can also back other front ends.

pub mod config;
pub mod error;
pub mod icon;
pub mod lookup;
pub mod model;
pub mod provider;

pub use config::{Config, ProviderConfig};
pub use error::LookupError;
pub use icon::WeatherIcon;
pub use lookup::{Action, GENERIC_ERROR_MESSAGE, Lookup, Phase, Reaction, RequestId, ViewState};
pub use model::{Units, WeatherReport, WeatherRequest};
pub use provider::{WeatherProvider, provider_from_config};
