use chrono::Local;
use weather_core::{Phase, ViewState, WeatherReport};

pub const LOADING_BANNER: &str = "Loading...";
pub const NOT_FOUND_BANNER: &str = "City Not Found";

/// Renders the current lookup state. Exactly one block per phase.
pub fn render(state: &ViewState) -> String {
    match state.phase() {
        Phase::Idle => String::new(),
        Phase::Loading => LOADING_BANNER.to_string(),
        Phase::Error { message } => message.clone(),
        Phase::NotFound => NOT_FOUND_BANNER.to_string(),
        Phase::Ready(report) => render_report(report),
    }
}

fn render_report(report: &WeatherReport) -> String {
    let units = report.units;
    let observed = report.observed_at.with_timezone(&Local).format("%Y-%m-%d %H:%M");

    [
        format!("{}  {}", report.icon.glyph(), report.icon),
        format!("{}{}", report.temperature, units.temperature_suffix()),
        report.city.clone(),
        report.country.clone(),
        format!("latitude   {}", report.lat),
        format!("longitude  {}", report.lon),
        format!("Humidity   {}%", report.humidity_pct),
        format!("Wind Speed {} {}", report.wind_speed, units.wind_suffix()),
        format!("Observed   {observed}"),
    ]
    .join("\n")
}
