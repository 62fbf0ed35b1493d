/// Display icon for a provider condition code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeatherIcon {
    #[default]
    Clear,
    Cloud,
    Drizzle,
    Rain,
    Snow,
}

impl WeatherIcon {
    /// Maps an OpenWeather icon code (`01d`, `10n`, ...) to an icon.
    ///
    /// Codes outside the table, including thunderstorm (`11x`) and mist
    /// (`50x`), fall back to [`WeatherIcon::Clear`].
    pub fn from_code(code: &str) -> Self {
        match code {
            "01d" | "01n" => WeatherIcon::Clear,
            "02d" | "02n" => WeatherIcon::Cloud,
            "03d" | "03n" | "04d" | "04n" => WeatherIcon::Drizzle,
            "09d" | "09n" | "10d" | "10n" => WeatherIcon::Rain,
            "13d" | "13n" => WeatherIcon::Snow,
            _ => WeatherIcon::default(),
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            WeatherIcon::Clear => "☀",
            WeatherIcon::Cloud => "⛅",
            WeatherIcon::Drizzle => "🌦",
            WeatherIcon::Rain => "🌧",
            WeatherIcon::Snow => "❄",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WeatherIcon::Clear => "clear",
            WeatherIcon::Cloud => "cloud",
            WeatherIcon::Drizzle => "drizzle",
            WeatherIcon::Rain => "rain",
            WeatherIcon::Snow => "snow",
        }
    }
}

impl std::fmt::Display for WeatherIcon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_and_night_codes_share_an_icon() {
        let table = [
            ("01", WeatherIcon::Clear),
            ("02", WeatherIcon::Cloud),
            ("03", WeatherIcon::Drizzle),
            ("04", WeatherIcon::Drizzle),
            ("09", WeatherIcon::Rain),
            ("10", WeatherIcon::Rain),
            ("13", WeatherIcon::Snow),
        ];

        for (prefix, expected) in table {
            assert_eq!(WeatherIcon::from_code(&format!("{prefix}d")), expected);
            assert_eq!(WeatherIcon::from_code(&format!("{prefix}n")), expected);
        }
    }

    #[test]
    fn unknown_codes_fall_back_to_clear() {
        for code in ["11d", "50n", "", "01", "bogus"] {
            assert_eq!(WeatherIcon::from_code(code), WeatherIcon::Clear, "code {code:?}");
        }
    }
}
