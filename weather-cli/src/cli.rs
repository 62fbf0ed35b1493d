use std::future::Future;

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{CustomUserError, InquireError, Password, Select, Text, validator::Validation};
use tracing::info;
use weather_core::{Config, Lookup, Reaction, Units, ViewState, provider_from_config};

use crate::display;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Look up current weather by city")]
pub struct Cli {
    /// OpenWeather API key; overrides the configured one.
    #[arg(long, global = true, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Unit system: metric, imperial or standard.
    #[arg(long, global = true, value_parser = parse_units)]
    pub units: Option<Units>,

    /// Defaults to `interactive`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key, default city and units.
    Configure,

    /// Show current weather for a city.
    Show {
        /// City name, sent to the provider as typed.
        city: String,
    },

    /// Search repeatedly, starting with the default city.
    Interactive {
        /// City to look up first instead of the configured default.
        #[arg(long)]
        city: Option<String>,
    },
}

/// One answer from the search prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchInput {
    Search(String),
    Quit,
}

fn parse_units(value: &str) -> Result<Units, String> {
    Units::try_from(value).map_err(|e| e.to_string())
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let command = self.command.unwrap_or(Command::Interactive { city: None });

        match command {
            Command::Configure => tokio::task::spawn_blocking(configure)
                .await
                .context("Configuration prompt task failed")?,
            Command::Show { city } => {
                let config = Config::load()?.with_overrides(self.api_key, self.units);
                show(&config, city).await
            }
            Command::Interactive { city } => {
                let config = Config::load()?.with_overrides(self.api_key, self.units);
                interactive(&config, city).await
            }
        }
    }
}

async fn show(config: &Config, city: String) -> anyhow::Result<()> {
    let provider = provider_from_config(config)?;
    let mut lookup = Lookup::new(provider, city);

    lookup.submit();
    lookup.settle().await;
    println!("{}", display::render(lookup.state()));

    Ok(())
}

async fn interactive(config: &Config, city: Option<String>) -> anyhow::Result<()> {
    let provider = provider_from_config(config)?;
    let start = city.unwrap_or_else(|| config.default_city().to_string());
    let mut lookup = Lookup::new(provider, start);

    search_loop(&mut lookup, prompt_search, |state| {
        println!("{}\n", display::render(state));
    })
    .await
}

/// Reads the next search on a blocking thread so lookups keep settling.
async fn prompt_search(current: String) -> anyhow::Result<SearchInput> {
    let answer = tokio::task::spawn_blocking(move || {
        Text::new("Search City")
            .with_initial_value(&current)
            .prompt()
    })
    .await
    .context("Search prompt task failed")?;

    match answer {
        Ok(text) => Ok(SearchInput::Search(text)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
            Ok(SearchInput::Quit)
        }
        Err(err) => Err(err).context("Failed to read search input"),
    }
}

/// Looks up the starting query, then keeps the prompt open while lookups run.
///
/// Every answer starts a new search right away; a response from an older
/// search that arrives afterwards is dropped by the lookup state.
async fn search_loop<P, F>(
    lookup: &mut Lookup,
    mut prompt: P,
    mut draw: impl FnMut(&ViewState),
) -> anyhow::Result<()>
where
    P: FnMut(String) -> F,
    F: Future<Output = anyhow::Result<SearchInput>>,
{
    lookup.submit();
    draw(lookup.state());

    let mut next_input = Box::pin(prompt(lookup.state().query().to_string()));

    loop {
        tokio::select! {
            input = &mut next_input => match input? {
                SearchInput::Quit => return Ok(()),
                SearchInput::Search(text) => {
                    lookup.set_query(text);
                    lookup.submit();
                    draw(lookup.state());
                    next_input = Box::pin(prompt(lookup.state().query().to_string()));
                }
            },
            reaction = lookup.settle_next() => {
                if reaction == Reaction::Updated {
                    draw(lookup.state());
                }
            }
        }
    }
}

fn validate_api_key(input: &str) -> Result<Validation, CustomUserError> {
    if input.trim().is_empty() {
        Ok(Validation::Invalid("API key must not be empty".into()))
    } else {
        Ok(Validation::Valid)
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_validator(validate_api_key)
        .with_help_message("Get one at https://openweathermap.org/api")
        .prompt()
        .context("Failed to read API key")?;

    let default_city = Text::new("Default city:")
        .with_default(config.default_city())
        .prompt()
        .context("Failed to read default city")?;

    let options = vec![Units::Metric, Units::Imperial, Units::Standard];
    let start = options.iter().position(|u| *u == config.units).unwrap_or(0);
    let units = Select::new("Units:", options)
        .with_starting_cursor(start)
        .prompt()
        .context("Failed to read units")?;

    config.set_api_key(api_key.trim().to_string());
    config.default_city = Some(default_city);
    config.units = units;

    let path = config.save()?;
    info!(path = %path.display(), "Configuration saved");
    println!("Configuration saved to {}", path.display());

    Ok(())
}
