use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use skycast_core::{AppError, Config, HttpTransport, Transport};
use skycast_offline::OfflineWorker;
use skycast_ui::{
    request_weather_fetch, LookupRequest, TerminalView, Theme, WeatherController,
};
use skycast_weather::WeatherLookup;
use tokio::io::{AsyncBufReadExt, BufReader};

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Search(String),
    Locate,
    ToggleUnit,
    ToggleDarkMode,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_lowercase().as_str() {
            "search" | "s" => Command::Search(rest.to_string()),
            "locate" | "l" => Command::Locate,
            "unit" | "u" => Command::ToggleUnit,
            "dark" | "d" => Command::ToggleDarkMode,
            "help" | "h" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            _ => Command::Unknown(word.to_string()),
        };
        Some(command)
    }
}

fn load_config() -> Config {
    match Config::load_validated() {
        Ok((config, _)) => config,
        Err(e) => {
            tracing::error!("{}", e);
            tracing::warn!("{}", e.user_message());
            Config::default()
        }
    }
}

/// Direct network transport, wrapped by the offline worker when enabled.
fn build_transport(config: &Config) -> Result<Arc<dyn Transport>> {
    let timeout = Duration::from_secs(config.endpoints.timeout_seconds);
    let http = Arc::new(HttpTransport::new(timeout).map_err(AppError::from)?);

    if !config.offline.enabled {
        return Ok(http as Arc<dyn Transport>);
    }

    match OfflineWorker::register(http.clone(), &config.snapshot_db_path(), &config.offline) {
        Ok(worker) => {
            let worker = Arc::new(worker);
            let lifecycle = worker.clone();
            tokio::spawn(async move {
                if let Err(e) = lifecycle.start().await {
                    tracing::warn!("Offline cache not activated: {}", e);
                }
            });
            Ok(worker as Arc<dyn Transport>)
        }
        Err(e) => {
            tracing::warn!("{}", AppError::from(e).user_message());
            Ok(http as Arc<dyn Transport>)
        }
    }
}

fn help_text(unit_label: &str) -> String {
    format!(
        "Commands:\n  \
         search <place>   Look up the weather for a place\n  \
         locate           Use this device's position\n  \
         unit             {}\n  \
         dark             Toggle dark mode\n  \
         help             Show this help\n  \
         quit             Exit",
        unit_label
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    skycast_core::init()?;

    let config = load_config();
    let transport = build_transport(&config)?;
    let lookup = Arc::new(WeatherLookup::from_config(&config, transport));

    let view = TerminalView::new(std::io::stdout(), &config.endpoints.tile_url);
    let mut controller = WeatherController::new(
        view,
        config.ui.temperature_unit,
        Theme::from_dark_mode(config.ui.dark_mode),
    );

    tracing::info!("Skycast started");
    let help = help_text(controller.view().unit_label());
    controller.view_mut().print("Skycast - weather lookup");
    controller.view_mut().print(&help);

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let Some(command) = Command::parse(&line) else { continue };

                match command {
                    Command::Search(query) => {
                        let token = controller.begin_request();
                        let request = LookupRequest::ByName(query);
                        if !request_weather_fetch(&tx, lookup.clone(), token, request) {
                            controller.release(token);
                        }
                    }
                    Command::Locate => {
                        let token = controller.begin_request();
                        let request = LookupRequest::ByDevice;
                        if !request_weather_fetch(&tx, lookup.clone(), token, request) {
                            controller.release(token);
                        }
                    }
                    Command::ToggleUnit => controller.toggle_unit(),
                    Command::ToggleDarkMode => controller.toggle_dark_mode(),
                    Command::Help => {
                        let help = help_text(controller.view().unit_label());
                        controller.view_mut().print(&help);
                    }
                    Command::Quit => break,
                    Command::Unknown(word) => {
                        controller
                            .view_mut()
                            .print(&format!("Unknown command '{}'. Type 'help'.", word));
                    }
                }
            }
            Some(done) = rx.recv() => {
                controller.finish(done.token, done.result);
            }
        }
    }

    tracing::info!("Skycast shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse("search  New York "),
            Some(Command::Search("New York".to_string()))
        );
        assert_eq!(Command::parse("s Paris"), Some(Command::Search("Paris".to_string())));
        assert_eq!(Command::parse("search"), Some(Command::Search(String::new())));
        assert_eq!(Command::parse("LOCATE"), Some(Command::Locate));
        assert_eq!(Command::parse("unit"), Some(Command::ToggleUnit));
        assert_eq!(Command::parse("dark"), Some(Command::ToggleDarkMode));
        assert_eq!(Command::parse("?"), Some(Command::Help));
        assert_eq!(Command::parse("exit"), Some(Command::Quit));
        assert_eq!(
            Command::parse("forecast"),
            Some(Command::Unknown("forecast".to_string()))
        );
        assert_eq!(Command::parse("   "), None);
    }

    #[test]
    fn test_help_names_unit_toggle() {
        assert!(help_text("Switch to °F").contains("Switch to °F"));
    }
}
