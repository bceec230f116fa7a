// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Line-oriented command parsing.
//!
//! Each stdin line maps to one dashboard interaction, e.g. `select 800c1b`,
//! `tactical on`, `analytics`, `day 3`, `range 15m` or `theme`.

use radar_client::charts::HistoryRange;
use radar_client::UiCommand;
use thiserror::Error;

/// Result of parsing one input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Command(UiCommand),
    Help,
    Quit,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty line")]
    Empty,

    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("'{command}' needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("invalid {what} '{value}'")]
    InvalidArgument { what: &'static str, value: String },
}

pub const HELP: &str = "\
commands:
  select <hex>          open the flight sidebar
  project <key>         open a project sidebar (adsb, telemetry, cloud)
  close                 close the sidebar
  tactical [on|off]     toggle or set tactical mode
  analytics [close]     open or close the analytics modal
  day <index>           drill into bar <index> of the daily chart
  range <token>         intraday resolution: 5m 15m 3h 24h 7d 14d 30d
  traffic [close]       open or close the traffic modal
  theme                 toggle dark/light
  quit";

/// Parse a single input line.
pub fn parse_line(line: &str) -> Result<Input, CommandError> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Err(CommandError::Empty);
    };
    let argument = words.next();

    let parsed = match command.to_ascii_lowercase().as_str() {
        "help" | "?" => Input::Help,
        "quit" | "exit" | "q" => Input::Quit,
        "select" | "flight" => {
            let hex = argument.ok_or(CommandError::MissingArgument {
                command: "select",
                argument: "a hex id",
            })?;
            Input::Command(UiCommand::SelectFlight(hex.to_string()))
        }
        "project" => {
            let key = argument.ok_or(CommandError::MissingArgument {
                command: "project",
                argument: "a project key",
            })?;
            Input::Command(UiCommand::OpenProject(key.to_ascii_lowercase()))
        }
        "close" => Input::Command(UiCommand::CloseSidebar),
        "tactical" => Input::Command(match argument.map(str::to_ascii_lowercase).as_deref() {
            None => UiCommand::ToggleTactical,
            Some("on") => UiCommand::EnterTactical,
            Some("off") => UiCommand::ExitTactical,
            Some(other) => {
                return Err(CommandError::InvalidArgument {
                    what: "tactical mode",
                    value: other.to_string(),
                })
            }
        }),
        "analytics" => Input::Command(if is_close(argument) {
            UiCommand::CloseAnalytics
        } else {
            UiCommand::OpenAnalytics
        }),
        "traffic" => Input::Command(if is_close(argument) {
            UiCommand::CloseTraffic
        } else {
            UiCommand::OpenTraffic
        }),
        "day" => {
            let value = argument.ok_or(CommandError::MissingArgument {
                command: "day",
                argument: "a bar index",
            })?;
            let index: usize =
                value
                    .parse()
                    .ok()
                    .ok_or_else(|| CommandError::InvalidArgument {
                        what: "bar index",
                        value: value.to_string(),
                    })?;
            Input::Command(UiCommand::SelectDay(index))
        }
        "range" => {
            let value = argument.ok_or(CommandError::MissingArgument {
                command: "range",
                argument: "a resolution token",
            })?;
            let range =
                HistoryRange::from_token(value).ok_or_else(|| CommandError::InvalidArgument {
                    what: "resolution",
                    value: value.to_string(),
                })?;
            Input::Command(UiCommand::SetRange(range))
        }
        "theme" => Input::Command(UiCommand::ToggleTheme),
        _ => return Err(CommandError::Unknown(command.to_string())),
    };

    Ok(parsed)
}

fn is_close(argument: Option<&str>) -> bool {
    argument.is_some_and(|a| a.eq_ignore_ascii_case("close"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(line: &str) -> UiCommand {
        match parse_line(line) {
            Ok(Input::Command(command)) => command,
            other => panic!("expected a command for '{line}', got {other:?}"),
        }
    }

    #[test]
    fn test_sidebar_commands() {
        assert_eq!(
            command("select 800c1b"),
            UiCommand::SelectFlight("800c1b".to_string())
        );
        assert_eq!(
            command("  project ADSB "),
            UiCommand::OpenProject("adsb".to_string())
        );
        assert_eq!(command("close"), UiCommand::CloseSidebar);
    }

    #[test]
    fn test_mode_and_modal_commands() {
        assert_eq!(command("tactical"), UiCommand::ToggleTactical);
        assert_eq!(command("TACTICAL on"), UiCommand::EnterTactical);
        assert_eq!(command("tactical off"), UiCommand::ExitTactical);
        assert_eq!(command("analytics"), UiCommand::OpenAnalytics);
        assert_eq!(command("analytics close"), UiCommand::CloseAnalytics);
        assert_eq!(command("traffic"), UiCommand::OpenTraffic);
        assert_eq!(command("traffic close"), UiCommand::CloseTraffic);
        assert_eq!(command("theme"), UiCommand::ToggleTheme);
    }

    #[test]
    fn test_chart_commands() {
        assert_eq!(command("day 3"), UiCommand::SelectDay(3));
        assert_eq!(
            command("range 15m"),
            UiCommand::SetRange(HistoryRange::FifteenMinutes)
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse_line("   "), Err(CommandError::Empty));
        assert!(matches!(parse_line("launch"), Err(CommandError::Unknown(_))));
        assert!(matches!(
            parse_line("select"),
            Err(CommandError::MissingArgument { .. })
        ));
        assert!(matches!(
            parse_line("day -1"),
            Err(CommandError::InvalidArgument { .. })
        ));
        assert!(matches!(
            parse_line("range 1y"),
            Err(CommandError::InvalidArgument { .. })
        ));
        assert!(matches!(
            parse_line("tactical maybe"),
            Err(CommandError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_help_and_quit() {
        assert_eq!(parse_line("help"), Ok(Input::Help));
        assert_eq!(parse_line("quit"), Ok(Input::Quit));
    }
}
