//! Application-level configuration loading, including passcode generation and
//! the banks of team name ideas and locked-round teasers.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use rand::{Rng, rng, seq::IndexedRandom};
use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "TRIVIA_NIGHT_CONFIG_PATH";

/// Characters eligible for generated passcodes. Ambiguous glyphs (0/O, 1/I,
/// 5/S, 8/B) are left out so codes survive being read aloud in a noisy room.
const PASSCODE_ALPHABET: &str = "ABCDEFGHJKLMNPQRTUVWXYZ2346789";
const PASSCODE_LENGTH: usize = 10;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    passcode_alphabet: Vec<char>,
    passcode_length: usize,
    team_name_ideas: Vec<String>,
    teasers: Vec<String>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// baked-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration from file");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Generate a fresh passcode from the configured alphabet.
    pub fn new_passcode(&self) -> String {
        let mut generator = rng();
        (0..self.passcode_length)
            .map(|_| self.passcode_alphabet[generator.random_range(0..self.passcode_alphabet.len())])
            .collect()
    }

    /// Pick a random team name suggestion to seed the registration form.
    pub fn team_name_idea(&self) -> &str {
        self.team_name_ideas
            .choose(&mut rng())
            .map(String::as_str)
            .unwrap_or("The Unnamed")
    }

    /// Teaser line shown in place of a locked round's title. Stable per
    /// position so a board does not reshuffle on refresh.
    pub fn teaser_for(&self, order: u32) -> &str {
        if self.teasers.is_empty() {
            return "???";
        }
        let index = (order as usize).saturating_sub(1) % self.teasers.len();
        &self.teasers[index]
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            passcode_alphabet: PASSCODE_ALPHABET.chars().collect(),
            passcode_length: PASSCODE_LENGTH,
            team_name_ideas: default_team_name_ideas(),
            teasers: default_teasers(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    passcode_alphabet: Option<String>,
    #[serde(default)]
    passcode_length: Option<usize>,
    #[serde(default)]
    team_name_ideas: Vec<String>,
    #[serde(default)]
    teasers: Vec<String>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        let passcode_alphabet = value
            .passcode_alphabet
            .filter(|alphabet| !alphabet.is_empty())
            .map(|alphabet| alphabet.chars().collect())
            .unwrap_or(defaults.passcode_alphabet);
        let passcode_length = value
            .passcode_length
            .filter(|length| *length > 0)
            .unwrap_or(defaults.passcode_length);
        let team_name_ideas = if value.team_name_ideas.is_empty() {
            defaults.team_name_ideas
        } else {
            value.team_name_ideas
        };
        let teasers = if value.teasers.is_empty() {
            defaults.teasers
        } else {
            value.teasers
        };
        Self {
            passcode_alphabet,
            passcode_length,
            team_name_ideas,
            teasers,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in team name suggestions shipped with the binary.
fn default_team_name_ideas() -> Vec<String> {
    [
        "Les Quizerables",
        "The Smartinis",
        "Quizzards of Oz",
        "Sharp As A Bowling Ball",
        "E For Effort",
        "The Uncalled Four",
        "Agatha Quiztie",
        "Trivia Newton-John",
        "The Know-It-Ales",
        "Gin Will Fix It",
        "Risky Quizness",
        "Spanish In-Quiz-Ition",
    ]
    .into_iter()
    .map(str::to_owned)
    .collect()
}

/// Built-in teaser lines for locked rounds.
fn default_teasers() -> Vec<String> {
    [
        "A round shrouded in secrecy",
        "Questions yet to be revealed",
        "Patience, this one is still sealed",
        "The host is keeping this one close",
        "All will become clear in time",
        "No peeking",
    ]
    .into_iter()
    .map(str::to_owned)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passcodes_use_only_the_configured_alphabet() {
        let config = AppConfig::default();
        let passcode = config.new_passcode();
        assert_eq!(passcode.len(), PASSCODE_LENGTH);
        assert!(passcode.chars().all(|c| PASSCODE_ALPHABET.contains(c)));
    }

    #[test]
    fn teasers_are_stable_per_position() {
        let config = AppConfig::default();
        assert_eq!(config.teaser_for(3), config.teaser_for(3));
        // Positions wrap around the bank rather than running out.
        let count = default_teasers().len() as u32;
        assert_eq!(config.teaser_for(1), config.teaser_for(1 + count));
    }
}
