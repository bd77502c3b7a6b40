use crate::checker::MatchPolicy;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const LOCAL_CONFIG: &str = ".spelladdr.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Spell checker command line. The file path is appended when the
    /// speller reads the file directly.
    #[serde(default = "default_speller")]
    pub speller: Vec<String>,

    /// Markup stripper command line. The file path is always appended.
    #[serde(default = "default_delatex")]
    pub delatex: Vec<String>,

    /// Extensions routed through the markup stripper first.
    #[serde(default = "default_markup_extensions")]
    pub markup_extensions: Vec<String>,

    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    #[serde(default, rename = "match")]
    pub match_policy: MatchPolicy,
}

fn default_speller() -> Vec<String> {
    vec!["9".to_string(), "spell".to_string()]
}

fn default_delatex() -> Vec<String> {
    vec!["9".to_string(), "delatex".to_string()]
}

fn default_markup_extensions() -> Vec<String> {
    vec!["tex".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            speller: default_speller(),
            delatex: default_delatex(),
            markup_extensions: default_markup_extensions(),
            ignore_patterns: Vec::new(),
            match_policy: MatchPolicy::default(),
        }
    }
}

/// Values taken from the command line or the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_file: Option<PathBuf>,
    pub speller: Option<String>,
    pub delatex: Option<String>,
    pub match_policy: Option<MatchPolicy>,
}

impl Config {
    /// Load configuration with priority: CLI args > local config > global config > defaults.
    /// An explicit config file replaces both discovered files.
    pub fn load(overrides: Overrides) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = &overrides.config_file {
            config = config.merge(Self::from_file(path)?);
        } else {
            if let Some(global_path) = Self::global_config_path() {
                if global_path.exists() {
                    let global_config = Self::from_file(&global_path)?;
                    config = config.merge(global_config);
                }
            }

            let local_path = PathBuf::from(LOCAL_CONFIG);
            if local_path.exists() {
                let local_config = Self::from_file(&local_path)?;
                config = config.merge(local_config);
            }
        }

        if let Some(speller) = overrides.speller {
            config.speller = split_command(&speller);
        }
        if let Some(delatex) = overrides.delatex {
            config.delatex = split_command(&delatex);
        }
        if let Some(policy) = overrides.match_policy {
            config.match_policy = policy;
        }

        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn merge(mut self, other: Self) -> Self {
        // Values left at their defaults in `other` do not override `self`.
        if other.speller != default_speller() {
            self.speller = other.speller;
        }
        if other.delatex != default_delatex() {
            self.delatex = other.delatex;
        }
        if other.markup_extensions != default_markup_extensions() {
            self.markup_extensions = other.markup_extensions;
        }
        if !other.ignore_patterns.is_empty() {
            self.ignore_patterns = other.ignore_patterns;
        }
        if other.match_policy != MatchPolicy::default() {
            self.match_policy = other.match_policy;
        }
        self
    }

    pub fn global_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "spelladdr").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// Split a command line on whitespace. No quoting is understood.
pub fn split_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.speller, vec!["9", "spell"]);
        assert_eq!(config.delatex, vec!["9", "delatex"]);
        assert_eq!(config.markup_extensions, vec!["tex"]);
        assert_eq!(config.match_policy, MatchPolicy::Word);
    }

    #[test]
    fn test_merge_configs() {
        let base = Config {
            ignore_patterns: vec!["^x$".to_string()],
            ..Default::default()
        };
        let override_config = Config {
            speller: vec!["aspell".to_string(), "list".to_string()],
            ..Default::default()
        };

        let merged = base.merge(override_config);
        assert_eq!(merged.speller, vec!["aspell", "list"]);
        assert_eq!(merged.delatex, vec!["9", "delatex"]);
        assert_eq!(merged.ignore_patterns, vec!["^x$"]);
    }

    #[test]
    fn test_default_value_in_later_layer_does_not_reset() {
        let global = Config {
            match_policy: MatchPolicy::Substring,
            ..Default::default()
        };
        let local = Config {
            match_policy: MatchPolicy::Word,
            ..Default::default()
        };

        let merged = global.merge(local);
        assert_eq!(merged.match_policy, MatchPolicy::Substring);
    }

    #[test]
    fn test_parse_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "speller = [\"hunspell\", \"-l\"]\nmatch = \"substring\"\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.speller, vec!["hunspell", "-l"]);
        assert_eq!(config.markup_extensions, vec!["tex"]);
        assert_eq!(config.match_policy, MatchPolicy::Substring);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "speller = 3\n").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse config file"));
    }

    #[test]
    fn test_overrides_win_over_explicit_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "speller = [\"hunspell\", \"-l\"]\ndelatex = [\"detex\"]\n").unwrap();

        let config = Config::load(Overrides {
            config_file: Some(path),
            speller: Some("aspell  list".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(config.speller, vec!["aspell", "list"]);
        assert_eq!(config.delatex, vec!["detex"]);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = Config::load(Overrides {
            config_file: Some(PathBuf::from("/nonexistent/spelladdr.toml")),
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_split_command() {
        assert_eq!(split_command(" 9  spell "), vec!["9", "spell"]);
        assert!(split_command("   ").is_empty());
    }
}
