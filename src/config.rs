use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::log::{
    log_entry::LogOptions,
    log_error::{LogError, Result},
    log_level::{LevelMask, LogLevel},
};

/// Section holding flusher and global level settings.
pub const LOGGING_SECTION: &str = "Logging";
/// Prefix of the sections that each describe one destination, e.g. `[log.app]`.
pub const LOG_SECTION_PREFIX: &str = "log.";

pub const DEFAULT_WRITE_INTERVAL: Duration = Duration::from_millis(2000);
pub const DEFAULT_START_DELAY: Duration = Duration::from_millis(1500);

/// INI-style configuration: `[section]` headers, `key = value` pairs and `#`
/// comments. Keys before the first header are globals.
#[derive(Debug)]
pub struct Config {
    pub globals: HashMap<String, String>,
    pub sections: HashMap<String, HashMap<String, String>>,
}

impl Config {
    /// Reads and parses a configuration file.
    ///
    /// # Errors
    /// Returns [`LogError::Io`] when the file cannot be read.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut globals = HashMap::new();
        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut current_section: Option<String> = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                let name = line[1..line.len() - 1].trim();
                sections.entry(name.to_string()).or_default();
                current_section = Some(name.to_string());
                continue;
            }

            if let Some(pos) = line.find('=') {
                let key = line[..pos].trim().to_string();
                let value = line[pos + 1..].trim().trim_matches('"').to_string();

                match &current_section {
                    None => {
                        globals.insert(key, value);
                    }
                    Some(sec) => {
                        sections.entry(sec.clone()).or_default().insert(key, value);
                    }
                }
            }
        }
        Config { globals, sections }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            globals: HashMap::new(),
            sections: HashMap::new(),
        }
    }

    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|sec| sec.get(key))
            .map(|s| s.as_str())
    }

    #[must_use]
    pub fn get_non_empty(&self, section: &str, key: &str) -> Option<&str> {
        self.get(section, key).filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn get_global(&self, key: &str) -> Option<&str> {
        self.globals.get(key).map(|s| s.as_str())
    }

    #[must_use]
    pub fn get_or_default<'a>(&'a self, section: &str, key: &str, default: &'a str) -> &'a str {
        self.get(section, key)
            .or_else(|| self.get_global(key))
            .unwrap_or(default)
    }

    /// Parses a boolean value (`true/false`, `yes/no`, `on/off`, `1/0`).
    ///
    /// # Errors
    /// Returns [`LogError::Config`] for any other spelling.
    pub fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>> {
        let Some(raw) = self.get_non_empty(section, key) else {
            return Ok(None);
        };
        match raw.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(Some(true)),
            "false" | "no" | "off" | "0" => Ok(Some(false)),
            _ => Err(LogError::Config(format!("[{section}] {key}: not a boolean: {raw}"))),
        }
    }

    /// # Errors
    /// Returns [`LogError::Config`] when the value is not an unsigned integer.
    pub fn get_u64(&self, section: &str, key: &str) -> Result<Option<u64>> {
        self.get_non_empty(section, key)
            .map(|raw| {
                raw.parse::<u64>().map_err(|e| {
                    LogError::Config(format!("[{section}] {key}: {e}: {raw}"))
                })
            })
            .transpose()
    }

    /// # Errors
    /// Returns [`LogError::InvalidLevel`] for an unknown level name.
    pub fn get_level(&self, section: &str, key: &str) -> Result<Option<LogLevel>> {
        self.get_non_empty(section, key)
            .map(str::parse::<LogLevel>)
            .transpose()
    }

    /// Global level mask from `[Logging] max_level`, if set.
    ///
    /// # Errors
    /// Returns [`LogError::InvalidLevel`] for an unknown level name.
    pub fn level_mask(&self) -> Result<Option<LevelMask>> {
        Ok(self
            .get_level(LOGGING_SECTION, "max_level")?
            .map(LevelMask::up_to))
    }

    /// Destinations described by `[log.<name>]` sections, ordered by section name.
    ///
    /// # Errors
    /// Returns [`LogError::Config`] when a section has no `path`, or the error of
    /// any malformed value.
    pub fn log_specs(&self) -> Result<Vec<LogSpec>> {
        let mut names: Vec<&String> = self
            .sections
            .keys()
            .filter(|name| name.starts_with(LOG_SECTION_PREFIX))
            .collect();
        names.sort();

        names
            .into_iter()
            .map(|section| LogSpec::from_section(self, section))
            .collect()
    }
}

/// Timing of the background flusher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlusherConfig {
    /// Pause between drain passes.
    pub write_interval: Duration,
    /// How long `start` blocks after spawning the flusher.
    pub start_delay: Duration,
}

impl Default for FlusherConfig {
    fn default() -> Self {
        Self {
            write_interval: DEFAULT_WRITE_INTERVAL,
            start_delay: DEFAULT_START_DELAY,
        }
    }
}

impl FlusherConfig {
    /// Reads `write_interval_ms` and `start_delay_ms` from `[Logging]`, falling
    /// back to the defaults for missing keys.
    ///
    /// # Errors
    /// Returns [`LogError::Config`] for non-numeric values.
    pub fn from_config(config: &Config) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            write_interval: config
                .get_u64(LOGGING_SECTION, "write_interval_ms")?
                .map_or(defaults.write_interval, Duration::from_millis),
            start_delay: config
                .get_u64(LOGGING_SECTION, "start_delay_ms")?
                .map_or(defaults.start_delay, Duration::from_millis),
        })
    }
}

/// One destination read from a `[log.<name>]` section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogSpec {
    pub section: String,
    pub path: PathBuf,
    pub options: LogOptions,
}

impl LogSpec {
    fn from_section(config: &Config, section: &str) -> Result<Self> {
        let path = config
            .get_non_empty(section, "path")
            .map(expand_path)
            .ok_or_else(|| LogError::Config(format!("[{section}] is missing `path`")))?;

        let defaults = LogOptions::default();
        let options = LogOptions {
            thread_safe: config
                .get_bool(section, "thread_safe")?
                .unwrap_or(defaults.thread_safe),
            append: config.get_bool(section, "append")?.unwrap_or(defaults.append),
            threshold: config
                .get_level(section, "threshold")?
                .unwrap_or(defaults.threshold),
        };

        Ok(Self {
            section: section.to_string(),
            path,
            options,
        })
    }
}

/// Expands tilde (`~`) in file paths to the user's home directory.
fn expand_path(path_str: &str) -> PathBuf {
    if path_str.starts_with('~') {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .ok()
            .map(PathBuf::from);

        if let Some(mut home_path) = home {
            if path_str == "~" {
                return home_path;
            }
            if path_str.starts_with("~/") || path_str.starts_with("~\\") {
                home_path.push(&path_str[2..]);
                return home_path;
            }
        }
    }
    PathBuf::from(path_str)
}
