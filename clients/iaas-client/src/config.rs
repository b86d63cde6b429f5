// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interfaces for parsing client configuration files

use crate::retry::DEFAULT_MAX_ATTEMPTS;
use camino::Utf8Path;
use camino::Utf8PathBuf;
use serde::Deserialize;
use serde::Serialize;
use slog::o;
use slog::Drain;
use thiserror::Error;
use url::Url;

/// Configuration for an API client
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ClientConfig {
    /// Base URL of the service, e.g. `https://iaas.us-phoenix-1.example.com`
    pub endpoint: Url,
    /// Region the endpoint serves; attached to every log record.
    pub region: String,
    /// Retry policy applied to requests that don't carry their own.
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl ClientConfig {
    /// Load a `ClientConfig` from the given TOML file
    pub fn from_file(path: &Utf8Path) -> Result<ClientConfig, LoadError> {
        let file_contents = std::fs::read_to_string(path)
            .map_err(|err| LoadError::Io { path: path.into(), err })?;
        let config_parsed: ClientConfig = toml::from_str(&file_contents)
            .map_err(|err| LoadError::Parse { path: path.into(), err })?;
        Ok(config_parsed)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_interval_ms: 1000,
            max_interval_ms: 30_000,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Critical,
}

impl From<LogLevel> for slog::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => slog::Level::Trace,
            LogLevel::Debug => slog::Level::Debug,
            LogLevel::Info => slog::Level::Info,
            LogLevel::Warn => slog::Level::Warning,
            LogLevel::Error => slog::Level::Error,
            LogLevel::Critical => slog::Level::Critical,
        }
    }
}

/// Where log records go, and which are kept
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum LogConfig {
    StderrTerminal { level: LogLevel },
    File { level: LogLevel, path: Utf8PathBuf },
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig::StderrTerminal { level: LogLevel::Info }
    }
}

impl LogConfig {
    pub fn level(&self) -> LogLevel {
        match self {
            LogConfig::StderrTerminal { level } => *level,
            LogConfig::File { level, .. } => *level,
        }
    }

    /// Builds the root logger described by this configuration.
    ///
    /// `component` is attached to every record.
    pub fn to_logger(&self, component: &str) -> Result<slog::Logger, LogError> {
        match self {
            LogConfig::StderrTerminal { level } => {
                let decorator = slog_term::TermDecorator::new().build();
                let drain =
                    slog_term::FullFormat::new(decorator).build().fuse();
                Ok(async_root(drain, *level, component))
            }
            LogConfig::File { level, path } => {
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|err| LogError { path: path.clone(), err })?;
                let decorator = slog_term::PlainDecorator::new(file);
                let drain =
                    slog_term::FullFormat::new(decorator).build().fuse();
                Ok(async_root(drain, *level, component))
            }
        }
    }
}

fn async_root<D>(drain: D, level: LogLevel, component: &str) -> slog::Logger
where
    D: Drain<Ok = (), Err = slog::Never> + Send + 'static,
{
    let drain = drain.filter_level(level.into()).ignore_res();
    let drain = slog_async::Async::new(drain).build().fuse();
    slog::Logger::root(drain, o!("component" => component.to_owned()))
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("error reading \"{path}\": {err}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("error parsing \"{path}\": {err}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        err: toml::de::Error,
    },
}

#[derive(Debug, Error)]
#[error("error opening log file \"{path}\": {err}")]
pub struct LogError {
    pub path: Utf8PathBuf,
    #[source]
    pub err: std::io::Error,
}
