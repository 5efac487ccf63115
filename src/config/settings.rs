use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration settings for the application.
///
/// Includes settings for the client identity, the engine's worker loops and logging.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    pub client: ClientSettings,
    pub engine: EngineSettings,
    pub log: LogSettings,
}

/// Who the client is and which broker it talks to.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ClientSettings {
    pub name: String,
    pub host: String,
    pub port: u16,
    /// Topic the chat front-end joins at startup.
    pub topic: String,
}

/// Timing knobs for the pusher and puller loops.
///
/// All values are milliseconds. A `poll_timeout_ms` of zero means the puller
/// waits on the broker's long poll without a limit.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct EngineSettings {
    pub connect_timeout_ms: u64,
    pub response_timeout_ms: u64,
    pub poll_timeout_ms: u64,
    pub idle_delay_ms: u64,
    pub shutdown_grace_ms: u64,
    pub backoff: BackoffSettings,
}

/// Reconnection backoff for both workers.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BackoffSettings {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
    /// Consecutive failures between warnings.
    pub warn_after: u32,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LogSettings {
    pub level: String,
}

impl EngineSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms.max(1))
    }

    pub fn response_timeout(&self) -> Option<Duration> {
        non_zero_millis(self.response_timeout_ms)
    }

    pub fn poll_timeout(&self) -> Option<Duration> {
        non_zero_millis(self.poll_timeout_ms)
    }

    pub fn idle_delay(&self) -> Duration {
        Duration::from_millis(self.idle_delay_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

fn non_zero_millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize, Default)]
pub struct PartialSettings {
    pub client: Option<PartialClientSettings>,
    pub engine: Option<PartialEngineSettings>,
    pub log: Option<PartialLogSettings>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialClientSettings {
    pub name: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub topic: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialEngineSettings {
    pub connect_timeout_ms: Option<u64>,
    pub response_timeout_ms: Option<u64>,
    pub poll_timeout_ms: Option<u64>,
    pub idle_delay_ms: Option<u64>,
    pub shutdown_grace_ms: Option<u64>,
    pub backoff: Option<PartialBackoffSettings>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialBackoffSettings {
    pub initial_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
    pub multiplier: Option<f64>,
    pub warn_after: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialLogSettings {
    pub level: Option<String>,
}

/// Name used when none is configured: the login user, or a random id.
pub fn default_client_name() -> String {
    std::env::var("USER")
        .ok()
        .filter(|u| !u.is_empty() && !u.contains(char::is_whitespace) && !u.contains('/'))
        .unwrap_or_else(|| format!("client-{}", uuid::Uuid::new_v4()))
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            name: default_client_name(),
            host: "localhost".to_string(),
            port: 9621,
            topic: "general".to_string(),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 5_000,
            response_timeout_ms: 10_000,
            poll_timeout_ms: 0,
            idle_delay_ms: 100,
            shutdown_grace_ms: 2_000,
            backoff: BackoffSettings::default(),
        }
    }
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self {
            initial_delay_ms: 50,
            max_delay_ms: 5_000,
            multiplier: 2.0,
            warn_after: 10,
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Provides default values for `Settings`.
impl Default for Settings {
    fn default() -> Self {
        Self {
            client: ClientSettings::default(),
            engine: EngineSettings::default(),
            log: LogSettings::default(),
        }
    }
}

impl PartialSettings {
    /// Fills every missing value from `default`.
    pub fn merge(self, default: Settings) -> Settings {
        let client = self.client.unwrap_or_default();
        let engine = self.engine.unwrap_or_default();
        let backoff = engine.backoff.unwrap_or_default();
        let log = self.log.unwrap_or_default();
        let d_engine = default.engine;

        Settings {
            client: ClientSettings {
                name: client.name.unwrap_or(default.client.name),
                host: client.host.unwrap_or(default.client.host),
                port: client.port.unwrap_or(default.client.port),
                topic: client.topic.unwrap_or(default.client.topic),
            },
            engine: EngineSettings {
                connect_timeout_ms: engine
                    .connect_timeout_ms
                    .unwrap_or(d_engine.connect_timeout_ms),
                response_timeout_ms: engine
                    .response_timeout_ms
                    .unwrap_or(d_engine.response_timeout_ms),
                poll_timeout_ms: engine.poll_timeout_ms.unwrap_or(d_engine.poll_timeout_ms),
                idle_delay_ms: engine.idle_delay_ms.unwrap_or(d_engine.idle_delay_ms),
                shutdown_grace_ms: engine
                    .shutdown_grace_ms
                    .unwrap_or(d_engine.shutdown_grace_ms),
                backoff: BackoffSettings {
                    initial_delay_ms: backoff
                        .initial_delay_ms
                        .unwrap_or(d_engine.backoff.initial_delay_ms),
                    max_delay_ms: backoff
                        .max_delay_ms
                        .unwrap_or(d_engine.backoff.max_delay_ms),
                    multiplier: backoff.multiplier.unwrap_or(d_engine.backoff.multiplier),
                    warn_after: backoff.warn_after.unwrap_or(d_engine.backoff.warn_after),
                },
            },
            log: LogSettings {
                level: log.level.unwrap_or(default.log.level),
            },
        }
    }
}
