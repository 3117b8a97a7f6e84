//! Runtime knobs for coroutines and the loop that drives them.

use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, util::setters};

/// The slowest tick a [`Config`] accepts. Anything slower is almost certainly a typo.
pub const MAX_TICK_PERIOD: Duration = Duration::from_secs(60 * 60);

/// Settings shared by every [`Coroutine`](crate::Coroutine), [`Director`](crate::Director) and
/// [`Runner`](crate::Runner) built from it.
///
/// Every field has a sensible default, so a config file only needs to mention what it changes:
///
/// ```
/// let config = thaum::Config::from_yaml("tick_rate: 30").unwrap();
/// assert_eq!(config.tick_rate, 30.0);
/// assert_eq!(config.thread_name, thaum::Config::default().thread_name);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How many ticks per second the [`Runner`](crate::Runner) aims for. `0` runs as fast as possible.
    pub tick_rate: f32,
    /// The name given to each coroutine's thread, unless the coroutine is [named](crate::Coroutine::named).
    pub thread_name: String,
    /// Stack size for coroutine threads, in bytes. `None` uses the platform default.
    pub stack_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            thread_name: "thaum-task".into(),
            stack_size: None,
        }
    }
}

impl Config {
    setters! {
        /// Set the [tick rate](field@Self::tick_rate).
        tick_rate(rate: f32) => tick_rate = rate,
        /// Run ticks back to back, without waiting.
        unthrottled => tick_rate = 0.0,
        /// Set the default [thread name](field@Self::thread_name).
        thread_name(name: impl Into<String>) => thread_name = name.into(),
        /// Set the [stack size](field@Self::stack_size) of coroutine threads.
        stack_size(bytes: usize) => stack_size = Some(bytes),
    }

    /// Parse a config from YAML, then [validate](Self::validate) it.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_yaml(&fs::read_to_string(path)?)
    }

    /// Check that the settings make sense together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.tick_rate.is_finite() || self.tick_rate < 0.0 {
            return Err(ConfigError::Invalid("tick_rate must be a non-negative number"));
        }
        if self.tick_rate > 0.0 && !matches!(Self::period_of(self.tick_rate), Some(p) if p <= MAX_TICK_PERIOD) {
            return Err(ConfigError::Invalid("tick_rate is too slow, ticks must be at most an hour apart"));
        }
        if self.thread_name.contains('\0') {
            return Err(ConfigError::Invalid("thread_name can't contain NUL bytes"));
        }
        if self.stack_size == Some(0) {
            return Err(ConfigError::Invalid("stack_size must be more than zero"));
        }
        Ok(())
    }

    /// The time between ticks, or `None` if the runner shouldn't wait at all.
    ///
    /// Never more than [`MAX_TICK_PERIOD`], even if the config wasn't [validated](Self::validate).
    pub fn tick_period(&self) -> Option<Duration> {
        if self.tick_rate > 0.0 {
            Some(Self::period_of(self.tick_rate).map_or(MAX_TICK_PERIOD, |p| p.min(MAX_TICK_PERIOD)))
        } else {
            None
        }
    }

    fn period_of(rate: f32) -> Option<Duration> {
        Duration::try_from_secs_f32(1.0 / rate).ok()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(Config::from_yaml("{}").unwrap(), Config::default());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = Config::from_yaml("thread_name: battle\nstack_size: 65536\n").unwrap();
        assert_eq!(config.thread_name, "battle");
        assert_eq!(config.stack_size, Some(65536));
        assert_eq!(config.tick_rate, Config::default().tick_rate);
    }

    #[test]
    fn negative_tick_rate_rejected() {
        assert!(matches!(
            Config::from_yaml("tick_rate: -1"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn glacial_tick_rate_rejected() {
        assert!(matches!(
            Config::from_yaml("tick_rate: 1e-20"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(Config::default().tick_rate(1.0 / 7200.0).validate().is_err());
        assert!(Config::default().tick_rate(1.0 / 60.0).validate().is_ok());
    }

    #[test]
    fn unvalidated_period_is_capped() {
        let config = Config {
            tick_rate: 1e-20,
            ..Config::default()
        };
        assert_eq!(config.tick_period(), Some(MAX_TICK_PERIOD));
        assert_eq!(Config::default().tick_rate(f32::INFINITY).tick_period(), Some(Duration::ZERO));
    }

    #[test]
    fn zero_stack_rejected() {
        assert!(Config::default().stack_size(0).validate().is_err());
    }

    #[test]
    fn garbage_rejected() {
        assert!(matches!(
            Config::from_yaml("tick_rate: [fast]"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn missing_file_is_io() {
        assert!(matches!(
            Config::load("/definitely/not/a/real/thaum.yaml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn tick_period() {
        assert_eq!(Config::default().unthrottled().tick_period(), None);
        let period = Config::default().tick_rate(4.0).tick_period().unwrap();
        assert_eq!(period, Duration::from_millis(250));
    }
}
