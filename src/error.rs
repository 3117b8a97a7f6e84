//! Everything that can end a [`Coroutine`](crate::Coroutine), and everything that can go wrong loading a
//! [`Config`](crate::Config).

use std::io;

use thiserror::Error;

/// Returned by [`Yield`](crate::Yield) once the coroutine it belongs to has been torn down.
///
/// Propagate it with `?`. If your procedure has its own error type, give it a `From<Cancelled>` impl; if it
/// doesn't, just use `Cancelled` as the error type, which is also the default.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[error("coroutine cancelled")]
pub struct Cancelled;

/// Why [`Coroutine::step`](crate::Coroutine::step) didn't just yield.
///
/// Only `Cancelled`, `Terminated` and `Spawn` come from the scheduler itself. `Finished` and `Failed` are the
/// procedure telling you it's done, and `Failed` carries its value back untouched.
#[derive(Error, Debug)]
pub enum Error<E> {
    /// The procedure returned `Ok(())`.
    #[error("coroutine finished")]
    Finished,
    /// The procedure returned an error of its own, e.g. a sentinel saying the battle is over.
    #[error("{0}")]
    Failed(E),
    /// The coroutine was [cancelled](crate::Coroutine::cancel) before its procedure could finish.
    #[error("coroutine cancelled")]
    Cancelled,
    /// The coroutine already reported how it ended, and has nothing left to step.
    #[error("coroutine already terminated")]
    Terminated,
    /// The thread to run the procedure on couldn't be started.
    #[error("couldn't start coroutine thread: {0}")]
    Spawn(#[source] io::Error),
}

impl<E> Error<E> {
    /// Whether the procedure ran to completion without an error.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }

    /// Whether the coroutine was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The procedure's own error, if that's why it ended.
    pub fn failure(&self) -> Option<&E> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Like [`Self::failure`], but by value.
    pub fn into_failure(self) -> Option<E> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Treat [`Error::Finished`] as success, and everything else as an actual error.
    pub fn into_result(self) -> Result<(), Self> {
        match self {
            Self::Finished => Ok(()),
            other => Err(other),
        }
    }
}

/// Something went wrong loading a [`Config`](crate::Config).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("couldn't read config: {0}")]
    Io(#[from] io::Error),
    #[error("malformed config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}
