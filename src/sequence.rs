//! Declaring a chain of procedures up front and running them as one.

use std::fmt;

use crate::{
    config::Config,
    coroutine::{Coroutine, Procedure},
    error::Cancelled,
    yielder::Yield,
};

/// A list of procedures to run one after the other, in a single coroutine.
///
/// Calling one procedure from another works just as well, and is usually what you want. `Sequence` is for when
/// the list is decided somewhere other than where it runs, e.g. a new game that's built up as "intro, then the
/// wizard picker, then the overworld" before anything starts.
///
/// The first part to return an error stops the sequence, and that error is the sequence's.
///
/// ```
/// use thaum::{Config, Sequence};
///
/// let mut game = Sequence::new()
///     .then(|y| y.ticks(3))
///     .wait(2)
///     .then(|y| y.ticks(1))
///     .into_coroutine(&Config::default());
/// assert!(game.complete().is_ok());
/// assert_eq!(game.steps(), 3 + 2 + 1 + 1);
/// ```
pub struct Sequence<E = Cancelled> {
    parts: Vec<Procedure<E>>,
}

impl<E: Send + 'static> Sequence<E> {
    /// An empty sequence, which finishes on its first step.
    pub fn new() -> Self {
        Self { parts: vec![] }
    }

    /// Add a procedure to the end of the sequence.
    pub fn then(self, part: impl FnOnce(&mut Yield) -> Result<(), E> + Send + 'static) -> Self {
        self.then_boxed(Box::new(part))
    }

    /// The same as [`Self::then`], but with an already-boxed procedure.
    pub fn then_boxed(mut self, part: Procedure<E>) -> Self {
        self.parts.push(part);
        self
    }

    /// Add a pause of `ticks` yields.
    pub fn wait(self, ticks: u64) -> Self
    where
        E: From<Cancelled>,
    {
        self.then(move |y| y.ticks(ticks).map_err(E::from))
    }

    /// How many parts there are.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether there are no parts at all.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Merge every part into one procedure, ready to be queued in a [`Director`](crate::Director).
    pub fn into_procedure(self) -> Procedure<E> {
        let parts = self.parts;
        Box::new(move |y| {
            for part in parts {
                part(y)?;
            }
            Ok(())
        })
    }

    /// Make the whole sequence into one coroutine.
    pub fn into_coroutine(self, config: &Config) -> Coroutine<E> {
        Coroutine::boxed(config, self.into_procedure())
    }
}

impl<E: Send + 'static> Default for Sequence<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Sequence<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("parts", &self.parts.len())
            .finish()
    }
}
