//! The driver's side of the contract: one active coroutine, stepped once per tick, and what comes after it.

use std::{collections::VecDeque, fmt};

use log::{debug, info};

use crate::{
    config::Config,
    coroutine::{Coroutine, Procedure},
    error::{Cancelled, Error},
    yielder::Yield,
};

/// What happened on one [`Director::tick`].
#[derive(Debug)]
pub enum Tick<E> {
    /// There was nothing to run.
    Idle,
    /// The active coroutine yielded, and will carry on next tick.
    Yielded,
    /// The active coroutine ended, and was discarded. The next queued one, if any, starts next tick.
    Ended(Error<E>),
}

impl<E> Tick<E> {
    /// Whether the tick ended a coroutine.
    pub fn is_ended(&self) -> bool {
        matches!(self, Self::Ended(_))
    }
}

/// Owns the currently active coroutine, and a queue of procedures to run once it's done.
///
/// This is what a render loop holds on to: call [`Self::tick`] once per frame. Only one coroutine is ever stepped
/// per tick, so the game state it touches only ever has one writer besides the loop itself.
///
/// Queued procedures aren't made into coroutines until they become active, so queueing is cheap and nothing in
/// the queue runs early.
pub struct Director<E = Cancelled> {
    config: Config,
    active: Option<Coroutine<E>>,
    upcoming: VecDeque<(String, Procedure<E>)>,
    ticks: u64,
}

impl<E: Send + 'static> Director<E> {
    /// An idle director, making coroutines according to `config`.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            active: None,
            upcoming: VecDeque::new(),
            ticks: 0,
        }
    }

    /// The config coroutines are made with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Queue a procedure to run after everything already queued.
    pub fn queue(
        &mut self,
        name: impl Into<String>,
        procedure: impl FnOnce(&mut Yield) -> Result<(), E> + Send + 'static,
    ) -> &mut Self {
        self.queue_boxed(name, Box::new(procedure))
    }

    /// The same as [`Self::queue`], but with an already-boxed procedure.
    pub fn queue_boxed(&mut self, name: impl Into<String>, procedure: Procedure<E>) -> &mut Self {
        let name = name.into();
        debug!("queued {} ({} waiting)", name, self.upcoming.len() + 1);
        self.upcoming.push_back((name, procedure));
        self
    }

    /// Cancel the active coroutine, if any, and start `procedure` in its place on the next tick. The queue is left
    /// as it is.
    ///
    /// The old coroutine is dropped here, which waits for it to unwind. So its cleanup is finished before the new
    /// one ever runs.
    pub fn interrupt(
        &mut self,
        name: impl Into<String>,
        procedure: impl FnOnce(&mut Yield) -> Result<(), E> + Send + 'static,
    ) -> &mut Self {
        let name = name.into();
        if let Some(old) = self.active.take() {
            info!("{} interrupted by {}", old.name(), name);
        }
        self.active = Some(Coroutine::with_config(&self.config, procedure).named(name));
        self
    }

    /// Cancel the active coroutine, waiting for it to unwind, and forget everything queued.
    pub fn clear(&mut self) {
        if let Some(old) = self.active.take() {
            debug!("clearing {} and {} queued", old.name(), self.upcoming.len());
        }
        self.upcoming.clear();
    }

    /// Whether there's nothing active and nothing queued.
    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.upcoming.is_empty()
    }

    /// The coroutine currently being stepped, if there is one.
    pub fn active(&self) -> Option<&Coroutine<E>> {
        self.active.as_ref()
    }

    /// The names of everything waiting to run, in order.
    pub fn pending(&self) -> impl Iterator<Item = &str> + '_ {
        self.upcoming.iter().map(|(name, _)| name.as_str())
    }

    /// How many ticks have stepped a coroutine.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Step the active coroutine once, activating the next queued one first if nothing's active.
    pub fn tick(&mut self) -> Tick<E> {
        if self.active.is_none() {
            match self.upcoming.pop_front() {
                Some((name, procedure)) => {
                    debug!("activating {}", name);
                    self.active = Some(Coroutine::boxed(&self.config, procedure).named(name));
                }
                None => return Tick::Idle,
            }
        }
        let Some(active) = self.active.as_mut() else {
            return Tick::Idle;
        };

        self.ticks += 1;
        match active.step() {
            Ok(()) => Tick::Yielded,
            Err(end) => {
                info!("{} ended after {} steps: {}", active.name(), active.steps(), describe(&end));
                self.active = None;
                Tick::Ended(end)
            }
        }
    }
}

fn describe<E>(end: &Error<E>) -> &'static str {
    match end {
        Error::Finished => "finished",
        Error::Failed(_) => "returned an error",
        Error::Cancelled => "cancelled",
        Error::Terminated => "already terminated",
        Error::Spawn(_) => "couldn't start",
    }
}

impl<E: Send + 'static> Default for Director<E> {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl<E> fmt::Debug for Director<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Director")
            .field("active", &self.active)
            .field("upcoming", &self.upcoming.len())
            .field("ticks", &self.ticks)
            .finish()
    }
}
