//! The [`Coroutine`] itself: a procedure on its own thread, handed control one step at a time.
//!
//! The driver and the procedure pass a single token back and forth over two zero-capacity channels. The driver
//! sends on `resume` and then blocks receiving on `suspended`; the procedure does the opposite inside
//! [`Yield::now`]. Whoever is blocked isn't running, so exactly one side makes progress at any moment. When the
//! procedure returns, its end of `suspended` is dropped, which is how the driver learns it's done.

use std::{fmt, io, mem, panic, thread};

use crossbeam::channel::{self, Receiver, Sender};
use log::{debug, trace, warn};

use crate::{
    config::Config,
    error::{Cancelled, Error},
    yielder::Yield,
};

/// A procedure which can be turned into a [`Coroutine`], boxed so different ones can be stored together.
pub type Procedure<E = Cancelled> = Box<dyn FnOnce(&mut Yield) -> Result<(), E> + Send + 'static>;

/// Where a [`Coroutine`] is in its life.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum State {
    /// Never stepped. The procedure hasn't run at all yet.
    NotStarted,
    /// Stepped at least once, and currently parked at a yield.
    Suspended,
    /// Finished, failed, or cancelled. Can't be stepped any more.
    Terminated,
}

struct Live<E> {
    /// Dropped to cancel.
    resume: Option<Sender<()>>,
    suspended: Receiver<()>,
    thread: thread::JoinHandle<Result<(), E>>,
}

enum Inner<E> {
    Pending(Procedure<E>),
    Live(Live<E>),
    /// Cancelled before it ever ran, and the next step hasn't reported that yet.
    Cancelled,
    Done,
}

/// A sequential procedure which runs one step per [`Self::step`], however deep in its call stack it yields.
///
/// Nothing runs when it's created; the procedure starts on the first step. Each step runs it until its next
/// [`Yield::now`] or until it returns, and doesn't return before then. So from the driver's perspective, a step is
/// just an ordinary blocking call, and from the procedure's, a yield is.
///
/// ```
/// use thaum::{Cancelled, Coroutine};
///
/// let mut intro = Coroutine::new(|y| {
///     for frame in 0..3 {
///         println!("frame {}", frame);
///         y.now()?;
///     }
///     Ok::<_, Cancelled>(())
/// });
/// while intro.step().is_ok() {
///     // draw, poll input, etc.
/// }
/// ```
pub struct Coroutine<E = Cancelled> {
    inner: Inner<E>,
    name: String,
    stack_size: Option<usize>,
    steps: u64,
}

impl<E: Send + 'static> Coroutine<E> {
    /// Prepare a procedure to be run, with the default [`Config`].
    pub fn new(procedure: impl FnOnce(&mut Yield) -> Result<(), E> + Send + 'static) -> Self {
        Self::with_config(&Config::default(), procedure)
    }

    /// Prepare a procedure to be run, with thread settings from the given [`Config`].
    pub fn with_config(
        config: &Config,
        procedure: impl FnOnce(&mut Yield) -> Result<(), E> + Send + 'static,
    ) -> Self {
        Self::boxed(config, Box::new(procedure))
    }

    /// The same as [`Self::with_config`], but with an already-boxed procedure.
    pub fn boxed(config: &Config, procedure: Procedure<E>) -> Self {
        Self {
            inner: Inner::Pending(procedure),
            name: config.thread_name.clone(),
            stack_size: config.stack_size,
            steps: 0,
        }
    }

    /// Give this coroutine a name, for its thread and for logs.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The name of the coroutine.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the coroutine is in its life.
    pub fn state(&self) -> State {
        match &self.inner {
            Inner::Pending(_) => State::NotStarted,
            Inner::Live(Live {
                resume: Some(_), ..
            }) => State::Suspended,
            _ => State::Terminated,
        }
    }

    /// How many steps have actually run the procedure.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Run the procedure until it next yields or returns.
    ///
    /// - `Ok(())`: it yielded, and is waiting for the next step.
    /// - [`Error::Finished`]: it returned `Ok(())`.
    /// - [`Error::Failed`]: it returned an error, which is passed back as-is.
    /// - [`Error::Cancelled`]: it was [cancelled](Self::cancel). If it was in the middle of running, this waits
    ///   for it to unwind first.
    /// - [`Error::Terminated`]: one of the above was already returned, and there's nothing left to run.
    /// - [`Error::Spawn`]: its thread couldn't be started.
    ///
    /// # Panics
    ///
    /// If the procedure panics, the panic is resumed here.
    pub fn step(&mut self) -> Result<(), Error<E>> {
        let live = match mem::replace(&mut self.inner, Inner::Done) {
            Inner::Pending(procedure) => self.spawn(procedure).map_err(Error::Spawn)?,
            Inner::Live(live) => {
                if let Some(resume) = &live.resume {
                    // only fails if the procedure's already returned, which `wait` will report
                    let _ = resume.send(());
                }
                live
            }
            Inner::Cancelled => {
                debug!("coroutine {} was cancelled before it started", self.name);
                return Err(Error::Cancelled);
            }
            Inner::Done => return Err(Error::Terminated),
        };
        self.steps += 1;
        trace!("stepping coroutine {} (step {})", self.name, self.steps);
        self.wait(live)
    }

    /// Step until the coroutine ends, treating [`Error::Finished`] as success.
    ///
    /// Useful when nothing needs to happen between ticks, e.g. headless simulations or tests.
    pub fn complete(&mut self) -> Result<(), Error<E>> {
        loop {
            if let Err(end) = self.step() {
                return end.into_result();
            }
        }
    }

    /// Tear the coroutine down.
    ///
    /// This never blocks. If it hasn't started, the procedure is dropped without ever running. If it's suspended,
    /// its pending [`Yield::now`] returns [`Cancelled`], and the next [`Self::step`] waits for it to unwind and
    /// then returns [`Error::Cancelled`]. Otherwise this does nothing.
    pub fn cancel(&mut self) {
        match mem::replace(&mut self.inner, Inner::Done) {
            Inner::Pending(_) => {
                debug!("cancelling coroutine {} before it started", self.name);
                self.inner = Inner::Cancelled;
            }
            Inner::Live(mut live) => {
                if live.resume.take().is_some() {
                    debug!("cancelling coroutine {}", self.name);
                }
                self.inner = Inner::Live(live);
            }
            other => self.inner = other,
        }
    }

    fn spawn(&self, procedure: Procedure<E>) -> io::Result<Live<E>> {
        let (resume, from_driver) = channel::bounded(0);
        let (to_driver, suspended) = channel::bounded(0);

        let mut builder = thread::Builder::new().name(self.name.clone());
        if let Some(bytes) = self.stack_size {
            builder = builder.stack_size(bytes);
        }
        debug!("starting coroutine {}", self.name);
        let thread = builder.spawn(move || {
            let mut yielder = Yield::new(to_driver, from_driver);
            procedure(&mut yielder)
        })?;

        Ok(Live {
            resume: Some(resume),
            suspended,
            thread,
        })
    }

    fn wait(&mut self, live: Live<E>) -> Result<(), Error<E>> {
        if live.suspended.recv().is_ok() {
            self.inner = Inner::Live(live);
            return Ok(());
        }

        // the procedure is over, one way or another, and dropped its `Yield`
        let cancelled = live.resume.is_none();
        match live.thread.join() {
            Ok(_) if cancelled => {
                debug!("coroutine {} cancelled after {} steps", self.name, self.steps);
                Err(Error::Cancelled)
            }
            Ok(Ok(())) => {
                debug!("coroutine {} finished after {} steps", self.name, self.steps);
                Err(Error::Finished)
            }
            Ok(Err(e)) => {
                debug!("coroutine {} returned an error after {} steps", self.name, self.steps);
                Err(Error::Failed(e))
            }
            Err(payload) => {
                warn!("coroutine {} panicked", self.name);
                panic::resume_unwind(payload)
            }
        }
    }
}

impl<E> Drop for Coroutine<E> {
    fn drop(&mut self) {
        if let Inner::Live(mut live) = mem::replace(&mut self.inner, Inner::Done) {
            live.resume = None;
            trace!("waiting for dropped coroutine {} to unwind", self.name);
            // once cancelled, yields don't send, so this just waits for the procedure to return
            while live.suspended.recv().is_ok() {}
            if live.thread.join().is_err() {
                warn!("coroutine {} panicked while unwinding", self.name);
            }
        }
    }
}

impl<E> fmt::Debug for Coroutine<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.inner {
            Inner::Pending(_) => "NotStarted",
            Inner::Live(Live { resume: Some(_), .. }) => "Suspended",
            Inner::Live(Live { resume: None, .. }) => "Cancelling",
            Inner::Cancelled | Inner::Done => "Terminated",
        };
        f.debug_struct("Coroutine")
            .field("name", &self.name)
            .field("state", &state)
            .field("steps", &self.steps)
            .finish()
    }
}
