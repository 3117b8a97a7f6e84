//! The task's half of the handshake, and the waiting patterns built on it.

use std::{fmt, ops::ControlFlow};

use crossbeam::channel::{Receiver, Sender};

use crate::error::Cancelled;

/// Lent to a running procedure so it can hand control back to the driver.
///
/// Every call to [`Self::now`] is one tick boundary: the procedure stops there, the driver gets on with its frame,
/// and the procedure picks up right where it was on the next [`Coroutine::step`](crate::Coroutine::step). All the
/// helpers here are built out of `now`, so they suspend exactly where they say they do and nowhere else.
pub struct Yield {
    to_driver: Sender<()>,
    from_driver: Receiver<()>,
    cancelled: bool,
    count: u64,
}

impl Yield {
    pub(crate) fn new(to_driver: Sender<()>, from_driver: Receiver<()>) -> Self {
        Self {
            to_driver,
            from_driver,
            cancelled: false,
            count: 0,
        }
    }

    /// Suspend until the driver's next step.
    ///
    /// Returns [`Cancelled`] if the coroutine was torn down while suspended. After that it keeps returning
    /// `Cancelled` immediately, without waiting for anything, so the procedure can unwind.
    pub fn now(&mut self) -> Result<(), Cancelled> {
        if self.cancelled {
            return Err(Cancelled);
        }
        self.count += 1;
        // the driver only hangs up when the coroutine is cancelled or dropped
        if self.to_driver.send(()).is_err() || self.from_driver.recv().is_err() {
            self.cancelled = true;
            return Err(Cancelled);
        }
        Ok(())
    }

    /// How many times this procedure has yielded so far, counting a yield that got cancelled.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Whether the coroutine has been cancelled, as far as this procedure has noticed.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Yield exactly `n` times.
    pub fn ticks(&mut self, n: u64) -> Result<(), Cancelled> {
        for _ in 0..n {
            self.now()?;
        }
        Ok(())
    }

    /// Yield until `done` returns true. It's checked before each yield, so if it's already true, this doesn't
    /// yield at all.
    pub fn until(&mut self, mut done: impl FnMut() -> bool) -> Result<(), Cancelled> {
        while !done() {
            self.now()?;
        }
        Ok(())
    }

    /// Like [`Self::until`], but give up after `limit` yields. Returns whether `done` ever returned true.
    pub fn until_or(&mut self, limit: u64, mut done: impl FnMut() -> bool) -> Result<bool, Cancelled> {
        for _ in 0..limit {
            if done() {
                return Ok(true);
            }
            self.now()?;
        }
        Ok(done())
    }

    /// Run an animation: for up to `limit` ticks, call `frame` on every `period`th one (starting with the first),
    /// then yield. `frame` can break to stop early. Returns whether it did.
    ///
    /// A `period` of 0 is treated as 1.
    pub fn every(
        &mut self,
        period: u64,
        limit: u64,
        mut frame: impl FnMut() -> ControlFlow<()>,
    ) -> Result<bool, Cancelled> {
        let period = period.max(1);
        for i in 0..limit {
            if i % period == 0 && frame().is_break() {
                return Ok(true);
            }
            self.now()?;
        }
        Ok(false)
    }
}

impl fmt::Debug for Yield {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Yield")
            .field("count", &self.count)
            .field("cancelled", &self.cancelled)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use std::{
        ops::ControlFlow,
        sync::{
            atomic::{AtomicU64, Ordering},
            Arc,
        },
    };

    use crate::{Cancelled, Coroutine, Error};

    fn steps_to_finish<E: Send + 'static>(co: &mut Coroutine<E>) -> u64 {
        let mut steps = 0;
        loop {
            steps += 1;
            match co.step() {
                Ok(()) => continue,
                Err(Error::Finished) => return steps,
                Err(other) => panic!("unexpected end: {}", describe(&other)),
            }
        }
    }

    fn describe<E>(e: &Error<E>) -> &'static str {
        match e {
            Error::Finished => "finished",
            Error::Failed(_) => "failed",
            Error::Cancelled => "cancelled",
            Error::Terminated => "terminated",
            Error::Spawn(_) => "spawn",
        }
    }

    #[test]
    fn ticks_yields_exactly_n() {
        let mut co = Coroutine::new(|y| y.ticks(4));
        assert_eq!(steps_to_finish(&mut co), 5);
    }

    #[test]
    fn until_already_true_never_yields() {
        let mut co = Coroutine::new(|y| y.until(|| true));
        assert_eq!(steps_to_finish(&mut co), 1);
    }

    #[test]
    fn until_polls_once_per_tick() {
        let clicked = Arc::new(AtomicU64::new(0));
        let polls = Arc::new(AtomicU64::new(0));
        let mut co = {
            let (clicked, polls) = (clicked.clone(), polls.clone());
            Coroutine::new(move |y| {
                y.until(|| {
                    polls.fetch_add(1, Ordering::SeqCst);
                    clicked.load(Ordering::SeqCst) > 0
                })
            })
        };
        for _ in 0..3 {
            co.step().unwrap();
        }
        assert_eq!(polls.load(Ordering::SeqCst), 3);
        clicked.store(1, Ordering::SeqCst);
        assert!(co.step().unwrap_err().is_finished());
        assert_eq!(polls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn until_or_times_out() {
        let met = Arc::new(AtomicU64::new(2));
        let mut co = {
            let met = met.clone();
            Coroutine::new(move |y| {
                let clicked = y.until_or(10, || false)?;
                met.store(clicked as u64, Ordering::SeqCst);
                Ok::<_, Cancelled>(())
            })
        };
        assert_eq!(steps_to_finish(&mut co), 11);
        assert_eq!(met.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn until_or_reports_success() {
        let mut co = Coroutine::new(|y| {
            let mut polls = 0;
            let clicked = y.until_or(10, || {
                polls += 1;
                polls == 3
            })?;
            assert!(clicked);
            Ok::<_, Cancelled>(())
        });
        assert_eq!(steps_to_finish(&mut co), 3);
    }

    #[test]
    fn every_calls_frame_on_period() {
        let frames = Arc::new(AtomicU64::new(0));
        let mut co = {
            let frames = frames.clone();
            Coroutine::new(move |y| {
                let stopped = y.every(3, 9, || {
                    frames.fetch_add(1, Ordering::SeqCst);
                    ControlFlow::Continue(())
                })?;
                assert!(!stopped);
                Ok::<_, Cancelled>(())
            })
        };
        assert_eq!(steps_to_finish(&mut co), 10);
        // ticks 0, 3 and 6
        assert_eq!(frames.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn every_stops_when_frame_breaks() {
        let mut co = Coroutine::new(|y| {
            let mut frames = 0;
            let stopped = y.every(2, 100, || {
                frames += 1;
                if frames == 3 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })?;
            assert!(stopped);
            // frames on ticks 0 and 2 continue, tick 4 breaks before yielding
            assert_eq!(y.count(), 4);
            Ok::<_, Cancelled>(())
        });
        assert_eq!(steps_to_finish(&mut co), 5);
    }

    #[test]
    fn count_tracks_yields() {
        let mut co = Coroutine::new(|y| {
            y.ticks(2)?;
            assert_eq!(y.count(), 2);
            y.now()?;
            assert_eq!(y.count(), 3);
            Ok::<_, Cancelled>(())
        });
        assert_eq!(steps_to_finish(&mut co), 4);
    }
}
