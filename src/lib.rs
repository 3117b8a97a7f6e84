//! thaum lets game logic that naturally reads as a long, blocking sequence be written as exactly that, while a
//! render loop that must never block calls it one frame at a time. Think of an intro cutscene, a menu waiting for
//! a click, or a battle playing out turn by turn.
//!
//! # Architecture
//!
//! The core is the [`Coroutine`]. You give it a procedure, an ordinary `FnOnce(&mut Yield) -> Result<(), E>`, and
//! every time the procedure calls [`Yield::now`], it stops there until the driver calls [`Coroutine::step`] again.
//! Locals, loop counters, nested calls: all of it is just still there when it resumes, because it's a real call
//! stack on a real thread. The driver and the procedure strictly take turns, so they never run at the same time.
//!
//! Procedures compose by calling each other and passing the `&mut Yield` along. Nothing special is needed; a
//! yield deep inside a nested call suspends the whole chain. [`Sequence`] exists for when the chain is decided
//! somewhere other than where it runs.
//!
//! On the driver side, a [`Director`] holds the one active coroutine plus a queue of what comes next, and steps
//! it once per [`Director::tick`]. A [`Runner`] wraps that in a paced loop with a [`Frontend`], which is where
//! input polling and drawing live. State that both sides touch goes in a [`Shared`].
//!
//! # How things end
//!
//! A step returns `Ok(())` as long as the procedure is alive, and an [`Error`] once it's not:
//!
//! - [`Error::Finished`] or [`Error::Failed`] when the procedure returns. `Failed` carries the procedure's own
//!   error back exactly as it was, which is how a procedure says *why* it stopped ("the player quit", "the battle
//!   is over") as opposed to just stopping.
//! - [`Error::Cancelled`] when the coroutine was [cancelled](Coroutine::cancel). The procedure sees this as its
//!   pending yield returning [`Cancelled`], and should propagate it with `?` so it unwinds promptly.
//! - [`Error::Terminated`] if you step it again afterwards.
//!
//! # Features
//!
//! - `demo`: builds the `thaum-demo` binary, a tiny text-mode Master of Magic-style game loop.

mod util;

mod config;
mod coroutine;
mod director;
mod error;
mod runner;
mod sequence;
mod shared;
mod timing;
mod yielder;

pub use crate::{
    config::{Config, MAX_TICK_PERIOD},
    coroutine::{Coroutine, Procedure, State},
    director::{Director, Tick},
    error::{Cancelled, ConfigError, Error},
    runner::{Frontend, Response, Runner},
    sequence::Sequence,
    shared::Shared,
    timing::Timer,
    yielder::Yield,
};
