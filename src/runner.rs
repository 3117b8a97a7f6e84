//! Contains the "main loop": paces ticks, and coordinates the [`Frontend`] with the [`Director`].

use std::{thread, time::Duration};

use log::{debug, info};

use crate::{
    config::Config,
    director::{Director, Tick},
    error::{Cancelled, Error},
    timing::Timer,
    yielder::Yield,
};

/// How a [`Frontend`] can respond to a tick, affecting the whole loop.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Response {
    /// Nothing in particular needs to be done.
    Nothing,
    /// Something visible changed, and the frontend should be drawn again even if no coroutine ran this tick, e.g.
    /// on the last tick before the loop stops for lack of work.
    Redraw,
    /// The loop should exit, e.g. because the window was closed.
    Quit,
}

/// Everything the loop needs from the rendering and input side of the game.
///
/// None of the game logic lives here; that's what coroutines are for. The frontend polls input, draws whatever
/// the coroutines have left in their shared state, and decides what to run next when a coroutine ends.
pub trait Frontend<E> {
    /// Called at the start of every tick, before the active coroutine steps. Poll input here, and queue or
    /// interrupt coroutines as needed.
    fn update(&mut self, director: &mut Director<E>) -> Response;

    /// A coroutine just ended, for the given reason. This is the place to decide what comes next.
    ///
    /// By default, does nothing, and whatever's queued runs next.
    fn ended(&mut self, _end: &Error<E>, _director: &mut Director<E>) -> Response {
        Response::Nothing
    }

    /// Draw the current state. Called after any tick that stepped a coroutine or asked for a [`Response::Redraw`].
    fn draw(&mut self);
}

/// Handles starting up and running the loop.
#[must_use]
pub struct Runner<E = Cancelled> {
    director: Director<E>,
    period: Option<Duration>,
}

impl<E: Send + 'static> Runner<E> {
    /// Prepare a loop, paced and with coroutines configured by `config`.
    pub fn new(config: Config) -> Self {
        Self {
            period: config.tick_period(),
            director: Director::new(config),
        }
    }

    /// Queue a procedure to run once the loop starts, after anything queued already.
    pub fn queue(
        mut self,
        name: impl Into<String>,
        procedure: impl FnOnce(&mut Yield) -> Result<(), E> + Send + 'static,
    ) -> Self {
        self.director.queue(name, procedure);
        self
    }

    /// Direct access to the director, e.g. to queue boxed procedures.
    pub fn director_mut(&mut self) -> &mut Director<E> {
        &mut self.director
    }

    /// Run the loop until the frontend says [`Response::Quit`] or there's nothing left to run.
    ///
    /// Each tick: wait for the tick timer, [`update`](Frontend::update) the frontend, step the active coroutine,
    /// tell the frontend if it [`ended`](Frontend::ended), and [`draw`](Frontend::draw) if anything ran or the
    /// frontend asked for a redraw. A tick with nothing to run is the last one. Returns the director, with
    /// whatever was left in it, primarily for testing purposes.
    pub fn run(self, frontend: &mut impl Frontend<E>) -> Director<E> {
        let Self {
            mut director,
            period,
        } = self;
        let mut timer = period.map(Timer::new);

        info!("starting loop with {} queued", director.pending().count());
        'mainloop: loop {
            if let Some(timer) = &mut timer {
                while !timer.ready() {
                    thread::sleep(timer.remaining().min(Duration::from_millis(2)));
                }
            }

            let mut redraw = match frontend.update(&mut director) {
                Response::Nothing => false,
                Response::Redraw => true,
                Response::Quit => break 'mainloop,
            };

            let idle = match director.tick() {
                Tick::Idle => true,
                Tick::Yielded => {
                    redraw = true;
                    false
                }
                Tick::Ended(end) => {
                    redraw = true;
                    if frontend.ended(&end, &mut director) == Response::Quit {
                        break 'mainloop;
                    }
                    false
                }
            };

            if redraw {
                frontend.draw();
            }
            if idle {
                debug!("nothing left to run");
                break 'mainloop;
            }
        }
        info!("loop stopped after {} ticks", director.ticks());
        director
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Shared;

    #[derive(Debug, PartialEq, Clone)]
    enum Ending {
        Victory,
        Defeat,
        Cancelled,
    }

    impl From<Cancelled> for Ending {
        fn from(_: Cancelled) -> Self {
            Ending::Cancelled
        }
    }

    #[derive(Default)]
    struct Recorder {
        updates: u64,
        draws: u64,
        ends: Vec<Option<Ending>>,
        quit_after: Option<u64>,
        always_redraw: bool,
        follow_victory: bool,
        frames: Shared<Vec<&'static str>>,
    }

    impl Frontend<Ending> for Recorder {
        fn update(&mut self, _director: &mut Director<Ending>) -> Response {
            self.updates += 1;
            match self.quit_after {
                Some(n) if self.updates > n => Response::Quit,
                _ if self.always_redraw => Response::Redraw,
                _ => Response::Nothing,
            }
        }

        fn ended(&mut self, end: &Error<Ending>, director: &mut Director<Ending>) -> Response {
            self.ends.push(end.failure().cloned());
            if self.follow_victory && end.failure() == Some(&Ending::Victory) {
                let frames = self.frames.clone();
                director.queue("victory screen", move |y| {
                    frames.with(|f| f.push("fanfare"));
                    y.now()?;
                    Ok(())
                });
            }
            Response::Nothing
        }

        fn draw(&mut self) {
            self.draws += 1;
        }
    }

    fn battle(
        frames: &Shared<Vec<&'static str>>,
        ending: Ending,
    ) -> impl FnOnce(&mut Yield) -> Result<(), Ending> + Send + 'static {
        let frames = frames.clone();
        move |y: &mut Yield| {
            for _ in 0..3 {
                frames.with(|f| f.push("clash"));
                y.now()?;
            }
            Err(ending)
        }
    }

    #[test]
    fn runs_until_idle() {
        let mut frontend = Recorder::default();
        let director = Runner::new(Config::default().unthrottled())
            .queue("battle", battle(&frontend.frames, Ending::Defeat))
            .run(&mut frontend);
        assert!(director.is_idle());
        // three yields, the ending step, then an idle tick to notice
        assert_eq!(frontend.updates, 5);
        assert_eq!(frontend.draws, 4);
        assert_eq!(frontend.ends, [Some(Ending::Defeat)]);
        assert_eq!(*frontend.frames.borrow(), ["clash"; 3]);
    }

    #[test]
    fn ended_picks_next_task() {
        let mut frontend = Recorder {
            follow_victory: true,
            ..Default::default()
        };
        let frames = frontend.frames.clone();
        let director = Runner::new(Config::default().unthrottled())
            .queue("battle", battle(&frames, Ending::Victory))
            .run(&mut frontend);
        assert!(director.is_idle());
        assert_eq!(frontend.ends, [Some(Ending::Victory), None]);
        assert_eq!(*frames.borrow(), ["clash", "clash", "clash", "fanfare"]);
    }

    #[test]
    fn quit_leaves_task_unfinished() {
        let mut frontend = Recorder {
            quit_after: Some(2),
            ..Default::default()
        };
        let frames = frontend.frames.clone();
        let director = Runner::new(Config::default().unthrottled())
            .queue("battle", battle(&frames, Ending::Victory))
            .queue("credits", |y| y.ticks(10).map_err(Ending::from))
            .run(&mut frontend);
        assert_eq!(frontend.updates, 3);
        assert!(frontend.ends.is_empty());
        assert_eq!(director.active().map(|c| c.steps()), Some(2));
        assert_eq!(director.pending().collect::<Vec<_>>(), ["credits"]);
    }

    #[test]
    fn empty_runner_stops_immediately() {
        let mut frontend = Recorder::default();
        let director = Runner::new(Config::default().unthrottled()).run(&mut frontend);
        assert_eq!(director.ticks(), 0);
        assert_eq!(frontend.updates, 1);
        assert_eq!(frontend.draws, 0);
    }

    #[test]
    fn redraw_draws_idle_tick() {
        let mut frontend = Recorder {
            always_redraw: true,
            ..Default::default()
        };
        let director = Runner::new(Config::default().unthrottled()).run(&mut frontend);
        assert_eq!(director.ticks(), 0);
        assert_eq!(frontend.updates, 1);
        assert_eq!(frontend.draws, 1);

        let mut frontend = Recorder {
            always_redraw: true,
            ..Default::default()
        };
        let frames = frontend.frames.clone();
        Runner::new(Config::default().unthrottled())
            .queue("battle", battle(&frames, Ending::Defeat))
            .run(&mut frontend);
        // one draw per tick, including the idle one at the end
        assert_eq!(frontend.updates, 5);
        assert_eq!(frontend.draws, 5);
    }
}
