//! A tiny text-mode game, written as coroutines: an intro cutscene, a main menu, a battle, and an end screen.
//!
//! Usage: `thaum-demo [--headless] [--quit] [config.yaml]`. With `--headless`, only the battle runs, as fast as it
//! can. With `--quit`, the pretend player quits from the main menu instead.

use std::{env, process::ExitCode};

use log::{error, info, warn};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use thaum::{Cancelled, Config, Coroutine, Director, Error, Frontend, Response, Runner, Shared, Yield};

/// Why a scene ended, besides just finishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ending {
    Victory,
    Defeat,
    Quit,
    Cancelled,
}

impl From<Cancelled> for Ending {
    fn from(_: Cancelled) -> Self {
        Ending::Cancelled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    NewGame,
    Quit,
}

#[derive(Debug, Default)]
struct World {
    lines: Vec<String>,
    menu_open: bool,
    choice: Option<Choice>,
}

impl World {
    fn say(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }
}

const INTRO: [&str; 4] = [
    "Long ago, the wizards of Arcanus fought for the right to rule it.",
    "Twelve of them remain.",
    "Only one will be Master of Magic.",
    "...",
];

fn intro(world: &Shared<World>, y: &mut Yield) -> Result<(), Ending> {
    for line in INTRO {
        world.with(|w| w.say(line));
        y.ticks(30)?;
    }
    Ok(())
}

fn main_menu(world: &Shared<World>, y: &mut Yield) -> Result<(), Ending> {
    world.with(|w| {
        w.say("[n]ew game   [q]uit");
        w.menu_open = true;
    });
    let picked = y.until_or(600, || world.with(|w| w.choice.is_some()))?;
    let choice = world.with(|w| {
        w.menu_open = false;
        w.choice.take()
    });
    match choice {
        Some(Choice::NewGame) if picked => Ok(()),
        _ => Err(Ending::Quit),
    }
}

fn battle(world: &Shared<World>, rng: &mut SmallRng, y: &mut Yield) -> Result<(), Ending> {
    let (mut hero, mut foe) = (30i32, 24i32);
    world.with(|w| w.say("A pack of hell hounds bars the way!"));
    for round in 1.. {
        let hit = rng.gen_range(2..=8);
        foe -= hit;
        world.with(|w| w.say(format!("round {}: your spearmen deal {} ({} left)", round, hit, foe.max(0))));
        y.ticks(20)?;
        if foe <= 0 {
            return Err(Ending::Victory);
        }

        let bite = rng.gen_range(1..=7);
        hero -= bite;
        world.with(|w| w.say(format!("round {}: the hounds bite for {} ({} left)", round, bite, hero.max(0))));
        y.ticks(20)?;
        if hero <= 0 {
            return Err(Ending::Defeat);
        }
    }
    Err(Ending::Quit)
}

fn end_screen(world: &Shared<World>, ending: Ending, y: &mut Yield) -> Result<(), Ending> {
    let text = match ending {
        Ending::Victory => "The hounds scatter. Arcanus is a little more yours.",
        _ => "Your army is lost. Another wizard will rule Arcanus.",
    };
    world.with(|w| w.say(text));
    y.ticks(90)?;
    Ok(())
}

/// Prints whatever the scenes said, and stands in for a player at the keyboard.
struct Terminal {
    world: Shared<World>,
    printed: usize,
    waited: u64,
    pick: Choice,
}

impl Frontend<Ending> for Terminal {
    fn update(&mut self, _director: &mut Director<Ending>) -> Response {
        let mut world = self.world.borrow();
        if world.menu_open && world.choice.is_none() {
            self.waited += 1;
            if self.waited == 45 {
                info!("player picks {:?}", self.pick);
                world.choice = Some(self.pick);
            }
        }
        Response::Nothing
    }

    fn ended(&mut self, end: &Error<Ending>, director: &mut Director<Ending>) -> Response {
        match end {
            Error::Finished => Response::Nothing,
            Error::Failed(Ending::Quit) => Response::Quit,
            Error::Failed(ending @ (Ending::Victory | Ending::Defeat)) => {
                let (world, ending) = (self.world.clone(), *ending);
                director.queue("end screen", move |y| end_screen(&world, ending, y));
                Response::Nothing
            }
            other => {
                warn!("scene ended unexpectedly: {:?}", other);
                Response::Quit
            }
        }
    }

    fn draw(&mut self) {
        let world = self.world.borrow();
        for line in &world.lines[self.printed..] {
            println!("{}", line);
        }
        self.printed = world.lines.len();
    }
}

fn headless(config: &Config) -> ExitCode {
    let world = Shared::<World>::default();
    let mut rng = SmallRng::from_entropy();
    let mut fight = {
        let world = world.clone();
        Coroutine::with_config(config, move |y| battle(&world, &mut rng, y)).named("battle")
    };
    let outcome = fight.complete();
    for line in &world.borrow().lines {
        println!("{}", line);
    }
    match outcome {
        Err(Error::Failed(ending @ (Ending::Victory | Ending::Defeat))) => {
            info!("battle over after {} steps: {:?}", fight.steps(), ending);
            ExitCode::SUCCESS
        }
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("battle didn't resolve: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut headless_mode = false;
    let mut pick = Choice::NewGame;
    let mut config_path = None;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--headless" => headless_mode = true,
            "--quit" => pick = Choice::Quit,
            _ => config_path = Some(arg),
        }
    }
    let config = match config_path.map(Config::load).transpose() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            error!("couldn't load config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if headless_mode {
        return headless(&config);
    }

    let world = Shared::<World>::default();
    let mut terminal = Terminal {
        world: world.clone(),
        printed: 0,
        waited: 0,
        pick,
    };
    let (w1, w2, w3) = (world.clone(), world.clone(), world);
    let mut rng = SmallRng::from_entropy();
    Runner::new(config)
        .queue("intro", move |y| intro(&w1, y))
        .queue("main menu", move |y| main_menu(&w2, y))
        .queue("battle", move |y| battle(&w3, &mut rng, y))
        .run(&mut terminal);
    ExitCode::SUCCESS
}
