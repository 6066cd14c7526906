//! Lane Dash entry point
//!
//! The browser build wires keyboard, a 1 Hz interval and requestAnimationFrame into the
//! simulation. The native build drives a headless session with an autopilot.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;

    use lane_dash::consts::FRAME_DT;
    use lane_dash::persistence::{KeyValueStore, LocalStorageStore, MemoryStore};
    use lane_dash::sim::{
        CollisionEvent, Command, CommandSender, EntityKind, GameEvent, IntentEvent,
    };
    use lane_dash::{Difficulty, Game, Tuning, VehicleKind};

    // Hands each frame to the JS renderer
    #[wasm_bindgen(inline_js = "
        export function publish_frame(json) {
            window.dispatchEvent(new CustomEvent('lane-dash-frame', { detail: json }));
        }
    ")]
    extern "C" {
        fn publish_frame(json: &str);
    }

    thread_local! {
        static SENDER: RefCell<Option<CommandSender>> = const { RefCell::new(None) };
        static HOST: RefCell<Option<Rc<RefCell<Host>>>> = const { RefCell::new(None) };
    }

    /// Game plus frame timing
    struct Host {
        game: Game<Box<dyn KeyValueStore>>,
        last_time: f64,
    }

    /// Contact report from the JS physics layer. `kind` is "obstacle" or "coin".
    #[wasm_bindgen]
    pub fn report_collision(entity_id: u32, kind: &str) {
        let kind = match kind {
            "obstacle" => EntityKind::Obstacle,
            "coin" => EntityKind::Coin,
            _ => EntityKind::Other,
        };
        SENDER.with(|sender| {
            if let Some(sender) = sender.borrow().as_ref() {
                sender.send(Command::Collision(CollisionEvent { entity_id, kind }));
            }
        });
    }

    /// Run `f` against the live game. Returns false before start-up or while a frame is running.
    fn with_host(f: impl FnOnce(&mut Host)) -> bool {
        HOST.with(|slot| {
            let Some(host) = slot.borrow().as_ref().map(Rc::clone) else {
                return false;
            };
            let Ok(mut host) = host.try_borrow_mut() else {
                log::warn!("Game busy, settings change dropped");
                return false;
            };
            f(&mut host);
            true
        })
    }

    /// Car selection screen: "jeep", "wraith" or "mazda"
    #[wasm_bindgen]
    pub fn select_vehicle(name: &str) -> bool {
        let Some(vehicle) = VehicleKind::from_str(name) else {
            log::warn!("Unknown vehicle {name:?}");
            return false;
        };
        with_host(|host| host.game.set_vehicle(vehicle))
    }

    /// "normal" or "hard"
    #[wasm_bindgen]
    pub fn set_difficulty(name: &str) -> bool {
        let Some(difficulty) = Difficulty::from_str(name) else {
            log::warn!("Unknown difficulty {name:?}");
            return false;
        };
        with_host(|host| host.game.set_difficulty(difficulty))
    }

    #[wasm_bindgen]
    pub fn set_show_popups(show: bool) -> bool {
        with_host(|host| host.game.set_show_popups(show))
    }

    fn open_store() -> Box<dyn KeyValueStore> {
        match LocalStorageStore::open() {
            Ok(store) => Box::new(store),
            Err(e) => {
                log::warn!("{e}; high scores will not persist");
                Box::new(MemoryStore::new())
            }
        }
    }

    fn key_down_command(key: &str, repeat: bool) -> Option<Command> {
        let intent = match key.to_lowercase().as_str() {
            "w" | "arrowup" => IntentEvent::ForwardPressed,
            "s" | "arrowdown" => IntentEvent::BackwardPressed,
            // Auto-repeat must not walk across lanes or re-fire boost
            _ if repeat => return None,
            "a" | "arrowleft" => IntentEvent::LaneLeft,
            "d" | "arrowright" => IntentEvent::LaneRight,
            "shift" => IntentEvent::Boost,
            "r" => return Some(Command::Retry),
            _ => return None,
        };
        Some(Command::Intent(intent))
    }

    fn key_up_command(key: &str) -> Option<Command> {
        let intent = match key.to_lowercase().as_str() {
            "w" | "arrowup" => IntentEvent::ForwardReleased,
            "s" | "arrowdown" => IntentEvent::BackwardReleased,
            _ => return None,
        };
        Some(Command::Intent(intent))
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&JsValue::from_str(&e.to_string()));
        }

        log::info!("Lane Dash starting...");

        let Some(window) = web_sys::window() else {
            log::error!("No window");
            return;
        };

        let seed = js_sys::Date::now() as u64;
        let game = Game::new(open_store(), Tuning::default(), seed);
        let sender = game.sender();
        SENDER.with(|slot| *slot.borrow_mut() = Some(sender.clone()));

        setup_keyboard(&window, &sender);
        setup_clock(&window, sender);

        let host = Rc::new(RefCell::new(Host {
            game,
            last_time: 0.0,
        }));
        HOST.with(|slot| *slot.borrow_mut() = Some(Rc::clone(&host)));
        request_animation_frame(host);

        log::info!("Lane Dash running (seed {seed})");
    }

    fn setup_keyboard(window: &web_sys::Window, sender: &CommandSender) {
        {
            let sender = sender.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                if let Some(command) = key_down_command(&event.key(), event.repeat()) {
                    sender.send(command);
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let sender = sender.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                if let Some(command) = key_up_command(&event.key()) {
                    sender.send(command);
                }
            });
            let _ =
                window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Countdown seconds come from a wall-clock interval, not frame time
    fn setup_clock(window: &web_sys::Window, sender: CommandSender) {
        let closure = Closure::<dyn FnMut()>::new(move || {
            sender.send(Command::SecondElapsed);
        });
        if let Err(e) = window.set_interval_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            1000,
        ) {
            log::error!("Failed to start clock: {e:?}");
        }
        closure.forget();
    }

    fn request_animation_frame(host: Rc<RefCell<Host>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(host, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(host: Rc<RefCell<Host>>, time: f64) {
        let frame = {
            let mut h = host.borrow_mut();

            let dt = if h.last_time > 0.0 {
                ((time - h.last_time) / 1000.0) as f32
            } else {
                FRAME_DT
            };
            h.last_time = time;

            for event in h.game.frame(dt) {
                if let GameEvent::GameOver { final_score, rank, .. } = event {
                    log::info!("Final score {final_score} (rank {rank:?}), press R to retry");
                }
            }

            h.game.view_json()
        };

        // Published with the host released so JS listeners can call back in
        match frame {
            Ok(json) => publish_frame(&json),
            Err(e) => log::error!("Failed to serialize frame: {e}"),
        }

        request_animation_frame(host);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::time::{SystemTime, UNIX_EPOCH};

    use lane_dash::consts::{FRAME_DT, LANE_COUNT};
    use lane_dash::persistence::FileStore;
    use lane_dash::sim::{
        BoostState, CollisionEvent, Command, EntityId, GameEvent, GameState, IntentEvent,
        SecondTicker,
    };
    use lane_dash::{Difficulty, Game, Tuning, VehicleKind};

    /// Where the ledger and settings live between runs
    const STORE_DIR: &str = ".lane-dash";
    /// How far ahead the autopilot watches its lane
    const LOOKAHEAD: f32 = 30.0;
    /// Half extents (x, z) for the overlap test
    const CAR_HALF: (f32, f32) = (1.0, 2.0);
    const OBSTACLE_HALF: (f32, f32) = (1.0, 1.0);
    /// Lane changes wait until the car is this close to its lane center
    const SETTLED: f32 = 0.5;

    /// Command line: `[--hard | --normal] [--vehicle=NAME] [SEED] [TUNING.json]`
    struct Options {
        seed: Option<u64>,
        tuning_path: Option<String>,
        difficulty: Option<Difficulty>,
        vehicle: Option<VehicleKind>,
    }

    fn parse_args(args: impl Iterator<Item = String>) -> Options {
        let mut options = Options {
            seed: None,
            tuning_path: None,
            difficulty: None,
            vehicle: None,
        };
        for arg in args {
            if let Some(flag) = arg.strip_prefix("--") {
                if let Some(name) = flag.strip_prefix("vehicle=") {
                    options.vehicle = VehicleKind::from_str(name);
                    if options.vehicle.is_none() {
                        log::warn!("Unknown vehicle {name:?}");
                    }
                } else if let Some(difficulty) = Difficulty::from_str(flag) {
                    options.difficulty = Some(difficulty);
                } else {
                    log::warn!("Ignoring unknown flag {arg}");
                }
            } else if options.seed.is_none() && options.tuning_path.is_none() {
                match arg.parse() {
                    Ok(seed) => options.seed = Some(seed),
                    Err(_) => options.tuning_path = Some(arg),
                }
            } else {
                options.tuning_path = Some(arg);
            }
        }
        options
    }

    pub fn run() {
        let options = parse_args(std::env::args().skip(1));
        let seed = options.seed.unwrap_or_else(clock_seed);
        let tuning = match options.tuning_path {
            Some(path) => match std::fs::read_to_string(&path) {
                Ok(json) => Tuning::from_json_or_default(&json),
                Err(e) => {
                    log::warn!("Could not read tuning {path}: {e}");
                    Tuning::default()
                }
            },
            None => Tuning::default(),
        };

        let mut game = Game::new(FileStore::new(STORE_DIR), tuning, seed);
        if let Some(difficulty) = options.difficulty {
            game.set_difficulty(difficulty);
        }
        if let Some(vehicle) = options.vehicle {
            game.set_vehicle(vehicle);
        }
        log::info!("Saving to {}", game.store().dir().display());
        match game.simulation().high_scores().top_score() {
            Some(best) => log::info!("Score to beat: {best}"),
            None => log::info!("No high scores yet"),
        }

        let sender = game.sender();
        let mut ticker = SecondTicker::default();
        let mut frames = 0u64;

        log::info!("Headless run, seed {seed}");
        sender.send(Command::Intent(IntentEvent::ForwardPressed));

        let (final_score, reason, rank) = loop {
            for _ in 0..ticker.accumulate(FRAME_DT) {
                sender.send(Command::SecondElapsed);
            }

            let state = game.simulation().state();
            for id in overlapping_obstacles(state) {
                sender.send(Command::Collision(CollisionEvent::obstacle(id)));
            }
            if let Some(intent) = autopilot(state) {
                sender.send(Command::Intent(intent));
            }

            frames += 1;
            let mut finished = None;
            for event in game.frame(FRAME_DT) {
                match event {
                    GameEvent::GameOver {
                        final_score,
                        reason,
                        rank,
                    } => finished = Some((final_score, reason, rank)),
                    other => log::debug!("{other:?}"),
                }
            }
            if let Some(result) = finished {
                break result;
            }
        };

        let state = game.simulation().state();
        let settings = game.settings();
        println!(
            "Game over ({reason:?}) after {frames} frames, seed {}, {} on {}",
            state.seed,
            settings.vehicle.profile().name,
            settings.difficulty.as_str()
        );
        println!("  Score:    {final_score}");
        println!("  Coins:    {}", state.stats.coins_collected);
        println!("  Hits:     {}", state.stats.obstacles_hit);
        println!("  Distance: {:.0}", state.vehicle.position.z);
        match rank {
            Some(rank) => println!("  New high score, rank #{rank}"),
            None => println!("  No high score this time"),
        }
        println!("High scores:");
        for (i, score) in game.simulation().high_scores().scores().iter().enumerate() {
            println!("  {}. {score}", i + 1);
        }
    }

    fn clock_seed() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    /// Stand-in for a physics engine: box overlap on the ground plane
    fn overlapping_obstacles(state: &GameState) -> Vec<EntityId> {
        let car = state.vehicle.position;
        state
            .track
            .obstacles
            .iter()
            .filter(|o| {
                (o.position.x - car.x).abs() < CAR_HALF.0 + OBSTACLE_HALF.0
                    && (o.position.z - car.z).abs() < CAR_HALF.1 + OBSTACLE_HALF.1
            })
            .map(|o| o.id)
            .collect()
    }

    fn lane_of(state: &GameState, x: f32) -> Option<usize> {
        state
            .lanes
            .offsets()
            .iter()
            .position(|offset| (offset - x).abs() < SETTLED)
    }

    fn lane_blocked(state: &GameState, lane: usize, distance: f32) -> bool {
        let z = state.vehicle.position.z;
        state.track.obstacles.iter().any(|o| {
            let ahead = o.position.z - z;
            lane_of(state, o.position.x) == Some(lane) && ahead > -CAR_HALF.1 && ahead < distance
        })
    }

    fn coin_ahead(state: &GameState, lane: usize) -> bool {
        let z = state.vehicle.position.z;
        state.track.live_coins().any(|c| {
            let ahead = c.position.z - z;
            lane_of(state, c.position.x) == Some(lane) && ahead > 0.0 && ahead < LOOKAHEAD
        })
    }

    fn toward(from: usize, to: usize) -> IntentEvent {
        if to < from {
            IntentEvent::LaneLeft
        } else {
            IntentEvent::LaneRight
        }
    }

    /// Dodge obstacles, chase coins, boost on open road
    fn autopilot(state: &GameState) -> Option<IntentEvent> {
        let car = &state.vehicle;
        if (car.position.x - state.lanes.offset(car.lane)).abs() > SETTLED {
            return None;
        }

        let neighbors = [
            car.lane.checked_sub(1),
            Some(car.lane + 1).filter(|&l| l < LANE_COUNT),
        ];

        if lane_blocked(state, car.lane, LOOKAHEAD) {
            return neighbors
                .into_iter()
                .flatten()
                .find(|&lane| !lane_blocked(state, lane, LOOKAHEAD))
                .map(|lane| toward(car.lane, lane));
        }

        if !coin_ahead(state, car.lane) {
            let target = neighbors.into_iter().flatten().find(|&lane| {
                coin_ahead(state, lane) && !lane_blocked(state, lane, LOOKAHEAD)
            });
            if let Some(lane) = target {
                return Some(toward(car.lane, lane));
            }
        }

        let cruising = car.speed > state.tuning.max_speed * 0.8;
        if cruising
            && state.boost.state() == BoostState::Ready
            && !lane_blocked(state, car.lane, LOOKAHEAD * 2.0)
        {
            return Some(IntentEvent::Boost);
        }

        None
    }

}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Lane Dash (native) starting...");
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
