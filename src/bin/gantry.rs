//! Runs the simulated gantry through a number of pick-and-place sequences:
//!
//! 1. Move above the cube on table A, lower, close the gripper
//! 2. Lift, move above table B, lower, open the gripper
//! 3. Lift and return home
//!
//! Optionally requests a move home partway through each run to exercise the interrupt path.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::anyhow;
use clap::Parser;
use futures::StreamExt;
use log::{info, warn};
use rand::Rng;

use gantry_pick_place::config::GantryConfig;
use gantry_pick_place::control_loop::GantryControlLoop;
use gantry_pick_place::controller::GantryController;
use gantry_pick_place::gantry_hal_mock::GantryHalMock;
use gantry_pick_place::geometry::{GeometryValidator, PositionSlot, TableGeometry};
use gantry_pick_place::position::Position;
use gantry_pick_place::sequence::Phase;

#[derive(Parser, Debug)]
#[clap(name = "gantry")]
struct Opts {
    /// JSON file overriding the default configuration.
    #[clap(short, long)]
    config: Option<PathBuf>,

    #[clap(short = 'n', long, default_value = "1")]
    runs: usize,

    /// Request a move home this long after each sequence starts.
    #[clap(long)]
    move_home_after_ms: Option<u64>,

    /// Pick new cube positions on both tables before every run.
    #[clap(long)]
    random_targets: bool,
}

const MAX_RANDOM_ATTEMPTS: usize = 1000;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opts: Opts = Opts::parse();

    let config = match &opts.config {
        Some(path) => GantryConfig::load(path)?,
        None => GantryConfig::default(),
    };
    let tables = TableGeometry::default();
    let hal = GantryHalMock::new(config.home_position, config.gripper_actuation_ticks);
    let controller = GantryController::new(Box::new(hal), Box::new(tables.clone()), &config)?;
    let gantry = GantryControlLoop::start(controller, config.tick_interval())?;

    for run in 0..opts.runs {
        if opts.random_targets {
            gantry.set_cube_start_position(random_cube_position(&tables, PositionSlot::CubeStart)?).await?;
            gantry.set_cube_destination_position(random_cube_position(&tables, PositionSlot::CubeDestination)?).await?;
        }
        info!("Starting run #{run}");
        run_sequence(&gantry, opts.move_home_after_ms.map(Duration::from_millis)).await?;
    }

    let status = gantry.status();
    info!("Finished at {} with the gripper {}", status.position, if status.gripper_open { "open" } else { "closed" });
    gantry.shutdown().await;
    Ok(())
}

async fn run_sequence(gantry: &GantryControlLoop, move_home_after: Option<Duration>) -> anyhow::Result<()> {
    let mut stream = gantry.status_stream();
    gantry.start_sequence().await?;

    let move_home_timer = tokio::time::sleep(move_home_after.unwrap_or_default());
    tokio::pin!(move_home_timer);
    let mut move_home_sent = move_home_after.is_none();

    // The first snapshot may predate the start command.
    let mut left_home = false;
    let mut last_phase = None;
    loop {
        tokio::select! {
            _ = &mut move_home_timer, if !move_home_sent => {
                warn!("Interrupting sequence, moving home");
                gantry.move_home();
                move_home_sent = true;
            },
            status = stream.next() => {
                let status = status.ok_or_else(|| anyhow!("Status stream ended"))?;
                if last_phase != Some(status.state_machine_state) {
                    info!("{} at {}", status.state_machine_state, status.position);
                    last_phase = Some(status.state_machine_state);
                }
                left_home |= status.state_machine_state != Phase::Home;
                if left_home && status.state_machine_state == Phase::Home {
                    return Ok(());
                }
            },
        }
    }
}

fn random_cube_position(tables: &TableGeometry, slot: PositionSlot) -> anyhow::Result<Position> {
    let table = tables.table_for(slot).ok_or_else(|| anyhow!("No table for {slot:?}"))?;
    let (min_x, min_y, max_x, max_y) = table.bounding_box();
    let mut rng = rand::thread_rng();
    for _ in 0..MAX_RANDOM_ATTEMPTS {
        let candidate = Position::new(rng.gen_range(min_x..max_x), rng.gen_range(min_y..max_y), 0.0);
        if tables.validate(slot, &candidate) {
            return Ok(candidate);
        }
    }
    Err(anyhow!("Could not find a random position for {slot:?}"))
}
