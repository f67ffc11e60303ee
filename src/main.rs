use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use matrix_silhouette::camera::open_camera;
use matrix_silhouette::cli::{list_cameras, Args, Command};
use matrix_silhouette::config::Settings;
use matrix_silhouette::event_loop::{install_ctrlc_handler, FrameDriver, Stages, StopSignal};
use matrix_silhouette::terminal::{terminal_size, CrosstermScreen};
use matrix_silhouette::Result;

fn run(settings: Settings) -> Result<()> {
    settings.validate()?;

    let cells = match settings.resolution {
        Some(_) => (0, 0),
        None => terminal_size()?,
    };
    let resolution = settings.resolve_resolution(cells);
    let grid = settings.grid(resolution)?;
    log::info!(
        "Display {} with {}px cells: {}x{} grid at {} ticks/s",
        resolution,
        settings.cell_size,
        grid.cols,
        grid.rows,
        settings.tick_rate
    );

    // The camera must be streaming before the terminal is taken over.
    let camera = open_camera(settings.camera_settings(resolution))?;

    let stop = StopSignal::new();
    if let Err(e) = install_ctrlc_handler(stop.clone()) {
        log::warn!("Could not set up Ctrl+C handler: {}", e);
    }

    let mut rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    // Anything that can fail is built before the terminal is taken over.
    let stages = Stages::new(&settings, grid, &mut rng)?;
    let screen = CrosstermScreen::enter()?;
    let mut driver = FrameDriver::from_stages(camera, screen, stages, settings.tick_interval())
        .with_stop_signal(stop);
    let result = driver.run();

    let (camera, screen) = driver.into_parts();
    let restored = screen.restore();
    drop(camera);

    let stats = result?;
    restored?;
    log::info!(
        "Stopped after {} ticks ({} rendered, {} skipped, {} without edges)",
        stats.ticks,
        stats.rendered,
        stats.skipped,
        stats.degenerate
    );
    Ok(())
}

fn main() {
    let args = Args::parse();

    if let Some(Command::ListCameras) = args.command {
        if let Err(e) = list_cameras(args.backend.into()) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        return;
    }

    if let Err(e) = run(args.into_settings()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
