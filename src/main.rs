//! ChakraLidar acquisition daemon
//!
//! Connects to the configured lidar, starts acquisition and polls frames,
//! logging detected objects at a fixed update interval until Ctrl-C.

use chakra_lidar::config::AppConfig;
use chakra_lidar::driver::create_factory;
use chakra_lidar::error::{Error, Result};
use chakra_lidar::processing::ScanProcessor;
use chakra_lidar::session::LidarSession;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Parse config path from command line arguments.
///
/// Supports:
/// - `chakra-lidar <path>` (positional)
/// - `chakra-lidar --config <path>` (flag-based)
/// - `chakra-lidar -c <path>` (short flag)
///
/// Defaults to `/etc/chakra.toml` if not specified.
fn parse_config_path() -> String {
    let args: Vec<String> = env::args().collect();

    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }

    if args.len() > 1 && !args[1].starts_with('-') {
        return args[1].clone();
    }

    "/etc/chakra.toml".to_string()
}

fn main() -> Result<()> {
    let config_path = parse_config_path();
    let config = match AppConfig::from_file(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Config {} not usable ({}), falling back to defaults",
                config_path, e
            );
            AppConfig::default()
        }
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!("ChakraLidar v{} starting...", env!("CARGO_PKG_VERSION"));
    log::info!(
        "Lidar: {} backend on {}",
        config.lidar.driver,
        config.lidar.port
    );

    let factory = create_factory(&config.lidar)?;
    let mut session = LidarSession::new(factory);

    if !session.connect(&config.lidar.port) {
        return Err(Error::NotConnected);
    }

    if !session.start_acquisition() {
        session.disconnect();
        return Err(Error::Driver("failed to start acquisition".to_string()));
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    let processor = ScanProcessor::new(config.processing.clone());
    let update_interval = Duration::from_millis(config.acquisition.update_interval_ms);
    let idle_sleep = Duration::from_millis(config.acquisition.idle_sleep_ms);
    let flush_interval = config.acquisition.flush_interval_frames.max(1);

    log::info!("ChakraLidar running. Press Ctrl-C to stop.");

    let mut frame_count: u32 = 0;
    let mut last_update = Instant::now();

    while running.load(Ordering::Relaxed) {
        let frame = session.fetch_frame();
        if frame.is_empty() {
            std::thread::sleep(idle_sleep);
            continue;
        }

        if last_update.elapsed() >= update_interval {
            let points = processor.project_frame(&frame);
            let objects = processor.detect_objects(&points);

            log::info!(
                "Scan: {} measurements, {} points, {} objects",
                frame.len(),
                points.len(),
                objects.len()
            );
            for obj in &objects {
                log::debug!(
                    "Object at bearing {:.1} deg: center ({:.0}, {:.0}) mm, extent {:.0} mm",
                    obj.bearing_deg,
                    obj.center.x,
                    obj.center.y,
                    obj.extent_mm
                );
            }

            last_update = Instant::now();
        } else {
            std::thread::sleep(idle_sleep);
        }

        // Periodically drop buffered stale data so frames stay fresh
        frame_count = frame_count.wrapping_add(1);
        if frame_count % flush_interval == 0 {
            session.flush_input();
        }
    }

    log::info!("Shutting down...");
    session.stop_acquisition();
    session.disconnect();
    log::info!("ChakraLidar stopped");

    Ok(())
}
