// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera operations
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Taking photos and bursts through the capture controller
//! - Printing the gallery photo
//! - Showing the configuration

use shutter::backends::camera::{get_permission_gate, get_service};
use shutter::errors::CameraError;
use shutter::storage::{self, latest_photo};
use shutter::{CaptureController, Config, Message};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// How long to wait for outstanding saves before giving up
const SETTLE_TIMEOUT: Duration = Duration::from_secs(15);

/// List all available cameras
pub fn list_cameras(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let service = get_service(config.backend, config);
    let cameras = service.enumerate_cameras();

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras ({}):", config.backend);
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {} ({})", index, camera.name, camera.facing);
        println!("      Path: {}", camera.path);
        if let Some(driver) = &camera.driver {
            println!("      Driver: {}", driver);
        }
    }

    Ok(())
}

/// Build a controller and wait for permission and bind
fn start_controller(config: Config) -> Result<CaptureController, Box<dyn std::error::Error>> {
    let service = get_service(config.backend, &config);
    if service.enumerate_cameras().is_empty() {
        return Err(CameraError::NoCameraFound.into());
    }
    let gate = get_permission_gate(config.backend);
    let mut controller = CaptureController::new(config, service, gate);
    controller.start();

    if !controller.state().permission.is_granted() {
        return Err(CameraError::PermissionDenied.into());
    }
    if controller.state().bind_failed {
        let reason = controller
            .notice()
            .and_then(|n| n.text.strip_prefix("Camera unavailable: "))
            .unwrap_or("bind failed")
            .to_string();
        return Err(CameraError::BindFailed(reason).into());
    }

    let Some(name) = controller.camera_name() else {
        return Err(CameraError::NotBound.into());
    };
    println!("Using camera: {} ({})", name, controller.state().facing);
    Ok(controller)
}

/// Take a single photo
pub fn take_photo(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let mut controller = start_controller(config)?;
        println!("Flash: {}", controller.state().flash_mode.label());

        controller.sender().send(Message::Capture)?;
        if !controller.settle(SETTLE_TIMEOUT).await {
            return Err("Timed out waiting for the photo".into());
        }

        report(&controller)?;
        match controller.thumbnail() {
            Some(thumb) => println!("Photo saved: {}", thumb.path.display()),
            None => println!("Photo saved to {}", controller.photo_dir().display()),
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

/// Hold the shutter for `duration_ms` (or until Ctrl+C)
pub fn take_burst(config: Config, duration_ms: u64) -> Result<(), Box<dyn std::error::Error>> {
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = Arc::clone(&stop_flag);
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let mut controller = start_controller(config)?;
        let interval = controller.config().burst_interval();
        println!(
            "Burst: holding shutter for {} ms, one photo every {} ms (Ctrl+C to stop early)",
            duration_ms,
            interval.as_millis()
        );

        let tx = controller.sender();
        tx.send(Message::ShutterPressed)?;

        let start = Instant::now();
        let target = Duration::from_millis(duration_ms);
        while start.elapsed() < target {
            if stop_flag.load(Ordering::SeqCst) {
                println!();
                println!("Stopping early...");
                break;
            }
            controller.process_for(Duration::from_millis(50)).await;
            print!("\rCaptured: {}", controller.stats().capture_requests);
            std::io::Write::flush(&mut std::io::stdout())?;
        }
        println!();

        tx.send(Message::ShutterReleased)?;
        if !controller.settle(SETTLE_TIMEOUT).await {
            return Err("Timed out waiting for burst photos".into());
        }

        report(&controller)?;
        if let Some(thumb) = controller.thumbnail() {
            println!("Latest photo: {}", thumb.path.display());
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

/// Print counters; fail if every capture failed
fn report(controller: &CaptureController) -> Result<(), Box<dyn std::error::Error>> {
    let stats = controller.stats();
    println!(
        "Requested: {}  Saved: {}  Failed: {}",
        stats.capture_requests, stats.saved, stats.failures
    );
    if stats.capture_requests > 0 && stats.saved == 0 {
        let reason = controller
            .notice()
            .map(|n| n.text.clone())
            .unwrap_or_else(|| "Photo capture failed".to_string());
        return Err(reason.into());
    }
    Ok(())
}

/// Print the newest photo in the photo directory
pub fn print_latest(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let dir = storage::photo_directory(config);
    match latest_photo(&dir) {
        Some(path) => println!("{}", path.display()),
        None => println!("No photos in {}", dir.display()),
    }
    Ok(())
}

/// Print the effective configuration, optionally saving it
pub fn show_config(
    config: &Config,
    path: Option<&Path>,
    save: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let target = path.map(Path::to_path_buf).or_else(Config::default_path);
    match &target {
        Some(p) => println!("Config file: {}", p.display()),
        None => println!("Config file: (no config directory)"),
    }
    println!("{}", serde_json::to_string_pretty(config)?);

    if save {
        match &target {
            Some(p) => config.save_to(p)?,
            None => config.save()?,
        }
        println!("Saved.");
    }
    Ok(())
}
