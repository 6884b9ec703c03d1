//! Application entry point for the pine tree viewer.
//!
//! This binary sets up logging and eframe/egui, then delegates all
//! interactive logic and rendering to [`Viewer`] from the `viewer` module.

mod camera;
mod render;
mod viewer;

use viewer::Viewer;

/// Starts the native eframe application.
///
/// Logging goes through `env_logger`; the default level is `info` and can be
/// changed with `RUST_LOG`.
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if eframe fails to create the native window or event loop, or the
///   initial tree cannot be built.
fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let viewer = Viewer::new().map_err(|err| eframe::Error::AppCreation(Box::new(err)))?;
    let options = eframe::NativeOptions::default();

    eframe::run_native(
        "Pine Tree",
        options,
        Box::new(|_cc| {
            // Construct the root app state for the viewer.
            Ok(Box::new(viewer))
        }),
    )
}
