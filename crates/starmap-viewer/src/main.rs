//! Entry point for the star map viewer.

use anyhow::Result;
use clap::Parser;
use starmap_viewer::{app::App, config::Config};
use std::sync::Arc;
use winit::{
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

fn main() -> Result<()> {
    // Default to "info" if RUST_LOG is unset.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    log::info!(
        "Starting {:?} visualiser in {:?} mode ({:?}).",
        config.visualiser,
        config.mode,
        config.device_class
    );

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.title())
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 800))
            .build(&event_loop)?,
    );

    // Loads the dataset before the loop starts.
    let mut app = pollster::block_on(App::new(window.clone(), config))?;

    event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => {
                if !app.handle_event(&window, &event) {
                    match event {
                        WindowEvent::CloseRequested => elwt.exit(),
                        WindowEvent::KeyboardInput { event, .. } => {
                            if event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                                elwt.exit();
                            }
                        }
                        WindowEvent::RedrawRequested => match app.render(&window) {
                            Ok(_) => {}
                            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                                app.resize_now();
                            }
                            Err(wgpu::SurfaceError::OutOfMemory) => {
                                log::error!("WGPU out of memory, exiting.");
                                elwt.exit();
                            }
                            Err(e) => log::warn!("Render error: {e:?}"),
                        },
                        _ => {}
                    }
                }
            }
            Event::AboutToWait => {
                app.about_to_wait();
                window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}
