//! Entry point for the tour viewer.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tour_viewer::{app::App, config::Config};
use winit::{
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

fn main() -> Result<()> {
    // Initialize logging; default to "info" if RUST_LOG is unset.
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();

    let config = Config::parse();
    log::info!("Starting tour viewer with scene {} ({} device)", config.scene.display(), config.device);

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Tour")
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height))
            .build(&event_loop)?,
    );

    let mut app = App::new(&config, &window)?;

    event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => {
                if !app.handle_event(&event) {
                    match event {
                        WindowEvent::CloseRequested => elwt.exit(),
                        WindowEvent::KeyboardInput { event, .. } => {
                            if event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                                elwt.exit();
                            }
                        }
                        WindowEvent::RedrawRequested => app.frame(&window),
                        _ => {}
                    }
                }
            }
            Event::AboutToWait => {
                window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}
