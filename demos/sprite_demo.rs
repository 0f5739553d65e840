//! Animated sprite in a winit window.
//!
//! cargo run --example sprite_demo -- [config.toml]
//!
//! Without a config the stock sheet `assets/fang-idle.png` (4 frames, 250 ms)
//! is used. Escape stops the animation; closing the window exits.

use std::sync::Arc;
use std::time::Instant;

use spriteforge::{FrameLoop, LoopControl, Renderer, SpriteConfig, WgpuBackend};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

struct App {
    config: SpriteConfig,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer<WgpuBackend<Arc<Window>>>>,
    frames: Option<FrameLoop>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title("spriteforge - sprite animation")
            .with_inner_size(PhysicalSize::new(600, 600));
        let window = match event_loop.create_window(window_attributes) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        let created = spriteforge::new_from_window(
            window.clone(),
            (size.width, size.height),
            &self.config,
            ".",
        );
        match created {
            Ok(renderer) => {
                self.renderer = Some(renderer);
                self.frames = Some(FrameLoop::new(Instant::now()));
                window.request_redraw();
            }
            Err(e) => {
                // Init failed: the loop never starts.
                log::error!("Sprite renderer failed to initialize: {e}");
                event_loop.exit();
            }
        }
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(size.width, size.height);
                    renderer.redraw();
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                if let Some(frames) = &self.frames {
                    log::info!("Escape pressed, stopping animation");
                    frames.token().stop();
                }
            }
            WindowEvent::RedrawRequested => {
                if let (Some(window), Some(renderer), Some(frames)) =
                    (&self.window, &mut self.renderer, &mut self.frames)
                {
                    if frames.on_frame(renderer, window, Instant::now()) == LoopControl::Stop {
                        log::info!("Animation stopped on frame {}", renderer.current_frame());
                    }
                }
            }
            _ => {}
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error + 'static>> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => SpriteConfig::load(path)?,
        None => SpriteConfig::default(),
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = App {
        config,
        window: None,
        renderer: None,
        frames: None,
    };
    event_loop.run_app(&mut app)?;
    Ok(())
}
