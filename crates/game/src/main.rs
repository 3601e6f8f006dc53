//! Petri: click the bacteria growing on a globe before the clock runs out.

mod config;
mod game;
mod hud;
mod palette;
mod scene;

use anyhow::Result;
use config::GameConfig;
use engine_core::Time;
use game::{Game, RoundSettings};
use input::InputState;
use renderer::{Renderer, ShaderSet};
use std::sync::Arc;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

/// Everything that exists once the window is up.
struct GameState {
    window: Arc<Window>,
    renderer: Renderer,
    game: Game,
    input: InputState,
    time: Time,
}

impl GameState {
    async fn new(window: Arc<Window>, config: &GameConfig) -> Result<Self> {
        let shaders = match &config.shader_dir {
            Some(dir) => ShaderSet::with_overrides(dir),
            None => ShaderSet::default(),
        };
        let renderer = Renderer::new(window.clone(), &shaders, config.vsync).await?;
        let (width, height) = renderer.dimensions();

        let cues = audio::load_cues(&config.hit_sound, &config.miss_sound);
        let mut game = Game::new(config, RoundSettings::default(), cues, width, height);
        game.start();

        Ok(Self {
            window,
            renderer,
            game,
            input: InputState::new(),
            time: Time::new(),
        })
    }

    /// Returns true when the app should exit.
    fn handle_window_event(&mut self, event: WindowEvent) -> bool {
        let pointer = match event {
            WindowEvent::CloseRequested => return true,
            WindowEvent::Resized(size) => {
                self.renderer.resize(size);
                let (width, height) = self.renderer.dimensions();
                self.game.resize(width, height);
                None
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input.process_cursor_position((position.x, position.y))
            }
            WindowEvent::MouseInput { state, button, .. } => self.input.process_mouse_button(button, state),
            WindowEvent::CursorLeft { .. } | WindowEvent::Focused(false) => self.input.process_capture_lost(),
            WindowEvent::RedrawRequested => return self.redraw(),
            _ => None,
        };
        if let Some(event) = pointer {
            self.game.handle_pointer(event, &mut self.renderer);
            self.window.request_redraw();
        }
        false
    }

    /// Tick and draw one frame. Returns true on an unrecoverable surface error.
    fn redraw(&mut self) -> bool {
        self.time.update();
        self.game.tick(self.time.delta());

        if let Err(e) = self.renderer.render(&self.game.frame(true)) {
            match e.downcast_ref::<wgpu::SurfaceError>() {
                Some(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => self.renderer.reconfigure(),
                Some(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("Out of GPU memory");
                    return true;
                }
                _ => log::warn!("Render error: {e:#}"),
            }
        }
        self.window.request_redraw();
        false
    }
}

/// Application handler for winit.
struct App {
    config: GameConfig,
    state: Option<GameState>,
}

impl App {
    fn new(config: GameConfig) -> Self {
        Self { config, state: None }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let window_attrs = Window::default_attributes()
            .with_title("Petri")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.window_width,
                self.config.window_height,
            ));

        let window = match event_loop.create_window(window_attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        match pollster::block_on(GameState::new(window.clone(), &self.config)) {
            Ok(s) => {
                self.state = Some(s);
                window.request_redraw();
            }
            Err(e) => {
                log::error!("Failed to initialize game: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Some(state) = &mut self.state {
            if state.handle_window_event(event) {
                log::info!("Final score: {}", state.game.score());
                event_loop.exit();
            }
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Starting Petri");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(GameConfig::load());
    event_loop.run_app(&mut app)?;

    Ok(())
}
