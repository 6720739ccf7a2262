use std::{sync::Arc, time::Instant};

use anyhow::Context;
use glam::Vec2;
use imgui::{FontConfig, FontSource};
use imgui_winit_support::WinitPlatform;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, Event, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{ModifiersState, PhysicalKey},
    window::{Window, WindowId},
};

use crate::{
    assets::{AssetLoader, AssetSource, BlobStore},
    config::SandboxConfig,
    decor::Decor,
    editor::{
        input::{map_key_press, move_key, KeyAction},
        EditorSession,
    },
    engine,
    rendering::renderer::Renderer,
    ui::{self, AppCommand, ControlSurface, UiState},
};

const WINDOW_TITLE: &str = "Galaxias";
const PIXELS_PER_WHEEL_STEP: f32 = 50.0;

struct ImguiState {
    context: imgui::Context,
    platform: WinitPlatform,
}

struct App {
    renderer: Option<Renderer>,
    imgui: Option<ImguiState>,
    session: EditorSession,
    loader: AssetLoader,
    blobs: BlobStore,
    decor: Decor,
    surface: ControlSurface,
    ui_state: UiState,
    modifiers: ModifiersState,
    cursor: Vec2,
    orbiting: bool,
    pending: Vec<AppCommand>,
    last_frame: Instant,
}

impl App {
    fn new(config: SandboxConfig) -> Self {
        let mut loader = AssetLoader::new(config.assets.root.clone());
        loader.preload(&config.assets.preload);

        let decor = Decor::generate(&mut rand::thread_rng());
        let surface = ControlSurface::full(&config);

        Self {
            renderer: None,
            imgui: None,
            session: EditorSession::new(config),
            loader,
            blobs: BlobStore::new(),
            decor,
            surface,
            ui_state: UiState::default(),
            modifiers: ModifiersState::empty(),
            cursor: Vec2::ZERO,
            orbiting: false,
            pending: Vec::new(),
            last_frame: Instant::now(),
        }
    }

    fn setup_imgui(window: &Window) -> ImguiState {
        let mut context = imgui::Context::create();
        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(
            context.io_mut(),
            window,
            imgui_winit_support::HiDpiMode::Default,
        );

        let font_size = 14.0;
        context.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                oversample_h: 1,
                pixel_snap_h: true,
                size_pixels: font_size,
                ..Default::default()
            }),
        }]);

        // Disable INI support because it's broken in the published version of imgui
        context.set_ini_filename(None);

        ImguiState { context, platform }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_attributes = Window::default_attributes().with_title(WINDOW_TITLE);
        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .context("Failed to create window")?,
        );

        let mut imgui = Self::setup_imgui(&window);
        let renderer = pollster::block_on(Renderer::new(window, &mut imgui.context))?;

        self.imgui = Some(imgui);
        self.renderer = Some(renderer);

        Ok(())
    }

    fn handle_key(&mut self, event: &KeyEvent, wants_text: bool) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };

        // Releases always go through so a drag can't get stuck
        if event.state == ElementState::Released {
            if let Some(key) = move_key(code) {
                self.session.move_key_up(key);
            }
            return;
        }

        if wants_text {
            return;
        }

        match map_key_press(code, self.modifiers) {
            Some(KeyAction::Move(key, mode)) => {
                self.session.move_key_down(key, mode, Instant::now());
            }
            Some(KeyAction::Command(command)) if !event.repeat => {
                self.session.execute(command);
            }
            Some(KeyAction::Screenshot) if !event.repeat => {
                self.pending.push(AppCommand::Screenshot);
            }
            _ => {}
        }
    }

    fn pick(&mut self) {
        let Some(renderer) = &self.renderer else {
            return;
        };

        if let Some(ray) = self
            .session
            .controls
            .camera
            .screen_ray(self.cursor, renderer.size)
        {
            self.session.click(&ray);
        }
    }

    fn apply(&mut self, command: AppCommand) {
        match command {
            AppCommand::Editor(command) => self.session.execute(command),
            AppCommand::AddModel(name) => {
                self.loader.request(AssetSource::Named(name));
            }
            AppCommand::LoadCustomModel(path) => {
                if let Err(e) = engine::load_custom_model(&mut self.loader, &mut self.blobs, &path)
                {
                    log::error!("{:#}", e);
                    self.ui_state
                        .push_alerts(["Could not load custom model.".to_string()]);
                }
            }
            AppCommand::Screenshot => {
                let Some(renderer) = self.renderer.as_mut() else {
                    return;
                };

                let dir = self.session.config().assets.screenshot_dir.clone();
                if let Err(e) = renderer.capture_screenshot(&self.session, &self.decor, &dir) {
                    log::error!("Screenshot failed: {:#}", e);
                    self.ui_state
                        .push_alerts(["Could not save screenshot.".to_string()]);
                }
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(renderer), Some(imgui)) = (self.renderer.as_mut(), self.imgui.as_mut()) else {
            return;
        };

        let now = Instant::now();
        imgui
            .context
            .io_mut()
            .update_delta_time(now - self.last_frame);
        self.last_frame = now;

        engine::update(&mut self.session, &mut self.loader, now);
        self.ui_state.push_alerts(self.session.take_alerts());

        if let Err(e) = imgui
            .platform
            .prepare_frame(imgui.context.io_mut(), &renderer.window)
        {
            log::error!("Failed to prepare Imgui frame: {}", e);
            return;
        }

        let ui = imgui.context.new_frame();
        let commands = ui::draw(
            ui,
            &self.surface,
            &mut self.ui_state,
            &self.session,
            self.loader.progress(),
        );
        self.pending.extend(commands);

        imgui.platform.prepare_render(ui, &renderer.window);
        let draw_data = imgui.context.render();

        match renderer.render(&self.session, &self.decor, draw_data) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                renderer.resize(renderer.size);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of memory");
                event_loop.exit();
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timeout");
            }
            Err(other) => {
                log::error!("Unexpected error: {:?}", other);
            }
        }

        renderer.window.request_redraw();

        for command in std::mem::take(&mut self.pending) {
            self.apply(command);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }

        if let Err(e) = self.init(event_loop) {
            log::error!("Failed to start: {:#}", e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let (wants_mouse, wants_text) = match (self.imgui.as_mut(), self.renderer.as_ref()) {
            (Some(imgui), Some(renderer)) => {
                imgui.platform.handle_event::<()>(
                    imgui.context.io_mut(),
                    &renderer.window,
                    &Event::WindowEvent {
                        window_id,
                        event: event.clone(),
                    },
                );
                let io = imgui.context.io();
                (io.want_capture_mouse, io.want_text_input)
            }
            _ => (false, false),
        };

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(new_size);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            WindowEvent::Focused(false) => {
                self.session.focus_lost();
                self.orbiting = false;
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.handle_key(&event, wants_text);
            }
            WindowEvent::CursorMoved { position, .. } => {
                let cursor = Vec2::new(position.x as f32, position.y as f32);
                if self.orbiting {
                    self.session.controls.rotate(cursor - self.cursor);
                }
                self.cursor = cursor;
            }
            WindowEvent::MouseInput { state, button, .. } => match (button, state) {
                (MouseButton::Left, ElementState::Pressed) if !wants_mouse => self.pick(),
                (MouseButton::Right, ElementState::Pressed) if !wants_mouse => {
                    self.orbiting = true;
                }
                (MouseButton::Right, ElementState::Released) => self.orbiting = false,
                _ => {}
            },
            WindowEvent::MouseWheel { delta, .. } if !wants_mouse => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => {
                        position.y as f32 / PIXELS_PER_WHEEL_STEP
                    }
                };
                self.session.controls.zoom(steps);
            }
            _ => (),
        }
    }
}

pub async fn run(config: SandboxConfig) -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    Ok(())
}
