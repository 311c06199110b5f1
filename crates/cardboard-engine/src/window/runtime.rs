use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::event::{
    ElementState as WinitElementState, MouseButton as WinitMouseButton,
    TouchPhase as WinitTouchPhase, WindowEvent,
};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Fullscreen, Window, WindowId};

use crate::core::{App as CoreApp, AppControl, FrameCtx, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::input::{
    ElementState, InputEvent, InputState, Key, MouseButton, PointerButtonEvent, PointerMoveEvent,
    TouchPhase,
};
use crate::time::{FrameClock, FrameTime};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    /// Start in borderless fullscreen on the current monitor.
    pub fullscreen: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "cardboard".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            fullscreen: false,
        }
    }
}

/// Runtime context passed to the application.
///
/// Commands are buffered and applied after the current callback returns.
#[derive(Default)]
pub struct RuntimeCtx {
    commands: Vec<Command>,
}

impl RuntimeCtx {
    pub fn set_fullscreen(&mut self, on: bool) {
        self.commands.push(Command::SetFullscreen(on));
    }

    pub fn toggle_fullscreen(&mut self) {
        self.commands.push(Command::ToggleFullscreen);
    }

    pub fn exit(&mut self) {
        self.commands.push(Command::Exit);
    }
}

enum Command {
    SetFullscreen(bool),
    ToggleFullscreen,
    Exit,
}

/// Cloneable handle for posting events to the event loop from any thread.
///
/// Events are delivered to [`CoreApp::on_user_event`] in send order.
pub struct EventProxy<E: 'static> {
    inner: EventLoopProxy<E>,
}

impl<E: 'static> Clone for EventProxy<E> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<E: 'static> EventProxy<E> {
    /// Posts `event`. Returns `false` once the event loop has shut down.
    pub fn send(&self, event: E) -> bool {
        self.inner.send_event(event).is_ok()
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Creates the event loop, builds the app with a proxy into it, and runs
    /// until the app exits or the window closes.
    pub fn run<A, F>(initial: RuntimeConfig, gpu_init: GpuInit, make_app: F) -> Result<()>
    where
        A: CoreApp + 'static,
        F: FnOnce(EventProxy<A::Event>) -> A,
    {
        let event_loop = EventLoop::<A::Event>::with_user_event()
            .build()
            .context("failed to create winit EventLoop")?;

        let proxy = EventProxy { inner: event_loop.create_proxy() };
        let app = make_app(proxy);
        let mut state = AppState::new(initial, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(())
    }
}

#[self_referencing]
struct WindowEntry {
    input_state: InputState,
    clock: FrameClock,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A>
where
    A: CoreApp + 'static,
{
    initial: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    window: Option<WindowEntry>,
    exit_requested: bool,
}

impl<A> AppState<A>
where
    A: CoreApp + 'static,
{
    fn new(initial: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            initial,
            gpu_init,
            app,
            window: None,
            exit_requested: false,
        }
    }

    fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let mut attrs = Window::default_attributes()
            .with_title(self.initial.title.clone())
            .with_inner_size(self.initial.initial_size);
        if self.initial.fullscreen {
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();

        let entry = WindowEntryTryBuilder {
            input_state: InputState::default(),
            clock: FrameClock::default(),
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed for window")?;

        let size = entry.borrow_gpu().size();
        entry.with_window(|w| w.request_redraw());
        self.window = Some(entry);
        self.app.on_resize(size);
        Ok(())
    }

    fn apply_commands(&mut self, event_loop: &ActiveEventLoop, mut ctx: RuntimeCtx) {
        for cmd in ctx.commands.drain(..) {
            match cmd {
                Command::SetFullscreen(on) => {
                    if let Some(entry) = &self.window {
                        entry.with_window(|w| set_fullscreen(w, on));
                    }
                }
                Command::ToggleFullscreen => {
                    if let Some(entry) = &self.window {
                        entry.with_window(|w| set_fullscreen(w, w.fullscreen().is_none()));
                    }
                }
                Command::Exit => self.request_exit(),
            }
        }

        if self.exit_requested {
            event_loop.exit();
        }
    }

    fn resize_to(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        let Some(entry) = self.window.as_mut() else {
            return;
        };
        entry.with_gpu_mut(|gpu| gpu.resize(new_size.into()));
        let size = entry.borrow_gpu().size();
        entry.with_window(|w| w.request_redraw());
        self.app.on_resize(size);
    }
}

impl<A> ApplicationHandler<A::Event> for AppState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop) {
            log::error!("failed to create window: {e:#}");
            self.request_exit();
            event_loop.exit();
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: A::Event) {
        let mut runtime_ctx = RuntimeCtx::default();
        if self.app.on_user_event(event, &mut runtime_ctx) == AppControl::Exit {
            runtime_ctx.exit();
        }
        self.apply_commands(event_loop, runtime_ctx);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Continuous redraw, paced by the vsync present mode.
        event_loop.set_control_flow(ControlFlow::Wait);
        if let Some(entry) = &self.window {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Split borrows to avoid `self` capture inside `ouroboros` closures.
        let (app, window) = (&mut self.app, &mut self.window);

        let Some(entry) = window.as_mut() else {
            return;
        };
        if entry.with_window(|w| w.id()) != window_id {
            return;
        }

        let mut runtime_ctx = RuntimeCtx::default();

        entry.with_mut(|fields| {
            if let Some(ev) = translate_input_event(fields.input_state, &event) {
                fields.input_state.apply_event(&ev);
                if app.on_input(&ev, fields.input_state, &mut runtime_ctx) == AppControl::Exit {
                    runtime_ctx.exit();
                }
            }
        });

        match &event {
            WindowEvent::CloseRequested => {
                self.window = None;
                self.request_exit();
            }

            WindowEvent::Resized(new_size) => self.resize_to(*new_size),

            WindowEvent::ScaleFactorChanged { .. } => {
                let new_size = self.window.as_ref().map(|e| e.with_window(|w| w.inner_size()));
                if let Some(new_size) = new_size {
                    self.resize_to(new_size);
                }
            }

            WindowEvent::RedrawRequested => {
                let mut app_control = AppControl::Continue;

                if let Some(entry) = self.window.as_mut() {
                    let app = &mut self.app;
                    entry.with_mut(|fields| {
                        let ft: FrameTime = fields.clock.tick();

                        let mut ctx = FrameCtx {
                            window: WindowCtx {
                                id: window_id,
                                window: fields.window,
                            },
                            gpu: fields.gpu,
                            input: fields.input_state,
                            time: ft,
                            runtime: &mut runtime_ctx,
                        };

                        app_control = app.on_frame(&mut ctx);
                    });
                }

                if app_control == AppControl::Exit {
                    runtime_ctx.exit();
                }
            }

            _ => {}
        }

        self.apply_commands(event_loop, runtime_ctx);
    }
}

fn set_fullscreen(window: &Window, on: bool) {
    let mode = on.then_some(Fullscreen::Borderless(None));
    log::info!("fullscreen {}", if on { "on" } else { "off" });
    window.set_fullscreen(mode);
}

fn translate_input_event(state: &InputState, event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::Focused(f) => Some(InputEvent::Focused(*f)),

        WindowEvent::CursorLeft { .. } => Some(InputEvent::PointerLeft),

        WindowEvent::CursorMoved { position, .. } => {
            let (x, y) = to_f32(*position);
            Some(InputEvent::PointerMoved(PointerMoveEvent { x, y }))
        }

        WindowEvent::MouseInput { state: st, button, .. } => {
            let (x, y) = state.pointer_pos.unwrap_or((0.0, 0.0));
            Some(InputEvent::PointerButton(PointerButtonEvent {
                button: map_mouse_button(*button),
                state: map_element_state(*st),
                x,
                y,
            }))
        }

        WindowEvent::Touch(touch) => {
            let (x, y) = to_f32(touch.location);
            let phase = match touch.phase {
                WinitTouchPhase::Started => TouchPhase::Started,
                WinitTouchPhase::Moved => TouchPhase::Moved,
                WinitTouchPhase::Ended => TouchPhase::Ended,
                WinitTouchPhase::Cancelled => TouchPhase::Cancelled,
            };
            Some(InputEvent::Touch { id: touch.id, phase, x, y })
        }

        WindowEvent::KeyboardInput { event, .. } => Some(InputEvent::Key {
            key: map_key(event.physical_key),
            state: map_element_state(event.state),
            repeat: event.repeat,
        }),

        _ => None,
    }
}

fn to_f32(pos: PhysicalPosition<f64>) -> (f32, f32) {
    (pos.x as f32, pos.y as f32)
}

fn map_element_state(st: WinitElementState) -> ElementState {
    match st {
        WinitElementState::Pressed => ElementState::Pressed,
        WinitElementState::Released => ElementState::Released,
    }
}

fn map_mouse_button(b: WinitMouseButton) -> MouseButton {
    match b {
        WinitMouseButton::Left => MouseButton::Left,
        WinitMouseButton::Right => MouseButton::Right,
        WinitMouseButton::Middle => MouseButton::Middle,
        WinitMouseButton::Back => MouseButton::Other(3),
        WinitMouseButton::Forward => MouseButton::Other(4),
        WinitMouseButton::Other(v) => MouseButton::Other(v),
    }
}

fn map_key(pk: PhysicalKey) -> Key {
    match pk {
        PhysicalKey::Code(code) => match code {
            KeyCode::Escape => Key::Escape,
            KeyCode::Enter | KeyCode::NumpadEnter => Key::Enter,
            KeyCode::Space => Key::Space,
            KeyCode::F11 => Key::F11,
            other => Key::Unknown(other as u32),
        },

        // NativeKeyCode is not a u32 in winit 0.30; preserve "unknown" without a stable numeric.
        PhysicalKey::Unidentified(_) => Key::Unknown(0),
    }
}
