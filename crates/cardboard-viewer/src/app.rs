use tokio::runtime::Handle;

use cardboard_engine::coords::SurfaceSize;
use cardboard_engine::core::{App, AppControl, FrameCtx};
use cardboard_engine::input::{ElementState, InputEvent, InputState, Key};
use cardboard_engine::paint::Color;
use cardboard_engine::window::{EventProxy, RuntimeCtx};

use crate::assets::AssetLoader;
use crate::config::{SensorKind, ViewerConfig};
use crate::event::{Permission, ViewerEvent};
use crate::input::{GateMode, InputBinder};
use crate::rig::StereoRig;
use crate::scene::{IconRequest, Scene};
use crate::sensor::{spawn_udp, PointerSensor};
use crate::stereo::StereoRenderer;

/// The stereo marker viewer.
///
/// Owns all scene and rig state; runs entirely on the event-loop thread.
/// Background work goes to `tasks` and comes back as [`ViewerEvent`]s.
pub struct ViewerApp {
    config: ViewerConfig,
    tasks: Handle,
    proxy: EventProxy<ViewerEvent>,
    loader: Option<AssetLoader>,

    rig: StereoRig,
    scene: Scene,
    stereo: StereoRenderer,
    binder: InputBinder,
    pointer: Option<PointerSensor>,
}

impl ViewerApp {
    /// Builds the static scene and starts the font load and, unless it waits
    /// for a gesture, the sensor.
    pub fn new(config: ViewerConfig, tasks: Handle, proxy: EventProxy<ViewerEvent>) -> Self {
        let rig = StereoRig::new(&config.rig);
        let scene = Scene::new(rig.camera_distance());

        let mode = match (config.sensor.kind, config.sensor.require_gesture) {
            (SensorKind::None, _) => GateMode::NotRequired,
            (_, true) => GateMode::OnGesture,
            (_, false) => GateMode::OnStartup,
        };
        let pointer = (config.sensor.kind == SensorKind::Pointer).then(PointerSensor::new);

        let loader = match AssetLoader::new(config.assets.clone()) {
            Ok(loader) => Some(loader),
            Err(e) => {
                log::warn!("asset loading disabled: {e}");
                None
            }
        };

        let mut app = Self {
            config,
            tasks,
            proxy,
            loader,
            rig,
            scene,
            stereo: StereoRenderer::new(),
            binder: InputBinder::new(mode),
            pointer,
        };

        log::info!(
            "viewer starting: sensor {:?}, permission {:?}",
            app.config.sensor.kind,
            app.binder.state()
        );

        app.spawn_font_load();
        if app.binder.start() {
            app.request_permission();
        }
        app
    }

    fn spawn_font_load(&self) {
        let Some(loader) = self.loader.clone() else {
            return;
        };
        let proxy = self.proxy.clone();
        self.tasks.spawn(async move {
            let result = loader.load_font().await;
            proxy.send(ViewerEvent::FontLoaded(result));
        });
    }

    fn spawn_icon_load(&self, request: IconRequest) {
        let Some(loader) = self.loader.clone() else {
            return;
        };
        let proxy = self.proxy.clone();
        self.tasks.spawn(async move {
            let result = loader.load_icon(request.icon).await;
            proxy.send(ViewerEvent::IconLoaded { marker: request.marker, result });
        });
    }

    fn request_permission(&mut self) {
        match self.config.sensor.kind {
            SensorKind::Udp => {
                spawn_udp(&self.tasks, self.config.sensor.bind.clone(), self.proxy.clone())
            }
            SensorKind::Pointer => self.binder.on_permission(Permission::Granted),
            SensorKind::None => {}
        }
    }

    fn on_pointer_moved(&mut self, x: f32, y: f32) {
        let Some(sample) = self.pointer.and_then(|p| p.sample_at(x, y)) else {
            return;
        };
        self.binder.on_sample(&sample, &mut self.rig);
    }
}

impl App for ViewerApp {
    type Event = ViewerEvent;

    fn on_resize(&mut self, size: SurfaceSize) {
        self.binder.on_resize(size, &mut self.stereo, &mut self.rig);
        if let Some(pointer) = self.pointer.as_mut() {
            pointer.resize(size);
        }
    }

    fn on_input(
        &mut self,
        event: &InputEvent,
        _input: &InputState,
        runtime: &mut RuntimeCtx,
    ) -> AppControl {
        if event.is_user_gesture() && self.binder.on_gesture() {
            self.request_permission();
        }
        if let Some((x, y)) = event.pointer_position() {
            self.on_pointer_moved(x, y);
        }

        match *event {
            InputEvent::Key { key: Key::Escape, state: ElementState::Pressed, .. } => {
                log::info!("escape pressed; exiting");
                return AppControl::Exit;
            }
            InputEvent::Key { key: Key::F11, state: ElementState::Pressed, repeat: false } => {
                runtime.toggle_fullscreen();
            }
            _ => {}
        }

        AppControl::Continue
    }

    fn on_user_event(&mut self, event: ViewerEvent, _runtime: &mut RuntimeCtx) -> AppControl {
        match event {
            ViewerEvent::FontLoaded(Ok(font)) => {
                log::info!("font loaded; placing labels");
                for request in self.scene.apply_font(&font) {
                    self.spawn_icon_load(request);
                }
            }
            ViewerEvent::FontLoaded(Err(e)) => {
                log::warn!("font unavailable, markers stay empty: {e}");
            }
            ViewerEvent::IconLoaded { marker, result: Ok(raster) } => {
                self.scene.place_icon(marker, raster);
                log::debug!(
                    "{} of {} markers resolved",
                    self.scene.resolved_count(),
                    self.scene.markers().len()
                );
            }
            ViewerEvent::IconLoaded { marker, result: Err(e) } => {
                log::warn!("icon for marker {marker} unavailable: {e}");
            }
            ViewerEvent::PermissionResolved(permission) => self.binder.on_permission(permission),
            ViewerEvent::Orientation(sample) => {
                self.binder.on_sample(&sample, &mut self.rig);
            }
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        self.stereo.queue_uploads(self.scene.take_pending_uploads());
        let frame = self.stereo.plan(&self.rig, &self.scene);
        self.stereo.log_pose(ctx.time.now, &self.rig.head);

        let stereo = &mut self.stereo;
        ctx.render(Color::BLACK, |rctx, target| stereo.render(rctx, target, &frame))
    }
}
