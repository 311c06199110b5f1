//! Routes orientation samples, resizes and the permission gesture.

use cardboard_engine::coords::SurfaceSize;

use crate::event::Permission;
use crate::orientation::{head_rotation, OrientationSample};
use crate::rig::StereoRig;
use crate::stereo::StereoRenderer;

/// When the orientation permission gets requested.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum GateMode {
    /// The source needs no permission.
    NotRequired,
    /// Request as soon as the viewer starts.
    OnStartup,
    /// Request on the first user gesture.
    OnGesture,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PermissionState {
    NotRequired,
    AwaitingGesture,
    Requested,
    Granted,
    Denied,
}

impl PermissionState {
    /// Whether samples reach the head frame.
    pub fn accepts_samples(self) -> bool {
        matches!(self, PermissionState::NotRequired | PermissionState::Granted)
    }
}

/// Wires input sources to the rig.
///
/// Methods that may require the caller to issue a permission request return
/// `true` exactly when it should be issued; that happens at most once per
/// session.
#[derive(Debug)]
pub struct InputBinder {
    state: PermissionState,
    startup_request: bool,
}

impl InputBinder {
    pub fn new(mode: GateMode) -> Self {
        let (state, startup_request) = match mode {
            GateMode::NotRequired => (PermissionState::NotRequired, false),
            GateMode::OnStartup => (PermissionState::AwaitingGesture, true),
            GateMode::OnGesture => (PermissionState::AwaitingGesture, false),
        };
        Self { state, startup_request }
    }

    pub fn state(&self) -> PermissionState {
        self.state
    }

    /// Call once at startup. Returns `true` if the request goes out now.
    pub fn start(&mut self) -> bool {
        if self.startup_request && self.state == PermissionState::AwaitingGesture {
            self.startup_request = false;
            self.state = PermissionState::Requested;
            log::debug!("requesting orientation permission at startup");
            return true;
        }
        false
    }

    /// Call for every user gesture. Only the first one while awaiting counts.
    pub fn on_gesture(&mut self) -> bool {
        if self.state != PermissionState::AwaitingGesture || self.startup_request {
            return false;
        }
        self.state = PermissionState::Requested;
        log::debug!("requesting orientation permission after user gesture");
        true
    }

    pub fn on_permission(&mut self, permission: Permission) {
        if self.state != PermissionState::Requested {
            log::debug!("ignoring {permission:?} in state {:?}", self.state);
            return;
        }
        self.state = match permission {
            Permission::Granted => PermissionState::Granted,
            Permission::Denied => PermissionState::Denied,
        };
        match permission {
            Permission::Granted => log::info!("orientation permission granted"),
            Permission::Denied => log::info!("orientation permission denied; head stays fixed"),
        }
    }

    /// Replaces the head rotation if samples are accepted. Returns whether it did.
    pub fn on_sample(&mut self, sample: &OrientationSample, rig: &mut StereoRig) -> bool {
        if !self.state.accepts_samples() {
            return false;
        }
        rig.head.rotation = head_rotation(sample);
        true
    }

    pub fn on_resize(&self, size: SurfaceSize, stereo: &mut StereoRenderer, rig: &mut StereoRig) {
        stereo.resize(size, rig);
    }
}
