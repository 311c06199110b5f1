use crate::coords::SurfaceSize;
use crate::input::{InputEvent, InputState};
use crate::window::RuntimeCtx;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by higher layers.
///
/// All callbacks run on the event-loop thread. Work finished elsewhere
/// reaches the app as `Self::Event` through an
/// [`EventProxy`](crate::window::EventProxy).
pub trait App {
    /// Message type posted to the event loop from other threads.
    type Event: 'static;

    /// Called once the surface exists and again whenever its size changes.
    fn on_resize(&mut self, size: SurfaceSize) {
        let _ = size;
    }

    /// Called for every translated input event, after `input` has been updated.
    fn on_input(
        &mut self,
        event: &InputEvent,
        input: &InputState,
        runtime: &mut RuntimeCtx,
    ) -> AppControl {
        let _ = (event, input, runtime);
        AppControl::Continue
    }

    /// Called for every event posted through the proxy, in send order.
    fn on_user_event(&mut self, event: Self::Event, runtime: &mut RuntimeCtx) -> AppControl;

    /// Called once per rendered frame.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
