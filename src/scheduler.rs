//! Drives a [`Renderer`] from the host's refresh cadence.
//!
//! Two hosting styles are supported:
//! - push: an event loop calls [`FrameLoop::on_frame`] on each redraw and the
//!   loop asks the host for the next one through [`HostScheduler`];
//! - pull: [`FrameLoop::run`] blocks on a [`FramePacer`] until stopped.
//!
//! Either way the loop measures wall-clock deltas itself and checks its
//! [`StopToken`] before every tick.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::backend::GraphicsBackend;
use crate::renderer::{Renderer, TickOutcome};

/// Shared cancellation flag. Clones observe the same state.
#[derive(Clone, Debug, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Host capability: schedule one more frame callback.
pub trait HostScheduler {
    fn request_next_frame(&self);
}

impl HostScheduler for winit::window::Window {
    fn request_next_frame(&self) {
        self.request_redraw();
    }
}

impl<T: HostScheduler + ?Sized> HostScheduler for Arc<T> {
    fn request_next_frame(&self) {
        (**self).request_next_frame();
    }
}

/// Host capability for pull-style loops: block until the next refresh.
///
/// Returns `None` once the host will not produce any more frames.
pub trait FramePacer {
    fn wait_for_frame(&mut self) -> Option<Instant>;
}

/// Sleeps to a fixed refresh interval.
#[derive(Debug)]
pub struct IntervalPacer {
    interval: Duration,
    next: Instant,
}

impl IntervalPacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Instant::now() + interval,
        }
    }

    pub fn from_hz(hz: u32) -> Self {
        Self::new(Duration::from_secs_f64(1.0 / hz.max(1) as f64))
    }
}

impl FramePacer for IntervalPacer {
    fn wait_for_frame(&mut self) -> Option<Instant> {
        let now = Instant::now();
        if self.next > now {
            std::thread::sleep(self.next - now);
        }
        // Don't try to catch up after a stall.
        self.next = self.next.max(now) + self.interval;
        Some(Instant::now())
    }
}

/// Whether the host should keep delivering frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Stop,
}

pub struct FrameLoop {
    token: StopToken,
    last: Instant,
    ticks: u64,
}

impl FrameLoop {
    /// `start` is when the sprite became ready; the first delta is measured from it.
    pub fn new(start: Instant) -> Self {
        Self {
            token: StopToken::new(),
            last: start,
            ticks: 0,
        }
    }

    pub fn with_token(mut self, token: StopToken) -> Self {
        self.token = token;
        self
    }

    pub fn token(&self) -> StopToken {
        self.token.clone()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Handle one host callback at time `now`, then ask for the next one
    /// unless the loop has been stopped.
    pub fn on_frame<B, H>(
        &mut self,
        renderer: &mut Renderer<B>,
        host: &H,
        now: Instant,
    ) -> LoopControl
    where
        B: GraphicsBackend,
        H: HostScheduler + ?Sized,
    {
        if self.step(renderer, now) == LoopControl::Stop {
            return LoopControl::Stop;
        }
        host.request_next_frame();
        LoopControl::Continue
    }

    /// Tick on every frame the pacer delivers until stopped.
    pub fn run<B, P>(&mut self, renderer: &mut Renderer<B>, pacer: &mut P)
    where
        B: GraphicsBackend,
        P: FramePacer + ?Sized,
    {
        log::info!("Frame loop running");
        while !self.token.is_stopped() {
            let Some(now) = pacer.wait_for_frame() else {
                log::info!("Host stopped delivering frames");
                break;
            };
            if self.step(renderer, now) == LoopControl::Stop {
                break;
            }
        }
        renderer.stop();
        log::info!("Frame loop finished after {} ticks", self.ticks);
    }

    fn step<B: GraphicsBackend>(
        &mut self,
        renderer: &mut Renderer<B>,
        now: Instant,
    ) -> LoopControl {
        if self.token.is_stopped() {
            renderer.stop();
            return LoopControl::Stop;
        }

        // Instants are monotonic; saturate in case the host hands us an older one.
        let dt = now.saturating_duration_since(self.last);
        self.last = now;
        self.ticks += 1;

        match renderer.tick_duration(dt) {
            TickOutcome::Stopped => {
                self.token.stop();
                LoopControl::Stop
            }
            _ => LoopControl::Continue,
        }
    }
}
