// ============================================================================
// SPRAY - random dots around the pointer, emitted on a host-ticked timer
// ============================================================================

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

use crate::canvas::SurfaceId;
use crate::components::tools::{ToolContext, ToolHandler};
use crate::geometry::Vec2;
use crate::input::{MouseButton, PointerEvent};
use crate::ops::raster::stamp_disc;

/// Periodic timer driven by `tick`. Cancelled emitters never fire.
#[derive(Clone, Debug, Default)]
pub struct SprayEmitter {
    period_ms: f32,
    elapsed_ms: f32,
    active: bool,
}

impl SprayEmitter {
    /// `interval` emissions per second.
    pub fn start(interval: u32) -> Self {
        Self { period_ms: 1000.0 / interval.max(1) as f32, elapsed_ms: 0.0, active: true }
    }

    pub fn cancel(&mut self) {
        self.active = false;
        self.elapsed_ms = 0.0;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn period_ms(&self) -> f32 {
        self.period_ms
    }

    /// Advance by `elapsed_ms` and return how many periods completed.
    pub fn advance(&mut self, elapsed_ms: f32) -> u32 {
        if !self.active || self.period_ms <= 0.0 || elapsed_ms <= 0.0 {
            return 0;
        }
        self.elapsed_ms += elapsed_ms;
        let due = (self.elapsed_ms / self.period_ms).floor();
        self.elapsed_ms -= due * self.period_ms;
        due as u32
    }
}

pub struct SprayToolState {
    pub center: Vec2,
    pub emitter: SprayEmitter,
    rng: StdRng,
}

impl Default for SprayToolState {
    fn default() -> Self {
        Self { center: Vec2::ZERO, emitter: SprayEmitter::default(), rng: StdRng::from_rng(&mut rand::rng()) }
    }
}

impl SprayToolState {
    /// Deterministic dot placement.
    pub fn with_seed(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed), ..Default::default() }
    }

    pub fn is_emitting(&self) -> bool {
        self.emitter.is_active()
    }

    pub fn cancel(&mut self) {
        self.emitter.cancel();
    }

    /// Advance the emitter; each completed period sprays one dot.
    pub fn tick(&mut self, ctx: &mut ToolContext, elapsed_ms: f32) {
        let due = self.emitter.advance(elapsed_ms);
        self.spray(ctx, due);
    }

    fn spray(&mut self, ctx: &mut ToolContext, dots: u32) {
        if dots == 0 {
            return;
        }
        let diameter = ctx.params.spray_diameter.max(0.0);
        let radius = (ctx.params.spray_dot_diameter / 2.0).max(0.5);
        let mut mask = ctx.mask();
        for _ in 0..dots {
            let angle = self.rng.random_range(0.0..TAU);
            let dist = if diameter > 0.0 { self.rng.random_range(0.0..diameter) } else { 0.0 };
            let p = self.center + Vec2::new(angle.cos(), angle.sin()) * dist;
            stamp_disc(&mut mask, Vec2::new(p.x.round(), p.y.round()), radius);
        }
        let (color, alpha) = (ctx.primary(), ctx.params.primary_alpha);
        ctx.paint(SurfaceId::Committed, &mask, color, alpha);
    }
}

impl ToolHandler for SprayToolState {
    fn on_pointer_down(&mut self, ctx: &mut ToolContext, ev: &PointerEvent) {
        if ev.button != MouseButton::Left {
            return;
        }
        self.center = ev.pos;
        let interval = ctx.params.spray_interval.max(1);
        self.spray(ctx, interval.div_ceil(2));
        self.emitter = SprayEmitter::start(interval);
    }

    fn on_pointer_move(&mut self, _ctx: &mut ToolContext, ev: &PointerEvent) {
        if self.emitter.is_active() {
            self.center = ev.pos;
        }
    }

    fn on_pointer_up(&mut self, _ctx: &mut ToolContext, _ev: &PointerEvent) {
        self.emitter.cancel();
    }
}
