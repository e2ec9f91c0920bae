//! Particle state for the shatter and confetti effects
//!
//! Pure simulation: the FX engine steps these once per frame and hands the
//! result to the surface for drawing.

use crit_types::Rgb;
use rand::Rng;
use serde::Serialize;

/// Pixels past the edge before a shard is dropped.
pub const OFFSCREEN_MARGIN: f32 = 150.0;

/// Downward acceleration applied to shards, px/s²
pub const SHARD_GRAVITY: f32 = 1000.0;

pub const CONFETTI_COLORS: [Rgb; 6] = [
    [255, 204, 0],
    [255, 64, 64],
    [64, 160, 255],
    [80, 220, 120],
    [200, 90, 255],
    [255, 255, 255],
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    fn contains_with_margin(&self, x: f32, y: f32, margin: f32) -> bool {
        x >= -margin && x <= self.width + margin && y >= -margin && y <= self.height + margin
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shatter
// ─────────────────────────────────────────────────────────────────────────────

/// One triangular glass fragment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shard {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Degrees
    pub rotation: f32,
    /// Degrees per second
    pub rotation_speed: f32,
    pub size: f32,
    /// Triangle corners as percentages of the shard box
    pub clip: [(f32, f32); 3],
}

impl Shard {
    pub fn random(rng: &mut impl Rng, viewport: Viewport) -> Self {
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let force: f32 = rng.gen_range(200.0..800.0);
        let mut corner = || (rng.gen_range(0.0f32..100.0), rng.gen_range(0.0f32..100.0));
        let clip = [corner(), corner(), corner()];
        Self {
            x: rng.gen_range(0.0..viewport.width.max(1.0)),
            y: rng.gen_range(0.0..viewport.height.max(1.0)),
            vx: angle.cos() * force,
            vy: angle.sin() * force,
            rotation: rng.gen_range(0.0..360.0),
            rotation_speed: rng.gen_range(-360.0..360.0),
            size: rng.gen_range(20.0..100.0),
            clip,
        }
    }

    pub fn step(&mut self, dt: f32) {
        self.vy += SHARD_GRAVITY * dt;
        self.x += self.vx * dt;
        self.y += self.vy * dt;
        self.rotation += self.rotation_speed * dt;
    }

    pub fn is_offscreen(&self, viewport: Viewport) -> bool {
        !viewport.contains_with_margin(self.x, self.y, OFFSCREEN_MARGIN)
    }
}

/// Live shards. New bursts add to the same field.
#[derive(Debug, Clone, Default)]
pub struct ShardField {
    shards: Vec<Shard>,
}

impl ShardField {
    pub fn spawn(&mut self, count: u32, rng: &mut impl Rng, viewport: Viewport) {
        self.shards
            .extend((0..count).map(|_| Shard::random(rng, viewport)));
    }

    /// Advance by `dt` seconds, dropping shards that left the screen.
    pub fn step(&mut self, dt: f32, viewport: Viewport) {
        for shard in &mut self.shards {
            shard.step(dt);
        }
        self.shards.retain(|s| !s.is_offscreen(viewport));
    }

    pub fn shards(&self) -> &[Shard] {
        &self.shards
    }

    pub fn len(&self) -> usize {
        self.shards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    pub fn clear(&mut self) {
        self.shards.clear();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Confetti
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfettiPiece {
    pub x: f32,
    pub y: f32,
    /// Horizontal drift, px/s
    pub vx: f32,
    /// Fall speed, px/s
    pub vy: f32,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
    pub spin: f32,
    pub color: Rgb,
}

impl ConfettiPiece {
    fn random(rng: &mut impl Rng, viewport: Viewport, y: f32) -> Self {
        Self {
            x: rng.gen_range(0.0..viewport.width.max(1.0)),
            y,
            vx: rng.gen_range(-40.0..40.0),
            vy: rng.gen_range(120.0..320.0),
            width: rng.gen_range(6.0..12.0),
            height: rng.gen_range(10.0..20.0),
            rotation: rng.gen_range(0.0..360.0),
            spin: rng.gen_range(-240.0..240.0),
            color: CONFETTI_COLORS[rng.gen_range(0..CONFETTI_COLORS.len())],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfettiField {
    pieces: Vec<ConfettiPiece>,
}

impl ConfettiField {
    /// `count` pieces staggered above the top edge.
    pub fn new(count: u32, rng: &mut impl Rng, viewport: Viewport) -> Self {
        let pieces = (0..count)
            .map(|_| {
                let y = -rng.gen_range(0.0..viewport.height.max(1.0));
                ConfettiPiece::random(rng, viewport, y)
            })
            .collect();
        Self { pieces }
    }

    /// Advance by `dt` seconds. Pieces that fall past the bottom re-enter at
    /// the top with fresh parameters.
    pub fn step(&mut self, dt: f32, rng: &mut impl Rng, viewport: Viewport) {
        for piece in &mut self.pieces {
            piece.x += piece.vx * dt;
            piece.y += piece.vy * dt;
            piece.rotation += piece.spin * dt;
            if piece.y > viewport.height {
                *piece = ConfettiPiece::random(rng, viewport, -piece.height);
            }
        }
    }

    pub fn pieces(&self) -> &[ConfettiPiece] {
        &self.pieces
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }
}
