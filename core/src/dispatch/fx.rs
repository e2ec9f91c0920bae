//! Screen effects
//!
//! [`FxPlan::from_settings`] turns stored options into concrete parameters,
//! filling every missing or zero option with the effect's default.
//! [`FxEngine`] runs a plan against an [`FxSurface`] and owns one task per
//! effect kind, so starting an effect always cancels the previous run of
//! the same kind.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crit_types::{FxKind, FxSettings, Intensity, Rgb, hex_to_rgb};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::time::{Instant, MissedTickBehavior};

use super::particles::{ConfettiField, ConfettiPiece, Shard, ShardField, Viewport};
use super::lock;
use super::task::TaskHandle;
use crate::debug_log;

/// Frame interval for shake ticks and particle loops (~60 fps)
pub const FRAME: Duration = Duration::from_millis(16);

pub const SHAKE_DURATION_MS: u32 = 600;
pub const SHATTER_COUNT: u32 = 300;
/// Upper bound on shards; larger counts stall the frame loop.
pub const SHATTER_MAX: u32 = 2000;
pub const SHATTER_SHAKE_MS: u32 = 400;
pub const BORDER_THICKNESS: u32 = 20;
pub const BORDER_COLOR: &str = "#ff0000";
pub const BORDER_DURATION_MS: u32 = 3000;
pub const PULSATE_DURATION_MS: u32 = 600;
pub const PULSATE_ITERATIONS: u32 = 4;
pub const PULSATE_INTENSITY: f64 = 2.0;
pub const CONFETTI_DURATION_MS: u32 = 3000;
pub const CONFETTI_DEFAULT_COUNT: u32 = 200;

/// Shake magnitude in px for an intensity name.
pub fn shake_magnitude(intensity: Option<&Intensity>) -> f32 {
    match intensity.and_then(Intensity::name) {
        Some("mild") => 3.0,
        Some("extreme") => 20.0,
        _ => 10.0,
    }
}

/// Confetti particle count for an intensity level 1-5.
pub fn confetti_count(intensity: Option<&Intensity>) -> u32 {
    let level = intensity.and_then(Intensity::level);
    match level {
        Some(l) if l == 1.0 => 50,
        Some(l) if l == 2.0 => 100,
        Some(l) if l == 3.0 => 200,
        Some(l) if l == 4.0 => 400,
        Some(l) if l == 5.0 => 800,
        _ => CONFETTI_DEFAULT_COUNT,
    }
}

fn ms_or(value: Option<u32>, default: u32) -> Duration {
    Duration::from_millis(u64::from(value.filter(|v| *v > 0).unwrap_or(default)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Plans
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShakePlan {
    pub duration: Duration,
    pub magnitude: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShatterPlan {
    pub count: u32,
    pub shake: ShakePlan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BorderPlan {
    pub thickness: u32,
    pub color: String,
    pub rgb: Rgb,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PulsePlan {
    /// One iteration
    pub duration: Duration,
    pub iterations: u32,
    pub scale: f32,
}

impl PulsePlan {
    pub fn total(&self) -> Duration {
        self.duration * self.iterations
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfettiPlan {
    pub count: u32,
    pub duration: Duration,
}

/// Concrete parameters for one effect run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FxPlan {
    None,
    Shake(ShakePlan),
    Shatter(ShatterPlan),
    Border(BorderPlan),
    Pulsate(PulsePlan),
    Confetti(ConfettiPlan),
}

impl FxPlan {
    pub fn from_settings(fx: &FxSettings) -> Self {
        let opts = &fx.options;
        match fx.kind {
            FxKind::None => Self::None,
            FxKind::Shake => Self::Shake(ShakePlan {
                duration: ms_or(opts.duration, SHAKE_DURATION_MS),
                magnitude: shake_magnitude(opts.intensity.as_ref()),
            }),
            FxKind::Shatter => Self::Shatter(ShatterPlan {
                count: opts
                    .count
                    .filter(|c| *c > 0)
                    .unwrap_or(SHATTER_COUNT)
                    .min(SHATTER_MAX),
                shake: ShakePlan {
                    duration: Duration::from_millis(u64::from(SHATTER_SHAKE_MS)),
                    magnitude: 10.0,
                },
            }),
            FxKind::Border => {
                let color = opts
                    .color
                    .clone()
                    .unwrap_or_else(|| BORDER_COLOR.to_string());
                let rgb = hex_to_rgb(&color).unwrap_or([255, 0, 0]);
                Self::Border(BorderPlan {
                    thickness: opts.thickness.filter(|t| *t > 0).unwrap_or(BORDER_THICKNESS),
                    color,
                    rgb,
                    duration: ms_or(opts.duration, BORDER_DURATION_MS),
                })
            }
            FxKind::Pulsate => {
                let intensity = opts
                    .intensity
                    .as_ref()
                    .and_then(Intensity::level)
                    .filter(|l| *l != 0.0)
                    .unwrap_or(PULSATE_INTENSITY);
                Self::Pulsate(PulsePlan {
                    duration: ms_or(opts.duration, PULSATE_DURATION_MS),
                    iterations: opts
                        .iterations
                        .filter(|i| *i > 0)
                        .unwrap_or(PULSATE_ITERATIONS),
                    scale: (1.0 + 0.02 * intensity) as f32,
                })
            }
            FxKind::Confetti => Self::Confetti(ConfettiPlan {
                count: confetti_count(opts.intensity.as_ref()),
                duration: ms_or(opts.duration, CONFETTI_DURATION_MS),
            }),
        }
    }

    pub fn kind(&self) -> FxKind {
        match self {
            Self::None => FxKind::None,
            Self::Shake(_) => FxKind::Shake,
            Self::Shatter(_) => FxKind::Shatter,
            Self::Border(_) => FxKind::Border,
            Self::Pulsate(_) => FxKind::Pulsate,
            Self::Confetti(_) => FxKind::Confetti,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Surface
// ─────────────────────────────────────────────────────────────────────────────

/// The presentation layer the effects draw on.
pub trait FxSurface: Send + Sync {
    fn viewport(&self) -> Viewport;

    fn translate(&self, dx: f32, dy: f32);
    fn reset_transform(&self);

    fn show_border(&self, thickness: u32, rgb: Rgb);
    fn hide_border(&self);

    fn start_pulse(&self, plan: &PulsePlan);
    fn stop_pulse(&self);

    fn draw_shards(&self, shards: &[Shard]);

    fn draw_confetti(&self, pieces: &[ConfettiPiece]);
    fn clear_confetti(&self);
}

// ─────────────────────────────────────────────────────────────────────────────
// Engine
// ─────────────────────────────────────────────────────────────────────────────

pub struct FxEngine {
    surface: Arc<dyn FxSurface>,
    tasks: Mutex<HashMap<FxKind, TaskHandle>>,
    shards: Arc<Mutex<ShardField>>,
    rng: Mutex<StdRng>,
}

impl FxEngine {
    pub fn new(surface: Arc<dyn FxSurface>) -> Self {
        Self::with_rng(surface, StdRng::from_entropy())
    }

    /// Deterministic particle layout, for tests.
    pub fn with_seed(surface: Arc<dyn FxSurface>, seed: u64) -> Self {
        Self::with_rng(surface, StdRng::seed_from_u64(seed))
    }

    fn with_rng(surface: Arc<dyn FxSurface>, rng: StdRng) -> Self {
        Self {
            surface,
            tasks: Mutex::new(HashMap::new()),
            shards: Arc::new(Mutex::new(ShardField::default())),
            rng: Mutex::new(rng),
        }
    }

    /// Start `plan`, cancelling any running effect of the same kind.
    /// Must be called inside a tokio runtime.
    pub fn run(&self, plan: &FxPlan) {
        debug_log!("Running fx {:?}", plan);
        match plan {
            FxPlan::None => {}
            FxPlan::Shake(shake) => self.shake(shake),
            FxPlan::Shatter(shatter) => {
                let viewport = self.surface.viewport();
                let mut rng = self.fork_rng();
                lock(&self.shards).spawn(shatter.count, &mut rng, viewport);
                self.start(FxKind::Shatter, shatter_loop(
                    Arc::clone(&self.surface),
                    Arc::clone(&self.shards),
                ));
                self.shake(&shatter.shake);
            }
            FxPlan::Border(border) => {
                let surface = Arc::clone(&self.surface);
                let border = border.clone();
                self.start(FxKind::Border, async move {
                    surface.show_border(border.thickness, border.rgb);
                    tokio::time::sleep(border.duration).await;
                    surface.hide_border();
                });
            }
            FxPlan::Pulsate(pulse) => {
                let surface = Arc::clone(&self.surface);
                let pulse = pulse.clone();
                self.start(FxKind::Pulsate, async move {
                    surface.start_pulse(&pulse);
                    tokio::time::sleep(pulse.total()).await;
                    surface.stop_pulse();
                });
            }
            FxPlan::Confetti(confetti) => {
                let rng = self.fork_rng();
                self.start(
                    FxKind::Confetti,
                    confetti_loop(Arc::clone(&self.surface), confetti.clone(), rng),
                );
            }
        }
    }

    /// Effect kinds with a live task.
    pub fn running(&self) -> Vec<FxKind> {
        let tasks = lock(&self.tasks);
        let mut kinds: Vec<FxKind> = tasks
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(kind, _)| *kind)
            .collect();
        kinds.sort_by_key(|k| k.as_str());
        kinds
    }

    /// Live shard count.
    pub fn shard_count(&self) -> usize {
        lock(&self.shards).len()
    }

    /// Cancel everything and restore the surface.
    pub fn stop_all(&self) {
        lock(&self.tasks).clear();
        lock(&self.shards).clear();
        self.surface.reset_transform();
        self.surface.hide_border();
        self.surface.stop_pulse();
        self.surface.draw_shards(&[]);
        self.surface.clear_confetti();
    }

    fn shake(&self, plan: &ShakePlan) {
        let rng = self.fork_rng();
        self.start(
            FxKind::Shake,
            shake_loop(Arc::clone(&self.surface), plan.clone(), rng),
        );
    }

    fn start<F>(&self, kind: FxKind, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        // Replacing the handle drops, and so cancels, the previous run
        let previous = lock(&self.tasks).insert(kind, TaskHandle::spawn(future));
        if previous.is_some_and(|h| !h.is_finished()) {
            debug_log!("Restarted running {} effect", kind);
        }
    }

    fn fork_rng(&self) -> StdRng {
        StdRng::seed_from_u64(lock(&self.rng).r#gen())
    }
}

fn frame_interval() -> tokio::time::Interval {
    let mut interval = tokio::time::interval(FRAME);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

async fn shake_loop(surface: Arc<dyn FxSurface>, plan: ShakePlan, mut rng: StdRng) {
    let start = Instant::now();
    let mut ticks = frame_interval();
    loop {
        ticks.tick().await;
        if start.elapsed() >= plan.duration {
            break;
        }
        let dx = (rng.r#gen::<f32>() - 0.5) * plan.magnitude * 2.0;
        let dy = (rng.r#gen::<f32>() - 0.5) * plan.magnitude * 2.0;
        surface.translate(dx, dy);
    }
    surface.reset_transform();
}

async fn shatter_loop(surface: Arc<dyn FxSurface>, shards: Arc<Mutex<ShardField>>) {
    let mut last = Instant::now();
    let mut ticks = frame_interval();
    loop {
        ticks.tick().await;
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32();
        last = now;

        let viewport = surface.viewport();
        let done = {
            let mut field = lock(&shards);
            field.step(dt, viewport);
            surface.draw_shards(field.shards());
            field.is_empty()
        };
        if done {
            break;
        }
    }
}

async fn confetti_loop(surface: Arc<dyn FxSurface>, plan: ConfettiPlan, mut rng: StdRng) {
    let viewport = surface.viewport();
    let mut field = ConfettiField::new(plan.count, &mut rng, viewport);
    let start = Instant::now();
    let mut last = start;
    let mut ticks = frame_interval();
    loop {
        ticks.tick().await;
        let now = Instant::now();
        if now.duration_since(start) >= plan.duration {
            break;
        }
        field.step(now.duration_since(last).as_secs_f32(), &mut rng, viewport);
        last = now;
        surface.draw_confetti(field.pieces());
    }
    surface.clear_confetti();
}
