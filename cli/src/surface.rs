//! Console stand-ins for the host's presentation layer
//!
//! The CLI has no screen to draw on, so each surface reports what it was
//! asked to do. Per-frame calls are collapsed into start/stop lines.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crit_core::dispatch::OverlayId;
use crit_core::dispatch::fx::{FxSurface, PulsePlan};
use crit_core::dispatch::overlay::{ClosePolicy, OverlaySurface, OverlayView};
use crit_core::dispatch::particles::{ConfettiPiece, Shard, Viewport};
use crit_core::{AudioPlayer, PlaybackRequest, SoundHandle};
use crit_types::Rgb;

#[derive(Debug, Default)]
pub struct ConsoleOverlay;

impl OverlaySurface for ConsoleOverlay {
    fn open(&self, id: OverlayId, view: &OverlayView) {
        let close = match view.close {
            ClosePolicy::After(d) => format!("closes after {}ms", d.as_millis()),
            ClosePolicy::OnMediaEnd { safety } => {
                format!("closes on media end (max {}s)", safety.as_secs())
            }
        };
        println!(
            "[overlay #{id}] \"{}\" {} on {} ({close})",
            view.title,
            view.color,
            view.background_color
        );
        if let Some(media) = &view.media {
            println!("[overlay #{id}]   {:?}: {}", media.kind, media.path);
        }
        if let Some(art) = &view.art {
            println!(
                "[overlay #{id}]   art: {} at ({}, {})",
                art.image_path, art.offset_x, art.offset_y
            );
        }
    }

    fn close(&self, id: OverlayId) {
        println!("[overlay #{id}] closed");
    }
}

/// Tracks which continuous effects are on screen so frames print once.
#[derive(Debug)]
pub struct ConsoleFx {
    viewport: Viewport,
    shaking: AtomicBool,
    shards: Mutex<usize>,
    confetti: Mutex<usize>,
}

impl ConsoleFx {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            viewport: Viewport::new(width, height),
            shaking: AtomicBool::new(false),
            shards: Mutex::new(0),
            confetti: Mutex::new(0),
        }
    }
}

fn report_particles(slot: &Mutex<usize>, label: &str, count: usize) {
    let mut last = slot.lock().unwrap_or_else(|p| p.into_inner());
    if *last == 0 && count > 0 {
        println!("[fx] {label}: {count} particles");
    } else if *last > 0 && count == 0 {
        println!("[fx] {label} finished");
    }
    *last = count;
}

impl FxSurface for ConsoleFx {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn translate(&self, _dx: f32, _dy: f32) {
        if !self.shaking.swap(true, Ordering::Relaxed) {
            println!("[fx] shake");
        }
    }

    fn reset_transform(&self) {
        if self.shaking.swap(false, Ordering::Relaxed) {
            println!("[fx] shake finished");
        }
    }

    fn show_border(&self, thickness: u32, rgb: Rgb) {
        println!(
            "[fx] border {thickness}px rgb({}, {}, {})",
            rgb[0], rgb[1], rgb[2]
        );
    }

    fn hide_border(&self) {
        println!("[fx] border hidden");
    }

    fn start_pulse(&self, plan: &PulsePlan) {
        println!(
            "[fx] pulsate x{} every {}ms",
            plan.iterations,
            plan.duration.as_millis()
        );
    }

    fn stop_pulse(&self) {
        println!("[fx] pulsate finished");
    }

    fn draw_shards(&self, shards: &[Shard]) {
        report_particles(&self.shards, "shatter", shards.len());
    }

    fn draw_confetti(&self, pieces: &[ConfettiPiece]) {
        report_particles(&self.confetti, "confetti", pieces.len());
    }

    fn clear_confetti(&self) {
        report_particles(&self.confetti, "confetti", 0);
    }
}

#[derive(Debug, Default)]
pub struct ConsoleAudio;

struct ConsoleSound {
    src: String,
}

impl SoundHandle for ConsoleSound {
    fn stop(&mut self) {
        println!("[sound] stopped {}", self.src);
    }
}

impl AudioPlayer for ConsoleAudio {
    fn play(&self, request: &PlaybackRequest, broadcast: bool) -> Option<Box<dyn SoundHandle>> {
        println!(
            "[sound] {} at {:.0}%{}",
            request.src,
            request.volume * 100.0,
            if broadcast { " (all clients)" } else { "" }
        );
        Some(Box::new(ConsoleSound {
            src: request.src.clone(),
        }))
    }
}
