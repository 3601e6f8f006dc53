//! Score and time readout drawn behind the scene.

use engine_core::Countdown;
use renderer::{Overlay, OverlayTextBuilder};

/// Full-screen background, `#06b`.
pub const BACKGROUND_COLOUR: [f32; 4] = [0.0, 0x66 as f32 / 255.0, 0xbb as f32 / 255.0, 1.0];
/// Text colour, `#0a1`.
pub const TEXT_COLOUR: [f32; 4] = [0.0, 0xaa as f32 / 255.0, 0x11 as f32 / 255.0, 1.0];

const TEXT_SCALE: f32 = 5.0;
const MARGIN: f32 = 10.0;
const BOTTOM_MARGIN: f32 = 15.0;

pub fn score_text(score: u32) -> String {
    format!("SCORE: {score}")
}

pub fn time_text(countdown: &Countdown) -> String {
    let (minutes, seconds) = countdown.minutes_seconds();
    format!("TIME: {minutes:02}:{seconds:02}")
}

/// HUD state. Each refresh bumps the overlay generation.
pub struct Hud {
    overlay: Overlay,
    width: u32,
    height: u32,
}

impl Hud {
    pub fn new(width: u32, height: u32, score: u32, countdown: &Countdown) -> Self {
        let mut hud = Self {
            overlay: Overlay {
                generation: 0,
                text: OverlayTextBuilder::new(width as f32, height as f32),
            },
            width,
            height,
        };
        hud.refresh(score, countdown);
        hud
    }

    pub fn resize(&mut self, width: u32, height: u32, score: u32, countdown: &Countdown) {
        self.width = width;
        self.height = height;
        self.refresh(score, countdown);
    }

    /// Rebuild the overlay geometry.
    pub fn refresh(&mut self, score: u32, countdown: &Countdown) {
        let (w, h) = (self.width as f32, self.height as f32);
        let mut text = OverlayTextBuilder::new(w, h);
        text.add_rect(0.0, 0.0, w, h, BACKGROUND_COLOUR);
        text.add_text(MARGIN, MARGIN, &score_text(score), TEXT_SCALE, TEXT_COLOUR);

        let time_y = h - BOTTOM_MARGIN - OverlayTextBuilder::line_height(TEXT_SCALE);
        text.add_text(MARGIN, time_y, &time_text(countdown), TEXT_SCALE, TEXT_COLOUR);

        self.overlay.text = text;
        self.overlay.generation += 1;
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn generation(&self) -> u64 {
        self.overlay.generation
    }
}
