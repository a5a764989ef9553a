//! Launch splash sequence
//!
//! Timeline: title shown, rocket launches after 1s, launch message 2s later,
//! splash hidden 1s after that.

use std::time::Duration;

use rand::Rng;

pub const TITLE: &str = "Skillsnap";
pub const TAGLINE: &str = "A Groq-Powered Career Builder";
pub const LAUNCH_MESSAGE: &str = "Launching your career journey...";

pub const LAUNCH_DELAY: Duration = Duration::from_millis(1000);
pub const LAUNCH_DURATION: Duration = Duration::from_millis(2000);
pub const HIDE_DELAY: Duration = Duration::from_millis(1000);

pub const STAR_COUNT: usize = 50;
const MAX_TWINKLE_DELAY_SECS: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SplashPhase {
    /// Title and rocket on the pad
    Title,
    /// Rocket lifting off, stars twinkling
    Launching,
    /// Launch message shown
    Launched,
    /// Splash gone
    Hidden,
}

/// Phase of the splash after `elapsed` time
pub fn phase_at(elapsed: Duration) -> SplashPhase {
    let launched_at = LAUNCH_DELAY + LAUNCH_DURATION;
    if elapsed < LAUNCH_DELAY {
        SplashPhase::Title
    } else if elapsed < launched_at {
        SplashPhase::Launching
    } else if elapsed < launched_at + HIDE_DELAY {
        SplashPhase::Launched
    } else {
        SplashPhase::Hidden
    }
}

/// Time from start until the phase begins
pub fn phase_start(phase: SplashPhase) -> Duration {
    match phase {
        SplashPhase::Title => Duration::ZERO,
        SplashPhase::Launching => LAUNCH_DELAY,
        SplashPhase::Launched => LAUNCH_DELAY + LAUNCH_DURATION,
        SplashPhase::Hidden => LAUNCH_DELAY + LAUNCH_DURATION + HIDE_DELAY,
    }
}

/// A background star, positioned in percent of the sky
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    pub top_pct: f64,
    pub left_pct: f64,
    pub twinkle_delay: Duration,
}

pub fn star_field<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<Star> {
    (0..count)
        .map(|_| Star {
            top_pct: rng.gen_range(0.0..100.0),
            left_pct: rng.gen_range(0.0..100.0),
            twinkle_delay: Duration::from_secs_f64(rng.gen_range(0.0..MAX_TWINKLE_DELAY_SECS)),
        })
        .collect()
}

/// Plot stars onto a `width` x `height` character grid
pub fn render_sky(stars: &[Star], width: usize, height: usize) -> Vec<String> {
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let mut grid = vec![vec![' '; width]; height];
    for star in stars {
        let row = ((star.top_pct / 100.0) * height as f64) as usize;
        let col = ((star.left_pct / 100.0) * width as f64) as usize;
        grid[row.min(height - 1)][col.min(width - 1)] = '*';
    }
    grid.into_iter().map(|row| row.into_iter().collect()).collect()
}
