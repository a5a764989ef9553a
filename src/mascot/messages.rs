//! Rotating mascot prompts

use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;

/// How often the mascot moves to its next prompt
pub const ROTATION_INTERVAL: Duration = Duration::from_secs(5);

pub const MASCOT_MESSAGES: [&str; 8] = [
    "What would you like to learn today?",
    "Need help with a specific topic?",
    "Ready to explore something new?",
    "Let's make learning fun! What interests you?",
    "Have a question? I'm here to help!",
    "Time for some brain exercise! What's on your mind?",
    "Curious about something? Ask me anything!",
    "Let's discover something amazing together!",
];

/// Cycles through [`MASCOT_MESSAGES`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageRotation {
    index: usize,
}

impl MessageRotation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a random prompt
    pub fn starting_at<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            index: rng.gen_range(0..MASCOT_MESSAGES.len()),
        }
    }

    pub fn current(&self) -> &'static str {
        MASCOT_MESSAGES[self.index]
    }

    /// Move to the next prompt, wrapping around
    pub fn advance(&mut self) -> &'static str {
        self.index = (self.index + 1) % MASCOT_MESSAGES.len();
        self.current()
    }
}

/// Pick any prompt
pub fn random_message<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    MASCOT_MESSAGES
        .choose(rng)
        .copied()
        .unwrap_or(MASCOT_MESSAGES[0])
}
