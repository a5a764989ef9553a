//! Decorative components: the mascot's rotating prompts and the launch
//! splash. Randomness is always injected so both stay deterministic under a
//! seeded generator. Nothing here touches session state.

mod messages;
pub mod splash;

pub use messages::{random_message, MessageRotation, ROTATION_INTERVAL};
