//! Sentence corpus for typing rounds

use rand::Rng;

/// Fixed corpus the target text is drawn from, one sentence per round.
pub const SAMPLE_TEXTS: &[&str] = &[
    "The quick brown fox jumps over the lazy dog and runs through the forest.",
    "Practice makes perfect when you type with accuracy and speed every single day.",
    "Racing against time requires focus, determination, and lightning fast fingers.",
    "Champions are made through dedication, practice, and never giving up on dreams.",
    "Type like the wind and let your fingers dance across the keyboard smoothly.",
];

/// Pick one target sentence uniformly at random
pub fn pick_target_text() -> &'static str {
    let idx = rand::thread_rng().gen_range(0..SAMPLE_TEXTS.len());
    SAMPLE_TEXTS[idx]
}
