//! Storage keys
//!
//! These names are shared with existing installs and must not change.

pub const VOLUME_KEY: &str = "user_volume";
pub const VOICE_KEY: &str = "user_voice";
pub const FONT_SIZE_KEY: &str = "user_font_size";
pub const SPEED_KEY: &str = "user_speed";
pub const BACKGROUND_KEY: &str = "user_background";
pub const LISTENING_MODE_KEY: &str = "user_listening_mode";
pub const LIBRARY_BOOKS_KEY: &str = "user_library_books";
pub const READING_TIME_KEY: &str = "user_reading_time";

/// Every key the store may write, in preference order
pub const ALL_KEYS: [&str; 8] = [
    VOLUME_KEY,
    VOICE_KEY,
    FONT_SIZE_KEY,
    SPEED_KEY,
    BACKGROUND_KEY,
    LISTENING_MODE_KEY,
    READING_TIME_KEY,
    LIBRARY_BOOKS_KEY,
];
