//! Display configuration: screen size, frame rate bounds, input timing

use serde::Deserialize;
use std::time::Duration;

/// Display configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayConfig {
    /// Virtual screen width in pixels (headless; terminals use their own size)
    pub width: i32,
    pub height: i32,
    /// Height of the function bar strip at the bottom of the screen
    pub bar_height: i32,
    /// Lower bound of the adaptive frame rate
    pub fps_min: u32,
    /// Upper bound of the adaptive frame rate
    pub fps_max: u32,
    /// Press duration at which a click becomes a long click
    pub long_click_ms: u64,
    /// Run without a terminal
    pub headless: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 240,
            height: 320,
            bar_height: 40,
            fps_min: 10,
            fps_max: 30,
            long_click_ms: 300,
            headless: false,
        }
    }
}

/// Display settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FileDisplay {
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub bar_height: Option<i32>,
    pub fps_min: Option<u32>,
    pub fps_max: Option<u32>,
    pub long_click_ms: Option<u64>,
    pub headless: Option<bool>,
}

fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

impl DisplayConfig {
    /// Create from file config, env > file > defaults
    pub fn from_file(file: Option<FileDisplay>, env: &dyn Fn(&str) -> Option<String>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        let width = env("POCKET_SHELL_WIDTH")
            .and_then(|v| v.parse().ok())
            .or(file.width)
            .filter(|w| *w > 0)
            .unwrap_or(defaults.width);
        let height = env("POCKET_SHELL_HEIGHT")
            .and_then(|v| v.parse().ok())
            .or(file.height)
            .filter(|h| *h > 0)
            .unwrap_or(defaults.height);
        let long_click_ms = env("POCKET_SHELL_LONG_CLICK_MS")
            .and_then(|v| v.parse().ok())
            .or(file.long_click_ms)
            .unwrap_or(defaults.long_click_ms);
        let headless = env("POCKET_SHELL_HEADLESS")
            .map(|v| parse_flag(&v))
            .or(file.headless)
            .unwrap_or(defaults.headless);

        let fps_min = file.fps_min.filter(|f| *f > 0).unwrap_or(defaults.fps_min);
        // An inverted range collapses to a fixed rate
        let fps_max = file.fps_max.unwrap_or(defaults.fps_max).max(fps_min);

        Self {
            width,
            height,
            bar_height: file
                .bar_height
                .filter(|b| (0..height).contains(b))
                .unwrap_or(defaults.bar_height),
            fps_min,
            fps_max,
            long_click_ms,
            headless,
        }
    }

    pub fn long_click(&self) -> Duration {
        Duration::from_millis(self.long_click_ms)
    }
}
