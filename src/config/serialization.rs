//! Config serialization to TOML
//!
//! Single source of truth for config file format.

use super::Config;
use crate::gfx::{Role, Scheme};

impl Config {
    /// Serialize palette overrides as `[palette.<scheme>]` sections
    pub(super) fn palette_to_toml(&self) -> String {
        if self.palette.overrides.is_empty() {
            // Show an example when nothing is overridden
            return r##"
# Colour overrides per scheme (normal, dark, light), as #rrggbb
# [palette.dark]
# accent = "#3c3c9c"
# error = "#c80000"
"##
            .to_string();
        }

        let mut output = String::from("\n");
        // Fixed scheme and role order for deterministic output
        for scheme in Scheme::ALL {
            let roles: Vec<Role> = Role::ALL
                .into_iter()
                .filter(|role| self.palette.overrides.contains_key(&(scheme, *role)))
                .collect();
            if roles.is_empty() {
                continue;
            }
            output.push_str(&format!("[palette.{}]\n", scheme.as_str()));
            for role in roles {
                let c = self.palette.overrides[&(scheme, role)];
                output.push_str(&format!(
                    "{} = \"#{:02x}{:02x}{:02x}\"\n",
                    role.as_str(),
                    c.r,
                    c.g,
                    c.b
                ));
            }
            output.push('\n');
        }
        output
    }

    /// Serialize config to TOML, including comments describing each option
    pub fn to_toml(&self) -> String {
        format!(
            r#"# pocket-shell configuration

# Application data stores and error reports
data_dir = "{data_dir}"

# Screen and input (POCKET_SHELL_WIDTH / _HEIGHT / _HEADLESS / _LONG_CLICK_MS override)
[display]
width = {width}
height = {height}
bar_height = {bar_height}
# Adaptive frame rate bounds
fps_min = {fps_min}
fps_max = {fps_max}
# Press duration that turns a click into a long click
long_click_ms = {long_click}
headless = {headless}

# Logging configuration (RUST_LOG env var overrides)
[logging]
level = "{log_level}"
# JSON file logging (in addition to the in-memory buffer or stdout)
file_enabled = {log_file_enabled}
file_dir = "{log_file_dir}"
file_rotation = "{log_file_rotation}"  # hourly, daily, never
file_prefix = "{log_file_prefix}"
{palette}"#,
            data_dir = toml_path(&self.data_dir),
            width = self.display.width,
            height = self.display.height,
            bar_height = self.display.bar_height,
            fps_min = self.display.fps_min,
            fps_max = self.display.fps_max,
            long_click = self.display.long_click_ms,
            headless = self.display.headless,
            log_level = self.logging.level,
            log_file_enabled = self.logging.file_enabled,
            log_file_dir = toml_path(&self.logging.file_dir),
            log_file_rotation = self.logging.file_rotation.as_str(),
            log_file_prefix = self.logging.file_prefix,
            palette = self.palette_to_toml(),
        )
    }
}

/// Paths go into basic strings, so backslashes (Windows) must be escaped
fn toml_path(path: &std::path::Path) -> String {
    path.display().to_string().replace('\\', "\\\\")
}
