//! Colour overrides: `[palette.<scheme>]` sections of hex strings

use crate::gfx::palette::parse_hex;
use crate::gfx::{Color, Palette, Role, Scheme};
use serde::Deserialize;
use std::collections::HashMap;

/// One scheme's overrides as loaded from config file
#[derive(Debug, Deserialize, Default, Clone)]
pub struct FileSchemeColors {
    pub background: Option<String>,
    pub item: Option<String>,
    pub accent: Option<String>,
    pub warning: Option<String>,
    pub error: Option<String>,
}

impl FileSchemeColors {
    fn get(&self, role: Role) -> Option<&str> {
        match role {
            Role::Background => self.background.as_deref(),
            Role::Item => self.item.as_deref(),
            Role::Accent => self.accent.as_deref(),
            Role::Warning => self.warning.as_deref(),
            Role::Error => self.error.as_deref(),
        }
    }
}

/// Validated overrides keyed by scheme and role
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaletteConfig {
    pub overrides: HashMap<(Scheme, Role), Color>,
}

impl PaletteConfig {
    /// Unknown schemes and malformed colours are reported and skipped
    pub fn from_file(file: HashMap<String, FileSchemeColors>) -> Self {
        let mut overrides = HashMap::new();
        for (name, colors) in file {
            let Some(scheme) = Scheme::from_name(&name) else {
                eprintln!("Ignoring [palette.{name}]: unknown colour scheme");
                continue;
            };
            for role in Role::ALL {
                let Some(value) = colors.get(role) else {
                    continue;
                };
                match parse_hex(value) {
                    Some(color) => {
                        overrides.insert((scheme, role), color);
                    }
                    None => eprintln!(
                        "Ignoring palette.{name}.{}: {value:?} is not a #rrggbb colour",
                        role.as_str()
                    ),
                }
            }
        }
        Self { overrides }
    }

    pub fn build(&self) -> Palette {
        Palette::new(self.overrides.clone())
    }
}
