//! Application manifest
//!
//! The JSON descriptor an application ships with. Builtin applications embed
//! theirs as string literals; the format is the same either way.

use crate::gfx::{Scheme, Size};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub version: f64,
    #[serde(default = "default_author")]
    pub author: String,
    /// Registry key of the implementing module, defaults to `name`
    #[serde(default)]
    pub module: Option<String>,
    /// Entry point run every tick while active
    pub main: String,
    #[serde(default)]
    pub more: More,
    #[serde(default = "default_description")]
    pub description: String,
}

/// Optional behaviour switches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct More {
    pub on_start: Option<String>,
    pub on_stop: Option<String>,
    pub on_pause: Option<String>,
    pub on_resume: Option<String>,
    pub icon: Option<String>,
    /// Keep running in the background when another app takes over
    #[serde(default = "default_persist")]
    pub persist: bool,
    /// Entry point handed the whole display on request
    pub immersive: Option<String>,
    pub color_scheme: Option<String>,
    /// Logical `[width, height]` the layout was designed for
    pub size: Option<[i32; 2]>,
}

impl Default for More {
    fn default() -> Self {
        Self {
            on_start: None,
            on_stop: None,
            on_pause: None,
            on_resume: None,
            icon: None,
            persist: default_persist(),
            immersive: None,
            color_scheme: None,
            size: None,
        }
    }
}

fn default_author() -> String {
    "No Author".to_string()
}

fn default_description() -> String {
    "No Description.".to_string()
}

fn default_persist() -> bool {
    true
}

impl Manifest {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid application manifest")
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }

    pub fn module_name(&self) -> &str {
        self.module.as_deref().unwrap_or(&self.name)
    }

    /// Declared scheme, falling back to normal for absent or unknown names
    pub fn color_scheme(&self) -> Scheme {
        match self.more.color_scheme.as_deref() {
            None => Scheme::Normal,
            Some(name) => Scheme::from_name(name).unwrap_or_else(|| {
                tracing::warn!(app = %self.name, scheme = name, "Unknown colour scheme, using normal");
                Scheme::Normal
            }),
        }
    }

    pub fn logical_size(&self) -> Option<Size> {
        self.more
            .size
            .filter(|[w, h]| *w > 0 && *h > 0)
            .map(|[w, h]| Size::new(w, h))
    }

    /// Lifecycle binding for one of `onStart`, `onStop`, `onPause`, `onResume`
    pub fn binding(&self, event: Lifecycle) -> Option<&str> {
        match event {
            Lifecycle::Start => self.more.on_start.as_deref(),
            Lifecycle::Stop => self.more.on_stop.as_deref(),
            Lifecycle::Pause => self.more.on_pause.as_deref(),
            Lifecycle::Resume => self.more.on_resume.as_deref(),
        }
    }
}

/// Task lifecycle events an application can bind module methods to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Start,
    Stop,
    Pause,
    Resume,
}

impl Lifecycle {
    pub const ALL: [Lifecycle; 4] = [
        Lifecycle::Start,
        Lifecycle::Stop,
        Lifecycle::Pause,
        Lifecycle::Resume,
    ];

    /// Manifest key
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifecycle::Start => "onStart",
            Lifecycle::Stop => "onStop",
            Lifecycle::Pause => "onPause",
            Lifecycle::Resume => "onResume",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_manifest_defaults() {
        let m = Manifest::from_json(r#"{"name": "notes", "main": "run"}"#).unwrap();
        assert_eq!(m.title(), "notes");
        assert_eq!(m.module_name(), "notes");
        assert_eq!(m.author, "No Author");
        assert_eq!(m.description, "No Description.");
        assert!(m.more.persist);
        assert_eq!(m.color_scheme(), Scheme::Normal);
        assert_eq!(m.logical_size(), None);
    }

    #[test]
    fn test_full_manifest() {
        let m = Manifest::from_json(
            r#"{
                "name": "paint",
                "title": "Paint",
                "version": 1.2,
                "author": "someone",
                "module": "painter",
                "main": "tick",
                "more": {
                    "onStart": "setup",
                    "onPause": "save",
                    "persist": false,
                    "immersive": "fullscreen",
                    "colorScheme": "dark",
                    "size": [120, 140]
                },
                "description": "Draw things"
            }"#,
        )
        .unwrap();
        assert_eq!(m.title(), "Paint");
        assert_eq!(m.module_name(), "painter");
        assert!(!m.more.persist);
        assert_eq!(m.more.immersive.as_deref(), Some("fullscreen"));
        assert_eq!(m.color_scheme(), Scheme::Dark);
        assert_eq!(m.logical_size(), Some(Size::new(120, 140)));
        assert_eq!(m.binding(Lifecycle::Start), Some("setup"));
        assert_eq!(m.binding(Lifecycle::Pause), Some("save"));
        assert_eq!(m.binding(Lifecycle::Stop), None);
    }

    #[test]
    fn test_unknown_scheme_falls_back() {
        let m = Manifest::from_json(r#"{"name": "x", "main": "m", "more": {"colorScheme": "neon"}}"#).unwrap();
        assert_eq!(m.color_scheme(), Scheme::Normal);
    }

    #[test]
    fn test_missing_main_is_rejected() {
        assert!(Manifest::from_json(r#"{"name": "x"}"#).is_err());
    }
}
