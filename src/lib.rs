// Pocket Shell - a small-screen graphical shell
//
// Architecture:
// - gfx:     colours, surfaces, palette schemes, block font
// - ui:      geometry resolver, component tree, overlays, per-app containers
// - input:   press tracking turning raw pointer input into clicks and drags
// - tasks:   cooperative scheduler for every kind of background unit
// - apps:    manifests, data stores, lifecycle of installed applications
// - shell:   the context passed everywhere, main loop, function bar, recovery
// - display: headless and terminal backends
// - config / logging / cli: ambient plumbing for the binary

pub mod apps;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod gfx;
pub mod input;
pub mod logging;
pub mod shell;
pub mod tasks;
pub mod ui;
pub mod util;

pub use error::{ShellError, StoreError};
pub use shell::{Failure, Shell};
