//! Retained-mode component tree
//!
//! Geometry resolution, the component record and its widget variants, the
//! capability traits, and the per-application container with its overlay
//! stack.

pub mod app_container;
pub mod component;
pub mod geometry;
pub mod overlay;
pub mod scroll;
pub mod traits;
pub mod widgets;

pub use app_container::AppContainer;
pub use component::{Action, Bindings, Component, ComponentId, Handler, Options};
pub use geometry::{Declared, Dim, Scale};
pub use overlay::{Dialog, DialogKind, Overlay};
pub use scroll::ScrollState;
pub use traits::{ChildOwning, Drawable, Hit, Hittable, RenderContext};
pub use widgets::{Widget, DEFAULT_TEXT_SIZE};
