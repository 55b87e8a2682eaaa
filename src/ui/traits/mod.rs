//! Capability traits for the component tree
//!
//! Widgets are one tagged record ([`Component`](crate::ui::Component)) rather
//! than a class hierarchy. What a node can do is expressed by which of these
//! traits the caller reaches for:
//!
//! ```text
//!              ┌──────────────┐
//!              │  Component   │  id, geometry, options, widget, children
//!              └──────┬───────┘
//!     ┌───────────────┼────────────────┐
//!     ▼               ▼                ▼
//! ┌──────────┐  ┌───────────┐  ┌──────────────┐
//! │ Drawable │  │ Hittable  │  │ ChildOwning  │
//! │ layout   │  │ hit_test  │  │ add/remove   │
//! │ render   │  │           │  │ find, take   │
//! │ refresh  │  │           │  │              │
//! └──────────┘  └───────────┘  └──────────────┘
//! ```
//!
//! - [`Drawable`] - resolve geometry and paint onto a parent surface
//! - [`Hittable`] - map a pointer position to the innermost, frontmost node
//! - [`ChildOwning`] - exclusive ownership of an ordered child list

mod children;
mod drawable;
mod hittable;

pub use children::ChildOwning;
pub use drawable::{Drawable, RenderContext};
pub use hittable::{Hit, Hittable};
