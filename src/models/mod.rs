//! Domain models for the designer.
//!
//! # Core Concepts
//!
//! - [`ExternalFormLayout`]: a layout page as stored in the app repository, a flat
//!   list of items where containers name their children.
//! - [`InternalLayout`]: the same page normalized into id-indexed `components`,
//!   `containers` and `order` maps. This is the form the editor mutates.
//! - [`ComponentType`]: the closed set of component kinds, with per-kind defaults
//!   and allowed children for container kinds.
//! - [`LayoutSets`]: named groups of layouts sharing a data type and process tasks.
//! - [`Resource`]: metadata and policy for an access-controlled resource. Independent
//!   of the layout model.

mod component_type;
mod layout;
mod layout_sets;
mod resource;
mod version;

pub use component_type::*;
pub use layout::*;
pub use layout_sets::*;
pub use resource::*;
pub use version::*;
