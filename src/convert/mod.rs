//! COLLADA import: source tables, `<input>` bindings, and index welding.

pub mod dae;
pub mod input;
pub mod source;
pub mod weld;
