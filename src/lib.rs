//! dae_mesh library
//!
//! Reads COLLADA 1.4.1 geometry into a single welded triangle mesh and writes
//! such a mesh back out as a COLLADA document.

pub mod convert;
pub mod error;
pub mod export;
pub mod mesh;
mod xml;

use std::path::Path;

pub use convert::dae::{parse_dae, parse_dae_file, DaeImportConfig};
pub use error::{DaeError, Result};
pub use export::dae::{build_document, export_mesh_to_dae, write_dae, DaeExportConfig};
pub use mesh::Mesh;

/// Import a DAE file with the default configuration.
pub fn import(path: impl AsRef<Path>) -> Result<Mesh> {
    parse_dae_file(path.as_ref(), &DaeImportConfig::default())
}

/// Export a mesh to a DAE file with the default configuration.
pub fn export(path: impl AsRef<Path>, mesh: &Mesh) -> Result<()> {
    export_mesh_to_dae(mesh, path.as_ref(), &DaeExportConfig::default())
}
