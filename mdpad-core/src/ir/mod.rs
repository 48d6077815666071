//! Intermediate Representation (IR) shared by every stage.
//!
//! The render pipeline lowers Markdown into this tree, the importer builds it from
//! HTML, the Markdown serializer turns it back into canonical text, and the exporter
//! measures and paginates its top-level blocks.

pub mod nodes;
pub mod visit;
