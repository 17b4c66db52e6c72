//! # Ontoview Index
//!
//! Bidirectional entity/rendering index kept in step with the active
//! ontologies, plus the finder used by search boxes and entity pickers.
//!
//! Each entity kind has its own rendering namespace; a class and an
//! individual may both render as `Dog`. Within a kind, a colliding rendering
//! is stored wrapped in [`ESCAPE_DELIMITER`].

pub mod finder;
pub mod index;
pub mod kind_map;
pub mod render;

pub use finder::{EntityFinder, FinderConfig, FinderError, MatchMode, WILDCARD};
pub use index::{EntityIndex, IndexConfig, IndexSnapshot};
pub use kind_map::KindMap;
pub use render::{escape, is_escaped, EntityRenderer, LabelRenderer, RenderError, ShortFormRenderer, ESCAPE_DELIMITER};
