//! fsa-sketch - Finite State Automaton Diagram Editor
//! Rendering-independent core: anchor geometry, diagram model and interaction controller

pub mod config;
pub mod diagram;
pub mod editor;
pub mod geometry;

pub use config::{ConfigError, EditorConfig};
pub use diagram::{Diagram, DiagramError};
pub use editor::{Editor, EditorEvent};
pub use geometry::{
    compute_edge_anchor, recompute_all_anchors, AnchoredSegment, EdgeAnchor, Node, Point,
};
