//! Diagram Model
//! States and transitions of a drawn automaton, addressed by opaque ids

use std::collections::BTreeMap;

use thiserror::Error;

use crate::config::{NamingScheme, StartMarker};
use crate::geometry::{
    compute_edge_anchor_with, recompute_all_anchors_with, AnchorSettings, Anchors, Edge,
    EdgeAnchor, EdgeId, Node, NodeId, NodeLookup, Point,
};

pub mod samples;


#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiagramError {
    #[error("Unknown state: {0}")]
    UnknownState(NodeId),
    #[error("Unknown transition: {0}")]
    UnknownTransition(EdgeId),
    #[error("State name must not be empty")]
    EmptyName,
    #[error("Transition {edge} has no vertex {index}")]
    NoSuchVertex { edge: EdgeId, index: usize },
}

pub type DiagramResult<T> = Result<T, DiagramError>;

/// A state node
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub node: Node,
    pub name: String,
    pub accepting: bool,
}

impl State {
    pub fn id(&self) -> NodeId {
        self.node.id
    }

    pub fn center(&self) -> Point {
        self.node.center
    }
}

/// An automaton diagram
#[derive(Debug, Clone)]
pub struct Diagram {
    states: BTreeMap<NodeId, State>,
    transitions: Vec<Edge>,
    start: Option<NodeId>,
    /// Set once the first state is placed; only `clear` resets it
    start_assigned: bool,
    next_node: u32,
    next_edge: u32,
    /// Drives default names; reset by `clear`
    name_counter: u32,
    naming: NamingScheme,
    state_radius: f32,
}

impl Default for Diagram {
    fn default() -> Self {
        Self::new(NamingScheme::default(), 30.0)
    }
}

impl Diagram {
    pub fn new(naming: NamingScheme, state_radius: f32) -> Self {
        Self {
            states: BTreeMap::new(),
            transitions: Vec::new(),
            start: None,
            start_assigned: false,
            next_node: 0,
            next_edge: 0,
            name_counter: 0,
            naming,
            state_radius,
        }
    }

    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.states.values()
    }

    pub fn state(&self, id: NodeId) -> Option<&State> {
        self.states.get(&id)
    }

    pub fn transitions(&self) -> &[Edge] {
        &self.transitions
    }

    pub fn transition(&self, id: EdgeId) -> Option<&Edge> {
        self.transitions.iter().find(|t| t.id == id)
    }

    pub fn start(&self) -> Option<NodeId> {
        self.start
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    fn state_mut(&mut self, id: NodeId) -> DiagramResult<&mut State> {
        self.states.get_mut(&id).ok_or(DiagramError::UnknownState(id))
    }

    fn transition_mut(&mut self, id: EdgeId) -> DiagramResult<&mut Edge> {
        self.transitions
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(DiagramError::UnknownTransition(id))
    }

    /// Add a state with the next default name. The first state of an empty diagram becomes
    /// the start state.
    pub fn add_state(&mut self, center: Point) -> NodeId {
        let name = self.naming.name_for(self.name_counter);
        self.name_counter += 1;
        self.add_named_state(center, name)
    }

    pub fn add_named_state(&mut self, center: Point, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        let name = name.into();
        log::info!("Added state '{}' ({}) at ({:.0}, {:.0})", name, id, center.x, center.y);
        self.states.insert(
            id,
            State {
                node: Node::new(id, center, self.state_radius),
                name,
                accepting: false,
            },
        );
        if !self.start_assigned {
            self.start = Some(id);
            self.start_assigned = true;
        }
        id
    }

    /// Rename a state. Blank names are rejected and leave the state untouched.
    pub fn rename_state(&mut self, id: NodeId, name: &str) -> DiagramResult<()> {
        let name = name.trim();
        if name.is_empty() {
            // Still report a bad id before the blank name.
            self.state_mut(id)?;
            return Err(DiagramError::EmptyName);
        }
        let state = self.state_mut(id)?;
        log::info!("State '{}' renamed to '{}'", state.name, name);
        state.name = name.to_string();
        Ok(())
    }

    pub fn append_to_name(&mut self, id: NodeId, ch: char) -> DiagramResult<()> {
        self.state_mut(id)?.name.push(ch);
        Ok(())
    }

    pub fn pop_name_char(&mut self, id: NodeId) -> DiagramResult<()> {
        self.state_mut(id)?.name.pop();
        Ok(())
    }

    /// Flip the accepting flag, returning the new value.
    pub fn toggle_accepting(&mut self, id: NodeId) -> DiagramResult<bool> {
        let state = self.state_mut(id)?;
        state.accepting = !state.accepting;
        log::info!("State '{}' accepting: {}", state.name, state.accepting);
        Ok(state.accepting)
    }

    pub fn set_accepting(&mut self, id: NodeId, accepting: bool) -> DiagramResult<()> {
        self.state_mut(id)?.accepting = accepting;
        Ok(())
    }

    pub fn set_start(&mut self, id: NodeId) -> DiagramResult<()> {
        self.state_mut(id)?;
        self.start = Some(id);
        self.start_assigned = true;
        Ok(())
    }

    /// Connect two existing states. `source == target` makes a self-loop; empty `vertices`
    /// lets the loop policy route it.
    pub fn add_transition(
        &mut self,
        source: NodeId,
        target: NodeId,
        label: impl Into<String>,
        vertices: Vec<Point>,
    ) -> DiagramResult<EdgeId> {
        self.state_mut(source)?;
        self.state_mut(target)?;

        let id = EdgeId(self.next_edge);
        self.next_edge += 1;
        let edge = Edge::new(id, source, target)
            .with_label(label)
            .with_vertices(vertices);
        log::info!(
            "Added transition {} {} -> {} : {:?}",
            id,
            source,
            target,
            edge.label.as_deref().unwrap_or_default()
        );
        self.transitions.push(edge);
        Ok(id)
    }

    pub fn relabel_transition(&mut self, id: EdgeId, label: impl Into<String>) -> DiagramResult<()> {
        self.transition_mut(id)?.label = Some(label.into());
        Ok(())
    }

    /// Replace the routing vertices of a transition. An empty list hands a self-loop back to
    /// the loop policy.
    pub fn set_vertices(&mut self, id: EdgeId, vertices: Vec<Point>) -> DiagramResult<()> {
        self.transition_mut(id)?.vertices = vertices;
        Ok(())
    }

    /// Insert a routing vertex before position `index` (`index == len` appends).
    pub fn add_vertex(&mut self, id: EdgeId, index: usize, at: Point) -> DiagramResult<()> {
        let edge = self.transition_mut(id)?;
        if index > edge.vertices.len() {
            return Err(DiagramError::NoSuchVertex { edge: id, index });
        }
        edge.vertices.insert(index, at);
        log::debug!("Added vertex {} to {}", index, id);
        Ok(())
    }

    pub fn move_vertex(&mut self, id: EdgeId, index: usize, to: Point) -> DiagramResult<()> {
        let vertex = self
            .transition_mut(id)?
            .vertices
            .get_mut(index)
            .ok_or(DiagramError::NoSuchVertex { edge: id, index })?;
        *vertex = to;
        Ok(())
    }

    pub fn remove_vertex(&mut self, id: EdgeId, index: usize) -> DiagramResult<Point> {
        let edge = self.transition_mut(id)?;
        if index >= edge.vertices.len() {
            return Err(DiagramError::NoSuchVertex { edge: id, index });
        }
        log::debug!("Removed vertex {} from {}", index, id);
        Ok(edge.vertices.remove(index))
    }

    /// Move a state and report every transition touching it, in transition order.
    pub fn move_state(&mut self, id: NodeId, center: Point) -> DiagramResult<Vec<EdgeId>> {
        self.state_mut(id)?.node.center = center;
        log::debug!("Moved {} to ({:.1}, {:.1})", id, center.x, center.y);
        Ok(self.touching(id))
    }

    pub fn touching(&self, id: NodeId) -> Vec<EdgeId> {
        self.transitions
            .iter()
            .filter(|t| t.touches(id))
            .map(|t| t.id)
            .collect()
    }

    /// Remove a state together with every transition that touches it.
    pub fn remove_state(&mut self, id: NodeId) -> DiagramResult<State> {
        let state = self.states.remove(&id).ok_or(DiagramError::UnknownState(id))?;
        let before = self.transitions.len();
        self.transitions.retain(|t| !t.touches(id));
        if self.start == Some(id) {
            self.start = None;
        }
        log::info!(
            "Deleted state '{}' and {} transition(s)",
            state.name,
            before - self.transitions.len()
        );
        Ok(state)
    }

    pub fn remove_transition(&mut self, id: EdgeId) -> DiagramResult<Edge> {
        let index = self
            .transitions
            .iter()
            .position(|t| t.id == id)
            .ok_or(DiagramError::UnknownTransition(id))?;
        Ok(self.transitions.remove(index))
    }

    /// Drop everything and reset default naming and the start-state tracker.
    pub fn clear(&mut self) {
        self.states.clear();
        self.transitions.clear();
        self.start = None;
        self.start_assigned = false;
        self.name_counter = 0;
        log::info!("Diagram cleared");
    }

    pub fn anchors<'a>(&'a self, settings: &'a AnchorSettings) -> Anchors<'a, &'a Self> {
        recompute_all_anchors_with(&self.transitions, self, settings)
    }

    pub fn anchor(&self, id: EdgeId, settings: &AnchorSettings) -> DiagramResult<EdgeAnchor> {
        let edge = self.transition(id).ok_or(DiagramError::UnknownTransition(id))?;
        let Some(source) = self.node(edge.source) else {
            return Ok(EdgeAnchor::Detached(edge.source));
        };
        let Some(target) = self.node(edge.target) else {
            return Ok(EdgeAnchor::Detached(edge.target));
        };
        Ok(compute_edge_anchor_with(&source, &target, &edge.vertices, settings))
    }

    /// The marker node drawn next to the start state.
    pub fn start_marker_node(&self, marker: &StartMarker) -> Option<Node> {
        let start = self.state(self.start?)?;
        // The marker is not part of the arena, so give it an id no state can hold.
        Some(Node::new(NodeId(u32::MAX), start.center() + marker.offset, marker.radius))
    }

    /// Arrow from the start marker into the start state.
    pub fn start_anchor(&self, marker: &StartMarker, settings: &AnchorSettings) -> Option<EdgeAnchor> {
        let from = self.start_marker_node(marker)?;
        let to = self.state(self.start?)?.node;
        Some(compute_edge_anchor_with(&from, &to, &[], settings))
    }

    /// Topmost state under `p`. Later states are drawn over earlier ones.
    pub fn state_at(&self, p: Point) -> Option<NodeId> {
        self.states
            .values()
            .rev()
            .find(|s| s.node.contains(p))
            .map(State::id)
    }
}

impl NodeLookup for Diagram {
    fn node(&self, id: NodeId) -> Option<Node> {
        self.states.get(&id).map(|s| s.node)
    }
}
