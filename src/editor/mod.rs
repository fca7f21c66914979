//! Editor Controller
//! Turns canvas gestures into diagram edits and keeps transition geometry current.
//!
//! The view layer reports what the user did as [`EditorEvent`]s and reads back the cached
//! anchors for drawing. A state drag is a node-moved event: only the transitions touching that
//! state are re-anchored. Vertex edits re-anchor the one transition they belong to.

use std::collections::HashMap;
use std::iter;

use crate::config::EditorConfig;
use crate::diagram::{samples, Diagram, DiagramError, DiagramResult};
use crate::geometry::{distance_to_segment, AnchorSettings, Edge, EdgeAnchor, EdgeId, NodeId, Point};

#[cfg(test)]
mod tests;

/// What a primary click on blank canvas does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Select,
    /// Next blank click places a state, then the tool falls back to `Select`
    PlaceState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    State(NodeId),
    Transition(EdgeId),
}

/// A text prompt waiting for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    RenameState { id: NodeId, text: String },
    TransitionLabel { source: NodeId, target: NodeId, text: String },
    RelabelTransition { id: EdgeId, text: String },
}

impl Prompt {
    pub fn title(&self) -> &'static str {
        match self {
            Prompt::RenameState { .. } => "Enter new label for this state:",
            Prompt::TransitionLabel { .. } => "Transition label:",
            Prompt::RelabelTransition { .. } => "New transition label:",
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Prompt::RenameState { text, .. }
            | Prompt::TransitionLabel { text, .. }
            | Prompt::RelabelTransition { text, .. } => text,
        }
    }

    pub fn text_mut(&mut self) -> &mut String {
        match self {
            Prompt::RenameState { text, .. }
            | Prompt::TransitionLabel { text, .. }
            | Prompt::RelabelTransition { text, .. } => text,
        }
    }
}

/// User input, as reported by the view
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    ArmPlaceState,
    BlankClicked(Point),
    BlankDoubleClicked(Point),
    StateClicked(NodeId),
    StateDoubleClicked { id: NodeId, shift: bool },
    StateSecondaryClicked(NodeId),
    TransitionClicked(EdgeId),
    TransitionDoubleClicked(EdgeId),
    StateDragged { id: NodeId, to: Point },
    /// Bend a transition at `at`, splitting the leg nearest to it
    VertexAdded { edge: EdgeId, at: Point },
    VertexDragged { edge: EdgeId, index: usize, to: Point },
    VertexRemoved { edge: EdgeId, index: usize },
    TextTyped(char),
    Backspace,
    Escape,
    DeleteSelection,
    Clear,
    PromptSubmitted(String),
    PromptCancelled,
    LoadSample,
}

pub struct Editor {
    config: EditorConfig,
    settings: AnchorSettings,
    diagram: Diagram,
    tool: Tool,
    selection: Option<Selection>,
    /// Source picked by the first secondary click of a transition gesture
    pending_source: Option<NodeId>,
    prompt: Option<Prompt>,
    /// Last good geometry per transition
    anchors: HashMap<EdgeId, EdgeAnchor>,
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        let diagram = Diagram::new(config.naming.clone(), config.state_radius);
        Self::with_diagram(config, diagram)
    }

    pub fn with_diagram(config: EditorConfig, diagram: Diagram) -> Self {
        let mut editor = Self {
            settings: config.anchor_settings(),
            config,
            diagram,
            tool: Tool::Select,
            selection: None,
            pending_source: None,
            prompt: None,
            anchors: HashMap::new(),
        };
        editor.rebuild_anchors();
        editor
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn pending_source(&self) -> Option<NodeId> {
        self.pending_source
    }

    pub fn prompt(&self) -> Option<&Prompt> {
        self.prompt.as_ref()
    }

    pub fn prompt_mut(&mut self) -> Option<&mut Prompt> {
        self.prompt.as_mut()
    }

    /// Cached geometry for one transition. `None` if it has never had a valid direction.
    pub fn anchor(&self, id: EdgeId) -> Option<&EdgeAnchor> {
        self.anchors.get(&id)
    }

    /// Drawable transitions with their cached geometry, in transition order.
    pub fn anchored_transitions(&self) -> impl Iterator<Item = (&Edge, &EdgeAnchor)> {
        self.diagram
            .transitions()
            .iter()
            .filter_map(|edge| self.anchors.get(&edge.id).map(|anchor| (edge, anchor)))
    }

    pub fn start_anchor(&self) -> Option<EdgeAnchor> {
        self.diagram
            .start_anchor(&self.config.start_marker, &self.settings)
            .filter(|anchor| !anchor.is_degenerate())
    }

    pub fn state_at(&self, p: Point) -> Option<NodeId> {
        self.diagram.state_at(p)
    }

    pub fn transition_at(&self, p: Point) -> Option<EdgeId> {
        self.anchored_transitions()
            .filter_map(|(edge, anchor)| anchor.distance_to(p).map(|d| (edge.id, d)))
            .filter(|(_, d)| *d <= self.config.hit_tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// Stored routing vertex under `p`, nearest first.
    pub fn vertex_at(&self, p: Point) -> Option<(EdgeId, usize)> {
        self.diagram
            .transitions()
            .iter()
            .flat_map(|edge| {
                edge.vertices
                    .iter()
                    .enumerate()
                    .map(move |(index, v)| ((edge.id, index), v.distance(p)))
            })
            .filter(|(_, d)| *d <= self.config.hit_tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(hit, _)| hit)
    }

    /// Swap in another diagram. Cached geometry of the old one is dropped, so edge ids that
    /// collide across diagrams never inherit stale anchors.
    pub fn replace_diagram(&mut self, diagram: Diagram) {
        self.diagram = diagram;
        self.reset_interaction();
        self.anchors.clear();
        self.rebuild_anchors();
    }

    /// Apply one user gesture. Rejected input is logged and leaves the editor unchanged.
    pub fn handle(&mut self, event: EditorEvent) {
        log::trace!("Editor event: {:?}", event);
        if let Err(e) = self.apply(event) {
            log::warn!("Ignored input: {}", e);
        }
    }

    fn apply(&mut self, event: EditorEvent) -> DiagramResult<()> {
        match event {
            EditorEvent::ArmPlaceState => {
                self.tool = Tool::PlaceState;
            }
            EditorEvent::BlankClicked(p) => {
                if self.tool == Tool::PlaceState {
                    self.diagram.add_state(p);
                    self.tool = Tool::Select;
                } else {
                    self.selection = None;
                }
            }
            EditorEvent::BlankDoubleClicked(p) => {
                self.diagram.add_state(p);
            }
            EditorEvent::StateClicked(id) => {
                self.require_state(id)?;
                self.selection = Some(Selection::State(id));
            }
            EditorEvent::StateDoubleClicked { id, shift: true } => {
                self.diagram.toggle_accepting(id)?;
            }
            EditorEvent::StateDoubleClicked { id, shift: false } => {
                let name = self.require_state(id)?.name.clone();
                self.prompt = Some(Prompt::RenameState { id, text: name });
            }
            EditorEvent::StateSecondaryClicked(id) => {
                self.require_state(id)?;
                match self.pending_source {
                    None => self.pending_source = Some(id),
                    Some(source) => {
                        self.prompt = Some(Prompt::TransitionLabel {
                            source,
                            target: id,
                            text: String::new(),
                        });
                    }
                }
            }
            EditorEvent::TransitionClicked(id) => {
                self.require_transition(id)?;
                self.selection = Some(Selection::Transition(id));
            }
            EditorEvent::TransitionDoubleClicked(id) => {
                let label = self.require_transition(id)?.label.clone().unwrap_or_default();
                self.prompt = Some(Prompt::RelabelTransition { id, text: label });
            }
            EditorEvent::StateDragged { id, to } => {
                let touched = self.diagram.move_state(id, to)?;
                self.refresh_anchors(&touched);
            }
            EditorEvent::VertexAdded { edge, at } => {
                let index = self.insertion_index(edge, at)?;
                self.diagram.add_vertex(edge, index, at)?;
                self.refresh_anchors(&[edge]);
            }
            EditorEvent::VertexDragged { edge, index, to } => {
                self.diagram.move_vertex(edge, index, to)?;
                self.refresh_anchors(&[edge]);
            }
            EditorEvent::VertexRemoved { edge, index } => {
                self.diagram.remove_vertex(edge, index)?;
                self.refresh_anchors(&[edge]);
            }
            EditorEvent::TextTyped(ch) => {
                if let (None, Some(Selection::State(id))) = (&self.prompt, self.selection) {
                    self.diagram.append_to_name(id, ch)?;
                }
            }
            EditorEvent::Backspace => {
                if let (None, Some(Selection::State(id))) = (&self.prompt, self.selection) {
                    self.diagram.pop_name_char(id)?;
                }
            }
            EditorEvent::Escape => {
                self.selection = None;
                self.pending_source = None;
                self.tool = Tool::Select;
            }
            EditorEvent::DeleteSelection => self.delete_selection()?,
            EditorEvent::Clear => {
                self.diagram.clear();
                self.reset_interaction();
                self.anchors.clear();
            }
            EditorEvent::PromptSubmitted(text) => self.submit_prompt(text)?,
            EditorEvent::PromptCancelled => {
                if let Some(Prompt::TransitionLabel { .. }) = self.prompt.take() {
                    self.pending_source = None;
                }
                log::debug!("Prompt cancelled");
            }
            EditorEvent::LoadSample => {
                let sample =
                    samples::comment_lexer(self.config.naming.clone(), self.config.state_radius)?;
                self.replace_diagram(sample);
            }
        }
        Ok(())
    }

    fn require_state(&self, id: NodeId) -> DiagramResult<&crate::diagram::State> {
        self.diagram.state(id).ok_or(DiagramError::UnknownState(id))
    }

    fn require_transition(&self, id: EdgeId) -> DiagramResult<&Edge> {
        self.diagram
            .transition(id)
            .ok_or(DiagramError::UnknownTransition(id))
    }

    /// Where a new vertex at `at` goes in the transition's vertex list. A self-loop still routed
    /// by the loop policy gets the policy vertices pinned first, so the new one bends the loop.
    fn insertion_index(&mut self, id: EdgeId, at: Point) -> DiagramResult<usize> {
        let edge = self.require_transition(id)?;
        let (source, target, mut vertices) = (edge.source, edge.target, edge.vertices.clone());
        let source = self.require_state(source)?.node;
        let target = self.require_state(target)?.node;

        if vertices.is_empty() && source.id == target.id {
            vertices = self.settings.self_loop.vertices_for(&source);
            self.diagram.set_vertices(id, vertices.clone())?;
        }

        let route: Vec<Point> = iter::once(source.center)
            .chain(vertices)
            .chain(iter::once(target.center))
            .collect();
        Ok(route
            .windows(2)
            .map(|leg| distance_to_segment(at, leg[0], leg[1]))
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map_or(0, |(index, _)| index))
    }

    fn reset_interaction(&mut self) {
        self.tool = Tool::Select;
        self.selection = None;
        self.pending_source = None;
        self.prompt = None;
    }

    fn delete_selection(&mut self) -> DiagramResult<()> {
        match self.selection.take() {
            Some(Selection::State(id)) => {
                self.diagram.remove_state(id)?;
                if self.pending_source == Some(id) {
                    self.pending_source = None;
                }
                self.rebuild_anchors();
            }
            Some(Selection::Transition(id)) => {
                self.diagram.remove_transition(id)?;
                self.anchors.remove(&id);
            }
            None => {}
        }
        Ok(())
    }

    fn submit_prompt(&mut self, text: String) -> DiagramResult<()> {
        let Some(prompt) = self.prompt.take() else {
            return Ok(());
        };
        match prompt {
            Prompt::RenameState { id, .. } => match self.diagram.rename_state(id, &text) {
                Err(DiagramError::EmptyName) => {
                    log::debug!("Rename cancelled or empty");
                }
                other => other?,
            },
            Prompt::TransitionLabel { source, target, .. } => {
                self.pending_source = None;
                let id = self.diagram.add_transition(source, target, text, Vec::new())?;
                self.refresh_anchors(&[id]);
            }
            Prompt::RelabelTransition { id, .. } => {
                self.diagram.relabel_transition(id, text)?;
            }
        }
        Ok(())
    }

    /// Re-anchor the given transitions. A degenerate result keeps the previous geometry.
    fn refresh_anchors(&mut self, ids: &[EdgeId]) {
        for &id in ids {
            match self.diagram.anchor(id, &self.settings) {
                Ok(EdgeAnchor::Degenerate) => {
                    log::debug!("{} is degenerate, keeping previous geometry", id);
                }
                Ok(EdgeAnchor::Detached(node)) => {
                    log::warn!("{} references missing {}", id, node);
                    self.anchors.remove(&id);
                }
                Ok(anchor) => {
                    self.anchors.insert(id, anchor);
                }
                Err(e) => {
                    log::warn!("Cannot anchor {}: {}", id, e);
                    self.anchors.remove(&id);
                }
            }
        }
    }

    fn rebuild_anchors(&mut self) {
        let ids: Vec<EdgeId> = self.diagram.transitions().iter().map(|t| t.id).collect();
        self.anchors.retain(|id, _| ids.contains(id));
        self.refresh_anchors(&ids);
        log::debug!("Re-anchored {} transition(s)", ids.len());
    }
}
