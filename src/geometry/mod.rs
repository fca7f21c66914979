//! Anchor Geometry
//! Keeps transition arrows and their labels attached to the boundary of circular state nodes.
//!
//! Everything here is a pure function of the current node positions. Callers feed in nodes and
//! edges, get back boundary-trimmed geometry, and write it into whatever view they own.

use std::collections::{BTreeMap, HashMap};
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};


/// Vertical distance between an edge midpoint and its label anchor.
pub const LABEL_OFFSET: f32 = 20.0;

/// A point in canvas space (pixels, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(self, other: Point) -> f32 {
        (other - self).length()
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }

    /// Unit vector in the same direction, or `None` for a zero or non-finite vector.
    pub fn normalized(self) -> Option<Point> {
        let len = self.length();
        if len > 0.0 && len.is_finite() {
            Some(Point::new(self.x / len, self.y / len))
        } else {
            None
        }
    }

    fn raised(self, offset: f32) -> Point {
        Point::new(self.x, self.y - offset)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Point {
    type Output = Point;

    fn mul(self, rhs: f32) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Point::new(x, y)
    }
}

/// Opaque identifier of a state node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

/// Opaque identifier of a transition edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(pub u32);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "edge#{}", self.0)
    }
}

/// A circular node as seen by the geometry engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub center: Point,
    pub radius: f32,
}

impl Node {
    pub fn new(id: NodeId, center: Point, radius: f32) -> Self {
        Self { id, center, radius }
    }

    /// Whether `p` lies inside or on the circle.
    pub fn contains(&self, p: Point) -> bool {
        self.center.distance(p) <= self.radius
    }

    /// Point on the circle in the direction of `toward`. `None` if `toward` is the center.
    pub fn boundary_toward(&self, toward: Point) -> Option<Point> {
        let dir = (toward - self.center).normalized()?;
        Some(self.center + dir * self.radius)
    }
}

/// A directed edge between two nodes
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub label: Option<String>,
    /// Intermediate routing points, in canvas space. Empty means a straight edge, or an
    /// auto-routed loop when `source == target`.
    pub vertices: Vec<Point>,
}

impl Edge {
    pub fn new(id: EdgeId, source: NodeId, target: NodeId) -> Self {
        Self {
            id,
            source,
            target,
            label: None,
            vertices: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_vertices(mut self, vertices: Vec<Point>) -> Self {
        self.vertices = vertices;
        self
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    pub fn touches(&self, node: NodeId) -> bool {
        self.source == node || self.target == node
    }
}

/// Straight edge trimmed to both node boundaries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchoredSegment {
    pub start: Point,
    pub end: Point,
    pub label_anchor: Point,
}

/// Polyline edge (self-loop or manually routed), trimmed at both ends
#[derive(Debug, Clone, PartialEq)]
pub struct AnchoredPath {
    pub start: Point,
    pub vertices: Vec<Point>,
    pub end: Point,
    pub label_anchor: Point,
}

impl AnchoredPath {
    /// All points from `start` to `end`, in drawing order.
    pub fn points(&self) -> Vec<Point> {
        let mut points = Vec::with_capacity(self.vertices.len() + 2);
        points.push(self.start);
        points.extend_from_slice(&self.vertices);
        points.push(self.end);
        points
    }
}

/// Result of anchoring one edge
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeAnchor {
    Segment(AnchoredSegment),
    Path(AnchoredPath),
    /// The edge has no direction (coincident centers, or a vertex sitting on a center).
    /// Callers keep whatever geometry they drew last.
    Degenerate,
    /// The edge references a node that the lookup does not know.
    Detached(NodeId),
}

impl EdgeAnchor {
    pub fn is_degenerate(&self) -> bool {
        matches!(self, EdgeAnchor::Degenerate)
    }

    pub fn label_anchor(&self) -> Option<Point> {
        match self {
            EdgeAnchor::Segment(seg) => Some(seg.label_anchor),
            EdgeAnchor::Path(path) => Some(path.label_anchor),
            EdgeAnchor::Degenerate | EdgeAnchor::Detached(_) => None,
        }
    }

    /// Drawable polyline, empty when there is nothing to draw.
    pub fn points(&self) -> Vec<Point> {
        match self {
            EdgeAnchor::Segment(seg) => vec![seg.start, seg.end],
            EdgeAnchor::Path(path) => path.points(),
            EdgeAnchor::Degenerate | EdgeAnchor::Detached(_) => Vec::new(),
        }
    }

    /// Shortest distance from `p` to the drawn polyline.
    pub fn distance_to(&self, p: Point) -> Option<f32> {
        self.points()
            .windows(2)
            .map(|w| distance_to_segment(p, w[0], w[1]))
            .min_by(|a, b| a.total_cmp(b))
    }
}

/// Where self-loops are routed, relative to the node center.
///
/// Offsets are expressed in multiples of the node radius so the loop scales with the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfLoopPolicy {
    pub vertex_offsets: Vec<Point>,
}

impl Default for SelfLoopPolicy {
    fn default() -> Self {
        Self {
            vertex_offsets: vec![Point::new(1.0, -2.0), Point::new(-1.0, -2.0)],
        }
    }
}

impl SelfLoopPolicy {
    pub fn vertices_for(&self, node: &Node) -> Vec<Point> {
        self.vertex_offsets
            .iter()
            .map(|offset| node.center + *offset * node.radius)
            .collect()
    }
}

/// Tunables for anchoring
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorSettings {
    pub label_offset: f32,
    pub self_loop: SelfLoopPolicy,
}

impl Default for AnchorSettings {
    fn default() -> Self {
        Self {
            label_offset: LABEL_OFFSET,
            self_loop: SelfLoopPolicy::default(),
        }
    }
}

/// Anchor a straight edge from `source` to `target` with default settings.
///
/// Passing the same node twice (same id) yields a self-loop routed by the default
/// [`SelfLoopPolicy`].
pub fn compute_edge_anchor(source: &Node, target: &Node) -> EdgeAnchor {
    compute_edge_anchor_with(source, target, &[], &AnchorSettings::default())
}

/// Anchor an edge, honoring routing vertices and settings.
pub fn compute_edge_anchor_with(
    source: &Node,
    target: &Node,
    vertices: &[Point],
    settings: &AnchorSettings,
) -> EdgeAnchor {
    if source.id == target.id {
        return anchor_self_loop(source, vertices, settings);
    }
    if vertices.is_empty() {
        return anchor_straight(source, target, settings.label_offset);
    }
    anchor_routed(source, target, vertices.to_vec(), settings.label_offset)
}

fn anchor_straight(source: &Node, target: &Node, label_offset: f32) -> EdgeAnchor {
    let Some(dir) = (target.center - source.center).normalized() else {
        return EdgeAnchor::Degenerate;
    };
    let start = source.center + dir * source.radius;
    let end = target.center - dir * target.radius;
    EdgeAnchor::Segment(AnchoredSegment {
        start,
        end,
        label_anchor: start.midpoint(end).raised(label_offset),
    })
}

fn anchor_routed(source: &Node, target: &Node, vertices: Vec<Point>, label_offset: f32) -> EdgeAnchor {
    let (Some(&first), Some(&last)) = (vertices.first(), vertices.last()) else {
        return EdgeAnchor::Degenerate;
    };
    let (Some(start), Some(end)) = (source.boundary_toward(first), target.boundary_toward(last)) else {
        return EdgeAnchor::Degenerate;
    };

    // Label sits over the middle leg of start -> vertices -> end.
    let legs = vertices.len() + 1;
    let mid = legs / 2;
    let leg_start = if mid == 0 { start } else { vertices[mid - 1] };
    let leg_end = vertices.get(mid).copied().unwrap_or(end);

    EdgeAnchor::Path(AnchoredPath {
        start,
        label_anchor: leg_start.midpoint(leg_end).raised(label_offset),
        vertices,
        end,
    })
}

fn anchor_self_loop(node: &Node, vertices: &[Point], settings: &AnchorSettings) -> EdgeAnchor {
    let vertices = if vertices.is_empty() {
        settings.self_loop.vertices_for(node)
    } else {
        vertices.to_vec()
    };
    let (Some(&first), Some(&last)) = (vertices.first(), vertices.last()) else {
        return EdgeAnchor::Degenerate;
    };
    let (Some(start), Some(end)) = (node.boundary_toward(first), node.boundary_toward(last)) else {
        return EdgeAnchor::Degenerate;
    };

    EdgeAnchor::Path(AnchoredPath {
        start,
        label_anchor: first.midpoint(last).raised(settings.label_offset),
        vertices,
        end,
    })
}

/// Read access to current node geometry.
pub trait NodeLookup {
    fn node(&self, id: NodeId) -> Option<Node>;
}

impl NodeLookup for HashMap<NodeId, Node> {
    fn node(&self, id: NodeId) -> Option<Node> {
        self.get(&id).copied()
    }
}

impl NodeLookup for BTreeMap<NodeId, Node> {
    fn node(&self, id: NodeId) -> Option<Node> {
        self.get(&id).copied()
    }
}

impl<T: NodeLookup + ?Sized> NodeLookup for &T {
    fn node(&self, id: NodeId) -> Option<Node> {
        (**self).node(id)
    }
}

/// Lazily anchors a slice of edges, in input order.
///
/// Cloning the iterator restarts it from the clone's position without touching the inputs.
#[derive(Debug, Clone)]
pub struct Anchors<'a, N> {
    edges: std::slice::Iter<'a, Edge>,
    nodes: N,
    settings: std::borrow::Cow<'a, AnchorSettings>,
}

impl<N: NodeLookup> Anchors<'_, N> {
    fn anchor(&self, edge: &Edge) -> EdgeAnchor {
        let Some(source) = self.nodes.node(edge.source) else {
            return EdgeAnchor::Detached(edge.source);
        };
        let Some(target) = self.nodes.node(edge.target) else {
            return EdgeAnchor::Detached(edge.target);
        };
        compute_edge_anchor_with(&source, &target, &edge.vertices, &self.settings)
    }
}

impl<N: NodeLookup> Iterator for Anchors<'_, N> {
    type Item = (EdgeId, EdgeAnchor);

    fn next(&mut self) -> Option<Self::Item> {
        let edge = self.edges.next()?;
        Some((edge.id, self.anchor(edge)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.edges.size_hint()
    }
}

impl<N: NodeLookup> ExactSizeIterator for Anchors<'_, N> {}

/// Anchor every edge against the current node positions, with default settings.
pub fn recompute_all_anchors<'a, N: NodeLookup>(edges: &'a [Edge], nodes: N) -> Anchors<'a, N> {
    Anchors {
        edges: edges.iter(),
        nodes,
        settings: std::borrow::Cow::Owned(AnchorSettings::default()),
    }
}

/// Anchor every edge against the current node positions.
pub fn recompute_all_anchors_with<'a, N: NodeLookup>(
    edges: &'a [Edge],
    nodes: N,
    settings: &'a AnchorSettings,
) -> Anchors<'a, N> {
    Anchors {
        edges: edges.iter(),
        nodes,
        settings: std::borrow::Cow::Borrowed(settings),
    }
}

/// Top-left origin that centers a text box of `size` (width, height) on `center`.
pub fn center_label(center: Point, size: (f32, f32)) -> Point {
    Point::new(center.x - size.0 / 2.0, center.y - size.1 / 2.0)
}

/// Shortest distance from `p` to the segment `a`-`b`.
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f32 {
    let ab = b - a;
    let len_sq = ab.x * ab.x + ab.y * ab.y;
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let ap = p - a;
    let t = ((ap.x * ab.x + ap.y * ab.y) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}
