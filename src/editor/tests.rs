//! Unit tests for the editor controller

use crate::config::{EditorConfig, NamingScheme};
use crate::diagram::Diagram;
use crate::editor::{Editor, EditorEvent, Prompt, Selection, Tool};
use crate::geometry::{EdgeAnchor, EdgeId, NodeId, Point};

fn assert_close(a: Point, b: Point) {
    assert!((a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3, "{:?} != {:?}", a, b);
}

fn editor() -> Editor {
    Editor::new(EditorConfig::default())
}

fn two_states(editor: &mut Editor) -> (NodeId, NodeId) {
    editor.handle(EditorEvent::BlankDoubleClicked(Point::new(0.0, 0.0)));
    editor.handle(EditorEvent::BlankDoubleClicked(Point::new(100.0, 0.0)));
    let a = editor.state_at(Point::new(0.0, 0.0)).unwrap();
    let b = editor.state_at(Point::new(100.0, 0.0)).unwrap();
    (a, b)
}

fn connect(editor: &mut Editor, source: NodeId, target: NodeId, label: &str) {
    editor.handle(EditorEvent::StateSecondaryClicked(source));
    editor.handle(EditorEvent::StateSecondaryClicked(target));
    editor.handle(EditorEvent::PromptSubmitted(label.to_string()));
}

#[test]
fn test_place_state_tool_is_one_shot() {
    let mut e = editor();
    e.handle(EditorEvent::BlankClicked(Point::new(10.0, 10.0)));
    assert!(e.diagram().is_empty());

    e.handle(EditorEvent::ArmPlaceState);
    assert_eq!(e.tool(), Tool::PlaceState);
    e.handle(EditorEvent::BlankClicked(Point::new(10.0, 10.0)));
    assert_eq!(e.diagram().states().count(), 1);
    assert_eq!(e.tool(), Tool::Select);

    e.handle(EditorEvent::BlankClicked(Point::new(200.0, 10.0)));
    assert_eq!(e.diagram().states().count(), 1);
}

#[test]
fn test_secondary_click_pair_creates_transition() {
    let mut e = editor();
    let (a, b) = two_states(&mut e);

    e.handle(EditorEvent::StateSecondaryClicked(a));
    assert_eq!(e.pending_source(), Some(a));
    assert!(e.prompt().is_none());

    e.handle(EditorEvent::StateSecondaryClicked(b));
    assert!(matches!(
        e.prompt(),
        Some(Prompt::TransitionLabel { source, target, .. }) if *source == a && *target == b
    ));

    e.handle(EditorEvent::PromptSubmitted("0".to_string()));
    assert!(e.prompt().is_none());
    assert_eq!(e.pending_source(), None);

    let edge = &e.diagram().transitions()[0];
    assert_eq!(edge.label.as_deref(), Some("0"));
    match e.anchor(edge.id) {
        Some(EdgeAnchor::Segment(seg)) => {
            assert_eq!(seg.start, Point::new(30.0, 0.0));
            assert_eq!(seg.end, Point::new(70.0, 0.0));
        }
        other => panic!("unexpected anchor {:?}", other),
    }
}

#[test]
fn test_cancelled_label_prompt_creates_nothing() {
    let mut e = editor();
    let (a, b) = two_states(&mut e);
    e.handle(EditorEvent::StateSecondaryClicked(a));
    e.handle(EditorEvent::StateSecondaryClicked(b));
    e.handle(EditorEvent::PromptCancelled);

    assert!(e.diagram().transitions().is_empty());
    assert_eq!(e.pending_source(), None);
    assert!(e.prompt().is_none());
}

#[test]
fn test_empty_label_still_creates_transition() {
    let mut e = editor();
    let (a, b) = two_states(&mut e);
    connect(&mut e, a, b, "");
    assert_eq!(e.diagram().transitions().len(), 1);
}

#[test]
fn test_self_loop_gesture() {
    let mut e = editor();
    let (a, _) = two_states(&mut e);
    connect(&mut e, a, a, "1");

    let edge = &e.diagram().transitions()[0];
    assert!(edge.is_self_loop());
    assert!(matches!(e.anchor(edge.id), Some(EdgeAnchor::Path(_))));
}

#[test]
fn test_drag_refreshes_touching_anchor() {
    let mut e = editor();
    let (a, b) = two_states(&mut e);
    connect(&mut e, a, b, "x");
    let id = e.diagram().transitions()[0].id;

    e.handle(EditorEvent::StateDragged { id: b, to: Point::new(0.0, 100.0) });
    match e.anchor(id) {
        Some(EdgeAnchor::Segment(seg)) => {
            assert!((seg.start.x - 0.0).abs() < 1e-4 && (seg.start.y - 30.0).abs() < 1e-4);
            assert!((seg.end.y - 70.0).abs() < 1e-4);
        }
        other => panic!("unexpected anchor {:?}", other),
    }
}

#[test]
fn test_degenerate_drag_keeps_previous_geometry() {
    let mut e = editor();
    let (a, b) = two_states(&mut e);
    connect(&mut e, a, b, "x");
    let id = e.diagram().transitions()[0].id;
    let before = e.anchor(id).cloned();

    e.handle(EditorEvent::StateDragged { id: b, to: Point::new(0.0, 0.0) });
    assert_eq!(e.diagram().state(b).unwrap().center(), Point::new(0.0, 0.0));
    assert_eq!(e.anchor(id).cloned(), before);

    // Once the centers separate again the edge is re-anchored.
    e.handle(EditorEvent::StateDragged { id: b, to: Point::new(-100.0, 0.0) });
    match e.anchor(id) {
        Some(EdgeAnchor::Segment(seg)) => assert_eq!(seg.start, Point::new(-30.0, 0.0)),
        other => panic!("unexpected anchor {:?}", other),
    }
}

#[test]
fn test_rename_prompt_ignores_blank_input() {
    let mut e = editor();
    let (a, _) = two_states(&mut e);

    e.handle(EditorEvent::StateDoubleClicked { id: a, shift: false });
    assert_eq!(e.prompt().map(Prompt::text), Some("q0"));
    e.handle(EditorEvent::PromptSubmitted("   ".to_string()));
    assert_eq!(e.diagram().state(a).unwrap().name, "q0");

    e.handle(EditorEvent::StateDoubleClicked { id: a, shift: false });
    if let Some(prompt) = e.prompt_mut() {
        *prompt.text_mut() = " start ".to_string();
    }
    let text = e.prompt().unwrap().text().to_string();
    e.handle(EditorEvent::PromptSubmitted(text));
    assert_eq!(e.diagram().state(a).unwrap().name, "start");
}

#[test]
fn test_shift_double_click_toggles_accepting() {
    let mut e = editor();
    let (a, _) = two_states(&mut e);
    e.handle(EditorEvent::StateDoubleClicked { id: a, shift: true });
    assert!(e.diagram().state(a).unwrap().accepting);
    assert!(e.prompt().is_none());
    e.handle(EditorEvent::StateDoubleClicked { id: a, shift: true });
    assert!(!e.diagram().state(a).unwrap().accepting);
}

#[test]
fn test_inline_typing_edits_selected_state() {
    let mut e = editor();
    let (a, b) = two_states(&mut e);

    // Nothing selected: typing is ignored.
    e.handle(EditorEvent::TextTyped('z'));
    assert_eq!(e.diagram().state(a).unwrap().name, "q0");

    e.handle(EditorEvent::StateClicked(b));
    e.handle(EditorEvent::TextTyped('!'));
    e.handle(EditorEvent::TextTyped('?'));
    e.handle(EditorEvent::Backspace);
    assert_eq!(e.diagram().state(b).unwrap().name, "q1!");

    e.handle(EditorEvent::Escape);
    assert_eq!(e.selection(), None);
    e.handle(EditorEvent::TextTyped('x'));
    assert_eq!(e.diagram().state(b).unwrap().name, "q1!");
}

#[test]
fn test_delete_selected_state_cascades() {
    let mut e = editor();
    let (a, b) = two_states(&mut e);
    connect(&mut e, a, b, "x");
    connect(&mut e, b, b, "y");
    let ids: Vec<_> = e.diagram().transitions().iter().map(|t| t.id).collect();

    e.handle(EditorEvent::StateClicked(b));
    e.handle(EditorEvent::DeleteSelection);

    assert!(e.diagram().state(b).is_none());
    assert!(e.diagram().transitions().is_empty());
    assert!(ids.iter().all(|id| e.anchor(*id).is_none()));
    assert_eq!(e.selection(), None);
}

#[test]
fn test_delete_selected_transition() {
    let mut e = editor();
    let (a, b) = two_states(&mut e);
    connect(&mut e, a, b, "x");

    assert_eq!(e.transition_at(Point::new(50.0, 30.0)), None);
    let hit = e.transition_at(Point::new(50.0, 2.0)).expect("should hit the edge");
    e.handle(EditorEvent::TransitionClicked(hit));
    assert_eq!(e.selection(), Some(Selection::Transition(hit)));
    e.handle(EditorEvent::DeleteSelection);

    assert!(e.diagram().transitions().is_empty());
    assert!(e.anchor(hit).is_none());
    assert_eq!(e.diagram().states().count(), 2);
}

#[test]
fn test_relabel_transition() {
    let mut e = editor();
    let (a, b) = two_states(&mut e);
    connect(&mut e, a, b, "x");
    let id = e.diagram().transitions()[0].id;

    e.handle(EditorEvent::TransitionDoubleClicked(id));
    assert_eq!(e.prompt().map(Prompt::text), Some("x"));
    e.handle(EditorEvent::PromptSubmitted("a, b".to_string()));
    assert_eq!(e.diagram().transition(id).unwrap().label.as_deref(), Some("a, b"));
}

#[test]
fn test_clear_resets_everything() {
    let mut e = editor();
    let (a, b) = two_states(&mut e);
    connect(&mut e, a, b, "x");
    e.handle(EditorEvent::StateClicked(a));
    e.handle(EditorEvent::StateSecondaryClicked(b));

    e.handle(EditorEvent::Clear);
    assert!(e.diagram().is_empty());
    assert_eq!(e.selection(), None);
    assert_eq!(e.pending_source(), None);
    assert_eq!(e.anchored_transitions().count(), 0);

    e.handle(EditorEvent::BlankDoubleClicked(Point::new(5.0, 5.0)));
    let first = e.diagram().states().next().unwrap();
    assert_eq!(first.name, "q0");
    assert_eq!(e.diagram().start(), Some(first.id()));
}

#[test]
fn test_unknown_ids_are_ignored() {
    let mut e = editor();
    e.handle(EditorEvent::StateClicked(NodeId(12)));
    e.handle(EditorEvent::StateDragged { id: NodeId(12), to: Point::ZERO });
    assert_eq!(e.selection(), None);
    assert!(e.diagram().is_empty());
}

#[test]
fn test_load_sample() {
    let mut e = editor();
    e.handle(EditorEvent::BlankDoubleClicked(Point::new(5.0, 5.0)));
    e.handle(EditorEvent::LoadSample);

    assert_eq!(e.diagram().states().count(), 5);
    assert_eq!(e.anchored_transitions().count(), 11);
    assert!(e.start_anchor().is_some());
}

#[test]
fn test_vertex_gestures_retrim_transition() {
    let mut e = editor();
    let (a, b) = two_states(&mut e);
    connect(&mut e, a, b, "x");
    let id = e.diagram().transitions()[0].id;
    let d = 30.0 / 2f32.sqrt();

    e.handle(EditorEvent::VertexAdded { edge: id, at: Point::new(50.0, 50.0) });
    assert_eq!(e.diagram().transition(id).unwrap().vertices, vec![Point::new(50.0, 50.0)]);
    match e.anchor(id) {
        Some(EdgeAnchor::Path(path)) => {
            assert_close(path.start, Point::new(d, d));
            assert_close(path.end, Point::new(100.0 - d, d));
        }
        other => panic!("unexpected anchor {:?}", other),
    }

    e.handle(EditorEvent::VertexDragged { edge: id, index: 0, to: Point::new(50.0, -50.0) });
    match e.anchor(id) {
        Some(EdgeAnchor::Path(path)) => {
            assert_close(path.start, Point::new(d, -d));
            assert_close(path.end, Point::new(100.0 - d, -d));
        }
        other => panic!("unexpected anchor {:?}", other),
    }
    assert_eq!(e.vertex_at(Point::new(52.0, -49.0)), Some((id, 0)));
    assert_eq!(e.vertex_at(Point::new(50.0, 50.0)), None);

    // The new vertex splits the leg it lands nearest to.
    e.handle(EditorEvent::VertexAdded { edge: id, at: Point::new(80.0, -40.0) });
    assert_eq!(
        e.diagram().transition(id).unwrap().vertices,
        vec![Point::new(50.0, -50.0), Point::new(80.0, -40.0)]
    );

    e.handle(EditorEvent::VertexRemoved { edge: id, index: 0 });
    e.handle(EditorEvent::VertexRemoved { edge: id, index: 5 });
    assert_eq!(e.diagram().transition(id).unwrap().vertices, vec![Point::new(80.0, -40.0)]);
    match e.anchor(id) {
        Some(EdgeAnchor::Path(path)) => assert_eq!(path.vertices, vec![Point::new(80.0, -40.0)]),
        other => panic!("unexpected anchor {:?}", other),
    }
}

#[test]
fn test_vertex_added_to_self_loop_keeps_loop_shape() {
    let mut e = editor();
    let (a, _) = two_states(&mut e);
    connect(&mut e, a, a, "1");
    let id = e.diagram().transitions()[0].id;
    assert!(e.diagram().transition(id).unwrap().vertices.is_empty());

    e.handle(EditorEvent::VertexAdded { edge: id, at: Point::new(0.0, -80.0) });
    let expected = vec![Point::new(30.0, -60.0), Point::new(0.0, -80.0), Point::new(-30.0, -60.0)];
    assert_eq!(e.diagram().transition(id).unwrap().vertices, expected);
    match e.anchor(id) {
        Some(EdgeAnchor::Path(path)) => assert_eq!(path.vertices, expected),
        other => panic!("unexpected anchor {:?}", other),
    }
}

#[test]
fn test_replace_diagram_drops_stale_anchors() {
    let mut e = editor();
    let (a, b) = two_states(&mut e);
    connect(&mut e, a, b, "x");
    assert!(e.anchor(EdgeId(0)).is_some());

    // Same edge id, but its states sit on top of each other.
    let mut other = Diagram::new(NamingScheme::default(), 30.0);
    let p = other.add_state(Point::new(300.0, 300.0));
    let q = other.add_state(Point::new(300.0, 300.0));
    assert_eq!(other.add_transition(p, q, "y", Vec::new()), Ok(EdgeId(0)));

    e.handle(EditorEvent::StateClicked(a));
    e.replace_diagram(other);
    assert!(e.anchor(EdgeId(0)).is_none());
    assert_eq!(e.anchored_transitions().count(), 0);
    assert_eq!(e.selection(), None);
    assert_eq!(e.transition_at(Point::new(50.0, 0.0)), None);
}
