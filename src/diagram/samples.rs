//! Built-in example diagrams

use crate::config::NamingScheme;
use crate::geometry::Point;

use super::{Diagram, DiagramResult};

/// Recognizer for C line and block comments.
///
/// Loops and back edges carry hand-placed vertices so the sample renders the same way every
/// time, regardless of the configured loop policy.
pub fn comment_lexer(naming: NamingScheme, state_radius: f32) -> DiagramResult<Diagram> {
    let mut diagram = Diagram::new(naming, state_radius);

    let code = diagram.add_named_state(Point::new(210.0, 420.0), "code");
    let slash = diagram.add_named_state(Point::new(370.0, 250.0), "slash");
    let star = diagram.add_named_state(Point::new(630.0, 430.0), "star");
    let line = diagram.add_named_state(Point::new(220.0, 130.0), "line");
    let block = diagram.add_named_state(Point::new(590.0, 170.0), "block");
    diagram.set_start(code)?;

    diagram.add_transition(code, slash, "/", Vec::new())?;
    diagram.add_transition(slash, code, "other", vec![Point::new(270.0, 300.0)])?;
    diagram.add_transition(slash, line, "/", Vec::new())?;
    diagram.add_transition(line, code, "new\nline", Vec::new())?;
    diagram.add_transition(slash, block, "*", Vec::new())?;
    diagram.add_transition(block, star, "*", Vec::new())?;
    diagram.add_transition(star, block, "other", vec![Point::new(650.0, 290.0)])?;
    diagram.add_transition(star, code, "/", vec![Point::new(490.0, 310.0)])?;
    diagram.add_transition(
        line,
        line,
        "other",
        vec![Point::new(115.0, 100.0), Point::new(250.0, 50.0)],
    )?;
    diagram.add_transition(
        block,
        block,
        "other",
        vec![Point::new(485.0, 140.0), Point::new(620.0, 90.0)],
    )?;
    diagram.add_transition(
        code,
        code,
        "other",
        vec![Point::new(180.0, 500.0), Point::new(305.0, 450.0)],
    )?;

    Ok(diagram)
}
