//! fsa-sketch GUI - Automaton Diagram Editor
//! Interactive canvas for drawing states and transitions

use eframe::egui;

use fsa_sketch::config::EditorConfig;
use fsa_sketch::editor::{Editor, EditorEvent, Selection, Tool};
use fsa_sketch::geometry::{center_label, EdgeAnchor, EdgeId, NodeId, Point};

const STATE_FILL: egui::Color32 = egui::Color32::from_rgb(40, 55, 75);
const STATE_STROKE: egui::Color32 = egui::Color32::from_rgb(100, 120, 145);
const SELECTED_STROKE: egui::Color32 = egui::Color32::from_rgb(0, 170, 255);
const SOURCE_STROKE: egui::Color32 = egui::Color32::from_rgb(255, 70, 70);
const EDGE_COLOR: egui::Color32 = egui::Color32::from_rgb(160, 175, 195);
const LABEL_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 230, 120);

fn main() -> eframe::Result<()> {
    env_logger::init();

    let config = match EditorConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::warn!("{e}; falling back to default settings");
            EditorConfig::default()
        }
    };

    let [width, height] = config.canvas_size;
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([width, height + 80.0])
            .with_title("fsa-sketch - Automaton Editor"),
        ..Default::default()
    };

    eframe::run_native(
        "fsa-sketch",
        options,
        Box::new(|_cc| Ok(Box::new(SketchApp::new(config)))),
    )
}

/// Canvas-space to screen-space mapping for one frame
#[derive(Clone, Copy)]
struct View {
    origin: egui::Pos2,
    zoom: f32,
}

impl View {
    fn to_screen(self, p: Point) -> egui::Pos2 {
        self.origin + egui::vec2(p.x, p.y) * self.zoom
    }

    fn to_canvas(self, p: egui::Pos2) -> Point {
        let v = (p - self.origin) / self.zoom;
        Point::new(v.x, v.y)
    }
}

/// What a primary drag holds
#[derive(Clone, Copy)]
enum Drag {
    /// A state, with the grab point relative to its center
    State(NodeId, Point),
    Vertex(EdgeId, usize),
}

struct SketchApp {
    editor: Editor,
    zoom: f32,
    pan_offset: egui::Vec2,
    dragging: Option<Drag>,
}

impl SketchApp {
    fn new(config: EditorConfig) -> Self {
        Self {
            editor: Editor::new(config),
            zoom: 1.0,
            pan_offset: egui::Vec2::ZERO,
            dragging: None,
        }
    }

    fn menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Clear").clicked() {
                        self.editor.handle(EditorEvent::Clear);
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("View", |ui| {
                    if ui.button("Reset Zoom").clicked() {
                        self.zoom = 1.0;
                        self.pan_offset = egui::Vec2::ZERO;
                        ui.close_menu();
                    }
                });

                ui.menu_button("Examples", |ui| {
                    if ui.button("Comment Lexer").clicked() {
                        self.editor.handle(EditorEvent::LoadSample);
                        ui.close_menu();
                    }
                });
            });
        });
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            if ui
                .selectable_label(self.editor.tool() == Tool::PlaceState, "➕ Add State")
                .clicked()
            {
                self.editor.handle(EditorEvent::ArmPlaceState);
            }
            if ui
                .add_enabled(self.editor.selection().is_some(), egui::Button::new("🗑 Delete"))
                .clicked()
            {
                self.editor.handle(EditorEvent::DeleteSelection);
            }
            if ui.button("Clear").clicked() {
                self.editor.handle(EditorEvent::Clear);
            }

            ui.separator();
            if ui.button("➖").clicked() {
                self.zoom = (self.zoom - 0.1).max(0.3);
            }
            ui.label(format!("{:.0}%", self.zoom * 100.0));
            if ui.button("➕").clicked() {
                self.zoom = (self.zoom + 0.1).min(3.0);
            }

            ui.separator();
            let diagram = self.editor.diagram();
            ui.label(format!(
                "States: {} | Transitions: {}",
                diagram.states().count(),
                diagram.transitions().len()
            ));
            if let Some(source) = self.editor.pending_source().and_then(|id| diagram.state(id)) {
                ui.label(format!("Right-click a target for a transition from {}", source.name));
            } else if let Some(Selection::Transition(_)) = self.editor.selection() {
                ui.label("Right-click the transition to bend it, or a handle to remove it");
            }
        });
    }

    /// Modal text prompt for renames and transition labels.
    fn prompt_window(&mut self, ctx: &egui::Context) {
        let mut decision = None;
        if let Some(prompt) = self.editor.prompt_mut() {
            let title = prompt.title();
            egui::Window::new("Edit label")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(title);
                    let edit = ui.text_edit_singleline(prompt.text_mut());
                    if ui.memory(|m| m.focused().is_none()) {
                        edit.request_focus();
                    }
                    let entered = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    ui.horizontal(|ui| {
                        if ui.button("OK").clicked() || entered {
                            decision = Some(EditorEvent::PromptSubmitted(prompt.text().to_string()));
                        }
                        if ui.button("Cancel").clicked() || ui.input(|i| i.key_pressed(egui::Key::Escape)) {
                            decision = Some(EditorEvent::PromptCancelled);
                        }
                    });
                });
        }
        if let Some(event) = decision {
            self.editor.handle(event);
        }
    }

    fn handle_canvas_input(&mut self, ctx: &egui::Context, response: &egui::Response, view: View) {
        let pointer = response
            .interact_pointer_pos()
            .or(response.hover_pos())
            .map(|p| view.to_canvas(p));
        let state_hit = pointer.and_then(|p| self.editor.state_at(p));
        let vertex_hit = pointer.and_then(|p| self.editor.vertex_at(p));

        if self.editor.tool() == Tool::PlaceState && response.hovered() {
            ctx.set_cursor_icon(egui::CursorIcon::Crosshair);
        }

        // Dragging a vertex or a state moves it; dragging blank canvas pans.
        if response.drag_started_by(egui::PointerButton::Primary) {
            self.dragging = match (vertex_hit, state_hit, pointer) {
                (Some((edge, index)), _, _) => Some(Drag::Vertex(edge, index)),
                (None, Some(id), Some(p)) => self
                    .editor
                    .diagram()
                    .state(id)
                    .map(|state| Drag::State(id, p - state.center())),
                _ => None,
            };
        }
        if response.dragged_by(egui::PointerButton::Primary) {
            match (self.dragging, pointer) {
                (Some(Drag::State(id, grab)), Some(p)) => {
                    self.editor.handle(EditorEvent::StateDragged { id, to: p - grab });
                }
                (Some(Drag::Vertex(edge, index)), Some(p)) => {
                    self.editor.handle(EditorEvent::VertexDragged { edge, index, to: p });
                }
                _ => self.pan_offset += response.drag_delta(),
            }
        }
        if response.drag_stopped() {
            self.dragging = None;
        }

        if response.double_clicked() {
            let shift = ctx.input(|i| i.modifiers.shift);
            let transition_hit = pointer.and_then(|p| self.editor.transition_at(p));
            let event = match (state_hit, transition_hit, pointer) {
                (Some(id), _, _) => Some(EditorEvent::StateDoubleClicked { id, shift }),
                (None, Some(id), _) => Some(EditorEvent::TransitionDoubleClicked(id)),
                (None, None, Some(p)) => Some(EditorEvent::BlankDoubleClicked(p)),
                _ => None,
            };
            if let Some(event) = event {
                self.editor.handle(event);
            }
        } else if response.clicked() {
            let transition_hit = pointer.and_then(|p| self.editor.transition_at(p));
            let event = match (state_hit, transition_hit, pointer) {
                (Some(id), _, _) => Some(EditorEvent::StateClicked(id)),
                (None, Some(id), _) => Some(EditorEvent::TransitionClicked(id)),
                (None, None, Some(p)) => Some(EditorEvent::BlankClicked(p)),
                _ => None,
            };
            if let Some(event) = event {
                self.editor.handle(event);
            }
        }

        // Right-click: states pick transition ends, vertices go away, transitions get bent.
        if response.secondary_clicked() {
            let transition_hit = pointer.and_then(|p| self.editor.transition_at(p));
            let event = match (vertex_hit, state_hit, transition_hit, pointer) {
                (Some((edge, index)), _, _, _) => Some(EditorEvent::VertexRemoved { edge, index }),
                (None, Some(id), _, _) => Some(EditorEvent::StateSecondaryClicked(id)),
                (None, None, Some(edge), Some(at)) => Some(EditorEvent::VertexAdded { edge, at }),
                _ => None,
            };
            if let Some(event) = event {
                self.editor.handle(event);
            }
        }

        let scroll_delta = ctx.input(|i| i.raw_scroll_delta);
        if response.hovered() && scroll_delta.y != 0.0 {
            self.zoom = (self.zoom + scroll_delta.y * 0.001).clamp(0.3, 3.0);
        }

        // Inline label editing, unless a text field owns the keyboard.
        if self.editor.prompt().is_none() && !ctx.wants_keyboard_input() {
            let events = ctx.input(|i| i.events.clone());
            for event in events {
                match event {
                    egui::Event::Text(text) => {
                        for ch in text.chars() {
                            self.editor.handle(EditorEvent::TextTyped(ch));
                        }
                    }
                    egui::Event::Key { key, pressed: true, .. } => match key {
                        egui::Key::Backspace => self.editor.handle(EditorEvent::Backspace),
                        egui::Key::Escape => self.editor.handle(EditorEvent::Escape),
                        egui::Key::Delete => self.editor.handle(EditorEvent::DeleteSelection),
                        _ => {}
                    },
                    _ => {}
                }
            }
        }
    }

    fn paint(&self, ctx: &egui::Context, painter: &egui::Painter, rect: egui::Rect, view: View) {
        painter.rect_filled(rect, 0.0, egui::Color32::from_rgb(25, 28, 32));
        draw_grid(painter, rect, view);

        let selection = self.editor.selection();
        let font_size = 14.0 * view.zoom;

        for (edge, anchor) in self.editor.anchored_transitions() {
            let color = if selection == Some(Selection::Transition(edge.id)) {
                SELECTED_STROKE
            } else {
                EDGE_COLOR
            };
            draw_anchor(painter, anchor, view, color);
            if selection == Some(Selection::Transition(edge.id)) {
                for vertex in &edge.vertices {
                    painter.circle_stroke(
                        view.to_screen(*vertex),
                        4.0 * view.zoom,
                        egui::Stroke::new(1.5, SELECTED_STROKE),
                    );
                }
            }
            if let (Some(pos), Some(label)) = (anchor.label_anchor(), edge.label.as_deref()) {
                if !label.is_empty() {
                    draw_label(ctx, painter, view.to_screen(pos), label, font_size);
                }
            }
        }

        let config = self.editor.config();
        if let Some(anchor) = self.editor.start_anchor() {
            if let Some(marker) = self
                .editor
                .diagram()
                .start_marker_node(&config.start_marker)
            {
                painter.circle_filled(
                    view.to_screen(marker.center),
                    marker.radius * view.zoom,
                    egui::Color32::from_rgb(200, 200, 200),
                );
            }
            draw_anchor(painter, &anchor, view, EDGE_COLOR);
        }

        for state in self.editor.diagram().states() {
            let center = view.to_screen(state.center());
            let radius = state.node.radius * view.zoom;
            let stroke_color = if self.editor.pending_source() == Some(state.id()) {
                SOURCE_STROKE
            } else if selection == Some(Selection::State(state.id())) {
                SELECTED_STROKE
            } else {
                STATE_STROKE
            };
            let stroke = egui::Stroke::new(3.0 * view.zoom, stroke_color);
            painter.circle(center, radius, STATE_FILL, stroke);
            if state.accepting {
                painter.circle_stroke(center, radius - config.accepting_ring_inset * view.zoom, stroke);
            }

            let galley = ctx.fonts(|fonts| {
                fonts.layout_no_wrap(
                    state.name.clone(),
                    egui::FontId::proportional(font_size),
                    egui::Color32::WHITE,
                )
            });
            let size = galley.size();
            let origin = center_label(Point::new(center.x, center.y), (size.x, size.y));
            painter.galley(egui::pos2(origin.x, origin.y), galley, egui::Color32::WHITE);
        }
    }
}

impl eframe::App for SketchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.menu_bar(ctx);
        self.prompt_window(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            self.toolbar(ui);
            ui.separator();

            let (response, painter) =
                ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
            let view = View {
                origin: response.rect.min + self.pan_offset,
                zoom: self.zoom,
            };

            self.handle_canvas_input(ctx, &response, view);
            // Pan or zoom may have changed during input handling.
            let view = View {
                origin: response.rect.min + self.pan_offset,
                zoom: self.zoom,
            };
            self.paint(ctx, &painter, response.rect, view);
        });
    }
}

/// Draw an anchored transition with an arrowhead at its end
fn draw_anchor(painter: &egui::Painter, anchor: &EdgeAnchor, view: View, color: egui::Color32) {
    let route: Vec<egui::Pos2> = anchor.points().into_iter().map(|p| view.to_screen(p)).collect();
    if route.len() < 2 {
        return;
    }

    let stroke = egui::Stroke::new(2.0 * view.zoom, color);
    for pair in route.windows(2) {
        painter.line_segment([pair[0], pair[1]], stroke);
    }

    let last = route[route.len() - 1];
    let prev = route[route.len() - 2];
    let dir = (last - prev).normalized();

    let arrow_size = 10.0 * view.zoom;
    let arrow_angle = 0.4;

    let perp = egui::vec2(-dir.y, dir.x);
    let arrow_p1 = last - dir * arrow_size + perp * arrow_size * arrow_angle;
    let arrow_p2 = last - dir * arrow_size - perp * arrow_size * arrow_angle;

    painter.add(egui::Shape::convex_polygon(
        vec![last, arrow_p1, arrow_p2],
        color,
        egui::Stroke::NONE,
    ));
}

/// Draw a transition label centered on `pos`
fn draw_label(ctx: &egui::Context, painter: &egui::Painter, pos: egui::Pos2, text: &str, font_size: f32) {
    let galley = ctx.fonts(|fonts| {
        fonts.layout_no_wrap(text.to_owned(), egui::FontId::proportional(font_size), LABEL_COLOR)
    });
    let size = galley.size();
    let origin = center_label(Point::new(pos.x, pos.y), (size.x, size.y));
    let origin = egui::pos2(origin.x, origin.y);

    let rect = egui::Rect::from_min_size(origin, size).expand(4.0);
    painter.rect_filled(rect, 3.0, egui::Color32::from_rgb(30, 35, 45));
    painter.rect_stroke(rect, 3.0, egui::Stroke::new(1.0, egui::Color32::from_rgb(70, 80, 95)));
    painter.galley(origin, galley, LABEL_COLOR);
}

fn draw_grid(painter: &egui::Painter, rect: egui::Rect, view: View) {
    let grid_size = 50.0 * view.zoom;
    let grid_color = egui::Color32::from_rgba_unmultiplied(100, 100, 100, 30);
    let stroke = egui::Stroke::new(1.0, grid_color);

    let start_x = ((rect.left() - view.origin.x) / grid_size).floor() * grid_size + view.origin.x;
    let start_y = ((rect.top() - view.origin.y) / grid_size).floor() * grid_size + view.origin.y;

    let mut x = start_x;
    while x < rect.right() {
        painter.line_segment([egui::pos2(x, rect.top()), egui::pos2(x, rect.bottom())], stroke);
        x += grid_size;
    }

    let mut y = start_y;
    while y < rect.bottom() {
        painter.line_segment([egui::pos2(rect.left(), y), egui::pos2(rect.right(), y)], stroke);
        y += grid_size;
    }
}
