use eframe::egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Stroke, Vec2, vec2};

use commit_constellation::render::{EdgeView, NodeView, Renderer};
use commit_constellation::style::parse_hex_color;

/// Maps simulation space onto the canvas. `origin` is the simulation's
/// center and lands on the middle of the canvas before panning.
#[derive(Clone, Copy, Debug)]
pub(super) struct Viewport {
    pub(super) rect: Rect,
    pub(super) pan: Vec2,
    pub(super) zoom: f32,
    pub(super) origin: Vec2,
}

impl Viewport {
    pub(super) fn to_screen(self, world: Vec2) -> Pos2 {
        self.rect.center() + self.pan + (world - self.origin) * self.zoom
    }

    pub(super) fn to_world(self, screen: Pos2) -> Vec2 {
        (screen - self.rect.center() - self.pan) / self.zoom + self.origin
    }

    pub(super) fn screen_radius(self, radius: f32) -> f32 {
        (radius * self.zoom).max(1.5)
    }
}

pub(super) fn hex_color(hex: &str, fallback: Color32) -> Color32 {
    parse_hex_color(hex)
        .map(|[r, g, b]| Color32::from_rgb(r, g, b))
        .unwrap_or(fallback)
}

pub(super) fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0) as u8;
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    let fade = |channel: u8| (channel as f32 + (255.0 - channel as f32) * (1.0 - factor)) as u8;
    Color32::from_rgba_unmultiplied(
        fade(color.r()),
        fade(color.g()),
        fade(color.b()),
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, viewport: Viewport) {
    let rect = viewport.rect;
    painter.rect_filled(rect, 0.0, Color32::from_rgb(250, 250, 250));

    let step = (56.0 * viewport.zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + viewport.pan;
    let grid = Stroke::new(1.0, Color32::from_rgba_unmultiplied(200, 205, 210, 70));

    let mut x = origin.x.rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], grid);
        x += step;
    }

    let mut y = origin.y.rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], grid);
        y += step;
    }
}

pub(super) fn draw_tooltip(painter: &Painter, anchor: Pos2, lines: &[String]) {
    let text = lines.join("\n");
    let galley = painter.layout_no_wrap(text, FontId::proportional(13.0), Color32::WHITE);
    let padding = vec2(8.0, 6.0);
    let position = anchor + vec2(14.0, -galley.size().y - 12.0);
    let background = Rect::from_min_size(position - padding, galley.size() + padding * 2.0);
    painter.rect_filled(background, 4.0, Color32::from_rgba_unmultiplied(30, 34, 40, 230));
    painter.galley(position, galley, Color32::WHITE);
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;

    !(max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom())
}

/// Draws scene views with an egui painter.
pub(super) struct PainterRenderer<'p> {
    pub(super) painter: &'p Painter,
    pub(super) viewport: Viewport,
    pub(super) show_labels: bool,
    pub(super) drawn_nodes: usize,
    pub(super) drawn_edges: usize,
}

impl<'p> PainterRenderer<'p> {
    pub(super) fn new(painter: &'p Painter, viewport: Viewport, show_labels: bool) -> Self {
        Self {
            painter,
            viewport,
            show_labels,
            drawn_nodes: 0,
            drawn_edges: 0,
        }
    }
}

impl Renderer for PainterRenderer<'_> {
    fn render(&mut self, nodes: &[NodeView<'_>], edges: &[EdgeView<'_>]) {
        let rect = self.viewport.rect;
        let zoom_sqrt = self.viewport.zoom.sqrt();

        for edge in edges {
            let start = self.viewport.to_screen(edge.from);
            let end = self.viewport.to_screen(edge.to);
            if !edge_visible(rect, start, end, 2.5) {
                continue;
            }

            let base = hex_color(edge.stroke, Color32::BLACK);
            let (width, color) = if edge.highlighted {
                (edge.width * 1.4, with_opacity(base, 1.0))
            } else {
                (edge.width, with_opacity(base, edge.opacity * 0.35))
            };
            self.painter.line_segment(
                [start, end],
                Stroke::new((width * 0.5 * zoom_sqrt).clamp(0.4, 6.0), color),
            );
            self.drawn_edges += 1;
        }

        for node in nodes {
            let position = self.viewport.to_screen(node.position);
            let radius = self.viewport.screen_radius(node.radius);
            if !circle_visible(rect, position, radius) {
                continue;
            }

            let mut fill = hex_color(node.fill, Color32::GRAY);
            let mut stroke = hex_color(node.stroke, Color32::DARK_GRAY);
            if node.dimmed {
                fill = dim_color(fill, 0.35);
                stroke = dim_color(stroke, 0.35);
            }

            self.painter.circle_filled(position, radius, fill);
            self.painter.circle_stroke(position, radius, Stroke::new(1.0, stroke));
            if self.show_labels && (node.highlighted || radius >= 9.0) && !node.dimmed {
                self.painter.text(
                    position + vec2(radius + 3.0, 0.0),
                    Align2::LEFT_CENTER,
                    node.label,
                    FontId::proportional(11.0),
                    Color32::from_rgb(60, 64, 70),
                );
            }
            self.drawn_nodes += 1;
        }
    }
}
