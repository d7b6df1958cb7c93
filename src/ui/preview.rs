use ratatui::prelude::*;
use ratatui::widgets::*;

use stt_layout::geometry::{self, Glyph, Orientation};
use stt_layout::{Component, Point, TemplateDocument, ZPolarity};

use super::braille::{BrailleGrid, DotMap};

const MARGIN_DOTS: f64 = 4.0;
const COIL_RADIUS_DOTS: f64 = 3.0;

const BG: Color = Color::Rgb(10, 12, 20);
const AXIS: Color = Color::Rgb(75, 85, 99);
const AXIS_LABEL: Color = Color::Rgb(156, 163, 175);
const LABEL: Color = Color::Rgb(229, 231, 235);

pub fn component_color(component: Component) -> Color {
    let (r, g, b) = component.rgb();
    Color::Rgb(r, g, b)
}

/// Maps signed-frame meters onto braille dots, origin in the middle.
struct Viewport {
    span_x: f64,
    span_y: f64,
    bw: f64,
    bh: f64,
}

impl Viewport {
    fn to_dot(&self, p: Point) -> (i32, i32) {
        let x = MARGIN_DOTS + ((p.x + self.span_x / 2.0) / self.span_x) * (self.bw - 2.0 * MARGIN_DOTS);
        let y = self.bh - MARGIN_DOTS - ((p.y + self.span_y / 2.0) / self.span_y) * (self.bh - 2.0 * MARGIN_DOTS);
        (x.round() as i32, y.round() as i32)
    }

    fn to_cell(&self, p: Point) -> (i32, i32) {
        let (x, y) = self.to_dot(p);
        (x.div_euclid(2), y.div_euclid(4))
    }

    fn min_span(&self) -> f64 {
        self.span_x.min(self.span_y)
    }
}

struct Painter<'a> {
    grid: &'a BrailleGrid,
    vp: &'a Viewport,
    map: DotMap,
}

impl Painter<'_> {
    fn line(&mut self, a: Point, b: Point) {
        let (from, to) = (self.vp.to_dot(a), self.vp.to_dot(b));
        self.grid.draw_line(&mut self.map, from, to);
    }

    fn point(&mut self, p: Point) {
        let at = self.vp.to_dot(p);
        self.grid.draw_point(&mut self.map, at);
    }

    fn ring(&mut self, p: Point) {
        let at = self.vp.to_dot(p);
        self.grid.draw_ring(&mut self.map, at, COIL_RADIUS_DOTS);
    }

    /// Two barbs meeting at `tip`, for a unit direction `u`.
    fn head(&mut self, tip: Point, u: Point, len: f64) {
        let v = Point::new(-u.y, u.x);
        for side in [0.5, -0.5] {
            let barb = Point::new(
                tip.x - u.x * len + v.x * len * side,
                tip.y - u.y * len + v.y * len * side,
            );
            self.line(barb, tip);
        }
    }

    fn arrow_from(&mut self, from: Point, dir: Point) {
        let l = (dir.x * dir.x + dir.y * dir.y).sqrt();
        if l < 1e-6 { return; }
        let u = Point::new(dir.x / l, dir.y / l);
        let len = 0.12 * self.vp.min_span();
        let tip = Point::new(from.x + u.x * len, from.y + u.y * len);
        self.line(from, tip);
        self.head(tip, u, len * 0.3);
    }

    fn vertical_arrow(&mut self, at: Point, up: bool) {
        let len = 0.15 * self.vp.span_y;
        let sign = if up { 1.0 } else { -1.0 };
        let from = Point::new(at.x, at.y - sign * len / 2.0);
        let tip = Point::new(at.x, at.y + sign * len / 2.0);
        self.line(from, tip);
        self.head(tip, Point::new(0.0, sign), len * 0.3);
    }
}

pub fn render_preview(frame: &mut Frame, area: Rect, doc: &TemplateDocument) {
    let layout = geometry::derive(doc);
    let (span_x, span_y) = layout.extents.span();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(60, 150, 200)))
        .title(" Layout ")
        .title_style(Style::default().fg(Color::Rgb(130, 220, 255)).add_modifier(Modifier::BOLD))
        .title_bottom(Line::from(Span::styled(
            format!(" view {:.0} x {:.0} m ", span_x, span_y),
            Style::default().fg(Color::Rgb(120, 120, 140)),
        )));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let w = inner.width as usize;
    let h = inner.height as usize;
    if w == 0 || h == 0 { return; }

    let mut grid = BrailleGrid::new(w, h, BG);
    let (bw, bh) = grid.dot_size();
    let vp = Viewport { span_x, span_y, bw: bw as f64, bh: bh as f64 };
    let mut labels: Vec<((i32, i32), String, Style)> = Vec::new();

    // ── Axes ───────────────────────────────────────────────────────────
    let axes = {
        let mut p = Painter { grid: &grid, vp: &vp, map: DotMap::new() };
        p.line(Point::new(-span_x / 2.0, 0.0), Point::new(span_x / 2.0, 0.0));
        p.line(Point::new(0.0, -span_y / 2.0), Point::new(0.0, span_y / 2.0));
        p.point(Point::ORIGIN);
        p.map
    };
    grid.write_layer(&axes, AXIS, false);

    let axis_style = Style::default().fg(AXIS_LABEL);
    let x_label = "X (along line)";
    let (ex, ey) = vp.to_cell(Point::new(span_x / 2.0, 0.0));
    labels.push(((ex - x_label.chars().count() as i32, ey - 1), x_label.to_string(), axis_style));
    let (yx, yy) = vp.to_cell(Point::new(0.0, span_y / 2.0));
    labels.push(((yx + 1, yy), layout.z_polarity.y_axis_label().to_string(), axis_style));

    // ── Channels ───────────────────────────────────────────────────────
    for ch in &layout.channels {
        let color = component_color(ch.component);
        let mut p = Painter { grid: &grid, vp: &vp, map: DotMap::new() };
        let label_at = match ch.glyph {
            Glyph::Dipole { neg, pos, .. } => {
                let (a, b) = (layout.signed(neg), layout.signed(pos));
                p.line(a, b);
                p.point(a);
                p.point(b);
                let d = a.to(b);
                let l = a.distance(b);
                if l >= 1e-6 {
                    p.head(b, Point::new(d.x / l, d.y / l), 0.06 * vp.min_span());
                }
                let (cx, cy) = vp.to_cell(Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0));
                (cx + 1, cy - 1)
            }
            Glyph::Remote { at, toward, .. } => {
                let at = layout.signed(at);
                p.point(at);
                p.arrow_from(at, Point::new(toward.x, toward.y * layout.y_sign()));
                let (cx, cy) = vp.to_cell(at);
                (cx + 1, cy - 1)
            }
            Glyph::Coil { at, orientation } => {
                let at = layout.signed(at);
                p.ring(at);
                match orientation {
                    Orientation::Horizontal(dir) => p.arrow_from(at, dir),
                    Orientation::Vertical(z) => p.vertical_arrow(at, z == ZPolarity::Up),
                }
                let (cx, cy) = vp.to_cell(at);
                if ch.component == Component::Hy { (cx + 2, cy + 1) } else { (cx + 2, cy - 1) }
            }
        };
        let map = p.map;
        grid.write_layer(&map, color, true);
        labels.push((label_at, ch.label.clone(), Style::default().fg(LABEL)));
    }

    for ((x, y), text, style) in labels {
        grid.put_text(x, y, &text, style);
    }

    frame.render_widget(Paragraph::new(grid.into_lines()), inner);
}
