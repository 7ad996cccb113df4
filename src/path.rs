//! Path generation: samples + scales → renderable path descriptions.
//!
//! Paths are plain command lists with an SVG `d` rendering via `Display`.
//! Arc length is computed analytically over the same projection, so stroke
//! dash animations need no render-surface measurement.

use std::fmt;

use serde::Serialize;

use crate::animation::EchoState;
use crate::scale::ScaleState;
use crate::shared::{Point, Sample};

/// Line segments used to measure one cubic.
const CUBIC_FLATTEN_STEPS: usize = 24;

// ─── Path ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PathCommand {
    MoveTo { to: Point },
    LineTo { to: Point },
    CubicTo { c1: Point, c2: Point, to: Point },
    Close,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Path {
    commands: Vec<PathCommand>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, to: Point) -> &mut Self {
        self.commands.push(PathCommand::MoveTo { to });
        self
    }

    pub fn line_to(&mut self, to: Point) -> &mut Self {
        self.commands.push(PathCommand::LineTo { to });
        self
    }

    pub fn cubic_to(&mut self, c1: Point, c2: Point, to: Point) -> &mut Self {
        self.commands.push(PathCommand::CubicTo { c1, c2, to });
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.commands.push(PathCommand::Close);
        self
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Last drawn point.
    pub fn end_point(&self) -> Option<Point> {
        self.commands.iter().rev().find_map(|c| match *c {
            PathCommand::MoveTo { to }
            | PathCommand::LineTo { to }
            | PathCommand::CubicTo { to, .. } => Some(to),
            PathCommand::Close => None,
        })
    }

    /// Straight pieces approximating the path, in drawing order.
    fn pieces(&self) -> Vec<(Point, Point)> {
        let mut out = Vec::new();
        let mut cursor: Option<Point> = None;
        let mut start: Option<Point> = None;

        for cmd in &self.commands {
            match *cmd {
                PathCommand::MoveTo { to } => {
                    cursor = Some(to);
                    start = Some(to);
                }
                PathCommand::LineTo { to } => {
                    if let Some(from) = cursor {
                        out.push((from, to));
                    }
                    cursor = Some(to);
                }
                PathCommand::CubicTo { c1, c2, to } => {
                    if let Some(from) = cursor {
                        let mut prev = from;
                        for i in 1..=CUBIC_FLATTEN_STEPS {
                            let t = i as f64 / CUBIC_FLATTEN_STEPS as f64;
                            let next = cubic_point(from, c1, c2, to, t);
                            out.push((prev, next));
                            prev = next;
                        }
                    }
                    cursor = Some(to);
                }
                PathCommand::Close => {
                    if let (Some(from), Some(to)) = (cursor, start) {
                        out.push((from, to));
                    }
                    cursor = start;
                }
            }
        }
        out
    }

    /// Total arc length.
    pub fn length(&self) -> f64 {
        self.pieces().iter().map(|(a, b)| a.distance(*b)).sum()
    }

    /// Point at arc length `distance` from the start, clamped to the path.
    pub fn point_at_length(&self, distance: f64) -> Option<Point> {
        let pieces = self.pieces();
        let first = pieces.first()?.0;
        if distance <= 0.0 {
            return Some(first);
        }
        let mut walked = 0.0;
        for (a, b) in &pieces {
            let len = a.distance(*b);
            if walked + len >= distance && len > 0.0 {
                return Some(a.lerp(*b, (distance - walked) / len));
            }
            walked += len;
        }
        pieces.last().map(|(_, b)| *b)
    }

    /// Stroke dash offset revealing `progress` of the path.
    pub fn dash_offset(&self, progress: f64) -> f64 {
        self.length() * (1.0 - progress.clamp(0.0, 1.0))
    }
}

fn cubic_point(p0: Point, c1: Point, c2: Point, p1: Point, t: f64) -> Point {
    let u = 1.0 - t;
    let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
    Point::new(
        a * p0.x + b * c1.x + c * c2.x + d * p1.x,
        a * p0.y + b * c1.y + c * c2.y + d * p1.y,
    )
}

/// Left part of a cubic split at `t` (de Casteljau): `(c1, c2, end)`.
fn split_cubic(p0: Point, c1: Point, c2: Point, p1: Point, t: f64) -> (Point, Point, Point) {
    let a = p0.lerp(c1, t);
    let b = c1.lerp(c2, t);
    let c = c2.lerp(p1, t);
    let ab = a.lerp(b, t);
    let bc = b.lerp(c, t);
    (a, ab, ab.lerp(bc, t))
}

fn write_num(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    let s = format!("{:.3}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    f.write_str(if s == "-0" { "0" } else { s })
}

fn write_point(f: &mut fmt::Formatter<'_>, p: Point) -> fmt::Result {
    write_num(f, p.x)?;
    f.write_str(",")?;
    write_num(f, p.y)
}

impl fmt::Display for Path {
    /// SVG path data, e.g. `M50,370L780,20`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cmd in &self.commands {
            match *cmd {
                PathCommand::MoveTo { to } => {
                    f.write_str("M")?;
                    write_point(f, to)?;
                }
                PathCommand::LineTo { to } => {
                    f.write_str("L")?;
                    write_point(f, to)?;
                }
                PathCommand::CubicTo { c1, c2, to } => {
                    f.write_str("C")?;
                    write_point(f, c1)?;
                    f.write_str(",")?;
                    write_point(f, c2)?;
                    f.write_str(",")?;
                    write_point(f, to)?;
                }
                PathCommand::Close => f.write_str("Z")?,
            }
        }
        Ok(())
    }
}

// ─── Curves ──────────────────────────────────────────────────────────────────

/// Interpolation between projected samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Curve {
    Linear,
    /// Centripetal Catmull-Rom spline (`alpha = 0.5`).
    #[default]
    Centripetal,
}

const CENTRIPETAL_ALPHA: f64 = 0.5;

impl Curve {
    fn alpha(self) -> Option<f64> {
        match self {
            Curve::Linear => None,
            Curve::Centripetal => Some(CENTRIPETAL_ALPHA),
        }
    }

    /// Append the curve through `points` to `path`, starting with a `MoveTo`
    /// unless `continue_from_cursor` is set.
    fn trace(self, path: &mut Path, points: &[Point], continue_from_cursor: bool) {
        let Some(first) = points.first() else {
            return;
        };
        if continue_from_cursor {
            path.line_to(*first);
        } else {
            path.move_to(*first);
        }

        match self.alpha() {
            Some(alpha) if points.len() > 2 => {
                for i in 0..points.len() - 1 {
                    let p0 = points[i.saturating_sub(1)];
                    let p1 = points[i];
                    let p2 = points[i + 1];
                    let p3 = points[(i + 2).min(points.len() - 1)];
                    let (c1, c2) = catmull_rom_controls(p0, p1, p2, p3, alpha);
                    path.cubic_to(c1, c2, p2);
                }
            }
            _ => {
                for p in &points[1..] {
                    path.line_to(*p);
                }
            }
        }
    }
}

/// Bezier control points of the Catmull-Rom segment `p1 → p2`.
fn catmull_rom_controls(p0: Point, p1: Point, p2: Point, p3: Point, alpha: f64) -> (Point, Point) {
    const EPS: f64 = 1e-12;
    let l01_2a = (p1.distance(p0)).powf(2.0 * alpha);
    let l12_2a = (p2.distance(p1)).powf(2.0 * alpha);
    let l23_2a = (p3.distance(p2)).powf(2.0 * alpha);
    let l01_a = l01_2a.sqrt();
    let l12_a = l12_2a.sqrt();
    let l23_a = l23_2a.sqrt();

    let mut c1 = p1;
    if l01_a > EPS {
        let a = 2.0 * l01_2a + 3.0 * l01_a * l12_a + l12_2a;
        let n = 3.0 * l01_a * (l01_a + l12_a);
        c1 = Point::new(
            (p1.x * a - p0.x * l12_2a + p2.x * l01_2a) / n,
            (p1.y * a - p0.y * l12_2a + p2.y * l01_2a) / n,
        );
    }

    let mut c2 = p2;
    if l23_a > EPS {
        let b = 2.0 * l23_2a + 3.0 * l23_a * l12_a + l12_2a;
        let m = 3.0 * l23_a * (l23_a + l12_a);
        c2 = Point::new(
            (p2.x * b + p1.x * l23_2a - p3.x * l12_2a) / m,
            (p2.y * b + p1.y * l23_2a - p3.y * l12_2a) / m,
        );
    }
    (c1, c2)
}

// ─── PathGenerator ───────────────────────────────────────────────────────────

/// Builds the chart's paths from the window and the current scales.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathGenerator {
    pub curve: Curve,
}

impl PathGenerator {
    pub fn new(curve: Curve) -> Self {
        Self { curve }
    }

    /// Full history line. Historical points are not constrained.
    pub fn line(&self, samples: &[Sample], scales: &ScaleState) -> Path {
        let points: Vec<Point> = samples.iter().map(|s| scales.project(s)).collect();
        let mut path = Path::new();
        self.curve.trace(&mut path, &points, false);
        path
    }

    /// The statically drawn part: everything but the newest sample while
    /// its segment is being revealed.
    pub fn static_line(&self, samples: &[Sample], scales: &ScaleState, revealing: bool) -> Path {
        match samples.len() {
            n if revealing && n >= 2 => self.line(&samples[..n - 1], scales),
            _ => self.line(samples, scales),
        }
    }

    /// The newest segment of `samples`, drawn from its start to `progress`
    /// of the way along the same curve [`PathGenerator::line`] would draw.
    pub fn segment(&self, samples: &[Sample], progress: f64, scales: &ScaleState) -> Path {
        let t = progress.clamp(0.0, 1.0);
        let points: Vec<Point> = samples[samples.len().saturating_sub(3)..]
            .iter()
            .map(|s| scales.project(s))
            .collect();
        let mut path = Path::new();
        let [.., from, to] = points.as_slice() else {
            return path;
        };
        let (from, to) = (*from, *to);
        path.move_to(from);

        match self.curve.alpha() {
            // Last piece of the spline: the end point doubles as its own neighbour.
            Some(alpha) if points.len() > 2 => {
                let (c1, c2) = catmull_rom_controls(points[0], from, to, to, alpha);
                let (c1, c2, end) = split_cubic(from, c1, c2, to, t);
                path.cubic_to(c1, c2, end);
            }
            _ => {
                path.line_to(from.lerp(to, t));
            }
        }
        path
    }

    /// Filled area under the line, closed along the bottom of the plot.
    ///
    /// `head` extends the area to the revealing segment's current tip.
    pub fn area(&self, samples: &[Sample], scales: &ScaleState, head: Option<Point>) -> Path {
        let mut points: Vec<Point> = samples.iter().map(|s| scales.project(s)).collect();
        if let Some(h) = head {
            points.push(h);
        }
        let (Some(first), Some(last)) = (points.first().copied(), points.last().copied()) else {
            return Path::new();
        };
        let baseline = scales.price.range().0;

        let mut path = Path::new();
        path.move_to(Point::new(first.x, baseline));
        self.curve.trace(&mut path, &points, true);
        path.line_to(Point::new(last.x, baseline)).close();
        path
    }

    /// Echo stroke: the visible prefix of the echo snapshot.
    pub fn echo(&self, echo: &EchoState, scales: &ScaleState) -> Path {
        self.line(echo.visible(), scales)
    }

    /// Head indicator: the revealing `tip` if a segment is in flight, else
    /// the newest sample. Its price is constrained into the safe band.
    pub fn head(&self, samples: &[Sample], tip: Option<Point>, scales: &ScaleState) -> Option<Point> {
        match tip {
            Some(tip) => {
                let price = scales.constrain_price(scales.price.invert(tip.y));
                Some(Point::new(tip.x, scales.y(price)))
            }
            None => Some(scales.project_constrained(samples.last()?)),
        }
    }

    /// Y of the displayed-price marker.
    pub fn marker_y(&self, displayed_price: f64, scales: &ScaleState) -> f64 {
        scales.y(scales.constrain_price(displayed_price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Viewport;
    use crate::domain::buffer::SampleBuffer;
    use crate::scale::{compute_scales, ScaleParams};

    fn fixture() -> (Vec<Sample>, ScaleState) {
        let samples = vec![
            Sample::new(1000, 45000.0),
            Sample::new(1200, 45100.0),
            Sample::new(1400, 44950.0),
        ];
        let mut buf = SampleBuffer::new(40);
        for s in &samples {
            buf.push(*s);
        }
        let params = ScaleParams {
            zoom_precision: 100.0,
            buffer_fraction: 0.3,
            margin_fraction: 0.05,
        };
        let scales = compute_scales(&buf, None, &Viewport::default(), &params).unwrap();
        (samples, scales)
    }

    #[test]
    fn test_svg_rendering() {
        let mut p = Path::new();
        p.move_to(Point::new(0.0, 10.5))
            .line_to(Point::new(20.125, -0.0))
            .cubic_to(Point::new(1.0, 2.0), Point::new(3.0, 4.0), Point::new(5.0, 6.0))
            .close();
        assert_eq!(p.to_string(), "M0,10.5L20.125,0C1,2,3,4,5,6Z");
    }

    #[test]
    fn test_length_of_polyline() {
        let mut p = Path::new();
        p.move_to(Point::new(0.0, 0.0))
            .line_to(Point::new(3.0, 4.0))
            .line_to(Point::new(3.0, 10.0));
        assert_eq!(p.length(), 11.0);
        assert_eq!(p.point_at_length(5.0), Some(Point::new(3.0, 4.0)));
        assert_eq!(p.point_at_length(8.0), Some(Point::new(3.0, 7.0)));
        assert_eq!(p.point_at_length(100.0), Some(Point::new(3.0, 10.0)));
        assert_eq!(p.dash_offset(0.0), 11.0);
        assert_eq!(p.dash_offset(1.0), 0.0);
    }

    #[test]
    fn test_length_of_straight_cubic() {
        let mut p = Path::new();
        p.move_to(Point::new(0.0, 0.0)).cubic_to(
            Point::new(10.0, 0.0),
            Point::new(20.0, 0.0),
            Point::new(30.0, 0.0),
        );
        assert!((p.length() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_closed_square_length() {
        let mut p = Path::new();
        p.move_to(Point::new(0.0, 0.0))
            .line_to(Point::new(1.0, 0.0))
            .line_to(Point::new(1.0, 1.0))
            .line_to(Point::new(0.0, 1.0))
            .close();
        assert_eq!(p.length(), 4.0);
    }

    #[test]
    fn test_linear_line_passes_through_samples() {
        let (samples, scales) = fixture();
        let line = PathGenerator::new(Curve::Linear).line(&samples, &scales);
        assert_eq!(line.commands().len(), 3);
        assert_eq!(line.end_point(), Some(scales.project(&samples[2])));
    }

    #[test]
    fn test_catmull_rom_ends_on_samples() {
        let (samples, scales) = fixture();
        let line = PathGenerator::default().line(&samples, &scales);
        assert_eq!(line.commands().len(), 3);
        for (cmd, s) in line.commands()[1..].iter().zip(&samples[1..]) {
            match cmd {
                PathCommand::CubicTo { to, .. } => assert_eq!(*to, scales.project(s)),
                other => panic!("unexpected {:?}", other),
            }
        }
        // A curve through the same points is never shorter than the polyline.
        let poly = PathGenerator::new(Curve::Linear).line(&samples, &scales);
        assert!(line.length() >= poly.length() - 1e-9);
    }

    #[test]
    fn test_static_line_excludes_newest_while_revealing() {
        let (samples, scales) = fixture();
        let generator = PathGenerator::new(Curve::Linear);
        let still = generator.static_line(&samples, &scales, true);
        assert_eq!(still.end_point(), Some(scales.project(&samples[1])));
        let full = generator.static_line(&samples, &scales, false);
        assert_eq!(full.end_point(), Some(scales.project(&samples[2])));
    }

    #[test]
    fn test_linear_segment_interpolates() {
        let (samples, scales) = fixture();
        let generator = PathGenerator::new(Curve::Linear);
        let seg = generator.segment(&samples, 0.5, &scales);
        let a = scales.project(&samples[1]);
        let b = scales.project(&samples[2]);
        assert_eq!(seg.end_point(), Some(a.lerp(b, 0.5)));
        let zero = generator.segment(&samples, 0.0, &scales);
        assert_eq!(zero.length(), 0.0);
        assert!(generator.segment(&samples[..1], 0.5, &scales).is_empty());
    }

    #[test]
    fn test_segment_follows_line_curve() {
        let (samples, scales) = fixture();
        let generator = PathGenerator::default();
        let line = generator.line(&samples, &scales);
        let Some(&PathCommand::CubicTo { c1, c2, to }) = line.commands().last() else {
            panic!("expected a cubic");
        };
        let from = scales.project(&samples[1]);

        let full = generator.segment(&samples, 1.0, &scales);
        let end = full.end_point().unwrap();
        assert!(end.distance(to) < 1e-9);
        let mut last_piece = Path::new();
        last_piece.move_to(from).cubic_to(c1, c2, to);
        assert!((full.length() - last_piece.length()).abs() < 1e-6);

        for t in [0.25, 0.5, 0.75] {
            let tip = generator.segment(&samples, t, &scales).end_point().unwrap();
            assert!(tip.distance(cubic_point(from, c1, c2, to, t)) < 1e-9, "t = {}", t);
        }
        // Two samples: no neighbour to bend around, so the segment is straight.
        let two = generator.segment(&samples[1..], 0.5, &scales);
        assert_eq!(two.end_point(), Some(from.lerp(scales.project(&samples[2]), 0.5)));
    }

    #[test]
    fn test_area_closes_on_baseline() {
        let (samples, scales) = fixture();
        let area = PathGenerator::new(Curve::Linear).area(&samples, &scales, None);
        let cmds = area.commands();
        assert_eq!(cmds.first(), Some(&PathCommand::MoveTo { to: Point::new(50.0, 370.0) }));
        assert_eq!(cmds[cmds.len() - 2], PathCommand::LineTo { to: Point::new(780.0, 370.0) });
        assert_eq!(cmds.last(), Some(&PathCommand::Close));
        assert!(PathGenerator::default().area(&[], &scales, None).is_empty());
    }

    #[test]
    fn test_head_is_constrained() {
        let (mut samples, scales) = fixture();
        samples.push(Sample::new(1400, 99999.0));
        let generator = PathGenerator::default();
        let head = generator.head(&samples, None, &scales).unwrap();
        let top = scales.y(scales.bounds.max - scales.margin);
        assert!((head.y - top).abs() < 1e-9);

        let tip = scales
            .project(&samples[0])
            .lerp(scales.project(&samples[1]), 0.5);
        let mid = generator.head(&samples, Some(tip), &scales).unwrap();
        assert!((mid.x - scales.x(1100)).abs() < 1e-9);
        assert!((mid.y - scales.y(45050.0)).abs() < 1e-9);

        let outside = Point::new(tip.x, scales.y(99999.0));
        let clamped = generator.head(&samples, Some(outside), &scales).unwrap();
        assert!((clamped.y - top).abs() < 1e-9);
    }

    #[test]
    fn test_echo_path_uses_visible_prefix() {
        let (samples, scales) = fixture();
        let echo = EchoState {
            path: samples.clone(),
            progress: 0.1,
            phase: crate::animation::Phase::Animating,
        };
        let path = PathGenerator::new(Curve::Linear).echo(&echo, &scales);
        assert_eq!(path.commands().len(), 2);
    }
}
