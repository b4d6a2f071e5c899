use serde::Serialize;

pub type Point = (f64, f64);

/// A cut line through two points; it extends infinitely in both directions.
pub type Line = (f64, f64, f64, f64);

const PARALLEL_EPS: f64 = 1e-8;
const BETWEEN_EPS: f64 = 1e-6;
const DEDUPE_EPS: f64 = 1e-5;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }

    pub fn center(&self) -> Point {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }
}

/// Signed side of `pt` relative to `line`: positive on one side, negative
/// on the other, zero on the line.
pub fn line_side(line: Line, pt: Point) -> f64 {
    let (x1, y1, x2, y2) = line;
    (x2 - x1) * (pt.1 - y1) - (y2 - y1) * (pt.0 - x1)
}

/// Intersection of segment `a`–`b` with the infinite `line`, if it lies on
/// the segment.
pub fn segment_line_intersection(a: Point, b: Point, line: Line) -> Option<Point> {
    let (x1, y1, x2, y2) = line;
    let (x3, y3) = a;
    let (x4, y4) = b;
    let denom = (x1 - x2) * (y3 - y4) - (y1 - y2) * (x3 - x4);
    if denom.abs() < PARALLEL_EPS {
        return None;
    }
    let cross_line = x1 * y2 - y1 * x2;
    let cross_seg = x3 * y4 - y3 * x4;
    let px = (cross_line * (x3 - x4) - (x1 - x2) * cross_seg) / denom;
    let py = (cross_line * (y3 - y4) - (y1 - y2) * cross_seg) / denom;
    let between = |v: f64, lo: f64, hi: f64| {
        v >= lo.min(hi) - BETWEEN_EPS && v <= lo.max(hi) + BETWEEN_EPS
    };
    if between(px, x3, x4) && between(py, y3, y4) {
        Some((px, py))
    } else {
        None
    }
}

fn dedupe_consecutive(points: Vec<Point>) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        if let Some(prev) = out.last() {
            if (p.0 - prev.0).abs() <= DEDUPE_EPS && (p.1 - prev.1).abs() <= DEDUPE_EPS {
                continue;
            }
        }
        out.push(p);
    }
    out
}

fn finish_half(points: Vec<Point>) -> Option<Vec<Point>> {
    let points = dedupe_consecutive(points);
    if points.len() > 2 {
        Some(points)
    } else {
        None
    }
}

/// Splits a convex polygon by `line`. Vertices on the line go to both
/// halves; a half with fewer than three distinct vertices is dropped.
pub fn split_polygon(poly: &[Point], line: Line) -> (Option<Vec<Point>>, Option<Vec<Point>>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    for i in 0..poly.len() {
        let a = poly[i];
        let b = poly[(i + 1) % poly.len()];
        let a_side = line_side(line, a);
        let b_side = line_side(line, b);
        if a_side >= 0.0 {
            left.push(a);
        }
        if a_side <= 0.0 {
            right.push(a);
        }
        if (a_side > 0.0 && b_side < 0.0) || (a_side < 0.0 && b_side > 0.0) {
            if let Some(hit) = segment_line_intersection(a, b, line) {
                left.push(hit);
                right.push(hit);
            }
        }
    }
    (finish_half(left), finish_half(right))
}

/// Cuts a `width` × `height` rectangle by every line in order.
pub fn shatter_rect(width: f64, height: f64, lines: &[Line]) -> Vec<Vec<Point>> {
    let mut pieces = vec![vec![(0.0, 0.0), (width, 0.0), (width, height), (0.0, height)]];
    for &line in lines {
        let mut next = Vec::with_capacity(pieces.len() * 2);
        for poly in &pieces {
            let (left, right) = split_polygon(poly, line);
            next.extend(left);
            next.extend(right);
        }
        pieces = next;
    }
    pieces
}

pub fn polygon_area(poly: &[Point]) -> f64 {
    let mut twice = 0.0;
    for i in 0..poly.len() {
        let (x1, y1) = poly[i];
        let (x2, y2) = poly[(i + 1) % poly.len()];
        twice += x1 * y2 - x2 * y1;
    }
    twice.abs() / 2.0
}

pub fn centroid(poly: &[Point]) -> Point {
    if poly.is_empty() {
        return (0.0, 0.0);
    }
    let n = poly.len() as f64;
    let (sx, sy) = poly
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.0, sy + p.1));
    (sx / n, sy / n)
}

#[cfg(test)]
mod tests {
    use super::{polygon_area, shatter_rect, split_polygon, Line, Rect};
    use crate::constants::{HEIGHT, JUDGEMENT_CUT_LINES, WIDTH};

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    fn scaled_lines(w: f64, h: f64) -> Vec<Line> {
        JUDGEMENT_CUT_LINES
            .iter()
            .map(|&(x1, y1, x2, y2)| (x1 * w, y1 * h, x2 * w, y2 * h))
            .collect()
    }

    #[test]
    fn diagonal_split_halves_square() {
        let square = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        let (left, right) = split_polygon(&square, (0.0, 0.0, 10.0, 10.0));
        let left = left.expect("left half");
        let right = right.expect("right half");
        assert_eq!(left.len(), 3);
        assert_eq!(right.len(), 3);
        assert!(approx_eq(polygon_area(&left), 50.0, 1e-9));
        assert!(approx_eq(polygon_area(&right), 50.0, 1e-9));
    }

    #[test]
    fn line_missing_polygon_keeps_one_side() {
        let square = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        let (left, right) = split_polygon(&square, (20.0, 0.0, 20.0, 10.0));
        assert!(left.is_none() != right.is_none());
    }

    #[test]
    fn shatter_conserves_stage_area() {
        let shards = shatter_rect(WIDTH, HEIGHT, &scaled_lines(WIDTH, HEIGHT));
        assert!(shards.len() > 17);
        let total: f64 = shards.iter().map(|poly| polygon_area(poly)).sum();
        let expected = WIDTH * HEIGHT;
        assert!((total - expected).abs() / expected < 1e-6);
        for poly in &shards {
            assert!(poly.len() >= 3);
        }
    }

    #[test]
    fn shatter_conserves_zoomed_view_area() {
        let (w, h) = (500.0, 333.333_333);
        let shards = shatter_rect(w, h, &scaled_lines(w, h));
        let total: f64 = shards.iter().map(|poly| polygon_area(poly)).sum();
        assert!((total - w * h).abs() / (w * h) < 1e-6);
    }

    #[test]
    fn rect_overlap_is_strict() {
        let a = Rect {
            x: 0.0,
            y: 0.0,
            w: 10.0,
            h: 10.0,
        };
        let touching = Rect {
            x: 10.0,
            y: 0.0,
            w: 10.0,
            h: 10.0,
        };
        let inside = Rect {
            x: 9.0,
            y: 9.0,
            w: 10.0,
            h: 10.0,
        };
        assert!(!a.overlaps(&touching));
        assert!(a.overlaps(&inside));
    }
}
