//! Marching-squares contouring.
//!
//! Grid vertices sit on pixel centres: pixel `[row, col]` is the point
//! `(col, row)`. Each cell of four neighbouring pixels contributes at most two
//! line segments per level; segments are not joined into polylines since the
//! renderer only needs to stroke them.

use ndarray::ArrayView2;

/// Point as `(x, y)` = `(col, row)`
pub type Point = (f64, f64);

/// Straight piece of an iso-line
pub type Segment = (Point, Point);

#[derive(Clone, Copy)]
enum Edge {
    Bottom,
    Right,
    Top,
    Left,
}

/// Interpolated crossing of `level` between two grid vertices.
fn crossing(p0: Point, v0: f64, p1: Point, v1: f64, level: f64) -> Point {
    let t = (level - v0) / (v1 - v0);
    (p0.0 + t * (p1.0 - p0.0), p0.1 + t * (p1.1 - p0.1))
}

/// Iso-line segments of `image` at `level`.
///
/// A vertex is inside when its value is strictly greater than `level`. Cells
/// with any non-finite corner are skipped. Saddle cells are disambiguated by
/// the mean of their four corners.
pub fn marching_squares(image: &ArrayView2<f64>, level: f64) -> Vec<Segment> {
    let (rows, cols) = image.dim();
    let mut segments = Vec::new();
    if rows < 2 || cols < 2 {
        return segments;
    }

    for r in 0..rows - 1 {
        for c in 0..cols - 1 {
            // Corners counter-clockwise from bottom-left
            let a = image[[r, c]];
            let b = image[[r, c + 1]];
            let cc = image[[r + 1, c + 1]];
            let d = image[[r + 1, c]];
            if !(a.is_finite() && b.is_finite() && cc.is_finite() && d.is_finite()) {
                continue;
            }

            let (x0, y0) = (c as f64, r as f64);
            let (x1, y1) = (x0 + 1.0, y0 + 1.0);
            let point = |edge: Edge| match edge {
                Edge::Bottom => crossing((x0, y0), a, (x1, y0), b, level),
                Edge::Right => crossing((x1, y0), b, (x1, y1), cc, level),
                Edge::Top => crossing((x0, y1), d, (x1, y1), cc, level),
                Edge::Left => crossing((x0, y0), a, (x0, y1), d, level),
            };

            let case = (a > level) as u8
                | ((b > level) as u8) << 1
                | ((cc > level) as u8) << 2
                | ((d > level) as u8) << 3;

            let pairs: &[(Edge, Edge)] = match case {
                0 | 15 => &[],
                1 | 14 => &[(Edge::Left, Edge::Bottom)],
                2 | 13 => &[(Edge::Bottom, Edge::Right)],
                3 | 12 => &[(Edge::Left, Edge::Right)],
                4 | 11 => &[(Edge::Right, Edge::Top)],
                6 | 9 => &[(Edge::Bottom, Edge::Top)],
                7 | 8 => &[(Edge::Left, Edge::Top)],
                5 | 10 => {
                    let centre_inside = (a + b + cc + d) / 4.0 > level;
                    let a_inside = case == 5;
                    if centre_inside == a_inside {
                        // a and c connected through the centre: cut off b and d
                        &[(Edge::Bottom, Edge::Right), (Edge::Top, Edge::Left)]
                    } else {
                        &[(Edge::Left, Edge::Bottom), (Edge::Right, Edge::Top)]
                    }
                }
                _ => unreachable!("case index is a 4-bit mask"),
            };

            segments.extend(pairs.iter().map(|&(e0, e1)| (point(e0), point(e1))));
        }
    }

    segments
}
