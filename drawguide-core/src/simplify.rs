//! Polyline simplification (radial distance + Douglas-Peucker).

use crate::element::Point;

fn sq_dist(a: Point, b: Point) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

/// Squared distance from `p` to the segment `a`-`b`.
fn sq_segment_dist(p: Point, a: Point, b: Point) -> f32 {
    let mut nearest = a;
    let dx = b.x - a.x;
    let dy = b.y - a.y;

    if dx != 0.0 || dy != 0.0 {
        let t = ((p.x - a.x) * dx + (p.y - a.y) * dy) / (dx * dx + dy * dy);
        if t > 1.0 {
            nearest = b;
        } else if t > 0.0 {
            nearest = Point::new(a.x + dx * t, a.y + dy * t);
        }
    }

    sq_dist(p, nearest)
}

/// Drop consecutive points closer than the tolerance. The last point is
/// always kept.
fn simplify_radial(points: &[Point], sq_tolerance: f32) -> Vec<Point> {
    let Some((&first, rest)) = points.split_first() else {
        return Vec::new();
    };

    let mut prev = first;
    let mut kept = vec![first];
    for &point in rest {
        if sq_dist(point, prev) > sq_tolerance {
            kept.push(point);
            prev = point;
        }
    }
    if let Some(&last) = points.last() {
        if prev != last {
            kept.push(last);
        }
    }
    kept
}

fn simplify_douglas_peucker(points: &[Point], sq_tolerance: f32) -> Vec<Point> {
    let last = points.len() - 1;
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[last] = true;

    let mut ranges = vec![(0, last)];
    while let Some((first, last)) = ranges.pop() {
        let mut max_sq_dist = sq_tolerance;
        let mut index = first;

        for i in first + 1..last {
            let d = sq_segment_dist(points[i], points[first], points[last]);
            if d > max_sq_dist {
                index = i;
                max_sq_dist = d;
            }
        }

        if max_sq_dist > sq_tolerance {
            keep[index] = true;
            if index - first > 1 {
                ranges.push((first, index));
            }
            if last - index > 1 {
                ranges.push((index, last));
            }
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(&p, kept)| kept.then_some(p))
        .collect()
}

/// Simplify a polyline, keeping every point that deviates from the
/// simplified shape by more than `tolerance`.
///
/// With `highest_quality` the radial pre-pass is skipped and only
/// Douglas-Peucker runs. Inputs of two points or fewer come back unchanged.
/// The output is always a subsequence of the input that keeps both endpoints.
#[must_use]
pub fn simplify(points: &[Point], tolerance: f32, highest_quality: bool) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let sq_tolerance = tolerance * tolerance;
    let points = if highest_quality {
        points.to_vec()
    } else {
        simplify_radial(points, sq_tolerance)
    };
    if points.len() <= 2 {
        return points;
    }
    simplify_douglas_peucker(&points, sq_tolerance)
}
