use crate::path::types::Point;

/// Total Euclidean length of a polyline
pub fn path_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| w[0].distance(&w[1])).sum()
}

/// Point at fraction `t` of the polyline's total length.
///
/// `t` is clamped to `[0, 1]`. A zero-length polyline yields its first point
/// and `t = 1` yields the final point exactly.
pub fn locate(points: &[Point], t: f64) -> Option<Point> {
    let first = *points.first()?;
    let total = path_length(points);
    if total == 0.0 {
        return Some(first);
    }

    let t = t.clamp(0.0, 1.0);
    if t >= 1.0 {
        return points.last().copied();
    }

    let target = total * t;
    let mut travelled = 0.0;

    for w in points.windows(2) {
        let segment = w[0].distance(&w[1]);
        if travelled + segment >= target {
            let local_t = if segment > 0.0 { (target - travelled) / segment } else { 0.0 };
            return Some(w[0].lerp(&w[1], local_t));
        }
        travelled += segment;
    }

    points.last().copied()
}

/// Join two polylines end to start.
///
/// When the junction points coincide within epsilon the duplicate is dropped.
pub fn bridge(prev: &[Point], next: &[Point]) -> Vec<Point> {
    let mut joined = Vec::with_capacity(prev.len() + next.len());
    joined.extend_from_slice(prev);

    let skip = match (prev.last(), next.first()) {
        (Some(tail), Some(head)) if tail.approx_eq(head) => 1,
        _ => 0,
    };
    joined.extend_from_slice(&next[skip..]);
    joined
}

/// [`locate`] along the bridged `prev` + `next` polyline
pub fn locate_across(prev: &[Point], next: &[Point], t: f64) -> Option<Point> {
    locate(&bridge(prev, next), t)
}
