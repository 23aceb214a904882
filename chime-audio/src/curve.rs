//! Piecewise-linear curves
//!
//! Curves are short lists of `(t, v)` control points, ordered by `t`. Values
//! hold flat before the first point and after the last one. Two points at the
//! same time form a step: the later point wins from that time on.

/// One sample of a curve
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlPoint {
    /// Time in seconds
    pub t: f32,
    pub v: f32,
}

impl ControlPoint {
    pub const fn new(t: f32, v: f32) -> Self {
        Self { t, v }
    }
}

impl From<(f32, f32)> for ControlPoint {
    fn from((t, v): (f32, f32)) -> Self {
        Self::new(t, v)
    }
}

/// Evaluate `points` at time `t`
///
/// Points must be non-decreasing in `t`; they are not sorted here. An empty
/// slice evaluates to 0.
pub fn evaluate(points: &[ControlPoint], t: f32) -> f32 {
    match points {
        [] => return 0.0,
        [only] => return only.v,
        _ => {}
    }

    // Last point at or before `t`, falling back to the first point
    let prev_index = points
        .iter()
        .rposition(|point| point.t <= t)
        .unwrap_or(0);
    let next_index = (prev_index + 1).min(points.len() - 1);

    let prev = points[prev_index];
    let next = points[next_index];

    if t <= prev.t || prev_index == next_index {
        return prev.v;
    }

    let span = next.t - prev.t;
    if span <= 0.0 {
        return prev.v;
    }

    let ratio = (t - prev.t) / span;
    prev.v + ratio * (next.v - prev.v)
}

/// An owned curve
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Curve {
    points: Vec<ControlPoint>,
}

impl Curve {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a curve from `(t, v)` pairs
    pub fn from_points(points: impl IntoIterator<Item = (f32, f32)>) -> Self {
        Self {
            points: points.into_iter().map(ControlPoint::from).collect(),
        }
    }

    /// Append a point (callers keep times non-decreasing)
    pub fn push(&mut self, t: f32, v: f32) {
        self.points.push(ControlPoint::new(t, v));
    }

    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn evaluate(&self, t: f32) -> f32 {
        evaluate(&self.points, t)
    }

    /// Time of the last point, 0 when empty
    pub fn duration(&self) -> f32 {
        self.points.last().map_or(0.0, |point| point.t)
    }
}

impl From<Vec<ControlPoint>> for Curve {
    fn from(points: Vec<ControlPoint>) -> Self {
        Self { points }
    }
}
