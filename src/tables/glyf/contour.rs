use std::ops::Range;

/// Number of interpolated points emitted for each quadratic segment.
const CURVE_STEPS: u32 = 10;

/// A single outline point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub on_curve: bool,
    /// The sub-path this point belongs to
    pub shape: u16,
}

impl Point {
    fn midpoint(self, other: Point) -> Point {
        Point {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
            on_curve: true,
            shape: self.shape,
        }
    }
}

/// Outline points stored as parallel arrays of equal length.
///
/// A contour can hold several sub-paths; the `shape` array tags each point
/// with the sub-path it belongs to. Before reconstruction the points mix
/// on-curve and off-curve control points. After reconstruction every point
/// is on-curve and each shape is a closed polyline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contour {
    on_curve: Vec<bool>,
    x: Vec<f64>,
    y: Vec<f64>,
    shape: Vec<u16>,
}

impl Contour {
    pub const fn new() -> Self {
        Self {
            on_curve: Vec::new(),
            x: Vec::new(),
            y: Vec::new(),
            shape: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            on_curve: Vec::with_capacity(capacity),
            x: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
            shape: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, point: Point) {
        self.on_curve.push(point.on_curve);
        self.x.push(point.x);
        self.y.push(point.y);
        self.shape.push(point.shape);
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn on_curve(&self) -> &[bool] {
        &self.on_curve
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn shapes(&self) -> &[u16] {
        &self.shape
    }

    pub fn point(&self, index: usize) -> Option<Point> {
        Some(Point {
            x: *self.x.get(index)?,
            y: *self.y.get(index)?,
            on_curve: *self.on_curve.get(index)?,
            shape: *self.shape.get(index)?,
        })
    }

    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        (0..self.len()).filter_map(|i| self.point(i))
    }

    /// Index ranges of consecutive points sharing a shape id.
    pub fn shape_ranges(&self) -> Vec<Range<usize>> {
        let mut ranges = Vec::new();
        let mut start = 0;
        for i in 1..=self.shape.len() {
            if i == self.shape.len() || self.shape[i] != self.shape[i - 1] {
                ranges.push(start..i);
                start = i;
            }
        }
        ranges
    }

    /// Appends the points of `other`, renumbering its shapes so they stay
    /// distinct from the shapes already present.
    pub fn append_shapes(&mut self, other: &Contour) {
        let base = self.shape.last().map_or(0, |&last| last.saturating_add(1));
        for point in other.points() {
            self.push(Point {
                shape: base.saturating_add(point.shape),
                ..point
            });
        }
    }

    /// Converts on/off-curve control points into closed polylines, one per
    /// shape.
    ///
    /// Consecutive off-curve points get the implied on-curve midpoint
    /// between them, every shape is closed back onto its first point, and
    /// each on → off → on run is flattened into the start point plus nine
    /// points of the quadratic Bézier at t = 0.1 … 0.9, truncated to whole
    /// units. The closing point itself is not emitted, so a shape of `n`
    /// on-curve points yields exactly those `n` points.
    pub fn reconstruct(&self) -> Contour {
        let mut out = Contour::with_capacity(self.len());
        for range in self.shape_ranges() {
            let mut points: Vec<Point> = range.filter_map(|i| self.point(i)).collect();
            drop_repeated_start(&mut points);
            let Some(points) = start_on_curve(points) else {
                continue;
            };
            tessellate(&expand_implied_points(&points), &mut out);
        }
        out
    }
}

/// Drops a trailing point that re-emits the first point of its shape.
fn drop_repeated_start(points: &mut Vec<Point>) {
    if let [first, .., last] = points.as_slice() {
        if first == last {
            points.pop();
        }
    }
}

/// Rotates the shape so it begins on an on-curve point. A shape made only
/// of control points begins at the implied midpoint of its last and first
/// points.
fn start_on_curve(mut points: Vec<Point>) -> Option<Vec<Point>> {
    let first = *points.first()?;
    match points.iter().position(|p| p.on_curve) {
        Some(start) => points.rotate_left(start),
        None => {
            let last = points[points.len() - 1];
            points.insert(0, last.midpoint(first));
        }
    }
    Some(points)
}

/// Inserts the implied on-curve point between consecutive off-curve points
/// and closes the shape with a copy of its first point.
fn expand_implied_points(points: &[Point]) -> Vec<Point> {
    let mut expanded: Vec<Point> = Vec::with_capacity(points.len() * 2 + 1);
    for &point in points {
        if !point.on_curve {
            if let Some(&previous) = expanded.last() {
                if !previous.on_curve {
                    expanded.push(previous.midpoint(point));
                }
            }
        }
        expanded.push(point);
    }
    if let Some(&first) = points.first() {
        expanded.push(first);
    }
    expanded
}

fn tessellate(expanded: &[Point], out: &mut Contour) {
    let mut i = 0;
    while i + 1 < expanded.len() {
        let start = expanded[i];
        if !start.on_curve {
            i += 1;
            continue;
        }

        let next = expanded[i + 1];
        if next.on_curve {
            out.push(start);
            i += 1;
            continue;
        }

        match expanded.get(i + 2) {
            Some(&end) if end.on_curve => {
                out.push(start);
                for step in 1..CURVE_STEPS {
                    let t = f64::from(step) / f64::from(CURVE_STEPS);
                    out.push(quadratic_point(start, next, end, t));
                }
                i += 2;
            }
            _ => i += 1,
        }
    }
}

/// `B(t) = (1-t)²·P0 + 2t(1-t)·P1 + t²·P2`, truncated toward zero.
fn quadratic_point(p0: Point, p1: Point, p2: Point, t: f64) -> Point {
    let u = 1.0 - t;
    let blend = |a: f64, b: f64, c: f64| (u * u * a + 2.0 * t * u * b + t * t * c).trunc();
    Point {
        x: blend(p0.x, p1.x, p2.x),
        y: blend(p0.y, p1.y, p2.y),
        on_curve: true,
        shape: p0.shape,
    }
}
