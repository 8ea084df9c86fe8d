use super::contour::{Contour, Point};

/// Threshold below which two scale magnitudes count as equal when deciding
/// whether to double the component scale factors.
const SCALE_EPSILON: f64 = 33.0 / 65536.0;

/// The affine map a compound glyph applies to one of its components.
///
/// `a`, `b`, `c` and `d` form the linear part, `e` and `f` the offset, and
/// `m` and `n` are the normalisation factors derived from the linear part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
    pub m: f64,
    pub n: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
        m: 1.0,
        n: 1.0,
    };

    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        let mut m = a.abs().max(b.abs());
        if (a.abs() - c.abs()).abs() < SCALE_EPSILON {
            m *= 2.0;
        }
        let mut n = c.abs().max(d.abs());
        if (b.abs() - d.abs()).abs() < SCALE_EPSILON {
            n *= 2.0;
        }
        Self { a, b, c, d, e, f, m, n }
    }

    /// Maps a single coordinate pair.
    ///
    /// The y result is computed from the already transformed x, not the
    /// original one:
    ///
    /// ```text
    /// x' = m · (x·a/m + y·c/m + e)
    /// y' = n · (x'·b/n + y·d/n + f)
    /// ```
    pub fn apply_xy(&self, x: f64, y: f64) -> (f64, f64) {
        let x_new = normalised(self.m, x * self.a, y * self.c, self.e);
        let y_new = normalised(self.n, x_new * self.b, y * self.d, self.f);
        (x_new, y_new)
    }

    pub fn apply(&self, contour: &Contour) -> Contour {
        let mut out = Contour::with_capacity(contour.len());
        for point in contour.points() {
            let (x, y) = self.apply_xy(point.x, point.y);
            out.push(Point { x, y, ..point });
        }
        out
    }
}

/// `scale · (u/scale + v/scale + offset)`, which reduces to
/// `u + v + scale·offset` and stays finite when the scale is zero.
fn normalised(scale: f64, u: f64, v: f64, offset: f64) -> f64 {
    if scale == 0.0 {
        u + v
    } else {
        scale * (u / scale + v / scale + offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn identity_keeps_points() {
        let t = Transform::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
        assert_eq!(t, Transform::IDENTITY);
        assert_eq!(t.apply_xy(12.0, -7.0), (12.0, -7.0));
    }

    #[test]
    fn plain_offset() {
        let t = Transform::new(1.0, 0.0, 0.0, 1.0, 100.0, 50.0);
        assert_eq!(t.apply_xy(10.0, 10.0), (110.0, 60.0));
    }

    #[test]
    fn equal_magnitudes_double_the_scale() {
        let t = Transform::new(0.5, 0.5, 0.5, 0.5, 0.0, 0.0);
        assert_eq!((t.m, t.n), (1.0, 1.0));

        let t = Transform::new(0.5, 0.0, 0.0, 0.5, 10.0, 10.0);
        assert_eq!((t.m, t.n), (0.5, 0.5));
        // the offset is scaled by m and n
        assert_eq!(t.apply_xy(0.0, 0.0), (5.0, 5.0));
    }

    #[test]
    fn y_uses_transformed_x() {
        let t = Transform::new(2.0, 1.0, 0.0, 1.0, 0.0, 0.0);
        // x' = 2 · 3 = 6, y' = 6 · 1 + 4 = 10
        assert_eq!(t.apply_xy(3.0, 4.0), (6.0, 10.0));
    }

    #[test]
    fn zero_scale_stays_finite() {
        let t = Transform::new(0.0, 0.0, 0.0, 0.0, 5.0, 5.0);
        assert_eq!((t.m, t.n), (0.0, 0.0));
        assert_eq!(t.apply_xy(3.0, 4.0), (0.0, 0.0));
    }

    #[test]
    fn apply_keeps_flags_and_shapes() {
        let mut contour = Contour::new();
        contour.push(Point {
            x: 1.0,
            y: 2.0,
            on_curve: false,
            shape: 3,
        });
        let moved = Transform::new(1.0, 0.0, 0.0, 1.0, 10.0, 20.0).apply(&contour);
        assert_eq!(
            moved.point(0),
            Some(Point {
                x: 11.0,
                y: 22.0,
                on_curve: false,
                shape: 3,
            })
        );
    }
}
