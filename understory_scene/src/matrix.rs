// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Row-major 3×3 affine matrix.

use core::ops::Mul;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Affine, Point};

/// A 3×3 affine transform in row-major `[a b tx; c d ty; 0 0 1]` form.
///
/// Matrices compose by ordinary matrix multiplication: `m1 * m2` applies `m2`
/// first and `m1` second when used on a column point. Building a local
/// transform as `translation * rotation * scaling` therefore scales, then
/// rotates, then translates.
///
/// Cached matrices are owned by cache units and overwritten in place with
/// [`set_data`](Self::set_data) and [`multiply`](Self::multiply); they are
/// never reallocated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix {
    rows: [[f64; 3]; 3],
}

impl Matrix {
    /// The identity matrix.
    pub const IDENTITY: Self = Self {
        rows: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    /// Creates a matrix from nine cells in row-major order.
    #[inline]
    #[must_use]
    pub const fn new(cells: [f64; 9]) -> Self {
        Self {
            rows: [
                [cells[0], cells[1], cells[2]],
                [cells[3], cells[4], cells[5]],
                [cells[6], cells[7], cells[8]],
            ],
        }
    }

    /// A translation by `(x, y)`.
    #[inline]
    #[must_use]
    pub const fn translation(x: f64, y: f64) -> Self {
        Self::new([1.0, 0.0, x, 0.0, 1.0, y, 0.0, 0.0, 1.0])
    }

    /// A clockwise rotation by `degrees` in a y-down coordinate system.
    #[must_use]
    pub fn rotation(degrees: f64) -> Self {
        let radians = degrees.to_radians();
        #[cfg(feature = "std")]
        let (s, c) = radians.sin_cos();
        #[cfg(not(feature = "std"))]
        let (s, c) = (radians.sin(), radians.cos());
        Self::new([c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0])
    }

    /// A scaling by `(sx, sy)`.
    #[inline]
    #[must_use]
    pub const fn scaling(sx: f64, sy: f64) -> Self {
        Self::new([sx, 0.0, 0.0, 0.0, sy, 0.0, 0.0, 0.0, 1.0])
    }

    /// Overwrites all nine cells, row by row.
    pub fn set_data(
        &mut self,
        m00: f64,
        m01: f64,
        m02: f64,
        m10: f64,
        m11: f64,
        m12: f64,
        m20: f64,
        m21: f64,
        m22: f64,
    ) -> &mut Self {
        self.rows = [[m00, m01, m02], [m10, m11, m12], [m20, m21, m22]];
        self
    }

    /// Resets this matrix to the identity.
    pub fn set_identity_data(&mut self) -> &mut Self {
        *self = Self::IDENTITY;
        self
    }

    /// Replaces this matrix with the product `m[0] · m[1] · … · m[n-1]`.
    ///
    /// An empty list yields the identity. The product is accumulated in a
    /// temporary, so the receiver's old contents never leak into the result.
    pub fn multiply(&mut self, matrices: &[&Self]) -> &mut Self {
        let product = matrices
            .iter()
            .fold(Self::IDENTITY, |acc, &m| acc * *m);
        *self = product;
        self
    }

    /// Returns the nine cells in row-major order.
    #[inline]
    #[must_use]
    pub const fn to_array(&self) -> [f64; 9] {
        let r = &self.rows;
        [
            r[0][0], r[0][1], r[0][2], r[1][0], r[1][1], r[1][2], r[2][0], r[2][1], r[2][2],
        ]
    }

    /// Returns the cell at `row`, `col`.
    ///
    /// # Panics
    ///
    /// Panics if either index is 3 or more.
    #[inline]
    #[must_use]
    pub const fn cell(&self, row: usize, col: usize) -> f64 {
        self.rows[row][col]
    }

    /// Maps a point through this matrix.
    #[inline]
    #[must_use]
    pub fn transform_point(&self, point: Point) -> Point {
        let r = &self.rows;
        Point::new(
            r[0][0] * point.x + r[0][1] * point.y + r[0][2],
            r[1][0] * point.x + r[1][1] * point.y + r[1][2],
        )
    }

    /// Returns the translation cells `(tx, ty)`.
    #[inline]
    #[must_use]
    pub const fn translation_point(&self) -> Point {
        Point::new(self.rows[0][2], self.rows[1][2])
    }

    /// Returns `true` if every cell is within `eps` of `other`'s.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        self.to_array()
            .iter()
            .zip(other.to_array())
            .all(|(a, b)| (a - b).abs() <= eps)
    }
}

impl Default for Matrix {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Matrix {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let a = &self.rows;
        let b = &rhs.rows;
        let mut out = [[0.0_f64; 3]; 3];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
            }
        }
        Self { rows: out }
    }
}

impl From<Matrix> for Affine {
    fn from(m: Matrix) -> Self {
        let r = m.rows;
        Self::new([r[0][0], r[1][0], r[0][1], r[1][1], r[0][2], r[1][2]])
    }
}

impl From<Affine> for Matrix {
    fn from(affine: Affine) -> Self {
        let [a, b, c, d, e, f] = affine.as_coeffs();
        Self::new([a, c, e, b, d, f, 0.0, 0.0, 1.0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_point(actual: Point, expected: (f64, f64)) {
        assert!(
            (actual.x - expected.0).abs() < EPS && (actual.y - expected.1).abs() < EPS,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn default_is_identity() {
        assert_eq!(Matrix::default(), Matrix::IDENTITY);
        assert_eq!(
            Matrix::IDENTITY.to_array(),
            [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]
        );
    }

    #[test]
    fn set_data_is_row_major() {
        let mut m = Matrix::IDENTITY;
        m.set_data(1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0);
        assert_eq!(m.cell(0, 2), 3.0);
        assert_eq!(m.cell(1, 0), 4.0);
        assert_eq!(m.to_array(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);

        m.set_identity_data();
        assert_eq!(m, Matrix::IDENTITY);
    }

    #[test]
    fn multiply_empty_is_identity() {
        let mut m = Matrix::translation(5.0, 5.0);
        m.multiply(&[]);
        assert_eq!(m, Matrix::IDENTITY);
    }

    #[test]
    fn multiply_ignores_previous_contents() {
        let t = Matrix::translation(3.0, 4.0);
        let s = Matrix::scaling(2.0, 2.0);
        let mut m = Matrix::translation(100.0, 100.0);
        m.multiply(&[&t, &s]);
        assert_eq!(m, t * s);
    }

    #[test]
    fn multiply_folds_in_order() {
        let t = Matrix::translation(10.0, 0.0);
        let s = Matrix::scaling(2.0, 1.0);
        let mut ts = Matrix::IDENTITY;
        ts.multiply(&[&t, &s]);
        let mut st = Matrix::IDENTITY;
        st.multiply(&[&s, &t]);

        // Scale first, then translate.
        assert_point(ts.transform_point(Point::new(1.0, 0.0)), (12.0, 0.0));
        // Translate first, then scale.
        assert_point(st.transform_point(Point::new(1.0, 0.0)), (22.0, 0.0));
    }

    #[test]
    fn trs_composition_order() {
        let t = Matrix::translation(10.0, 0.0);
        let r = Matrix::rotation(90.0);
        let s = Matrix::scaling(2.0, 1.0);
        let mut m = Matrix::IDENTITY;
        m.multiply(&[&t, &r, &s]);

        assert_point(s.transform_point(Point::new(1.0, 0.0)), (2.0, 0.0));
        assert_point(r.transform_point(Point::new(2.0, 0.0)), (0.0, 2.0));
        assert_point(m.transform_point(Point::new(1.0, 0.0)), (10.0, 2.0));
    }

    #[test]
    fn translation_point_reads_last_column() {
        let m = Matrix::translation(7.0, -3.0) * Matrix::rotation(30.0);
        assert_eq!(m.translation_point(), Point::new(7.0, -3.0));
    }

    #[test]
    fn affine_conversion_agrees() {
        let m = Matrix::translation(4.0, 5.0) * Matrix::rotation(33.0) * Matrix::scaling(2.0, 3.0);
        let affine = Affine::from(m);
        let p = Point::new(1.5, -2.0);
        let a = affine * p;
        let b = m.transform_point(p);
        assert!((a - b).hypot() < EPS, "{a:?} != {b:?}");
        assert!(Matrix::from(affine).approx_eq(&m, EPS));
    }
}
