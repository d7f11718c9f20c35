//! EXIF orientation values and the dihedral transform algebra.
//!
//! Three views of the same eight symmetries of a rectangle live here:
//!
//! - [`Orientation`] - the EXIF tag value (plus `NotAvailable` for files
//!   without the tag)
//! - [`Matrix`] - an exact integer 2x2 matrix acting on column vectors
//!   `(x, y)` in image coordinates (y grows downwards)
//! - [`TransformCode`] - the lossless transform the coefficient codec knows
//!   how to perform
//!
//! Composition is done on codes through a table that is computed at compile
//! time from the matrices, so any number of accumulated transforms stays exact.
//!
//! # Examples
//!
//! ```ignore
//! use jpegcontent_core::orientation::TransformCode;
//!
//! let mut pending = TransformCode::None;
//! for _ in 0..49 {
//!     pending = pending.then(TransformCode::Rot90);
//! }
//! assert_eq!(pending, TransformCode::Rot90);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for transform lookups.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransformError {
    /// The matrix is not one of the eight symmetries of a rectangle.
    #[error("Matrix {0:?} does not describe a lossless transform")]
    UnknownMatrix(Matrix),
}

/// EXIF orientation values (1-8), with 0 for "no orientation tag".
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Orientation {
    /// The file carries no (valid) orientation tag.
    #[default]
    NotAvailable = 0,
    /// Normal (no transformation needed).
    Normal = 1,
    /// Horizontal flip.
    FlipHorizontal = 2,
    /// Rotate 180 degrees.
    Rotate180 = 3,
    /// Vertical flip.
    FlipVertical = 4,
    /// Transpose (rotate 90 CW + horizontal flip).
    Transpose = 5,
    /// Rotate 90 degrees clockwise.
    Rotate90 = 6,
    /// Transverse (rotate 270 CW + horizontal flip).
    Transverse = 7,
    /// Rotate 270 degrees clockwise (90 CCW).
    Rotate270 = 8,
}

impl Orientation {
    /// All orientations that correspond to a real transform, in tag order.
    pub const ALL: [Orientation; 8] = [
        Orientation::Normal,
        Orientation::FlipHorizontal,
        Orientation::Rotate180,
        Orientation::FlipVertical,
        Orientation::Transpose,
        Orientation::Rotate90,
        Orientation::Transverse,
        Orientation::Rotate270,
    ];

    /// Map a raw EXIF value; anything outside 1..=8 is `NotAvailable`.
    pub fn from_exif(value: u32) -> Self {
        match value {
            1 => Orientation::Normal,
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270,
            _ => Orientation::NotAvailable,
        }
    }

    /// Returns true if this orientation swaps width and height dimensions.
    ///
    /// Rotations of 90° and 270° (and their flip variants Transpose/Transverse)
    /// swap the image dimensions.
    #[inline]
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Orientation::Transpose
                | Orientation::Rotate90
                | Orientation::Transverse
                | Orientation::Rotate270
        )
    }

    /// The codec transform that brings an image with this orientation upright.
    ///
    /// `NotAvailable` has no transform at all.
    pub fn transform_code(self) -> Option<TransformCode> {
        match self {
            Orientation::NotAvailable => None,
            Orientation::Normal => Some(TransformCode::None),
            Orientation::FlipHorizontal => Some(TransformCode::FlipH),
            Orientation::Rotate180 => Some(TransformCode::Rot180),
            Orientation::FlipVertical => Some(TransformCode::FlipV),
            Orientation::Transpose => Some(TransformCode::Transpose),
            Orientation::Rotate90 => Some(TransformCode::Rot90),
            Orientation::Transverse => Some(TransformCode::Transverse),
            Orientation::Rotate270 => Some(TransformCode::Rot270),
        }
    }

    /// The matrix of [`Orientation::transform_code`].
    pub fn matrix(self) -> Option<Matrix> {
        self.transform_code().map(TransformCode::matrix)
    }
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        Orientation::from_exif(value)
    }
}

/// Integer 2x2 matrix `[[a, b], [c, d]]` acting on column vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Matrix(pub [[i8; 2]; 2]);

impl Matrix {
    pub const IDENTITY: Matrix = Matrix([[1, 0], [0, 1]]);

    /// Matrix product `self × rhs` (apply `rhs` first).
    pub const fn mul(self, rhs: Matrix) -> Matrix {
        let a = self.0;
        let b = rhs.0;
        Matrix([
            [
                a[0][0] * b[0][0] + a[0][1] * b[1][0],
                a[0][0] * b[0][1] + a[0][1] * b[1][1],
            ],
            [
                a[1][0] * b[0][0] + a[1][1] * b[1][0],
                a[1][0] * b[0][1] + a[1][1] * b[1][1],
            ],
        ])
    }

    /// Map a point through the matrix.
    pub fn apply(self, x: i32, y: i32) -> (i32, i32) {
        let m = self.0;
        (
            i32::from(m[0][0]) * x + i32::from(m[0][1]) * y,
            i32::from(m[1][0]) * x + i32::from(m[1][1]) * y,
        )
    }

    const fn same(self, other: Matrix) -> bool {
        self.0[0][0] == other.0[0][0]
            && self.0[0][1] == other.0[0][1]
            && self.0[1][0] == other.0[1][0]
            && self.0[1][1] == other.0[1][1]
    }
}

/// Lossless transforms, in the order libjpeg's `JXFORM_CODE` lists them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum TransformCode {
    #[default]
    None = 0,
    FlipH = 1,
    FlipV = 2,
    /// Mirror across the main diagonal.
    Transpose = 3,
    /// Mirror across the anti-diagonal.
    Transverse = 4,
    Rot90 = 5,
    Rot180 = 6,
    Rot270 = 7,
}

const MATRICES: [Matrix; 8] = [
    Matrix([[1, 0], [0, 1]]),
    Matrix([[-1, 0], [0, 1]]),
    Matrix([[1, 0], [0, -1]]),
    Matrix([[0, 1], [1, 0]]),
    Matrix([[0, -1], [-1, 0]]),
    Matrix([[0, -1], [1, 0]]),
    Matrix([[-1, 0], [0, -1]]),
    Matrix([[0, 1], [-1, 0]]),
];

const fn index_of(m: Matrix) -> usize {
    let mut i = 0;
    while i < MATRICES.len() {
        if MATRICES[i].same(m) {
            return i;
        }
        i += 1;
    }
    panic!("dihedral group is not closed under multiplication");
}

/// `COMPOSITION[a][b]`: transform `a` followed by transform `b`.
const COMPOSITION: [[u8; 8]; 8] = {
    let mut table = [[0u8; 8]; 8];
    let mut a = 0;
    while a < 8 {
        let mut b = 0;
        while b < 8 {
            table[a][b] = index_of(MATRICES[b].mul(MATRICES[a])) as u8;
            b += 1;
        }
        a += 1;
    }
    table
};

impl TransformCode {
    pub const ALL: [TransformCode; 8] = [
        TransformCode::None,
        TransformCode::FlipH,
        TransformCode::FlipV,
        TransformCode::Transpose,
        TransformCode::Transverse,
        TransformCode::Rot90,
        TransformCode::Rot180,
        TransformCode::Rot270,
    ];

    pub fn matrix(self) -> Matrix {
        MATRICES[self as usize]
    }

    /// Exact reverse lookup of [`TransformCode::matrix`].
    pub fn from_matrix(matrix: Matrix) -> Result<Self, TransformError> {
        Self::ALL
            .into_iter()
            .find(|code| code.matrix() == matrix)
            .ok_or(TransformError::UnknownMatrix(matrix))
    }

    /// This transform followed by `next`.
    pub fn then(self, next: TransformCode) -> TransformCode {
        Self::ALL[COMPOSITION[self as usize][next as usize] as usize]
    }

    pub fn inverse(self) -> TransformCode {
        match self {
            TransformCode::Rot90 => TransformCode::Rot270,
            TransformCode::Rot270 => TransformCode::Rot90,
            other => other,
        }
    }

    /// True for the transforms that exchange width and height.
    pub fn transposes(self) -> bool {
        matches!(
            self,
            TransformCode::Transpose
                | TransformCode::Transverse
                | TransformCode::Rot90
                | TransformCode::Rot270
        )
    }

    /// Decompose into `(transpose, mirror_x, mirror_y)`, applied in that order.
    pub(crate) fn steps(self) -> (bool, bool, bool) {
        match self {
            TransformCode::None => (false, false, false),
            TransformCode::FlipH => (false, true, false),
            TransformCode::FlipV => (false, false, true),
            TransformCode::Transpose => (true, false, false),
            TransformCode::Transverse => (true, true, true),
            TransformCode::Rot90 => (true, true, false),
            TransformCode::Rot180 => (false, true, true),
            TransformCode::Rot270 => (true, false, true),
        }
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn code_strategy() -> impl Strategy<Value = TransformCode> {
        (0usize..8).prop_map(|i| TransformCode::ALL[i])
    }

    fn orientation_strategy() -> impl Strategy<Value = Orientation> {
        (0usize..8).prop_map(|i| Orientation::ALL[i])
    }

    proptest! {
        /// Property: composition is associative.
        #[test]
        fn prop_composition_associative(
            a in code_strategy(),
            b in code_strategy(),
            c in code_strategy(),
        ) {
            prop_assert_eq!(a.then(b).then(c), a.then(b.then(c)));
        }

        /// Property: folding any sequence of codes equals the matrix product.
        #[test]
        fn prop_sequence_matches_matrix_product(
            seq in prop::collection::vec(orientation_strategy(), 0..64),
        ) {
            let mut code = TransformCode::None;
            let mut matrix = Matrix::IDENTITY;
            for o in &seq {
                let next = o.transform_code().unwrap();
                code = code.then(next);
                matrix = next.matrix().mul(matrix);
            }
            prop_assert_eq!(code.matrix(), matrix);
            prop_assert_eq!(TransformCode::from_matrix(matrix), Ok(code));
        }

        /// Property: n quarter turns equal n mod 4 quarter turns.
        #[test]
        fn prop_quarter_turns_cycle(n in 0usize..200) {
            let mut code = TransformCode::None;
            for _ in 0..n {
                code = code.then(TransformCode::Rot90);
            }
            let expected = [
                TransformCode::None,
                TransformCode::Rot90,
                TransformCode::Rot180,
                TransformCode::Rot270,
            ][n % 4];
            prop_assert_eq!(code, expected);
        }
    }
}
