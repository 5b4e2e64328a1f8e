//! Compressed Sparse Column (CSC) design matrices.
//!
//! CSC is the layout coordinate descent wants: every update touches exactly
//! one feature (column), so iterating all non-zeros of a column must cost
//! `O(nnz(column))`.
//!
//! Two flavours share the same accessors through [`SparseColumns`]:
//!
//! - [`CscMatrix`]: owns its buffers.
//! - [`CscView`]: borrows caller-owned buffers (zero-copy), e.g. arrays
//!   handed over from another runtime. The buffers must outlive the view;
//!   nothing in this crate ever frees or resizes them.

use ndarray::{Array2, ArrayView2};

use super::DataError;

// =============================================================================
// SparseColumns
// =============================================================================

/// Read-only column-major access to a sparse design matrix.
///
/// Rows are samples, columns are features.
pub trait SparseColumns {
    /// Number of rows (samples).
    fn n_rows(&self) -> usize;

    /// Number of columns (features).
    fn n_cols(&self) -> usize;

    /// Number of stored (non-zero) entries.
    fn nnz(&self) -> usize;

    /// Iterate over `(row, value)` pairs of one column, in storage order.
    fn column(&self, col: usize) -> ColumnIter<'_>;
}

// =============================================================================
// CscView
// =============================================================================

/// Borrowed CSC matrix over caller-owned buffers.
///
/// # Structure
///
/// - `values`: non-zero values, stored column by column
/// - `row_indices`: row index for each value
/// - `col_ptrs`: `col_ptrs[j]..col_ptrs[j + 1]` is the range of column `j`
#[derive(Debug, Clone, Copy)]
pub struct CscView<'a> {
    values: &'a [f64],
    row_indices: &'a [u32],
    col_ptrs: &'a [u32],
    n_rows: usize,
    n_cols: usize,
}

impl<'a> CscView<'a> {
    /// Wrap existing CSC buffers after validating their structure.
    ///
    /// # Errors
    ///
    /// Returns [`DataError`] if the pointer array has the wrong length, is
    /// not monotone, disagrees with the value count, or a row index is out of
    /// range.
    pub fn new(
        values: &'a [f64],
        row_indices: &'a [u32],
        col_ptrs: &'a [u32],
        n_rows: usize,
        n_cols: usize,
    ) -> Result<Self, DataError> {
        validate_parts(values, row_indices, col_ptrs, n_rows, n_cols)?;
        Ok(Self {
            values,
            row_indices,
            col_ptrs,
            n_rows,
            n_cols,
        })
    }

    #[inline]
    fn column_range(&self, col: usize) -> std::ops::Range<usize> {
        assert!(col < self.n_cols, "Column {} out of bounds", col);
        self.col_ptrs[col] as usize..self.col_ptrs[col + 1] as usize
    }
}

impl SparseColumns for CscView<'_> {
    #[inline]
    fn n_rows(&self) -> usize {
        self.n_rows
    }

    #[inline]
    fn n_cols(&self) -> usize {
        self.n_cols
    }

    #[inline]
    fn nnz(&self) -> usize {
        self.values.len()
    }

    #[inline]
    fn column(&self, col: usize) -> ColumnIter<'_> {
        let range = self.column_range(col);
        ColumnIter {
            values: &self.values[range.clone()],
            row_indices: &self.row_indices[range],
            pos: 0,
        }
    }
}

// =============================================================================
// CscMatrix
// =============================================================================

/// Owned Compressed Sparse Column matrix.
///
/// # Example
///
/// ```
/// use fmcd::data::{CscMatrix, SparseColumns};
/// use ndarray::array;
///
/// let dense = array![
///     [1.0, 0.0, 2.0],
///     [0.0, 3.0, 0.0],
///     [4.0, 0.0, 5.0],
/// ];
/// let csc = CscMatrix::from_dense(dense.view());
///
/// // Column 0 holds 1.0 and 4.0 at rows 0 and 2
/// let col0: Vec<_> = csc.column(0).collect();
/// assert_eq!(col0, vec![(0, 1.0), (2, 4.0)]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CscMatrix {
    values: Box<[f64]>,
    row_indices: Box<[u32]>,
    /// Length is `n_cols + 1`, with `col_ptrs[n_cols] == nnz`.
    col_ptrs: Box<[u32]>,
    n_rows: usize,
    n_cols: usize,
}

impl CscMatrix {
    /// Build from a dense `[n_rows, n_cols]` array, dropping exact zeros.
    pub fn from_dense(dense: ArrayView2<'_, f64>) -> Self {
        let (n_rows, n_cols) = dense.dim();

        let mut values = Vec::new();
        let mut row_indices = Vec::new();
        let mut col_ptrs = Vec::with_capacity(n_cols + 1);
        col_ptrs.push(0u32);

        for col in dense.columns() {
            for (row, &val) in col.iter().enumerate() {
                if val != 0.0 {
                    values.push(val);
                    row_indices.push(row as u32);
                }
            }
            col_ptrs.push(values.len() as u32);
        }

        Self {
            values: values.into_boxed_slice(),
            row_indices: row_indices.into_boxed_slice(),
            col_ptrs: col_ptrs.into_boxed_slice(),
            n_rows,
            n_cols,
        }
    }

    /// Build from `(row, col, value)` triplets.
    ///
    /// Triplets may come in any order. Duplicate coordinates are summed, and
    /// entries that end up exactly zero are kept (they are still "stored").
    ///
    /// # Errors
    ///
    /// Returns [`DataError::IndexOutOfBounds`] for a coordinate outside the
    /// declared shape.
    pub fn from_triplets(
        n_rows: usize,
        n_cols: usize,
        triplets: &[(usize, usize, f64)],
    ) -> Result<Self, DataError> {
        for &(row, col, _) in triplets {
            if row >= n_rows || col >= n_cols {
                return Err(DataError::IndexOutOfBounds {
                    row,
                    col,
                    n_rows,
                    n_cols,
                });
            }
        }
        check_index_width(n_rows, triplets.len())?;

        let mut sorted: Vec<(usize, usize, f64)> = triplets.to_vec();
        sorted.sort_by_key(|&(row, col, _)| (col, row));

        let mut values: Vec<f64> = Vec::with_capacity(sorted.len());
        let mut row_indices: Vec<u32> = Vec::with_capacity(sorted.len());
        let mut col_counts = vec![0u32; n_cols];
        let mut last: Option<(usize, usize)> = None;

        for (row, col, val) in sorted {
            if last == Some((row, col)) {
                if let Some(v) = values.last_mut() {
                    *v += val;
                }
                continue;
            }
            values.push(val);
            row_indices.push(row as u32);
            col_counts[col] += 1;
            last = Some((row, col));
        }

        let mut col_ptrs = Vec::with_capacity(n_cols + 1);
        col_ptrs.push(0u32);
        let mut cumsum = 0u32;
        for &count in &col_counts {
            cumsum += count;
            col_ptrs.push(cumsum);
        }

        Ok(Self {
            values: values.into_boxed_slice(),
            row_indices: row_indices.into_boxed_slice(),
            col_ptrs: col_ptrs.into_boxed_slice(),
            n_rows,
            n_cols,
        })
    }

    /// Borrow as a [`CscView`].
    #[inline]
    pub fn view(&self) -> CscView<'_> {
        CscView {
            values: &self.values,
            row_indices: &self.row_indices,
            col_ptrs: &self.col_ptrs,
            n_rows: self.n_rows,
            n_cols: self.n_cols,
        }
    }

    /// Expand into a dense `[n_rows, n_cols]` array.
    pub fn to_dense(&self) -> Array2<f64> {
        let mut dense = Array2::zeros((self.n_rows, self.n_cols));
        for col in 0..self.n_cols {
            for (row, val) in self.column(col) {
                dense[[row, col]] += val;
            }
        }
        dense
    }

    /// Get underlying data arrays (values, row_indices, col_ptrs).
    pub fn into_raw_parts(self) -> (Box<[f64]>, Box<[u32]>, Box<[u32]>, usize, usize) {
        (
            self.values,
            self.row_indices,
            self.col_ptrs,
            self.n_rows,
            self.n_cols,
        )
    }
}

impl SparseColumns for CscMatrix {
    #[inline]
    fn n_rows(&self) -> usize {
        self.n_rows
    }

    #[inline]
    fn n_cols(&self) -> usize {
        self.n_cols
    }

    #[inline]
    fn nnz(&self) -> usize {
        self.values.len()
    }

    #[inline]
    fn column(&self, col: usize) -> ColumnIter<'_> {
        assert!(col < self.n_cols, "Column {} out of bounds", col);
        let start = self.col_ptrs[col] as usize;
        let end = self.col_ptrs[col + 1] as usize;
        ColumnIter {
            values: &self.values[start..end],
            row_indices: &self.row_indices[start..end],
            pos: 0,
        }
    }
}

// =============================================================================
// Column iterator
// =============================================================================

/// Iterator over `(row, value)` pairs in a column.
#[derive(Debug, Clone)]
pub struct ColumnIter<'a> {
    values: &'a [f64],
    row_indices: &'a [u32],
    pos: usize,
}

impl Iterator for ColumnIter<'_> {
    type Item = (usize, f64);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.pos < self.values.len() {
            let idx = self.pos;
            self.pos += 1;
            Some((self.row_indices[idx] as usize, self.values[idx]))
        } else {
            None
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.values.len() - self.pos;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ColumnIter<'_> {}

// =============================================================================
// Validation
// =============================================================================

fn check_index_width(n_rows: usize, nnz: usize) -> Result<(), DataError> {
    if n_rows > u32::MAX as usize || nnz > u32::MAX as usize {
        return Err(DataError::IndexOverflow { n_rows, nnz });
    }
    Ok(())
}

fn validate_parts(
    values: &[f64],
    row_indices: &[u32],
    col_ptrs: &[u32],
    n_rows: usize,
    n_cols: usize,
) -> Result<(), DataError> {
    check_index_width(n_rows, values.len())?;

    if col_ptrs.len() != n_cols + 1 {
        return Err(DataError::ColPtrsLen {
            expected: n_cols + 1,
            got: col_ptrs.len(),
        });
    }
    if values.len() != row_indices.len() {
        return Err(DataError::RowIndicesLen {
            values: values.len(),
            row_indices: row_indices.len(),
        });
    }
    if col_ptrs[0] != 0 || col_ptrs[n_cols] as usize != values.len() {
        return Err(DataError::ColPtrsBounds {
            first: col_ptrs[0] as usize,
            last: col_ptrs[n_cols] as usize,
            nnz: values.len(),
        });
    }
    if let Some(col) = col_ptrs.windows(2).position(|w| w[0] > w[1]) {
        return Err(DataError::ColPtrsNotMonotone { col });
    }
    if let Some(pos) = row_indices.iter().position(|&r| r as usize >= n_rows) {
        return Err(DataError::RowIndexOutOfBounds {
            pos,
            row: row_indices[pos] as usize,
            n_rows,
        });
    }
    Ok(())
}
