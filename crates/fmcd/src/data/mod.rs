//! Design matrices and per-sample data views.
//!
//! - [`SparseColumns`]: column-major access trait used by every coordinate update
//! - [`CscMatrix`] / [`CscView`]: owned and borrowed CSC storage
//! - [`WeightsView`]: optional per-sample costs

mod csc;
mod views;

pub use csc::{ColumnIter, CscMatrix, CscView, SparseColumns};
pub use views::WeightsView;

/// Errors raised while assembling a sparse matrix.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataError {
    #[error("entry ({row}, {col}) is outside a {n_rows}x{n_cols} matrix")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        n_rows: usize,
        n_cols: usize,
    },

    #[error("col_ptrs must have n_cols + 1 = {expected} entries, got {got}")]
    ColPtrsLen { expected: usize, got: usize },

    #[error("values ({values}) and row_indices ({row_indices}) differ in length")]
    RowIndicesLen { values: usize, row_indices: usize },

    #[error("col_ptrs must start at 0 and end at nnz = {nnz}, got [{first}, .., {last}]")]
    ColPtrsBounds { first: usize, last: usize, nnz: usize },

    #[error("col_ptrs decreases after column {col}")]
    ColPtrsNotMonotone { col: usize },

    #[error("row index {row} at position {pos} is out of range for {n_rows} rows")]
    RowIndexOutOfBounds { pos: usize, row: usize, n_rows: usize },

    #[error("matrix with {n_rows} rows and {nnz} non-zeros exceeds 32-bit indexing")]
    IndexOverflow { n_rows: usize, nnz: usize },
}
