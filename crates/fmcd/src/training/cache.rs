//! Interaction caches for factor-row coordinate updates.
//!
//! For one factor row `v` the cache holds, per sample,
//! `q[row] = Σ_l x[row, l] * v[l]` (and for triple interactions also
//! `q2[row] = Σ_l x[row, l]² * v[l]²`). Changing a single `v[j]` only touches
//! the rows where column `j` is non-zero, so each coordinate update costs
//! O(nnz(j)) instead of O(nnz(X)).
//!
//! Caches are rebuilt from scratch at the start of every sweep and then kept
//! in sync incrementally.

use ndarray::ArrayView1;

use crate::data::SparseColumns;

// =============================================================================
// Pairwise cache
// =============================================================================

/// Partial inner products `q = X · v` for one factor row.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionCache {
    q: Vec<f64>,
}

impl InteractionCache {
    /// Unallocated cache; call [`rebuild`](Self::rebuild) before use.
    pub fn empty() -> Self {
        Self { q: Vec::new() }
    }

    /// Build the cache for factor row `w_row` in O(nnz).
    pub fn build<X: SparseColumns + ?Sized>(x: &X, w_row: ArrayView1<'_, f64>) -> Self {
        let mut cache = Self::empty();
        cache.rebuild(x, w_row);
        cache
    }

    /// Recompute every entry, reusing the allocation.
    pub fn rebuild<X: SparseColumns + ?Sized>(&mut self, x: &X, w_row: ArrayView1<'_, f64>) {
        debug_assert_eq!(w_row.len(), x.n_cols());
        self.q.clear();
        self.q.resize(x.n_rows(), 0.0);
        for (col, &w) in w_row.iter().enumerate() {
            for (row, value) in x.column(col) {
                self.q[row] += w * value;
            }
        }
    }

    /// Apply `v[col]: w_old -> w_new` in O(nnz(col)).
    pub fn update<X: SparseColumns + ?Sized>(&mut self, x: &X, col: usize, w_old: f64, w_new: f64) {
        let delta = w_new - w_old;
        for (row, value) in x.column(col) {
            self.q[row] += delta * value;
        }
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.q
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.q.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }

    #[inline]
    pub(crate) fn add(&mut self, row: usize, delta: f64) {
        self.q[row] += delta;
    }
}

// =============================================================================
// Triple cache
// =============================================================================

/// Power sums `q = X · v` and `q2 = X² · v²` for one triple-interaction row.
#[derive(Debug, Clone, PartialEq)]
pub struct TripleInteractionCache {
    q: InteractionCache,
    q2: Vec<f64>,
}

impl TripleInteractionCache {
    pub fn empty() -> Self {
        Self {
            q: InteractionCache::empty(),
            q2: Vec::new(),
        }
    }

    pub fn build<X: SparseColumns + ?Sized>(x: &X, w_row: ArrayView1<'_, f64>) -> Self {
        let mut cache = Self::empty();
        cache.rebuild(x, w_row);
        cache
    }

    pub fn rebuild<X: SparseColumns + ?Sized>(&mut self, x: &X, w_row: ArrayView1<'_, f64>) {
        self.q.rebuild(x, w_row);
        self.q2.clear();
        self.q2.resize(x.n_rows(), 0.0);
        for (col, &w) in w_row.iter().enumerate() {
            for (row, value) in x.column(col) {
                self.q2[row] += w * w * value * value;
            }
        }
    }

    /// Apply `v[col]: w_old -> w_new` to both sums in O(nnz(col)).
    pub fn update<X: SparseColumns + ?Sized>(&mut self, x: &X, col: usize, w_old: f64, w_new: f64) {
        let delta = w_new - w_old;
        let delta_sq = w_new * w_new - w_old * w_old;
        for (row, value) in x.column(col) {
            self.q.add(row, delta * value);
            self.q2[row] += delta_sq * value * value;
        }
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        self.q.values()
    }

    #[inline]
    pub fn squared_values(&self) -> &[f64] {
        &self.q2
    }

    #[inline]
    pub(crate) fn add(&mut self, row: usize, delta: f64, delta_sq: f64) {
        self.q.add(row, delta);
        self.q2[row] += delta_sq;
    }
}
