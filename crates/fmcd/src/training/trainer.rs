//! Coordinate descent trainer.
//!
//! One call to [`CdTrainer::fit`] runs `iter` sweeps. Each sweep:
//!
//! 1. recomputes the prediction and turns it into the residual (squared loss)
//!    or the IRLS working residual (logistic loss),
//! 2. updates the bias, then every linear weight in column order,
//! 3. for each pairwise factor row: rebuilds its cache, then updates every
//!    entry in column order,
//! 4. the same for triple-wise factor rows,
//! 5. reports to the callback, which may stop training.
//!
//! Within a sweep the residual is maintained incrementally: after every
//! coordinate update `err == target - prediction` holds exactly (up to
//! rounding), and each update costs O(nnz) of its column.

use std::fmt;
use std::time::Instant;

use ndarray::{ArrayView1, ArrayViewMut1};

use super::cache::{InteractionCache, TripleInteractionCache};
use super::callback::{FitCallback, SweepStatus};
use super::logger::TrainingLogger;
use super::loss::{self, Loss};
use super::settings::{CdSettings, Solver};
use super::stats::{first_order_stats, pairwise_basis, second_order_stats, third_order_stats, triple_basis};
use crate::data::{SparseColumns, WeightsView};
use crate::error::FmError;
use crate::inference::{predict_unchecked, PowerSums};
use crate::model::{FmModel, FmParamsView, FmParamsViewMut};

// =============================================================================
// Stages and report
// =============================================================================

/// Which parameter groups a fit updates.
///
/// Resolved once per fit from the settings flags and the parameter shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateStages {
    pub zero_order: bool,
    pub first_order: bool,
    pub second_order: bool,
    pub third_order: bool,
}

impl UpdateStages {
    pub fn resolve(settings: &CdSettings, rank_w2: usize, rank_w3: usize) -> Self {
        Self {
            zero_order: settings.zero_order,
            first_order: settings.first_order,
            second_order: rank_w2 > 0,
            third_order: rank_w3 > 0,
        }
    }
}

impl fmt::Display for UpdateStages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (self.zero_order, "w0"),
            (self.first_order, "w1"),
            (self.second_order, "w2"),
            (self.third_order, "w3"),
        ];
        let enabled: Vec<&str> = names.iter().filter(|(on, _)| *on).map(|(_, n)| *n).collect();
        f.write_str(&enabled.join(" "))
    }
}

/// Summary of a finished fit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitReport {
    /// Number of completed sweeps.
    pub sweeps_run: usize,
    /// Whether the callback ended training before `iter` sweeps.
    pub stopped_early: bool,
    /// Training loss after each sweep (RMSE or mean log-loss).
    pub train_loss: Vec<f64>,
}

impl FitReport {
    pub fn final_loss(&self) -> Option<f64> {
        self.train_loss.last().copied()
    }
}

// =============================================================================
// CdTrainer
// =============================================================================

/// Closed-form coordinate descent for factorization machines.
///
/// # Example
///
/// ```
/// use fmcd::data::{CscMatrix, WeightsView};
/// use fmcd::model::FmModel;
/// use fmcd::training::{CdSettings, CdTrainer};
/// use ndarray::array;
///
/// let x = CscMatrix::from_dense(array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]].view());
/// let y = array![1.0, 2.0, 3.0];
///
/// let settings = CdSettings::builder().iter(20).build().unwrap();
/// let mut model = FmModel::from_settings(2, 1, 0, &settings).unwrap();
///
/// let trainer = CdTrainer::new(settings);
/// let report = trainer.fit_model(&x, y.view(), WeightsView::None, &mut model, None).unwrap();
/// assert_eq!(report.sweeps_run, 20);
/// ```
#[derive(Debug, Clone)]
pub struct CdTrainer {
    settings: CdSettings,
}

impl CdTrainer {
    pub fn new(settings: CdSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CdSettings {
        &self.settings
    }

    /// Fit an owned model in place.
    pub fn fit_model<X: SparseColumns + ?Sized>(
        &self,
        x: &X,
        y: ArrayView1<'_, f64>,
        cost: WeightsView<'_>,
        model: &mut FmModel,
        callback: Option<&mut dyn FitCallback>,
    ) -> Result<FitReport, FmError> {
        self.fit(x, y, cost, model.view_mut(), callback)
    }

    /// Fit the parameters behind `params` in place.
    ///
    /// Interaction ranks are taken from the shapes of `params.w2` and
    /// `params.w3`; an empty matrix disables that order.
    ///
    /// # Errors
    ///
    /// All checks run before any parameter is touched:
    ///
    /// - [`FmError::Config`] for invalid settings,
    /// - [`FmError::Unsupported`] for a solver this trainer cannot run,
    /// - [`FmError::DimensionMismatch`] if `y`, `cost`, `w1`, `w2` or `w3`
    ///   disagree with the shape of `x`.
    pub fn fit<X: SparseColumns + ?Sized>(
        &self,
        x: &X,
        y: ArrayView1<'_, f64>,
        cost: WeightsView<'_>,
        mut params: FmParamsViewMut<'_>,
        mut callback: Option<&mut dyn FitCallback>,
    ) -> Result<FitReport, FmError> {
        let settings = &self.settings;
        settings.validate()?;

        let (n_samples, n_features) = (x.n_rows(), x.n_cols());
        let (rank_w2, rank_w3) = (params.rank_w2(), params.rank_w3());

        if settings.solver != Solver::Cd {
            let reason = if rank_w3 > 0 {
                "third-order interactions"
            } else {
                "fitting without an external sampler"
            };
            return Err(FmError::Unsupported {
                solver: settings.solver,
                reason,
            });
        }

        FmError::check_dim("target length", n_samples, y.len())?;
        if let Some(len) = cost.len() {
            FmError::check_dim("cost length", n_samples, len)?;
        }
        params.view().validate(n_features, true)?;

        let stages = UpdateStages::resolve(settings, rank_w2, rank_w3);
        let mut logger = TrainingLogger::new(settings.verbosity);
        logger.start_training(settings.iter, n_samples, n_features, &stages.to_string());

        let mut state = SweepState::new(x, y.view(), cost.reborrow(), settings.loss, settings.step_size)
            .with_weighted_bias(settings.weighted_bias);
        let mut pair_cache = InteractionCache::empty();
        let mut triple_cache = TripleInteractionCache::empty();
        let mut report = FitReport::default();

        for sweep in 0..settings.iter {
            state.begin_sweep(&params.view());

            if stages.zero_order {
                state.update_w0(&mut *params.w0);
            }

            if stages.first_order {
                let started = Instant::now();
                for j in 0..n_features {
                    state.update_w1(&mut params.w1, j, settings.l2_reg_w1);
                }
                logger.log_stage(sweep, "w1", started.elapsed());
            }

            if stages.second_order {
                let started = Instant::now();
                for k in 0..rank_w2 {
                    pair_cache.rebuild(x, params.w2.row(k));
                    let mut row = params.w2.row_mut(k);
                    for j in 0..n_features {
                        state.update_w2(&mut row[j], j, &mut pair_cache, settings.l2_reg_w2);
                    }
                }
                logger.log_stage(sweep, "w2", started.elapsed());
            }

            if stages.third_order {
                let started = Instant::now();
                for k in 0..rank_w3 {
                    triple_cache.rebuild(x, params.w3.row(k));
                    let mut row = params.w3.row_mut(k);
                    for j in 0..n_features {
                        state.update_w3(&mut row[j], j, &mut triple_cache, settings.l2_reg_w3);
                    }
                }
                logger.log_stage(sweep, "w3", started.elapsed());
            }

            let train_loss = state.train_loss();
            if !train_loss.is_finite() {
                logger.warn_non_finite(sweep, "training loss");
            }
            logger.log_sweep(sweep, train_loss, settings.loss.metric_name());
            report.train_loss.push(train_loss);
            report.sweeps_run = sweep + 1;

            if let Some(cb) = callback.as_mut() {
                let status = SweepStatus {
                    sweep,
                    loss: settings.loss,
                    train_loss,
                };
                if cb.on_sweep(&status).is_stop() {
                    logger.log_early_stopping(sweep);
                    report.stopped_early = sweep + 1 < settings.iter;
                    break;
                }
            }
        }

        logger.finish_training(report.sweeps_run);
        Ok(report)
    }
}

// =============================================================================
// Sweep state
// =============================================================================

/// Mutable buffers owned by one fit: residual, IRLS weights and working
/// response, and prediction scratch space.
pub(crate) struct SweepState<'a, X: ?Sized> {
    x: &'a X,
    y: ArrayView1<'a, f64>,
    cost: WeightsView<'a>,
    loss: Loss,
    /// Damping applied to every coordinate step (1 for squared loss).
    step: f64,
    weighted_bias: bool,
    err: Vec<f64>,
    weight: Vec<f64>,
    response: Vec<f64>,
    sums: PowerSums,
}

impl<'a, X: SparseColumns + ?Sized> SweepState<'a, X> {
    pub(crate) fn new(x: &'a X, y: ArrayView1<'a, f64>, cost: WeightsView<'a>, loss: Loss, step_size: f64) -> Self {
        let n = x.n_rows();
        let irls = loss.is_irls();
        Self {
            x,
            y,
            cost,
            loss,
            step: if irls { step_size } else { 1.0 },
            weighted_bias: false,
            err: vec![0.0; n],
            weight: if irls { vec![0.0; n] } else { Vec::new() },
            response: if irls { vec![0.0; n] } else { Vec::new() },
            sums: PowerSums::default(),
        }
    }

    /// Weight the IRLS bias step by the IRLS weights.
    pub(crate) fn with_weighted_bias(mut self, weighted_bias: bool) -> Self {
        self.weighted_bias = weighted_bias;
        self
    }

    /// Residual (squared loss) or working residual (logistic loss).
    #[cfg(test)]
    pub(crate) fn residual(&self) -> &[f64] {
        &self.err
    }

    /// Values the residual is measured against: `y`, or the working response.
    #[cfg(test)]
    pub(crate) fn target(&self) -> Vec<f64> {
        if self.loss.is_irls() {
            self.response.clone()
        } else {
            self.y.to_vec()
        }
    }

    /// Weights entering the sufficient statistics.
    fn stat_weights(&self) -> WeightsView<'_> {
        if self.loss.is_irls() {
            WeightsView::from_array(ArrayView1::from(&self.weight[..]))
        } else {
            self.cost.reborrow()
        }
    }

    /// Recompute the residual from scratch for the current parameters.
    pub(crate) fn begin_sweep(&mut self, params: &FmParamsView<'_>) {
        predict_unchecked(self.x, params, &mut self.err, &mut self.sums);
        match self.loss {
            Loss::Squared => loss::squared_residual(self.y, &mut self.err),
            Loss::Logistic => loss::logistic_working_response(
                self.y,
                self.cost,
                &mut self.err,
                &mut self.weight,
                &mut self.response,
            ),
        }
    }

    /// Bias update: `w0 + mean(err)`, unregularized and undamped.
    ///
    /// With `weighted_bias` the IRLS path uses the weighted mean instead.
    pub(crate) fn update_w0(&mut self, w0: &mut f64) {
        let w_old = *w0;
        let shift = if self.loss.is_irls() && self.weighted_bias {
            let (mut num, mut den) = (0.0, 0.0);
            for (&w, &e) in self.weight.iter().zip(&self.err) {
                num += w * e;
                den += w;
            }
            if den > 0.0 {
                num / den
            } else {
                0.0
            }
        } else if self.err.is_empty() {
            0.0
        } else {
            let n = self.err.len() as f64;
            (self.err.iter().sum::<f64>() + w_old * n) / n - w_old
        };

        let w_new = w_old + shift;
        *w0 = w_new;
        let delta = w_old - w_new;
        for e in &mut self.err {
            *e += delta;
        }
    }

    pub(crate) fn update_w1(&mut self, w1: &mut ArrayViewMut1<'_, f64>, j: usize, l2: f64) {
        let w_old = w1[j];
        let stats = first_order_stats(self.x, j, &self.err, self.stat_weights());
        let w_new = w_old + self.step * (stats.ridge_solution(w_old, l2) - w_old);
        w1[j] = w_new;

        let delta = w_new - w_old;
        if delta != 0.0 {
            for (row, value) in self.x.column(j) {
                self.err[row] -= delta * value;
            }
        }
    }

    /// Update pairwise factor entry `v = w2[k, j]`; `cache` must hold row `k`.
    pub(crate) fn update_w2(&mut self, v: &mut f64, j: usize, cache: &mut InteractionCache, l2: f64) {
        let w_old = *v;
        let stats = second_order_stats(self.x, j, w_old, cache, &self.err, self.stat_weights());
        let w_new = w_old + self.step * (stats.ridge_solution(w_old, l2) - w_old);
        *v = w_new;

        let delta = w_new - w_old;
        if delta == 0.0 {
            return;
        }
        for (row, value) in self.x.column(j) {
            let h = pairwise_basis(value, w_old, cache.values()[row]);
            self.err[row] -= delta * h;
            cache.add(row, delta * value);
        }
    }

    /// Update triple-wise factor entry `v = w3[k, j]`; `cache` must hold row `k`.
    pub(crate) fn update_w3(&mut self, v: &mut f64, j: usize, cache: &mut TripleInteractionCache, l2: f64) {
        let w_old = *v;
        let stats = third_order_stats(self.x, j, w_old, cache, &self.err, self.stat_weights());
        let w_new = w_old + self.step * (stats.ridge_solution(w_old, l2) - w_old);
        *v = w_new;

        let delta = w_new - w_old;
        if delta == 0.0 {
            return;
        }
        let delta_sq = w_new * w_new - w_old * w_old;
        for (row, value) in self.x.column(j) {
            let h = triple_basis(value, w_old, cache.values()[row], cache.squared_values()[row]);
            self.err[row] -= delta * h;
            cache.add(row, delta * value, delta_sq * value * value);
        }
    }

    /// Loss of the current parameters, read off the maintained residual.
    pub(crate) fn train_loss(&self) -> f64 {
        match self.loss {
            Loss::Squared => loss::weighted_rmse(&self.err, self.cost),
            Loss::Logistic => loss::mean_logloss(self.y, self.cost, &self.response, &self.err),
        }
    }
}
