//! Squared-loss training.

use approx::assert_relative_eq;
use fmcd::data::{CscMatrix, SparseColumns, WeightsView};
use fmcd::testing::synthetic_regression;
use fmcd::training::{CdSettings, CdTrainer};
use fmcd::{FmModel, FmParamsViewMut};
use ndarray::{array, Array1, Array2};
use rstest::rstest;

fn residual_norm(model: &FmModel, x: &CscMatrix, y: &Array1<f64>) -> f64 {
    let pred = model.predict(x).unwrap();
    (y - &pred).mapv(|e| e * e).sum().sqrt()
}

fn rmse(model: &FmModel, x: &CscMatrix, y: &Array1<f64>) -> f64 {
    residual_norm(model, x, y) / (y.len() as f64).sqrt()
}

/// The 4x3 reference problem: fitting must reduce the training error.
#[test]
fn fit_decreases_training_error() {
    let x = CscMatrix::from_dense(array![[1., 2., 0.], [0., 3., 0.], [4., 0., 2.], [4., 5., 0.]].view());
    let y = array![1., 1., 1., 1.];
    let mut model = FmModel::from_parts(
        2.0,
        array![9., 8., 7.],
        array![[6., 0., 2.], [5., 1., 0.]],
        Array2::zeros((0, 3)),
    )
    .unwrap();

    let before = residual_norm(&model, &x, &y);
    let settings = CdSettings::builder().iter(50).build().unwrap();
    let report = CdTrainer::new(settings)
        .fit_model(&x, y.view(), WeightsView::None, &mut model, None)
        .unwrap();
    let after = residual_norm(&model, &x, &y);

    assert_eq!(report.sweeps_run, 50);
    assert!(!report.stopped_early);
    assert!(after < before, "before {before}, after {after}");
}

/// Same problem through caller-owned flat buffers.
#[test]
fn fit_through_borrowed_buffers() {
    let x = CscMatrix::from_dense(array![[1., 2., 0.], [0., 3., 0.], [4., 0., 2.], [4., 5., 0.]].view());
    let y = array![1., 1., 1., 1.];

    let mut w0 = 2.0;
    let mut w1 = vec![9., 8., 7.];
    let mut w2 = vec![6., 0., 2., 5., 1., 0.];
    let mut w3 = vec![1., 2., 3., 4., 5., 6.];

    let params = FmParamsViewMut::from_slices(&mut w0, &mut w1, &mut w2, &mut w3, 3).unwrap();
    let report = CdTrainer::new(CdSettings::default())
        .fit(&x, y.view(), WeightsView::None, params, None)
        .unwrap();

    assert_eq!(report.sweeps_run, 50);
    assert!(w0.is_finite());
    assert!(w2.iter().chain(&w3).all(|w| w.is_finite()));
    assert_ne!(w1, vec![9., 8., 7.]);
}

#[rstest]
#[case::bias_only(true, false, 0, 0)]
#[case::linear(true, true, 0, 0)]
#[case::pairwise(true, true, 3, 0)]
#[case::triples(true, true, 0, 2)]
#[case::all_orders(true, true, 2, 2)]
#[case::factors_without_bias(false, true, 2, 0)]
fn loss_never_increases(
    #[case] zero_order: bool,
    #[case] first_order: bool,
    #[case] rank_w2: usize,
    #[case] rank_w3: usize,
) {
    let (x, y, _) = synthetic_regression(80, 8, 2, 0.4, 0.05, 17);
    let settings = CdSettings::builder()
        .iter(15)
        .zero_order(zero_order)
        .first_order(first_order)
        .build()
        .unwrap();
    let mut model = FmModel::from_settings(x.n_cols(), rank_w2, rank_w3, &settings).unwrap();
    let initial = rmse(&model, &x, &y);

    let report = CdTrainer::new(settings)
        .fit_model(&x, y.view(), WeightsView::None, &mut model, None)
        .unwrap();

    assert_eq!(report.train_loss.len(), 15);
    assert!(report.train_loss[0] <= initial + 1e-9);
    for pair in report.train_loss.windows(2) {
        assert!(pair[1] <= pair[0] + 1e-9 * (1.0 + pair[0]), "{pair:?}");
    }

    // The reported loss is read off the maintained residual; it must agree
    // with a fresh prediction.
    assert_relative_eq!(
        report.final_loss().unwrap(),
        rmse(&model, &x, &y),
        epsilon = 1e-9,
        max_relative = 1e-9
    );
}

#[test]
fn linear_model_is_recovered() {
    let (x, y, truth) = synthetic_regression(120, 6, 0, 0.6, 0.0, 5);
    let settings = CdSettings::builder().iter(300).build().unwrap();
    let mut model = FmModel::zeros(6, 0, 0);
    let initial = rmse(&model, &x, &y);

    CdTrainer::new(settings)
        .fit_model(&x, y.view(), WeightsView::None, &mut model, None)
        .unwrap();

    assert!(rmse(&model, &x, &y) < 0.05 * initial);
    for (w, t) in model.w1().iter().zip(truth.w1().iter()) {
        assert_relative_eq!(*w, *t, epsilon = 0.05);
    }
}

#[test]
fn l2_shrinks_linear_weights() {
    let (x, y, _) = synthetic_regression(60, 5, 0, 0.5, 0.1, 8);
    let fit = |l2: f64| {
        let settings = CdSettings::builder().iter(30).l2_reg_w1(l2).build().unwrap();
        let mut model = FmModel::zeros(5, 0, 0);
        CdTrainer::new(settings)
            .fit_model(&x, y.view(), WeightsView::None, &mut model, None)
            .unwrap();
        model.w1().mapv(|w| w * w).sum()
    };
    assert!(fit(50.0) < fit(0.0));
}

#[test]
fn disabled_stages_leave_parameters_alone() {
    let (x, y, _) = synthetic_regression(40, 5, 1, 0.5, 0.1, 2);
    let settings = CdSettings::builder()
        .iter(5)
        .zero_order(false)
        .first_order(false)
        .build()
        .unwrap();
    let mut model = FmModel::from_settings(5, 1, 0, &settings).unwrap();
    model.set_w0(0.25);
    let w2_before = model.w2().to_owned();

    CdTrainer::new(settings)
        .fit_model(&x, y.view(), WeightsView::None, &mut model, None)
        .unwrap();

    assert_eq!(model.w0(), 0.25);
    assert!(model.w1().iter().all(|&w| w == 0.0));
    assert_ne!(model.w2(), w2_before);
}

#[test]
fn zero_sweeps_is_a_noop() {
    let (x, y, _) = synthetic_regression(20, 4, 1, 0.5, 0.1, 4);
    let settings = CdSettings::builder().iter(0).build().unwrap();
    let mut model = FmModel::from_settings(4, 1, 0, &settings).unwrap();
    let before = model.clone();

    let report = CdTrainer::new(settings)
        .fit_model(&x, y.view(), WeightsView::None, &mut model, None)
        .unwrap();

    assert_eq!(report.sweeps_run, 0);
    assert!(report.train_loss.is_empty());
    assert_eq!(model, before);
}

/// A cost of 2 on a row acts like a duplicated row for the coordinate
/// updates (the bias update is a plain mean, so it is disabled here).
#[test]
fn cost_acts_like_duplicated_rows() {
    let dense = array![[1., 0., 2.], [0., 1., 1.], [3., 1., 0.], [1., 1., 1.]];
    let y = array![1., -1., 2., 0.5];
    let x = CscMatrix::from_dense(dense.view());
    let cost = array![2., 1., 1., 1.];

    let mut dup_dense = Array2::zeros((5, 3));
    dup_dense.slice_mut(ndarray::s![..4, ..]).assign(&dense);
    dup_dense.row_mut(4).assign(&dense.row(0));
    let x_dup = CscMatrix::from_dense(dup_dense.view());
    let y_dup = array![1., -1., 2., 0.5, 1.];

    let settings = CdSettings::builder().iter(10).zero_order(false).build().unwrap();
    let init = FmModel::from_settings(3, 1, 0, &settings).unwrap();
    let trainer = CdTrainer::new(settings);

    let mut weighted = init.clone();
    trainer
        .fit_model(&x, y.view(), WeightsView::from_array(cost.view()), &mut weighted, None)
        .unwrap();
    let mut duplicated = init;
    trainer
        .fit_model(&x_dup, y_dup.view(), WeightsView::None, &mut duplicated, None)
        .unwrap();

    for (a, b) in weighted.w1().iter().zip(duplicated.w1().iter()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-9, max_relative = 1e-9);
    }
    for (a, b) in weighted.w2().iter().zip(duplicated.w2().iter()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-9, max_relative = 1e-9);
    }
}

#[test]
fn step_size_only_damps_logistic() {
    let (x, y, _) = synthetic_regression(30, 4, 1, 0.5, 0.1, 6);
    let fit = |step: f64| {
        let settings = CdSettings::builder().iter(5).step_size(step).build().unwrap();
        let mut model = FmModel::from_settings(4, 1, 0, &settings).unwrap();
        CdTrainer::new(settings)
            .fit_model(&x, y.view(), WeightsView::None, &mut model, None)
            .unwrap();
        model
    };
    assert_eq!(fit(0.01), fit(0.9));
}
