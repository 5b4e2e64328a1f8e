//! Logistic loss via iteratively reweighted least squares.

use approx::assert_relative_eq;
use fmcd::data::{SparseColumns, WeightsView};
use fmcd::testing::synthetic_binary;
use fmcd::training::{sigmoid, CdSettings, CdTrainer, Loss, Verbosity};
use fmcd::FmModel;

fn logistic_settings(iter: usize) -> CdSettings {
    CdSettings::builder()
        .loss(Loss::Logistic)
        .iter(iter)
        .step_size(0.5)
        .verbosity(Verbosity::Silent)
        .build()
        .unwrap()
}

#[test]
fn logistic_fit_reduces_logloss() {
    let (x, y) = synthetic_binary(200, 6, 2, 0.5, 21);
    let mut model = FmModel::zeros(x.n_cols(), 0, 0);
    let settings = CdSettings {
        weighted_bias: true,
        ..logistic_settings(30)
    };

    let report = CdTrainer::new(settings)
        .fit_model(&x, y.view(), WeightsView::None, &mut model, None)
        .unwrap();

    let first = report.train_loss[0];
    let last = report.final_loss().unwrap();
    assert!(report.train_loss.iter().all(|l| l.is_finite()));
    assert!(first < std::f64::consts::LN_2);
    assert!(last < first, "first {first}, last {last}");

    // Probabilities point the right way on most samples.
    let pred = model.predict(&x).unwrap();
    let correct = pred
        .iter()
        .zip(y.iter())
        .filter(|(&f, &t)| (sigmoid(f) > 0.5) == (t > 0.0))
        .count();
    assert!(correct as f64 > 0.6 * y.len() as f64);
}

#[test]
fn first_sweep_from_zero_moves_bias_to_label_balance() {
    // At f = 0 every working residual is +-2, so the plain mean bias step
    // lands on 2 * (2 * share_positive - 1).
    let (x, y) = synthetic_binary(120, 5, 1, 0.5, 8);
    let share = y.iter().filter(|&&t| t > 0.0).count() as f64 / y.len() as f64;
    let settings = CdSettings {
        first_order: false,
        ..logistic_settings(1)
    };
    let mut model = FmModel::zeros(5, 0, 0);
    CdTrainer::new(settings)
        .fit_model(&x, y.view(), WeightsView::None, &mut model, None)
        .unwrap();
    assert_relative_eq!(model.w0(), 2.0 * (2.0 * share - 1.0), epsilon = 1e-12);
}

#[test]
fn signed_and_binary_labels_agree() {
    let (x, y01) = synthetic_binary(80, 5, 1, 0.5, 4);
    let y_signed = y01.mapv(|t| if t > 0.0 { 1.0 } else { -1.0 });

    let settings = logistic_settings(10);
    let init = FmModel::from_settings(5, 2, 0, &settings).unwrap();
    let trainer = CdTrainer::new(settings);

    let mut a = init.clone();
    let mut b = init;
    trainer
        .fit_model(&x, y01.view(), WeightsView::None, &mut a, None)
        .unwrap();
    trainer
        .fit_model(&x, y_signed.view(), WeightsView::None, &mut b, None)
        .unwrap();
    assert_eq!(a, b);
}

#[test]
fn logistic_with_factors_stays_finite() {
    let (x, y) = synthetic_binary(100, 6, 2, 0.5, 9);
    let settings = CdSettings::builder()
        .loss(Loss::Logistic)
        .iter(20)
        .step_size(0.3)
        .l2_reg_w2(0.5)
        .l2_reg_w3(0.5)
        .build()
        .unwrap();
    let mut model = FmModel::from_settings(6, 2, 1, &settings).unwrap();

    let report = CdTrainer::new(settings)
        .fit_model(&x, y.view(), WeightsView::None, &mut model, None)
        .unwrap();

    assert_eq!(report.sweeps_run, 20);
    assert!(model.w0().is_finite());
    assert!(model.w1().iter().all(|w| w.is_finite()));
    assert!(model.w2().iter().all(|w| w.is_finite()));
    assert!(model.w3().iter().all(|w| w.is_finite()));
}
