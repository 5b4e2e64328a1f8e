//! Precondition failures are reported before any parameter changes.

use fmcd::data::{CscMatrix, WeightsView};
use fmcd::training::{CdSettings, CdTrainer, ConfigError, Solver};
use fmcd::{FmError, FmModel, FmParamsViewMut};
use ndarray::{array, Array1, Array2};

fn sample() -> (CscMatrix, Array1<f64>, FmModel) {
    let x = CscMatrix::from_dense(array![[1., 2., 0.], [0., 3., 0.], [4., 0., 2.], [4., 5., 0.]].view());
    let y = array![1., 1., 1., 1.];
    let model = FmModel::from_parts(
        2.0,
        array![9., 8., 7.],
        array![[6., 0., 2.], [5., 1., 0.]],
        array![[1., 2., 3.], [4., 5., 6.]],
    )
    .unwrap();
    (x, y, model)
}

#[test]
fn target_length_mismatch() {
    let (x, _, mut model) = sample();
    let before = model.clone();
    let y = array![1., 1., 1.];

    let err = CdTrainer::new(CdSettings::default())
        .fit_model(&x, y.view(), WeightsView::None, &mut model, None)
        .unwrap_err();

    assert_eq!(
        err,
        FmError::DimensionMismatch {
            what: "target length",
            expected: 4,
            got: 3
        }
    );
    assert_eq!(model, before);
}

#[test]
fn cost_length_mismatch() {
    let (x, y, mut model) = sample();
    let cost = array![1., 1.];
    let err = CdTrainer::new(CdSettings::default())
        .fit_model(&x, y.view(), WeightsView::from_array(cost.view()), &mut model, None)
        .unwrap_err();
    assert!(matches!(err, FmError::DimensionMismatch { what: "cost length", .. }));
}

#[test]
fn parameter_width_mismatch() {
    let (x, y, _) = sample();
    let trainer = CdTrainer::new(CdSettings::default());

    let mut w0 = 0.0;
    let mut w1 = Array1::zeros(2);
    let mut w2 = Array2::zeros((1, 3));
    let mut w3 = Array2::zeros((0, 3));
    let params = FmParamsViewMut::new(&mut w0, w1.view_mut(), w2.view_mut(), w3.view_mut());
    let err = trainer.fit(&x, y.view(), WeightsView::None, params, None).unwrap_err();
    assert!(matches!(err, FmError::DimensionMismatch { what: "w1 length", .. }));

    let mut w1 = Array1::zeros(3);
    let mut w2 = Array2::zeros((2, 4));
    let params = FmParamsViewMut::new(&mut w0, w1.view_mut(), w2.view_mut(), w3.view_mut());
    let err = trainer.fit(&x, y.view(), WeightsView::None, params, None).unwrap_err();
    assert_eq!(
        err,
        FmError::DimensionMismatch {
            what: "w2 columns",
            expected: 3,
            got: 4
        }
    );
    assert!(w2.iter().all(|&w| w == 0.0));
}

#[test]
fn mcmc_is_not_run_here() {
    let (x, y, mut model) = sample();
    let settings = CdSettings::builder().solver(Solver::Mcmc).build().unwrap();
    let err = CdTrainer::new(settings.clone())
        .fit_model(&x, y.view(), WeightsView::None, &mut model, None)
        .unwrap_err();
    assert_eq!(
        err,
        FmError::Unsupported {
            solver: Solver::Mcmc,
            reason: "third-order interactions"
        }
    );
    assert_eq!(err.to_string(), "solver `mcmc` does not support third-order interactions");

    let mut pairwise = FmModel::zeros(3, 2, 0);
    let err = CdTrainer::new(settings)
        .fit_model(&x, y.view(), WeightsView::None, &mut pairwise, None)
        .unwrap_err();
    assert!(matches!(err, FmError::Unsupported { solver: Solver::Mcmc, .. }));
}

#[test]
fn invalid_settings_are_rejected_at_fit() {
    let (x, y, mut model) = sample();
    let before = model.clone();
    let settings = CdSettings {
        l2_reg_w1: -0.5,
        ..CdSettings::default()
    };
    let err = CdTrainer::new(settings)
        .fit_model(&x, y.view(), WeightsView::None, &mut model, None)
        .unwrap_err();
    assert_eq!(
        err,
        FmError::Config(ConfigError::InvalidRegularization {
            field: "l2_reg_w1",
            value: -0.5
        })
    );
    assert_eq!(model, before);
}
