//! Per-sweep callbacks and early stopping.

use fmcd::data::WeightsView;
use fmcd::testing::synthetic_regression;
use fmcd::training::{
    CallbackAction, CdSettings, CdTrainer, EarlyStopping, FitCallback, SweepStatus,
};
use fmcd::FmModel;

#[test]
fn closure_can_stop_training() {
    let (x, y, _) = synthetic_regression(30, 4, 1, 0.5, 0.1, 1);
    let settings = CdSettings::builder().iter(20).build().unwrap();
    let mut model = FmModel::from_settings(4, 1, 0, &settings).unwrap();

    let mut seen = Vec::new();
    let mut stop_after_three = |status: &SweepStatus| {
        seen.push(status.sweep);
        status.sweep == 2
    };

    let report = CdTrainer::new(settings)
        .fit_model(&x, y.view(), WeightsView::None, &mut model, Some(&mut stop_after_three))
        .unwrap();

    assert_eq!(report.sweeps_run, 3);
    assert!(report.stopped_early);
    assert_eq!(report.train_loss.len(), 3);
    assert_eq!(seen, vec![0, 1, 2]);
}

#[test]
fn callback_runs_once_per_sweep() {
    struct Recorder {
        statuses: Vec<SweepStatus>,
    }

    impl FitCallback for Recorder {
        fn on_sweep(&mut self, status: &SweepStatus) -> CallbackAction {
            self.statuses.push(*status);
            CallbackAction::Continue
        }
    }

    let (x, y, _) = synthetic_regression(30, 4, 1, 0.5, 0.1, 1);
    let settings = CdSettings::builder().iter(7).build().unwrap();
    let mut model = FmModel::from_settings(4, 1, 0, &settings).unwrap();
    let mut recorder = Recorder { statuses: Vec::new() };

    let report = CdTrainer::new(settings)
        .fit_model(&x, y.view(), WeightsView::None, &mut model, Some(&mut recorder))
        .unwrap();

    assert!(!report.stopped_early);
    let sweeps: Vec<usize> = recorder.statuses.iter().map(|s| s.sweep).collect();
    assert_eq!(sweeps, (0..7).collect::<Vec<_>>());
    for (status, loss) in recorder.statuses.iter().zip(&report.train_loss) {
        assert_eq!(status.train_loss, *loss);
    }

    let payload: serde_json::Value = serde_json::from_str(&recorder.statuses[0].to_json()).unwrap();
    assert_eq!(payload["sweep"], 0);
    assert_eq!(payload["loss"], "squared");
}

#[test]
fn early_stopping_ends_converged_fit() {
    let (x, y, _) = synthetic_regression(60, 5, 0, 0.6, 0.0, 12);
    let settings = CdSettings::builder().iter(1000).build().unwrap();
    let mut model = FmModel::zeros(5, 0, 0);
    let mut early_stop = EarlyStopping::new(3).with_min_delta(1e-6);

    let report = CdTrainer::new(settings)
        .fit_model(&x, y.view(), WeightsView::None, &mut model, Some(&mut early_stop))
        .unwrap();

    assert!(report.stopped_early);
    assert!(report.sweeps_run < 1000);
    assert_eq!(early_stop.best_value(), Some(report.train_loss[early_stop.best_round()]));
}

#[test]
fn no_callback_runs_all_sweeps() {
    let (x, y, _) = synthetic_regression(20, 3, 1, 0.5, 0.1, 3);
    let settings = CdSettings::builder().iter(4).build().unwrap();
    let mut model = FmModel::from_settings(3, 1, 0, &settings).unwrap();
    let report = CdTrainer::new(settings)
        .fit_model(&x, y.view(), WeightsView::None, &mut model, None)
        .unwrap();
    assert_eq!(report.sweeps_run, 4);
    assert!(!report.stopped_early);
}
