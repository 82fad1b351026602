use std::{env, fs, sync::Arc};

use anyhow::Context;
use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};

use stopping_orchestration::{
    configs::{ModelFamily, StoppingParams, StoppingSource, TrainingRequest},
    EquivalenceChecker, Frame, Session,
};

const SEED: u64 = 12345;
const TRAIN_ROWS: usize = 400;
const VALID_ROWS: usize = 100;
const PREDICTORS: [&str; 4] = ["x0", "x1", "x2", "x3"];
const RESPONSE: &str = "y";
const TRAINING_COLUMNS: [&str; 4] = [
    "training_rmse",
    "training_deviance",
    "training_mae",
    "training_r2",
];

/// Builds a frame where `y` is a noisy linear combination of the predictors.
fn synthetic_frame(rng: &mut StdRng, nrows: usize) -> anyhow::Result<Frame> {
    let weights = [1.5, -2.0, 0.5, 0.0];
    let rows: Vec<Vec<f64>> = (0..nrows)
        .map(|_| {
            let mut row: Vec<f64> = (0..PREDICTORS.len())
                .map(|_| rng.random_range(-1.0..1.0))
                .collect();
            let noise: f64 = (0..6).map(|_| rng.random::<f64>()).sum::<f64>() - 3.0;
            let y = row.iter().zip(weights).map(|(x, w)| x * w).sum::<f64>() + 0.1 * noise;
            row.push(y);
            row
        })
        .collect();

    let mut names: Vec<&str> = PREDICTORS.to_vec();
    names.push(RESPONSE);
    Ok(Frame::from_rows(&names, &rows)?)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let params = match env::args().nth(1) {
        Some(path) => {
            let json = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            StoppingParams::from_json(&json).with_context(|| format!("parsing {path}"))?
        }
        None => StoppingParams::new(StoppingSource::Auto, 3, 0.01),
    };

    let mut rng = StdRng::seed_from_u64(SEED);
    let train = Arc::new(synthetic_frame(&mut rng, TRAIN_ROWS)?);
    let valid = Arc::new(synthetic_frame(&mut rng, VALID_ROWS)?);

    let session = Session::open()?;
    let checker = EquivalenceChecker::new(1e-6);

    // (folds, validation frame, explicit source auto should resolve to)
    let cases = [
        (3, None, StoppingSource::Xval),
        (0, Some(Arc::clone(&valid)), StoppingSource::Valid),
        (0, None, StoppingSource::Train),
    ];

    for (nfolds, validation, explicit) in cases {
        let request = |source: StoppingSource, validation: Option<Arc<Frame>>| {
            TrainingRequest::new(
                ModelFamily::deep_learning(vec![3]),
                PREDICTORS,
                RESPONSE,
                Arc::clone(&train),
            )
            .with_validation(validation)
            .with_folds(nfolds)
            .with_seed(SEED)
            .with_stopping(StoppingParams {
                source,
                ..params
            })
        };

        let auto = session.train(request(StoppingSource::Auto, validation.clone()))?;
        // An explicit xval run may still carry a validation frame.
        let named_validation = match explicit {
            StoppingSource::Xval => Some(Arc::clone(&valid)),
            _ => validation,
        };
        let named = session.train(request(explicit, named_validation))?;

        info!(
            "auto resolved to {} and stopped after {} iteration(s) ({})",
            auto.stopping().source,
            auto.iterations(),
            auto.reason()
        );

        checker
            .check(
                &auto.scoring_history(),
                &named.scoring_history(),
                &TRAINING_COLUMNS,
            )
            .with_context(|| format!("auto and {explicit:?} histories differ"))?;

        println!("{}", named.scoring_history().to_json()?);
    }

    session.close();
    Ok(())
}
