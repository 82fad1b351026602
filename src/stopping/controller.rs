use super::StoppingDecision;
use crate::{resolver::StoppingPlan, scoring::ScoringLog, scoring::Source};

/// Floor for the denominator of the relative improvement.
const EPSILON: f64 = 1e-10;

/// The pure patience/tolerance convergence rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoppingCriteria {
    rounds: usize,
    tolerance: f64,
    higher_is_better: bool,
}

impl StoppingCriteria {
    pub fn new(rounds: usize, tolerance: f64, higher_is_better: bool) -> Self {
        Self {
            rounds,
            tolerance,
            higher_is_better,
        }
    }

    /// Number of values the rule looks at.
    pub fn window_len(&self) -> usize {
        self.rounds + 1
    }

    /// Judges the most recent `rounds + 1` values of `history`.
    ///
    /// Each of the last `rounds` values is compared against the best value
    /// preceding it inside the window. The run has converged when every one
    /// of those comparisons is defined and improves by at most `tolerance`.
    pub fn evaluate(&self, history: &[f64]) -> StoppingDecision {
        if self.rounds == 0 || history.len() < self.window_len() {
            return StoppingDecision::CONTINUE;
        }

        let window = &history[history.len() - self.window_len()..];
        let stalled = (1..window.len()).all(|j| {
            self.relative_improvement(&window[..j], window[j])
                .is_some_and(|improvement| improvement <= self.tolerance)
        });

        if stalled {
            StoppingDecision::converged()
        } else {
            StoppingDecision::CONTINUE
        }
    }

    /// Relative improvement of `latest` over the best of `earlier`.
    ///
    /// `None` when `latest` is not finite or `earlier` holds no finite value.
    pub fn relative_improvement(&self, earlier: &[f64], latest: f64) -> Option<f64> {
        if !latest.is_finite() {
            return None;
        }

        let best = self.best_of(earlier.iter().copied())?;
        let gain = if self.higher_is_better {
            latest - best
        } else {
            best - latest
        };

        Some(gain / best.abs().max(EPSILON))
    }

    fn best_of(&self, values: impl Iterator<Item = f64>) -> Option<f64> {
        values.filter(|v| v.is_finite()).reduce(|best, v| {
            if self.is_better(v, best) {
                v
            } else {
                best
            }
        })
    }

    fn is_better(&self, candidate: f64, best: f64) -> bool {
        if self.higher_is_better {
            candidate > best
        } else {
            candidate < best
        }
    }
}

/// Early-stopping controller of one training run.
///
/// Reads its window of the stopping metric straight from the scoring log,
/// looking only at the resolved source, and remembers the best value seen.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    criteria: StoppingCriteria,
    source: Source,
    metric: &'static str,
    best: Option<f64>,
}

impl EarlyStopping {
    pub fn new(plan: &StoppingPlan) -> Self {
        Self {
            criteria: StoppingCriteria::new(
                plan.rounds,
                plan.tolerance,
                plan.metric.higher_is_better(),
            ),
            source: plan.source,
            metric: plan.metric.name().unwrap_or("deviance"),
            best: None,
        }
    }

    /// Judges the monitored series after the latest iteration of `log`.
    ///
    /// A snapshot without the metric, or a source missing from the latest
    /// iteration, is observed as `NaN`.
    pub fn observe(&mut self, log: &ScoringLog) -> StoppingDecision {
        let window = self.window(log);
        let value = window.last().copied().unwrap_or(f64::NAN);

        if value.is_finite() && self.best.map_or(true, |b| self.criteria.is_better(value, b)) {
            self.best = Some(value);
        }

        let decision = self.criteria.evaluate(&window);
        if decision.halt {
            log::info!(
                "converged on {} {} after {} iteration(s), best {:?}",
                self.source,
                self.metric,
                log.len(),
                self.best
            );
        } else {
            log::debug!(
                "{} {}={value} -> {}",
                self.source,
                self.metric,
                decision.reason
            );
        }

        decision
    }

    /// The last `rounds + 1` values of the monitored series, ending at the
    /// log's latest iteration.
    fn window(&self, log: &ScoringLog) -> Vec<f64> {
        let len = self.criteria.window_len();
        let recent = log.last(self.source, len);
        let current = recent
            .last()
            .is_some_and(|s| Some(s.iteration()) == log.latest_iteration());

        let kept = if current {
            recent
        } else {
            &recent[recent.len().saturating_sub(len - 1)..]
        };

        let mut window: Vec<f64> = kept
            .iter()
            .map(|s| s.value(self.metric).unwrap_or(f64::NAN))
            .collect();
        if !current {
            window.push(f64::NAN);
        }
        window
    }

    pub fn best(&self) -> Option<f64> {
        self.best
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn metric(&self) -> &'static str {
        self.metric
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::{
        configs::StoppingMetric,
        scoring::MetricSnapshot,
        stopping::ReasonCode,
    };

    fn snap(iteration: usize, source: Source, metric: &str, v: f64) -> MetricSnapshot {
        MetricSnapshot::new(iteration, source, BTreeMap::from([(metric.to_string(), v)]))
    }

    /// A controller on the train source together with the log it reads.
    struct Run {
        es: EarlyStopping,
        log: ScoringLog,
    }

    impl Run {
        fn push(&mut self, value: f64) -> StoppingDecision {
            let iteration = self.log.len() + 1;
            self.log
                .append(vec![snap(iteration, Source::Train, self.es.metric(), value)])
                .unwrap();
            self.es.observe(&self.log)
        }
    }

    fn controller(rounds: usize, tolerance: f64, metric: StoppingMetric) -> Run {
        Run {
            es: EarlyStopping::new(&StoppingPlan {
                source: Source::Train,
                metric,
                rounds,
                tolerance,
            }),
            log: ScoringLog::new(),
        }
    }

    fn reasons(run: &mut Run, values: &[f64]) -> Vec<ReasonCode> {
        values.iter().map(|&v| run.push(v).reason).collect()
    }

    #[test]
    fn deviance_sequence_needs_a_full_stalled_window() {
        use ReasonCode::*;

        let mut es = controller(3, 0.01, StoppingMetric::Deviance);
        let got = reasons(&mut es, &[1.0, 0.5, 0.49, 0.489, 0.4889]);
        assert_eq!(got, vec![Continuing; 5]);

        assert_eq!(es.push(0.48889), StoppingDecision::converged());
        assert_eq!(es.es.best(), Some(0.48889));
    }

    #[test]
    fn decisions_are_deterministic_across_reruns() {
        let values = [1.0, 0.5, 0.49, 0.489, 0.4889, 0.48889, 0.488889];
        let first = reasons(&mut controller(3, 0.01, StoppingMetric::Deviance), &values);
        let second = reasons(&mut controller(3, 0.01, StoppingMetric::Deviance), &values);
        assert_eq!(first, second);
    }

    #[test]
    fn zero_rounds_never_stops() {
        for tolerance in [0.0, 0.5, 1e9] {
            let mut es = controller(0, tolerance, StoppingMetric::Deviance);
            let got = reasons(&mut es, &[1.0, 1.0, 1.0, 1.0, 1.0, 2.0]);
            assert!(got.iter().all(|r| *r == ReasonCode::Continuing));
        }
    }

    #[test]
    fn equal_values_count_as_no_improvement() {
        let mut es = controller(2, 0.0, StoppingMetric::Mae);
        assert_eq!(
            reasons(&mut es, &[0.3, 0.3, 0.3]),
            vec![
                ReasonCode::Continuing,
                ReasonCode::Continuing,
                ReasonCode::Converged
            ]
        );
    }

    #[test]
    fn zero_best_uses_the_epsilon_floor() {
        let mut es = controller(2, 0.01, StoppingMetric::Deviance);
        let got = reasons(&mut es, &[0.0, 0.0, 0.0]);
        assert_eq!(got[2], ReasonCode::Converged);
    }

    #[test]
    fn improvement_is_sign_inverted_for_r2() {
        let mut es = controller(3, 0.01, StoppingMetric::R2);
        let got = reasons(&mut es, &[0.5, 0.6, 0.6, 0.6, 0.6]);
        assert_eq!(got[3], ReasonCode::Continuing);
        assert_eq!(got[4], ReasonCode::Converged);
        assert_eq!(es.es.best(), Some(0.6));
    }

    #[test]
    fn worsening_values_count_as_stagnation() {
        let mut es = controller(2, 0.01, StoppingMetric::Rmse);
        let got = reasons(&mut es, &[1.0, 1.5, 2.0]);
        assert_eq!(got[2], ReasonCode::Converged);
        assert_eq!(es.es.best(), Some(1.0));
    }

    #[test]
    fn nan_never_triggers_convergence() {
        let mut es = controller(3, 0.01, StoppingMetric::Deviance);
        let got = reasons(&mut es, &[1.0, 1.0, 1.0, f64::NAN, f64::NAN, 1.0, 1.0]);
        assert!(got.iter().all(|r| *r == ReasonCode::Continuing));

        // Once the NaN leaves the window the run can converge again.
        assert_eq!(es.push(1.0).reason, ReasonCode::Continuing);
        assert_eq!(es.push(1.0).reason, ReasonCode::Converged);

        let mut es = controller(1, 1e9, StoppingMetric::Deviance);
        let got = reasons(&mut es, &[f64::NAN; 10]);
        assert!(got.iter().all(|r| *r == ReasonCode::Continuing));
        assert_eq!(es.es.best(), None);
    }

    #[test]
    fn relative_improvement_skips_undefined_earlier_values() {
        let criteria = StoppingCriteria::new(3, 0.01, false);
        assert_eq!(criteria.relative_improvement(&[f64::NAN, 2.0], 1.0), Some(0.5));
        assert_eq!(criteria.relative_improvement(&[f64::NAN], 1.0), None);
        assert_eq!(criteria.relative_improvement(&[1.0], f64::INFINITY), None);
    }

    #[test]
    fn observe_reads_only_the_resolved_source() {
        let snap = |i, source, v| snap(i, source, "deviance", v);

        let mut es = EarlyStopping::new(&StoppingPlan {
            source: Source::Valid,
            metric: StoppingMetric::Deviance,
            rounds: 1,
            tolerance: 0.01,
        });

        let mut log = ScoringLog::new();
        log.append(vec![snap(1, Source::Train, 1.0), snap(1, Source::Valid, 1.0)])
            .unwrap();
        assert_eq!(es.observe(&log).reason, ReasonCode::Continuing);

        // Train improves a lot, valid stalls: only valid matters.
        log.append(vec![snap(2, Source::Train, 0.1), snap(2, Source::Valid, 1.0)])
            .unwrap();
        assert_eq!(es.observe(&log).reason, ReasonCode::Converged);
        assert_eq!(log.series(Source::Train).len(), 2);
    }

    #[test]
    fn source_missing_from_the_latest_iteration_is_undefined() {
        let mut es = EarlyStopping::new(&StoppingPlan {
            source: Source::Valid,
            metric: StoppingMetric::Deviance,
            rounds: 1,
            tolerance: 0.01,
        });
        let snap = |i, source, v| snap(i, source, "deviance", v);

        let mut log = ScoringLog::new();
        log.append(vec![snap(1, Source::Train, 1.0), snap(1, Source::Valid, 1.0)])
            .unwrap();
        assert_eq!(es.observe(&log).reason, ReasonCode::Continuing);

        // The stale valid value must not be read again as a stalled one.
        log.append(vec![snap(2, Source::Train, 1.0)]).unwrap();
        assert_eq!(es.observe(&log).reason, ReasonCode::Continuing);

        log.append(vec![snap(3, Source::Train, 1.0), snap(3, Source::Valid, 1.0)])
            .unwrap();
        assert_eq!(es.observe(&log).reason, ReasonCode::Converged);
    }

    #[test]
    fn missing_metric_is_undefined() {
        let mut es = EarlyStopping::new(&StoppingPlan {
            source: Source::Train,
            metric: StoppingMetric::Mae,
            rounds: 1,
            tolerance: 1e9,
        });

        let mut log = ScoringLog::new();
        for i in 1..=3 {
            log.append(vec![snap(i, Source::Train, "deviance", 1.0)])
                .unwrap();
            assert_eq!(es.observe(&log).reason, ReasonCode::Continuing);
        }
        assert_eq!(es.best(), None);
    }
}
