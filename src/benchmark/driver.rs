//! Benchmark driver - runs the variant x array-size matrix
//!
//! For every array size the driver invokes each active variant at
//! escalating iteration counts (`step, 2*step, ...`), shuffling the order
//! every round so drift in machine state (thermal, caches, scheduler) does
//! not always hit the same variant. A variant whose invocation takes longer
//! than the timeout is retired for the rest of that array size.
//!
//! Result lines are written as `<variant>\t<size>\t<iterations>\t` and
//! flushed before the executable starts; the executable prints its own
//! timing to the same stream to complete the line.

use std::collections::HashMap;
use std::io::Write;

use rand::Rng;
use rand::seq::SliceRandom;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::{
    ArraySize, ClassMetrics, ExecutableNaming, Invocation, Launcher, RunSummary, StepSchedule,
    Variant,
};
use crate::{
    error::{DriverError, DriverResult},
    utils::time::format_elapsed,
};

/// Limits applied to every array-size class
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverSettings {
    /// Invocations taking strictly longer than this retire the variant
    pub timeout_secs: f64,
    /// Exclusive ceiling on the iteration count
    pub max_iterations: u64,
}

/// Retirement flags of one array-size class
#[derive(Debug)]
struct RetirementBoard {
    retired: HashMap<Variant, bool>,
}

impl RetirementBoard {
    /// Every variant starts active
    fn new(variants: &[Variant]) -> Self {
        Self {
            retired: variants.iter().map(|v| (*v, false)).collect(),
        }
    }

    fn retire(&mut self, variant: Variant) {
        self.retired.insert(variant, true);
    }

    fn is_retired(&self, variant: &Variant) -> bool {
        self.retired.get(variant).copied().unwrap_or(false)
    }

    fn all_retired(&self) -> bool {
        self.retired.values().all(|retired| *retired)
    }
}

/// Drives the benchmark matrix
pub struct BenchmarkDriver<L, W, R> {
    launcher: L,
    naming: ExecutableNaming,
    report: W,
    rng: R,
    settings: DriverSettings,
}

impl<L, W, R> BenchmarkDriver<L, W, R>
where
    L: Launcher,
    W: Write,
    R: Rng,
{
    pub fn new(
        launcher: L,
        naming: ExecutableNaming,
        report: W,
        rng: R,
        settings: DriverSettings,
    ) -> Self {
        Self {
            launcher,
            naming,
            report,
            rng,
            settings,
        }
    }

    /// The report stream, e.g. for a final flush after interruption
    pub fn report_mut(&mut self) -> &mut W {
        &mut self.report
    }

    /// Run every array size in order.
    ///
    /// A launch failure aborts the whole run; nothing after the failing
    /// invocation is executed or written.
    pub async fn run<S>(
        &mut self,
        array_sizes: &[ArraySize],
        variants: &[Variant],
        steps: &S,
    ) -> DriverResult<RunSummary>
    where
        S: StepSchedule + ?Sized,
    {
        let mut summary = RunSummary::new(self.settings.timeout_secs, self.settings.max_iterations);

        let mut distinct: Vec<Variant> = Vec::with_capacity(variants.len());
        for variant in variants {
            if !distinct.contains(variant) {
                distinct.push(*variant);
            }
        }

        for array_size in array_sizes {
            let class = self.run_class(*array_size, &distinct, steps).await?;
            summary.classes.push(class);
        }

        summary.finish();
        Ok(summary)
    }

    async fn run_class<S>(
        &mut self,
        array_size: ArraySize,
        variants: &[Variant],
        steps: &S,
    ) -> DriverResult<ClassMetrics>
    where
        S: StepSchedule + ?Sized,
    {
        let step = steps.step(array_size);
        if step == 0 {
            return Err(DriverError::InvalidStep(array_size));
        }

        info!(
            array_size = %array_size,
            step,
            variants = variants.len(),
            "Starting array size"
        );

        let mut metrics = ClassMetrics::new(array_size, step);
        let mut board = RetirementBoard::new(variants);
        let mut order = variants.to_vec();
        let mut iteration = step;

        while iteration < self.settings.max_iterations {
            if board.all_retired() {
                debug!(array_size = %array_size, iteration, "All variants retired");
                break;
            }

            order.shuffle(&mut self.rng);
            metrics.record_round();

            for variant in &order {
                if board.is_retired(variant) {
                    continue;
                }

                let invocation = Invocation {
                    variant: *variant,
                    array_size,
                    iterations: iteration,
                    executable: self.naming.path_for(variant, array_size),
                };

                write!(self.report, "{}\t{}\t{}\t", variant, array_size, iteration)?;
                self.report.flush()?;

                let start = Instant::now();
                let outcome = self.launcher.launch(&invocation).await?;
                let elapsed = start.elapsed();

                if !outcome.is_success() {
                    warn!(
                        variant = %variant,
                        array_size = %array_size,
                        iteration,
                        ?outcome,
                        "Benchmark exited unsuccessfully"
                    );
                }
                metrics.record_invocation(*variant, iteration, elapsed, outcome);

                if elapsed.as_secs_f64() > self.settings.timeout_secs {
                    info!(
                        variant = %variant,
                        array_size = %array_size,
                        iteration,
                        elapsed = %format_elapsed(elapsed),
                        "Retiring variant"
                    );
                    board.retire(*variant);
                    metrics.record_retirement(*variant, iteration);
                }
            }

            iteration = match iteration.checked_add(step) {
                Some(next) => next,
                None => break,
            };
        }

        writeln!(self.report)?;
        self.report.flush()?;

        info!(
            array_size = %array_size,
            rounds = metrics.rounds,
            invocations = metrics.invocations(),
            retired = metrics.retired().count(),
            "Finished array size"
        );

        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::benchmark::{LaunchOutcome, StepPolicy};

    /// Report stream shared between the driver and the fake benchmarks
    #[derive(Clone, Default)]
    struct SharedReport(Arc<Mutex<Vec<u8>>>);

    impl SharedReport {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedReport {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Scripted stand-in for the performance executables
    struct FakeLauncher {
        report: SharedReport,
        calls: Arc<Mutex<Vec<Invocation>>>,
        durations: HashMap<Variant, Duration>,
        outcomes: HashMap<Variant, LaunchOutcome>,
        missing: Option<Variant>,
    }

    impl FakeLauncher {
        fn new(report: SharedReport) -> Self {
            Self {
                report,
                calls: Arc::default(),
                durations: HashMap::new(),
                outcomes: HashMap::new(),
                missing: None,
            }
        }

        fn taking(mut self, variant: Variant, duration: Duration) -> Self {
            self.durations.insert(variant, duration);
            self
        }
    }

    #[async_trait]
    impl Launcher for FakeLauncher {
        async fn launch(&self, invocation: &Invocation) -> DriverResult<LaunchOutcome> {
            if self.missing == Some(invocation.variant) {
                return Err(DriverError::MissingExecutable(invocation.executable.clone()));
            }
            self.calls.lock().unwrap().push(invocation.clone());

            let duration = self
                .durations
                .get(&invocation.variant)
                .copied()
                .unwrap_or(Duration::from_millis(1));
            tokio::time::sleep(duration).await;

            writeln!(self.report.clone(), "{:.3}", duration.as_secs_f64()).unwrap();
            Ok(self
                .outcomes
                .get(&invocation.variant)
                .copied()
                .unwrap_or(LaunchOutcome::Success))
        }
    }

    fn v(label: &str) -> Variant {
        label.parse().unwrap()
    }

    fn size(n: u32) -> ArraySize {
        ArraySize::new(n).unwrap()
    }

    fn driver(
        launcher: FakeLauncher,
        report: SharedReport,
        timeout_secs: f64,
        max_iterations: u64,
    ) -> BenchmarkDriver<FakeLauncher, SharedReport, StdRng> {
        BenchmarkDriver::new(
            launcher,
            ExecutableNaming::default(),
            report,
            StdRng::seed_from_u64(7),
            DriverSettings {
                timeout_secs,
                max_iterations,
            },
        )
    }

    fn step_of(step: u64) -> impl Fn(ArraySize) -> u64 {
        move |_: ArraySize| step
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_retires_everything_after_first_round() {
        let report = SharedReport::default();
        let launcher = FakeLauncher::new(report.clone());
        let calls = launcher.calls.clone();
        let mut driver = driver(launcher, report.clone(), 0.0, 100_000_000);

        let a = v("vector_NO_RESERVE");
        let b = v("list_NO_RESERVE");
        let summary = driver.run(&[size(500)], &[a, b], &step_of(10)).await.unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| c.iterations == 10));
        let invoked: BTreeSet<_> = calls.iter().map(|c| c.variant).collect();
        assert_eq!(invoked, BTreeSet::from([a, b]));

        let output = report.contents();
        let lines: Vec<&str> = output.split('\n').collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].ends_with("\t500\t10\t0.001"));
        assert!(lines[1].ends_with("\t500\t10\t0.001"));
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "");

        let class = &summary.classes[0];
        assert_eq!(class.rounds, 1);
        assert_eq!(class.retired().count(), 2);
        assert_eq!(class.variants[&a].retired_at, Some(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_round_without_retirement() {
        let report = SharedReport::default();
        let launcher = FakeLauncher::new(report.clone());
        let mut driver = driver(launcher, report.clone(), 100.5, 1_000_001);

        let variants = [
            v("deque_NO_RESERVE"),
            v("list_NO_RESERVE"),
            v("vector_NO_RESERVE"),
        ];
        driver
            .run(&[size(500)], &variants, &StepPolicy::default())
            .await
            .unwrap();

        let output = report.contents();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 4);
        for line in &lines[..3] {
            let fields: Vec<&str> = line.split('\t').collect();
            assert_eq!(fields.len(), 4);
            assert!(variants.iter().any(|v| v.label() == fields[0]));
            assert_eq!(fields[1], "500");
            assert_eq!(fields[2], "1000000");
        }
        assert_eq!(lines[3], "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_retired_variant_is_skipped_until_next_size() {
        let slow = v("vector_NO_RESERVE");
        let fast = v("list_NO_RESERVE");
        let report = SharedReport::default();
        let launcher = FakeLauncher::new(report.clone())
            .taking(slow, Duration::from_secs(200))
            .taking(fast, Duration::from_secs(1));
        let calls = launcher.calls.clone();
        let mut driver = driver(launcher, report.clone(), 100.5, 50);

        let summary = driver
            .run(&[size(500), size(1000)], &[slow, fast], &step_of(10))
            .await
            .unwrap();

        let calls = calls.lock().unwrap();
        for array_size in [size(500), size(1000)] {
            let slow_iterations: Vec<u64> = calls
                .iter()
                .filter(|c| c.variant == slow && c.array_size == array_size)
                .map(|c| c.iterations)
                .collect();
            assert_eq!(slow_iterations, vec![10]);

            let fast_iterations: Vec<u64> = calls
                .iter()
                .filter(|c| c.variant == fast && c.array_size == array_size)
                .map(|c| c.iterations)
                .collect();
            assert_eq!(fast_iterations, vec![10, 20, 30, 40]);
        }

        assert_eq!(summary.classes.len(), 2);
        assert_eq!(summary.invocations(), 10);
        for class in &summary.classes {
            assert_eq!(class.variants[&slow].retired_at, Some(10));
            assert_eq!(class.variants[&fast].retired_at, None);
        }
        assert_eq!(report.contents().matches("\n\n").count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_round_is_a_permutation() {
        let variants = [
            v("deque_NO_RESERVE"),
            v("list_NO_RESERVE"),
            v("moving_vector_RESERVE"),
            v("vector_NO_RESERVE"),
        ];
        let report = SharedReport::default();
        let launcher = FakeLauncher::new(report.clone());
        let calls = launcher.calls.clone();
        let mut driver = driver(launcher, report, 100.5, 210);

        driver
            .run(&[size(100)], &variants, &step_of(10))
            .await
            .unwrap();

        let calls = calls.lock().unwrap();
        let mut rounds: BTreeMap<u64, Vec<Variant>> = BTreeMap::new();
        for call in calls.iter() {
            rounds.entry(call.iterations).or_default().push(call.variant);
        }

        assert_eq!(rounds.len(), 20);
        let expected: BTreeSet<Variant> = variants.into_iter().collect();
        for order in rounds.values() {
            assert_eq!(order.len(), variants.len());
            assert_eq!(order.iter().copied().collect::<BTreeSet<_>>(), expected);
        }

        let distinct_orders: BTreeSet<&Vec<Variant>> = rounds.values().collect();
        assert!(distinct_orders.len() > 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_iterations_increase_by_step() {
        let report = SharedReport::default();
        let launcher = FakeLauncher::new(report.clone());
        let calls = launcher.calls.clone();
        let mut driver = driver(launcher, report, 100.5, 30);

        let policy = StepPolicy::new(7).with_override(size(1000), 12);
        driver
            .run(&[size(500), size(1000)], &[v("vector_RESERVE")], &policy)
            .await
            .unwrap();

        let calls = calls.lock().unwrap();
        let iterations = |array_size: ArraySize| -> Vec<u64> {
            calls
                .iter()
                .filter(|c| c.array_size == array_size)
                .map(|c| c.iterations)
                .collect()
        };
        assert_eq!(iterations(size(500)), vec![7, 14, 21, 28]);
        assert_eq!(iterations(size(1000)), vec![12, 24]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_launch_failure_aborts_run() {
        let missing = v("list_NO_RESERVE");
        let report = SharedReport::default();
        let mut launcher = FakeLauncher::new(report.clone());
        launcher.missing = Some(missing);
        let calls = launcher.calls.clone();
        let mut driver = driver(launcher, report.clone(), 100.5, 1_000);

        let result = driver
            .run(
                &[size(500), size(1000)],
                &[v("deque_NO_RESERVE"), missing, v("vector_NO_RESERVE")],
                &step_of(10),
            )
            .await;

        assert!(matches!(result, Err(DriverError::MissingExecutable(_))));

        let calls = calls.lock().unwrap();
        assert!(calls.iter().all(|c| c.iterations == 10));
        assert!(calls.iter().all(|c| c.array_size == size(500)));

        let output = report.contents();
        assert!(output.ends_with("list_NO_RESERVE\t500\t10\t"));
        assert!(!output.contains("\n\n"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_step_is_rejected() {
        let report = SharedReport::default();
        let launcher = FakeLauncher::new(report.clone());
        let calls = launcher.calls.clone();
        let mut driver = driver(launcher, report.clone(), 100.5, 1_000);

        let result = driver
            .run(&[size(500)], &[v("vector_NO_RESERVE")], &step_of(0))
            .await;

        assert!(matches!(result, Err(DriverError::InvalidStep(s)) if s == size(500)));
        assert!(calls.lock().unwrap().is_empty());
        assert!(report.contents().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_matrix_does_nothing() {
        let report = SharedReport::default();
        let launcher = FakeLauncher::new(report.clone());
        let calls = launcher.calls.clone();
        let mut driver = driver(launcher, report.clone(), 100.5, 1_000);

        driver
            .run(&[size(500), size(1000)], &[], &step_of(10))
            .await
            .unwrap();
        assert_eq!(report.contents(), "\n\n");

        let summary = driver
            .run(&[], &[v("vector_NO_RESERVE")], &step_of(10))
            .await
            .unwrap();
        assert!(summary.classes.is_empty());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsuccessful_exit_is_a_sample() {
        let failing = v("moving_vector_NO_RESERVE");
        let report = SharedReport::default();
        let mut launcher = FakeLauncher::new(report.clone());
        launcher
            .outcomes
            .insert(failing, LaunchOutcome::Failed { exit_code: 3 });
        let mut driver = driver(launcher, report, 100.5, 40);

        let summary = driver
            .run(&[size(60)], &[failing], &step_of(10))
            .await
            .unwrap();

        let stats = &summary.classes[0].variants[&failing];
        assert_eq!(stats.invocations, 3);
        assert_eq!(stats.failed_exits, 3);
        assert_eq!(stats.retired_at, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_variants_run_once_per_round() {
        let variant = v("deque_NO_RESERVE");
        let report = SharedReport::default();
        let launcher = FakeLauncher::new(report.clone());
        let calls = launcher.calls.clone();
        let mut driver = driver(launcher, report, 100.5, 20);

        driver
            .run(&[size(10)], &[variant, variant], &step_of(10))
            .await
            .unwrap();

        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_retirement_board() {
        let a = v("vector_RESERVE");
        let b = v("deque_NO_RESERVE");
        let mut board = RetirementBoard::new(&[a, b]);
        assert!(!board.is_retired(&a));
        assert!(!board.all_retired());

        board.retire(a);
        assert!(board.is_retired(&a));
        assert!(!board.all_retired());

        board.retire(b);
        assert!(board.all_retired());

        let fresh = RetirementBoard::new(&[a, b]);
        assert!(!fresh.is_retired(&a));
    }
}
