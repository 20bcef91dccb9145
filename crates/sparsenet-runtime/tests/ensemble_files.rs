//! Ensemble runs over pattern directories on disk.

use rand::rngs::StdRng;
use rand::SeedableRng;
use sparsenet_runtime::prelude::*;
use std::path::Path;

fn config(trace_dir: Option<&Path>) -> EnsembleConfig {
    EnsembleConfig {
        network: NetworkConfig {
            neurons: 100,
            degree: 30,
            topology: TopologyKind::Ring,
            ..Default::default()
        },
        dynamics: DynamicsConfig {
            x_win: Some(4),
            ..Default::default()
        },
        noise: 0.0,
        first_pattern: 1,
        last_pattern: 4,
        subset_size: 2,
        modules: 2,
        trace_dir: trace_dir.map(Path::to_path_buf),
        ..Default::default()
    }
}

fn pattern_dir(count: usize) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let mut rng = StdRng::seed_from_u64(17);
    generate_pattern_set(dir.path(), count, 1, 100, 0.3, 10, &mut rng).unwrap();
    dir
}

#[test]
fn ensemble_writes_one_summary_line_per_trial() {
    let patterns = pattern_dir(4);
    let out = tempfile::tempdir().unwrap();
    let ensemble = Ensemble::new(config(None)).unwrap();
    assert_eq!(ensemble.trial_count(), 8);

    let summary_path = out.path().join(output_file_name(ensemble.config(), "patterns"));
    let mut sink = CsvSummarySink::create(&summary_path).unwrap();
    let source = DirectorySource::new(patterns.path());
    let report = ensemble
        .run(&source, &source, &mut sink, &mut StdRng::seed_from_u64(1))
        .unwrap();

    assert_eq!(report.trials, 8);
    assert_eq!(report.failed(), 0);
    assert_eq!(report.patterns_learned, 4);

    let text = std::fs::read_to_string(&summary_path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 8);
    let indices: Vec<usize> = lines
        .iter()
        .map(|l| l.split(", ").next().unwrap().parse().unwrap())
        .collect();
    assert_eq!(indices, vec![1, 2, 3, 4, 1, 2, 3, 4]);
    assert!(lines.iter().all(|l| l.split(", ").count() == 3));
}

#[test]
fn learned_patterns_are_retrieved_by_their_module() {
    // One pattern per module: a single stored pattern is a fixed point.
    let patterns = pattern_dir(4);
    let mut cfg = config(None);
    cfg.subset_size = 1;
    cfg.modules = 4;
    let ensemble = Ensemble::new(cfg).unwrap();
    let source = DirectorySource::new(patterns.path());
    let mut records: Vec<TrialRecord> = Vec::new();
    ensemble
        .run(&source, &source, &mut records, &mut StdRng::seed_from_u64(2))
        .unwrap();

    assert_eq!(records.len(), 16);
    let learned: Vec<&TrialRecord> = records
        .iter()
        .filter(|r| r.trial_index == r.module + 1)
        .collect();
    assert_eq!(learned.len(), 4);
    for r in learned {
        assert!(
            r.overlap >= 0.9,
            "module {} pattern {}: m = {}",
            r.module,
            r.trial_index,
            r.overlap
        );
        assert!(r.converged);
    }
}

#[test]
fn missing_test_files_are_skipped_and_reported() {
    let patterns = pattern_dir(4);
    let mut cfg = config(None);
    cfg.last_pattern = 5;
    let ensemble = Ensemble::new(cfg).unwrap();
    let source = DirectorySource::new(patterns.path());
    let mut records: Vec<TrialRecord> = Vec::new();
    let report = ensemble
        .run(&source, &source, &mut records, &mut StdRng::seed_from_u64(3))
        .unwrap();

    assert_eq!(report.trials, 8);
    assert_eq!(report.failed(), 2);
    assert!(report.failures.iter().all(|f| f.trial_index == 5));
    assert!(matches!(report.failures[0].error, SparsenetError::Io { .. }));
    assert_eq!(records.len(), 8);
}

#[test]
fn missing_learning_file_aborts_the_run() {
    let patterns = pattern_dir(3);
    let ensemble = Ensemble::new(config(None)).unwrap();
    let source = DirectorySource::new(patterns.path());
    let mut records: Vec<TrialRecord> = Vec::new();
    let result = ensemble.run(&source, &source, &mut records, &mut StdRng::seed_from_u64(4));
    assert!(result.is_err());
}

#[test]
fn trace_files_are_written_per_trial() {
    let patterns = pattern_dir(4);
    let traces = tempfile::tempdir().unwrap();
    let ensemble = Ensemble::new(config(Some(traces.path()))).unwrap();
    let source = DirectorySource::new(patterns.path());
    let mut records: Vec<TrialRecord> = Vec::new();
    ensemble
        .run(&source, &source, &mut records, &mut StdRng::seed_from_u64(5))
        .unwrap();

    let series = std::fs::read_to_string(traces.path().join("mdqintime_0_1_1.txt")).unwrap();
    assert_eq!(series.lines().next(), Some(TIME_SERIES_HEADER));
    assert_eq!(series.lines().count(), records[0].converged_step + 2);

    let windows = std::fs::read_to_string(traces.path().join("xmi_1_4_1.txt")).unwrap();
    assert!(windows.lines().all(|l| l.split(", ").count() == 4));
}

#[test]
fn random_subsets_learn_the_requested_count() {
    let patterns = pattern_dir(4);
    let mut cfg = config(None);
    cfg.random_subsets = true;
    cfg.modules = 3;
    let ensemble = Ensemble::new(cfg).unwrap();
    let source = DirectorySource::new(patterns.path());
    let net = ensemble
        .train_module(2, &source, &mut StdRng::seed_from_u64(6))
        .unwrap();
    assert_eq!(net.weights().patterns_learned(), 2);
}
