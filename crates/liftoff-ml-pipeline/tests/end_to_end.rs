use liftoff_ml_pipeline::{load_artifact, run, PipelineConfig, PipelineError};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const HEADER: &str = concat!(
    "year,has_fairings,reused_count,success,payload_count,Class,",
    "launch_site__ccafs,launch_site__ksc,launch_site__vafb"
);

fn write_launches(path: &Path, n: usize, with_label: bool) {
    let mut text = String::new();
    if with_label {
        writeln!(text, "{HEADER}").unwrap();
    } else {
        writeln!(text, "{}", HEADER.replace(",Class", "")).unwrap();
    }
    for i in 0..n {
        let year = 2010 + i % 11;
        let success = u8::from(i % 7 != 0);
        let reused = u8::from(i % 3 == 0);
        let label = u8::from(year >= 2014 && success == 1);
        let mut sites = [0u8; 3];
        sites[i % 3] = 1;
        let mut line = format!("{year},{},{reused},{success},{}", i % 2, i % 4);
        if with_label {
            write!(line, ",{label}").unwrap();
        }
        for s in sites {
            write!(line, ",{s}").unwrap();
        }
        writeln!(text, "{line}").unwrap();
    }
    fs::write(path, text).unwrap();
}

fn config_for(dir: &Path) -> PipelineConfig {
    PipelineConfig {
        input_path: dir.join("data").join("spacex_clean.csv"),
        artifacts_dir: dir.join("artifacts"),
        ..Default::default()
    }
}

#[test]
fn train_then_predict_from_disk() {
    let dir = tempdir().unwrap();
    let config = config_for(dir.path());
    fs::create_dir_all(config.input_path.parent().unwrap()).unwrap();
    write_launches(&config.input_path, 90, true);

    let report = run(&config).unwrap();
    assert_eq!(report.n_samples, 90);
    assert_eq!(report.n_features, 8);
    assert_eq!(report.n_test, 18);

    let loaded = load_artifact(&report.paths.artifact).unwrap();
    assert_eq!(loaded.columns, report.artifact.columns);
    assert!(!loaded.columns.iter().any(|c| c == "Class"));

    // Scoring the same file (label ignored) through the loaded bundle matches
    // the in-memory winner.
    let from_disk = loaded.predict_csv(&config.input_path).unwrap();
    let in_memory = report.artifact.predict_csv(&config.input_path).unwrap();
    assert_eq!(from_disk, in_memory);
    assert_eq!(from_disk.len(), 90);

    // An unlabelled file scores the same way.
    let unlabelled = dir.path().join("unlabelled.csv");
    write_launches(&unlabelled, 90, false);
    assert_eq!(loaded.predict_csv(&unlabelled).unwrap(), from_disk);
}

#[test]
fn repeated_runs_are_identical() {
    let dir = tempdir().unwrap();
    let config = config_for(dir.path());
    fs::create_dir_all(config.input_path.parent().unwrap()).unwrap();
    write_launches(&config.input_path, 70, true);

    let first = run(&config).unwrap();
    let metrics_a = fs::read_to_string(&first.paths.metrics).unwrap();
    let second = run(&PipelineConfig {
        parallel: false,
        ..config.clone()
    })
    .unwrap();
    let metrics_b = fs::read_to_string(&second.paths.metrics).unwrap();

    assert_eq!(first.selection, second.selection);
    assert_eq!(metrics_a, metrics_b);
}

#[test]
fn missing_label_column_fails_before_training() {
    let dir = tempdir().unwrap();
    let config = config_for(dir.path());
    fs::create_dir_all(config.input_path.parent().unwrap()).unwrap();
    write_launches(&config.input_path, 30, false);

    match run(&config).unwrap_err() {
        PipelineError::Schema { column, .. } => assert_eq!(column, "Class"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!config.artifacts_dir.exists());
}

#[test]
fn missing_input_names_the_upstream_step() {
    let dir = tempdir().unwrap();
    let config = config_for(dir.path());
    let err = run(&config).unwrap_err();
    assert!(matches!(err, PipelineError::MissingInput { .. }));
    assert!(err.to_string().contains("wrangling"));
}
