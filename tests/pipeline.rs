use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use sensegrid::config::AppConfig;
use sensegrid::pipeline;

const BASE_NS: i64 = 1_600_000_000_000_000_000;
const MS: i64 = 1_000_000;

fn write_sensor(dir: &Path, name: &str, offset_ms: i64, step_ms: i64, until_ms: i64, scale: f64) {
    let mut content = String::from("timestamps,x,y,z\n");
    let mut t = offset_ms;
    while t <= until_ms {
        let phase = t as f64 / 1000.0;
        writeln!(
            content,
            "{},{},{},{}",
            BASE_NS + t * MS,
            scale * phase.sin(),
            scale * phase.cos(),
            scale * 9.81
        )
        .unwrap();
        t += step_ms;
    }
    fs::write(dir.join(name), content).unwrap();
}

fn write_fixture(dir: &Path) {
    write_sensor(dir, "accelerometer.csv", 0, 100, 4000, 1.0);
    write_sensor(dir, "gyroscope.csv", 50, 100, 4050, 0.5);
    write_sensor(dir, "magnetometer.csv", 0, 200, 4000, 30.0);

    let labels = [(500, 1500, "walking"), (2000, 3200, "sitting"), (3500, 5000, "walking")];
    let mut content = String::from("label_start,label_end,label\n");
    for (start, end, label) in labels {
        writeln!(content, "{},{},{}", BASE_NS + start * MS, BASE_NS + end * MS, label).unwrap();
    }
    fs::write(dir.join("labelsOwn.csv"), content).unwrap();
}

fn test_config(root: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.paths.dataset_dir = root.join("datasets");
    config.paths.result_dir = root.join("results");
    config.paths.figures_dir = root.join("figures");
    config.granularities_ms = vec![1000, 250];
    config.plot.width = 400;
    config.plot.height = 300;
    config
}

fn read_rows(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let header = reader.headers().unwrap().iter().map(String::from).collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    (header, rows)
}

#[test]
fn run_writes_aligned_table_and_figures() {
    let root = tempfile::tempdir().unwrap();
    let config = test_config(root.path());
    fs::create_dir_all(&config.paths.dataset_dir).unwrap();
    write_fixture(&config.paths.dataset_dir);

    let summary = pipeline::run(&config).unwrap();

    let output = config.get_result_path();
    assert_eq!(summary.output_csv.as_deref(), Some(output.as_path()));
    assert!(output.exists());

    // accelerometer spans 4 s: 4000 / 250 + 1 buckets
    let (header, rows) = read_rows(&output);
    assert_eq!(rows.len(), 17);
    assert_eq!(
        header,
        vec![
            "",
            "acc_phone_x",
            "acc_phone_y",
            "acc_phone_z",
            "gyr_phone_x",
            "gyr_phone_y",
            "gyr_phone_z",
            "labelwalking",
            "labelsitting",
            "mag_phone_x",
            "mag_phone_y",
            "mag_phone_z",
        ]
    );
    assert_eq!(rows[0][0], "2020-09-13 12:26:40");
    assert_eq!(rows[1][0], "2020-09-13 12:26:40.250");

    for label in ["labelwalking", "labelsitting"] {
        let idx = header.iter().position(|h| h == label).unwrap();
        assert!(rows.iter().all(|r| r[idx] == "0" || r[idx] == "1"));
        assert!(rows.iter().any(|r| r[idx] == "1"));
    }

    assert_eq!(summary.passes.len(), 2);
    assert_eq!(summary.passes[0].rows, 5);
    assert_eq!(summary.passes[1].rows, 17);
    assert_eq!(summary.passes[1].columns, 11);

    assert_eq!(summary.figures.len(), 4);
    assert!(summary.figures.iter().all(|f| f.exists()));
    assert!(config.get_summary_path().exists());
}

#[test]
fn rerun_is_bit_identical() {
    let root = tempfile::tempdir().unwrap();
    let mut config = test_config(root.path());
    config.plot.enabled = false;
    fs::create_dir_all(&config.paths.dataset_dir).unwrap();
    write_fixture(&config.paths.dataset_dir);

    pipeline::run(&config).unwrap();
    let first = fs::read(config.get_result_path()).unwrap();
    pipeline::run(&config).unwrap();
    let second = fs::read(config.get_result_path()).unwrap();

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn missing_source_aborts_the_run() {
    let root = tempfile::tempdir().unwrap();
    let mut config = test_config(root.path());
    config.plot.enabled = false;
    fs::create_dir_all(&config.paths.dataset_dir).unwrap();
    write_fixture(&config.paths.dataset_dir);
    fs::remove_file(config.paths.dataset_dir.join("magnetometer.csv")).unwrap();

    let err = pipeline::run(&config).unwrap_err();
    assert!(err.to_string().contains("magnetometer.csv"));
    assert!(!config.get_result_path().exists());
}
