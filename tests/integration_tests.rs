use chrono::{Duration, NaiveDate};
use gdd_timelapse::config::OutputConfig;
use gdd_timelapse::models::{Observation, PeriodWindow, Periods, PestRiskProfile, Threshold};
use gdd_timelapse::processors::Pipeline;
use gdd_timelapse::readers::{CsvSource, MemorySource, ProfileReader};
use gdd_timelapse::rendering::RenderOptions;
use gdd_timelapse::utils::frame_path;
use gdd_timelapse::writers::DatasetWriter;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::fs;
use std::io::Write;
use tempfile::TempDir;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn periods() -> Periods {
    Periods {
        prior: PeriodWindow::new("prior", d(2025, 1, 1), d(2025, 1, 21)).unwrap(),
        current: Some(PeriodWindow::new("current", d(2026, 1, 1), d(2026, 1, 10)).unwrap()),
    }
}

fn daily(start: NaiveDate, days: i64, lat: f64, lon: f64, temp: f64) -> Vec<Observation> {
    (0..days)
        .map(|i| Observation::new(start + Duration::days(i), lat, lon, temp).unwrap())
        .collect()
}

fn two_point_observations() -> Vec<Observation> {
    let mut obs = Vec::new();
    // first point: every day of both periods
    obs.extend(daily(d(2025, 1, 1), 21, 35.0, 139.0, 2.0));
    obs.extend(daily(d(2026, 1, 1), 10, 35.0, 139.0, 2.0));
    // second point: prior period only, days 8-14 missing
    obs.extend(daily(d(2025, 1, 1), 7, 35.5, 139.5, 1.0));
    obs.extend(daily(d(2025, 1, 15), 7, 35.5, 139.5, 1.0));
    obs
}

fn profile() -> PestRiskProfile {
    PestRiskProfile::new(
        "aphid",
        "Aphid",
        vec![
            Threshold::new(10.0, "emerging", "green"),
            Threshold::new(30.0, "active", "orange"),
            Threshold::new(60.0, "peak", "red"),
        ],
    )
}

fn output(dir: &TempDir) -> OutputConfig {
    OutputConfig {
        dir: dir.path().to_path_buf(),
        ..OutputConfig::default()
    }
}

#[test]
fn test_two_point_scenario() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let out = output(&dir);
    let pipeline = Pipeline::new(periods(), RenderOptions::default(), &out);
    let source = MemorySource::new(two_point_observations());

    let summary = pipeline.run(&source, &[profile()]).unwrap();
    assert_eq!(summary.prior_frames, 3);
    assert_eq!(summary.current_frames, 2);
    assert_eq!(summary.points, 2);
    assert!(summary.dataset_bytes > 0);

    let written: Value = serde_json::from_str(&fs::read_to_string(out.dataset_path()).unwrap()).unwrap();
    assert_eq!(
        written,
        json!({
            "dates": ["2025-01-07", "2025-01-14", "2025-01-21", "2026-01-07", "2026-01-10"],
            "year_boundary_index": 3,
            "bounds": {"south": 35.0, "north": 35.5, "west": 139.0, "east": 139.5},
            "pest_ids": ["aphid"],
            "total_frames": 5,
            "points": [
                [35.0, 139.0, [14.0, 28.0, 42.0, 14.0, 20.0]],
                [35.5, 139.5, [7.0, 7.0, 14.0, 0, 0]]
            ]
        })
    );

    // two points never reach the rendering minimum
    let report = &summary.reports[0];
    assert_eq!(report.skipped, 5);
    assert!(!frame_path(&out.frames_dir(), "aphid", 0).exists());
}

#[test]
fn test_csv_source_end_to_end() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let csv_path = dir.path().join("observations.csv");
    let mut file = fs::File::create(&csv_path).unwrap();
    writeln!(file, "date,latitude,longitude,temperature").unwrap();
    for obs in two_point_observations() {
        writeln!(
            file,
            "{},{},{},{}",
            obs.date, obs.point.latitude, obs.point.longitude, obs.temperature
        )
        .unwrap();
    }
    writeln!(file, "garbage,row,here,x").unwrap();
    drop(file);

    let out = output(&dir);
    let pipeline = Pipeline::new(periods(), RenderOptions::default(), &out);
    let source = CsvSource::new(&csv_path).with_mmap(true);
    let summary = pipeline.run(&source, &[profile()]).unwrap();
    assert_eq!(summary.total_frames(), 5);

    let dataset = DatasetWriter::new().read(&out.dataset_path()).unwrap();
    assert_eq!(dataset.year_boundary_index, 3);
    assert_eq!(dataset.points[1].values[3], None);
    assert_eq!(dataset.points[0].values[4], Some(20.0));
}

fn lattice_observations(start: NaiveDate, days: i64, skip_last_point_after: Option<i64>) -> Vec<Observation> {
    let mut obs = Vec::new();
    for i in 0..4 {
        for j in 0..3 {
            let k = (i * 3 + j) as f64;
            let lat = 35.0 + i as f64 * 0.25;
            let lon = 139.0 + j as f64 * 0.25;
            let n = match skip_last_point_after {
                Some(limit) if i * 3 + j >= 2 => days.min(limit),
                _ => days,
            };
            obs.extend(daily(start, n, lat, lon, 1.0 + k));
        }
    }
    obs
}

#[test]
fn test_rendered_frames_and_reuse() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let out = output(&dir);
    let options = RenderOptions {
        grid_size: 40,
        sigma: 2.0,
        min_valid_points: 10,
        image_width: 96,
    };

    let periods = Periods {
        prior: PeriodWindow::new("prior", d(2025, 1, 1), d(2025, 1, 14)).unwrap(),
        current: None,
    };
    let pipeline = Pipeline::new(periods, options, &out).with_render_workers(2);

    // twelve points, all present in week one; later frames still carry every
    // point forward, so both frames render
    let source = MemorySource::new(lattice_observations(d(2025, 1, 1), 14, Some(7)));
    let mut second = profile();
    second.id = "mite".to_string();

    let summary = pipeline.run(&source, &[profile(), second]).unwrap();
    assert_eq!(summary.total_frames(), 2);
    for report in &summary.reports {
        assert_eq!(report.written(), 2);
    }

    let png = fs::read(frame_path(&out.frames_dir(), "mite", 1)).unwrap();
    assert_eq!(&png[1..4], b"PNG");
}

#[test]
fn test_profiles_file_round_trip() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join("pest_profiles.json");
    fs::write(
        &path,
        r##"{"pests": [{"id": "borer", "name": "Corn borer", "thresholds": [
            {"value": 500, "label": "late", "color": "#FF0000"},
            {"value": 100, "label": "early", "color": "#00FF00"}
        ]}]}"##,
    )
    .unwrap();

    let profiles = ProfileReader::new().read(&path).unwrap();
    let bands: Vec<f64> = profiles[0].bands().iter().map(|t| t.value).collect();
    assert_eq!(bands, vec![100.0, 500.0]);
}
