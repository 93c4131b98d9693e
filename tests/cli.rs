mod common;

use std::path::Path;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

use ad_sales::{columns::TrainingColumns, model::ModelArtifact};
use common::{TestWorkspace, fixture_path};

const SAMPLE_DATA: &str = "ad_sales_sample.csv";

fn ad_sales() -> Command {
    Command::cargo_bin("ad-sales").expect("binary exists")
}

fn train_model(workspace: &TestWorkspace) -> (std::path::PathBuf, std::path::PathBuf) {
    let model_path = workspace.path().join("model.json");
    let columns_path = workspace.path().join("columns.yml");
    ad_sales()
        .args([
            "train",
            "-i",
            fixture_path(SAMPLE_DATA).to_str().unwrap(),
            "-m",
            model_path.to_str().unwrap(),
            "--columns-out",
            columns_path.to_str().unwrap(),
        ])
        .assert()
        .success();
    (model_path, columns_path)
}

fn stdout_of(args: &[&str]) -> String {
    let assert = ad_sales().args(args).assert().success();
    String::from_utf8(assert.get_output().stdout.clone()).expect("stdout utf8")
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("utf8 path")
}

#[test]
fn train_writes_model_and_columns_files() {
    let workspace = TestWorkspace::new();
    let (model_path, columns_path) = train_model(&workspace);

    let artifact = ModelArtifact::load(&model_path).expect("load model");
    let columns = TrainingColumns::load(&columns_path).expect("load columns");
    assert_eq!(artifact.training_columns, columns);
    assert_eq!(columns.len(), 15);
    assert!(columns.contains("device_mobile"));
    assert!(!columns.contains("sale_amount"));

    let yaml = std::fs::read_to_string(&columns_path).expect("read columns yaml");
    assert!(yaml.starts_with("columns:"), "unexpected yaml: {yaml}");
}

#[test]
fn train_fails_without_target_column() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("no_target.csv", "Cost,Clicks\n$5,1\n$7,2\n");
    let model_path = workspace.path().join("model.json");
    ad_sales()
        .args([
            "train",
            "-i",
            path_str(&input),
            "-m",
            path_str(&model_path),
        ])
        .assert()
        .failure()
        .stderr(contains("required column 'sale_amount'"));
    assert!(!model_path.exists());
}

#[test]
fn clean_aligns_output_to_columns_file() {
    let workspace = TestWorkspace::new();
    let input = workspace.write(
        "request.csv",
        "Campaign_Name,Device,Location,Cost,Ad_Date\n\
         Data Analytcis Course,DESKTOP,hydrebad,$200,2025-07-24\n",
    );
    let columns = workspace.write(
        "columns.yml",
        "columns:\n  - cost\n  - month\n  - device_desktop\n  - device_mobile\n",
    );
    let stdout = stdout_of(&[
        "clean",
        "-i",
        path_str(&input),
        "--columns",
        path_str(&columns),
    ]);
    assert_eq!(stdout, "cost,month,device_desktop,device_mobile\n200,7,true,false\n");
}

#[test]
fn clean_discovers_layout_and_writes_file() {
    let workspace = TestWorkspace::new();
    let output = workspace.path().join("features.csv");
    ad_sales()
        .args([
            "clean",
            "-i",
            fixture_path(SAMPLE_DATA).to_str().unwrap(),
            "-o",
            path_str(&output),
            "--fill",
            "zero",
        ])
        .assert()
        .success();

    let contents = std::fs::read_to_string(&output).expect("read features");
    let mut lines = contents.lines();
    let header = lines.next().expect("header row");
    assert!(header.starts_with("clicks,impressions,cost,leads,conversions,sale_amount"));
    assert!(header.ends_with("keyword_online data analytics"));
    assert!(!header.contains("ad_id"));
    assert!(!header.contains("conversion_rate"));
    assert_eq!(lines.count(), 40);
}

#[test]
fn clean_rejects_invalid_columns_file() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("request.csv", "Cost\n$1\n");
    let columns = workspace.write("columns.yml", "columns:\n  - cost\n  - cost\n");
    ad_sales()
        .args([
            "clean",
            "-i",
            path_str(&input),
            "--columns",
            path_str(&columns),
        ])
        .assert()
        .failure()
        .stderr(contains("appears more than once"));
}

#[test]
fn predict_scores_inline_record() {
    let workspace = TestWorkspace::new();
    let (model_path, _) = train_model(&workspace);
    ad_sales()
        .args([
            "predict",
            "-m",
            path_str(&model_path),
            "--record",
            r#"{"Campaign_Name": "Data Analytcis Course", "Device": "DESKTOP", "Location": "hydrebad", "Cost": "$200", "Ad_Date": "2025-07-24"}"#,
        ])
        .assert()
        .success()
        .stdout(contains(r#"{"sale_amount_prediction":"#));
}

#[test]
fn predict_reads_body_from_stdin() {
    let workspace = TestWorkspace::new();
    let (model_path, _) = train_model(&workspace);
    ad_sales()
        .args(["predict", "-m", path_str(&model_path)])
        .write_stdin(r#"{"Cost": 250, "Clicks": 120, "Device": "mobile"}"#)
        .assert()
        .success()
        .stdout(contains("sale_amount_prediction"));
}

#[test]
fn predict_reports_malformed_body_as_payload() {
    let workspace = TestWorkspace::new();
    let (model_path, _) = train_model(&workspace);
    ad_sales()
        .args(["predict", "-m", path_str(&model_path), "--record", "[1, 2]"])
        .assert()
        .failure()
        .stdout(contains(
            r#"{"error":"request body must be a JSON object","type":"MalformedRequest"}"#,
        ))
        .stderr(contains("MalformedRequest"));
}

#[test]
fn columns_lists_model_and_file_layouts_identically() {
    let workspace = TestWorkspace::new();
    let (model_path, columns_path) = train_model(&workspace);

    let from_model = stdout_of(&["columns", "-m", path_str(&model_path)]);
    let from_file = stdout_of(&["columns", "--columns", path_str(&columns_path)]);
    assert_eq!(from_model, from_file);
    assert!(from_model.starts_with("  1  clicks\n"));
    assert_eq!(from_model.lines().count(), 15);
}

#[test]
fn columns_requires_a_source() {
    ad_sales()
        .arg("columns")
        .assert()
        .failure()
        .stderr(contains("--model").or(contains("--columns")));
}
