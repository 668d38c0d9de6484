use serde_json::json;

use webinsights_core::run_analysis;
use webinsights_server::report::{write_report, ReportFormat, REPORT_FILE_STEM};

#[tokio::test]
async fn test_write_report_creates_directory_and_file() {
    let dir = std::env::temp_dir().join(format!("webinsights-report-{}", uuid::Uuid::new_v4()));
    let result = run_analysis(json!({
        "report_name": "Blog",
        "devices": { "desktop": 3, "mobile": 1 }
    }))
    .expect("valid bundle");

    let path = write_report(&result, ReportFormat::Json, &dir)
        .await
        .expect("write report");
    assert_eq!(path, dir.join(format!("{REPORT_FILE_STEM}.json")));

    let written = std::fs::read_to_string(&path).expect("read report");
    let value: serde_json::Value = serde_json::from_str(&written).expect("parse report");
    assert_eq!(value["processed"]["report_info"]["title"], "Blog");
    assert_eq!(value["processed"]["device_share"]["entries"][0]["percentage"], 75.0);

    let html_path = write_report(&result, ReportFormat::Html, &dir)
        .await
        .expect("write html");
    assert!(html_path.ends_with(format!("{REPORT_FILE_STEM}.html")));

    let _ = std::fs::remove_dir_all(dir);
}
