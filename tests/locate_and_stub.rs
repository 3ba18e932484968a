use std::fs;

use anyhow::Result;
use tempfile::tempdir;

use callsift::core::config::LocatorConfig;
use callsift::io::metrics::{MetricsLog, MetricsRow, RunStatus};
use callsift::io::stubgen::StubGenerator;
use callsift::locator::OccurrenceLocator;

fn create_sample_project() -> Result<tempfile::TempDir> {
    let project = tempdir()?;
    let root = project.path();

    // Service with a clock read inside an instance method
    fs::create_dir_all(root.join("src/Services"))?;
    fs::write(
        root.join("src/Services/OrderService.cs"),
        r#"
using System;

namespace Shop.Services
{
    public class OrderService
    {
        public DateTime Stamp(int orderId)
        {
            var now = DateTime.Now;
            return now;
        }

        public static DateTime UtcStamp()
        {
            var now = DateTime.UtcNow;
            return now;
        }

        public static string NewReference()
        {
            return Guid.NewGuid().ToString("N");
        }
    }
}
"#,
    )?;

    // Existence check plus an assignment that must not count as a clock read
    fs::write(
        root.join("src/Services/ManifestLoader.cs"),
        r#"
using System;
using System.IO;

namespace Shop.Services
{
    public class ManifestLoader
    {
        public bool HasManifest(string path)
        {
            DateTime.Now = fakeClock.Value;
            return File.Exists(path);
        }
    }
}
"#,
    )?;

    // Build output that the walk must skip
    fs::create_dir_all(root.join("bin/Debug"))?;
    fs::write(
        root.join("bin/Debug/OrderService.cs"),
        "class Copied { void M() { var t = DateTime.Now; } }",
    )?;

    // Wrong extension, ignored
    fs::write(root.join("src/Services/notes.txt"), "DateTime.Now")?;

    Ok(project)
}

#[test]
fn scan_attributes_and_skips_build_output() -> Result<()> {
    let project = create_sample_project()?;
    let locator = OccurrenceLocator::new(&LocatorConfig::default())?;

    let report = locator.scan_directory(project.path());

    assert_eq!(report.files_with_occurrences(), 2);

    let order = report
        .files
        .iter()
        .find(|f| f.path.ends_with("OrderService.cs"))
        .expect("OrderService.cs should be scanned");
    let stamp = order
        .attributions
        .iter()
        .find(|a| a.method_name == "Stamp")
        .expect("DateTime.Now should attribute to Stamp");
    assert_eq!(stamp.class_name, "OrderService");
    assert!(!stamp.is_static);

    let utc = order
        .attributions
        .iter()
        .find(|a| a.method_name == "UtcStamp")
        .expect("DateTime.UtcNow should attribute to UtcStamp");
    assert!(utc.is_static);

    // The call-site line's own parenthesized call wins the backward scan
    assert!(order.attributions.iter().any(|a| a.method_name == "NewGuid"));

    // The fake-clock assignment is rejected; only File.Exists counts here
    let manifest = report
        .files
        .iter()
        .find(|f| f.path.ends_with("ManifestLoader.cs"))
        .expect("ManifestLoader.cs should be scanned");
    assert!(manifest.patterns_seen.iter().any(|p| p == "File.Exists"));
    assert!(!manifest.patterns_seen.iter().any(|p| p == "DateTime.Now"));

    // bin/ contents never appear
    assert!(report
        .files
        .iter()
        .all(|f| !f.path.components().any(|c| c.as_os_str() == "bin")));

    assert_eq!(report.pattern_file_counts.get("DateTime.Now"), Some(&1));
    assert_eq!(report.pattern_file_counts.get("DateTime.UtcNow"), Some(&1));
    assert_eq!(report.pattern_file_counts.get("File.Exists"), Some(&1));
    assert_eq!(report.pattern_file_counts.get("Guid.NewGuid"), Some(&1));

    Ok(())
}

#[test]
fn stubs_and_metrics_flow_from_a_scan() -> Result<()> {
    let project = create_sample_project()?;
    let locator = OccurrenceLocator::new(&LocatorConfig::default())?;
    let report = locator.scan_directory(project.path());

    let out = tempdir()?;
    let generator = StubGenerator::new(out.path().join("GeneratedTests"));

    let mut generated = 0;
    for file in &report.files {
        for attribution in &file.attributions {
            let path = generator.write_stub(&file.path, attribution)?;
            let content = fs::read_to_string(&path)?;
            assert!(content.contains("[Fact]"));
            assert!(content.contains(&attribution.method_name));
            generated += 1;
        }
    }
    assert!(generated >= 4);

    let metrics_path = out.path().join("test_metrics.csv");
    let log = MetricsLog::new(&metrics_path);
    log.append(&MetricsRow {
        timestamp: chrono::Utc::now(),
        files_with_static_calls: report.files_with_occurrences(),
        stubs_generated: generated,
        build_status: RunStatus::Pass,
        test_status: RunStatus::Fail,
        failing_tests: 2,
        initial_coverage: Some(41.2),
        final_coverage: None,
        pattern_file_counts: report.pattern_file_counts.clone(),
    })?;

    let csv = fs::read_to_string(&metrics_path)?;
    let mut lines = csv.lines();
    let header = lines.next().expect("header row");
    assert!(header.starts_with("timestamp,"));
    assert!(header.contains("files_with_DateTime_Now"));
    let row = lines.next().expect("data row");
    assert!(row.contains("PASS"));
    assert!(row.contains("FAIL"));
    assert!(row.contains("41.2"));
    assert!(row.contains("N/A"));

    Ok(())
}
