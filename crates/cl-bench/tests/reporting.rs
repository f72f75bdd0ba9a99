use cl_bench::{
    device::{render_report, PlatformInfo},
    report::{fmt_fixed, fmt_speedup, section, short_name, size_label, Column, Table},
    timing::{best_of, gflops, ns_to_ms, speedup},
    verify::{verify, verify_exact, verify_relative},
    BenchError,
};

#[test]
fn table_header_and_rows() {
    let mut table = Table::new(vec![Column::left("A", 4), Column::right("B", 6)]);
    assert_eq!(table.width(), 10);
    assert_eq!(table.header(), "A        B\n----------");
    assert_eq!(table.line(&["x", "1.5"]), "x      1.5");

    table.push(["x", "1.5"]).push(["longer", "2"]);
    assert_eq!(table.rows().len(), 2);
    assert_eq!(
        table.to_string(),
        "A        B\n----------\nx      1.5\nlonger     2\n"
    );
}

#[test]
fn missing_cells_render_empty_without_trailing_blanks() {
    let table = Table::new(vec![Column::left("Name", 8), Column::right("ms", 8)]);
    assert_eq!(table.line(&["cpu"]), "cpu");
}

#[test]
fn size_labels() {
    assert_eq!(size_label(512), "512");
    assert_eq!(size_label(1024), "1K");
    assert_eq!(size_label(1536), "1K");
    assert_eq!(size_label(1 << 20), "1M");
    assert_eq!(size_label(1 << 27), "128M");
}

#[test]
fn short_names_respect_char_boundaries() {
    assert_eq!(short_name("Radeon RX 7900", 6), "Radeon");
    assert_eq!(short_name("äöü", 2), "äö");
    assert_eq!(short_name("CPU", 10), "CPU");
}

#[test]
fn number_formatting() {
    assert_eq!(fmt_speedup(2.0), "2.00x");
    assert_eq!(fmt_fixed(3.14159, 3), "3.142");
    let banner = section("Summary");
    let rule = "=".repeat(40);
    assert_eq!(banner, format!("{rule}\nSummary\n{rule}"));
}

#[test]
fn best_of_takes_the_minimum() {
    let samples = [3.0, 1.0, 2.0];
    let best = best_of(3, |i| Ok(samples[i])).unwrap();
    assert_eq!(best, 1.0);

    let mut calls = 0;
    best_of(0, |_| {
        calls += 1;
        Ok(5.0)
    })
    .unwrap();
    assert_eq!(calls, 1);
}

#[test]
fn best_of_propagates_errors() {
    let err = best_of(3, |i| if i == 1 { Err(BenchError::NoDevices) } else { Ok(1.0) });
    assert!(matches!(err, Err(BenchError::NoDevices)));
}

#[test]
fn rates() {
    assert_eq!(speedup(10.0, 2.0), 5.0);
    assert_eq!(gflops(2e9, 1000.0), 2.0);
    assert_eq!(ns_to_ms(1_000_000, 3_000_000), 2.0);
    assert_eq!(ns_to_ms(5, 1), 0.0);
}

#[test]
fn absolute_verification() {
    assert!(verify(&[1.0, 2.0], &[1.0, 2.0005], 1e-3).passed());

    let check = verify(&[1.0, 2.0, 3.0], &[1.0, 2.5, 4.0], 1e-3);
    assert_eq!(check.errors, 2);
    assert_eq!(check.first[0].index, 1);
    assert_eq!(check.first[0].expected, 2.0);
    assert_eq!(check.first[0].actual, 2.5);
    assert_eq!(check.to_string(), "  ✗ Failed (2 errors)");
}

#[test]
fn verification_edge_cases() {
    assert_eq!(verify(&[1.0, 2.0], &[1.0], 1e-3).errors, 1);
    assert!(!verify(&[1.0], &[f32::NAN], 1e-3).passed());
    assert_eq!(verify(&[], &[], 1e-3).to_string(), "  ✓ Verified");

    let expected = vec![0.0_f32; 10];
    let actual = vec![1.0_f32; 10];
    let check = verify(&expected, &actual, 1e-3);
    assert_eq!(check.errors, 10);
    assert_eq!(check.first.len(), 5);
}

#[test]
fn relative_verification() {
    assert!(verify_relative(&[1000.0], &[1000.5], 1e-3, 0.0).passed());
    assert!(!verify_relative(&[1000.0], &[1002.0], 1e-3, 0.0).passed());
    assert!(verify_relative(&[0.0], &[1e-4], 1e-3, 1e-3).passed());
}

#[test]
fn exact_verification() {
    assert!(verify_exact(&[1, 2, 3], &[1, 2, 3]).passed());
    let check = verify_exact(&[1, 2, 3], &[1, 0, 3]);
    assert_eq!(check.errors, 1);
    assert_eq!(check.first[0].index, 1);
}

#[test]
fn mismatch_lines_name_the_implementation() {
    let check = verify(&[1.0, 2.0, 3.0], &[1.0, 2.5, 3.0], 1e-3);
    assert_eq!(
        check.mismatch_lines("OpenCL: gpu"),
        ["Mismatch in OpenCL: gpu at 1: expected 2, got 2.5"]
    );
    assert!(verify(&[1.0], &[1.0], 1e-3).mismatch_lines("x").is_empty());
}

#[test]
fn device_report_layout() {
    let platforms = [
        PlatformInfo {
            index: 0,
            name: "Mesa".into(),
            vendor: "X".into(),
            version: "OpenCL 3.0".into(),
            devices: Ok(Vec::new()),
        },
        PlatformInfo {
            index: 1,
            name: "Broken".into(),
            vendor: "Y".into(),
            version: "OpenCL 1.2".into(),
            devices: Err(-1),
        },
    ];
    let report = render_report(&platforms);
    assert!(report.starts_with("=== OpenCL Device Enumeration ===\n\nFound 2 OpenCL platform(s)\n"));
    assert!(report.contains("Platform 0:\n  Name: Mesa\n  Vendor: X\n  Version: OpenCL 3.0\n  Devices: 0\n"));
    assert!(report.contains("  Devices: <error -1, skipping>\n"));
    assert!(report.ends_with("Enumeration complete!\n"));

    let empty = render_report(&[]);
    assert!(empty.starts_with("=== OpenCL Device Enumeration ===\n"));
    assert!(empty.contains("Found 0 OpenCL platform(s)"));
}
