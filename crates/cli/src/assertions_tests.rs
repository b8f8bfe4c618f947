// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
use super::*;
use proptest::prelude::*;
use rstest::rstest;
use std::time::Duration;

fn run_with_code(code: Option<i32>) -> CapturedRun {
    CapturedRun {
        exit_code: code,
        stdout: String::new(),
        stderr: "oops".to_string(),
        duration: Duration::from_millis(1),
    }
}

#[test]
fn exact_output_trims_both_sides() {
    assert!(assert_exact_output("15977.724709\n", "15977.724709").is_ok());
    assert!(assert_exact_output(
        "  -1.435097,51.950080,0.000000 \n",
        "-1.435097,51.950080,0.000000"
    )
    .is_ok());
}

#[test]
fn exact_output_mismatch_records_both_values() {
    let err = assert_exact_output("15977.724710\n", "15977.724709").unwrap_err();
    assert_eq!(err.actual, "15977.724710");
    assert_eq!(err.expected, "15977.724709");
    assert_eq!(
        err.to_string(),
        "stdout: expected \"15977.724709\", got \"15977.724710\""
    );
}

#[rstest]
#[case("15977.724709", "15977.724709", 0.0, true)]
#[case("15977.724710", "15977.724709", 0.0, false)]
#[case("15977.724710", "15977.724709", 0.00001, true)]
#[case("15977.7247", "15977.724709", 0.0, false)]
#[case(" 9\n", "9", 0.0, true)]
#[case("nine", "9", 1.0, false)]
#[case("NaN", "9", 1.0, false)]
#[case("inf", "9", f64::INFINITY, false)]
#[case("15977.724709", "NaN", 0.0, false)]
#[case("15977.724709", "nan", 1e9, false)]
#[case("inf", "inf", 0.0, false)]
#[case("1e308", "-inf", f64::INFINITY, false)]
fn numeric_output_cases(
    #[case] actual: &str,
    #[case] expected: &str,
    #[case] tolerance: f64,
    #[case] pass: bool,
) {
    assert_eq!(
        assert_numeric_output(actual, expected, tolerance).is_ok(),
        pass
    );
}

#[test]
fn no_stderr_passes_on_blank_output() {
    let allow = StderrAllowList::default();
    assert!(assert_no_stderr("", &allow).is_ok());
    assert!(assert_no_stderr("\n  \n", &allow).is_ok());
}

#[test]
fn no_stderr_fails_on_warning_text() {
    let allow = StderrAllowList::default();
    let err = assert_no_stderr("Warning 1: driver is slow\n", &allow).unwrap_err();
    assert!(matches!(err, ProcessError::UnexpectedStderr { ref stderr } if stderr == "Warning 1: driver is slow"));
}

#[test]
fn no_stderr_honors_allow_list() {
    let allow = StderrAllowList::new(&["^Warning 1: ".to_string()]).unwrap();
    assert!(assert_no_stderr("Warning 1: driver is slow\n", &allow).is_ok());

    let err = assert_no_stderr("Warning 1: ok\nERROR 4: bad\n", &allow).unwrap_err();
    assert!(err.to_string().contains("ERROR 4: bad"));
    assert!(!err.to_string().contains("Warning 1"));
}

#[test]
fn allow_lists_merge() {
    let a = StderrAllowList::new(&["^a".to_string()]).unwrap();
    let b = StderrAllowList::new(&["^b".to_string()]).unwrap();
    let merged = a.merged(&b);
    assert!(merged.allows("a line"));
    assert!(merged.allows("b line"));
    assert!(!merged.allows("c line"));
    assert!(StderrAllowList::default().is_empty());
}

#[yare::parameterized(
    code_zero = { ExitExpectation::Code(0), Some(0), true },
    code_mismatch = { ExitExpectation::Code(0), Some(1), false },
    code_two = { ExitExpectation::Code(2), Some(2), true },
    success_signal = { ExitExpectation::Keyword(ExitKeyword::Success), None, false },
    nonzero = { ExitExpectation::Keyword(ExitKeyword::Nonzero), Some(1), true },
    nonzero_zero = { ExitExpectation::Keyword(ExitKeyword::Nonzero), Some(0), false },
    nonzero_signal = { ExitExpectation::Keyword(ExitKeyword::Nonzero), None, false },
    any_signal = { ExitExpectation::Keyword(ExitKeyword::Any), None, true },
)]
fn exit_expectation_matches(expect: ExitExpectation, code: Option<i32>, pass: bool) {
    assert_eq!(expect.matches(code), pass);
    assert_eq!(expect.check(&run_with_code(code)).is_ok(), pass);
}

#[test]
fn exit_expectation_deserializes_code_or_keyword() {
    #[derive(Deserialize)]
    struct Holder {
        exit: ExitExpectation,
    }
    let code: Holder = toml::from_str("exit = 3").unwrap();
    assert_eq!(code.exit, ExitExpectation::Code(3));
    let keyword: Holder = toml::from_str(r#"exit = "nonzero""#).unwrap();
    assert_eq!(keyword.exit, ExitExpectation::Keyword(ExitKeyword::Nonzero));
    assert_eq!(ExitExpectation::default(), ExitExpectation::Code(0));
}

#[test]
fn unexpected_exit_carries_stderr() {
    let err = ExitExpectation::Code(0)
        .check(&run_with_code(Some(1)))
        .unwrap_err();
    match err {
        ProcessError::UnexpectedExit { actual, stderr, .. } => {
            assert_eq!(actual, Some(1));
            assert_eq!(stderr, "oops");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn output_spec_deserializes_tagged() {
    #[derive(Deserialize)]
    struct Holder {
        stdout: OutputSpec,
    }
    let holder: Holder =
        toml::from_str(r#"stdout = { type = "numeric", value = "15977.724709" }"#).unwrap();
    assert_eq!(
        holder.stdout,
        OutputSpec::Numeric {
            value: "15977.724709".to_string(),
            tolerance: 0.0
        }
    );

    let holder: Holder = toml::from_str(
        r#"stdout = { type = "regex_capture", pattern = "Feature Count: (\\d+)", equals = "9" }"#,
    )
    .unwrap();
    assert!(matches!(holder.stdout, OutputSpec::RegexCapture { group: 1, .. }));
}

#[rstest]
#[case("NaN")]
#[case("inf")]
#[case("-infinity")]
fn compile_rejects_non_finite_expected_values(#[case] value: &str) {
    let numeric = OutputSpec::Numeric {
        value: value.to_string(),
        tolerance: 0.0,
    };
    assert_eq!(
        numeric.compile().unwrap_err(),
        OutputSpecError::NotANumber {
            value: value.to_string()
        }
    );

    let captured = OutputSpec::RegexCapture {
        pattern: "pos=(\\S+)".to_string(),
        group: 1,
        equals: value.to_string(),
        tolerance: Some(0.5),
        label: None,
    };
    assert!(matches!(
        captured.compile(),
        Err(OutputSpecError::NotANumber { .. })
    ));
}

#[test]
fn compile_rejects_bad_specs() {
    let bad_regex = OutputSpec::Regex {
        pattern: "(".to_string(),
    };
    assert!(matches!(
        bad_regex.compile(),
        Err(OutputSpecError::InvalidRegex { .. })
    ));

    let bad_number = OutputSpec::Numeric {
        value: "abc".to_string(),
        tolerance: 0.0,
    };
    assert!(matches!(
        bad_number.compile(),
        Err(OutputSpecError::NotANumber { .. })
    ));

    let bad_tolerance = OutputSpec::Numeric {
        value: "1".to_string(),
        tolerance: -1.0,
    };
    assert_eq!(
        bad_tolerance.compile().unwrap_err(),
        OutputSpecError::InvalidTolerance(-1.0)
    );

    let no_group = OutputSpec::RegexCapture {
        pattern: "Feature Count: \\d+".to_string(),
        group: 1,
        equals: "9".to_string(),
        tolerance: None,
        label: None,
    };
    assert!(matches!(
        no_group.compile(),
        Err(OutputSpecError::MissingGroup { group: 1, .. })
    ));
}

#[test]
fn regex_capture_reads_feature_count() {
    let check = OutputSpec::RegexCapture {
        pattern: r"Feature Count: (\d+)".to_string(),
        group: 1,
        equals: "9".to_string(),
        tolerance: None,
        label: Some("feature count".to_string()),
    }
    .compile()
    .unwrap();

    let report = "Layer name: parts\nGeometry: Line String\nFeature Count: 9\n";
    assert!(check.check(report).is_ok());

    let err = check.check("Feature Count: 8\n").unwrap_err();
    assert_eq!(err.what, "feature count");
    assert_eq!(err.actual, "8");
    assert_eq!(err.expected, "9");

    let err = check.check("nothing here").unwrap_err();
    assert!(err.actual.starts_with("no match"));
}

#[test]
fn regex_capture_numeric_tolerance() {
    let check = OutputSpec::RegexCapture {
        pattern: r"Checksum=(\d+)".to_string(),
        group: 1,
        equals: "10".to_string(),
        tolerance: Some(0.0),
        label: None,
    }
    .compile()
    .unwrap();
    assert!(check.check("  Checksum=10\n").is_ok());
    assert!(check.check("  Checksum=11\n").is_err());
}

#[test]
fn contains_regex_and_empty_checks() {
    let contains = OutputSpec::Contains {
        text: "GDAL".to_string(),
    }
    .compile()
    .unwrap();
    assert!(contains.check("GDAL 3.8.4, released 2024/02/08").is_ok());
    assert!(contains.check("PROJ").is_err());

    let regex = OutputSpec::Regex {
        pattern: r"^\d+\.\d{6}$".to_string(),
    }
    .compile()
    .unwrap();
    assert!(regex.check("15977.724709").is_ok());
    assert!(regex.check("15977.72").is_err());

    let empty = OutputSpec::Empty.compile().unwrap();
    assert!(empty.check(" \n").is_ok());
    assert!(empty.check("x").is_err());
}

#[test]
fn paths_exist_reports_first_missing() {
    let dir = tempfile::tempdir().unwrap();
    let present = dir.path().join("parts.shp");
    std::fs::write(&present, "x").unwrap();
    let missing = dir.path().join("subline.shp");

    assert!(assert_paths_exist(&[present.clone()]).is_ok());
    let err = assert_paths_exist(&[present, missing.clone()]).unwrap_err();
    assert!(err.actual.contains("subline.shp"));
}

proptest! {
    #[test]
    fn prop_exact_output_ignores_surrounding_whitespace(
        text in "[a-z0-9.,-]{1,20}",
        lead in "[ \t\n]{0,3}",
        trail in "[ \t\n]{0,3}",
    ) {
        let padded = format!("{}{}{}", lead, text, trail);
        prop_assert!(assert_exact_output(&padded, &text).is_ok());
    }

    #[test]
    fn prop_numeric_equal_values_pass_with_zero_tolerance(value in -1.0e9f64..1.0e9) {
        let text = format!("{:.6}", value);
        prop_assert!(assert_numeric_output(&text, &text, 0.0).is_ok());
    }
}
