//! Validates report fixtures against the frozen JSON schema and checks that
//! the Rust validator agrees with it.

use jsonschema::JSONSchema;
use serde_json::Value;

const SCHEMA_PATH: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../contracts/analysis-report.schema.json"
);
const VALID_FIXTURE: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../contracts/fixtures/analysis-report.valid.json"
);
const INVALID_VERDICT_FIXTURE: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../contracts/fixtures/analysis-report.invalid-verdict.json"
);
const MISSING_FIELD_FIXTURE: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../contracts/fixtures/analysis-report.missing-field.json"
);

fn load_json(path: &str) -> Value {
    let raw = std::fs::read_to_string(path).expect("json file should be readable");
    serde_json::from_str(&raw).expect("json file should be valid")
}

fn compile_validator() -> JSONSchema {
    let schema = load_json(SCHEMA_PATH);
    JSONSchema::compile(&schema).expect("schema should compile")
}

#[test]
fn report_fixture_matches_schema() {
    let validator = compile_validator();
    let fixture = load_json(VALID_FIXTURE);
    assert!(
        validator.is_valid(&fixture),
        "report fixture should validate against schema"
    );
}

#[test]
fn report_fixture_passes_rust_validator() {
    let fixture = load_json(VALID_FIXTURE);
    let report = trapshield_report::validate(&fixture).expect("fixture should validate");
    assert_eq!(report.risk_score, 82);
    assert_eq!(report.verdict, trapshield_report::Verdict::Malicious);
}

#[test]
fn invalid_fixtures_are_rejected_by_both_validators() {
    let validator = compile_validator();
    for path in [INVALID_VERDICT_FIXTURE, MISSING_FIELD_FIXTURE] {
        let fixture = load_json(path);
        assert!(!validator.is_valid(&fixture), "{path} should fail schema");
        assert!(
            trapshield_report::validate(&fixture).is_err(),
            "{path} should fail the Rust validator"
        );
    }
}

#[test]
fn missing_field_is_named_by_rust_validator() {
    let fixture = load_json(MISSING_FIELD_FIXTURE);
    let error = trapshield_report::validate(&fixture).expect_err("grammar issues are missing");
    assert!(error.names_field("textualAnalysis.grammarIssues"));
}

#[test]
fn provider_schema_requires_same_fields_as_contract() {
    let contract = load_json(SCHEMA_PATH);
    let provider = trapshield_report::response_schema();
    assert_eq!(contract["required"], provider["required"]);
    for nested in ["textualAnalysis", "urlAnalysis"] {
        assert_eq!(
            contract["properties"][nested]["required"],
            provider["properties"][nested]["required"],
            "{nested} required list should match"
        );
    }
}
