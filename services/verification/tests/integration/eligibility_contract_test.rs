use serde_json::Value;

use welfare_domain::eligibility::{Eligibility, evaluate_tags};
use welfare_testing::fixture::Fixture;

fn tags(value: &Value) -> Vec<u8> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| u8::try_from(v.as_u64().unwrap()).unwrap())
        .collect()
}

#[test]
fn should_match_eligibility_contract_cases() {
    let fixture = Fixture::load("contracts/eligibility/cases.json");
    let cases = fixture["cases"].as_array().unwrap();
    assert!(!cases.is_empty());

    for case in cases {
        let name = case["name"].as_str().unwrap();
        let expected: Eligibility = serde_json::from_value(case["expected"].clone()).unwrap();
        let actual = evaluate_tags(tags(&case["person"]), tags(&case["required"]));
        assert_eq!(actual, expected, "case: {name}");
    }
}
