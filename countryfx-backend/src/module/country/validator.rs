//! Raw country record validation
//!
//! Turns one element of the country feed into a [`Candidate`]. Every rule is
//! checked before failing so the caller sees all violations at once.

use serde_json::Value;

use super::types::{Candidate, FieldErrors};

const REQUIRED: &str = "is required";
const NOT_INTEGER: &str = "must be an integer";
const NEGATIVE: &str = "must be a non-negative integer";
const OUT_OF_RANGE: &str = "must not exceed 9223372036854775807";

/// Optional text fields pass through untouched; anything that is not a string counts as absent.
fn optional_text(raw: &Value, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(str::to_string)
}

fn check_population(raw: &Value) -> Result<i64, &'static str> {
    match raw.get("population") {
        None | Some(Value::Null) => Err(REQUIRED),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(p) if p < 0 => Err(NEGATIVE),
            Some(p) => Ok(p),
            None if n.is_u64() => Err(OUT_OF_RANGE),
            None => Err(NOT_INTEGER),
        },
        Some(_) => Err(NOT_INTEGER),
    }
}

/// Code of the first listed currency. Later entries are ignored.
fn first_currency_code(raw: &Value) -> Option<String> {
    raw.get("currencies")
        .and_then(Value::as_array)
        .and_then(|currencies| currencies.first())
        .and_then(|currency| currency.get("code"))
        .and_then(Value::as_str)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
}

pub fn validate(raw: &Value) -> Result<Candidate, FieldErrors> {
    let mut errors = FieldErrors::new();

    let name = optional_text(raw, "name").filter(|n| !n.is_empty());
    if name.is_none() {
        errors.insert("name".to_string(), REQUIRED.to_string());
    }

    let population = check_population(raw)
        .map_err(|msg| errors.insert("population".to_string(), msg.to_string()))
        .ok();

    match (name, population) {
        (Some(name), Some(population)) if errors.is_empty() => Ok(Candidate {
            name,
            capital: optional_text(raw, "capital"),
            region: optional_text(raw, "region"),
            population,
            currency_code: first_currency_code(raw),
            flag_url: optional_text(raw, "flag"),
        }),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_record() {
        let raw = json!({
            "name": "Nigeria",
            "capital": "Abuja",
            "region": "Africa",
            "population": 206139587,
            "flag": "https://flagcdn.com/ng.svg",
            "currencies": [{ "code": "NGN", "name": "Nigerian naira", "symbol": "₦" }]
        });

        let candidate = validate(&raw).unwrap();
        assert_eq!(candidate.name, "Nigeria");
        assert_eq!(candidate.capital.as_deref(), Some("Abuja"));
        assert_eq!(candidate.region.as_deref(), Some("Africa"));
        assert_eq!(candidate.population, 206139587);
        assert_eq!(candidate.currency_code.as_deref(), Some("NGN"));
        assert_eq!(candidate.flag_url.as_deref(), Some("https://flagcdn.com/ng.svg"));
    }

    #[test]
    fn test_only_first_currency_is_taken() {
        let raw = json!({
            "name": "Zimbabwe",
            "population": 14862927,
            "currencies": [{ "code": "USD" }, { "code": "ZWL" }, { "code": "BWP" }]
        });
        assert_eq!(validate(&raw).unwrap().currency_code.as_deref(), Some("USD"));
    }

    #[test]
    fn test_missing_or_empty_currencies() {
        for currencies in [json!(null), json!([]), json!("EUR"), json!([{ "code": "" }]), json!([{ "name": "x" }])] {
            let raw = json!({ "name": "Antarctica", "population": 1000, "currencies": currencies });
            assert_eq!(validate(&raw).unwrap().currency_code, None, "currencies = {}", currencies);
        }

        let raw = json!({ "name": "Antarctica", "population": 1000 });
        assert_eq!(validate(&raw).unwrap().currency_code, None);
    }

    #[test]
    fn test_optional_fields_pass_through_unmodified() {
        let raw = json!({ "name": "  Spaced  ", "population": 0, "capital": "  ", "region": null });
        let candidate = validate(&raw).unwrap();
        assert_eq!(candidate.name, "  Spaced  ");
        assert_eq!(candidate.capital.as_deref(), Some("  "));
        assert_eq!(candidate.region, None);
        assert_eq!(candidate.flag_url, None);
        assert_eq!(candidate.population, 0);
    }

    #[test]
    fn test_population_rules() {
        let cases = [
            (json!({ "name": "A" }), REQUIRED),
            (json!({ "name": "A", "population": null }), REQUIRED),
            (json!({ "name": "A", "population": "12" }), NOT_INTEGER),
            (json!({ "name": "A", "population": 12.5 }), NOT_INTEGER),
            (json!({ "name": "A", "population": true }), NOT_INTEGER),
            (json!({ "name": "A", "population": -5 }), NEGATIVE),
            (json!({ "name": "A", "population": 9_223_372_036_854_775_808u64 }), OUT_OF_RANGE),
            (json!({ "name": "A", "population": u64::MAX }), OUT_OF_RANGE),
        ];

        for (raw, expected) in cases {
            let errors = validate(&raw).unwrap_err();
            assert_eq!(errors.get("population").map(String::as_str), Some(expected), "raw = {}", raw);
            assert!(!errors.contains_key("name"));
        }
    }

    #[test]
    fn test_population_at_storage_limit() {
        let raw = json!({ "name": "Big", "population": i64::MAX });
        assert_eq!(validate(&raw).unwrap().population, i64::MAX);

        let raw = json!({ "name": "Big", "population": 9_223_372_036_854_775_808u64 });
        let errors = validate(&raw).unwrap_err();
        assert_ne!(errors["population"], NOT_INTEGER);
    }

    #[test]
    fn test_all_violations_collected() {
        let errors = validate(&json!({ "name": "", "population": -1 })).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors["name"], "is required");
        assert_eq!(errors["population"], "must be a non-negative integer");

        let errors = validate(&json!("not an object")).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
