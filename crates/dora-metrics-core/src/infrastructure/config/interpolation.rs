//! `${VAR}` and `${VAR:-default}` substitution inside config string values

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InterpolationError {
    #[error("Required environment variable not found: {0}")]
    RequiredVarNotFound(String),

    #[error("Recursive interpolation limit exceeded")]
    RecursionLimit,
}

pub type InterpolationResult<T> = Result<T, InterpolationError>;

const MAX_RECURSION_DEPTH: usize = 10;

static VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").expect("Invalid regex pattern")
});

pub fn interpolate(input: &str) -> InterpolationResult<String> {
    interpolate_with_depth(input, 0)
}

fn interpolate_with_depth(input: &str, depth: usize) -> InterpolationResult<String> {
    let mut current = input.to_string();

    for _ in 0..=MAX_RECURSION_DEPTH {
        let next = substitute_once(&current, depth)?;
        if next == current || !has_variables(&next) {
            return Ok(next);
        }
        current = next;
    }

    Err(InterpolationError::RecursionLimit)
}

fn substitute_once(input: &str, depth: usize) -> InterpolationResult<String> {
    if depth > MAX_RECURSION_DEPTH {
        return Err(InterpolationError::RecursionLimit);
    }

    let mut result = String::with_capacity(input.len());
    let mut last_end = 0;

    for cap in VAR_PATTERN.captures_iter(input) {
        let Some(full_match) = cap.get(0) else {
            continue;
        };
        let Some(var_name) = cap.get(1).map(|m| m.as_str()) else {
            continue;
        };

        let replacement = match std::env::var(var_name) {
            Ok(value) => value,
            Err(_) => match cap.get(2) {
                Some(default) => interpolate_with_depth(default.as_str(), depth + 1)?,
                None => {
                    return Err(InterpolationError::RequiredVarNotFound(
                        var_name.to_string(),
                    ));
                }
            },
        };

        result.push_str(&input[last_end..full_match.start()]);
        result.push_str(&replacement);
        last_end = full_match.end();
    }

    result.push_str(&input[last_end..]);
    Ok(result)
}

pub fn interpolate_toml(value: &mut toml::Value) -> InterpolationResult<()> {
    match value {
        toml::Value::String(s) => {
            *s = interpolate(s)?;
        }
        toml::Value::Array(arr) => {
            for item in arr {
                interpolate_toml(item)?;
            }
        }
        toml::Value::Table(table) => {
            for (_, v) in table.iter_mut() {
                interpolate_toml(v)?;
            }
        }
        _ => {}
    }
    Ok(())
}

pub fn has_variables(input: &str) -> bool {
    VAR_PATTERN.is_match(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_var() {
        std::env::set_var("DORA_TEST_VAR_SIMPLE", "eu-west-1");
        let result = interpolate("${DORA_TEST_VAR_SIMPLE}").unwrap();
        assert_eq!(result, "eu-west-1");
        std::env::remove_var("DORA_TEST_VAR_SIMPLE");
    }

    #[test]
    fn test_var_inside_text() {
        std::env::set_var("DORA_TEST_ACCOUNT", "111111111111");
        let result = interpolate("arn:aws:iam::${DORA_TEST_ACCOUNT}:role/tooling").unwrap();
        assert_eq!(result, "arn:aws:iam::111111111111:role/tooling");
        std::env::remove_var("DORA_TEST_ACCOUNT");
    }

    #[test]
    fn test_missing_var_error() {
        let result = interpolate("${DORA_VAR_DOES_NOT_EXIST_12345}");
        assert!(matches!(
            result,
            Err(InterpolationError::RequiredVarNotFound(_))
        ));
    }

    #[test]
    fn test_default_value() {
        let result = interpolate("s3://${DORA_NONEXISTENT_BUCKET:-athena-results}/").unwrap();
        assert_eq!(result, "s3://athena-results/");
    }

    #[test]
    fn test_empty_default() {
        let result = interpolate("prefix${DORA_NONEXISTENT_456:-}suffix").unwrap();
        assert_eq!(result, "prefixsuffix");
    }

    #[test]
    fn test_nested_default() {
        std::env::set_var("DORA_TEST_NESTED_INNER", "inner_value");
        let result = interpolate("${DORA_NONEXISTENT:-${DORA_TEST_NESTED_INNER}}").unwrap();
        assert_eq!(result, "inner_value");
        std::env::remove_var("DORA_TEST_NESTED_INNER");
    }

    #[test]
    fn test_has_variables() {
        assert!(has_variables("${VAR}"));
        assert!(has_variables("${VAR:-default}"));
        assert!(!has_variables("plain text"));
        assert!(!has_variables("$VAR"));
    }

    #[test]
    fn test_interpolate_toml() {
        std::env::set_var("DORA_TEST_TOML_VAR", "toml_value");

        let toml_str = r#"
            key = "${DORA_TEST_TOML_VAR}"
            nested = { inner = "${DORA_TEST_TOML_VAR:-fallback}" }
            array = ["${DORA_TEST_TOML_VAR}", "static"]
        "#;

        let mut value: toml::Value = toml::from_str(toml_str).unwrap();
        interpolate_toml(&mut value).unwrap();

        assert_eq!(value["key"].as_str().unwrap(), "toml_value");
        assert_eq!(value["nested"]["inner"].as_str().unwrap(), "toml_value");
        assert_eq!(value["array"][0].as_str().unwrap(), "toml_value");
        assert_eq!(value["array"][1].as_str().unwrap(), "static");

        std::env::remove_var("DORA_TEST_TOML_VAR");
    }
}
