//! Parsing of the parameter-discovery listing.
//!
//! The discovery wrapper prints one `key => value` pair per line. Repeated
//! keys and the `packages` key accumulate into lists; every other key keeps
//! a single scalar value.

use std::collections::BTreeMap;

use serde::Serialize;

/// Key that is always reported as a list, even with a single entry.
pub const PACKAGES_KEY: &str = "packages";

/// Separator between a parameter name and its value.
const SEPARATOR: &str = "=>";

/// A declared script parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Scalar(String),
    List(Vec<String>),
}

/// Parsed parameter schema keyed by parameter name.
pub type ParameterSchema = BTreeMap<String, ParameterValue>;

/// Parse discovery output lines into a [`ParameterSchema`].
///
/// Lines without exactly one `=>` are skipped with a warning.
pub fn parse_parameter_lines<'a, I>(lines: I) -> ParameterSchema
where
    I: IntoIterator<Item = &'a str>,
{
    let mut schema = ParameterSchema::new();

    for line in lines {
        let parts: Vec<&str> = line.split(SEPARATOR).collect();
        let [name, value] = parts.as_slice() else {
            tracing::warn!(line, "Invalid output line");
            continue;
        };
        let name = name.trim().to_string();
        let value = value.trim().to_string();

        match schema.remove(&name) {
            Some(ParameterValue::List(mut values)) => {
                values.push(value);
                schema.insert(name, ParameterValue::List(values));
            }
            Some(ParameterValue::Scalar(previous)) => {
                schema.insert(name, ParameterValue::List(vec![previous, value]));
            }
            None if name == PACKAGES_KEY => {
                schema.insert(name, ParameterValue::List(vec![value]));
            }
            None => {
                schema.insert(name, ParameterValue::Scalar(value));
            }
        }
    }

    schema
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(s: &str) -> ParameterValue {
        ParameterValue::Scalar(s.into())
    }

    fn list(items: &[&str]) -> ParameterValue {
        ParameterValue::List(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn scalars_and_packages() {
        let schema = parse_parameter_lines(["x => 1", "packages => a", "packages => b"]);
        assert_eq!(schema.len(), 2);
        assert_eq!(schema["x"], scalar("1"));
        assert_eq!(schema["packages"], list(&["a", "b"]));
    }

    #[test]
    fn single_package_is_still_a_list() {
        let schema = parse_parameter_lines(["packages => forecast"]);
        assert_eq!(schema["packages"], list(&["forecast"]));
    }

    #[test]
    fn repeated_key_becomes_list() {
        let schema = parse_parameter_lines(["col => a", "col => b", "col => c"]);
        assert_eq!(schema["col"], list(&["a", "b", "c"]));
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let schema = parse_parameter_lines(["no separator", "a => b => c", "", "ok => yes"]);
        assert_eq!(schema.len(), 1);
        assert_eq!(schema["ok"], scalar("yes"));
    }

    #[test]
    fn serializes_as_plain_json() {
        let schema = parse_parameter_lines(["x => 1", "packages => a", "packages => b"]);
        let json = serde_json::to_value(&schema).expect("serialize");
        assert_eq!(json, serde_json::json!({"x": "1", "packages": ["a", "b"]}));
    }
}
