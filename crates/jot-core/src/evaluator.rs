// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Output evaluation: structural checks on agent-produced data.

use serde_json::{Map, Value};

/// Result of evaluating an agent output.
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    pub passed: bool,
    /// 0.0–1.0; starts at 1.0 and loses 0.1 per error, 0.05 per warning.
    pub score: f64,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub feedback: String,
}

/// Evaluates extracted rows against an expected column set.
///
/// Stateless; one shared instance serves every agent.
#[derive(Debug, Clone, Default)]
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Self
    }

    /// Check that every row carries every required column with a scalar
    /// value.  Missing columns are errors, non-string scalars warnings.
    pub fn evaluate_rows(
        &self,
        rows: &[Map<String, Value>],
        required_columns: &[String],
    ) -> EvaluationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if rows.is_empty() {
            errors.push("no rows to evaluate".to_string());
        }

        for (i, row) in rows.iter().enumerate() {
            for col in required_columns {
                match row.get(col) {
                    None => errors.push(format!("row {i}: missing column '{col}'")),
                    Some(Value::String(_)) | Some(Value::Null) => {}
                    Some(Value::Array(_)) | Some(Value::Object(_)) => {
                        errors.push(format!("row {i}: column '{col}' is not a scalar"))
                    }
                    Some(_) => warnings.push(format!(
                        "row {i}: column '{col}' is not a string"
                    )),
                }
            }
        }

        let score = (1.0 - 0.1 * errors.len() as f64 - 0.05 * warnings.len() as f64)
            .clamp(0.0, 1.0);
        let passed = errors.is_empty();
        let feedback = if passed && warnings.is_empty() {
            "evaluation passed with no issues".to_string()
        } else {
            format!(
                "errors: {}; warnings: {}; score: {score:.2}",
                errors.len(),
                warnings.len()
            )
        };

        EvaluationReport { passed, score, errors, warnings, feedback }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn complete_rows_pass_with_full_score() {
        let rows = vec![row(json!({ "name": "A", "price": "$1" }))];
        let report = Evaluator::new().evaluate_rows(&rows, &cols(&["name", "price"]));
        assert!(report.passed);
        assert_eq!(report.score, 1.0);
    }

    #[test]
    fn missing_column_is_an_error() {
        let rows = vec![row(json!({ "name": "A" }))];
        let report = Evaluator::new().evaluate_rows(&rows, &cols(&["name", "price"]));
        assert!(!report.passed);
        assert!(report.errors[0].contains("price"));
        assert!(report.score < 1.0);
    }

    #[test]
    fn non_string_scalar_is_a_warning() {
        let rows = vec![row(json!({ "stock": 50 }))];
        let report = Evaluator::new().evaluate_rows(&rows, &cols(&["stock"]));
        assert!(report.passed);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn nested_value_is_an_error() {
        let rows = vec![row(json!({ "name": ["A", "B"] }))];
        let report = Evaluator::new().evaluate_rows(&rows, &cols(&["name"]));
        assert!(!report.passed);
    }

    #[test]
    fn empty_rows_fail() {
        let report = Evaluator::new().evaluate_rows(&[], &cols(&["name"]));
        assert!(!report.passed);
    }

    #[test]
    fn score_never_goes_negative() {
        let rows: Vec<Map<String, Value>> = (0..20).map(|_| row(json!({}))).collect();
        let report = Evaluator::new().evaluate_rows(&rows, &cols(&["a", "b"]));
        assert_eq!(report.score, 0.0);
    }
}
