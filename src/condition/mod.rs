//! Branch-condition evaluation.
//!
//! Used statically by validation (to reject conditions that can never be
//! evaluated) and at runtime by plan runners to decide whether a conditional
//! connection is followed.

use crate::error::ConditionEvaluationError;
use crate::model::BranchCondition;
use crate::value::{Parameters, Value};
use regex::Regex;
use std::fmt;

/// The operators a `BranchCondition` may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionOperator {
    GreaterThan,
    SmallerThan,
    GreaterThanOrEqual,
    SmallerThanOrEqual,
    Equal,
    NotEqual,
    Contains,
    Matches,
}

impl ConditionOperator {
    pub fn parse(symbol: &str) -> Option<Self> {
        match symbol.trim() {
            ">" => Some(Self::GreaterThan),
            "<" => Some(Self::SmallerThan),
            ">=" => Some(Self::GreaterThanOrEqual),
            "<=" => Some(Self::SmallerThanOrEqual),
            "==" => Some(Self::Equal),
            "!=" => Some(Self::NotEqual),
            "contains" => Some(Self::Contains),
            "matches" => Some(Self::Matches),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::GreaterThan => ">",
            Self::SmallerThan => "<",
            Self::GreaterThanOrEqual => ">=",
            Self::SmallerThanOrEqual => "<=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Contains => "contains",
            Self::Matches => "matches",
        }
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

static NULL: Value = Value::Null;

// Numeric comparison; operands that are not numbers never satisfy it.
macro_rules! compare_numbers {
    ($left:expr, $right:expr, $op:tt) => {
        match ($left.as_number(), $right.as_number()) {
            (Some(l), Some(r)) => l $op r,
            _ => false,
        }
    };
}

/// Evaluates branch conditions against runtime values. Stateless and pure.
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// Evaluates `condition` for a source value.
    ///
    /// The right-hand operand is the condition's own value, or `target` when
    /// the condition carries no value (`null`), which compares two ports.
    pub fn evaluate(
        condition: &BranchCondition,
        source: &Value,
        target: Option<&Value>,
    ) -> Result<bool, ConditionEvaluationError> {
        let operator = Self::operator(condition)?;
        let operand = match (condition.value(), target) {
            (Value::Null, Some(target)) => target,
            (value, _) => value,
        };

        let outcome = match operator {
            ConditionOperator::GreaterThan => compare_numbers!(source, operand, >),
            ConditionOperator::SmallerThan => compare_numbers!(source, operand, <),
            ConditionOperator::GreaterThanOrEqual => compare_numbers!(source, operand, >=),
            ConditionOperator::SmallerThanOrEqual => compare_numbers!(source, operand, <=),
            ConditionOperator::Equal => loose_equal(source, operand),
            ConditionOperator::NotEqual => !loose_equal(source, operand),
            ConditionOperator::Contains => source.to_string().contains(&operand.to_string()),
            ConditionOperator::Matches => {
                Self::pattern(condition, operand)?.is_match(&source.to_string())
            }
        };
        Ok(outcome)
    }

    /// Evaluates every condition independently against one node's output data.
    ///
    /// Each condition reads its source value from `node_data[sourcePort]` and its
    /// target value from `node_data[targetPort]`. A failing condition does not
    /// stop the others.
    pub fn evaluate_all(
        node_data: &Parameters,
        conditions: &[BranchCondition],
    ) -> Vec<Result<bool, ConditionEvaluationError>> {
        conditions
            .iter()
            .map(|condition| {
                let source = node_data
                    .get(condition.source_port())
                    .unwrap_or(&NULL);
                let target = node_data.get(condition.target_port());
                Self::evaluate(condition, source, target)
            })
            .collect()
    }

    /// Fail-fast variant of [`evaluate_all`](Self::evaluate_all).
    pub fn evaluate_all_strict(
        node_data: &Parameters,
        conditions: &[BranchCondition],
    ) -> Result<Vec<bool>, ConditionEvaluationError> {
        Self::evaluate_all(node_data, conditions).into_iter().collect()
    }

    /// Checks that a condition could be evaluated: a known operator and, for
    /// `matches`, a pattern that compiles.
    pub fn check(condition: &BranchCondition) -> Result<(), ConditionEvaluationError> {
        let operator = Self::operator(condition)?;
        if operator == ConditionOperator::Matches && !condition.value().is_null() {
            Self::pattern(condition, condition.value())?;
        }
        Ok(())
    }

    fn operator(
        condition: &BranchCondition,
    ) -> Result<ConditionOperator, ConditionEvaluationError> {
        ConditionOperator::parse(condition.operator()).ok_or_else(|| {
            ConditionEvaluationError::UnknownOperator {
                condition: condition.identity(),
                operator: condition.operator().to_string(),
            }
        })
    }

    fn pattern(
        condition: &BranchCondition,
        operand: &Value,
    ) -> Result<Regex, ConditionEvaluationError> {
        Regex::new(&operand.to_string()).map_err(|e| ConditionEvaluationError::InvalidPattern {
            condition: condition.identity(),
            message: e.to_string(),
        })
    }
}

/// Equality with one explicit coercion rule.
///
/// Numbers and numeric text compare numerically; booleans and `"true"`/`"false"`
/// text compare as booleans when either side is a boolean; `null` equals only
/// `null`; everything else compares by string form.
pub fn loose_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => return true,
        (Value::Null, _) | (_, Value::Null) => return false,
        _ => {}
    }
    if let (Some(l), Some(r)) = (left.as_number(), right.as_number()) {
        return l == r;
    }
    if matches!(left, Value::Bool(_)) || matches!(right, Value::Bool(_)) {
        return match (left.as_bool(), right.as_bool()) {
            (Some(l), Some(r)) => l == r,
            _ => false,
        };
    }
    left.to_string() == right.to_string()
}
