//! The `math` primitive.

use tapkit_types::{ScriptValue, Step, StepError};

use crate::context::ExecCtx;
use crate::state::RunState;

use super::result_key;

/// An operand given literally (`a`) or by variable name (`aVar`).
fn operand(step: &Step, state: &RunState, literal_key: &str, var_key: &str) -> Result<f64, StepError> {
    if let Some(value) = step.f64_arg(literal_key) {
        return Ok(value);
    }
    if let Some(name) = step.str_arg(var_key) {
        return state
            .numeric(&name)
            .ok_or_else(|| StepError::InvalidArgument(format!("variable '{name}' is not numeric")));
    }
    Err(StepError::InvalidArgument(format!(
        "'math' requires '{literal_key}' or '{var_key}'"
    )))
}

pub fn math(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let operation = step.require_str("operation")?;
    let key = result_key(step)?;
    let a = operand(step, cx.state, "a", "aVar")?;

    // Unary operations ignore `b` entirely.
    let result = match operation.as_str() {
        "round" => a.round(),
        "floor" => a.floor(),
        "ceil" => a.ceil(),
        "abs" => a.abs(),
        binary => {
            let b = operand(step, cx.state, "b", "bVar")?;
            match binary {
                "add" => a + b,
                "subtract" => a - b,
                "multiply" => a * b,
                "divide" => {
                    if b == 0.0 {
                        return Err(StepError::DivideByZero);
                    }
                    a / b
                }
                "mod" => {
                    if b == 0.0 {
                        return Err(StepError::DivideByZero);
                    }
                    a % b
                }
                "min" => a.min(b),
                "max" => a.max(b),
                other => {
                    return Err(StepError::InvalidArgument(format!("unknown math operation '{other}'")));
                }
            }
        }
    };

    cx.record(&key, ScriptValue::Number(result));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::testutil::Harness;
    use serde_json::json;
    use tapkit_driver::sim::SimulatedDriver;
    use tapkit_types::{ScriptValue, StepError};

    fn harness() -> Harness {
        Harness::new(SimulatedDriver::new())
    }

    #[test]
    fn binary_operations_compute_and_record() {
        let mut harness = harness();
        harness
            .run(json!({"action": "math", "operation": "add", "a": 2, "b": 3, "as": "s"}))
            .expect("add");
        assert_eq!(harness.result("s"), Some("5"));

        harness
            .run(json!({"action": "math", "operation": "mod", "a": 7, "b": 4, "as": "m"}))
            .expect("mod");
        assert_eq!(harness.result("m"), Some("3"));

        harness
            .run(json!({"action": "math", "operation": "max", "a": 2, "b": 9, "as": "mx"}))
            .expect("max");
        assert_eq!(harness.result("mx"), Some("9"));
    }

    #[test]
    fn operands_resolve_from_variables() {
        let mut harness = harness();
        harness.state.set_variable("n", ScriptValue::Number(3.0));
        harness
            .run(json!({"action": "math", "operation": "multiply", "aVar": "n", "b": 4, "as": "p"}))
            .expect("multiply");
        assert_eq!(harness.state.variable("p"), Some(&ScriptValue::Number(12.0)));
        assert_eq!(harness.result("p"), Some("12"));
    }

    #[test]
    fn divide_by_zero_fails_without_writing_the_result() {
        let mut harness = harness();
        let err = harness
            .run(json!({"action": "math", "operation": "divide", "a": 1, "b": 0, "as": "q"}))
            .unwrap_err();
        assert_eq!(err, StepError::DivideByZero);
        assert!(harness.result("q").is_none());

        let err = harness
            .run(json!({"action": "math", "operation": "mod", "a": 1, "b": 0, "as": "q"}))
            .unwrap_err();
        assert_eq!(err, StepError::DivideByZero);
    }

    #[test]
    fn unary_operations_ignore_b() {
        let mut harness = harness();
        harness
            .run(json!({"action": "math", "operation": "round", "a": 2.6, "as": "r"}))
            .expect("round");
        assert_eq!(harness.result("r"), Some("3"));

        harness
            .run(json!({"action": "math", "operation": "abs", "a": -4.5, "b": 99, "as": "ab"}))
            .expect("abs");
        assert_eq!(harness.result("ab"), Some("4.5"));
    }

    #[test]
    fn unknown_operation_and_missing_operands_are_invalid() {
        let mut harness = harness();
        let err = harness
            .run(json!({"action": "math", "operation": "power", "a": 2, "b": 3, "as": "x"}))
            .unwrap_err();
        assert!(matches!(err, StepError::InvalidArgument(_)));

        let err = harness
            .run(json!({"action": "math", "operation": "add", "b": 3, "as": "x"}))
            .unwrap_err();
        assert!(matches!(err, StepError::InvalidArgument(_)));
    }
}
