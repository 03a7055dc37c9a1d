//! Type inference and unification.
//!
//! [`infer`] assigns the narrowest [`TypeTag`] to a value, converting strings
//! that spell a number or boolean into that value. [`unify`] computes the
//! least general tag covering two tags, or reports a container/terminal
//! conflict.

use crate::error::{ArgError, ArgResult};
use crate::types::{Side, Terminal, TypeTag};
use serde_json::{Number, Value};

/// A container met a terminal value during unification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerConflict {
    /// Which operand is the container (`Existing` for the first tag).
    pub container: Side,
}

/// Unify two type tags into their least general common tag.
///
/// Terminals widen along `bool < int < float < str`; if either side is a list
/// the result is a list. `dict` only unifies with `dict`.
pub fn unify(existing: TypeTag, incoming: TypeTag) -> Result<TypeTag, ContainerConflict> {
    if existing == incoming {
        return Ok(existing);
    }

    let (a, b) = match (existing.terminal(), incoming.terminal()) {
        (Some(a), Some(b)) => (a, b),
        (None, _) => {
            return Err(ContainerConflict {
                container: Side::Existing,
            });
        }
        (_, None) => {
            return Err(ContainerConflict {
                container: Side::Incoming,
            });
        }
    };

    let unified = a.max(b);
    if existing.is_list() || incoming.is_list() {
        Ok(TypeTag::List(unified))
    } else {
        Ok(TypeTag::Scalar(unified))
    }
}

/// Infer the type of `value`, returning the normalized value and its tag.
///
/// Strings are tried as `int`, then `float`, then the `true`/`false` literals
/// (case-insensitive); the first conversion that succeeds wins. Lists are
/// inferred element-wise and tagged with the unified element terminal; an
/// empty list is `list_bool`, the identity for unification.
pub fn infer(value: &Value) -> ArgResult<(Value, TypeTag)> {
    match value {
        Value::Bool(_) => Ok((value.clone(), TypeTag::BOOL)),
        Value::Number(n) if n.is_f64() => Ok((value.clone(), TypeTag::FLOAT)),
        Value::Number(_) => Ok((value.clone(), TypeTag::INT)),
        Value::String(s) => Ok(infer_str(s)),
        Value::Array(items) => {
            let mut normalized = Vec::with_capacity(items.len());
            let mut terminal = Terminal::Bool;
            for item in items {
                let (item, tag) = infer(item)?;
                // Element tags are always terminal or list, never dict.
                if let Some(t) = tag.terminal() {
                    terminal = terminal.max(t);
                }
                normalized.push(item);
            }
            Ok((Value::Array(normalized), TypeTag::List(terminal)))
        }
        Value::Null | Value::Object(_) => Err(ArgError::unhandled(value)),
    }
}

/// Infer a raw command-line or config string.
pub fn infer_str(s: &str) -> (Value, TypeTag) {
    if let Ok(i) = s.parse::<i64>() {
        return (Value::from(i), TypeTag::INT);
    }
    if let Ok(u) = s.parse::<u64>() {
        return (Value::from(u), TypeTag::INT);
    }
    if let Some(n) = s.parse::<f64>().ok().and_then(Number::from_f64) {
        return (Value::Number(n), TypeTag::FLOAT);
    }
    if let Some(b) = parse_bool(s) {
        return (Value::Bool(b), TypeTag::BOOL);
    }
    (Value::String(s.to_string()), TypeTag::STR)
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TERMINALS: [Terminal; 4] = [Terminal::Bool, Terminal::Int, Terminal::Float, Terminal::Str];

    fn all_tags() -> Vec<TypeTag> {
        let mut tags: Vec<TypeTag> = TERMINALS.iter().map(|t| TypeTag::Scalar(*t)).collect();
        tags.extend(TERMINALS.iter().map(|t| TypeTag::List(*t)));
        tags.push(TypeTag::Dict);
        tags
    }

    #[test]
    fn test_unify_is_reflexive() {
        for tag in all_tags() {
            assert_eq!(unify(tag, tag), Ok(tag));
        }
    }

    #[test]
    fn test_unify_widens_to_stronger() {
        for (i, weak) in TERMINALS.iter().enumerate() {
            for strong in &TERMINALS[i..] {
                let expected = TypeTag::Scalar(*strong);
                assert_eq!(unify(TypeTag::Scalar(*weak), TypeTag::Scalar(*strong)), Ok(expected));
                assert_eq!(unify(TypeTag::Scalar(*strong), TypeTag::Scalar(*weak)), Ok(expected));
            }
        }
    }

    #[test]
    fn test_unify_propagates_list() {
        assert_eq!(
            unify(TypeTag::List(Terminal::Bool), TypeTag::INT),
            Ok(TypeTag::List(Terminal::Int))
        );
        assert_eq!(
            unify(TypeTag::FLOAT, TypeTag::List(Terminal::Int)),
            Ok(TypeTag::List(Terminal::Float))
        );
        assert_eq!(
            unify(TypeTag::STR, TypeTag::List(Terminal::Str)),
            Ok(TypeTag::List(Terminal::Str))
        );
    }

    #[test]
    fn test_unify_dict_conflicts() {
        assert_eq!(
            unify(TypeTag::Dict, TypeTag::INT),
            Err(ContainerConflict {
                container: Side::Existing
            })
        );
        assert_eq!(
            unify(TypeTag::List(Terminal::Str), TypeTag::Dict),
            Err(ContainerConflict {
                container: Side::Incoming
            })
        );
    }

    #[test]
    fn test_infer_strings() {
        assert_eq!(infer_str("5"), (json!(5), TypeTag::INT));
        assert_eq!(infer_str("-12"), (json!(-12), TypeTag::INT));
        assert_eq!(infer_str("5e-3"), (json!(0.005), TypeTag::FLOAT));
        assert_eq!(infer_str("0.1"), (json!(0.1), TypeTag::FLOAT));
        assert_eq!(infer_str("False"), (json!(false), TypeTag::BOOL));
        assert_eq!(infer_str("TRUE"), (json!(true), TypeTag::BOOL));
        assert_eq!(infer_str("resnet18"), (json!("resnet18"), TypeTag::STR));
        assert_eq!(infer_str("yes"), (json!("yes"), TypeTag::STR));
    }

    #[test]
    fn test_infer_non_finite_float_stays_string() {
        assert_eq!(infer_str("inf"), (json!("inf"), TypeTag::STR));
        assert_eq!(infer_str("NaN"), (json!("NaN"), TypeTag::STR));
    }

    #[test]
    fn test_infer_large_unsigned() {
        let (value, tag) = infer_str("18446744073709551615");
        assert_eq!(tag, TypeTag::INT);
        assert_eq!(value.as_u64(), Some(u64::MAX));
    }

    #[test]
    fn test_infer_native_values() {
        assert_eq!(infer(&json!(true)).unwrap(), (json!(true), TypeTag::BOOL));
        assert_eq!(infer(&json!(3)).unwrap(), (json!(3), TypeTag::INT));
        assert_eq!(infer(&json!(2.5)).unwrap(), (json!(2.5), TypeTag::FLOAT));
    }

    #[test]
    fn test_infer_list_unifies_elements() {
        let (value, tag) = infer(&json!(["1", "2", "3"])).unwrap();
        assert_eq!(value, json!([1, 2, 3]));
        assert_eq!(tag, TypeTag::List(Terminal::Int));

        let (value, tag) = infer(&json!(["5", "10.5"])).unwrap();
        assert_eq!(value, json!([5, 10.5]));
        assert_eq!(tag, TypeTag::List(Terminal::Float));

        let (_, tag) = infer(&json!([1, "a", true])).unwrap();
        assert_eq!(tag, TypeTag::List(Terminal::Str));
    }

    #[test]
    fn test_infer_empty_and_nested_lists() {
        let (_, tag) = infer(&json!([])).unwrap();
        assert_eq!(tag, TypeTag::List(Terminal::Bool));

        let (_, tag) = infer(&json!([[1, 2], [3.5]])).unwrap();
        assert_eq!(tag, TypeTag::List(Terminal::Float));
    }

    #[test]
    fn test_infer_rejects_unclassifiable() {
        assert!(matches!(
            infer(&Value::Null),
            Err(ArgError::UnhandledValueType { kind: "null", .. })
        ));
        assert!(matches!(
            infer(&json!([{"a": 1}])),
            Err(ArgError::UnhandledValueType { kind: "mapping", .. })
        ));
    }
}
