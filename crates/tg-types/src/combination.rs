use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{EvaluationError, TgResult};
use crate::value::ArgValue;

/// One point of the argument grid: `(name, value)` pairs in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Combination {
    entries: Vec<(String, ArgValue)>,
}

impl Combination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, N, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<ArgValue>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        }
    }

    /// Append an entry, replacing an existing one with the same name.
    pub fn push(&mut self, name: impl Into<String>, value: ArgValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    fn require(&self, name: &str) -> TgResult<&ArgValue> {
        self.get(name).ok_or_else(|| {
            EvaluationError::MissingArgument {
                name: name.to_string(),
            }
            .into()
        })
    }

    fn type_error(name: &str, expected: &str, actual: &ArgValue) -> EvaluationError {
        EvaluationError::ArgumentType {
            name: name.to_string(),
            expected: expected.to_string(),
            actual: actual.type_name().to_string(),
        }
    }

    pub fn get_f64(&self, name: &str) -> TgResult<f64> {
        let value = self.require(name)?;
        value
            .as_f64()
            .ok_or_else(|| Self::type_error(name, "number", value).into())
    }

    pub fn get_i64(&self, name: &str) -> TgResult<i64> {
        let value = self.require(name)?;
        value
            .as_i64()
            .ok_or_else(|| Self::type_error(name, "integer", value).into())
    }

    pub fn get_bool(&self, name: &str) -> TgResult<bool> {
        let value = self.require(name)?;
        value
            .as_bool()
            .ok_or_else(|| Self::type_error(name, "bool", value).into())
    }

    pub fn get_str(&self, name: &str) -> TgResult<&str> {
        let value = self.require(name)?;
        value
            .as_str()
            .ok_or_else(|| Self::type_error(name, "text", value).into())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &ArgValue> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return write!(f, "<no arguments>");
        }
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TgError;

    fn sample() -> Combination {
        let mut c = Combination::new();
        c.push("k", ArgValue::Int(5));
        c.push("weights", ArgValue::from("distance"));
        c.push("lambda", ArgValue::Float(0.1));
        c
    }

    #[test]
    fn typed_getters() {
        let c = sample();
        assert_eq!(c.get_i64("k").unwrap(), 5);
        assert_eq!(c.get_f64("k").unwrap(), 5.0);
        assert_eq!(c.get_str("weights").unwrap(), "distance");
        assert_eq!(c.get_f64("lambda").unwrap(), 0.1);
    }

    #[test]
    fn missing_and_mistyped_arguments() {
        let c = sample();
        match c.get_f64("alpha") {
            Err(TgError::Evaluation(EvaluationError::MissingArgument { name })) => {
                assert_eq!(name, "alpha")
            }
            other => panic!("expected MissingArgument, got {other:?}"),
        }
        match c.get_i64("weights") {
            Err(TgError::Evaluation(EvaluationError::ArgumentType { actual, .. })) => {
                assert_eq!(actual, "text")
            }
            other => panic!("expected ArgumentType, got {other:?}"),
        }
    }

    #[test]
    fn push_replaces_existing_name() {
        let mut c = sample();
        c.push("k", ArgValue::Int(9));
        assert_eq!(c.len(), 3);
        assert_eq!(c.get_i64("k").unwrap(), 9);
    }

    #[test]
    fn display_keeps_declaration_order() {
        assert_eq!(sample().to_string(), "k=5, weights=distance, lambda=0.1");
        assert_eq!(Combination::new().to_string(), "<no arguments>");
    }
}
