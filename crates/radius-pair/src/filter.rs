//! Filter list validation
//!
//! A filter list holds pairs whose operators are conditions, for example
//! `Port == 5` or `Class =* ANY`. Validation checks a candidate list
//! against every filter pair in order and stops at the first failure.
//!
//! ## Validation Modes
//!
//! - **Strict Mode** (default): a filter attribute missing from the
//!   candidate list fails validation.
//! - **Relaxed Mode**: a missing filter attribute is skipped. Existence
//!   checks (`=*`) still fail when the attribute is missing. Relaxed mode
//!   lets a list that simply omits a guarded attribute through, so access
//!   checks should use strict mode.

use crate::arena::{Arena, ListId, PairId};
use crate::error::{PairError, PairResult};
use crate::pair::Payload;
use crate::token::Operator;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// How missing filter attributes are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Missing attributes are skipped
    Relaxed,
    /// Missing attributes fail validation
    #[default]
    Strict,
}

/// The filter pair that failed and the candidate it failed against
///
/// `candidate` is `None` when the attribute was missing from the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationFailure {
    pub filter: PairId,
    pub candidate: Option<PairId>,
}

/// Outcome of [`Arena::validate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    Passed,
    Failed(ValidationFailure),
}

impl Validation {
    pub fn is_passed(&self) -> bool {
        matches!(self, Validation::Passed)
    }

    pub fn failure(&self) -> Option<&ValidationFailure> {
        match self {
            Validation::Passed => None,
            Validation::Failed(failure) => Some(failure),
        }
    }
}

impl Arena {
    /// Apply the operator of `filter` to `candidate`
    ///
    /// `candidate` is `None` when no pair with the filter's attribute
    /// exists, which satisfies only `!*`. Ordering operators compare the
    /// candidate on the left: `Port < 5` holds for a candidate of 3.
    /// Regex operators match the candidate's printed value against the
    /// filter's printed value.
    pub fn pair_cmp(&self, filter: PairId, candidate: Option<PairId>) -> PairResult<bool> {
        self.pair_cmp_with(filter, candidate, None)
    }

    /// Compiled pattern of a leaf regex filter pair, `None` for any other
    /// operator
    fn filter_regex(&self, filter: PairId) -> PairResult<Option<Regex>> {
        let f = self.pair(filter)?;
        if !matches!(f.op(), Operator::RegEq | Operator::RegNe) {
            return Ok(None);
        }
        match f.value() {
            Some(want) => compile_regex(&want.value().to_string()).map(Some),
            None => Ok(None),
        }
    }

    /// [`Arena::pair_cmp`] with the filter's regex compiled up front
    fn pair_cmp_with(
        &self,
        filter: PairId,
        candidate: Option<PairId>,
        regex: Option<&Regex>,
    ) -> PairResult<bool> {
        let f = self.pair(filter)?;
        let op = f.op();
        let candidate = match (op, candidate) {
            (Operator::CmpTrue, c) => return Ok(c.is_some()),
            (Operator::CmpFalse, c) => return Ok(c.is_none()),
            (_, None) => return Ok(false),
            (_, Some(c)) => self.pair(c)?,
        };

        match (f.payload(), candidate.payload()) {
            (Payload::Value(want), Payload::Value(have)) => match op {
                Operator::RegEq | Operator::RegNe => {
                    let compiled;
                    let re = match regex {
                        Some(re) => re,
                        None => {
                            compiled = compile_regex(&want.value().to_string())?;
                            &compiled
                        }
                    };
                    let matched = re.is_match(&have.to_string());
                    Ok(matched == (op == Operator::RegEq))
                }
                _ => have.value().cmp_op(op, want.value()),
            },
            (Payload::Children(want), Payload::Children(have)) => {
                let ordering = self.list_cmp(*have, *want)?;
                match op {
                    Operator::Ne => Ok(ordering != Ordering::Equal),
                    op if op.is_assignment() || op == Operator::CmpEq => {
                        Ok(ordering == Ordering::Equal)
                    }
                    op => Err(PairError::mismatch("equality operator", op.as_str())),
                }
            }
            (want, _) => Err(PairError::mismatch(
                if matches!(want, Payload::Value(_)) {
                    "leaf pair"
                } else {
                    "structural pair"
                },
                candidate.value_type().name(),
            )),
        }
    }

    /// Check `list` against every condition in `filter`
    ///
    /// Each filter pair is applied to every pair in `list` with the same
    /// attribute; all of them must satisfy it. The first failure is
    /// returned with the offending candidate, or `None` when the
    /// attribute is missing entirely.
    pub fn validate(
        &self,
        list: ListId,
        filter: ListId,
        mode: ValidationMode,
    ) -> PairResult<Validation> {
        self.list_head_ref(list)?;
        for filter_pair in self.iter(filter) {
            let da = self.pair(filter_pair)?.da();
            let mut candidate = self.find_by_da(list, None, da);

            if candidate.is_none() {
                let op = self.pair(filter_pair)?.op();
                let skip = match op {
                    Operator::CmpFalse => true,
                    Operator::CmpTrue => false,
                    _ => mode == ValidationMode::Relaxed,
                };
                if skip {
                    continue;
                }
                return Ok(Validation::Failed(ValidationFailure {
                    filter: filter_pair,
                    candidate: None,
                }));
            }

            let regex = self.filter_regex(filter_pair)?;
            while let Some(c) = candidate {
                if !self.pair_cmp_with(filter_pair, Some(c), regex.as_ref())? {
                    return Ok(Validation::Failed(ValidationFailure {
                        filter: filter_pair,
                        candidate: Some(c),
                    }));
                }
                candidate = self.find_by_da(list, Some(c), da);
            }
        }
        Ok(Validation::Passed)
    }

    /// Log why a validation failed
    pub fn log_validation_failure(&self, failure: &ValidationFailure) {
        let Ok(filter) = self.pair(failure.filter) else {
            return;
        };
        let expected = self.pair_print(failure.filter).unwrap_or_default();
        match failure.candidate.and_then(|c| self.pair_print(c).ok()) {
            Some(found) => debug!(
                attribute = %filter.da(),
                expected = %expected,
                found = %found,
                "Candidate did not match filter"
            ),
            None => debug!(
                attribute = %filter.da(),
                expected = %expected,
                "Attribute missing for filter"
            ),
        }
    }
}

fn compile_regex(pattern: &str) -> PairResult<Regex> {
    Regex::new(pattern).map_err(|e| PairError::InvalidRegex(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ScopeId;
    use crate::dict::{Attr, AttrDef, Dictionary};
    use crate::value::{Value, ValueType};

    struct Fixture {
        arena: Arena,
        scope: ScopeId,
        port: Attr,
        class: Attr,
        name: Attr,
    }

    fn fixture() -> Fixture {
        let mut dict = Dictionary::new();
        let port = dict
            .define(AttrDef::new("Port", 5, ValueType::Uint32), None)
            .unwrap();
        let class = dict
            .define(AttrDef::new("Class", 25, ValueType::String), None)
            .unwrap();
        let name = dict
            .define(AttrDef::new("User-Name", 1, ValueType::String), None)
            .unwrap();
        let mut arena = Arena::new();
        let scope = arena.new_scope(None).unwrap();
        Fixture {
            arena,
            scope,
            port,
            class,
            name,
        }
    }

    fn add(f: &mut Fixture, list: ListId, da: &Attr, op: Operator, value: Value) -> PairId {
        let pair = f.arena.append_by_da(f.scope, list, da).unwrap();
        f.arena.pair_mut(pair).unwrap().set_op(op);
        f.arena.value_mut(pair).unwrap().set(value, false).unwrap();
        pair
    }

    #[test]
    fn test_strict_fails_on_missing() {
        let mut f = fixture();
        let (port, class) = (f.port.clone(), f.class.clone());
        let filter = f.arena.new_list(f.scope).unwrap();
        let list = f.arena.new_list(f.scope).unwrap();
        add(&mut f, filter, &port, Operator::CmpEq, Value::Uint32(5));
        let class_filter = add(&mut f, filter, &class, Operator::CmpEq, Value::string("x"));
        add(&mut f, list, &port, Operator::Eq, Value::Uint32(5));

        let result = f.arena.validate(list, filter, ValidationMode::Strict).unwrap();
        assert_eq!(
            result,
            Validation::Failed(ValidationFailure {
                filter: class_filter,
                candidate: None
            })
        );
        let relaxed = f.arena.validate(list, filter, ValidationMode::Relaxed).unwrap();
        assert!(relaxed.is_passed());
    }

    #[test]
    fn test_every_instance_must_match() {
        let mut f = fixture();
        let port = f.port.clone();
        let filter = f.arena.new_list(f.scope).unwrap();
        let list = f.arena.new_list(f.scope).unwrap();
        let cond = add(&mut f, filter, &port, Operator::Lt, Value::Uint32(10));
        add(&mut f, list, &port, Operator::Eq, Value::Uint32(3));
        let big = add(&mut f, list, &port, Operator::Eq, Value::Uint32(12));

        let result = f.arena.validate(list, filter, ValidationMode::Strict).unwrap();
        assert_eq!(
            result.failure(),
            Some(&ValidationFailure {
                filter: cond,
                candidate: Some(big)
            })
        );
    }

    #[test]
    fn test_existence_operators() {
        let mut f = fixture();
        let (port, name) = (f.port.clone(), f.name.clone());
        let filter = f.arena.new_list(f.scope).unwrap();
        let list = f.arena.new_list(f.scope).unwrap();
        add(&mut f, list, &port, Operator::Eq, Value::Uint32(1));
        let absent = add(&mut f, filter, &name, Operator::CmpFalse, Value::string(""));
        assert!(f.arena.validate(list, filter, ValidationMode::Strict).unwrap().is_passed());

        f.arena.pair_mut(absent).unwrap().set_op(Operator::CmpTrue);
        let relaxed = f.arena.validate(list, filter, ValidationMode::Relaxed).unwrap();
        assert_eq!(
            relaxed.failure().map(|fail| fail.candidate),
            Some(None)
        );

        let present = add(&mut f, filter, &port, Operator::CmpFalse, Value::Uint32(0));
        f.arena.pair_mut(absent).unwrap().set_op(Operator::CmpFalse);
        let result = f.arena.validate(list, filter, ValidationMode::Strict).unwrap();
        assert_eq!(result.failure().map(|fail| fail.filter), Some(present));
    }

    #[test]
    fn test_regex_operators() {
        let mut f = fixture();
        let name = f.name.clone();
        let filter = f.arena.new_list(f.scope).unwrap();
        let list = f.arena.new_list(f.scope).unwrap();
        let cond = add(&mut f, filter, &name, Operator::RegEq, Value::string("^bob@"));
        add(&mut f, list, &name, Operator::Eq, Value::string("bob@example.com"));
        assert!(f.arena.validate(list, filter, ValidationMode::Strict).unwrap().is_passed());

        f.arena.pair_mut(cond).unwrap().set_op(Operator::RegNe);
        assert!(!f.arena.validate(list, filter, ValidationMode::Strict).unwrap().is_passed());

        f.arena
            .value_mut(cond)
            .unwrap()
            .strdup("(unclosed", false)
            .unwrap();
        assert!(matches!(
            f.arena.validate(list, filter, ValidationMode::Strict),
            Err(PairError::InvalidRegex(_))
        ));
    }

    #[test]
    fn test_regex_filter_checks_every_candidate() {
        let mut f = fixture();
        let name = f.name.clone();
        let filter = f.arena.new_list(f.scope).unwrap();
        let list = f.arena.new_list(f.scope).unwrap();
        let pattern = Value::string("@example\\.com$");
        let cond = add(&mut f, filter, &name, Operator::RegEq, pattern);
        add(&mut f, list, &name, Operator::Eq, Value::string("bob@example.com"));
        add(&mut f, list, &name, Operator::Eq, Value::string("amy@example.com"));
        let stray = add(&mut f, list, &name, Operator::Eq, Value::string("eve@example.org"));

        assert!(f.arena.filter_regex(cond).unwrap().is_some());
        let result = f.arena.validate(list, filter, ValidationMode::Strict).unwrap();
        assert_eq!(
            result.failure(),
            Some(&ValidationFailure {
                filter: cond,
                candidate: Some(stray)
            })
        );
        assert!(!f.arena.pair_cmp(cond, Some(stray)).unwrap());

        f.arena.pair_mut(cond).unwrap().set_op(Operator::CmpEq);
        assert!(f.arena.filter_regex(cond).unwrap().is_none());
    }

    #[test]
    fn test_pair_cmp_missing_candidate() {
        let mut f = fixture();
        let port = f.port.clone();
        let filter = f.arena.new_list(f.scope).unwrap();
        let cond = add(&mut f, filter, &port, Operator::CmpEq, Value::Uint32(5));
        assert!(!f.arena.pair_cmp(cond, None).unwrap());
        f.arena.pair_mut(cond).unwrap().set_op(Operator::CmpFalse);
        assert!(f.arena.pair_cmp(cond, None).unwrap());
    }

    #[test]
    fn test_mode_serde_names() {
        let mode: ValidationMode = serde_json::from_str("\"relaxed\"").unwrap();
        assert_eq!(mode, ValidationMode::Relaxed);
        assert_eq!(ValidationMode::default(), ValidationMode::Strict);
    }
}
