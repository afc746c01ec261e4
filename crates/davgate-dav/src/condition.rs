//! Structured search conditions and their DASL compiler.
//!
//! A [`Condition`] is a small immutable expression tree. Compiling it
//! yields the WHERE-clause text of the server query language; the same
//! tree always compiles to byte-identical text.
//!
//! Known gap, reproduced from the legacy gateway on purpose: values are
//! wrapped in single quotes without escaping embedded quotes, so a value
//! containing `'` leaks into the query text verbatim.

use crate::error::{Error, Result};
use crate::fields::FieldRegistry;

/// Comparison operators usable in conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Equality comparison.
    IsEqualTo,
    /// Greater-than-or-equal comparison.
    IsGreaterThanOrEqualTo,
    /// Greater-than comparison.
    IsGreaterThan,
    /// Less-than comparison.
    IsLessThan,
    /// Substring match; the value is wrapped in `%` wildcards.
    Like,
    /// Unary null test.
    IsNull,
    /// Unary true test. Has no query token; compiling it fails.
    IsTrue,
    /// Unary false test.
    IsFalse,
}

impl Operator {
    /// Returns the query token, including surrounding spacing.
    ///
    /// `IsTrue` has no token defined in the query language mapping and
    /// returns `None`.
    #[must_use]
    pub const fn token(self) -> Option<&'static str> {
        match self {
            Self::IsEqualTo => Some(" = "),
            Self::IsGreaterThanOrEqualTo => Some(" >= "),
            Self::IsGreaterThan => Some(" > "),
            Self::IsLessThan => Some(" < "),
            Self::Like => Some(" like "),
            Self::IsNull => Some(" is null"),
            Self::IsFalse => Some(" is false"),
            Self::IsTrue => None,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::IsEqualTo => "is-equal-to",
            Self::IsGreaterThanOrEqualTo => "is-greater-than-or-equal-to",
            Self::IsGreaterThan => "is-greater-than",
            Self::IsLessThan => "is-less-than",
            Self::Like => "like",
            Self::IsNull => "is-null",
            Self::IsTrue => "is-true",
            Self::IsFalse => "is-false",
        }
    }

    fn token_or_err(self) -> Result<&'static str> {
        self.token()
            .ok_or(Error::UnsupportedOperator(self.name()))
    }
}

/// Joining operator for [`Condition::Multi`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiOp {
    /// All children must hold.
    And,
    /// At least one child must hold.
    Or,
}

impl MultiOp {
    const fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// A structured search predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Comparison on a registered attribute.
    Attribute {
        /// Logical attribute name, resolved through the field registry.
        name: String,
        /// Comparison operator.
        op: Operator,
        /// Comparison value.
        value: String,
    },
    /// Comparison on a mail header.
    Header {
        /// Header name, resolved through the header namespace.
        name: String,
        /// Comparison operator.
        op: Operator,
        /// Comparison value.
        value: String,
    },
    /// Unary test on a registered attribute.
    Mono {
        /// Logical attribute name.
        name: String,
        /// Unary operator.
        op: Operator,
    },
    /// Negation.
    Not(Box<Condition>),
    /// Conjunction or disjunction. Absent children are skipped; with no
    /// present children the whole node compiles to nothing.
    Multi {
        /// Joining operator.
        op: MultiOp,
        /// Child conditions, some possibly absent.
        children: Vec<Option<Condition>>,
    },
}

impl Condition {
    /// Compiles the condition into query text.
    ///
    /// Deterministic and side-effect free; compiling twice yields
    /// identical text. An empty `Multi` compiles to the empty string.
    ///
    /// # Errors
    /// [`Error::UnknownField`] for unregistered attribute names and
    /// [`Error::UnsupportedOperator`] for `IsTrue`.
    pub fn compile(&self, fields: &FieldRegistry) -> Result<String> {
        let mut buf = String::new();
        self.append_to(&mut buf, fields)?;
        Ok(buf)
    }

    fn append_to(&self, buf: &mut String, fields: &FieldRegistry) -> Result<()> {
        match self {
            Self::Attribute { name, op, value } => {
                let uri = fields.lookup(name)?.uri();
                append_comparison(buf, &uri, *op, value)
            }
            Self::Header { name, op, value } => {
                let uri = FieldRegistry::header_uri(name);
                append_comparison(buf, &uri, *op, value)
            }
            Self::Mono { name, op } => {
                let uri = fields.lookup(name)?.uri();
                buf.push('"');
                buf.push_str(&uri);
                buf.push('"');
                buf.push_str(op.token_or_err()?);
                Ok(())
            }
            Self::Not(inner) => {
                buf.push_str("( Not ");
                inner.append_to(buf, fields)?;
                buf.push(')');
                Ok(())
            }
            Self::Multi { op, children } => {
                let mut first = true;
                for child in children.iter().flatten() {
                    if first {
                        buf.push('(');
                        first = false;
                    } else {
                        buf.push(' ');
                        buf.push_str(op.as_str());
                        buf.push(' ');
                    }
                    child.append_to(buf, fields)?;
                }
                // at least one non empty condition
                if !first {
                    buf.push(')');
                }
                Ok(())
            }
        }
    }

    /// Returns true if compiling would produce no text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Multi { children, .. } => children.iter().flatten().next().is_none(),
            _ => false,
        }
    }
}

fn append_comparison(buf: &mut String, uri: &str, op: Operator, value: &str) -> Result<()> {
    buf.push('"');
    buf.push_str(uri);
    buf.push('"');
    buf.push_str(op.token_or_err()?);
    buf.push('\'');
    if op == Operator::Like {
        buf.push('%');
    }
    buf.push_str(value);
    if op == Operator::Like {
        buf.push('%');
    }
    buf.push('\'');
    Ok(())
}

/// Conjunction of the given children.
#[must_use]
pub fn and(children: Vec<Option<Condition>>) -> Condition {
    Condition::Multi {
        op: MultiOp::And,
        children,
    }
}

/// Disjunction of the given children.
#[must_use]
pub fn or(children: Vec<Option<Condition>>) -> Condition {
    Condition::Multi {
        op: MultiOp::Or,
        children,
    }
}

/// Negation; absent conditions stay absent.
#[must_use]
pub fn not(condition: Option<Condition>) -> Option<Condition> {
    condition.map(|c| Condition::Not(Box::new(c)))
}

/// Attribute equality.
#[must_use]
pub fn eq(name: impl Into<String>, value: impl Into<String>) -> Condition {
    Condition::Attribute {
        name: name.into(),
        op: Operator::IsEqualTo,
        value: value.into(),
    }
}

/// Header equality.
#[must_use]
pub fn header_eq(name: impl Into<String>, value: impl Into<String>) -> Condition {
    Condition::Header {
        name: name.into(),
        op: Operator::IsEqualTo,
        value: value.into(),
    }
}

/// Attribute greater-than-or-equal.
#[must_use]
pub fn gte(name: impl Into<String>, value: impl Into<String>) -> Condition {
    Condition::Attribute {
        name: name.into(),
        op: Operator::IsGreaterThanOrEqualTo,
        value: value.into(),
    }
}

/// Attribute greater-than.
#[must_use]
pub fn gt(name: impl Into<String>, value: impl Into<String>) -> Condition {
    Condition::Attribute {
        name: name.into(),
        op: Operator::IsGreaterThan,
        value: value.into(),
    }
}

/// Attribute less-than.
#[must_use]
pub fn lt(name: impl Into<String>, value: impl Into<String>) -> Condition {
    Condition::Attribute {
        name: name.into(),
        op: Operator::IsLessThan,
        value: value.into(),
    }
}

/// Attribute substring match.
#[must_use]
pub fn like(name: impl Into<String>, value: impl Into<String>) -> Condition {
    Condition::Attribute {
        name: name.into(),
        op: Operator::Like,
        value: value.into(),
    }
}

/// Attribute null test.
#[must_use]
pub fn is_null(name: impl Into<String>) -> Condition {
    Condition::Mono {
        name: name.into(),
        op: Operator::IsNull,
    }
}

/// Attribute true test. Builds fine but fails at compile time; the
/// query language mapping defines no token for it.
#[must_use]
pub fn is_true(name: impl Into<String>) -> Condition {
    Condition::Mono {
        name: name.into(),
        op: Operator::IsTrue,
    }
}

/// Attribute false test.
#[must_use]
pub fn is_false(name: impl Into<String>) -> Condition {
    Condition::Mono {
        name: name.into(),
        op: Operator::IsFalse,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn registry() -> FieldRegistry {
        FieldRegistry::new()
    }

    #[test]
    fn attribute_equality() {
        let text = eq("displayname", "test.EML").compile(&registry()).unwrap();
        assert_eq!(text, "\"DAV:displayname\" = 'test.EML'");
    }

    #[test]
    fn like_wraps_wildcards() {
        let text = like("displayname", "report")
            .compile(&registry())
            .unwrap();
        assert_eq!(text, "\"DAV:displayname\" like '%report%'");
    }

    #[test]
    fn header_resolves_through_header_namespace() {
        let text = header_eq("Subject", "hello").compile(&registry()).unwrap();
        assert_eq!(text, "\"urn:schemas:mailheader:subject\" = 'hello'");
    }

    #[test]
    fn mono_is_null() {
        let text = is_null("instancetype").compile(&registry()).unwrap();
        assert_eq!(text, "\"urn:schemas:calendar:instancetype\" is null");
    }

    #[test]
    fn mono_is_false() {
        let text = is_false("ishidden").compile(&registry()).unwrap();
        assert_eq!(text, "\"DAV:ishidden\" is false");
    }

    #[test]
    fn is_true_has_no_token() {
        match is_true("read").compile(&registry()) {
            Err(Error::UnsupportedOperator(name)) => assert_eq!(name, "is-true"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn not_wraps_inner() {
        let inner = eq("read", "1");
        let text = not(Some(inner)).unwrap().compile(&registry()).unwrap();
        assert_eq!(text, "( Not \"urn:schemas:httpmail:read\" = '1')");
    }

    #[test]
    fn not_of_none_is_none() {
        assert!(not(None).is_none());
    }

    #[test]
    fn multi_empty_compiles_to_nothing() {
        let c = and(vec![None, None]);
        assert!(c.is_empty());
        assert_eq!(c.compile(&registry()).unwrap(), "");
    }

    #[test]
    fn multi_single_child_is_parenthesized() {
        let c = and(vec![Some(eq("read", "1")), None]);
        assert_eq!(
            c.compile(&registry()).unwrap(),
            "(\"urn:schemas:httpmail:read\" = '1')"
        );
    }

    #[test]
    fn multi_two_children_joined() {
        let c = and(vec![Some(eq("read", "1")), Some(eq("junk", "1"))]);
        assert_eq!(
            c.compile(&registry()).unwrap(),
            "(\"urn:schemas:httpmail:read\" = '1' AND \
             \"http://schemas.microsoft.com/mapi/proptag/x10830003\" = '1')"
        );
    }

    #[test]
    fn or_joins_with_or() {
        let c = or(vec![Some(eq("read", "0")), Some(eq("read", "1"))]);
        let text = c.compile(&registry()).unwrap();
        assert!(text.contains(" OR "));
        assert!(text.starts_with('('));
        assert!(text.ends_with(')'));
    }

    #[test]
    fn embedded_quote_is_not_escaped() {
        // Known gap, kept byte-for-byte compatible with the legacy
        // gateway: the value is not escaped.
        let c = not(Some(eq("displayname", "a'b"))).unwrap();
        let text = c.compile(&registry()).unwrap();
        assert_eq!(text, "( Not \"DAV:displayname\" = 'a'b')");
    }

    #[test]
    fn unknown_attribute_fails() {
        match eq("bogus", "x").compile(&registry()) {
            Err(Error::UnknownField(name)) => assert_eq!(name, "bogus"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn compile_is_deterministic() {
        let c = and(vec![
            Some(eq("read", "1")),
            Some(not(Some(like("displayname", "x"))).unwrap()),
        ]);
        let first = c.compile(&registry()).unwrap();
        let second = c.compile(&registry()).unwrap();
        assert_eq!(first, second);
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #[test]
            fn eq_embeds_value_verbatim(value in "[^']*") {
                let text = eq("displayname", value.clone()).compile(&registry()).unwrap();
                prop_assert_eq!(text, format!("\"DAV:displayname\" = '{value}'"));
            }

            #[test]
            fn like_always_wraps_wildcards(value in "[^'%]*") {
                let text = like("displayname", value.clone()).compile(&registry()).unwrap();
                let expected = format!("'%{value}%'");
                prop_assert!(text.ends_with(&expected));
            }

            #[test]
            fn compile_never_panics(value in ".*", header in "[A-Za-z-]{1,20}") {
                let c = and(vec![
                    Some(eq("displayname", value.clone())),
                    Some(header_eq(header, value)),
                    None,
                ]);
                let first = c.compile(&registry()).unwrap();
                let second = c.compile(&registry()).unwrap();
                prop_assert_eq!(first, second);
            }
        }
    }
}
