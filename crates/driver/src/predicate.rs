//! Attribute predicate language for element matching.
//!
//! A small comparison language covering what `predicate`-kind selectors and
//! the generic identifier-or-label fallback need: attribute comparisons joined
//! by `AND`/`OR`, with `OR` binding loosest. String literals are single- or
//! double-quoted; splitting is quote-aware so literals may contain operator
//! keywords.

use thiserror::Error;

use crate::traits::UiElement;

/// Predicate parse failure. The selector resolver maps this to an empty
/// result rather than an error.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PredicateError {
    #[error("empty predicate")]
    Empty,
    #[error("unsupported predicate clause: '{0}'")]
    BadClause(String),
    #[error("unknown attribute '{0}'")]
    UnknownAttribute(String),
}

/// Element attribute addressable from a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Identifier,
    Label,
    Value,
    PlaceholderValue,
}

impl Attribute {
    fn parse(name: &str) -> Result<Attribute, PredicateError> {
        match name {
            "identifier" | "name" => Ok(Attribute::Identifier),
            "label" | "title" => Ok(Attribute::Label),
            "value" => Ok(Attribute::Value),
            "placeholderValue" => Ok(Attribute::PlaceholderValue),
            other => Err(PredicateError::UnknownAttribute(other.to_string())),
        }
    }
}

/// Borrowed view of the matchable attributes of one element. Lets predicate
/// evaluation run against scene data as well as live handles.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttrSnapshot<'a> {
    pub identifier: &'a str,
    pub label: &'a str,
    pub value: &'a str,
    pub placeholder: &'a str,
}

impl AttrSnapshot<'_> {
    fn read(&self, attribute: Attribute) -> &str {
        match attribute {
            Attribute::Identifier => self.identifier,
            Attribute::Label => self.label,
            Attribute::Value => self.value,
            Attribute::PlaceholderValue => self.placeholder,
        }
    }
}

/// Comparison operator within one clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equals,
    NotEquals,
    Contains,
    BeginsWith,
    EndsWith,
}

/// One `attribute OP 'literal'` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub attribute: Attribute,
    pub comparison: Comparison,
    pub literal: String,
}

impl Clause {
    fn matches(&self, attrs: &AttrSnapshot<'_>) -> bool {
        let actual = attrs.read(self.attribute);
        match self.comparison {
            Comparison::Equals => actual == self.literal,
            Comparison::NotEquals => actual != self.literal,
            Comparison::Contains => actual.contains(&self.literal),
            Comparison::BeginsWith => actual.starts_with(&self.literal),
            Comparison::EndsWith => actual.ends_with(&self.literal),
        }
    }
}

/// A disjunction of conjunctions: `OR` groups of `AND`-joined clauses.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    groups: Vec<Vec<Clause>>,
}

impl Predicate {
    /// Parses a predicate string such as
    /// `identifier == 'save' OR label CONTAINS 'Save'`.
    pub fn parse(input: &str) -> Result<Predicate, PredicateError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(PredicateError::Empty);
        }

        let mut groups = Vec::new();
        for group in split_top_level(trimmed, " OR ") {
            let mut clauses = Vec::new();
            for clause in split_top_level(group, " AND ") {
                clauses.push(parse_clause(clause)?);
            }
            groups.push(clauses);
        }
        Ok(Predicate { groups })
    }

    /// The fallback matcher for accessibility-id lookups:
    /// `identifier == S OR label == S`.
    pub fn id_or_label(selector: &str) -> Predicate {
        Predicate {
            groups: vec![
                vec![Clause {
                    attribute: Attribute::Identifier,
                    comparison: Comparison::Equals,
                    literal: selector.to_string(),
                }],
                vec![Clause {
                    attribute: Attribute::Label,
                    comparison: Comparison::Equals,
                    literal: selector.to_string(),
                }],
            ],
        }
    }

    /// Single-clause predicate for the label/value selector kinds.
    pub fn attribute(attribute: Attribute, comparison: Comparison, literal: &str) -> Predicate {
        Predicate {
            groups: vec![vec![Clause {
                attribute,
                comparison,
                literal: literal.to_string(),
            }]],
        }
    }

    /// Evaluates the predicate against an attribute snapshot.
    pub fn matches_attrs(&self, attrs: &AttrSnapshot<'_>) -> bool {
        self.groups
            .iter()
            .any(|clauses| clauses.iter().all(|clause| clause.matches(attrs)))
    }

    /// Evaluates the predicate against a live element.
    pub fn matches(&self, element: &dyn UiElement) -> bool {
        let identifier = element.identifier();
        let label = element.label();
        let value = element.value();
        let placeholder = element.placeholder_value();
        self.matches_attrs(&AttrSnapshot {
            identifier: &identifier,
            label: &label,
            value: &value,
            placeholder: &placeholder,
        })
    }
}

fn parse_clause(input: &str) -> Result<Clause, PredicateError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(PredicateError::Empty);
    }

    for (token, comparison) in [
        ("==", Comparison::Equals),
        ("!=", Comparison::NotEquals),
        (" CONTAINS ", Comparison::Contains),
        (" BEGINSWITH ", Comparison::BeginsWith),
        (" ENDSWITH ", Comparison::EndsWith),
    ] {
        if let Some(position) = find_outside_quotes(trimmed, token) {
            let attribute = Attribute::parse(trimmed[..position].trim())?;
            let literal = unquote(trimmed[position + token.len()..].trim());
            return Ok(Clause {
                attribute,
                comparison,
                literal,
            });
        }
    }
    Err(PredicateError::BadClause(trimmed.to_string()))
}

/// Splits on a separator token, ignoring occurrences inside quoted literals.
fn split_top_level<'a>(input: &'a str, separator: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut search_from = 0;
    while let Some(relative) = find_outside_quotes(&input[search_from..], separator) {
        let position = search_from + relative;
        parts.push(&input[start..position]);
        start = position + separator.len();
        search_from = start;
    }
    parts.push(&input[start..]);
    parts
}

fn find_outside_quotes(input: &str, token: &str) -> Option<usize> {
    let bytes = input.as_bytes();
    let token_bytes = token.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => {
                if b == b'\'' || b == b'"' {
                    quote = Some(b);
                } else if bytes[i..].starts_with(token_bytes) {
                    return Some(i);
                }
            }
        }
        i += 1;
    }
    None
}

fn unquote(literal: &str) -> String {
    let bytes = literal.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        if (first == b'\'' || first == b'"') && bytes[bytes.len() - 1] == first {
            return literal[1..literal.len() - 1].to_string();
        }
    }
    literal.to_string()
}
