//! Criteria evaluation over duplicate groups.
//!
//! Properties are computed from each candidate's primary path (its aliases
//! share the result). String properties are derived textually:
//!
//! - `name` is everything after the last path separator
//! - `directory` is everything up to and including the last separator
//! - `directory name` is the last component of `directory`
//! - `extension` is the final dot-suffix of `name`, dot included; a name
//!   with no dot, or only a leading one, has no extension
//!
//! `mtime` compares as integer nanoseconds since the epoch; `index` is the
//! 1-based root position on the command line.

use std::path::MAIN_SEPARATOR;
use std::time::UNIX_EPOCH;

use super::parser::{Adjective, Metric, Operator, OperatorKind, Phrase, Property};
use crate::scanner::Candidate;

/// The typed result of evaluating a property against one candidate.
enum Value {
    Str(String),
    Int(u64),
    Time(u128),
}

/// Apply a phrase sequence to a group, returning the marked indexes.
///
/// Each phrase either narrows the marked set or, when it would eliminate
/// everyone, leaves it unchanged. Evaluation short-circuits once a single
/// member remains.
pub(crate) fn select(phrases: &[Phrase], group: &[Candidate]) -> Vec<usize> {
    let mut marked: Vec<usize> = (0..group.len()).collect();

    for phrase in phrases {
        if marked.len() <= 1 {
            break;
        }

        let survivors: Vec<usize> = match phrase {
            Phrase::Test {
                property,
                operator,
                argument,
                regex,
                fold_case,
            } => marked
                .iter()
                .copied()
                .filter(|&index| {
                    passes(
                        *property,
                        *operator,
                        argument,
                        regex.as_ref(),
                        *fold_case,
                        &group[index],
                    )
                })
                .collect(),
            Phrase::Extrema {
                adjective,
                property,
                fold_case,
            } => {
                let keys: Vec<SortKey> = marked
                    .iter()
                    .map(|&index| extrema_key(*adjective, *property, *fold_case, &group[index]))
                    .collect();
                let best = if adjective.wants_max() {
                    keys.iter().max()
                } else {
                    keys.iter().min()
                }
                .cloned();

                match best {
                    Some(best) => marked
                        .iter()
                        .copied()
                        .zip(keys)
                        .filter(|(_, key)| *key == best)
                        .map(|(index, _)| index)
                        .collect(),
                    None => Vec::new(),
                }
            }
        };

        if !survivors.is_empty() {
            marked = survivors;
        }
    }

    marked
}

fn passes(
    property: Property,
    operator: Operator,
    argument: &str,
    regex: Option<&regex::Regex>,
    fold_case: bool,
    candidate: &Candidate,
) -> bool {
    let value = property_value(property, candidate);
    let result = match operator.kind {
        OperatorKind::Is => equals(&value, argument, fold_case),
        OperatorKind::Contains => {
            fold(string_value(&value), fold_case).contains(&fold(argument, fold_case))
        }
        OperatorKind::StartsWith => {
            fold(string_value(&value), fold_case).starts_with(&fold(argument, fold_case))
        }
        OperatorKind::EndsWith => {
            fold(string_value(&value), fold_case).ends_with(&fold(argument, fold_case))
        }
        OperatorKind::MatchesRegex => regex
            .map(|regex| regex.is_match(string_value(&value)))
            .unwrap_or(false),
    };
    result != operator.negated
}

/// Equality with integer coercion: an integer property compares numerically
/// when the argument parses as an integer, textually otherwise.
fn equals(value: &Value, argument: &str, fold_case: bool) -> bool {
    match value {
        Value::Int(number) => match argument.parse::<u64>() {
            Ok(parsed) => *number == parsed,
            Err(_) => fold(&number.to_string(), fold_case) == fold(argument, fold_case),
        },
        Value::Str(text) => fold(text, fold_case) == fold(argument, fold_case),
        Value::Time(_) => false,
    }
}

/// Comparison key for an extrema phrase. Same phrase and property always
/// produce the same variant across a group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Int(u128),
    Str(String),
}

fn extrema_key(
    adjective: Adjective,
    property: Property,
    fold_case: bool,
    candidate: &Candidate,
) -> SortKey {
    match adjective.metric() {
        Metric::Length => {
            let value = property_value(property, candidate);
            SortKey::Int(fold(string_value(&value), fold_case).chars().count() as u128)
        }
        Metric::Depth => {
            let value = property_value(property, candidate);
            let text = string_value(&value);
            SortKey::Int(text.matches(MAIN_SEPARATOR).count() as u128)
        }
        Metric::Ordering => match property_value(property, candidate) {
            Value::Str(text) => SortKey::Str(fold(&text, fold_case)),
            Value::Int(number) => SortKey::Int(u128::from(number)),
            Value::Time(nanos) => SortKey::Int(nanos),
        },
    }
}

fn property_value(property: Property, candidate: &Candidate) -> Value {
    let path = candidate.primary().to_string_lossy();
    match property {
        Property::Path => Value::Str(path.into_owned()),
        Property::Name => Value::Str(name_part(&path).to_string()),
        Property::Directory => Value::Str(directory_part(&path).to_string()),
        Property::DirectoryName => Value::Str(directory_name_part(&path).to_string()),
        Property::Extension => Value::Str(extension_part(name_part(&path)).to_string()),
        Property::Mtime => Value::Time(
            candidate
                .modified
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_nanos())
                .unwrap_or(0),
        ),
        Property::Index => Value::Int(candidate.root_index as u64),
    }
}

fn string_value(value: &Value) -> &str {
    match value {
        Value::Str(text) => text,
        _ => "",
    }
}

fn fold(text: &str, fold_case: bool) -> String {
    if fold_case {
        text.to_lowercase()
    } else {
        text.to_string()
    }
}

fn name_part(path: &str) -> &str {
    match path.rfind(MAIN_SEPARATOR) {
        Some(index) => &path[index + MAIN_SEPARATOR.len_utf8()..],
        None => path,
    }
}

fn directory_part(path: &str) -> &str {
    match path.rfind(MAIN_SEPARATOR) {
        Some(index) => &path[..index + MAIN_SEPARATOR.len_utf8()],
        None => "",
    }
}

fn directory_name_part(path: &str) -> &str {
    match path.rfind(MAIN_SEPARATOR) {
        Some(index) => name_part(&path[..index]),
        None => "",
    }
}

fn extension_part(name: &str) -> &str {
    match name.rfind('.') {
        Some(index) if index > 0 => &name[index..],
        _ => "",
    }
}
