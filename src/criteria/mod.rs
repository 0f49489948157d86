//! Preference criteria language.
//!
//! # Overview
//!
//! A criteria string is a comma-separated sequence of phrases applied to a
//! duplicate group to pick the members worth keeping:
//!
//! ```text
//! shorter path, earlier mtime
//! name ends with .bak, directory contains attic ignoring case
//! ```
//!
//! Each phrase is either a boolean test (`property operator argument`) or an
//! extrema selector (`adjective property`), optionally followed by
//! `ignoring case`. Phrases narrow the marked set in order: a test keeps the
//! members it matches, an extrema selector keeps everyone tied at the
//! minimum or maximum. A phrase that would eliminate every remaining member
//! is a no-op, so a group never ends up with nothing marked; evaluation
//! stops as soon as one member remains.
//!
//! Keywords may span several words (`directory name`, `is not`,
//! `modification time`, `ignoring case`); recognition is greedy, longest
//! match winning. Programs are compiled once ([`Criteria::parse`]) and
//! applied per group ([`Criteria::select`]).

mod eval;
mod lexer;
mod parser;

use std::fmt;

use crate::scanner::Candidate;

/// A criteria parse failure, with the offending character range when known.
///
/// Positions are zero-based character offsets into the criteria string.
#[derive(Debug, Clone)]
pub struct ParseError {
    /// What went wrong
    pub message: String,
    /// Character offset of the problem, when known
    pub position: Option<usize>,
    /// Length of the offending range, when known
    pub length: Option<usize>,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
            length: None,
        }
    }

    pub(crate) fn at(message: impl Into<String>, position: usize) -> Self {
        Self {
            position: Some(position),
            ..Self::new(message)
        }
    }

    pub(crate) fn span(message: impl Into<String>, position: usize, length: usize) -> Self {
        Self {
            length: Some(length),
            ..Self::at(message, position)
        }
    }

    pub(crate) fn from_token(message: impl Into<String>, token: &lexer::Token) -> Self {
        Self::span(message, token.position, token.text.chars().count())
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(position) = self.position {
            write!(f, " at position {position}")?;
            if let Some(length) = self.length {
                if length > 1 {
                    write!(f, "-{}", position + length - 1)?;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// A compiled criteria program.
///
/// Immutable once parsed; apply it to any number of groups.
#[derive(Debug)]
pub struct Criteria {
    phrases: Vec<parser::Phrase>,
}

impl Criteria {
    /// Compile a criteria string.
    ///
    /// # Errors
    ///
    /// Any lexical, grammatical, type, or regex-compilation problem fails
    /// the whole program with a position-bearing [`ParseError`].
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        Ok(Self {
            phrases: parser::parse(text)?,
        })
    }

    /// Apply the program to a group, returning the indexes of the marked
    /// members.
    ///
    /// The result is never empty for a non-empty group and is always a
    /// subset of the input. Criteria evaluate over each candidate's primary
    /// path; its aliases share the outcome.
    #[must_use]
    pub fn select(&self, group: &[Candidate]) -> Vec<usize> {
        eval::select(&self.phrases, group)
    }
}
