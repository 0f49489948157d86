//! Criteria grammar: token patterns, trie matching, and the parser.
//!
//! Grammar:
//!
//! ```text
//! criteria := phrase ("," phrase)*
//! phrase   := property operator argument [modifier]    (boolean test)
//!           | adjective property [modifier]            (extrema selector)
//! ```
//!
//! Keywords are declared in a compact pattern syntax expanded into token
//! sequences at build time: `/` marks an optional-suffix split point
//! (`dir/ectory` accepts `dir` and `directory`), `|` separates alternatives
//! (`re|regex/p` accepts `re`, `regex`, `regexp`) and a trailing `?` makes a
//! whole word optional (`start/s with?` accepts `start`, `starts`,
//! `start with`, `starts with`). Sequences are matched greedily against a
//! token trie, so the longest keyword wins.

use regex::{Regex, RegexBuilder};

use super::lexer::{Lexer, Token, TokenKind};
use super::ParseError;

/// A candidate property a phrase can inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Property {
    Path,
    Name,
    Directory,
    DirectoryName,
    Extension,
    Mtime,
    Index,
}

/// The runtime type a property evaluates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValueKind {
    Str,
    Int,
    Time,
}

impl Property {
    pub fn kind(self) -> ValueKind {
        match self {
            Self::Path | Self::Name | Self::Directory | Self::DirectoryName | Self::Extension => {
                ValueKind::Str
            }
            Self::Mtime => ValueKind::Time,
            Self::Index => ValueKind::Int,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Name => "name",
            Self::Directory => "directory",
            Self::DirectoryName => "directory name",
            Self::Extension => "extension",
            Self::Mtime => "modification time",
            Self::Index => "index",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OperatorKind {
    Is,
    Contains,
    StartsWith,
    EndsWith,
    MatchesRegex,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Operator {
    pub kind: OperatorKind,
    pub negated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Adjective {
    Shorter,
    Longer,
    Shallower,
    Deeper,
    Earlier,
    Later,
    Lower,
    Higher,
}

/// What an adjective measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Metric {
    /// Character length of a string property
    Length,
    /// Path-separator count of a string property
    Depth,
    /// The property's natural ordering
    Ordering,
}

impl Adjective {
    pub fn metric(self) -> Metric {
        match self {
            Self::Shorter | Self::Longer => Metric::Length,
            Self::Shallower | Self::Deeper => Metric::Depth,
            Self::Earlier | Self::Later | Self::Lower | Self::Higher => Metric::Ordering,
        }
    }

    /// Whether the adjective keeps the maximum (as opposed to the minimum).
    pub fn wants_max(self) -> bool {
        matches!(self, Self::Longer | Self::Deeper | Self::Later | Self::Higher)
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::Shorter => "shorter",
            Self::Longer => "longer",
            Self::Shallower => "shallower",
            Self::Deeper => "deeper",
            Self::Earlier => "earlier",
            Self::Later => "later",
            Self::Lower => "lower",
            Self::Higher => "higher",
        }
    }
}

/// One compiled phrase of a criteria program.
#[derive(Debug)]
pub(crate) enum Phrase {
    Test {
        property: Property,
        operator: Operator,
        argument: String,
        /// Compiled pattern when the operator is a regex match
        regex: Option<Regex>,
        fold_case: bool,
    },
    Extrema {
        adjective: Adjective,
        property: Property,
        fold_case: bool,
    },
}

/// Multi-word keyword recognizer.
///
/// Nodes live in an arena; edges are labeled with single words.
struct TokenTrie<T: Copy> {
    nodes: Vec<TrieNode<T>>,
}

struct TrieNode<T> {
    accept: Option<T>,
    edges: Vec<(String, usize)>,
}

impl<T: Copy> TokenTrie<T> {
    fn new() -> Self {
        Self {
            nodes: vec![TrieNode {
                accept: None,
                edges: Vec::new(),
            }],
        }
    }

    fn add(&mut self, patterns: &[&str], value: T) {
        for pattern in patterns {
            self.add_pattern(pattern, value);
        }
    }

    fn add_pattern(&mut self, pattern: &str, value: T) {
        let mut current: Vec<usize> = vec![0];

        for word in pattern.split(' ') {
            let (word, optional) = match word.strip_suffix('?') {
                Some(stripped) => (stripped, true),
                None => (word, false),
            };

            let mut next: Vec<usize> = if optional { current.clone() } else { Vec::new() };

            for alternative in word.split('|') {
                let mut parts = alternative.split('/');
                let prefix = parts.next().unwrap_or("");
                let mut labels = vec![prefix.to_string()];
                for suffix in parts {
                    labels.push(format!("{prefix}{suffix}"));
                }

                for label in &labels {
                    for index in 0..current.len() {
                        let node = current[index];
                        let target = self.join(node, label);
                        next.push(target);
                    }
                }
            }

            current = next;
        }

        for node in current {
            self.nodes[node].accept = Some(value);
        }
    }

    fn join(&mut self, node: usize, label: &str) -> usize {
        if let Some(&(_, target)) = self.nodes[node].edges.iter().find(|(l, _)| l == label) {
            return target;
        }
        let target = self.nodes.len();
        self.nodes.push(TrieNode {
            accept: None,
            edges: Vec::new(),
        });
        self.nodes[node].edges.push((label.to_string(), target));
        target
    }

    fn walk(&self) -> TrieWalk<'_, T> {
        TrieWalk {
            trie: self,
            node: 0,
        }
    }
}

struct TrieWalk<'t, T: Copy> {
    trie: &'t TokenTrie<T>,
    node: usize,
}

impl<T: Copy> TrieWalk<'_, T> {
    fn edge(&self, token: &Token) -> Option<usize> {
        if !token.is_word() {
            return None;
        }
        self.trie.nodes[self.node]
            .edges
            .iter()
            .find(|(label, _)| *label == token.value)
            .map(|&(_, target)| target)
    }

    fn can_step(&self, token: &Token) -> bool {
        self.edge(token).is_some()
    }

    fn step(&mut self, token: &Token) {
        if let Some(target) = self.edge(token) {
            self.node = target;
        }
    }

    fn accept(&self) -> Option<T> {
        self.trie.nodes[self.node].accept
    }

    fn expected(&self) -> Vec<String> {
        self.trie.nodes[self.node]
            .edges
            .iter()
            .map(|(label, _)| label.clone())
            .collect()
    }
}

/// The four keyword tries, built once per program compilation.
struct Grammar {
    properties: TokenTrie<Property>,
    operators: TokenTrie<Operator>,
    adjectives: TokenTrie<Adjective>,
    modifiers: TokenTrie<()>,
}

impl Grammar {
    fn new() -> Self {
        let mut properties = TokenTrie::new();
        properties.add(&["path"], Property::Path);
        properties.add(&["name"], Property::Name);
        properties.add(&["dir/ectory"], Property::Directory);
        properties.add(&["dir/ectory name"], Property::DirectoryName);
        properties.add(&["ext/ension"], Property::Extension);
        properties.add(&["mtime", "modification time?"], Property::Mtime);
        properties.add(&["index"], Property::Index);

        let mut operators = TokenTrie::new();
        for (positive, negative, kind) in [
            (&["is"][..], &["is not", "isnt"][..], OperatorKind::Is),
            (&["contain/s"][..], &["not contain/s"][..], OperatorKind::Contains),
            (
                &["start/s with?"][..],
                &["not start/s with?"][..],
                OperatorKind::StartsWith,
            ),
            (
                &["end/s with?"][..],
                &["not end/s with?"][..],
                OperatorKind::EndsWith,
            ),
            (
                &["match/es re|regex/p"][..],
                &["not match/es re|regex/p"][..],
                OperatorKind::MatchesRegex,
            ),
        ] {
            operators.add(positive, Operator { kind, negated: false });
            operators.add(negative, Operator { kind, negated: true });
        }

        let mut adjectives = TokenTrie::new();
        adjectives.add(&["shorter"], Adjective::Shorter);
        adjectives.add(&["longer"], Adjective::Longer);
        adjectives.add(&["shallower"], Adjective::Shallower);
        adjectives.add(&["deeper"], Adjective::Deeper);
        adjectives.add(&["earlier"], Adjective::Earlier);
        adjectives.add(&["later"], Adjective::Later);
        adjectives.add(&["lower"], Adjective::Lower);
        adjectives.add(&["higher"], Adjective::Higher);

        let mut modifiers = TokenTrie::new();
        modifiers.add(&["ignoring case"], ());

        Self {
            properties,
            operators,
            adjectives,
            modifiers,
        }
    }
}

/// Parse a criteria string into compiled phrases.
pub(crate) fn parse(text: &str) -> Result<Vec<Phrase>, ParseError> {
    let grammar = Grammar::new();
    let mut parser = Parser::new(text)?;
    parser.run(&grammar)
}

struct Parser {
    lexer: Lexer,
    token: Token,
}

impl Parser {
    fn new(text: &str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(text);
        let token = lexer.next_token()?;
        Ok(Self { lexer, token })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.token = self.lexer.next_token()?;
        Ok(())
    }

    fn run(&mut self, grammar: &Grammar) -> Result<Vec<Phrase>, ParseError> {
        let mut phrases = Vec::new();
        loop {
            phrases.push(self.phrase(grammar)?);
            match self.token.kind {
                TokenKind::End => return Ok(phrases),
                TokenKind::Comma => self.advance()?,
                TokenKind::String => {
                    return Err(ParseError::from_token("Expected ',' or end", &self.token))
                }
            }
        }
    }

    fn phrase(&mut self, grammar: &Grammar) -> Result<Phrase, ParseError> {
        if grammar.properties.walk().can_step(&self.token) {
            return self.test_phrase(grammar);
        }
        if grammar.adjectives.walk().can_step(&self.token) {
            return self.extrema_phrase(grammar);
        }
        Err(ParseError::from_token(
            "Expected a property or an adjective",
            &self.token,
        ))
    }

    fn test_phrase(&mut self, grammar: &Grammar) -> Result<Phrase, ParseError> {
        let start = self.token.position;
        let property = self.parse_with(&grammar.properties, "a property")?;
        let operator = self.parse_with(&grammar.operators, "an operator")?;
        let (argument, argument_position, argument_length) = self.argument()?;
        let fold_case = self.modifier(grammar)?;

        match property.kind() {
            ValueKind::Time => {
                return Err(ParseError::at(
                    format!(
                        "{} only orders; compare it with earlier/later",
                        property.describe()
                    ),
                    start,
                ));
            }
            ValueKind::Int if operator.kind != OperatorKind::Is => {
                return Err(ParseError::at(
                    format!("this operator needs a text property, not {}", property.describe()),
                    start,
                ));
            }
            _ => {}
        }

        let regex = if operator.kind == OperatorKind::MatchesRegex {
            let compiled = build_regex(&argument, fold_case).map_err(|error| {
                ParseError::span(
                    format!("invalid regex: {error}"),
                    argument_position,
                    argument_length,
                )
            })?;
            Some(compiled)
        } else {
            None
        };

        Ok(Phrase::Test {
            property,
            operator,
            argument,
            regex,
            fold_case,
        })
    }

    fn extrema_phrase(&mut self, grammar: &Grammar) -> Result<Phrase, ParseError> {
        let start = self.token.position;
        let adjective = self.parse_with(&grammar.adjectives, "an adjective")?;
        let property = self.parse_with(&grammar.properties, "a property")?;
        let fold_case = self.modifier(grammar)?;

        if matches!(adjective.metric(), Metric::Length | Metric::Depth)
            && property.kind() != ValueKind::Str
        {
            return Err(ParseError::at(
                format!(
                    "'{}' needs a text property, not {}",
                    adjective.describe(),
                    property.describe()
                ),
                start,
            ));
        }

        Ok(Phrase::Extrema {
            adjective,
            property,
            fold_case,
        })
    }

    /// Greedily match one keyword against a trie.
    fn parse_with<T: Copy>(
        &mut self,
        trie: &TokenTrie<T>,
        what: &str,
    ) -> Result<T, ParseError> {
        let mut walk = trie.walk();
        while walk.can_step(&self.token) {
            walk.step(&self.token);
            self.advance()?;
        }

        match walk.accept() {
            Some(value) => Ok(value),
            None => {
                let mut expected = walk.expected();
                expected.sort();
                let list = expected
                    .iter()
                    .map(|label| format!("'{label}'"))
                    .collect::<Vec<_>>()
                    .join(", ");
                Err(ParseError::from_token(
                    format!("Expected {what}: one of {list}"),
                    &self.token,
                ))
            }
        }
    }

    fn argument(&mut self) -> Result<(String, usize, usize), ParseError> {
        if self.token.is_word() {
            let value = self.token.value.clone();
            let position = self.token.position;
            let length = self.token.text.chars().count().max(1);
            self.advance()?;
            Ok((value, position, length))
        } else {
            Err(ParseError::from_token("Expected an argument", &self.token))
        }
    }

    fn modifier(&mut self, grammar: &Grammar) -> Result<bool, ParseError> {
        if grammar.modifiers.walk().can_step(&self.token) {
            self.parse_with(&grammar.modifiers, "a modifier")?;
            return Ok(true);
        }
        Ok(false)
    }
}

/// Compile a `matches re` argument.
///
/// Patterns match at the start of the subject, and case folding is an
/// engine flag rather than an input transformation.
fn build_regex(pattern: &str, fold_case: bool) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&format!(r"\A(?:{pattern})"))
        .case_insensitive(fold_case)
        .build()
}
