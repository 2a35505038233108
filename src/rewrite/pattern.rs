//! Path pattern matching and destination expansion.
//!
//! # Responsibilities
//! - Compile a route's `from` into a matcher (`/users/:id`, `/static/*`)
//! - Capture parameter and wildcard values from a request path
//! - Expand a `to` template with the captured values
//!
//! # Design Decisions
//! - No regex: patterns are a short token list matched with backtracking;
//!   failed states are memoized so a long path cannot blow up the search
//! - Case-sensitive, path only (the query string is carried separately)
//! - A pattern also matches as a prefix ending on a segment boundary; the
//!   unmatched remainder is appended to the expanded destination
//! - Patterns ending in `/` match exactly, so `/` never rewrites the whole site

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Param(String),
    Wildcard,
}

/// A compiled `from` pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    tokens: Vec<Token>,
    allow_prefix: bool,
}

/// Values captured by a successful match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures {
    /// Captured values in pattern order, with the parameter name if any.
    groups: Vec<(Option<String>, String)>,
    /// The part of the path after the matched prefix.
    rest: String,
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl PathPattern {
    /// Compile a pattern. Every string is a valid pattern.
    pub fn new(source: &str) -> Self {
        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                ':' if chars.peek().copied().is_some_and(is_ident_start) => {
                    if !literal.is_empty() {
                        tokens.push(Token::Literal(std::mem::take(&mut literal)));
                    }
                    let mut name = String::new();
                    while let Some(&n) = chars.peek() {
                        if !is_ident_char(n) {
                            break;
                        }
                        name.push(n);
                        chars.next();
                    }
                    tokens.push(Token::Param(name));
                }
                '*' => {
                    if !literal.is_empty() {
                        tokens.push(Token::Literal(std::mem::take(&mut literal)));
                    }
                    tokens.push(Token::Wildcard);
                }
                _ => literal.push(c),
            }
        }
        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }

        Self {
            source: source.to_string(),
            allow_prefix: !source.ends_with('/'),
            tokens,
        }
    }

    /// The pattern as written in the rule.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Match a request path, returning the captured values.
    pub fn captures(&self, path: &str) -> Option<Captures> {
        let mut search = Search::new(self, path);
        let end = search.match_at(0, 0)?;

        let names = self.tokens.iter().filter_map(|t| match t {
            Token::Param(name) => Some(Some(name.clone())),
            Token::Wildcard => Some(None),
            Token::Literal(_) => None,
        });
        let groups = names
            .zip(search.spans)
            .map(|(name, (from, to))| (name, path[from..to].to_string()))
            .collect();

        Some(Captures {
            groups,
            rest: path[end..].to_string(),
        })
    }

    /// Returns true if the path matches.
    pub fn matches(&self, path: &str) -> bool {
        self.captures(path).is_some()
    }
}

/// State of one match attempt.
///
/// Whether `tokens[index..]` can match `path[pos..]` does not depend on
/// earlier captures, so failed `(index, pos)` states are recorded and never
/// retried. Work is bounded by `tokens * path_len` states.
struct Search<'a> {
    pattern: &'a PathPattern,
    path: &'a str,
    /// Byte ranges of captures made so far.
    spans: Vec<(usize, usize)>,
    failed: Vec<bool>,
}

impl<'a> Search<'a> {
    fn new(pattern: &'a PathPattern, path: &'a str) -> Self {
        let backtracks = pattern.tokens.iter().any(|t| !matches!(t, Token::Literal(_)));
        let failed = if backtracks {
            vec![false; (pattern.tokens.len() + 1) * (path.len() + 1)]
        } else {
            Vec::new()
        };
        Self {
            pattern,
            path,
            spans: Vec::new(),
            failed,
        }
    }

    fn match_at(&mut self, index: usize, pos: usize) -> Option<usize> {
        let slot = index * (self.path.len() + 1) + pos;
        if self.failed.get(slot).copied().unwrap_or(false) {
            return None;
        }

        let (pattern, path) = (self.pattern, self.path);
        let Some(token) = pattern.tokens.get(index) else {
            let rest = &path[pos..];
            let boundary = rest.is_empty() || (pattern.allow_prefix && rest.starts_with('/'));
            return boundary.then_some(pos);
        };

        let matched = match token {
            Token::Literal(lit) => {
                if path[pos..].starts_with(lit.as_str()) {
                    self.match_at(index + 1, pos + lit.len())
                } else {
                    None
                }
            }
            Token::Param(_) => {
                let segment_end = path[pos..].find('/').map_or(path.len(), |i| pos + i);
                self.capture(index, pos, segment_end, false)
            }
            Token::Wildcard => self.capture(index, pos, path.len(), true),
        };

        if matched.is_none() {
            if let Some(flag) = self.failed.get_mut(slot) {
                *flag = true;
            }
        }
        matched
    }

    /// Try capture ends in `(pos, limit]` longest first, then the empty capture if allowed.
    fn capture(&mut self, index: usize, pos: usize, limit: usize, allow_empty: bool) -> Option<usize> {
        let path = self.path;
        let ends = path[pos..limit]
            .char_indices()
            .map(|(i, c)| pos + i + c.len_utf8())
            .rev()
            .chain(allow_empty.then_some(pos));

        for end in ends {
            self.spans.push((pos, end));
            if let Some(done) = self.match_at(index + 1, end) {
                return Some(done);
            }
            self.spans.pop();
        }
        None
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Captures {
    /// Positional capture, 1-based like `$1`.
    pub fn get(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.groups.get(i))
            .map(|(_, v)| v.as_str())
    }

    /// Named parameter capture.
    pub fn name(&self, name: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|(n, _)| n.as_deref() == Some(name))
            .map(|(_, v)| v.as_str())
    }

    /// Path remainder after the matched prefix.
    pub fn rest(&self) -> &str {
        &self.rest
    }

    /// Expand a destination template.
    ///
    /// `$N` and `:name` are substituted, the path remainder is appended to the
    /// path portion, and `query` (without `?`) is appended last.
    pub fn expand(&self, template: &str, query: Option<&str>) -> String {
        let mut out = String::with_capacity(template.len() + self.rest.len());
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '$' if chars.peek().is_some_and(|d| d.is_ascii_digit()) => {
                    let mut digits = String::new();
                    while let Some(&d) = chars.peek() {
                        if !d.is_ascii_digit() {
                            break;
                        }
                        digits.push(d);
                        chars.next();
                    }
                    match digits.parse().ok().and_then(|n| self.get(n)) {
                        Some(value) => out.push_str(value),
                        None => {
                            out.push('$');
                            out.push_str(&digits);
                        }
                    }
                }
                ':' if chars.peek().copied().is_some_and(is_ident_start) => {
                    let mut name = String::new();
                    while let Some(&n) = chars.peek() {
                        if !is_ident_char(n) {
                            break;
                        }
                        name.push(n);
                        chars.next();
                    }
                    match self.name(&name) {
                        Some(value) => out.push_str(value),
                        None => {
                            out.push(':');
                            out.push_str(&name);
                        }
                    }
                }
                _ => out.push(c),
            }
        }

        if !self.rest.is_empty() {
            let split = out.find('?').unwrap_or(out.len());
            let rest = if out[..split].ends_with('/') {
                self.rest.strip_prefix('/').unwrap_or(&self.rest)
            } else {
                self.rest.as_str()
            };
            out.insert_str(split, rest);
        }

        if let Some(query) = query.filter(|q| !q.is_empty()) {
            out.push(if out.contains('?') { '&' } else { '?' });
            out.push_str(query);
        }

        out
    }
}
