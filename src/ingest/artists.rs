//! Decoder for the serialized lineup column.
//!
//! The scraper stores each lineup as a list literal of `[artist_id, artist_name]`
//! pairs, e.g. `[['bicep', 'Bicep'], ['ben-ufo', "Ben UFO's Friend"]]`. Both
//! Python-style and JSON quoting are accepted, as are `None`/`null` members.

use regex::Regex;
use std::sync::OnceLock;

use crate::domain::ArtistCredit;

// Every non-blank character must land in one of these groups; a lone quote means
// the string was never closed.
const TOKEN_PATTERN: &str = r#"(?s)'(?P<single>(?:[^'\\]|\\.)*)'|"(?P<double>(?:[^"\\]|\\.)*)"|(?P<punct>[\[\](),])|(?P<word>[^\s\[\](),'"]+)|(?P<stray>['"])"#;

const ESCAPE_PATTERN: &str = r"(?s)\\(?:x(?P<x>[0-9a-fA-F]{2})|u(?P<u>[0-9a-fA-F]{4})|U(?P<big>[0-9a-fA-F]{8})|(?P<other>.))";

fn cached(cell: &'static OnceLock<Regex>, pattern: &str) -> Result<&'static Regex, String> {
    if let Some(re) = cell.get() {
        return Ok(re);
    }
    let re = Regex::new(pattern).map_err(|e| e.to_string())?;
    Ok(cell.get_or_init(|| re))
}

fn token_regex() -> Result<&'static Regex, String> {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    cached(&TOKEN, TOKEN_PATTERN)
}

fn escape_regex() -> Result<&'static Regex, String> {
    static ESCAPE: OnceLock<Regex> = OnceLock::new();
    cached(&ESCAPE, ESCAPE_PATTERN)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token<'a> {
    Punct(char),
    /// Body of a quoted string, escapes still encoded
    Quoted(&'a str),
    Word(&'a str),
}

fn tokenize(raw: &str) -> Result<Vec<Token<'_>>, String> {
    let mut tokens = Vec::new();
    for caps in token_regex()?.captures_iter(raw) {
        let token = if let Some(m) = caps.name("single").or_else(|| caps.name("double")) {
            Token::Quoted(m.as_str())
        } else if let Some(m) = caps.name("punct") {
            Token::Punct(m.as_str().chars().next().unwrap_or(','))
        } else if let Some(m) = caps.name("word") {
            Token::Word(m.as_str())
        } else {
            return Err("unterminated string in artist list".to_string());
        };
        tokens.push(token);
    }
    Ok(tokens)
}

fn hex_char(hex: &str) -> Result<char, String> {
    u32::from_str_radix(hex, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| format!("invalid escape \\{}", hex))
}

fn unescape(body: &str) -> Result<String, String> {
    let mut out = String::with_capacity(body.len());
    let mut last = 0;
    for caps in escape_regex()?.captures_iter(body) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&body[last..whole.start()]);
        last = whole.end();

        let decoded = if let Some(hex) = caps.name("x").or_else(|| caps.name("u")).or_else(|| caps.name("big")) {
            hex_char(hex.as_str())?
        } else {
            match caps.name("other").map(|m| m.as_str()) {
                Some("n") => '\n',
                Some("t") => '\t',
                Some("r") => '\r',
                Some("x" | "u" | "U") => return Err("truncated escape in artist list".to_string()),
                Some(other) => other.chars().next().unwrap_or('\\'),
                None => '\\',
            }
        };
        out.push(decoded);
    }
    out.push_str(&body[last..]);
    Ok(out)
}

pub fn parse_artist_list(raw: &str) -> Result<Vec<ArtistCredit>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let mut p = LineupParser {
        tokens: tokenize(trimmed)?,
        pos: 0,
    };
    let credits = p.list()?;
    if let Some(token) = p.next() {
        return Err(format!("unexpected trailing {:?} after artist list", token));
    }
    Ok(credits)
}

struct LineupParser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> LineupParser<'a> {
    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token<'a>> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, wanted: &[char]) -> Result<char, String> {
        match self.next() {
            Some(Token::Punct(c)) if wanted.contains(&c) => Ok(c),
            Some(other) => Err(format!("expected one of {:?}, found {:?}", wanted, other)),
            None => Err(format!("expected one of {:?}, found end of input", wanted)),
        }
    }

    fn list(&mut self) -> Result<Vec<ArtistCredit>, String> {
        self.expect(&['['])?;
        let mut credits = Vec::new();
        loop {
            if self.peek() == Some(Token::Punct(']')) {
                self.next();
                return Ok(credits);
            }
            credits.push(self.pair()?);
            match self.expect(&[',', ']'])? {
                ',' => continue,
                _ => return Ok(credits),
            }
        }
    }

    fn pair(&mut self) -> Result<ArtistCredit, String> {
        let open = self.expect(&['[', '('])?;
        let close = if open == '[' { ']' } else { ')' };
        let artist_id = self.member()?;
        self.expect(&[','])?;
        let artist_name = self.member()?;
        if self.peek() == Some(Token::Punct(',')) {
            self.next();
        }
        self.expect(&[close])?;
        Ok(ArtistCredit {
            artist_id,
            artist_name,
        })
    }

    fn member(&mut self) -> Result<Option<String>, String> {
        match self.next() {
            Some(Token::Quoted(body)) => unescape(body).map(Some),
            Some(Token::Word("None" | "null" | "nan" | "NaN")) => Ok(None),
            // bare numeric ids show up for some older listings
            Some(Token::Word(w)) if w.chars().all(|c| c.is_ascii_digit()) => Ok(Some(w.to_string())),
            Some(Token::Word(w)) => Err(format!("unquoted member '{}' in artist pair", w)),
            Some(Token::Punct(c)) => Err(format!("expected artist member, found '{}'", c)),
            None => Err("unexpected end of input in artist pair".to_string()),
        }
    }
}
