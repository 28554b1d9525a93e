//! The rtcl parser.
//!
//! Recursive descent over a pull-based character stream with one
//! character of lookahead.  Two public entry points: [`parse_commands`]
//! turns source text into a list of [`Command`]s, and [`parse_list`]
//! lexes source text into list elements without performing any
//! substitution.  All failures unwind as `Result` errors to those entry
//! points; nothing inside the parser panics on bad input.

use crate::types::Exception;
use crate::value::Value;
use std::fmt;

/// One command: an ordered sequence of word tokens.  Produced by the
/// parser, consumed by the evaluator.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub(crate) words: Vec<Word>,
}

/// One word of a command.  The closed set of token shapes the evaluator
/// dispatches over.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Word {
    /// A finished, escape-processed string.
    Literal(Value),
    /// The raw text of a brace-delimited region; re-parsed on demand when
    /// evaluated as a body.
    Block(Value),
    /// A quoted string: raw runs, variable references, and sub-commands,
    /// concatenated at evaluation time.
    Quoted(Vec<Part>),
    /// A `$name`, `$::name`, or `$name(index)` reference.
    Var(VarRef),
    /// A bracketed sub-command.
    Cmd(Command),
    /// The `{*}` prefix: the inner word's list elements are spliced into
    /// the surrounding argument vector.
    Expand(Box<Word>),
}

impl Word {
    pub(crate) fn is_expand(&self) -> bool {
        matches!(self, Word::Expand(_))
    }
}

/// One piece of a quoted string.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Part {
    Raw(String),
    Var(VarRef),
    Cmd(Command),
}

/// A parsed variable reference.
#[derive(Debug, Clone, PartialEq)]
pub struct VarRef {
    global: bool,
    name: String,
    index: Option<Box<Word>>,
}

impl VarRef {
    /// True if the reference names the global scope (`$::name`).
    pub fn is_global(&self) -> bool {
        self.global
    }

    /// The base variable name, without scope marker or index.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn index(&self) -> Option<&Word> {
        self.index.as_deref()
    }

    /// Parses a reference from its string form: a leading `::` marks the
    /// global scope, and a trailing `)` with a matching earlier `(`
    /// encloses an index literal.
    pub(crate) fn parse(s: &str) -> VarRef {
        let (global, s) = match s.strip_prefix("::") {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        if s.ends_with(')') {
            if let Some(ri) = s.find('(') {
                if ri > 0 {
                    let index = Value::from(&s[ri + 1..s.len() - 1]);
                    return VarRef {
                        global,
                        name: s[..ri].to_string(),
                        index: Some(Box::new(Word::Literal(index))),
                    };
                }
            }
        }
        VarRef {
            global,
            name: s.to_string(),
            index: None,
        }
    }
}

impl fmt::Display for VarRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.global {
            write!(f, "$::{}", self.name)
        } else {
            write!(f, "${}", self.name)
        }
    }
}

// Tab and space separate words; newline ends a command instead.
fn is_sep_space(c: char) -> bool {
    c == '\t' || c == ' '
}

fn is_word_char(c: char) -> bool {
    !matches!(c, '[' | ']' | ';' | '$' | '"') && !c.is_whitespace()
}

fn is_var_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn escaped(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'a' => '\x07',
        'v' => '\x0b',
        'r' => '\r',
        other => other,
    }
}

/// Parses source text into a list of commands.
pub(crate) fn parse_commands(src: &str) -> Result<Vec<Command>, Exception> {
    Parser::new(src.chars()).parse_commands()
}

/// Lexes source text into list elements.  A list element is a brace
/// block (raw body), a quoted string (escape-processed content), or a
/// run of non-whitespace characters; `$` and `[` have no special meaning.
pub(crate) fn parse_list(src: &str) -> Result<Vec<String>, Exception> {
    Parser::new(src.chars()).parse_list()
}

pub(crate) struct Parser<I: Iterator<Item = char>> {
    chars: I,
    /// One-character lookahead; `None` is end-of-stream.
    pub(crate) ch: Option<char>,
}

impl<I: Iterator<Item = char>> Parser<I> {
    pub(crate) fn new(mut chars: I) -> Self {
        let ch = chars.next();
        Parser { chars, ch }
    }

    /// Consumes and returns the current character, pulling the next one
    /// into the lookahead.  Consuming past end-of-stream is an error.
    pub(crate) fn advance(&mut self) -> Result<char, Exception> {
        let Some(result) = self.ch else {
            return Err(Exception::new("unexpected EOF"));
        };
        self.ch = self.chars.next();
        Ok(result)
    }

    pub(crate) fn expect_failed(&self, expected: &str) -> Exception {
        let got = match self.ch {
            Some(c) => c.to_string(),
            None => "EOF".to_string(),
        };
        Exception::new(format!("Expected {}, got '{}'", expected, got))
    }

    pub(crate) fn consume_rune(&mut self, c: char) -> Result<(), Exception> {
        if self.ch != Some(c) {
            return Err(self.expect_failed(&format!("'{}'", c)));
        }
        self.advance()?;
        Ok(())
    }

    pub(crate) fn consume_while1(
        &mut self,
        pred: impl Fn(char) -> bool,
        desc: &str,
    ) -> Result<String, Exception> {
        let mut res = String::new();
        while let Some(c) = self.ch {
            if !pred(c) {
                break;
            }
            res.push(c);
            self.advance()?;
        }
        if res.is_empty() {
            return Err(self.expect_failed(desc));
        }
        Ok(res)
    }

    pub(crate) fn eat_space(&mut self) {
        self.eat_while(char::is_whitespace);
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.ch {
            if !pred(c) {
                break;
            }
            self.ch = self.chars.next();
        }
    }

    fn at_eol(&self) -> bool {
        matches!(self.ch, None | Some(';') | Some('\n'))
    }

    fn parse_commands(&mut self) -> Result<Vec<Command>, Exception> {
        let mut res = Vec::new();
        self.eat_space();
        while self.ch.is_some() {
            if self.ch == Some('#') {
                self.parse_comment()?;
            } else {
                res.push(self.parse_command()?);
            }
            self.eat_extra();
        }
        Ok(res)
    }

    fn parse_command(&mut self) -> Result<Command, Exception> {
        let mut words = Vec::new();
        words.push(self.parse_token()?);
        self.eat_while(is_sep_space);
        while !self.at_eol() {
            words.push(self.parse_token()?);
            self.eat_while(is_sep_space);
        }
        Ok(Command { words })
    }

    /// Comments run through, but not including, the next newline.
    fn parse_comment(&mut self) -> Result<(), Exception> {
        self.consume_rune('#')?;
        self.eat_while(|c| c != '\n');
        Ok(())
    }

    /// Eats the separators between commands: whitespace and `;` runs.
    fn eat_extra(&mut self) {
        self.eat_space();
        while self.ch == Some(';') {
            self.ch = self.chars.next();
            self.eat_space();
        }
    }

    fn parse_token(&mut self) -> Result<Word, Exception> {
        self.parse_token_til(None)
    }

    fn parse_token_til(&mut self, til: Option<char>) -> Result<Word, Exception> {
        match self.ch {
            Some('[') => Ok(Word::Cmd(self.parse_subcommand()?)),
            Some('{') => self.parse_block_or_expand(),
            Some('"') => self.parse_quoted(),
            Some('$') => {
                self.advance()?;
                Ok(Word::Var(self.parse_var_ref()?))
            }
            _ => self.parse_simple_word_til(til),
        }
    }

    pub(crate) fn parse_subcommand(&mut self) -> Result<Command, Exception> {
        self.consume_rune('[')?;
        let mut words = Vec::new();
        self.eat_while(is_sep_space);
        while self.ch != Some(']') {
            words.push(self.parse_token()?);
            self.eat_while(is_sep_space);
        }
        self.consume_rune(']')?;
        Ok(Command { words })
    }

    /// Captures the raw text of a brace-delimited region.  Backslash
    /// protects the following character: both are copied verbatim, so
    /// escape processing happens when the body is re-parsed.
    fn parse_block_data(&mut self) -> Result<String, Exception> {
        self.consume_rune('{')?;
        let mut nest = 0u32;
        let mut buf = String::new();
        loop {
            match self.ch {
                Some('\\') => {
                    buf.push(self.advance()?);
                }
                Some('{') => nest += 1,
                Some('}') => {
                    if nest == 0 {
                        self.advance()?;
                        return Ok(buf);
                    }
                    nest -= 1;
                }
                None => return Err(Exception::new("unclosed block")),
                _ => {}
            }
            buf.push(self.advance()?);
        }
    }

    fn has_extra_chars(&self) -> bool {
        match self.ch {
            Some(c) => !c.is_whitespace() && c != '}' && c != ']',
            None => false,
        }
    }

    fn check_for_extra_chars(&self) -> Result<(), Exception> {
        if self.has_extra_chars() {
            return Err(Exception::new("extra characters after close-brace"));
        }
        Ok(())
    }

    /// A `{` starts either a plain block or, when the captured body is
    /// exactly `*` and a token follows with no intervening whitespace,
    /// the `{*}` expansion prefix.
    fn parse_block_or_expand(&mut self) -> Result<Word, Exception> {
        let body = self.parse_block_data()?;
        if body == "*" && self.has_extra_chars() {
            return Ok(Word::Expand(Box::new(self.parse_token()?)));
        }
        self.check_for_extra_chars()?;
        Ok(Word::Block(Value::from(body)))
    }

    fn parse_simple_word_til(&mut self, til: Option<char>) -> Result<Word, Exception> {
        let mut buf = String::new();
        let mut prev_esc = false;
        while let Some(c) = self.ch {
            if Some(c) == til {
                break;
            }
            if c == '\\' && !prev_esc {
                prev_esc = true;
                self.advance()?;
            } else if prev_esc || is_word_char(c) {
                let c = self.advance()?;
                if prev_esc {
                    buf.push(escaped(c));
                    prev_esc = false;
                } else {
                    buf.push(c);
                }
            } else {
                break;
            }
        }
        if buf.is_empty() {
            return Err(self.expect_failed("word"));
        }
        Ok(Word::Literal(Value::from(buf)))
    }

    fn parse_quoted(&mut self) -> Result<Word, Exception> {
        self.consume_rune('"')?;
        let mut parts = Vec::new();
        let mut accum = String::new();
        loop {
            match self.ch {
                Some('"') => {
                    if !accum.is_empty() {
                        parts.push(Part::Raw(accum));
                    }
                    self.advance()?;
                    return Ok(Word::Quoted(parts));
                }
                Some('$') => {
                    if !accum.is_empty() {
                        parts.push(Part::Raw(std::mem::take(&mut accum)));
                    }
                    self.advance()?;
                    parts.push(Part::Var(self.parse_var_ref()?));
                }
                Some('[') => {
                    if !accum.is_empty() {
                        parts.push(Part::Raw(std::mem::take(&mut accum)));
                    }
                    parts.push(Part::Cmd(self.parse_subcommand()?));
                }
                Some('\\') => {
                    self.advance()?;
                    let c = self.advance()?;
                    accum.push(escaped(c));
                }
                None => return Err(Exception::new("Unexpected EOF, wanted \"")),
                _ => accum.push(self.advance()?),
            }
        }
    }

    /// Parses a variable reference; the `$` has already been consumed.
    pub(crate) fn parse_var_ref(&mut self) -> Result<VarRef, Exception> {
        if self.ch == Some('{') {
            return Ok(VarRef::parse(&self.parse_block_data()?));
        }
        let mut global = false;
        if self.ch == Some(':') {
            self.advance()?;
            self.consume_rune(':')?;
            global = true;
        }
        let name = self.consume_while1(is_var_char, "variable name")?;
        let mut index = None;
        if self.ch == Some('(') {
            self.advance()?;
            index = Some(Box::new(self.parse_token_til(Some(')'))?));
            self.consume_rune(')')?;
        }
        Ok(VarRef {
            global,
            name,
            index,
        })
    }

    fn parse_list(&mut self) -> Result<Vec<String>, Exception> {
        let mut items = Vec::new();
        while self.ch.is_some() {
            self.eat_space();
            if self.ch.is_none() {
                break;
            }
            items.push(self.parse_list_token()?);
        }
        Ok(items)
    }

    fn parse_list_token(&mut self) -> Result<String, Exception> {
        match self.ch {
            Some('{') => self.parse_block_data(),
            Some('"') => self.parse_list_quoted(),
            _ => self.consume_while1(|c| !c.is_whitespace(), "word"),
        }
    }

    /// A quoted list element lexes to its escape-processed content; `$`
    /// and `[` are ordinary characters here.
    fn parse_list_quoted(&mut self) -> Result<String, Exception> {
        self.consume_rune('"')?;
        let mut buf = String::new();
        loop {
            match self.ch {
                Some('"') => {
                    self.advance()?;
                    return Ok(buf);
                }
                Some('\\') => {
                    self.advance()?;
                    let c = self.advance()?;
                    buf.push(escaped(c));
                }
                None => return Err(Exception::new("Unexpected EOF, wanted \"")),
                _ => buf.push(self.advance()?),
            }
        }
    }
}
