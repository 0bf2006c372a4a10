//! Context-sensitive tokenizer.
//!
//! The scanner is driven by the compiler's `expect_op` flag: after a value
//! it looks for separators and binary operators, before a value it looks for
//! literals, names, and unary operators. This is what lets `-` be both
//! subtraction and negation, and lets `-5` lex as a single literal.
//!
//! Operator tokens come from the registry and are matched longest-first, so
//! user-registered tokens like `<=>` take priority over `<=` and `<`.

use num_complex::Complex64;

use equation_core::{ParseError, Value};
use equation_registry::Registry;

/// One lexical token.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    /// `(`
    Open,
    /// `)`
    Close,
    /// `,`
    Separator,
    /// A binary operator token.
    Operator(String),
    /// A prefix unary operator token.
    Unary(String),
    /// An identifier registered as a function.
    Function(String),
    /// An identifier: a variable or constant reference.
    Name(String),
    /// A numeric literal.
    Literal(Value),
}

/// Streaming tokenizer over an expression string.
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    registry: &'a Registry,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer over `src` using `registry` for operator and function
    /// token sets.
    #[must_use]
    pub fn new(registry: &'a Registry, src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            registry,
        }
    }

    /// Byte offset of the next unread character.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Produces the next token, or `None` at end of input.
    ///
    /// `expect_op` selects the operator-position token classes (separator,
    /// binary operator) over the value-position ones (literal, name, unary
    /// operator). Parentheses match in either state.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnknownToken`] when nothing matches.
    pub fn next_token(&mut self, expect_op: bool) -> Result<Option<Token>, ParseError> {
        self.skip_ws();
        let rest = &self.src[self.pos..];
        let Some(first) = rest.chars().next() else {
            return Ok(None);
        };

        if first == '(' {
            self.pos += 1;
            return Ok(Some(Token::Open));
        }
        if first == ')' {
            self.pos += 1;
            return Ok(Some(Token::Close));
        }

        if expect_op {
            if first == ',' {
                self.pos += 1;
                return Ok(Some(Token::Separator));
            }
            if let Some(token) = self.registry.match_operator(rest) {
                let token = token.to_string();
                self.pos += token.len();
                return Ok(Some(Token::Operator(token)));
            }
        } else {
            if let Some(value) = self.scan_literal() {
                return Ok(Some(Token::Literal(value)));
            }
            if let Some(name) = self.scan_ident() {
                return Ok(Some(if self.registry.is_function(&name) {
                    Token::Function(name)
                } else {
                    Token::Name(name)
                }));
            }
            if let Some(token) = self.registry.match_unary(rest) {
                let token = token.to_string();
                self.pos += token.len();
                return Ok(Some(Token::Unary(token)));
            }
        }

        Err(ParseError::UnknownToken {
            offset: self.pos,
            fragment: rest.chars().take(12).collect(),
        })
    }

    fn skip_ws(&mut self) {
        let rest = &self.src[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn scan_ident(&mut self) -> Option<String> {
        let bytes = self.src.as_bytes();
        let start = self.pos;
        let first = *bytes.get(start)?;
        if !(first.is_ascii_alphabetic() || first == b'_') {
            return None;
        }
        let mut end = start + 1;
        while bytes
            .get(end)
            .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
        {
            end += 1;
        }
        self.pos = end;
        Some(self.src[start..end].to_string())
    }

    /// Scans a numeric literal: an optional sign (whitespace allowed after
    /// it), then a radix integer (`0x` `0o` `0b`), or a decimal with
    /// optional exponent and an optional signed imaginary continuation
    /// (`1.5e3-2i`). Returns `None` without consuming input if no literal
    /// starts here.
    fn scan_literal(&mut self) -> Option<Value> {
        let bytes = self.src.as_bytes();
        let mut i = self.pos;

        let negative = match bytes.get(i) {
            Some(b'-') => {
                i += 1;
                true
            }
            Some(b'+') => {
                i += 1;
                false
            }
            _ => false,
        };
        while bytes.get(i).is_some_and(u8::is_ascii_whitespace) {
            i += 1;
        }

        for (prefix, radix) in [("0x", 16), ("0o", 8), ("0b", 2)] {
            if self.src[i..].starts_with(prefix) {
                let digits = i + prefix.len();
                let mut end = digits;
                while bytes
                    .get(end)
                    .is_some_and(|b| (*b as char).is_digit(radix))
                {
                    end += 1;
                }
                if end > digits {
                    self.pos = end;
                    return Some(radix_value(&self.src[digits..end], radix, negative));
                }
            }
        }

        let (real_end, real_is_float) = scan_decimal(bytes, i)?;
        let real_text = &self.src[i..real_end];

        // Imaginary continuation: a mandatory sign, a decimal, and an `i`/`j`
        // suffix that is not the start of a longer identifier.
        let mut k = real_end;
        while bytes.get(k).is_some_and(u8::is_ascii_whitespace) {
            k += 1;
        }
        if let Some(im_sign @ (b'+' | b'-')) = bytes.get(k).copied() {
            let mut m = k + 1;
            while bytes.get(m).is_some_and(u8::is_ascii_whitespace) {
                m += 1;
            }
            if let Some((im_end, _)) = scan_decimal(bytes, m) {
                let suffix_ok = matches!(bytes.get(im_end), Some(b'i' | b'j'))
                    && !bytes
                        .get(im_end + 1)
                        .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_');
                if suffix_ok {
                    let re = signed(parse_f64(real_text), negative);
                    let im = signed(parse_f64(&self.src[m..im_end]), im_sign == b'-');
                    self.pos = im_end + 1;
                    return Some(Value::Complex(Complex64::new(re, im)));
                }
            }
        }

        self.pos = real_end;
        if real_is_float {
            return Some(Value::Float(signed(parse_f64(real_text), negative)));
        }
        // Integer form; fall back to float on i64 overflow.
        match real_text.parse::<i64>() {
            Ok(v) => Some(Value::Integer(if negative { -v } else { v })),
            Err(_) => Some(Value::Float(signed(parse_f64(real_text), negative))),
        }
    }
}

/// Scans an unsigned decimal (`d+`, `d+.`, `.d+`, `d+.d+`, optional
/// `e`/`E` exponent). Returns the end offset and whether the text must be
/// read as a float.
fn scan_decimal(bytes: &[u8], start: usize) -> Option<(usize, bool)> {
    let mut i = start;
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    let int_digits = i > start;
    let mut is_float = false;

    if bytes.get(i) == Some(&b'.') {
        let frac_start = i + 1;
        let mut j = frac_start;
        while bytes.get(j).is_some_and(u8::is_ascii_digit) {
            j += 1;
        }
        if int_digits || j > frac_start {
            is_float = true;
            i = j;
        } else {
            return None; // a lone `.`
        }
    } else if !int_digits {
        return None;
    }

    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_start = j;
        while bytes.get(j).is_some_and(u8::is_ascii_digit) {
            j += 1;
        }
        if j > exp_start {
            // `1e` without digits is not an exponent; leave it unconsumed.
            i = j;
            is_float = true;
        }
    }

    Some((i, is_float))
}

fn radix_value(digits: &str, radix: u32, negative: bool) -> Value {
    match i64::from_str_radix(digits, radix) {
        Ok(v) => Value::Integer(if negative { -v } else { v }),
        Err(_) => {
            // Literal too large for i64: fold it into a float.
            let mut acc = 0f64;
            for d in digits.chars().filter_map(|c| c.to_digit(radix)) {
                acc = acc * f64::from(radix) + f64::from(d);
            }
            Value::Float(signed(acc, negative))
        }
    }
}

fn parse_f64(text: &str) -> f64 {
    // scan_decimal only accepts shapes f64::from_str understands; `5.` and
    // `.5` included.
    text.parse::<f64>().unwrap_or(f64::NAN)
}

fn signed(v: f64, negative: bool) -> f64 {
    if negative {
        -v
    } else {
        v
    }
}
