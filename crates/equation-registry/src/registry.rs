//! The registry: token and name tables driving lexing, compilation,
//! rendering, and evaluation.

use hashbrown::HashMap;

use equation_core::Value;

use crate::builtins;
use crate::def::{Arity, Assoc, FunctionDef, NativeFn, OperatorDef, RegistryError, UnaryDef};

/// Owns every operator, function, and constant an expression may use.
///
/// Registration replaces existing entries silently, so callers can shadow
/// any part of the standard deck.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    operators: HashMap<String, OperatorDef>,
    unary: HashMap<String, UnaryDef>,
    functions: HashMap<String, FunctionDef>,
    constants: HashMap<String, Value>,
    /// Operator tokens sorted by descending length, so the lexer matches
    /// `<=` before `<` and `</>` before `<`.
    operator_tokens: Vec<String>,
    /// Unary tokens, same ordering.
    unary_tokens: Vec<String>,
}

impl Registry {
    /// Creates an empty registry with no operators at all.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a registry loaded with the standard deck: arithmetic,
    /// comparison, and logical operators, the usual math functions, and the
    /// constants `pi`, `e`, `Inf`, `NaN`, `i`, `j`.
    #[must_use]
    pub fn standard() -> Self {
        builtins::standard()
    }

    // === Registration ===

    /// Registers a binary infix operator.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidToken`] if the token is empty,
    /// contains whitespace or any of `(` `)` `,`, or starts with a digit or
    /// `.` (which would collide with numeric literals).
    pub fn add_operator(
        &mut self,
        token: &str,
        canonical: &str,
        latex: &str,
        precedence: u8,
        assoc: Assoc,
        apply: NativeFn,
    ) -> Result<(), RegistryError> {
        validate_token(token)?;
        self.operators.insert(
            token.to_string(),
            OperatorDef {
                canonical: canonical.to_string(),
                latex: latex.to_string(),
                precedence,
                assoc,
                apply,
            },
        );
        rebuild_tokens(&mut self.operator_tokens, self.operators.keys());
        Ok(())
    }

    /// Registers a prefix unary operator.
    ///
    /// # Errors
    ///
    /// Same token rules as [`Registry::add_operator`].
    pub fn add_unary_operator(
        &mut self,
        token: &str,
        canonical: &str,
        latex: &str,
        apply: NativeFn,
    ) -> Result<(), RegistryError> {
        validate_token(token)?;
        self.unary.insert(
            token.to_string(),
            UnaryDef {
                canonical: canonical.to_string(),
                latex: latex.to_string(),
                apply,
            },
        );
        rebuild_tokens(&mut self.unary_tokens, self.unary.keys());
        Ok(())
    }

    /// Registers a named function.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidName`] unless the name is an
    /// identifier (`[A-Za-z_][A-Za-z0-9_]*`).
    pub fn add_function(
        &mut self,
        name: &str,
        latex: &str,
        arity: Arity,
        apply: NativeFn,
    ) -> Result<(), RegistryError> {
        validate_name(name)?;
        self.functions.insert(
            name.to_string(),
            FunctionDef {
                latex: latex.to_string(),
                arity,
                apply,
            },
        );
        Ok(())
    }

    /// Registers a named constant.
    ///
    /// Constants resolve like variables and may be shadowed by presets and
    /// call bindings.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidName`] unless the name is an
    /// identifier.
    pub fn add_constant(&mut self, name: &str, value: Value) -> Result<(), RegistryError> {
        validate_name(name)?;
        self.constants.insert(name.to_string(), value);
        Ok(())
    }

    // === Lookup ===

    /// Looks up a binary operator by token.
    #[must_use]
    pub fn operator(&self, token: &str) -> Option<&OperatorDef> {
        self.operators.get(token)
    }

    /// Looks up a unary operator by token.
    #[must_use]
    pub fn unary_operator(&self, token: &str) -> Option<&UnaryDef> {
        self.unary.get(token)
    }

    /// Looks up a function by name.
    #[must_use]
    pub fn function(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(name)
    }

    /// Returns true if `name` is a registered function.
    #[must_use]
    pub fn is_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Looks up a constant by name.
    #[must_use]
    pub fn constant(&self, name: &str) -> Option<&Value> {
        self.constants.get(name)
    }

    /// Finds the longest registered binary operator token prefixing `rest`.
    #[must_use]
    pub fn match_operator<'a>(&'a self, rest: &str) -> Option<&'a str> {
        longest_prefix(&self.operator_tokens, rest)
    }

    /// Finds the longest registered unary operator token prefixing `rest`.
    #[must_use]
    pub fn match_unary<'a>(&'a self, rest: &str) -> Option<&'a str> {
        longest_prefix(&self.unary_tokens, rest)
    }
}

/// Rebuilds a token list sorted by descending length (ties lexicographic,
/// for determinism).
fn rebuild_tokens<'a>(list: &mut Vec<String>, keys: impl Iterator<Item = &'a String>) {
    *list = keys.cloned().collect();
    list.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
}

fn longest_prefix<'a>(tokens: &'a [String], rest: &str) -> Option<&'a str> {
    tokens
        .iter()
        .find(|t| rest.starts_with(t.as_str()))
        .map(String::as_str)
}

fn validate_token(token: &str) -> Result<(), RegistryError> {
    let invalid = |reason| RegistryError::InvalidToken {
        token: token.to_string(),
        reason,
    };
    let Some(first) = token.chars().next() else {
        return Err(invalid("token is empty"));
    };
    if first.is_ascii_digit() || first == '.' {
        return Err(invalid("token would collide with numeric literals"));
    }
    if token.chars().any(|c| c.is_whitespace() || "(),".contains(c)) {
        return Err(invalid("token contains whitespace or delimiter characters"));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), RegistryError> {
    let mut chars = name.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if head_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(RegistryError::InvalidName {
            name: name.to_string(),
        })
    }
}
