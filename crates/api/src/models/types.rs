//! Generic type descriptors.
//!
//! A [`TypeRef`] describes a requested or declared type the way a JVM-style
//! injector sees it: a raw class, optionally parameterized, with wildcard
//! arguments and type variables. Assignability between descriptors lives in
//! the plugin crate's `TypeHierarchy`, which knows the class graph.

use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "data")]
pub enum TypeRef {
    /// Raw class by fully qualified name (e.g., "java.util.List")
    Id(String),

    /// Parameterized class (e.g., List<String>)
    Generic { base: String, args: Vec<TypeRef> },

    /// Wildcard argument (e.g., ? extends Number)
    Wildcard {
        bound: Option<Box<TypeRef>>,
        is_upper_bound: bool, // true: extends, false: super
    },

    /// Array type (e.g., String[])
    Array {
        element: Box<TypeRef>,
        dimensions: usize,
    },

    /// Unresolved type variable (e.g., T)
    Variable(String),
}

impl TypeRef {
    /// Fully qualified name of the universal top type.
    pub const OBJECT_FQN: &'static str = "java.lang.Object";

    pub fn id(fqn: impl Into<String>) -> Self {
        TypeRef::Id(fqn.into())
    }

    pub fn object() -> Self {
        TypeRef::Id(Self::OBJECT_FQN.to_string())
    }

    pub fn generic(base: impl Into<String>, args: Vec<TypeRef>) -> Self {
        TypeRef::Generic {
            base: base.into(),
            args,
        }
    }

    pub fn variable(name: impl Into<String>) -> Self {
        TypeRef::Variable(name.into())
    }

    /// Unbounded wildcard `?`
    pub fn wildcard() -> Self {
        TypeRef::Wildcard {
            bound: None,
            is_upper_bound: true,
        }
    }

    /// `? extends bound`
    pub fn extends(bound: TypeRef) -> Self {
        TypeRef::Wildcard {
            bound: Some(Box::new(bound)),
            is_upper_bound: true,
        }
    }

    /// `? super bound`
    pub fn super_of(bound: TypeRef) -> Self {
        TypeRef::Wildcard {
            bound: Some(Box::new(bound)),
            is_upper_bound: false,
        }
    }

    pub fn array(element: TypeRef, dimensions: usize) -> Self {
        TypeRef::Array {
            element: Box::new(element),
            dimensions: dimensions.max(1),
        }
    }

    /// The raw class behind this type, if it can be decomposed into one.
    ///
    /// Wildcards, type variables and arrays have no raw class in this model;
    /// lookups for them only consider exact matches.
    pub fn raw_class(&self) -> Option<&str> {
        match self {
            TypeRef::Id(fqn) => Some(fqn),
            TypeRef::Generic { base, .. } => Some(base),
            _ => None,
        }
    }

    /// The raw class as its own descriptor.
    pub fn raw_type(&self) -> Option<TypeRef> {
        self.raw_class().map(TypeRef::id)
    }

    /// True when this type is identical to its raw class.
    pub fn is_raw(&self) -> bool {
        matches!(self, TypeRef::Id(_))
    }

    pub fn is_object(&self) -> bool {
        self.raw_class() == Some(Self::OBJECT_FQN)
    }

    /// Parse Java-like type syntax: `a.b.C`, `a.b.C<x.Y, ? extends z.W>`, `T`, `a.B[][]`.
    ///
    /// A bare single uppercase letter is read as a type variable.
    pub fn parse(input: &str) -> ApiResult<Self> {
        let mut parser = TypeParser::new(input);
        let ty = parser.parse_type()?;
        parser.skip_ws();
        if !parser.at_end() {
            return Err(ApiError::malformed(
                input,
                format!("unexpected trailing input at offset {}", parser.pos),
            ));
        }
        Ok(ty)
    }
}

impl FromStr for TypeRef {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeRef::parse(s)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Id(fqn) => write!(f, "{}", fqn),
            TypeRef::Variable(name) => write!(f, "{}", name),
            TypeRef::Generic { base, args } => {
                write!(f, "{}<", base)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ">")
            }
            TypeRef::Wildcard {
                bound: None,
                ..
            } => write!(f, "?"),
            TypeRef::Wildcard {
                bound: Some(bound),
                is_upper_bound,
            } => {
                let kw = if *is_upper_bound { "extends" } else { "super" };
                write!(f, "? {} {}", kw, bound)
            }
            TypeRef::Array {
                element,
                dimensions,
            } => {
                write!(f, "{}", element)?;
                for _ in 0..*dimensions {
                    write!(f, "[]")?;
                }
                Ok(())
            }
        }
    }
}

struct TypeParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> TypeParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.input.len() - trimmed.len();
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn error(&self, reason: impl Into<String>) -> ApiError {
        ApiError::malformed(self.input, reason)
    }

    fn parse_type(&mut self) -> ApiResult<TypeRef> {
        self.skip_ws();
        if self.eat("?") {
            return self.parse_wildcard();
        }

        let name = self.parse_name()?;
        let mut ty = if self.eat("<") {
            let mut args = vec![self.parse_type()?];
            while self.eat(",") {
                args.push(self.parse_type()?);
            }
            if !self.eat(">") {
                return Err(self.error("unterminated type argument list"));
            }
            TypeRef::Generic { base: name, args }
        } else if is_type_variable(&name) {
            TypeRef::Variable(name)
        } else {
            TypeRef::Id(name)
        };

        let mut dimensions = 0;
        while self.eat("[") {
            if !self.eat("]") {
                return Err(self.error("expected ']'"));
            }
            dimensions += 1;
        }
        if dimensions > 0 {
            ty = TypeRef::Array {
                element: Box::new(ty),
                dimensions,
            };
        }
        Ok(ty)
    }

    fn parse_wildcard(&mut self) -> ApiResult<TypeRef> {
        self.skip_ws();
        let is_upper_bound = if self.eat_keyword("extends") {
            true
        } else if self.eat_keyword("super") {
            false
        } else {
            return Ok(TypeRef::wildcard());
        };
        let bound = self.parse_type()?;
        if matches!(bound, TypeRef::Wildcard { .. }) {
            return Err(self.error("wildcard bound cannot itself be a wildcard"));
        }
        Ok(TypeRef::Wildcard {
            bound: Some(Box::new(bound)),
            is_upper_bound,
        })
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let rest = self.rest();
        if rest.starts_with(keyword)
            && rest[keyword.len()..]
                .chars()
                .next()
                .is_some_and(char::is_whitespace)
        {
            self.pos += keyword.len();
            true
        } else {
            false
        }
    }

    fn parse_name(&mut self) -> ApiResult<String> {
        self.skip_ws();
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|(_, c)| !(c.is_alphanumeric() || matches!(c, '_' | '$' | '.')))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let name = &rest[..len];
        if name.is_empty() {
            return Err(self.error(format!("expected a type name at offset {}", self.pos)));
        }
        if name.starts_with('.') || name.ends_with('.') || name.contains("..") {
            return Err(self.error(format!("invalid qualified name '{}'", name)));
        }
        self.pos += len;
        Ok(name.to_string())
    }
}

fn is_type_variable(name: &str) -> bool {
    // Heuristic: a single uppercase letter is a type variable (T, E, K, V)
    let mut chars = name.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_uppercase())
}
