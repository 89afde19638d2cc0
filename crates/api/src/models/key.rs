use super::types::TypeRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lookup key of a binding inside one scope: a type plus an optional qualifier.
///
/// Keys without a qualifier are "default" keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    pub ty: TypeRef,
    pub qualifier: Option<String>,
}

impl Key {
    pub fn of(ty: TypeRef) -> Self {
        Self {
            ty,
            qualifier: None,
        }
    }

    pub fn named(ty: TypeRef, qualifier: impl Into<String>) -> Self {
        Self {
            ty,
            qualifier: Some(qualifier.into()),
        }
    }

    pub fn is_default(&self) -> bool {
        self.qualifier.is_none()
    }
}

impl From<TypeRef> for Key {
    fn from(ty: TypeRef) -> Self {
        Key::of(ty)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{}@{}", self.ty, q),
            None => write!(f, "{}", self.ty),
        }
    }
}
