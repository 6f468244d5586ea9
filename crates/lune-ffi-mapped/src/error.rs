use mlua::prelude::*;
use thiserror::Error;

use crate::kind::NativeKind;

#[derive(Debug, Error)]
pub enum MappedTypeError {
    #[error("converter needs a {method} method")]
    ConverterMissingCapability { method: String },
    #[error("converter {method} has the wrong type, got {got}")]
    ConverterTypeMismatch { method: String, got: String },
    #[error("{method} returned a mapped type, mapped types cannot wrap other mapped types")]
    NestedMappedType { method: String },
    #[error("'{0}' has no fixed layout and cannot be created from its kind alone")]
    NoFixedLayout(NativeKind),
    #[error("Unknown native type '{0}'")]
    UnknownKind(String),
    #[error("NativeType or MappedType is required but got {0}")]
    NotAType(String),
    #[error("Enum base type must be an integer type, got '{0}'")]
    InvalidEnumBase(NativeKind),
    #[error("Enum symbol '{0}' is defined more than once")]
    DuplicateEnumSymbol(String),
    #[error("Unknown enum symbol '{0}'")]
    UnknownEnumSymbol(String),
    #[error("Failed to parse marshalling config\nParserError: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}

impl From<MappedTypeError> for LuaError {
    fn from(value: MappedTypeError) -> Self {
        LuaError::external(value)
    }
}
