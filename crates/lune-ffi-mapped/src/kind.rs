use std::{fmt, str::FromStr};

use crate::error::MappedTypeError;

/**
    The category of a native type, as seen by the call engine.
*/
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum NativeKind {
    Void,
    Bool,
    SChar,
    UChar,
    SShort,
    UShort,
    SInt,
    UInt,
    SLong,
    ULong,
    SLongLong,
    ULongLong,
    Float,
    Double,
    Pointer,
    String,
    Struct,
    Array,
    Mapped,
}

impl NativeKind {
    /**
        All native kinds.
    */
    #[rustfmt::skip]
    pub const ALL: &'static [Self] = &[
        Self::Void,
        Self::Bool,
        Self::SChar,  Self::UChar,
        Self::SShort, Self::UShort,
        Self::SInt,   Self::UInt,
        Self::SLong,  Self::ULong,
        Self::SLongLong, Self::ULongLong,
        Self::Float,  Self::Double,
        Self::Pointer,
        Self::String,
        Self::Struct,
        Self::Array,
        Self::Mapped,
    ];

    /**
        Gets the name of the kind, such as `int` or `pointer`.
    */
    #[must_use]
    #[rustfmt::skip]
    pub fn name(self) -> &'static str {
        match self {
            Self::Void      => "void",
            Self::Bool      => "bool",
            Self::SChar     => "schar",
            Self::UChar     => "uchar",
            Self::SShort    => "short",
            Self::UShort    => "ushort",
            Self::SInt      => "int",
            Self::UInt      => "uint",
            Self::SLong     => "long",
            Self::ULong     => "ulong",
            Self::SLongLong => "longlong",
            Self::ULongLong => "ulonglong",
            Self::Float     => "float",
            Self::Double    => "double",
            Self::Pointer   => "pointer",
            Self::String    => "string",
            Self::Struct    => "struct",
            Self::Array     => "array",
            Self::Mapped    => "mapped",
        }
    }

    /**
        Gets whether values of this kind are passed by value in a single
        register-sized slot and never point into host memory.
    */
    #[must_use]
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            Self::Bool
                | Self::SChar
                | Self::UChar
                | Self::SShort
                | Self::UShort
                | Self::SInt
                | Self::UInt
                | Self::SLong
                | Self::ULong
                | Self::SLongLong
                | Self::ULongLong
                | Self::Float
                | Self::Double
        )
    }

    /**
        Gets whether the call engine must keep the original host value
        alive for the duration of a call passing a value of this kind.

        Only primitives are exempt, native code may retain a pointer
        into anything else.
    */
    #[must_use]
    pub fn requires_reference(self) -> bool {
        !self.is_primitive()
    }

    #[must_use]
    pub fn is_integer(self) -> bool {
        self.is_primitive() && !matches!(self, Self::Bool | Self::Float | Self::Double)
    }

    /**
        Gets whether a native type of this kind can be built from the
        kind alone, without field or length information.
    */
    #[must_use]
    pub fn has_fixed_layout(self) -> bool {
        !matches!(self, Self::Struct | Self::Array | Self::Mapped)
    }
}

impl fmt::Display for NativeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NativeKind {
    type Err = MappedTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let low = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == low)
            .ok_or_else(|| MappedTypeError::UnknownKind(s.to_string()))
    }
}
