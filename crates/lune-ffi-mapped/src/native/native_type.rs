use std::fmt;

use libffi::middle::Type;
use mlua::prelude::*;

use super::{libffi_helper::get_ensured_layout, FfiType};
use crate::{error::MappedTypeError, helper, kind::NativeKind};

/**
    A concrete native type: a kind together with its libffi layout.

    Size and alignment are computed once, when the type is created.
*/
#[derive(Clone)]
pub struct NativeType {
    kind: NativeKind,
    middle_type: Type,
    size: usize,
    alignment: usize,
}

impl NativeType {
    /**
        Creates the native type for a kind that needs no extra layout information.

        # Errors

        Errors for struct, array and mapped kinds, or if libffi rejects the type.
    */
    #[rustfmt::skip]
    pub fn new(kind: NativeKind) -> LuaResult<Self> {
        let middle_type = match kind {
            NativeKind::Void      => Type::void(),
            NativeKind::Bool      => Type::u8(),
            NativeKind::SChar     => Type::c_schar(),
            NativeKind::UChar     => Type::c_uchar(),
            NativeKind::SShort    => Type::c_short(),
            NativeKind::UShort    => Type::c_ushort(),
            NativeKind::SInt      => Type::c_int(),
            NativeKind::UInt      => Type::c_uint(),
            NativeKind::SLong     => Type::c_long(),
            NativeKind::ULong     => Type::c_ulong(),
            NativeKind::SLongLong => Type::c_longlong(),
            NativeKind::ULongLong => Type::c_ulonglong(),
            NativeKind::Float     => Type::f32(),
            NativeKind::Double    => Type::f64(),
            // Strings are handed over as a pointer to their bytes
            NativeKind::Pointer | NativeKind::String => Type::pointer(),
            NativeKind::Struct | NativeKind::Array | NativeKind::Mapped => {
                return Err(MappedTypeError::NoFixedLayout(kind).into())
            }
        };
        Self::from_middle_type(kind, middle_type)
    }

    /**
        Creates a struct type with the given field types, in order.

        # Errors

        Errors if libffi rejects the layout, such as for a struct without fields.
    */
    pub fn structure(fields: Vec<Type>) -> LuaResult<Self> {
        Self::from_middle_type(NativeKind::Struct, Type::structure(fields))
    }

    /**
        Creates a fixed length array type.

        # Errors

        Errors if libffi rejects the layout, such as for a zero length array.
    */
    pub fn array(element: &Type, length: usize) -> LuaResult<Self> {
        // libffi has no array type, a struct of repeated elements has the same layout
        Self::from_middle_type(
            NativeKind::Array,
            Type::structure(vec![element.clone(); length]),
        )
    }

    // Create struct type from table of field types
    // Mapped fields take the layout of the type they convert into
    pub fn from_field_table(table: &LuaTable) -> LuaResult<Self> {
        let len = table.raw_len();
        let mut fields = Vec::with_capacity(len);
        for i in 1..=len {
            let value: LuaValue = table.raw_get(i)?;
            fields.push(helper::get_middle_type(&helper::get_userdata(value)?)?);
        }
        Self::structure(fields)
    }

    fn from_middle_type(kind: NativeKind, middle_type: Type) -> LuaResult<Self> {
        let (size, alignment) = get_ensured_layout(middle_type.as_raw_ptr())?;
        Ok(Self {
            kind,
            middle_type,
            // libffi reports void as a single byte
            size: if kind == NativeKind::Void { 0 } else { size },
            alignment,
        })
    }
}

impl FfiType for NativeType {
    fn get_kind(&self) -> NativeKind {
        self.kind
    }

    fn get_size(&self) -> usize {
        self.size
    }

    fn get_alignment(&self) -> usize {
        self.alignment
    }

    fn get_middle_type(&self) -> Type {
        self.middle_type.clone()
    }
}

impl fmt::Debug for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeType")
            .field("kind", &self.kind)
            .field("size", &self.size)
            .field("alignment", &self.alignment)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NativeKind::Struct | NativeKind::Array => {
                write!(f, "{}(size = {})", self.kind, self.size)
            }
            kind => write!(f, "{kind}"),
        }
    }
}

impl LuaUserData for NativeType {
    fn add_fields<'lua, F: LuaUserDataFields<'lua, Self>>(fields: &mut F) {
        fields.add_meta_field(LuaMetaMethod::Type, "NativeType");
        fields.add_field_method_get("kind", |_, this| Ok(this.get_kind().name()));
        fields.add_field_method_get("size", |_, this| Ok(this.get_size()));
        fields.add_field_method_get("alignment", |_, this| Ok(this.get_alignment()));
        fields.add_field_method_get("reference_required", |_, this| {
            Ok(this.is_reference_required())
        });
    }

    fn add_methods<'lua, M: LuaUserDataMethods<'lua, Self>>(methods: &mut M) {
        methods.add_meta_method(LuaMetaMethod::ToString, |_, this, ()| Ok(this.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use std::mem::{align_of, size_of};

    use super::*;

    #[test]
    fn primitive_layouts_match_c() {
        let int = NativeType::new(NativeKind::SInt).unwrap();
        assert_eq!(int.get_size(), size_of::<core::ffi::c_int>());
        assert_eq!(int.get_alignment(), align_of::<core::ffi::c_int>());

        let double = NativeType::new(NativeKind::Double).unwrap();
        assert_eq!(double.get_size(), size_of::<f64>());

        let string = NativeType::new(NativeKind::String).unwrap();
        assert_eq!(string.get_size(), size_of::<*const u8>());
        assert!(string.is_reference_required());
    }

    #[test]
    fn void_has_no_size() {
        let void = NativeType::new(NativeKind::Void).unwrap();
        assert_eq!(void.get_size(), 0);
    }

    #[test]
    fn composite_kinds_need_layout() {
        for kind in [NativeKind::Struct, NativeKind::Array, NativeKind::Mapped] {
            let err = NativeType::new(kind).unwrap_err();
            assert!(err.to_string().contains(kind.name()));
        }
    }

    #[test]
    fn struct_layout_is_padded() {
        let char_type = NativeType::new(NativeKind::SChar).unwrap();
        let int_type = NativeType::new(NativeKind::SInt).unwrap();
        let structure = NativeType::structure(vec![
            char_type.get_middle_type(),
            int_type.get_middle_type(),
        ])
        .unwrap();

        assert_eq!(structure.get_kind(), NativeKind::Struct);
        assert_eq!(structure.get_alignment(), int_type.get_alignment());
        assert_eq!(structure.get_size(), 2 * int_type.get_size());
        assert!(structure.is_reference_required());
    }

    #[test]
    fn array_layout_repeats_element() {
        let short = NativeType::new(NativeKind::SShort).unwrap();
        let array = NativeType::array(&short.get_middle_type(), 5).unwrap();
        assert_eq!(array.get_kind(), NativeKind::Array);
        // Tail padding rounds up to the element alignment, which is a no-op here
        assert_eq!(array.get_size(), 5 * short.get_size());
    }
}
