// Dispatch over type userdata, for the call engine and for composite types.
// Every type userdata is either a NativeType or a MappedType.

use libffi::middle::Type;
use mlua::prelude::*;

use crate::{
    error::MappedTypeError,
    kind::NativeKind,
    mapped::{ConvertContext, MappedType},
    native::{FfiType, NativeType},
};

pub fn get_userdata(value: LuaValue) -> LuaResult<LuaAnyUserData> {
    if let LuaValue::UserData(userdata) = value {
        Ok(userdata)
    } else {
        Err(MappedTypeError::NotAType(value.type_name().to_string()).into())
    }
}

// Run a function with the FfiType behind any type userdata
pub fn with_ffi_type<R>(
    userdata: &LuaAnyUserData,
    f: impl FnOnce(&dyn FfiType) -> R,
) -> LuaResult<R> {
    if userdata.is::<NativeType>() {
        Ok(f(&*userdata.borrow::<NativeType>()?))
    } else if userdata.is::<MappedType>() {
        Ok(f(&*userdata.borrow::<MappedType>()?))
    } else {
        Err(MappedTypeError::NotAType(String::from("userdata")).into())
    }
}

pub fn get_kind(userdata: &LuaAnyUserData) -> LuaResult<NativeKind> {
    with_ffi_type(userdata, |ffi_type| ffi_type.get_kind())
}

pub fn get_size(userdata: &LuaAnyUserData) -> LuaResult<usize> {
    with_ffi_type(userdata, |ffi_type| ffi_type.get_size())
}

pub fn get_alignment(userdata: &LuaAnyUserData) -> LuaResult<usize> {
    with_ffi_type(userdata, |ffi_type| ffi_type.get_alignment())
}

// Mapped types answer with the layout of the type they convert into
pub fn get_middle_type(userdata: &LuaAnyUserData) -> LuaResult<Type> {
    with_ffi_type(userdata, |ffi_type| ffi_type.get_middle_type())
}

pub fn is_reference_required(userdata: &LuaAnyUserData) -> LuaResult<bool> {
    with_ffi_type(userdata, |ffi_type| ffi_type.is_reference_required())
}

pub fn is_post_invoke_required(userdata: &LuaAnyUserData) -> LuaResult<bool> {
    with_ffi_type(userdata, |ffi_type| ffi_type.is_post_invoke_required())
}

// Prepare a host value for a parameter of the given type.
// Native types take the value as is.
pub fn to_native_value<'lua>(
    lua: &'lua Lua,
    userdata: &LuaAnyUserData<'lua>,
    value: LuaValue<'lua>,
    context: ConvertContext<'lua>,
) -> LuaResult<LuaValue<'lua>> {
    if userdata.is::<MappedType>() {
        userdata
            .borrow::<MappedType>()?
            .to_native(lua, value, context)
    } else if userdata.is::<NativeType>() {
        Ok(value)
    } else {
        Err(MappedTypeError::NotAType(String::from("userdata")).into())
    }
}

// Turn a value read from native memory back into a host value
pub fn from_native_value<'lua>(
    lua: &'lua Lua,
    userdata: &LuaAnyUserData<'lua>,
    value: LuaValue<'lua>,
    context: ConvertContext<'lua>,
) -> LuaResult<LuaValue<'lua>> {
    if userdata.is::<MappedType>() {
        userdata
            .borrow::<MappedType>()?
            .from_native(lua, value, context)
    } else if userdata.is::<NativeType>() {
        Ok(value)
    } else {
        Err(MappedTypeError::NotAType(String::from("userdata")).into())
    }
}
