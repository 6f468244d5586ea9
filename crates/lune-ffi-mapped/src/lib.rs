#![allow(clippy::cargo_common_metadata)]

use mlua::prelude::*;

mod call_site;
mod config;
mod converter;
mod enum_converter;
mod error;
mod kind;
mod mapped;
mod native;

pub mod helper;

pub use crate::{
    call_site::{Binding, CallSite, LuaBinding, LuaCallSite, TypeTag},
    config::{ConverterMethodNames, MarshalConfig},
    converter::{create_converter, Converter},
    enum_converter::EnumConverter,
    error::MappedTypeError,
    kind::NativeKind,
    mapped::{ConvertContext, MappedType},
    native::{FfiType, NativeType},
};

/**
    Creates the `ffi` mapped type module.

    # Errors

    Errors when out of memory, or if libffi rejects one of the builtin types.
*/
pub fn module(lua: &Lua) -> LuaResult<LuaTable> {
    let types = lua.create_table()?;
    for kind in NativeKind::ALL
        .iter()
        .copied()
        .filter(|kind| kind.has_fixed_layout())
    {
        types.raw_set(kind.name(), NativeType::new(kind)?)?;
    }
    types.set_readonly(true);

    let module = lua.create_table()?;
    module.raw_set("types", types)?;
    module.raw_set(
        "struct",
        lua.create_function(|_, fields: LuaTable| NativeType::from_field_table(&fields))?,
    )?;
    module.raw_set(
        "array",
        lua.create_function(|_, (element, length): (LuaAnyUserData, usize)| {
            NativeType::array(&helper::get_middle_type(&element)?, length)
        })?,
    )?;
    module.raw_set(
        "mapped",
        lua.create_function(|lua, converter: LuaValue| MappedType::new(lua, converter))?,
    )?;
    module.raw_set(
        "enum",
        lua.create_function(|lua, (definition, base): (LuaTable, Option<String>)| {
            let base = match base {
                Some(name) => name.parse::<NativeKind>()?,
                None => NativeKind::SInt,
            };
            let converter = EnumConverter::from_table(lua, &definition, base)?;
            MappedType::new(lua, LuaValue::Table(create_converter(lua, converter)?))
        })?,
    )?;
    module.raw_set(
        "sizeof",
        lua.create_function(|_, userdata: LuaAnyUserData| helper::get_size(&userdata))?,
    )?;
    module.raw_set(
        "alignof",
        lua.create_function(|_, userdata: LuaAnyUserData| helper::get_alignment(&userdata))?,
    )?;
    module.raw_set(
        "is_mapped",
        lua.create_function(|_, value: LuaValue| {
            Ok(matches!(&value, LuaValue::UserData(userdata) if userdata.is::<MappedType>()))
        })?,
    )?;
    module.set_readonly(true);

    Ok(module)
}

/**
    Stores the given config in the Lua state, then creates the `ffi` mapped type module.

    # Errors

    Errors when out of memory, or if libffi rejects one of the builtin types.
*/
pub fn module_with_config(lua: &Lua, config: MarshalConfig) -> LuaResult<LuaTable> {
    config.set_for(lua);
    module(lua)
}
