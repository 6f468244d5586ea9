use std::rc::Rc;

use mlua::prelude::*;

use crate::{config::MarshalConfig, mapped::ConvertContext};

/**
    A converter implemented in Rust.

    Rust converters are exposed to Lua as plain converter tables with
    [`create_converter`], so they are created and dispatched exactly like
    converters written in Lua.
*/
pub trait Converter: 'static {
    /**
        Returns the native type userdata values are converted into.
    */
    fn native_type<'lua>(&self, lua: &'lua Lua) -> LuaResult<LuaValue<'lua>>;

    fn to_native<'lua>(
        &self,
        lua: &'lua Lua,
        value: LuaValue<'lua>,
        context: ConvertContext<'lua>,
    ) -> LuaResult<LuaValue<'lua>>;

    fn from_native<'lua>(
        &self,
        lua: &'lua Lua,
        value: LuaValue<'lua>,
        context: ConvertContext<'lua>,
    ) -> LuaResult<LuaValue<'lua>>;

    /**
        Overrides whether converted values need their host value kept alive.

        Returning `None` leaves it to the kind of the native type.
    */
    fn reference_required(&self) -> Option<bool> {
        None
    }
}

/**
    Creates a converter table for a Rust converter, using the method names
    from the config stored in the Lua state.

    # Errors

    Errors when out of memory.
*/
pub fn create_converter<C: Converter>(lua: &Lua, converter: C) -> LuaResult<LuaTable> {
    let names = MarshalConfig::get(lua).method_names;
    let converter = Rc::new(converter);
    let table = lua.create_table()?;

    let this = Rc::clone(&converter);
    table.raw_set(
        names.native_type,
        lua.create_function(move |lua, _: LuaValue| this.native_type(lua))?,
    )?;

    let this = Rc::clone(&converter);
    table.raw_set(
        names.to_native,
        lua.create_function(
            move |lua, (_, value, context): (LuaValue, LuaValue, Option<LuaValue>)| {
                this.to_native(lua, value, context)
            },
        )?,
    )?;

    let this = Rc::clone(&converter);
    table.raw_set(
        names.from_native,
        lua.create_function(
            move |lua, (_, value, context): (LuaValue, LuaValue, Option<LuaValue>)| {
                this.from_native(lua, value, context)
            },
        )?,
    )?;

    if let Some(required) = converter.reference_required() {
        table.raw_set(
            names.reference_required,
            lua.create_function(move |_, _: LuaValue| Ok(required))?,
        )?;
    }

    Ok(table)
}
