use std::any::TypeId;

use mlua::prelude::*;

/**
    The runtime type of a call site receiver.

    Lua objects carry their methods themselves, so every table or userdata
    is its own type and is tagged by identity. Two distinct converters can
    therefore never share a binding, even when they share a metatable.
*/
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum TypeTag {
    Identity(usize),
    Primitive(&'static str),
    Native(TypeId),
}

impl TypeTag {
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::Native(TypeId::of::<T>())
    }

    #[must_use]
    pub fn of_lua_value(value: &LuaValue) -> Self {
        match value {
            LuaValue::Table(_)
            | LuaValue::UserData(_)
            | LuaValue::Function(_)
            | LuaValue::Thread(_) => Self::Identity(value.to_pointer() as usize),
            other => Self::Primitive(other.type_name()),
        }
    }
}
