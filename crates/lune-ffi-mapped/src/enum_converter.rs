use std::collections::{BTreeMap, HashMap};

use mlua::prelude::*;
use tracing::debug;

use crate::{
    converter::Converter, error::MappedTypeError, kind::NativeKind, mapped::ConvertContext,
    native::NativeType,
};

/**
    A converter between symbolic names and the integers they stand for.
*/
#[derive(Debug, Clone)]
pub struct EnumConverter {
    base: NativeKind,
    by_name: HashMap<String, i64>,
    // Several names may share a value, the lowest name is used when reading
    by_value: BTreeMap<i64, String>,
}

impl EnumConverter {
    /**
        Creates an enum without any symbols.

        # Errors

        Errors if `base` is not an integer kind.
    */
    pub fn new(base: NativeKind) -> Result<Self, MappedTypeError> {
        if !base.is_integer() {
            return Err(MappedTypeError::InvalidEnumBase(base));
        }
        Ok(Self {
            base,
            by_name: HashMap::new(),
            by_value: BTreeMap::new(),
        })
    }

    /**
        Creates an enum from a definition table.

        Names in the array part of the table are numbered by position, starting
        at zero, while `name = value` pairs give explicit values.

        # Errors

        Errors if `base` is not an integer kind, if a name is defined twice,
        or if the table contains anything other than names and integers.
    */
    pub fn from_table(lua: &Lua, definition: &LuaTable, base: NativeKind) -> LuaResult<Self> {
        let mut converter = Self::new(base)?;

        for (index, name) in definition
            .clone()
            .sequence_values::<LuaValue>()
            .enumerate()
        {
            match name? {
                LuaValue::String(name) => {
                    converter.add_symbol(name.to_str()?, i64::try_from(index).into_lua_err()?)?;
                }
                other => {
                    return Err(LuaError::external(format!(
                        "Enum symbol names must be strings, got {}",
                        other.type_name()
                    )))
                }
            }
        }

        for pair in definition.clone().pairs::<LuaValue, LuaValue>() {
            // Numeric keys are the sequence handled above
            if let (LuaValue::String(name), value) = pair? {
                converter.add_symbol(name.to_str()?, lua.unpack::<i64>(value)?)?;
            }
        }

        debug!(base = %base, symbols = converter.by_name.len(), "created enum");
        Ok(converter)
    }

    /**
        Adds a symbol to the enum.

        # Errors

        Errors if the name is already defined.
    */
    pub fn add_symbol(&mut self, name: &str, value: i64) -> Result<(), MappedTypeError> {
        if self.by_name.contains_key(name) {
            return Err(MappedTypeError::DuplicateEnumSymbol(name.to_string()));
        }
        self.by_name.insert(name.to_string(), value);
        match self.by_value.get(&value) {
            Some(existing) if existing.as_str() <= name => {}
            _ => {
                self.by_value.insert(value, name.to_string());
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn base(&self) -> NativeKind {
        self.base
    }

    #[must_use]
    pub fn value_of(&self, name: &str) -> Option<i64> {
        self.by_name.get(name).copied()
    }

    #[must_use]
    pub fn name_of(&self, value: i64) -> Option<&str> {
        self.by_value.get(&value).map(String::as_str)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn as_integer(value: &LuaValue) -> Option<i64> {
    match value {
        LuaValue::Integer(i) => Some(i64::from(*i)),
        LuaValue::Number(n) if n.fract() == 0.0 => Some(*n as i64),
        _ => None,
    }
}

impl Converter for EnumConverter {
    fn native_type<'lua>(&self, lua: &'lua Lua) -> LuaResult<LuaValue<'lua>> {
        NativeType::new(self.base)?.into_lua(lua)
    }

    fn to_native<'lua>(
        &self,
        lua: &'lua Lua,
        value: LuaValue<'lua>,
        _context: ConvertContext<'lua>,
    ) -> LuaResult<LuaValue<'lua>> {
        if let LuaValue::String(name) = &value {
            let name = name.to_str()?;
            let symbol = self
                .value_of(name)
                .ok_or_else(|| MappedTypeError::UnknownEnumSymbol(name.to_string()))?;
            return symbol.into_lua(lua);
        }
        if as_integer(&value).is_some() {
            return Ok(value);
        }
        Err(LuaError::external(format!(
            "Enum symbol or integer expected, got {}",
            value.type_name()
        )))
    }

    fn from_native<'lua>(
        &self,
        lua: &'lua Lua,
        value: LuaValue<'lua>,
        _context: ConvertContext<'lua>,
    ) -> LuaResult<LuaValue<'lua>> {
        match as_integer(&value).and_then(|value| self.name_of(value)) {
            Some(name) => name.into_lua(lua),
            None => Ok(value),
        }
    }
}
