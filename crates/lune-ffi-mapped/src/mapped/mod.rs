mod userdata;

use libffi::middle::Type;
use mlua::prelude::*;
use tracing::debug;

use crate::{
    call_site::{lookup_member, lookup_method, LuaCallSite},
    config::MarshalConfig,
    error::MappedTypeError,
    kind::NativeKind,
    native::{FfiType, NativeType},
};

/**
    The optional, engine defined context passed along with every conversion.
*/
pub type ConvertContext<'lua> = Option<LuaValue<'lua>>;

/**
    A logical type whose values are converted to and from a concrete native
    type by a user supplied converter.

    Everything is fixed at construction except the method bindings cached
    by the two call sites.
*/
#[derive(Debug)]
pub struct MappedType {
    real_type: NativeType,
    real_type_userdata: LuaRegistryKey,
    converter: LuaRegistryKey,
    reference_required: bool,
    to_native_site: LuaCallSite,
    from_native_site: LuaCallSite,
}

impl MappedType {
    /**
        Creates a mapped type using the config stored in the Lua state.

        # Errors

        See [`MappedType::with_config`].
    */
    pub fn new<'lua>(lua: &'lua Lua, converter: LuaValue<'lua>) -> LuaResult<Self> {
        Self::with_config(lua, converter, &MarshalConfig::get(lua))
    }

    /**
        Creates a mapped type from a converter value.

        The converter must have a `native_type` method returning a native type,
        and may have a `reference_required` method or boolean. Without one,
        whether a reference is required follows from the kind of the native type.

        # Errors

        - If the converter has no `native_type` method.
        - If `native_type` returns anything but a native type, or a mapped type.
        - If `reference_required` is neither a method nor a boolean.
        - Any error raised by the converter methods called here.
    */
    pub fn with_config<'lua>(
        lua: &'lua Lua,
        converter: LuaValue<'lua>,
        config: &MarshalConfig,
    ) -> LuaResult<Self> {
        let names = &config.method_names;

        let native_type = lookup_method(&converter, &names.native_type)?.ok_or_else(|| {
            MappedTypeError::ConverterMissingCapability {
                method: names.native_type.clone(),
            }
        })?;
        let real_type_userdata = match native_type.call::<_, LuaValue>(converter.clone())? {
            LuaValue::UserData(userdata) if userdata.is::<NativeType>() => userdata,
            LuaValue::UserData(userdata) if userdata.is::<MappedType>() => {
                return Err(MappedTypeError::NestedMappedType {
                    method: names.native_type.clone(),
                }
                .into())
            }
            other => {
                return Err(MappedTypeError::ConverterTypeMismatch {
                    method: names.native_type.clone(),
                    got: other.type_name().to_string(),
                }
                .into())
            }
        };
        let real_type = real_type_userdata.borrow::<NativeType>()?.clone();

        let reference_required = match lookup_member(&converter, &names.reference_required)? {
            LuaValue::Nil => real_type.get_kind().requires_reference(),
            LuaValue::Boolean(required) => required,
            LuaValue::Function(function) => {
                let required: LuaValue = function.call(converter.clone())?;
                !matches!(required, LuaValue::Nil | LuaValue::Boolean(false))
            }
            other => {
                return Err(MappedTypeError::ConverterTypeMismatch {
                    method: names.reference_required.clone(),
                    got: other.type_name().to_string(),
                }
                .into())
            }
        };

        debug!(
            real_type = %real_type,
            reference_required,
            "created mapped type"
        );

        Ok(Self {
            real_type,
            real_type_userdata: lua.create_registry_value(real_type_userdata)?,
            converter: lua.create_registry_value(converter)?,
            reference_required,
            to_native_site: LuaCallSite::new(names.to_native.as_str(), config.cache_call_sites),
            from_native_site: LuaCallSite::new(
                names.from_native.as_str(),
                config.cache_call_sites,
            ),
        })
    }

    /**
        The native type values are converted into.
    */
    #[must_use]
    pub fn real_type(&self) -> &NativeType {
        &self.real_type
    }

    /**
        Returns the native type userdata the converter gave at construction.

        # Errors

        Errors if called with a different Lua state than the one used for construction.
    */
    pub fn native_type<'lua>(&self, lua: &'lua Lua) -> LuaResult<LuaAnyUserData<'lua>> {
        lua.registry_value(&self.real_type_userdata)
    }

    /**
        Returns the converter value.

        # Errors

        Errors if called with a different Lua state than the one used for construction.
    */
    pub fn converter<'lua>(&self, lua: &'lua Lua) -> LuaResult<LuaValue<'lua>> {
        lua.registry_value(&self.converter)
    }

    /**
        Converts a host value into a value of the native type.

        The result is whatever the converter returns, it is not checked
        against the native type.

        # Errors

        Errors if the converter has no `to_native` method, and any error raised by it.
    */
    pub fn to_native<'lua>(
        &self,
        lua: &'lua Lua,
        value: LuaValue<'lua>,
        context: ConvertContext<'lua>,
    ) -> LuaResult<LuaValue<'lua>> {
        let converter = self.converter(lua)?;
        self.to_native_site.invoke(lua, &converter, (value, context))
    }

    /**
        Converts a value of the native type back into a host value.

        # Errors

        Errors if the converter has no `from_native` method, and any error raised by it.
    */
    pub fn from_native<'lua>(
        &self,
        lua: &'lua Lua,
        value: LuaValue<'lua>,
        context: ConvertContext<'lua>,
    ) -> LuaResult<LuaValue<'lua>> {
        let converter = self.converter(lua)?;
        self.from_native_site.invoke(lua, &converter, (value, context))
    }
}

impl FfiType for MappedType {
    fn get_kind(&self) -> NativeKind {
        NativeKind::Mapped
    }

    fn get_size(&self) -> usize {
        self.real_type.get_size()
    }

    fn get_alignment(&self) -> usize {
        self.real_type.get_alignment()
    }

    fn get_middle_type(&self) -> Type {
        self.real_type.get_middle_type()
    }

    fn is_reference_required(&self) -> bool {
        self.reference_required
    }

    // Conversions are self contained, there is never anything to clean up after a call
    fn is_post_invoke_required(&self) -> bool {
        false
    }
}
