use mlua::prelude::*;

use super::{CallSite, TypeTag};
use crate::error::MappedTypeError;

// Get a member of a Lua value, honoring __index.
// Values that cannot be indexed simply have no members.
pub fn lookup_member<'lua>(receiver: &LuaValue<'lua>, name: &str) -> LuaResult<LuaValue<'lua>> {
    match receiver {
        LuaValue::Table(table) => table.get(name),
        // Indexing userdata without __index is an error rather than nil
        LuaValue::UserData(userdata) => {
            if userdata
                .get_metatable()?
                .contains(LuaMetaMethod::Index.name())?
            {
                userdata.get(name)
            } else {
                Ok(LuaValue::Nil)
            }
        }
        _ => Ok(LuaValue::Nil),
    }
}

// Get a member of a Lua value only if it is callable as a method
pub fn lookup_method<'lua>(
    receiver: &LuaValue<'lua>,
    name: &str,
) -> LuaResult<Option<LuaFunction<'lua>>> {
    match lookup_member(receiver, name)? {
        LuaValue::Function(function) => Ok(Some(function)),
        _ => Ok(None),
    }
}

/**
    A resolved Lua method, kept alive in the registry.

    The receiver is kept alive alongside it so that its address, which is
    what the binding is tagged with, cannot be reused by another object
    while the binding exists.
*/
#[derive(Debug)]
pub struct LuaBinding {
    function: LuaRegistryKey,
    _receiver: LuaRegistryKey,
}

/**
    A call site dispatching a method on Lua receivers.
*/
#[derive(Debug)]
pub struct LuaCallSite {
    site: CallSite<LuaBinding>,
}

impl LuaCallSite {
    pub fn new(method: impl Into<String>, caching: bool) -> Self {
        Self {
            site: CallSite::with_caching(method, caching),
        }
    }

    #[must_use]
    pub fn method(&self) -> &str {
        self.site.method()
    }

    #[must_use]
    pub fn cached_tag(&self) -> Option<TypeTag> {
        self.site.cached_tag()
    }

    /**
        Resolves the method for the given receiver.

        # Errors

        Errors if the receiver has no such method, or if looking it up errors.
    */
    pub fn resolve<'lua>(
        &self,
        lua: &'lua Lua,
        receiver: &LuaValue<'lua>,
    ) -> LuaResult<LuaFunction<'lua>> {
        let binding = self
            .site
            .resolve(TypeTag::of_lua_value(receiver), |method| {
                let function = lookup_method(receiver, method)?.ok_or_else(|| {
                    MappedTypeError::ConverterMissingCapability {
                        method: method.to_string(),
                    }
                })?;
                Ok::<_, LuaError>(LuaBinding {
                    function: lua.create_registry_value(function)?,
                    _receiver: lua.create_registry_value(receiver.clone())?,
                })
            })?;
        lua.registry_value(&binding.callable().function)
    }

    /**
        Calls the method on the receiver, passing the receiver as `self`
        followed by `args`.

        # Errors

        Errors from resolving the method, and any error raised by the method itself, unchanged.
    */
    pub fn invoke<'lua, A, R>(
        &self,
        lua: &'lua Lua,
        receiver: &LuaValue<'lua>,
        args: A,
    ) -> LuaResult<R>
    where
        A: IntoLuaMulti<'lua>,
        R: FromLuaMulti<'lua>,
    {
        let function = self.resolve(lua, receiver)?;
        let mut values = args.into_lua_multi(lua)?.into_vec();
        values.insert(0, receiver.clone());
        function.call(LuaMultiValue::from_vec(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converter<'lua>(lua: &'lua Lua, source: &str) -> LuaValue<'lua> {
        lua.load(source).eval().unwrap()
    }

    #[test]
    fn dispatches_with_receiver_as_self() {
        let lua = Lua::new();
        let receiver = converter(
            &lua,
            r"
            return {
                offset = 10,
                to_native = function(self, value) return value + self.offset end,
            }
            ",
        );
        let site = LuaCallSite::new("to_native", true);
        assert_eq!(site.method(), "to_native");
        let result: i64 = site.invoke(&lua, &receiver, 5).unwrap();
        assert_eq!(result, 15);
        assert_eq!(site.cached_tag(), Some(TypeTag::of_lua_value(&receiver)));
    }

    #[test]
    fn distinct_receivers_on_one_site_keep_their_own_methods() {
        let lua = Lua::new();
        let (a, b): (LuaValue, LuaValue) = lua
            .load(
                r"
                local shared = {}
                shared.__index = shared
                function shared.to_native(self, value) return value end
                local a = setmetatable({}, shared)
                local b = setmetatable({ to_native = function(self, value) return -value end }, shared)
                return a, b
                ",
            )
            .eval()
            .unwrap();

        let site = LuaCallSite::new("to_native", true);
        for i in 1..=4_i64 {
            let from_a: i64 = site.invoke(&lua, &a, i).unwrap();
            let from_b: i64 = site.invoke(&lua, &b, i).unwrap();
            assert_eq!(from_a, i);
            assert_eq!(from_b, -i);
        }
    }

    #[test]
    fn missing_method_is_a_missing_capability() {
        let lua = Lua::new();
        let receiver = converter(&lua, "return { to_native = 5 }");
        let site = LuaCallSite::new("to_native", true);
        let err = site.resolve(&lua, &receiver).unwrap_err();
        let LuaError::ExternalError(inner) = &err else {
            panic!("unexpected error {err:?}");
        };
        assert!(matches!(
            inner.downcast_ref::<MappedTypeError>(),
            Some(MappedTypeError::ConverterMissingCapability { method }) if method == "to_native"
        ));
        assert_eq!(site.cached_tag(), None);
    }

    #[test]
    fn non_indexable_receivers_have_no_members() {
        let lua = Lua::new();
        let member = lookup_member(&LuaValue::Integer(3), "to_native").unwrap();
        assert!(member.is_nil());
        let receiver = LuaValue::Boolean(true);
        assert!(LuaCallSite::new("to_native", true)
            .resolve(&lua, &receiver)
            .is_err());
    }

    #[test]
    fn userdata_members_without_a_value_are_nil() {
        let lua = Lua::new();
        let native = lua
            .create_userdata(crate::native::NativeType::new(crate::kind::NativeKind::SInt).unwrap())
            .unwrap();
        let receiver = LuaValue::UserData(native);
        assert!(lookup_member(&receiver, "to_native").unwrap().is_nil());
        assert!(lookup_member(&receiver, "size").unwrap().is_integer());
    }

    #[test]
    fn userdata_index_errors_are_not_swallowed() {
        struct Guarded;

        impl LuaUserData for Guarded {
            fn add_methods<'lua, M: LuaUserDataMethods<'lua, Self>>(methods: &mut M) {
                methods.add_meta_method(LuaMetaMethod::Index, |_, _, key: String| {
                    Err::<(), _>(LuaError::RuntimeError(format!("access to {key} denied")))
                });
            }
        }

        let lua = Lua::new();
        let receiver = LuaValue::UserData(lua.create_userdata(Guarded).unwrap());
        let err = LuaCallSite::new("to_native", true)
            .resolve(&lua, &receiver)
            .unwrap_err();
        assert!(err.to_string().contains("access to to_native denied"));
    }

    #[test]
    fn cached_bindings_outlive_method_reassignment() {
        let lua = Lua::new();
        let receiver = converter(
            &lua,
            "return { to_native = function(self, value) return value + 1 end }",
        );
        let LuaValue::Table(table) = &receiver else {
            panic!("converter should be a table");
        };
        let cached = LuaCallSite::new("to_native", true);
        let uncached = LuaCallSite::new("to_native", false);
        let call = |site: &LuaCallSite| -> i64 { site.invoke(&lua, &receiver, 1).unwrap() };
        assert_eq!(call(&cached), 2);
        assert_eq!(call(&uncached), 2);

        let replacement: LuaFunction = lua
            .load("return function(self, value) return value * 100 end")
            .eval()
            .unwrap();
        table.set("to_native", replacement).unwrap();

        // The receiver is still the same object, so its binding is reused
        assert_eq!(call(&cached), 2);
        assert_eq!(call(&uncached), 100);
    }
}
