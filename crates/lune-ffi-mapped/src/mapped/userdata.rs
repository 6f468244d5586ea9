use mlua::prelude::*;

use super::MappedType;
use crate::native::FfiType;

impl LuaUserData for MappedType {
    fn add_fields<'lua, F: LuaUserDataFields<'lua, Self>>(fields: &mut F) {
        fields.add_meta_field(LuaMetaMethod::Type, "MappedType");
        fields.add_field_method_get("kind", |_, this| Ok(this.get_kind().name()));
        fields.add_field_method_get("size", |_, this| Ok(this.get_size()));
        fields.add_field_method_get("alignment", |_, this| Ok(this.get_alignment()));
        fields.add_field_method_get("reference_required", |_, this| {
            Ok(this.is_reference_required())
        });
        fields.add_field_method_get("post_invoke_required", |_, this| {
            Ok(this.is_post_invoke_required())
        });
    }

    fn add_methods<'lua, M: LuaUserDataMethods<'lua, Self>>(methods: &mut M) {
        methods.add_method("native_type", |lua, this, ()| this.native_type(lua));
        methods.add_method(
            "to_native",
            |lua, this, (value, context): (LuaValue, Option<LuaValue>)| {
                this.to_native(lua, value, context)
            },
        );
        methods.add_method(
            "from_native",
            |lua, this, (value, context): (LuaValue, Option<LuaValue>)| {
                this.from_native(lua, value, context)
            },
        );
        methods.add_meta_method(LuaMetaMethod::ToString, |_, this, ()| {
            Ok(format!("MappedType({})", this.real_type()))
        });
    }
}
