use mlua::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::MappedTypeError;

/**
    Names of the methods a converter is expected to provide.
*/
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConverterMethodNames {
    pub native_type: String,
    pub to_native: String,
    pub from_native: String,
    pub reference_required: String,
}

impl Default for ConverterMethodNames {
    fn default() -> Self {
        Self {
            native_type: String::from("native_type"),
            to_native: String::from("to_native"),
            from_native: String::from("from_native"),
            reference_required: String::from("reference_required"),
        }
    }
}

/**
    Configuration for mapped types created within a Lua state.
*/
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarshalConfig {
    /// Cache method lookups per call site, disable to re-resolve on every conversion
    pub cache_call_sites: bool,
    pub method_names: ConverterMethodNames,
}

impl Default for MarshalConfig {
    fn default() -> Self {
        Self {
            cache_call_sites: true,
            method_names: ConverterMethodNames::default(),
        }
    }
}

impl MarshalConfig {
    /**
        Parses a config from JSON, missing fields take their default values.

        # Errors

        Errors if the contents are not a valid config.
    */
    pub fn from_json(contents: impl AsRef<[u8]>) -> Result<Self, MappedTypeError> {
        Ok(serde_json::from_slice(contents.as_ref())?)
    }

    /**
        Stores this config in the given Lua state, replacing any previous one.
    */
    pub fn set_for(self, lua: &Lua) {
        lua.set_app_data(self);
    }

    /**
        Returns the config stored in the given Lua state, or the default config.
    */
    #[must_use]
    pub fn get(lua: &Lua) -> Self {
        if let Some(config) = lua.app_data_ref::<Self>() {
            config.clone()
        } else {
            Self::default()
        }
    }
}
