use std::ptr::{self, null_mut};

use libffi::{low, raw};
use mlua::prelude::*;

// Converts ffi status into &str for formatting
const FFI_STATUS_NAMES: [&str; 4] = [
    "ffi_status_FFI_OK",
    "ffi_status_FFI_BAD_TYPEDEF",
    "ffi_status_FFI_BAD_ABI",
    "ffi_status_FFI_BAD_ARGTYPE",
];

// Get ensured (size, alignment) of a raw libffi type.
// Struct layouts are only filled in by libffi once a cif using them is prepared,
// so prepare a throwaway cif returning this type first.
pub fn get_ensured_layout(ffi_type: *mut raw::ffi_type) -> LuaResult<(usize, usize)> {
    let mut cif = low::ffi_cif::default();
    let result = unsafe {
        raw::ffi_prep_cif(
            ptr::from_mut(&mut cif),
            raw::ffi_abi_FFI_DEFAULT_ABI,
            0,
            ffi_type,
            null_mut(),
        )
    };

    ffi_status_assert(result)?;
    unsafe { Ok(((*ffi_type).size, usize::from((*ffi_type).alignment))) }
}

// Check ffi_result is OK
pub fn ffi_status_assert(result: raw::ffi_status) -> LuaResult<()> {
    if result == raw::ffi_status_FFI_OK {
        Ok(())
    } else {
        let name = FFI_STATUS_NAMES
            .get(result as usize)
            .copied()
            .unwrap_or("unknown ffi_status");
        Err(LuaError::external(format!(
            "ffi_status assertion failed. expected result {}, got {name}",
            FFI_STATUS_NAMES[0]
        )))
    }
}
