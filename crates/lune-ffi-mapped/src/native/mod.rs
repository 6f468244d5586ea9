mod libffi_helper;
mod native_type;

use libffi::middle::Type;

use crate::kind::NativeKind;

pub use self::native_type::NativeType;

/**
    A type the native call engine knows how to marshal.

    Concrete native types implement this directly, mapped types implement it
    by delegating layout to the native type they convert into.
*/
pub trait FfiType {
    fn get_kind(&self) -> NativeKind;

    fn get_size(&self) -> usize;

    fn get_alignment(&self) -> usize;

    /**
        The libffi type describing how values of this type are laid out
        when handed to the call engine.
    */
    fn get_middle_type(&self) -> Type;

    /**
        Whether the engine must keep the host value alive across a call.
    */
    fn is_reference_required(&self) -> bool {
        self.get_kind().requires_reference()
    }

    /**
        Whether the engine must run a cleanup step once the call returns.
    */
    fn is_post_invoke_required(&self) -> bool {
        false
    }
}
