use std::ffi::{c_char, CStr, CString};

/// Copies a null terminated C string returned by the driver into an owned string.
/// A null pointer yields an empty string.
/// # Safety
/// `ptr` must be null or point to a valid null terminated string.
pub(crate) unsafe fn lossy_from_ptr(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}

/// Reads a fixed size, null terminated name array as found in Vulkan property structs.
pub(crate) fn fixed_name(name: &[c_char]) -> &CStr {
    // SAFETY: Vulkan guarantees these arrays contain a null terminator.
    unsafe { CStr::from_ptr(name.as_ptr()) }
}

/// Pointers to a list of C strings, valid as long as `strings` is borrowed.
pub(crate) fn as_ptrs(strings: &[CString]) -> Vec<*const c_char> {
    strings.iter().map(|string| string.as_ptr()).collect()
}
