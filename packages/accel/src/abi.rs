//! Raw memory exports for hosts that load the module without bindings.
//!
//! The host allocates an input buffer with `snippet_alloc`, copies UTF-8
//! source into it and calls one `snippet_<op>` export. The answer stays in a
//! per-thread output buffer, read through `snippet_output_ptr` and
//! `snippet_output_len` until the next call.

use std::cell::RefCell;

use crate::protocol::{Operation, STATUS_INVALID_UTF8, STATUS_NULL_INPUT, STATUS_OK};

thread_local! {
    static OUTPUT: RefCell<Vec<u8>> = const { RefCell::new(Vec::new()) };
}

#[no_mangle]
pub extern "C" fn snippet_alloc(len: usize) -> *mut u8 {
    let mut buffer = Vec::<u8>::with_capacity(len);
    let ptr = buffer.as_mut_ptr();
    std::mem::forget(buffer);
    ptr
}

/// # Safety
/// `ptr` must come from `snippet_alloc(len)` and not be freed twice.
#[no_mangle]
pub unsafe extern "C" fn snippet_free(ptr: *mut u8, len: usize) {
    if !ptr.is_null() {
        drop(Vec::from_raw_parts(ptr, 0, len));
    }
}

#[no_mangle]
pub extern "C" fn snippet_output_ptr() -> *const u8 {
    OUTPUT.with(|output| output.borrow().as_ptr())
}

#[no_mangle]
pub extern "C" fn snippet_output_len() -> usize {
    OUTPUT.with(|output| output.borrow().len())
}

unsafe fn call(operation: Operation, ptr: *const u8, len: usize) -> u32 {
    if ptr.is_null() {
        return STATUS_NULL_INPUT;
    }
    let bytes = std::slice::from_raw_parts(ptr, len);
    let Ok(source) = std::str::from_utf8(bytes) else {
        return STATUS_INVALID_UTF8;
    };
    let answer = crate::run(operation, source);
    OUTPUT.with(|output| *output.borrow_mut() = answer);
    STATUS_OK
}

/// # Safety
/// `ptr` must point to `len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn snippet_scan_file_blocks(ptr: *const u8, len: usize) -> u32 {
    call(Operation::FileBlocks, ptr, len)
}

/// # Safety
/// `ptr` must point to `len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn snippet_scan_class_candidates(ptr: *const u8, len: usize) -> u32 {
    call(Operation::ClassCandidates, ptr, len)
}

/// # Safety
/// `ptr` must point to `len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn snippet_scan_security(ptr: *const u8, len: usize) -> u32 {
    call(Operation::Security, ptr, len)
}

/// # Safety
/// `ptr` must point to `len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn snippet_build_inspect_index(ptr: *const u8, len: usize) -> u32 {
    call(Operation::InspectIndex, ptr, len)
}

/// Take the current output buffer, leaving it empty
pub fn take_output() -> Vec<u8> {
    OUTPUT.with(|output| std::mem::take(&mut *output.borrow_mut()))
}
