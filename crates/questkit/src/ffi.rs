//! C ABI matching `quest_kit.h`.
//!
//! ## Safety
//!
//! Pointer arguments are checked for null at entry; everything else about
//! them (alignment, length, lifetime) is the caller's contract and is
//! spelled out per function.
//!
//! ### Memory ownership
//!
//! - Handles are session ids cast to pointers; they are never dereferenced.
//! - Result buffers are allocated here and must be released with
//!   `quest_free_result`. Only pointers this library handed out and has not
//!   freed yet are accepted; anything else is ignored and logged.
//! - All input buffers are borrowed for the duration of the call.

use crate::api::{global, Handle};
use crate::error::QuestError;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::{c_char, c_int, c_void, CString};
use std::ptr;
use tracing::warn;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestStatus {
    Ok = 0,
    InvalidArgument = 1,
    InvalidHandle = 2,
    OutOfMemory = 3,
    MalformedCircuit = 4,
    InvalidTransaction = 5,
    Internal = 6,
}

impl From<&QuestError> for QuestStatus {
    fn from(e: &QuestError) -> Self {
        match e {
            QuestError::OutOfMemory(_) => QuestStatus::OutOfMemory,
            QuestError::MalformedCircuit { .. } => QuestStatus::MalformedCircuit,
            QuestError::InvalidTransaction(_) => QuestStatus::InvalidTransaction,
            QuestError::InvalidHandle(_) => QuestStatus::InvalidHandle,
            QuestError::InvalidConfig(_) | QuestError::InvalidArgument(_) => {
                QuestStatus::InvalidArgument
            }
            QuestError::MalformedResult(_) | QuestError::Simulation(_) => QuestStatus::Internal,
        }
    }
}

const VERSION_C: &str = concat!("questkit/", env!("CARGO_PKG_VERSION"), "\0");

/// Live result allocations: address -> length.
static RESULTS: Lazy<Mutex<HashMap<usize, usize>>> = Lazy::new(|| Mutex::new(HashMap::new()));

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: String) {
    let c = CString::new(msg).unwrap_or_default();
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(c));
}

fn fail(e: QuestError) -> QuestStatus {
    let status = QuestStatus::from(&e);
    set_last_error(e.to_string());
    status
}

fn handle_id(handle: *mut c_void) -> Handle {
    handle as usize as Handle
}

/// Borrows `len` bytes at `ptr`. A null pointer is accepted only for an
/// empty buffer.
///
/// # Safety
///
/// A non-null `ptr` must point to `len` readable bytes that stay valid and
/// unmodified for `'a`.
unsafe fn borrow_bytes<'a>(ptr: *const u8, len: usize) -> Option<&'a [u8]> {
    if ptr.is_null() {
        return if len == 0 { Some(&[]) } else { None };
    }
    // SAFETY: non-null, and the caller guarantees `len` readable bytes.
    Some(unsafe { std::slice::from_raw_parts(ptr, len) })
}

fn hand_out(bytes: Vec<u8>, result_size: *mut usize) -> *mut u8 {
    let boxed = bytes.into_boxed_slice();
    let len = boxed.len();
    let raw = Box::into_raw(boxed) as *mut u8;
    RESULTS.lock().insert(raw as usize, len);

    // SAFETY: `result_size` was checked non-null by every caller.
    unsafe { *result_size = len };
    raw
}

/// Default worker thread count for sessions initialized afterwards.
/// Values below 1 are treated as 1 and values above
/// [`MAX_THREADS`](crate::config::MAX_THREADS) as that ceiling, so a later
/// `quest_initialize` never fails because of this setting.
#[no_mangle]
pub extern "C" fn quest_set_num_threads(num_threads: c_int) {
    global().set_thread_count(num_threads.max(1) as usize);
}

/// Creates a session and stores its handle in `*handle`.
///
/// # Safety
///
/// `handle` must be null or point to writable storage for one handle.
#[no_mangle]
pub unsafe extern "C" fn quest_initialize(handle: *mut *mut c_void) -> c_int {
    if handle.is_null() {
        set_last_error("null handle pointer".into());
        return QuestStatus::InvalidArgument as c_int;
    }

    match global().initialize() {
        Ok(id) => {
            // SAFETY: checked non-null above; caller guarantees it is writable.
            unsafe { *handle = id as usize as *mut c_void };
            QuestStatus::Ok as c_int
        }
        Err(e) => fail(e) as c_int,
    }
}

#[no_mangle]
pub extern "C" fn quest_finalize(handle: *mut c_void) -> c_int {
    match global().finalize(handle_id(handle)) {
        Ok(()) => QuestStatus::Ok as c_int,
        Err(e) => fail(e) as c_int,
    }
}

/// Runs a transaction. Returns a result buffer of `*result_size` bytes, or
/// null on failure (see `quest_last_error`).
///
/// # Safety
///
/// `data` and `sender` must point to `data_size` and `sender_size`
/// readable bytes (or be null when the size is 0). `result_size` must point
/// to writable storage for one `size_t`.
#[no_mangle]
pub unsafe extern "C" fn quest_execute_transaction(
    handle: *mut c_void,
    data: *const u8,
    data_size: usize,
    sender: *const u8,
    sender_size: usize,
    result_size: *mut usize,
) -> *mut u8 {
    if result_size.is_null() {
        set_last_error("null result_size pointer".into());
        return ptr::null_mut();
    }
    // SAFETY: buffer contracts are forwarded from this function's contract.
    let (data, sender) = match unsafe {
        (
            borrow_bytes(data, data_size),
            borrow_bytes(sender, sender_size),
        )
    } {
        (Some(d), Some(s)) => (d, s),
        _ => {
            set_last_error("null buffer with nonzero size".into());
            return ptr::null_mut();
        }
    };

    match global().execute_transaction(handle_id(handle), data, sender) {
        Ok(result) => hand_out(result.into_bytes(), result_size),
        Err(e) => {
            fail(e);
            ptr::null_mut()
        }
    }
}

/// Simulates an encoded circuit. Returns a result buffer of
/// `*result_size` bytes, or null on failure.
///
/// # Safety
///
/// `circuit` must point to `circuit_size` readable bytes (or be null when
/// the size is 0). `result_size` must point to writable storage for one
/// `size_t`.
#[no_mangle]
pub unsafe extern "C" fn quest_simulate_circuit(
    handle: *mut c_void,
    circuit: *const u8,
    circuit_size: usize,
    result_size: *mut usize,
) -> *mut u8 {
    if result_size.is_null() {
        set_last_error("null result_size pointer".into());
        return ptr::null_mut();
    }
    // SAFETY: forwarded from this function's contract.
    let Some(circuit) = (unsafe { borrow_bytes(circuit, circuit_size) }) else {
        set_last_error("null circuit with nonzero size".into());
        return ptr::null_mut();
    };

    match global().simulate_circuit(handle_id(handle), circuit) {
        Ok(result) => hand_out(result.into_bytes(), result_size),
        Err(e) => {
            fail(e);
            ptr::null_mut()
        }
    }
}

/// Releases a buffer returned by `quest_execute_transaction` or
/// `quest_simulate_circuit`. Null, unknown and already freed pointers are
/// ignored.
#[no_mangle]
pub extern "C" fn quest_free_result(result: *mut u8) {
    if result.is_null() {
        return;
    }
    let Some(len) = RESULTS.lock().remove(&(result as usize)) else {
        warn!(ptr = result as usize, "Ignoring free of unknown result pointer");
        return;
    };

    // SAFETY: the registry only holds pointers produced by `hand_out` from a
    // boxed slice of exactly `len` bytes, and the entry was just removed so
    // it cannot be freed twice.
    unsafe {
        drop(Box::from_raw(ptr::slice_from_raw_parts_mut(result, len)));
    }
}

/// Writes the 32-byte state digest of the session to `hash`.
///
/// # Safety
///
/// `hash` must point to at least 32 writable bytes.
#[no_mangle]
pub unsafe extern "C" fn quest_calc_state_hash(handle: *mut c_void, hash: *mut u8) -> c_int {
    if hash.is_null() {
        set_last_error("null hash buffer".into());
        return QuestStatus::InvalidArgument as c_int;
    }

    match global().calc_state_hash(handle_id(handle)) {
        Ok(digest) => {
            // SAFETY: checked non-null; caller guarantees 32 writable bytes
            // that do not overlap the local digest.
            unsafe { ptr::copy_nonoverlapping(digest.as_ptr(), hash, digest.len()) };
            QuestStatus::Ok as c_int
        }
        Err(e) => fail(e) as c_int,
    }
}

/// Fills `out` with `len` seeded quantum random bytes.
///
/// # Safety
///
/// `out` must point to `len` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn quest_random_bytes(
    handle: *mut c_void,
    seed: u64,
    out: *mut u8,
    len: usize,
) -> c_int {
    if out.is_null() {
        set_last_error("null output buffer".into());
        return QuestStatus::InvalidArgument as c_int;
    }

    match global().random_bytes(handle_id(handle), len, seed) {
        Ok(bytes) => {
            // SAFETY: checked non-null; caller guarantees `len` writable
            // bytes and `bytes.len() == len`.
            unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), out, bytes.len()) };
            QuestStatus::Ok as c_int
        }
        Err(e) => fail(e) as c_int,
    }
}

/// Writes a seeded quantum random value in `min..=max` to `*out`.
///
/// # Safety
///
/// `out` must point to writable storage for one `uint64_t`.
#[no_mangle]
pub unsafe extern "C" fn quest_random_number(
    handle: *mut c_void,
    min: u64,
    max: u64,
    seed: u64,
    out: *mut u64,
) -> c_int {
    if out.is_null() {
        set_last_error("null output pointer".into());
        return QuestStatus::InvalidArgument as c_int;
    }

    match global().random_number(handle_id(handle), min, max, seed) {
        Ok(v) => {
            // SAFETY: checked non-null; caller guarantees it is writable.
            unsafe { *out = v };
            QuestStatus::Ok as c_int
        }
        Err(e) => fail(e) as c_int,
    }
}

/// Writes the real and imaginary parts of basis amplitude `index`.
///
/// # Safety
///
/// `re` and `im` must each point to writable storage for one `double`.
#[no_mangle]
pub unsafe extern "C" fn quest_get_amplitude(
    handle: *mut c_void,
    index: u64,
    re: *mut f64,
    im: *mut f64,
) -> c_int {
    if re.is_null() || im.is_null() {
        set_last_error("null amplitude pointer".into());
        return QuestStatus::InvalidArgument as c_int;
    }
    let Ok(index) = usize::try_from(index) else {
        return fail(QuestError::InvalidArgument(format!("index {} too large", index))) as c_int;
    };

    match global().amplitude(handle_id(handle), index) {
        Ok(a) => {
            // SAFETY: both checked non-null; caller guarantees they are writable.
            unsafe {
                *re = a.re;
                *im = a.im;
            }
            QuestStatus::Ok as c_int
        }
        Err(e) => fail(e) as c_int,
    }
}

/// Static, NUL-terminated version string.
#[no_mangle]
pub extern "C" fn quest_version() -> *const c_char {
    VERSION_C.as_ptr() as *const c_char
}

/// Message for the last failed call on this thread, or null. Valid until
/// the next failing call on the same thread.
#[no_mangle]
pub extern "C" fn quest_last_error() -> *const c_char {
    LAST_ERROR.with(|slot| {
        slot.borrow()
            .as_ref()
            .map_or(ptr::null(), |c| c.as_ptr())
    })
}
