// ABOUTME: C ABI surface handed to dlopen'd native plugins via `init_ext`.

use crate::pool::Pool;
use crate::value::{BuiltinFn, ValueHandle};
use std::ffi::CStr;
use std::os::raw::c_char;

/// Function-pointer table a plugin uses to register builtins and build values.
/// Every constructor allocates through the host pool, so plugin-built values
/// participate in the tracing collector like any other value.
#[repr(C)]
pub struct LispApi {
    pool: *mut Pool,
    pub register_builtin: unsafe extern "C" fn(*mut Pool, *const c_char, BuiltinFn),
    pub make_number: unsafe extern "C" fn(*mut Pool, f64) -> ValueHandle,
    pub make_string: unsafe extern "C" fn(*mut Pool, *const c_char) -> ValueHandle,
    pub make_bool: unsafe extern "C" fn(*mut Pool, bool) -> ValueHandle,
    pub make_nil: unsafe extern "C" fn(*mut Pool) -> ValueHandle,
    pub make_cons: unsafe extern "C" fn(*mut Pool, ValueHandle, ValueHandle) -> ValueHandle,
}

unsafe extern "C" fn register_builtin(pool: *mut Pool, name: *const c_char, func: BuiltinFn) {
    let pool = &mut *pool;
    let name = CStr::from_ptr(name).to_string_lossy().into_owned();
    let root = pool.root();
    // Plugin builtins live for the process lifetime, same as the fixed registry,
    // so leaking the name to get a `'static str` matches `Value::Builtin`'s shape.
    let leaked: &'static str = Box::leak(name.into_boxed_str());
    let value = pool.builtin(leaked, func);
    pool.env_define(root, leaked, value);
}

unsafe extern "C" fn make_number(pool: *mut Pool, n: f64) -> ValueHandle {
    (&mut *pool).number(n)
}

unsafe extern "C" fn make_string(pool: *mut Pool, s: *const c_char) -> ValueHandle {
    let s = CStr::from_ptr(s).to_string_lossy().into_owned();
    (&mut *pool).string(s)
}

unsafe extern "C" fn make_bool(pool: *mut Pool, b: bool) -> ValueHandle {
    (&mut *pool).bool_value(b)
}

unsafe extern "C" fn make_nil(pool: *mut Pool) -> ValueHandle {
    (&*pool).nil()
}

unsafe extern "C" fn make_cons(pool: *mut Pool, car: ValueHandle, cdr: ValueHandle) -> ValueHandle {
    (&mut *pool).cons(car, cdr)
}

impl LispApi {
    pub fn new(pool: &mut Pool) -> Self {
        LispApi {
            pool: pool as *mut Pool,
            register_builtin,
            make_number,
            make_string,
            make_bool,
            make_nil,
            make_cons,
        }
    }
}

/// The `init_ext` entry point every native plugin must export: takes the API
/// table, registers its builtins through it, returns nothing.
pub type InitExtFn = unsafe extern "C" fn(*const LispApi);
