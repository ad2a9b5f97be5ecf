// ABOUTME: The `require` module loader — resolves a name against `LISP_PATH`,
// then evaluates a source file or dlopens a native plugin.

use crate::error::LispError;
use crate::eval::eval;
use crate::parser::parse_all;
use crate::plugin_api::{InitExtFn, LispApi};
use crate::pool::Pool;
use crate::value::EnvHandle;
use libloading::{Library, Symbol};
use std::path::{Path, PathBuf};

#[cfg(target_os = "windows")]
const PLUGIN_EXT: &str = "dll";
#[cfg(target_os = "macos")]
const PLUGIN_EXT: &str = "dylib";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const PLUGIN_EXT: &str = "so";

fn search_dirs() -> Vec<PathBuf> {
    let dirs: Vec<PathBuf> = match std::env::var_os("LISP_PATH") {
        Some(val) => std::env::split_paths(&val).collect(),
        None => Vec::new(),
    };
    let cwd = PathBuf::from(".");
    if dirs.iter().any(|d| d == &cwd) {
        return dirs;
    }
    let mut with_cwd = Vec::with_capacity(dirs.len() + 1);
    with_cwd.push(cwd);
    with_cwd.extend(dirs);
    with_cwd
}

/// `(require "name")`: see module docs for the resolution algorithm. Pops
/// `pool.load_stack` on every exit path, including an error from
/// `require_inner`, so a failed load never leaves a stale cycle-guard entry.
pub fn require(pool: &mut Pool, env: EnvHandle, name: &str) -> Result<(), LispError> {
    if pool.load_stack.iter().any(|loaded| loaded == name) {
        return Err(LispError::value(format!("Circular dependency: {name}")));
    }
    pool.load_stack.push(name.to_string());
    let result = require_inner(pool, env, name);
    pool.load_stack.pop();
    result
}

fn require_inner(pool: &mut Pool, env: EnvHandle, name: &str) -> Result<(), LispError> {
    let source_name = format!("{name}.scm");
    let plugin_name = format!("lib{name}.{PLUGIN_EXT}");

    for dir in search_dirs() {
        let source_path = dir.join(&source_name);
        if source_path.is_file() {
            return load_source(pool, env, &source_path);
        }
        let plugin_path = dir.join(&plugin_name);
        if plugin_path.is_file() {
            return load_plugin(pool, &plugin_path);
        }
    }

    Err(LispError::value(format!(
        "Cannot find module \"{name}\": tried {source_name} and {plugin_name}"
    )))
}

fn load_source(pool: &mut Pool, env: EnvHandle, path: &Path) -> Result<(), LispError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| LispError::value(format!("Cannot read {}: {e}", path.display())))?;
    let file_name = path.display().to_string();
    let forms = parse_all(pool, &contents, &file_name)?;
    for form in forms {
        eval(pool, env, form)?;
    }
    Ok(())
}

fn load_plugin(pool: &mut Pool, path: &Path) -> Result<(), LispError> {
    let lib = unsafe { Library::new(path) }
        .map_err(|e| LispError::value(format!("Cannot load plugin {}: {e}", path.display())))?;
    let init_ext: Symbol<InitExtFn> = unsafe {
        lib.get(b"init_ext\0")
            .map_err(|e| LispError::value(format!("{}: missing init_ext symbol: {e}", path.display())))?
    };
    let api = LispApi::new(pool);
    unsafe { init_ext(&api as *const LispApi) };
    // Leak the library handle: unloading while plugin-registered builtins are
    // still reachable in the pool would leave dangling function pointers.
    std::mem::forget(lib);
    Ok(())
}
