// ABOUTME: Environment node storage — bindings and lexical parent

use crate::value::{EnvHandle, ValueHandle};
use std::collections::HashMap;

/// A single environment frame: an identifier-to-value mapping plus an optional
/// parent. Never copied; always allocated in the pool and referenced by [`EnvHandle`].
#[derive(Debug)]
pub struct EnvNode {
    pub bindings: HashMap<String, ValueHandle>,
    pub parent: Option<EnvHandle>,
}

impl EnvNode {
    pub fn new(parent: Option<EnvHandle>) -> Self {
        EnvNode {
            bindings: HashMap::new(),
            parent,
        }
    }
}
