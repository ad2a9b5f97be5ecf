// ABOUTME: Value/environment arena, allocation, and the tracing garbage collector

use crate::env::EnvNode;
use crate::error::LispError;
use crate::location::SourceLoc;
use crate::value::{BuiltinFn, EnvHandle, Value, ValueHandle, ValueNode};
use std::collections::HashSet;

/// Owns every value and every environment in the interpreter. Hands out handles and
/// periodically reclaims unreachable objects with [`Pool::gc`].
///
/// Allocation is a slab: freed slots are tracked on a free list and reused by later
/// allocations, so handles stay valid indices for as long as the object they name is
/// reachable, without ever shifting a live object to a new index.
pub struct Pool {
    values: Vec<Option<ValueNode>>,
    free_values: Vec<usize>,
    envs: Vec<Option<EnvNode>>,
    free_envs: Vec<usize>,
    nil: ValueHandle,
    root: EnvHandle,
    /// Ordered list of module names currently being `require`d, for cycle detection.
    pub load_stack: Vec<String>,
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}

impl Pool {
    pub fn new() -> Self {
        let mut pool = Pool {
            values: Vec::new(),
            free_values: Vec::new(),
            envs: Vec::new(),
            free_envs: Vec::new(),
            nil: ValueHandle(0),
            root: EnvHandle(0),
            load_stack: Vec::new(),
        };
        let nil_idx = pool.push_value(ValueNode {
            value: Value::Nil,
            loc: None,
        });
        pool.nil = ValueHandle(nil_idx);
        let root_idx = pool.push_env(EnvNode::new(None));
        pool.root = EnvHandle(root_idx);
        crate::builtins::register_all(&mut pool);
        pool
    }

    fn push_value(&mut self, node: ValueNode) -> usize {
        if let Some(i) = self.free_values.pop() {
            self.values[i] = Some(node);
            i
        } else {
            self.values.push(Some(node));
            self.values.len() - 1
        }
    }

    fn push_env(&mut self, node: EnvNode) -> usize {
        if let Some(i) = self.free_envs.pop() {
            self.envs[i] = Some(node);
            i
        } else {
            self.envs.push(Some(node));
            self.envs.len() - 1
        }
    }

    /// Allocate never fails barring OOM and never triggers GC.
    pub fn make_value(&mut self, value: Value) -> ValueHandle {
        self.make_value_at(value, None)
    }

    pub fn make_value_at(&mut self, value: Value, loc: Option<SourceLoc>) -> ValueHandle {
        ValueHandle(self.push_value(ValueNode { value, loc }))
    }

    pub fn make_env(&mut self, parent: Option<EnvHandle>) -> EnvHandle {
        EnvHandle(self.push_env(EnvNode::new(parent)))
    }

    pub fn nil(&self) -> ValueHandle {
        self.nil
    }

    pub fn root(&self) -> EnvHandle {
        self.root
    }

    pub fn get(&self, handle: ValueHandle) -> &Value {
        &self.node(handle).value
    }

    pub fn node(&self, handle: ValueHandle) -> &ValueNode {
        self.values[handle.0].as_ref().expect("dangling value handle")
    }

    pub fn node_mut(&mut self, handle: ValueHandle) -> &mut ValueNode {
        self.values[handle.0].as_mut().expect("dangling value handle")
    }

    pub fn loc(&self, handle: ValueHandle) -> Option<SourceLoc> {
        self.node(handle).loc.clone()
    }

    pub fn bool_value(&mut self, b: bool) -> ValueHandle {
        self.make_value(Value::Boolean(b))
    }

    pub fn number(&mut self, n: f64) -> ValueHandle {
        self.make_value(Value::Number(n))
    }

    pub fn string(&mut self, s: impl Into<String>) -> ValueHandle {
        self.make_value(Value::String(s.into()))
    }

    pub fn symbol(&mut self, s: impl Into<String>) -> ValueHandle {
        self.make_value(Value::Symbol(s.into()))
    }

    pub fn cons(&mut self, car: ValueHandle, cdr: ValueHandle) -> ValueHandle {
        self.make_value(Value::Pair { car, cdr })
    }

    pub fn builtin(&mut self, name: &'static str, func: BuiltinFn) -> ValueHandle {
        self.make_value(Value::Builtin { name, func })
    }

    /// Build the proper list `(v1 v2 ... vn)`. An empty input yields the degenerate
    /// pair `(nil . nil)` — never returned by a proper-list-only constructor.
    pub fn list_from_vec(&mut self, items: Vec<ValueHandle>) -> ValueHandle {
        let nil = self.nil;
        if items.is_empty() {
            return self.cons(nil, nil);
        }
        let mut tail = nil;
        for item in items.into_iter().rev() {
            tail = self.cons(item, tail);
        }
        tail
    }

    /// Walk `cdr` pointers collecting `car`s, then append the terminal `cdr` (nil or
    /// other) as the last element. Callers that require a proper list must inspect
    /// and pop that last element themselves.
    pub fn pair_to_vector(&self, handle: ValueHandle) -> Vec<ValueHandle> {
        let mut out = Vec::new();
        let mut cur = handle;
        loop {
            match self.get(cur) {
                Value::Pair { car, cdr } => {
                    out.push(*car);
                    cur = *cdr;
                }
                _ => {
                    out.push(cur);
                    break;
                }
            }
        }
        out
    }

    /// Convert a proper list to its elements, failing if the terminal cdr isn't nil.
    pub fn proper_list(&self, handle: ValueHandle, context: &str) -> Result<Vec<ValueHandle>, LispError> {
        let mut vec = self.pair_to_vector(handle);
        let last = vec.pop().unwrap_or(self.nil);
        if !matches!(self.get(last), Value::Nil) {
            return Err(LispError::value_at(
                format!("{context}: expected a proper list"),
                self.loc(handle),
            ));
        }
        Ok(vec)
    }

    pub fn display(&self, handle: ValueHandle) -> String {
        match self.get(handle) {
            Value::Boolean(b) => {
                if *b {
                    "#t".to_string()
                } else {
                    "#f".to_string()
                }
            }
            Value::Number(n) => crate::value::format_number(*n),
            Value::String(s) => crate::value::format_string_literal(s),
            Value::Nil => "()".to_string(),
            Value::Symbol(s) => s.clone(),
            Value::Pair { .. } => self.display_pair(handle),
            Value::Builtin { .. } | Value::Lambda { .. } => "#<proc>".to_string(),
        }
    }

    fn display_pair(&self, handle: ValueHandle) -> String {
        let mut parts = Vec::new();
        let mut cur = handle;
        loop {
            match self.get(cur) {
                Value::Pair { car, cdr } => {
                    parts.push(self.display(*car));
                    cur = *cdr;
                }
                Value::Nil => return format!("({})", parts.join(" ")),
                _ => return format!("({} . {})", parts.join(" "), self.display(cur)),
            }
        }
    }

    /// Structural equality: atoms by value, pairs componentwise, lambdas by identical
    /// parameter list and body, builtins by identical function pointer.
    pub fn structurally_equal(&self, a: ValueHandle, b: ValueHandle) -> bool {
        match (self.get(a), self.get(b)) {
            (Value::Boolean(x), Value::Boolean(y)) => x == y,
            (Value::Number(x), Value::Number(y)) => x == y,
            (Value::String(x), Value::String(y)) => x == y,
            (Value::Symbol(x), Value::Symbol(y)) => x == y,
            (Value::Nil, Value::Nil) => true,
            (Value::Pair { car: ac, cdr: ad }, Value::Pair { car: bc, cdr: bd }) => {
                self.structurally_equal(*ac, *bc) && self.structurally_equal(*ad, *bd)
            }
            (Value::Builtin { func: f, .. }, Value::Builtin { func: g, .. }) => {
                std::ptr::eq(*f as *const (), *g as *const ())
            }
            (
                Value::Lambda {
                    params: p1,
                    body: b1,
                    ..
                },
                Value::Lambda {
                    params: p2,
                    body: b2,
                    ..
                },
            ) => p1 == p2 && b1 == b2,
            _ => false,
        }
    }

    /// `eq?`: atoms compare by value, non-atoms compare by handle identity.
    pub fn identity_equal(&self, a: ValueHandle, b: ValueHandle) -> bool {
        if self.get(a).is_atom() {
            return self.structurally_equal(a, b);
        }
        a == b
    }

    // ===================== Environment operations =====================

    pub fn env_node(&self, handle: EnvHandle) -> &EnvNode {
        self.envs[handle.0].as_ref().expect("dangling env handle")
    }

    fn env_node_mut(&mut self, handle: EnvHandle) -> &mut EnvNode {
        self.envs[handle.0].as_mut().expect("dangling env handle")
    }

    /// Insert or overwrite a binding in this scope only; returns the displaced value.
    pub fn env_define(
        &mut self,
        env: EnvHandle,
        name: impl Into<String>,
        value: ValueHandle,
    ) -> Option<ValueHandle> {
        self.env_node_mut(env).bindings.insert(name.into(), value)
    }

    /// Remove a local binding. Not recursive — does not touch the parent chain.
    pub fn env_remove(&mut self, env: EnvHandle, name: &str) -> bool {
        self.env_node_mut(env).bindings.remove(name).is_some()
    }

    /// Walk up the parent chain looking for `name`.
    pub fn env_lookup(&self, env: EnvHandle, name: &str) -> Option<ValueHandle> {
        let mut cur = env;
        loop {
            let node = self.env_node(cur);
            if let Some(v) = node.bindings.get(name) {
                return Some(*v);
            }
            match node.parent {
                Some(parent) => cur = parent,
                None => return None,
            }
        }
    }

    /// Clear all bindings and reinstall builtins. Used only by the root environment.
    pub fn env_reset(&mut self, env: EnvHandle) {
        self.env_node_mut(env).bindings.clear();
        crate::builtins::register_all(self);
    }

    /// Enumerate locally bound identifiers (used by REPL completion/highlighting).
    pub fn env_variables(&self, env: EnvHandle) -> Vec<String> {
        self.env_node(env).bindings.keys().cloned().collect()
    }

    // ===================== Garbage collector =====================

    /// Tracing mark-and-sweep. Roots: the root environment and the persistent nil.
    ///
    /// Marking iterates to a fixed point because marking a lambda enqueues an
    /// environment whose bindings may enqueue values that reach further lambdas.
    /// Returns the number of values and environments reclaimed.
    pub fn gc(&mut self) -> usize {
        let mut reachable_values: HashSet<usize> = HashSet::new();
        let mut reachable_envs: HashSet<usize> = HashSet::new();
        let mut env_queue = vec![self.root];
        let mut value_queue: Vec<ValueHandle> = Vec::new();

        while !env_queue.is_empty() || !value_queue.is_empty() {
            while let Some(e) = env_queue.pop() {
                if reachable_envs.insert(e.0) {
                    for v in self.env_node(e).bindings.values() {
                        value_queue.push(*v);
                    }
                }
            }
            while let Some(v) = value_queue.pop() {
                if v == self.nil {
                    continue;
                }
                if reachable_values.insert(v.0) {
                    match self.get(v) {
                        Value::Pair { car, cdr } => {
                            value_queue.push(*car);
                            value_queue.push(*cdr);
                        }
                        Value::Lambda { body, env, .. } => {
                            env_queue.push(*env);
                            for b in body {
                                value_queue.push(*b);
                            }
                        }
                        _ => {}
                    }
                }
            }
        }

        let mut reclaimed = 0;
        for i in 0..self.values.len() {
            if self.values[i].is_some() && i != self.nil.0 && !reachable_values.contains(&i) {
                self.values[i] = None;
                self.free_values.push(i);
                reclaimed += 1;
            }
        }
        for i in 0..self.envs.len() {
            if self.envs[i].is_some() && !reachable_envs.contains(&i) {
                self.envs[i] = None;
                self.free_envs.push(i);
                reclaimed += 1;
            }
        }
        reclaimed
    }

    pub fn value_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    pub fn env_count(&self) -> usize {
        self.envs.iter().filter(|v| v.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nil_is_unique_and_survives_gc() {
        let mut pool = Pool::new();
        let nil1 = pool.nil();
        pool.gc();
        assert!(matches!(pool.get(nil1), Value::Nil));
    }

    #[test]
    fn unreachable_value_is_collected() {
        let mut pool = Pool::new();
        let before = pool.value_count();
        let orphan = pool.number(42.0);
        assert!(pool.value_count() > before);
        pool.gc();
        // orphan was never bound anywhere, so it should be gone.
        assert!(pool.value_count() <= before);
        let _ = orphan;
    }

    #[test]
    fn reachable_from_root_survives_gc() {
        let mut pool = Pool::new();
        let v = pool.number(7.0);
        let root = pool.root();
        pool.env_define(root, "x", v);
        pool.gc();
        let looked_up = pool.env_lookup(root, "x").unwrap();
        assert_eq!(pool.get(looked_up).as_number(), Some(7.0));
    }

    #[test]
    fn closure_cycle_does_not_leak_and_does_not_collect_live_state() {
        // (define x 1) (define f (lambda () x)) — f's captured env must survive GC,
        // and so must the env binding that points back at f (self-reference cycle).
        let mut pool = Pool::new();
        let root = pool.root();
        let one = pool.number(1.0);
        pool.env_define(root, "x", one);

        let lambda_env = pool.make_env(Some(root));
        let body_sym = pool.symbol("x");
        let lambda = pool.make_value(Value::Lambda {
            params: vec![],
            body: vec![body_sym],
            env: lambda_env,
        });
        pool.env_define(root, "f", lambda);
        // Self-referential binding to exercise the cycle.
        pool.env_define(lambda_env, "self", lambda);

        pool.gc();

        let f = pool.env_lookup(root, "f").unwrap();
        match pool.get(f) {
            Value::Lambda { env, .. } => {
                assert!(pool.env_lookup(*env, "x").is_some());
            }
            _ => panic!("expected lambda"),
        }
    }

    #[test]
    fn structural_equality_on_pairs() {
        let mut pool = Pool::new();
        let a1 = pool.number(1.0);
        let a2 = pool.number(2.0);
        let list_a = pool.list_from_vec(vec![a1, a2]);
        let b1 = pool.number(1.0);
        let b2 = pool.number(2.0);
        let list_b = pool.list_from_vec(vec![b1, b2]);
        assert!(pool.structurally_equal(list_a, list_b));
        assert!(!pool.identity_equal(list_a, list_b));
    }

    #[test]
    fn env_shadowing_and_parent_lookup() {
        let mut pool = Pool::new();
        let root = pool.root();
        let v1 = pool.number(1.0);
        pool.env_define(root, "x", v1);
        let child = pool.make_env(Some(root));
        let v2 = pool.number(2.0);
        pool.env_define(child, "x", v2);
        assert_eq!(pool.get(pool.env_lookup(child, "x").unwrap()).as_number(), Some(2.0));
        assert_eq!(pool.get(pool.env_lookup(root, "x").unwrap()).as_number(), Some(1.0));
    }

    #[test]
    fn display_formats_dotted_and_proper_pairs() {
        let mut pool = Pool::new();
        let a = pool.number(1.0);
        let b = pool.number(2.0);
        let dotted = pool.cons(a, b);
        assert_eq!(pool.display(dotted), "(1 . 2)");

        let proper = pool.list_from_vec(vec![a, b]);
        assert_eq!(pool.display(proper), "(1 2)");
    }
}
