//! Named functions and around-advice.
//!
//! Functions are looked up by name on every call, so advice added to a name
//! affects every later call through [`FunctionTable::funcall`]. Advice may be
//! registered on a name before the name has a definition.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use super::format::Value;
use crate::error::BeQuietError;
use crate::Result;

/// A callable stored in the function table.
pub type Function = Rc<dyn Fn(&[Value]) -> Result<Value>>;

/// Around-advice body: receives the next layer and the call arguments.
pub type AroundFn = Rc<dyn Fn(&dyn Fn(&[Value]) -> Result<Value>, &[Value]) -> Result<Value>>;

/// Identity of a piece of advice.
///
/// Two advice entries on the same function are the same entry when their
/// IDs are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AdviceId(&'static str);

impl AdviceId {
    /// Create an advice ID.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }
}

impl fmt::Display for AdviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// One layer of around-advice.
#[derive(Clone)]
pub struct Advice {
    /// Identity used for de-duplication and removal.
    pub id: AdviceId,
    around: AroundFn,
}

impl Advice {
    /// Create around-advice.
    pub fn around(
        id: AdviceId,
        f: impl Fn(&dyn Fn(&[Value]) -> Result<Value>, &[Value]) -> Result<Value> + 'static,
    ) -> Self {
        Self {
            id,
            around: Rc::new(f),
        }
    }
}

impl fmt::Debug for Advice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Advice").field("id", &self.id).finish()
    }
}

/// Function definitions plus the advice layered on them.
#[derive(Default)]
pub struct FunctionTable {
    definitions: RefCell<HashMap<String, Function>>,
    advice: RefCell<HashMap<String, Vec<Advice>>>,
}

impl FunctionTable {
    /// Create an empty function table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Define or redefine `name`. Existing advice stays in place.
    pub fn defun(&self, name: &str, f: impl Fn(&[Value]) -> Result<Value> + 'static) {
        self.definitions
            .borrow_mut()
            .insert(name.to_string(), Rc::new(f));
    }

    /// Call `name` with `args`, running through its advice layers.
    ///
    /// The most recently added advice is the outermost layer. No table
    /// borrow is held while the layers run, so a callee may define, advise
    /// or call other functions.
    pub fn funcall(&self, name: &str, args: &[Value]) -> Result<Value> {
        let (base, layers) = self.resolve(name)?;
        call_through(&layers, &base, args)
    }

    /// Snapshot the definition and advice layers of `name`.
    fn resolve(&self, name: &str) -> Result<(Function, Vec<Advice>)> {
        let base = self
            .definitions
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| BeQuietError::VoidFunction(name.to_string()))?;
        let layers = self.advice.borrow().get(name).cloned().unwrap_or_default();
        Ok((base, layers))
    }

    /// Add `advice` to `name`.
    ///
    /// Returns `false` if advice with the same ID is already present, in
    /// which case nothing changes.
    pub fn advice_add(&self, name: &str, advice: Advice) -> bool {
        let mut table = self.advice.borrow_mut();
        let layers = table.entry(name.to_string()).or_default();
        if layers.iter().any(|a| a.id == advice.id) {
            return false;
        }
        debug!(function = name, advice = %advice.id, "advice added");
        layers.insert(0, advice);
        true
    }

    /// Remove the advice identified by `id` from `name`.
    ///
    /// Returns `false` if there was no such advice.
    pub fn advice_remove(&self, name: &str, id: AdviceId) -> bool {
        let mut table = self.advice.borrow_mut();
        let Some(layers) = table.get_mut(name) else {
            return false;
        };

        let before = layers.len();
        layers.retain(|a| a.id != id);
        let removed = layers.len() != before;
        if layers.is_empty() {
            table.remove(name);
        }
        if removed {
            debug!(function = name, advice = %id, "advice removed");
        }
        removed
    }

    /// Check whether advice `id` is on `name`.
    pub fn advice_member_p(&self, name: &str, id: AdviceId) -> bool {
        self.advice
            .borrow()
            .get(name)
            .is_some_and(|layers| layers.iter().any(|a| a.id == id))
    }
}

fn call_through(layers: &[Advice], base: &Function, args: &[Value]) -> Result<Value> {
    match layers.split_first() {
        Some((outer, inner)) => {
            let next = |args: &[Value]| call_through(inner, base, args);
            (outer.around)(&next, args)
        }
        None => base(args),
    }
}
