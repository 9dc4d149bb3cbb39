use std::{
    cell::RefCell,
    collections::HashMap,
    rc::{Rc, Weak},
};

use crate::interpreter::value::core::Value;

/// A shared handle to an environment frame.
pub type EnvRef = Rc<Env>;

/// One frame of the lexical environment chain.
///
/// Each frame maps names to values and holds a strong reference to its
/// parent, so a closure that captures a frame keeps the whole chain alive.
/// A name appears at most once per frame; shadowing happens across frames.
#[derive(Debug, Default)]
pub struct Env {
    parent:   Option<EnvRef>,
    bindings: RefCell<HashMap<String, Value>>,
}

impl Env {
    /// Creates a root frame with no parent.
    #[must_use]
    pub fn root() -> EnvRef {
        Rc::new(Self::default())
    }

    /// Creates a child frame of `parent`.
    #[must_use]
    pub fn with_parent(parent: &EnvRef) -> EnvRef {
        Rc::new(Self { parent:   Some(Rc::clone(parent)),
                       bindings: RefCell::new(HashMap::new()), })
    }

    /// Looks a name up, scanning from this frame outward.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.get(name))
    }

    /// Binds a name in this frame, replacing any existing binding here.
    pub fn define(&self, name: &str, value: Value) {
        self.bindings.borrow_mut().insert(name.to_string(), value);
    }

    /// Replaces the binding in the nearest frame that has the name; when no
    /// frame has it, binds in this frame.
    pub fn assign(&self, name: &str, value: Value) {
        if !self.try_assign(name, &value) {
            self.define(name, value);
        }
    }

    fn try_assign(&self, name: &str, value: &Value) -> bool {
        if let Some(slot) = self.bindings.borrow_mut().get_mut(name) {
            *slot = value.clone();
            return true;
        }
        self.parent.as_ref().is_some_and(|parent| parent.try_assign(name, value))
    }

    /// Takes a value out of the nearest frame holding the name, leaving a
    /// null hole behind. This is the `move` operator's primitive.
    #[must_use]
    pub fn take(&self, name: &str) -> Option<Value> {
        if let Some(slot) = self.bindings.borrow_mut().get_mut(name) {
            return Some(std::mem::replace(slot, Value::Null));
        }
        self.parent.as_ref().and_then(|parent| parent.take(name))
    }
}

/// The environment capture of a function value.
///
/// Ordinary functions own their declaration environment. Pattern methods
/// close over the pattern scope, which in turn binds the methods; a strong
/// reference there would form an unreclaimable cycle, so methods hold a weak
/// handle and the pattern's module value keeps the scope alive.
#[derive(Debug, Clone)]
pub enum Closure {
    /// Strong capture used by ordinary functions.
    Env(EnvRef),
    /// Weak capture used by pattern methods.
    Method(Weak<Env>),
}

impl Closure {
    /// Resolves the captured environment, if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<EnvRef> {
        match self {
            Self::Env(env) => Some(Rc::clone(env)),
            Self::Method(weak) => weak.upgrade(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_get() {
        let env = Env::root();
        env.define("x", Value::Int(1));
        assert_eq!(env.get("x"), Some(Value::Int(1)));
        assert_eq!(env.get("y"), None);
    }

    #[test]
    fn child_frames_shadow_and_fall_through() {
        let global = Env::root();
        global.define("x", Value::Int(1));
        let child = Env::with_parent(&global);
        assert_eq!(child.get("x"), Some(Value::Int(1)));
        child.define("x", Value::Int(2));
        assert_eq!(child.get("x"), Some(Value::Int(2)));
        assert_eq!(global.get("x"), Some(Value::Int(1)));
    }

    #[test]
    fn assign_updates_nearest_holder() {
        let global = Env::root();
        global.define("x", Value::Int(1));
        let child = Env::with_parent(&global);
        child.assign("x", Value::Int(5));
        assert_eq!(global.get("x"), Some(Value::Int(5)));
        // An unknown name lands in the assigning frame.
        child.assign("y", Value::Int(7));
        assert_eq!(global.get("y"), None);
        assert_eq!(child.get("y"), Some(Value::Int(7)));
    }

    #[test]
    fn take_leaves_a_null_hole() {
        let env = Env::root();
        env.define("x", Value::Int(3));
        assert_eq!(env.take("x"), Some(Value::Int(3)));
        assert_eq!(env.get("x"), Some(Value::Null));
        assert_eq!(env.take("missing"), None);
    }
}
