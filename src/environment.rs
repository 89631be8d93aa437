//! Chained scope frames mapping names to values.
//!
//! Frames are shared through `Rc<RefCell<_>>`: the interpreter's current frame
//! and any closure that captured a frame keep it alive.  A closure stored in a
//! field of an instance it also captures forms a reference cycle that is never
//! reclaimed; scripts are short lived, so that leak is accepted.

use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

pub type EnvRef<'a> = Rc<RefCell<Environment<'a>>>;

#[derive(Debug, Default)]
pub struct Environment<'a> {
    values: HashMap<&'a str, Value<'a>>,
    enclosing: Option<EnvRef<'a>>,
}

impl<'a> Environment<'a> {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef<'a>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wraps the frame for sharing.
    pub fn into_ref(self) -> EnvRef<'a> {
        Rc::new(RefCell::new(self))
    }

    /// Binds `name` in this frame, overwriting any previous binding.
    pub fn define(&mut self, name: &'a str, value: Value<'a>) {
        debug!("define '{}' = {}", name, value);

        self.values.insert(name, value);
    }

    /// Value from the nearest frame that defines `name`.
    pub fn get(&self, name: &Token<'_>) -> Result<Value<'a>> {
        if let Some(value) = self.values.get(name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    /// Overwrites `name` in the nearest frame that defines it.  Never creates
    /// a binding.
    pub fn assign(&mut self, name: &Token<'_>, value: Value<'a>) -> Result<()> {
        if let Some(slot) = self.values.get_mut(name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }

    /// The frame exactly `distance` links up the chain from `env`.
    pub fn ancestor(env: &EnvRef<'a>, distance: usize) -> Option<EnvRef<'a>> {
        let mut current = Rc::clone(env);

        for _ in 0..distance {
            let next = current.borrow().enclosing.clone()?;
            current = next;
        }

        Some(current)
    }

    /// Reads `name` directly from the frame `distance` links up.
    pub fn get_at(env: &EnvRef<'a>, distance: usize, name: &str) -> Option<Value<'a>> {
        let frame = Self::ancestor(env, distance)?;
        let value = frame.borrow().values.get(name).cloned();
        value
    }

    /// Writes `name` directly into the frame `distance` links up.  Returns
    /// `false` if the chain is shorter than `distance`.
    pub fn assign_at(env: &EnvRef<'a>, distance: usize, name: &'a str, value: Value<'a>) -> bool {
        match Self::ancestor(env, distance) {
            Some(frame) => {
                frame.borrow_mut().values.insert(name, value);
                true
            }
            None => false,
        }
    }
}

fn undefined(name: &Token<'_>) -> LoxError {
    LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    fn ident(name: &str) -> Token<'_> {
        Token::new(TokenType::IDENTIFIER, name, 1)
    }

    #[test]
    fn lookup_walks_the_chain() {
        let globals = Environment::new().into_ref();
        globals.borrow_mut().define("a", Value::Number(1.0));

        let inner = Environment::with_enclosing(Rc::clone(&globals));

        assert!(matches!(inner.get(&ident("a")), Ok(Value::Number(n)) if n == 1.0));
    }

    #[test]
    fn assign_updates_the_defining_frame_only() {
        let globals = Environment::new().into_ref();
        globals.borrow_mut().define("a", Value::Number(1.0));

        let inner = Environment::with_enclosing(Rc::clone(&globals)).into_ref();
        inner
            .borrow_mut()
            .assign(&ident("a"), Value::Number(2.0))
            .unwrap();

        assert!(inner.borrow().values.is_empty());
        assert!(matches!(globals.borrow().get(&ident("a")), Ok(Value::Number(n)) if n == 2.0));
    }

    #[test]
    fn missing_names_are_errors_not_defaults() {
        let mut env = Environment::new();

        let read = env.get(&ident("nope")).unwrap_err();
        let write = env.assign(&ident("nope"), Value::Nil).unwrap_err();

        assert_eq!(read.to_string(), "Undefined variable 'nope'.\n[line 1]");
        assert_eq!(write.to_string(), "Undefined variable 'nope'.\n[line 1]");
    }

    #[test]
    fn distance_access_skips_shadowing_frames() {
        let outer = Environment::new().into_ref();
        outer.borrow_mut().define("x", Value::Number(1.0));

        let inner = Environment::with_enclosing(Rc::clone(&outer)).into_ref();
        inner.borrow_mut().define("x", Value::Number(2.0));

        assert!(matches!(Environment::get_at(&inner, 1, "x"), Some(Value::Number(n)) if n == 1.0));
        assert!(Environment::assign_at(&inner, 1, "x", Value::Number(3.0)));
        assert!(matches!(Environment::get_at(&inner, 0, "x"), Some(Value::Number(n)) if n == 2.0));
        assert!(matches!(Environment::get_at(&outer, 0, "x"), Some(Value::Number(n)) if n == 3.0));
        assert!(Environment::get_at(&inner, 5, "x").is_none());
    }
}
