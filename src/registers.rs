//! Named storage for scalar (`Num`/`Bool`) values.

use ahash::RandomState;
use indexmap::IndexMap;

use crate::error::Error;
use crate::types::Type;
use crate::value::{Value, infer_value_type};

fn check_scalar_type(value: &Value) -> Result<(), Error> {
    match infer_value_type(value) {
        Type::Num | Type::Bool => Ok(()),
        ty => Err(Error::UnsupportedType { ty }),
    }
}

/// Mapping `r_i -> value`, `value` restricted to `Num`/`Bool`.
#[derive(Debug, Clone, Default)]
pub struct Registers {
    registers: IndexMap<String, Value, RandomState>,
    next_id: usize,
}

impl Registers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_valid(&self, name: &str) -> bool {
        self.registers.contains_key(name)
    }

    /// # Errors
    /// `Error::UnsupportedType` if `value` is not `Num` or `Bool`.
    pub fn create(&mut self, value: Value) -> Result<String, Error> {
        check_scalar_type(&value)?;
        let name = format!("r{}", self.next_id);
        self.registers.insert(name.clone(), value);
        self.next_id += 1;
        Ok(name)
    }

    /// # Errors
    /// `Error::UnknownName` if `name` does not exist.
    pub fn get(&self, name: &str) -> Result<&Value, Error> {
        self.registers.get(name).ok_or_else(|| Error::unknown_name(name))
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.registers.keys().cloned().collect()
    }

    /// # Errors
    /// `Error::UnknownName` if `name` does not exist.
    pub fn delete(&mut self, name: &str) -> Result<(), Error> {
        self.registers.shift_remove(name).map(|_| ()).ok_or_else(|| Error::unknown_name(name))
    }

    /// # Errors
    /// `Error::UnknownName` if `name` does not exist. `Error::UnsupportedType` if `value` is not
    /// `Num`/`Bool`.
    pub fn update(&mut self, name: &str, value: Value) -> Result<(), Error> {
        if !self.is_valid(name) {
            return Err(Error::unknown_name(name));
        }
        check_scalar_type(&value)?;
        self.registers.insert(name.to_string(), value);
        Ok(())
    }
}
