//! Named storage for homogeneous sequences of `Num`/`Bool` elements.

use ahash::RandomState;
use indexmap::IndexMap;

use crate::error::Error;
use crate::types::Type;
use crate::value::{Primitive, Value, infer_value_type, supported_element_types};

fn check_list_type(value: &Value) -> Result<(), Error> {
    match infer_value_type(value) {
        Type::List(inner) => match *inner {
            Type::Num | Type::Bool | Type::Var(_) => Ok(()),
            ty => Err(Error::UnsupportedType { ty: Type::list(ty) }),
        },
        ty => Err(Error::UnsupportedType { ty }),
    }
}

fn check_elements_homogeneous(elements: &[Primitive]) -> Result<(), Error> {
    let Some(first) = elements.first() else { return Ok(()) };
    let first_ty = infer_value_type(&Value::from(*first));
    for elem in &elements[1..] {
        if infer_value_type(&Value::from(*elem)) != first_ty {
            return Err(Error::UnsupportedType { ty: Type::list(first_ty) });
        }
    }
    Ok(())
}

fn check_elements(elements: &[Primitive]) -> Result<(), Error> {
    check_list_type(&Value::List(elements.to_vec()))?;
    check_elements_homogeneous(elements)
}

/// Checks whether `value` may legally be added to a list shaped like `list_value` — the element
/// being updated is excluded from `list_value` first so that a singleton list can change shape
/// (`[true] -> [0]`), matching `lists.py::update_list_element`'s slicing trick.
fn check_type_add_value(list_value: &[Primitive], value: Primitive) -> Result<(), Error> {
    let supported = supported_element_types(&Value::List(list_value.to_vec()));
    let value_ty = infer_value_type(&Value::from(value));
    if supported.contains(&value_ty) {
        Ok(())
    } else {
        Err(Error::UnsupportedType { ty: value_ty })
    }
}

/// Mapping `l_i -> [P]`, `P` restricted to a single supported primitive type per list.
#[derive(Debug, Clone, Default)]
pub struct Lists {
    lists: IndexMap<String, Vec<Primitive>, RandomState>,
    next_id: usize,
}

impl Lists {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_valid(&self, name: &str) -> bool {
        self.lists.contains_key(name)
    }

    /// # Errors
    /// `Error::UnsupportedType` if `value` contains different element types or an unsupported type.
    pub fn create(&mut self, value: Vec<Primitive>) -> Result<String, Error> {
        check_elements(&value)?;
        let name = format!("l{}", self.next_id);
        self.lists.insert(name.clone(), value);
        self.next_id += 1;
        Ok(name)
    }

    /// # Errors
    /// `Error::UnknownName` if `name` does not exist. `Error::UnsupportedType` on heterogeneous or
    /// unsupported elements.
    pub fn update(&mut self, name: &str, value: Vec<Primitive>) -> Result<(), Error> {
        if !self.is_valid(name) {
            return Err(Error::unknown_name(name));
        }
        check_elements(&value)?;
        self.lists.insert(name.to_string(), value);
        Ok(())
    }

    /// # Errors
    /// `Error::UnknownName` if `name` does not exist.
    pub fn get(&self, name: &str) -> Result<&Vec<Primitive>, Error> {
        self.lists.get(name).ok_or_else(|| Error::unknown_name(name))
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.lists.keys().cloned().collect()
    }

    /// # Errors
    /// `Error::UnknownName` if `name` does not exist. `Error::IndexOutOfRange` if `index` is invalid.
    pub fn get_element(&self, name: &str, index: usize) -> Result<Primitive, Error> {
        let list = self.get(name)?;
        list.get(index).copied().ok_or(Error::IndexOutOfRange { index, len: list.len() })
    }

    /// # Errors
    /// `Error::UnknownName` if `name` does not exist.
    pub fn delete(&mut self, name: &str) -> Result<(), Error> {
        self.lists.shift_remove(name).map(|_| ()).ok_or_else(|| Error::unknown_name(name))
    }

    /// Returns the index the new element was inserted at.
    ///
    /// # Errors
    /// `Error::UnknownName` if `name` does not exist. `Error::UnsupportedType` if `value` is
    /// incompatible with the list's element type.
    pub fn append(&mut self, name: &str, value: Primitive) -> Result<usize, Error> {
        if !self.is_valid(name) {
            return Err(Error::unknown_name(name));
        }
        check_type_add_value(self.get(name)?, value)?;
        let list = self.lists.get_mut(name).ok_or_else(|| Error::unknown_name(name))?;
        list.push(value);
        Ok(list.len() - 1)
    }

    /// # Errors
    /// `Error::UnknownName` if `name` does not exist. `Error::UnsupportedType` if `value` is
    /// incompatible with the list's element type.
    pub fn insert_element(&mut self, name: &str, value: Primitive, index: usize) -> Result<(), Error> {
        if !self.is_valid(name) {
            return Err(Error::unknown_name(name));
        }
        check_type_add_value(self.get(name)?, value)?;
        let list = self.lists.get_mut(name).ok_or_else(|| Error::unknown_name(name))?;
        let index = index.min(list.len());
        list.insert(index, value);
        Ok(())
    }

    /// # Errors
    /// `Error::UnknownName` if `name` does not exist. `Error::UnsupportedType` if `value` is
    /// incompatible with the list's remaining elements. `Error::IndexOutOfRange` if `index` is
    /// invalid.
    pub fn update_element(&mut self, name: &str, value: Primitive, index: usize) -> Result<(), Error> {
        let list = self.get(name)?;
        if index >= list.len() {
            return Err(Error::IndexOutOfRange { index, len: list.len() });
        }
        // The element being replaced is excluded from the type check — this lets a singleton list
        // change shape entirely (`[true] -> [0]`).
        let mut rest: Vec<Primitive> = list.clone();
        rest.remove(index);
        check_type_add_value(&rest, value)?;
        self.lists[name][index] = value;
        Ok(())
    }

    /// # Errors
    /// `Error::UnknownName` if `name` does not exist. `Error::IndexOutOfRange` if `index` is invalid.
    pub fn delete_element(&mut self, name: &str, index: usize) -> Result<(), Error> {
        let list = self.lists.get_mut(name).ok_or_else(|| Error::unknown_name(name))?;
        if index >= list.len() {
            return Err(Error::IndexOutOfRange { index, len: list.len() });
        }
        list.remove(index);
        Ok(())
    }
}
