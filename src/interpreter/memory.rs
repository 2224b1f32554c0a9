use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use log::trace;
use thiserror::Error;
use crate::interpreter::value::{Value, ValueType};

/// Opaque handle of a heap cell.
pub type Address = u64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    #[error("Undefined memory address: {0}")]
    UndefinedAddress(Address),
    #[error("Redefinition of variable name: {0}")]
    RedefinedVariable(String),
    #[error("Undefined variable name: {0}")]
    UndefinedVariable(String),
}

type MemoryResult<T> = Result<T, MemoryError>;

#[derive(Clone, Debug, PartialEq)]
pub struct MemoryCell {
    pub cell_type: ValueType,
    pub value: Value,
}

/// Owns every live cell of one interpreter.
///
/// Freed addresses go into a min-ordered pool and are handed out again, smallest first,
/// before the high-water mark grows.
#[derive(Debug, Default)]
pub struct GlobalValueStorage {
    memory: HashMap<Address, MemoryCell>,
    free_addresses: BinaryHeap<Reverse<Address>>,
    max_address: Address,
}

impl GlobalValueStorage {
    pub fn new() -> GlobalValueStorage {
        GlobalValueStorage::default()
    }

    pub fn new_cell(&mut self, value: Value) -> Address {
        let address = match self.free_addresses.pop() {
            Some(Reverse(address)) => address,
            None => {
                let address = self.max_address;
                self.max_address += 1;
                address
            },
        };

        trace!("Allocated cell {} ({:?})", address, value);
        self.memory.insert(address, MemoryCell { cell_type: value.value_type(), value });
        address
    }

    pub fn get_cell(&self, address: Address) -> MemoryResult<&MemoryCell> {
        self.memory.get(&address).ok_or(MemoryError::UndefinedAddress(address))
    }

    pub fn get_cell_mut(&mut self, address: Address) -> MemoryResult<&mut MemoryCell> {
        self.memory.get_mut(&address).ok_or(MemoryError::UndefinedAddress(address))
    }

    pub fn delete_cell(&mut self, address: Address) -> MemoryResult<()> {
        if self.memory.remove(&address).is_none() {
            return Err(MemoryError::UndefinedAddress(address));
        }

        trace!("Freed cell {}", address);
        self.free_addresses.push(Reverse(address));
        Ok(())
    }

    /// Number of live cells.
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }
}

/// Name → address bindings of exactly one execution space.
///
/// The storage owns the addresses it allocated; [`VariableStorage::release`] hands all of them back
/// to the heap when the space ends.
#[derive(Debug, Default)]
pub struct VariableStorage {
    variables: HashMap<String, Address>,
}

impl VariableStorage {
    pub fn new() -> VariableStorage {
        VariableStorage::default()
    }

    pub fn new_var(&mut self, heap: &mut GlobalValueStorage, name: &str, value: Value) -> MemoryResult<Address> {
        if self.variables.contains_key(name) {
            return Err(MemoryError::RedefinedVariable(name.to_owned()));
        }

        let address = heap.new_cell(value);
        self.variables.insert(name.to_owned(), address);
        Ok(address)
    }

    pub fn address_of(&self, name: &str) -> Option<Address> {
        self.variables.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn release(self, heap: &mut GlobalValueStorage) -> MemoryResult<()> {
        let mut result = Ok(());

        for (_, address) in self.variables {
            // Keep freeing the rest even if one address is already gone
            if let Err(err) = heap.delete_cell(address) {
                result = Err(err);
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freed_addresses_are_reused_smallest_first() {
        let mut heap = GlobalValueStorage::new();

        let a = heap.new_cell(Value::Int(1));
        let b = heap.new_cell(Value::Int(2));
        let c = heap.new_cell(Value::Int(3));
        assert_eq!((a, b, c), (0, 1, 2));

        heap.delete_cell(c).unwrap();
        heap.delete_cell(a).unwrap();

        assert_eq!(heap.new_cell(Value::Bool(true)), a);
        assert_eq!(heap.new_cell(Value::Bool(false)), c);
        assert_eq!(heap.new_cell(Value::Float(0.5)), 3);
    }

    #[test]
    fn freed_address_is_invalid() {
        let mut heap = GlobalValueStorage::new();
        let address = heap.new_cell(Value::String(String::from("x")));

        assert_eq!(heap.get_cell(address).unwrap().cell_type, ValueType::String);

        heap.delete_cell(address).unwrap();
        assert_eq!(heap.get_cell(address), Err(MemoryError::UndefinedAddress(address)));
        assert_eq!(heap.delete_cell(address), Err(MemoryError::UndefinedAddress(address)));
        assert_eq!(heap.get_cell(42), Err(MemoryError::UndefinedAddress(42)));
    }

    #[test]
    fn cells_are_mutable_in_place() {
        let mut heap = GlobalValueStorage::new();
        let address = heap.new_cell(Value::Int(1));

        heap.get_cell_mut(address).unwrap().value = Value::Int(5);
        assert_eq!(heap.get_cell(address).unwrap().value, Value::Int(5));
    }

    #[test]
    fn redeclaration_in_one_storage_fails() {
        let mut heap = GlobalValueStorage::new();
        let mut variables = VariableStorage::new();

        variables.new_var(&mut heap, "x", Value::Int(1)).unwrap();
        assert_eq!(variables.new_var(&mut heap, "x", Value::Int(2)), Err(MemoryError::RedefinedVariable(String::from("x"))));
        assert_eq!(heap.len(), 1);
    }

    #[test]
    fn release_returns_every_address() {
        let mut heap = GlobalValueStorage::new();
        let mut variables = VariableStorage::new();

        let x = variables.new_var(&mut heap, "x", Value::Int(1)).unwrap();
        variables.new_var(&mut heap, "y", Value::Int(2)).unwrap();
        assert!(variables.contains("y"));
        assert_eq!(variables.address_of("x"), Some(x));

        variables.release(&mut heap).unwrap();
        assert!(heap.is_empty());
        assert_eq!(heap.new_cell(Value::Int(3)), 0);
    }
}
