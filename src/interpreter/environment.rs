use log::trace;
use crate::interpreter::memory::{Address, GlobalValueStorage, MemoryError, VariableStorage};
use crate::interpreter::value::Value;

/// Handle of an [`ExecutionSpace`] inside a [`CallStack`].
pub type SpaceId = usize;

/// One activation record: a function invocation, an entered `if` branch or the global root.
#[derive(Debug, Default)]
pub struct ExecutionSpace {
    variables: VariableStorage,
    parent: Option<SpaceId>,
}

impl ExecutionSpace {
    pub fn parent(&self) -> Option<SpaceId> {
        self.parent
    }
}

/// Arena of live execution spaces, used strictly as a stack.
///
/// A space refers to its enclosing scope by handle. Since spaces are popped in reverse order of
/// creation, a parent handle always points below its child and stays valid for the child's lifetime.
#[derive(Debug)]
pub struct CallStack {
    spaces: Vec<ExecutionSpace>,
}

impl CallStack {
    /// Creates a stack holding only the global root space.
    pub fn new() -> CallStack {
        CallStack { spaces: vec![ExecutionSpace::default()] }
    }

    pub const ROOT: SpaceId = 0;

    pub fn push(&mut self, parent: SpaceId) -> SpaceId {
        let id = self.spaces.len();
        self.spaces.push(ExecutionSpace { variables: VariableStorage::new(), parent: Some(parent) });

        trace!("Entered space {} (parent {})", id, parent);
        id
    }

    /// Removes the innermost space and frees every cell it declared. The root space is never popped.
    pub fn pop(&mut self, heap: &mut GlobalValueStorage) -> Result<(), MemoryError> {
        if self.spaces.len() <= 1 {
            return Ok(());
        }

        match self.spaces.pop() {
            Some(space) => {
                trace!("Left space {}", self.spaces.len());
                space.variables.release(heap)
            },
            None => Ok(()),
        }
    }

    /// Frees the root space's variables. Used once the run is over.
    pub fn clear(&mut self, heap: &mut GlobalValueStorage) -> Result<(), MemoryError> {
        while self.spaces.len() > 1 {
            self.pop(heap)?;
        }

        let root = std::mem::take(&mut self.spaces[CallStack::ROOT]);
        root.variables.release(heap)
    }

    pub fn current(&self) -> SpaceId {
        self.spaces.len() - 1
    }

    pub fn depth(&self) -> usize {
        self.spaces.len()
    }

    pub fn get(&self, id: SpaceId) -> Option<&ExecutionSpace> {
        self.spaces.get(id)
    }

    /// Declares `name` in the innermost space.
    pub fn declare(&mut self, heap: &mut GlobalValueStorage, name: &str, value: Value) -> Result<Address, MemoryError> {
        let current = self.current();
        self.spaces[current].variables.new_var(heap, name, value)
    }

    /// Resolves `name` starting at the innermost space and following parent handles outwards.
    pub fn lookup(&self, name: &str) -> Result<Address, MemoryError> {
        let mut space = Some(self.current());

        while let Some(id) = space {
            let Some(execution_space) = self.spaces.get(id) else { break };

            if let Some(address) = execution_space.variables.address_of(name) {
                return Ok(address);
            }

            space = execution_space.parent;
        }

        Err(MemoryError::UndefinedVariable(name.to_owned()))
    }
}

impl Default for CallStack {
    fn default() -> Self {
        CallStack::new()
    }
}
