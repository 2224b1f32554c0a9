use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use log::debug;
use crate::interpreter::ast::FunctionDecl;
use crate::interpreter::error::{RuntimeError, RuntimeResult};
use crate::interpreter::value::ValueType;

pub const ENTRY_POINT: &str = "main";

/// The callable shape of a declared function.
///
/// Equality and hashing only look at the name and the parameter types, which is what
/// overload lookup keys on. Use [`FunctionSignature::full_match`] to also compare the return type.
#[derive(Clone, Debug)]
pub struct FunctionSignature {
    pub name: String,
    pub return_type: ValueType,
    pub param_types: Vec<ValueType>,
    pub param_names: Vec<String>,
}

impl FunctionSignature {
    pub fn from_decl(decl: &FunctionDecl) -> FunctionSignature {
        FunctionSignature {
            name: decl.name.source().to_owned(),
            return_type: decl.return_type,
            param_types: decl.params.iter().map(|param| param.param_type).collect(),
            param_names: decl.params.iter().map(|param| param.name.source().to_owned()).collect(),
        }
    }

    pub fn full_match(&self, other: &FunctionSignature) -> bool {
        self == other && self.return_type == other.return_type
    }

    pub fn key(&self) -> SignatureKey {
        SignatureKey { name: self.name.clone(), param_types: self.param_types.clone() }
    }
}

impl PartialEq for FunctionSignature {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.param_types == other.param_types
    }
}

impl Eq for FunctionSignature {}

impl Hash for FunctionSignature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.param_types.hash(state);
    }
}

impl Display for FunctionSignature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\\{}", self.key(), self.return_type)
    }
}

/// Lookup key of the overload table: a name and the runtime types of the arguments.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SignatureKey {
    pub name: String,
    pub param_types: Vec<ValueType>,
}

impl SignatureKey {
    pub fn new(name: impl Into<String>, param_types: Vec<ValueType>) -> SignatureKey {
        SignatureKey { name: name.into(), param_types }
    }
}

impl Display for SignatureKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.param_types.iter()
            .map(|param_type| param_type.name())
            .collect::<Vec<&str>>().join(", "))
    }
}

pub struct FunctionEntry {
    pub signature: FunctionSignature,
    pub decl: FunctionDecl,
}

/// Every declared function, indexed by [`SignatureKey`].
#[derive(Default)]
pub struct FunctionTable {
    functions: Vec<FunctionEntry>,
    index: HashMap<SignatureKey, usize>,
}

impl FunctionTable {
    pub fn from_declarations(decls: Vec<FunctionDecl>) -> RuntimeResult<FunctionTable> {
        let mut table = FunctionTable::default();

        for decl in decls {
            let signature = FunctionSignature::from_decl(&decl);
            let key = signature.key();

            if table.index.contains_key(&key) {
                return Err(RuntimeError::RedeclaredFunction { signature: key.to_string(), line: decl.name.line() });
            }

            debug!("Declared function {}", signature);
            table.index.insert(key, table.functions.len());
            table.functions.push(FunctionEntry { signature, decl });
        }

        Ok(table)
    }

    pub fn lookup(&self, key: &SignatureKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn get(&self, index: usize) -> Option<&FunctionEntry> {
        self.functions.get(index)
    }

    /// Finds `main()` and checks that it returns an int.
    pub fn entry_point(&self) -> RuntimeResult<usize> {
        let index = self.lookup(&SignatureKey::new(ENTRY_POINT, Vec::new()))
            .ok_or(RuntimeError::MissingEntryPoint)?;
        let entry = &self.functions[index];

        let expected = FunctionSignature {
            name: ENTRY_POINT.to_owned(),
            return_type: ValueType::Int,
            param_types: Vec::new(),
            param_names: Vec::new(),
        };

        if !entry.signature.full_match(&expected) {
            return Err(RuntimeError::InvalidEntryPoint { found: entry.signature.return_type });
        }

        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
