//! The symbol table: a tree of scopes addressed by arena id, never by
//! owning pointer. Parent/child links are [`ScopeId`]s so the tree has no
//! cycles to worry about and can be walked, dumped, or looked up by id
//! without borrow-checker gymnastics.

use indexmap::IndexMap;
use tacc_util::{Idx, IndexVec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

impl Idx for ScopeId {
    fn from_usize(idx: usize) -> Self {
        ScopeId(idx as u32)
    }
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Func,
    Param,
    Global,
    Local,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Always `"int"` for anything that passed semantic analysis, but the
    /// raw spelling is kept so diagnostics can name rejected types too.
    pub type_name: String,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug)]
pub struct Scope {
    pub id: ScopeId,
    pub name: String,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    pub symbols: IndexMap<String, Symbol>,
    pub labels: IndexMap<String, ()>,
}

/// A tree of scopes, arena-allocated so parent/child links are ids rather
/// than owning references.
#[derive(Debug)]
pub struct SymbolTable {
    pub scopes: IndexVec<ScopeId, Scope>,
    pub global: ScopeId,
    current: ScopeId,
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut scopes = IndexVec::new();
        let global = scopes.push(Scope {
            id: ScopeId::from_usize(0),
            name: "global".to_string(),
            parent: None,
            children: Vec::new(),
            symbols: IndexMap::new(),
            labels: IndexMap::new(),
        });
        Self { scopes, global, current: global }
    }

    pub fn current(&self) -> ScopeId {
        self.current
    }

    pub fn enter_scope(&mut self, name: impl Into<String>) -> ScopeId {
        let id = ScopeId::from_usize(self.scopes.len());
        self.scopes.push(Scope {
            id,
            name: name.into(),
            parent: Some(self.current),
            children: Vec::new(),
            symbols: IndexMap::new(),
            labels: IndexMap::new(),
        });
        self.scopes[self.current].children.push(id);
        self.current = id;
        id
    }

    pub fn exit_scope(&mut self) -> Result<(), super::SymbolTableError> {
        match self.scopes[self.current].parent {
            Some(parent) => {
                self.current = parent;
                Ok(())
            }
            None => Err(super::SymbolTableError::EscapedGlobalScope),
        }
    }

    pub fn add_symbol(&mut self, symbol: Symbol) -> Result<(), super::SymbolTableError> {
        let scope = &mut self.scopes[self.current];
        if scope.symbols.contains_key(&symbol.name) {
            return Err(super::SymbolTableError::Redeclared { name: symbol.name });
        }
        scope.symbols.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        let mut cursor = Some(scope);
        while let Some(id) = cursor {
            let s = &self.scopes[id];
            if let Some(sym) = s.symbols.get(name) {
                return Some(sym);
            }
            cursor = s.parent;
        }
        None
    }

    /// Depth-first preorder traversal of the scope tree, for the `-t` dump.
    pub fn dump_order(&self) -> Vec<ScopeId> {
        let mut order = Vec::new();
        let mut stack = vec![self.global];
        while let Some(id) = stack.pop() {
            order.push(id);
            for &child in self.scopes[id].children.iter().rev() {
                stack.push(child);
            }
        }
        order
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
