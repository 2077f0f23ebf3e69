//! Scoped symbol table.
//!
//! A tree of [`Scope`]s, one per lexical block, each holding its own
//! declarations. This is the one place in the crate with a parent
//! back-reference (`spec.md` §9 contrasts this deliberately with the
//! AST: scope resolution genuinely needs to walk upward, so the link is
//! load-bearing here where it wasn't for AST nodes). Child scopes hold a
//! strong `Rc` down to their declarations and a `Weak` pointer back up
//! to their parent, avoiding a reference cycle.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::types::TypeInfo;

#[derive(Debug, Clone, PartialEq)]
pub enum SymbolKind {
    Variable,
    Parameter,
    Function { params: Vec<TypeInfo> },
    /// Dormant alongside `TypeInfo::Struct` (`spec.md` §9): no
    /// declaration ever produces this kind, but the data model names it.
    StructType,
}

#[derive(Debug, Clone)]
pub struct SymbolEntry {
    pub name: String,
    pub ty: TypeInfo,
    pub kind: SymbolKind,
    /// Shared with every clone of this entry so that
    /// `Scope::mark_initialized` mutates the copy stored in the table,
    /// not a detached snapshot. The uninitialized-read check itself is
    /// permanently disabled (`spec.md` §9), so this is bookkeeping only.
    is_initialized: Rc<Cell<bool>>,
}

impl SymbolEntry {
    pub fn new(name: impl Into<String>, ty: TypeInfo, kind: SymbolKind, initialized: bool) -> Self {
        SymbolEntry {
            name: name.into(),
            ty,
            kind,
            is_initialized: Rc::new(Cell::new(initialized)),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.is_initialized.get()
    }

    pub fn mark_initialized(&self) {
        self.is_initialized.set(true);
    }
}

pub struct Scope {
    parent: Option<Weak<Scope>>,
    symbols: RefCell<HashMap<String, SymbolEntry>>,
}

impl Scope {
    /// A fresh root scope (the translation unit's file scope).
    pub fn root() -> Rc<Scope> {
        Rc::new(Scope {
            parent: None,
            symbols: RefCell::new(HashMap::new()),
        })
    }

    /// A new child scope nested under `parent`, entered for the
    /// duration of a compound statement, function body, or `for`
    /// header (`spec.md` §4.3's scope enter/exit discipline).
    pub fn child_of(parent: &Rc<Scope>) -> Rc<Scope> {
        Rc::new(Scope {
            parent: Some(Rc::downgrade(parent)),
            symbols: RefCell::new(HashMap::new()),
        })
    }

    pub fn parent(&self) -> Option<Rc<Scope>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// Declare a symbol in this scope only. Returns `false` if `name`
    /// is already bound here, without touching the existing entry
    /// (the caller reports `SemanticError::Redeclaration`).
    pub fn declare(&self, entry: SymbolEntry) -> bool {
        let mut symbols = self.symbols.borrow_mut();
        if symbols.contains_key(&entry.name) {
            return false;
        }
        symbols.insert(entry.name.clone(), entry);
        true
    }

    /// Look up `name` in this scope, then walk up through enclosing
    /// scopes until it resolves or the chain runs out.
    pub fn lookup(&self, name: &str) -> Option<SymbolEntry> {
        if let Some(entry) = self.symbols.borrow().get(name) {
            return Some(entry.clone());
        }
        self.parent()?.lookup(name)
    }

    /// Look up `name` in this scope only, ignoring ancestors. Used when
    /// checking for redeclaration within the same block.
    pub fn lookup_local(&self, name: &str) -> Option<SymbolEntry> {
        self.symbols.borrow().get(name).cloned()
    }

    /// Every entry declared directly in this scope, for a verbose
    /// driver's symbol-table snapshot. Order is unspecified.
    pub fn local_entries(&self) -> Vec<SymbolEntry> {
        self.symbols.borrow().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str, ty: TypeInfo) -> SymbolEntry {
        SymbolEntry::new(name, ty, SymbolKind::Variable, true)
    }

    #[test]
    fn lookup_walks_up_through_enclosing_scopes() {
        let root = Scope::root();
        assert!(root.declare(var("x", TypeInfo::Int)));
        let inner = Scope::child_of(&root);
        assert!(inner.lookup("x").is_some());
        assert!(inner.lookup("nowhere").is_none());
    }

    #[test]
    fn redeclaration_in_the_same_scope_is_rejected() {
        let root = Scope::root();
        assert!(root.declare(var("x", TypeInfo::Int)));
        assert!(!root.declare(var("x", TypeInfo::Char)));
    }

    #[test]
    fn shadowing_in_a_child_scope_is_allowed() {
        let root = Scope::root();
        assert!(root.declare(var("x", TypeInfo::Int)));
        let inner = Scope::child_of(&root);
        assert!(inner.declare(var("x", TypeInfo::Char)));
        assert_eq!(inner.lookup_local("x").unwrap().ty, TypeInfo::Char);
        assert_eq!(root.lookup_local("x").unwrap().ty, TypeInfo::Int);
    }

    #[test]
    fn marking_initialized_is_visible_through_a_later_lookup() {
        let root = Scope::root();
        root.declare(var("x", TypeInfo::Int));
        let looked_up = root.lookup("x").unwrap();
        looked_up.mark_initialized();
        assert!(root.lookup("x").unwrap().is_initialized());
    }
}
