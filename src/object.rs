//! # Heap objects for the bytecode VM
//!
//! This module defines the handful of heap-allocated kinds this language
//! needs — interned strings and compiled functions — plus [`Heap`], the
//! arena that owns them.
//!
//! ## Design
//! The reference implementation this core is modeled on links heap objects
//! through an intrusive `next` pointer rooted in the VM, with raw pointers
//! handed out everywhere else. That shape doesn't translate into safe Rust
//! without reaching for `unsafe`. Instead, [`Heap`] owns every object in a
//! single `Vec`, and callers hold an [`ObjHandle`] — a small `Copy` index
//! that never owns storage. This keeps the "heap exclusively owns objects;
//! everything else is a non-owning reference" invariant intact: a handle
//! *is* a non-owning reference, by construction.
//!
//! ## Interning
//! [`Heap::intern`] and [`Heap::intern_owned`] both return the canonical
//! handle for a given string's content — two calls with equal content
//! always return the same handle, so identity comparison and content
//! comparison coincide for strings.

use crate::chunk::Chunk;
use std::collections::HashMap;

/// A non-owning, `Copy` reference to an object living in a [`Heap`].
///
/// Two handles compare equal iff they refer to the same heap slot, which
/// for interned strings coincides with content equality.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ObjHandle(u32);

/// An interned, immutable string.
#[derive(Debug)]
pub struct ObjString {
    pub chars: Box<str>,
    pub hash: u32,
}

/// A compiled function: its arity, bytecode, and an optional name.
///
/// A nameless function is the top-level script.
#[derive(Debug)]
pub struct ObjFunction {
    pub name: Option<ObjHandle>,
    pub arity: u8,
    pub chunk: Chunk,
}

#[derive(Debug)]
enum ObjKind {
    String(ObjString),
    Function(ObjFunction),
}

struct Entry {
    marked: bool,
    kind: ObjKind,
}

/// FNV-1a, 32-bit, matching the hash clox caches on every `ObjString`.
fn hash_string(s: &str) -> u32 {
    let mut hash: u32 = 2166136261;
    for byte in s.bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(16777619);
    }
    hash
}

/// Owning arena for every object allocated by the compiler and VM.
///
/// Objects are never freed individually during a run (this core implements
/// only the GC mark phase, see [`Heap::mark`]); everything is dropped in
/// bulk when the `Heap` itself is dropped, mirroring `freeObjects` at
/// shutdown.
pub struct Heap {
    entries: Vec<Entry>,
    strings: HashMap<Box<str>, ObjHandle>,
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl Heap {
    pub fn new() -> Self {
        Heap {
            entries: Vec::new(),
            strings: HashMap::new(),
        }
    }

    fn push(&mut self, kind: ObjKind) -> ObjHandle {
        let handle = ObjHandle(self.entries.len() as u32);
        self.entries.push(Entry {
            marked: false,
            kind,
        });
        handle
    }

    /// Intern a borrowed string, copying it only if it isn't already known.
    ///
    /// Mirrors clox's `copyString`.
    pub fn intern(&mut self, s: &str) -> ObjHandle {
        if let Some(&handle) = self.strings.get(s) {
            return handle;
        }
        self.intern_owned(s.to_string())
    }

    /// Intern an owned string, reusing its allocation when it is new.
    ///
    /// Mirrors clox's `takeString`, used when the caller (e.g. string
    /// concatenation) already built a fresh `String` and there is no point
    /// copying it again.
    pub fn intern_owned(&mut self, s: String) -> ObjHandle {
        if let Some(&handle) = self.strings.get(s.as_str()) {
            return handle;
        }
        let hash = hash_string(&s);
        let boxed: Box<str> = s.into_boxed_str();
        let handle = self.push(ObjKind::String(ObjString {
            chars: boxed.clone(),
            hash,
        }));
        self.strings.insert(boxed, handle);
        handle
    }

    /// Allocate a new, empty function under construction.
    ///
    /// `name` is `None` for the top-level script.
    pub fn alloc_function(&mut self, name: Option<ObjHandle>) -> ObjHandle {
        self.push(ObjKind::Function(ObjFunction {
            name,
            arity: 0,
            chunk: Chunk::new(),
        }))
    }

    pub fn string(&self, handle: ObjHandle) -> &ObjString {
        match &self.entries[handle.0 as usize].kind {
            ObjKind::String(s) => s,
            ObjKind::Function(_) => panic!("ObjHandle does not refer to a string"),
        }
    }

    pub fn function(&self, handle: ObjHandle) -> &ObjFunction {
        match &self.entries[handle.0 as usize].kind {
            ObjKind::Function(f) => f,
            ObjKind::String(_) => panic!("ObjHandle does not refer to a function"),
        }
    }

    pub fn function_mut(&mut self, handle: ObjHandle) -> &mut ObjFunction {
        match &mut self.entries[handle.0 as usize].kind {
            ObjKind::Function(f) => f,
            ObjKind::String(_) => panic!("ObjHandle does not refer to a function"),
        }
    }

    pub fn is_string(&self, handle: ObjHandle) -> bool {
        matches!(self.entries[handle.0 as usize].kind, ObjKind::String(_))
    }

    pub fn is_function(&self, handle: ObjHandle) -> bool {
        matches!(self.entries[handle.0 as usize].kind, ObjKind::Function(_))
    }

    /// Mark `handle` reachable. Part of the mark-sweep GC's mark phase
    /// (spec §4.5); this core never schedules an automatic sweep.
    pub fn mark(&mut self, handle: ObjHandle) {
        self.entries[handle.0 as usize].marked = true;
    }

    pub fn is_marked(&self, handle: ObjHandle) -> bool {
        self.entries[handle.0 as usize].marked
    }

    pub fn clear_marks(&mut self) {
        for entry in &mut self.entries {
            entry.marked = false;
        }
    }

    /// Every interned string is a strong root for this core (see spec §4.5,
    /// root 3): a production GC would weak-reference the intern table, but
    /// this core never sweeps, so there is nothing to reclaim regardless.
    pub fn mark_interned_strings(&mut self) {
        let handles: Vec<ObjHandle> = self.strings.values().copied().collect();
        for handle in handles {
            self.mark(handle);
        }
    }

    #[cfg(test)]
    pub fn object_count(&self) -> usize {
        self.entries.len()
    }
}
