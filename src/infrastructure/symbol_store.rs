//! Symbol lookup backends.
//!
//! The syn provider resolves call expressions against these tables. The
//! in-memory backend is the default; the sled-backed store exists for
//! workspaces whose symbol tables should not live on the heap. Stores are
//! populated sequentially after parsing, so lookups are deterministic.

use dashmap::DashMap;
use sled::Db;

use crate::ports::DeclId;

/// Lookup backend for resolved declarations.
/// Implementations must be thread-safe (Send + Sync).
pub trait SymbolStore: Send + Sync {
    /// Register a free function under its qualified key, e.g. `my_crate::run`.
    fn insert_function(&self, key: String, decl: DeclId);
    /// Register an associated function under its simple type name.
    fn insert_method(&self, type_name: String, method_name: String, decl: DeclId);
    fn get_function(&self, key: &str) -> Option<DeclId>;
    fn get_method(&self, type_name: &str, method_name: &str) -> Option<DeclId>;
    /// All declarations of a method name across types, insertion order.
    fn find_methods_by_name(&self, method_name: &str) -> Vec<DeclId>;
    /// All free functions with a simple name, insertion order.
    fn find_functions_by_name(&self, name: &str) -> Vec<DeclId>;
}

// ============================================================================
// MemorySymbolStore - in-memory tables on DashMap
// ============================================================================

#[derive(Default)]
pub struct MemorySymbolStore {
    functions: DashMap<String, DeclId>,
    methods: DashMap<(String, String), DeclId>,
    method_lookup: DashMap<String, Vec<String>>,
    function_lookup: DashMap<String, Vec<String>>,
}

impl SymbolStore for MemorySymbolStore {
    fn insert_function(&self, key: String, decl: DeclId) {
        let name = key.rsplit("::").next().unwrap_or(&key).to_string();
        let mut keys = self.function_lookup.entry(name).or_default();
        if !keys.contains(&key) {
            keys.push(key.clone());
        }
        drop(keys);
        self.functions.insert(key, decl);
    }

    fn insert_method(&self, type_name: String, method_name: String, decl: DeclId) {
        let mut types = self.method_lookup.entry(method_name.clone()).or_default();
        if !types.contains(&type_name) {
            types.push(type_name.clone());
        }
        drop(types);
        self.methods.insert((type_name, method_name), decl);
    }

    fn get_function(&self, key: &str) -> Option<DeclId> {
        self.functions.get(key).map(|r| *r)
    }

    fn get_method(&self, type_name: &str, method_name: &str) -> Option<DeclId> {
        self.methods
            .get(&(type_name.to_string(), method_name.to_string()))
            .map(|r| *r)
    }

    fn find_methods_by_name(&self, method_name: &str) -> Vec<DeclId> {
        match self.method_lookup.get(method_name) {
            Some(types) => types
                .iter()
                .filter_map(|tn| self.get_method(tn, method_name))
                .collect(),
            None => Vec::new(),
        }
    }

    fn find_functions_by_name(&self, name: &str) -> Vec<DeclId> {
        match self.function_lookup.get(name) {
            Some(keys) => keys.iter().filter_map(|k| self.get_function(k)).collect(),
            None => Vec::new(),
        }
    }
}

// ============================================================================
// DiskSymbolStore - sled-backed tables for large workspaces
// ============================================================================

pub struct DiskSymbolStore {
    _db: Db,
    functions_tree: sled::Tree,
    methods_tree: sled::Tree,
    method_lookup_tree: sled::Tree,
    function_lookup_tree: sled::Tree,
}

impl DiskSymbolStore {
    pub fn new(path: &str) -> anyhow::Result<Self> {
        let db = sled::open(path)?;
        let functions_tree = db.open_tree("functions")?;
        let methods_tree = db.open_tree("methods")?;
        let method_lookup_tree = db.open_tree("method_lookup")?;
        let function_lookup_tree = db.open_tree("function_lookup")?;

        Ok(Self {
            _db: db,
            functions_tree,
            methods_tree,
            method_lookup_tree,
            function_lookup_tree,
        })
    }

    fn method_key(type_name: &str, method_name: &str) -> String {
        format!("{}::{}", type_name, method_name)
    }

    fn read_decl(tree: &sled::Tree, key: &str) -> Option<DeclId> {
        tree.get(key.as_bytes())
            .ok()
            .flatten()
            .and_then(|bytes| bincode::deserialize(&bytes).ok())
    }

    fn read_list(tree: &sled::Tree, key: &str) -> Vec<String> {
        tree.get(key.as_bytes())
            .ok()
            .flatten()
            .and_then(|bytes| bincode::deserialize(&bytes).ok())
            .unwrap_or_default()
    }

    fn append_list(tree: &sled::Tree, key: &str, value: String) {
        let mut list = Self::read_list(tree, key);
        if !list.contains(&value) {
            list.push(value);
            if let Ok(bytes) = bincode::serialize(&list) {
                let _ = tree.insert(key.as_bytes(), bytes);
            }
        }
    }
}

impl SymbolStore for DiskSymbolStore {
    fn insert_function(&self, key: String, decl: DeclId) {
        let name = key.rsplit("::").next().unwrap_or(&key).to_string();
        Self::append_list(&self.function_lookup_tree, &name, key.clone());
        if let Ok(bytes) = bincode::serialize(&decl) {
            let _ = self.functions_tree.insert(key.as_bytes(), bytes);
        }
    }

    fn insert_method(&self, type_name: String, method_name: String, decl: DeclId) {
        Self::append_list(&self.method_lookup_tree, &method_name, type_name.clone());
        let key = Self::method_key(&type_name, &method_name);
        if let Ok(bytes) = bincode::serialize(&decl) {
            let _ = self.methods_tree.insert(key.as_bytes(), bytes);
        }
    }

    fn get_function(&self, key: &str) -> Option<DeclId> {
        Self::read_decl(&self.functions_tree, key)
    }

    fn get_method(&self, type_name: &str, method_name: &str) -> Option<DeclId> {
        Self::read_decl(&self.methods_tree, &Self::method_key(type_name, method_name))
    }

    fn find_methods_by_name(&self, method_name: &str) -> Vec<DeclId> {
        Self::read_list(&self.method_lookup_tree, method_name)
            .iter()
            .filter_map(|tn| self.get_method(tn, method_name))
            .collect()
    }

    fn find_functions_by_name(&self, name: &str) -> Vec<DeclId> {
        Self::read_list(&self.function_lookup_tree, name)
            .iter()
            .filter_map(|k| self.get_function(k))
            .collect()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn check_store(store: &dyn SymbolStore) {
        store.insert_function("app::run".to_string(), 0);
        store.insert_method("Router".to_string(), "dispatch".to_string(), 1);
        store.insert_method("Fallback".to_string(), "dispatch".to_string(), 2);

        assert_eq!(store.get_function("app::run"), Some(0));
        assert_eq!(store.get_function("app::missing"), None);
        assert_eq!(store.get_method("Router", "dispatch"), Some(1));

        let by_name = store.find_methods_by_name("dispatch");
        assert_eq!(by_name, vec![1, 2]);
        assert!(store.find_methods_by_name("absent").is_empty());

        assert_eq!(store.find_functions_by_name("run"), vec![0]);
    }

    #[test]
    fn test_memory_store_lookups() {
        check_store(&MemorySymbolStore::default());
    }

    #[test]
    fn test_disk_store_lookups() {
        let dir = tempdir().unwrap();
        let store = DiskSymbolStore::new(dir.path().to_str().unwrap()).unwrap();
        check_store(&store);
    }

    #[test]
    fn test_duplicate_inserts_keep_one_lookup_entry() {
        let store = MemorySymbolStore::default();
        store.insert_method("Router".to_string(), "dispatch".to_string(), 1);
        store.insert_method("Router".to_string(), "dispatch".to_string(), 1);
        assert_eq!(store.find_methods_by_name("dispatch").len(), 1);
    }
}
