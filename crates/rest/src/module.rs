//! Grouping of resources under aliases.

use crate::{ModuleError, Resource};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::ControlFlow;
use std::sync::{Arc, PoisonError, RwLock};

/// A named collection of resources, mounted at once under a top-level alias.
///
/// Resources are visited in alias order.
#[derive(Default)]
pub struct Module {
    resources: RwLock<BTreeMap<String, Arc<dyn Resource>>>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `resource` available under `alias`.
    ///
    /// Fails without touching the module when the alias is taken.
    pub fn register<R: Resource>(&self, alias: impl Into<String>, resource: R) -> Result<(), ModuleError> {
        self.register_shared(alias, Arc::new(resource))
    }

    pub fn register_shared(&self, alias: impl Into<String>, resource: Arc<dyn Resource>) -> Result<(), ModuleError> {
        let alias = alias.into();
        let mut resources = self.resources.write().unwrap_or_else(PoisonError::into_inner);
        if resources.contains_key(&alias) {
            return Err(ModuleError::AlreadyRegistered(alias));
        }
        resources.insert(alias, resource);
        Ok(())
    }

    /// Removes the resource registered under `alias`.
    pub fn unregister(&self, alias: &str) -> Result<Arc<dyn Resource>, ModuleError> {
        let mut resources = self.resources.write().unwrap_or_else(PoisonError::into_inner);
        resources.remove(alias).ok_or_else(|| ModuleError::NotRegistered(alias.to_owned()))
    }

    /// Calls `f` for every resource until it breaks.
    ///
    /// The module is locked for the whole traversal, `f` must not register or
    /// unregister resources of this module.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&str, &Arc<dyn Resource>) -> ControlFlow<()>,
    {
        let resources = self.resources.write().unwrap_or_else(PoisonError::into_inner);
        for (alias, resource) in resources.iter() {
            if f(alias, resource).is_break() {
                break;
            }
        }
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.resources.read().unwrap_or_else(PoisonError::into_inner).contains_key(alias)
    }

    pub fn len(&self) -> usize {
        self.resources.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let resources = self.resources.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Module").field("resources", &resources.keys().collect::<Vec<_>>()).finish()
    }
}

/// Modules registered by top-level alias, used to assemble an application from
/// independent feature modules before mounting them all.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: RwLock<BTreeMap<String, Arc<Module>>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `module` available under `alias`, a taken alias is a configuration mistake.
    pub fn register(&self, alias: impl Into<String>, module: Arc<Module>) -> Result<(), ModuleError> {
        let alias = alias.into();
        let mut modules = self.modules.write().unwrap_or_else(PoisonError::into_inner);
        if modules.contains_key(&alias) {
            return Err(ModuleError::AlreadyRegistered(alias));
        }
        modules.insert(alias, module);
        Ok(())
    }

    pub fn get(&self, alias: &str) -> Option<Arc<Module>> {
        self.modules.read().unwrap_or_else(PoisonError::into_inner).get(alias).cloned()
    }

    /// Calls `f` for every module until it breaks.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&str, &Arc<Module>) -> ControlFlow<()>,
    {
        let modules = self.modules.write().unwrap_or_else(PoisonError::into_inner);
        for (alias, module) in modules.iter() {
            if f(alias, module).is_break() {
                break;
            }
        }
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modules = self.modules.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_map().entries(modules.iter()).finish()
    }
}
