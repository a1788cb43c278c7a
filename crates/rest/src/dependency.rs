use crate::DependencyError;
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Values that resources can pick up when they are mounted, keyed by type.
#[derive(Clone, Default)]
pub struct Dependencies {
    values: HashMap<TypeId, (&'static str, Arc<dyn Any + Send + Sync>)>,
}

impl Dependencies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `value` available by its type, replacing a previous value of that type.
    pub fn provide<T: Send + Sync + 'static>(&mut self, value: T) {
        self.provide_shared(Arc::new(value));
    }

    pub fn provide_shared<T: Send + Sync + 'static>(&mut self, value: Arc<T>) {
        let value: Arc<dyn Any + Send + Sync> = value;
        self.values.insert(TypeId::of::<T>(), (type_name::<T>(), value));
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, DependencyError> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|(_, value)| Arc::clone(value).downcast::<T>().ok())
            .ok_or_else(DependencyError::missing::<T>)
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<T>())
    }
}

impl fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.values().map(|(name, _)| name)).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Dependencies;
    use crate::DependencyError;

    #[derive(Debug, PartialEq)]
    struct Database(&'static str);

    #[test]
    fn provided_value_is_found_by_type() {
        let mut deps = Dependencies::new();
        deps.provide(Database("postgres"));
        deps.provide(42_u32);

        assert!(deps.contains::<Database>());
        assert_eq!(*deps.get::<Database>().unwrap(), Database("postgres"));
        assert_eq!(*deps.get::<u32>().unwrap(), 42);
    }

    #[test]
    fn later_value_replaces_earlier_one() {
        let mut deps = Dependencies::new();
        deps.provide(Database("sqlite"));
        deps.provide(Database("postgres"));
        assert_eq!(*deps.get::<Database>().unwrap(), Database("postgres"));
    }

    #[test]
    fn missing_value_names_the_type() {
        let deps = Dependencies::new();
        let error = deps.get::<Database>().unwrap_err();
        assert!(matches!(error, DependencyError::Missing { type_name } if type_name.ends_with("Database")));
    }
}
