use crate::Target;
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};

/// Maps field names to the targets that receive their parts.
///
/// A name may have several targets; each part with that name is delivered to
/// all of them in registration order. Parts whose name has no target are
/// discarded by the parser.
#[derive(Default)]
pub struct TargetRegistry {
    index: HashMap<String, usize>,
    entries: Vec<Vec<Box<dyn Target>>>,
}

/// Identifies the targets resolved for one part: the first `count` targets
/// of a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Resolved {
    entry: usize,
    count: usize,
}

impl TargetRegistry {
    /// Creates an empty registry.
    pub fn new() -> TargetRegistry {
        TargetRegistry::default()
    }

    /// Appends `target` to the targets of `name`.
    pub fn register<N, T>(&mut self, name: N, target: T) -> &mut Self
    where
        N: Into<String>,
        T: Target + 'static,
    {
        let next = self.entries.len();
        let entry = *self.index.entry(name.into()).or_insert(next);
        if entry == next {
            self.entries.push(Vec::new());
        }
        self.entries[entry].push(Box::new(target));
        self
    }

    /// Builder form of [`register`](TargetRegistry::register).
    pub fn with<N, T>(mut self, name: N, target: T) -> Self
    where
        N: Into<String>,
        T: Target + 'static,
    {
        self.register(name, target);
        self
    }

    /// The targets registered for `name`, in registration order. Empty if
    /// there are none.
    pub fn resolve(&mut self, name: &str) -> &mut [Box<dyn Target>] {
        match self.index.get(name) {
            Some(&entry) => self.entries[entry].as_mut_slice(),
            None => &mut [],
        }
    }

    /// Whether at least one target is registered for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// The registered field names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    /// Number of registered field names.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Pins the targets currently registered for `name`, so that targets
    /// registered later don't join a part halfway through.
    pub(crate) fn lookup(&self, name: &str) -> Option<Resolved> {
        self.index.get(name).map(|&entry| Resolved {
            entry,
            count: self.entries[entry].len(),
        })
    }

    pub(crate) fn targets_mut(&mut self, resolved: Resolved) -> &mut [Box<dyn Target>] {
        &mut self.entries[resolved.entry][..resolved.count]
    }
}

impl Debug for TargetRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, &entry) in &self.index {
            map.entry(name, &self.entries[entry].len());
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NullTarget, ValueTarget};

    #[test]
    fn test_register_and_resolve() {
        let mut registry = TargetRegistry::new();
        registry.register("a", NullTarget::new()).register("a", ValueTarget::new());
        registry.register("b", NullTarget::new());

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.resolve("a").len(), 2);
        assert_eq!(registry.resolve("b").len(), 1);
        assert!(registry.resolve("c").is_empty());
        assert!(registry.contains("a"));
        assert!(!registry.contains("c"));
    }

    #[test]
    fn test_fan_out_order() {
        let first = ValueTarget::new();
        let second = ValueTarget::new();
        let mut registry = TargetRegistry::new().with("f", first.clone()).with("f", second.clone());

        for (i, target) in registry.resolve("f").iter_mut().enumerate() {
            target.on_data(format!("{}", i).as_bytes()).unwrap();
        }

        assert_eq!(first.value(), "0");
        assert_eq!(second.value(), "1");
    }

    #[test]
    fn test_lookup_pins_count() {
        let mut registry = TargetRegistry::new().with("f", NullTarget::new());
        let resolved = registry.lookup("f").unwrap();
        registry.register("f", NullTarget::new());

        assert_eq!(registry.targets_mut(resolved).len(), 1);
        assert_eq!(registry.lookup("f").unwrap().count, 2);
        assert_eq!(registry.lookup("g"), None);
    }
}
