//! Module and artifact declarations.
//!
//! An [`Artifact`] pairs an archive file name with the [`Module`] it should
//! become. Artifacts are identified by archive name alone, so an
//! [`ArtifactSet`] keeps the first declaration of each name and drops later
//! ones.

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Logical module identifier, e.g. `com.example.core`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct ModuleName(String);

impl ModuleName {
    /// Create a new module name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the module name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ModuleName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModuleName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ModuleName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Desired module declaration for one archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    name: ModuleName,
    exports: Option<Vec<String>>,
    requires: Option<Vec<ModuleName>>,
}

impl Module {
    /// Creates a module declaration.
    ///
    /// Repeated entries in `exports` or `requires` are dropped, keeping the
    /// first occurrence, so each list behaves as an ordered set.
    ///
    /// # Examples
    ///
    /// ```
    /// use jarmod::entity::{Module, ModuleName};
    ///
    /// let module = Module::new(
    ///     "app",
    ///     Some(vec!["com.app".to_owned(), "com.app".to_owned()]),
    ///     Some(vec![ModuleName::from("lib")]),
    /// );
    /// assert_eq!(module.exports(), Some(&["com.app".to_owned()][..]));
    /// ```
    #[must_use]
    pub fn new(
        name: impl Into<ModuleName>,
        exports: Option<Vec<String>>,
        requires: Option<Vec<ModuleName>>,
    ) -> Self {
        Self {
            name: name.into(),
            exports: exports.map(dedup_in_order),
            requires: requires.map(dedup_in_order),
        }
    }

    /// Creates a module with no explicit exports or requires.
    #[must_use]
    pub fn named(name: impl Into<ModuleName>) -> Self {
        Self::new(name, None, None)
    }

    /// Returns the module name.
    #[must_use]
    pub fn name(&self) -> &ModuleName {
        &self.name
    }

    /// Returns the explicit export list; `None` means derive it from the
    /// archive contents.
    #[must_use]
    pub fn exports(&self) -> Option<&[String]> {
        self.exports.as_deref()
    }

    /// Returns the explicit requires list, if any.
    #[must_use]
    pub fn requires(&self) -> Option<&[ModuleName]> {
        self.requires.as_deref()
    }

    /// Iterates over required module names; empty when none were declared.
    pub fn required_modules(&self) -> impl Iterator<Item = &ModuleName> {
        self.requires.iter().flatten()
    }
}

/// An archive file name together with the module it should carry.
///
/// Equality and hashing consider the archive name only.
#[derive(Debug, Clone)]
pub struct Artifact {
    name: String,
    module: Module,
}

impl Artifact {
    /// Creates an artifact for the archive called `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, module: Module) -> Self {
        Self {
            name: name.into(),
            module,
        }
    }

    /// Returns the archive file name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the desired module declaration.
    #[must_use]
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Returns the name of the declared module.
    #[must_use]
    pub fn module_name(&self) -> &ModuleName {
        self.module.name()
    }
}

impl PartialEq for Artifact {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Artifact {}

impl Hash for Artifact {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Insertion-ordered set of artifacts, unique by archive name.
///
/// When two artifacts share an archive name the first one wins.
///
/// # Examples
///
/// ```
/// use jarmod::entity::{Artifact, ArtifactSet, Module};
///
/// let set = ArtifactSet::from_iter([
///     Artifact::new("a.jar", Module::named("first")),
///     Artifact::new("a.jar", Module::named("second")),
/// ]);
///
/// assert_eq!(set.len(), 1);
/// assert_eq!(set.duplicates(), 1);
/// assert_eq!(set.iter().next().map(|a| a.module_name().as_str()), Some("first"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ArtifactSet {
    artifacts: Vec<Artifact>,
    positions: HashMap<String, usize>,
    duplicates: usize,
}

impl ArtifactSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `artifact` unless one with the same archive name is present.
    ///
    /// Returns `true` when the artifact was added.
    pub fn insert(&mut self, artifact: Artifact) -> bool {
        if self.positions.contains_key(artifact.name()) {
            self.duplicates += 1;
            return false;
        }
        self.positions
            .insert(artifact.name().to_owned(), self.artifacts.len());
        self.artifacts.push(artifact);
        true
    }

    /// Returns the number of distinct artifacts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Returns true when no artifact was declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Returns how many declarations were dropped as duplicates.
    #[must_use]
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Iterates over the artifacts in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Artifact> {
        self.artifacts.iter()
    }

    /// Returns the artifact with the given archive name.
    #[must_use]
    pub fn get(&self, archive_name: &str) -> Option<&Artifact> {
        self.positions
            .get(archive_name)
            .and_then(|&position| self.artifacts.get(position))
    }

    /// Returns the first artifact, in declaration order, that declares
    /// `module`.
    #[must_use]
    pub fn provider_of(&self, module: &ModuleName) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.module_name() == module)
    }
}

impl FromIterator<Artifact> for ArtifactSet {
    fn from_iter<I: IntoIterator<Item = Artifact>>(iter: I) -> Self {
        let mut set = Self::new();
        for artifact in iter {
            set.insert(artifact);
        }
        set
    }
}

impl<'a> IntoIterator for &'a ArtifactSet {
    type Item = &'a Artifact;
    type IntoIter = std::slice::Iter<'a, Artifact>;

    fn into_iter(self) -> Self::IntoIter {
        self.artifacts.iter()
    }
}

fn dedup_in_order<T>(items: Vec<T>) -> Vec<T>
where
    T: Eq + Hash + Clone,
{
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(artifact: &Artifact) -> u64 {
        let mut hasher = DefaultHasher::new();
        artifact.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn artifacts_are_identified_by_archive_name() {
        let first = Artifact::new("lib.jar", Module::named("one"));
        let second = Artifact::new("lib.jar", Module::named("two"));
        assert_eq!(first, second);
        assert_eq!(hash_of(&first), hash_of(&second));
    }

    #[test]
    fn artifacts_with_same_module_but_other_archive_differ() {
        let first = Artifact::new("a.jar", Module::named("same"));
        let second = Artifact::new("b.jar", Module::named("same"));
        assert_ne!(first, second);
    }

    #[test]
    fn first_declaration_wins() {
        let mut set = ArtifactSet::new();
        assert!(set.insert(Artifact::new("a.jar", Module::named("first"))));
        assert!(!set.insert(Artifact::new("a.jar", Module::named("second"))));

        let kept = set.get("a.jar").expect("artifact should be present");
        assert_eq!(kept.module_name().as_str(), "first");
        assert_eq!(set.duplicates(), 1);
    }

    #[test]
    fn large_sets_keep_order_and_lookups() {
        let names: Vec<String> = (0..2_000).rev().map(|n| format!("lib-{n}.jar")).collect();
        let set: ArtifactSet = names
            .iter()
            .chain(names.iter().take(500))
            .map(|name| Artifact::new(name.clone(), Module::named("m")))
            .collect();

        assert_eq!(set.len(), 2_000);
        assert_eq!(set.duplicates(), 500);
        assert!(set.iter().map(Artifact::name).eq(names.iter().map(String::as_str)));
        assert_eq!(set.get("lib-0.jar").map(Artifact::name), Some("lib-0.jar"));
        assert!(set.get("lib-2000.jar").is_none());
    }

    #[rstest]
    #[case::declared("core", Some("core.jar"))]
    #[case::external("java.sql", None)]
    fn provider_of_only_finds_declared_modules(
        #[case] module: &str,
        #[case] expected: Option<&str>,
    ) {
        let set = ArtifactSet::from_iter([
            Artifact::new("core.jar", Module::named("core")),
            Artifact::new("app.jar", Module::named("app")),
        ]);
        let provider = set.provider_of(&ModuleName::from(module));
        assert_eq!(provider.map(Artifact::name), expected);
    }

    #[test]
    fn requires_are_deduplicated_in_order() {
        let module = Module::new(
            "app",
            None,
            Some(vec!["b".into(), "a".into(), "b".into()]),
        );
        let required: Vec<&str> = module.required_modules().map(ModuleName::as_str).collect();
        assert_eq!(required, vec!["b", "a"]);
        assert!(module.exports().is_none());
    }

    #[test]
    fn module_without_requires_yields_nothing() {
        assert_eq!(Module::named("solo").required_modules().count(), 0);
    }
}
