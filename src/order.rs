//! Processing order for declared modules.
//!
//! Every declared artifact becomes a node of a dependency tree hanging off a
//! sentinel root. A module required by another declared module is kept
//! strictly deeper than its dependent, so walking the tree from the deepest
//! level up to depth one yields an order in which each module comes after
//! every declared module it requires. Requirements on modules no artifact
//! declares are satisfied externally and never enter the tree.

use crate::entity::{Artifact, ArtifactSet, ModuleName};
use jarmod_common::tree::{NodeId, Tree, TreeError};
use log::{debug, warn};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while ordering artifacts.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Declared modules require each other in a loop.
    #[error("requires cycle detected: {}", join_chain(.chain))]
    Cycle {
        /// Module names along the cycle; the first name is repeated last.
        chain: Vec<ModuleName>,
    },

    /// A tree operation failed unexpectedly.
    #[error("dependency tree operation failed: {0}")]
    Tree(#[from] TreeError),
}

/// Result type alias using [`OrderError`].
pub type Result<T> = std::result::Result<T, OrderError>;

/// Returns the artifacts of `artifacts` in the order they must be processed.
///
/// # Examples
///
/// ```
/// use jarmod::entity::{Artifact, ArtifactSet, Module};
/// use jarmod::order::processing_order;
///
/// let artifacts = ArtifactSet::from_iter([
///     Artifact::new("a.jar", Module::new("a", None, Some(vec!["b".into()]))),
///     Artifact::new("b.jar", Module::named("b")),
/// ]);
///
/// let order: Vec<&str> = processing_order(&artifacts)?
///     .into_iter()
///     .map(|artifact| artifact.name())
///     .collect();
/// assert_eq!(order, vec!["b.jar", "a.jar"]);
/// # Ok::<(), jarmod::order::OrderError>(())
/// ```
///
/// # Errors
///
/// Returns [`OrderError::Cycle`] when declared modules require each other in
/// a loop, including a module that requires itself.
pub fn processing_order(artifacts: &ArtifactSet) -> Result<Vec<&Artifact>> {
    let mut dependencies = DependencyTree::default();

    for artifact in artifacts {
        let node = dependencies.node_for(artifact)?;
        dependencies.place_requirements(artifacts, node, artifact)?;
    }

    // A moved subtree can end up at or above a module it requires that lives
    // in another branch; repeat placement until nothing moves.
    let mut pass = 1;
    while dependencies.settle(artifacts)? {
        pass += 1;
        debug!("dependency tree settling pass {pass}");
    }

    Ok(dependencies.linearize())
}

struct DependencyTree<'a> {
    tree: Tree<Option<&'a Artifact>>,
    by_module: HashMap<&'a ModuleName, NodeId>,
}

impl Default for DependencyTree<'_> {
    fn default() -> Self {
        Self {
            tree: Tree::new(None),
            by_module: HashMap::new(),
        }
    }
}

impl<'a> DependencyTree<'a> {
    /// Returns the node of the module declared by `artifact`, creating it
    /// under the root when the module is not in the tree yet.
    fn node_for(&mut self, artifact: &'a Artifact) -> Result<NodeId> {
        if let Some(&node) = self.by_module.get(artifact.module_name()) {
            if let Some(Some(existing)) = self.tree.value(node) {
                if existing.name() != artifact.name() {
                    warn!(
                        "'{}' declares module '{}' already provided by '{}'; it will not be processed",
                        artifact.name(),
                        artifact.module_name(),
                        existing.name()
                    );
                }
            }
            return Ok(node);
        }
        let root = self.tree.root();
        self.insert(root, artifact)
    }

    fn insert(&mut self, parent: NodeId, artifact: &'a Artifact) -> Result<NodeId> {
        let node = self.tree.insert(parent, Some(artifact))?;
        self.by_module.insert(artifact.module_name(), node);
        Ok(node)
    }

    /// Places every declared module required by `artifact` beneath
    /// `dependent`. Returns true when an existing node was moved.
    fn place_requirements(
        &mut self,
        artifacts: &'a ArtifactSet,
        dependent: NodeId,
        artifact: &'a Artifact,
    ) -> Result<bool> {
        let mut moved = false;
        for required in artifact.module().required_modules() {
            let Some(provider) = artifacts.provider_of(required) else {
                debug!(
                    "module '{}' requires external module '{required}'",
                    artifact.module_name()
                );
                continue;
            };

            let Some(&required_node) = self.by_module.get(required) else {
                self.insert(dependent, provider)?;
                continue;
            };

            if required_node == dependent || self.tree.is_ancestor(required_node, dependent) {
                return Err(self.cycle(required_node, dependent));
            }

            let required_depth = self.depth(required_node)?;
            let dependent_depth = self.depth(dependent)?;
            if required_depth <= dependent_depth {
                debug!(
                    "moving module '{required}' beneath '{}' (depth {required_depth} -> {})",
                    artifact.module_name(),
                    dependent_depth + 1
                );
                self.tree.reattach(required_node, dependent)?;
                moved = true;
            }
        }
        Ok(moved)
    }

    /// Runs one placement pass over every artifact. Returns true when any
    /// node moved.
    fn settle(&mut self, artifacts: &'a ArtifactSet) -> Result<bool> {
        let mut moved = false;
        for artifact in artifacts {
            let node = self.node_for(artifact)?;
            moved |= self.place_requirements(artifacts, node, artifact)?;
        }
        Ok(moved)
    }

    fn depth(&self, node: NodeId) -> Result<usize> {
        self.tree
            .depth(node)
            .ok_or(OrderError::Tree(TreeError::ParentDetached(node)))
    }

    /// Builds the cycle error for `required` lying on the path to `dependent`.
    fn cycle(&self, required: NodeId, dependent: NodeId) -> OrderError {
        let path = self
            .tree
            .path_between(required, dependent)
            .unwrap_or_else(|| vec![dependent]);
        let mut chain: Vec<ModuleName> = path
            .into_iter()
            .filter_map(|node| self.module_name(node))
            .collect();
        if let Some(first) = self.module_name(required) {
            chain.push(first);
        }
        OrderError::Cycle { chain }
    }

    fn module_name(&self, node: NodeId) -> Option<ModuleName> {
        self.tree
            .value(node)
            .copied()
            .flatten()
            .map(|artifact| artifact.module_name().clone())
    }

    /// Emits artifacts from the deepest level up to depth one.
    fn linearize(&self) -> Vec<&'a Artifact> {
        (1..=self.tree.height())
            .rev()
            .flat_map(|depth| self.tree.nodes_at_depth(depth))
            .filter_map(|node| self.tree.value(node).copied().flatten())
            .collect()
    }
}

fn join_chain(chain: &[ModuleName]) -> String {
    chain
        .iter()
        .map(ModuleName::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Module;
    use rstest::rstest;

    fn artifact(module: &str, requires: &[&str]) -> Artifact {
        let requires = if requires.is_empty() {
            None
        } else {
            Some(requires.iter().map(|&name| ModuleName::from(name)).collect())
        };
        Artifact::new(format!("{module}.jar"), Module::new(module, None, requires))
    }

    fn order_of(artifacts: &ArtifactSet) -> Vec<String> {
        processing_order(artifacts)
            .expect("ordering should succeed")
            .into_iter()
            .map(|artifact| artifact.module_name().to_string())
            .collect()
    }

    fn position(order: &[String], module: &str) -> usize {
        order
            .iter()
            .position(|name| name == module)
            .unwrap_or_else(|| panic!("module {module} missing from {order:?}"))
    }

    #[rstest]
    #[case::dependent_first(&[("a", &["b"][..]), ("b", &[][..])])]
    #[case::dependency_first(&[("b", &[][..]), ("a", &["b"][..])])]
    fn required_module_precedes_dependent(#[case] declared: &[(&str, &[&str])]) {
        let artifacts: ArtifactSet = declared
            .iter()
            .map(|(module, requires)| artifact(module, requires))
            .collect();
        assert_eq!(order_of(&artifacts), vec!["b", "a"]);
    }

    #[test]
    fn chain_is_processed_from_the_bottom() {
        let artifacts = ArtifactSet::from_iter([
            artifact("a", &["b"]),
            artifact("c", &[]),
            artifact("b", &["c"]),
        ]);
        assert_eq!(order_of(&artifacts), vec!["c", "b", "a"]);
    }

    #[test]
    fn external_requirements_do_not_affect_order() {
        let artifacts = ArtifactSet::from_iter([
            artifact("x", &["java.sql"]),
            artifact("y", &["org.slf4j"]),
        ]);
        assert_eq!(order_of(&artifacts), vec!["x", "y"]);
    }

    #[test]
    fn moved_subtree_stays_behind_modules_required_from_another_branch() {
        // "a" requires "e", which sits deeper than "a" in another branch; "d"
        // then pulls "a" down beneath it, past "e".
        let artifacts = ArtifactSet::from_iter([
            artifact("x", &["y"]),
            artifact("y", &["e"]),
            artifact("a", &["e"]),
            artifact("e", &[]),
            artifact("d", &["a"]),
            artifact("f", &["d"]),
            artifact("g", &["f"]),
        ]);
        let order = order_of(&artifacts);
        for (module, required) in [
            ("x", "y"),
            ("y", "e"),
            ("a", "e"),
            ("d", "a"),
            ("f", "d"),
            ("g", "f"),
        ] {
            assert!(
                position(&order, required) < position(&order, module),
                "{required} must precede {module} in {order:?}"
            );
        }
    }

    #[test]
    fn diamond_requirements_are_ordered() {
        let artifacts = ArtifactSet::from_iter([
            artifact("top", &["left", "right"]),
            artifact("left", &["base"]),
            artifact("right", &["base"]),
            artifact("base", &[]),
        ]);
        let order = order_of(&artifacts);
        assert_eq!(order.first().map(String::as_str), Some("base"));
        assert_eq!(order.last().map(String::as_str), Some("top"));
        assert_eq!(order.len(), 4);
    }

    #[rstest]
    #[case::two_modules(&[("a", &["b"][..]), ("b", &["a"][..])], "a -> b -> a")]
    #[case::self_requires(&[("a", &["a"][..])], "a -> a")]
    #[case::three_modules(
        &[("a", &["b"][..]), ("b", &["c"][..]), ("c", &["a"][..])],
        "a -> b -> c -> a"
    )]
    fn cycles_fail_fast(#[case] declared: &[(&str, &[&str])], #[case] expected: &str) {
        let artifacts: ArtifactSet = declared
            .iter()
            .map(|(module, requires)| artifact(module, requires))
            .collect();
        let err = processing_order(&artifacts).expect_err("cycle should be rejected");
        assert!(matches!(err, OrderError::Cycle { .. }));
        assert_eq!(err.to_string(), format!("requires cycle detected: {expected}"));
    }

    #[test]
    fn shared_module_name_is_scheduled_once() {
        let artifacts = ArtifactSet::from_iter([
            Artifact::new("one.jar", Module::named("dup")),
            Artifact::new("two.jar", Module::named("dup")),
        ]);
        let order = processing_order(&artifacts).expect("ordering should succeed");
        let names: Vec<&str> = order.iter().map(|artifact| artifact.name()).collect();
        assert_eq!(names, vec!["one.jar"]);
    }
}
