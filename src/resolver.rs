//! Suite resolution
//!
//! Turns a flat selection of test/suite names into a runnable `Suite`
//! tree. Suite-to-suite references are validated to form a DAG before
//! any runtime object is materialized; the dependency graph is built
//! over interned names, never over live objects.

use std::collections::HashMap;

use tracing::debug;

use crate::catalog::Catalog;
use crate::common::{Error, Result};
use crate::suite::{Suite, Test};

/// Graph key for the synthetic root node. Spec names are validated
/// non-empty at load time, so this cannot collide.
const ROOT: &str = "";

/// Build a runnable suite from a list of test/suite names
///
/// The returned root suite holds the selection in the given order;
/// nested suites keep their spec-declared child order. Fails with
/// [`Error::UnknownName`] for a name in neither catalog and with
/// [`Error::CyclicDependency`] when suite references form a cycle.
pub fn build(selection: &[String], catalog: &Catalog) -> Result<Suite> {
    for name in selection {
        if !catalog.knows_name(name) {
            return Err(Error::UnknownName(name.clone()));
        }
    }

    check_cycles(selection, catalog)?;

    let mut root = Suite::root();
    for name in selection {
        if let Some(spec) = catalog.find_test(name) {
            debug!("adding test '{}' to the root suite", name);
            root.add_test(Test::from_spec(spec));
        } else if let Some(spec) = catalog.find_suite(name) {
            debug!("adding suite '{}' to the root suite", name);
            root.add_suite(materialize(spec.name.as_str(), catalog)?);
        }
    }
    Ok(root)
}

/// Validate that the suite references reachable from the selection form
/// a DAG
fn check_cycles(selection: &[String], catalog: &Catalog) -> Result<()> {
    debug!("checking for circular dependencies between suites");

    let selected_suites: Vec<String> = selection
        .iter()
        .filter(|n| catalog.find_suite(n).is_some())
        .cloned()
        .collect();

    let mut graph: HashMap<String, Vec<String>> = HashMap::new();
    graph.insert(ROOT.to_string(), selected_suites.clone());

    let mut pending = selected_suites;
    while let Some(name) = pending.pop() {
        if graph.contains_key(&name) {
            continue;
        }
        let spec = catalog
            .find_suite(&name)
            .ok_or_else(|| Error::UnknownName(name.clone()))?;
        if spec.suites.is_empty() {
            debug!("suite {} has no dependencies", name);
        } else {
            debug!("suite {} depends on {}", name, spec.suites.join(", "));
        }
        graph.insert(name, spec.suites.clone());
        pending.extend(spec.suites.iter().cloned());
    }

    topological_sort(graph).map(|_| ())
}

/// Topological sort over an adjacency map
///
/// Repeatedly removes nodes whose out-edges all point to already
/// removed nodes; a full pass removing nothing while nodes remain means
/// the graph contains a cycle.
fn topological_sort(mut graph: HashMap<String, Vec<String>>) -> Result<Vec<String>> {
    let mut sorted = Vec::with_capacity(graph.len());

    while !graph.is_empty() {
        let removable: Vec<String> = graph
            .iter()
            .filter(|(_, edges)| edges.iter().all(|e| !graph.contains_key(e.as_str())))
            .map(|(node, _)| node.clone())
            .collect();

        if removable.is_empty() {
            return Err(Error::CyclicDependency);
        }
        for node in removable {
            graph.remove(&node);
            sorted.push(node);
        }
    }

    Ok(sorted)
}

/// Materialize a suite and, recursively, its children
fn materialize(name: &str, catalog: &Catalog) -> Result<Suite> {
    let spec = catalog
        .find_suite(name)
        .ok_or_else(|| Error::UnknownName(name.to_string()))?;
    debug!("creating suite '{}'", spec.name);

    let mut suite = Suite::from_spec(spec);
    for test_name in &spec.tests {
        let test_spec = catalog
            .find_test(test_name)
            .ok_or_else(|| Error::UnknownName(test_name.clone()))?;
        suite.add_test(Test::from_spec(test_spec));
    }
    for suite_name in &spec.suites {
        suite.add_suite(materialize(suite_name, catalog)?);
    }
    Ok(suite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn graph(edges: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
        edges
            .iter()
            .map(|(node, deps)| {
                (
                    node.to_string(),
                    deps.iter().map(|d| d.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_topological_sort_accepts_dag() {
        let g = graph(&[("a", &["b"]), ("b", &["c"]), ("c", &[])]);
        let sorted = topological_sort(g).unwrap();
        assert_eq!(sorted, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_topological_sort_rejects_cycle() {
        let g = graph(&[("a", &["b"]), ("b", &["a"])]);
        assert!(matches!(
            topological_sort(g),
            Err(Error::CyclicDependency)
        ));
    }

    #[test]
    fn test_topological_sort_rejects_self_reference() {
        let g = graph(&[("a", &["a"])]);
        assert!(matches!(
            topological_sort(g),
            Err(Error::CyclicDependency)
        ));
    }

    #[test]
    fn test_topological_sort_ignores_edges_to_leaves() {
        // Edges to nodes absent from the map (tests) never block removal
        let g = graph(&[("a", &["leaf"])]);
        assert_eq!(topological_sort(g).unwrap(), vec!["a"]);
    }
}
