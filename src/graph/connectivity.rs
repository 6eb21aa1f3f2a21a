use std::collections::{BTreeSet, HashSet};

use petgraph::{
    graphmap::UnGraphMap,
    visit::{Bfs, NodeFiltered},
};
use tracing::instrument;

use crate::{domain::Xref, storage::Document};

/// Finds the individuals that cannot be reached from `root` through
/// spouse and parent/child links.
///
/// Media-only placeholder records are not people: they are never reported and
/// never used as stepping stones. If `root` is itself unknown or a placeholder,
/// every other individual is reported.
#[instrument(level = "debug", skip(doc))]
#[must_use]
pub fn find_disconnected(doc: &Document, root: &str) -> BTreeSet<Xref> {
    let candidates: Vec<&Xref> = doc
        .iter_individuals()
        .map(|(xref, _)| xref)
        .filter(|xref| !doc.is_placeholder(xref))
        .collect();
    let people: HashSet<&str> = candidates.iter().map(|xref| xref.as_str()).collect();

    let families: Vec<_> = doc.families().map(|(_, family)| family).collect();
    let mut graph = UnGraphMap::<&str, ()>::new();
    graph.add_node(root);
    for family in &families {
        if let (Some(husband), Some(wife)) = (&family.husband, &family.wife) {
            graph.add_edge(husband.as_str(), wife.as_str(), ());
        }
        for spouse in family.spouses() {
            for child in &family.children {
                graph.add_edge(spouse.as_str(), child.as_str(), ());
            }
        }
    }

    let mut reached = HashSet::new();
    if people.contains(root) {
        let filtered = NodeFiltered::from_fn(&graph, |node: &str| people.contains(node));
        let mut bfs = Bfs::new(&filtered, root);
        while let Some(node) = bfs.next(&filtered) {
            reached.insert(node);
        }
    }

    let disconnected: BTreeSet<Xref> = candidates
        .into_iter()
        .filter(|xref| !reached.contains(xref.as_str()))
        .cloned()
        .collect();
    tracing::debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "{} individuals not connected to {root}",
        disconnected.len()
    );
    disconnected
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE: &str = "\
0 @I1@ INDI
1 NAME Root /Person/
1 FAMC @F1@
0 @I2@ INDI
1 NAME Father /Person/
1 FAMS @F1@
0 @I3@ INDI
1 NAME Mother /Person/
1 FAMS @F1@
0 @I4@ INDI
1 NAME Sibling /Person/
1 FAMC @F1@
0 @I5@ INDI
1 NAME Island /One/
1 FAMS @F2@
0 @I6@ INDI
1 NAME Island /Two/
1 FAMS @F2@
0 @I7@ INDI
1 NAME Lone /Wolf/
0 @I99@ INDI
1 OBJE
2 FILE unassociated.jpg
0 @F1@ FAM
1 HUSB @I2@
1 WIFE @I3@
1 CHIL @I4@
1 CHIL @I1@
0 @F2@ FAM
1 HUSB @I5@
1 WIFE @I6@
0 TRLR";

    fn xrefs(items: &[&str]) -> BTreeSet<Xref> {
        items.iter().map(|s| Xref::new(*s).unwrap()).collect()
    }

    #[test]
    fn reports_islands_but_not_placeholders() {
        let doc = Document::parse(FILE);
        assert_eq!(
            find_disconnected(&doc, "@I1@"),
            xrefs(&["@I5@", "@I6@", "@I7@"])
        );
    }

    #[test]
    fn reachability_is_symmetric_within_a_family() {
        let doc = Document::parse(FILE);
        assert_eq!(
            find_disconnected(&doc, "@I5@"),
            xrefs(&["@I1@", "@I2@", "@I3@", "@I4@", "@I7@"])
        );
    }

    #[test]
    fn placeholder_root_reaches_nobody() {
        let doc = Document::parse(FILE);
        assert_eq!(find_disconnected(&doc, "@I99@").len(), 7);
    }

    #[test]
    fn unknown_root_reaches_nobody() {
        let doc = Document::parse(FILE);
        assert_eq!(find_disconnected(&doc, "@I404@").len(), 7);
    }

    #[test]
    fn single_person_is_connected_to_itself() {
        let doc = Document::parse("0 @I1@ INDI\n1 NAME Solo\n0 TRLR");
        assert!(find_disconnected(&doc, "@I1@").is_empty());
    }
}
