//! Generation-based identifiers.
//!
//! Ancestors of the root get a dense band starting at 0, in generation order.
//! Everyone else reachable through an ancestor's families is numbered from the
//! next round thousand, generation by generation (children of the root first,
//! then the root's own generation, then older ones). A configured group can be
//! pinned to a band of its own.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::instrument;

use crate::{
    domain::{FixedBand, Xref},
    storage::Document,
};

/// Assigned identifiers, keyed by cross-reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IdMap {
    ids: BTreeMap<Xref, u32>,
}

impl IdMap {
    /// The identifier assigned to a cross-reference.
    #[must_use]
    pub fn get(&self, xref: &str) -> Option<u32> {
        self.ids.get(xref).copied()
    }

    /// The identifier assigned to the individual named by a bare number
    /// (`"123"` for `@I123@`).
    #[must_use]
    pub fn get_numeric(&self, doc: &Document, number: &str) -> Option<u32> {
        doc.resolve_individual(number)
            .and_then(|xref| self.get(xref))
    }

    /// Whether the cross-reference has an identifier.
    #[must_use]
    pub fn contains(&self, xref: &str) -> bool {
        self.ids.contains_key(xref)
    }

    /// Number of assigned identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing has been assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// All assignments, in increasing identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&Xref, u32)> {
        let mut entries: Vec<_> = self.ids.iter().map(|(xref, &id)| (xref, id)).collect();
        entries.sort_by_key(|&(_, id)| id);
        entries.into_iter()
    }

    fn insert(&mut self, xref: Xref, id: u32) {
        self.ids.insert(xref, id);
    }

    fn used(&self) -> HashSet<u32> {
        self.ids.values().copied().collect()
    }
}

/// The root's ancestors, one generation per layer.
///
/// Layer 0 is the root. Each following layer holds the parents (father first)
/// of the previous layer's members, left to right. An individual reachable
/// along several paths is placed only in the first layer that reaches it.
#[must_use]
pub fn ancestor_layers(doc: &Document, root: &Xref) -> Vec<Vec<Xref>> {
    let mut layers = Vec::new();
    let mut visited = HashSet::new();
    let mut current = vec![root.clone()];
    loop {
        let layer: Vec<Xref> = current
            .into_iter()
            .filter(|xref| visited.insert(xref.clone()))
            .collect();
        if layer.is_empty() {
            break;
        }
        current = layer.iter().flat_map(|xref| doc.parents_of(xref)).collect();
        layers.push(layer);
    }
    layers
}

/// Non-ancestors grouped by generation relative to the root (`-1` for the
/// root's children, `0` for the root's generation, ...).
#[derive(Debug, Default)]
struct Buckets {
    generations: BTreeMap<i64, Vec<Xref>>,
    placed: HashSet<Xref>,
}

impl Buckets {
    fn populate(doc: &Document, layers: &[Vec<Xref>]) -> Self {
        let ancestors: HashSet<&Xref> = layers.iter().flatten().collect();
        let mut buckets = Self::default();
        for (generation, layer) in (0_i64..).zip(layers) {
            for ancestor in layer {
                for family in doc.spouse_families(ancestor) {
                    if let Some(spouse) = family.spouse_of(ancestor) {
                        buckets.place(generation, spouse, &ancestors);
                    }
                    for child in &family.children {
                        buckets.place(generation - 1, child, &ancestors);
                    }
                }
            }
        }
        buckets
    }

    /// Adds `xref` to a generation unless it is an ancestor or already placed.
    fn place(&mut self, generation: i64, xref: &Xref, ancestors: &HashSet<&Xref>) {
        if ancestors.contains(xref) || !self.placed.insert(xref.clone()) {
            return;
        }
        self.generations.entry(generation).or_default().push(xref.clone());
    }

    fn order(&mut self, doc: &Document, root: &Xref, parents: Option<(&Xref, &Xref)>) {
        for (&generation, members) in &mut self.generations {
            match generation {
                -1 => *members = root_children(doc, root, members),
                0 => *members = root_generation(doc, root, parents, members),
                _ => sort_by_birth(doc, members),
            }
        }
    }
}

/// Children from the root's own families, oldest first.
fn root_children(doc: &Document, root: &Xref, members: &[Xref]) -> Vec<Xref> {
    let mut children = Vec::new();
    for family in doc.spouse_families(root) {
        for child in family.children {
            if members.contains(&child) && !children.contains(&child) {
                children.push(child);
            }
        }
    }
    sort_by_birth(doc, &mut children);
    children
}

/// The root's spouses, then full siblings oldest first, then everyone else in
/// the order they were found.
fn root_generation(
    doc: &Document,
    root: &Xref,
    parents: Option<(&Xref, &Xref)>,
    members: &[Xref],
) -> Vec<Xref> {
    let mut order: Vec<Xref> = Vec::with_capacity(members.len());
    for family in doc.spouse_families(root) {
        if let Some(spouse) = family.spouse_of(root) {
            if members.contains(spouse) && !order.contains(spouse) {
                order.push(spouse.clone());
            }
        }
    }

    if let Some((father, mother)) = parents {
        let mut siblings = Vec::new();
        if let Some(family) = doc
            .spouse_families(father)
            .find(|family| family.is_couple(father, mother))
        {
            for child in family.children {
                let eligible = child != *root && members.contains(&child);
                if eligible && !order.contains(&child) && !siblings.contains(&child) {
                    siblings.push(child);
                }
            }
        }
        sort_by_birth(doc, &mut siblings);
        order.extend(siblings);
    }

    for member in members {
        if !order.contains(member) {
            order.push(member.clone());
        }
    }
    order
}

/// Stable sort, oldest birth first, unknown dates last.
fn sort_by_birth(doc: &Document, members: &mut [Xref]) {
    members.sort_by_cached_key(|xref| doc.birth_key(xref));
}

/// The next identifier at or after `*next` that is not in `used`, or `None`
/// once the identifier range is exhausted.
fn claim(next: &mut Option<u32>, used: &mut HashSet<u32>) -> Option<u32> {
    let mut id = (*next)?;
    while used.contains(&id) {
        id = id.checked_add(1)?;
    }
    used.insert(id);
    *next = id.checked_add(1);
    Some(id)
}

fn number(ids: &mut IdMap, member: &Xref, next: &mut Option<u32>, used: &mut HashSet<u32>) {
    let Some(id) = claim(next, used) else {
        tracing::warn!("No identifier left for {member}");
        return;
    };
    ids.insert(member.clone(), id);
}

/// Assigns identifiers relative to `root`.
///
/// The result is deterministic for a given document, root and band. Every
/// identifier is unique, and every ancestor's identifier is lower than every
/// other identifier outside the fixed band. Individuals that are neither
/// ancestors nor in an ancestor's families get no identifier.
#[instrument(level = "debug", skip(doc, band))]
#[must_use]
pub fn assign_ids(doc: &Document, root: &Xref, band: &FixedBand) -> IdMap {
    let layers = ancestor_layers(doc, root);
    let mut ids = IdMap::default();
    let mut next = 0;
    for ancestor in layers.iter().flatten() {
        ids.insert(ancestor.clone(), next);
        next += 1;
    }
    let start = if next == 0 {
        1000
    } else {
        ((next - 1) / 1000 + 1) * 1000
    };
    tracing::debug!(
        generations = layers.len(),
        ancestors = ids.len(),
        "Numbering others from {start}"
    );

    let parents = layers
        .get(1)
        .and_then(|layer| match layer.as_slice() {
            [father, mother, ..] => Some((father, mother)),
            _ => None,
        });
    let mut buckets = Buckets::populate(doc, &layers);
    buckets.order(doc, root, parents);

    let mut used = ids.used();
    let mut next = Some(start);
    for (generation, members) in &buckets.generations {
        tracing::trace!(generation, members = members.len(), "Numbering generation");
        for member in members {
            if !ids.contains(member) {
                number(&mut ids, member, &mut next, &mut used);
            }
        }
    }

    let mut next = Some(band.start);
    for member in &band.members {
        if doc.contains_individual(member) && !ids.contains(member) {
            number(&mut ids, member, &mut next, &mut used);
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    // Root @I1@ (born 1890) with parents @I2@ and @I3@; paternal grandparents
    // @I4@ and @I5@ with another son @I11@; full siblings @I6@ and @I7@; a
    // half-sibling @I13@ by the father's second wife @I12@; a spouse @I8@ and
    // two children (@I9@ born 1920 listed before @I10@ born 1915).
    const FILE: &str = "\
0 HEAD
0 @I1@ INDI
1 NAME Root /Person/
1 BIRT
2 DATE 1890
1 FAMC @F1@
1 FAMS @F3@
0 @I2@ INDI
1 NAME Father /Person/
1 FAMC @F2@
1 FAMS @F1@
1 FAMS @F4@
0 @I3@ INDI
1 NAME Mother /Person/
1 FAMS @F1@
0 @I4@ INDI
1 NAME Grandfather /Person/
1 FAMS @F2@
0 @I5@ INDI
1 NAME Grandmother /Person/
1 FAMS @F2@
0 @I6@ INDI
1 NAME Younger /Person/
1 BIRT
2 DATE 1894
1 FAMC @F1@
0 @I7@ INDI
1 NAME Elder /Person/
1 BIRT
2 DATE 1888
1 FAMC @F1@
0 @I8@ INDI
1 NAME Spouse /Other/
1 FAMS @F3@
0 @I9@ INDI
1 NAME Later /Person/
1 BIRT
2 DATE 1920
1 FAMC @F3@
0 @I10@ INDI
1 NAME Earlier /Person/
1 BIRT
2 DATE 1915
1 FAMC @F3@
0 @I11@ INDI
1 NAME Uncle /Person/
1 BIRT
2 DATE 1860
1 FAMC @F2@
0 @I12@ INDI
1 NAME Stepmother /Other/
1 FAMS @F4@
0 @I13@ INDI
1 NAME Half /Person/
1 FAMC @F4@
0 @I50@ INDI
1 NAME Unrelated /Stranger/
0 @I99@ INDI
1 OBJE
2 FILE photo.jpg
0 @F1@ FAM
1 HUSB @I2@
1 WIFE @I3@
1 CHIL @I1@
1 CHIL @I6@
1 CHIL @I7@
0 @F2@ FAM
1 HUSB @I4@
1 WIFE @I5@
1 CHIL @I2@
1 CHIL @I11@
0 @F3@ FAM
1 HUSB @I1@
1 WIFE @I8@
1 CHIL @I9@
1 CHIL @I10@
0 @F4@ FAM
1 HUSB @I2@
1 WIFE @I12@
1 CHIL @I13@
0 TRLR";

    fn xref(s: &str) -> Xref {
        Xref::new(s).unwrap()
    }

    fn root() -> Xref {
        xref("@I1@")
    }

    #[test]
    fn layers_follow_fathers_first() {
        let doc = Document::parse(FILE);
        let layers = ancestor_layers(&doc, &root());
        assert_eq!(
            layers,
            vec![
                vec![xref("@I1@")],
                vec![xref("@I2@"), xref("@I3@")],
                vec![xref("@I4@"), xref("@I5@")],
            ]
        );
    }

    #[test]
    fn ancestors_are_numbered_densely() {
        let doc = Document::parse(FILE);
        let ids = assign_ids(&doc, &root(), &FixedBand::default());
        for (n, expected) in ["@I1@", "@I2@", "@I3@", "@I4@", "@I5@"].iter().zip(0..) {
            assert_eq!(ids.get(n), Some(expected), "{n}");
        }
    }

    #[test]
    fn others_numbered_by_generation() {
        let doc = Document::parse(FILE);
        let ids = assign_ids(&doc, &root(), &FixedBand::default());
        let expected = [
            // children of the root, oldest first
            ("@I10@", 1000),
            ("@I9@", 1001),
            // spouse, full siblings oldest first, then the half-sibling
            ("@I8@", 1002),
            ("@I7@", 1003),
            ("@I6@", 1004),
            ("@I13@", 1005),
            // the parents' generation
            ("@I11@", 1006),
            ("@I12@", 1007),
        ];
        for (n, id) in expected {
            assert_eq!(ids.get(n), Some(id), "{n}");
        }
        assert_eq!(ids.len(), 13);
        assert!(!ids.contains("@I50@"));
        assert!(!ids.contains("@I99@"));
    }

    #[test]
    fn numbering_is_deterministic() {
        let doc = Document::parse(FILE);
        let first = assign_ids(&doc, &root(), &FixedBand::default());
        let second = assign_ids(&doc, &root(), &FixedBand::default());
        assert_eq!(first, second);
    }

    #[test]
    fn identifiers_are_unique() {
        let doc = Document::parse(FILE);
        for (root, _) in doc.iter_individuals() {
            let ids = assign_ids(&doc, root, &FixedBand::default());
            let distinct: HashSet<u32> = ids.iter().map(|(_, id)| id).collect();
            assert_eq!(distinct.len(), ids.len(), "root {root}");
        }
    }

    #[test]
    fn ancestors_precede_everyone_else() {
        let doc = Document::parse(FILE);
        for (root, _) in doc.iter_individuals() {
            let ids = assign_ids(&doc, root, &FixedBand::default());
            let ancestors: HashSet<Xref> =
                ancestor_layers(&doc, root).into_iter().flatten().collect();
            let highest_ancestor = ancestors.iter().filter_map(|a| ids.get(a)).max();
            let lowest_other = ids
                .iter()
                .filter(|(xref, _)| !ancestors.contains(*xref))
                .map(|(_, id)| id)
                .min();
            if let (Some(a), Some(o)) = (highest_ancestor, lowest_other) {
                assert!(a < o, "root {root}");
            }
        }
    }

    #[test]
    fn iteration_is_ordered_by_identifier() {
        let doc = Document::parse(FILE);
        let ids = assign_ids(&doc, &root(), &FixedBand::default());
        let numbers: Vec<u32> = ids.iter().map(|(_, id)| id).collect();
        let mut sorted = numbers.clone();
        sorted.sort_unstable();
        assert_eq!(numbers, sorted);
    }

    #[test]
    fn fixed_band_only_fills_gaps() {
        let doc = Document::parse(FILE);
        let band = FixedBand::new(
            9001,
            vec![xref("@I404@"), xref("@I50@"), xref("@I8@"), xref("@I99@")],
        );
        let ids = assign_ids(&doc, &root(), &band);
        assert_eq!(ids.get("@I50@"), Some(9001));
        assert_eq!(ids.get("@I99@"), Some(9002));
        assert_eq!(ids.get("@I8@"), Some(1002));
        assert!(!ids.contains("@I404@"));
    }

    #[test]
    fn fixed_band_skips_used_identifiers() {
        let doc = Document::parse(FILE);
        let band = FixedBand::new(1006, vec![xref("@I50@")]);
        let ids = assign_ids(&doc, &root(), &band);
        assert_eq!(ids.get("@I50@"), Some(1008));
    }

    #[test]
    fn fixed_band_stops_at_the_end_of_the_range() {
        let doc = Document::parse(FILE);
        let band = FixedBand::new(u32::MAX, vec![xref("@I50@"), xref("@I99@")]);
        let ids = assign_ids(&doc, &root(), &band);
        assert_eq!(ids.get("@I50@"), Some(u32::MAX));
        assert!(!ids.contains("@I99@"));
        assert_eq!(ids.len(), 14);
    }

    // Parents @I2@ and @I3@ are cousins: their mothers @I5@ and @I7@ are
    // sisters, so @I8@ and @I9@ are reached through both of them.
    const COUSINS: &str = "\
0 @I1@ INDI
1 FAMC @F1@
0 @I2@ INDI
1 FAMC @F2@
1 FAMS @F1@
0 @I3@ INDI
1 FAMC @F3@
1 FAMS @F1@
0 @I4@ INDI
1 FAMS @F2@
0 @I5@ INDI
1 FAMC @F4@
1 FAMS @F2@
0 @I6@ INDI
1 FAMS @F3@
0 @I7@ INDI
1 FAMC @F4@
1 FAMS @F3@
0 @I8@ INDI
1 FAMS @F4@
0 @I9@ INDI
1 FAMS @F4@
0 @F1@ FAM
1 HUSB @I2@
1 WIFE @I3@
1 CHIL @I1@
0 @F2@ FAM
1 HUSB @I4@
1 WIFE @I5@
1 CHIL @I2@
0 @F3@ FAM
1 HUSB @I6@
1 WIFE @I7@
1 CHIL @I3@
0 @F4@ FAM
1 HUSB @I8@
1 WIFE @I9@
1 CHIL @I5@
1 CHIL @I7@
";

    #[test]
    fn shared_ancestors_are_layered_once() {
        let doc = Document::parse(COUSINS);
        assert_eq!(
            ancestor_layers(&doc, &root()),
            vec![
                vec![xref("@I1@")],
                vec![xref("@I2@"), xref("@I3@")],
                vec![xref("@I4@"), xref("@I5@"), xref("@I6@"), xref("@I7@")],
                vec![xref("@I8@"), xref("@I9@")],
            ]
        );

        let ids = assign_ids(&doc, &root(), &FixedBand::default());
        assert_eq!(ids.len(), 9);
        let numbers: Vec<u32> = ids.iter().map(|(_, id)| id).collect();
        assert_eq!(numbers, (0..9).collect::<Vec<_>>());
        assert_eq!(ids.get("@I8@"), Some(7));
        assert_eq!(ids.get("@I9@"), Some(8));
    }

    #[test]
    fn numeric_lookup() {
        let doc = Document::parse(FILE);
        let ids = assign_ids(&doc, &root(), &FixedBand::default());
        assert_eq!(ids.get_numeric(&doc, "10"), Some(1000));
        assert_eq!(ids.get_numeric(&doc, "50"), None);
        assert_eq!(ids.get_numeric(&doc, "404"), None);
    }

    #[test]
    fn root_without_family() {
        let doc = Document::parse(FILE);
        let ids = assign_ids(&doc, &xref("@I50@"), &FixedBand::default());
        assert_eq!(ids.len(), 1);
        assert_eq!(ids.get("@I50@"), Some(0));
    }

    #[test]
    fn thousand_boundary_moves_with_ancestor_count() {
        // 1001 generations put the oldest ancestor at 1000, so the root's
        // spouse starts the next band at 2000.
        let mut text = String::new();
        for n in 1..=1001 {
            text.push_str(&format!("0 @I{n}@ INDI\n1 NAME P{n}\n"));
            if n == 1 {
                text.push_str("1 FAMS @F9000@\n");
            }
            if n < 1001 {
                text.push_str(&format!("1 FAMC @F{n}@\n"));
            }
            if n > 1 {
                text.push_str(&format!("1 FAMS @F{}@\n", n - 1));
            }
        }
        for n in 1..=1000 {
            text.push_str(&format!("0 @F{n}@ FAM\n1 HUSB @I{}@\n1 CHIL @I{n}@\n", n + 1));
        }
        text.push_str("0 @I3000@ INDI\n1 NAME Spouse\n1 FAMS @F9000@\n");
        text.push_str("0 @F9000@ FAM\n1 HUSB @I1@\n1 WIFE @I3000@\n");

        let doc = Document::parse(&text);
        let ids = assign_ids(&doc, &root(), &FixedBand::default());
        assert_eq!(ids.get("@I1001@"), Some(1000));
        assert_eq!(ids.get("@I3000@"), Some(2000));
    }
}
