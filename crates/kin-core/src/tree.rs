//! Tree Builder: turns the flat snapshot from [`crate::loader`] into rooted
//! family trees.
//!
//! # Root selection
//!
//! With an anchor, the single root is that person. Without one, a root is
//! anybody with no parent present in the snapshot, except that someone who
//! married into the family (their spouse has known parents) is shown beside
//! that spouse instead, and a parentless couple is rooted once, at whichever
//! partner comes first. Anybody still missing from the output afterwards gets
//! an extra root at the top of their own ancestor chain, so circular data
//! stays visible.
//!
//! # Expansion
//!
//! Each node resolves its spouses as flat summaries and its children
//! recursively. The cycle guard is a visited set scoped to the current
//! branch: every recursive call gets its own copy extended with the current
//! id, so the same person can be expanded in full under two unrelated
//! branches while a person already on the path comes back as a leaf.
//!
//! Two limits keep the output bounded: [`TreeOptions::max_depth`] per path,
//! and [`TreeOptions::max_nodes`] for the whole build, which matters when
//! descendants are shared through intermarriage.

use std::{
  cmp::Ordering,
  collections::{HashMap, HashSet},
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
  loader::{FlatPerson, load_flat_people},
  person::PersonId,
  store::FamilyStore,
};

/// Number of biography characters carried on a node.
pub const BIO_SNIPPET_LEN: usize = 150;

/// Default for [`TreeOptions::max_depth`].
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Default for [`TreeOptions::max_nodes`].
pub const DEFAULT_MAX_NODES: usize = 10_000;

// ─── Options ─────────────────────────────────────────────────────────────────

/// How siblings are ordered under their parent.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ChildOrder {
  /// Snapshot order, i.e. the order the store returned people in.
  #[default]
  Insertion,
  /// Oldest first; undated children last, snapshot order among equals.
  BirthDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeOptions {
  /// A node at this depth (root = 0) is emitted without spouses or children.
  pub max_depth:   usize,
  /// Nodes expanded per build, over all roots. Once spent, every further
  /// node is emitted without spouses or children.
  pub max_nodes:   usize,
  pub child_order: ChildOrder,
}

impl Default for TreeOptions {
  fn default() -> Self {
    Self {
      max_depth:   DEFAULT_MAX_DEPTH,
      max_nodes:   DEFAULT_MAX_NODES,
      child_order: ChildOrder::default(),
    }
  }
}

// ─── Output ──────────────────────────────────────────────────────────────────

/// Display projection of a person, shared by tree nodes and spouse entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonSummary {
  pub id:                PersonId,
  pub first_name:        String,
  pub last_name:         String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub middle_name:       Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub preferred_name:    Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub profile_photo_ref: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub bio_snippet:       Option<String>,
  pub personality_tags:  Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub birth_date:        Option<NaiveDate>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub death_date:        Option<NaiveDate>,
  pub is_living:         bool,
}

/// Spouses are leaves: they carry no children of their own in the tree.
pub type SpouseSummary = PersonSummary;

impl From<&FlatPerson> for PersonSummary {
  fn from(p: &FlatPerson) -> Self {
    Self {
      id:                p.id.clone(),
      first_name:        p.first_name.clone(),
      last_name:         p.last_name.clone(),
      middle_name:       p.middle_name.clone(),
      preferred_name:    p.preferred_name.clone(),
      profile_photo_ref: p.profile_photo_ref.clone(),
      bio_snippet:       p
        .biography
        .as_deref()
        .filter(|b| !b.is_empty())
        .map(|b| b.chars().take(BIO_SNIPPET_LEN).collect()),
      personality_tags:  p.personality_tags.clone(),
      birth_date:        p.birth_date,
      death_date:        p.death_date,
      is_living:         p.is_living,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
  #[serde(flatten)]
  pub person:   PersonSummary,
  pub spouses:  Vec<SpouseSummary>,
  pub children: Vec<TreeNode>,
}

impl TreeNode {
  fn leaf(person: PersonSummary) -> Self {
    Self { person, spouses: Vec::new(), children: Vec::new() }
  }

  pub fn id(&self) -> &PersonId { &self.person.id }

  pub fn is_leaf(&self) -> bool { self.spouses.is_empty() && self.children.is_empty() }

  /// Depth-first search for the first node with `id`.
  pub fn find(&self, id: &str) -> Option<&TreeNode> {
    if self.person.id.as_str() == id {
      return Some(self);
    }
    self.children.iter().find_map(|c| c.find(id))
  }

  /// Number of nodes in this subtree, including `self`. Spouses are not
  /// counted.
  pub fn node_count(&self) -> usize {
    1 + self.children.iter().map(TreeNode::node_count).sum::<usize>()
  }

  /// Number of generations in this subtree; a lone node is 1.
  pub fn generations(&self) -> usize {
    1 + self.children.iter().map(TreeNode::generations).max().unwrap_or(0)
  }
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// The requested anchor is not in the snapshot.
#[derive(Debug, Error)]
#[error("anchor person not found: {0}")]
pub struct AnchorNotFound(pub PersonId);

/// Why [`family_tree`] produced no tree.
#[derive(Debug, Error)]
pub enum TreeError<E> {
  #[error(transparent)]
  AnchorNotFound(#[from] AnchorNotFound),

  #[error("store error: {0}")]
  Store(#[source] E),
}

// ─── Entry points ────────────────────────────────────────────────────────────

/// Build the family forest from an in-memory snapshot.
///
/// Returns one tree per root. An empty snapshot gives an empty forest; an
/// anchor that is not in the snapshot is an error, never an empty forest.
pub fn build_family_tree(
  people: &[FlatPerson],
  anchor: Option<&PersonId>,
  options: TreeOptions,
) -> Result<Vec<TreeNode>, AnchorNotFound> {
  let snapshot = Snapshot::new(people, options);
  match anchor {
    Some(id) => {
      let root = snapshot
        .person(id.as_str())
        .ok_or_else(|| AnchorNotFound(id.clone()))?;
      let mut walk = Walk::default();
      Ok(vec![snapshot.expand(root, &HashSet::new(), 0, &mut walk)])
    }
    None => Ok(snapshot.forest()),
  }
}

/// Load the snapshot from `store` and build the forest from it.
pub async fn family_tree<S>(
  store: &S,
  anchor: Option<&PersonId>,
  options: TreeOptions,
) -> Result<Vec<TreeNode>, TreeError<S::Error>>
where
  S: FamilyStore,
{
  let people = load_flat_people(store).await.map_err(TreeError::Store)?;
  Ok(build_family_tree(&people, anchor, options)?)
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// State shared by every expansion in one build.
#[derive(Default)]
struct Walk<'a> {
  /// Every id emitted anywhere, as node or spouse.
  reached:  HashSet<&'a str>,
  /// Nodes expanded so far; degenerate leaves are not counted.
  expanded: usize,
}

/// Read-only indexes over one snapshot, built once per call.
struct Snapshot<'a> {
  people:   &'a [FlatPerson],
  by_id:    HashMap<&'a str, &'a FlatPerson>,
  /// Parent id → children in output order, each child once.
  children: HashMap<&'a str, Vec<&'a FlatPerson>>,
  options:  TreeOptions,
}

impl<'a> Snapshot<'a> {
  fn new(people: &'a [FlatPerson], options: TreeOptions) -> Self {
    // The first row wins if an id is repeated.
    let mut by_id: HashMap<&str, &FlatPerson> = HashMap::with_capacity(people.len());
    for p in people {
      by_id.entry(p.id.as_str()).or_insert(p);
    }

    let mut children: HashMap<&str, Vec<&FlatPerson>> = HashMap::new();
    for child in people {
      if !std::ptr::eq(by_id[child.id.as_str()], child) {
        continue;
      }
      for parent_id in &child.parent_ids {
        if *parent_id == child.id {
          continue;
        }
        if !by_id.contains_key(parent_id.as_str()) {
          tracing::debug!(child = %child.id, parent = %parent_id, "skipping dangling parent reference");
          continue;
        }
        let list = children.entry(parent_id.as_str()).or_default();
        if !list.iter().any(|c| c.id == child.id) {
          list.push(child);
        }
      }
    }

    if options.child_order == ChildOrder::BirthDate {
      for list in children.values_mut() {
        list.sort_by(|a, b| by_birth_date(a.birth_date, b.birth_date));
      }
    }

    Self { people, by_id, children, options }
  }

  fn person(&self, id: &str) -> Option<&'a FlatPerson> { self.by_id.get(id).copied() }

  /// People in snapshot order, skipping repeated ids.
  fn canonical(&self) -> impl Iterator<Item = &'a FlatPerson> + '_ {
    self
      .people
      .iter()
      .filter(|p| std::ptr::eq(self.by_id[p.id.as_str()], *p))
  }

  fn known_parents(&self, p: &'a FlatPerson) -> impl Iterator<Item = &'a FlatPerson> + '_ {
    p.parent_ids
      .iter()
      .filter(move |id| **id != p.id)
      .filter_map(|id| self.person(id.as_str()))
  }

  fn has_known_parent(&self, p: &'a FlatPerson) -> bool {
    self.known_parents(p).next().is_some()
  }

  fn known_spouses(&self, p: &'a FlatPerson) -> impl Iterator<Item = &'a FlatPerson> + '_ {
    p.spouse_ids.iter().filter_map(|id| self.person(id.as_str()))
  }

  fn default_roots(&self) -> Vec<&'a FlatPerson> {
    let mut roots: Vec<&FlatPerson> = Vec::new();
    let mut chosen: HashSet<&str> = HashSet::new();

    for p in self.canonical().filter(|p| !self.has_known_parent(*p)) {
      let married_in = self.known_spouses(p).any(|s| self.has_known_parent(s));
      let partner_is_root =
        self.known_spouses(p).any(|s| chosen.contains(s.id.as_str()));
      if married_in || partner_is_root {
        continue;
      }
      chosen.insert(p.id.as_str());
      roots.push(p);
    }

    roots
  }

  /// Follow the first known parent upwards until there is none, stopping
  /// before any person already on the climb.
  fn topmost_ancestor(&self, start: &'a FlatPerson) -> &'a FlatPerson {
    let mut path: HashSet<&str> = HashSet::from([start.id.as_str()]);
    let mut current = start;
    while let Some(parent) = self.known_parents(current).next() {
      if !path.insert(parent.id.as_str()) {
        break;
      }
      current = parent;
    }
    current
  }

  fn forest(&self) -> Vec<TreeNode> {
    let mut walk = Walk::default();
    let mut used_roots: HashSet<&str> = HashSet::new();
    let mut trees = Vec::new();

    for root in self.default_roots() {
      used_roots.insert(root.id.as_str());
      trees.push(self.expand(root, &HashSet::new(), 0, &mut walk));
    }

    for person in self.canonical() {
      if walk.expanded >= self.options.max_nodes {
        tracing::debug!(max_nodes = self.options.max_nodes, "node budget spent, skipping remaining roots");
        break;
      }
      if walk.reached.contains(person.id.as_str()) {
        continue;
      }
      let mut root = self.topmost_ancestor(person);
      if used_roots.contains(root.id.as_str()) {
        root = person;
      }
      tracing::debug!(person = %person.id, root = %root.id, "adding root for unreached person");
      used_roots.insert(root.id.as_str());
      trees.push(self.expand(root, &HashSet::new(), 0, &mut walk));
    }

    trees
  }

  /// Expand `person` into a node.
  ///
  /// `visited` holds the ids on the path from the root down to (excluding)
  /// `person`. `walk.reached` feeds the coverage pass in [`Self::forest`]
  /// and never influences expansion; `walk.expanded` is checked against the
  /// node budget.
  fn expand(
    &self,
    person: &'a FlatPerson,
    visited: &HashSet<&'a str>,
    depth: usize,
    walk: &mut Walk<'a>,
  ) -> TreeNode {
    let id = person.id.as_str();
    walk.reached.insert(id);

    if visited.contains(id) {
      tracing::debug!(person = %person.id, "cycle detected, emitting leaf");
      return TreeNode::leaf(PersonSummary::from(person));
    }
    if depth >= self.options.max_depth {
      tracing::debug!(person = %person.id, depth, "maximum depth reached, emitting leaf");
      return TreeNode::leaf(PersonSummary::from(person));
    }
    if walk.expanded >= self.options.max_nodes {
      tracing::debug!(person = %person.id, "node budget spent, emitting leaf");
      return TreeNode::leaf(PersonSummary::from(person));
    }
    walk.expanded += 1;

    let mut branch = visited.clone();
    branch.insert(id);

    let spouses = person
      .spouse_ids
      .iter()
      .filter_map(|spouse_id| match self.person(spouse_id.as_str()) {
        Some(spouse) => {
          walk.reached.insert(spouse.id.as_str());
          Some(PersonSummary::from(spouse))
        }
        None => {
          tracing::debug!(person = %person.id, spouse = %spouse_id, "skipping dangling spouse reference");
          None
        }
      })
      .collect();

    let children = self
      .children
      .get(id)
      .map(|list| {
        list
          .iter()
          .map(|child| self.expand(*child, &branch, depth + 1, walk))
          .collect()
      })
      .unwrap_or_default();

    TreeNode { person: PersonSummary::from(person), spouses, children }
  }
}

fn by_birth_date(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
  match (a, b) {
    (Some(a), Some(b)) => a.cmp(&b),
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    (None, None) => Ordering::Equal,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    person::{NewPerson, Person},
    relationship::{NewRelationship, Relationship, RelationshipKind},
    store::PersonRecord,
  };

  fn ids(nodes: &[TreeNode]) -> Vec<&str> {
    nodes.iter().map(|n| n.id().as_str()).collect()
  }

  fn spouse_ids(node: &TreeNode) -> Vec<&str> {
    node.spouses.iter().map(|s| s.id.as_str()).collect()
  }

  fn build(people: &[FlatPerson]) -> Vec<TreeNode> {
    build_family_tree(people, None, TreeOptions::default()).unwrap()
  }

  fn build_at(people: &[FlatPerson], anchor: &str) -> Result<Vec<TreeNode>, AnchorNotFound> {
    build_family_tree(people, Some(&PersonId::from(anchor)), TreeOptions::default())
  }

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  /// grandfather → father (+ mother) → child
  fn scenario() -> Vec<FlatPerson> {
    vec![
      FlatPerson::new("grandfather", "Walter", "Smith"),
      FlatPerson::new("father", "Robert", "Smith")
        .with_parents(["grandfather"])
        .with_spouses(["mother"]),
      FlatPerson::new("mother", "Sarah", "Smith").with_spouses(["father"]),
      FlatPerson::new("child", "Emily", "Smith").with_parents(["father", "mother"]),
    ]
  }

  // ── Scenarios ───────────────────────────────────────────────────────────────

  #[test]
  fn scenario_without_anchor() {
    let forest = build(&scenario());
    assert_eq!(ids(&forest), ["grandfather"]);

    let grandfather = &forest[0];
    assert!(grandfather.spouses.is_empty());
    assert_eq!(ids(&grandfather.children), ["father"]);

    let father = &grandfather.children[0];
    assert_eq!(spouse_ids(father), ["mother"]);
    assert_eq!(ids(&father.children), ["child"]);

    let child = &father.children[0];
    assert!(child.spouses.is_empty());
    assert!(child.children.is_empty());
  }

  #[test]
  fn scenario_anchored_at_father() {
    let forest = build_at(&scenario(), "father").unwrap();
    assert_eq!(ids(&forest), ["father"]);
    assert_eq!(spouse_ids(&forest[0]), ["mother"]);
    assert_eq!(ids(&forest[0].children), ["child"]);
    assert!(forest[0].find("grandfather").is_none());
  }

  #[test]
  fn scenario_anchored_at_nonexistent() {
    let err = build_at(&scenario(), "nonexistent").unwrap_err();
    assert_eq!(err.0.as_str(), "nonexistent");
  }

  #[test]
  fn empty_snapshot_is_an_empty_forest() {
    assert!(build(&[]).is_empty());
    assert!(build_at(&[], "anyone").is_err());
  }

  // ── Properties ──────────────────────────────────────────────────────────────

  #[test]
  fn two_parents_list_a_child_once_each() {
    let people = vec![
      FlatPerson::new("dad", "Robert", "Smith").with_spouses(["mom"]),
      FlatPerson::new("mom", "Sarah", "Smith").with_spouses(["dad"]),
      FlatPerson::new("kid", "Emily", "Smith")
        .with_parents(["dad", "mom", "dad"]),
    ];
    let dad = &build_at(&people, "dad").unwrap()[0];
    let mom = &build_at(&people, "mom").unwrap()[0];
    assert_eq!(ids(&dad.children), ["kid"]);
    assert_eq!(ids(&mom.children), ["kid"]);
  }

  #[test]
  fn duplicated_parent_links_do_not_duplicate_children() {
    let mut kid = FlatPerson::new("kid", "Emily", "Smith");
    // Bypass the builder's dedup to simulate raw data.
    kid.parent_ids = vec!["dad".into(), "dad".into()];
    let people = vec![FlatPerson::new("dad", "Robert", "Smith"), kid];
    let forest = build(&people);
    assert_eq!(ids(&forest[0].children), ["kid"]);
  }

  #[test]
  fn a_person_is_never_their_own_descendant() {
    let people = vec![
      FlatPerson::new("a", "A", "X"),
      FlatPerson::new("b", "B", "X").with_parents(["a"]),
      FlatPerson::new("c", "C", "X").with_parents(["b", "a"]),
    ];
    let forest = build(&people);
    fn check(node: &TreeNode, ancestors: &mut Vec<String>) {
      assert!(!ancestors.contains(&node.id().to_string()) || node.is_leaf());
      ancestors.push(node.id().to_string());
      for c in &node.children {
        check(c, ancestors);
      }
      ancestors.pop();
    }
    for tree in &forest {
      check(tree, &mut Vec::new());
    }
  }

  #[test]
  fn two_person_cycle_terminates_with_a_leaf() {
    let people = vec![
      FlatPerson::new("a", "A", "Loop").with_parents(["b"]),
      FlatPerson::new("b", "B", "Loop").with_parents(["a"]),
    ];
    let forest = build(&people);
    assert_eq!(forest.len(), 1);

    let root = &forest[0];
    assert_eq!(root.node_count(), 3);
    let first = &root.children[0];
    let leaf = &first.children[0];
    assert_eq!(leaf.id(), root.id());
    assert!(leaf.is_leaf());
  }

  #[test]
  fn anchored_cycle_terminates() {
    let people = vec![
      FlatPerson::new("a", "A", "Loop").with_parents(["c"]),
      FlatPerson::new("b", "B", "Loop").with_parents(["a"]),
      FlatPerson::new("c", "C", "Loop").with_parents(["b"]),
    ];
    let forest = build_at(&people, "a").unwrap();
    let a = &forest[0];
    let b = &a.children[0];
    let c = &b.children[0];
    let again = &c.children[0];
    assert_eq!(ids(std::slice::from_ref(again)), ["a"]);
    assert!(again.is_leaf());
  }

  #[test]
  fn root_selection_picks_the_oldest_generation() {
    let people = vec![
      FlatPerson::new("b", "B", "X").with_parents(["a"]),
      FlatPerson::new("a", "A", "X"),
      FlatPerson::new("c", "C", "X").with_parents(["b"]),
    ];
    let forest = build(&people);
    assert_eq!(ids(&forest), ["a"]);
    assert!(forest[0].find("b").is_some());
    assert!(forest[0].find("c").is_some());
  }

  #[test]
  fn anchor_overrides_ancestors() {
    let people = vec![
      FlatPerson::new("a", "A", "X"),
      FlatPerson::new("b", "B", "X").with_parents(["a"]),
      FlatPerson::new("c", "C", "X").with_parents(["b"]),
    ];
    let forest = build_at(&people, "b").unwrap();
    assert_eq!(ids(&forest), ["b"]);
    assert_eq!(ids(&forest[0].children), ["c"]);
    assert!(forest[0].find("a").is_none());
  }

  #[test]
  fn dangling_spouse_is_omitted() {
    let people = vec![
      FlatPerson::new("widow", "Ann", "X").with_spouses(["deleted", "alive"]),
      FlatPerson::new("alive", "Bob", "X").with_spouses(["widow"]),
    ];
    let forest = build(&people);
    assert_eq!(ids(&forest), ["widow"]);
    assert_eq!(spouse_ids(&forest[0]), ["alive"]);
  }

  #[test]
  fn dangling_parent_makes_a_root() {
    let people = vec![FlatPerson::new("orphan", "Ann", "X").with_parents(["deleted"])];
    let forest = build(&people);
    assert_eq!(ids(&forest), ["orphan"]);
  }

  #[test]
  fn branches_expand_independently() {
    // x is a child of root a and married to y, a child of root d. Their child
    // z must be fully expanded under both roots.
    let people = vec![
      FlatPerson::new("a", "A", "Left"),
      FlatPerson::new("d", "D", "Right"),
      FlatPerson::new("x", "X", "Left").with_parents(["a"]).with_spouses(["y"]),
      FlatPerson::new("y", "Y", "Right").with_parents(["d"]).with_spouses(["x"]),
      FlatPerson::new("z", "Z", "Both").with_parents(["x", "y"]),
      FlatPerson::new("w", "W", "Both").with_parents(["z"]),
    ];
    let forest = build(&people);
    assert_eq!(ids(&forest), ["a", "d"]);

    let z_left = forest[0].find("z").unwrap();
    let z_right = forest[1].find("z").unwrap();
    assert_eq!(ids(&z_left.children), ["w"]);
    assert_eq!(z_left, z_right);

    assert_eq!(spouse_ids(forest[0].find("x").unwrap()), ["y"]);
    assert_eq!(spouse_ids(forest[1].find("y").unwrap()), ["x"]);
  }

  #[test]
  fn siblings_do_not_share_a_visited_set() {
    // k is reachable through both of p's children; it must be expanded under
    // each of them.
    let people = vec![
      FlatPerson::new("p", "P", "X"),
      FlatPerson::new("s1", "S1", "X").with_parents(["p"]),
      FlatPerson::new("s2", "S2", "X").with_parents(["p"]),
      FlatPerson::new("k", "K", "X").with_parents(["s1", "s2"]),
      FlatPerson::new("g", "G", "X").with_parents(["k"]),
    ];
    let forest = build(&people);
    let p = &forest[0];
    for sibling in &p.children {
      let k = &sibling.children[0];
      assert_eq!(ids(&k.children), ["g"]);
    }
  }

  // ── Root selection details ──────────────────────────────────────────────────

  #[test]
  fn parentless_couple_is_rooted_once() {
    let people = vec![
      FlatPerson::new("john", "John", "Smith").with_spouses(["mary"]),
      FlatPerson::new("mary", "Mary", "Smith").with_spouses(["john"]),
      FlatPerson::new("robert", "Robert", "Smith").with_parents(["john", "mary"]),
    ];
    let forest = build(&people);
    assert_eq!(ids(&forest), ["john"]);
    assert_eq!(spouse_ids(&forest[0]), ["mary"]);
  }

  #[test]
  fn one_sided_spouse_edge_still_links_the_couple() {
    // Only mary records the marriage.
    let people = vec![
      FlatPerson::new("john", "John", "Smith"),
      FlatPerson::new("mary", "Mary", "Smith").with_spouses(["john"]),
    ];
    let forest = build(&people);
    assert_eq!(ids(&forest), ["john", "mary"]);
    assert_eq!(spouse_ids(&forest[1]), ["john"]);
  }

  #[test]
  fn unrelated_branches_form_a_forest() {
    let people = vec![
      FlatPerson::new("a", "A", "One"),
      FlatPerson::new("b", "B", "Two"),
      FlatPerson::new("a1", "A1", "One").with_parents(["a"]),
    ];
    let forest = build(&people);
    assert_eq!(ids(&forest), ["a", "b"]);
  }

  #[test]
  fn child_of_a_married_in_spouse_is_still_shown() {
    // sarah married into the family; kid is hers from an earlier marriage.
    let people = vec![
      FlatPerson::new("john", "John", "Smith"),
      FlatPerson::new("robert", "Robert", "Smith")
        .with_parents(["john"])
        .with_spouses(["sarah"]),
      FlatPerson::new("sarah", "Sarah", "Smith").with_spouses(["robert"]),
      FlatPerson::new("kid", "Kim", "Jones").with_parents(["sarah"]),
    ];
    let forest = build(&people);
    assert_eq!(ids(&forest), ["john", "sarah"]);
    assert_eq!(ids(&forest[1].children), ["kid"]);
  }

  // ── Options ─────────────────────────────────────────────────────────────────

  #[test]
  fn children_keep_snapshot_order_by_default() {
    let people = vec![
      FlatPerson::new("p", "P", "X"),
      FlatPerson::new("young", "Y", "X")
        .with_parents(["p"])
        .with_birth_date(date(2000, 1, 1)),
      FlatPerson::new("old", "O", "X")
        .with_parents(["p"])
        .with_birth_date(date(1990, 1, 1)),
    ];
    assert_eq!(ids(&build(&people)[0].children), ["young", "old"]);
  }

  #[test]
  fn birth_date_order_puts_undated_last() {
    let people = vec![
      FlatPerson::new("p", "P", "X"),
      FlatPerson::new("undated", "U", "X").with_parents(["p"]),
      FlatPerson::new("young", "Y", "X")
        .with_parents(["p"])
        .with_birth_date(date(2000, 1, 1)),
      FlatPerson::new("old", "O", "X")
        .with_parents(["p"])
        .with_birth_date(date(1990, 1, 1)),
    ];
    let options = TreeOptions { child_order: ChildOrder::BirthDate, ..Default::default() };
    let forest = build_family_tree(&people, None, options).unwrap();
    assert_eq!(ids(&forest[0].children), ["old", "young", "undated"]);
  }

  #[test]
  fn max_depth_cuts_long_chains() {
    let mut people = vec![FlatPerson::new("g0", "G0", "X")];
    for i in 1..10 {
      people.push(FlatPerson::new(format!("g{i}"), format!("G{i}"), "X").with_parents([format!("g{}", i - 1)]));
    }
    let options = TreeOptions { max_depth: 3, ..Default::default() };
    let forest = build_family_tree(&people, None, options).unwrap();
    assert_eq!(forest[0].generations(), 4);
    let cut = forest[0].find("g3").unwrap();
    assert!(cut.is_leaf());
  }

  /// `depth` stacked diamonds: each `t{k}` has children `a{k+1}` and
  /// `b{k+1}`, which share the single child `t{k+1}`.
  fn diamonds(depth: usize) -> Vec<FlatPerson> {
    let mut people = vec![FlatPerson::new("t0", "T0", "X")];
    for k in 1..=depth {
      let top = format!("t{}", k - 1);
      people.push(FlatPerson::new(format!("a{k}"), "A", "X").with_parents([top.clone()]));
      people.push(FlatPerson::new(format!("b{k}"), "B", "X").with_parents([top]));
      people.push(
        FlatPerson::new(format!("t{k}"), "T", "X").with_parents([format!("a{k}"), format!("b{k}")]),
      );
    }
    people
  }

  #[test]
  fn node_budget_bounds_shared_descendants() {
    let options = TreeOptions { max_nodes: 50, ..Default::default() };
    let forest = build_family_tree(&diamonds(30), None, options).unwrap();

    assert_eq!(ids(&forest), ["t0"]);
    // Fifty expanded nodes with at most two children each.
    assert!(forest[0].node_count() <= 150);
    assert!(forest[0].find("t25").unwrap().is_leaf());
    assert!(forest[0].find("t26").is_none());
  }

  #[test]
  fn default_budget_keeps_deep_diamonds_small() {
    let forest = build(&diamonds(40));
    assert_eq!(forest.len(), 1);
    assert!(forest[0].node_count() <= 3 * DEFAULT_MAX_NODES);
  }

  #[test]
  fn node_budget_spans_every_root() {
    let people = vec![
      FlatPerson::new("r1", "R1", "X"),
      FlatPerson::new("k1", "K1", "X").with_parents(["r1"]),
      FlatPerson::new("r2", "R2", "X"),
      FlatPerson::new("k2", "K2", "X").with_parents(["r2"]),
    ];
    let options = TreeOptions { max_nodes: 2, ..Default::default() };
    let forest = build_family_tree(&people, None, options).unwrap();
    assert_eq!(ids(&forest), ["r1", "r2"]);
    assert_eq!(ids(&forest[0].children), ["k1"]);
    assert!(forest[1].is_leaf());
  }

  // ── Store failures ──────────────────────────────────────────────────────────

  #[derive(Debug, thiserror::Error)]
  #[error("store offline")]
  struct Offline;

  /// A store whose every call fails.
  struct OfflineStore;

  impl FamilyStore for OfflineStore {
    type Error = Offline;

    async fn add_person(&self, _: NewPerson) -> Result<Person, Offline> { Err(Offline) }

    async fn add_person_with_id(&self, _: PersonId, _: NewPerson) -> Result<Person, Offline> {
      Err(Offline)
    }

    async fn add_person_linked(
      &self,
      _: PersonId,
      _: NewPerson,
      _: Vec<NewRelationship>,
    ) -> Result<(Person, Vec<Relationship>), Offline> {
      Err(Offline)
    }

    async fn get_person(&self, _: PersonId) -> Result<Option<Person>, Offline> { Err(Offline) }

    async fn list_people(&self) -> Result<Vec<Person>, Offline> { Err(Offline) }

    async fn update_person(&self, _: PersonId, _: NewPerson) -> Result<Option<Person>, Offline> {
      Err(Offline)
    }

    async fn delete_person(&self, _: PersonId) -> Result<bool, Offline> { Err(Offline) }

    async fn add_relationship(&self, _: NewRelationship) -> Result<Relationship, Offline> {
      Err(Offline)
    }

    async fn relate(
      &self,
      _: PersonId,
      _: PersonId,
      _: RelationshipKind,
    ) -> Result<Vec<Relationship>, Offline> {
      Err(Offline)
    }

    async fn list_relationships(&self) -> Result<Vec<Relationship>, Offline> { Err(Offline) }

    async fn relationships_for(&self, _: PersonId) -> Result<Vec<Relationship>, Offline> {
      Err(Offline)
    }

    async fn delete_relationship(&self, _: uuid::Uuid) -> Result<bool, Offline> { Err(Offline) }

    async fn list_people_with_relationships(&self) -> Result<Vec<PersonRecord>, Offline> {
      Err(Offline)
    }
  }

  #[tokio::test]
  async fn unreachable_store_is_a_store_error() {
    let err = family_tree(&OfflineStore, None, TreeOptions::default())
      .await
      .unwrap_err();
    assert!(matches!(err, TreeError::Store(Offline)));

    // Store failure wins over anchor lookup: nothing was loaded to look in.
    let anchor = PersonId::from("anyone");
    let err = family_tree(&OfflineStore, Some(&anchor), TreeOptions::default())
      .await
      .unwrap_err();
    assert!(matches!(err, TreeError::Store(Offline)));
    assert_eq!(err.to_string(), "store error: store offline");
  }

  // ── Projection ──────────────────────────────────────────────────────────────

  #[test]
  fn bio_snippet_is_truncated_on_char_boundaries() {
    let bio = "é".repeat(200);
    let people = vec![FlatPerson::new("p", "P", "X").with_biography(bio)];
    let node = &build(&people)[0];
    let snippet = node.person.bio_snippet.as_deref().unwrap();
    assert_eq!(snippet.chars().count(), BIO_SNIPPET_LEN);
  }

  #[test]
  fn empty_biography_has_no_snippet() {
    let people = vec![FlatPerson::new("p", "P", "X").with_biography("")];
    assert!(build(&people)[0].person.bio_snippet.is_none());
  }

  #[test]
  fn serialises_to_camel_case_and_omits_missing_optionals() {
    let forest = build(&scenario());
    let json = serde_json::to_value(&forest[0]).unwrap();
    assert_eq!(json["id"], "grandfather");
    assert_eq!(json["firstName"], "Walter");
    assert_eq!(json["isLiving"], true);
    assert!(json.get("middleName").is_none());
    assert!(json.get("bioSnippet").is_none());
    assert_eq!(json["personalityTags"], serde_json::json!([]));

    let father = &json["children"][0];
    assert_eq!(father["spouses"][0]["id"], "mother");
    assert!(father["spouses"][0].get("children").is_none());
    assert_eq!(father["children"][0]["children"], serde_json::json!([]));
  }
}
