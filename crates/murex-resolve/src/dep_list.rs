// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

//! The install planner.
//!
//! Targets are expanded into a set of per-resolvent decisions, then
//! ordered so that dependencies precede their dependents. A
//! resolvent is `(name, slot)`: the planner never places two
//! different candidates on the same resolvent.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;

use murex_depspec::{
    BlockDepSpec,
    DependencyLabel,
    DependencySpec,
    PackageDepSpec,
    SetSpec,
};
use murex_environment::{
    condition_met,
    match_package,
    Environment,
    Filter,
    Generator,
    MatchPackageOptions,
    Selection,
};
use murex_foundation::name::{QualifiedPackageName, SetName, SlotNameBuf};
use murex_id::{package_ids_equal, ActionKind, CanonicalForm, PackageID};

use crate::dep_tag::DepTag;
use crate::error::{Error, Result};

#[cfg(test)]
#[path = "./dep_list_test.rs"]
mod dep_list_test;

/// The annotation that lets an edge be dropped to break a
/// dependency cycle.
pub const ORDERING_ANNOTATION: &str = "ordering";
pub const ORDERING_DISCARD: &str = "discard";

/// When to reinstall a package that is already installed at the
/// matched version.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum ReinstallPolicy {
    Always,
    /// Reinstall when the effective choices differ.
    IfUseChanged,
    #[default]
    Never,
}

/// Whether a plan may replace an installed package with an older
/// version.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum DowngradePolicy {
    #[default]
    AsNeeded,
    Error,
}

#[derive(Debug, Clone, Default)]
pub struct DepListOptions {
    pub reinstall: ReinstallPolicy,
    pub downgrade: DowngradePolicy,
}

/// The key under which at most one candidate may be planned.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Resolvent {
    pub name: QualifiedPackageName,
    pub slot: Option<SlotNameBuf>,
}

impl Resolvent {
    fn of(id: &dyn PackageID) -> Self {
        Self {
            name: id.name().clone(),
            slot: id.slot(),
        }
    }
}

impl std::fmt::Display for Resolvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.slot {
            Some(slot) => write!(f, "{}:{}", self.name, slot),
            None => self.name.fmt(f),
        }
    }
}

/// What the plan does at one resolvent.
#[derive(Debug, Clone)]
pub enum Decision {
    Install {
        id: Arc<dyn PackageID>,
    },
    Upgrade {
        from: Arc<dyn PackageID>,
        to: Arc<dyn PackageID>,
    },
    Downgrade {
        from: Arc<dyn PackageID>,
        to: Arc<dyn PackageID>,
    },
    Reinstall {
        id: Arc<dyn PackageID>,
    },
    NoChange {
        id: Arc<dyn PackageID>,
    },
}

impl Decision {
    /// The ID the resolvent ends up with.
    pub fn target_id(&self) -> &Arc<dyn PackageID> {
        match self {
            Decision::Install { id } => id,
            Decision::Upgrade { to, .. } => to,
            Decision::Downgrade { to, .. } => to,
            Decision::Reinstall { id } => id,
            Decision::NoChange { id } => id,
        }
    }

    /// The installed ID being replaced, when one exists.
    pub fn replaced_id(&self) -> Option<&Arc<dyn PackageID>> {
        match self {
            Decision::Upgrade { from, .. } | Decision::Downgrade { from, .. } => Some(from),
            _ => None,
        }
    }

    /// True when carrying out the plan touches the filesystem.
    pub fn is_change(&self) -> bool {
        !matches!(self, Decision::NoChange { .. })
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Decision::Install { .. } => "install",
            Decision::Upgrade { .. } => "upgrade",
            Decision::Downgrade { .. } => "downgrade",
            Decision::Reinstall { .. } => "reinstall",
            Decision::NoChange { .. } => "no-change",
        }
    }
}

/// One ordered element of a resolved plan.
#[derive(Debug)]
pub struct DepListEntry {
    pub resolvent: Resolvent,
    pub decision: Decision,
    pub tags: BTreeSet<DepTag>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum DepClass {
    Build,
    Run,
    Post,
}

struct Node {
    resolvent: Resolvent,
    decision: Decision,
    tags: BTreeSet<DepTag>,
}

struct Edge {
    /// The dependent node.
    from: usize,
    /// The dependency that should come first.
    to: usize,
    class: DepClass,
    discardable: bool,
}

struct Blocker {
    owner: usize,
    spec: BlockDepSpec,
}

struct QueueItem {
    spec: PackageDepSpec,
    tag: DepTag,
    requested_by: Option<usize>,
    class: DepClass,
}

/// The install planner; see the module notes.
pub struct DepList<'env> {
    env: &'env dyn Environment,
    options: DepListOptions,
    targets: Vec<(DependencySpec, DepTag)>,
}

impl<'env> DepList<'env> {
    pub fn new(env: &'env dyn Environment, options: DepListOptions) -> Self {
        Self {
            env,
            options,
            targets: Vec::new(),
        }
    }

    /// Add one target spec.
    pub fn add_target(&mut self, spec: PackageDepSpec) {
        self.targets
            .push((DependencySpec::Package(spec), DepTag::Target));
    }

    /// Add a whole dependency tree of targets, as parsed from a
    /// command line.
    pub fn add_target_tree(&mut self, tree: DependencySpec) {
        self.targets.push((tree, DepTag::Target));
    }

    /// Add the contents of a named set.
    pub fn add_target_set(&mut self, name: &SetName) -> Result<()> {
        let set = self.env.set(name).ok_or_else(|| Error::NoSuchSet {
            name: name.to_string(),
        })?;
        let tag = DepTag::GeneralSet {
            set: name.to_owned(),
        };
        self.targets.push((set_to_dependency_tree(&set), tag));
        Ok(())
    }

    /// Compute the ordered plan.
    pub fn resolve(&self) -> Result<Vec<DepListEntry>> {
        let mut state = ResolveState {
            env: self.env,
            options: &self.options,
            nodes: Vec::new(),
            by_resolvent: HashMap::new(),
            edges: Vec::new(),
            blockers: Vec::new(),
            queue: VecDeque::new(),
        };

        for (tree, tag) in &self.targets {
            state.enqueue_tree(tree, tag, None, DepClass::Run, None);
        }

        while let Some(item) = state.queue.pop_front() {
            state.process(item)?;
        }

        state.check_blockers()?;
        state.order()
    }
}

struct ResolveState<'env, 'opts> {
    env: &'env dyn Environment,
    options: &'opts DepListOptions,
    nodes: Vec<Node>,
    by_resolvent: HashMap<Resolvent, usize>,
    edges: Vec<Edge>,
    blockers: Vec<Blocker>,
    queue: VecDeque<QueueItem>,
}

impl ResolveState<'_, '_> {
    /// Walk a dependency tree, queueing package leaves and recording
    /// blockers. `owner` is the ID whose metadata the tree came
    /// from, used for conditionals.
    fn enqueue_tree(
        &mut self,
        tree: &DependencySpec,
        tag: &DepTag,
        requested_by: Option<usize>,
        class: DepClass,
        owner: Option<&Arc<dyn PackageID>>,
    ) {
        let mut class = class;
        match tree {
            DependencySpec::All(children) => {
                for child in children {
                    class = self.enqueue_child(child, tag, requested_by, class, owner);
                }
            }
            other => {
                self.enqueue_child(other, tag, requested_by, class, owner);
            }
        }
    }

    /// Handle one node of a dependency tree, returning the class in
    /// effect for the following siblings.
    fn enqueue_child(
        &mut self,
        node: &DependencySpec,
        tag: &DepTag,
        requested_by: Option<usize>,
        class: DepClass,
        owner: Option<&Arc<dyn PackageID>>,
    ) -> DepClass {
        match node {
            DependencySpec::All(_) => {
                self.enqueue_tree(node, tag, requested_by, class, owner);
            }
            DependencySpec::Any(members) => {
                if let Some(best) = self.score_any_group(members) {
                    self.enqueue_tree(&members[best], tag, requested_by, class, owner);
                }
            }
            DependencySpec::Conditional(condition, children) => {
                let met = match owner {
                    Some(owner) => condition_met(self.env, owner.as_ref(), condition),
                    None => {
                        tracing::warn!(
                            condition = %condition,
                            "conditional with no owning package, skipping"
                        );
                        false
                    }
                };
                if met {
                    for child in children {
                        self.enqueue_child(child, tag, requested_by, class, owner);
                    }
                }
            }
            DependencySpec::Package(spec) => {
                let tag = match tag {
                    DepTag::Target | DepTag::GeneralSet { .. } => tag.clone(),
                    DepTag::Dependency { .. } => DepTag::Dependency {
                        spec: spec.to_string(),
                    },
                };
                self.queue.push_back(QueueItem {
                    spec: spec.clone(),
                    tag,
                    requested_by,
                    class,
                });
            }
            DependencySpec::Block(block) => {
                self.blockers.push(Blocker {
                    owner: requested_by.unwrap_or(usize::MAX),
                    spec: block.clone(),
                });
            }
            DependencySpec::Labels(labels) => {
                // the last label of a `build+run:` group wins for
                // classification purposes
                let mut new_class = class;
                for label in &labels.labels {
                    new_class = match label {
                        DependencyLabel::Build => DepClass::Build,
                        DependencyLabel::Run => DepClass::Run,
                        DependencyLabel::Post => DepClass::Post,
                        DependencyLabel::Suggestion
                        | DependencyLabel::Recommendation
                        | DependencyLabel::Test => return DepClass::Post,
                    };
                }
                return new_class;
            }
            DependencySpec::NamedSet(named) => match self.env.set(&named.name) {
                Some(set) => {
                    let tag = DepTag::GeneralSet {
                        set: named.name.clone(),
                    };
                    let tree = set_to_dependency_tree(&set);
                    self.enqueue_tree(&tree, &tag, requested_by, class, owner);
                }
                None => {
                    tracing::warn!(set = %named.name, "unknown set in dependencies");
                }
            },
        }
        class
    }

    /// Choose the best member of an `|| ( ... )` group.
    ///
    /// Scoring, best first: already satisfied by the installed set;
    /// already satisfied by the queued plan; satisfiable by an
    /// installable candidate; anything. Ties break leftmost.
    fn score_any_group(&self, members: &[DependencySpec]) -> Option<usize> {
        if members.is_empty() {
            return None;
        }
        let mut best = (0usize, -1i8);
        for (index, member) in members.iter().enumerate() {
            let score = self.score_member(member);
            if score > best.1 {
                best = (index, score);
            }
        }
        Some(best.0)
    }

    fn score_member(&self, member: &DependencySpec) -> i8 {
        let mut leaves = Vec::new();
        collect_package_leaves(member, &mut leaves);
        if leaves.is_empty() {
            return 0;
        }
        for threshold in [3i8, 2, 1] {
            let all = leaves.iter().all(|spec| match threshold {
                3 => self.satisfied_by_installed(spec),
                2 => self.satisfied_by_plan(spec),
                _ => self.has_installable(spec),
            });
            if all {
                return threshold;
            }
        }
        0
    }

    fn satisfied_by_installed(&self, spec: &PackageDepSpec) -> bool {
        Selection::SomeArbitraryVersion(
            Generator::Matches(spec.clone(), MatchPackageOptions::default())
                .filtered(Filter::InstalledAtRoot),
        )
        .execute(self.env)
        .map(|ids| !ids.is_empty())
        .unwrap_or(false)
    }

    fn satisfied_by_plan(&self, spec: &PackageDepSpec) -> bool {
        self.nodes.iter().any(|node| {
            match_package(
                self.env,
                spec,
                node.decision.target_id().as_ref(),
                &MatchPackageOptions::default(),
            )
        })
    }

    fn has_installable(&self, spec: &PackageDepSpec) -> bool {
        Selection::SomeArbitraryVersion(
            Generator::Matches(spec.clone(), MatchPackageOptions::default())
                .filtered(Filter::SupportsAction(ActionKind::Install))
                .and(Filter::NotMasked),
        )
        .execute(self.env)
        .map(|ids| !ids.is_empty())
        .unwrap_or(false)
    }

    fn process(&mut self, item: QueueItem) -> Result<()> {
        let candidates = self.find_candidates(&item.spec)?;
        for candidate in candidates {
            self.place(&item, candidate)?;
        }
        Ok(())
    }

    /// The best installable candidate for a spec, one per package
    /// name for wildcard specs.
    fn find_candidates(&self, spec: &PackageDepSpec) -> Result<Vec<Arc<dyn PackageID>>> {
        // loose match first so that a failure can be diagnosed
        let loose = MatchPackageOptions {
            ignore_additional_requirements: true,
            ..MatchPackageOptions::default()
        };
        let candidates = Selection::BestVersionOnly(
            Generator::Matches(spec.clone(), loose)
                .filtered(Filter::SupportsAction(ActionKind::Install))
                .and(Filter::NotMasked),
        )
        .execute(self.env)
        .map_err(Error::EnvironmentError)?;

        if candidates.is_empty() {
            // an installed instance satisfying the spec still counts
            let installed = Selection::BestVersionOnly(
                Generator::Matches(spec.clone(), MatchPackageOptions::default())
                    .filtered(Filter::InstalledAtRoot),
            )
            .execute(self.env)
            .map_err(Error::EnvironmentError)?;
            if !installed.is_empty() {
                return Ok(installed);
            }
            return Err(Error::AllMasked {
                query: spec.to_string(),
            });
        }

        let mut usable = Vec::new();
        for candidate in candidates {
            if match_package(
                self.env,
                spec,
                candidate.as_ref(),
                &MatchPackageOptions::default(),
            ) {
                usable.push(candidate);
            } else {
                return Err(Error::AdditionalRequirementsNotMet {
                    query: spec.to_string(),
                });
            }
        }
        Ok(usable)
    }

    fn place(&mut self, item: &QueueItem, candidate: Arc<dyn PackageID>) -> Result<()> {
        let resolvent = Resolvent::of(candidate.as_ref());

        if let Some(&existing) = self.by_resolvent.get(&resolvent) {
            let node = &mut self.nodes[existing];
            let settled = Arc::clone(node.decision.target_id());
            if !package_ids_equal(settled.as_ref(), candidate.as_ref())
                && !match_package(
                    self.env,
                    &item.spec,
                    settled.as_ref(),
                    &MatchPackageOptions::default(),
                )
            {
                return Err(Error::Block {
                    message: format!(
                        "both {} and {} wanted at {resolvent}",
                        settled.canonical_form(CanonicalForm::Full),
                        candidate.canonical_form(CanonicalForm::Full),
                    ),
                });
            }
            node.tags.insert(item.tag.clone());
            if let Some(from) = item.requested_by {
                self.add_edge(from, existing, item.class, &item.spec);
            }
            return Ok(());
        }

        let installed_here = self.installed_at(&resolvent)?;
        let decision = match &installed_here {
            None => {
                if candidate.supports_action(ActionKind::Install) {
                    Decision::Install {
                        id: Arc::clone(&candidate),
                    }
                } else {
                    // an installed-only candidate from find_candidates
                    Decision::NoChange {
                        id: Arc::clone(&candidate),
                    }
                }
            }
            Some(installed) => {
                use std::cmp::Ordering;
                if !candidate.supports_action(ActionKind::Install) {
                    Decision::NoChange {
                        id: Arc::clone(installed),
                    }
                } else {
                    match candidate.version().cmp(installed.version()) {
                        Ordering::Greater => Decision::Upgrade {
                            from: Arc::clone(installed),
                            to: Arc::clone(&candidate),
                        },
                        Ordering::Less => match self.options.downgrade {
                            DowngradePolicy::AsNeeded => Decision::Downgrade {
                                from: Arc::clone(installed),
                                to: Arc::clone(&candidate),
                            },
                            DowngradePolicy::Error => {
                                return Err(Error::DowngradeNotAllowed {
                                    from: installed.canonical_form(CanonicalForm::Full),
                                    to: candidate.canonical_form(CanonicalForm::Full),
                                })
                            }
                        },
                        Ordering::Equal => match self.options.reinstall {
                            ReinstallPolicy::Always => Decision::Reinstall {
                                id: Arc::clone(&candidate),
                            },
                            ReinstallPolicy::IfUseChanged => {
                                if self.effective_choices_differ(installed.as_ref(), candidate.as_ref())
                                {
                                    Decision::Reinstall {
                                        id: Arc::clone(&candidate),
                                    }
                                } else {
                                    Decision::NoChange {
                                        id: Arc::clone(installed),
                                    }
                                }
                            }
                            ReinstallPolicy::Never => Decision::NoChange {
                                id: Arc::clone(installed),
                            },
                        },
                    }
                }
            }
        };

        if decision.is_change() {
            let has_destination = self.env.repositories().into_iter().any(|r| {
                r.capabilities().destination
                    && r.is_suitable_destination_for(decision.target_id().as_ref())
            });
            if !has_destination {
                return Err(Error::NoDestination {
                    query: decision
                        .target_id()
                        .canonical_form(CanonicalForm::Full),
                });
            }
        }

        let source_id = Arc::clone(decision.target_id());
        let index = self.nodes.len();
        self.nodes.push(Node {
            resolvent: resolvent.clone(),
            decision,
            tags: [item.tag.clone()].into_iter().collect(),
        });
        self.by_resolvent.insert(resolvent, index);
        if let Some(from) = item.requested_by {
            self.add_edge(from, index, item.class, &item.spec);
        }

        self.expand_dependencies(index, &source_id);
        Ok(())
    }

    fn add_edge(&mut self, from: usize, to: usize, class: DepClass, spec: &PackageDepSpec) {
        let discardable = spec
            .annotations()
            .get(ORDERING_ANNOTATION)
            .is_some_and(|v| v == ORDERING_DISCARD);
        self.edges.push(Edge {
            from,
            to,
            class,
            discardable,
        });
    }

    /// The best installed instance occupying a resolvent.
    fn installed_at(&self, resolvent: &Resolvent) -> Result<Option<Arc<dyn PackageID>>> {
        let ids = Selection::AllVersionsSorted(
            Generator::Package(resolvent.name.clone()).filtered(Filter::InstalledAtRoot),
        )
        .execute(self.env)
        .map_err(Error::EnvironmentError)?;
        Ok(ids
            .into_iter()
            .filter(|id| id.slot() == resolvent.slot)
            .next_back())
    }

    fn effective_choices_differ(&self, installed: &dyn PackageID, candidate: &dyn PackageID) -> bool {
        self.effective_enabled(installed) != self.effective_enabled(candidate)
    }

    fn effective_enabled(&self, id: &dyn PackageID) -> BTreeSet<String> {
        let Some(key) = id.choices_key() else {
            return BTreeSet::new();
        };
        let Some(choices) = key.as_choices() else {
            return BTreeSet::new();
        };
        let mut enabled = BTreeSet::new();
        for choice in choices.iter() {
            for value in choice.values() {
                let state = self
                    .env
                    .want_choice_enabled(id, value.name_with_prefix.as_ref())
                    .unwrap_or(value.enabled);
                if state {
                    enabled.insert(value.name_with_prefix.to_string());
                }
            }
        }
        enabled
    }

    fn expand_dependencies(&mut self, index: usize, id: &Arc<dyn PackageID>) {
        let keys = [
            (DepClass::Build, id.build_dependencies_key()),
            (DepClass::Run, id.run_dependencies_key()),
            (DepClass::Post, id.post_dependencies_key()),
        ];
        for (class, key) in keys {
            let Some(key) = key else { continue };
            let Some(tree) = key.as_dependencies().cloned() else {
                continue;
            };
            let tag = DepTag::Dependency {
                spec: String::new(),
            };
            self.enqueue_tree(&tree, &tag, Some(index), class, Some(id));
        }
    }

    /// Validate the collected blockers against the installed set and
    /// the finished plan.
    fn check_blockers(&self) -> Result<()> {
        for blocker in &self.blockers {
            let spec = &blocker.spec.spec;
            let owner_resolvent = self
                .nodes
                .get(blocker.owner)
                .map(|n| n.resolvent.clone());

            // planned candidates that would violate the block
            for node in &self.nodes {
                if Some(&node.resolvent) == owner_resolvent.as_ref() {
                    // a package never blocks itself
                    continue;
                }
                if node.decision.is_change()
                    && match_package(
                        self.env,
                        spec,
                        node.decision.target_id().as_ref(),
                        &MatchPackageOptions::default(),
                    )
                {
                    return Err(Error::Block {
                        message: format!(
                            "planned {} is blocked by {}",
                            node.decision
                                .target_id()
                                .canonical_form(CanonicalForm::Full),
                            blocker.spec,
                        ),
                    });
                }
            }

            // installed instances violate a block unless the plan
            // replaces them with something the block permits
            let installed = Selection::AllVersionsSorted(
                Generator::Matches(spec.clone(), MatchPackageOptions::default())
                    .filtered(Filter::InstalledAtRoot),
            )
            .execute(self.env)
            .map_err(Error::EnvironmentError)?;
            for id in installed {
                if Some(Resolvent::of(id.as_ref())) == owner_resolvent {
                    continue;
                }
                let replaced = self
                    .by_resolvent
                    .get(&Resolvent::of(id.as_ref()))
                    .map(|&index| &self.nodes[index])
                    .is_some_and(|node| {
                        node.decision.is_change()
                            && !match_package(
                                self.env,
                                spec,
                                node.decision.target_id().as_ref(),
                                &MatchPackageOptions::default(),
                            )
                    });
                if replaced && !blocker.spec.strong {
                    continue;
                }
                return Err(Error::Block {
                    message: format!(
                        "installed {} is blocked by {}",
                        id.canonical_form(CanonicalForm::Full),
                        blocker.spec,
                    ),
                });
            }
        }
        Ok(())
    }

    /// Topologically order the nodes, dependencies first.
    ///
    /// Cycles drop their post-dependency edges, then any edges
    /// marked discardable by annotation; a cycle that survives both
    /// is an error.
    fn order(self) -> Result<Vec<DepListEntry>> {
        let node_count = self.nodes.len();
        let mut active: Vec<bool> = self
            .edges
            .iter()
            .map(|e| e.from != e.to && e.from < node_count && e.to < node_count)
            .collect();

        let mut placed = vec![false; node_count];
        let mut order = Vec::with_capacity(node_count);

        while order.len() < node_count {
            let mut progressed = false;
            // lowest discovery index first keeps the output stable
            for index in 0..node_count {
                if placed[index] {
                    continue;
                }
                let blocked = self.edges.iter().enumerate().any(|(ei, edge)| {
                    active[ei] && edge.from == index && !placed[edge.to]
                });
                if !blocked {
                    placed[index] = true;
                    order.push(index);
                    progressed = true;
                }
            }
            if progressed {
                continue;
            }

            // cycle: drop post edges among unplaced nodes first
            let mut dropped = false;
            for (ei, edge) in self.edges.iter().enumerate() {
                if active[ei]
                    && !placed[edge.from]
                    && !placed[edge.to]
                    && edge.class == DepClass::Post
                {
                    active[ei] = false;
                    dropped = true;
                }
            }
            if dropped {
                continue;
            }
            for (ei, edge) in self.edges.iter().enumerate() {
                if active[ei] && !placed[edge.from] && !placed[edge.to] && edge.discardable {
                    active[ei] = false;
                    dropped = true;
                }
            }
            if dropped {
                continue;
            }

            let cycle = self
                .nodes
                .iter()
                .enumerate()
                .filter(|(i, _)| !placed[*i])
                .map(|(_, n)| n.resolvent.to_string())
                .collect();
            return Err(Error::CircularDependency { cycle });
        }

        let mut nodes: Vec<Option<Node>> = self.nodes.into_iter().map(Some).collect();
        Ok(order
            .into_iter()
            .map(|index| {
                let node = nodes[index].take().expect("each node is placed once");
                DepListEntry {
                    resolvent: node.resolvent,
                    decision: node.decision,
                    tags: node.tags,
                }
            })
            .collect())
    }
}

fn collect_package_leaves<'t>(tree: &'t DependencySpec, out: &mut Vec<&'t PackageDepSpec>) {
    match tree {
        DependencySpec::All(children) | DependencySpec::Any(children) => {
            for child in children {
                collect_package_leaves(child, out);
            }
        }
        DependencySpec::Conditional(_, children) => {
            for child in children {
                collect_package_leaves(child, out);
            }
        }
        DependencySpec::Package(spec) => out.push(spec),
        DependencySpec::Block(_)
        | DependencySpec::Labels(_)
        | DependencySpec::NamedSet(_) => {}
    }
}

/// Re-express a set's contents as a dependency tree so targets and
/// dependencies share one expansion path.
fn set_to_dependency_tree(set: &SetSpec) -> DependencySpec {
    match set {
        SetSpec::All(children) => {
            DependencySpec::All(children.iter().map(set_to_dependency_tree).collect())
        }
        SetSpec::Package(spec) => DependencySpec::Package(spec.clone()),
        SetSpec::NamedSet(named) => DependencySpec::NamedSet(named.clone()),
    }
}
