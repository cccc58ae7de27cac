//! Backtracking search over implementation choices
//!
//! The search pops requests from a FIFO frontier. Each request names an
//! interface (and maybe a command); the solver picks the best viable
//! candidate for it and pushes that candidate's dependencies. Whenever a
//! request has more than one option, the full search state is saved in a
//! choice point before the first option is applied.
//!
//! Every request, selection, restriction and forbidden interface carries a
//! blame set: the stack positions of the choice points it follows from. A
//! request with no viable candidate is blamed on the union of its own blame
//! and the blames of whatever rejected each candidate. The search then jumps
//! straight back to the newest blamed choice point and applies its next
//! option. Choice points in between had no part in the failure, so their
//! remaining options are never tried. Options are still taken in ranker
//! order.

use crate::diagnostics::{
    Conflict, MissingInterfaceError, RejectReason, Rejection, SolveFailure, UnsatisfiableError,
};
use crate::ranker::{Ranker, Ranking};
use crate::restrictions::Restrictions;
use crate::selections::{Selection, Selections};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::rc::Rc;
use tracing::{debug, info};
use zi_catalog::{Candidate, Catalog};
use zi_types::{Dependency, Implementation, Importance, InterfaceUri, Policy, DEFAULT_COMMAND};

/// Selects one implementation per required interface
#[derive(Debug, Clone, Copy)]
pub struct Solver<'a> {
    catalog: &'a Catalog,
    policy: &'a Policy,
}

impl<'a> Solver<'a> {
    #[must_use]
    pub fn new(catalog: &'a Catalog, policy: &'a Policy) -> Self {
        Self { catalog, policy }
    }

    /// Solve for `root`, optionally requiring `command` on it
    ///
    /// The same catalog, policy and arguments always give the same result.
    ///
    /// # Errors
    ///
    /// Returns [`SolveFailure::MissingInterface`] when the root, or every
    /// interface that blocked the solve, has no implementations in the
    /// catalog, and [`SolveFailure::Unsatisfiable`] when no combination of
    /// candidates meets all constraints.
    pub fn solve(&self, root: &str, command: Option<&str>) -> Result<Selections, SolveFailure> {
        let root_uri = InterfaceUri::new(root);
        if self.catalog.implementations_for(root).is_empty() {
            return Err(MissingInterfaceError {
                interfaces: vec![root_uri],
            }
            .into());
        }

        let mut search = Search::new(Ranker::new(self.catalog, self.policy));
        let request = Request {
            interface: root_uri.clone(),
            command: command.map(str::to_string),
            importance: Importance::Essential,
            blame: Blame::new(),
        };

        match search.run(request) {
            Some(state) => {
                let selections = state.into_selections(root_uri, command);
                info!(
                    root,
                    selections = selections.len(),
                    backtracks = search.backtracks,
                    "solve complete"
                );
                Ok(selections)
            }
            None => {
                info!(
                    root,
                    conflicts = search.conflicts.len(),
                    backtracks = search.backtracks,
                    "solve failed"
                );
                Err(search.into_failure())
            }
        }
    }
}

/// Stack positions of the choice points a fact depends on
type Blame = BTreeSet<usize>;

/// One unit of work on the frontier
#[derive(Debug, Clone)]
struct Request {
    interface: InterfaceUri,
    command: Option<String>,
    /// Only `Essential` or `Recommended`; restricts edges never become requests
    importance: Importance,
    blame: Blame,
}

#[derive(Debug, Clone, Copy)]
enum Choice<'a> {
    Take(Candidate<'a>),
    /// Leave a recommended interface unselected
    Skip,
}

#[derive(Debug, Clone)]
struct Chosen<'a> {
    candidate: Candidate<'a>,
    commands: Vec<String>,
    blame: Blame,
}

/// Everything a choice point has to restore
#[derive(Debug, Clone, Default)]
struct SearchState<'a> {
    frontier: VecDeque<Request>,
    /// Selected interfaces in discovery order
    order: Vec<InterfaceUri>,
    chosen: HashMap<InterfaceUri, Chosen<'a>>,
    restrictions: Restrictions,
    /// Union of the blames of every edge that restricted an interface
    restriction_blame: HashMap<InterfaceUri, Blame>,
    /// Interface -> id and blame of the selected implementation that forbids it
    forbidden: HashMap<InterfaceUri, (String, Blame)>,
    /// Recommended interfaces left unselected
    dropped: HashSet<InterfaceUri>,
}

impl SearchState<'_> {
    fn into_selections(self, root: InterfaceUri, command: Option<&str>) -> Selections {
        let mut chosen = self.chosen;
        let selections = self
            .order
            .into_iter()
            .filter_map(|interface| {
                let Chosen {
                    candidate,
                    commands,
                    ..
                } = chosen.remove(&interface)?;
                Some(Selection {
                    interface,
                    feed: candidate.feed.to_string(),
                    implementation: candidate.implementation.clone(),
                    commands,
                })
            })
            .collect();
        Selections::new(root, command.map(str::to_string), selections)
    }
}

struct ChoicePoint<'a> {
    state: SearchState<'a>,
    request: Request,
    options: Vec<Choice<'a>>,
    next: usize,
    /// Why the options are limited to these
    blame: Blame,
    /// Earlier choice points blamed for the options already refuted
    conflict: Blame,
}

/// Marker for "this request cannot be satisfied", with the choice points
/// responsible; details go to the conflict log
struct Conflicted(Blame);

struct Search<'a> {
    ranker: Ranker<'a>,
    rankings: HashMap<InterfaceUri, Rc<Ranking<'a>>>,
    stack: Vec<ChoicePoint<'a>>,
    /// Distinct failures in the order they were first seen
    conflicts: Vec<Conflict>,
    backtracks: usize,
}

impl<'a> Search<'a> {
    fn new(ranker: Ranker<'a>) -> Self {
        Self {
            ranker,
            rankings: HashMap::new(),
            stack: Vec::new(),
            conflicts: Vec::new(),
            backtracks: 0,
        }
    }

    fn run(&mut self, root: Request) -> Option<SearchState<'a>> {
        let mut state = SearchState::default();
        state.frontier.push_back(root);

        while let Some(request) = state.frontier.pop_front() {
            if let Err(Conflicted(blame)) = self.step(&mut state, request) {
                state = self.backjump(blame)?;
            }
        }
        Some(state)
    }

    fn ranking(&mut self, interface: &InterfaceUri) -> Rc<Ranking<'a>> {
        let ranker = self.ranker;
        self.rankings
            .entry(interface.clone())
            .or_insert_with(|| Rc::new(ranker.rank(interface.as_str())))
            .clone()
    }

    fn step(&mut self, state: &mut SearchState<'a>, request: Request) -> Result<(), Conflicted> {
        if state.chosen.contains_key(&request.interface) {
            return self.extend_selected(state, &request);
        }
        if request.importance == Importance::Recommended
            && state.dropped.contains(&request.interface)
        {
            return Ok(());
        }

        let ranking = self.ranking(&request.interface);
        let mut rejected = ranking.excluded.clone();
        let mut blame = request.blame.clone();
        let mut options = Vec::new();
        for candidate in &ranking.candidates {
            match check_candidate(state, &request, *candidate) {
                Ok(()) => options.push(Choice::Take(*candidate)),
                Err((reason, cause)) => {
                    blame.extend(cause);
                    rejected.push(rejection(*candidate, reason));
                }
            }
        }

        if options.is_empty() {
            if request.importance == Importance::Recommended {
                info!(
                    interface = %request.interface,
                    "dropping recommended dependency: no usable implementation"
                );
                state.dropped.insert(request.interface);
                return Ok(());
            }
            self.record_conflict(Conflict {
                restriction: state.restrictions.get(request.interface.as_str()).cloned(),
                missing: ranking.is_missing(),
                interface: request.interface,
                rejected,
            });
            return Err(Conflicted(blame));
        }

        if request.importance == Importance::Recommended {
            options.push(Choice::Skip);
        }
        let first = options[0];
        if options.len() > 1 {
            let position = self.stack.len();
            self.stack.push(ChoicePoint {
                state: state.clone(),
                request: request.clone(),
                options,
                next: 1,
                blame: blame.clone(),
                conflict: Blame::new(),
            });
            blame.insert(position);
        }
        apply(state, &request, first, blame);
        Ok(())
    }

    /// A request for an interface that already has a selection may add a
    /// command to it
    fn extend_selected(
        &mut self,
        state: &mut SearchState<'a>,
        request: &Request,
    ) -> Result<(), Conflicted> {
        let Some(command) = &request.command else {
            return Ok(());
        };
        let Some(chosen) = state.chosen.get(&request.interface) else {
            return Ok(());
        };
        if chosen.commands.contains(command) {
            return Ok(());
        }

        let candidate = chosen.candidate;
        let mut blame: Blame = chosen.blame.union(&request.blame).copied().collect();
        let implementation = candidate.implementation;
        let problem = if implementation.has_command(command) {
            command_dependencies(implementation, command)
                .into_iter()
                .find_map(|(dep, extra)| check_against_selected(state, dep, extra).err())
        } else {
            Some((
                RejectReason::MissingCommand {
                    command: command.clone(),
                },
                Blame::new(),
            ))
        };

        match problem {
            None => {
                if let Some(chosen) = state.chosen.get_mut(&request.interface) {
                    chosen.commands.push(command.clone());
                }
                debug!(interface = %request.interface, command, "adding command");
                for (dep, extra) in command_dependencies(implementation, command) {
                    add_dependency(state, dep, extra, &blame);
                }
                Ok(())
            }
            Some((reason, _)) if request.importance == Importance::Recommended => {
                debug!(
                    interface = %request.interface,
                    command,
                    %reason,
                    "ignoring recommended command"
                );
                Ok(())
            }
            Some((reason, cause)) => {
                blame.extend(cause);
                self.record_conflict(Conflict {
                    interface: request.interface.clone(),
                    restriction: state.restrictions.get(request.interface.as_str()).cloned(),
                    rejected: vec![rejection(candidate, reason)],
                    missing: false,
                });
                Err(Conflicted(blame))
            }
        }
    }

    /// Resume from the newest choice point named in `blame`
    ///
    /// Points above it are discarded. The rest of `blame` stays on the
    /// target so that running out of options there jumps further back. An
    /// empty blame means the failure holds whatever is chosen.
    fn backjump(&mut self, mut blame: Blame) -> Option<SearchState<'a>> {
        let target = blame.pop_last()?;
        self.stack.truncate(target + 1);
        let point = self.stack.get_mut(target)?;
        point.conflict.extend(blame);

        let choice = *point.options.get(point.next)?;
        point.next += 1;
        let mut state = point.state.clone();
        let request = point.request.clone();
        let mut selection_blame = point.blame.clone();
        let exhausted = point.next == point.options.len();
        if exhausted {
            // the earlier options were refuted, so the last one is forced
            selection_blame.extend(point.conflict.iter().copied());
            self.stack.pop();
        } else {
            selection_blame.insert(target);
        }

        self.backtracks += 1;
        debug!(
            interface = %request.interface,
            depth = self.stack.len(),
            "backtracking"
        );
        apply(&mut state, &request, choice, selection_blame);
        Some(state)
    }

    fn record_conflict(&mut self, conflict: Conflict) {
        debug!(interface = %conflict.interface, missing = conflict.missing, "conflict");
        if !self.conflicts.contains(&conflict) {
            self.conflicts.push(conflict);
        }
    }

    fn into_failure(self) -> SolveFailure {
        if !self.conflicts.is_empty() && self.conflicts.iter().all(|c| c.missing) {
            let mut interfaces: Vec<InterfaceUri> = Vec::new();
            for conflict in self.conflicts {
                if !interfaces.contains(&conflict.interface) {
                    interfaces.push(conflict.interface);
                }
            }
            return MissingInterfaceError { interfaces }.into();
        }
        UnsatisfiableError {
            conflicts: self.conflicts,
        }
        .into()
    }
}

fn rejection(candidate: Candidate<'_>, reason: RejectReason) -> Rejection {
    Rejection {
        id: candidate.implementation.id.clone(),
        version: candidate.implementation.version.clone(),
        reason,
    }
}

/// Commit `choice` for `request`, pushing its dependencies
fn apply<'a>(state: &mut SearchState<'a>, request: &Request, choice: Choice<'a>, blame: Blame) {
    let Choice::Take(candidate) = choice else {
        info!(interface = %request.interface, "leaving recommended dependency unselected");
        state.dropped.insert(request.interface.clone());
        return;
    };

    let implementation = candidate.implementation;
    debug!(
        interface = %request.interface,
        id = %implementation.id,
        version = %implementation.version,
        "selecting"
    );

    for interface in &implementation.conflicts {
        state
            .forbidden
            .entry(interface.clone())
            .or_insert_with(|| (implementation.id.clone(), blame.clone()));
    }
    for (dep, extra) in all_dependencies(implementation, request.command.as_deref()) {
        add_dependency(state, dep, extra, &blame);
    }
    state.order.push(request.interface.clone());
    state.chosen.insert(
        request.interface.clone(),
        Chosen {
            candidate,
            commands: request.command.iter().cloned().collect(),
            blame,
        },
    );
}

/// Record a dependency's range and queue the requests it implies
fn add_dependency(
    state: &mut SearchState<'_>,
    dep: &Dependency,
    extra_command: Option<&str>,
    blame: &Blame,
) {
    if let Some(range) = &dep.version {
        state.restrictions.add(&dep.interface, range);
        state
            .restriction_blame
            .entry(dep.interface.clone())
            .or_default()
            .extend(blame.iter().copied());
    }
    if dep.importance == Importance::Restricts {
        return;
    }

    let request = |command: Option<&str>| Request {
        interface: dep.interface.clone(),
        command: command.map(str::to_string),
        importance: dep.importance,
        blame: blame.clone(),
    };
    let commands = required_commands(dep, extra_command);
    if commands.is_empty() {
        state.frontier.push_back(request(None));
    }
    for command in commands {
        state.frontier.push_back(request(Some(command)));
    }
}

fn required_commands<'d>(dep: &'d Dependency, extra_command: Option<&'d str>) -> Vec<&'d str> {
    let mut commands = dep.required_commands();
    if let Some(extra) = extra_command {
        if !commands.contains(&extra) {
            commands.push(extra);
        }
    }
    commands
}

/// Dependencies of a requested command, including its runner (which must
/// provide `run`)
fn command_dependencies<'i>(
    implementation: &'i Implementation,
    command: &str,
) -> Vec<(&'i Dependency, Option<&'static str>)> {
    let Some(command) = implementation.command(command) else {
        return Vec::new();
    };
    command
        .requires
        .iter()
        .map(|dep| (dep, None))
        .chain(command.runner.iter().map(|runner| (runner, Some(DEFAULT_COMMAND))))
        .collect()
}

/// Implementation-level dependencies followed by those of `command`
fn all_dependencies<'i>(
    implementation: &'i Implementation,
    command: Option<&str>,
) -> Vec<(&'i Dependency, Option<&'static str>)> {
    let mut deps: Vec<_> = implementation.requires.iter().map(|dep| (dep, None)).collect();
    if let Some(command) = command {
        deps.extend(command_dependencies(implementation, command));
    }
    deps
}

/// Whether `candidate` may be selected for `request` in `state`
///
/// A rejection comes with the blame of whatever in `state` caused it.
fn check_candidate(
    state: &SearchState<'_>,
    request: &Request,
    candidate: Candidate<'_>,
) -> Result<(), (RejectReason, Blame)> {
    let implementation = candidate.implementation;
    let interface = request.interface.as_str();

    if !state.restrictions.permits(interface, &implementation.version) {
        let restriction = state
            .restrictions
            .get(interface)
            .map(ToString::to_string)
            .unwrap_or_default();
        let blame = state
            .restriction_blame
            .get(&request.interface)
            .cloned()
            .unwrap_or_default();
        return Err((RejectReason::OutsideRange { restriction }, blame));
    }
    if let Some(command) = &request.command {
        if !implementation.has_command(command) {
            return Err((
                RejectReason::MissingCommand {
                    command: command.clone(),
                },
                Blame::new(),
            ));
        }
    }
    if let Some((by, blame)) = state.forbidden.get(&request.interface) {
        return Err((
            RejectReason::ForbiddenBy {
                implementation: by.clone(),
            },
            blame.clone(),
        ));
    }
    if let Some((interface, chosen)) = implementation
        .conflicts
        .iter()
        .find_map(|uri| state.chosen.get(uri).map(|chosen| (uri, chosen)))
    {
        return Err((
            RejectReason::ConflictsWith {
                interface: interface.clone(),
            },
            chosen.blame.clone(),
        ));
    }

    for (dep, extra) in all_dependencies(implementation, request.command.as_deref()) {
        if dep.interface == request.interface {
            // an edge back to its own interface is judged against the candidate
            check_edge(dep, extra, implementation).map_err(|reason| (reason, Blame::new()))?;
        } else {
            check_against_selected(state, dep, extra)?;
        }
    }
    Ok(())
}

/// Check a dependency edge against the interface's current selection, if any
fn check_against_selected(
    state: &SearchState<'_>,
    dep: &Dependency,
    extra_command: Option<&str>,
) -> Result<(), (RejectReason, Blame)> {
    let Some(chosen) = state.chosen.get(&dep.interface) else {
        return Ok(());
    };
    check_edge(dep, extra_command, chosen.candidate.implementation)
        .map_err(|reason| (reason, chosen.blame.clone()))
}

/// Check a dependency edge against the implementation that would serve it
fn check_edge(
    dep: &Dependency,
    extra_command: Option<&str>,
    target: &Implementation,
) -> Result<(), RejectReason> {
    if let Some(range) = &dep.version {
        if !range.contains(&target.version) {
            return Err(RejectReason::ExcludesSelected {
                interface: dep.interface.clone(),
                range: range.clone(),
            });
        }
    }
    if dep.importance == Importance::Essential {
        if let Some(command) = required_commands(dep, extra_command)
            .into_iter()
            .find(|command| !target.has_command(command))
        {
            return Err(RejectReason::DependencyLacksCommand {
                interface: dep.interface.clone(),
                command: command.to_string(),
            });
        }
    }
    Ok(())
}
