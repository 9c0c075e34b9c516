//! A* search for the shortest way to clear the pyramid.
//!
//! The search runs over packed `State`s. Each frontier entry is an immutable `Node` that
//! shares its ancestors through `Rc`, so the winning path is rebuilt by walking parent
//! links instead of storing a path per node.
use crate::cards::Deck;
use crate::engine::{Action, RuleEngine};
use crate::queue::BucketQueue;
use crate::state::State;
use log::{debug, info};
#[cfg(debug_assertions)]
use std::collections::HashSet;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Bound on `depth + heuristic` for any node: at most 72 draws (24 cards over three
/// passes), 2 recycles, and 52 units shared between removals made and the heuristic for
/// the cards left, since each removal takes at least one card and the heuristic counts
/// at most one action per remaining pyramid card.
pub const MAX_PRIORITY: usize = 72 + 2 + 52 + 1;

/// A state reached during the search, with a link back to the state it came from.
#[derive(Debug)]
pub struct Node {
    state: State,
    parent: Option<Rc<Node>>,
    depth: u8,
}

impl Node {
    pub fn root(state: State) -> Rc<Node> {
        Rc::new(Node {
            state,
            parent: None,
            depth: 0,
        })
    }

    pub fn child(parent: &Rc<Node>, state: State) -> Rc<Node> {
        Rc::new(Node {
            state,
            parent: Some(Rc::clone(parent)),
            depth: parent.depth + 1,
        })
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Number of actions taken to reach this node.
    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn parent(&self) -> Option<&Rc<Node>> {
        self.parent.as_ref()
    }

    /// The states from the root to this node, inclusive.
    pub fn states(&self) -> Vec<State> {
        let mut states = vec![self.state];
        let mut current = self.parent.as_ref();
        while let Some(node) = current {
            states.push(node.state);
            current = node.parent.as_ref();
        }
        states.reverse();
        states
    }
}

/// A shortest sequence of actions that clears the pyramid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Solution {
    /// Actions in the order they are performed.
    pub actions: Vec<Action>,
    /// Every state along the way, from the initial state to the cleared one.
    pub states: Vec<State>,
}

impl Solution {
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Counters describing one search.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes popped and expanded.
    pub expanded: u64,
    /// Successor states generated, before duplicate suppression.
    pub generated: u64,
    /// Nodes popped after a shorter path to their state was found.
    pub stale: u64,
    /// Distinct states recorded in the seen-state table.
    pub seen_states: usize,
    /// Distinct pyramid occupancies memoized by the rule engine.
    pub cached_boards: usize,
    pub elapsed: Duration,
}

/// Why a search stopped without an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    /// The configured expansion budget ran out before the search finished.
    BudgetExhausted { expansions: u64 },
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveError::BudgetExhausted { expansions } => {
                write!(f, "search budget exhausted after {} expansions", expansions)
            }
        }
    }
}

impl std::error::Error for SolveError {}

/// Finds the minimum number of actions needed to clear the pyramid of one deal.
///
/// # Examples
/// ```
/// use pyramid_solver::cards::Deck;
/// use pyramid_solver::solver::Solver;
///
/// let deck: Deck = "Kd Kc Qh Ah 7d 6d 8d 5d 9d 4d Td 3d Jd 2d Qd Ad 7c 6c 8c 5c 9c 4c Tc 3c \
///                   Jc 2c Qc Ac 6h 7h 5h 8h 4h 9h 3h Th 2h Jh Kh As 2s 3s 4s 5s 6s 7s 8s 9s \
///                   Ts Js Qs Ks".parse().unwrap();
/// let solution = Solver::new(deck).solve().unwrap().unwrap();
/// assert_eq!(solution.len(), 15);
/// ```
#[derive(Debug)]
pub struct Solver {
    engine: RuleEngine,
    max_expansions: Option<u64>,
    stats: SearchStats,
}

impl Solver {
    pub fn new(deck: Deck) -> Self {
        Solver {
            engine: RuleEngine::new(deck),
            max_expansions: None,
            stats: SearchStats::default(),
        }
    }

    /// Stops the search with `SolveError::BudgetExhausted` after `limit` expansions.
    pub fn with_max_expansions(mut self, limit: u64) -> Self {
        self.max_expansions = Some(limit);
        self
    }

    /// Counters from the most recent call to `solve`.
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    pub fn engine(&mut self) -> &mut RuleEngine {
        &mut self.engine
    }

    /// Runs the search.
    ///
    /// # Returns
    /// * `Ok(Some(solution))` with a shortest solution if the pyramid can be cleared.
    /// * `Ok(None)` if it cannot.
    /// * `Err(SolveError::BudgetExhausted)` if an expansion budget was set and ran out.
    pub fn solve(&mut self) -> Result<Option<Solution>, SolveError> {
        let started = Instant::now();
        self.stats = SearchStats::default();
        let mut seen_states: HashMap<State, u8> = HashMap::new();
        let result = self.search(&mut seen_states);

        self.stats.seen_states = seen_states.len();
        self.stats.cached_boards = self.engine.cached_boards();
        self.stats.elapsed = started.elapsed();
        info!(
            "search finished in {:?}: {} expanded, {} generated, {} stale, {} states, {} boards",
            self.stats.elapsed,
            self.stats.expanded,
            self.stats.generated,
            self.stats.stale,
            self.stats.seen_states,
            self.stats.cached_boards
        );
        result
    }

    fn search(
        &mut self,
        seen_states: &mut HashMap<State, u8>,
    ) -> Result<Option<Solution>, SolveError> {
        let mut fringe: BucketQueue<Rc<Node>> = BucketQueue::new(MAX_PRIORITY);
        let initial = State::initial();
        if self.engine.is_unwinnable(initial) {
            info!("initial state is unwinnable");
            return Ok(None);
        }
        seen_states.insert(initial, 0);
        let initial_cost = self.engine.heuristic_cost(initial.pyramid_flags()) as usize;
        debug!("initial heuristic cost {}", initial_cost);
        fringe.push(Node::root(initial), initial_cost);
        #[cfg(debug_assertions)]
        let mut expanded_states: HashSet<State> = HashSet::new();

        let mut last_priority = 0;
        while let Some((node, priority)) = fringe.pop_with_priority() {
            if seen_states
                .get(&node.state)
                .is_some_and(|&best| best < node.depth)
            {
                self.stats.stale += 1;
                continue;
            }
            if priority > last_priority {
                debug!(
                    "priority {} reached: {} expanded, {} queued",
                    priority,
                    self.stats.expanded,
                    fringe.len()
                );
                last_priority = priority;
            }
            if self.engine.is_pyramid_clear(node.state) {
                return Ok(Some(self.reconstruct(&node)));
            }
            if let Some(limit) = self.max_expansions {
                if self.stats.expanded >= limit {
                    return Err(SolveError::BudgetExhausted {
                        expansions: self.stats.expanded,
                    });
                }
            }

            #[cfg(debug_assertions)]
            assert!(
                expanded_states.insert(node.state),
                "state {} expanded twice",
                node.state
            );
            self.stats.expanded += 1;
            let next_depth = node.depth + 1;
            for next in self.engine.successors(node.state) {
                self.stats.generated += 1;
                let improves = match seen_states.get(&next) {
                    Some(&best) => next_depth < best,
                    None => true,
                };
                if !improves {
                    continue;
                }
                seen_states.insert(next, next_depth);
                if !self.engine.is_unwinnable(next) {
                    let cost = self.engine.heuristic_cost(next.pyramid_flags());
                    fringe.push(
                        Node::child(&node, next),
                        next_depth as usize + cost as usize,
                    );
                }
            }
        }
        Ok(None)
    }

    fn reconstruct(&mut self, node: &Node) -> Solution {
        let states = node.states();
        let actions = states
            .windows(2)
            .map(|pair| {
                self.engine
                    .action_between(pair[0], pair[1])
                    .unwrap_or_else(|| panic!("no action leads from {} to {}", pair[0], pair[1]))
            })
            .collect();
        Solution { actions, states }
    }
}

/// Returns a shortest action sequence that clears the pyramid, or `None` if it cannot be
/// cleared.
pub fn solve(deck: &Deck) -> Option<Vec<Action>> {
    Solver::new(deck.clone())
        .solve()
        .ok()
        .flatten()
        .map(|solution| solution.actions)
}

/// Plays `actions` from the initial state.
///
/// # Returns
/// The final state, or `None` as soon as an action is not legal.
pub fn replay(deck: &Deck, actions: &[Action]) -> Option<State> {
    let mut engine = RuleEngine::new(deck.clone());
    actions
        .iter()
        .try_fold(State::initial(), |state, action| engine.apply(state, action))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Location, Removal};
    use std::collections::{HashSet, VecDeque};

    const MINIMAL_DECK: &str = "
                    Kd
                  Kc  Qh
                Ah  7d  6d
              8d  5d  9d  4d
            Td  3d  Jd  2d  Qd
          Ad  7c  6c  8c  5c  9c
        4c  Tc  3c  Jc  2c  Qc  Ac
        6h 7h 5h 8h 4h 9h 3h Th 2h Jh Kh As 2s 3s 4s 5s 6s 7s 8s 9s Ts Js Qs Ks";

    /// Same as `MINIMAL_DECK` with the apex Ace needing the Queen at the bottom of the stock.
    const BURIED_QUEEN_DECK: &str = "
                    As
                  Kc  Qh
                Ah  7d  6d
              8d  5d  9d  4d
            Td  3d  Jd  2d  Qd
          Ad  7c  6c  8c  5c  9c
        4c  Tc  3c  Jc  2c  Qc  Ac
        6h 7h 5h 8h 4h 9h 3h Th 2h Jh Kh Kd 2s 3s 4s 5s 6s 7s 8s 9s Ts Js Ks Qs";

    /// Apex Ace with all four Queens below it: no partner can ever reach it.
    const STUCK_ACE_DECK: &str = "
                    Ah
                  Qh  Qd
                Qc  Qs  2c
              3c  4c  5c  6c
            7c  8c  9c  Tc  Jc
          Kc  Ad  2d  3d  4d  5d
        6d  7d  8d  9d  Td  Jd  Kd
        2h 3h 4h 5h 6h 7h 8h 9h Th Jh Kh As 2s 3s 4s 5s 6s 7s 8s 9s Ts Js Ks Ac";

    fn deck(text: &str) -> Deck {
        text.parse().unwrap()
    }

    /// Plain breadth-first search with no pruning, as an optimality reference.
    fn bfs_solution_length(deck: &Deck) -> Option<usize> {
        let mut engine = RuleEngine::new(deck.clone());
        let mut seen = HashSet::new();
        let mut frontier = VecDeque::new();
        seen.insert(State::initial());
        frontier.push_back((State::initial(), 0));
        while let Some((state, depth)) = frontier.pop_front() {
            if state.is_pyramid_clear() {
                return Some(depth);
            }
            for next in engine.successors(state) {
                if seen.insert(next) {
                    frontier.push_back((next, depth + 1));
                }
            }
        }
        None
    }

    #[test]
    fn test_node_states_walk_parent_chain() {
        let start = State::initial();
        let root = Node::root(start);
        let first = Node::child(&root, start.draw());
        let second = Node::child(&first, start.draw().draw());
        assert_eq!(second.depth(), 2);
        assert_eq!(second.states(), vec![start, start.draw(), start.draw().draw()]);
        assert_eq!(second.parent().map(|p| p.state()), Some(start.draw()));
        assert!(root.parent().is_none());
    }

    #[test]
    fn test_solve_pyramid_only_deal() {
        let deck = deck(MINIMAL_DECK);
        let mut solver = Solver::new(deck.clone());
        let solution = solver.solve().unwrap().unwrap();
        assert_eq!(solution.len(), 15);
        assert_eq!(solution.states.len(), 16);
        assert!(solution
            .actions
            .iter()
            .all(|a| !matches!(a, Action::Draw | Action::Recycle)));
        let end = replay(&deck, &solution.actions).unwrap();
        assert!(end.is_pyramid_clear());
        assert_eq!(solution.states.last(), Some(&end));
    }

    #[test]
    fn test_solve_matches_breadth_first_reference() {
        let deck = deck(MINIMAL_DECK);
        assert_eq!(bfs_solution_length(&deck), Some(15));
        assert_eq!(solve(&deck).map(|a| a.len()), Some(15));
    }

    #[test]
    fn test_solve_with_stock_matches_breadth_first_reference() {
        let deck = Deck::new_random_with_seed(15);
        let actions = solve(&deck).unwrap();
        assert!(actions.contains(&Action::Draw));
        assert_eq!(bfs_solution_length(&deck), Some(actions.len()));
        assert_eq!(actions.len(), 37);
        assert!(replay(&deck, &actions).unwrap().is_pyramid_clear());
    }

    #[test]
    fn test_solve_sorted_deck() {
        let deck = Deck::sorted();
        let actions = solve(&deck).unwrap();
        assert_eq!(actions.len(), 27);
        assert!(replay(&deck, &actions).unwrap().is_pyramid_clear());
    }

    #[test]
    fn test_solve_needs_card_at_bottom_of_stock() {
        let deck = deck(BURIED_QUEEN_DECK);
        let mut solver = Solver::new(deck.clone());
        let solution = solver.solve().unwrap().unwrap();
        assert!(solution.actions.contains(&Action::Draw));
        let queen: crate::cards::Card = "Qs".parse().unwrap();
        assert!(solution.actions.iter().any(|a| a.removed_cards().contains(&queen)));
        let start_cost = solver.engine().heuristic_cost(State::initial().pyramid_flags());
        assert!(solution.len() > start_cost as usize);
        assert!(replay(&deck, &solution.actions)
            .unwrap()
            .is_pyramid_clear());
    }

    #[test]
    fn test_unwinnable_initial_state_has_no_solution() {
        let deck = deck(STUCK_ACE_DECK);
        let mut solver = Solver::new(deck.clone());
        assert_eq!(solver.solve(), Ok(None));
        assert_eq!(solver.stats().expanded, 0);
        assert_eq!(solve(&deck), None);
    }

    #[test]
    fn test_exhausted_search_has_no_solution() {
        let deck = Deck::new_random_with_seed(27);
        let mut solver = Solver::new(deck.clone());
        assert!(!solver.engine().is_unwinnable(State::initial()));
        assert_eq!(solver.solve(), Ok(None));
        assert!(solver.stats().expanded > 0);
        assert_eq!(bfs_solution_length(&deck), None);
    }

    #[test]
    fn test_solve_is_repeatable() {
        let deck = deck(MINIMAL_DECK);
        let mut solver = Solver::new(deck.clone());
        let first = solver.solve().unwrap().unwrap();
        let second = solver.solve().unwrap().unwrap();
        assert_eq!(first.len(), second.len());
        assert_eq!(solve(&deck).unwrap().len(), first.len());
    }

    #[test]
    fn test_states_are_never_expanded_twice() {
        // Debug builds assert inside the search that every expanded state is new.
        for deck in [Deck::sorted(), Deck::new_random_with_seed(15)] {
            let mut solver = Solver::new(deck);
            solver.solve().unwrap().unwrap();
            let stats = solver.stats();
            assert!(stats.expanded > 0);
            assert!(stats.expanded as usize <= stats.seen_states);
            assert!(stats.generated >= stats.seen_states as u64 - 1);
            assert!(stats.cached_boards > 0);
        }
    }

    #[test]
    fn test_budget_exhausted() {
        let mut solver = Solver::new(Deck::sorted()).with_max_expansions(10);
        assert_eq!(
            solver.solve(),
            Err(SolveError::BudgetExhausted { expansions: 10 })
        );
        assert_eq!(
            SolveError::BudgetExhausted { expansions: 10 }.to_string(),
            "search budget exhausted after 10 expansions"
        );
    }

    #[test]
    fn test_replay_rejects_illegal_sequence() {
        let deck = Deck::sorted();
        assert_eq!(replay(&deck, &[]), Some(State::initial()));
        let illegal = Action::Remove(Removal {
            card: "Kc".parse().unwrap(),
            location: Location::Pyramid(12),
        });
        assert_eq!(replay(&deck, &[illegal]), None);
        assert_eq!(replay(&deck, &[Action::Draw, Action::Recycle]), None);
    }
}
