use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::{is_solvable, Board, CostVector, Error, Move, Neighbors, Query};

type IndexMap<K, V> = indexmap::IndexMap<K, V, fxhash::FxBuildHasher>;

/// Best known route to one discovered board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record {
    pub distance: f64,
    pub steps: u32,
    /// Memo index of the previous board on the route.
    pub predecessor: Option<usize>,
    pub settled: bool,
}

impl Default for Record {
    fn default() -> Self {
        Self {
            distance: f64::INFINITY,
            steps: u32::MAX,
            predecessor: None,
            settled: false,
        }
    }
}

impl Record {
    fn improved_by(&self, distance: f64, steps: u32) -> bool {
        match distance.total_cmp(&self.distance) {
            Ordering::Less => true,
            Ordering::Equal => steps < self.steps,
            Ordering::Greater => false,
        }
    }
}

/// A frontier entry, holding the record's priority at push time.
#[derive(Debug, Clone, Copy)]
struct Entry {
    distance: f64,
    steps: u32,
    seq: u64,
    index: usize,
}

impl Entry {
    /// Ascending distance, then steps, then insertion order.
    fn priority(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.steps.cmp(&other.steps))
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.priority(other) == Ordering::Equal
    }
}
impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Entry {
    // Reversed, so the max-heap pops the smallest priority.
    fn cmp(&self, other: &Self) -> Ordering {
        other.priority(self)
    }
}

#[derive(Debug, Default)]
struct Frontier {
    heap: BinaryHeap<Entry>,
    seq: u64,
}

impl Frontier {
    fn push(&mut self, index: usize, record: &Record) {
        self.heap.push(Entry {
            distance: record.distance,
            steps: record.steps,
            seq: self.seq,
            index,
        });
        self.seq += 1;
    }

    fn pop(&mut self) -> Option<Entry> {
        self.heap.pop()
    }

    fn clear(&mut self) {
        self.heap.clear();
        self.seq = 0;
    }
}

/// Dijkstra search state for one initial board and cost model.
///
/// The memo and frontier survive between goals, so later goals continue
/// from whatever the previous ones already explored.
#[derive(Debug)]
pub struct Session {
    initial: Board,
    costs: CostVector,
    records: IndexMap<Board, Record>,
    frontier: Frontier,
}

impl Session {
    pub fn new(initial: Board, costs: CostVector) -> Self {
        let mut session = Self {
            initial,
            costs,
            records: IndexMap::default(),
            frontier: Frontier::default(),
        };
        session.start();
        session
    }

    /// Drops everything explored so far and starts over from `initial`.
    pub fn restart(&mut self, initial: Board, costs: CostVector) {
        self.initial = initial;
        self.costs = costs;
        self.start();
    }

    fn start(&mut self) {
        debug!(
            initial = %self.initial.to_line(),
            discarded = self.records.len(),
            "starting session"
        );
        self.records.clear();
        self.frontier.clear();
        let root = Record {
            distance: 0.0,
            steps: 0,
            ..Record::default()
        };
        let (index, _) = self.records.insert_full(self.initial.clone(), root);
        self.frontier.push(index, &root);
    }

    pub fn matches(&self, initial: &Board, costs: &CostVector) -> bool {
        self.initial == *initial && self.costs == *costs
    }

    pub fn initial(&self) -> &Board {
        &self.initial
    }

    pub fn costs(&self) -> &CostVector {
        &self.costs
    }

    pub fn record(&self, board: &Board) -> Option<&Record> {
        self.records.get(board)
    }

    pub fn settled_count(&self) -> usize {
        self.records.values().filter(|record| record.settled).count()
    }

    fn settled_index(&self, board: &Board) -> Option<usize> {
        let (index, _, record) = self.records.get_full(board)?;
        record.settled.then_some(index)
    }

    /// Settles boards until `goal` is settled, or until the frontier runs dry.
    /// Returns the memo index of the settled goal.
    pub fn expand_toward(&mut self, goal: Option<&Board>) -> Option<usize> {
        if let Some(index) = goal.and_then(|goal| self.settled_index(goal)) {
            trace!(index, "goal already settled");
            return Some(index);
        }

        while let Some(entry) = self.frontier.pop() {
            #[cfg(feature = "coz")]
            coz::scope!("Expand");

            let Some((board, record)) = self.records.get_index_mut(entry.index) else {
                continue;
            };
            // Stale entry.
            if record.settled {
                continue;
            }
            record.settled = true;
            let current = *record;
            let board = board.clone();

            for next in board.neighbors() {
                let distance = current.distance + f64::from(self.costs.edge_cost(&board, &next));
                let steps = current.steps + 1;
                let slot = self.records.entry(next);
                let index = slot.index();
                let record = slot.or_default();
                if record.settled || !record.improved_by(distance, steps) {
                    continue;
                }
                *record = Record {
                    distance,
                    steps,
                    predecessor: Some(entry.index),
                    settled: false,
                };
                self.frontier.push(index, record);
            }

            // Goals are expanded like any other settled board.
            if goal == Some(&board) {
                debug!(
                    distance = current.distance,
                    steps = current.steps,
                    discovered = self.records.len(),
                    "goal settled"
                );
                return Some(entry.index);
            }
        }

        debug!(discovered = self.records.len(), "frontier exhausted");
        None
    }

    /// Settles the whole component reachable from the initial board.
    pub fn explore(&mut self) -> usize {
        self.expand_toward(None);
        self.settled_count()
    }

    /// Cheapest route to `goal`, skipping the parity check.
    pub fn shortest_path(&mut self, goal: &Board) -> Result<Solution, Error> {
        let index = self
            .expand_toward(Some(goal))
            .ok_or_else(|| Error::ExhaustedSearch {
                goal: goal.to_line(),
            })?;
        Ok(self.reconstruct(index))
    }

    /// Cheapest route to `goal`, or the unreachable solution if `goal` fails
    /// the parity check.
    pub fn solution(&mut self, goal: &Board) -> Result<Solution, Error> {
        if !passes_parity(&self.initial, goal) {
            return Ok(Solution::unreachable());
        }
        self.shortest_path(goal)
    }

    fn reconstruct(&self, index: usize) -> Solution {
        let chain = std::iter::successors(self.records.get_index(index), |(_, record)| {
            record
                .predecessor
                .and_then(|prev| self.records.get_index(prev))
        })
        .collect::<Vec<_>>();
        let distance = chain.first().map_or(0.0, |(_, record)| record.distance);
        let mut path = chain
            .into_iter()
            .map(|(board, _)| board.clone())
            .collect::<Vec<_>>();
        path.reverse();

        Solution {
            cost: distance.trunc() as i64,
            steps: path.len() as i64 - 1,
            path,
            reachable: true,
        }
    }
}

fn passes_parity(initial: &Board, goal: &Board) -> bool {
    let solvable = is_solvable(initial, goal);
    if !solvable {
        debug!(goal = %goal.to_line(), "goal fails the parity check");
    }
    solvable
}

#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub cost: i64,
    pub steps: i64,
    /// Boards from the initial to the goal, both included.
    pub path: Vec<Board>,
    pub reachable: bool,
}

impl Solution {
    pub fn unreachable() -> Self {
        Self {
            cost: -1,
            steps: -1,
            path: Vec::new(),
            reachable: false,
        }
    }

    pub fn moves(&self) -> impl Iterator<Item = Move> + '_ {
        self.path.windows(2).filter_map(|w| w[0].step_to(&w[1]))
    }
}

/// Answers queries in order, keeping one session alive while consecutive
/// queries share the initial board and costs.
#[derive(Debug, Default)]
pub struct Solver {
    session: Option<Session>,
}

impl Solver {
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn solve(&mut self, query: &Query) -> Result<Solution, Error> {
        if !passes_parity(&query.initial, &query.goal) {
            return Ok(Solution::unreachable());
        }

        let session = match self.session.take() {
            Some(session) if session.matches(&query.initial, &query.costs) => {
                trace!("reusing session");
                session
            }
            Some(mut session) => {
                session.restart(query.initial.clone(), query.costs.clone());
                session
            }
            None => Session::new(query.initial.clone(), query.costs.clone()),
        };
        self.session.insert(session).shortest_path(&query.goal)
    }
}

/// Solves a batch, preserving input order. Runs of consecutive queries sharing
/// the initial board and costs go to one solver; runs are solved in parallel.
pub fn solve_batch(
    queries: &[Query],
    on_solved: impl Fn() + Sync,
) -> Vec<Result<Solution, Error>> {
    let runs = queries
        .chunk_by(|a, b| a.initial == b.initial && a.costs == b.costs)
        .collect::<Vec<_>>();
    debug!(queries = queries.len(), runs = runs.len(), "solving batch");

    runs.into_par_iter()
        .map(|run| {
            let mut solver = Solver::default();
            run.iter()
                .map(|query| {
                    let solution = solver.solve(query);
                    on_solved();
                    solution
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}
