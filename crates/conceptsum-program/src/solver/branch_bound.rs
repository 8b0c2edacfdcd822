//! In-process exact solver for coverage programs.
//!
//! Depth-first branch and bound over the sentence variables. Concept
//! variables follow from the selection (a concept is on iff a selected
//! sentence covers it, which is optimal for non-negative weights under both
//! coverage modes) and acronym variables are on iff a selected sentence
//! uses the acronym. Nodes are pruned with a fractional-knapsack bound that
//! credits every remaining sentence with the full weight of the concepts it
//! would newly cover; coverage is submodular, so the bound never
//! underestimates.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tracing::debug;

use conceptsum_core::{Error, Result};

use crate::linear::{Assignment, Program};
use crate::solver::Optimizer;

const EPS: f64 = 1e-9;
const CLOCK_CHECK_INTERVAL: u64 = 1024;

#[derive(Debug, Clone)]
pub struct BranchAndBound {
    time_limit: Duration,
    node_limit: u64,
}

impl BranchAndBound {
    pub fn new(time_limit: Duration, node_limit: u64) -> Self {
        Self {
            time_limit,
            node_limit,
        }
    }
}

impl Default for BranchAndBound {
    fn default() -> Self {
        Self::new(Duration::from_secs(60), 5_000_000)
    }
}

#[derive(Debug)]
struct Item {
    var: String,
    length: f64,
    concepts: Vec<usize>,
    acronyms: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Deadline,
    NodeLimit,
}

struct Search {
    items: Vec<Item>,
    weights: Vec<f64>,
    acronym_costs: Vec<f64>,
    capacity: f64,

    covered: Vec<u32>,
    acronyms_used: Vec<u32>,
    chosen: Vec<bool>,
    used: f64,
    value: f64,

    best: Vec<bool>,
    best_value: f64,

    nodes: u64,
    node_limit: u64,
    deadline: Instant,
    stop: Option<Stop>,
}

impl Search {
    fn new(program: &Program, time_limit: Duration, node_limit: u64) -> Self {
        let coverage = &program.coverage;
        let concept_ids: BTreeMap<&str, usize> = coverage
            .concept_weights
            .keys()
            .enumerate()
            .map(|(i, v)| (v.as_str(), i))
            .collect();
        let acronym_ids: BTreeMap<&str, usize> = coverage
            .acronym_costs
            .keys()
            .enumerate()
            .map(|(i, v)| (v.as_str(), i))
            .collect();
        let weights: Vec<f64> = coverage.concept_weights.values().copied().collect();

        let mut items: Vec<Item> = coverage
            .lengths
            .iter()
            .map(|(var, &length)| Item {
                var: var.clone(),
                length,
                concepts: coverage
                    .covers
                    .get(var)
                    .into_iter()
                    .flatten()
                    .filter_map(|c| concept_ids.get(c.as_str()).copied())
                    .collect(),
                acronyms: coverage
                    .acronym_links
                    .get(var)
                    .into_iter()
                    .flatten()
                    .filter_map(|a| acronym_ids.get(a.as_str()).copied())
                    .collect(),
            })
            .collect();

        // Densest first; ties keep sentence order.
        let density = |item: &Item| {
            let gain: f64 = item.concepts.iter().map(|&c| weights[c]).sum();
            if item.length > 0.0 {
                gain / item.length
            } else {
                f64::INFINITY
            }
        };
        let position = |item: &Item| item.var[1..].parse::<usize>().unwrap_or(usize::MAX);
        items.sort_by(|a, b| {
            density(b)
                .partial_cmp(&density(a))
                .unwrap_or(Ordering::Equal)
                .then_with(|| position(a).cmp(&position(b)))
        });

        let n = items.len();
        Self {
            covered: vec![0; weights.len()],
            acronyms_used: vec![0; acronym_ids.len()],
            acronym_costs: coverage.acronym_costs.values().copied().collect(),
            weights,
            capacity: program.length_limit as f64,
            chosen: vec![false; n],
            used: 0.0,
            value: 0.0,
            best: vec![false; n],
            best_value: 0.0,
            nodes: 0,
            node_limit,
            deadline: Instant::now() + time_limit,
            stop: None,
            items,
        }
    }

    fn gain(&self, i: usize) -> f64 {
        self.items[i]
            .concepts
            .iter()
            .filter(|&&c| self.covered[c] == 0)
            .map(|&c| self.weights[c])
            .sum()
    }

    fn extra_cost(&self, i: usize) -> f64 {
        let item = &self.items[i];
        item.length
            + item
                .acronyms
                .iter()
                .filter(|&&a| self.acronyms_used[a] == 0)
                .map(|&a| self.acronym_costs[a])
                .sum::<f64>()
    }

    fn include(&mut self, i: usize) {
        let item = &self.items[i];
        for &c in &item.concepts {
            if self.covered[c] == 0 {
                self.value += self.weights[c];
            }
            self.covered[c] += 1;
        }
        for &a in &item.acronyms {
            if self.acronyms_used[a] == 0 {
                self.used += self.acronym_costs[a];
            }
            self.acronyms_used[a] += 1;
        }
        self.used += item.length;
        self.chosen[i] = true;
    }

    fn exclude(&mut self, i: usize) {
        let item = &self.items[i];
        for &c in &item.concepts {
            self.covered[c] -= 1;
            if self.covered[c] == 0 {
                self.value -= self.weights[c];
            }
        }
        for &a in &item.acronyms {
            self.acronyms_used[a] -= 1;
            if self.acronyms_used[a] == 0 {
                self.used -= self.acronym_costs[a];
            }
        }
        self.used -= item.length;
        self.chosen[i] = false;
    }

    /// Optimistic value reachable by adding items from `from` onwards.
    fn bound(&self, from: usize) -> f64 {
        let mut room = self.capacity - self.used;
        let mut bound = self.value;
        let mut rest: Vec<(f64, f64)> = Vec::new();
        for i in from..self.items.len() {
            let length = self.items[i].length;
            if length > room + EPS {
                continue;
            }
            let gain = self.gain(i);
            if gain <= 0.0 {
                continue;
            }
            if length <= 0.0 {
                bound += gain;
            } else {
                rest.push((gain, length));
            }
        }
        rest.sort_by(|a, b| (b.0 / b.1).partial_cmp(&(a.0 / a.1)).unwrap_or(Ordering::Equal));
        for (gain, length) in rest {
            if room <= 0.0 {
                break;
            }
            if length <= room {
                bound += gain;
                room -= length;
            } else {
                bound += gain * room / length;
                room = 0.0;
            }
        }
        bound
    }

    fn record_incumbent(&mut self) {
        if self.value > self.best_value + EPS {
            self.best_value = self.value;
            self.best.clone_from(&self.chosen);
        }
    }

    /// Take items in density order while they fit and add value.
    fn greedy(&mut self) {
        for i in 0..self.items.len() {
            if self.gain(i) > 0.0 && self.used + self.extra_cost(i) <= self.capacity + EPS {
                self.include(i);
            }
        }
        self.record_incumbent();
        for i in 0..self.items.len() {
            if self.chosen[i] {
                self.exclude(i);
            }
        }
    }

    fn explore(&mut self, i: usize) {
        if self.stop.is_some() {
            return;
        }
        self.nodes += 1;
        if self.nodes > self.node_limit {
            self.stop = Some(Stop::NodeLimit);
            return;
        }
        if self.nodes % CLOCK_CHECK_INTERVAL == 0 && Instant::now() >= self.deadline {
            self.stop = Some(Stop::Deadline);
            return;
        }

        self.record_incumbent();
        if i == self.items.len() || self.bound(i) <= self.best_value + EPS {
            return;
        }

        if self.gain(i) > 0.0 && self.used + self.extra_cost(i) <= self.capacity + EPS {
            self.include(i);
            self.explore(i + 1);
            self.exclude(i);
        }
        self.explore(i + 1);
    }

    fn assignment(&self, program: &Program) -> Assignment {
        let mut covered = vec![false; self.weights.len()];
        let mut used = vec![false; self.acronym_costs.len()];
        let mut assignment = Assignment::new();
        for (item, &on) in self.items.iter().zip(&self.best) {
            assignment.set(item.var.clone(), u8::from(on));
            if on {
                item.concepts.iter().for_each(|&c| covered[c] = true);
                item.acronyms.iter().for_each(|&a| used[a] = true);
            }
        }
        for (var, on) in program.coverage.concept_weights.keys().zip(covered) {
            assignment.set(var.clone(), u8::from(on));
        }
        for (var, on) in program.coverage.acronym_costs.keys().zip(used) {
            assignment.set(var.clone(), u8::from(on));
        }
        for var in &program.binaries {
            let value = assignment.get(var);
            assignment.set(var.clone(), value);
        }
        assignment
    }
}

impl Optimizer for BranchAndBound {
    fn solve(&self, program: &Program) -> Result<Assignment> {
        let started = Instant::now();
        let mut search = Search::new(program, self.time_limit, self.node_limit);
        search.greedy();
        let greedy_value = search.best_value;
        search.explore(0);

        match search.stop {
            Some(Stop::Deadline) => {
                return Err(Error::solver(
                    &program.problem_id,
                    format!("time limit of {}s exceeded", self.time_limit.as_secs()),
                ))
            }
            Some(Stop::NodeLimit) => {
                return Err(Error::solver(
                    &program.problem_id,
                    format!("node limit of {} exhausted", self.node_limit),
                ))
            }
            None => {}
        }

        let assignment = search.assignment(program);
        let violated = program.violations(&assignment);
        if !violated.is_empty() {
            return Err(Error::solver(
                &program.problem_id,
                format!("assignment violates {}", violated.join(", ")),
            ));
        }
        debug!(
            "{}: optimum {:.3} (greedy {:.3}) after {} nodes in {:?}",
            program.problem_id,
            search.best_value,
            greedy_value,
            search.nodes,
            started.elapsed()
        );
        Ok(assignment)
    }

    fn name(&self) -> &str {
        "branch-and-bound"
    }
}
