//! Linear expressions, constraints and the selection program.
//!
//! A [`Program`] is a maximization over binary variables. Besides the
//! generic rows it keeps typed tables (the sentence registry, the concept
//! variables and the coverage structure) so that decoding and the in-process
//! optimizer never have to parse variable names back.

use std::collections::{BTreeMap, BTreeSet};

use conceptsum_concepts::Concept;
use conceptsum_core::{LengthUnit, Sentence};
use conceptsum_ingest::AcronymTable;

const EPS: f64 = 1e-9;

/// Name of the selection variable for sentence `index`.
pub fn sentence_var(index: usize) -> String {
    format!("s{}", index)
}

pub fn concept_var(id: usize) -> String {
    format!("c{}", id)
}

pub fn acronym_var(id: usize) -> String {
    format!("a{}", id)
}

/// Sentence index of a selection variable name.
///
/// Accepts exactly `s` followed by a decimal index without leading zeros.
pub fn parse_sentence_var(name: &str) -> Option<usize> {
    let digits = name.strip_prefix('s')?;
    if digits.is_empty()
        || !digits.bytes().all(|b| b.is_ascii_digit())
        || (digits.len() > 1 && digits.starts_with('0'))
    {
        return None;
    }
    digits.parse().ok()
}

/// Sum of coefficient × variable terms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: BTreeMap<String, f64>,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `coeff · var`, merging with an existing term.
    pub fn add_term(&mut self, var: impl Into<String>, coeff: f64) {
        let entry = self.terms.entry(var.into()).or_insert(0.0);
        *entry += coeff;
        self.terms.retain(|_, c| c.abs() > 1e-12);
    }

    pub fn with_term(mut self, var: impl Into<String>, coeff: f64) -> Self {
        self.add_term(var, coeff);
        self
    }

    pub fn terms(&self) -> impl Iterator<Item = (&str, f64)> {
        self.terms.iter().map(|(v, c)| (v.as_str(), *c))
    }

    pub fn coefficient(&self, var: &str) -> f64 {
        self.terms.get(var).copied().unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn evaluate(&self, assignment: &Assignment) -> f64 {
        self.terms
            .iter()
            .map(|(v, c)| c * f64::from(assignment.get(v)))
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

impl Sense {
    fn as_lp(self) -> &'static str {
        match self {
            Sense::Le => "<=",
            Sense::Ge => ">=",
            Sense::Eq => "=",
        }
    }
}

/// `expr sense rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub expr: LinearExpr,
    pub sense: Sense,
    pub rhs: f64,
}

impl Constraint {
    pub fn new(name: impl Into<String>, expr: LinearExpr, sense: Sense, rhs: f64) -> Self {
        Self {
            name: name.into(),
            expr,
            sense,
            rhs,
        }
    }

    pub fn is_satisfied(&self, assignment: &Assignment) -> bool {
        let lhs = self.expr.evaluate(assignment);
        match self.sense {
            Sense::Le => lhs <= self.rhs + EPS,
            Sense::Ge => lhs >= self.rhs - EPS,
            Sense::Eq => (lhs - self.rhs).abs() <= EPS,
        }
    }
}

/// 0/1 values per variable; absent variables read as 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    values: BTreeMap<String, u8>,
}

impl Assignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable; any non-zero value is stored as 1.
    pub fn set(&mut self, var: impl Into<String>, value: u8) {
        self.values.insert(var.into(), u8::from(value != 0));
    }

    pub fn get(&self, var: &str) -> u8 {
        self.values.get(var).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u8)> {
        self.values.iter().map(|(v, x)| (v.as_str(), *x))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, u8)> for Assignment {
    fn from_iter<I: IntoIterator<Item = (S, u8)>>(iter: I) -> Self {
        let mut assignment = Self::new();
        for (var, value) in iter {
            assignment.set(var, value);
        }
        assignment
    }
}

/// Coverage structure behind the generic rows, indexed by variable name.
#[derive(Debug, Clone, Default)]
pub struct Coverage {
    /// Sentence variable → length in the program's unit.
    pub lengths: BTreeMap<String, f64>,
    /// Sentence variable → concept variables it covers.
    pub covers: BTreeMap<String, Vec<String>>,
    /// Sentence variable → acronym variables it forces on.
    pub acronym_links: BTreeMap<String, Vec<String>>,
    /// Acronym variable → definition cost.
    pub acronym_costs: BTreeMap<String, f64>,
    /// Concept variable → objective weight.
    pub concept_weights: BTreeMap<String, f64>,
    /// Selecting a sentence forces all of its concepts on.
    pub all_or_nothing: bool,
}

/// The sentence-selection program for one problem.
#[derive(Debug, Clone)]
pub struct Program {
    pub problem_id: String,
    /// Maximized.
    pub objective: LinearExpr,
    pub constraints: Vec<Constraint>,
    pub binaries: BTreeSet<String>,
    /// Sentence variable name → candidate sentence.
    pub binary: BTreeMap<String, Sentence>,
    /// Concept variable name → concept.
    pub concepts: BTreeMap<String, Concept>,
    /// Definitions available to the compressor.
    pub acronyms: AcronymTable,
    pub length_limit: i64,
    pub unit: LengthUnit,
    pub coverage: Coverage,
}

impl Program {
    pub fn objective_value(&self, assignment: &Assignment) -> f64 {
        self.objective.evaluate(assignment)
    }

    /// Names of violated constraints.
    pub fn violations(&self, assignment: &Assignment) -> Vec<&str> {
        self.constraints
            .iter()
            .filter(|c| !c.is_satisfied(assignment))
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn is_feasible(&self, assignment: &Assignment) -> bool {
        self.constraints.iter().all(|c| c.is_satisfied(assignment))
    }

    /// Render in CPLEX LP format.
    pub fn to_lp(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("\\ problem {}\n", self.problem_id));
        out.push_str("Maximize\n obj: ");
        if self.objective.is_empty() {
            match self.binaries.iter().next() {
                Some(var) => out.push_str(&format!("0 {}", var)),
                None => out.push('0'),
            }
        } else {
            out.push_str(&format_expr(&self.objective));
        }
        out.push_str("\nSubject To\n");
        for c in &self.constraints {
            out.push_str(&format!(
                " {}: {} {} {}\n",
                c.name,
                format_expr(&c.expr),
                c.sense.as_lp(),
                format_number(c.rhs)
            ));
        }
        out.push_str("Binary\n");
        for var in &self.binaries {
            out.push_str(&format!(" {}\n", var));
        }
        out.push_str("End\n");
        out
    }
}

fn format_number(v: f64) -> String {
    if (v - v.round()).abs() < 1e-9 {
        format!("{}", v.round() as i64)
    } else {
        format!("{:.6}", v)
    }
}

fn format_expr(expr: &LinearExpr) -> String {
    let parts: Vec<String> = expr
        .terms()
        .map(|(var, c)| {
            if (c - 1.0).abs() < 1e-12 {
                format!("+ {}", var)
            } else if (c + 1.0).abs() < 1e-12 {
                format!("- {}", var)
            } else if c < 0.0 {
                format!("- {} {}", format_number(-c), var)
            } else {
                format!("+ {} {}", format_number(c), var)
            }
        })
        .collect();
    if parts.is_empty() {
        return "0".to_string();
    }
    let joined = parts.join(" ");
    joined.strip_prefix("+ ").unwrap_or(&joined).to_string()
}
