//! External `glpsol` backend.
//!
//! The program is written in CPLEX LP format to a scratch directory, solved
//! with `glpsol --cpxlp <lp> -o <report> --tmlim <secs>`, and the column
//! section of the printed report is parsed back into an assignment. The
//! process is killed if it outlives the time limit.

use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use conceptsum_core::{Error, Result};

use crate::linear::{Assignment, Program};
use crate::solver::Optimizer;

const POLL_INTERVAL: Duration = Duration::from_millis(20);
/// Extra time granted past `--tmlim` before the process is killed.
const KILL_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct GlpkSolver {
    command: String,
    time_limit: Duration,
    debug: bool,
}

impl GlpkSolver {
    pub fn new(command: impl Into<String>, time_limit: Duration, debug: bool) -> Self {
        Self {
            command: command.into(),
            time_limit,
            debug,
        }
    }

    fn run(&self, program: &Program, dir: &Path) -> Result<String> {
        let lp_path = dir.join("program.lp");
        let report_path = dir.join("solution.txt");
        let log_path = dir.join("glpsol.log");
        std::fs::write(&lp_path, program.to_lp())?;

        let log = std::fs::File::create(&log_path)?;
        let mut child = Command::new(&self.command)
            .arg("--cpxlp")
            .arg(&lp_path)
            .arg("-o")
            .arg(&report_path)
            .arg("--tmlim")
            .arg(self.time_limit.as_secs().max(1).to_string())
            .stdin(Stdio::null())
            .stdout(log.try_clone()?)
            .stderr(log)
            .spawn()
            .map_err(|e| {
                Error::solver(
                    &program.problem_id,
                    format!("cannot start {}: {}", self.command, e),
                )
            })?;

        let deadline = Instant::now() + self.time_limit + KILL_GRACE;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                if let Err(e) = child.kill() {
                    warn!("Failed to kill {}: {}", self.command, e);
                }
                let _ = child.wait();
                return Err(Error::solver(
                    &program.problem_id,
                    format!("time limit of {}s exceeded", self.time_limit.as_secs()),
                ));
            }
            thread::sleep(POLL_INTERVAL);
        };

        let solver_log = std::fs::read_to_string(&log_path).unwrap_or_default();
        if self.debug {
            debug!("{} output for {}:\n{}", self.command, program.problem_id, solver_log);
        } else {
            trace!("{} output for {}:\n{}", self.command, program.problem_id, solver_log);
        }
        if !status.success() {
            return Err(Error::solver(
                &program.problem_id,
                format!("{} exited with {}", self.command, status),
            ));
        }

        std::fs::read_to_string(&report_path).map_err(|e| {
            Error::solver(&program.problem_id, format!("no solution report: {}", e))
        })
    }
}

impl Optimizer for GlpkSolver {
    fn solve(&self, program: &Program) -> Result<Assignment> {
        let dir = tempfile::Builder::new().prefix("conceptsum-").tempdir()?;
        let report = self.run(program, dir.path())?;
        let mut assignment = parse_report(&report)
            .map_err(|reason| Error::solver(&program.problem_id, reason))?;
        for var in &program.binaries {
            let value = assignment.get(var);
            assignment.set(var.clone(), value);
        }
        Ok(assignment)
    }

    fn name(&self) -> &str {
        "glpk"
    }
}

/// Parse the status line and column activities of a `glpsol -o` report.
pub fn parse_report(report: &str) -> std::result::Result<Assignment, String> {
    let status = report
        .lines()
        .find_map(|l| l.trim_start().strip_prefix("Status:"))
        .map(str::trim)
        .ok_or("report has no status line")?;
    if status.contains("UNDEFINED")
        || status.contains("EMPTY")
        || status.contains("INFEASIBLE")
        || status.contains("UNBOUNDED")
    {
        return Err(format!("solver status {}", status));
    }
    if !status.contains("OPTIMAL") || status.contains("NON-OPTIMAL") {
        return Err(format!("solution not proven optimal: {}", status));
    }

    let mut lines = report.lines().skip_while(|l| !l.contains("Column name"));
    if lines.next().is_none() {
        return Err("report has no column section".into());
    }
    // Dashed separator under the header.
    lines.next();

    let mut assignment = Assignment::new();
    let mut pending: Option<String> = None;
    for line in lines {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            break;
        }
        // Long names put the values on a continuation line.
        let (name, values) = match pending.take() {
            Some(name) => (name, &fields[..]),
            None if fields.len() == 2 => {
                pending = Some(fields[1].to_string());
                continue;
            }
            None if fields.len() >= 3 => (fields[1].to_string(), &fields[2..]),
            None => return Err(format!("malformed column line: {}", line.trim())),
        };
        let activity = values
            .iter()
            .find(|f| **f != "*")
            .ok_or_else(|| format!("no activity for {}", name))?;
        let value: f64 = activity
            .parse()
            .map_err(|_| format!("bad activity {} for {}", activity, name))?;
        assignment.set(name, u8::from(value.round() >= 1.0));
    }
    if assignment.is_empty() {
        return Err("report lists no columns".into());
    }
    Ok(assignment)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "\
Problem:
Rows:       4
Columns:    5 (5 integer, 5 binary)
Non-zeros:  9
Status:     INTEGER OPTIMAL
Objective:  obj = 3 (MAXimum)

   No.   Row name        Activity     Lower bound   Upper bound
------ ------------    ------------- ------------- -------------
     1 length                     20                          20
     2 cov_0                       0                           0

   No. Column name       Activity     Lower bound   Upper bound
------ ------------    ------------- ------------- -------------
     1 c0           *              1             0             1
     2 s0           *              1             0             1
     3 s1           *              0             0             1
     4 a_very_long_variable_name
                    *              1             0             1
     5 s12          *              1             0             1

Integer feasibility conditions:

KKT.PE: max.abs.err = 0.00e+00 on row 0
";

    #[test]
    fn test_parse_report_columns() {
        let assignment = parse_report(REPORT).unwrap();
        assert_eq!(assignment.get("c0"), 1);
        assert_eq!(assignment.get("s0"), 1);
        assert_eq!(assignment.get("s1"), 0);
        assert_eq!(assignment.get("a_very_long_variable_name"), 1);
        assert_eq!(assignment.get("s12"), 1);
        assert_eq!(assignment.len(), 5);
    }

    #[test]
    fn test_parse_report_rejects_infeasible() {
        let report = REPORT.replace("INTEGER OPTIMAL", "INTEGER EMPTY");
        assert!(parse_report(&report).unwrap_err().contains("EMPTY"));
        let report = REPORT.replace("INTEGER OPTIMAL", "INTEGER UNDEFINED");
        assert!(parse_report(&report).is_err());
        let report = REPORT.replace("INTEGER OPTIMAL", "INTEGER NON-OPTIMAL");
        assert!(parse_report(&report).unwrap_err().contains("not proven optimal"));
    }

    #[test]
    fn test_parse_report_without_columns() {
        assert!(parse_report("Status: INTEGER OPTIMAL\n").is_err());
        assert!(parse_report("garbage").is_err());
    }

    #[test]
    fn test_missing_binary_is_solver_error() {
        let solver = GlpkSolver::new(
            "conceptsum-no-such-solver",
            Duration::from_secs(1),
            false,
        );
        let program = crate::builder::tests::program_for_solver_tests();
        let err = solver.solve(&program).unwrap_err();
        assert!(matches!(err, Error::Solver { .. }));
        assert!(err.to_string().contains("cannot start"));
    }
}
