//! Traversal configuration: attribute filters, ignore set, target codes and
//! the safety limits applied inside every traversal loop.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TraceError};
use crate::types::{Node, NodeId};

/// Default cap on the number of paths one enumeration may materialize.
pub const DEFAULT_MAX_PATHS: usize = 10_000;

// ---------------------------------------------------------------------------
// Lenient list parsing
// ---------------------------------------------------------------------------

/// Parse a comma-separated list of node ids.
///
/// Blank and non-numeric segments are dropped.
pub fn parse_id_list(raw: &str) -> BTreeSet<NodeId> {
    raw.split(',')
        .filter_map(|part| part.trim().parse::<NodeId>().ok())
        .collect()
}

/// Parse a comma-separated list of target data codes.
///
/// Blank segments, non-numeric segments and `0` are dropped; `0` is the
/// "no target" sentinel used by callers.
pub fn parse_target_codes(raw: &str) -> BTreeSet<i64> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|part| part.parse::<i64>().ok())
        .filter(|&code| code != 0)
        .collect()
}

// ---------------------------------------------------------------------------
// TraversalLimits
// ---------------------------------------------------------------------------

/// Safety valves bounding a single traversal call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalLimits {
    /// Stop enumeration after this many paths; the result is marked truncated.
    pub max_paths: Option<usize>,
    /// Maximum links per enumerated path.
    pub max_depth: Option<usize>,
    /// Maximum loop iterations before failing with `StepBudgetExhausted`.
    pub max_steps: Option<u64>,
    /// Wall-clock budget before failing with `DeadlineExceeded`.
    pub deadline: Option<Duration>,
}

impl Default for TraversalLimits {
    fn default() -> Self {
        Self {
            max_paths: Some(DEFAULT_MAX_PATHS),
            max_depth: None,
            max_steps: None,
            deadline: None,
        }
    }
}

impl TraversalLimits {
    /// No limits at all.
    pub fn unbounded() -> Self {
        Self {
            max_paths: None,
            max_depth: None,
            max_steps: None,
            deadline: None,
        }
    }
}

/// Per-call step counter checked once per loop iteration.
#[derive(Debug)]
pub(crate) struct Budget {
    steps: u64,
    max_steps: Option<u64>,
    started: Instant,
    deadline: Option<Duration>,
}

impl Budget {
    pub(crate) fn new(limits: &TraversalLimits) -> Self {
        Self {
            steps: 0,
            max_steps: limits.max_steps,
            started: Instant::now(),
            deadline: limits.deadline,
        }
    }

    /// Count one iteration, failing once a limit is crossed.
    pub(crate) fn tick(&mut self) -> Result<()> {
        self.steps += 1;
        if let Some(budget) = self.max_steps {
            if self.steps > budget {
                return Err(TraceError::StepBudgetExhausted { budget });
            }
        }
        if let Some(deadline) = self.deadline {
            if self.started.elapsed() > deadline {
                return Err(TraceError::DeadlineExceeded { deadline });
            }
        }
        Ok(())
    }

    pub(crate) fn steps(&self) -> u64 {
        self.steps
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

// ---------------------------------------------------------------------------
// TraversalFilter
// ---------------------------------------------------------------------------

/// Everything that shapes a traversal besides the start node.
///
/// Attribute filters apply to neighbors only; the start node is always
/// admitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraversalFilter {
    /// Never entered, never classified as endpoints.
    #[serde(default)]
    pub ignore_node_ids: BTreeSet<NodeId>,
    /// 0 = any utility.
    #[serde(default)]
    pub utility_no: i64,
    /// 0 = any toolset.
    #[serde(default)]
    pub toolset_id: i64,
    /// Empty = any PoC; otherwise a case-insensitive substring.
    #[serde(default)]
    pub eq_poc_no: String,
    /// Data codes that end a path. Empty = only natural dead ends.
    #[serde(default)]
    pub target_data_codes: BTreeSet<i64>,
    #[serde(default)]
    pub limits: TraversalLimits,
}

impl TraversalFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignore(mut self, node_id: NodeId) -> Self {
        self.ignore_node_ids.insert(node_id);
        self
    }

    /// Add ignored nodes from a comma-separated list such as `"12,13"`.
    pub fn ignore_list(mut self, raw: &str) -> Self {
        self.ignore_node_ids.extend(parse_id_list(raw));
        self
    }

    pub fn utility(mut self, utility_no: i64) -> Self {
        self.utility_no = utility_no;
        self
    }

    pub fn toolset(mut self, toolset_id: i64) -> Self {
        self.toolset_id = toolset_id;
        self
    }

    pub fn poc(mut self, eq_poc_no: impl Into<String>) -> Self {
        self.eq_poc_no = eq_poc_no.into();
        self
    }

    pub fn target(mut self, data_code: i64) -> Self {
        if data_code != 0 {
            self.target_data_codes.insert(data_code);
        }
        self
    }

    /// Add target codes from a comma-separated list such as `"15000,107"`.
    pub fn target_codes(mut self, raw: &str) -> Self {
        self.target_data_codes.extend(parse_target_codes(raw));
        self
    }

    pub fn limits(mut self, limits: TraversalLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn max_paths(mut self, max_paths: usize) -> Self {
        self.limits.max_paths = Some(max_paths);
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.limits.max_depth = Some(max_depth);
        self
    }

    pub fn max_steps(mut self, max_steps: u64) -> Self {
        self.limits.max_steps = Some(max_steps);
        self
    }

    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.limits.deadline = Some(deadline);
        self
    }

    /// Reject filters no traversal could honour.
    pub fn validate(&self) -> Result<()> {
        if self.utility_no < 0 {
            return Err(TraceError::InvalidFilter(format!(
                "utility_no must be >= 0, got {}",
                self.utility_no
            )));
        }
        if self.toolset_id < 0 {
            return Err(TraceError::InvalidFilter(format!(
                "toolset_id must be >= 0, got {}",
                self.toolset_id
            )));
        }
        if self.limits.max_paths == Some(0) {
            return Err(TraceError::InvalidFilter("max_paths must be > 0".into()));
        }
        Ok(())
    }

    pub fn is_ignored(&self, node_id: NodeId) -> bool {
        self.ignore_node_ids.contains(&node_id)
    }

    pub fn is_target(&self, node: &Node) -> bool {
        !self.target_data_codes.is_empty() && self.target_data_codes.contains(&node.data_code)
    }

    /// Whether `node` passes the utility, toolset and PoC filters.
    pub fn admits(&self, node: &Node) -> bool {
        if self.utility_no != 0 && node.utility_no != self.utility_no {
            return false;
        }
        if self.toolset_id != 0 && node.toolset_id != self.toolset_id {
            return false;
        }
        self.eq_poc_no.is_empty() || node.eq_poc_no.contains(self.eq_poc_no.as_str())
    }

    /// Stable textual form used for cache keys.
    pub(crate) fn canonical(&self) -> String {
        let join = |set: &BTreeSet<i64>| {
            set.iter()
                .map(i64::to_string)
                .collect::<Vec<_>>()
                .join(",")
        };
        format!(
            "ignore={};utility={};toolset={};poc={:?};targets={};max_paths={:?};max_depth={:?}",
            join(&self.ignore_node_ids),
            self.utility_no,
            self.toolset_id,
            self.eq_poc_no,
            join(&self.target_data_codes),
            self.limits.max_paths,
            self.limits.max_depth,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("", &[] ; "empty string")]
    #[test_case("12345", &[12345] ; "single id")]
    #[test_case("12345,12349", &[12345, 12349] ; "two ids")]
    #[test_case(" 7 , ,8,", &[7, 8] ; "blank segments dropped")]
    #[test_case("3,abc,4", &[3, 4] ; "non numeric dropped")]
    fn parses_id_lists(raw: &str, expected: &[NodeId]) {
        let parsed: Vec<NodeId> = parse_id_list(raw).into_iter().collect();
        assert_eq!(parsed, expected);
    }

    #[test_case("", &[] ; "empty string")]
    #[test_case("0", &[] ; "zero sentinel")]
    #[test_case("15000", &[15000] ; "single code")]
    #[test_case("15000,107", &[107, 15000] ; "two codes")]
    #[test_case("15000, 0 ,107,", &[107, 15000] ; "zero and blanks dropped")]
    #[test_case("-5,x1,200", &[200] ; "signed and junk dropped")]
    fn parses_target_codes(raw: &str, expected: &[i64]) {
        let parsed: Vec<i64> = parse_target_codes(raw).into_iter().collect();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn empty_filter_admits_everything() {
        let filter = TraversalFilter::new();
        let node = Node::new(1).with_utility(9).with_toolset(4, "T4").with_poc("A1");
        assert!(filter.admits(&node));
        assert!(!filter.is_target(&node));
    }

    #[test]
    fn utility_and_toolset_must_match_exactly() {
        let filter = TraversalFilter::new().utility(13).toolset(2);
        assert!(filter.admits(&Node::new(1).with_utility(13).with_toolset(2, "")));
        assert!(!filter.admits(&Node::new(1).with_utility(12).with_toolset(2, "")));
        assert!(!filter.admits(&Node::new(1).with_utility(13).with_toolset(3, "")));
    }

    #[test]
    fn poc_filter_is_exact_substring() {
        let filter = TraversalFilter::new().poc("B1");
        assert!(filter.admits(&Node::new(1).with_poc("A1,B1,C2")));
        assert!(filter.admits(&Node::new(1).with_poc("xB12")));
        assert!(!filter.admits(&Node::new(1).with_poc("A1,C2")));
        assert!(!filter.admits(&Node::new(1)));
    }

    #[test]
    fn poc_filter_is_case_sensitive_and_untrimmed() {
        let node = Node::new(2).with_poc("A1,B1");
        assert!(!TraversalFilter::new().poc("a1").admits(&node));
        assert!(!TraversalFilter::new().poc(" A1 ").admits(&node));
        assert!(TraversalFilter::new().poc("A1,").admits(&node));
    }

    #[test]
    fn targets_match_data_code() {
        let filter = TraversalFilter::new().target_codes("15000,107");
        assert!(filter.is_target(&Node::new(1).with_data_code(107)));
        assert!(!filter.is_target(&Node::new(1).with_data_code(0)));
    }

    #[test]
    fn ignore_list_accumulates() {
        let filter = TraversalFilter::new().ignore(1).ignore_list("2, 3");
        assert!(filter.is_ignored(1));
        assert!(filter.is_ignored(3));
        assert!(!filter.is_ignored(4));
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert!(TraversalFilter::new().validate().is_ok());
        assert!(TraversalFilter::new().utility(-1).validate().is_err());
        assert!(TraversalFilter::new().toolset(-3).validate().is_err());
        assert!(TraversalFilter::new().max_paths(0).validate().is_err());
    }

    #[test]
    fn default_limits_cap_paths() {
        let limits = TraversalLimits::default();
        assert_eq!(limits.max_paths, Some(DEFAULT_MAX_PATHS));
        assert_eq!(TraversalLimits::unbounded().max_paths, None);
    }

    #[test]
    fn budget_fails_after_max_steps() {
        let limits = TraversalLimits {
            max_steps: Some(2),
            ..TraversalLimits::unbounded()
        };
        let mut budget = Budget::new(&limits);
        assert!(budget.tick().is_ok());
        assert!(budget.tick().is_ok());
        let err = budget.tick().unwrap_err();
        assert!(matches!(err, TraceError::StepBudgetExhausted { budget: 2 }));
        assert_eq!(budget.steps(), 3);
    }

    #[test]
    fn budget_fails_after_deadline() {
        let limits = TraversalLimits {
            deadline: Some(Duration::ZERO),
            ..TraversalLimits::unbounded()
        };
        let mut budget = Budget::new(&limits);
        std::thread::sleep(Duration::from_millis(2));
        assert!(matches!(
            budget.tick(),
            Err(TraceError::DeadlineExceeded { .. })
        ));
    }

    #[test]
    fn canonical_form_ignores_builder_order() {
        let a = TraversalFilter::new().ignore(3).ignore(1).target(15000).poc("B1");
        let b = TraversalFilter::new().poc("B1").target(15000).ignore(1).ignore(3);
        assert_eq!(a.canonical(), b.canonical());
    }

    #[test]
    fn canonical_form_keeps_poc_case() {
        let upper = TraversalFilter::new().poc("B1");
        let lower = TraversalFilter::new().poc("b1");
        assert_ne!(upper.canonical(), lower.canonical());
    }
}
