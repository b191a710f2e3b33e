//! Result trees for plugins that test several things at once.
//!
//! A plugin has a single [Overall]. Each partial thing which is tested gets its
//! own [PartialResult], which may be nested to any depth. The state of a node is
//! either set explicitly or derived from its children on every query.
//!
//! Children are attached by value: a node added to a parent is moved into the
//! parent's list, so later changes to a copy of it don't reach the tree.

use std::cell::OnceCell;
use std::fmt;

use tracing::warn;

use crate::{worst_state, Error, Perfdata, PerfdataList, ServiceState};

/// Tree walks stop descending below this depth.
///
/// ```rust
/// # use checkplugin::{PartialResult, ServiceState, MAX_DEPTH};
/// let mut node = PartialResult::new("leaf").with_state(ServiceState::Ok);
/// for _ in 0..=MAX_DEPTH {
///     node = PartialResult::new("level").with_child(node);
/// }
/// assert_eq!(node.status(), ServiceState::Unknown);
/// ```
pub const MAX_DEPTH: usize = 64;

const NO_STATUS_INFORMATION: &str = "No status information";

/// A sub result of an [Overall] or of another PartialResult.
///
/// ```rust
/// # use checkplugin::{PartialResult, Perfdata, ServiceState};
/// let disk = PartialResult::new("/var")
///     .with_state(ServiceState::Warning)
///     .with_perfdata(Perfdata::new("var_used", 91));
/// let disks = PartialResult::new("Disks").with_child(disk);
///
/// assert_eq!(disks.status(), ServiceState::Warning);
/// assert_eq!(disks.render(0), "\\_ [WARNING] Disks\n    \\_ [WARNING] /var\n");
/// ```
///
/// Dropping a tree is iterative and works for any depth. The derived `Clone`,
/// `PartialEq` and `Debug` recurse, so they are bounded by the stack size.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PartialResult {
    output: String,
    perfdata: PerfdataList,
    children: Vec<PartialResult>,
    state: Option<ServiceState>,
    default_state: Option<ServiceState>,
}

impl PartialResult {
    pub fn new(output: &str) -> Self {
        PartialResult {
            output: output.to_owned(),
            perfdata: PerfdataList::new(),
            children: Vec::new(),
            state: None,
            default_state: None,
        }
    }

    pub fn with_state(mut self, state: ServiceState) -> Self {
        self.set_state(state);
        self
    }

    pub fn with_default_state(mut self, state: ServiceState) -> Self {
        self.set_default_state(state);
        self
    }

    pub fn with_perfdata(mut self, perfdata: Perfdata) -> Self {
        self.perfdata.push(perfdata);
        self
    }

    pub fn with_child(mut self, child: PartialResult) -> Self {
        self.add_child(child);
        self
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn set_output(&mut self, output: &str) {
        self.output = output.to_owned();
    }

    pub fn perfdata(&self) -> &PerfdataList {
        &self.perfdata
    }

    pub fn children(&self) -> &[PartialResult] {
        &self.children
    }

    pub fn add_perfdata(&mut self, perfdata: Perfdata) {
        self.perfdata.push(perfdata);
    }

    /// Appends a child. Nothing is recomputed, the state is derived on query.
    pub fn add_child(&mut self, child: PartialResult) {
        self.children.push(child);
    }

    /// Sets the state explicitly, which disables the derivation from children.
    pub fn set_state(&mut self, state: ServiceState) {
        self.state = Some(state);
    }

    /// Like [PartialResult::set_state], for a raw exit code.
    pub fn set_state_code(&mut self, code: i64) -> Result<(), Error> {
        self.set_state(ServiceState::try_from(code)?);
        Ok(())
    }

    /// Sets the state used when neither an explicit state nor children are present.
    pub fn set_default_state(&mut self, state: ServiceState) {
        self.default_state = Some(state);
    }

    pub fn set_default_state_code(&mut self, code: i64) -> Result<(), Error> {
        self.set_default_state(ServiceState::try_from(code)?);
        Ok(())
    }

    /// Returns the explicit state if set. Otherwise a childless node falls back
    /// to its default state (or `Unknown`), and a node with children reports
    /// the worst state among them.
    pub fn status(&self) -> ServiceState {
        self.status_at(0)
    }

    fn status_at(&self, depth: usize) -> ServiceState {
        if let Some(state) = self.state {
            return state;
        }

        if self.children.is_empty() {
            return self.default_state.unwrap_or(ServiceState::Unknown);
        }

        if depth >= MAX_DEPTH {
            warn!(output = %self.output, "result tree too deep, assuming UNKNOWN");
            return ServiceState::Unknown;
        }

        worst_state(self.children.iter().map(|c| c.status_at(depth + 1)))
    }

    /// Renders this node and all descendants, two spaces of indentation per level.
    /// Children are rendered at `indent_level + 2`.
    pub fn render(&self, indent_level: usize) -> String {
        let mut out = String::new();
        self.render_into(&mut out, indent_level, 0);
        out
    }

    fn render_into(&self, out: &mut String, indent_level: usize, depth: usize) {
        out.push_str(&"  ".repeat(indent_level));
        out.push_str(&format!("\\_ [{}] {}\n", self.status_at(depth), self.output));

        if depth >= MAX_DEPTH {
            if !self.children.is_empty() {
                warn!(output = %self.output, "result tree too deep, not rendering children");
            }
            return;
        }

        for child in &self.children {
            child.render_into(out, indent_level + 2, depth + 1);
        }
    }

    /// Returns the perfdata tokens of this node followed by the ones of its
    /// descendants, depth first. Points that can't be represented are skipped.
    pub fn perfdata_tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        self.collect_tokens(&mut tokens, 0);
        tokens
    }

    fn collect_tokens(&self, tokens: &mut Vec<String>, depth: usize) {
        tokens.extend(self.perfdata.tokens());

        if depth >= MAX_DEPTH {
            return;
        }

        for child in &self.children {
            child.collect_tokens(tokens, depth + 1);
        }
    }
}

impl Drop for PartialResult {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

/// Returns the state and output of the PartialResult, e.g. `[OK] Check1`.
impl fmt::Display for PartialResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status(), self.output)
    }
}

/// The single result of a plugin run, aggregating all [PartialResult]s and
/// one line results added via [Overall::add].
///
/// ```rust
/// # use checkplugin::{Overall, ServiceState};
/// let mut overall = Overall::new();
/// overall.add(ServiceState::Ok, "First OK");
/// overall.add(ServiceState::Critical, "Second Critical");
///
/// assert_eq!(overall.status(), ServiceState::Critical);
/// assert_eq!(
///     overall.output(),
///     "states: critical=1 ok=1\n[OK] First OK\n[CRITICAL] Second Critical\n"
/// );
/// ```
#[derive(Clone, Debug, Default)]
pub struct Overall {
    counts: StateCounts,
    summary: OnceCell<String>,
    state_set_explicitly: bool,
    outputs: Vec<String>,
    partial_results: Vec<PartialResult>,
}

#[derive(Clone, Debug, Default)]
struct StateCounts {
    oks: usize,
    warnings: usize,
    criticals: usize,
    unknowns: usize,
}

impl StateCounts {
    fn count(&mut self, state: ServiceState) {
        match state {
            ServiceState::Ok => self.oks += 1,
            ServiceState::Warning => self.warnings += 1,
            ServiceState::Critical => self.criticals += 1,
            ServiceState::Unknown => self.unknowns += 1,
        }
    }

    fn state(&self) -> ServiceState {
        if self.criticals > 0 {
            ServiceState::Critical
        } else if self.unknowns > 0 {
            ServiceState::Unknown
        } else if self.warnings > 0 {
            ServiceState::Warning
        } else if self.oks > 0 {
            ServiceState::Ok
        } else {
            ServiceState::Unknown
        }
    }

    fn summary(&self) -> Option<String> {
        let parts: Vec<String> = [
            ("critical", self.criticals),
            ("unknown", self.unknowns),
            ("warning", self.warnings),
            ("ok", self.oks),
        ]
        .into_iter()
        .filter(|(_, n)| *n > 0)
        .map(|(name, n)| format!("{name}={n}"))
        .collect();

        if parts.is_empty() {
            None
        } else {
            Some(format!("states: {}", parts.join(" ")))
        }
    }
}

impl Overall {
    pub fn new() -> Self {
        Overall::default()
    }

    /// Adds a one line result with an explicit state.
    ///
    /// From then on the counts of these results decide the overall state and
    /// summary, and the partial results no longer do.
    pub fn add(&mut self, state: ServiceState, output: &str) {
        self.counts.count(state);
        self.state_set_explicitly = true;
        self.outputs.push(format!("[{state}] {output}"));
    }

    pub fn add_ok(&mut self, output: &str) {
        self.add(ServiceState::Ok, output)
    }

    pub fn add_warning(&mut self, output: &str) {
        self.add(ServiceState::Warning, output)
    }

    pub fn add_critical(&mut self, output: &str) {
        self.add(ServiceState::Critical, output)
    }

    pub fn add_unknown(&mut self, output: &str) {
        self.add(ServiceState::Unknown, output)
    }

    pub fn add_subcheck(&mut self, subcheck: PartialResult) {
        self.partial_results.push(subcheck);
    }

    /// Overrides the generated summary line. An empty summary restores the
    /// generated one.
    pub fn set_summary(&mut self, summary: &str) {
        self.summary = if summary.is_empty() {
            OnceCell::new()
        } else {
            OnceCell::from(summary.to_owned())
        };
    }

    pub fn oks(&self) -> usize {
        self.counts.oks
    }

    pub fn warnings(&self) -> usize {
        self.counts.warnings
    }

    pub fn criticals(&self) -> usize {
        self.counts.criticals
    }

    pub fn unknowns(&self) -> usize {
        self.counts.unknowns
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    pub fn partial_results(&self) -> &[PartialResult] {
        &self.partial_results
    }

    fn partial_counts(&self) -> StateCounts {
        let mut counts = StateCounts::default();
        for partial in &self.partial_results {
            counts.count(partial.status());
        }
        counts
    }

    /// Returns the state of the whole plugin run.
    pub fn status(&self) -> ServiceState {
        if self.state_set_explicitly {
            self.counts.state()
        } else {
            worst_state(self.partial_results.iter().map(PartialResult::status))
        }
    }

    /// Returns the summary line, e.g. `states: critical=1 ok=2`.
    ///
    /// The first generated summary is kept: later calls return it unchanged,
    /// even if results were added in the meantime.
    pub fn summary(&self) -> &str {
        self.summary.get_or_init(|| {
            let summary = if self.state_set_explicitly {
                self.counts.summary()
            } else {
                self.partial_counts().summary()
            };

            summary
                .unwrap_or_else(|| NO_STATUS_INFORMATION.to_owned())
        })
    }

    /// Returns all perfdata tokens of the partial results, in tree order.
    pub fn perfdata_tokens(&self) -> Vec<String> {
        self.partial_results
            .iter()
            .flat_map(PartialResult::perfdata_tokens)
            .collect()
    }

    /// Returns the multi line plugin output: the summary, the one line
    /// results, the indented result tree and a final perfdata line.
    pub fn output(&self) -> String {
        let mut out = String::new();

        out.push_str(self.summary());
        out.push('\n');

        for line in &self.outputs {
            out.push_str(line);
            out.push('\n');
        }

        for partial in &self.partial_results {
            out.push_str(&partial.render(0));
        }

        let tokens = self.perfdata_tokens();
        if !tokens.is_empty() {
            out.push('|');
            out.push_str(&tokens.join(" "));
            out.push('\n');
        }

        out
    }
}
