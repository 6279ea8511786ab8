//! Heuristic evaluation-order search for counterexamples
//!
//! [`EvalCheck`] looks for falsifying assignments without building
//! definitions. The body is turned into a DAG of evaluation nodes. A node becomes
//! ready once all of its arguments have values. Ready nodes are evaluated
//! one at a time, preferring the node that binds the most variables.
//! Evaluating an uninterpreted application with unbound variable arguments
//! enumerates the rows of the callee's [`IndexedDef`]: each row that matches
//! the bound arguments binds the rest and the search continues below it.
//! Once every variable is bound the body is evaluated at that point and,
//! when false, the quantifier is instantiated with the rows' annotation
//! terms.
//!
//! The search runs on an explicit stack of enumeration frames. Every branch
//! works on its own copy of the [`SearchState`], so backtracking is just
//! dropping the copy.
//!
//! [`IndexedDef`]: super::indexed_def::IndexedDef

use super::context::EvalCtx;
use super::indexed_def::Entry;
use super::model::ModelConstructor;
use super::{CheckResult, MbqiConfig, QuantifiedFormula};
use lasso::Spur;
use qcheck_core::ast::traversal::{instantiate, substitute_bound};
use qcheck_core::{Result, TermId, TermKind, TermManager};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use tracing::{debug, trace};

type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    /// Evaluated directly through the model
    Ground,
    /// Occurrence of a bound variable outside an uninterpreted argument
    Var(u32),
    /// Application evaluated from its arguments
    App,
    /// Never evaluable (nested quantifier)
    Opaque,
}

/// A subterm of the body in the evaluation graph
#[derive(Debug, Clone)]
struct EvalNode {
    term: TermId,
    kind: NodeKind,
    parents: SmallVec<[NodeId; 2]>,
    /// Node of each argument; `None` for value arguments and for variables
    /// bound by this application
    children: SmallVec<[Option<NodeId>; 4]>,
    /// Arguments with a value before the search starts
    ready_args: u32,
    /// Variable arguments of an uninterpreted application
    vars_to_bind: u32,
}

/// Mutable part of the search, copied per branch
#[derive(Debug, Clone)]
struct SearchState {
    /// Ready nodes not yet evaluated
    active: Vec<NodeId>,
    /// Arguments with a value, per node
    counts: Vec<u32>,
    values: Vec<Option<TermId>>,
    /// Value bound to each variable
    vsub: Vec<Option<TermId>>,
    /// Ground term witnessing each binding
    esub: Vec<Option<TermId>>,
    bound: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Undetermined,
    Instantiated,
    /// No way to bind the remaining variables; aborts the pass
    Fail,
}

#[derive(Debug, Clone, Copy)]
enum ArgSlot {
    Value(TermId),
    Var(u32),
}

/// Enumeration of the rows of one callee
#[derive(Debug)]
struct BindFrame {
    base: SearchState,
    node: NodeId,
    func: Spur,
    args: SmallVec<[ArgSlot; 4]>,
    to_bind: SmallVec<[u32; 4]>,
    /// Active list for the branches when binding readied new nodes
    next_active: Option<Vec<NodeId>>,
    next_entry: usize,
    /// Opened by the first selection of a pass
    is_first: bool,
    last: Outcome,
}

enum Entered {
    Call(SearchState),
    Bind(BindFrame),
    Return(Outcome),
}

enum Step {
    Call(SearchState),
    Return(Outcome),
}

/// Evaluation graph of a quantifier body
#[derive(Debug, Default)]
struct EvalGraph {
    nodes: Vec<EvalNode>,
    by_term: FxHashMap<TermId, NodeId>,
    vars: Vec<Option<NodeId>>,
    initially_active: Vec<NodeId>,
}

impl EvalGraph {
    fn build(tm: &TermManager, q: &QuantifiedFormula) -> (Self, NodeId) {
        let mut graph = Self {
            vars: vec![None; q.num_vars()],
            ..Self::default()
        };
        let root = graph.mk_eval_node(tm, q.body);
        (graph, root)
    }

    fn mk_eval_node(&mut self, tm: &TermManager, term: TermId) -> NodeId {
        if let Some(&id) = self.by_term.get(&term) {
            return id;
        }
        let id = self.nodes.len();
        let ground = tm.is_ground(term);
        let kind = match tm.kind(term) {
            _ if ground => NodeKind::Ground,
            Some(TermKind::BoundVar(i)) => NodeKind::Var(*i),
            Some(TermKind::Forall { .. }) | None => NodeKind::Opaque,
            Some(_) => NodeKind::App,
        };
        self.nodes.push(EvalNode {
            term,
            kind,
            parents: SmallVec::new(),
            children: SmallVec::new(),
            ready_args: 0,
            vars_to_bind: 0,
        });

        if kind == NodeKind::App
            && let Some(tk) = tm.kind(term)
        {
            let uninterpreted = tk.uninterpreted_symbol().is_some();
            let mut children = SmallVec::new();
            let (mut ready, mut to_bind) = (0, 0);
            for arg in tk.children() {
                if tm.is_value(arg) {
                    ready += 1;
                    children.push(None);
                } else if uninterpreted && tm.bound_var_index(arg).is_some() {
                    ready += 1;
                    to_bind += 1;
                    children.push(None);
                } else {
                    let child = self.mk_eval_node(tm, arg);
                    self.nodes[child].parents.push(id);
                    children.push(Some(child));
                }
            }
            let node = &mut self.nodes[id];
            node.children = children;
            node.ready_args = ready;
            node.vars_to_bind = to_bind;
        }

        if ground || self.can_evaluate(id, self.nodes[id].ready_args) {
            self.initially_active.push(id);
        }
        if let NodeKind::Var(i) = kind
            && let Some(slot) = self.vars.get_mut(i as usize)
        {
            *slot = Some(id);
        }
        self.by_term.insert(term, id);
        id
    }

    fn can_evaluate(&self, id: NodeId, count: u32) -> bool {
        let node = &self.nodes[id];
        match node.kind {
            NodeKind::Ground => true,
            NodeKind::App => count as usize == node.children.len(),
            NodeKind::Var(_) | NodeKind::Opaque => false,
        }
    }

    /// Credit the parents of `id` with one evaluated argument
    fn notify(&self, id: NodeId, counts: &mut [u32], new_active: &mut Vec<NodeId>) {
        for &p in &self.nodes[id].parents {
            counts[p] += 1;
            if self.can_evaluate(p, counts[p]) {
                new_active.push(p);
            }
        }
    }
}

/// Heuristic counterexample search
#[derive(Debug, Clone, Copy)]
pub struct EvalCheck {
    /// Within one enumeration, stop after the first row that produced an
    /// instantiation (not applied to the first selection of a pass)
    pub inst_limited: bool,
    /// Retry from other starting nodes while no instantiation was found
    pub multiple_patterns: bool,
}

impl Default for EvalCheck {
    fn default() -> Self {
        Self::new(&MbqiConfig::default())
    }
}

impl EvalCheck {
    pub fn new(config: &MbqiConfig) -> Self {
        Self {
            inst_limited: config.eval_check_inst_limited,
            multiple_patterns: config.eval_check_multiple_patterns,
        }
    }

    /// Search for instantiations of `q` falsified by `model`.
    ///
    /// Never answers satisfied: an exhausted search only means this
    /// evaluation order found no counterexample.
    pub fn run<M: ModelConstructor + ?Sized>(
        &self,
        ctx: &mut EvalCtx,
        tm: &mut TermManager,
        model: &M,
        q: &QuantifiedFormula,
    ) -> Result<CheckResult> {
        let (graph, root) = EvalGraph::build(tm, q);
        debug!(
            quantifier = %tm.display(q.term),
            nodes = graph.nodes.len(),
            active = graph.initially_active.len(),
            "eval check"
        );
        let initial = SearchState {
            active: graph.initially_active.clone(),
            counts: graph.nodes.iter().map(|n| n.ready_args).collect(),
            values: vec![None; graph.nodes.len()],
            vsub: vec![None; q.num_vars()],
            esub: vec![None; q.num_vars()],
            bound: 0,
        };
        let mut search = Search {
            ctx,
            tm,
            model,
            q,
            graph,
            root,
            inst_limited: self.inst_limited,
            first_time: true,
            start_index: SmallVec::new(),
            start_score: 0,
            lemmas: Vec::new(),
            seen: FxHashSet::default(),
        };
        loop {
            search.first_time = true;
            search.ctx.stats.num_eval_check_passes += 1;
            let outcome = search.run_pass(initial.clone())?;
            if outcome == Outcome::Fail {
                debug!("eval check pass failed");
                break;
            }
            if !self.multiple_patterns || !search.lemmas.is_empty() {
                break;
            }
        }
        search.ctx.stats.num_lemmas += search.lemmas.len();
        let lemmas = search.lemmas;
        Ok(if lemmas.is_empty() {
            CheckResult::Undetermined
        } else {
            CheckResult::Refuted(lemmas)
        })
    }
}

struct Search<'a, M: ?Sized> {
    ctx: &'a mut EvalCtx,
    tm: &'a mut TermManager,
    model: &'a M,
    q: &'a QuantifiedFormula,
    graph: EvalGraph,
    root: NodeId,
    inst_limited: bool,
    /// The next selection is the first of its pass
    first_time: bool,
    /// Positions of the initial active list already used to start a pass
    start_index: SmallVec<[usize; 4]>,
    start_score: u32,
    lemmas: Vec<TermId>,
    seen: FxHashSet<TermId>,
}

impl<M: ModelConstructor + ?Sized> Search<'_, M> {
    fn run_pass(&mut self, initial: SearchState) -> Result<Outcome> {
        let mut stack: Vec<BindFrame> = Vec::new();
        let mut call = Some((initial, true));
        let mut returned: Option<Outcome> = None;
        loop {
            if let Some((state, is_first)) = call.take() {
                match self.enter(state, is_first)? {
                    Entered::Call(next) => {
                        call = Some((next, false));
                        continue;
                    }
                    Entered::Bind(frame) => stack.push(frame),
                    Entered::Return(outcome) => returned = Some(outcome),
                }
            }
            if let Some(outcome) = returned.take() {
                if outcome == Outcome::Fail {
                    return Ok(Outcome::Fail);
                }
                match stack.last_mut() {
                    Some(frame) => frame.last = outcome,
                    None => return Ok(outcome),
                }
            }
            let Some(frame) = stack.last_mut() else {
                return Ok(Outcome::Undetermined);
            };
            match self.advance(frame)? {
                Step::Call(state) => call = Some((state, false)),
                Step::Return(outcome) => {
                    stack.pop();
                    returned = Some(outcome);
                }
            }
        }
    }

    /// Best ready node: highest `1 + vars_to_bind`, ties to the latest
    fn select(&mut self, state: &SearchState) -> Option<usize> {
        let mut best = None;
        let mut max_score = 0;
        for ii in (0..state.active.len()).rev() {
            let n = state.active[ii];
            if !self.graph.can_evaluate(n, state.counts[n]) {
                continue;
            }
            if self.first_time && self.start_index.contains(&ii) {
                continue;
            }
            let score = 1 + self.graph.nodes[n].vars_to_bind;
            if score > max_score {
                best = Some(ii);
                max_score = score;
            }
        }
        let best = best?;
        if self.first_time {
            if max_score < self.start_score {
                return None;
            }
            self.start_index.push(best);
            self.first_time = false;
            self.start_score = max_score;
        }
        Some(best)
    }

    fn enter(&mut self, mut state: SearchState, is_first: bool) -> Result<Entered> {
        let Some(best) = self.select(&state) else {
            trace!(bound = state.bound, "no ready node");
            return Ok(Entered::Return(Outcome::Fail));
        };
        let node = state.active.remove(best);
        let term = self.graph.nodes[node].term;
        trace!(node = %self.tm.display(term), "select");

        let result = match self.graph.nodes[node].kind {
            NodeKind::Ground => self.ctx.evaluate_ground(self.tm, self.model, term),
            NodeKind::App => {
                let Some(kind) = self.tm.kind(term).cloned() else {
                    return Ok(Entered::Return(Outcome::Fail));
                };
                let mut args: SmallVec<[ArgSlot; 4]> = SmallVec::new();
                let mut to_bind: SmallVec<[u32; 4]> = SmallVec::new();
                for (arg, child) in kind.children().into_iter().zip(&self.graph.nodes[node].children) {
                    let slot = match *child {
                        Some(c) => match state.values[c] {
                            Some(v) => ArgSlot::Value(v),
                            None => return Ok(Entered::Return(Outcome::Fail)),
                        },
                        None => match self.tm.bound_var_index(arg) {
                            Some(v) => match state.vsub[v as usize] {
                                Some(value) => ArgSlot::Value(value),
                                None => {
                                    if !to_bind.contains(&v) {
                                        to_bind.push(v);
                                    }
                                    ArgSlot::Var(v)
                                }
                            },
                            None => ArgSlot::Value(arg),
                        },
                    };
                    args.push(slot);
                }
                match kind.uninterpreted_symbol() {
                    Some(func) if !to_bind.is_empty() => {
                        return Ok(Entered::Bind(self.open_frame(state, node, func, args, to_bind, is_first)));
                    }
                    Some(func) => {
                        let values = arg_values(&args);
                        self.model.get_indexed_def(func).and_then(|d| d.evaluate(&values))
                    }
                    None => {
                        let values = arg_values(&args);
                        match kind.op() {
                            Some(op) => self.ctx.evaluate_terms(self.tm, op, &values),
                            None => None,
                        }
                    }
                }
            }
            NodeKind::Var(_) | NodeKind::Opaque => None,
        };

        let Some(result) = result else {
            return Ok(Entered::Return(Outcome::Undetermined));
        };
        let mut new_active = Vec::new();
        self.graph.notify(node, &mut state.counts, &mut new_active);
        state.values[node] = Some(result);
        if !new_active.is_empty() {
            new_active.extend_from_slice(&state.active);
            state.active = new_active;
            return Ok(Entered::Call(state));
        }
        if node == self.root && !self.tm.is_false(result) {
            return Ok(Entered::Return(Outcome::Undetermined));
        }
        if state.active.is_empty() && node != self.root {
            trace!("evaluation finished with unbound variables");
            return Ok(Entered::Return(Outcome::Fail));
        }
        Ok(Entered::Call(state))
    }

    fn open_frame(
        &mut self,
        mut base: SearchState,
        node: NodeId,
        func: Spur,
        args: SmallVec<[ArgSlot; 4]>,
        to_bind: SmallVec<[u32; 4]>,
        is_first: bool,
    ) -> BindFrame {
        base.bound += to_bind.len();
        let mut next_active = None;
        if base.bound < self.q.num_vars() {
            let mut new_active = Vec::new();
            for &v in &to_bind {
                if let Some(var_node) = self.graph.vars[v as usize] {
                    self.graph.notify(var_node, &mut base.counts, &mut new_active);
                }
            }
            self.graph.notify(node, &mut base.counts, &mut new_active);
            if !new_active.is_empty() {
                new_active.extend_from_slice(&base.active);
                next_active = Some(new_active);
            }
        }
        BindFrame {
            base,
            node,
            func,
            args,
            to_bind,
            next_active,
            next_entry: 0,
            is_first,
            last: Outcome::Undetermined,
        }
    }

    fn advance(&mut self, frame: &mut BindFrame) -> Result<Step> {
        loop {
            if !frame.is_first && frame.last == Outcome::Instantiated && self.inst_limited {
                return Ok(Step::Return(Outcome::Instantiated));
            }
            let entry = self
                .model
                .get_indexed_def(frame.func)
                .and_then(|d| d.entries().get(frame.next_entry))
                .cloned();
            let Some(entry) = entry else {
                return Ok(Step::Return(frame.last));
            };
            frame.next_entry += 1;

            let mut state = frame.base.clone();
            if !compose(&frame.args, &entry, &mut state.vsub, &mut state.esub) {
                continue;
            }
            state.values[frame.node] = Some(entry.result);
            for &v in &frame.to_bind {
                if let Some(var_node) = self.graph.vars[v as usize] {
                    state.values[var_node] = state.vsub[v as usize];
                }
            }

            if state.bound < self.q.num_vars() {
                match &frame.next_active {
                    Some(active) => {
                        state.active = active.clone();
                        return Ok(Step::Call(state));
                    }
                    None if frame.node != self.root || self.tm.is_false(entry.result) => {
                        return Ok(Step::Call(state));
                    }
                    None => {}
                }
            } else if self.add_instantiation(&state)? {
                frame.last = Outcome::Instantiated;
            }
        }
    }

    /// Evaluate the body at the full binding and keep the instance if false
    fn add_instantiation(&mut self, state: &SearchState) -> Result<bool> {
        let (Some(vsub), Some(esub)) = (
            state.vsub.iter().copied().collect::<Option<Vec<_>>>(),
            state.esub.iter().copied().collect::<Option<Vec<_>>>(),
        ) else {
            return Ok(false);
        };
        let ground = substitute_bound(self.tm, self.q.body, &vsub)?;
        let value = self.ctx.evaluate_ground(self.tm, self.model, ground);
        if !value.is_some_and(|v| self.tm.is_false(v)) {
            return Ok(false);
        }
        let lemma = instantiate(self.tm, self.q.term, &esub)?;
        if !self.seen.insert(lemma) {
            return Ok(false);
        }
        debug!(lemma = %self.tm.display(lemma), "eval check instantiation");
        self.lemmas.push(lemma);
        Ok(true)
    }
}

fn arg_values(args: &[ArgSlot]) -> SmallVec<[TermId; 4]> {
    args.iter()
        .filter_map(|slot| match *slot {
            ArgSlot::Value(v) => Some(v),
            ArgSlot::Var(_) => None,
        })
        .collect()
}

/// Match a row against the arguments, binding unbound variables
fn compose(args: &[ArgSlot], entry: &Entry, vsub: &mut [Option<TermId>], esub: &mut [Option<TermId>]) -> bool {
    if args.len() != entry.args.len() {
        return false;
    }
    for (i, slot) in args.iter().enumerate() {
        match *slot {
            ArgSlot::Value(v) => {
                if v != entry.args[i] {
                    return false;
                }
            }
            ArgSlot::Var(var) => {
                let var = var as usize;
                match vsub[var] {
                    Some(bound) if bound != entry.args[i] => return false,
                    Some(_) => {}
                    None => {
                        vsub[var] = Some(entry.args[i]);
                        esub[var] = Some(entry.annotations[i]);
                    }
                }
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mbqi::model::TableModel;
    use num_bigint::BigInt;

    fn int(tm: &mut TermManager, n: i64) -> TermId {
        tm.mk_int(BigInt::from(n))
    }

    #[test]
    fn test_graph_shares_subterms() {
        let mut tm = TermManager::new();
        let ints = tm.sorts.int_sort;
        let x = tm.mk_bound_var(0, ints);
        let fx = tm.mk_apply("f", [x], ints);
        let sum = tm.mk_add([fx, fx]);
        let zero = int(&mut tm, 0);
        let body = tm.mk_gt(sum, zero);
        let qt = tm.mk_forall([("x", ints)], body);
        let q = QuantifiedFormula::from_term(&tm, qt).unwrap();

        let (graph, root) = EvalGraph::build(&tm, &q);
        assert_eq!(graph.nodes[root].term, body);
        // body, sum, f(x)
        assert_eq!(graph.nodes.len(), 3);
        let f_node = graph.by_term[&fx];
        assert_eq!(graph.nodes[f_node].parents.len(), 2);
        assert_eq!(graph.initially_active, vec![f_node]);
        assert_eq!(graph.nodes[f_node].vars_to_bind, 1);
    }

    #[test]
    fn test_variable_node_outside_application() {
        let mut tm = TermManager::new();
        let ints = tm.sorts.int_sort;
        let x = tm.mk_bound_var(0, ints);
        let three = int(&mut tm, 3);
        let lt = tm.mk_lt(x, three);
        let qt = tm.mk_forall([("x", ints)], lt);
        let q = QuantifiedFormula::from_term(&tm, qt).unwrap();
        let (graph, _) = EvalGraph::build(&tm, &q);
        let var_node = graph.vars[0].unwrap();
        assert_eq!(graph.nodes[var_node].kind, NodeKind::Var(0));
        assert!(graph.initially_active.is_empty());
    }

    #[test]
    fn test_compose_binds_and_checks() {
        let entry = Entry {
            args: [TermId(5), TermId(6)].into_iter().collect(),
            annotations: [TermId(50), TermId(60)].into_iter().collect(),
            result: TermId(1),
        };
        let mut vsub = vec![None, None];
        let mut esub = vec![None, None];
        let args = [ArgSlot::Var(0), ArgSlot::Var(1)];
        assert!(compose(&args, &entry, &mut vsub, &mut esub));
        assert_eq!(vsub, vec![Some(TermId(5)), Some(TermId(6))]);
        assert_eq!(esub, vec![Some(TermId(50)), Some(TermId(60))]);

        // f(x, x) cannot match a row with distinct arguments
        let mut vsub = vec![None];
        let mut esub = vec![None];
        let args = [ArgSlot::Var(0), ArgSlot::Var(0)];
        assert!(!compose(&args, &entry, &mut vsub, &mut esub));

        let args = [ArgSlot::Value(TermId(5)), ArgSlot::Value(TermId(7))];
        assert!(!compose(&args, &entry, &mut [], &mut []));
    }

    #[test]
    fn test_run_finds_model_point() {
        let mut tm = TermManager::new();
        let mut ctx = EvalCtx::new(&tm);
        let mut model = TableModel::new();
        let ints = tm.sorts.int_sort;
        let f = model.declare_function(&mut tm, "f", 1);
        let (one, two, m1, three, five) =
            (int(&mut tm, 1), int(&mut tm, 2), int(&mut tm, -1), int(&mut tm, 3), int(&mut tm, 5));
        model.add_entry(&tm, f, &[one], m1).unwrap();
        model.add_entry(&tm, f, &[two], three).unwrap();
        model.set_else(&tm, f, five).unwrap();

        let x = tm.mk_bound_var(0, ints);
        let fx = tm.mk_apply("f", [x], ints);
        let zero = int(&mut tm, 0);
        let body = tm.mk_ge(fx, zero);
        let qt = tm.mk_forall([("x", ints)], body);
        let q = QuantifiedFormula::from_term(&tm, qt).unwrap();

        let result = EvalCheck::default().run(&mut ctx, &mut tm, &model, &q).unwrap();
        let expected = instantiate(&mut tm, qt, &[one]).unwrap();
        assert_eq!(result, CheckResult::Refuted(vec![expected]));
    }

    /// forall x y. f(x) >= 0 or g(y) >= 0
    fn two_tables(tm: &mut TermManager, model: &mut TableModel, f_rows: &[(i64, i64)], g_rows: &[(i64, i64)]) -> QuantifiedFormula {
        let ints = tm.sorts.int_sort;
        for (name, rows) in [("f", f_rows), ("g", g_rows)] {
            let func = model.declare_function(tm, name, 1);
            for &(a, r) in rows {
                let (a, r) = (int(tm, a), int(tm, r));
                model.add_entry(tm, func, &[a], r).unwrap();
            }
            let five = int(tm, 5);
            model.set_else(tm, func, five).unwrap();
        }
        let x = tm.mk_bound_var(0, ints);
        let y = tm.mk_bound_var(1, ints);
        let fx = tm.mk_apply("f", [x], ints);
        let gy = tm.mk_apply("g", [y], ints);
        let zero = int(tm, 0);
        let left = tm.mk_ge(fx, zero);
        let right = tm.mk_ge(gy, zero);
        let body = tm.mk_or([left, right]);
        let qt = tm.mk_forall([("x", ints), ("y", ints)], body);
        QuantifiedFormula::from_term(tm, qt).unwrap()
    }

    #[test]
    fn test_inst_limited_stops_inner_enumeration() {
        let mut tm = TermManager::new();
        let mut model = TableModel::new();
        let q = two_tables(&mut tm, &mut model, &[(1, -1), (2, -2)], &[(1, -1)]);
        let mut ctx = EvalCtx::new(&tm);

        let limited = EvalCheck::default().run(&mut ctx, &mut tm, &model, &q).unwrap();
        let (one, two) = (int(&mut tm, 1), int(&mut tm, 2));
        let first = instantiate(&mut tm, q.term, &[one, one]).unwrap();
        assert_eq!(limited, CheckResult::Refuted(vec![first]));

        let all = EvalCheck {
            inst_limited: false,
            multiple_patterns: false,
        };
        let result = all.run(&mut ctx, &mut tm, &model, &q).unwrap();
        let second = instantiate(&mut tm, q.term, &[two, one]).unwrap();
        assert_eq!(result, CheckResult::Refuted(vec![first, second]));
    }

    #[test]
    fn test_multiple_patterns_pass_count() {
        let mut tm = TermManager::new();
        let mut model = TableModel::new();
        let q = two_tables(&mut tm, &mut model, &[], &[]);
        let mut ctx = EvalCtx::new(&tm);
        let search = EvalCheck {
            inst_limited: true,
            multiple_patterns: true,
        };
        let result = search.run(&mut ctx, &mut tm, &model, &q).unwrap();
        assert_eq!(result, CheckResult::Undetermined);
        // one pass per starting node, then a failing pass
        assert_eq!(ctx.stats().num_eval_check_passes, 3);

        let mut ctx = EvalCtx::new(&tm);
        EvalCheck::default().run(&mut ctx, &mut tm, &model, &q).unwrap();
        assert_eq!(ctx.stats().num_eval_check_passes, 1);
    }

    #[test]
    fn test_variable_outside_application_is_evaluated() {
        // forall x. x < 3 or f(x) >= 0 with f = {5 -> -1, 1 -> -1, else 0}
        let mut tm = TermManager::new();
        let mut model = TableModel::new();
        let ints = tm.sorts.int_sort;
        let f = model.declare_function(&mut tm, "f", 1);
        let (five, one, m1, zero, three) =
            (int(&mut tm, 5), int(&mut tm, 1), int(&mut tm, -1), int(&mut tm, 0), int(&mut tm, 3));
        model.add_entry(&tm, f, &[five], m1).unwrap();
        model.add_entry(&tm, f, &[one], m1).unwrap();
        model.set_else(&tm, f, zero).unwrap();

        let x = tm.mk_bound_var(0, ints);
        let lt = tm.mk_lt(x, three);
        let fx = tm.mk_apply("f", [x], ints);
        let ge = tm.mk_ge(fx, zero);
        let body = tm.mk_or([lt, ge]);
        let qt = tm.mk_forall([("x", ints)], body);
        let q = QuantifiedFormula::from_term(&tm, qt).unwrap();

        let mut ctx = EvalCtx::new(&tm);
        let result = EvalCheck::default().run(&mut ctx, &mut tm, &model, &q).unwrap();
        let expected = instantiate(&mut tm, qt, &[five]).unwrap();
        assert_eq!(result, CheckResult::Refuted(vec![expected]));
    }

    #[test]
    fn test_lemma_uses_annotations() {
        let mut tm = TermManager::new();
        let mut model = TableModel::new();
        let ints = tm.sorts.int_sort;
        let f = model.declare_function(&mut tm, "f", 1);
        let (one, m1) = (int(&mut tm, 1), int(&mut tm, -1));
        let c = tm.mk_var("c", ints);
        model.add_annotated_entry(&tm, f, &[one], &[c], m1).unwrap();

        let x = tm.mk_bound_var(0, ints);
        let fx = tm.mk_apply("f", [x], ints);
        let zero = int(&mut tm, 0);
        let body = tm.mk_ge(fx, zero);
        let qt = tm.mk_forall([("x", ints)], body);
        let q = QuantifiedFormula::from_term(&tm, qt).unwrap();

        let mut ctx = EvalCtx::new(&tm);
        let result = EvalCheck::default().run(&mut ctx, &mut tm, &model, &q).unwrap();
        let expected = instantiate(&mut tm, qt, &[c]).unwrap();
        assert_eq!(result.instantiations(), &[expected]);
    }
}
