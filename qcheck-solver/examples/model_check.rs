//! # Model Checking Example
//!
//! This example checks quantified formulas against a candidate model and
//! prints the instantiation lemmas that refute them.
//! It covers:
//! - Describing a model as function tables
//! - Definition-based checking with [`EvalCtx::check`]
//! - The heuristic table search with [`EvalCheck`]
//! - Exhaustive instantiation over an uninterpreted universe
//!
//! Logging is set to debug level, so the evaluator's decisions are printed
//! alongside the results.

use num_bigint::BigInt;
use qcheck_core::TermManager;
use qcheck_solver::mbqi::{CheckResult, EvalCheck, EvalCtx, QuantifiedFormula, TableModel};

fn report(tm: &TermManager, label: &str, result: &CheckResult) {
    match result {
        CheckResult::Satisfied => println!("  {label}: satisfied"),
        CheckResult::Undetermined => println!("  {label}: undetermined"),
        CheckResult::Refuted(lemmas) => {
            println!("  {label}: refuted by {} lemma(s)", lemmas.len());
            for &lemma in lemmas {
                println!("    {}", tm.display(lemma));
            }
        }
    }
}

fn main() -> qcheck_core::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .init();

    println!("=== QCheck: Model Checking ===\n");

    let mut tm = TermManager::new();
    let int = tm.sorts.int_sort;
    let mut model = TableModel::new();

    // f = { 1 -> -1, 2 -> 3, 4 -> -7, else -> 5 }
    let f = model.declare_function(&mut tm, "f", 1);
    for (arg, value) in [(1, -1), (2, 3), (4, -7)] {
        let arg = tm.mk_int(BigInt::from(arg));
        let value = tm.mk_int(BigInt::from(value));
        model.add_entry(&tm, f, &[arg], value)?;
    }
    let five = tm.mk_int(BigInt::from(5));
    model.set_else(&tm, f, five)?;

    println!("--- forall x. x < 2 or f(x) >= 0 ---");
    let x = tm.mk_bound_var(0, int);
    let two = tm.mk_int(BigInt::from(2));
    let zero = tm.mk_int(BigInt::from(0));
    let guard = tm.mk_lt(x, two);
    let fx = tm.mk_apply("f", [x], int);
    let nonneg = tm.mk_ge(fx, zero);
    let body = tm.mk_or([guard, nonneg]);
    let term = tm.mk_forall([("x", int)], body);
    let q = QuantifiedFormula::from_term(&tm, term)?;

    let mut ctx = EvalCtx::new(&tm);
    let result = ctx.check(&mut tm, &mut model, &q)?;
    report(&tm, "check", &result);
    let result = EvalCheck::new(ctx.config()).run(&mut ctx, &mut tm, &model, &q)?;
    report(&tm, "search", &result);

    println!("\n--- forall x, y: U. x = y ---");
    let u = tm.mk_uninterpreted_sort("U");
    for i in 0..3 {
        let elem = tm.mk_uninterpreted_value(u, i);
        model.add_to_universe(u, elem);
    }
    let x = tm.mk_bound_var(0, u);
    let y = tm.mk_bound_var(1, u);
    let body = tm.mk_eq(x, y);
    let term = tm.mk_forall([("x", u), ("y", u)], body);
    let q = QuantifiedFormula::from_term(&tm, term)?;
    let mut instances = Vec::new();
    if ctx.exhaustive_instantiate(&mut tm, &model, &q, false, &mut instances)? {
        println!("  {} instances over a universe of 3", instances.len());
    }

    println!("\n{}", ctx.stats());
    Ok(())
}
