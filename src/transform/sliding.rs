//! The sliding-window optimization pass.
//!
//! When a stage is computed inside a serial loop of its consumer, and its
//! required region moves monotonically as the loop variable advances, each
//! iteration only needs to compute the slice that the previous iteration
//! did not. The pass narrows the stage's required-region bounds to that
//! slice, pulls the loop start back far enough to warm the window up, and
//! guards unrelated consumers against the warmup iterations.
//!
//! The pass is structured as three nested drivers:
//!
//! * [`SlidingWindow`] walks the program and fires once per eligible
//!   storage allocation.
//! * `StageSlider` walks one stage's enclosing loop nest and restructures
//!   any loop that a slide succeeded over.
//! * `LoopSlider` attempts the slide itself for one (stage, loop) pair:
//!   dimension selection, monotonicity and overlap proofs, the solve for a
//!   new loop start, and the bound rewrites.
//!
//! Failure to apply the optimization is never an error; the subtree is
//! simply returned unchanged. Errors are reserved for trees that an
//! earlier lowering pass should not have produced.

use crate::analysis::{
    box_provided, can_prove, equal, is_monotonic, lower_unsafe_promises, simplify, solve_for_inner,
    Monotonic,
};
use crate::ir::builder::{eq, ge, le, likely, max, min, select, v};
use crate::ir::{substitute, substitute_map_stmt, Expr, Stmt};
use crate::pipeline::{Definition, Stage, StageMap};
use crate::utils::{Diagnostics, NameGen, Scope, SlideError, SlideResult};
use log::{debug, trace};
use std::collections::{HashMap, HashSet};
use std::convert::Infallible;

/// Substitute every visible scope binding into `e`.
///
/// Bindings pushed into the scope are themselves fully expanded, so a
/// single substitution pass sees through all intermediate naming layers.
/// An expression-level binding of the same name shadows the scope entry
/// for the extent of its body.
pub(crate) fn expand_expr(e: &Expr, scope: &Scope<Expr>) -> Expr {
    fn expand(e: &Expr, scope: &Scope<Expr>, shadowed: &mut HashSet<String>) -> Expr {
        match e {
            Expr::IntLit(_) | Expr::BoolLit(_) => e.clone(),
            Expr::Var(name) => {
                if !shadowed.contains(name) {
                    if let Some(binding) = scope.get(name) {
                        trace!("expanded {} -> {}", name, binding);
                        return binding.clone();
                    }
                }
                e.clone()
            }
            Expr::Binary { op, a, b } => Expr::Binary {
                op: *op,
                a: Box::new(expand(a, scope, shadowed)),
                b: Box::new(expand(b, scope, shadowed)),
            },
            Expr::Cmp { op, a, b } => Expr::Cmp {
                op: *op,
                a: Box::new(expand(a, scope, shadowed)),
                b: Box::new(expand(b, scope, shadowed)),
            },
            Expr::Not(a) => Expr::Not(Box::new(expand(a, scope, shadowed))),
            Expr::Select {
                cond,
                if_true,
                if_false,
            } => Expr::Select {
                cond: Box::new(expand(cond, scope, shadowed)),
                if_true: Box::new(expand(if_true, scope, shadowed)),
                if_false: Box::new(expand(if_false, scope, shadowed)),
            },
            Expr::Let { name, value, body } => {
                let value = expand(value, scope, shadowed);
                let fresh = shadowed.insert(name.clone());
                let body = expand(body, scope, shadowed);
                if fresh {
                    shadowed.remove(name);
                }
                Expr::Let {
                    name: name.clone(),
                    value: Box::new(value),
                    body: Box::new(body),
                }
            }
            Expr::Call { stage, args } => Expr::Call {
                stage: stage.clone(),
                args: args.iter().map(|a| expand(a, scope, shadowed)).collect(),
            },
            Expr::Likely(a) => Expr::Likely(Box::new(expand(a, scope, shadowed))),
            Expr::UnsafePromise(a) => {
                Expr::UnsafePromise(Box::new(expand(a, scope, shadowed)))
            }
        }
    }
    expand(e, scope, &mut HashSet::new())
}

/// Whether evaluating `e` could observe a change in `var`.
///
/// A binding's value is always checked; its body only when the binding
/// does not rebind `var` itself, since the rebinding cuts the dependency.
pub(crate) fn expr_depends_on_var(e: &Expr, var: &str) -> bool {
    match e {
        Expr::IntLit(_) | Expr::BoolLit(_) => false,
        Expr::Var(name) => name == var,
        Expr::Binary { a, b, .. } | Expr::Cmp { a, b, .. } => {
            expr_depends_on_var(a, var) || expr_depends_on_var(b, var)
        }
        Expr::Not(a) | Expr::Likely(a) | Expr::UnsafePromise(a) => expr_depends_on_var(a, var),
        Expr::Select {
            cond,
            if_true,
            if_false,
        } => {
            expr_depends_on_var(cond, var)
                || expr_depends_on_var(if_true, var)
                || expr_depends_on_var(if_false, var)
        }
        Expr::Let { name, value, body } => {
            expr_depends_on_var(value, var) || (name != var && expr_depends_on_var(body, var))
        }
        Expr::Call { args, .. } => args.iter().any(|a| expr_depends_on_var(a, var)),
    }
}

/// Whether `def` stores dimension `dim_idx` at exactly its own argument
/// `dim`, in the definition and all of its specializations.
fn is_dim_always_pure(def: &Definition, dim: &str, dim_idx: usize) -> bool {
    if def.args.get(dim_idx).and_then(|a| a.as_var()) != Some(dim) {
        return false;
    }
    def.specializations
        .iter()
        .all(|s| is_dim_always_pure(&s.definition, dim, dim_idx))
}

/// Attempts the slide for one stage over one serial loop.
///
/// Mutating the loop body fills `replacements` with new definitions for
/// the region-bound lets and, when the loop start moved, `new_loop_min`.
/// The owning `StageSlider` drains both.
struct LoopSlider<'a> {
    stage: &'a Stage,
    loop_var: String,
    loop_min: Expr,
    scope: Scope<Expr>,
    replacements: HashMap<String, Expr>,
    new_loop_min: Option<Expr>,
    names: &'a mut NameGen,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> LoopSlider<'a> {
    fn new(
        stage: &'a Stage,
        loop_var: &str,
        loop_min: Expr,
        names: &'a mut NameGen,
        diagnostics: &'a mut Diagnostics,
    ) -> Self {
        Self {
            stage,
            loop_var: loop_var.to_string(),
            loop_min,
            scope: Scope::new(),
            replacements: HashMap::new(),
            new_loop_min: None,
            names,
            diagnostics,
        }
    }

    fn mutate(&mut self, s: &Stmt) -> SlideResult<Stmt> {
        match s {
            Stmt::ProducerConsumer {
                stage,
                is_producer,
                body,
            } => {
                if *is_producer {
                    if stage == &self.stage.name {
                        self.slide_producer(s, body)
                    } else {
                        s.map_children(&mut |c| self.mutate(c))
                    }
                } else if !body.contains_producer_of(&self.stage.name)
                    && self.new_loop_min.is_some()
                {
                    // The loop start was pulled back to warm up the window.
                    // This consumer plays no part in the warmup, so it must
                    // only run on the original iterations. The guard goes
                    // inside the consumer marker so synchronization attached
                    // to the marker stays outside it.
                    let new_body = self.mutate(body)?;
                    let guard = likely(ge(
                        v(self.loop_var.clone()),
                        v(format!("{}.loop_min.orig", self.loop_var)),
                    ));
                    Ok(Stmt::ProducerConsumer {
                        stage: stage.clone(),
                        is_producer: false,
                        body: Box::new(Stmt::IfThenElse {
                            cond: guard,
                            then_case: Box::new(new_body),
                            else_case: None,
                        }),
                    })
                } else {
                    s.map_children(&mut |c| self.mutate(c))
                }
            }
            Stmt::For {
                name,
                min,
                extent,
                kind,
                body,
            } => {
                let expanded_min = expand_expr(min, &self.scope);
                let expanded_extent = expand_expr(extent, &self.scope);
                if expanded_extent.is_const(1) {
                    // A single-trip loop is just a binding of its variable to
                    // its min; traverse it as one and repack afterwards.
                    let as_let = Stmt::LetStmt {
                        name: name.clone(),
                        value: expanded_min,
                        body: body.clone(),
                    };
                    match self.mutate(&as_let)? {
                        Stmt::LetStmt { body: new_body, .. } => Ok(Stmt::For {
                            name: name.clone(),
                            min: min.clone(),
                            extent: extent.clone(),
                            kind: *kind,
                            body: new_body,
                        }),
                        other => Err(SlideError::Internal(format!(
                            "single-trip loop `{}` did not repack into a loop: {:?}",
                            name, other
                        ))),
                    }
                } else if is_monotonic(&expanded_min, &self.loop_var) != Monotonic::Constant
                    || is_monotonic(&expanded_extent, &self.loop_var) != Monotonic::Constant
                {
                    // The inner loop's shape varies with the slide axis;
                    // reasoning about footprints inside it would be unsound.
                    debug!(
                        "not entering loop over {} because its bounds depend on {}: {}, {}",
                        name, self.loop_var, expanded_min, expanded_extent
                    );
                    Ok(s.clone())
                } else {
                    s.map_children(&mut |c| self.mutate(c))
                }
            }
            Stmt::LetStmt { name, value, body } => {
                self.scope
                    .push(name, simplify(&expand_expr(value, &self.scope)));
                let new_body = self.mutate(body);
                self.scope.pop(name);
                let new_body = new_body?;
                let new_value = match self.replacements.remove(name) {
                    Some(replacement) => replacement,
                    None => value.clone(),
                };
                Ok(Stmt::LetStmt {
                    name: name.clone(),
                    value: new_value,
                    body: Box::new(new_body),
                })
            }
            _ => s.map_children(&mut |c| self.mutate(c)),
        }
    }

    /// The core decision procedure, applied at this stage's producer node.
    ///
    /// `original` is the whole producer marker; on any non-applicability
    /// outcome it is returned unchanged.
    fn slide_producer(&mut self, original: &Stmt, body: &Stmt) -> SlideResult<Stmt> {
        debug!(
            "considering sliding {} along loop variable {}",
            self.stage.name, self.loop_var
        );

        // We need exactly one dimension of the region required of the
        // stage's last definition to depend on the loop variable.
        let prefix = self.stage.last_stage_prefix();
        let mut selected: Option<(String, usize)> = None;
        let mut min_required: Option<Expr> = None;
        let mut max_required: Option<Expr> = None;
        for (i, arg) in self.stage.args.iter().enumerate() {
            let var = format!("{}{}", prefix, arg);
            let min_req = self.lookup_bound(&format!("{}.min", var))?;
            let max_req = self.lookup_bound(&format!("{}.max", var))?;
            let min_req = expand_expr(&min_req, &self.scope);
            let max_req = expand_expr(&max_req, &self.scope);
            trace!("region required of {}: [{}, {}]", var, min_req, max_req);

            if expr_depends_on_var(&min_req, &self.loop_var)
                || expr_depends_on_var(&max_req, &self.loop_var)
            {
                if selected.is_some() {
                    selected = None;
                    min_required = None;
                    max_required = None;
                    break;
                }
                selected = Some((arg.clone(), i));
                min_required = Some(min_req);
                max_required = Some(max_req);
            } else if min_required.is_none()
                && i == self.stage.dimensions() - 1
                && min_req.is_pure()
                && max_req.is_pure()
            {
                // The footprint doesn't depend on the loop variable at all.
                // Compute everything on the first iteration.
                selected = Some((arg.clone(), i));
                min_required = Some(min_req);
                max_required = Some(max_req);
            }
        }
        let (Some((dim, dim_idx)), Some(min_required), Some(max_required)) =
            (selected, min_required, max_required)
        else {
            debug!(
                "not sliding {} over {}: region depends on the loop variable in more than one dimension",
                self.stage.name, self.loop_var
            );
            return Ok(original.clone());
        };

        // If the stage scatters along the axis (in any definition or
        // specialization), narrowed bounds would miss stores.
        let pure = std::iter::once(&self.stage.init)
            .chain(self.stage.updates.iter())
            .all(|def| is_dim_always_pure(def, &dim, dim_idx));
        if !pure {
            debug!(
                "not sliding {} over {}: the stage scatters along dimension {}",
                self.stage.name, self.loop_var, dim
            );
            return Ok(original.clone());
        }

        let mut can_slide_up = false;
        let mut can_slide_down = false;
        match is_monotonic(&min_required, &self.loop_var) {
            Monotonic::Increasing | Monotonic::Constant => can_slide_up = true,
            Monotonic::Unknown => self.diagnostics.record_non_monotonic(&self.loop_var, &min_required),
            Monotonic::Decreasing => {}
        }
        match is_monotonic(&max_required, &self.loop_var) {
            Monotonic::Decreasing | Monotonic::Constant => can_slide_down = true,
            Monotonic::Unknown => self.diagnostics.record_non_monotonic(&self.loop_var, &max_required),
            Monotonic::Increasing => {}
        }
        if !can_slide_up && !can_slide_down {
            debug!(
                "not sliding {} over dimension {} along {}: no provable monotonic direction; min is {}, max is {}",
                self.stage.name, dim, self.loop_var, min_required, max_required
            );
            return Ok(original.clone());
        }

        let loop_var_expr = v(self.loop_var.clone());
        let prev_max_plus_one =
            substitute(&self.loop_var, &(loop_var_expr.clone() - 1), &max_required) + 1;
        let prev_min_minus_one =
            substitute(&self.loop_var, &(loop_var_expr.clone() - 1), &min_required) - 1;

        // If adjacent iterations' regions don't overlap, sliding buys nothing.
        if can_prove(&ge(min_required.clone(), prev_max_plus_one.clone()))
            || can_prove(&le(max_required.clone(), prev_min_minus_one.clone()))
        {
            debug!(
                "not sliding {} over dimension {} along {}: no overlap between iterations",
                self.stage.name, dim, self.loop_var
            );
            return Ok(original.clone());
        }

        debug!(
            "sliding {} over dimension {} along loop variable {}",
            self.stage.name, dim, self.loop_var
        );

        // Solve for the loop start at which the first iteration's region
        // lines up with the steady-state window: the region bound at the
        // original start must equal the adjacent-iteration bound at the
        // (unknown) new start.
        let new_loop_min_name = self.names.unique_name("x");
        let new_loop_min_var = v(new_loop_min_name.clone());
        let equation = if can_slide_up {
            eq(
                substitute(&self.loop_var, &self.loop_min, &min_required),
                substitute(&self.loop_var, &new_loop_min_var, &prev_max_plus_one),
            )
        } else {
            eq(
                substitute(&self.loop_var, &self.loop_min, &max_required),
                substitute(&self.loop_var, &new_loop_min_var, &prev_min_minus_one),
            )
        };
        // Unsafe promises are identity values; they must not block the solve.
        let equation = lower_unsafe_promises(&equation);
        let solved = solve_for_inner(&equation, &new_loop_min_name);

        let (new_min, new_max);
        if let Some(point) = solved.as_single_point() {
            if self.new_loop_min.is_some() {
                return Err(SlideError::Internal(format!(
                    "stage `{}` produced twice under loop `{}`",
                    self.stage.name, self.loop_var
                )));
            }
            let start = simplify(point);
            if !equal(&start, &self.loop_min) {
                self.new_loop_min = Some(start);
            }
            if can_slide_up {
                new_min = prev_max_plus_one;
                new_max = max_required;
            } else {
                new_min = min_required;
                new_max = prev_min_minus_one;
            }
        } else if can_slide_up {
            // No single warmup start exists. Keep the loop bounds and make
            // the first iteration compute the whole region instead.
            new_min = select(
                le(loop_var_expr.clone(), self.loop_min.clone()),
                min_required,
                likely(prev_max_plus_one),
            );
            new_max = max_required;
        } else {
            new_min = min_required;
            new_max = select(
                le(loop_var_expr, self.loop_min.clone()),
                max_required,
                likely(prev_min_minus_one),
            );
        }

        debug!(
            "sliding {} dimension {}: new region [{}, {}], new loop min {:?}",
            self.stage.name, dim, new_min, new_max, self.new_loop_min
        );

        // Redefine the narrowed bound of the last definition stage, and
        // alias every update stage's bounds to it so all stages agree on
        // the region.
        if can_slide_up {
            self.replacements
                .insert(format!("{}{}.min", prefix, dim), new_min.clone());
        } else {
            self.replacements
                .insert(format!("{}{}.max", prefix, dim), new_max.clone());
        }
        for k in 0..self.stage.updates.len() {
            let n = format!("{}{}", self.stage.stage_prefix(k), dim);
            self.replacements
                .insert(format!("{}.min", n), v(format!("{}{}.min", prefix, dim)));
            self.replacements
                .insert(format!("{}.max", n), v(format!("{}{}.max", prefix, dim)));
        }

        // With updates present, an earlier definition stage may write a
        // wider region than the last stage requires (e.g. when unrolled).
        // Widen the narrowed bound to cover whatever the producer body
        // actually stores.
        let mut stmt = original.clone();
        if !self.stage.updates.is_empty() {
            let written = box_provided(body, &self.stage.name);
            let interval = written.get(dim_idx).cloned().unwrap_or_else(|| {
                crate::analysis::Interval::everything()
            });
            if can_slide_up {
                let n = format!("{}{}.min", prefix, dim);
                let written_min = interval.min.ok_or_else(|| {
                    SlideError::Internal(format!(
                        "written region of `{}` has no lower bound along `{}`",
                        self.stage.name, dim
                    ))
                })?;
                stmt = Stmt::LetStmt {
                    name: n.clone(),
                    value: min(v(n), written_min),
                    body: Box::new(stmt),
                };
            } else {
                let n = format!("{}{}.max", prefix, dim);
                let written_max = interval.max.ok_or_else(|| {
                    SlideError::Internal(format!(
                        "written region of `{}` has no upper bound along `{}`",
                        self.stage.name, dim
                    ))
                })?;
                stmt = Stmt::LetStmt {
                    name: n.clone(),
                    value: max(v(n), written_max),
                    body: Box::new(stmt),
                };
            }
        }
        Ok(stmt)
    }

    fn lookup_bound(&self, name: &str) -> SlideResult<Expr> {
        self.scope
            .get(name)
            .cloned()
            .ok_or_else(|| SlideError::MissingBound {
                bound: name.to_string(),
                stage: self.stage.name.clone(),
            })
    }
}

/// Applies the per-loop slider throughout one stage's enclosing loop nest
/// and restructures any loop that was slid.
struct StageSlider<'a> {
    stage: &'a Stage,
    names: &'a mut NameGen,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> StageSlider<'a> {
    fn mutate(&mut self, s: &Stmt) -> SlideResult<Stmt> {
        let Stmt::For {
            name,
            min,
            extent,
            kind,
            body,
        } = s
        else {
            return s.map_children(&mut |c| self.mutate(c));
        };

        debug!("sliding window analysis over loop {}", name);

        let mut new_body = (**body).clone();
        let mut new_loop_name = name.clone();
        // New loop min and extent, when the slide moved the loop start.
        let mut slid: Option<(Expr, Expr)> = None;

        if kind.is_ordered() {
            let mut slider =
                LoopSlider::new(self.stage, name, min.clone(), self.names, self.diagnostics);
            new_body = slider.mutate(&new_body)?;
            // Every recorded bound rewrite must have matched a binding; a
            // leftover means the slide silently didn't take effect.
            if let Some(unconsumed) = slider.replacements.keys().min() {
                return Err(SlideError::UnconsumedReplacement(unconsumed.clone()));
            }
            if let Some(slid_min) = slider.new_loop_min.take() {
                // Rename the loop so the original bound names stay visible
                // to the warmup guard and the enclosing structure.
                new_loop_name = format!("{}.n", name);

                // The new loop runs from the new min to the old max.
                let min_var_name = min
                    .as_var()
                    .and_then(|n| n.strip_suffix(".loop_min"))
                    .ok_or_else(|| SlideError::MalformedLoopMin(name.clone()))?;
                let loop_max = v(format!("{}.loop_max", min_var_name));
                let extent = loop_max - v(format!("{}.loop_min", new_loop_name)) + 1;
                slid = Some((slid_min, extent));
            }
        }

        let (new_min, new_extent) = if new_loop_name != *name {
            // The slide above shadowed the old loop variable and its bound
            // names; rewrite the body onto the new names.
            let new_min = v(format!("{}.loop_min", new_loop_name));
            let new_extent = v(format!("{}.loop_extent", new_loop_name));
            let renames = HashMap::from([
                (name.clone(), v(new_loop_name.clone())),
                (format!("{}.loop_min", name), new_min.clone()),
                (format!("{}.loop_extent", name), new_extent.clone()),
            ]);
            new_body = substitute_map_stmt(&renames, &new_body);
            (new_min, new_extent)
        } else {
            (min.clone(), extent.clone())
        };

        new_body = self.mutate(&new_body)?;

        let mut new_for = Stmt::For {
            name: new_loop_name.clone(),
            min: new_min,
            extent: new_extent,
            kind: *kind,
            body: Box::new(new_body),
        };

        if let Some((new_loop_min, new_loop_extent)) = slid {
            let min_name = format!("{}.loop_min", new_loop_name);
            let extent_name = format!("{}.loop_extent", new_loop_name);
            let new_loop_max = v(min_name.clone()) + v(extent_name.clone()) - 1;
            new_for = Stmt::LetStmt {
                name: format!("{}.loop_max", new_loop_name),
                value: new_loop_max,
                body: Box::new(new_for),
            };
            new_for = Stmt::LetStmt {
                name: extent_name,
                value: new_loop_extent,
                body: Box::new(new_for),
            };
            new_for = Stmt::LetStmt {
                name: format!("{}.loop_min.orig", new_loop_name),
                value: v(min_name.clone()),
                body: Box::new(new_for),
            };
            new_for = Stmt::LetStmt {
                name: min_name,
                value: new_loop_min,
                body: Box::new(new_for),
            };
        }

        Ok(new_for)
    }
}

/// Record every loop's pre-optimization lower bound under
/// `<loop>.loop_min.orig`, so warmup guards can compare against it.
///
/// A loop whose origin name is already bound in the enclosing let-chain is
/// left alone, which keeps the whole pass idempotent on already-annotated
/// trees.
fn annotate_loop_min_orig(s: &Stmt) -> Stmt {
    fn go(s: &Stmt, bound: &mut HashSet<String>) -> Stmt {
        match s {
            Stmt::LetStmt { name, value, body } => {
                let fresh = bound.insert(name.clone());
                let new_body = go(body, bound);
                if fresh {
                    bound.remove(name);
                }
                Stmt::LetStmt {
                    name: name.clone(),
                    value: value.clone(),
                    body: Box::new(new_body),
                }
            }
            Stmt::For {
                name,
                min,
                extent,
                kind,
                body,
            } => {
                let new_body = go(body, bound);
                let new_for = Stmt::For {
                    name: name.clone(),
                    min: min.clone(),
                    extent: extent.clone(),
                    kind: *kind,
                    body: Box::new(new_body),
                };
                let orig_name = format!("{}.loop_min.orig", name);
                if bound.contains(&orig_name) {
                    new_for
                } else {
                    Stmt::LetStmt {
                        name: orig_name,
                        value: v(format!("{}.loop_min", name)),
                        body: Box::new(new_for),
                    }
                }
            }
            _ => {
                let result: Result<Stmt, Infallible> =
                    s.map_children(&mut |c| Ok(go(c, bound)));
                match result {
                    Ok(stmt) => stmt,
                    Err(never) => match never {},
                }
            }
        }
    }
    go(s, &mut HashSet::new())
}

/// The whole-program sliding-window pass.
///
/// Owns the fresh-name generator and the diagnostics sink for one
/// invocation; nothing is retained across invocations.
pub struct SlidingWindow<'a> {
    env: &'a StageMap,
    names: NameGen,
    diagnostics: Diagnostics,
}

impl<'a> SlidingWindow<'a> {
    /// Create a pass over the given stage table.
    pub fn new(env: &'a StageMap) -> Self {
        Self {
            env,
            names: NameGen::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Annotate original loop minima, then slide every eligible stage.
    pub fn transform(&mut self, stmt: &Stmt) -> SlideResult<Stmt> {
        let annotated = annotate_loop_min_orig(stmt);
        self.mutate(&annotated)
    }

    /// Diagnostics collected by [`transform`](Self::transform) calls so far.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    fn mutate(&mut self, s: &Stmt) -> SlideResult<Stmt> {
        let Stmt::Realize { stage, body } = s else {
            return s.map_children(&mut |c| self.mutate(c));
        };

        // An allocation with no stage entry is some anonymous realization
        // we should leave alone.
        let env = self.env;
        let Some(func) = env.get(stage) else {
            return s.map_children(&mut |c| self.mutate(c));
        };

        // Computed exactly where it is stored: no surrounding loop to
        // slide over.
        if func.schedule.compute_level == func.schedule.store_level {
            return s.map_children(&mut |c| self.mutate(c));
        }

        let new_body = self.mutate(body)?;

        debug!("sliding window analysis on realization of {}", stage);
        let mut slider = StageSlider {
            stage: func,
            names: &mut self.names,
            diagnostics: &mut self.diagnostics,
        };
        let new_body = slider.mutate(&new_body)?;

        Ok(Stmt::Realize {
            stage: stage.clone(),
            body: Box::new(new_body),
        })
    }
}

/// Run the sliding-window pass over a program.
///
/// Semantics-preserving: stages for which no slide can be proven safe are
/// left untouched. Diagnostics are discarded; use [`SlidingWindow`]
/// directly to inspect them.
pub fn sliding_window(stmt: &Stmt, env: &StageMap) -> SlideResult<Stmt> {
    SlidingWindow::new(env).transform(stmt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::*;
    use crate::ir::ForKind;

    #[test]
    fn test_expand_expr_sees_through_bindings() {
        let mut scope = Scope::new();
        scope.push("a", v("i") + 1);
        let out = expand_expr(&(v("a") + 2), &scope);
        assert_eq!(out, (v("i") + 1) + 2);
    }

    #[test]
    fn test_expand_expr_respects_shadowing() {
        let mut scope = Scope::new();
        scope.push("a", lit(7));
        // The let's value sees the scope; its body sees the rebinding.
        let e = let_expr("a", v("a") + 1, v("a") * 2);
        let out = expand_expr(&e, &scope);
        assert_eq!(out, let_expr("a", lit(7) + 1, v("a") * 2));
    }

    #[test]
    fn test_depends_on_var() {
        assert!(expr_depends_on_var(&(v("i") + 1), "i"));
        assert!(!expr_depends_on_var(&(v("n") + 1), "i"));
        // The binding's value always counts.
        assert!(expr_depends_on_var(
            &let_expr("i", v("i") + 1, lit(3)),
            "i"
        ));
        // A rebinding hides the name from the body.
        assert!(!expr_depends_on_var(&let_expr("i", lit(2), v("i")), "i"));
        assert!(expr_depends_on_var(&let_expr("j", v("i"), v("j")), "i"));
    }

    #[test]
    fn test_annotate_records_original_min() {
        let tree = for_loop(
            "y",
            v("y.loop_min"),
            v("y.loop_extent"),
            ForKind::Serial,
            Stmt::Evaluate(lit(0)),
        );
        let out = annotate_loop_min_orig(&tree);
        match out {
            Stmt::LetStmt { name, value, .. } => {
                assert_eq!(name, "y.loop_min.orig");
                assert_eq!(value, v("y.loop_min"));
            }
            other => panic!("expected a let around the loop, got {:?}", other),
        }
    }

    #[test]
    fn test_annotate_is_reentrant() {
        let tree = for_loop(
            "y",
            v("y.loop_min"),
            v("y.loop_extent"),
            ForKind::Serial,
            Stmt::Evaluate(lit(0)),
        );
        let once = annotate_loop_min_orig(&tree);
        let twice = annotate_loop_min_orig(&once);
        assert_eq!(once, twice);
    }
}
