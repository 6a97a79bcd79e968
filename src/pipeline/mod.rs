//! Pipeline stages and their schedules.
//!
//! A stage is a named computation with an ordered list of dimension
//! arguments, a primary definition, and zero or more ordered update
//! definitions. Stages are produced by the pipeline builder upstream and
//! are read-only to the optimization passes here.

use crate::ir::expr::Expr;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where a stage is stored or computed relative to the loop nest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopLevel {
    /// Inlined into consumers; no storage of its own.
    Inlined,
    /// Outside all loops.
    Root,
    /// At a particular loop of a particular stage.
    At {
        /// The stage whose loop nest hosts this level.
        stage: String,
        /// The loop variable name.
        var: String,
    },
}

/// A stage's placement in the loop nest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSchedule {
    /// Where the stage's buffer is allocated.
    pub store_level: LoopLevel,
    /// Where the stage's values are computed.
    pub compute_level: LoopLevel,
}

/// A guarded alternate definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specialization {
    /// The guard under which this definition replaces its parent.
    pub condition: Expr,
    /// The alternate definition.
    pub definition: Definition,
}

/// One definition of a stage: the store-index expression per dimension,
/// plus any specializations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    /// Store-index expressions, one per stage dimension.
    pub args: Vec<Expr>,
    /// Guarded alternates, checked with the same purity rules.
    pub specializations: Vec<Specialization>,
}

impl Definition {
    /// A definition with the given store-index expressions.
    pub fn new(args: Vec<Expr>) -> Self {
        Self {
            args,
            specializations: Vec::new(),
        }
    }

    /// A definition that writes each dimension at its own argument.
    pub fn pure_over(dims: &[&str]) -> Self {
        Self::new(dims.iter().map(|d| Expr::Var(d.to_string())).collect())
    }

    /// Attach a specialization.
    pub fn with_specialization(mut self, condition: Expr, definition: Definition) -> Self {
        self.specializations.push(Specialization {
            condition,
            definition,
        });
        self
    }
}

/// A named pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    /// Stage name.
    pub name: String,
    /// Ordered dimension argument names.
    pub args: Vec<String>,
    /// The primary definition.
    pub init: Definition,
    /// Ordered update definitions.
    pub updates: Vec<Definition>,
    /// Storage and compute placement.
    pub schedule: StageSchedule,
}

impl Stage {
    /// A stage whose primary definition is pure over `dims`, scheduled at
    /// root for both storage and compute.
    pub fn new(name: impl Into<String>, dims: &[&str]) -> Self {
        Self {
            name: name.into(),
            args: dims.iter().map(|d| d.to_string()).collect(),
            init: Definition::pure_over(dims),
            updates: Vec::new(),
            schedule: StageSchedule {
                store_level: LoopLevel::Root,
                compute_level: LoopLevel::Root,
            },
        }
    }

    /// Append an update definition.
    pub fn with_update(mut self, def: Definition) -> Self {
        self.updates.push(def);
        self
    }

    /// Set the compute level.
    pub fn computed_at(mut self, stage: impl Into<String>, var: impl Into<String>) -> Self {
        self.schedule.compute_level = LoopLevel::At {
            stage: stage.into(),
            var: var.into(),
        };
        self
    }

    /// Set the store level.
    pub fn stored_at(mut self, stage: impl Into<String>, var: impl Into<String>) -> Self {
        self.schedule.store_level = LoopLevel::At {
            stage: stage.into(),
            var: var.into(),
        };
        self
    }

    /// Number of dimensions.
    pub fn dimensions(&self) -> usize {
        self.args.len()
    }

    /// Bound-name prefix for definition stage `k`: `<name>.s<k>.`.
    pub fn stage_prefix(&self, k: usize) -> String {
        format!("{}.s{}.", self.name, k)
    }

    /// Bound-name prefix for the last definition stage.
    pub fn last_stage_prefix(&self) -> String {
        self.stage_prefix(self.updates.len())
    }
}

/// The stage-name to stage table consumed by the pass.
pub type StageMap = HashMap<String, Stage>;

/// Build a [`StageMap`] from a list of stages.
pub fn stage_map(stages: impl IntoIterator<Item = Stage>) -> StageMap {
    stages
        .into_iter()
        .map(|stage| (stage.name.clone(), stage))
        .collect()
}
