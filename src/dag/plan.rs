// src/dag/plan.rs

//! Lowering of a task sequence into an invocation graph.
//!
//! A [`Sequence`] is a list of [`Step`]s. Expanding it against a
//! [`Registry`] yields a [`Plan`]: one [`Invocation`] per action that will
//! actually run, with explicit "must finish before" edges.
//!
//! Expansion rules:
//! - a task's prerequisites are expanded, in order, before the task itself,
//!   every time the task appears (no deduplication);
//! - a `sequence` task contributes its steps inline and is never dispatched;
//! - a sequential step depends on everything the previous step finished with;
//! - a parallel group starts all members from the same predecessors and is
//!   finished when every member is.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::engine::{InvocationId, TaskName};
use crate::errors::{Result, SitepipeError};
use crate::registry::{Registry, Task, TaskAction};

/// One entry of a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Step {
    /// Runs after all previous steps have finished.
    Sequential(TaskName),
    /// Members start together; the step finishes when all of them have.
    Parallel(Vec<TaskName>),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Sequential(name) => write!(f, "{name}"),
            Step::Parallel(names) => write!(f, "[{}]", names.join(", ")),
        }
    }
}

/// An ordered list of steps, e.g. `["clean", "build", ["watch", "serve"]]`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Sequence {
    pub steps: Vec<Step>,
}

impl Sequence {
    /// A sequence running just `task`.
    pub fn single<N: Into<TaskName>>(task: N) -> Self {
        Self {
            steps: vec![Step::Sequential(task.into())],
        }
    }

    pub fn from_steps(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Every task name referenced by the steps, in order of appearance.
    pub fn task_names(&self) -> impl Iterator<Item = &TaskName> {
        self.steps.iter().flat_map(|step| match step {
            Step::Sequential(name) => std::slice::from_ref(name).iter(),
            Step::Parallel(names) => names.iter(),
        })
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let steps: Vec<String> = self.steps.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", steps.join(" -> "))
    }
}

/// One planned execution of a task's action.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub id: InvocationId,
    pub task: Arc<Task>,
    /// Invocations that must finish before this one may start.
    pub deps: Vec<InvocationId>,
}

/// The expanded, acyclic invocation graph of one sequence run.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    invocations: Vec<Invocation>,
}

impl Plan {
    /// Expand `sequence` against `registry`.
    ///
    /// Fails with [`SitepipeError::TaskNotFound`] or
    /// [`SitepipeError::DependencyCycle`] before anything is scheduled.
    pub fn build(registry: &Registry, sequence: &Sequence) -> Result<Self> {
        let mut lowering = Lowering {
            registry,
            invocations: Vec::new(),
            visiting: Vec::new(),
        };

        let mut exits = Vec::new();
        for step in &sequence.steps {
            exits = lowering.step(step, exits)?;
        }

        Ok(Self {
            invocations: lowering.invocations,
        })
    }

    pub fn invocations(&self) -> &[Invocation] {
        &self.invocations
    }

    pub fn get(&self, id: InvocationId) -> Option<&Invocation> {
        self.invocations.get(id)
    }

    pub fn len(&self) -> usize {
        self.invocations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invocations.is_empty()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for inv in &self.invocations {
            write!(f, "#{:<3} {}", inv.id, inv.task)?;
            if !inv.deps.is_empty() {
                let deps: Vec<String> = inv.deps.iter().map(|d| format!("#{d}")).collect();
                write!(f, "  after {}", deps.join(", "))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

struct Lowering<'a> {
    registry: &'a Registry,
    invocations: Vec<Invocation>,
    /// Tasks currently being expanded, outermost first.
    visiting: Vec<TaskName>,
}

impl Lowering<'_> {
    fn step(&mut self, step: &Step, preds: Vec<InvocationId>) -> Result<Vec<InvocationId>> {
        match step {
            Step::Sequential(name) => self.task(name, preds),
            Step::Parallel(names) if names.is_empty() => Ok(preds),
            Step::Parallel(names) => {
                let mut exits = Vec::new();
                for name in names {
                    for id in self.task(name, preds.clone())? {
                        if !exits.contains(&id) {
                            exits.push(id);
                        }
                    }
                }
                Ok(exits)
            }
        }
    }

    fn task(&mut self, name: &str, preds: Vec<InvocationId>) -> Result<Vec<InvocationId>> {
        if let Some(pos) = self.visiting.iter().position(|n| n == name) {
            let mut cycle: Vec<&str> = self.visiting[pos..].iter().map(|s| s.as_str()).collect();
            cycle.push(name);
            return Err(SitepipeError::DependencyCycle(cycle.join(" -> ")));
        }

        let task = self.registry.resolve(name)?;
        self.visiting.push(task.name.clone());

        let mut exits = preds;
        for prereq in &task.prerequisites {
            exits = self.task(prereq, exits)?;
        }

        match &task.action {
            TaskAction::Sequence(seq) => {
                for step in &seq.steps {
                    exits = self.step(step, exits)?;
                }
            }
            _ => {
                let id = self.invocations.len();
                self.invocations.push(Invocation {
                    id,
                    task: Arc::clone(&task),
                    deps: exits,
                });
                exits = vec![id];
            }
        }

        self.visiting.pop();
        Ok(exits)
    }
}
