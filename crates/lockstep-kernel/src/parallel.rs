//! [`Parallel`] – runs every child at once, finishing when all have finished.
//!
//! Children run "simultaneously" inside one scheduled identity, so their
//! requirements must be disjoint; construction fails otherwise.

use std::collections::BTreeSet;

use lockstep_types::{CommandResult, ConfigError, Resource};

use crate::command::Command;
use crate::group::{Children, all_interruptible, all_run_when_disabled, disjoint_union, extend_disjoint};

pub struct Parallel {
    children: Children,
    finished: Vec<bool>,
    requirements: BTreeSet<Resource>,
}

impl Parallel {
    /// # Errors
    ///
    /// [`ConfigError::OverlappingRequirements`] when two children share a
    /// resource.
    pub fn new(children: Vec<Box<dyn Command>>) -> Result<Self, ConfigError> {
        let requirements = disjoint_union("Parallel", &children)?;
        Ok(Self {
            finished: vec![false; children.len()],
            children,
            requirements,
        })
    }

    /// Add `other` to the group.
    ///
    /// # Errors
    ///
    /// [`ConfigError::OverlappingRequirements`] when `other` shares a resource
    /// with a child already in the group.
    pub fn along_with(mut self, other: impl Command + 'static) -> Result<Self, ConfigError> {
        extend_disjoint("Parallel", &mut self.requirements, other.requirements())?;
        self.children.push(Box::new(other));
        self.finished.push(false);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Command for Parallel {
    fn requirements(&self) -> &BTreeSet<Resource> {
        &self.requirements
    }

    fn initialize(&mut self) -> CommandResult<()> {
        self.finished.fill(false);
        for (index, child) in self.children.iter_mut().enumerate() {
            if let Err(error) = child.initialize() {
                // Only the children started before the fault get torn down.
                self.finished[index..].fill(true);
                return Err(error);
            }
        }
        Ok(())
    }

    fn execute(&mut self) -> CommandResult<()> {
        for (child, done) in self.children.iter_mut().zip(self.finished.iter_mut()) {
            if *done {
                continue;
            }
            child.execute()?;
            if child.is_finished() {
                child.end();
                *done = true;
            }
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.finished.iter().all(|done| *done)
    }

    fn end(&mut self) {
        for (child, done) in self.children.iter_mut().zip(self.finished.iter_mut()) {
            if !*done {
                child.end();
                *done = true;
            }
        }
    }

    fn interrupt(&mut self) {
        for (child, done) in self.children.iter_mut().zip(self.finished.iter_mut()) {
            if !*done {
                child.interrupt();
                *done = true;
            }
        }
    }

    fn was_successful(&self) -> bool {
        self.children.iter().all(|child| child.was_successful())
    }

    fn is_interruptible(&self) -> bool {
        all_interruptible(&self.children)
    }

    fn runs_when_disabled(&self) -> bool {
        all_run_when_disabled(&self.children)
    }
}
