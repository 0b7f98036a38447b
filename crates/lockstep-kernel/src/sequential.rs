//! [`Sequential`] – runs children one after another.
//!
//! Only one child is active at a time, so children may share requirements.
//! When the active child finishes it is ended and the next child is
//! initialized in the same tick; its first `execute` happens on the next.

use std::collections::BTreeSet;

use lockstep_types::{CommandResult, Resource};

use crate::command::Command;
use crate::group::{Children, all_interruptible, all_run_when_disabled, union_of};

pub struct Sequential {
    children: Children,
    cursor: usize,
    requirements: BTreeSet<Resource>,
}

impl Sequential {
    pub fn new(children: Vec<Box<dyn Command>>) -> Self {
        let requirements = union_of(&children);
        Self {
            children,
            cursor: 0,
            requirements,
        }
    }

    /// Append `next` to the end of the sequence.
    pub fn and_then(mut self, next: impl Command + 'static) -> Self {
        self.requirements
            .extend(next.requirements().iter().cloned());
        self.children.push(Box::new(next));
        self
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Index of the child currently running.
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

impl Command for Sequential {
    fn requirements(&self) -> &BTreeSet<Resource> {
        &self.requirements
    }

    fn initialize(&mut self) -> CommandResult<()> {
        self.cursor = 0;
        match self.children.first_mut() {
            Some(first) => first.initialize(),
            None => Ok(()),
        }
    }

    fn execute(&mut self) -> CommandResult<()> {
        let Some(current) = self.children.get_mut(self.cursor) else {
            return Ok(());
        };
        current.execute()?;
        if current.is_finished() {
            current.end();
            self.cursor += 1;
            if let Some(next) = self.children.get_mut(self.cursor) {
                next.initialize()?;
            }
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.cursor >= self.children.len()
    }

    fn end(&mut self) {
        if let Some(current) = self.children.get_mut(self.cursor) {
            current.end();
            self.cursor = self.children.len();
        }
    }

    fn interrupt(&mut self) {
        if let Some(current) = self.children.get_mut(self.cursor) {
            current.interrupt();
            self.cursor = self.children.len();
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
