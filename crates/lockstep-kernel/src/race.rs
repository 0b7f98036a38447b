//! [`Race`] – runs every child at once, finishing as soon as one finishes.
//!
//! In the tick a child finishes, that child is ended and every child still
//! running is interrupted exactly once; the race then reports finished.
//! This is the building block behind `with_timeout`, `until` and
//! `repeat_until`.

use std::collections::BTreeSet;

use lockstep_types::{CommandResult, ConfigError, Resource};

use crate::command::Command;
use crate::group::{Children, all_interruptible, all_run_when_disabled, disjoint_union, extend_disjoint};

pub struct Race {
    children: Children,
    stopped: Vec<bool>,
    done: bool,
    requirements: BTreeSet<Resource>,
}

impl Race {
    /// # Errors
    ///
    /// [`ConfigError::OverlappingRequirements`] when two children share a
    /// resource.
    pub fn new(children: Vec<Box<dyn Command>>) -> Result<Self, ConfigError> {
        let requirements = disjoint_union("Race", &children)?;
        Ok(Self {
            stopped: vec![false; children.len()],
            children,
            done: false,
            requirements,
        })
    }

    /// A two-way race against a timer that requires nothing.
    pub(crate) fn against(primary: impl Command + 'static, timer: impl Command + 'static) -> Self {
        let primary: Box<dyn Command> = Box::new(primary);
        let timer: Box<dyn Command> = Box::new(timer);
        let requirements = primary.requirements().clone();
        Self {
            children: vec![primary, timer],
            stopped: vec![false; 2],
            done: false,
            requirements,
        }
    }

    /// Add `other` to the race.
    ///
    /// # Errors
    ///
    /// [`ConfigError::OverlappingRequirements`] when `other` shares a resource
    /// with a child already in the race.
    pub fn race_with(mut self, other: impl Command + 'static) -> Result<Self, ConfigError> {
        extend_disjoint("Race", &mut self.requirements, other.requirements())?;
        self.children.push(Box::new(other));
        self.stopped.push(false);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Command for Race {
    fn requirements(&self) -> &BTreeSet<Resource> {
        &self.requirements
    }

    fn initialize(&mut self) -> CommandResult<()> {
        self.stopped.fill(false);
        self.done = self.children.is_empty();
        for (index, child) in self.children.iter_mut().enumerate() {
            if let Err(error) = child.initialize() {
                // Only the children started before the fault get torn down.
                self.stopped[index..].fill(true);
                return Err(error);
            }
        }
        Ok(())
    }

    fn execute(&mut self) -> CommandResult<()> {
        let mut winner = false;
        for (child, stopped) in self.children.iter_mut().zip(self.stopped.iter_mut()) {
            if *stopped {
                continue;
            }
            child.execute()?;
            if child.is_finished() {
                child.end();
                *stopped = true;
                winner = true;
            }
        }
        if winner {
            for (child, stopped) in self.children.iter_mut().zip(self.stopped.iter_mut()) {
                if !*stopped {
                    child.interrupt();
                    *stopped = true;
                }
            }
            self.done = true;
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.done
    }

    fn end(&mut self) {
        for (child, stopped) in self.children.iter_mut().zip(self.stopped.iter_mut()) {
            if !*stopped {
                child.end();
                *stopped = true;
            }
        }
    }

    fn interrupt(&mut self) {
        for (child, stopped) in self.children.iter_mut().zip(self.stopped.iter_mut()) {
            if !*stopped {
                child.interrupt();
                *stopped = true;
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
