//! [`Target`] – overrides command metadata without touching execution.

use std::collections::BTreeSet;

use lockstep_types::{CommandResult, Resource};

use crate::command::Command;

/// Forwards every hook to the inner command, replacing the name,
/// interruptibility or disabled behavior where an override is set.
pub struct Target {
    inner: Box<dyn Command>,
    name: Option<String>,
    interruptible: Option<bool>,
    runs_when_disabled: Option<bool>,
}

impl Target {
    pub fn new(inner: impl Command + 'static) -> Self {
        Self {
            inner: Box::new(inner),
            name: None,
            interruptible: None,
            runs_when_disabled: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn override_interrupt(mut self, interruptible: bool) -> Self {
        self.interruptible = Some(interruptible);
        self
    }

    pub fn override_disable(mut self, runs_when_disabled: bool) -> Self {
        self.runs_when_disabled = Some(runs_when_disabled);
        self
    }
}

impl Command for Target {
    fn requirements(&self) -> &BTreeSet<Resource> {
        self.inner.requirements()
    }

    fn initialize(&mut self) -> CommandResult<()> {
        self.inner.initialize()
    }

    fn execute(&mut self) -> CommandResult<()> {
        self.inner.execute()
    }

    fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    fn end(&mut self) {
        self.inner.end();
    }

    fn interrupt(&mut self) {
        self.inner.interrupt();
    }

    fn was_successful(&self) -> bool {
        self.inner.was_successful()
    }

    fn is_interruptible(&self) -> bool {
        self.interruptible
            .unwrap_or_else(|| self.inner.is_interruptible())
    }

    fn runs_when_disabled(&self) -> bool {
        self.runs_when_disabled
            .unwrap_or_else(|| self.inner.runs_when_disabled())
    }

    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.inner.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandExt;
    use crate::testing::{Journal, Probe};

    #[test]
    fn overrides_replace_one_accessor_each() {
        let journal = Journal::default();

        let locked = Probe::new("p", &journal).override_interrupt(false);
        assert!(!locked.is_interruptible());
        assert!(!locked.runs_when_disabled());
        assert_eq!(locked.name(), "p");

        let always_on = Probe::new("p", &journal).override_disable(true);
        assert!(always_on.runs_when_disabled());
        assert!(always_on.is_interruptible());

        let renamed = Probe::new("p", &journal).with_name("spin");
        assert_eq!(renamed.name(), "spin");
        assert!(renamed.is_interruptible());
    }

    #[test]
    fn chained_overrides_stack_on_one_wrapper() {
        let journal = Journal::default();
        let cmd = Probe::new("p", &journal)
            .with_name("hold")
            .override_interrupt(false)
            .override_disable(true);
        assert_eq!(cmd.name(), "hold");
        assert!(!cmd.is_interruptible());
        assert!(cmd.runs_when_disabled());
    }

    #[test]
    fn lifecycle_passes_through() {
        let journal = Journal::default();
        let arm = Resource::new("arm");
        let mut cmd = Probe::new("p", &journal)
            .requiring(arm.clone())
            .finishes_after(1)
            .override_interrupt(false);
        assert!(cmd.has_requirement(&arm));

        cmd.initialize().unwrap();
        cmd.execute().unwrap();
        assert!(cmd.is_finished());
        cmd.interrupt();
        assert_eq!(
            journal.entries(),
            vec!["p.initialize", "p.execute", "p.interrupt"]
        );
    }
}
