//! [`CommandHandle`] – shared identity of a schedulable command.
//!
//! The scheduler tracks commands by handle identity, never by structure:
//! clones of a handle are the same command, two handles wrapping equal
//! commands are not.  The command itself lives behind a `RefCell`; a hook
//! that is currently running keeps it borrowed, which is how the scheduler
//! detects reentrant requests.

use std::cell::{RefCell, RefMut};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::command::Command;
use crate::proxy::Proxy;
use crate::scheduler::Scheduler;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a [`CommandHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(u64);

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Slot {
    id: CommandId,
    command: RefCell<Box<dyn Command>>,
}

/// Reference-counted handle to a command, cheap to clone.
#[derive(Clone)]
pub struct CommandHandle {
    slot: Rc<Slot>,
}

impl CommandHandle {
    pub fn new(command: impl Command + 'static) -> Self {
        Self::from_boxed(Box::new(command))
    }

    pub fn from_boxed(command: Box<dyn Command>) -> Self {
        Self {
            slot: Rc::new(Slot {
                id: CommandId(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
                command: RefCell::new(command),
            }),
        }
    }

    pub fn id(&self) -> CommandId {
        self.slot.id
    }

    /// The command's name, or its id while one of its hooks is running.
    pub fn name(&self) -> String {
        self.inspect(|c| c.name().to_string())
            .unwrap_or_else(|| format!("command{}", self.id()))
    }

    /// Read the command.  Returns `None` while one of its hooks is running.
    pub fn inspect<R>(&self, f: impl FnOnce(&dyn Command) -> R) -> Option<R> {
        self.slot
            .command
            .try_borrow()
            .ok()
            .map(|command| f(command.as_ref()))
    }

    /// Whether one of the command's hooks is on the stack right now.
    pub fn is_busy(&self) -> bool {
        self.slot.command.try_borrow_mut().is_err()
    }

    pub(crate) fn lock(&self) -> Option<RefMut<'_, Box<dyn Command>>> {
        self.slot.command.try_borrow_mut().ok()
    }

    /// A command with no requirements of its own that runs this handle
    /// through `scheduler` when it starts.  Any number of proxies may share
    /// one handle.
    pub fn proxy(&self, scheduler: &Scheduler) -> Proxy {
        Proxy::new(self.clone(), scheduler.clone())
    }
}

impl PartialEq for CommandHandle {
    fn eq(&self, other: &Self) -> bool {
        self.slot.id == other.slot.id
    }
}

impl Eq for CommandHandle {}

impl fmt::Debug for CommandHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandHandle")
            .field("id", &self.id())
            .field("name", &self.name())
            .finish()
    }
}
