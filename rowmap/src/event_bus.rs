use parking_lot::RwLock;
use rowmap_driver::{Command, CommandKind};
use serde::{Deserialize, Serialize};
use std::{cell::Cell, sync::Arc, time::Duration};
use tracing::trace;

use crate::error::{Error, Result};

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// What a subscriber sees of the command being run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEventArgs {
    pub kind: CommandKind,
    /// Statement as sent to the driver, after any paging rewrite.
    pub sql: String,
}

impl From<&Command> for CommandEventArgs {
    fn from(command: &Command) -> Self {
        Self {
            kind: command.kind,
            sql: command.sql.to_owned(),
        }
    }
}

/// Outcome of a completed command.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultInfo {
    /// Rows affected by a non-query, or rows read by a query.
    pub affected_rows: u64,
    pub duration: Duration,
}

pub type ExecutingHandler = Arc<dyn Fn(&CommandEventArgs) -> anyhow::Result<()> + Send + Sync>;

pub type ExecutedHandler =
    Arc<dyn Fn(&CommandEventArgs, &ResultInfo) -> anyhow::Result<()> + Send + Sync>;

struct Subscribers<H: ?Sized> {
    handlers: RwLock<Arc<Vec<Arc<H>>>>,
}

impl<H: ?Sized> Default for Subscribers<H> {
    fn default() -> Self {
        Self {
            handlers: RwLock::new(Arc::new(Vec::new())),
        }
    }
}

impl<H: ?Sized> Subscribers<H> {
    fn push(&self, handler: Arc<H>) {
        let mut handlers = self.handlers.write();
        let mut next = Vec::clone(&handlers);
        next.push(handler);
        *handlers = Arc::new(next);
    }

    /// Removes the most recent registration of `handler`.
    fn remove(&self, handler: &Arc<H>) -> bool {
        let mut handlers = self.handlers.write();
        let target = Arc::as_ptr(handler) as *const ();
        let Some(index) = handlers
            .iter()
            .rposition(|h| Arc::as_ptr(h) as *const () == target)
        else {
            return false;
        };

        let mut next = Vec::clone(&handlers);
        next.remove(index);
        *handlers = Arc::new(next);

        true
    }

    fn snapshot(&self) -> Arc<Vec<Arc<H>>> {
        self.handlers.read().clone()
    }

    fn len(&self) -> usize {
        self.handlers.read().len()
    }
}

/// Pre- and post-execution notifications.
///
/// Handlers run synchronously on the calling thread in subscription order.
/// Firing works on a snapshot of the list, so handlers may subscribe and
/// unsubscribe while an event is being delivered; the change applies to the
/// next firing. The first handler error aborts the command.
pub struct EventBus {
    executing: Subscribers<dyn Fn(&CommandEventArgs) -> anyhow::Result<()> + Send + Sync>,
    executed:
        Subscribers<dyn Fn(&CommandEventArgs, &ResultInfo) -> anyhow::Result<()> + Send + Sync>,
    max_depth: usize,
}

impl EventBus {
    pub fn new(max_depth: usize) -> Self {
        Self {
            executing: Subscribers::default(),
            executed: Subscribers::default(),
            max_depth,
        }
    }

    /// Registers `handler` and returns the reference to unsubscribe it with.
    pub fn subscribe_executing<F>(&self, handler: F) -> ExecutingHandler
    where
        F: Fn(&CommandEventArgs) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let handler: ExecutingHandler = Arc::new(handler);
        self.executing.push(handler.clone());
        handler
    }

    /// Returns `false` when `handler` was not subscribed.
    pub fn unsubscribe_executing(&self, handler: &ExecutingHandler) -> bool {
        self.executing.remove(handler)
    }

    pub fn subscribe_executed<F>(&self, handler: F) -> ExecutedHandler
    where
        F: Fn(&CommandEventArgs, &ResultInfo) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let handler: ExecutedHandler = Arc::new(handler);
        self.executed.push(handler.clone());
        handler
    }

    pub fn unsubscribe_executed(&self, handler: &ExecutedHandler) -> bool {
        self.executed.remove(handler)
    }

    pub fn executing_len(&self) -> usize {
        self.executing.len()
    }

    pub fn executed_len(&self) -> usize {
        self.executed.len()
    }

    pub fn fire_executing(&self, args: &CommandEventArgs) -> Result<()> {
        let handlers = self.executing.snapshot();
        if handlers.is_empty() {
            return Ok(());
        }

        let _depth = DepthGuard::enter(self.max_depth)?;
        trace!(handlers = handlers.len(), sql = %args.sql, "firing executing");

        for handler in handlers.iter() {
            handler(args).map_err(Error::Subscriber)?;
        }

        Ok(())
    }

    pub fn fire_executed(&self, args: &CommandEventArgs, result: &ResultInfo) -> Result<()> {
        let handlers = self.executed.snapshot();
        if handlers.is_empty() {
            return Ok(());
        }

        let _depth = DepthGuard::enter(self.max_depth)?;
        trace!(handlers = handlers.len(), sql = %args.sql, "firing executed");

        for handler in handlers.iter() {
            handler(args, result).map_err(Error::Subscriber)?;
        }

        Ok(())
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("executing", &self.executing.len())
            .field("executed", &self.executed.len())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

/// Counts nested event delivery on the current thread.
struct DepthGuard;

impl DepthGuard {
    fn enter(max_depth: usize) -> Result<Self> {
        DEPTH.with(|depth| {
            let next = depth.get() + 1;
            if next > max_depth {
                return Err(Error::EventRecursion(max_depth));
            }

            depth.set(next);

            Ok(DepthGuard)
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}
