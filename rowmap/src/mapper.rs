use rowmap_driver::{Command, CommandKind, Connection, Outputs, Reader};
use rowmap_query::{apply_paging, Page};
use std::{marker::PhantomData, sync::Arc, time::Instant};
use tracing::{debug, warn};

use crate::args::Args;
use crate::binder::Binder;
use crate::config::MapperConfig;
use crate::error::{Error, Result};
use crate::event_bus::{CommandEventArgs, EventBus, ExecutedHandler, ExecutingHandler, ResultInfo};
use crate::record::{materialize, Record};

/// Runs commands against a [`Connection`] and maps their results.
///
/// Cheap to clone; clones share configuration and subscribers.
///
/// ```
/// use rowmap::{params, CommandKind, Mapper, MemoryDriver, Record, ResultSet, Script, Value};
///
/// #[derive(Debug, Default, Record)]
/// #[record(rename_all = "PascalCase")]
/// struct Person {
///     name: String,
///     age: i32,
/// }
///
/// let driver = MemoryDriver::new();
/// driver.script("select Name, Age from People where Age > @Age", |_| {
///     Script::new().result_set(
///         ResultSet::new(["Name", "Age"]).row([Value::from("John"), Value::from(25)]),
///     )
/// });
///
/// let mapper = Mapper::new();
/// let people = mapper
///     .query::<Person>(CommandKind::Text, "select Name, Age from People where Age > @Age")
///     .args(&mut params! { "Age" => 18 })
///     .fetch_all(&mut driver.connection())?;
///
/// assert_eq!(people[0].name, "John");
/// # Ok::<(), rowmap::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct Mapper {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    config: MapperConfig,
    events: EventBus,
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper {
    pub fn new() -> Self {
        Self::with_config(MapperConfig::default())
    }

    pub fn with_config(config: MapperConfig) -> Self {
        let events = EventBus::new(config.max_event_depth);

        Self {
            inner: Arc::new(Inner { config, events }),
        }
    }

    pub fn config(&self) -> &MapperConfig {
        &self.inner.config
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn subscribe_executing<F>(&self, handler: F) -> ExecutingHandler
    where
        F: Fn(&CommandEventArgs) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.inner.events.subscribe_executing(handler)
    }

    pub fn unsubscribe_executing(&self, handler: &ExecutingHandler) -> bool {
        self.inner.events.unsubscribe_executing(handler)
    }

    pub fn subscribe_executed<F>(&self, handler: F) -> ExecutedHandler
    where
        F: Fn(&CommandEventArgs, &ResultInfo) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.inner.events.subscribe_executed(handler)
    }

    pub fn unsubscribe_executed(&self, handler: &ExecutedHandler) -> bool {
        self.inner.events.unsubscribe_executed(handler)
    }

    /// Starts a command whose rows are materialized into `T`.
    pub fn query<T: Record>(&self, kind: CommandKind, sql: impl Into<String>) -> Query<'_, T> {
        Query {
            mapper: self,
            kind,
            sql: sql.into(),
            args: None,
            page: Page::default(),
            result_info: None,
            no_event: false,
            record: PhantomData,
        }
    }

    /// Starts a command run for its side effects.
    pub fn non_query(&self, kind: CommandKind, sql: impl Into<String>) -> NonQuery<'_> {
        NonQuery {
            mapper: self,
            kind,
            sql: sql.into(),
            args: None,
            result_info: None,
            no_event: false,
        }
    }

    fn command(&self, kind: CommandKind, sql: String, args: Option<&dyn Args>) -> Result<Command> {
        let parameters = Binder::new(&self.inner.config).bind(args)?;

        Ok(Command {
            kind,
            sql,
            parameters,
        })
    }

    fn executing(&self, event: &CommandEventArgs, no_event: bool) -> Result<()> {
        if no_event {
            return Ok(());
        }

        self.inner.events.fire_executing(event)
    }

    fn completed(
        &self,
        event: &CommandEventArgs,
        info: ResultInfo,
        result_info: Option<&mut ResultInfo>,
        no_event: bool,
    ) -> Result<()> {
        if let Some(result_info) = result_info {
            *result_info = info;
        }

        if no_event {
            return Ok(());
        }

        self.inner.events.fire_executed(event, &info)
    }

    /// Reads every row of every result set, keeping those inside `page`.
    fn drain<T: Record>(&self, reader: &mut dyn Reader, page: &Page) -> Result<Vec<T>> {
        let mut records = Vec::new();
        let mut index: u64 = 0;

        loop {
            while let Some(row) = reader.next_row()? {
                if page.contains(index) {
                    records.push(materialize(row)?);
                }

                index += 1;
            }

            match reader.next_result() {
                Ok(true) => continue,
                Ok(false) => break,
                Err(err) if self.inner.config.tolerate_trailing_errors => {
                    warn!(error = %err, rows = index, "ignoring error raised after the last row");
                    break;
                }
                Err(err) => return Err(err.into()),
            }
        }

        Ok(records)
    }

    /// Copies driver output values onto the args fields they came from.
    fn scatter(
        &self,
        command: &Command,
        outputs: &Outputs,
        args: Option<&mut dyn Args>,
    ) -> Result<()> {
        let Some(args) = args else {
            return Ok(());
        };

        for parameter in command.outputs() {
            let Some(value) = outputs.get(&parameter.name) else {
                debug!(parameter = %parameter.name, "driver returned no output value");
                continue;
            };

            let written = args
                .set_field(&parameter.source, value.clone())
                .map_err(|source| Error::OutputParameter {
                    parameter: parameter.name.to_owned(),
                    source,
                })?;

            if !written {
                debug!(field = %parameter.source, "output has no writable field");
            }
        }

        Ok(())
    }
}

/// A pending query; see [`Mapper::query`].
#[must_use = "a query does nothing until `fetch_all` is called"]
pub struct Query<'a, T> {
    mapper: &'a Mapper,
    kind: CommandKind,
    sql: String,
    args: Option<&'a mut dyn Args>,
    page: Page,
    result_info: Option<&'a mut ResultInfo>,
    no_event: bool,
    record: PhantomData<fn() -> T>,
}

impl<'a, T: Record> Query<'a, T> {
    /// Binds `args`; output parameters are written back into it.
    pub fn args<A: Args + 'a>(mut self, args: &'a mut A) -> Self {
        self.args = Some(args);
        self
    }

    /// Skips the first `offset` rows.
    pub fn offset(mut self, offset: u64) -> Self {
        self.page.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.page.limit = Some(limit);
        self
    }

    pub fn page(mut self, page: Page) -> Self {
        self.page = page;
        self
    }

    /// Receives the row count and duration once the query completes.
    pub fn result_info(mut self, info: &'a mut ResultInfo) -> Self {
        self.result_info = Some(info);
        self
    }

    /// Runs without firing executing/executed events.
    pub fn no_event(mut self) -> Self {
        self.no_event = true;
        self
    }

    pub fn fetch_all<C: Connection + ?Sized>(self, conn: &mut C) -> Result<Vec<T>> {
        let Query {
            mapper,
            kind,
            sql,
            args,
            page,
            result_info,
            no_event,
            ..
        } = self;

        // Text commands page on the server; procedure results are skipped client side.
        let (sql, page) = match kind {
            CommandKind::Text => (
                apply_paging(&sql, conn.dialect(), page.offset, page.limit),
                Page::default(),
            ),
            CommandKind::StoredProcedure => (sql, page),
        };

        let command = mapper.command(kind, sql, args.as_deref())?;
        let event = CommandEventArgs::from(&command);

        mapper.executing(&event, no_event)?;

        debug!(
            kind = ?command.kind,
            sql = %command.sql,
            parameters = command.parameters.len(),
            "executing query"
        );

        let started = Instant::now();
        let (records, outputs) = {
            let mut reader = conn.query(&command)?;
            let records = mapper.drain::<T>(&mut *reader, &page)?;

            (records, reader.close()?)
        };

        let info = ResultInfo {
            affected_rows: records.len() as u64,
            duration: started.elapsed(),
        };

        debug!(
            rows = info.affected_rows,
            elapsed_ms = info.duration.as_millis() as u64,
            "query completed"
        );

        mapper.scatter(&command, &outputs, args)?;
        mapper.completed(&event, info, result_info, no_event)?;

        Ok(records)
    }
}

/// A pending non-query; see [`Mapper::non_query`].
#[must_use = "a command does nothing until `execute` is called"]
pub struct NonQuery<'a> {
    mapper: &'a Mapper,
    kind: CommandKind,
    sql: String,
    args: Option<&'a mut dyn Args>,
    result_info: Option<&'a mut ResultInfo>,
    no_event: bool,
}

impl<'a> NonQuery<'a> {
    pub fn args<A: Args + 'a>(mut self, args: &'a mut A) -> Self {
        self.args = Some(args);
        self
    }

    pub fn result_info(mut self, info: &'a mut ResultInfo) -> Self {
        self.result_info = Some(info);
        self
    }

    pub fn no_event(mut self) -> Self {
        self.no_event = true;
        self
    }

    /// Runs the command and returns the number of affected rows.
    pub fn execute<C: Connection + ?Sized>(self, conn: &mut C) -> Result<u64> {
        let NonQuery {
            mapper,
            kind,
            sql,
            args,
            result_info,
            no_event,
        } = self;

        let command = mapper.command(kind, sql, args.as_deref())?;
        let event = CommandEventArgs::from(&command);

        mapper.executing(&event, no_event)?;

        debug!(
            kind = ?command.kind,
            sql = %command.sql,
            parameters = command.parameters.len(),
            "executing command"
        );

        let started = Instant::now();
        let executed = conn.execute(&command)?;
        let info = ResultInfo {
            affected_rows: executed.affected_rows,
            duration: started.elapsed(),
        };

        debug!(
            affected_rows = info.affected_rows,
            elapsed_ms = info.duration.as_millis() as u64,
            "command completed"
        );

        mapper.scatter(&command, &executed.outputs, args)?;
        mapper.completed(&event, info, result_info, no_event)?;

        Ok(info.affected_rows)
    }
}
