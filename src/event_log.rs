//! Event log
//!
//! Services publish what happened and other services follow along from
//! their own offset. Only a bounded tail is kept in memory. This is the only channel between producers (refresh,
//! clock) and consumers (board view).
use crate::event::Event;
use anyhow::Result;
use std::{sync::Arc, time::Duration};

mod in_memory;
pub use self::in_memory::*;

pub type Offset = u64;

#[derive(Clone, Debug, PartialEq)]
pub struct LogEvent {
    pub offset: Offset,
    pub details: Event,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WithOffset<T> {
    /// Where the next read should start
    pub offset: Offset,
    pub data: T,
}

pub trait Reader {
    /// Read up to `limit` events starting at `offset`
    ///
    /// If nothing is there yet, waits up to `timeout` (forever if `None`)
    /// for a writer to append something.
    fn read(
        &self,
        offset: Offset,
        limit: usize,
        timeout: Option<Duration>,
    ) -> Result<WithOffset<Vec<LogEvent>>>;

    fn get_start_offset(&self) -> Result<Offset>;
}

pub trait Writer {
    /// Append events, returning the offset just past the last one
    fn write(&self, events: &[Event]) -> Result<Offset>;
}

pub type SharedReader = Arc<dyn Reader + Sync + Send + 'static>;
pub type SharedWriter = Arc<dyn Writer + Sync + Send + 'static>;
