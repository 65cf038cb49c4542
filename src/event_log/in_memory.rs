use super::*;
use anyhow::bail;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use tracing::warn;

/// How many events an [`InMemoryLog`] keeps by default
///
/// Followers read as events arrive, and a newer `BidsLoaded` supersedes
/// everything before it, so only a short tail is ever useful.
pub const DEFAULT_RETAINED_EVENTS: usize = 256;

#[derive(Default)]
struct Inner {
    /// Offset of `events[0]`
    first_offset: Offset,
    events: VecDeque<Event>,
}

impl Inner {
    fn end_offset(&self) -> Result<Offset> {
        Ok(self.first_offset + u64::try_from(self.events.len())?)
    }
}

/// Event log keeping only the most recent events
///
/// Offsets stay absolute: dropping old events moves the start offset
/// forward, it never renumbers what is left.
pub struct InMemoryLog {
    inner: Mutex<Inner>,
    condvar: Condvar,
    capacity: usize,
}

impl InMemoryLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_RETAINED_EVENTS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            condvar: Condvar::new(),
            capacity: capacity.max(1),
        }
    }

    /// Number of events currently retained
    pub fn len(&self) -> usize {
        self.inner.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryLog {
    fn default() -> Self {
        Self::new()
    }
}

impl Reader for InMemoryLog {
    fn read(
        &self,
        offset: Offset,
        limit: usize,
        timeout: Option<Duration>,
    ) -> Result<WithOffset<Vec<LogEvent>>> {
        let mut inner = self.inner.lock();

        if inner.end_offset()? == offset && limit > 0 {
            if let Some(timeout) = timeout {
                self.condvar.wait_for(&mut inner, timeout);
            } else {
                self.condvar.wait(&mut inner);
            }
        }

        if offset > inner.end_offset()? {
            bail!("offset {} out of bounds", offset);
        }

        let start = if offset < inner.first_offset {
            warn!(
                requested = offset,
                oldest = inner.first_offset,
                "reader fell behind the retained log, skipping ahead"
            );
            inner.first_offset
        } else {
            offset
        };

        let data: Vec<_> = inner
            .events
            .iter()
            .skip(usize::try_from(start - inner.first_offset)?)
            .take(limit)
            .zip(start..)
            .map(|(e, offset)| LogEvent {
                offset,
                details: e.clone(),
            })
            .collect();

        Ok(WithOffset {
            offset: start + u64::try_from(data.len())?,
            data,
        })
    }

    fn get_start_offset(&self) -> Result<Offset> {
        Ok(self.inner.lock().first_offset)
    }
}

impl Writer for InMemoryLog {
    fn write(&self, events: &[Event]) -> Result<Offset> {
        let mut inner = self.inner.lock();

        inner.events.extend(events.iter().cloned());
        let excess = inner.events.len().saturating_sub(self.capacity);
        if excess > 0 {
            inner.events.drain(..excess);
            inner.first_offset += u64::try_from(excess)?;
        }
        self.condvar.notify_all();

        inner.end_offset()
    }
}

pub fn new_in_memory_shared() -> (SharedWriter, SharedReader) {
    let log = Arc::new(InMemoryLog::new());
    (log.clone(), log)
}
