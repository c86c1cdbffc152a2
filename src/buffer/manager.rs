use std::{
    sync::{Arc, Condvar, Mutex},
    time::Duration,
};

use anyhow::{Error, Ok, Result};
use option_ext::OptionExt;

use crate::{
    config::MAX_WAIT_MILLIS,
    error::DbError,
    file::{block_id::BlockId, manager::FileManager},
    log::manager::LogManager,
};

use super::buffer::Buffer;

#[derive(Debug)]
pub struct BufferPoolState {
    pub buffer_pool: Vec<Buffer>,
    num_available: usize,
    /// Frame indices ordered from least- to most-recently used. The front of
    /// the list is the next frame considered for eviction.
    lru_order: Vec<usize>,
}

#[derive(Debug)]
pub struct BufferManager {
    pub state: Arc<(Mutex<BufferPoolState>, Condvar)>,
}

/// Manages the pool of buffers. This class is considered the buffer manager.
///
/// The replacement policy is least-recently-used: every pin moves its frame
/// to the most-recently-used end of `lru_order`, every unpin moves it to the
/// least-recently-used end, and a new block is assigned to the unpinned
/// frame nearest the front of that list.
impl BufferManager {
    pub fn new(
        file_manager: Arc<Mutex<FileManager>>,
        log_manager: Arc<Mutex<LogManager>>,
        num_buffers: usize,
    ) -> Self {
        let buffers = (0..num_buffers)
            .map(|_| Buffer::new(Arc::clone(&file_manager), Arc::clone(&log_manager)))
            .collect();

        let state = BufferPoolState {
            buffer_pool: buffers,
            num_available: num_buffers,
            lru_order: (0..num_buffers).collect(),
        };

        Self {
            state: Arc::new((Mutex::new(state), Condvar::new())),
        }
    }

    pub fn available(&self) -> usize {
        let (lock, _) = &*self.state;
        let state = lock.lock().unwrap();
        state.num_available
    }

    pub fn unpin(&self, idx: usize) -> Result<()> {
        let (lock, cvar) = &*self.state;
        let mut state = lock.lock().unwrap();

        state.buffer_pool[idx].unpin();
        if !state.buffer_pool[idx].is_pinned() {
            state.num_available += 1;
            touch_lru(&mut state.lru_order, idx);
            cvar.notify_one();
        }
        Ok(())
    }

    pub fn pin(&self, block: &BlockId) -> Result<usize> {
        let (lock, cvar) = &*self.state;
        let mut state = lock.lock().unwrap();

        loop {
            if let Some(idx) = self.try_to_pin(block, &mut state)? {
                return Ok(idx);
            }

            let (new_state, timeout) = cvar
                .wait_timeout(state, Duration::from_millis(MAX_WAIT_MILLIS as u64))
                .map_err(|_| DbError::BufferAbort)?;

            state = new_state;

            if timeout.timed_out() {
                log::warn!("buffer pool exhausted waiting to pin {}", block);
                return Err(Error::new(DbError::BufferAbort));
            }
        }
    }

    pub fn flush_all(&self, txnum: i32) -> Result<()> {
        let (lock, cvar) = &*self.state;
        let mut state = lock.lock().unwrap();

        state
            .buffer_pool
            .iter_mut()
            .filter(|buf| buf.txnum == txnum as i64)
            .try_for_each(|buf| buf.flush())
            .map_or_else(
                |err| {
                    cvar.notify_all();
                    Err(err)
                },
                |ok| {
                    cvar.notify_all();
                    Ok(ok)
                },
            )
    }

    fn try_to_pin<'a>(
        &self,
        block: &'a BlockId,
        state: &'a mut BufferPoolState,
    ) -> Result<Option<usize>> {
        if let Some(idx) = self.find_existing_buffer(block, state) {
            if !state.buffer_pool[idx].is_pinned() {
                state.num_available -= 1;
            }
            state.buffer_pool[idx].pin();
            touch_lru(&mut state.lru_order, idx);
            return Ok(Some(idx));
        }

        if let Some(idx) = self.find_unpinned_buffer(state) {
            state.buffer_pool[idx].assign_to_block(block)?;
            state.num_available -= 1;
            state.buffer_pool[idx].pin();
            touch_lru(&mut state.lru_order, idx);
            return Ok(Some(idx));
        }

        Ok(None)
    }

    fn find_existing_buffer<'a>(
        &self,
        block: &'a BlockId,
        state: &'a BufferPoolState,
    ) -> Option<usize> {
        state
            .buffer_pool
            .iter()
            .enumerate()
            .find(|(_, buffer)| buffer.block().contains(block))
            .map(|(idx, _)| idx)
    }

    /// The least-recently-used unpinned frame, i.e. the first entry of
    /// `lru_order` whose frame is currently unpinned.
    fn find_unpinned_buffer(&self, state: &BufferPoolState) -> Option<usize> {
        state
            .lru_order
            .iter()
            .copied()
            .find(|&idx| !state.buffer_pool[idx].is_pinned())
    }
}

/// Marks `idx` as the most-recently-touched frame, moving it to the back of
/// the LRU list. Called on both pin and unpin: while a frame is pinned it
/// can't be evicted anyway, so the only ordering that matters is among
/// unpinned frames, and the one idle the longest (nearest the front) is
/// evicted first.
fn touch_lru(order: &mut Vec<usize>, idx: usize) {
    if let Some(pos) = order.iter().position(|&i| i == idx) {
        order.remove(pos);
    }
    order.push(idx);
}
