//! Text buffers.
//!
//! Buffers are named, append-only text stores owned by the host. A buffer
//! whose name starts with a space is hidden: it never shows up in
//! [`BufferStore::list_visible`]. Capture sinks are hidden buffers.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for buffer ID generation.
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a buffer.
///
/// Displayed as `buf-XXXXXXXX` where X is a hexadecimal digit. Killing a
/// buffer never frees its ID for reuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(u64);

impl BufferId {
    /// Create a new unique buffer ID.
    pub fn new() -> Self {
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for BufferId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buf-{:08x}", self.0)
    }
}

/// A live buffer.
#[derive(Debug, Clone)]
pub struct Buffer {
    /// Unique identifier.
    pub id: BufferId,
    /// Unique name among live buffers.
    pub name: String,
    /// Accumulated text.
    pub text: String,
}

impl Buffer {
    /// Hidden buffers have names starting with a space.
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with(' ')
    }
}

/// Storage for the buffers of one execution context.
///
/// Killed buffers are removed outright, so every operation on a killed
/// buffer sees "not found" and degrades to a no-op.
#[derive(Debug, Default)]
pub struct BufferStore {
    buffers: RefCell<BTreeMap<BufferId, Buffer>>,
}

impl BufferStore {
    /// Create a new empty buffer store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer with a name derived from `name`.
    ///
    /// If `name` is taken, `<2>`, `<3>`, ... is appended until it is unique.
    pub fn generate_new_buffer(&self, name: &str) -> BufferId {
        let mut buffers = self.buffers.borrow_mut();
        let mut candidate = name.to_string();
        let mut n = 2;
        while buffers.values().any(|b| b.name == candidate) {
            candidate = format!("{name}<{n}>");
            n += 1;
        }

        let id = BufferId::new();
        buffers.insert(
            id,
            Buffer {
                id,
                name: candidate,
                text: String::new(),
            },
        );
        id
    }

    /// Return the buffer named `name`, creating it if necessary.
    pub fn get_buffer_create(&self, name: &str) -> BufferId {
        match self.find_by_name(name) {
            Some(id) => id,
            None => self.generate_new_buffer(name),
        }
    }

    /// Find a live buffer by exact name.
    pub fn find_by_name(&self, name: &str) -> Option<BufferId> {
        self.buffers
            .borrow()
            .values()
            .find(|b| b.name == name)
            .map(|b| b.id)
    }

    /// Append text to a buffer.
    ///
    /// Returns `false` without doing anything if the buffer is not live.
    pub fn append(&self, id: BufferId, text: &str) -> bool {
        match self.buffers.borrow_mut().get_mut(&id) {
            Some(buffer) => {
                buffer.text.push_str(text);
                true
            }
            None => false,
        }
    }

    /// Get the text of a buffer, or `None` if it is not live.
    pub fn contents(&self, id: BufferId) -> Option<String> {
        self.buffers.borrow().get(&id).map(|b| b.text.clone())
    }

    /// Get the name of a buffer, or `None` if it is not live.
    pub fn name(&self, id: BufferId) -> Option<String> {
        self.buffers.borrow().get(&id).map(|b| b.name.clone())
    }

    /// Keep only the last `max` lines of a buffer, dropping the oldest.
    ///
    /// A trailing partial line counts as a line. Returns `true` if anything
    /// was dropped.
    pub fn keep_last_lines(&self, id: BufferId, max: usize) -> bool {
        let mut buffers = self.buffers.borrow_mut();
        let Some(buffer) = buffers.get_mut(&id) else {
            return false;
        };

        let text = buffer.text.as_str();
        let body = text.strip_suffix('\n').unwrap_or(text);
        if body.is_empty() {
            return false;
        }
        let lines = body.split('\n').count();
        if lines <= max {
            return false;
        }
        if max == 0 {
            buffer.text.clear();
            return true;
        }

        // Byte offset just past the newline that ends the last dropped line.
        let cut = body
            .match_indices('\n')
            .nth(lines - max - 1)
            .map(|(i, _)| i + 1)
            .unwrap_or(0);
        buffer.text.drain(..cut);
        true
    }

    /// Kill a buffer.
    ///
    /// Returns `true` if the buffer was live.
    pub fn kill(&self, id: BufferId) -> bool {
        self.buffers.borrow_mut().remove(&id).is_some()
    }

    /// Check if a buffer is live.
    pub fn is_live(&self, id: BufferId) -> bool {
        self.buffers.borrow().contains_key(&id)
    }

    /// List the names of all live, non-hidden buffers in creation order.
    pub fn list_visible(&self) -> Vec<String> {
        self.buffers
            .borrow()
            .values()
            .filter(|b| !b.is_hidden())
            .map(|b| b.name.clone())
            .collect()
    }
}
