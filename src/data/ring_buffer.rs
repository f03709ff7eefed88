//! Fixed-capacity, overwrite-oldest ring buffers for raw channel samples.
//!
//! Each analog channel owns one [`RingBuffer`]. The buffer is an index-based circular
//! array: a preallocated slot arena plus a write head and an occupied length, so a push
//! is O(1) and memory stays bounded by the capacity chosen at start-up.
//!
//! # Layout
//! ```text
//! slots:  [ s3 | s4 | s0 | s1 | s2 ]      capacity = 5, len = 5
//!                     ^ write_head (next slot to overwrite = oldest sample)
//! logical: 0 = s0 (oldest) ... 4 = s4 (newest)
//! ```
//!
//! [`ChannelBank`] groups the buffers of all channels and keeps them in lock step:
//! one [`ChannelBank::push_tick`] pushes exactly one sample into every channel.

use super::Sample;

/// Circular buffer that keeps the most recent `capacity` values.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    /// Preallocated storage, never resized after construction
    slots: Vec<T>,

    /// Slot the next push writes to
    write_head: usize,

    /// Number of valid values (saturates at capacity)
    len: usize,
}

impl<T: Copy + Default> RingBuffer<T> {
    /// Create an empty buffer holding at most `capacity` values.
    ///
    /// A zero capacity is bumped to one so the buffer can always report full.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![T::default(); capacity.max(1)],
            write_head: 0,
            len: 0,
        }
    }

    /// Append a value, evicting the oldest one when the buffer is full.
    pub fn push(&mut self, value: T) {
        self.slots[self.write_head] = value;
        self.write_head = (self.write_head + 1) % self.slots.len();
        if self.len < self.slots.len() {
            self.len += 1;
        }
    }

    /// Value at logical position `index`, where 0 is the oldest value.
    pub fn get(&self, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }
        Some(self.slots[self.physical(index)])
    }

    /// Most recently pushed value.
    pub fn newest(&self) -> Option<T> {
        self.len.checked_sub(1).and_then(|i| self.get(i))
    }

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.len).map(move |i| self.slots[self.physical(i)])
    }

    /// Copy the contents out, oldest first.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// Forget every value; capacity is retained.
    pub fn clear(&mut self) {
        self.write_head = 0;
        self.len = 0;
    }

    /// Number of valid values.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if no value has been pushed since the last clear.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum number of values retained.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// True once `capacity` values are resident.
    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    fn physical(&self, index: usize) -> usize {
        // The oldest value sits at write_head once the buffer has wrapped, at 0 before.
        let oldest = if self.is_full() { self.write_head } else { 0 };
        (oldest + index) % self.slots.len()
    }
}

/// Per-channel ring buffers advanced together, one sample per channel per tick.
#[derive(Debug, Clone)]
pub struct ChannelBank {
    buffers: Vec<RingBuffer<Sample>>,
}

impl ChannelBank {
    /// Create `channels` empty buffers of `capacity` samples each.
    pub fn new(channels: usize, capacity: usize) -> Self {
        Self {
            buffers: (0..channels)
                .map(|_| RingBuffer::with_capacity(capacity))
                .collect(),
        }
    }

    /// Push one tick worth of samples, `samples[ch]` going to channel `ch`.
    ///
    /// Extra samples are ignored and missing channels are left untouched; the
    /// acquisition loop always supplies exactly one sample per channel.
    pub fn push_tick(&mut self, samples: &[Sample]) {
        for (buffer, &sample) in self.buffers.iter_mut().zip(samples) {
            buffer.push(sample);
        }
    }

    /// True when every channel buffer is at capacity.
    pub fn all_full(&self) -> bool {
        self.buffers.iter().all(RingBuffer::is_full)
    }

    /// Samples resident per channel (the shortest channel, if they ever differ).
    pub fn depth(&self) -> usize {
        self.buffers.iter().map(RingBuffer::len).min().unwrap_or(0)
    }

    /// Window length per channel.
    pub fn capacity(&self) -> usize {
        self.buffers.first().map_or(0, RingBuffer::capacity)
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.buffers.len()
    }

    /// Buffer of one channel.
    pub fn channel(&self, channel: usize) -> Option<&RingBuffer<Sample>> {
        self.buffers.get(channel)
    }

    /// The time-aligned row at logical `index`: one value per channel.
    pub fn row(&self, index: usize) -> Option<Vec<Sample>> {
        self.buffers.iter().map(|b| b.get(index)).collect()
    }

    /// Rows from oldest to newest.
    pub fn rows(&self) -> impl Iterator<Item = Vec<Sample>> + '_ {
        (0..self.depth()).filter_map(move |i| self.row(i))
    }

    /// Clear every channel at the start of a cycle.
    pub fn clear(&mut self) {
        self.buffers.iter_mut().for_each(RingBuffer::clear);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_last_n_values_in_push_order() {
        let mut rb = RingBuffer::<u16>::with_capacity(4);
        for v in 1..=10 {
            rb.push(v);
        }
        assert!(rb.is_full());
        assert_eq!(rb.to_vec(), vec![7, 8, 9, 10]);
        assert_eq!(rb.get(0), Some(7));
        assert_eq!(rb.newest(), Some(10));
        assert_eq!(rb.get(4), None);
    }

    #[test]
    fn every_push_count_matches_tail_of_input() {
        for capacity in 1..6 {
            for pushes in 0..15u16 {
                let mut rb = RingBuffer::with_capacity(capacity);
                let input: Vec<u16> = (0..pushes).collect();
                input.iter().for_each(|&v| rb.push(v));
                let start = input.len().saturating_sub(capacity);
                assert_eq!(rb.to_vec(), input[start..].to_vec());
                assert!(rb.len() <= capacity);
            }
        }
    }

    #[test]
    fn partial_fill_indexes_from_zero() {
        let mut rb = RingBuffer::<u16>::with_capacity(5);
        rb.push(42);
        rb.push(43);
        assert!(!rb.is_full());
        assert_eq!(rb.get(0), Some(42));
        assert_eq!(rb.get(1), Some(43));
        assert_eq!(rb.len(), 2);
    }

    #[test]
    fn clear_resets_but_keeps_capacity() {
        let mut rb = RingBuffer::<u16>::with_capacity(3);
        (0..7).for_each(|v| rb.push(v));
        rb.clear();
        assert!(rb.is_empty());
        assert_eq!(rb.capacity(), 3);
        rb.push(9);
        assert_eq!(rb.to_vec(), vec![9]);
    }

    #[test]
    fn bank_rows_are_time_aligned() {
        let mut bank = ChannelBank::new(2, 3);
        for t in 0..5u16 {
            bank.push_tick(&[t, 100 + t]);
        }
        assert!(bank.all_full());
        let rows: Vec<_> = bank.rows().collect();
        assert_eq!(rows, vec![vec![2, 102], vec![3, 103], vec![4, 104]]);
        assert_eq!(bank.row(3), None);
    }

    #[test]
    fn bank_not_full_until_every_channel_full() {
        let mut bank = ChannelBank::new(3, 2);
        bank.push_tick(&[1, 2, 3]);
        assert!(!bank.all_full());
        bank.push_tick(&[1, 2, 3]);
        assert!(bank.all_full());
        bank.clear();
        assert_eq!(bank.depth(), 0);
    }
}
