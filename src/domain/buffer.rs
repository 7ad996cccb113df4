//! Rolling sample window.

use std::collections::VecDeque;

use crate::shared::Sample;

/// Fixed-capacity, oldest-first store of accepted samples.
///
/// Appends at the back and evicts from the front once full. The buffer is
/// never reordered: callers must push non-decreasing timestamps, which the
/// upstream trade stream already guarantees.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    inner: VecDeque<Sample>,
    capacity: usize,
}

impl SampleBuffer {
    /// A zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a sample, evicting the oldest if at capacity. Returns the evicted sample.
    pub fn push(&mut self, sample: Sample) -> Option<Sample> {
        debug_assert!(
            self.inner
                .back()
                .map_or(true, |last| last.timestamp <= sample.timestamp),
            "samples must be pushed in timestamp order"
        );
        let evicted = if self.inner.len() >= self.capacity {
            self.inner.pop_front()
        } else {
            None
        };
        self.inner.push_back(sample);
        evicted
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Sample> + ExactSizeIterator {
        self.inner.iter()
    }

    /// Copy of the window, oldest-first.
    pub fn to_vec(&self) -> Vec<Sample> {
        self.inner.iter().copied().collect()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.inner.front()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.inner.back()
    }

    /// The two most recent samples as `(previous, latest)`.
    pub fn last_two(&self) -> Option<(Sample, Sample)> {
        let n = self.inner.len();
        if n < 2 {
            return None;
        }
        Some((self.inner[n - 2], self.inner[n - 1]))
    }

    /// The most recent `k` samples, oldest-first.
    pub fn tail(&self, k: usize) -> Vec<Sample> {
        let skip = self.inner.len().saturating_sub(k);
        self.inner.iter().skip(skip).copied().collect()
    }

    /// `(min, max)` over the stored prices.
    pub fn price_extent(&self) -> Option<(f64, f64)> {
        let mut iter = self.inner.iter();
        let first = iter.next()?;
        Some(iter.fold((first.price, first.price), |(lo, hi), s| {
            (lo.min(s.price), hi.max(s.price))
        }))
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.inner.len() >= self.capacity
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(t: i64, p: f64) -> Sample {
        Sample::new(t, p)
    }

    #[test]
    fn test_push_appends_in_order() {
        let mut buf = SampleBuffer::new(10);
        buf.push(s(1, 10.0));
        buf.push(s(2, 11.0));
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.first().unwrap().timestamp, 1);
        assert_eq!(buf.last().unwrap().timestamp, 2);
    }

    #[test]
    fn test_rolling_buffer_evicts_oldest() {
        let mut buf = SampleBuffer::new(3);
        assert!(buf.push(s(1, 1.0)).is_none());
        buf.push(s(2, 2.0));
        buf.push(s(3, 3.0));
        assert!(buf.is_full());
        let evicted = buf.push(s(4, 4.0));
        assert_eq!(evicted, Some(s(1, 1.0)));
        let ts: Vec<_> = buf.iter().map(|x| x.timestamp).collect();
        assert_eq!(ts, [2, 3, 4]);
    }

    #[test]
    fn test_length_never_exceeds_capacity() {
        let mut buf = SampleBuffer::new(40);
        for i in 0..500 {
            buf.push(s(i, 45000.0 + (i % 7) as f64));
            assert!(buf.len() <= buf.capacity());
            let sorted = buf
                .iter()
                .zip(buf.iter().skip(1))
                .all(|(a, b)| a.timestamp <= b.timestamp);
            assert!(sorted);
        }
        assert_eq!(buf.len(), 40);
        assert_eq!(buf.first().unwrap().timestamp, 460);
    }

    #[test]
    fn test_zero_capacity_is_one() {
        let mut buf = SampleBuffer::new(0);
        buf.push(s(1, 1.0));
        buf.push(s(2, 2.0));
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.last().unwrap().timestamp, 2);
    }

    #[test]
    fn test_last_two_and_tail() {
        let mut buf = SampleBuffer::new(5);
        assert!(buf.last_two().is_none());
        buf.push(s(1, 1.0));
        assert!(buf.last_two().is_none());
        buf.push(s(2, 2.0));
        buf.push(s(3, 3.0));
        assert_eq!(buf.last_two(), Some((s(2, 2.0), s(3, 3.0))));
        assert_eq!(buf.tail(2), vec![s(2, 2.0), s(3, 3.0)]);
        assert_eq!(buf.tail(10).len(), 3);
    }

    #[test]
    fn test_price_extent() {
        let mut buf = SampleBuffer::new(5);
        assert!(buf.price_extent().is_none());
        buf.push(s(1, 45000.0));
        buf.push(s(2, 45100.0));
        buf.push(s(3, 44950.0));
        assert_eq!(buf.price_extent(), Some((44950.0, 45100.0)));
    }

    #[test]
    fn test_clear() {
        let mut buf = SampleBuffer::new(5);
        buf.push(s(1, 1.0));
        buf.clear();
        assert!(buf.is_empty());
    }
}
