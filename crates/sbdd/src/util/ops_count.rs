use std::sync::atomic::{AtomicUsize, Ordering};

/// A counter of references that can be closed to new references.
///
/// The count never goes below zero. Once the counter is closed, or once the
/// count has dropped to zero, it can never be raised again. The closed flag
/// lives in the top bit of the same word as the count, so that checking it
/// and incrementing the count is one atomic step.
pub(crate) struct OpsCount {
    word: AtomicUsize,
}

const CLOSED: usize = 1 << (usize::BITS - 1);
const COUNT_MASK: usize = !CLOSED;

impl OpsCount {
    pub fn new(init: usize) -> Self {
        debug_assert!(init <= COUNT_MASK);
        Self {
            word: AtomicUsize::new(init & COUNT_MASK),
        }
    }

    /// Increment the count unless the counter is closed or the count is zero.
    ///
    /// Returns whether the count was incremented.
    pub fn inc_not_zero(&self) -> bool {
        self.word
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                let count = word & COUNT_MASK;
                if word & CLOSED != 0 || count == 0 || count == COUNT_MASK {
                    None
                } else {
                    Some(word + 1)
                }
            })
            .is_ok()
    }

    /// Decrement the count unless it is already zero.
    ///
    /// Returns true if and only if this call brought the count to zero.
    pub fn dec_and_test(&self) -> bool {
        let res = self
            .word
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                if word & COUNT_MASK == 0 {
                    None
                } else {
                    Some(word - 1)
                }
            });
        match res {
            Ok(old_word) => old_word & COUNT_MASK == 1,
            Err(_) => false,
        }
    }

    /// Refuse all increments from now on.
    pub fn close(&self) {
        self.word.fetch_or(CLOSED, Ordering::AcqRel);
    }

    pub fn is_closed(&self) -> bool {
        self.word.load(Ordering::Acquire) & CLOSED != 0
    }

    pub fn get(&self) -> usize {
        self.word.load(Ordering::Acquire) & COUNT_MASK
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn no_revival_after_zero() {
        let count = OpsCount::new(1);
        assert!(count.inc_not_zero());
        assert_eq!(count.get(), 2);
        assert!(!count.dec_and_test());
        assert!(count.dec_and_test());
        assert_eq!(count.get(), 0);

        assert!(!count.inc_not_zero());
        // Releasing a dead count is a no-op
        assert!(!count.dec_and_test());
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn closed_count_only_decreases() {
        let count = OpsCount::new(1);
        assert!(count.inc_not_zero());
        count.close();
        assert!(count.is_closed());
        assert_eq!(count.get(), 2);

        assert!(!count.inc_not_zero());
        assert_eq!(count.get(), 2);
        assert!(!count.dec_and_test());
        assert!(count.dec_and_test());
        assert_eq!(count.get(), 0);
        assert!(count.is_closed());
    }

    #[test]
    fn exactly_one_sees_zero() {
        const NTHREADS: usize = 8;
        const NREFS: usize = 1000;

        let count = Arc::new(OpsCount::new(1 + NTHREADS * NREFS));
        count.close();
        let handles: Vec<_> = (0..NTHREADS)
            .map(|_| {
                let count = count.clone();
                thread::spawn(move || (0..NREFS).filter(|_| count.dec_and_test()).count())
            })
            .collect();
        let mut zeros: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(zeros, 0);

        zeros += count.dec_and_test() as usize;
        assert_eq!(zeros, 1);
    }

    #[test]
    fn racing_close_and_inc() {
        const NTHREADS: usize = 4;

        let count = Arc::new(OpsCount::new(1));
        let handles: Vec<_> = (0..NTHREADS)
            .map(|_| {
                let count = count.clone();
                thread::spawn(move || {
                    let mut admitted = 0;
                    while count.inc_not_zero() {
                        admitted += 1;
                        assert!(!count.dec_and_test());
                    }
                    admitted
                })
            })
            .collect();

        thread::sleep(std::time::Duration::from_millis(5));
        count.close();
        let closed_at = count.get();
        for handle in handles {
            handle.join().unwrap();
        }
        // Nobody got in after the close
        assert!(count.get() <= closed_at);
        assert_eq!(count.get(), 1);
        assert!(count.dec_and_test());
    }
}
