use std::collections::VecDeque;

/// URLs requested by instances that were disposed before the browser answered.
///
/// Only used to tell a stale response apart from a response for a canvas that
/// never existed. Bounded; the oldest entries are evicted first.
#[derive(Debug)]
pub struct DisposedRequestLedger {
    urls: VecDeque<String>,
    capacity: usize,
}

impl DisposedRequestLedger {
    pub fn new(capacity: usize) -> Self {
        Self {
            urls: VecDeque::new(),
            capacity,
        }
    }

    pub fn record(&mut self, url: String) {
        if self.capacity == 0 {
            return;
        }
        while self.urls.len() >= self.capacity {
            self.urls.pop_front();
        }
        self.urls.push_back(url);
    }

    /// Remove one entry for `url`. Returns whether it was present.
    pub fn consume(&mut self, url: &str) -> bool {
        match self.urls.iter().position(|u| u == url) {
            Some(index) => {
                self.urls.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}
