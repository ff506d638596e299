//! Stream adapters that report byte counts to a tracker

use std::io::{self, Read, Write};

use crate::tracker::RateTracker;

/// Reader that adds every successfully read chunk to a tracker
pub struct CountingReader<R: Read> {
    inner: R,
    tracker: RateTracker,
}

impl<R: Read> CountingReader<R> {
    pub fn new(inner: R, tracker: RateTracker) -> Self {
        Self { inner, tracker }
    }

    pub fn tracker(&self) -> &RateTracker {
        &self.tracker
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.tracker.add(n as i64);
        Ok(n)
    }
}

/// Writer that adds every successfully written chunk to a tracker
pub struct CountingWriter<W: Write> {
    inner: W,
    tracker: RateTracker,
}

impl<W: Write> CountingWriter<W> {
    pub fn new(inner: W, tracker: RateTracker) -> Self {
        Self { inner, tracker }
    }

    pub fn tracker(&self) -> &RateTracker {
        &self.tracker
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.tracker.add(n as i64);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
