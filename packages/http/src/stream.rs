//! Byte stream over one ranged read.

use std::io::{self, Read};
use std::sync::Arc;

use url::Url;

use crate::file::FileState;
use crate::pool::{ChannelPool, PooledChannel};
use crate::transport::RangeResponse;
use crate::Error;

/// Reads the body of a ranged request, then hands its channel back.
///
/// The channel goes back to the pool only when the body has been read to
/// the end, which is as soon as the advertised length has arrived. A read
/// error, a short or overlong body, [`abandon`](Self::abandon), or dropping
/// the reader early all discard it instead, since the connection may still
/// have unread response bytes in flight.
pub struct RangeReader {
    pool: Arc<ChannelPool>,
    channel: Option<PooledChannel>,
    body: Option<Box<dyn Read + Send>>,
    url: Url,
    offset: u64,
    content_length: Option<u64>,
    bytes_read: u64,
    state: FileState,
}

impl RangeReader {
    /// Wrap a successful range response.
    ///
    /// If the server ignored the requested range and sent the resource from
    /// the start, the first `offset` bytes are skipped here.
    pub(crate) fn start(
        pool: Arc<ChannelPool>,
        channel: PooledChannel,
        url: Url,
        offset: u64,
        response: RangeResponse,
    ) -> Result<Self, Error> {
        let skip = if response.range_honored { 0 } else { offset };
        let content_length = response
            .content_length
            .map(|len| len.saturating_sub(skip));

        let mut reader = Self {
            pool,
            channel: Some(channel),
            body: Some(response.body),
            url,
            offset,
            content_length,
            bytes_read: 0,
            state: FileState::Reading,
        };

        if skip > 0 {
            log::debug!("Server ignored range for {}, skipping {} bytes", reader.url, skip);
            let body = reader.body.as_mut().map(|b| b.as_mut());
            let skipped = match body {
                Some(body) => io::copy(&mut body.take(skip), &mut io::sink()),
                None => Ok(0),
            };
            match skipped {
                Ok(n) if n == skip => {}
                Ok(n) => {
                    reader.fail();
                    return Err(Error::Io(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("{} ended after {} bytes, before offset {}", reader.url, n, skip),
                    )));
                }
                Err(e) => {
                    reader.fail();
                    return Err(Error::Io(e));
                }
            }
        }

        Ok(reader)
    }

    pub fn state(&self) -> FileState {
        self.state
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Offset within the resource at which this stream began.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of bytes the stream is expected to yield, if the server said.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Stop reading and drop the connection.
    ///
    /// Has no effect once the stream has finished.
    pub fn abandon(&mut self) {
        if self.state == FileState::Reading {
            log::debug!(
                "Abandoning {} after {} bytes",
                self.url,
                self.bytes_read
            );
            self.fail();
        }
    }

    /// All advertised bytes are in; check the body really ended so the
    /// channel can go back without waiting for a trailing zero-length read.
    fn settle(&mut self) {
        let Some(body) = self.body.as_mut() else {
            return;
        };
        let mut extra = [0u8; 1];
        loop {
            match body.read(&mut extra) {
                Ok(0) => return self.finish(),
                Ok(_) => {
                    log::warn!(
                        "{} sent more than its {} advertised bytes",
                        self.url,
                        self.bytes_read
                    );
                    return self.fail();
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::warn!("Read of {} failed at end of body: {}", self.url, e);
                    return self.fail();
                }
            }
        }
    }

    fn finish(&mut self) {
        self.body = None;
        if let Some(channel) = self.channel.take() {
            self.pool.release(channel);
        }
        self.state = FileState::Closed;
    }

    fn fail(&mut self) {
        self.body = None;
        if let Some(channel) = self.channel.take() {
            self.pool.discard(channel);
        }
        self.state = FileState::Discarded;
    }
}

impl Read for RangeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.state {
            FileState::Reading => {}
            FileState::Closed => return Ok(0),
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::Other,
                    format!("read of {} was abandoned", self.url),
                ))
            }
        }
        if buf.is_empty() {
            return Ok(0);
        }

        let Some(body) = self.body.as_mut() else {
            return Ok(0);
        };

        match body.read(buf) {
            Ok(0) => {
                if let Some(expected) = self.content_length {
                    if self.bytes_read < expected {
                        log::warn!(
                            "{} ended after {} of {} bytes",
                            self.url,
                            self.bytes_read,
                            expected
                        );
                        self.fail();
                        return Err(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            format!(
                                "{} ended after {} of {} bytes",
                                self.url, self.bytes_read, expected
                            ),
                        ));
                    }
                }
                self.finish();
                Ok(0)
            }
            Ok(n) => {
                self.bytes_read += n as u64;
                if self.content_length == Some(self.bytes_read) {
                    self.settle();
                }
                Ok(n)
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Err(e),
            Err(e) => {
                log::warn!("Read of {} failed: {}", self.url, e);
                self.fail();
                Err(e)
            }
        }
    }
}

impl Drop for RangeReader {
    fn drop(&mut self) {
        if self.state == FileState::Reading {
            log::debug!("{} dropped mid-stream", self.url);
            self.fail();
        }
    }
}

impl std::fmt::Debug for RangeReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RangeReader")
            .field("url", &self.url.as_str())
            .field("offset", &self.offset)
            .field("bytes_read", &self.bytes_read)
            .field("state", &self.state)
            .finish()
    }
}
