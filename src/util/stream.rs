/*!
 The buffered output stream shared by all three plist encoders.

 Output accumulates in a fixed chunk and drains to the sink when full. The
 first error latches: every later write becomes a no-op and the caller sees
 the original failure when the stream is finished.
*/

use std::io::Write;

use crate::error::plist::PlistError;

pub(crate) const CHUNK_SIZE: usize = 1024;

const INDENT: &[u8] = b"\t\t\t\t\t\t\t\t";

/// A chunked writer with latched first-error semantics
pub struct PlistWriteStream<W: Write> {
    sink: W,
    buffer: [u8; CHUNK_SIZE],
    length: usize,
    written: u64,
    error: Option<PlistError>,
}

impl<W: Write> PlistWriteStream<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            buffer: [0; CHUNK_SIZE],
            length: 0,
            written: 0,
            error: None,
        }
    }

    /// Append bytes, draining the chunk to the sink as it fills
    pub fn write(&mut self, mut bytes: &[u8]) {
        if self.error.is_some() {
            return;
        }
        self.written += bytes.len() as u64;
        while !bytes.is_empty() {
            if self.length == CHUNK_SIZE {
                self.flush_chunk();
                if self.error.is_some() {
                    return;
                }
            }
            let take = (CHUNK_SIZE - self.length).min(bytes.len());
            self.buffer[self.length..self.length + take].copy_from_slice(&bytes[..take]);
            self.length += take;
            bytes = &bytes[take..];
        }
    }

    pub fn write_byte(&mut self, byte: u8) {
        self.write(&[byte]);
    }

    /// Write `level` tab characters
    pub fn write_indent(&mut self, mut level: usize) {
        while level > INDENT.len() {
            self.write(INDENT);
            level -= INDENT.len();
        }
        self.write(&INDENT[..level]);
    }

    fn flush_chunk(&mut self) {
        if self.error.is_some() {
            return;
        }
        if let Err(why) = self.sink.write_all(&self.buffer[..self.length]) {
            self.error = Some(PlistError::WriteStream(why));
        }
        self.length = 0;
    }

    /// Latch an error; only the first one sticks
    pub fn set_error(&mut self, error: PlistError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Logical bytes accepted so far, buffered or not
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Drain the chunk and hand back the byte count, or the latched error
    pub fn finish(mut self) -> Result<u64, PlistError> {
        self.flush_chunk();
        if self.error.is_none() {
            if let Err(why) = self.sink.flush() {
                self.error = Some(PlistError::WriteStream(why));
            }
        }
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.written),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Error, ErrorKind, Write};

    use crate::{error::plist::PlistError, util::stream::PlistWriteStream};

    /// A sink that fails after accepting a fixed number of bytes
    struct FailingSink {
        accepted: usize,
        remaining: usize,
    }

    impl FailingSink {
        fn new(capacity: usize) -> Self {
            Self {
                accepted: 0,
                remaining: capacity,
            }
        }
    }

    impl Write for FailingSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if buf.len() > self.remaining {
                return Err(Error::new(ErrorKind::WriteZero, "sink full"));
            }
            self.remaining -= buf.len();
            self.accepted += buf.len();
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn can_buffer_small_writes() {
        let mut out = Vec::new();
        let mut stream = PlistWriteStream::new(&mut out);
        stream.write(b"hello ");
        stream.write(b"world");
        assert_eq!(stream.written(), 11);
        assert_eq!(stream.finish().unwrap(), 11);
        assert_eq!(out, b"hello world");
    }

    #[test]
    fn can_drain_across_chunk_boundaries() {
        let payload = vec![0xABu8; 5000];
        let mut out = Vec::new();
        let mut stream = PlistWriteStream::new(&mut out);
        stream.write(&payload);
        stream.write_byte(0xCD);
        assert_eq!(stream.finish().unwrap(), 5001);
        assert_eq!(out.len(), 5001);
        assert_eq!(out[4999], 0xAB);
        assert_eq!(out[5000], 0xCD);
    }

    #[test]
    fn can_latch_sink_failure() {
        let mut stream = PlistWriteStream::new(FailingSink::new(1024));
        stream.write(&vec![0u8; 2048]);
        stream.write(b"after the failure");
        assert!(stream.has_error());
        assert!(matches!(
            stream.finish(),
            Err(PlistError::WriteStream(_))
        ));
    }

    #[test]
    fn can_keep_first_error() {
        let mut out = Vec::new();
        let mut stream = PlistWriteStream::new(&mut out);
        stream.set_error(PlistError::UnknownFormat);
        stream.set_error(PlistError::NestingTooDeep(9));
        stream.write(b"ignored");
        assert!(matches!(stream.finish(), Err(PlistError::UnknownFormat)));
        assert!(out.is_empty());
    }

    #[test]
    fn can_write_indentation() {
        let mut out = Vec::new();
        let mut stream = PlistWriteStream::new(&mut out);
        stream.write_indent(10);
        stream.finish().unwrap();
        assert_eq!(out, vec![b'\t'; 10]);
    }
}
