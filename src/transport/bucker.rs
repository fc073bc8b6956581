use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};

/// A switchable input splitter guarding the transport reader's source.
///
/// Until disabled, each raw read is split at the first `]` byte: the `]`
/// and everything after it are held back for later reads. This keeps the
/// decoder's buffered lookahead from swallowing bytes of the chunked
/// stream that follows an end-of-message token. Once the framing mode has
/// been selected the filter passes reads through untouched.
#[derive(Debug)]
pub(crate) struct Bucker<R> {
    src: R,
    held: Vec<u8>,
    passthrough: bool,
}

impl<R: AsyncRead + Unpin> Bucker<R> {
    pub(crate) fn new(src: R) -> Bucker<R> {
        Bucker {
            src,
            held: Vec::new(),
            passthrough: false,
        }
    }

    pub(crate) fn set_passthrough(&mut self) {
        self.passthrough = true;
    }

    pub(crate) fn is_passthrough(&self) -> bool {
        self.passthrough
    }

    pub(crate) async fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if !self.held.is_empty() {
            let n = out.len().min(self.held.len());
            out[..n].copy_from_slice(&self.held[..n]);
            self.held.drain(..n);
            return Ok(n);
        }
        let n = self.src.read(out).await?;
        if self.passthrough || n == 0 {
            return Ok(n);
        }
        match out[..n].iter().position(|&b| b == b']') {
            Some(idx) => {
                // never split down to an empty read; a leading `]` is
                // delivered alone instead
                let cut = idx.max(1);
                self.held.extend_from_slice(&out[cut..n]);
                Ok(cut)
            }
            None => Ok(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    async fn drain(bucker: &mut Bucker<Cursor<Vec<u8>>>) -> (Vec<usize>, Vec<u8>) {
        let mut sizes = Vec::new();
        let mut data = Vec::new();
        let mut buf = [0u8; 64];
        loop {
            let n = bucker.read(&mut buf).await.unwrap();
            if n == 0 {
                return (sizes, data);
            }
            sizes.push(n);
            data.extend_from_slice(&buf[..n]);
        }
    }

    #[tokio::test]
    async fn test_splits_at_bracket() {
        let mut bucker = Bucker::new(Cursor::new(b"foo]]>]]>rest".to_vec()));
        let (sizes, data) = drain(&mut bucker).await;
        assert_eq!(b"foo]]>]]>rest".as_slice(), &data[..]);
        assert_eq!(vec![3, 10], sizes);
    }

    #[tokio::test]
    async fn test_leading_bracket_still_progresses() {
        let mut bucker = Bucker::new(Cursor::new(b"]]>]]>x".to_vec()));
        let (sizes, data) = drain(&mut bucker).await;
        assert_eq!(b"]]>]]>x".as_slice(), &data[..]);
        assert_eq!(vec![1, 6], sizes);
    }

    #[tokio::test]
    async fn test_passthrough() {
        let mut bucker = Bucker::new(Cursor::new(b"foo]bar".to_vec()));
        bucker.set_passthrough();
        let (sizes, data) = drain(&mut bucker).await;
        assert_eq!(b"foo]bar".as_slice(), &data[..]);
        assert_eq!(vec![7], sizes);
    }
}
