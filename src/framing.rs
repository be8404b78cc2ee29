//! Bolt chunked message framing
//!
//! ```text
//! [len u16 BE] [len bytes] [len u16 BE] [len bytes] ... [0x00 0x00]
//! ```
//!
//! A message is the concatenation of its chunks; a zero-length chunk ends it.

use std::io::{self, Read, Write};

/// Largest payload a single chunk can carry.
pub const MAX_CHUNK_SIZE: usize = u16::MAX as usize;

/// Largest reassembled message accepted by [`read_message`].
pub const MAX_MESSAGE_SIZE: usize = 100 * 1024 * 1024;

/// Read one chunked message.
///
/// Returns `Ok(None)` on end of input before the first chunk. End of input
/// anywhere inside a message is `UnexpectedEof`.
pub fn read_message<R: Read + ?Sized>(input: &mut R) -> io::Result<Option<Vec<u8>>> {
    let mut message = Vec::new();
    let mut first = true;

    loop {
        let mut len_buf = [0u8; 2];
        match input.read_exact(&mut len_buf[..1]) {
            Ok(()) => {}
            Err(e) if first && e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e),
        }
        input.read_exact(&mut len_buf[1..])?;
        first = false;

        let len = u16::from_be_bytes(len_buf) as usize;
        if len == 0 {
            return Ok(Some(message));
        }

        if message.len() + len > MAX_MESSAGE_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Message too large: more than {} bytes", MAX_MESSAGE_SIZE),
            ));
        }

        let start = message.len();
        message.resize(start + len, 0);
        input.read_exact(&mut message[start..])?;
    }
}

/// Write `data` as one chunked message, including the end marker.
pub fn write_message<W: Write + ?Sized>(output: &mut W, data: &[u8]) -> io::Result<()> {
    for chunk in data.chunks(MAX_CHUNK_SIZE) {
        output.write_all(&(chunk.len() as u16).to_be_bytes())?;
        output.write_all(chunk)?;
    }
    output.write_all(&[0, 0])?;
    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_chunk() {
        let mut buf: Vec<u8> = Vec::new();
        write_message(&mut buf, &[0xB0, 0x0F]).unwrap();
        assert_eq!(buf, vec![0x00, 0x02, 0xB0, 0x0F, 0x00, 0x00]);

        let mut input = &buf[..];
        assert_eq!(read_message(&mut input).unwrap(), Some(vec![0xB0, 0x0F]));
        assert_eq!(read_message(&mut input).unwrap(), None);
    }

    #[test]
    fn test_split_across_chunks() {
        let data: Vec<u8> = (0..MAX_CHUNK_SIZE + 10).map(|i| i as u8).collect();
        let mut buf: Vec<u8> = Vec::new();
        write_message(&mut buf, &data).unwrap();

        // Two chunk headers plus the end marker
        assert_eq!(buf.len(), data.len() + 6);
        assert_eq!(&buf[..2], &[0xFF, 0xFF]);

        let mut input = &buf[..];
        assert_eq!(read_message(&mut input).unwrap(), Some(data));
    }

    #[test]
    fn test_reassembles_small_chunks() {
        let mut input: &[u8] = &[0x00, 0x01, 0xB0, 0x00, 0x01, 0x0F, 0x00, 0x00];
        assert_eq!(read_message(&mut input).unwrap(), Some(vec![0xB0, 0x0F]));
    }

    #[test]
    fn test_consecutive_messages() {
        let mut buf: Vec<u8> = Vec::new();
        write_message(&mut buf, &[0xB0, 0x0E]).unwrap();
        write_message(&mut buf, &[0xB0, 0x3F]).unwrap();

        let mut input = &buf[..];
        assert_eq!(read_message(&mut input).unwrap(), Some(vec![0xB0, 0x0E]));
        assert_eq!(read_message(&mut input).unwrap(), Some(vec![0xB0, 0x3F]));
        assert_eq!(read_message(&mut input).unwrap(), None);
    }

    #[test]
    fn test_eof_inside_message() {
        // Chunk declares 4 bytes, only 2 present
        let buf: &[u8] = &[0x00, 0x04, 0xB0, 0x0F];
        let err = read_message(&mut &*buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

        // Missing end marker
        let buf: &[u8] = &[0x00, 0x02, 0xB0, 0x0F];
        let err = read_message(&mut &*buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

        // Half a chunk header
        let buf: &[u8] = &[0x00];
        let err = read_message(&mut &*buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_empty_message() {
        let buf: &[u8] = &[0x00, 0x00];
        assert_eq!(read_message(&mut &*buf).unwrap(), Some(Vec::new()));
    }
}
