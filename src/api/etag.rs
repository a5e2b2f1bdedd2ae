//! Content etags for upload deduplication
//!
//! The service identifies uploaded content by its MD5 hex digest; hashing a
//! local file before upload lets the client skip files the project already
//! holds.

use crate::Result;
use md5::{Digest, Md5};
use std::io::Read;

const BLOCK_SIZE: usize = 64 * 1024;

/// Streaming block-wise MD5 of a reader, as lowercase hex.
pub fn content_etag<R: Read>(reader: &mut R) -> Result<String> {
    let mut hasher = Md5::new();
    let mut block = vec![0u8; BLOCK_SIZE];
    loop {
        let n = reader.read(&mut block)?;
        if n == 0 {
            break;
        }
        hasher.update(&block[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Etag of an in-memory buffer.
pub fn etag_of(content: &[u8]) -> String {
    hex::encode(Md5::digest(content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_etag_of_known_content() {
        assert_eq!(etag_of(b"hello world"), "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }

    #[test]
    fn test_etag_of_empty_content() {
        assert_eq!(etag_of(b""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_streaming_etag_matches_buffer_etag() {
        let content = vec![0xABu8; 3 * BLOCK_SIZE + 17];
        let streamed = content_etag(&mut &content[..]).unwrap();
        assert_eq!(streamed, etag_of(&content));
    }
}
