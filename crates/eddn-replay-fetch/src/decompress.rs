//! Streaming bzip2 decompression for archive files.

use bzip2::read::MultiBzDecoder;
use std::io::{BufReader, Read};

use crate::lines::BoundedLines;

/// Buffer size for the decompressed side of the decoder.
const DECODE_BUFFER_BYTES: usize = 64 * 1024;

/// Wraps a compressed reader in a bzip2 decoder and splits its output
/// into lines.
///
/// Concatenated bzip2 streams are decoded back to back, as produced by
/// parallel compressors. Nothing is buffered beyond the current block and
/// the current line.
///
/// # Example
///
/// ```
/// use bzip2::{Compression, write::BzEncoder};
/// use eddn_replay_fetch::bz2_lines;
/// use std::io::Write;
///
/// let mut encoder = BzEncoder::new(Vec::new(), Compression::fast());
/// encoder.write_all(b"{\"a\":1}\n{\"a\":2}\n").unwrap();
/// let compressed = encoder.finish().unwrap();
///
/// let lines: Vec<_> = bz2_lines(compressed.as_slice(), 1024)
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(lines, vec![b"{\"a\":1}".to_vec(), b"{\"a\":2}".to_vec()]);
/// ```
pub fn bz2_lines<R: Read>(
    reader: R,
    max_line_bytes: usize,
) -> BoundedLines<BufReader<MultiBzDecoder<R>>> {
    let decoder = MultiBzDecoder::new(reader);
    BoundedLines::new(
        BufReader::with_capacity(DECODE_BUFFER_BYTES, decoder),
        max_line_bytes,
    )
}
