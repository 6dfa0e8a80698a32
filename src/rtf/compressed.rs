//! Compressed RTF support.
//!
//! This module implements the RTF compression algorithm as specified in:
//! https://learn.microsoft.com/en-us/openspecs/exchange_server_protocols/ms-oxrtfcp
//!
//! Outlook stores message bodies as "compressed RTF": a 16-byte header followed
//! by either an LZFu stream (an LZ77 variant over a 4096-byte ring dictionary
//! that starts pre-seeded with common RTF text) or, for `MELA` streams, the RTF
//! bytes as-is.

use super::error::{RtfError, RtfResult};
use super::validate::{ValidationReport, validate_size};
use super::config::DecompressOptions;
use crate::common::encoding::decode_cp1252;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use zerocopy::{FromBytes, IntoBytes};
use zerocopy_derive::{
    FromBytes as DeriveFromBytes, Immutable, IntoBytes as DeriveIntoBytes, KnownLayout,
};

/// Magic signature for compressed RTF
const COMPRESSED_SIGNATURE: &[u8; 4] = b"LZFu";

/// Magic signature for uncompressed RTF (stored with compression header)
const UNCOMPRESSED_SIGNATURE: &[u8; 4] = b"MELA";

/// `LZFu` read as a little-endian `u32`.
pub const LZFU_MAGIC: u32 = 0x7546_5A4C;

/// `MELA` read as a little-endian `u32`.
pub const MELA_MAGIC: u32 = 0x414C_454D;

/// Size of the stream header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Header bytes counted by the `compressed_size` field (everything after it).
const COUNTED_HEADER_SIZE: usize = 12;

/// Initial dictionary for compression/decompression
const INIT_DICT: &[u8; INIT_DICT_SIZE] = b"{\\rtf1\\ansi\\mac\\deff0\\deftab720{\\fonttbl;}\
{\\f0\\fnil \\froman \\fswiss \\fmodern \\fscript \\fdecor MS Sans SerifSymbolArial\
Times New RomanCourier{\\colortbl\\red0\\green0\\blue0\r\n\\par \\pard\\plain\\f0\\fs20\
\\b\\i\\u\\tab\\tx";

/// Size of initial dictionary
const INIT_DICT_SIZE: usize = 207;

/// Maximum dictionary size
const MAX_DICT_SIZE: usize = 4096;

/// Shortest back-reference worth encoding.
const MIN_MATCH: usize = 2;

/// Longest back-reference a 4-bit length field can express.
const MAX_MATCH: usize = MIN_MATCH + 0x0F;

/// How many candidate offsets the compressor inspects per position.
const MAX_CHAIN: usize = 256;

const NIL: u16 = u16::MAX;

/// Compressed RTF header (16 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, DeriveIntoBytes, DeriveFromBytes, Immutable, KnownLayout)]
struct RawHeader {
    /// Total size of compressed data including header (little-endian)
    compressed_size: [u8; 4],
    /// Size of uncompressed data (little-endian)
    raw_size: [u8; 4],
    /// Compression type signature
    compression_type: [u8; 4],
    /// CRC32 checksum (little-endian)
    crc32: [u8; 4],
}

impl RawHeader {
    fn new(compressed_size: u32, raw_size: u32, compression_type: [u8; 4], crc32: u32) -> Self {
        Self {
            compressed_size: compressed_size.to_le_bytes(),
            raw_size: raw_size.to_le_bytes(),
            compression_type,
            crc32: crc32.to_le_bytes(),
        }
    }
}

/// Payload encoding announced by the header magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionType {
    /// `LZFu`: LZ77-compressed payload.
    Compressed,
    /// `MELA`: payload is stored uncompressed.
    Uncompressed,
}

impl CompressionType {
    /// The magic value as it appears in the header (little-endian `u32`).
    #[inline]
    pub const fn magic(self) -> u32 {
        match self {
            CompressionType::Compressed => LZFU_MAGIC,
            CompressionType::Uncompressed => MELA_MAGIC,
        }
    }
}

/// Decoded compressed RTF header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressedRtfHeader {
    /// Payload size plus the 12 header bytes following this field.
    pub compressed_size: u32,
    /// Exact size of the decompressed RTF.
    pub raw_size: u32,
    /// Payload encoding.
    pub compression_type: CompressionType,
    /// CRC32 of the payload (zero for uncompressed streams).
    pub crc32: u32,
}

impl CompressedRtfHeader {
    /// Number of payload bytes the header declares.
    #[inline]
    pub fn declared_payload_len(&self) -> usize {
        (self.compressed_size as usize).saturating_sub(COUNTED_HEADER_SIZE)
    }
}

/// Read and validate the 16-byte header at the start of `data`.
///
/// # Errors
///
/// Returns [`RtfError::MalformedHeader`] if fewer than 16 bytes are available or
/// the magic is neither `LZFu` nor `MELA`.
pub fn read_header(data: &[u8]) -> RtfResult<CompressedRtfHeader> {
    let Some(head) = data.get(..HEADER_SIZE) else {
        return Err(RtfError::MalformedHeader(format!(
            "header must be {} bytes, got {}",
            HEADER_SIZE,
            data.len()
        )));
    };

    let raw = <RawHeader as FromBytes>::ref_from_bytes(head)
        .map_err(|_| RtfError::MalformedHeader("failed to parse header".to_string()))?;

    let compression_type = match &raw.compression_type {
        sig if sig == COMPRESSED_SIGNATURE => CompressionType::Compressed,
        sig if sig == UNCOMPRESSED_SIGNATURE => CompressionType::Uncompressed,
        other => {
            return Err(RtfError::MalformedHeader(format!(
                "unknown compression type {:#010x}",
                u32::from_le_bytes(*other)
            )));
        },
    };

    Ok(CompressedRtfHeader {
        compressed_size: u32::from_le_bytes(raw.compressed_size),
        raw_size: u32::from_le_bytes(raw.raw_size),
        compression_type,
        crc32: u32::from_le_bytes(raw.crc32),
    })
}

/// Detect if data is compressed RTF
pub fn is_compressed_rtf(data: &[u8]) -> bool {
    if data.len() < HEADER_SIZE {
        return false;
    }

    // Check for LZFu or MELA signature
    let signature = &data[8..12];
    signature == COMPRESSED_SIGNATURE || signature == UNCOMPRESSED_SIGNATURE
}

/// Result of a decompression call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecompressedRtf {
    header: CompressedRtfHeader,
    bytes: Vec<u8>,
}

impl DecompressedRtf {
    /// The header the stream was decoded with.
    #[inline]
    pub fn header(&self) -> &CompressedRtfHeader {
        &self.header
    }

    /// Decompressed RTF bytes. Possibly shorter than `raw_size`, see [`Self::truncated`].
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the result and return the RTF bytes.
    #[inline]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Decompressed RTF decoded as Windows-1252, one `char` per byte.
    #[inline]
    pub fn text(&self) -> Cow<'_, str> {
        decode_cp1252(&self.bytes)
    }

    /// Size the header promised.
    #[inline]
    pub fn expected_size(&self) -> u32 {
        self.header.raw_size
    }

    /// True if fewer bytes were produced than the header promised.
    ///
    /// The partial output is still usable; most RTF readers cope with a missing
    /// tail.
    #[inline]
    pub fn truncated(&self) -> bool {
        self.bytes.len() < self.header.raw_size as usize
    }

    /// Run the structural checks over the decompressed RTF, including the size check.
    pub fn validate(&self) -> ValidationReport {
        validate_size(&self.text(), self.bytes.len(), Some(self.header.raw_size))
    }
}

/// Compressed RTF decompressor.
///
/// The decompressor holds only its options; every call allocates its own
/// dictionary, so a single instance can be shared freely between threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decompressor {
    options: DecompressOptions,
}

impl Decompressor {
    /// Create a decompressor with the given options.
    #[inline]
    pub fn new(options: DecompressOptions) -> Self {
        Self { options }
    }

    /// The options this decompressor was built with.
    #[inline]
    pub fn options(&self) -> &DecompressOptions {
        &self.options
    }

    /// Decompress RTF data
    ///
    /// # Arguments
    ///
    /// * `data` - Compressed RTF data with header
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Data is smaller than the header
    /// - Unknown compression type
    /// - CRC check fails (only when enabled)
    ///
    /// A stream that ends early is not an error; check
    /// [`DecompressedRtf::truncated`].
    pub fn decompress(&self, data: &[u8]) -> RtfResult<DecompressedRtf> {
        let header = read_header(data)?;
        let payload = &data[HEADER_SIZE..];

        let declared = header.declared_payload_len();
        if payload.len() < declared {
            tracing::warn!(
                declared,
                available = payload.len(),
                "compressed RTF payload shorter than header declares"
            );
        }

        tracing::debug!(
            kind = ?header.compression_type,
            raw_size = header.raw_size,
            compressed_size = header.compressed_size,
            "decompressing RTF stream"
        );

        let bytes = match header.compression_type {
            CompressionType::Compressed => {
                if self.options.verify_crc {
                    let checked = &payload[..declared.min(payload.len())];
                    let actual = payload_crc(checked);
                    if actual != header.crc32 {
                        return Err(RtfError::CrcMismatch {
                            expected: header.crc32,
                            actual,
                        });
                    }
                }
                decompress_lzfu(payload, header.raw_size as usize)
            },
            CompressionType::Uncompressed => {
                let size = (header.raw_size as usize).min(payload.len());
                payload[..size].to_vec()
            },
        };

        let result = DecompressedRtf { header, bytes };
        if result.truncated() {
            tracing::warn!(
                expected = header.raw_size,
                produced = result.bytes.len(),
                "compressed RTF stream is truncated"
            );
        }
        Ok(result)
    }
}

/// Decompress RTF data with default options.
///
/// See [`Decompressor::decompress`].
pub fn decompress(data: &[u8]) -> RtfResult<DecompressedRtf> {
    Decompressor::default().decompress(data)
}

/// The LZFu sliding dictionary.
struct Dictionary {
    buf: [u8; MAX_DICT_SIZE],
    cursor: usize,
}

impl Dictionary {
    fn new() -> Self {
        let mut buf = [0u8; MAX_DICT_SIZE];
        buf[..INIT_DICT_SIZE].copy_from_slice(INIT_DICT);
        Self {
            buf,
            cursor: INIT_DICT_SIZE,
        }
    }

    #[inline]
    fn get(&self, offset: usize) -> u8 {
        self.buf[offset % MAX_DICT_SIZE]
    }

    #[inline]
    fn push(&mut self, byte: u8) {
        self.buf[self.cursor] = byte;
        self.cursor = (self.cursor + 1) % MAX_DICT_SIZE;
    }
}

/// Decompress LZFu compressed data
fn decompress_lzfu(data: &[u8], raw_size: usize) -> Vec<u8> {
    let mut dict = Dictionary::new();
    // A hostile header can claim up to 4 GiB; each payload byte yields at most
    // 17 output bytes.
    let mut output = Vec::with_capacity(raw_size.min(data.len().saturating_mul(MAX_MATCH)));
    let mut input = data.iter().copied();

    'stream: while output.len() < raw_size {
        // Read control byte
        let Some(control) = input.next() else {
            break;
        };

        // Process each bit in control byte (LSB to MSB)
        for bit in 0..8 {
            if output.len() >= raw_size {
                break 'stream;
            }

            if control & (1 << bit) == 0 {
                // Bit is 0: token is a literal (8-bit)
                let Some(literal) = input.next() else {
                    break 'stream;
                };
                output.push(literal);
                dict.push(literal);
                continue;
            }

            // Bit is 1: token is a reference (16-bit, big-endian)
            let (Some(high), Some(low)) = (input.next(), input.next()) else {
                break 'stream;
            };
            let token = u16::from_be_bytes([high, low]);

            // Extract offset (12 bits) and length (4 bits)
            let offset = usize::from(token >> 4);
            let length = usize::from(token & 0x0F) + MIN_MATCH;

            // Check for end indicator
            if offset == dict.cursor {
                if output.len() < raw_size {
                    tracing::warn!(
                        produced = output.len(),
                        raw_size,
                        "end marker reached before declared size"
                    );
                }
                break 'stream;
            }

            // Copy from dictionary one byte at a time; the source range may
            // overlap the bytes being written.
            for step in 0..length {
                if output.len() >= raw_size {
                    break 'stream;
                }
                let byte = dict.get(offset + step);
                output.push(byte);
                dict.push(byte);
            }
        }
    }

    output
}

/// CRC32 as used by compressed RTF: the standard reflected CRC-32 table with a
/// zero initial value and no final xor.
///
/// By linearity this equals the ISO-HDLC CRC of the data xor the ISO-HDLC CRC of
/// an equally long run of zero bytes.
pub fn payload_crc(data: &[u8]) -> u32 {
    static ZEROS: [u8; MAX_DICT_SIZE] = [0; MAX_DICT_SIZE];

    let mut zero_digest = crc_fast::Digest::new(crc_fast::CrcAlgorithm::Crc32IsoHdlc);
    let mut remaining = data.len();
    while remaining > 0 {
        let chunk = remaining.min(ZEROS.len());
        zero_digest.update(&ZEROS[..chunk]);
        remaining -= chunk;
    }

    let data_crc = crc_fast::checksum(crc_fast::CrcAlgorithm::Crc32IsoHdlc, data) as u32;
    data_crc ^ zero_digest.finalize() as u32
}

/// Compress RTF data
///
/// # Arguments
///
/// * `data` - Uncompressed RTF data
/// * `compress` - If true, use LZFu compression; if false, store uncompressed
///
/// # Returns
///
/// Compressed RTF data with header
///
/// # Errors
///
/// Returns [`RtfError::TooLarge`] if the sizes do not fit the 32-bit header.
pub fn compress(data: &[u8], compress: bool) -> RtfResult<Vec<u8>> {
    if compress {
        compress_lzfu(data)
    } else {
        compress_uncompressed(data)
    }
}

/// Hash chains over the dictionary, keyed by byte value.
///
/// Entries go stale when the ring wraps; candidates are always re-verified
/// against the live dictionary, so stale links only cost time.
struct MatchFinder {
    head: [u16; 256],
    prev: [u16; MAX_DICT_SIZE],
}

impl MatchFinder {
    fn new() -> Self {
        Self {
            head: [NIL; 256],
            prev: [NIL; MAX_DICT_SIZE],
        }
    }

    #[inline]
    fn insert(&mut self, position: usize, byte: u8) {
        self.prev[position] = self.head[usize::from(byte)];
        self.head[usize::from(byte)] = position as u16;
    }

    /// Longest `(offset, length)` reproducing a prefix of `lookahead`.
    fn find(&self, dict: &Dictionary, lookahead: &[u8]) -> (usize, usize) {
        let max_len = lookahead.len().min(MAX_MATCH);
        let mut best = (0, 0);
        let mut candidate = self.head[usize::from(lookahead[0])];

        for _ in 0..MAX_CHAIN {
            if candidate == NIL {
                break;
            }
            let offset = usize::from(candidate);
            candidate = self.prev[offset];

            // An offset equal to the write cursor is the end marker.
            if offset == dict.cursor {
                continue;
            }

            let length = match_length(dict, offset, lookahead, max_len);
            if length > best.1 {
                best = (offset, length);
                if length == max_len {
                    break;
                }
            }
        }

        best
    }
}

/// Count how many bytes a reference at `offset` would reproduce.
///
/// The decoder writes each copied byte before reading the next, so a source
/// position that falls inside the region being written yields an earlier byte
/// of `lookahead` rather than the current dictionary contents.
fn match_length(dict: &Dictionary, offset: usize, lookahead: &[u8], max_len: usize) -> usize {
    let mut length = 0;
    while length < max_len {
        let distance = (offset + length + MAX_DICT_SIZE - dict.cursor) % MAX_DICT_SIZE;
        let byte = if distance < length {
            lookahead[distance]
        } else {
            dict.get(offset + length)
        };
        if byte != lookahead[length] {
            break;
        }
        length += 1;
    }
    length
}

/// Compress data using LZFu algorithm
fn compress_lzfu(data: &[u8]) -> RtfResult<Vec<u8>> {
    let raw_size = u32::try_from(data.len()).map_err(|_| RtfError::TooLarge(data.len()))?;

    let mut dict = Dictionary::new();
    let mut finder = MatchFinder::new();
    for (position, &byte) in INIT_DICT.iter().enumerate() {
        finder.insert(position, byte);
    }

    let mut output = Vec::with_capacity(data.len() / 2 + 3);
    let mut control_byte: u8 = 0;
    let mut control_bit = 0;
    let mut token_buffer: Vec<u8> = Vec::with_capacity(16);
    let mut pos = 0;

    while pos < data.len() {
        let lookahead = &data[pos..(pos + MAX_MATCH).min(data.len())];
        let (offset, length) = finder.find(&dict, lookahead);

        let consumed = if length >= MIN_MATCH {
            // Dictionary reference
            control_byte |= 1 << control_bit;
            let dict_ref = ((offset << 4) | (length - MIN_MATCH)) as u16;
            token_buffer.extend_from_slice(&dict_ref.to_be_bytes());
            length
        } else {
            // Literal
            token_buffer.push(lookahead[0]);
            1
        };

        for &byte in &lookahead[..consumed] {
            finder.insert(dict.cursor, byte);
            dict.push(byte);
        }
        pos += consumed;
        control_bit += 1;

        // Flush when control byte is full
        if control_bit == 8 {
            output.push(control_byte);
            output.append(&mut token_buffer);
            control_byte = 0;
            control_bit = 0;
        }
    }

    // End marker: a reference pointing at the write cursor
    control_byte |= 1 << control_bit;
    let end_ref = (dict.cursor << 4) as u16;
    token_buffer.extend_from_slice(&end_ref.to_be_bytes());
    output.push(control_byte);
    output.append(&mut token_buffer);

    let compressed_size = u32::try_from(output.len() + COUNTED_HEADER_SIZE)
        .map_err(|_| RtfError::TooLarge(output.len()))?;
    let header = RawHeader::new(
        compressed_size,
        raw_size,
        *COMPRESSED_SIGNATURE,
        payload_crc(&output),
    );

    let mut result = Vec::with_capacity(HEADER_SIZE + output.len());
    result.extend_from_slice(IntoBytes::as_bytes(&header));
    result.extend_from_slice(&output);
    Ok(result)
}

/// Compress data without compression (just add header)
fn compress_uncompressed(data: &[u8]) -> RtfResult<Vec<u8>> {
    let raw_size = u32::try_from(data.len()).map_err(|_| RtfError::TooLarge(data.len()))?;
    let compressed_size = raw_size
        .checked_add(COUNTED_HEADER_SIZE as u32)
        .ok_or(RtfError::TooLarge(data.len()))?;
    let header = RawHeader::new(compressed_size, raw_size, *UNCOMPRESSED_SIGNATURE, 0);

    let mut result = Vec::with_capacity(HEADER_SIZE + data.len());
    result.extend_from_slice(IntoBytes::as_bytes(&header));
    result.extend_from_slice(data);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Example stream from MS-OXRTFCP section 4.1.
    const REFERENCE_STREAM: &[u8] = &[
        0x2d, 0x00, 0x00, 0x00, 0x2b, 0x00, 0x00, 0x00, 0x4c, 0x5a, 0x46, 0x75, 0xf1, 0xc5, 0xc7,
        0xa7, 0x03, 0x00, 0x0a, 0x00, 0x72, 0x63, 0x70, 0x67, 0x31, 0x32, 0x35, 0x42, 0x32, 0x0a,
        0xf3, 0x20, 0x68, 0x65, 0x6c, 0x09, 0x00, 0x20, 0x62, 0x77, 0x05, 0xb0, 0x6c, 0x64, 0x7d,
        0x0a, 0x80, 0x0f, 0xa0,
    ];
    const REFERENCE_TEXT: &[u8] = b"{\\rtf1\\ansi\\ansicpg1252\\pard hello world}\r\n";

    fn header_bytes(compressed_size: u32, raw_size: u32, magic: &[u8; 4], crc: u32) -> Vec<u8> {
        IntoBytes::as_bytes(&RawHeader::new(compressed_size, raw_size, *magic, crc)).to_vec()
    }

    #[test]
    fn test_init_dict_layout() {
        assert_eq!(INIT_DICT.len(), INIT_DICT_SIZE);
        assert!(INIT_DICT.starts_with(b"{\\rtf1\\ansi\\mac"));
        assert!(INIT_DICT.ends_with(b"\\tab\\tx"));
        assert_eq!(LZFU_MAGIC.to_le_bytes(), *COMPRESSED_SIGNATURE);
        assert_eq!(MELA_MAGIC.to_le_bytes(), *UNCOMPRESSED_SIGNATURE);
    }

    #[test]
    fn test_is_compressed_rtf() {
        // Compressed signature
        let mut data = vec![0u8; 16];
        data[8..12].copy_from_slice(b"LZFu");
        assert!(is_compressed_rtf(&data));

        // Uncompressed signature
        let mut data = vec![0u8; 16];
        data[8..12].copy_from_slice(b"MELA");
        assert!(is_compressed_rtf(&data));

        // Not compressed RTF
        let data = vec![0u8; 16];
        assert!(!is_compressed_rtf(&data));

        // Too small
        let data = vec![0u8; 8];
        assert!(!is_compressed_rtf(&data));
    }

    #[test]
    fn test_read_header() {
        let header = read_header(REFERENCE_STREAM).unwrap();
        assert_eq!(header.compressed_size, 0x2d);
        assert_eq!(header.raw_size, 0x2b);
        assert_eq!(header.compression_type, CompressionType::Compressed);
        assert_eq!(header.compression_type.magic(), LZFU_MAGIC);
        assert_eq!(header.crc32, 0xa7c7_c5f1);
        assert_eq!(header.declared_payload_len(), REFERENCE_STREAM.len() - HEADER_SIZE);
    }

    #[test]
    fn test_decompress_reference_stream() {
        let result = decompress(REFERENCE_STREAM).unwrap();
        assert_eq!(result.bytes(), REFERENCE_TEXT);
        assert_eq!(result.bytes().len(), result.expected_size() as usize);
        assert!(!result.truncated());
        assert_eq!(result.text(), "{\\rtf1\\ansi\\ansicpg1252\\pard hello world}\r\n");
    }

    #[test]
    fn test_crc_verification() {
        assert_eq!(payload_crc(&REFERENCE_STREAM[HEADER_SIZE..]), 0xa7c7_c5f1);
        assert_eq!(payload_crc(&[]), 0);

        let strict = Decompressor::new(DecompressOptions::new().with_crc_check(true));
        assert!(strict.decompress(REFERENCE_STREAM).is_ok());

        let mut corrupted = REFERENCE_STREAM.to_vec();
        corrupted[12] ^= 0xFF;
        assert!(matches!(
            strict.decompress(&corrupted),
            Err(RtfError::CrcMismatch { actual: 0xa7c7_c5f1, .. })
        ));
        // Without the check the bad checksum is ignored.
        assert_eq!(decompress(&corrupted).unwrap().bytes(), REFERENCE_TEXT);
    }

    #[test]
    fn test_unknown_magic_is_malformed() {
        let mut data = header_bytes(12, 4, b"ABCD", 0);
        data.extend_from_slice(b"test");
        assert!(matches!(decompress(&data), Err(RtfError::MalformedHeader(_))));
    }

    #[test]
    fn test_short_header_is_malformed() {
        assert!(matches!(decompress(b"LZFu"), Err(RtfError::MalformedHeader(_))));
        assert!(matches!(decompress(&[]), Err(RtfError::MalformedHeader(_))));
    }

    #[test]
    fn test_mela_exact_bytes() {
        let body = b"{\\rtf1 plain}trailing";
        let mut data = header_bytes(12 + 13, 13, b"MELA", 0);
        data.extend_from_slice(body);

        let result = decompress(&data).unwrap();
        assert_eq!(result.bytes(), b"{\\rtf1 plain}");
        assert!(!result.truncated());
    }

    #[test]
    fn test_mela_empty() {
        let data = header_bytes(12, 0, b"MELA", 0);
        let result = decompress(&data).unwrap();
        assert!(result.bytes().is_empty());
        assert!(!result.truncated());
    }

    #[test]
    fn test_mela_truncated() {
        let mut data = header_bytes(12 + 100, 100, b"MELA", 0);
        data.extend_from_slice(b"{\\rtf1 only part");
        let result = decompress(&data).unwrap();
        assert!(result.truncated());
        assert_eq!(result.bytes(), b"{\\rtf1 only part");
    }

    #[test]
    fn test_lzfu_truncated_payload() {
        let cut = &REFERENCE_STREAM[..REFERENCE_STREAM.len() - 6];
        let result = decompress(cut).unwrap();
        assert!(result.truncated());
        assert!(REFERENCE_TEXT.starts_with(result.bytes()));
        assert!(!result.validate().is_valid);
    }

    #[test]
    fn test_overlapping_reference_repeats() {
        // Literal 'a', then a reference to the byte just written with length 5:
        // each copied byte feeds the next one.
        let at = INIT_DICT_SIZE as u16;
        let reference = ((at << 4) | (5 - 2)).to_be_bytes();
        let payload = [0b0000_0010, b'a', reference[0], reference[1]];
        let mut data = header_bytes(12 + 4, 6, b"LZFu", 0);
        data.extend_from_slice(&payload);

        let result = decompress(&data).unwrap();
        assert_eq!(result.bytes(), b"aaaaaa");
    }

    #[test]
    fn test_reference_into_seeded_dictionary() {
        // Offset 0, length 6 copies "{\rtf1" out of the initial dictionary.
        let reference = ((0u16 << 4) | (6 - 2)).to_be_bytes();
        let payload = [0b0000_0001, reference[0], reference[1]];
        let mut data = header_bytes(12 + 3, 6, b"LZFu", 0);
        data.extend_from_slice(&payload);

        assert_eq!(decompress(&data).unwrap().bytes(), b"{\\rtf1");
    }

    #[test]
    fn test_round_trip_uncompressed() {
        let original = b"{\\rtf1\\ansi Hello World!\\par}";
        let compressed = compress(original, false).unwrap();
        assert_eq!(read_header(&compressed).unwrap().compression_type, CompressionType::Uncompressed);
        let decompressed = decompress(&compressed).unwrap();
        assert_eq!(original, decompressed.bytes());
    }

    #[test]
    fn test_round_trip_compressed() {
        let original = REFERENCE_TEXT;
        let compressed = compress(original, true).unwrap();
        let header = read_header(&compressed).unwrap();
        assert_eq!(header.raw_size as usize, original.len());
        assert_eq!(header.declared_payload_len(), compressed.len() - HEADER_SIZE);
        assert!(compressed.len() < original.len() + HEADER_SIZE);

        let strict = Decompressor::new(DecompressOptions::new().with_crc_check(true));
        assert_eq!(strict.decompress(&compressed).unwrap().bytes(), original);
    }

    #[test]
    fn test_round_trip_runs_and_empty() {
        for original in [&b""[..], b"x", &[b'z'; 300][..]] {
            let compressed = compress(original, true).unwrap();
            let result = decompress(&compressed).unwrap();
            assert_eq!(result.bytes(), original);
            assert!(!result.truncated());
        }
    }

    #[test]
    fn test_round_trip_wraps_dictionary() {
        let original: Vec<u8> = (0..20_000u32)
            .map(|i| b"{}\\ab rtf\r\n"[(i * 7 % 11) as usize] ^ (i / 4096) as u8)
            .collect();
        let compressed = compress(&original, true).unwrap();
        assert_eq!(decompress(&compressed).unwrap().into_bytes(), original);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn prop_decompressed_length_matches_header(data in proptest::collection::vec(any::<u8>(), 0..3000)) {
                let compressed = compress(&data, true).unwrap();
                let result = decompress(&compressed).unwrap();
                prop_assert_eq!(result.bytes().len(), read_header(&compressed).unwrap().raw_size as usize);
                prop_assert_eq!(result.bytes(), &data[..]);
            }

            #[test]
            fn prop_rtf_like_round_trip(text in "[{}\\\\a-f0-9 ]{0,2000}") {
                let compressed = compress(text.as_bytes(), true).unwrap();
                let result = decompress(&compressed).unwrap();
                prop_assert_eq!(result.bytes(), text.as_bytes());
            }

            #[test]
            fn prop_truncation_never_panics(data in proptest::collection::vec(any::<u8>(), 0..512), cut in 0usize..600) {
                let compressed = compress(&data, true).unwrap();
                let cut = cut.min(compressed.len());
                match decompress(&compressed[..cut]) {
                    Ok(result) => prop_assert!(data.starts_with(result.bytes())),
                    Err(err) => prop_assert!(matches!(err, RtfError::MalformedHeader(_))),
                }
            }
        }
    }
}
