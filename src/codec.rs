//! Mnemonic encoding of custodian shares for offline backup
//!
//! An operator exporting shares for cold storage gets one line of BIP39
//! words per share. The layout follows the shamir39 scheme:
//! - a version word (`"shardkeep"`) identifying the format
//! - parameter words carrying the threshold and the share identifier
//! - data words carrying `length (2 bytes) || share value || CRC-32 (4 bytes)`
//!
//! # Examples
//!
//! ```rust
//! use shardkeep::codec::{decode_share, encode_share};
//! use shardkeep::domain::{ShareId, Threshold};
//! use shardkeep::sharing::Share;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let share = Share::from_bytes(ShareId::new(2)?, &[0x42; 32])?;
//! let threshold = Threshold::new(3)?;
//!
//! let mnemonic = encode_share(&share, threshold)?;
//! assert!(mnemonic.as_str().starts_with("shardkeep "));
//!
//! let (parsed_threshold, parsed_share) = decode_share(mnemonic.as_str())?;
//! assert_eq!(threshold, parsed_threshold);
//! assert_eq!(share, parsed_share);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

use bip39::Language;
use crc::{CRC_32_ISO_HDLC, Crc};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::domain::{ShareId, Threshold};
use crate::sharing::{Share, SharingError};

/// CRC32 algorithm for share integrity checking
const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Version word that identifies the shardkeep share format
pub const VERSION_WORD: &str = "shardkeep";

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("empty mnemonic")]
    Empty,

    #[error("invalid version word: expected '{VERSION_WORD}', got '{0}'")]
    InvalidVersionWord(String),

    #[error("word '{0}' not found in BIP39 wordlist")]
    UnknownWord(String),

    #[error("word index {0} out of range (must be 0-2047)")]
    WordIndexOutOfRange(usize),

    #[error("mnemonic too short: {0}")]
    TooShort(String),

    #[error("invalid share parameters: {0}")]
    Parameters(#[from] SharingError),

    #[error("checksum verification failed: expected 0x{expected:08x}, got 0x{actual:08x}")]
    ChecksumMismatch { expected: u32, actual: u32 },
}

/// A share encoded as BIP39 words
///
/// Wraps the words in `Zeroizing` since they carry the share value.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareMnemonic(Zeroizing<String>);

impl ShareMnemonic {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ShareMnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &*self.0)
    }
}

/// Static `HashMap` for O(1) word-to-index lookups
static WORD_TO_INDEX_MAP: LazyLock<HashMap<&'static str, usize>> = LazyLock::new(|| {
    Language::English
        .word_list()
        .iter()
        .enumerate()
        .map(|(idx, &word)| (word, idx))
        .collect()
});

/// Encodes threshold (M) and share identifier (O) into BIP39 words
///
/// 11-bit words: [`continuation_bit` (1)][M bits (5)][O bits (5)]. Values of
/// 32 or more take a second word carrying the low bits.
fn encode_parameters(threshold: Threshold, id: ShareId) -> Result<Vec<String>, CodecError> {
    let m = usize::from(*threshold);
    let o = usize::from(*id);

    if m < 32 && o < 32 {
        return Ok(vec![word_from_index((m << 5) | o)?]);
    }

    let high = (1 << 10) | (((m >> 5) & 0b11111) << 5) | ((o >> 5) & 0b11111);
    let low = ((m & 0b11111) << 5) | (o & 0b11111);
    Ok(vec![word_from_index(high)?, word_from_index(low)?])
}

/// Decodes threshold and share identifier from parameter words
fn decode_parameters(words: &[String]) -> Result<(Threshold, ShareId), CodecError> {
    let first = words
        .first()
        .ok_or_else(|| CodecError::TooShort("no parameter words".to_string()))?;
    let first_index = word_to_index(first)?;

    let (m, o) = if (first_index >> 10) & 1 == 1 {
        let second = words.get(1).ok_or_else(|| {
            CodecError::TooShort("continuation bit set but only one parameter word".to_string())
        })?;
        let second_index = word_to_index(second)?;
        if (second_index >> 10) & 1 != 0 {
            return Err(CodecError::TooShort(
                "second parameter word has continuation bit set".to_string(),
            ));
        }
        (
            (((first_index >> 5) & 0b11111) << 5) | ((second_index >> 5) & 0b11111),
            ((first_index & 0b11111) << 5) | (second_index & 0b11111),
        )
    } else {
        ((first_index >> 5) & 0b11111, first_index & 0b11111)
    };

    let m = u8::try_from(m)
        .map_err(|_| SharingError::InvalidParameters(format!("threshold {m} out of range")))?;
    let o = u8::try_from(o)
        .map_err(|_| SharingError::InvalidParameters(format!("share identifier {o} out of range")))?;
    Ok((Threshold::new(m)?, ShareId::new(o)?))
}

/// Encodes binary data as BIP39 words, left-padded to an 11-bit boundary
fn encode_data(data: &[u8]) -> Result<Vec<String>, CodecError> {
    let bit_count = data.len() * 8;
    let padding = (11 - (bit_count % 11)) % 11;
    let mut words = Vec::with_capacity((bit_count + padding) / 11);

    let mut bit_buffer: usize = 0;
    let mut bits_in_buffer = padding;

    for &byte in data {
        for bit_pos in (0..8).rev() {
            bit_buffer = (bit_buffer << 1) | usize::from((byte >> bit_pos) & 1);
            bits_in_buffer += 1;

            if bits_in_buffer == 11 {
                words.push(word_from_index(bit_buffer)?);
                bit_buffer = 0;
                bits_in_buffer = 0;
            }
        }
    }

    Ok(words)
}

/// Decodes BIP39 words back to bytes, dropping the left padding
fn decode_data(words: &[String]) -> Result<Zeroizing<Vec<u8>>, CodecError> {
    let total_bits = words.len() * 11;
    let padding = total_bits % 8;

    let mut result = Zeroizing::new(Vec::with_capacity(total_bits / 8));
    let mut byte: u8 = 0;
    let mut bits_in_byte = 0;
    let mut bits_seen = 0;

    for word in words {
        let index = word_to_index(word)?;
        for bit_pos in (0..11).rev() {
            bits_seen += 1;
            if bits_seen <= padding {
                continue;
            }
            #[allow(
                clippy::cast_possible_truncation,
                reason = "masked to a single bit"
            )]
            let bit = ((index >> bit_pos) & 1) as u8;
            byte = (byte << 1) | bit;
            bits_in_byte += 1;

            if bits_in_byte == 8 {
                result.push(byte);
                byte = 0;
                bits_in_byte = 0;
            }
        }
    }

    Ok(result)
}

/// Encodes a share with the deployment threshold
///
/// # Errors
/// Returns an error if a word index falls outside the BIP39 list
pub fn encode_share(share: &Share, threshold: Threshold) -> Result<ShareMnemonic, CodecError> {
    let value = share.value();
    let checksum = CRC32.checksum(value);

    #[allow(
        clippy::cast_possible_truncation,
        reason = "share values are 32 bytes"
    )]
    let length = value.len() as u16;

    let mut encoded = Zeroizing::new(Vec::with_capacity(2 + value.len() + 4));
    encoded.extend_from_slice(&length.to_be_bytes());
    encoded.extend_from_slice(value);
    encoded.extend_from_slice(&checksum.to_be_bytes());

    let mut words = vec![VERSION_WORD.to_string()];
    words.extend(encode_parameters(threshold, share.id())?);
    words.extend(encode_data(&encoded)?);

    Ok(ShareMnemonic(Zeroizing::new(words.join(" "))))
}

/// Parses a share mnemonic back into its threshold and share
///
/// # Errors
/// Returns an error if the version word, parameters, length or checksum are wrong
pub fn decode_share(mnemonic: &str) -> Result<(Threshold, Share), CodecError> {
    let words: Vec<String> = mnemonic.split_whitespace().map(str::to_lowercase).collect();

    let version = words.first().ok_or(CodecError::Empty)?;
    if version != VERSION_WORD {
        return Err(CodecError::InvalidVersionWord(version.clone()));
    }

    let first_param = words
        .get(1)
        .ok_or_else(|| CodecError::TooShort("need version and parameter words".to_string()))?;
    let param_word_count = if (word_to_index(first_param)? >> 10) & 1 == 1 {
        2
    } else {
        1
    };
    if words.len() <= 1 + param_word_count {
        return Err(CodecError::TooShort("no share data words".to_string()));
    }

    let (threshold, id) = decode_parameters(&words[1..=param_word_count])?;
    let mut encoded = decode_data(&words[1 + param_word_count..])?;

    // Leading zero bytes can only come from bit alignment
    while encoded.len() >= 6 && encoded[0] == 0 && encoded[1] == 0 {
        encoded.remove(0);
    }
    if encoded.len() < 6 {
        return Err(CodecError::TooShort(format!(
            "need at least 6 data bytes, got {}",
            encoded.len()
        )));
    }

    let length = usize::from(u16::from_be_bytes([encoded[0], encoded[1]]));
    if encoded.len() < 2 + length + 4 {
        return Err(CodecError::TooShort(format!(
            "expected {} data bytes, got {}",
            2 + length + 4,
            encoded.len()
        )));
    }

    let value = &encoded[2..2 + length];
    let checksum = &encoded[2 + length..2 + length + 4];
    let expected = CRC32.checksum(value);
    let actual = u32::from_be_bytes([checksum[0], checksum[1], checksum[2], checksum[3]]);
    if expected != actual {
        return Err(CodecError::ChecksumMismatch { expected, actual });
    }

    Ok((threshold, Share::from_bytes(id, value)?))
}

fn word_to_index(word: &str) -> Result<usize, CodecError> {
    WORD_TO_INDEX_MAP
        .get(word.to_lowercase().as_str())
        .copied()
        .ok_or_else(|| CodecError::UnknownWord(word.to_string()))
}

fn word_from_index(index: usize) -> Result<String, CodecError> {
    Language::English
        .word_list()
        .get(index)
        .map(|word| (*word).to_string())
        .ok_or(CodecError::WordIndexOutOfRange(index))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn share(id: u8, fill: u8) -> Share {
        Share::from_bytes(ShareId::new(id).unwrap(), &[fill; 32]).unwrap()
    }

    #[test]
    fn test_word_conversion() {
        let word = word_from_index(65).unwrap();
        assert_eq!(word_to_index(&word).unwrap(), 65);
        assert!(word_from_index(2048).is_err());
    }

    #[test]
    fn test_single_word_parameters() {
        let words = encode_parameters(Threshold::new(2).unwrap(), ShareId::new(1).unwrap()).unwrap();
        assert_eq!(words.len(), 1);

        let (m, o) = decode_parameters(&words).unwrap();
        assert_eq!(*m, 2);
        assert_eq!(*o, 1);
    }

    #[test]
    fn test_two_word_parameters() {
        let words =
            encode_parameters(Threshold::new(35).unwrap(), ShareId::new(200).unwrap()).unwrap();
        assert_eq!(words.len(), 2);

        let (m, o) = decode_parameters(&words).unwrap();
        assert_eq!(*m, 35);
        assert_eq!(*o, 200);
    }

    #[test]
    fn test_data_encoding() {
        let data = vec![0x01, 0x02, 0x03, 0x04];
        let words = encode_data(&data).unwrap();
        assert_eq!(words.len(), 3);
        assert_eq!(*decode_data(&words).unwrap(), data);
    }

    #[test]
    fn test_share_round_trip() {
        let original = share(4, 0x5A);
        let threshold = Threshold::new(3).unwrap();
        let mnemonic = encode_share(&original, threshold).unwrap();

        assert!(mnemonic.as_str().starts_with("shardkeep "));

        let (decoded_threshold, decoded) = decode_share(mnemonic.as_str()).unwrap();
        assert_eq!(threshold, decoded_threshold);
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_decoding_is_case_insensitive() {
        let mnemonic = encode_share(&share(1, 7), Threshold::new(2).unwrap()).unwrap();
        let shouted = mnemonic.as_str().to_uppercase();
        assert!(decode_share(&shouted).is_ok());
    }

    #[test]
    fn test_invalid_version_word() {
        let result = decode_share("invalid word word word");
        assert!(matches!(result, Err(CodecError::InvalidVersionWord(w)) if w == "invalid"));
    }

    #[test]
    fn test_empty_mnemonic() {
        assert!(matches!(decode_share(""), Err(CodecError::Empty)));
        assert!(matches!(decode_share("shardkeep"), Err(CodecError::TooShort(_))));
    }

    #[test]
    fn test_checksum_detects_corruption() {
        let mnemonic = encode_share(&share(1, 0xDE), Threshold::new(2).unwrap()).unwrap();
        let mut words: Vec<&str> = mnemonic.as_str().split_whitespace().collect();
        let last = words.len() - 1;
        words[last] = if words[last] == "zoo" { "abandon" } else { "zoo" };

        let result = decode_share(&words.join(" "));
        assert!(matches!(result, Err(CodecError::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_zero_identifier_is_rejected() {
        // Parameter word index (2 << 5) | 0 encodes threshold 2 with identifier 0
        let param = word_from_index(2 << 5).unwrap();
        let mnemonic = format!("shardkeep {param} abandon abandon abandon");
        assert!(matches!(
            decode_share(&mnemonic),
            Err(CodecError::Parameters(SharingError::InvalidParameters(_)))
        ));
    }
}
