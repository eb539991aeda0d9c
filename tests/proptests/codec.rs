//! Property tests for share mnemonic encoding

use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;
use shardkeep::codec::{VERSION_WORD, decode_share, encode_share};
use shardkeep::domain::{ShareId, Threshold};
use shardkeep::sharing::Share;

/// Arbitrary share with its deployment threshold
#[derive(Clone, Debug)]
struct EncodableShare {
    threshold: Threshold,
    share: Share,
}

impl Arbitrary for EncodableShare {
    fn arbitrary(g: &mut Gen) -> Self {
        let threshold = Threshold::new((u8::arbitrary(g) % Threshold::MAX) + 1).unwrap();
        let id = ShareId::new((u8::arbitrary(g) % 254) + 1).unwrap();
        let mut value = [0u8; 32];
        for byte in &mut value {
            *byte = u8::arbitrary(g);
        }
        EncodableShare {
            threshold,
            share: Share::from_bytes(id, &value).unwrap(),
        }
    }
}

/// Threshold, identifier and value survive encoding, including the two-word parameter form
#[quickcheck]
fn prop_metadata_preserved(input: EncodableShare) -> bool {
    let Ok(mnemonic) = encode_share(&input.share, input.threshold) else {
        return false;
    };
    if !mnemonic.as_str().starts_with(VERSION_WORD) {
        return false;
    }

    decode_share(mnemonic.as_str())
        .is_ok_and(|(threshold, share)| threshold == input.threshold && share == input.share)
}

/// Replacing the final word breaks the checksum
#[quickcheck]
fn prop_corrupted_checksum_word_rejected(input: EncodableShare, replacement: u16) -> bool {
    let mnemonic = encode_share(&input.share, input.threshold).unwrap();
    let mut words: Vec<&str> = mnemonic.as_str().split_whitespace().collect();

    let wordlist = bip39::Language::English.word_list();
    let last = words.len() - 1;
    let mut candidate = wordlist[usize::from(replacement) % wordlist.len()];
    if candidate == words[last] {
        candidate = if candidate == "zoo" { "abandon" } else { "zoo" };
    }
    words[last] = candidate;

    decode_share(&words.join(" ")).is_err()
}
