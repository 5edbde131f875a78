//! UTF-16 text decoding for text-typed bundle files.
//!
//! Text assets inside bundles are stored as UTF-16 with an optional byte
//! order mark. Decoding is lossy (stray surrogates become replacement
//! characters) and the BOM never reaches the client.

/// Decode UTF-16 file bytes into a string, honoring and stripping a BOM.
///
/// Little-endian is assumed when no BOM is present.
pub fn decode_utf16(bytes: &[u8]) -> String {
    let (bytes, big_endian) = match bytes {
        [0xFF, 0xFE, rest @ ..] => (rest, false),
        [0xFE, 0xFF, rest @ ..] => (rest, true),
        _ => (bytes, false),
    };

    let units = bytes.chunks_exact(2).map(|pair| {
        if big_endian {
            u16::from_be_bytes([pair[0], pair[1]])
        } else {
            u16::from_le_bytes([pair[0], pair[1]])
        }
    });

    char::decode_utf16(units)
        .map(|unit| unit.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
