/// Check that an input string is a well-formed account address before any
/// network call is made. Pure: no I/O, never panics on malformed input.
///
/// Addresses are base58 text of 32 to 44 characters that decodes to exactly
/// 32 bytes.
pub fn is_valid_address(input: &str) -> bool {
    if input.len() < 32 || input.len() > 44 {
        return false;
    }

    match bs58::decode(input).into_vec() {
        Ok(bytes) => bytes.len() == 32,
        Err(_) => false,
    }
}
