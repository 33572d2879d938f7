use rand::RngCore;

/// Length of every opaque identifier, in hex characters.
pub const ID_LEN: usize = 24;

/// Generate a fresh random identifier (12 random bytes, hex-encoded).
pub fn new_id() -> String {
    let mut bytes = [0u8; ID_LEN / 2];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Returns `true` if `s` has the shape of an identifier produced by [`new_id`].
pub fn is_valid_id(s: &str) -> bool {
    s.len() == ID_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
}
