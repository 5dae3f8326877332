//! The one-way transform applied to submitted secrets.

use sha2::{Digest as _, Sha512};

/// Length in bytes of a stored digest.
pub const DIGEST_LEN: usize = 64;

/// A stored digest value.
pub type Digest = [u8; DIGEST_LEN];

/// Byte-in, fixed-size-digest-out transform.
pub trait Transform: Send + Sync + 'static {
    fn apply(&self, input: &[u8]) -> Digest;
}

/// SHA-512, the default transform.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha512Transform;

impl Transform for Sha512Transform {
    fn apply(&self, input: &[u8]) -> Digest {
        let mut out = [0u8; DIGEST_LEN];
        out.copy_from_slice(&Sha512::digest(input));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    #[test]
    fn test_sha512_known_answer() {
        let digest = Sha512Transform.apply(b"angryMonkey");
        assert_eq!(
            STANDARD.encode(digest),
            "ZEHhWB65gUlzdVwtDQArEyx+KVLzp/aTaRaPlBzYRIFj6vjFdqEb0Q5B8zVKCZ0vKbZPZklJz0Fd7su2A+gf7Q=="
        );
    }

    #[test]
    fn test_empty_input() {
        let digest = Sha512Transform.apply(b"");
        assert_eq!(digest[..4], [0xcf, 0x83, 0xe1, 0x35]);
    }
}
