// Licensed under the Apache-2.0 license

mod log;

pub use log::Log;

/// Group a byte stream into the 4-byte big-endian words the TRNG core
/// output register serves them as.
pub fn be_words(bytes: &[u8]) -> Vec<u32> {
    assert_eq!(bytes.len() % 4, 0);
    bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_be_bytes(chunk.try_into().unwrap()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_be_words() {
        assert_eq!(
            be_words(&[0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77]),
            vec![0x0011_2233, 0x4455_6677]
        );
    }
}
