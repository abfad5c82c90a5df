/*++

Licensed under the Apache-2.0 license.

File Name:

    df.rs

Abstract:

    File contains the software Derivation Function. The hardware DRBG in this
    IP revision has no derivation function of its own, so seed conditioning
    per NIST SP 800-90A sections 10.3.2 and 10.3.3 is done here before the
    seed is loaded into the external seed registers.

--*/

use crate::block_cipher::{BlockCipher, BLK_SIZE, KEY_LEN};
use zeroize::Zeroize;

/// Upper bound on raw entropy fed into one derivation, in bytes.
pub(crate) const MAX_PRE_DF_LEN: usize = 160;
/// Personalization string length, in bytes.
pub(crate) const PERS_STRING_LEN: usize = 48;
/// Conditioned seed length, in bytes.
pub(crate) const SEED_LEN: usize = 48;
/// Conditioned random output length, in bytes.
pub(crate) const RAND_LEN: usize = 32;

const IVC_OFFSET: usize = 0;
const INPUT_LEN_OFFSET: usize = 4;
const OUTPUT_LEN_OFFSET: usize = 8;
const ENTROPY_OFFSET: usize = 12;
const PSTR_OFFSET: usize = ENTROPY_OFFSET + MAX_PRE_DF_LEN;
const PAD_OFFSET: usize = PSTR_OFFSET + PERS_STRING_LEN;
const PAD_LEN: usize = 4;
const PAD_VAL: u8 = 0x80;
pub(crate) const DF_INPUT_LEN: usize = PAD_OFFSET + PAD_LEN;

const DF_KEY: [u8; KEY_LEN] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25,
    26, 27, 28, 29, 30, 31,
];

/// Selects the derivation output: a DRBG seed or conditioned random data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DfFlag {
    Seed,
    Rand,
}

/// Formatted derivation input:
/// `iv_counter (4) | L (4) | N (4) | entropy | perstring | 0x80 pad`,
/// all length fields big-endian. The entropy slot is sized for the largest
/// supported request; shorter entropy is compacted before the cipher passes.
#[derive(Zeroize)]
pub(crate) struct DfInput {
    buf: [u8; DF_INPUT_LEN],
}

impl DfInput {
    pub fn new() -> Self {
        Self {
            buf: [0; DF_INPUT_LEN],
        }
    }

    pub fn reset(&mut self) {
        self.buf.zeroize();
    }

    /// Entropy slot for the given raw length.
    pub fn entropy_mut(&mut self, len: usize) -> &mut [u8] {
        &mut self.buf[ENTROPY_OFFSET..ENTROPY_OFFSET + len]
    }
}

pub(crate) struct DerivationFunction {
    cipher: BlockCipher,
}

impl DerivationFunction {
    pub fn new() -> Self {
        Self {
            cipher: BlockCipher::new(),
        }
    }

    /// Distill `len` bytes of entropy (already placed in `dfin`) and the
    /// optional personalization string into `out`.
    ///
    /// `out` must be 48 bytes for `DfFlag::Seed` and 32 bytes for
    /// `DfFlag::Rand`; `len` must be block-aligned and no larger than the
    /// entropy slot.
    pub fn derive(
        &mut self,
        dfin: &mut DfInput,
        len: usize,
        pstr: Option<&[u8; PERS_STRING_LEN]>,
        flag: DfFlag,
        out: &mut [u8],
    ) {
        debug_assert!(len <= MAX_PRE_DF_LEN);
        debug_assert_eq!(len % BLK_SIZE, 0);
        debug_assert_eq!(
            out.len(),
            match flag {
                DfFlag::Seed => SEED_LEN,
                DfFlag::Rand => RAND_LEN,
            }
        );

        let out_len: u32 = match flag {
            DfFlag::Seed => SEED_LEN as u32,
            DfFlag::Rand => RAND_LEN as u32,
        };
        dfin.buf[OUTPUT_LEN_OFFSET..OUTPUT_LEN_OFFSET + 4]
            .copy_from_slice(&out_len.to_be_bytes());
        dfin.buf[PAD_OFFSET] = PAD_VAL;

        // Compact the formatted input: move the tail fields down so they sit
        // immediately after the entropy, then clear the freed bytes. The
        // zeroed span starts exactly where the moved span ends.
        let (formatted_len, move_src, move_len, gap) = match pstr {
            None => {
                let input_len = len as u32;
                dfin.buf[INPUT_LEN_OFFSET..INPUT_LEN_OFFSET + 4]
                    .copy_from_slice(&input_len.to_be_bytes());
                (
                    ENTROPY_OFFSET + len + PAD_LEN,
                    PAD_OFFSET,
                    PAD_LEN,
                    MAX_PRE_DF_LEN + PERS_STRING_LEN - len,
                )
            }
            Some(pstr) => {
                dfin.buf[PSTR_OFFSET..PSTR_OFFSET + PERS_STRING_LEN].copy_from_slice(pstr);
                let input_len = (len + PERS_STRING_LEN) as u32;
                dfin.buf[INPUT_LEN_OFFSET..INPUT_LEN_OFFSET + 4]
                    .copy_from_slice(&input_len.to_be_bytes());
                (
                    ENTROPY_OFFSET + len + PERS_STRING_LEN + PAD_LEN,
                    PSTR_OFFSET,
                    PERS_STRING_LEN + PAD_LEN,
                    MAX_PRE_DF_LEN - len,
                )
            }
        };
        if gap > 0 {
            dfin.buf
                .copy_within(move_src..move_src + move_len, move_src - gap);
            dfin.buf[DF_INPUT_LEN - gap..].fill(0);
        }
        debug_assert_eq!(formatted_len % BLK_SIZE, 0);

        // First pass: CBC-MAC the whole formatted input once per output
        // block, varying only the IV counter.
        let mut intermediate = [0u8; SEED_LEN];
        self.cipher.setup_key(&DF_KEY);
        for index in (0..SEED_LEN).step_by(BLK_SIZE) {
            let counter = (index / BLK_SIZE) as u32;
            dfin.buf[IVC_OFFSET..IVC_OFFSET + 4].copy_from_slice(&counter.to_be_bytes());
            let mut iv = [0u8; BLK_SIZE];
            self.cipher.checksum(&dfin.buf[..formatted_len], &mut iv);
            intermediate[index..index + BLK_SIZE].copy_from_slice(&iv);
        }

        // Second pass: re-key with K = intermediate[0..32] and emit the
        // output as a chain seeded from X = intermediate[32..48].
        let (key, x) = intermediate.split_at(KEY_LEN);
        self.cipher.setup_key(key.try_into().unwrap());
        let mut block: [u8; BLK_SIZE] = x.try_into().unwrap();
        for chunk in out.chunks_exact_mut(BLK_SIZE) {
            block = self.cipher.encrypt(&block);
            chunk.copy_from_slice(&block);
        }

        intermediate.zeroize();
        block.zeroize();
    }
}

impl Zeroize for DerivationFunction {
    fn zeroize(&mut self) {
        self.cipher.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_input(len: usize) -> DfInput {
        let mut dfin = DfInput::new();
        for (i, b) in dfin.entropy_mut(len).iter_mut().enumerate() {
            *b = (i as u8).wrapping_mul(0x1D).wrapping_add(3);
        }
        dfin
    }

    #[test]
    fn test_packing_without_perstring() {
        let len = 48;
        let mut dfin = filled_input(len);
        let mut out = [0u8; SEED_LEN];
        DerivationFunction::new().derive(&mut dfin, len, None, DfFlag::Seed, &mut out);

        // L = 48, N = 48, pad byte right after the entropy.
        assert_eq!(&dfin.buf[INPUT_LEN_OFFSET..INPUT_LEN_OFFSET + 4], &48u32.to_be_bytes());
        assert_eq!(&dfin.buf[OUTPUT_LEN_OFFSET..OUTPUT_LEN_OFFSET + 4], &48u32.to_be_bytes());
        assert_eq!(dfin.buf[ENTROPY_OFFSET + len], PAD_VAL);
        assert!(dfin.buf[ENTROPY_OFFSET + len + PAD_LEN..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_packing_with_perstring() {
        let len = 48;
        let pstr = [0xA7u8; PERS_STRING_LEN];
        let mut dfin = filled_input(len);
        let mut out = [0u8; SEED_LEN];
        DerivationFunction::new().derive(&mut dfin, len, Some(&pstr), DfFlag::Seed, &mut out);

        assert_eq!(&dfin.buf[INPUT_LEN_OFFSET..INPUT_LEN_OFFSET + 4], &96u32.to_be_bytes());
        // Perstring compacted to sit right after the entropy, pad after it.
        assert_eq!(
            &dfin.buf[ENTROPY_OFFSET + len..ENTROPY_OFFSET + len + PERS_STRING_LEN],
            &pstr
        );
        assert_eq!(dfin.buf[ENTROPY_OFFSET + len + PERS_STRING_LEN], PAD_VAL);
        assert!(dfin.buf[ENTROPY_OFFSET + len + PERS_STRING_LEN + PAD_LEN..]
            .iter()
            .all(|&b| b == 0));
    }

    #[test]
    fn test_full_length_entropy_needs_no_move() {
        let len = MAX_PRE_DF_LEN;
        let pstr = [0x33u8; PERS_STRING_LEN];
        let mut dfin = filled_input(len);
        let mut out = [0u8; SEED_LEN];
        DerivationFunction::new().derive(&mut dfin, len, Some(&pstr), DfFlag::Seed, &mut out);
        assert_eq!(dfin.buf[PAD_OFFSET], PAD_VAL);
        assert_eq!(&dfin.buf[PSTR_OFFSET..PSTR_OFFSET + PERS_STRING_LEN], &pstr);
    }

    #[test]
    fn test_seed_derivation_is_deterministic() {
        let len = 48;
        let pstr = [0x42u8; PERS_STRING_LEN];
        let mut out_a = [0u8; SEED_LEN];
        let mut out_b = [0u8; SEED_LEN];

        let mut dfin = filled_input(len);
        DerivationFunction::new().derive(&mut dfin, len, Some(&pstr), DfFlag::Seed, &mut out_a);
        let mut dfin = filled_input(len);
        DerivationFunction::new().derive(&mut dfin, len, Some(&pstr), DfFlag::Seed, &mut out_b);

        assert_eq!(out_a, out_b);
        assert_ne!(out_a, [0u8; SEED_LEN]);
    }

    #[test]
    fn test_rand_and_seed_outputs_diverge() {
        // The requested-output-length field is part of the formatted input,
        // so the two flags produce unrelated streams from the same entropy.
        let len = 48;
        let mut seed_out = [0u8; SEED_LEN];
        let mut rand_out = [0u8; RAND_LEN];

        let mut dfin = filled_input(len);
        DerivationFunction::new().derive(&mut dfin, len, None, DfFlag::Seed, &mut seed_out);
        let mut dfin = filled_input(len);
        DerivationFunction::new().derive(&mut dfin, len, None, DfFlag::Rand, &mut rand_out);

        assert_ne!(seed_out[..RAND_LEN], rand_out);
    }

    #[test]
    fn test_entropy_length_changes_output() {
        let mut out_short = [0u8; SEED_LEN];
        let mut out_long = [0u8; SEED_LEN];

        let mut dfin = filled_input(48);
        DerivationFunction::new().derive(&mut dfin, 48, None, DfFlag::Seed, &mut out_short);
        let mut dfin = filled_input(64);
        DerivationFunction::new().derive(&mut dfin, 64, None, DfFlag::Seed, &mut out_long);

        assert_ne!(out_short, out_long);
    }
}
