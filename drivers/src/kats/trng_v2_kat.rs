/*++

Licensed under the Apache-2.0 license.

File Name:

    trng_v2_kat.rs

Abstract:

    File contains the Known Answer Test for the V2 TRNG in DRNG mode. The
    engine is instantiated with a fixed 128-byte seed and personalization
    string, reseeded with a second fixed seed, and must reproduce a fixed
    32-byte output.

--*/

use crate::{
    Mmio, Mode, TrngError, TrngResult, UsrCfg, VersalTrng, TRNG_PERS_STR_LEN,
    TRNG_SEC_STRENGTH_LEN, TRNG_V2_SEED_LEN,
};

const EXT_SEED: [u8; TRNG_V2_SEED_LEN] = [
    0x3B, 0xC3, 0xED, 0x64, 0xF4, 0x80, 0x1C, 0xC7, 0x14, 0xCC, 0x35, 0xED, 0x57, 0x01, 0x2A,
    0xE4, 0xBC, 0xEF, 0xDE, 0xF6, 0x7C, 0x46, 0xA6, 0x34, 0xC6, 0x79, 0xE8, 0x91, 0x5D, 0xB1,
    0xDB, 0xA7, 0x49, 0xA5, 0xBB, 0x4F, 0xED, 0x30, 0xB3, 0x7B, 0xA9, 0x8B, 0xF5, 0x56, 0x4D,
    0x40, 0x18, 0x9F, 0x66, 0x4E, 0x39, 0xC0, 0x60, 0xC8, 0x8E, 0xF4, 0x1C, 0xB9, 0x9D, 0x7B,
    0x97, 0x8B, 0x69, 0x62, 0x45, 0x0C, 0xD4, 0x85, 0xFC, 0xDC, 0x5A, 0x2B, 0xFD, 0xAB, 0x92,
    0x4A, 0x12, 0x52, 0x7D, 0x45, 0xD2, 0x61, 0x0A, 0x06, 0x74, 0xA7, 0x88, 0x36, 0x4B, 0xA2,
    0x65, 0xEE, 0x71, 0x0B, 0x5A, 0x4E, 0x33, 0xB2, 0x7A, 0x2E, 0xC0, 0xA6, 0xF2, 0x7D, 0xBD,
    0x7D, 0xDF, 0x07, 0xBB, 0xE2, 0x86, 0xFF, 0xF0, 0x8E, 0xA4, 0xB1, 0x46, 0xDB, 0xF7, 0x8C,
    0x3C, 0x62, 0x4D, 0xF0, 0x51, 0x50, 0xE7, 0x85,
];

const RESEED_ENTROPY: [u8; TRNG_V2_SEED_LEN] = [
    0xDF, 0x5E, 0x4D, 0x4F, 0x38, 0x9E, 0x2A, 0x3E, 0xF2, 0xAB, 0x46, 0xE3, 0xA0, 0x26, 0x77,
    0x84, 0x0B, 0x9D, 0x29, 0xB0, 0x5D, 0xCE, 0xC8, 0xC3, 0xF9, 0x4D, 0x32, 0xF7, 0xBA, 0x6F,
    0xA3, 0xB5, 0x35, 0xCB, 0xC7, 0x5C, 0x62, 0x48, 0x01, 0x65, 0x3A, 0xAA, 0x34, 0x2D, 0x89,
    0x6E, 0xEF, 0x6F, 0x69, 0x96, 0xE7, 0x84, 0xDA, 0xEF, 0x4E, 0xBE, 0x27, 0x4E, 0x9F, 0x88,
    0xB1, 0xA0, 0x7F, 0x83, 0xDB, 0x4A, 0xA9, 0x42, 0x01, 0xF1, 0x84, 0x71, 0xA9, 0xEF, 0xB9,
    0xE8, 0x7F, 0x81, 0xC7, 0xC1, 0x6C, 0x5E, 0xAC, 0x00, 0x47, 0x34, 0xA1, 0x75, 0xC0, 0xE8,
    0x7F, 0x48, 0x00, 0x45, 0xC9, 0xE9, 0x41, 0xE3, 0x8D, 0xD8, 0x4A, 0x63, 0xC4, 0x94, 0x77,
    0x59, 0xD9, 0x50, 0x2A, 0x1D, 0x4C, 0x47, 0x64, 0xA6, 0x66, 0x60, 0x16, 0xE7, 0x29, 0xC0,
    0xB1, 0xCF, 0x3B, 0x3F, 0x54, 0x49, 0x31, 0xD4,
];

const PERS_STR: [u8; TRNG_PERS_STR_LEN] = [
    0xB2, 0x80, 0x7E, 0x4C, 0xD0, 0xE4, 0xE2, 0xA9, 0x2F, 0x1F, 0x5D, 0xC1, 0xA2, 0x1F, 0x40,
    0xFC, 0x1F, 0x24, 0x5D, 0x42, 0x61, 0x80, 0xE6, 0xE9, 0x71, 0x05, 0x17, 0x5B, 0xAF, 0x70,
    0x30, 0x18, 0xBC, 0x23, 0x18, 0x15, 0xCB, 0xB8, 0xA6, 0x3E, 0x83, 0xB8, 0x4A, 0xFE, 0x38,
    0xFC, 0x25, 0x87,
];

const EXPECTED_OUT: [u8; TRNG_SEC_STRENGTH_LEN] = [
    0xEE, 0xA7, 0x5B, 0xB6, 0x2B, 0x97, 0xF0, 0xC0, 0x0F, 0xD6, 0xAB, 0x13, 0x00, 0x87, 0x7E,
    0xF4, 0x00, 0x7F, 0xD7, 0x56, 0xFE, 0xE5, 0xDF, 0xA6, 0x55, 0x5B, 0xB2, 0x86, 0xDD, 0x81,
    0x73, 0xB2,
];

#[derive(Default, Debug)]
pub struct TrngKatV2 {}

impl TrngKatV2 {
    /// This function executes the Known Answer Test for the V2 TRNG,
    /// covering the serial seed path for both the initial seed and a
    /// subsequent reseed.
    ///
    /// # Arguments
    ///
    /// * `trng` - TRNG driver in the `Uninitialized` state
    pub fn execute<M: Mmio>(&self, trng: &mut VersalTrng<M>) -> TrngResult<()> {
        let mut cfg = UsrCfg {
            mode: Mode::Drng,
            seed_life: 2,
            dfmul: 7,
            iseed_en: true,
            pstr_en: true,
            ..Default::default()
        };
        cfg.init_seed[..EXT_SEED.len()].copy_from_slice(&EXT_SEED);
        cfg.pstr.copy_from_slice(&PERS_STR);

        let mut out = [0u8; TRNG_SEC_STRENGTH_LEN];
        trng.instantiate(&cfg)?;
        trng.reseed(Some(&RESEED_ENTROPY), 7)?;
        trng.generate(&mut out, false)?;
        if out != EXPECTED_OUT {
            log::error!("TRNG V2 known-answer mismatch");
            return Err(TrngError::KAT_TRNG_OUTPUT_MISMATCH);
        }
        trng.release()?;
        Ok(())
    }
}
