/*++

Licensed under the Apache-2.0 license.

File Name:

    rng.rs

Abstract:

    File contains the top level random-bytes service: device bring-up with
    the mandatory self tests, and the chunked generate loop behind the
    platform's random-bytes hook.

--*/

use crate::kats::{TrngHealthTest, TrngKatV1, TrngKatV2};
use crate::trng::{Mode, UsrCfg, VersalTrng, Version, TRNG_PERS_STR_LEN, TRNG_SEC_STRENGTH_LEN};
use crate::Mmio;
use versal_trng_error::TrngResult;
use zeroize::Zeroize;

impl UsrCfg {
    /// Hybrid-mode bring-up profile: ring oscillators seed the DRBG, with
    /// the derivation function enabled and a fixed personalization string.
    pub fn hrng_default(seed_life: u32, dfmul: u32) -> Self {
        const PERS_STR: [u8; TRNG_PERS_STR_LEN] = [
            0xB2, 0x80, 0x7E, 0x4C, 0xD0, 0xE4, 0xE2, 0xA9, 0x2F, 0x1F, 0x5D, 0xC1, 0xA2, 0x1F,
            0x40, 0xFC, 0x1F, 0x24, 0x5D, 0x42, 0x61, 0x80, 0xE6, 0xE9, 0x71, 0x05, 0x17, 0x5B,
            0xAF, 0x70, 0x30, 0x18, 0xBC, 0x23, 0x18, 0x15, 0xCB, 0xB8, 0xA6, 0x3E, 0x83, 0xB8,
            0x4A, 0xFE, 0x38, 0xFC, 0x25, 0x87,
        ];

        Self {
            mode: Mode::Hrng,
            seed_life,
            dfmul,
            pstr_en: true,
            pstr: PERS_STR,
            ..Default::default()
        }
    }
}

/// Bring the device up for service: run the known-answer test for the
/// configured silicon revision, run the health test, instantiate with the
/// caller's configuration, and perform the initial reseed for hybrid mode
/// (the one mode whose reseed takes no caller seed).
///
/// # Panics
///
/// A known-answer or health-test failure panics: the device must not hand
/// out random data after a failed self test.
pub fn hw_init<M: Mmio>(trng: &mut VersalTrng<M>, usr_cfg: &UsrCfg) -> TrngResult<()> {
    let kat_result = match trng.version() {
        Version::V1 => TrngKatV1::default().execute(trng),
        Version::V2 => TrngKatV2::default().execute(trng),
    };
    if kat_result.is_err() {
        log::error!("TRNG known-answer test failed");
        panic!("TRNG known-answer test failed");
    }

    if TrngHealthTest::default().execute(trng).is_err() {
        log::error!("TRNG health test failed");
        panic!("TRNG health test failed");
    }

    trng.instantiate(usr_cfg)?;
    if usr_cfg.mode == Mode::Hrng {
        trng.reseed(None, usr_cfg.dfmul)?;
    }
    Ok(())
}

/// Fill `buf` with random bytes, one security-strength block at a time.
///
/// # Panics
///
/// Panics if the engine reports any failure: the calling security subsystem
/// cannot proceed with a degraded random source.
pub fn get_random_bytes<M: Mmio>(trng: &mut VersalTrng<M>, buf: &mut [u8]) -> TrngResult<()> {
    let mut chunks = buf.chunks_exact_mut(TRNG_SEC_STRENGTH_LEN);
    for chunk in &mut chunks {
        if trng.generate(chunk, false).is_err() {
            panic!("TRNG generate failed");
        }
    }

    let tail = chunks.into_remainder();
    if !tail.is_empty() {
        let mut scratch = [0u8; TRNG_SEC_STRENGTH_LEN];
        if trng.generate(&mut scratch, false).is_err() {
            panic!("TRNG generate failed");
        }
        tail.copy_from_slice(&scratch[..tail.len()]);
        scratch.zeroize();
    }
    Ok(())
}
