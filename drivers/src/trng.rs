/*++

Licensed under the Apache-2.0 license.

File Name:

    trng.rs

Abstract:

    File contains the Versal PMC TRNG engine. The hardware combines a ring
    oscillator entropy source with a block-cipher DRBG; this engine drives it
    through reset, instantiate, reseed, generate and release, in one of three
    modes:

    DRNG: the DRBG alone, seeded by the caller.
    PTRNG: the digitized entropy source output directly, optionally
           conditioned by the derivation function.
    HRNG: the entropy source seeds the DRBG, which generates the output.

    The IP ships in two revisions. V1 loads seed material in parallel through
    twelve external seed registers, after conditioning by the software
    derivation function. V2 carries the derivation function in silicon and
    accepts the raw seed bit-serially through a dedicated control register.

--*/

use crate::df::{DerivationFunction, DfFlag, DfInput, MAX_PRE_DF_LEN, PERS_STRING_LEN, SEED_LEN};
use crate::mmio::Mmio;
use crate::regs::{self, TrngRegisters};
use crate::{Array4x12, Array4x4};
use versal_trng_error::{TrngError, TrngResult};
use zeroize::Zeroize;

/// Bytes produced per generate call (256-bit security strength).
pub const TRNG_SEC_STRENGTH_LEN: usize = 32;
/// External seed length for the V1 silicon, in bytes.
pub const TRNG_SEED_LEN: usize = 48;
/// External seed length for the V2 silicon, in bytes.
pub const TRNG_V2_SEED_LEN: usize = 128;
/// Personalization string length, in bytes.
pub const TRNG_PERS_STR_LEN: usize = PERS_STRING_LEN;
/// Capacity of the stored initial seed, sized for the largest DF request.
pub const TRNG_MAX_SEED_LEN: usize = MAX_PRE_DF_LEN;

pub const TRNG_MIN_DFLENMULT: u32 = 2;
pub const TRNG_MAX_DFLENMULT: u32 = 9;

const TRNG_BURST_SIZE: usize = 16;
const WORDS_PER_BURST: usize = 4;
const GENERATE_TIMEOUT_US: u32 = 8_000;
const RESEED_TIMEOUT_US: u32 = 1_500_000;
const PRNGMODE_RESEED: u32 = 0;
const PRNGMODE_GEN: u32 = regs::CTRL_PRNGMODE_MASK;
const ALL_A_PATTERN_32: u32 = 0xAAAA_AAAA;
const ALL_5_PATTERN_32: u32 = 0x5555_5555;

/// Operating mode, fixed at instantiate time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Externally seeded DRBG.
    Drng,
    /// Entropy source output, optionally conditioned.
    Ptrng,
    /// Entropy source seeding the DRBG.
    Hrng,
}

/// IP silicon revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    V1,
    V2,
}

impl Version {
    /// External seed length the revision accepts from the caller.
    pub const fn seed_len(self) -> usize {
        match self {
            Version::V1 => TRNG_SEED_LEN,
            Version::V2 => TRNG_V2_SEED_LEN,
        }
    }
}

/// Engine lifecycle state.
///
/// `Catastrophic` is sticky: unlike `Error` it survives re-instantiation
/// attempts and only a full power cycle plus a fresh known-answer test run
/// may bring the device back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrngStatus {
    Uninitialized,
    Healthy,
    Error,
    Catastrophic,
}

/// User configuration, validated at instantiate.
#[derive(Clone)]
pub struct UsrCfg {
    pub mode: Mode,
    /// Generate calls permitted per seed.
    pub seed_life: u32,
    /// DF input length multiplier; 0 if and only if `df_disable`.
    pub dfmul: u32,
    pub df_disable: bool,
    pub iseed_en: bool,
    /// Initial seed, big-endian byte stream; the leading
    /// `version.seed_len()` bytes are significant.
    pub init_seed: [u8; TRNG_MAX_SEED_LEN],
    pub pstr_en: bool,
    pub pstr: [u8; TRNG_PERS_STR_LEN],
    pub predict_en: bool,
}

impl Default for UsrCfg {
    fn default() -> Self {
        Self {
            mode: Mode::Drng,
            seed_life: 0,
            dfmul: 0,
            df_disable: false,
            iseed_en: false,
            init_seed: [0; TRNG_MAX_SEED_LEN],
            pstr_en: false,
            pstr: [0; TRNG_PERS_STR_LEN],
            predict_en: false,
        }
    }
}

/// Running statistics. `bytes` accumulates for the life of the instance,
/// the other fields reset on every reseed.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrngStats {
    pub bytes: u64,
    pub bytes_reseed: u64,
    pub elapsed_seed_life: u32,
}

/// A single TRNG instance.
///
/// The engine owns its MMIO window exclusively between `instantiate` and
/// `release` and holds no locks; callers serialize access.
pub struct VersalTrng<M: Mmio> {
    regs: TrngRegisters<M>,
    version: Version,
    usr_cfg: UsrCfg,
    status: TrngStatus,
    stats: TrngStats,
    /// Working seed length for the current DF configuration.
    len: usize,
    /// Previous 16-byte burst, for the stuck-output check.
    burst: [u32; WORDS_PER_BURST],
    dfin: DfInput,
    dfout: [u8; SEED_LEN],
    df: DerivationFunction,
}

impl<M: Mmio> VersalTrng<M> {
    pub fn new(mmio: M, version: Version) -> Self {
        Self {
            regs: TrngRegisters::new(mmio),
            version,
            usr_cfg: UsrCfg::default(),
            status: TrngStatus::Uninitialized,
            stats: TrngStats::default(),
            len: 0,
            burst: [0; WORDS_PER_BURST],
            dfin: DfInput::new(),
            dfout: [0; SEED_LEN],
            df: DerivationFunction::new(),
        }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn status(&self) -> TrngStatus {
        self.status
    }

    pub fn stats(&self) -> TrngStats {
        self.stats
    }

    fn validate_cfg(cfg: &UsrCfg) -> TrngResult<()> {
        if cfg.mode != Mode::Ptrng && cfg.seed_life == 0 {
            return Err(TrngError::DRIVER_TRNG_INVALID_SEED_LIFE);
        }
        if cfg.mode == Mode::Drng && !cfg.iseed_en {
            return Err(TrngError::DRIVER_TRNG_INVALID_SEED_CFG);
        }
        if cfg.mode == Mode::Hrng && cfg.iseed_en {
            return Err(TrngError::DRIVER_TRNG_INVALID_SEED_CFG);
        }
        if !cfg.df_disable
            && !(TRNG_MIN_DFLENMULT..=TRNG_MAX_DFLENMULT).contains(&cfg.dfmul)
        {
            return Err(TrngError::DRIVER_TRNG_INVALID_DFMUL);
        }
        if cfg.df_disable && cfg.dfmul != 0 {
            return Err(TrngError::DRIVER_TRNG_INVALID_DFMUL);
        }
        if cfg.mode == Mode::Ptrng
            && (cfg.iseed_en || cfg.pstr_en || cfg.predict_en || cfg.seed_life != 0)
        {
            return Err(TrngError::DRIVER_TRNG_INVALID_PTRNG_CFG);
        }
        Ok(())
    }

    /// Bring the instance from `Uninitialized` to `Healthy` with the given
    /// configuration. Non-PTRNG modes perform the initial reseed here.
    pub fn instantiate(&mut self, cfg: &UsrCfg) -> TrngResult<()> {
        let result = self.try_instantiate(cfg);
        if result.is_err() {
            self.status = TrngStatus::Error;
        }
        result
    }

    fn try_instantiate(&mut self, cfg: &UsrCfg) -> TrngResult<()> {
        if self.status != TrngStatus::Uninitialized {
            return Err(TrngError::DRIVER_TRNG_INVALID_STATE);
        }
        Self::validate_cfg(cfg)?;

        self.usr_cfg = cfg.clone();

        // Bring the TRNG and PRNG unit core out of reset.
        self.regs.reset();

        if self.version == Version::V2 && matches!(cfg.mode, Mode::Ptrng | Mode::Hrng) {
            // Cutoff values for the silicon health tests, then the
            // digitization interval.
            self.regs.clear_set(
                regs::CTRL_3,
                regs::CTRL_3_APTCUTOFF_MASK,
                regs::CTRL_3_APTCUTOFF_DEFVAL << regs::CTRL_3_APTCUTOFF_SHIFT,
            );
            self.regs.clear_set(
                regs::CTRL_2,
                regs::CTRL_2_RCTCUTOFF_MASK,
                regs::CTRL_2_RCTCUTOFF_DEFVAL << regs::CTRL_2_RCTCUTOFF_SHIFT,
            );
            self.regs.clear_set(
                regs::CTRL_2,
                regs::CTRL_2_DIT_MASK,
                regs::CTRL_2_DIT_DEFVAL << regs::CTRL_2_DIT_SHIFT,
            );
        }

        if self.usr_cfg.mode != Mode::Ptrng {
            let mut seed = cfg.init_seed;
            let mut pstr = cfg.pstr;
            let result = self.reseed_internal(
                cfg.iseed_en.then_some(&seed),
                cfg.pstr_en.then_some(&pstr),
                self.usr_cfg.dfmul,
            );
            seed.zeroize();
            pstr.zeroize();
            result?;
        }

        self.status = TrngStatus::Healthy;
        Ok(())
    }

    /// Reseed a healthy instance: DRNG with a caller seed, HRNG from the
    /// entropy source.
    pub fn reseed(&mut self, seed: Option<&[u8]>, dfmul: u32) -> TrngResult<()> {
        let result = self.try_reseed(seed, dfmul);
        if result.is_err() && self.status != TrngStatus::Catastrophic {
            self.status = TrngStatus::Error;
        }
        result
    }

    fn try_reseed(&mut self, seed: Option<&[u8]>, dfmul: u32) -> TrngResult<()> {
        if self.status != TrngStatus::Healthy {
            return Err(TrngError::DRIVER_TRNG_INVALID_STATE);
        }
        match self.usr_cfg.mode {
            Mode::Ptrng => return Err(TrngError::DRIVER_TRNG_INVALID_MODE),
            Mode::Drng => {
                if seed.is_none() {
                    return Err(TrngError::DRIVER_TRNG_INVALID_SEED_CFG);
                }
            }
            Mode::Hrng => {
                if seed.is_some() {
                    return Err(TrngError::DRIVER_TRNG_INVALID_SEED_CFG);
                }
            }
        }
        if !self.usr_cfg.df_disable
            && !(TRNG_MIN_DFLENMULT..=TRNG_MAX_DFLENMULT).contains(&dfmul)
        {
            return Err(TrngError::DRIVER_TRNG_INVALID_DFMUL);
        }
        if self.usr_cfg.df_disable && dfmul != 0 {
            return Err(TrngError::DRIVER_TRNG_INVALID_DFMUL);
        }

        let mut staged = [0u8; TRNG_MAX_SEED_LEN];
        let staged_seed = match seed {
            Some(seed) => {
                if seed.len() != self.version.seed_len() {
                    return Err(TrngError::DRIVER_TRNG_INVALID_SEED_LEN);
                }
                staged[..seed.len()].copy_from_slice(seed);
                let cmp_len = self.len.min(TRNG_MAX_SEED_LEN);
                if staged[..cmp_len] == self.usr_cfg.init_seed[..cmp_len] {
                    staged.zeroize();
                    return Err(TrngError::DRIVER_TRNG_SEED_MATCHES_INIT_SEED);
                }
                Some(&staged)
            }
            None => None,
        };

        if self.version == Version::V2 {
            // A previous reseed may still be in flight; the outcome of this
            // wait surfaces through the DONE poll of the reseed below.
            let _ = self.regs.wait_for_event(
                regs::STATUS,
                regs::STATUS_DONE_MASK,
                regs::STATUS_DONE_MASK,
                RESEED_TIMEOUT_US,
                TrngError::DRIVER_TRNG_RESEED_TIMEOUT,
            );
        }

        let result = self.reseed_internal(staged_seed, None, dfmul);
        staged.zeroize();
        result
    }

    fn reseed_internal(
        &mut self,
        eseed: Option<&[u8; TRNG_MAX_SEED_LEN]>,
        pstr: Option<&[u8; TRNG_PERS_STR_LEN]>,
        mul: u32,
    ) -> TrngResult<()> {
        let result = self.try_reseed_internal(eseed, pstr, mul);
        if result.is_err() && self.status != TrngStatus::Catastrophic {
            self.status = TrngStatus::Error;
        }
        result
    }

    fn try_reseed_internal(
        &mut self,
        eseed: Option<&[u8; TRNG_MAX_SEED_LEN]>,
        pstr: Option<&[u8; TRNG_PERS_STR_LEN]>,
        mul: u32,
    ) -> TrngResult<()> {
        self.stats.bytes_reseed = 0;
        self.stats.elapsed_seed_life = 0;

        self.len = if self.usr_cfg.df_disable {
            TRNG_SEED_LEN
        } else {
            (mul as usize + 1) * regs::BYTES_PER_BLOCK
        };

        if self.usr_cfg.df_disable || self.version == Version::V2 {
            self.reseed_internal_nodf(eseed, pstr, mul)?;
        } else {
            self.reseed_internal_df(eseed, pstr)?;
        }

        if self.version == Version::V1 {
            self.regs
                .write(regs::CTRL, PRNGMODE_RESEED | regs::CTRL_PRNGXS_MASK);
            self.regs.clear_set(
                regs::CTRL,
                regs::CTRL_PRNGSTART_MASK,
                regs::CTRL_PRNGSTART_MASK,
            );
        }

        self.regs.wait_for_event(
            regs::STATUS,
            regs::STATUS_DONE_MASK,
            regs::STATUS_DONE_MASK,
            RESEED_TIMEOUT_US,
            TrngError::DRIVER_TRNG_RESEED_TIMEOUT,
        )?;

        // SP 800-90B entropy health test verdict.
        if self.regs.read(regs::STATUS) & regs::STATUS_CERTF_MASK != 0 {
            log::error!("entropy health test failed after reseed");
            return Err(TrngError::DRIVER_TRNG_ENTROPY_HEALTH_FAILED);
        }

        self.regs
            .clear_set(regs::CTRL, regs::CTRL_PRNGSTART_MASK, 0);
        Ok(())
    }

    fn reseed_internal_nodf(
        &mut self,
        eseed: Option<&[u8; TRNG_MAX_SEED_LEN]>,
        pstr: Option<&[u8; TRNG_PERS_STR_LEN]>,
        mul: u32,
    ) -> TrngResult<()> {
        match self.version {
            Version::V2 => {
                self.regs.write_masked_checked(
                    regs::CTRL_3,
                    regs::CTRL_3_DLEN_MASK,
                    mul << regs::CTRL_3_DLEN_SHIFT,
                )?;

                let persmask = match pstr {
                    Some(pstr) => {
                        self.regs
                            .write_block(regs::PER_STRING_0, Some(&Array4x12::from(pstr)));
                        0
                    }
                    None => regs::CTRL_PERSODISABLE_MASK,
                };
                self.regs.write_masked_checked(
                    regs::CTRL,
                    regs::CTRL_PERSODISABLE_MASK | regs::CTRL_PRNGSTART_MASK,
                    persmask,
                )?;

                match eseed {
                    Some(seed) => {
                        // Ordering is load-bearing silicon behavior: test
                        // mode first, start second, the serial bits last.
                        self.regs.write_masked_checked(
                            regs::CTRL,
                            regs::CTRL_PRNGMODE_MASK
                                | regs::CTRL_TSTMODE_MASK
                                | regs::CTRL_TRSSEN_MASK,
                            regs::CTRL_TSTMODE_MASK | regs::CTRL_TRSSEN_MASK,
                        )?;
                        self.regs.write_masked_checked(
                            regs::CTRL,
                            regs::CTRL_PRNGSTART_MASK,
                            regs::CTRL_PRNGSTART_MASK,
                        )?;
                        self.regs.write_seed_serial(&seed[..], mul)?;
                    }
                    None => {
                        self.regs.write_masked_checked(
                            regs::OSC_EN,
                            regs::OSC_EN_VAL_MASK,
                            regs::OSC_EN_VAL_MASK,
                        )?;
                        self.regs.write_masked_checked(
                            regs::CTRL,
                            regs::CTRL_PRNGMODE_MASK
                                | regs::CTRL_TRSSEN_MASK
                                | regs::CTRL_PRNGXS_MASK,
                            regs::CTRL_TRSSEN_MASK,
                        )?;
                        self.regs.write_masked_checked(
                            regs::CTRL,
                            regs::CTRL_PRNGSTART_MASK,
                            regs::CTRL_PRNGSTART_MASK,
                        )?;
                    }
                }
                Ok(())
            }
            Version::V1 => {
                let mut entropy = [0u8; TRNG_SEED_LEN];
                let seed_words = match self.usr_cfg.mode {
                    Mode::Hrng => {
                        self.regs.write(regs::OSC_EN, regs::OSC_EN_VAL_MASK);
                        self.regs.soft_reset();
                        self.regs.write(
                            regs::CTRL,
                            regs::CTRL_EUMODE_MASK | regs::CTRL_TRSSEN_MASK,
                        );
                        self.collect_random_buf(&mut entropy)?;
                        check_seed(&entropy)?;
                        Some(Array4x12::from(&entropy))
                    }
                    Mode::Drng => eseed.map(|seed| {
                        Array4x12::from(
                            <&[u8; TRNG_SEED_LEN]>::try_from(&seed[..TRNG_SEED_LEN]).unwrap(),
                        )
                    }),
                    Mode::Ptrng => None,
                };

                self.regs
                    .write_block(regs::EXT_SEED_0, seed_words.as_ref());
                if let Some(pstr) = pstr {
                    self.regs
                        .write_block(regs::PER_STRING_0, Some(&Array4x12::from(pstr)));
                }
                entropy.zeroize();
                Ok(())
            }
        }
    }

    fn reseed_internal_df(
        &mut self,
        eseed: Option<&[u8; TRNG_MAX_SEED_LEN]>,
        pstr: Option<&[u8; TRNG_PERS_STR_LEN]>,
    ) -> TrngResult<()> {
        self.dfin.reset();
        let len = self.len;

        match self.usr_cfg.mode {
            Mode::Hrng => {
                self.regs.write(regs::OSC_EN, regs::OSC_EN_VAL_MASK);
                self.regs.soft_reset();
                self.regs.write(
                    regs::CTRL,
                    regs::CTRL_EUMODE_MASK | regs::CTRL_TRSSEN_MASK,
                );

                let mut entropy = [0u8; MAX_PRE_DF_LEN];
                let result = self
                    .collect_random_buf(&mut entropy[..len])
                    .and_then(|_| check_seed(&entropy[..len]));
                if let Err(err) = result {
                    entropy.zeroize();
                    return Err(err);
                }
                self.dfin.entropy_mut(len).copy_from_slice(&entropy[..len]);
                entropy.zeroize();
            }
            Mode::Drng => {
                if let Some(seed) = eseed {
                    self.dfin.entropy_mut(len).copy_from_slice(&seed[..len]);
                }
            }
            Mode::Ptrng => {}
        }

        self.df
            .derive(&mut self.dfin, len, pstr, DfFlag::Seed, &mut self.dfout);
        self.regs
            .write_block(regs::EXT_SEED_0, Some(&Array4x12::from(&self.dfout)));
        Ok(())
    }

    /// Produce 32 bytes of random data into the head of `buf`.
    ///
    /// `predict` requests prediction resistance: an HRNG instance reseeds
    /// before generating, a DRNG instance fails unless the seed is fresh.
    pub fn generate(&mut self, buf: &mut [u8], predict: bool) -> TrngResult<()> {
        let result = self.try_generate(buf, predict);
        if result.is_err() && self.status != TrngStatus::Catastrophic {
            self.status = TrngStatus::Error;
        }
        result
    }

    fn try_generate(&mut self, buf: &mut [u8], predict: bool) -> TrngResult<()> {
        if buf.len() < TRNG_SEC_STRENGTH_LEN {
            return Err(TrngError::DRIVER_TRNG_INVALID_BUF_LEN);
        }
        if self.status != TrngStatus::Healthy {
            return Err(TrngError::DRIVER_TRNG_INVALID_STATE);
        }
        if self.usr_cfg.mode == Mode::Ptrng && predict {
            return Err(TrngError::DRIVER_TRNG_PREDICT_NOT_ALLOWED);
        }
        if !self.usr_cfg.predict_en && predict {
            return Err(TrngError::DRIVER_TRNG_PREDICT_NOT_ALLOWED);
        }

        let mut len = TRNG_SEC_STRENGTH_LEN;
        match self.usr_cfg.mode {
            Mode::Hrng => {
                if self.stats.elapsed_seed_life >= self.usr_cfg.seed_life {
                    self.reseed_internal(None, None, 0)?;
                }
                if predict && self.stats.elapsed_seed_life > 0 {
                    self.reseed_internal(None, None, 0)?;
                }
                self.regs.write(regs::CTRL, PRNGMODE_GEN);
            }
            Mode::Drng => {
                if self.stats.elapsed_seed_life > self.usr_cfg.seed_life {
                    return Err(TrngError::DRIVER_TRNG_SEED_LIFE_EXCEEDED);
                }
                if predict && self.stats.elapsed_seed_life > 0 {
                    return Err(TrngError::DRIVER_TRNG_PREDICT_NOT_ALLOWED);
                }
                self.regs.write(regs::CTRL, PRNGMODE_GEN);
            }
            Mode::Ptrng => {
                if !self.usr_cfg.df_disable {
                    self.dfin.reset();
                    len = (self.usr_cfg.dfmul as usize + 1) * regs::BYTES_PER_BLOCK;
                    self.len = len;
                }
                // All eight ring oscillators feed the entropy unit.
                self.regs.write(regs::OSC_EN, regs::OSC_EN_VAL_MASK);
                self.regs.soft_reset();
                self.regs.write(
                    regs::CTRL,
                    regs::CTRL_EUMODE_MASK | regs::CTRL_TRSSEN_MASK,
                );
            }
        }

        if self.usr_cfg.mode == Mode::Ptrng && !self.usr_cfg.df_disable {
            let mut entropy = [0u8; MAX_PRE_DF_LEN];
            let result = self.collect_random_buf(&mut entropy[..len]);
            if let Err(err) = result {
                entropy.zeroize();
                return Err(err);
            }
            self.dfin.entropy_mut(len).copy_from_slice(&entropy[..len]);
            entropy.zeroize();
        } else {
            self.collect_random_buf(&mut buf[..TRNG_SEC_STRENGTH_LEN])?;
        }

        self.stats.bytes_reseed += len as u64;
        self.stats.bytes += len as u64;
        self.stats.elapsed_seed_life += 1;

        if self.usr_cfg.mode == Mode::Ptrng && !self.usr_cfg.df_disable {
            self.df.derive(
                &mut self.dfin,
                self.len,
                None,
                DfFlag::Rand,
                &mut buf[..TRNG_SEC_STRENGTH_LEN],
            );
        }
        Ok(())
    }

    /// Drain `dst.len()` bytes of core output, one 16-byte burst at a time.
    ///
    /// The DTF flag and the stuck-output comparison are evaluated per burst;
    /// either transitions the instance to `Catastrophic` and aborts.
    fn collect_random_buf(&mut self, dst: &mut [u8]) -> TrngResult<()> {
        debug_assert_eq!(dst.len() % TRNG_BURST_SIZE, 0);
        let bursts = dst.len() / TRNG_BURST_SIZE;

        self.regs.clear_set(
            regs::CTRL,
            regs::CTRL_PRNGSTART_MASK,
            regs::CTRL_PRNGSTART_MASK,
        );

        // Each burst yields 128 bits, reported as a QCNT of 4.
        for bcnt in 0..bursts {
            if self
                .regs
                .wait_for_event(
                    regs::STATUS,
                    regs::STATUS_QCNT_MASK,
                    regs::MAX_QCNT << regs::STATUS_QCNT_SHIFT,
                    GENERATE_TIMEOUT_US,
                    TrngError::DRIVER_TRNG_GENERATE_TIMEOUT,
                )
                .is_err()
            {
                log::error!("timeout waiting for randomness");
                return Err(TrngError::DRIVER_TRNG_GENERATE_TIMEOUT);
            }

            // A DTF assertion during generate is unrecoverable, except in
            // PTRNG mode where the raw entropy stream is expected to fail
            // deterministic tests.
            if self.usr_cfg.mode != Mode::Ptrng
                && self.regs.read(regs::STATUS) & regs::STATUS_DTF_MASK != 0
            {
                log::error!("catastrophic DTF error");
                self.status = TrngStatus::Catastrophic;
                return Err(TrngError::DRIVER_TRNG_DTF_FAILURE);
            }

            let mut words = [0u32; WORDS_PER_BURST];
            for word in words.iter_mut() {
                *word = self.regs.read(regs::CORE_OUTPUT);
            }
            let repeated = bcnt > 0 && words == self.burst;
            self.burst = words;

            let bytes: [u8; TRNG_BURST_SIZE] = Array4x4::from(words).into();
            dst[bcnt * TRNG_BURST_SIZE..][..TRNG_BURST_SIZE].copy_from_slice(&bytes);

            if bursts > 1 && repeated {
                log::error!("catastrophic stuck core output");
                self.status = TrngStatus::Catastrophic;
                return Err(TrngError::DRIVER_TRNG_DUPLICATE_BURST);
            }
        }
        Ok(())
    }

    /// Zero the seed and personalization registers, assert reset, and wipe
    /// every in-memory secret. The instance returns to `Uninitialized`.
    pub fn release(&mut self) -> TrngResult<()> {
        if self.status == TrngStatus::Uninitialized {
            self.status = TrngStatus::Error;
            return Err(TrngError::DRIVER_TRNG_INVALID_STATE);
        }

        self.regs.write_block(regs::EXT_SEED_0, None);
        self.regs.write_block(regs::PER_STRING_0, None);
        self.regs.hold_reset();

        self.usr_cfg.init_seed.zeroize();
        self.usr_cfg.pstr.zeroize();
        self.usr_cfg = UsrCfg::default();
        self.burst.zeroize();
        self.dfin.zeroize();
        self.dfout.zeroize();
        self.df.zeroize();

        self.status = TrngStatus::Uninitialized;
        Ok(())
    }
}

/// Reject seed material showing the trivial oscillator failure patterns.
fn check_seed(entropy: &[u8]) -> TrngResult<()> {
    for chunk in entropy.chunks_exact(4) {
        let word = u32::from_be_bytes(chunk.try_into().unwrap());
        if word == ALL_A_PATTERN_32 || word == ALL_5_PATTERN_32 {
            return Err(TrngError::DRIVER_TRNG_TRIVIAL_SEED_PATTERN);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Register window that completes every reseed immediately.
    struct TestMmio {
        regs: [u32; 64],
    }

    impl TestMmio {
        fn new() -> Self {
            Self { regs: [0; 64] }
        }
    }

    impl Mmio for TestMmio {
        fn read_reg(&mut self, offset: u32) -> u32 {
            if offset == regs::STATUS {
                regs::STATUS_DONE_MASK
            } else {
                self.regs[(offset / 4) as usize]
            }
        }

        fn write_reg(&mut self, offset: u32, val: u32) {
            self.regs[(offset / 4) as usize] = val;
        }

        fn delay_us(&mut self, _micros: u32) {}
    }

    fn drng_cfg() -> UsrCfg {
        let mut cfg = UsrCfg {
            mode: Mode::Drng,
            seed_life: 5,
            dfmul: 2,
            iseed_en: true,
            pstr_en: true,
            ..Default::default()
        };
        for (i, b) in cfg.init_seed.iter_mut().enumerate() {
            *b = i as u8 ^ 0x5C;
        }
        cfg.pstr = [0x11; TRNG_PERS_STR_LEN];
        cfg
    }

    #[test]
    fn test_ptrng_rejects_seeded_options() {
        let mut trng = VersalTrng::new(TestMmio::new(), Version::V1);
        let cfg = UsrCfg {
            mode: Mode::Ptrng,
            dfmul: 2,
            predict_en: true,
            ..Default::default()
        };
        assert_eq!(
            trng.instantiate(&cfg),
            Err(TrngError::DRIVER_TRNG_INVALID_PTRNG_CFG)
        );
        assert_eq!(trng.status(), TrngStatus::Error);
    }

    #[test]
    fn test_drng_requires_initial_seed() {
        let mut trng = VersalTrng::new(TestMmio::new(), Version::V1);
        let cfg = UsrCfg {
            mode: Mode::Drng,
            seed_life: 5,
            dfmul: 2,
            ..Default::default()
        };
        assert_eq!(
            trng.instantiate(&cfg),
            Err(TrngError::DRIVER_TRNG_INVALID_SEED_CFG)
        );
    }

    #[test]
    fn test_hrng_forbids_initial_seed() {
        let mut trng = VersalTrng::new(TestMmio::new(), Version::V1);
        let cfg = UsrCfg {
            mode: Mode::Hrng,
            seed_life: 10,
            dfmul: 7,
            iseed_en: true,
            ..Default::default()
        };
        assert_eq!(
            trng.instantiate(&cfg),
            Err(TrngError::DRIVER_TRNG_INVALID_SEED_CFG)
        );
    }

    #[test]
    fn test_dfmul_domain() {
        for dfmul in [1, 10] {
            let mut trng = VersalTrng::new(TestMmio::new(), Version::V1);
            let cfg = UsrCfg {
                dfmul,
                ..drng_cfg()
            };
            assert_eq!(
                trng.instantiate(&cfg),
                Err(TrngError::DRIVER_TRNG_INVALID_DFMUL)
            );
        }

        let mut trng = VersalTrng::new(TestMmio::new(), Version::V1);
        let cfg = UsrCfg {
            df_disable: true,
            dfmul: 2,
            ..drng_cfg()
        };
        assert_eq!(
            trng.instantiate(&cfg),
            Err(TrngError::DRIVER_TRNG_INVALID_DFMUL)
        );
    }

    #[test]
    fn test_seed_life_required_outside_ptrng() {
        let mut trng = VersalTrng::new(TestMmio::new(), Version::V1);
        let cfg = UsrCfg {
            seed_life: 0,
            ..drng_cfg()
        };
        assert_eq!(
            trng.instantiate(&cfg),
            Err(TrngError::DRIVER_TRNG_INVALID_SEED_LIFE)
        );
    }

    #[test]
    fn test_generate_requires_healthy_instance() {
        let mut trng = VersalTrng::new(TestMmio::new(), Version::V1);
        let mut buf = [0u8; 32];
        assert_eq!(
            trng.generate(&mut buf, false),
            Err(TrngError::DRIVER_TRNG_INVALID_STATE)
        );
    }

    #[test]
    fn test_generate_rejects_short_buffer() {
        let mut trng = VersalTrng::new(TestMmio::new(), Version::V1);
        let mut buf = [0u8; 16];
        assert_eq!(
            trng.generate(&mut buf, false),
            Err(TrngError::DRIVER_TRNG_INVALID_BUF_LEN)
        );
    }

    #[test]
    fn test_release_wipes_in_memory_secrets() {
        let mut trng = VersalTrng::new(TestMmio::new(), Version::V1);
        trng.instantiate(&drng_cfg()).unwrap();
        assert_eq!(trng.status(), TrngStatus::Healthy);
        assert_ne!(trng.dfout, [0u8; SEED_LEN]);

        trng.release().unwrap();
        assert_eq!(trng.status(), TrngStatus::Uninitialized);
        assert_eq!(trng.usr_cfg.init_seed, [0u8; TRNG_MAX_SEED_LEN]);
        assert_eq!(trng.usr_cfg.pstr, [0u8; TRNG_PERS_STR_LEN]);
        assert_eq!(trng.dfout, [0u8; SEED_LEN]);
        assert_eq!(trng.burst, [0u32; 4]);
    }

    #[test]
    fn test_release_requires_instantiated_device() {
        let mut trng = VersalTrng::new(TestMmio::new(), Version::V1);
        assert_eq!(trng.release(), Err(TrngError::DRIVER_TRNG_INVALID_STATE));
    }

    #[test]
    fn test_check_seed_rejects_trivial_patterns() {
        let mut entropy = [0x17u8; 48];
        assert!(check_seed(&entropy).is_ok());
        entropy[8..12].fill(0xAA);
        assert_eq!(
            check_seed(&entropy),
            Err(TrngError::DRIVER_TRNG_TRIVIAL_SEED_PATTERN)
        );
        entropy[8..12].fill(0x55);
        assert_eq!(
            check_seed(&entropy),
            Err(TrngError::DRIVER_TRNG_TRIVIAL_SEED_PATTERN)
        );
    }
}
