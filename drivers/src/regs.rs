/*++

Licensed under the Apache-2.0 license.

File Name:

    regs.rs

Abstract:

    File contains the Versal TRNG register map and the typed register access
    layer used by the engine.

--*/

use crate::{Array4x12, Mmio};
use versal_trng_error::{TrngError, TrngResult};

pub(crate) const STATUS: u32 = 0x04;
pub(crate) const STATUS_QCNT_SHIFT: u32 = 9;
pub(crate) const STATUS_QCNT_MASK: u32 = 0x0000_0E00;
pub(crate) const STATUS_CERTF_MASK: u32 = 1 << 3;
pub(crate) const STATUS_DTF_MASK: u32 = 1 << 1;
pub(crate) const STATUS_DONE_MASK: u32 = 1 << 0;

pub(crate) const CTRL: u32 = 0x08;
pub(crate) const CTRL_PERSODISABLE_MASK: u32 = 1 << 10;
pub(crate) const CTRL_EUMODE_MASK: u32 = 1 << 8;
pub(crate) const CTRL_PRNGMODE_MASK: u32 = 1 << 7;
pub(crate) const CTRL_TSTMODE_MASK: u32 = 1 << 6;
pub(crate) const CTRL_PRNGSTART_MASK: u32 = 1 << 5;
pub(crate) const CTRL_PRNGXS_MASK: u32 = 1 << 3;
pub(crate) const CTRL_TRSSEN_MASK: u32 = 1 << 2;
pub(crate) const CTRL_PRNGSRST_MASK: u32 = 1 << 0;

pub(crate) const CTRL_2: u32 = 0x0C;
pub(crate) const CTRL_2_RCTCUTOFF_SHIFT: u32 = 8;
pub(crate) const CTRL_2_RCTCUTOFF_MASK: u32 = 0x0001_FF00;
pub(crate) const CTRL_2_RCTCUTOFF_DEFVAL: u32 = 0x21;
pub(crate) const CTRL_2_DIT_SHIFT: u32 = 0;
pub(crate) const CTRL_2_DIT_MASK: u32 = 0x0000_001F;
pub(crate) const CTRL_2_DIT_DEFVAL: u32 = 0xC;

pub(crate) const CTRL_3: u32 = 0x10;
pub(crate) const CTRL_3_APTCUTOFF_SHIFT: u32 = 8;
pub(crate) const CTRL_3_APTCUTOFF_MASK: u32 = 0x0003_FF00;
pub(crate) const CTRL_3_APTCUTOFF_DEFVAL: u32 = 0x264;
pub(crate) const CTRL_3_DLEN_SHIFT: u32 = 0;
pub(crate) const CTRL_3_DLEN_MASK: u32 = 0x0000_00FF;

pub(crate) const CTRL_4: u32 = 0x14;

pub(crate) const EXT_SEED_0: u32 = 0x40;
pub(crate) const PER_STRING_0: u32 = 0x80;
pub(crate) const CORE_OUTPUT: u32 = 0xC0;

pub(crate) const RESET: u32 = 0xD0;
pub(crate) const RESET_VAL_MASK: u32 = 1 << 0;
pub(crate) const OSC_EN: u32 = 0xD4;
pub(crate) const OSC_EN_VAL_MASK: u32 = 1 << 0;

/// Number of 32-bit registers in the seed and personalization banks.
pub(crate) const NUM_INIT_REGS: usize = 12;
pub(crate) const BYTES_PER_REG: usize = 4;
pub(crate) const BYTES_PER_BLOCK: usize = 16;
pub(crate) const MAX_QCNT: u32 = 4;

pub(crate) const RESET_DELAY_US: u32 = 10;
/// Hardware settling after each serially clocked seed byte (>= 2 clocks).
const SERIAL_BYTE_SETTLE_US: u32 = 2;
/// Hardware settling after each 8-byte group (>= 700 clocks).
const SERIAL_GROUP_SETTLE_US: u32 = 10;
const SERIAL_GROUP_LEN: usize = 8;

/// Typed access to the TRNG register window.
///
/// Owns the `Mmio` port and knows the packing rules for the seed and
/// personalization banks, the V2 serial seed interface, and the timed polls.
pub(crate) struct TrngRegisters<M: Mmio> {
    mmio: M,
}

impl<M: Mmio> TrngRegisters<M> {
    pub fn new(mmio: M) -> Self {
        Self { mmio }
    }

    pub fn read(&mut self, offset: u32) -> u32 {
        self.mmio.read_reg(offset)
    }

    pub fn write(&mut self, offset: u32, val: u32) {
        self.mmio.write_reg(offset, val)
    }

    pub fn delay_us(&mut self, micros: u32) {
        self.mmio.delay_us(micros)
    }

    /// Read-modify-write of the bits selected by `mask`.
    pub fn clear_set(&mut self, offset: u32, mask: u32, val: u32) {
        let old = self.mmio.read_reg(offset);
        self.mmio.write_reg(offset, (old & !mask) | (mask & val));
    }

    /// Masked write with read-back verification, required on V2 control
    /// registers.
    pub fn write_masked_checked(&mut self, offset: u32, mask: u32, val: u32) -> TrngResult<()> {
        self.clear_set(offset, mask, val);
        if self.mmio.read_reg(offset) & mask != mask & val {
            log::error!("register {:#x} did not accept masked write", offset);
            return Err(TrngError::DRIVER_TRNG_REG_WRITE_VERIFY);
        }
        Ok(())
    }

    /// Load a 12-register bank (seed or personalization string).
    ///
    /// The byte stream is grouped into 4-byte big-endian words, and the bank
    /// is filled in reverse word order: input word `i` lands at
    /// `start + (11 - i) * 4`. `None` zeroes the bank.
    pub fn write_block(&mut self, start: u32, words: Option<&Array4x12>) {
        match words {
            None => {
                for i in 0..NUM_INIT_REGS {
                    self.mmio
                        .write_reg(start + (i * BYTES_PER_REG) as u32, 0);
                }
            }
            Some(words) => {
                for (i, &word) in words.0.iter().enumerate() {
                    let offset =
                        start + ((NUM_INIT_REGS - 1 - i) * BYTES_PER_REG) as u32;
                    self.mmio.write_reg(offset, word);
                }
            }
        }
    }

    /// Serially clock a seed into the V2 `CTRL_4` interface, MSB first.
    ///
    /// Each bit is read back and the byte reconstructed from the echoed bits
    /// must match the source byte, otherwise the load aborts. The total
    /// length is `(dlen + 1) * 16` bytes.
    pub fn write_seed_serial(&mut self, seed: &[u8], dlen: u32) -> TrngResult<()> {
        let seed_len = (dlen as usize + 1) * BYTES_PER_BLOCK;
        if seed.len() < seed_len {
            return Err(TrngError::DRIVER_TRNG_INVALID_SEED_LEN);
        }

        for (idx, &byte) in seed[..seed_len].iter().enumerate() {
            let mut reconstructed: u8 = 0;
            for cnt in 0..8 {
                let bit = u32::from(byte >> (7 - cnt)) & 1;
                self.mmio.write_reg(CTRL_4, bit);
                let echoed = self.mmio.read_reg(CTRL_4) & 1;
                reconstructed = (reconstructed << 1) | echoed as u8;
            }
            if reconstructed != byte {
                log::error!("serial seed write-back mismatch at byte {}", idx);
                return Err(TrngError::DRIVER_TRNG_SERIAL_SEED_VERIFY);
            }
            self.mmio.delay_us(SERIAL_BYTE_SETTLE_US);
            if idx % SERIAL_GROUP_LEN == 0 {
                self.mmio.delay_us(SERIAL_GROUP_SETTLE_US);
            }
        }
        Ok(())
    }

    /// Poll `offset` until `(value & mask) == expected` or `timeout_us`
    /// elapses.
    ///
    /// The register is sampled once more after the deadline: the host may
    /// have descheduled this thread between the last in-loop sample and the
    /// deadline check, and the event may have arrived in the meantime.
    pub fn wait_for_event(
        &mut self,
        offset: u32,
        mask: u32,
        expected: u32,
        timeout_us: u32,
        err: TrngError,
    ) -> TrngResult<()> {
        let mut remaining = timeout_us;
        loop {
            if self.mmio.read_reg(offset) & mask == expected {
                return Ok(());
            }
            if remaining == 0 {
                break;
            }
            self.mmio.delay_us(1);
            remaining -= 1;
        }
        if self.mmio.read_reg(offset) & mask == expected {
            return Ok(());
        }
        Err(err)
    }

    /// Pulse the PRNG soft reset.
    pub fn soft_reset(&mut self) {
        self.clear_set(CTRL, CTRL_PRNGSRST_MASK, CTRL_PRNGSRST_MASK);
        self.mmio.delay_us(RESET_DELAY_US);
        self.clear_set(CTRL, CTRL_PRNGSRST_MASK, 0);
    }

    /// Pulse the block reset, then the PRNG soft reset.
    pub fn reset(&mut self) {
        self.mmio.write_reg(RESET, RESET_VAL_MASK);
        self.mmio.delay_us(RESET_DELAY_US);
        self.mmio.write_reg(RESET, 0);
        self.soft_reset();
    }

    /// Assert both resets and leave them asserted.
    pub fn hold_reset(&mut self) {
        self.clear_set(CTRL, CTRL_PRNGSRST_MASK, CTRL_PRNGSRST_MASK);
        self.mmio.write_reg(RESET, RESET_VAL_MASK);
        self.mmio.delay_us(RESET_DELAY_US);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct SeqMmio {
        reads: Vec<u32>,
        read_idx: usize,
        writes: Vec<(u32, u32)>,
        delays_us: u32,
    }

    impl SeqMmio {
        fn with_reads(reads: Vec<u32>) -> Self {
            Self {
                reads,
                ..Default::default()
            }
        }
    }

    impl Mmio for SeqMmio {
        fn read_reg(&mut self, _offset: u32) -> u32 {
            let val = self
                .reads
                .get(self.read_idx)
                .or(self.reads.last())
                .copied()
                .unwrap_or(0);
            self.read_idx += 1;
            val
        }

        fn write_reg(&mut self, offset: u32, val: u32) {
            self.writes.push((offset, val));
        }

        fn delay_us(&mut self, micros: u32) {
            self.delays_us += micros;
        }
    }

    #[test]
    fn test_write_block_reverse_word_order() {
        let mut bytes = [0u8; 48];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8;
        }
        let mut regs = TrngRegisters::new(SeqMmio::default());
        regs.write_block(EXT_SEED_0, Some(&Array4x12::from(&bytes)));

        let writes = &regs.mmio.writes;
        assert_eq!(writes.len(), 12);
        // Word 0 of the input lands in the last register of the bank.
        assert_eq!(writes[0], (EXT_SEED_0 + 11 * 4, 0x0001_0203));
        assert_eq!(writes[11], (EXT_SEED_0, 0x2c2d_2e2f));
    }

    #[test]
    fn test_write_block_none_zeroes_forward() {
        let mut regs = TrngRegisters::new(SeqMmio::default());
        regs.write_block(PER_STRING_0, None);
        let writes = &regs.mmio.writes;
        assert_eq!(writes.len(), 12);
        assert_eq!(writes[0], (PER_STRING_0, 0));
        assert_eq!(writes[11], (PER_STRING_0 + 11 * 4, 0));
    }

    #[test]
    fn test_wait_for_event_rereads_after_deadline() {
        // Event only becomes visible on the post-deadline sample.
        let mut regs = TrngRegisters::new(SeqMmio::with_reads(vec![0, 0, 0, STATUS_DONE_MASK]));
        let res = regs.wait_for_event(
            STATUS,
            STATUS_DONE_MASK,
            STATUS_DONE_MASK,
            2,
            TrngError::DRIVER_TRNG_RESEED_TIMEOUT,
        );
        assert_eq!(res, Ok(()));
        assert_eq!(regs.mmio.read_idx, 4);
    }

    #[test]
    fn test_wait_for_event_timeout() {
        let mut regs = TrngRegisters::new(SeqMmio::with_reads(vec![0]));
        let res = regs.wait_for_event(
            STATUS,
            STATUS_DONE_MASK,
            STATUS_DONE_MASK,
            2,
            TrngError::DRIVER_TRNG_RESEED_TIMEOUT,
        );
        assert_eq!(res, Err(TrngError::DRIVER_TRNG_RESEED_TIMEOUT));
        assert_eq!(regs.mmio.delays_us, 2);
    }

    #[test]
    fn test_write_masked_checked_detects_stuck_bits() {
        // Reads: initial RMW read, then the verification read with the
        // requested bit missing.
        let mut regs = TrngRegisters::new(SeqMmio::with_reads(vec![0, 0]));
        let res = regs.write_masked_checked(CTRL, CTRL_PRNGSTART_MASK, CTRL_PRNGSTART_MASK);
        assert_eq!(res, Err(TrngError::DRIVER_TRNG_REG_WRITE_VERIFY));
    }

    #[test]
    fn test_serial_seed_length_check() {
        let mut regs = TrngRegisters::new(SeqMmio::default());
        let short = [0u8; 15];
        assert_eq!(
            regs.write_seed_serial(&short, 0),
            Err(TrngError::DRIVER_TRNG_INVALID_SEED_LEN)
        );
    }

    #[test]
    fn test_serial_seed_bit_stream() {
        // The mmio echoes 0 for every bit read-back; a 0xFF byte therefore
        // reconstructs as 0x00 and the verification aborts the load.
        let mut regs = TrngRegisters::new(SeqMmio::with_reads(vec![0]));
        let seed = [0xFFu8; 16];
        assert_eq!(
            regs.write_seed_serial(&seed, 0),
            Err(TrngError::DRIVER_TRNG_SERIAL_SEED_VERIFY)
        );
        // 8 bit writes for the first byte before the abort.
        assert_eq!(regs.mmio.writes.len(), 8);
        assert!(regs.mmio.writes.iter().all(|&(off, val)| off == CTRL_4 && val == 1));
    }
}
