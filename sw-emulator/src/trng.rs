/*++

Licensed under the Apache-2.0 license.

File Name:

    trng.rs

Abstract:

    File contains a behavioral model of the Versal PMC TRNG register
    interface. Random output is served from caller-provided word iterators
    (one for the DRBG, one for the digitized entropy source), which makes
    known-answer replay and fault scenarios deterministic.

--*/

use std::collections::VecDeque;
use std::fmt::Write;

use tock_registers::{register_bitfields, LocalRegisterCopy};

use crate::bus::{Bus, BusError};
use crate::testing::Log;

register_bitfields![u32,
    CTRL [
        PRNGSRST OFFSET(0) NUMBITS(1) [],
        TRSSEN OFFSET(2) NUMBITS(1) [],
        PRNGXS OFFSET(3) NUMBITS(1) [],
        PRNGSTART OFFSET(5) NUMBITS(1) [],
        TSTMODE OFFSET(6) NUMBITS(1) [],
        PRNGMODE OFFSET(7) NUMBITS(1) [],
        EUMODE OFFSET(8) NUMBITS(1) [],
        SINGLEGENMODE OFFSET(9) NUMBITS(1) [],
        PERSODISABLE OFFSET(10) NUMBITS(1) [],
    ],
    STATUS [
        DONE OFFSET(0) NUMBITS(1) [],
        DTF OFFSET(1) NUMBITS(1) [],
        CERTF OFFSET(3) NUMBITS(1) [],
        QCNT OFFSET(9) NUMBITS(3) [],
    ],
    CTRL_3 [
        DLEN OFFSET(0) NUMBITS(8) [],
        APTCUTOFF OFFSET(8) NUMBITS(10) [],
    ],
];

const STATUS_ADDR: u32 = 0x04;
const CTRL_ADDR: u32 = 0x08;
const CTRL_2_ADDR: u32 = 0x0C;
const CTRL_3_ADDR: u32 = 0x10;
const CTRL_4_ADDR: u32 = 0x14;
const EXT_SEED_START: u32 = 0x40;
const EXT_SEED_END: u32 = 0x6C;
const PER_STRING_START: u32 = 0x80;
const PER_STRING_END: u32 = 0xAC;
const CORE_OUTPUT_ADDR: u32 = 0xC0;
const RESET_ADDR: u32 = 0xD0;
const OSC_EN_ADDR: u32 = 0xD4;

const WORDS_PER_BURST: usize = 4;
const BYTES_PER_BLOCK: usize = 16;
/// Served when the output FIFO is drained dry.
const EMPTY_FIFO_WORD: u32 = 0xCAFE_F00D;

#[derive(Default)]
struct SerialCapture {
    active: bool,
    bit_index: usize,
    cur_byte: u8,
    cur_bits: u8,
    bytes: Vec<u8>,
}

/// Behavioral model of the TRNG peripheral.
pub struct VersalTrngPeriph {
    ctrl: LocalRegisterCopy<u32, CTRL::Register>,
    ctrl2: u32,
    ctrl3: LocalRegisterCopy<u32, CTRL_3::Register>,
    ctrl4_bit: u32,
    ext_seed: [u32; 12],
    per_string: [u32; 12],
    reset: u32,
    osc_en: u32,

    reseed_done: bool,
    certf: bool,
    dtf: bool,
    suppress_done: bool,
    corrupt_serial_bit: Option<usize>,

    burst_queue: VecDeque<u32>,
    drbg_words: Box<dyn Iterator<Item = u32>>,
    entropy_words: Box<dyn Iterator<Item = u32>>,
    serial: SerialCapture,

    log: Log,
}

impl VersalTrngPeriph {
    /// `drbg_words` backs the DRBG output path, `entropy_words` the
    /// digitized ring-oscillator output.
    pub fn new(
        drbg_words: Box<dyn Iterator<Item = u32>>,
        entropy_words: Box<dyn Iterator<Item = u32>>,
    ) -> Self {
        Self {
            ctrl: LocalRegisterCopy::new(0),
            ctrl2: 0,
            ctrl3: LocalRegisterCopy::new(0),
            ctrl4_bit: 0,
            ext_seed: [0; 12],
            per_string: [0; 12],
            reset: 0,
            osc_en: 0,
            reseed_done: false,
            certf: false,
            dtf: false,
            suppress_done: false,
            corrupt_serial_bit: None,
            burst_queue: VecDeque::new(),
            drbg_words,
            entropy_words,
            serial: SerialCapture::default(),
            log: Log::new(),
        }
    }

    /// Latch the SP 800-90B health failure flag.
    pub fn force_certf(&mut self) {
        self.certf = true;
    }

    /// Latch the deterministic-test-fail flag.
    pub fn force_dtf(&mut self) {
        self.dtf = true;
    }

    /// Never report reseed completion.
    pub fn suppress_done(&mut self) {
        self.suppress_done = true;
    }

    /// Invert one echoed bit of the current serial seed load, counted from
    /// the start of the load.
    pub fn corrupt_serial_bit(&mut self, bit_index: usize) {
        self.corrupt_serial_bit = Some(bit_index);
    }

    pub fn ext_seed(&self) -> [u32; 12] {
        self.ext_seed
    }

    pub fn per_string(&self) -> [u32; 12] {
        self.per_string
    }

    pub fn reset_asserted(&self) -> bool {
        self.reset & 1 != 0
    }

    /// Bytes reconstructed from the most recent serial seed load.
    pub fn captured_serial_seed(&self) -> &[u8] {
        &self.serial.bytes
    }

    pub fn dlen(&self) -> u32 {
        self.ctrl3.read(CTRL_3::DLEN)
    }

    /// Shared write log; every register write is recorded as
    /// `NAME <- value` except the bit-serial seed stream.
    pub fn log(&self) -> Log {
        self.log.clone()
    }

    fn read_status(&mut self) -> u32 {
        self.refill_queue();
        let mut status = LocalRegisterCopy::<u32, STATUS::Register>::new(0);
        status.modify(STATUS::QCNT.val(self.burst_queue.len() as u32));
        if self.reseed_done {
            status.modify(STATUS::DONE::SET);
        }
        if self.certf {
            status.modify(STATUS::CERTF::SET);
        }
        if self.dtf {
            status.modify(STATUS::DTF::SET);
        }
        status.get()
    }

    fn refill_queue(&mut self) {
        if !self.burst_queue.is_empty() || !self.ctrl.is_set(CTRL::PRNGSTART) {
            return;
        }
        let source = if self.ctrl.is_set(CTRL::EUMODE) {
            &mut self.entropy_words
        } else if self.ctrl.is_set(CTRL::PRNGMODE) {
            &mut self.drbg_words
        } else {
            return;
        };
        for _ in 0..WORDS_PER_BURST {
            match source.next() {
                Some(word) => self.burst_queue.push_back(word),
                // Partial bursts never reach a QCNT of 4.
                None => break,
            }
        }
    }

    fn write_ctrl(&mut self, val: u32) {
        let new = LocalRegisterCopy::<u32, CTRL::Register>::new(val);
        let was_started = self.ctrl.is_set(CTRL::PRNGSTART);
        if new.is_set(CTRL::PRNGSRST) && !self.ctrl.is_set(CTRL::PRNGSRST) {
            self.burst_queue.clear();
            self.reseed_done = false;
        }
        self.ctrl = new;
        if new.is_set(CTRL::PRNGSTART) && !was_started {
            self.on_prng_start();
        }
    }

    fn on_prng_start(&mut self) {
        if self.ctrl.is_set(CTRL::EUMODE) || self.ctrl.is_set(CTRL::PRNGMODE) {
            // Output request; the FIFO refills on demand.
            return;
        }
        self.reseed_done = false;
        if self.ctrl.is_set(CTRL::TSTMODE) {
            // Seed arrives bit-serially through CTRL_4.
            self.serial = SerialCapture {
                active: true,
                ..Default::default()
            };
        } else {
            self.complete_reseed();
        }
    }

    fn complete_reseed(&mut self) {
        if !self.suppress_done {
            self.reseed_done = true;
        }
    }

    fn write_serial_bit(&mut self, val: u32) {
        let bit = val & 1;
        let latched = match self.corrupt_serial_bit {
            Some(target) if target == self.serial.bit_index => bit ^ 1,
            _ => bit,
        };
        self.ctrl4_bit = latched;
        if !self.serial.active {
            return;
        }
        self.serial.bit_index += 1;
        self.serial.cur_byte = (self.serial.cur_byte << 1) | latched as u8;
        self.serial.cur_bits += 1;
        if self.serial.cur_bits == 8 {
            let byte = self.serial.cur_byte;
            self.serial.bytes.push(byte);
            self.serial.cur_bits = 0;
            self.serial.cur_byte = 0;

            let seed_len = (self.ctrl3.read(CTRL_3::DLEN) as usize + 1) * BYTES_PER_BLOCK;
            if self.serial.bytes.len() == seed_len {
                self.serial.active = false;
                self.complete_reseed();
            }
        }
    }

    fn block_reset(&mut self) {
        self.ctrl = LocalRegisterCopy::new(0);
        self.ctrl4_bit = 0;
        self.burst_queue.clear();
        self.reseed_done = false;
        self.serial = SerialCapture::default();
    }
}

impl Bus for VersalTrngPeriph {
    fn read(&mut self, addr: u32) -> Result<u32, BusError> {
        match addr {
            STATUS_ADDR => Ok(self.read_status()),
            CTRL_ADDR => Ok(self.ctrl.get()),
            CTRL_2_ADDR => Ok(self.ctrl2),
            CTRL_3_ADDR => Ok(self.ctrl3.get()),
            CTRL_4_ADDR => Ok(self.ctrl4_bit),
            EXT_SEED_START..=EXT_SEED_END => {
                Ok(self.ext_seed[((addr - EXT_SEED_START) / 4) as usize])
            }
            PER_STRING_START..=PER_STRING_END => {
                Ok(self.per_string[((addr - PER_STRING_START) / 4) as usize])
            }
            CORE_OUTPUT_ADDR => Ok(self.burst_queue.pop_front().unwrap_or(EMPTY_FIFO_WORD)),
            RESET_ADDR => Ok(self.reset),
            OSC_EN_ADDR => Ok(self.osc_en),
            _ => Err(BusError::LoadAccessFault),
        }
    }

    fn write(&mut self, addr: u32, val: u32) -> Result<(), BusError> {
        match addr {
            CTRL_ADDR => {
                writeln!(self.log.w(), "CTRL <- {val:#010x}").unwrap();
                self.write_ctrl(val);
            }
            CTRL_2_ADDR => {
                writeln!(self.log.w(), "CTRL_2 <- {val:#010x}").unwrap();
                self.ctrl2 = val;
            }
            CTRL_3_ADDR => {
                writeln!(self.log.w(), "CTRL_3 <- {val:#010x}").unwrap();
                self.ctrl3.set(val);
            }
            CTRL_4_ADDR => self.write_serial_bit(val),
            EXT_SEED_START..=EXT_SEED_END => {
                let index = ((addr - EXT_SEED_START) / 4) as usize;
                writeln!(self.log.w(), "EXT_SEED[{index}] <- {val:#010x}").unwrap();
                self.ext_seed[index] = val;
            }
            PER_STRING_START..=PER_STRING_END => {
                let index = ((addr - PER_STRING_START) / 4) as usize;
                writeln!(self.log.w(), "PER_STRING[{index}] <- {val:#010x}").unwrap();
                self.per_string[index] = val;
            }
            RESET_ADDR => {
                writeln!(self.log.w(), "RESET <- {val:#010x}").unwrap();
                self.reset = val;
                if val & 1 != 0 {
                    self.block_reset();
                }
            }
            OSC_EN_ADDR => {
                writeln!(self.log.w(), "OSC_EN <- {val:#010x}").unwrap();
                self.osc_en = val;
            }
            _ => return Err(BusError::StoreAccessFault),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty() -> Box<dyn Iterator<Item = u32>> {
        Box::new(std::iter::empty())
    }

    fn periph_with_drbg(words: Vec<u32>) -> VersalTrngPeriph {
        VersalTrngPeriph::new(Box::new(words.into_iter()), empty())
    }

    #[test]
    fn test_parallel_reseed_sets_done() {
        let mut dev = periph_with_drbg(vec![]);
        // Reseed command: PRNGSTART with neither EUMODE nor PRNGMODE.
        dev.write(CTRL_ADDR, 1 << 5).unwrap();
        assert_eq!(dev.read(STATUS_ADDR).unwrap() & 1, 1);
    }

    #[test]
    fn test_generate_serves_words_in_order() {
        let mut dev = periph_with_drbg(vec![1, 2, 3, 4, 5, 6, 7, 8]);
        // PRNGMODE + PRNGSTART.
        dev.write(CTRL_ADDR, (1 << 7) | (1 << 5)).unwrap();
        let status = dev.read(STATUS_ADDR).unwrap();
        assert_eq!((status >> 9) & 0x7, 4);
        for expected in 1..=4 {
            assert_eq!(dev.read(CORE_OUTPUT_ADDR).unwrap(), expected);
        }
        // Second burst refills on the next status read.
        assert_eq!((dev.read(STATUS_ADDR).unwrap() >> 9) & 0x7, 4);
        for expected in 5..=8 {
            assert_eq!(dev.read(CORE_OUTPUT_ADDR).unwrap(), expected);
        }
        assert_eq!(dev.read(CORE_OUTPUT_ADDR).unwrap(), EMPTY_FIFO_WORD);
    }

    #[test]
    fn test_exhausted_source_never_reports_full_burst() {
        let mut dev = periph_with_drbg(vec![1, 2]);
        dev.write(CTRL_ADDR, (1 << 7) | (1 << 5)).unwrap();
        assert_eq!((dev.read(STATUS_ADDR).unwrap() >> 9) & 0x7, 2);
    }

    #[test]
    fn test_serial_seed_capture() {
        let mut dev = periph_with_drbg(vec![]);
        // DLEN = 0: 16-byte seed.
        dev.write(CTRL_3_ADDR, 0).unwrap();
        // TSTMODE reseed start.
        dev.write(CTRL_ADDR, 1 << 6).unwrap();
        dev.write(CTRL_ADDR, (1 << 6) | (1 << 5)).unwrap();

        let seed: Vec<u8> = (0u8..16).map(|i| i.wrapping_mul(0x3B)).collect();
        for &byte in &seed {
            for bit in 0..8 {
                let val = u32::from(byte >> (7 - bit)) & 1;
                dev.write(CTRL_4_ADDR, val).unwrap();
                assert_eq!(dev.read(CTRL_4_ADDR).unwrap(), val);
            }
        }
        assert_eq!(dev.captured_serial_seed(), &seed[..]);
        assert_eq!(dev.read(STATUS_ADDR).unwrap() & 1, 1);
    }

    #[test]
    fn test_corrupted_serial_bit_is_echoed() {
        let mut dev = periph_with_drbg(vec![]);
        dev.corrupt_serial_bit(3);
        dev.write(CTRL_3_ADDR, 0).unwrap();
        dev.write(CTRL_ADDR, (1 << 6) | (1 << 5)).unwrap();

        for bit in 0..8 {
            dev.write(CTRL_4_ADDR, 0).unwrap();
            let echoed = dev.read(CTRL_4_ADDR).unwrap();
            assert_eq!(echoed, u32::from(bit == 3));
        }
    }

    #[test]
    fn test_block_reset_clears_state() {
        let mut dev = periph_with_drbg(vec![1, 2, 3, 4]);
        dev.write(CTRL_ADDR, 1 << 5).unwrap();
        assert_eq!(dev.read(STATUS_ADDR).unwrap() & 1, 1);
        dev.write(RESET_ADDR, 1).unwrap();
        assert!(dev.reset_asserted());
        assert_eq!(dev.read(STATUS_ADDR).unwrap() & 1, 0);
        assert_eq!(dev.read(CTRL_ADDR).unwrap(), 0);
    }

    #[test]
    fn test_write_log_records_names() {
        let mut dev = periph_with_drbg(vec![]);
        dev.write(EXT_SEED_START + 8, 0xABCD_0123).unwrap();
        dev.write(OSC_EN_ADDR, 1).unwrap();
        let log = dev.log().take();
        assert!(log.contains("EXT_SEED[2] <- 0xabcd0123"));
        assert!(log.contains("OSC_EN <- 0x00000001"));
    }
}
