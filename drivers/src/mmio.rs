// Licensed under the Apache-2.0 license

/// Hardware access port for the TRNG register window.
///
/// The driver performs every device interaction through this trait: 32-bit
/// register reads and writes that the implementation must issue in program
/// order, plus the microsecond delay primitive required by the reset pulses
/// and the V2 serial seed clocking. Platform integration (MMIO mapping,
/// `udelay`) stays on the other side of this boundary.
pub trait Mmio {
    /// Read the 32-bit register at `offset` from the device base.
    fn read_reg(&mut self, offset: u32) -> u32;

    /// Write the 32-bit register at `offset` from the device base.
    fn write_reg(&mut self, offset: u32, val: u32);

    /// Busy-wait for at least `micros` microseconds.
    fn delay_us(&mut self, micros: u32);
}

/// `Mmio` implementation over a mapped physical register window.
pub struct DirectMmio {
    base: *mut u32,
    udelay: fn(u32),
}

impl DirectMmio {
    /// Creates a port over the register window mapped at `base`.
    ///
    /// # Safety
    ///
    /// `base` must be the virtual address of the device's register window,
    /// mapped device-memory with at least `OSC_EN` (0xD4) + 4 bytes
    /// accessible, and no other software may access the window while this
    /// port exists.
    pub unsafe fn new(base: *mut u32, udelay: fn(u32)) -> Self {
        Self { base, udelay }
    }
}

impl Mmio for DirectMmio {
    fn read_reg(&mut self, offset: u32) -> u32 {
        unsafe {
            let ptr = self.base.cast::<u8>().add(offset as usize).cast::<u32>();
            core::ptr::read_volatile(ptr)
        }
    }

    fn write_reg(&mut self, offset: u32, val: u32) {
        unsafe {
            let ptr = self.base.cast::<u8>().add(offset as usize).cast::<u32>();
            core::ptr::write_volatile(ptr, val);
        }
    }

    fn delay_us(&mut self, micros: u32) {
        (self.udelay)(micros)
    }
}
