// Licensed under the Apache-2.0 license

use crate::bus::Bus;
use versal_trng::Mmio;

/// An MMIO port implementation that reads and writes to a [`Bus`].
///
/// Delays advance a virtual microsecond counter and poll the bus instead of
/// blocking, so timeout paths run at test speed.
pub struct BusMmio<TBus: Bus> {
    bus: TBus,
    elapsed_us: u64,
}

impl<TBus: Bus> BusMmio<TBus> {
    pub fn new(bus: TBus) -> Self {
        Self {
            bus,
            elapsed_us: 0,
        }
    }

    /// Virtual time spent in delays so far.
    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_us
    }

    pub fn into_inner(self) -> TBus {
        self.bus
    }
}

impl<TBus: Bus> Mmio for BusMmio<TBus> {
    /// # Panics
    ///
    /// Panics if the bus faults; the driver only touches the TRNG window.
    fn read_reg(&mut self, offset: u32) -> u32 {
        self.bus.read(offset).unwrap()
    }

    fn write_reg(&mut self, offset: u32, val: u32) {
        self.bus.write(offset, val).unwrap()
    }

    fn delay_us(&mut self, micros: u32) {
        self.elapsed_us += u64::from(micros);
        self.bus.poll();
    }
}
