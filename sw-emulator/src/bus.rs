/*++

Licensed under the Apache-2.0 license.

File Name:

    bus.rs

Abstract:

    File contains definition of the Bus trait.

--*/

use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BusError {
    /// Load access fault exception
    LoadAccessFault,

    /// Store access fault exception
    StoreAccessFault,
}

/// Represents an abstract 32-bit memory bus, used to access peripheral
/// registers.
pub trait Bus {
    /// Read the word at `addr`.
    fn read(&mut self, addr: u32) -> Result<u32, BusError>;

    /// Write the word at `addr`.
    fn write(&mut self, addr: u32, val: u32) -> Result<(), BusError>;

    /// This method is used to notify peripherals of the passage of time.
    fn poll(&mut self) {
        // By default, do nothing
    }
}

/// Shared handles forward to the inner bus, letting a test keep a reference
/// to a peripheral the driver's port owns.
impl<T: Bus> Bus for Rc<RefCell<T>> {
    fn read(&mut self, addr: u32) -> Result<u32, BusError> {
        self.borrow_mut().read(addr)
    }

    fn write(&mut self, addr: u32, val: u32) -> Result<(), BusError> {
        self.borrow_mut().write(addr, val)
    }

    fn poll(&mut self) {
        self.borrow_mut().poll()
    }
}
