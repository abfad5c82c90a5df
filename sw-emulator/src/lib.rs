/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the Versal TRNG software model. The model
    implements the IP's register interface behaviorally so the driver can be
    exercised on the host, with fault injection for the failure paths real
    silicon will not produce on demand.

--*/

mod bus;
mod mmio;
mod trng;

pub mod testing;

pub use bus::{Bus, BusError};
pub use mmio::BusMmio;
pub use trng::VersalTrngPeriph;
