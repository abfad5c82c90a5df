/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    Driver for the Xilinx Versal PMC True Random Number Generator. The IP
    combines a ring oscillator entropy source with a block-cipher DRBG and
    health test logic; this crate drives it over its memory-mapped register
    window and carries the software derivation function the silicon lacks.

    Platforms whose PMC firmware owns the TRNG instead expose the same
    random-bytes service over the IPI mailbox; that transport lives with the
    platform glue, not here.

--*/

#![cfg_attr(not(test), no_std)]

mod array;
mod block_cipher;
mod df;
mod mmio;
mod regs;
mod rng;
mod trng;

pub mod kats;

pub use array::{Array4x12, Array4x4, Array4x8, Array4xN};
pub use mmio::{DirectMmio, Mmio};
pub use rng::{get_random_bytes, hw_init};
pub use trng::{
    Mode, TrngStats, TrngStatus, UsrCfg, VersalTrng, Version, TRNG_MAX_DFLENMULT,
    TRNG_MAX_SEED_LEN, TRNG_MIN_DFLENMULT, TRNG_PERS_STR_LEN, TRNG_SEC_STRENGTH_LEN,
    TRNG_SEED_LEN, TRNG_V2_SEED_LEN,
};
pub use versal_trng_error::{TrngError, TrngResult};
