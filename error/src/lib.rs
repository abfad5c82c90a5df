/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains the error types used by the Versal TRNG driver library.

--*/
#![cfg_attr(not(feature = "std"), no_std)]
use core::convert::From;
use core::num::NonZeroU32;

/// Versal TRNG Error Type
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TrngError(pub NonZeroU32);

impl TrngError {
    const fn new_const(val: u32) -> Self {
        match NonZeroU32::new(val) {
            Some(val) => Self(val),
            None => panic!("TrngError cannot be 0"),
        }
    }

    /// Driver Error: engine state machine
    pub const DRIVER_TRNG_INVALID_STATE: TrngError = TrngError::new_const(0x00010001);
    pub const DRIVER_TRNG_INVALID_MODE: TrngError = TrngError::new_const(0x00010002);
    pub const DRIVER_TRNG_INVALID_SEED_LIFE: TrngError = TrngError::new_const(0x00010003);
    pub const DRIVER_TRNG_INVALID_DFMUL: TrngError = TrngError::new_const(0x00010004);
    pub const DRIVER_TRNG_INVALID_SEED_CFG: TrngError = TrngError::new_const(0x00010005);
    pub const DRIVER_TRNG_INVALID_PTRNG_CFG: TrngError = TrngError::new_const(0x00010006);
    pub const DRIVER_TRNG_INVALID_SEED_LEN: TrngError = TrngError::new_const(0x00010007);
    pub const DRIVER_TRNG_SEED_MATCHES_INIT_SEED: TrngError = TrngError::new_const(0x00010008);
    pub const DRIVER_TRNG_INVALID_BUF_LEN: TrngError = TrngError::new_const(0x00010009);
    pub const DRIVER_TRNG_PREDICT_NOT_ALLOWED: TrngError = TrngError::new_const(0x0001000A);
    pub const DRIVER_TRNG_SEED_LIFE_EXCEEDED: TrngError = TrngError::new_const(0x0001000B);

    /// Driver Error: hardware interaction
    pub const DRIVER_TRNG_RESEED_TIMEOUT: TrngError = TrngError::new_const(0x00010101);
    pub const DRIVER_TRNG_GENERATE_TIMEOUT: TrngError = TrngError::new_const(0x00010102);
    pub const DRIVER_TRNG_ENTROPY_HEALTH_FAILED: TrngError = TrngError::new_const(0x00010103);
    pub const DRIVER_TRNG_TRIVIAL_SEED_PATTERN: TrngError = TrngError::new_const(0x00010104);
    pub const DRIVER_TRNG_SERIAL_SEED_VERIFY: TrngError = TrngError::new_const(0x00010105);
    pub const DRIVER_TRNG_REG_WRITE_VERIFY: TrngError = TrngError::new_const(0x00010106);

    /// Driver Error: catastrophic conditions
    pub const DRIVER_TRNG_DTF_FAILURE: TrngError = TrngError::new_const(0x00010201);
    pub const DRIVER_TRNG_DUPLICATE_BURST: TrngError = TrngError::new_const(0x00010202);

    /// Known Answer Test Errors
    pub const KAT_TRNG_OUTPUT_MISMATCH: TrngError = TrngError::new_const(0x00020001);
    pub const KAT_TRNG_HEALTH_TEST_FAILURE: TrngError = TrngError::new_const(0x00020002);
}

impl From<TrngError> for NonZeroU32 {
    fn from(val: TrngError) -> Self {
        val.0
    }
}

impl From<TrngError> for u32 {
    fn from(val: TrngError) -> Self {
        val.0.get()
    }
}

pub type TrngResult<T> = Result<T, TrngError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversions() {
        let err = TrngError::DRIVER_TRNG_INVALID_STATE;
        assert_eq!(u32::from(err), 0x00010001);
        assert_eq!(NonZeroU32::from(err).get(), 0x00010001);
    }
}
