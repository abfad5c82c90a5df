/*++

Licensed under the Apache-2.0 license.

File Name:

    health_test.rs

Abstract:

    File contains the entropy-path health test: a full HRNG instantiate and
    release, which exercises the ring oscillators, the derivation function
    and the reseed state machine before the device is put into service.

--*/

use crate::{Mmio, Mode, TrngError, TrngResult, UsrCfg, VersalTrng};

#[derive(Default, Debug)]
pub struct TrngHealthTest {}

impl TrngHealthTest {
    /// This function runs the health-mode smoke test. It must pass before
    /// the device is instantiated for callers.
    ///
    /// # Arguments
    ///
    /// * `trng` - TRNG driver in the `Uninitialized` state
    pub fn execute<M: Mmio>(&self, trng: &mut VersalTrng<M>) -> TrngResult<()> {
        let cfg = UsrCfg {
            mode: Mode::Hrng,
            seed_life: 10,
            dfmul: 7,
            ..Default::default()
        };

        trng.instantiate(&cfg)
            .map_err(|_| TrngError::KAT_TRNG_HEALTH_TEST_FAILURE)?;
        trng.release()
            .map_err(|_| TrngError::KAT_TRNG_HEALTH_TEST_FAILURE)?;
        Ok(())
    }
}
