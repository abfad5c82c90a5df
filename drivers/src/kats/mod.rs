/*++

Licensed under the Apache-2.0 license.

File Name:

    mod.rs

Abstract:

    File contains exports for the TRNG self tests: the known-answer tests
    for both silicon revisions and the entropy-path health test.

--*/

mod health_test;
mod trng_v1_kat;
mod trng_v2_kat;

pub use health_test::TrngHealthTest;
pub use trng_v1_kat::TrngKatV1;
pub use trng_v2_kat::TrngKatV2;
