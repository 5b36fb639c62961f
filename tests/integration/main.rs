//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a subsystem against the
//! simulated plate in `mock_hw`.  All tests run on the host with simulated
//! time, so a full reflow finishes in well under a second.

mod controller_tests;
mod follower_tests;
mod mock_hw;
