// SPDX-License-Identifier: GPL-3.0-only

//! Device backends
//!
//! - [`depth`]: depth camera contract, open parameters and the simulated provider

pub mod depth;
