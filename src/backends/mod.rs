// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              ScreenController                │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                   │
//! │  ┌──────────────────┐  ┌─────────────────┐  │
//! │  │    Permission    │  │     Camera      │  │
//! │  │ (portal / nodes) │  │ (V4L2 / still)  │  │
//! │  └──────────────────┘  └─────────────────┘  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: Capture devices, frame streaming and the scoped camera session
//! - [`permission`]: Camera access checks and requests

pub mod camera;
pub mod permission;
