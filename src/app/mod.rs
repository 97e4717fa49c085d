// SPDX-License-Identifier: GPL-3.0-only

//! Camera screen logic
//!
//! # Architecture
//!
//! - `state`: Immutable screen state, derived `ScreenMode`, actions and commands
//! - `update`: Pure reducer over the state
//! - `controller`: Runs commands against the permission provider and capture
//!   device, and holds the camera session while the live view is shown
//! - `view`: What each screen shows

pub mod controller;
pub mod state;
pub mod update;
pub mod view;

pub use controller::ScreenController;
pub use state::{Action, Command, Notice, Pending, ScreenMode, ScreenState};
pub use update::update;
pub use view::{Backdrop, KeyHint, ScreenContent, screen_content};
