// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide default bus
//!
//! Created lazily with [`Bus::new`] on first access. Callers that need
//! isolation (tests, libraries) should construct their own [`Bus`] instead.

use crate::events::Bus;
use std::sync::{OnceLock, RwLock};

static DEFAULT: OnceLock<RwLock<Bus>> = OnceLock::new();

fn slot() -> &'static RwLock<Bus> {
    DEFAULT.get_or_init(|| RwLock::new(Bus::new()))
}

/// Handle to the current default bus
pub fn default_bus() -> Bus {
    slot().read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// Replace the default bus, returning the previous one
///
/// Handles obtained earlier keep pointing at the previous bus.
pub fn set_default_bus(bus: Bus) -> Bus {
    let mut current = slot().write().unwrap_or_else(|e| e.into_inner());
    std::mem::replace(&mut *current, bus)
}
