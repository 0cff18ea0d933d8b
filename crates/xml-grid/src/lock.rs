/*
 * lock.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Poison-tolerant `RwLock` access.
//!
//! The shared tables only ever gain fully built, immutable entries, so a
//! panic while a guard was held cannot leave them inconsistent.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
