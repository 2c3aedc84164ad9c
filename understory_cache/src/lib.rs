// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Cache: named cache units with dependency-aware invalidation.
//!
//! A [`Cache`] is a small ledger owned by one component (a scene node, a
//! camera, ...). It holds a set of named **units**, each carrying an arbitrary
//! payload plus a validity flag. Units may declare dependencies on other units
//! of the same cache; invalidating a unit invalidates everything that depends
//! on it, transitively, within the same call.
//!
//! - **Units** ([`Unit`], [`UnitSet`]): compile-time handles with a dense index
//!   and a human-readable name.
//! - **Cache** ([`Cache`]): payload storage, validity flags, and the static
//!   intra-cache dependency table.
//! - **Invalidation events**: [`Cache::invalidate_with`] reports every unit a
//!   pass invalidated, so the owner can propagate to *other* caches (children,
//!   parents) whose relationships change at runtime.
//!
//! ## Quick Start
//!
//! ```rust
//! use understory_cache::{Cache, Unit};
//!
//! const TRANSLATION: Unit = Unit::new(0, "translation");
//! const SCALING: Unit = Unit::new(1, "scaling");
//! const COMPOSED: Unit = Unit::new(2, "composed");
//!
//! let mut cache = Cache::<f64>::new();
//! cache.declare(TRANSLATION, &[]);
//! cache.declare(SCALING, &[]);
//! cache.declare(COMPOSED, &[TRANSLATION, SCALING]);
//!
//! // Units start out invalid.
//! assert!(!cache.test(COMPOSED));
//!
//! // Recompute, then mark valid.
//! *cache.get(COMPOSED) = 42.0;
//! cache.update(COMPOSED);
//! assert_eq!(cache.fresh(COMPOSED), Some(&42.0));
//!
//! // Invalidating a dependency invalidates its dependents.
//! let invalidated = cache.invalidate(SCALING);
//! assert!(invalidated.contains(COMPOSED));
//! assert_eq!(cache.fresh(COMPOSED), None);
//! ```
//!
//! ## Undeclared units
//!
//! Touching a unit that was never declared (through [`Cache::get`],
//! [`Cache::update`] or [`Cache::invalidate`]) creates it on the fly with no
//! dependencies and an invalid flag. This keeps ad-hoc units cheap to
//! introduce; declare a unit explicitly to give it dependencies.
//!
//! ## Cycles
//!
//! Dependency cycles are tolerated. An invalidation pass visits each unit at
//! most once, so a cycle never loops.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod cache;
mod unit;

pub use cache::Cache;
pub use unit::{MAX_UNITS, Unit, UnitSet, UnitSetIter};
