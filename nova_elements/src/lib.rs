// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Nova element storage
//!
//! Polymorphic indexed storage backing script arrays: dense Int32, Double
//! and boxed encodings, a sparse fallback, and the legacy queue encoding
//! used for cheap front insertion and removal. Storage lives in an arena
//! heap traced by an incremental, cooperative collector.

pub mod ecmascript;
pub mod engine;
pub mod heap;

pub use engine::small_f64::SmallF64;
pub use engine::small_integer::SmallInteger;
pub use heap::Heap;
