// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hard limits of element storage. Tunable thresholds live in
//! [`Options`](crate::ecmascript::execution::Options).

/// Largest number of slots an element storage block may have. Capacity
/// requests above this are rejected before any allocation happens.
pub const MAX_STORAGE_VECTOR_LENGTH: u32 = (1 << 28) - 1;

/// Largest valid array index: 2^32 - 2.
pub const MAX_ARRAY_INDEX: u32 = u32::MAX - 1;

/// Largest valid array length: 2^32 - 1.
pub const MAX_ARRAY_LENGTH: u64 = u32::MAX as u64;
