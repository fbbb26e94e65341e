// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod language;

pub use language::{Function, HeapNumber, HeapString, Value};
pub use language::{NumberHeapData, StringHeapData};
pub(crate) use language::{is_strictly_equal, same_value_zero};
