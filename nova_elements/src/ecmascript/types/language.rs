// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod function;
mod number;
mod string;
mod value;

pub use function::Function;
pub use number::HeapNumber;
pub use number::NumberHeapData;
pub use string::HeapString;
pub use string::StringHeapData;
pub use value::Value;
pub(crate) use value::{is_strictly_equal, same_value_zero};
