// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// Opaque handle to a host function.
///
/// Element accessors store their getter and setter as host function handles;
/// calling them is delegated to [`HostHooks`](crate::ecmascript::execution::HostHooks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Function(u32);

impl Function {
    pub const fn from_host_id(id: u32) -> Self {
        Self(id)
    }

    pub const fn host_id(self) -> u32 {
        self.0
    }
}
