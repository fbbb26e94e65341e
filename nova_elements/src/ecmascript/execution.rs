// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub mod agent;
mod default_host_hooks;

pub use agent::{Agent, ExceptionType, HostHooks, JsError, JsResult, Options};
pub use default_host_hooks::DefaultHostHooks;
