// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::{Agent, JsResult, agent::HostHooks};
use crate::ecmascript::{
    builtins::Array,
    types::{Function, Value},
};

/// Host of an unmodified realm: the prototype chain defines no indexed
/// properties and functions are opaque.
#[derive(Debug)]
pub struct DefaultHostHooks;

impl HostHooks for DefaultHostHooks {
    fn call_getter(&self, _: &mut Agent, _: Function, _: Array) -> JsResult<Value> {
        Ok(Value::Undefined)
    }

    fn call_setter(&self, _: &mut Agent, _: Function, _: Array, _: Value) -> JsResult<()> {
        Ok(())
    }
}
