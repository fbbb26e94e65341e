// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::{cell::Cell, marker::PhantomData, rc::Rc};

/// # Garbage collection deferral scope
///
/// While any `DeferGc` is alive, incremental marking steps are not performed
/// and only record that they were requested. Every change to the shape of an
/// array's element storage (allocation, reallocation, encoding promotion)
/// happens while one of these is held, so the collector never traces a
/// half-constructed storage block.
///
/// Scopes nest: the collector resumes once the outermost scope is dropped.
#[derive(Debug)]
#[must_use]
pub struct DeferGc {
    depth: Rc<Cell<u32>>,
}

/// # Proof of an active deferral scope
///
/// Holding this token is required by functions that change the shape of
/// element storage. It can only be obtained from a live [`DeferGc`] and
/// cannot outlive it.
#[derive(Debug, Clone, Copy)]
pub struct NoGcScope<'a> {
    _defer: PhantomData<&'a DeferGc>,
}

impl DeferGc {
    pub(crate) fn new(depth: &Rc<Cell<u32>>) -> Self {
        depth.set(depth.get() + 1);
        Self {
            depth: depth.clone(),
        }
    }

    #[inline]
    pub fn nogc(&self) -> NoGcScope<'_> {
        NoGcScope {
            _defer: PhantomData,
        }
    }
}

impl Drop for DeferGc {
    fn drop(&mut self) {
        let depth = self.depth.get();
        debug_assert!(depth > 0);
        self.depth.set(depth - 1);
    }
}

#[test]
fn defer_gc_scopes_nest() {
    let depth = Rc::new(Cell::new(0));
    {
        let outer = DeferGc::new(&depth);
        assert_eq!(depth.get(), 1);
        {
            let _inner = DeferGc::new(&depth);
            let _gc = outer.nogc();
            assert_eq!(depth.get(), 2);
        }
        assert_eq!(depth.get(), 1);
    }
    assert_eq!(depth.get(), 0);
}
