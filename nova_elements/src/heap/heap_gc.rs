// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Incremental snapshot-at-the-beginning collector.
//!
//! Marking proceeds in bounded steps between mutator safe points. Every
//! value reachable when marking starts gets marked: objects allocated during
//! marking are allocated marked, and [`Heap::write_barrier`] greys values
//! that are overwritten while marking is in progress. Steps requested while
//! a [`DeferGc`](crate::engine::context::DeferGc) scope is alive do nothing.

use std::{cell::Cell, rc::Rc};

use super::{
    Heap,
    heap_bits::{HeapBits, HeapMark, WorkQueues},
};

#[derive(Debug, Default)]
pub(crate) struct GcState {
    pub(crate) defer_depth: Rc<Cell<u32>>,
    pub(crate) marking: Option<MarkingState>,
    /// Marking steps requested while collection was deferred.
    pub(crate) deferred_steps: u32,
}

#[derive(Debug)]
pub(crate) struct MarkingState {
    pub(crate) bits: HeapBits,
    pub(crate) queues: WorkQueues,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkProgress {
    /// A deferral scope is active; nothing was traced.
    Deferred,
    /// Grey values remain.
    InProgress,
    /// The grey set is empty, or no marking is in progress.
    Done,
}

impl GcState {
    /// Records a new arena entry. Entries created during marking are black.
    pub(crate) fn on_allocation(&mut self, bits: impl FnOnce(&mut HeapBits) -> &mut Vec<bool>) {
        if let Some(marking) = self.marking.as_mut() {
            bits(&mut marking.bits).push(true);
        }
    }

    fn is_deferred(&self) -> bool {
        self.defer_depth.get() > 0
    }
}

/// Starts an incremental marking cycle by greying the root set. Does
/// nothing if a cycle is already in progress.
pub fn start_marking(heap: &mut Heap) {
    if heap.gc.marking.is_some() {
        return;
    }
    let bits = HeapBits::new(heap);
    let mut queues = WorkQueues::default();
    heap.globals.as_slice().mark_values(&mut queues);
    tracing::trace!(roots = heap.globals.len(), "start marking");
    heap.gc.marking = Some(MarkingState { bits, queues });
}

/// Traces at most `budget` grey values.
pub fn mark_step(heap: &mut Heap, budget: usize) -> MarkProgress {
    if heap.gc.is_deferred() {
        heap.gc.deferred_steps += 1;
        tracing::trace!(
            deferred_steps = heap.gc.deferred_steps,
            "marking step deferred"
        );
        return MarkProgress::Deferred;
    }
    let Heap { arrays, gc, .. } = heap;
    let Some(MarkingState { bits, queues }) = gc.marking.as_mut() else {
        return MarkProgress::Done;
    };
    let mut traced = 0;
    while traced < budget {
        if let Some(number) = queues.numbers.pop() {
            bits.numbers[number.get_index()] = true;
        } else if let Some(string) = queues.strings.pop() {
            bits.strings[string.get_index()] = true;
        } else if let Some(array) = queues.arrays.pop() {
            let index = array.get_index();
            if !bits.arrays[index] {
                bits.arrays[index] = true;
                if let Some(data) = &arrays[index] {
                    data.mark_values(queues);
                }
            }
        } else {
            break;
        }
        traced += 1;
    }
    tracing::trace!(traced, "marking step");
    if queues.is_empty() {
        MarkProgress::Done
    } else {
        MarkProgress::InProgress
    }
}

/// Finishes the marking cycle and frees every unmarked arena entry.
///
/// Starts a cycle first if none is in progress. Returns
/// [`MarkProgress::Deferred`] without doing anything while a deferral scope
/// is alive.
pub fn finish_collection(heap: &mut Heap) -> MarkProgress {
    if heap.gc.is_deferred() {
        heap.gc.deferred_steps += 1;
        return MarkProgress::Deferred;
    }
    start_marking(heap);
    while mark_step(heap, usize::MAX) != MarkProgress::Done {}
    let Some(MarkingState { bits, .. }) = heap.gc.marking.take() else {
        return MarkProgress::Done;
    };
    heap.gc.deferred_steps = 0;
    let mut freed_bytes = 0;
    let mut freed_arrays = 0;
    for (slot, marked) in heap.arrays.iter_mut().zip(bits.arrays.iter()) {
        if !marked && let Some(data) = slot.take() {
            freed_bytes += data.allocated_bytes();
            freed_arrays += 1;
        }
    }
    heap.release(freed_bytes);
    sweep_leaves(&mut heap.numbers, &bits.numbers);
    sweep_leaves(&mut heap.strings, &bits.strings);
    tracing::debug!(freed_arrays, freed_bytes, "collection finished");
    MarkProgress::Done
}

/// Runs a full, non-incremental collection.
pub fn heap_gc(heap: &mut Heap) -> MarkProgress {
    finish_collection(heap)
}

fn sweep_leaves<T>(arena: &mut [Option<T>], bits: &[bool]) {
    arena
        .iter_mut()
        .zip(bits.iter())
        .filter(|(_, marked)| !**marked)
        .for_each(|(slot, _)| *slot = None);
}
