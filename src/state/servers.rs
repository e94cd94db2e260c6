//! Server slot reconciliation.
//!
//! # Responsibilities
//! - Keep slots of unchanged nodes at their position
//! - Put slots of vanished nodes into maintenance instead of removing them
//! - Reuse maintenance slots for new nodes before growing the array
//! - Refresh TLS material on every slot
//!
//! # Design Decisions
//! - Slot names are `srv_<position>` and are rewritten from position on every pass
//! - Free slots are handed out lowest position first
//! - Growth doubles the array (or adds one slot to an empty array)
//! - Duplicate `host:port` nodes collapse to their last occurrence

use std::collections::VecDeque;

use crate::certs::CertPaths;
use crate::discovery::UpstreamNode;
use crate::state::index::{index, index_some};
use crate::state::slot::{slot_name, Slot};

/// Compute the next slot array for a backend.
///
/// `previous` is the backend's slot array from the last committed state
/// (empty on first reconciliation). The result is never shorter than it.
pub fn reconcile_servers(previous: &[Slot], nodes: &[UpstreamNode], paths: &CertPaths) -> Vec<Slot> {
    let mut slots = previous.to_vec();
    let slot_idx = index_some(&slots, Slot::key);
    let node_idx = index(nodes, UpstreamNode::key);

    let mut free = VecDeque::with_capacity(slots.len());

    // Disable slots whose node is gone. Disabled slots are always
    // rewritten so they pick up the current TLS material.
    for (i, slot) in slots.iter_mut().enumerate() {
        let live = slot
            .key()
            .is_some_and(|k| node_idx.contains_key(&k) && slot_idx.get(&k) == Some(&i));

        if live {
            slot.name = slot_name(i);
            continue;
        }

        *slot = Slot::disabled(i, paths);
        free.push_back(i);
    }

    for (pos, node) in nodes.iter().enumerate() {
        let key = node.key();
        if node_idx.get(&key) != Some(&pos) {
            continue;
        }

        if let Some(&i) = slot_idx.get(&key) {
            // Unchanged node: certificates may still have rotated.
            slots[i].set_tls(paths);
            continue;
        }

        let i = match free.pop_front() {
            Some(i) => i,
            None => grow(&mut slots, &mut free, paths),
        };
        slots[i].assign(node, paths);
    }

    slots
}

/// Append `max(len, 1)` disabled slots, queue all but the first as free and
/// return the first.
fn grow(slots: &mut Vec<Slot>, free: &mut VecDeque<usize>, paths: &CertPaths) -> usize {
    let start = slots.len();
    let add = start.max(1);

    slots.extend((start..start + add).map(|i| Slot::disabled(i, paths)));
    free.extend(start + 1..start + add);

    tracing::debug!(from = start, to = start + add, "Growing server slots");
    start
}
