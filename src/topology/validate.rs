//! B-Rep validation passes.
//!
//! A B-Rep is not merely "surfaces grouped together": without connected,
//! consistently oriented loops it does not bound a region, and these
//! passes reject it instead of letting queries run on garbage.

use std::collections::HashMap;

use crate::error::{Result, TopologyError};

use super::{BRep, EdgeId};

/// Structural pass: entity references resolve and loops are closed chains.
pub(super) fn structure(brep: &BRep) -> Result<()> {
    for (id, edge) in brep.edges() {
        if brep.vertex(edge.start).is_err() || brep.vertex(edge.end).is_err() {
            return Err(TopologyError::InvalidTopology(format!(
                "edge {id:?} references a missing vertex"
            ))
            .into());
        }
    }

    for (loop_id, loop_data) in brep.loop_entries() {
        if loop_data.edges.is_empty() {
            return Err(TopologyError::EmptyLoop { id: loop_id }.into());
        }

        // Walk the chain: each oriented edge must start where the previous
        // one ended, and the last must close back to the first.
        let mut ends = Vec::with_capacity(loop_data.edges.len());
        for oe in &loop_data.edges {
            ends.push(brep.oriented_vertices(*oe)?);
        }
        for (position, pair) in ends.windows(2).enumerate() {
            if pair[0].1 != pair[1].0 {
                return Err(TopologyError::DisconnectedLoop {
                    id: loop_id,
                    position: position + 1,
                }
                .into());
            }
        }
        let first = ends[0].0;
        let last = ends[ends.len() - 1].1;
        if first != last {
            return Err(TopologyError::OpenLoop { id: loop_id }.into());
        }
    }

    for (face_id, face) in brep.faces() {
        if brep.brep_loop(face.outer_loop).is_err() {
            return Err(TopologyError::InvalidTopology(format!(
                "face {face_id:?} references a missing outer loop"
            ))
            .into());
        }
        for &inner in &face.inner_loops {
            if brep.brep_loop(inner).is_err() {
                return Err(TopologyError::InvalidTopology(format!(
                    "face {face_id:?} references a missing inner loop"
                ))
                .into());
            }
        }
    }

    Ok(())
}

/// Orientation pass for closed solids: every edge appears in exactly two
/// face loops, once forward and once backward. This is what makes the
/// union of face normals a consistent outward field.
pub(super) fn solid_orientation(brep: &BRep) -> Result<()> {
    // (forward uses, backward uses) per edge across all face loops.
    let mut uses: HashMap<EdgeId, (usize, usize)> = HashMap::new();

    for (_, face) in brep.faces() {
        let loop_ids =
            std::iter::once(face.outer_loop).chain(face.inner_loops.iter().copied());
        for loop_id in loop_ids {
            let loop_data = brep.brep_loop(loop_id)?;
            for oe in &loop_data.edges {
                let entry = uses.entry(oe.edge).or_insert((0, 0));
                if oe.forward {
                    entry.0 += 1;
                } else {
                    entry.1 += 1;
                }
            }
        }
    }

    for (id, _) in brep.edges() {
        let (fwd, bwd) = uses.get(&id).copied().unwrap_or((0, 0));
        let total = fwd + bwd;
        if total != 2 {
            return Err(TopologyError::EdgeUseCount { id, count: total }.into());
        }
        if fwd != 1 {
            return Err(TopologyError::InconsistentOrientation { id }.into());
        }
    }

    Ok(())
}
