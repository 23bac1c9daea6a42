use super::errors::{Error, Result};
use super::types::{Child, LevelGeometry};

/// Structural verification of extracted geometry, for debug builds and
/// tests.
///
/// Extraction itself never fails: a builder defect degrades the output
/// silently. This walk makes the degradation visible without changing that
/// contract. It reports the first violation found among: a subsector run
/// that is not cyclically closed, a partner link that does not point back,
/// and a node child outside the built arrays.
pub fn verify(geometry: &LevelGeometry) -> Result<()> {
    verify_closure(geometry)?;
    verify_partners(geometry)?;
    verify_children(geometry)
}

fn verify_closure(geometry: &LevelGeometry) -> Result<()> {
    for (index, subsector) in geometry.subsectors.iter().enumerate() {
        let end = subsector.first_line + subsector.num_lines;
        if subsector.num_lines == 0 || end > geometry.segs.len() {
            return Err(Error::subsector_run_out_of_range(
                index,
                subsector.first_line,
                subsector.num_lines,
                geometry.segs.len(),
            ));
        }
        let run = &geometry.segs[subsector.first_line..end];
        for (offset, seg) in run.iter().enumerate() {
            let next = &run[(offset + 1) % run.len()];
            if seg.v2 != next.v1 {
                return Err(Error::unclosed_subsector(
                    index,
                    subsector.first_line + offset,
                ));
            }
        }
    }
    Ok(())
}

fn verify_partners(geometry: &LevelGeometry) -> Result<()> {
    for (index, seg) in geometry.segs.iter().enumerate() {
        let partner = match seg.partner {
            Some(partner) => partner,
            None => continue,
        };
        match geometry.segs.get(partner) {
            Some(other) if other.partner == Some(index) => {}
            _ => return Err(Error::asymmetric_partner(index, partner)),
        }
    }
    Ok(())
}

fn verify_children(geometry: &LevelGeometry) -> Result<()> {
    for (index, node) in geometry.nodes.iter().enumerate() {
        for &child in &node.children {
            let in_range = match child {
                Child::Node(node) => node < geometry.nodes.len(),
                Child::Subsector(subsector) => subsector < geometry.subsectors.len(),
            };
            if !in_range {
                return Err(Error::child_out_of_range(index, child));
            }
        }
    }
    Ok(())
}
