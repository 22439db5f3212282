//! Slice normalization for differentials
//!
//! Authors (and the mapping compiler) express repeated elements in a
//! differential simply by listing the same path several times. This module
//! rewrites such runs into explicit slicing: a header element carrying the
//! slicing rules, followed by the repetitions as named slices.
//!
//! A run is a maximal sequence of entries sharing one path at one nesting
//! level, each followed by its own deeper-level descendants. Descendants are
//! normalized recursively, so repeated extensions on a slice are sliced too.

use crate::error::Result;
use crate::slicing::{slicing_header, SliceNamer};
use fhirmap_models::{Differential, ElementDefinition, StructureDefinition};
use std::ops::Range;

/// Normalize the differential of a StructureDefinition in place.
///
/// Either the whole differential is rewritten or, on error, left untouched.
pub fn normalize(sd: &mut StructureDefinition) -> Result<()> {
    let Some(differential) = sd.differential.as_mut() else {
        return Ok(());
    };
    normalize_slices(differential).map_err(|e| {
        tracing::debug!(url = %sd.url, error = %e, "differential normalization failed");
        e
    })
}

/// Insert slicing headers and slice names for every repeated path.
///
/// The first entry is the root and is never grouped.
pub fn normalize_slices(differential: &mut Differential) -> Result<()> {
    let elements = &differential.element;
    if elements.len() <= 1 {
        return Ok(());
    }

    let mut out = Vec::with_capacity(elements.len() + 2);
    out.push(elements[0].clone());

    let mut index = 1;
    while index < elements.len() {
        index = group(elements, index, &mut out)?;
    }

    differential.element = out;
    Ok(())
}

/// Copy the sibling runs starting at `start` into `out`, slicing repeated paths.
///
/// Returns the index of the first entry that is not on `start`'s level.
fn group(
    elements: &[ElementDefinition],
    start: usize,
    out: &mut Vec<ElementDefinition>,
) -> Result<usize> {
    let level = elements[start].depth();
    let mut index = start;

    while index < elements.len() && elements[index].depth() == level {
        let path = elements[index].path.as_str();

        let mut members: Vec<Range<usize>> = Vec::new();
        while index < elements.len()
            && elements[index].depth() == level
            && elements[index].path == path
        {
            let end = subtree_end(elements, index, level);
            members.push(index..end);
            index = end;
        }

        if members.len() == 1 {
            let member = members.remove(0);
            out.push(elements[member.start].clone());
            copy_subtree(elements, member.start + 1..member.end, out)?;
            continue;
        }

        out.push(slicing_header(path)?);
        tracing::debug!(path, slices = members.len(), "inserted slicing header");

        let mut namer = SliceNamer::new();
        for member in members {
            let mut slice = elements[member.start].clone();
            namer.apply(&mut slice);
            out.push(slice);
            copy_subtree(elements, member.start + 1..member.end, out)?;
        }
    }

    Ok(index)
}

/// Normalize the descendants in `range`, which all sit below one member.
fn copy_subtree(
    elements: &[ElementDefinition],
    range: Range<usize>,
    out: &mut Vec<ElementDefinition>,
) -> Result<()> {
    let scope = &elements[..range.end];
    let mut index = range.start;
    while index < range.end {
        index = group(scope, index, out)?;
    }
    Ok(())
}

/// Index just past the descendants of `elements[index]`.
fn subtree_end(elements: &[ElementDefinition], index: usize, level: usize) -> usize {
    let mut end = index + 1;
    while end < elements.len() && elements[end].depth() > level {
        end += 1;
    }
    end
}
