//! Vector post-processing: flat decoded tails to named sub-vectors.
//!
//! Decay tails arrive as flat arrays whose meaning depends on configuration
//! state decoded earlier (the bin boundary table). [`reshape`] turns a flat
//! array plus a sparse index-to-name mapping into a named mapping. Values
//! with no name, and values whose name is already taken, are kept in a
//! reserved bucket rather than dropped; newer firmware may ship more bins
//! than the configuration we saw, and silently losing them would break
//! forward compatibility.
//!
//! Everything here is a pure transformation. No I/O, no shared state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A reshaped vector: values under their bin names, plus an overflow bucket
/// for values that could not be named.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedVector {
    /// Values keyed by their resolved names.
    pub named: HashMap<String, f64>,
    /// Values whose index had no name, or whose name was already claimed by
    /// an earlier index, in input order.
    pub unknown_field: Vec<f64>,
}

/// Map `flat[i]` to `index_to_name[i]`. Indices absent from the mapping
/// (whether mid-table or past its end) land in
/// [`NamedVector::unknown_field`], as does any value whose name collides
/// with one already assigned; no value is ever dropped or overwritten.
pub fn reshape(flat: &[f64], index_to_name: &HashMap<usize, String>) -> NamedVector {
    let mut out = NamedVector::default();
    for (i, &value) in flat.iter().enumerate() {
        match index_to_name.get(&i) {
            Some(name) if !out.named.contains_key(name) => {
                out.named.insert(name.clone(), value);
            }
            _ => out.unknown_field.push(value),
        }
    }
    out
}

/// Index-to-name table derived from a configuration frame's boundary table,
/// one entry per bin, zero-padded so lexicographic and numeric order agree.
pub fn bin_names(boundaries: &[u16]) -> HashMap<usize, String> {
    boundaries.iter().enumerate().map(|(i, b)| (i, format!("bin_{:05}us", b))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn reshape_full_table_names_everything() {
        let names = bin_names(&[10, 20, 30]);
        let out = reshape(&[1.0, 2.0, 3.0], &names);
        assert_eq!(out.named.len(), 3);
        assert!(out.unknown_field.is_empty());
        assert_eq!(out.named["bin_00010us"], 1.0);
        assert_eq!(out.named["bin_00030us"], 3.0);
    }

    #[test]
    fn reshape_keeps_unnamed_values_in_order() {
        let names = bin_names(&[10]);
        let out = reshape(&[1.0, 2.0, 3.0], &names);
        assert_eq!(out.named.len(), 1);
        assert_eq!(out.unknown_field, vec![2.0, 3.0]);
    }

    #[test]
    fn reshape_handles_gaps_in_the_mapping() {
        let mut names = HashMap::new();
        names.insert(0, "first".to_string());
        names.insert(2, "third".to_string());
        let out = reshape(&[1.0, 2.0, 3.0], &names);
        assert_eq!(out.named["first"], 1.0);
        assert_eq!(out.named["third"], 3.0);
        assert_eq!(out.unknown_field, vec![2.0]);
    }

    #[test]
    fn duplicate_names_conserve_every_value() {
        // Duplicate boundaries are legal in a CONF frame; the second bin's
        // value must survive under the overflow bucket, not overwrite.
        let out = reshape(&[1.0, 2.0], &bin_names(&[10, 10]));
        assert_eq!(out.named.len(), 1);
        assert_eq!(out.named["bin_00010us"], 1.0);
        assert_eq!(out.unknown_field, vec![2.0]);
    }

    #[test]
    fn bin_names_zero_pad() {
        let names = bin_names(&[7, 65535]);
        assert_eq!(names[&0], "bin_00007us");
        assert_eq!(names[&1], "bin_65535us");
    }

    proptest! {
        // No value is ever dropped, whatever the table coverage; the small
        // boundary range forces name collisions.
        #[test]
        fn reshape_conserves_values(
            flat in proptest::collection::vec(-5000.0f64..5000.0, 0..32),
            boundaries in proptest::collection::vec(0u16..8, 0..32),
        ) {
            let out = reshape(&flat, &bin_names(&boundaries));
            prop_assert_eq!(out.named.len() + out.unknown_field.len(), flat.len());
        }
    }
}
