//! Candidate values of every variable on the path being replayed.
use std::{collections::BTreeMap, fmt};

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use yulssa_ast::{Scopes, VariableId};
use yulssa_ir::ValueId;

/// A sorted set of values a variable may hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ValueSet(SmallVec<[ValueId; 2]>);

impl ValueSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(value: ValueId) -> Self {
        Self(smallvec::smallvec![value])
    }

    pub fn insert(&mut self, value: ValueId) {
        if let Err(pos) = self.0.binary_search(&value) {
            self.0.insert(pos, value);
        }
    }

    pub fn contains(&self, value: ValueId) -> bool {
        self.0.binary_search(&value).is_ok()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The value held if it is the only candidate.
    pub fn as_single(&self) -> Option<ValueId> {
        match self.0.as_slice() {
            [value] => Some(*value),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.0.iter().copied()
    }

    pub fn intersection(&self, other: &Self) -> Self {
        Self(self.iter().filter(|value| other.contains(*value)).collect())
    }

    pub fn union_with(&mut self, other: &Self) {
        for value in other.iter() {
            self.insert(value);
        }
    }
}

impl FromIterator<ValueId> for ValueSet {
    fn from_iter<T: IntoIterator<Item = ValueId>>(iter: T) -> Self {
        let mut values: SmallVec<[ValueId; 2]> = iter.into_iter().collect();
        values.sort_unstable();
        values.dedup();
        Self(values)
    }
}

impl fmt::Display for ValueSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, value) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, "}}")
    }
}

/// Raised by [`VariableMapping::consolidate`] when the paths entering a join leave a variable
/// without a common candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BindingConflict {
    pub variable: VariableId,
    pub candidates: Vec<ValueSet>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableMapping {
    bindings: BTreeMap<VariableId, ValueSet>,
}

impl VariableMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a freshly declared variable. Returns `false` if it was already bound.
    pub fn define(&mut self, var: VariableId, values: ValueSet) -> bool {
        match self.bindings.entry(var) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(entry) => {
                entry.insert(values);
                true
            }
        }
    }

    pub fn assign(&mut self, var: VariableId, values: ValueSet) {
        self.bindings.insert(var, values);
    }

    pub fn lookup(&self, var: VariableId) -> Option<&ValueSet> {
        self.bindings.get(&var)
    }

    /// Commits `var` to `value`, once a use has decided among its candidates.
    pub fn narrow(&mut self, var: VariableId, value: ValueId) {
        self.bindings.insert(var, ValueSet::single(value));
    }

    pub fn variables_holding(&self, value: ValueId) -> impl Iterator<Item = VariableId> + '_ {
        self.bindings
            .iter()
            .filter(move |(_, values)| values.contains(value))
            .map(|(var, _)| *var)
    }

    /// Adds, to every variable, the phis fed by any of its candidates.
    ///
    /// The pre-merge candidates are kept, since a variable that needs no phi at the join still
    /// holds its old value there. Candidates listed in `redefined` are dropped first: those are
    /// the phis of the join itself, and entering the join gives them a new value.
    pub fn apply_phi_map(
        &self,
        phi_map: &FxHashMap<ValueId, ValueSet>,
        redefined: &[ValueId],
    ) -> Self {
        let bindings = self
            .bindings
            .iter()
            .map(|(var, values)| {
                let mut merged: ValueSet = values
                    .iter()
                    .filter(|value| !redefined.contains(value))
                    .collect();
                for value in values.iter() {
                    if let Some(phis) = phi_map.get(&value) {
                        merged.union_with(phis);
                    }
                }
                (*var, merged)
            })
            .collect();
        Self { bindings }
    }

    /// Merges the mappings of every path entering a join.
    ///
    /// Only variables bound on every path survive, each with the candidates common to all paths.
    /// Every candidate a path offers holds the variable's value on that path, so a merged set with
    /// several members names equal values. It is narrowed at the variable's next use.
    pub(crate) fn consolidate(contributions: &[Self]) -> Result<Self, BindingConflict> {
        let Some((first, rest)) = contributions.split_first() else {
            return Ok(Self::default());
        };

        let mut bindings = BTreeMap::new();
        'vars: for (var, values) in &first.bindings {
            let mut common = values.clone();
            for other in rest {
                match other.lookup(*var) {
                    Some(values) => common = common.intersection(values),
                    None => continue 'vars,
                }
            }

            if common.is_empty() {
                return Err(BindingConflict {
                    variable: *var,
                    candidates: contributions
                        .iter()
                        .filter_map(|mapping| mapping.lookup(*var).cloned())
                        .collect(),
                });
            }
            bindings.insert(*var, common);
        }

        Ok(Self { bindings })
    }

    pub fn display<'a>(&'a self, scopes: &'a Scopes) -> DisplayMapping<'a> {
        DisplayMapping {
            mapping: self,
            scopes,
        }
    }
}

pub struct DisplayMapping<'a> {
    mapping: &'a VariableMapping,
    scopes: &'a Scopes,
}

impl fmt::Display for DisplayMapping<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (var, values)) in self.mapping.bindings.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match self.scopes.get_variable(*var) {
                Some(data) => write!(f, "{}: {values}", data.name)?,
                None => write!(f, "{var}: {values}")?,
            }
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[u32]) -> ValueSet {
        values.iter().map(|v| ValueId(*v)).collect()
    }

    #[test]
    fn value_set_is_sorted_and_deduplicated() {
        let values = set(&[3, 1, 3, 2]);
        assert_eq!(values.len(), 3);
        assert_eq!(values.to_string(), "{v1, v2, v3}");
        assert_eq!(values.as_single(), None);
        assert_eq!(set(&[4]).as_single(), Some(ValueId(4)));
        assert_eq!(values.intersection(&set(&[2, 5])), set(&[2]));
    }

    #[test]
    fn define_rejects_rebinding() {
        let mut mapping = VariableMapping::new();
        let x = VariableId(0);
        assert!(mapping.define(x, set(&[1])));
        assert!(!mapping.define(x, set(&[2])));
        mapping.assign(x, set(&[2, 3]));
        mapping.narrow(x, ValueId(3));
        assert_eq!(mapping.lookup(x), Some(&set(&[3])));
    }

    #[test]
    fn phi_map_keeps_pre_merge_candidates() {
        let x = VariableId(0);
        let y = VariableId(1);
        let mut mapping = VariableMapping::new();
        mapping.define(x, set(&[1]));
        mapping.define(y, set(&[2]));

        let mut phi_map = FxHashMap::default();
        phi_map.insert(ValueId(1), set(&[7]));
        let merged = mapping.apply_phi_map(&phi_map, &[ValueId(7)]);

        assert_eq!(merged.lookup(x), Some(&set(&[1, 7])));
        assert_eq!(merged.lookup(y), Some(&set(&[2])));
        assert_eq!(merged.variables_holding(ValueId(7)).collect::<Vec<_>>(), vec![x]);
    }

    #[test]
    fn if_join_yields_one_value() {
        let x = VariableId(0);
        let mut zero = VariableMapping::new();
        zero.define(x, set(&[1]));
        let mut body = VariableMapping::new();
        body.define(x, set(&[2]));

        // v7 merges v1 from the skipped body and v2 from the body.
        let zero_map = [(ValueId(1), set(&[7]))].into_iter().collect();
        let body_map = [(ValueId(2), set(&[7]))].into_iter().collect();
        let zero = zero.apply_phi_map(&zero_map, &[ValueId(7)]);
        let body = body.apply_phi_map(&body_map, &[ValueId(7)]);

        let merged = VariableMapping::consolidate(&[zero, body]).unwrap();
        assert_eq!(merged.lookup(x).and_then(ValueSet::as_single), Some(ValueId(7)));
    }

    #[test]
    fn back_edge_drops_the_headers_own_phis() {
        // let x := 0  for { let i := 0 } lt(i, 10) { i := add(i, 1) } { x := i }
        // v1 is the literal 0, v5 is add(i, 1), v10 and v11 are the header phis of i and x.
        let x = VariableId(0);
        let i = VariableId(1);
        let header_phis = [ValueId(10), ValueId(11)];

        let mut pre = VariableMapping::new();
        pre.define(x, set(&[1]));
        pre.define(i, set(&[1]));
        let entry_map = [(ValueId(1), set(&[10, 11]))].into_iter().collect();
        let entry = pre.apply_phi_map(&entry_map, &header_phis);
        assert_eq!(entry.lookup(x), Some(&set(&[1, 10, 11])));

        let back_map = [(ValueId(5), set(&[10])), (ValueId(10), set(&[11]))]
            .into_iter()
            .collect();
        let mut latch = entry.clone();
        latch.narrow(i, ValueId(10));
        latch.assign(x, set(&[10]));
        latch.assign(i, set(&[5]));
        let back_edge = latch.apply_phi_map(&back_map, &header_phis);
        assert_eq!(back_edge.lookup(x), Some(&set(&[11])));

        let merged = VariableMapping::consolidate(&[entry, back_edge]).unwrap();
        assert_eq!(merged.lookup(x).and_then(ValueSet::as_single), Some(ValueId(11)));
        assert_eq!(merged.lookup(i).and_then(ValueSet::as_single), Some(ValueId(10)));
    }

    #[test]
    fn consolidation_intersects_common_variables() {
        let x = VariableId(0);
        let y = VariableId(1);

        let mut zero = VariableMapping::new();
        zero.define(x, set(&[1, 7]));
        let mut body = VariableMapping::new();
        body.define(x, set(&[2, 7]));
        body.define(y, set(&[3]));

        let merged = VariableMapping::consolidate(&[zero.clone(), body.clone()]).unwrap();
        assert_eq!(merged.lookup(x), Some(&set(&[7])));
        assert_eq!(merged.lookup(y), None);

        body.assign(x, set(&[2]));
        let conflict = VariableMapping::consolidate(&[zero, body]).unwrap_err();
        assert_eq!(conflict.variable, x);
        assert_eq!(conflict.candidates, vec![set(&[1, 7]), set(&[2])]);
    }
}
