//! Subsumption closure over one entity kind

use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;

/// `definition.0` is equivalent to the intersection of `definition.1`
pub(crate) type Definition<T> = (T, Vec<T>);

/// Reflexive-transitive told subsumption with unsatisfiable members routed
/// under the bottom entity
#[derive(Debug, Clone)]
pub(crate) struct Taxonomy<T> {
    /// Reflexive-transitive told supers, top included
    supers: HashMap<T, HashSet<T>>,
    unsatisfiable: HashSet<T>,
    /// Satisfiable member -> supers minus itself and its equivalents
    strict: HashMap<T, HashSet<T>>,
    /// Satisfiable member -> minimal strict supers
    direct: HashMap<T, HashSet<T>>,
}

impl<T: Clone + Eq + Hash> Taxonomy<T> {
    /// Empty taxonomy holding only top and bottom
    pub fn trivial(top: T, bottom: T) -> Self {
        Self::build(HashSet::new(), HashMap::new(), &[], HashSet::new(), top, bottom)
    }

    pub fn build(
        mut members: HashSet<T>,
        mut told: HashMap<T, HashSet<T>>,
        definitions: &[Definition<T>],
        clashes: HashSet<T>,
        top: T,
        bottom: T,
    ) -> Self {
        members.insert(top.clone());
        members.insert(bottom.clone());
        for (sub, sups) in &told {
            members.insert(sub.clone());
            members.extend(sups.iter().cloned());
        }
        for (defined, conjuncts) in definitions {
            members.insert(defined.clone());
            members.extend(conjuncts.iter().cloned());
        }

        let mut supers = Self::closure(&members, &told, &top);
        loop {
            let mut changed = false;
            for (defined, conjuncts) in definitions {
                if conjuncts.is_empty() {
                    continue;
                }
                for member in &members {
                    let member_supers = &supers[member];
                    if member != defined
                        && !member_supers.contains(defined)
                        && conjuncts.iter().all(|c| member_supers.contains(c))
                    {
                        told.entry(member.clone()).or_default().insert(defined.clone());
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
            supers = Self::closure(&members, &told, &top);
        }

        let mut base = clashes;
        base.insert(bottom.clone());
        let unsatisfiable: HashSet<T> = members
            .iter()
            .filter(|member| supers[*member].iter().any(|s| base.contains(s)))
            .cloned()
            .collect();

        let strict: HashMap<T, HashSet<T>> = members
            .iter()
            .filter(|member| !unsatisfiable.contains(*member))
            .map(|member| {
                let own = supers[member]
                    .iter()
                    .filter(|s| !supers[*s].contains(member))
                    .cloned()
                    .collect();
                (member.clone(), own)
            })
            .collect();

        let direct = strict
            .iter()
            .map(|(member, own)| {
                let minimal = own
                    .iter()
                    .filter(|candidate| {
                        !own.iter().any(|other| other != *candidate && strict[other].contains(*candidate))
                    })
                    .cloned()
                    .collect();
                (member.clone(), minimal)
            })
            .collect();

        Self {
            supers,
            unsatisfiable,
            strict,
            direct,
        }
    }

    fn closure(members: &HashSet<T>, told: &HashMap<T, HashSet<T>>, top: &T) -> HashMap<T, HashSet<T>> {
        members
            .iter()
            .map(|member| {
                let mut seen = HashSet::from([member.clone(), top.clone()]);
                let mut queue = VecDeque::from([member.clone()]);
                while let Some(current) = queue.pop_front() {
                    for sup in told.get(&current).into_iter().flatten() {
                        if seen.insert(sup.clone()) {
                            queue.push_back(sup.clone());
                        }
                    }
                }
                (member.clone(), seen)
            })
            .collect()
    }

    pub fn contains(&self, entity: &T) -> bool {
        self.supers.contains_key(entity)
    }

    /// Unknown entities are treated as satisfiable
    pub fn is_satisfiable(&self, entity: &T) -> bool {
        !self.unsatisfiable.contains(entity)
    }

    pub fn unsatisfiable(&self) -> HashSet<T> {
        self.unsatisfiable.clone()
    }

    pub fn members(&self) -> impl Iterator<Item = &T> {
        self.supers.keys()
    }

    /// Reflexive told closure, ignoring satisfiability
    pub fn closure_of(&self, entity: &T) -> Option<&HashSet<T>> {
        self.supers.get(entity)
    }

    pub fn len(&self) -> usize {
        self.supers.len()
    }

    pub fn equivalents(&self, entity: &T) -> HashSet<T> {
        if !self.contains(entity) {
            return HashSet::new();
        }
        if !self.is_satisfiable(entity) {
            return self
                .unsatisfiable
                .iter()
                .filter(|u| *u != entity)
                .cloned()
                .collect();
        }
        self.supers[entity]
            .iter()
            .filter(|s| *s != entity && self.supers.get(*s).is_some_and(|ss| ss.contains(entity)))
            .cloned()
            .collect()
    }

    pub fn supers(&self, entity: &T, direct: bool) -> HashSet<T> {
        if !self.contains(entity) {
            return HashSet::new();
        }
        if !self.is_satisfiable(entity) {
            // Unsatisfiable entities sit below every satisfiable one
            return self
                .strict
                .keys()
                .filter(|m| !direct || !self.direct.values().any(|d| d.contains(*m)))
                .cloned()
                .collect();
        }
        let table = if direct { &self.direct } else { &self.strict };
        table.get(entity).cloned().unwrap_or_default()
    }

    pub fn subs(&self, entity: &T, direct: bool) -> HashSet<T> {
        if !self.contains(entity) || !self.is_satisfiable(entity) {
            return HashSet::new();
        }
        let table = if direct { &self.direct } else { &self.strict };
        table
            .iter()
            .filter(|(_, sups)| sups.contains(entity))
            .map(|(member, _)| member.clone())
            .collect()
    }
}
