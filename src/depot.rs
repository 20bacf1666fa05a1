/* ************************************************************************
*   File: depot.rs                                      Part of CircleMUD *
*  Usage: Generational arena owning characters, objects and descriptors   *
*                                                                         *
*  All rights reserved.  See license.doc for complete information.        *
*                                                                         *
*  Copyright (C) 1993, 94 by the Trustees of the Johns Hopkins University *
*  CircleMUD is based on DikuMUD, Copyright (C) 1990, 1991.               *
*  Rust port Copyright (C) 2023, 2024 Laurent Pautet                      *
************************************************************************ */

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default, Serialize, Deserialize)]
pub struct DepotId {
    index: u32,
    seq: u32,
}

impl fmt::Display for DepotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.seq)
    }
}

pub trait HasId {
    fn id(&self) -> DepotId;
    fn set_id(&mut self, id: DepotId);
}

struct Slot<T> {
    free: bool,
    seq: u32,
    value: T,
}

/*
 * A slot is reused once freed, but its sequence number changes, so a stale
 * DepotId held by a weak reference (fighting, casting target...) simply
 * stops resolving instead of pointing at a new entity.
 */
pub struct Depot<T>
where
    T: Default + HasId,
{
    slots: Vec<Slot<T>>,
    size: usize,
    seq: u32,
}

impl<T> Default for Depot<T>
where
    T: Default + HasId,
{
    fn default() -> Self {
        Depot::new()
    }
}

impl<T> Depot<T>
where
    T: Default + HasId,
{
    pub fn new() -> Depot<T> {
        Depot {
            slots: vec![],
            size: 0,
            seq: 0,
        }
    }

    pub fn clear(&mut self) {
        self.size = 0;
        self.slots.clear()
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn push(&mut self, mut item: T) -> DepotId {
        self.seq += 1;
        let idx = match self.slots.iter().position(|s| s.free) {
            None => {
                self.slots.push(Slot {
                    seq: self.seq,
                    free: false,
                    value: T::default(),
                });
                self.slots.len() - 1
            }
            Some(pos) => pos,
        };
        let ret = DepotId {
            index: idx as u32,
            seq: self.seq,
        };
        item.set_id(ret);
        let slot = &mut self.slots[idx];
        slot.free = false;
        slot.seq = self.seq;
        slot.value = item;
        self.size += 1;
        ret
    }

    fn slot_index(&self, id: DepotId) -> Option<usize> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.free || slot.seq != id.seq {
            return None;
        }
        Some(id.index as usize)
    }

    pub fn contains(&self, id: DepotId) -> bool {
        self.slot_index(id).is_some()
    }

    pub fn remove(&mut self, id: DepotId) -> Option<T> {
        let idx = self.slot_index(id)?;
        self.slots[idx].free = true;
        self.size -= 1;
        Some(std::mem::take(&mut self.slots[idx].value))
    }

    pub fn get(&self, id: DepotId) -> Option<&T> {
        let idx = self.slot_index(id)?;
        Some(&self.slots[idx].value)
    }

    pub fn get_mut(&mut self, id: DepotId) -> Option<&mut T> {
        let idx = self.slot_index(id)?;
        Some(&mut self.slots[idx].value)
    }

    /* live ids, in slot order */
    pub fn ids(&self) -> Vec<DepotId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.free)
            .map(|(index, s)| DepotId {
                index: index as u32,
                seq: s.seq,
            })
            .collect()
    }

    pub fn iter(&self) -> DepotRefIterator<T> {
        DepotRefIterator {
            depot: self,
            index: 0,
        }
    }
}

pub struct DepotRefIterator<'a, T>
where
    T: Default + HasId,
{
    depot: &'a Depot<T>,
    index: usize,
}

impl<'a, T> Iterator for DepotRefIterator<'a, T>
where
    T: Default + HasId,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        while self.index < self.depot.slots.len() {
            let slot = &self.depot.slots[self.index];
            self.index += 1;
            if !slot.free {
                return Some(&slot.value);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Thing {
        id: DepotId,
        name: &'static str,
    }

    impl HasId for Thing {
        fn id(&self) -> DepotId {
            self.id
        }

        fn set_id(&mut self, id: DepotId) {
            self.id = id;
        }
    }

    #[test]
    fn stale_ids_do_not_resolve_after_reuse() {
        let mut depot = Depot::new();
        let a = depot.push(Thing { name: "a", ..Default::default() });
        assert_eq!(depot.get(a).map(|t| t.id()), Some(a));
        assert_eq!(depot.remove(a).map(|t| t.name), Some("a"));

        let b = depot.push(Thing { name: "b", ..Default::default() });
        assert!(depot.get(a).is_none());
        assert!(depot.remove(a).is_none());
        assert_eq!(depot.get(b).map(|t| t.name), Some("b"));
        assert_eq!(depot.len(), 1);
    }

    #[test]
    fn ids_and_iter_skip_free_slots() {
        let mut depot = Depot::new();
        let a = depot.push(Thing { name: "a", ..Default::default() });
        let b = depot.push(Thing { name: "b", ..Default::default() });
        let c = depot.push(Thing { name: "c", ..Default::default() });
        depot.remove(b);
        assert_eq!(depot.ids(), vec![a, c]);
        let names: Vec<_> = depot.iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["a", "c"]);
    }
}
