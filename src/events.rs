/* ************************************************************************
*   File: events.rs                                     Part of CircleMUD *
*  Usage: Discrete event queue driving timed game actions                 *
*                                                                         *
*  All rights reserved.  See license.doc for complete information.        *
*                                                                         *
*  Copyright (C) 1993, 94 by the Trustees of the Johns Hopkins University *
*  CircleMUD is based on DikuMUD, Copyright (C) 1990, 1991.               *
*  Rust port Copyright (C) 2023, 2024 Laurent Pautet                      *
************************************************************************ */

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::panic::{catch_unwind, AssertUnwindSafe};

use log::error;

use crate::db::DB;
use crate::depot::DepotId;
use crate::error::MudResult;
use crate::structs::{PULSE_AUTOSAVE, PULSE_IDLEPWD, PULSE_MOBILE, PULSE_TICK, PULSE_ZONE};
use crate::Game;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
pub struct EventId(u64);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EventKind {
    /* a spell finishes its casting time */
    CastComplete { ch: DepotId },
    /* affects lose a tick, expired ones wear off */
    AffectUpdate,
    /* regeneration, idling, corpse decay */
    PointUpdate,
    ZoneUpdate,
    MobileActivity,
    Autosave,
    IdlePasswords,
}

impl EventKind {
    /* the character an event belongs to, if any */
    pub fn target(&self) -> Option<DepotId> {
        match self {
            EventKind::CastComplete { ch } => Some(*ch),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Event {
    pub id: EventId,
    pub due: u64,
    pub kind: EventKind,
}

/*
 * Events are kept by due pulse, first scheduled first fired among events of
 * the same pulse.  An event id stays in its queue after a cancel; it is the
 * entry in pending that decides whether it still fires.
 */
#[derive(Default)]
pub struct Scheduler {
    now: u64,
    next_id: u64,
    queue: BTreeMap<u64, VecDeque<EventId>>,
    pending: HashMap<EventId, Event>,
}

impl Scheduler {
    pub fn new() -> Scheduler {
        Scheduler::default()
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /* a delay of 0 still waits for the next pulse */
    pub fn schedule(&mut self, delay: u64, kind: EventKind) -> EventId {
        self.next_id += 1;
        let id = EventId(self.next_id);
        let due = self.now + delay.max(1);
        self.queue.entry(due).or_default().push_back(id);
        self.pending.insert(id, Event { id, due, kind });
        id
    }

    pub fn is_pending(&self, id: EventId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn get(&self, id: EventId) -> Option<&Event> {
        self.pending.get(&id)
    }

    pub fn cancel(&mut self, id: EventId) -> bool {
        self.pending.remove(&id).is_some()
    }

    /* drop everything still queued for a character that leaves the game */
    pub fn cancel_for(&mut self, ch: DepotId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|_, ev| ev.kind.target() != Some(ch));
        before - self.pending.len()
    }

    /*
     * Moves the clock to `now` and unqueues every event due by then, in
     * firing order.  Nothing scheduled after this call can be part of the
     * batch, since its due pulse is at least now + 1.
     */
    pub fn pop_due(&mut self, now: u64) -> Vec<EventId> {
        self.now = self.now.max(now);
        let later = self.queue.split_off(&(self.now + 1));
        let due = std::mem::replace(&mut self.queue, later);
        due.into_values()
            .flatten()
            .filter(|id| self.pending.contains_key(id))
            .collect()
    }

    /* takes a due event out of pending; None when it was cancelled meanwhile */
    pub fn take(&mut self, id: EventId) -> Option<Event> {
        self.pending.remove(&id)
    }

    /*
     * Fires everything due by `now`.  A failing or panicking effect is
     * logged and the rest of the batch still runs.  Returns the number of
     * events that were handed to `effect`.
     */
    pub fn fire_due<F>(&mut self, now: u64, mut effect: F) -> usize
    where
        F: FnMut(&mut Scheduler, Event) -> MudResult<()>,
    {
        let mut fired = 0;
        for id in self.pop_due(now) {
            let ev = match self.take(id) {
                Some(ev) => ev,
                None => continue,
            };
            fired += 1;
            match catch_unwind(AssertUnwindSafe(|| effect(self, ev))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => error!("SYSERR: event {:?} failed: {}", ev.kind, err),
                Err(_) => error!("SYSERR: event {:?} panicked", ev.kind),
            }
        }
        fired
    }
}

impl Game {
    /* the periodic events every running game has */
    pub fn arm_periodic_events(&mut self) {
        self.events.schedule(PULSE_TICK, EventKind::AffectUpdate);
        self.events.schedule(PULSE_TICK, EventKind::PointUpdate);
        self.events.schedule(PULSE_ZONE, EventKind::ZoneUpdate);
        self.events.schedule(PULSE_MOBILE, EventKind::MobileActivity);
        self.events.schedule(PULSE_AUTOSAVE, EventKind::Autosave);
        self.events.schedule(PULSE_IDLEPWD, EventKind::IdlePasswords);
    }

    pub fn run_events(&mut self, db: &mut DB) -> usize {
        let mut fired = 0;
        for id in self.events.pop_due(self.pulse) {
            let ev = match self.events.take(id) {
                Some(ev) => ev,
                None => continue,
            };
            fired += 1;
            match catch_unwind(AssertUnwindSafe(|| self.fire_event(db, ev))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => error!("SYSERR: event {:?} failed: {}", ev.kind, err),
                Err(_) => error!("SYSERR: event {:?} panicked", ev.kind),
            }
        }
        fired
    }

    fn fire_event(&mut self, db: &mut DB, ev: Event) -> MudResult<()> {
        /* periodic events are re-armed first, so a failing run does not stop them */
        let period = match ev.kind {
            EventKind::AffectUpdate | EventKind::PointUpdate => Some(PULSE_TICK),
            EventKind::ZoneUpdate => Some(PULSE_ZONE),
            EventKind::MobileActivity => Some(PULSE_MOBILE),
            EventKind::Autosave => Some(PULSE_AUTOSAVE),
            EventKind::IdlePasswords => Some(PULSE_IDLEPWD),
            EventKind::CastComplete { .. } => None,
        };
        if let Some(period) = period {
            self.events.schedule(period, ev.kind);
        }

        match ev.kind {
            EventKind::CastComplete { ch } => self.finish_casting(db, ch, ev.id),
            EventKind::AffectUpdate => {
                self.affect_update(db);
                Ok(())
            }
            EventKind::PointUpdate => {
                self.point_update(db);
                Ok(())
            }
            EventKind::ZoneUpdate => {
                self.zone_update(db);
                Ok(())
            }
            EventKind::MobileActivity => {
                if !self.config.no_specials {
                    self.mobile_activity(db);
                }
                Ok(())
            }
            EventKind::Autosave => {
                self.autosave(db);
                Ok(())
            }
            EventKind::IdlePasswords => {
                self.check_idle_passwords();
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MudError;

    fn ch(n: u32) -> DepotId {
        let mut depot = crate::depot::Depot::<crate::structs::CharData>::new();
        let mut id = DepotId::default();
        for _ in 0..=n {
            id = depot.push(Default::default());
        }
        id
    }

    #[test]
    fn same_pulse_events_fire_in_schedule_order() {
        let mut sched = Scheduler::new();
        let a = ch(0);
        let b = ch(1);
        sched.schedule(3, EventKind::CastComplete { ch: a });
        sched.schedule(3, EventKind::CastComplete { ch: b });
        sched.schedule(1, EventKind::ZoneUpdate);

        let mut seen = vec![];
        assert_eq!(
            sched.fire_due(3, |_, ev| {
                seen.push(ev.kind);
                Ok(())
            }),
            3
        );
        assert_eq!(
            seen,
            vec![
                EventKind::ZoneUpdate,
                EventKind::CastComplete { ch: a },
                EventKind::CastComplete { ch: b },
            ]
        );
        assert!(sched.is_empty());
    }

    #[test]
    fn firing_twice_in_one_pulse_fires_nothing_twice() {
        let mut sched = Scheduler::new();
        sched.schedule(2, EventKind::Autosave);
        assert_eq!(sched.fire_due(2, |_, _| Ok(())), 1);
        assert_eq!(sched.fire_due(2, |_, _| Ok(())), 0);
    }

    #[test]
    fn events_scheduled_while_firing_wait_for_the_next_pulse() {
        let mut sched = Scheduler::new();
        sched.schedule(1, EventKind::PointUpdate);
        let fired = sched.fire_due(1, |s, ev| {
            s.schedule(0, ev.kind);
            Ok(())
        });
        assert_eq!(fired, 1);
        assert_eq!(sched.len(), 1);
        assert_eq!(sched.fire_due(1, |_, _| Ok(())), 0);
        assert_eq!(sched.fire_due(2, |_, _| Ok(())), 1);
    }

    #[test]
    fn cancelled_events_never_fire() {
        let mut sched = Scheduler::new();
        let a = ch(0);
        let first = sched.schedule(5, EventKind::CastComplete { ch: a });
        let second = sched.schedule(5, EventKind::ZoneUpdate);
        assert!(sched.cancel(first));
        assert!(!sched.cancel(first));

        /* an effect can cancel a later event of its own batch */
        let third = sched.schedule(5, EventKind::Autosave);
        let mut seen = vec![];
        sched.fire_due(5, |s, ev| {
            seen.push(ev.id);
            s.cancel(third);
            Ok(())
        });
        assert_eq!(seen, vec![second]);
    }

    #[test]
    fn cancel_for_drops_only_that_characters_events() {
        let mut sched = Scheduler::new();
        let a = ch(0);
        let b = ch(1);
        sched.schedule(4, EventKind::CastComplete { ch: a });
        sched.schedule(4, EventKind::CastComplete { ch: b });
        sched.schedule(4, EventKind::AffectUpdate);
        assert_eq!(sched.cancel_for(a), 1);
        assert_eq!(sched.len(), 2);
    }

    #[test]
    fn failing_and_panicking_events_do_not_stop_the_batch() {
        let mut sched = Scheduler::new();
        sched.schedule(1, EventKind::ZoneUpdate);
        sched.schedule(1, EventKind::MobileActivity);
        sched.schedule(1, EventKind::Autosave);
        let mut ok = vec![];
        let fired = sched.fire_due(1, |_, ev| match ev.kind {
            EventKind::ZoneUpdate => Err(MudError::invalid("broken zone")),
            EventKind::MobileActivity => panic!("mobile activity blew up"),
            kind => {
                ok.push(kind);
                Ok(())
            }
        });
        assert_eq!(fired, 3);
        assert_eq!(ok, vec![EventKind::Autosave]);
    }
}
