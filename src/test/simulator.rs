use crate::error::SimError;
use crate::sim::{Event, SimTime, Simulator, World};
use std::any::Any;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct DummyWorld {
    ticks: usize,
    completed: usize,
    busy: bool,
}

impl World for DummyWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn on_tick(&mut self, _sim: &mut Simulator) {
        self.ticks = self.ticks.saturating_add(1);
    }

    fn has_pending_work(&self) -> bool {
        self.busy
    }

    fn on_complete(&mut self, _sim: &mut Simulator) {
        self.completed += 1;
    }
}

struct Push {
    id: u32,
    log: Arc<Mutex<Vec<u32>>>,
}

impl Event for Push {
    fn execute(self: Box<Self>, _sim: &mut Simulator, _world: &mut dyn World) -> Result<(), SimError> {
        let Push { id, log } = *self;
        log.lock().expect("log lock").push(id);
        Ok(())
    }
}

struct PushThenScheduleNow {
    id: u32,
    next_id: u32,
    log: Arc<Mutex<Vec<u32>>>,
}

impl Event for PushThenScheduleNow {
    fn execute(self: Box<Self>, sim: &mut Simulator, _world: &mut dyn World) -> Result<(), SimError> {
        let PushThenScheduleNow { id, next_id, log } = *self;
        log.lock().expect("log lock").push(id);
        sim.schedule(sim.now(), Push { id: next_id, log })?;
        Ok(())
    }
}

/// 试图把事件调度到过去
struct ScheduleInPast;

impl Event for ScheduleInPast {
    fn execute(self: Box<Self>, sim: &mut Simulator, _world: &mut dyn World) -> Result<(), SimError> {
        let log = Arc::new(Mutex::new(Vec::new()));
        sim.schedule(SimTime(sim.now().0 - 1), Push { id: 0, log })?;
        Ok(())
    }
}

#[test]
fn scheduled_events_order_by_time_then_seq() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    sim.schedule(
        SimTime(10),
        Push {
            id: 1,
            log: Arc::clone(&log),
        },
    )
    .expect("schedule");
    sim.schedule(
        SimTime(5),
        Push {
            id: 2,
            log: Arc::clone(&log),
        },
    )
    .expect("schedule");
    sim.schedule(
        SimTime(10),
        Push {
            id: 3,
            log: Arc::clone(&log),
        },
    )
    .expect("schedule");

    let mut world = DummyWorld::default();
    sim.run(&mut world).expect("run");

    assert_eq!(&*log.lock().expect("log lock"), &[2, 1, 3]);
    assert_eq!(world.ticks, 3);
    assert_eq!(world.completed, 1);
    assert_eq!(sim.now(), SimTime(10));
}

#[test]
fn event_scheduled_at_same_time_inside_event_runs_after_current_event() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    sim.schedule_now(PushThenScheduleNow {
        id: 1,
        next_id: 2,
        log: Arc::clone(&log),
    });

    let mut world = DummyWorld::default();
    sim.run(&mut world).expect("run");

    assert_eq!(&*log.lock().expect("log lock"), &[1, 2]);
    assert_eq!(world.ticks, 2);
    assert_eq!(sim.now(), SimTime::ZERO);
}

#[test]
fn scheduling_before_now_is_a_logical_time_violation() {
    let mut sim = Simulator::default();
    sim.schedule(SimTime(10), ScheduleInPast).expect("schedule");

    let mut world = DummyWorld::default();
    let err = sim.run(&mut world).expect_err("must abort");
    assert_eq!(
        err,
        SimError::LogicalTimeViolation {
            now: SimTime(10),
            at: SimTime(9)
        }
    );
    assert!(err.is_fatal());
    assert_eq!(world.completed, 0, "aborted run must not signal completion");
}

#[test]
fn canceled_events_are_skipped() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    let first = sim
        .schedule(
            SimTime(1),
            Push {
                id: 1,
                log: Arc::clone(&log),
            },
        )
        .expect("schedule");
    sim.schedule_in(
        SimTime(2),
        Push {
            id: 2,
            log: Arc::clone(&log),
        },
    );
    sim.cancel(first);
    assert_eq!(sim.pending_events(), 1);
    assert_eq!(sim.next_event_time(), Some(SimTime(2)));

    let mut world = DummyWorld::default();
    sim.run(&mut world).expect("run");

    assert_eq!(&*log.lock().expect("log lock"), &[2]);
    assert_eq!(sim.processed_events(), 1);
    assert_eq!(world.ticks, 1);
}

#[test]
fn advance_processes_one_event_at_a_time() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    for (id, at) in [(1, 3), (2, 7)] {
        sim.schedule(
            SimTime(at),
            Push {
                id,
                log: Arc::clone(&log),
            },
        )
        .expect("schedule");
    }

    let mut world = DummyWorld::default();
    assert!(sim.advance(&mut world).expect("advance"));
    assert_eq!(sim.now(), SimTime(3));
    assert_eq!(&*log.lock().expect("log lock"), &[1]);
    assert!(!sim.is_done(&world));

    assert!(sim.advance(&mut world).expect("advance"));
    assert_eq!(sim.now(), SimTime(7));
    assert!(sim.is_done(&world));

    assert!(!sim.advance(&mut world).expect("advance"));
    assert_eq!(world.completed, 0, "advance never signals completion");
}

#[test]
fn is_done_respects_world_pending_work() {
    let sim = Simulator::default();
    let world = DummyWorld {
        busy: true,
        ..Default::default()
    };
    assert!(!sim.is_done(&world));
    assert!(sim.is_done(&DummyWorld::default()));
}

#[test]
fn run_until_skips_events_after_until_and_advances_time() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    sim.schedule_now(Push {
        id: 1,
        log: Arc::clone(&log),
    });
    sim.schedule(
        SimTime(10),
        Push {
            id: 2,
            log: Arc::clone(&log),
        },
    )
    .expect("schedule");

    let mut world = DummyWorld::default();
    sim.run_until(SimTime(5), &mut world).expect("run_until");

    assert_eq!(&*log.lock().expect("log lock"), &[1]);
    assert_eq!(world.ticks, 1);
    assert_eq!(world.completed, 0);
    assert_eq!(sim.now(), SimTime(5));

    sim.run(&mut world).expect("run");
    assert_eq!(&*log.lock().expect("log lock"), &[1, 2]);
    assert_eq!(world.ticks, 2);
    assert_eq!(world.completed, 1);
    assert_eq!(sim.now(), SimTime(10));
}

#[test]
fn run_until_executes_events_scheduled_exactly_at_until() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    sim.schedule(
        SimTime(5),
        Push {
            id: 1,
            log: Arc::clone(&log),
        },
    )
    .expect("schedule");

    let mut world = DummyWorld::default();
    sim.run_until(SimTime(5), &mut world).expect("run_until");

    assert_eq!(&*log.lock().expect("log lock"), &[1]);
    assert_eq!(world.ticks, 1);
    assert_eq!(sim.now(), SimTime(5));
}

#[test]
fn run_until_advances_time_even_if_there_are_no_events() {
    let mut sim = Simulator::default();
    let mut world = DummyWorld::default();

    sim.run_until(SimTime(7), &mut world).expect("run_until");
    assert_eq!(sim.now(), SimTime(7));
    assert_eq!(world.ticks, 0);
}

#[test]
fn advance_through_leaves_the_clock_at_the_last_event() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    sim.schedule(
        SimTime(3),
        Push {
            id: 1,
            log: Arc::clone(&log),
        },
    )
    .expect("schedule");
    let late = sim
        .schedule(
            SimTime(20),
            Push {
                id: 2,
                log: Arc::clone(&log),
            },
        )
        .expect("schedule");

    let mut world = DummyWorld::default();
    sim.advance_through(SimTime(10), &mut world)
        .expect("advance_through");

    assert_eq!(&*log.lock().expect("log lock"), &[1]);
    assert_eq!(sim.now(), SimTime(3));
    assert_eq!(world.completed, 0);
    assert!(sim.is_scheduled(late));

    sim.cancel(late);
    assert!(!sim.is_scheduled(late));
    assert_eq!(sim.pending_events(), 0);
}
