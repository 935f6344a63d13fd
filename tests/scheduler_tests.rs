mod common;

use common::{manual_settings, started, tiny_floor};
use winding_floor::common::DomainError;
use winding_floor::domains::floor::FloorSettings;
use winding_floor::domains::tasks::{TaskStatus, TaskType};
use winding_floor::domains::winder::WinderStatus;

fn open_of(floor: &winding_floor::domains::floor::Floor, task_type: TaskType) -> usize {
    floor
        .registry()
        .iter()
        .filter(|t| t.task_type == task_type && !t.status.is_finished())
        .count()
}

#[test]
fn start_winders_queues_one_start_per_winder() {
    let models = tiny_floor();
    let mut floor = started(&models, manual_settings());
    assert_eq!(open_of(&floor, TaskType::StartWinder), 0);

    floor.start_winders();
    floor.start_winders();

    assert_eq!(open_of(&floor, TaskType::StartWinder), 1);
    let task = floor
        .registry()
        .find_open(TaskType::StartWinder, |t| t.object() == "W_1")
        .expect("start task");
    assert_eq!(task.assignee_id, "Man_1");
    assert_eq!(task.status, TaskStatus::New);
}

#[test]
fn service_man_loads_and_starts_the_winder() {
    let models = tiny_floor();
    let mut floor = started(&models, FloorSettings::default());
    assert_eq!(open_of(&floor, TaskType::StartWinder), 1);

    floor.advance(10_000).unwrap();

    let winder = floor.winder("W_1").unwrap();
    assert_eq!(winder.status, WinderStatus::Loaded);
    assert!(winder.is_winding());
    assert_eq!(open_of(&floor, TaskType::StartWinder), 0);
}

#[test]
fn delivery_pauses_without_enough_free_cells() {
    let mut models = tiny_floor();
    models.spoolers[0].rows = 1;
    models.spoolers[0].columns = 1;
    let mut floor = started(&models, manual_settings());

    floor.winder_mut("W_1").unwrap().set_status(WinderStatus::Ready);
    floor.bobbins_ready("W_1");
    floor.bobbins_ready("W_1");
    assert_eq!(open_of(&floor, TaskType::DeliverBobbins), 1);

    floor.run_scheduler();

    let task = floor
        .registry()
        .find_open(TaskType::DeliverBobbins, |t| t.object() == "W_1")
        .expect("delivery task");
    assert_eq!(task.status, TaskStatus::Paused);
    assert!(task.reservations.is_empty());
    assert_eq!(floor.registry().reservation_count(), 0);

    let tally = floor.spooler("SP_1").unwrap().tally();
    assert_eq!(tally.free, 1);
    assert_eq!(tally.reserved, 0);
    assert!(!floor.doffer("D_1").unwrap().is_moving());
}

#[test]
fn delivery_reserves_cells_and_sends_the_doffer() {
    let models = tiny_floor();
    let mut floor = started(&models, manual_settings());

    floor.winder_mut("W_1").unwrap().set_status(WinderStatus::Ready);
    floor.bobbins_ready("W_1");
    floor.run_scheduler();

    let task = floor
        .registry()
        .find_open(TaskType::DeliverBobbins, |t| t.object() == "W_1")
        .expect("delivery task");
    assert_eq!(task.status, TaskStatus::Progress);
    assert_eq!(task.reservations.len(), 2);
    assert_eq!(floor.spooler("SP_1").unwrap().tally().reserved, 2);

    let doffer = floor.doffer("D_1").unwrap();
    assert!(doffer.is_moving());
    assert_eq!(doffer.destination().x, floor.winder("W_1").unwrap().bobbins_point().x);
}

#[test]
fn bobbins_of_a_failed_winder_are_ignored() {
    let models = tiny_floor();
    let mut floor = started(&models, manual_settings());

    floor.winder_mut("W_1").unwrap().set_status(WinderStatus::Fail);
    floor.bobbins_ready("W_1");

    assert_eq!(open_of(&floor, TaskType::DeliverBobbins), 0);
}

#[test]
fn full_cycle_fills_the_spooler_and_reloads_the_winder() {
    let models = tiny_floor();
    let mut floor = started(&models, FloorSettings::default());

    floor.advance(700_000).unwrap();

    let tally = floor.spooler("SP_1").unwrap().tally();
    assert!(tally.occupied >= 2, "bobbins put down: {:?}", tally);
    assert_eq!(tally.reserved, 0);

    let sleever = floor.sleever("S_1").unwrap();
    assert!(sleever.sleeves() <= 18);
    assert_ne!(floor.winder("W_1").unwrap().status, WinderStatus::Fail);
}

#[test]
fn stopped_floor_refuses_to_step() {
    let models = tiny_floor();
    let mut floor = started(&models, manual_settings());
    floor.stop();

    assert!(!floor.is_running());
    assert!(floor.step().is_err());
    assert!(floor.registry().is_empty());
    assert!(floor.winder("W_1").is_none());
}

#[test]
fn unloaded_winder_fails_and_drops_new_deliveries() {
    let mut models = tiny_floor();
    models.winders[0].time_wind = 2_000;
    let settings = FloorSettings {
        scheduler_period_ms: 10_000_000,
        ..manual_settings()
    };
    let mut floor = started(&models, settings);

    let winder = floor.winder_mut("W_1").unwrap();
    winder.set_status(WinderStatus::Loaded);
    winder.start_winding().unwrap();
    // Bobbins taken but no fresh sleeves put in.
    winder.set_status(WinderStatus::Ready);
    floor.bobbins_ready("W_1");
    let delivery = floor
        .registry()
        .find_open(TaskType::DeliverBobbins, |t| t.object() == "W_1")
        .map(|t| t.id.clone())
        .expect("delivery task");

    floor.advance(3_000).unwrap();

    assert_eq!(floor.winder("W_1").unwrap().status, WinderStatus::Fail);
    assert_eq!(floor.registry().get(&delivery).unwrap().status, TaskStatus::Cancelled);
    assert!(floor
        .registry()
        .find_open(TaskType::StartWinder, |t| t.object() == "W_1")
        .is_some());
}

#[test]
fn operator_cancel_releases_the_delivery() {
    let models = tiny_floor();
    let mut floor = started(&models, manual_settings());

    floor.winder_mut("W_1").unwrap().set_status(WinderStatus::Ready);
    floor.bobbins_ready("W_1");
    floor.run_scheduler();
    let delivery = floor
        .registry()
        .find_open(TaskType::DeliverBobbins, |t| t.object() == "W_1")
        .map(|t| t.id.clone())
        .expect("delivery task");
    assert_eq!(floor.spooler("SP_1").unwrap().tally().reserved, 2);

    floor.cancel_session(&delivery, "operator").unwrap();

    assert_eq!(floor.registry().get(&delivery).unwrap().status, TaskStatus::Cancelled);
    assert_eq!(floor.spooler("SP_1").unwrap().tally().reserved, 0);
    assert!(matches!(
        floor.cancel_session(&delivery, "again"),
        Err(DomainError::SessionNotFound { .. })
    ));
    assert!(matches!(
        floor.cancel_session("no-such-task", "operator"),
        Err(DomainError::SessionNotFound { .. })
    ));
}
