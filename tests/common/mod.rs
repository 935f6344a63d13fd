#![allow(dead_code)]

use winding_floor::adapters::outbound::init_noop_logger;
use winding_floor::domains::floor::{
    DofferModel, Floor, FloorModels, FloorSettings, LayoutSettings, ManServiceModel, SleeverModel, SpoolerModel,
    WinderModel,
};

/// One winder served by one doffer, one sleever, one 2x2 spooler and one man.
pub fn tiny_floor() -> FloorModels {
    FloorModels {
        winders: vec![WinderModel {
            id: "W_1".into(),
            doffer_id: "D_1".into(),
            sleever_id: "S_1".into(),
            half_mode: false,
            time_wind: 600_000,
            time_exchange: 500,
            time_alert: 5_000,
            width: 1000,
        }],
        doffers: vec![DofferModel {
            id: "D_1".into(),
            speed: 500,
            acceleration: 100,
            time_get_in: 1_000,
            time_put_down: 1_000,
            width: 1600,
        }],
        sleevers: vec![SleeverModel {
            id: "S_1".into(),
            speed: 500,
            acceleration: 100,
            time_put_down: 1_000,
            time_prepare: 500,
            sleeve_slots: 20,
            rings: 10,
            width: 1600,
        }],
        spoolers: vec![SpoolerModel {
            id: "SP_1".into(),
            doffer_id: "D_1".into(),
            rows: 2,
            columns: 2,
            cell_width: 300,
            double_sided: false,
        }],
        men: vec![ManServiceModel {
            id: "Man_1".into(),
            speed: 500,
            time_start_winder: 1_000,
            time_rotate_spooler: 1_000,
            time_change_spooler: 1_000,
            time_load_sleever: 1_000,
            time_cut_edge: 1_000,
        }],
        settings: LayoutSettings {
            space_between_winders: 200,
            service_zone_width: 1000,
            time_coefficient: 1,
        },
    }
}

pub fn manual_settings() -> FloorSettings {
    FloorSettings {
        auto_start_winders: false,
        ..FloorSettings::default()
    }
}

pub fn started(models: &FloorModels, settings: FloorSettings) -> Floor {
    let mut floor = Floor::new(settings, init_noop_logger());
    floor.start(models).expect("floor starts");
    floor
}
