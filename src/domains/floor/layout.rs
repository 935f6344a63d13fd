use crate::domains::man_service::MAN_WIDTH;
use std::collections::HashMap;

use super::models::FloorModels;

/// Fixed y of each agent kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lanes {
    pub winder: i64,
    pub doffer: i64,
    pub sleever: i64,
    pub spooler: i64,
    pub man: i64,
}

/// Starting positions of every agent, in mm.
#[derive(Debug, Clone, Default)]
pub struct FloorLayout {
    pub winder_x: HashMap<String, i64>,
    pub doffer_x: HashMap<String, i64>,
    pub sleever_x: HashMap<String, i64>,
    pub spooler_x: HashMap<String, i64>,
    pub man_x: HashMap<String, i64>,
    pub service_zones: Vec<i64>,
    pub lanes: Lanes,
}

/// Lay the floor out along x.
///
/// Winders are grouped by doffer; every group is preceded by a zone-wide gap
/// and followed by a service zone. Spooler sections are centred under their
/// group. The n-th doffer and sleever start in the n-th service zone.
pub fn plan_layout(models: &FloorModels) -> FloorLayout {
    let zone_width = models.settings.service_zone_width;
    let space = models.settings.space_between_winders;
    let mut layout = FloorLayout::default();

    let mut x = 0;
    let mut group: Option<&str> = None;
    let mut group_size = 0;
    for winder in &models.winders {
        if group != Some(winder.doffer_id.as_str()) {
            if group_size > 0 {
                layout.service_zones.push(x);
                x += zone_width;
            }
            x += zone_width;
            group = Some(winder.doffer_id.as_str());
            group_size = 0;
        }
        layout.winder_x.insert(winder.id.clone(), x);
        x += winder.width + space;
        group_size += 1;
    }
    layout.service_zones.push(x);

    let zone_at = |i: usize, zones: &[i64]| zones.get(i).or(zones.last()).copied().unwrap_or(0);

    for (i, doffer) in models.doffers.iter().enumerate() {
        layout.doffer_x.insert(doffer.id.clone(), zone_at(i, &layout.service_zones));
    }
    for (i, sleever) in models.sleevers.iter().enumerate() {
        layout.sleever_x.insert(sleever.id.clone(), zone_at(i, &layout.service_zones));
    }

    let mut x = zone_width;
    let mut group: Option<&str> = None;
    let mut group_index = 0;
    let mut section: Vec<(String, i64)> = Vec::new();
    for spooler in &models.spoolers {
        if group.is_some() && group != Some(spooler.doffer_id.as_str()) {
            let zone = zone_at(group_index, &layout.service_zones);
            centre_section(&mut layout.spooler_x, &section, zone);
            x = zone + 2 * zone_width;
            group_index += 1;
            section.clear();
        }
        group = Some(spooler.doffer_id.as_str());
        let width = spooler.cell_width * spooler.columns as i64;
        layout.spooler_x.insert(spooler.id.clone(), x);
        section.push((spooler.id.clone(), width));
        x += width + space;
    }
    let zone = zone_at(group_index, &layout.service_zones);
    centre_section(&mut layout.spooler_x, &section, zone);

    for (i, man) in models.men.iter().enumerate() {
        layout.man_x.insert(man.id.clone(), i as i64 * (MAN_WIDTH + space));
    }

    let winder_height = models.winders.iter().map(|w| w.width * 3 / 2).max().unwrap_or(0);
    let doffer_height = models.doffers.iter().map(|d| d.width / 4).max().unwrap_or(0);
    let sleever_height = models.sleevers.iter().map(|s| s.width / 4).max().unwrap_or(0);
    let spooler_height = models
        .spoolers
        .iter()
        .map(|s| s.cell_width * s.rows as i64)
        .max()
        .unwrap_or(0);

    let doffer = winder_height;
    let sleever = doffer + doffer_height + space;
    let spooler = sleever + sleever_height + space;
    layout.lanes = Lanes {
        winder: 0,
        doffer,
        sleever,
        spooler,
        man: spooler + spooler_height + space,
    };
    layout
}

fn centre_section(positions: &mut HashMap<String, i64>, section: &[(String, i64)], zone_x: i64) {
    let (Some(first), Some(last)) = (section.first(), section.last()) else { return };
    let start = positions.get(&first.0).copied().unwrap_or(0);
    let end = positions.get(&last.0).copied().unwrap_or(0) + last.1;
    let offset = (zone_x - start - (end - start)) / 2;
    for (id, _) in section {
        if let Some(x) = positions.get_mut(id) {
            *x += offset;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::floor::models::*;

    fn winder(id: &str, doffer: &str) -> WinderModel {
        WinderModel {
            id: id.into(),
            doffer_id: doffer.into(),
            sleever_id: doffer.replace('D', "S"),
            half_mode: false,
            time_wind: 1000,
            time_exchange: 100,
            time_alert: 100,
            width: 1000,
        }
    }

    fn spooler(id: &str, doffer: &str) -> SpoolerModel {
        SpoolerModel {
            id: id.into(),
            doffer_id: doffer.into(),
            rows: 2,
            columns: 2,
            cell_width: 300,
            double_sided: false,
        }
    }

    #[test]
    fn groups_are_separated_by_service_zones() {
        let models = FloorModels {
            winders: vec![winder("W_1", "D_1"), winder("W_2", "D_1"), winder("W_3", "D_2")],
            spoolers: vec![spooler("SP_1", "D_1"), spooler("SP_2", "D_2")],
            ..FloorModels::default()
        };
        let layout = plan_layout(&models);

        assert_eq!(layout.winder_x["W_1"], 1000);
        assert_eq!(layout.winder_x["W_2"], 2200);
        assert_eq!(layout.winder_x["W_3"], 5400);
        assert_eq!(layout.service_zones, vec![3400, 6600]);

        assert_eq!(layout.spooler_x["SP_1"], 1900);
        assert_eq!(layout.spooler_x["SP_2"], 5700);
    }

    #[test]
    fn mobile_agents_start_in_their_zone() {
        let models = FloorModels {
            winders: vec![winder("W_1", "D_1"), winder("W_2", "D_2")],
            doffers: vec![
                DofferModel { id: "D_1".into(), speed: 1, acceleration: 1, time_get_in: 1, time_put_down: 1, width: 800 },
                DofferModel { id: "D_2".into(), speed: 1, acceleration: 1, time_get_in: 1, time_put_down: 1, width: 800 },
            ],
            men: vec![
                ManServiceModel {
                    id: "Man_1".into(),
                    speed: 1,
                    time_start_winder: 1,
                    time_rotate_spooler: 1,
                    time_change_spooler: 1,
                    time_load_sleever: 1,
                    time_cut_edge: 1,
                },
            ],
            ..FloorModels::default()
        };
        let layout = plan_layout(&models);
        assert_eq!(layout.doffer_x["D_1"], layout.service_zones[0]);
        assert_eq!(layout.doffer_x["D_2"], layout.service_zones[1]);
        assert_eq!(layout.man_x["Man_1"], 0);
        assert_eq!(layout.lanes.doffer, 1500);
        assert_eq!(layout.lanes.sleever, 1500 + 200 + 200);
    }
}
