use crate::common::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Records loaded once at start. Lengths in mm, durations in ms, speeds in
/// mm/s, accelerations in mm/s².
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinderModel {
    pub id: String,
    pub doffer_id: String,
    pub sleever_id: String,
    #[serde(default)]
    pub half_mode: bool,
    pub time_wind: u64,
    pub time_exchange: u64,
    pub time_alert: u64,
    pub width: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DofferModel {
    pub id: String,
    pub speed: i64,
    pub acceleration: i64,
    pub time_get_in: u64,
    pub time_put_down: u64,
    pub width: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleeverModel {
    pub id: String,
    pub speed: i64,
    pub acceleration: i64,
    pub time_put_down: u64,
    pub time_prepare: u64,
    pub sleeve_slots: u32,
    pub rings: u32,
    pub width: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpoolerModel {
    pub id: String,
    pub doffer_id: String,
    pub rows: usize,
    pub columns: usize,
    pub cell_width: i64,
    #[serde(default)]
    pub double_sided: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManServiceModel {
    pub id: String,
    pub speed: i64,
    pub time_start_winder: u64,
    pub time_rotate_spooler: u64,
    pub time_change_spooler: u64,
    pub time_load_sleever: u64,
    pub time_cut_edge: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub space_between_winders: i64,
    pub service_zone_width: i64,
    /// Speeds the whole floor up; 0 counts as 1.
    pub time_coefficient: u64,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            space_between_winders: 200,
            service_zone_width: 1000,
            time_coefficient: 1,
        }
    }
}

impl LayoutSettings {
    pub fn coefficient(&self) -> u64 {
        self.time_coefficient.max(1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FloorModels {
    pub winders: Vec<WinderModel>,
    pub doffers: Vec<DofferModel>,
    pub sleevers: Vec<SleeverModel>,
    pub spoolers: Vec<SpoolerModel>,
    pub men: Vec<ManServiceModel>,
    #[serde(default)]
    pub settings: LayoutSettings,
}

impl FloorModels {
    /// Apply the time coefficient k: durations / k, speeds * k,
    /// accelerations * k².
    pub fn scaled(&self) -> FloorModels {
        let k = self.settings.coefficient();
        let ki = k as i64;
        let mut scaled = self.clone();

        for w in scaled.winders.iter_mut() {
            w.time_wind /= k;
            w.time_exchange /= k;
            w.time_alert /= k;
        }
        for d in scaled.doffers.iter_mut() {
            d.speed *= ki;
            d.acceleration *= ki * ki;
            d.time_get_in /= k;
            d.time_put_down /= k;
        }
        for s in scaled.sleevers.iter_mut() {
            s.speed *= ki;
            s.acceleration *= ki * ki;
            s.time_put_down /= k;
            s.time_prepare /= k;
        }
        for m in scaled.men.iter_mut() {
            m.speed *= ki;
            m.time_start_winder /= k;
            m.time_rotate_spooler /= k;
            m.time_change_spooler /= k;
            m.time_load_sleever /= k;
            m.time_cut_edge /= k;
        }
        scaled
    }

    pub fn validate(&self) -> DomainResult<()> {
        unique_ids("winder", self.winders.iter().map(|w| w.id.as_str()))?;
        unique_ids("doffer", self.doffers.iter().map(|d| d.id.as_str()))?;
        unique_ids("sleever", self.sleevers.iter().map(|s| s.id.as_str()))?;
        unique_ids("spooler", self.spoolers.iter().map(|s| s.id.as_str()))?;
        unique_ids("man", self.men.iter().map(|m| m.id.as_str()))?;

        if let Some(w) = self.winders.iter().find(|w| w.time_wind == 0) {
            return Err(invalid(format!("winder {} has no winding time", w.id)));
        }
        if let Some(s) = self.spoolers.iter().find(|s| s.rows == 0 || s.columns == 0) {
            return Err(invalid(format!("spooler {} has an empty grid", s.id)));
        }
        if self.settings.service_zone_width < 0 || self.settings.space_between_winders < 0 {
            return Err(invalid("layout distances must not be negative".to_string()));
        }
        Ok(())
    }
}

fn unique_ids<'a>(kind: &str, ids: impl Iterator<Item = &'a str>) -> DomainResult<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if id.is_empty() {
            return Err(invalid(format!("{} with an empty id", kind)));
        }
        if !seen.insert(id) {
            return Err(invalid(format!("duplicate {} id {}", kind, id)));
        }
    }
    Ok(())
}

fn invalid(reason: String) -> DomainError {
    DomainError::InvalidModel { reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn models() -> FloorModels {
        FloorModels {
            winders: vec![WinderModel {
                id: "W_1".into(),
                doffer_id: "D_1".into(),
                sleever_id: "S_1".into(),
                half_mode: false,
                time_wind: 90_000,
                time_exchange: 500,
                time_alert: 5_000,
                width: 1000,
            }],
            doffers: vec![DofferModel {
                id: "D_1".into(),
                speed: 50,
                acceleration: 10,
                time_get_in: 2_000,
                time_put_down: 2_000,
                width: 1600,
            }],
            settings: LayoutSettings { time_coefficient: 4, ..LayoutSettings::default() },
            ..FloorModels::default()
        }
    }

    #[test]
    fn coefficient_scales_time_speed_and_acceleration() {
        let scaled = models().scaled();
        assert_eq!(scaled.winders[0].time_wind, 22_500);
        assert_eq!(scaled.winders[0].time_exchange, 125);
        assert_eq!(scaled.doffers[0].speed, 200);
        assert_eq!(scaled.doffers[0].acceleration, 160);
        assert_eq!(scaled.doffers[0].time_get_in, 500);
    }

    #[test]
    fn zero_coefficient_counts_as_one() {
        let mut m = models();
        m.settings.time_coefficient = 0;
        assert_eq!(m.scaled().doffers[0].speed, 50);
    }

    #[test]
    fn validation_rejects_duplicates_and_empty_grids() {
        let mut m = models();
        assert!(m.validate().is_ok());
        m.doffers.push(m.doffers[0].clone());
        assert!(matches!(m.validate(), Err(DomainError::InvalidModel { .. })));

        let mut m = models();
        m.spoolers.push(SpoolerModel {
            id: "SP_1".into(),
            doffer_id: "D_1".into(),
            rows: 0,
            columns: 4,
            cell_width: 300,
            double_sided: false,
        });
        assert!(m.validate().is_err());
    }
}
