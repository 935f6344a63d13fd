use crate::domains::floor::{
    DofferModel, FloorModelSource, FloorModels, LayoutSettings, ManServiceModel, SleeverModel, SpoolerModel,
    WinderModel,
};
use async_trait::async_trait;

/// Built-in demo floor: four doffer groups of five winders, one doffer and
/// one sleever per group, two spoolers per doffer and a single service man.
#[derive(Debug, Clone)]
pub struct SeedFloorSource {
    settings: LayoutSettings,
}

impl Default for SeedFloorSource {
    fn default() -> Self {
        Self::new(LayoutSettings::default())
    }
}

impl SeedFloorSource {
    pub fn new(settings: LayoutSettings) -> Self {
        Self { settings }
    }

    pub fn models(&self) -> FloorModels {
        let exchange_by_group = [500, 300, 1000, 500];
        let winders = (1..=20)
            .map(|i| {
                let group = (i - 1) / 5 + 1;
                WinderModel {
                    id: format!("W_{}", i),
                    doffer_id: format!("D_{}", group),
                    sleever_id: format!("S_{}", group),
                    half_mode: false,
                    time_wind: 90_000,
                    time_exchange: exchange_by_group[group - 1],
                    time_alert: 5_000,
                    width: 1000,
                }
            })
            .collect();

        let doffers = (1..=4)
            .map(|i| DofferModel {
                id: format!("D_{}", i),
                speed: 50,
                acceleration: 10,
                time_get_in: 2_000,
                time_put_down: 2_000,
                width: 1600,
            })
            .collect();

        let sleevers = (1..=4)
            .map(|i| SleeverModel {
                id: format!("S_{}", i),
                speed: 50,
                acceleration: 10,
                time_put_down: 2_500,
                time_prepare: 1_000,
                sleeve_slots: 20,
                rings: 10,
                width: 1600,
            })
            .collect();

        // (doffer, double sided, rows, columns) per pair of spoolers
        let grids = [("D_1", false, 4, 4), ("D_2", true, 4, 3), ("D_3", false, 3, 4), ("D_4", true, 3, 3)];
        let spoolers = (1..=8)
            .map(|i| {
                let (doffer_id, double_sided, rows, columns) = grids[(i - 1) / 2];
                SpoolerModel {
                    id: format!("SP_{}", i),
                    doffer_id: doffer_id.to_string(),
                    rows,
                    columns,
                    cell_width: 300,
                    double_sided,
                }
            })
            .collect();

        let men = vec![ManServiceModel {
            id: "Man_1".to_string(),
            speed: 60,
            time_start_winder: 1_000,
            time_rotate_spooler: 1_500,
            time_change_spooler: 3_000,
            time_load_sleever: 2_000,
            time_cut_edge: 2_000,
        }];

        FloorModels { winders, doffers, sleevers, spoolers, men, settings: self.settings.clone() }
    }
}

#[async_trait]
impl FloorModelSource for SeedFloorSource {
    async fn load_models(&self) -> Result<FloorModels, String> {
        Ok(self.models())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_floor_is_valid() {
        let models = SeedFloorSource::default().models();
        assert!(models.validate().is_ok());
        assert_eq!(models.winders.len(), 20);
        assert_eq!(models.spoolers.len(), 8);
        assert_eq!(models.winders[12].doffer_id, "D_3");
        assert_eq!(models.winders[12].time_exchange, 1000);
        assert!(models.spoolers[2].double_sided);
        assert_eq!((models.spoolers[4].rows, models.spoolers[4].columns), (3, 4));
    }
}
