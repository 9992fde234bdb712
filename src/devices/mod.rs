//! Equipment models driven by the hourly simulation.

/// Greedy home battery model.
pub mod battery;
/// Solar array output and degradation model.
pub mod panel;

pub use battery::BatteryModel;
pub use panel::{
    CellTemperatureModel, ConstantCellTemperature, NmotCellTemperature, PanelModel, PanelSpec,
};
