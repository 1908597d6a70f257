pub mod battery;
pub mod cooling_systems;
pub mod housing;
pub mod thermal_balance;
pub mod units;
