pub mod hvac_unit;
