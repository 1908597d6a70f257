use bess_thermal::input::Input;
use schemars::schema_for;

#[test]
fn test_generate_json_schema() {
    let schema = schema_for!(Input);
    let schema = serde_json::to_value(&schema).unwrap();

    let properties = schema["properties"].as_object().unwrap();
    for key in ["Region", "SimulationTime", "SetPoint", "BatterySimulation"] {
        assert!(properties.contains_key(key), "schema has no property {key}");
    }
}
