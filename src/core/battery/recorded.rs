use crate::core::battery::simulator::{
    ElectrochemicalSimulator, HeatGenerationSolution, SimulationRequest, SimulatorError,
};
use csv::ReaderBuilder as CsvReaderBuilder;
use std::io::Read;
use tracing::debug;

/// Heat generation exported from an earlier simulator run, replayed for every request.
///
/// The CSV has no header; each row is a spatial point and each column a time step. The
/// recording already reflects the ambient temperature it was solved at, so request
/// parameters are not applied.
#[derive(Clone, Debug)]
pub struct RecordedHeatGeneration {
    solution: HeatGenerationSolution,
}

impl RecordedHeatGeneration {
    pub fn from_csv(file: impl Read) -> Result<Self, SimulatorError> {
        let mut reader = CsvReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_reader(file);

        let mut entries = vec![];
        for result in reader.records() {
            let record = result.map_err(|e| SimulatorError::MalformedSolution(e.to_string()))?;
            let row = record
                .iter()
                .map(|value| {
                    value.parse::<f64>().map_err(|_| {
                        SimulatorError::MalformedSolution(format!(
                            "non-numeric heat generation '{value}'"
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            entries.push(row);
        }

        Ok(Self {
            solution: HeatGenerationSolution::new(entries)?,
        })
    }
}

impl ElectrochemicalSimulator for RecordedHeatGeneration {
    fn solve(&self, request: &SimulationRequest) -> Result<HeatGenerationSolution, SimulatorError> {
        debug!(
            "replaying recorded heat generation ({} time steps) for {} model request",
            self.solution.time_steps(),
            request.model
        );
        Ok(self.solution.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::battery::simulator::Experiment;
    use approx::assert_relative_eq;
    use rstest::*;

    #[fixture]
    fn request() -> SimulationRequest {
        SimulationRequest {
            model: "SPMe".to_string(),
            options: Default::default(),
            parameters: Default::default(),
            experiment: Experiment::discharge_rest_charge(3),
        }
    }

    #[rstest]
    fn should_replay_recorded_solution(request: SimulationRequest) {
        let recorded = RecordedHeatGeneration::from_csv("10, 20, 30\n 5, 5, 5\n".as_bytes()).unwrap();
        let solution = recorded.solve(&request).unwrap();
        assert_relative_eq!(solution.mean_total_heating(), 25.);
    }

    #[rstest]
    fn should_reject_non_numeric_recording() {
        assert!(matches!(
            RecordedHeatGeneration::from_csv("10, twenty\n".as_bytes()),
            Err(SimulatorError::MalformedSolution(_))
        ));
    }

    #[rstest]
    fn should_reject_empty_recording() {
        assert!(matches!(
            RecordedHeatGeneration::from_csv("".as_bytes()),
            Err(SimulatorError::Divergence(_))
        ));
    }
}
