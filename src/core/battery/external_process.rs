use crate::core::battery::simulator::{
    ElectrochemicalSimulator, HeatGenerationSolution, SimulationRequest, SimulatorError,
};
use serde::Deserialize;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use tracing::{debug, instrument};

/// A simulator run as a separate program.
///
/// The request is written as JSON to the program's standard input. The program answers on
/// standard output with either `{"total_heating": [[...], ...]}` (rows are spatial points,
/// columns are time steps) or `{"error": "..."}` when the solve fails.
#[derive(Clone, Debug)]
pub struct ExternalProcessSimulator {
    program: PathBuf,
    args: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SimulatorResponse {
    Solution { total_heating: Vec<Vec<f64>> },
    Failure { error: String },
}

impl ExternalProcessSimulator {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl ElectrochemicalSimulator for ExternalProcessSimulator {
    #[instrument(skip_all, fields(program = %self.program.display()))]
    fn solve(&self, request: &SimulationRequest) -> Result<HeatGenerationSolution, SimulatorError> {
        let payload = serde_json::to_vec(request)
            .map_err(|e| SimulatorError::MalformedSolution(e.to_string()))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(&payload),
            None => Ok(()),
        };
        let output = child.wait_with_output()?;
        debug!(
            "battery simulator exited with {} ({} bytes of output)",
            output.status,
            output.stdout.len()
        );

        match written {
            // the program stopped reading its request, so its own report says why
            Err(e) if e.kind() == ErrorKind::BrokenPipe => return Err(exit_failure(&output)),
            Err(e) => return Err(e.into()),
            Ok(()) => {}
        }
        if !output.status.success() {
            return Err(exit_failure(&output));
        }

        parse_response(&output.stdout)
    }
}

fn exit_failure(output: &Output) -> SimulatorError {
    SimulatorError::Divergence(format!(
        "simulator exited with {}: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr).trim()
    ))
}

fn parse_response(stdout: &[u8]) -> Result<HeatGenerationSolution, SimulatorError> {
    match serde_json::from_slice::<SimulatorResponse>(stdout) {
        Ok(SimulatorResponse::Solution { total_heating }) => {
            HeatGenerationSolution::new(total_heating)
        }
        Ok(SimulatorResponse::Failure { error }) => Err(SimulatorError::Divergence(error)),
        Err(e) => Err(SimulatorError::MalformedSolution(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn should_parse_solution() {
        let solution =
            parse_response(br#"{"total_heating": [[1.0, 2.0], [3.0, 4.0]]}"#).unwrap();
        assert_eq!(solution.totals_per_time_step(), vec![4., 6.]);
    }

    #[rstest]
    fn should_parse_failure_as_divergence() {
        let result = parse_response(br#"{"error": "Maximum voltage never reached"}"#);
        assert!(matches!(
            result,
            Err(SimulatorError::Divergence(message)) if message == "Maximum voltage never reached"
        ));
    }

    #[rstest]
    fn should_reject_unparsable_output() {
        assert!(matches!(
            parse_response(b"Traceback (most recent call last):"),
            Err(SimulatorError::MalformedSolution(_))
        ));
    }

    #[fixture]
    fn request() -> SimulationRequest {
        SimulationRequest {
            model: "SPMe".to_string(),
            options: Default::default(),
            parameters: Default::default(),
            experiment: crate::core::battery::simulator::Experiment::discharge_rest_charge(1),
        }
    }

    #[rstest]
    fn should_fail_to_launch_missing_program(request: SimulationRequest) {
        let simulator = ExternalProcessSimulator::new("/nonexistent/battery-simulator", vec![]);
        assert!(matches!(
            simulator.solve(&request),
            Err(SimulatorError::Launch(_))
        ));
    }

    #[rstest]
    fn should_report_stderr_when_program_exits_without_reading_request(
        request: SimulationRequest,
    ) {
        let simulator = ExternalProcessSimulator::new(
            "sh",
            vec![
                "-c".to_string(),
                "exec 0<&-; echo solver crashed >&2; exit 3".to_string(),
            ],
        );
        match simulator.solve(&request) {
            Err(SimulatorError::Divergence(message)) => {
                assert!(message.contains("solver crashed"), "{message}");
            }
            other => panic!("expected divergence, got {other:?}"),
        }
    }
}
