//! JSON output following the Monitoring Plugin Interface.

use serde::Serialize;

use crate::result::MAX_DEPTH;
use crate::{Error, Overall, PartialResult, ServiceState};

#[derive(Debug, Serialize)]
struct OverallOutput {
    mpi_version: u32,
    rc: ServiceState,
    #[serde(skip_serializing_if = "String::is_empty")]
    output: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    partial_results: Vec<PartialResultOutput>,
}

#[derive(Debug, Serialize)]
struct PartialResultOutput {
    rc: ServiceState,
    #[serde(skip_serializing_if = "String::is_empty")]
    output: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    partial_results: Vec<PartialResultOutput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    perfdata: Vec<String>,
}

impl PartialResultOutput {
    fn from_partial(partial: &PartialResult, depth: usize) -> Self {
        let partial_results = if depth < MAX_DEPTH {
            partial
                .children()
                .iter()
                .map(|c| PartialResultOutput::from_partial(c, depth + 1))
                .collect()
        } else {
            Vec::new()
        };

        PartialResultOutput {
            rc: partial.status(),
            output: partial.output().to_owned(),
            partial_results,
            perfdata: partial.perfdata().tokens(),
        }
    }
}

impl Overall {
    /// Serializes the result tree as JSON.
    ///
    /// ```rust
    /// # use checkplugin::{Overall, PartialResult, ServiceState};
    /// let mut overall = Overall::new();
    /// overall.add_subcheck(PartialResult::new("Check1").with_state(ServiceState::Ok));
    ///
    /// assert_eq!(
    ///     overall.to_mpi_json(1).unwrap(),
    ///     r#"{"mpi_version":1,"rc":0,"output":"states: ok=1","partial_results":[{"rc":0,"output":"Check1"}]}"#
    /// );
    /// ```
    pub fn to_mpi_json(&self, version: u32) -> Result<String, Error> {
        let output = OverallOutput {
            mpi_version: version,
            rc: self.status(),
            output: self.summary().to_owned(),
            partial_results: self
                .partial_results()
                .iter()
                .map(|p| PartialResultOutput::from_partial(p, 0))
                .collect(),
        };

        Ok(serde_json::to_string(&output)?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{Overall, PartialResult, Perfdata, ServiceState};

    #[test]
    fn test_mpi_output() {
        let mut overall = Overall::new();
        overall.add_subcheck(
            PartialResult::new("Disks")
                .with_child(
                    PartialResult::new("/var")
                        .with_state(ServiceState::Warning)
                        .with_perfdata(Perfdata::new("var used", 91).with_unit("%")),
                )
                .with_child(PartialResult::new("/home").with_state(ServiceState::Ok)),
        );

        let value: serde_json::Value =
            serde_json::from_str(&overall.to_mpi_json(1).unwrap()).unwrap();

        assert_eq!(
            value,
            json!({
                "mpi_version": 1,
                "rc": 1,
                "output": "states: warning=1",
                "partial_results": [{
                    "rc": 1,
                    "output": "Disks",
                    "partial_results": [
                        {"rc": 1, "output": "/var", "perfdata": ["'var used'=91%"]},
                        {"rc": 0, "output": "/home"}
                    ]
                }]
            })
        );
    }

    #[test]
    fn test_mpi_output_empty() {
        let overall = Overall::new();
        assert_eq!(
            overall.to_mpi_json(1).unwrap(),
            r#"{"mpi_version":1,"rc":3,"output":"No status information"}"#
        );
    }
}
