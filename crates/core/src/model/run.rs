use serde::{Deserialize, Serialize};

use crate::error::LoadError;

/// Hierarchical run model handed over by the model interpreter.
///
/// Every field is optional on the wire; malformed or missing values are
/// defaulted here and in the flattener rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunModel {
    pub title: String,
    pub run_id: String,
    pub rf_version: String,
    /// Run start in seconds, if the interpreter knows it.
    pub start_time: Option<f64>,
    /// Run end in seconds; absent while the run is still going.
    pub end_time: Option<f64>,
    pub suites: Vec<RunNode>,
}

impl RunModel {
    /// Decode a run model from JSON bytes.
    pub fn from_json(data: &[u8]) -> Result<Self, LoadError> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Total number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        fn count(node: &RunNode) -> usize {
            1 + node.child_nodes().map(count).sum::<usize>()
        }
        self.suites.iter().map(count).sum()
    }
}

/// Node kind as classified upstream. Absent kinds are inferred by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Suite,
    Test,
    Keyword,
    Generic,
}

/// A suite, test or keyword in the run model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunNode {
    pub kind: Option<NodeKind>,
    pub name: String,
    pub id: Option<String>,
    /// Raw status string (`PASS`, `FAIL`, `SKIP`, `NOT_RUN`, `NOT RUN`).
    pub status: Option<String>,
    /// Start in seconds.
    pub start_time: Option<f64>,
    /// End in seconds; absent for spans still in progress.
    pub end_time: Option<f64>,
    /// Elapsed time in milliseconds, informational only.
    pub elapsed_time: Option<f64>,
    /// Parallel worker that executed this node, inherited by descendants.
    pub worker: Option<String>,
    pub keyword_type: Option<String>,
    /// Keywords of a test.
    pub keywords: Vec<RunNode>,
    /// Child suites/tests of a suite, or nested keywords of a keyword.
    pub children: Vec<RunNode>,
}

impl RunNode {
    /// Children in display order: test keywords first, then nested nodes.
    pub fn child_nodes(&self) -> impl Iterator<Item = &RunNode> {
        self.keywords.iter().chain(self.children.iter())
    }
}
