//! Report of nodes overriding default values
//!
//! For every field the default record sets, a node either inherits it (field
//! unset) or overrides it with a different value. Fields the default record
//! leaves unset are not compared.

use std::collections::BTreeMap;
use std::fmt;

use super::mapping::NODE_FIELDS;
use super::node::{NodeInfo, NodeSet};

/// A node whose value differs from the default
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Override {
    pub node: String,
    pub field: &'static str,
    pub value: String,
}

/// Result of comparing all nodes against the default record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideReport {
    /// Overridden values, ordered by node then field
    pub overrides: Vec<Override>,
    /// Per field, number of nodes using the default value
    pub inherited: BTreeMap<&'static str, u64>,
}

/// Compare every node against the default record
#[must_use]
pub fn compute_overrides(nodes: &NodeSet, defaults: &NodeInfo) -> OverrideReport {
    let mut report = OverrideReport {
        overrides: Vec::new(),
        inherited: NODE_FIELDS.iter().map(|field| (field.name, 0)).collect(),
    };

    for (node_key, node) in nodes {
        for field in NODE_FIELDS {
            let Some(default_value) = (field.render)(defaults) else {
                continue;
            };
            match (field.render)(node) {
                None => {
                    *report.inherited.entry(field.name).or_default() += 1;
                }
                Some(value) if value != default_value => report.overrides.push(Override {
                    node: node_key.clone(),
                    field: field.name,
                    value,
                }),
                Some(_) => {}
            }
        }
    }

    report
}

impl fmt::Display for OverrideReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for o in &self.overrides {
            writeln!(f, "Overridden {} for {} with value {}", o.field, o.node, o.value)?;
        }
        write!(f, "Nodes affected by the corresponding default values:")?;
        for (field, count) in &self.inherited {
            write!(f, " {field}={count}")?;
        }
        writeln!(f)
    }
}
