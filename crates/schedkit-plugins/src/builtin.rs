//! In-tree plugins that make up the default registry.
//!
//! Their scheduling logic lives elsewhere; here they only decode and validate
//! their arguments so a profile can be checked end to end.

use std::any::Any;
use std::sync::Arc;

use schedkit_common::{Error, Result};
use schedkit_config::{RuntimeObject, decode_into};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::features::{Features, factory_with_features};
use crate::registry::Registry;
use crate::traits::{FrameworkHandle, Plugin};

pub const PRIORITY_SORT: &str = "PrioritySort";
pub const NODE_RESOURCES_FIT: &str = "NodeResourcesFit";
pub const DEFAULT_PREEMPTION: &str = "DefaultPreemption";
pub const TAINT_TOLERATION: &str = "TaintToleration";

/// Gate read by [`DefaultPreemption`].
pub const ASYNC_PREEMPTION: &str = "SchedulerAsyncPreemption";

/// Registry holding every in-tree plugin.
pub fn in_tree_registry(features: &Features) -> Result<Registry> {
    let mut registry = Registry::new();
    registry.register(PRIORITY_SORT, PrioritySort::new)?;
    registry.register(NODE_RESOURCES_FIT, NodeResourcesFit::new)?;
    registry.register(TAINT_TOLERATION, TaintToleration::new)?;
    registry.register_factory(
        DEFAULT_PREEMPTION,
        Arc::new(factory_with_features(
            features.clone(),
            DefaultPreemption::new,
        )),
    )?;
    Ok(registry)
}

/// Orders the queue by pod priority. Takes no arguments.
#[derive(Debug)]
pub struct PrioritySort;

impl PrioritySort {
    pub fn new(
        _args: Option<&dyn RuntimeObject>,
        _handle: &dyn FrameworkHandle,
    ) -> Result<Box<dyn Plugin>> {
        Ok(Box::new(Self))
    }
}

impl Plugin for PrioritySort {
    fn name(&self) -> &str {
        PRIORITY_SORT
    }
}

#[derive(Debug)]
pub struct TaintToleration;

impl TaintToleration {
    pub fn new(
        _args: Option<&dyn RuntimeObject>,
        _handle: &dyn FrameworkHandle,
    ) -> Result<Box<dyn Plugin>> {
        Ok(Box::new(Self))
    }
}

impl Plugin for TaintToleration {
    fn name(&self) -> &str {
        TAINT_TOLERATION
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoringStrategy {
    LeastAllocated,
    MostAllocated,
    RequestedToCapacityRatio,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceWeight {
    pub name: String,
    pub weight: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeResourcesFitArgs {
    #[serde(default = "default_strategy")]
    pub scoring_strategy: ScoringStrategy,

    #[serde(default = "default_resources")]
    pub resources: Vec<ResourceWeight>,

    #[serde(default)]
    pub ignored_resources: Vec<String>,
}

impl Default for NodeResourcesFitArgs {
    fn default() -> Self {
        Self {
            scoring_strategy: default_strategy(),
            resources: default_resources(),
            ignored_resources: Vec::new(),
        }
    }
}

fn default_strategy() -> ScoringStrategy {
    ScoringStrategy::LeastAllocated
}

fn default_resources() -> Vec<ResourceWeight> {
    vec![
        ResourceWeight {
            name: "cpu".to_string(),
            weight: 1,
        },
        ResourceWeight {
            name: "memory".to_string(),
            weight: 1,
        },
    ]
}

impl NodeResourcesFitArgs {
    pub fn validate(&self) -> Result<()> {
        if self.resources.is_empty() {
            return Err(Error::plugin(
                NODE_RESOURCES_FIT,
                "resources must not be empty",
            ));
        }
        for resource in &self.resources {
            if resource.name.is_empty() {
                return Err(Error::plugin(NODE_RESOURCES_FIT, "resource name is empty"));
            }
            if !(1..=100).contains(&resource.weight) {
                return Err(Error::plugin(
                    NODE_RESOURCES_FIT,
                    format!(
                        "resource {} weight {} is not in range [1, 100]",
                        resource.name, resource.weight
                    ),
                ));
            }
        }
        Ok(())
    }
}

// Lets callers hand over args built in code instead of a raw blob.
impl RuntimeObject for NodeResourcesFitArgs {
    fn kind(&self) -> &str {
        "NodeResourcesFitArgs"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct NodeResourcesFit {
    args: NodeResourcesFitArgs,
}

impl NodeResourcesFit {
    pub fn new(
        args: Option<&dyn RuntimeObject>,
        _handle: &dyn FrameworkHandle,
    ) -> Result<Box<dyn Plugin>> {
        let typed = args.and_then(|obj| obj.as_any().downcast_ref::<NodeResourcesFitArgs>());
        let fit_args = match typed {
            Some(typed) => typed.clone(),
            None => {
                let mut decoded = NodeResourcesFitArgs::default();
                decode_into(args, &mut decoded)?;
                decoded
            }
        };
        fit_args.validate()?;
        debug!(strategy = ?fit_args.scoring_strategy, "built {}", NODE_RESOURCES_FIT);
        Ok(Box::new(Self { args: fit_args }))
    }

    pub fn args(&self) -> &NodeResourcesFitArgs {
        &self.args
    }
}

impl Plugin for NodeResourcesFit {
    fn name(&self) -> &str {
        NODE_RESOURCES_FIT
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultPreemptionArgs {
    pub min_candidate_nodes_percentage: u32,
    pub min_candidate_nodes_absolute: u32,
}

impl Default for DefaultPreemptionArgs {
    fn default() -> Self {
        Self {
            min_candidate_nodes_percentage: 10,
            min_candidate_nodes_absolute: 100,
        }
    }
}

impl DefaultPreemptionArgs {
    pub fn validate(&self) -> Result<()> {
        if self.min_candidate_nodes_percentage > 100 {
            return Err(Error::plugin(
                DEFAULT_PREEMPTION,
                format!(
                    "min_candidate_nodes_percentage {} is not in range [0, 100]",
                    self.min_candidate_nodes_percentage
                ),
            ));
        }
        if self.min_candidate_nodes_percentage == 0 && self.min_candidate_nodes_absolute == 0 {
            return Err(Error::plugin(
                DEFAULT_PREEMPTION,
                "min_candidate_nodes_percentage and min_candidate_nodes_absolute cannot both be zero",
            ));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct DefaultPreemption {
    args: DefaultPreemptionArgs,
    async_preemption: bool,
}

impl DefaultPreemption {
    pub fn new(
        args: Option<&dyn RuntimeObject>,
        _handle: &dyn FrameworkHandle,
        features: &Features,
    ) -> Result<Box<dyn Plugin>> {
        let mut preemption_args = DefaultPreemptionArgs::default();
        decode_into(args, &mut preemption_args)?;
        preemption_args.validate()?;
        Ok(Box::new(Self {
            args: preemption_args,
            async_preemption: features.is_enabled(ASYNC_PREEMPTION),
        }))
    }

    pub fn args(&self) -> &DefaultPreemptionArgs {
        &self.args
    }

    pub fn async_preemption(&self) -> bool {
        self.async_preemption
    }
}

impl Plugin for DefaultPreemption {
    fn name(&self) -> &str {
        DEFAULT_PREEMPTION
    }
}
