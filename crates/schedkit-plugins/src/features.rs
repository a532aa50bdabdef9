use std::collections::BTreeSet;

use schedkit_common::Result;
use schedkit_config::{RuntimeObject, SchedulerProfile};

use crate::traits::{FrameworkHandle, Plugin, PluginFactory, factory_fn};

/// Feature gates enabled for a scheduler instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Features {
    enabled: BTreeSet<String>,
}

impl Features {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_profile(profile: &SchedulerProfile) -> Self {
        Self {
            enabled: profile.enabled_feature_gates(),
        }
    }

    pub fn with(mut self, gate: impl Into<String>) -> Self {
        self.enabled.insert(gate.into());
        self
    }

    pub fn is_enabled(&self, gate: &str) -> bool {
        self.enabled.contains(gate)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.enabled.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Features {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            enabled: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Adapt a factory that also needs feature gates into a plain [`PluginFactory`].
pub fn factory_with_features<F>(features: Features, f: F) -> impl PluginFactory + 'static
where
    F: Fn(Option<&dyn RuntimeObject>, &dyn FrameworkHandle, &Features) -> Result<Box<dyn Plugin>>
        + Send
        + Sync
        + 'static,
{
    factory_fn(move |args, handle| f(args, handle, &features))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::BasicHandle;

    #[derive(Debug)]
    struct Gated(bool);

    impl Plugin for Gated {
        fn name(&self) -> &str {
            if self.0 { "gated-on" } else { "gated-off" }
        }
    }

    fn build(features: Features) -> String {
        let factory = factory_with_features(features, |_, _, fts| {
            Ok(Box::new(Gated(fts.is_enabled("Fast"))) as Box<dyn Plugin>)
        });
        factory
            .create(None, &BasicHandle::new("p"))
            .unwrap()
            .name()
            .to_string()
    }

    #[test]
    fn adapter_closes_over_feature_set() {
        assert_eq!(build(Features::new().with("Fast")), "gated-on");
        assert_eq!(build(Features::new()), "gated-off");
    }

    #[test]
    fn features_follow_profile_gates() {
        let mut profile = SchedulerProfile::default();
        profile.feature_gates.insert("Fast".into(), true);
        profile.feature_gates.insert("Slow".into(), false);
        let features = Features::from_profile(&profile);
        assert!(features.is_enabled("Fast"));
        assert!(!features.is_enabled("Slow"));
        assert_eq!(features.iter().collect::<Vec<_>>(), vec!["Fast"]);
    }

    #[test]
    fn collects_from_names() {
        let features: Features = ["A", "B"].into_iter().collect();
        assert!(features.is_enabled("A") && features.is_enabled("B"));
    }
}
