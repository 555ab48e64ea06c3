//! Property source backed by `systemctl show`.

use std::sync::Arc;

use async_trait::async_trait;

use super::{PropertyKind, PropertySource, PropertyTarget, PropertyValue};
use crate::constants::tools::SYSTEMCTL;
use crate::errors::{GhostError, GhostResult};
use crate::util::{ToolInvocation, ToolRunner};

/// Reads properties with `systemctl show [UNIT] --property=NAME --value`.
pub struct SystemctlPropertySource {
    runner: Arc<dyn ToolRunner>,
}

impl SystemctlPropertySource {
    pub fn new(runner: Arc<dyn ToolRunner>) -> Self {
        Self { runner }
    }

    fn invocation(target: PropertyTarget<'_>, property: &str) -> ToolInvocation {
        let mut invocation = ToolInvocation::new(SYSTEMCTL).arg("show");
        match target {
            PropertyTarget::Unit(unit) | PropertyTarget::Service(unit) => {
                invocation = invocation.arg(unit);
            }
            PropertyTarget::Manager => {}
        }
        invocation
            .arg(format!("--property={}", property))
            .arg("--value")
    }
}

#[async_trait]
impl PropertySource for SystemctlPropertySource {
    async fn get(
        &self,
        target: PropertyTarget<'_>,
        property: &str,
        kind: PropertyKind,
    ) -> GhostResult<PropertyValue> {
        let invocation = Self::invocation(target, property);

        let output = self
            .runner
            .run(&invocation)
            .await
            .and_then(|output| output.require_success(&invocation))
            .map_err(|e| {
                GhostError::Property(format!("Failed to read {} of {}: {}", property, target, e))
            })?;

        let value = PropertyValue::parse(kind, &output.stdout_text()).map_err(|e| {
            GhostError::Property(format!(
                "Failed to decode {} of {} as {:?}: {}",
                property, target, kind, e
            ))
        })?;

        tracing::trace!(%target, property, ?value, "Read property");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeToolRunner, exited};

    #[tokio::test]
    async fn test_unit_property_invocation() {
        let runner = FakeToolRunner::new(|_| Ok(exited(0, "inactive\n")));
        let source = SystemctlPropertySource::new(runner.clone());

        let state = source
            .get_string(PropertyTarget::Unit("boot-animation.service"), "ActiveState")
            .await
            .unwrap();
        assert_eq!(state, "inactive");

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].to_string(),
            "systemctl show boot-animation.service --property=ActiveState --value"
        );
    }

    #[tokio::test]
    async fn test_manager_property_has_no_unit() {
        let runner = FakeToolRunner::new(|_| Ok(exited(0, "0\n")));
        let source = SystemctlPropertySource::new(runner.clone());

        let jobs = source
            .get_u32(PropertyTarget::Manager, "NJobs")
            .await
            .unwrap();
        assert_eq!(jobs, 0);
        assert_eq!(
            runner.calls()[0].args,
            vec!["show", "--property=NJobs", "--value"]
        );
    }

    #[tokio::test]
    async fn test_failed_query_is_property_error() {
        let runner = FakeToolRunner::new(|_| Ok(exited(1, "")));
        let source = SystemctlPropertySource::new(runner);

        let err = source
            .get_u64(PropertyTarget::Service("x.service"), "ExecMainExitTimestampMonotonic")
            .await
            .unwrap_err();
        assert!(matches!(err, GhostError::Property(_)));
    }

    #[tokio::test]
    async fn test_undecodable_value_is_property_error() {
        let runner = FakeToolRunner::new(|_| Ok(exited(0, "soon\n")));
        let source = SystemctlPropertySource::new(runner);

        let err = source
            .get_u64(PropertyTarget::Unit("x.service"), "InactiveEnterTimestampMonotonic")
            .await
            .unwrap_err();
        assert!(matches!(err, GhostError::Property(_)));
    }

    #[tokio::test]
    async fn test_spawn_failure_is_property_error() {
        let runner = FakeToolRunner::new(|_| Err(GhostError::Tool("no systemctl".into())));
        let source = SystemctlPropertySource::new(runner);

        let err = source
            .get_string(PropertyTarget::Unit("default.target"), "ActiveState")
            .await
            .unwrap_err();
        assert!(matches!(err, GhostError::Property(_)));
    }

    #[tokio::test]
    async fn test_signed_properties() {
        let runner = FakeToolRunner::new(|invocation| {
            let value = if invocation.args.iter().any(|arg| arg == "--property=OOMScoreAdjust") {
                "-4\n"
            } else {
                "-9000000000\n"
            };
            Ok(exited(0, value))
        });
        let source = SystemctlPropertySource::new(runner.clone());
        let unit = PropertyTarget::Service("boot-animation.service");

        assert_eq!(source.get_i32(unit, "OOMScoreAdjust").await.unwrap(), -4);
        assert_eq!(
            source.get_i64(unit, "RuntimeMaxDeltaUSec").await.unwrap(),
            -9_000_000_000
        );
        assert!(source.get_i32(unit, "RuntimeMaxDeltaUSec").await.is_err());
        assert_eq!(runner.calls().len(), 3);
    }
}
