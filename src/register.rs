//! Notifier and probe registration.

use std::sync::Arc;

use minimon_alert::ConsoleNotifier;
use minimon_core::{NotifierRegistry, ProbeRegistry, RegistryError};
use minimon_notifier_webhook::WebhookNotifier;
use minimon_probe_container::ContainerProbe;
use minimon_probe_filesystem::FilesystemProbe;
use minimon_probe_tcp::TcpProbe;
use minimon_protocols::Notifier;

/// Register every built-in notifier type.
pub(crate) fn register_notifiers(registry: &NotifierRegistry) -> Result<(), RegistryError> {
    registry.register_notifier("console", |_params| {
        Ok(Arc::new(ConsoleNotifier::new()) as Arc<dyn Notifier>)
    })?;
    registry.register_notifier(minimon_notifier_webhook::NOTIFIER_TYPE, WebhookNotifier::factory)?;
    Ok(())
}

/// Register every built-in probe type.
pub(crate) fn register_probes(registry: &ProbeRegistry) -> Result<(), RegistryError> {
    registry.register_probe(minimon_probe_container::PROBE_TYPE, ContainerProbe::factory)?;
    registry.register_probe(minimon_probe_filesystem::PROBE_TYPE, FilesystemProbe::factory)?;
    registry.register_probe(minimon_probe_tcp::PROBE_TYPE, TcpProbe::factory)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_builtin_types() {
        let notifiers = NotifierRegistry::new();
        register_notifiers(&notifiers).unwrap();
        assert_eq!(notifiers.list_types(), vec!["console", "webhook"]);

        let probes = ProbeRegistry::new();
        register_probes(&probes).unwrap();
        assert_eq!(probes.list_types(), vec!["container", "filesystem", "tcp"]);
    }

    #[test]
    fn test_registering_twice_fails() {
        let probes = ProbeRegistry::new();
        register_probes(&probes).unwrap();
        assert!(matches!(
            register_probes(&probes),
            Err(RegistryError::AlreadyRegistered(_))
        ));
    }

    #[test]
    fn test_probe_factories_receive_scrape_interval() {
        let probes = ProbeRegistry::new();
        register_probes(&probes).unwrap();
        let params = serde_json::json!({"mountpoints": ["/"], "rate_threshold_window": "1m"});
        assert!(probes.create("filesystem", &params, Duration::from_secs(60)).is_ok());
        assert!(probes.create("filesystem", &params, Duration::from_secs(120)).is_err());
    }

    #[test]
    fn test_console_factory() {
        let notifiers = NotifierRegistry::new();
        register_notifiers(&notifiers).unwrap();
        let console = notifiers.create("console", &serde_json::json!({})).unwrap();
        assert_eq!(console.name(), "console");
    }
}
