
#[cfg(test)]
mod tests {
    use crate::event::{EventKind, EVT_BOOT};

    #[test]
    fn test_event_kind_names() {
        assert_eq!(EventKind::Boot.name(), EVT_BOOT);
        assert_eq!(EventKind::Booted.name(), "app.booted");
        assert_eq!(EventKind::BeforeConfig.name(), "config.before");
        assert_eq!(EventKind::AfterConfig.name(), "config.after");
        assert_eq!(EventKind::Custom("cache.warm").name(), "cache.warm");
    }
}
