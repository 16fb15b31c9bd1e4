//! Integrator hooks around export.
//!
//! Hooks run in registration order. Each `before_export` receives the
//! design produced by the previous hook; the final design travels with the
//! rendered image in a [`DesignExport`]. `after_export` observes the finished
//! export and cannot change it.

use printkit_core::Result;

use crate::model::Document;
use crate::scene::ExportedImage;

/// A rendered export together with the design it was produced for
#[derive(Debug, Clone, PartialEq)]
pub struct DesignExport {
    /// The design after every `before_export` hook ran
    pub design: Document,
    pub image: ExportedImage,
}

/// Export extension contributed by an integrator
pub trait ExportHook: Send + Sync {
    fn name(&self) -> &str;

    /// Rewrite the design that accompanies the export. An error aborts the
    /// export.
    fn before_export(&self, design: Document) -> Result<Document> {
        Ok(design)
    }

    fn after_export(&self, _export: &DesignExport) {}
}

/// Ordered list of registered export hooks
#[derive(Default)]
pub struct ExportHooks {
    hooks: Vec<Box<dyn ExportHook>>,
}

impl ExportHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook. Names must be unique; a duplicate is rejected.
    pub fn register(&mut self, hook: Box<dyn ExportHook>) -> bool {
        if self.hooks.iter().any(|h| h.name() == hook.name()) {
            tracing::warn!("Export hook {} is already registered", hook.name());
            return false;
        }
        tracing::debug!("Registered export hook {}", hook.name());
        self.hooks.push(hook);
        true
    }

    /// Remove the hook called `name`. Returns false when none matched.
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.hooks.len();
        self.hooks.retain(|h| h.name() != name);
        self.hooks.len() != before
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Thread `design` through every `before_export` hook
    pub fn run_before(&self, design: Document) -> Result<Document> {
        self.hooks.iter().try_fold(design, |design, hook| {
            hook.before_export(design).inspect_err(|e| {
                tracing::warn!("Export hook {} rejected the export: {}", hook.name(), e)
            })
        })
    }

    pub fn run_after(&self, export: &DesignExport) {
        for hook in &self.hooks {
            hook.after_export(export);
        }
    }
}

impl std::fmt::Debug for ExportHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.hooks.iter().map(|h| h.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::mug_template;
    use printkit_core::Error;

    struct Stamp(&'static str);

    impl ExportHook for Stamp {
        fn name(&self) -> &str {
            self.0
        }

        fn before_export(&self, mut design: Document) -> Result<Document> {
            let trail = design
                .metadata
                .entry("hooks")
                .or_insert_with(|| serde_json::Value::Array(Vec::new()));
            if let Some(list) = trail.as_array_mut() {
                list.push(self.0.into());
            }
            Ok(design)
        }
    }

    struct Veto;

    impl ExportHook for Veto {
        fn name(&self) -> &str {
            "veto"
        }

        fn before_export(&self, _design: Document) -> Result<Document> {
            Err(Error::other("exports are closed"))
        }
    }

    #[test]
    fn test_hooks_run_in_order() {
        let mut hooks = ExportHooks::new();
        assert!(hooks.register(Box::new(Stamp("first"))));
        assert!(hooks.register(Box::new(Stamp("second"))));
        assert!(!hooks.register(Box::new(Stamp("first"))));
        assert_eq!(hooks.len(), 2);

        let design = hooks
            .run_before(Document::for_template(&mug_template()))
            .unwrap();
        assert_eq!(design.metadata["hooks"], serde_json::json!(["first", "second"]));
    }

    #[test]
    fn test_failing_hook_aborts() {
        let mut hooks = ExportHooks::new();
        hooks.register(Box::new(Stamp("first")));
        hooks.register(Box::new(Veto));
        assert!(hooks.run_before(Document::new()).is_err());

        assert!(hooks.unregister("veto"));
        assert!(!hooks.unregister("veto"));
        assert!(hooks.run_before(Document::new()).is_ok());
    }
}
