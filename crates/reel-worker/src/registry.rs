//! Template registry.
//!
//! A static lookup table built once at process start from the closed set of
//! template kinds. Descriptor list queries are cached with a TTL since the
//! schema generation behind them is not free.

use std::sync::Mutex;
use std::time::Duration;

use reel_models::{Orientation, TemplateDescriptor, TemplateKind};

use crate::cache::TtlCache;
use crate::error::{WorkerError, WorkerResult};

const LIST_TTL: Duration = Duration::from_secs(60);

/// Filter for descriptor listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListFilter {
    /// Case-insensitive substring match on the display name
    pub name: Option<String>,
    pub orientation: Option<Orientation>,
}

impl ListFilter {
    fn cache_key(&self) -> String {
        format!(
            "{}|{}",
            self.name.as_deref().unwrap_or(""),
            self.orientation.map(|o| o.to_string()).unwrap_or_default()
        )
    }

    fn matches(&self, descriptor: &TemplateDescriptor) -> bool {
        if let Some(name) = &self.name {
            if !descriptor
                .name
                .to_lowercase()
                .contains(&name.to_lowercase())
            {
                return false;
            }
        }
        if let Some(orientation) = self.orientation {
            if descriptor.orientation != orientation {
                return false;
            }
        }
        true
    }
}

/// Read-only template lookup built at warm-up.
pub struct TemplateRegistry {
    descriptors: Vec<TemplateDescriptor>,
    list_cache: Mutex<TtlCache<String, Vec<TemplateDescriptor>>>,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRegistry {
    /// Build the registry from every registered kind.
    pub fn new() -> Self {
        let descriptors = TemplateKind::all().iter().map(|k| k.descriptor()).collect();
        Self {
            descriptors,
            list_cache: Mutex::new(TtlCache::new()),
        }
    }

    /// Resolve a template id to its kind. Unknown ids are a synchronous
    /// error; no job state exists yet at this point.
    pub fn resolve(&self, template_id: &str) -> WorkerResult<TemplateKind> {
        self.descriptors
            .iter()
            .find(|d| d.id == template_id)
            .map(|d| d.kind)
            .ok_or_else(|| WorkerError::unknown_template(template_id))
    }

    /// List descriptors matching `filter`.
    pub fn list(&self, filter: &ListFilter) -> Vec<TemplateDescriptor> {
        let key = filter.cache_key();
        let mut cache = self.list_cache.lock().expect("registry cache poisoned");
        if let Some(hit) = cache.get(&key, LIST_TTL) {
            return hit;
        }

        let result: Vec<TemplateDescriptor> = self
            .descriptors
            .iter()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect();
        cache.insert(key, result.clone());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_and_unknown_ids() {
        let registry = TemplateRegistry::new();
        let id = TemplateKind::ImageStory.id();
        assert_eq!(registry.resolve(&id).unwrap(), TemplateKind::ImageStory);
        assert!(matches!(
            registry.resolve("deadbeef"),
            Err(WorkerError::UnknownTemplate(_))
        ));
    }

    #[test]
    fn test_list_filters_by_orientation_and_name() {
        let registry = TemplateRegistry::new();

        let all = registry.list(&ListFilter::default());
        assert_eq!(all.len(), TemplateKind::all().len());

        let landscape = registry.list(&ListFilter {
            orientation: Some(Orientation::Landscape),
            ..Default::default()
        });
        assert_eq!(landscape.len(), 1);
        assert_eq!(landscape[0].kind, TemplateKind::PlayerCompare);

        let by_name = registry.list(&ListFilter {
            name: Some("image".to_string()),
            ..Default::default()
        });
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].kind, TemplateKind::ImageStory);
    }

    #[test]
    fn test_list_results_are_cached() {
        let registry = TemplateRegistry::new();
        let filter = ListFilter::default();
        let first = registry.list(&filter);
        let second = registry.list(&filter);
        assert_eq!(first.len(), second.len());
        assert_eq!(registry.list_cache.lock().unwrap().len(), 1);
    }
}
