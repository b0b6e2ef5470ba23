//! The ordered, predicate-gated extractor chain that builds an
//! `ExtractionContext` from an `ExtractionRequest`.

use crate::extraction::extractors;
use crate::extraction::{ExtractionContext, ExtractionContextBuilder, ExtractionRequest};
use tracing::warn;

/// One contributor to the extraction context. `order` places it within the
/// reserved bands documented alongside `default_registry`; `supports`
/// gates whether `extract` runs at all for a given request.
pub trait Extractor: Send + Sync {
    fn id(&self) -> &'static str;
    fn order(&self) -> i32;
    fn supports(&self, request: &ExtractionRequest) -> bool;
    fn extract(&self, request: &ExtractionRequest, builder: &mut ExtractionContextBuilder);
}

/// Holds the ordered, sorted registry of extractors and drives them over a
/// request.
pub struct ExtractorChain {
    extractors: Vec<Box<dyn Extractor>>,
}

impl ExtractorChain {
    pub fn new(mut extractors: Vec<Box<dyn Extractor>>) -> Self {
        extractors.sort_by_key(|e| e.order());
        Self { extractors }
    }

    /// The default registry: one instance of every built-in extractor,
    /// reserved order bands per component design:
    /// 100-199 test structure, 200-299 assertions, 300-399 mocks,
    /// 400-499 hints, 500-599 implementation analysis, 600-699 type
    /// definitions, 700-799 collaborator methods.
    pub fn default_registry() -> Self {
        Self::new(vec![
            Box::new(extractors::test_method::TestMethodExtractor),
            Box::new(extractors::assertions::AssertionExtractor),
            Box::new(extractors::mocks::MockExtractor),
            Box::new(extractors::hints::HintExtractor),
            Box::new(extractors::target_method::TargetMethodExtractor),
            Box::new(extractors::impl_class::ImplClassExtractor),
            Box::new(extractors::type_definitions::TypeDefinitionExtractor),
            Box::new(extractors::collaborator_methods::CollaboratorMethodExtractor),
        ])
    }

    /// Runs every supported extractor, in ascending `order`, against
    /// `request`, and freezes the result. An extractor that panics during
    /// `extract` is not caught here -- only application-level failures
    /// signalled by simply not pushing fragments are "swallowed"; there is
    /// nothing for an infallible `extract` to raise, so the log-and-continue
    /// policy is enforced by each extractor internally (see their module
    /// docs) rather than via `catch_unwind` at this layer.
    pub fn build(&self, request: &ExtractionRequest) -> ExtractionContext {
        let mut builder = ExtractionContextBuilder::new();
        for extractor in &self.extractors {
            if !extractor.supports(request) {
                continue;
            }
            extractor.extract(request, &mut builder);
        }
        builder.build()
    }
}

/// Logs and swallows a recoverable per-extractor failure, matching the
/// propagation policy: one malformed extractor must not deny context from
/// the others.
pub(crate) fn warn_extractor_failure(id: &str, reason: &str) {
    warn!(extractor = id, reason, "extractor failed, continuing");
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counting(std::sync::Arc<std::sync::atomic::AtomicUsize>, i32);
    impl Extractor for Counting {
        fn id(&self) -> &'static str {
            "counting"
        }
        fn order(&self) -> i32 {
            self.1
        }
        fn supports(&self, _r: &ExtractionRequest) -> bool {
            true
        }
        fn extract(&self, _r: &ExtractionRequest, _b: &mut ExtractionContextBuilder) {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    }

    #[test]
    fn runs_extractors_in_ascending_order() {
        let order_log = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        struct Recording(std::sync::Arc<std::sync::Mutex<Vec<i32>>>, i32);
        impl Extractor for Recording {
            fn id(&self) -> &'static str {
                "recording"
            }
            fn order(&self) -> i32 {
                self.1
            }
            fn supports(&self, _r: &ExtractionRequest) -> bool {
                true
            }
            fn extract(&self, _r: &ExtractionRequest, _b: &mut ExtractionContextBuilder) {
                self.0.lock().unwrap().push(self.1);
            }
        }
        let chain = ExtractorChain::new(vec![
            Box::new(Recording(order_log.clone(), 500)),
            Box::new(Recording(order_log.clone(), 100)),
            Box::new(Recording(order_log.clone(), 300)),
        ]);
        let req = ExtractionRequest::default();
        chain.build(&req);
        assert_eq!(*order_log.lock().unwrap(), vec![100, 300, 500]);
    }

    #[test]
    fn skips_unsupported_extractors() {
        let count = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        struct Never;
        impl Extractor for Never {
            fn id(&self) -> &'static str {
                "never"
            }
            fn order(&self) -> i32 {
                1
            }
            fn supports(&self, _r: &ExtractionRequest) -> bool {
                false
            }
            fn extract(&self, _r: &ExtractionRequest, _b: &mut ExtractionContextBuilder) {
                panic!("should not run");
            }
        }
        let chain = ExtractorChain::new(vec![Box::new(Never), Box::new(Counting(count.clone(), 2))]);
        chain.build(&ExtractionRequest::default());
        assert_eq!(count.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
