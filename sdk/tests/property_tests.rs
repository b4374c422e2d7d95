use proptest::prelude::*;
use sdk::errors::{EngineError, FetchError, QueueError, RegentErrorExt};
use sdk::types::DocumentRef;

// Every error variant yields a static, non-empty hint that never echoes
// the raw error payload back to the user.
proptest! {
    #[test]
    fn test_error_user_hint_completeness(error_str in "[a-z]{8,24}") {
        let errs = vec![
            EngineError::Config(error_str.clone()),
            EngineError::CorpusIndex(error_str.clone()),
            EngineError::PlanningFailure(error_str.clone()),
            EngineError::ProcessingFailure { document: error_str.clone(), reason: error_str.clone() },
            EngineError::Fetch(FetchError::NotFound(error_str.clone())),
            EngineError::Fetch(FetchError::UnsupportedFormat(error_str.clone())),
            EngineError::Queue(QueueError::EmptyQueue),
            EngineError::Secret(error_str.clone()),
            EngineError::ReportWrite(error_str.clone()),
        ];

        for err in errs {
            let hint = err.user_hint();
            prop_assert!(!hint.is_empty());
            prop_assert!(!hint.contains(&error_str));
        }
    }
}

proptest! {
    #[test]
    fn test_document_ref_file_name_is_last_segment(
        dirs in proptest::collection::vec("[a-z0-9_]{1,8}", 0..4),
        stem in "[a-z0-9_]{1,12}",
        ext in "(docx|txt|md|pdf)",
    ) {
        let mut parts = dirs.clone();
        let name = format!("{}.{}", stem, ext);
        parts.push(name.clone());
        let doc = DocumentRef::new(parts.join("/"));

        prop_assert_eq!(doc.file_name(), name.as_str());
        prop_assert_eq!(doc.extension(), Some(ext));
    }
}
