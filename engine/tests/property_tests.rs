use proptest::prelude::*;
use regent_engine::conductor::{DocumentState, ExplorationTask, RejectReason, Replanner, TaskQueue};
use regent_engine::config::Config;
use regent_engine::corpus::CorpusIndex;
use sdk::types::{DocumentRef, Finding, RelatedDocument};
use std::collections::HashSet;

fn doc(i: usize) -> String {
    format!("doc_{:02}.docx", i)
}

fn finding(source: &DocumentRef, related: &[usize]) -> Finding {
    Finding {
        source: source.clone(),
        review_reason: "seed".to_string(),
        needs_revision: false,
        excerpt: String::new(),
        proposed_revision: String::new(),
        rationale: String::new(),
        related: related
            .iter()
            .map(|i| RelatedDocument::new(doc(*i), "referenced"))
            .collect(),
    }
}

proptest! {
    // Enqueueing the same document any number of times admits it once
    #[test]
    fn test_enqueue_is_idempotent(ids in prop::collection::vec(0usize..8, 1..40)) {
        let mut queue = TaskQueue::new();
        let mut admitted = HashSet::new();

        for i in &ids {
            let fresh = queue.enqueue(ExplorationTask::new(doc(*i), "reason"));
            prop_assert_eq!(fresh, admitted.insert(*i));
        }
        prop_assert_eq!(queue.pending_len(), admitted.len());
    }

    // A full exploration over a random reference graph reviews every
    // document at most once and terminates within |index| iterations.
    #[test]
    fn test_exploration_terminates_without_duplicates(
        size in 1usize..12,
        seeds in prop::collection::vec(0usize..12, 1..6),
        edges in prop::collection::vec(prop::collection::vec(0usize..16, 0..5), 12),
    ) {
        let corpus = CorpusIndex::from_entries((0..size).map(doc));
        let mut queue = TaskQueue::new();
        for s in seeds.iter().filter(|s| **s < size) {
            queue.enqueue(ExplorationTask::new(doc(*s), "seed"));
        }

        let replanner = Replanner::new();
        let mut reviewed = Vec::new();
        let mut iterations = 0;
        while let Ok(task) = queue.dequeue() {
            iterations += 1;
            prop_assert!(iterations <= size);
            prop_assert_eq!(queue.state_of(&task.document), Some(DocumentState::InFlight));

            queue.mark_completed(&task.document).unwrap();
            let index = reviewed.len() % edges.len();
            let outcome = replanner.replan(&finding(&task.document, &edges[index]), &mut queue, &corpus);
            for rejected in &outcome.rejected {
                // Unknown ids are outside the index; everything else was already known
                if rejected.reason != RejectReason::UnknownDocument {
                    prop_assert!(queue.is_known(&DocumentRef::new(rejected.candidate.as_str())));
                }
            }
            reviewed.push(task.document);
        }

        let unique: HashSet<_> = reviewed.iter().collect();
        prop_assert_eq!(unique.len(), reviewed.len());
        prop_assert!(queue.is_drained());
        prop_assert!(reviewed.iter().all(|d| corpus.contains(d)));
    }

    #[test]
    fn test_config_parsing_round_trip(
        log_level in "error|warn|info|debug|trace",
        default_provider in "ollama|openai|anthropic",
        budget in 1u64..=3600,
        max_chars in 1usize..=200_000,
        reflection in any::<bool>(),
    ) {
        let mut config = Config::default_config();
        config.core.log_level = log_level.clone();
        config.llm.default_provider = default_provider.clone();
        config.exploration.time_budget_secs = budget;
        config.exploration.max_document_chars = max_chars;
        config.report.reflection = reflection;

        let serialized = toml::to_string(&config).unwrap();
        let parsed = Config::from_toml_str(&serialized).unwrap();

        prop_assert_eq!(parsed.core.log_level, log_level);
        prop_assert_eq!(parsed.llm.default_provider, default_provider);
        prop_assert_eq!(parsed.exploration.time_budget_secs, budget);
        prop_assert_eq!(parsed.exploration.max_document_chars, max_chars);
        prop_assert_eq!(parsed.report.reflection, reflection);
        prop_assert_eq!(parsed.report.languages, vec!["ja".to_string(), "en".to_string()]);
    }
}
