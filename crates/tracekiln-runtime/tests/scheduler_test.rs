//! Integration tests for pass planning and dispatch ordering driven
//! through a full scheduler run.

use tracekiln_runtime::{RuntimeError, SessionOutcome, SourceCookingScheduler};
use tracekiln_sdk::{CookerPath, DependencyType, ProductionStrategy, RequiredKeys};
use tracekiln_testing::{Journal, RecordingCooker, ScriptedParser, TestRecord};

fn path(id: &str) -> CookerPath {
    CookerPath::source("test", id)
}

fn records(count: u64) -> Vec<TestRecord> {
    (1..=count).map(|id| TestRecord::new(id, "Event")).collect()
}

#[test]
fn test_as_consumed_consumer_sees_each_record_after_producer() {
    let journal = Journal::new();
    let producer = RecordingCooker::new(path("producer"), journal.clone());
    let consumer = RecordingCooker::new(path("consumer"), journal.clone())
        .with_dependency(path("producer"), DependencyType::AsConsumed);

    let result = SourceCookingScheduler::new(ScriptedParser::new("test", records(2)))
        // Attached consumer-first; dispatch order must not care.
        .with_cooker(Box::new(consumer))
        .with_cooker(Box::new(producer))
        .run()
        .unwrap();

    assert_eq!(result.outcome(), SessionOutcome::Completed);
    assert_eq!(result.total_passes(), 1);
    assert_eq!(
        journal.events(),
        [
            "cook producer 1",
            "cook consumer 1",
            "cook producer 2",
            "cook consumer 2",
            "end producer",
            "end consumer",
        ]
    );
}

#[test]
fn test_same_pass_dependency_orders_finalization_only() {
    let journal = Journal::new();
    let producer = RecordingCooker::new(path("producer"), journal.clone())
        .with_production_strategy(ProductionStrategy::EndOfPass);
    let consumer = RecordingCooker::new(path("consumer"), journal.clone())
        .with_dependency(path("producer"), DependencyType::SamePass);

    let result = SourceCookingScheduler::new(ScriptedParser::new("test", records(1)))
        .with_cooker(Box::new(consumer))
        .with_cooker(Box::new(producer))
        .run()
        .unwrap();

    assert_eq!(result.total_passes(), 1);
    journal.assert_order("end producer", "end consumer");
}

#[test]
fn test_end_of_pass_producer_defers_consumer_to_second_pass() {
    let journal = Journal::new();
    let producer = RecordingCooker::new(path("producer"), journal.clone())
        .with_production_strategy(ProductionStrategy::EndOfPass);
    let consumer = RecordingCooker::new(path("consumer"), journal.clone())
        .with_dependency(path("producer"), DependencyType::AsConsumed);

    let parser = ScriptedParser::new("test", records(2));
    let passes = parser.passes_processed();

    let result = SourceCookingScheduler::new(parser)
        .with_cooker(Box::new(producer))
        .with_cooker(Box::new(consumer))
        .run()
        .unwrap();

    assert_eq!(result.total_passes(), 2);
    assert_eq!(result.passes_run(), 2);
    assert_eq!(*passes.lock(), 2);
    // Every producer event, including finalization, precedes the
    // consumer's first record.
    journal.assert_order("end producer", "cook consumer 1");
    assert_eq!(
        journal.events(),
        [
            "cook producer 1",
            "cook producer 2",
            "end producer",
            "cook consumer 1",
            "cook consumer 2",
            "end consumer",
        ]
    );
}

#[test]
fn test_pass_budget_exceeded_fails_before_parsing() {
    let journal = Journal::new();
    let producer = RecordingCooker::new(path("producer"), journal.clone())
        .with_production_strategy(ProductionStrategy::EndOfPass);
    let consumer = RecordingCooker::new(path("consumer"), journal.clone())
        .with_dependency(path("producer"), DependencyType::AsConsumed);

    let parser = ScriptedParser::new("test", records(2)).with_max_passes(1);
    let passes = parser.passes_processed();

    let err = SourceCookingScheduler::new(parser)
        .with_cooker(Box::new(producer))
        .with_cooker(Box::new(consumer))
        .run()
        .unwrap_err();

    assert!(matches!(
        err,
        RuntimeError::SchedulingInfeasible {
            required_passes: 2,
            max_passes: 1,
            ..
        }
    ));
    assert_eq!(*passes.lock(), 0);
    assert!(journal.events().is_empty());
}

#[test]
fn test_prepare_receives_union_of_requested_keys() {
    let journal = Journal::new();
    let loads = RecordingCooker::new(path("loads"), journal.clone())
        .with_required_keys(RequiredKeys::keys(["Load".to_string()]));
    let unloads = RecordingCooker::new(path("unloads"), journal.clone())
        .with_required_keys(RequiredKeys::keys(["Unload".to_string()]));

    let parser = ScriptedParser::new(
        "test",
        vec![
            TestRecord::new(1, "Load"),
            TestRecord::new(2, "Open"),
            TestRecord::new(3, "Unload"),
        ],
    );
    let prepare_calls = parser.prepare_calls();

    SourceCookingScheduler::new(parser)
        .with_cooker(Box::new(loads))
        .with_cooker(Box::new(unloads))
        .run()
        .unwrap();

    let calls = prepare_calls.lock();
    assert_eq!(calls.len(), 1);
    assert!(!calls[0].all_events_consumed);
    assert_eq!(
        calls[0].requested_keys,
        std::collections::BTreeSet::from(["Load".to_string(), "Unload".to_string()])
    );
    drop(calls);

    // The unmatched record never reached either cooker.
    assert_eq!(journal.events(), ["cook loads 1", "cook unloads 3", "end loads", "end unloads"]);
}

#[test]
fn test_all_keys_cooker_turns_off_filtering() {
    let journal = Journal::new();
    let everything = RecordingCooker::new(path("everything"), journal.clone());
    let loads = RecordingCooker::new(path("loads"), journal.clone())
        .with_required_keys(RequiredKeys::keys(["Load".to_string()]));

    let parser = ScriptedParser::new(
        "test",
        vec![TestRecord::new(1, "Load"), TestRecord::new(2, "Open")],
    );
    let prepare_calls = parser.prepare_calls();

    SourceCookingScheduler::new(parser)
        .with_cooker(Box::new(everything))
        .with_cooker(Box::new(loads))
        .run()
        .unwrap();

    let calls = prepare_calls.lock();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].all_events_consumed);
    assert!(calls[0].requested_keys.is_empty());
}
