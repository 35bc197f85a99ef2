//! Integration tests for BenchmarkService with a deterministic clock.

use std::sync::Arc;
use std::time::Duration;

use rstest::rstest;

use closure_tree::application::report::{Reporter, AGGREGATE_HEADER};
use closure_tree::application::services::{BenchmarkOptions, BenchmarkService};
use closure_tree::domain::{AggregateConfig, DeleteMode, DomainError, Metric, TreeShape};
use closure_tree::util::testing::{init_test_setup, StepClock};

fn service(step_ms: u64, options: BenchmarkOptions) -> BenchmarkService<StepClock> {
    BenchmarkService::with_clock(StepClock::new(Duration::from_millis(step_ms)), options)
}

#[test]
fn given_uniform_tree_when_benchmarked_then_every_node_sampled() {
    init_test_setup();
    let service = service(2, BenchmarkOptions::default());

    let run = service.run(&TreeShape::uniform(2, 3)).unwrap();

    assert_eq!(run.creation.node_count, 15);
    assert_eq!(run.creation.closure_table_size, 49);
    assert_eq!(run.creation.depth, 3);
    assert!((run.creation.creation_ms - 2.0).abs() < 1e-9);
    assert_eq!(
        run.aggregate.config(),
        AggregateConfig {
            node_count: 15,
            generations: 3,
            closure_table_size: 49
        }
    );
    assert_eq!(run.aggregate.len(), 15);
    for metric in Metric::ALL {
        assert!((run.aggregate.average_by(metric) - 2.0).abs() < 1e-9);
    }
    assert_eq!(run.aggregate.deletion_ms(), Some(2.0));
}

#[test]
fn given_equal_timings_when_min_max_then_first_sample_wins() {
    let run = service(1, BenchmarkOptions::default())
        .run(&TreeShape::uniform(3, 2))
        .unwrap();

    let first = &run.aggregate.samples()[0];
    assert_eq!(first.node().label, "0");
    assert_eq!(first.node().depth, 0);
    for metric in Metric::ALL {
        assert_eq!(run.aggregate.min_by(metric), Some(first));
        assert_eq!(run.aggregate.max_by(metric), Some(first));
    }
}

#[test]
fn given_samples_when_listed_then_creation_order_with_depths() {
    let run = service(1, BenchmarkOptions::default())
        .run(&TreeShape::uniform(2, 2))
        .unwrap();

    let depths: Vec<usize> = run.aggregate.samples().iter().map(|s| s.node().depth).collect();
    assert_eq!(depths, vec![0, 1, 1, 2, 2, 2, 2]);
}

#[test]
fn given_deletion_not_measured_when_rendered_then_last_field_empty() {
    let options = BenchmarkOptions {
        measure_deletion: false,
        ..Default::default()
    };
    let run = service(1, options).run(&TreeShape::uniform(2, 1)).unwrap();

    let record = Reporter::new().aggregate_record(&run.aggregate);

    assert_eq!(run.aggregate.deletion_ms(), None);
    assert_eq!(record.split(';').count(), AGGREGATE_HEADER.split(';').count());
    assert_eq!(record, "3;1;5;1,000;1,000;1,000;1,000;1,000;1,000;1,000;1,000;1,000;");
}

#[test]
fn given_recorded_deletion_when_recorded_again_then_rejected() {
    let mut run = service(1, BenchmarkOptions::default())
        .run(&TreeShape::uniform(1, 1))
        .unwrap();

    assert_eq!(
        run.aggregate.record_deletion(5.0),
        Err(DomainError::DeletionAlreadyRecorded)
    );
    assert_eq!(run.aggregate.deletion_ms(), Some(1.0));
}

#[rstest]
#[case(DeleteMode::Cascade)]
#[case(DeleteMode::PromoteChildren)]
fn given_delete_mode_when_benchmarked_then_deletion_timed(#[case] delete_mode: DeleteMode) {
    let options = BenchmarkOptions {
        delete_mode,
        ..Default::default()
    };
    let run = service(3, options).run(&TreeShape::uniform(2, 2)).unwrap();
    assert_eq!(run.aggregate.deletion_ms(), Some(3.0));
}

#[test]
fn given_step_clock_when_run_then_two_readings_per_timing() {
    let clock = Arc::new(StepClock::new(Duration::from_millis(1)));
    let service = BenchmarkService::with_clock(Arc::clone(&clock), BenchmarkOptions::default());

    service.run(&TreeShape::uniform(2, 1)).unwrap();

    // creation + three queries on each of 3 nodes + deletion
    assert_eq!(clock.readings(), 2 * (1 + 3 * 3 + 1));
}

#[rstest]
#[case(false)]
#[case(true)]
fn given_several_shapes_when_run_all_then_order_preserved(#[case] parallel: bool) {
    let options = BenchmarkOptions {
        parallel,
        ..Default::default()
    };
    let shapes = vec![
        TreeShape::uniform(2, 3),
        TreeShape::uniform(3, 1),
        TreeShape::uniform(1, 4),
    ];

    let runs = service(1, options).run_all(&shapes).unwrap();

    let sizes: Vec<usize> = runs.iter().map(|r| r.creation.node_count).collect();
    assert_eq!(sizes, vec![15, 4, 5]);
    let run_shapes: Vec<TreeShape> = runs.into_iter().map(|r| r.shape).collect();
    assert_eq!(run_shapes, shapes);
}

#[test]
fn given_invalid_shape_in_batch_when_run_all_then_fails_before_running() {
    let shapes = vec![TreeShape::uniform(2, 2), TreeShape::uniform(0, 2)];

    let err = service(1, BenchmarkOptions::default())
        .run_all(&shapes)
        .unwrap_err();

    assert!(matches!(err.as_domain(), Some(DomainError::InvalidShape(_))));
}
