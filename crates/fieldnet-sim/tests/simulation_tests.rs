use fieldnet_sim::{run_scenario, sweep, Scenario, Simulation, SimulationError};
use fieldnet_wire::Position;

#[test]
fn test_reference_deployment_collects_the_sensor() {
    let report = run_scenario(Scenario::default()).unwrap();

    assert_eq!(report.sensors_delivered, 1);
    assert_eq!(report.sensors_pending, 0);
    assert_eq!(report.coordinator_total, 1);

    // Ids: sensor 0, surveyor 1, coordinator 2.
    let surveyor = report.surveyor(1).unwrap();
    assert_eq!(surveyor.sensor_count, 1);
    assert!(surveyor.assigned);
    assert!(surveyor.retired);
    assert!(report.messages_delivered > 0);
    assert!(report.messages_sent > 0);
}

#[test]
fn test_too_short_run_collects_nothing() {
    let scenario = Scenario {
        duration: 5.0,
        ..Scenario::default()
    };
    let report = run_scenario(scenario).unwrap();

    assert_eq!(report.sensors_delivered, 0);
    assert_eq!(report.sensors_pending, 1);
    assert_eq!(report.coordinator_total, 0);
    let surveyor = report.surveyor(1).unwrap();
    assert!(surveyor.assigned);
    assert!(!surveyor.retired);
}

#[test]
fn test_colliding_surveyors_form_a_tree() {
    let scenario = Scenario {
        surveyors: vec![Position::new(0.0, 0.0, 0.0), Position::new(0.0, 0.0, 0.0)],
        ..Scenario::default()
    };
    let report = run_scenario(scenario).unwrap();

    // Ids: sensor 0, surveyors 1 and 2, coordinator 3.
    let root = report.surveyor(1).and_then(|s| s.label.clone()).unwrap();
    let child = report.surveyor(2).and_then(|s| s.label.clone()).unwrap();
    assert!(root.is_root());
    assert!(root.is_child(2));
    assert_eq!(root.weight, 2);
    assert_eq!(child.parent, Some(1));
    assert_eq!(child.depth, 1);

    // The packet is counted exactly once across the pair.
    assert_eq!(report.sensors_delivered, 1);
    assert_eq!(report.coordinator_total, 1);
}

#[test]
fn test_out_of_range_sensor_is_never_found() {
    let scenario = Scenario {
        sensors: vec![Position::new(250.0, 250.0, 0.0)],
        ..Scenario::default()
    };
    let report = run_scenario(scenario).unwrap();

    assert_eq!(report.sensors_delivered, 0);
    assert_eq!(report.sensors_pending, 1);
    assert_eq!(report.coordinator_total, 0);
    assert!(report.surveyor(1).is_some_and(|s| s.retired));
}

#[test]
fn test_same_seed_same_run() {
    let scenario = Scenario {
        random_sensors: 6,
        seed: 11,
        ..Scenario::default()
    };
    let a = run_scenario(scenario.clone()).unwrap();
    let b = run_scenario(scenario).unwrap();

    assert_eq!(a.sensors_delivered, b.sensors_delivered);
    assert_eq!(a.coordinator_total, b.coordinator_total);
    assert_eq!(a.messages_sent, b.messages_sent);
    assert_eq!(a.messages_delivered, b.messages_delivered);
}

#[test]
fn test_coordinator_total_matches_surveyor_counts() {
    let scenario = Scenario {
        random_sensors: 10,
        ..Scenario::default()
    };
    for seed in 0..4 {
        let report = run_scenario(Scenario {
            seed,
            ..scenario.clone()
        })
        .unwrap();
        assert!(report.coordinator_total <= report.sensors_delivered as u64);
        let collected: u64 = report.surveyors.iter().map(|s| s.sensor_count).sum();
        assert_eq!(report.coordinator_total, collected);
        assert_eq!(report.sensors_delivered + report.sensors_pending, 11);
    }
}

#[test]
fn test_sweep_reports_every_seed_in_order() {
    let scenario = Scenario {
        random_sensors: 3,
        ..Scenario::default()
    };
    let report = sweep(&scenario, &[0, 1, 2, 3]).unwrap();

    let seeds: Vec<u64> = report.runs.iter().map(|run| run.seed).collect();
    assert_eq!(seeds, vec![0, 1, 2, 3]);
    assert_eq!(report.summary.runs, 4);

    let mean = report
        .runs
        .iter()
        .map(|run| run.report.sensors_delivered as f64)
        .sum::<f64>()
        / 4.0;
    assert!((report.summary.mean_delivered - mean).abs() < 1e-9);
}

#[test]
fn test_empty_sweep_has_zero_means() {
    let report = sweep(&Scenario::default(), &[]).unwrap();
    assert_eq!(report.summary.runs, 0);
    assert_eq!(report.summary.mean_delivered, 0.0);
}

#[test]
fn test_invalid_scenarios_are_rejected() {
    let no_surveyors = Scenario {
        surveyors: Vec::new(),
        ..Scenario::default()
    };
    assert!(matches!(
        Simulation::new(no_surveyors),
        Err(SimulationError::NoSurveyors)
    ));

    let frozen = Scenario {
        speed: 0.0,
        ..Scenario::default()
    };
    assert!(matches!(
        run_scenario(frozen),
        Err(SimulationError::OutOfRange { field: "speed", .. })
    ));
}

#[test]
fn test_scenario_file_overrides_only_what_it_names() {
    let scenario = Scenario::from_json(r#"{"duration": 120, "sensors": [[10, 20, 0]]}"#).unwrap();
    assert_eq!(scenario.duration, 120.0);
    assert_eq!(scenario.sensors, vec![Position::new(10.0, 20.0, 0.0)]);
    assert_eq!(scenario.coordinator, Position::new(15.0, 15.0, 0.0));
    assert_eq!(scenario.protocol.range, 50.0);

    let err = Scenario::from_json(r#"{"protocol": {"range": -1}}"#).unwrap_err();
    assert!(matches!(err, SimulationError::Config(_)));
}
