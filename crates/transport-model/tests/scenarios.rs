use transport_model::{
    Conflict, Interpreter, ModelError, Route, SimplexBackend, TransportRequest, TransportResult,
    TransportStatus, solve,
};

const TOL: f64 = 1e-6;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn run(request: &TransportRequest) -> TransportResult {
    init_tracing();
    solve(request, SimplexBackend::new()).expect("request should be valid")
}

fn assert_feasible(request: &TransportRequest, result: &TransportResult) {
    let shipments = result.shipments().expect("optimal result has shipments");
    for (i, &supply) in request.supply.iter().enumerate() {
        let out = shipments.origin_outflow(i);
        assert!(out <= supply + TOL, "origin {i} ships {out} > supply {supply}");
    }
    for (j, &demand) in request.demand.iter().enumerate() {
        let inflow = shipments.destination_inflow(j);
        assert!(inflow >= demand - TOL, "destination {j} receives {inflow} < demand {demand}");
    }
}

#[test]
fn test_two_by_two_reference_plan() {
    let request = TransportRequest::new(
        vec![vec![4.0, 6.0], vec![8.0, 5.0]],
        vec![20.0, 30.0],
        vec![10.0, 15.0],
    );
    let result = run(&request);

    assert_eq!(result.status(), TransportStatus::Optimal);
    let cost = result.total_cost().unwrap();
    assert!((cost - 115.0).abs() < TOL, "cost = {cost} (expected 115)");
    assert!(result.warnings().is_empty(), "{:?}", result.warnings());
    assert_feasible(&request, &result);

    let shipments = result.shipments().unwrap();
    assert!((shipments.get(Route::new(0, 0)) - 10.0).abs() < TOL);
    assert!((shipments.get(Route::new(1, 1)) - 15.0).abs() < TOL);
}

#[test]
fn test_demand_above_supply_is_infeasible() {
    let request = TransportRequest::new(vec![vec![1.0]], vec![5.0], vec![10.0]);
    let result = run(&request);

    assert_eq!(result.status(), TransportStatus::Infeasible);
    assert_eq!(result.total_cost(), None);
    assert!(result.shipments().is_none());
    assert!(!result.is_failure());
}

#[test]
fn test_prohibited_only_route_is_infeasible() {
    let request = TransportRequest::new(vec![vec![1.0]], vec![10.0], vec![10.0]).with_prohibited([(0, 0)]);
    let result = run(&request);

    assert_eq!(result.status(), TransportStatus::Infeasible);
}

#[test]
fn test_capacity_below_minimum_rejected_before_solve() {
    let request = TransportRequest::new(vec![vec![1.0]], vec![10.0], vec![1.0])
        .with_capacities(vec![vec![2.0]])
        .with_minimums(vec![vec![5.0]]);

    let err = solve(&request, SimplexBackend::new()).unwrap_err();
    assert_eq!(
        err,
        ModelError::ConflictingConstraint {
            route: Route::new(0, 0),
            conflict: Conflict::CapacityBelowMinimum {
                capacity: 2.0,
                minimum: 5.0
            }
        }
    );
}

#[test]
fn test_prohibited_route_forces_detour() {
    let request = TransportRequest::new(
        vec![vec![1.0, 5.0], vec![5.0, 1.0]],
        vec![10.0, 10.0],
        vec![5.0, 5.0],
    )
    .with_prohibited([(0, 0)]);
    let result = run(&request);

    assert!(result.is_optimal());
    let shipments = result.shipments().unwrap();
    assert!(shipments.get(Route::new(0, 0)).abs() < TOL);
    assert!((result.total_cost().unwrap() - 30.0).abs() < TOL);
    assert_feasible(&request, &result);
}

#[test]
fn test_minimum_forces_expensive_route() {
    let mut minimums = vec![vec![0.0; 2]; 2];
    minimums[0][1] = 3.0;
    let request = TransportRequest::new(
        vec![vec![1.0, 9.0], vec![9.0, 1.0]],
        vec![10.0, 10.0],
        vec![5.0, 5.0],
    )
    .with_minimums(minimums);
    let result = run(&request);

    assert!(result.is_optimal());
    let shipments = result.shipments().unwrap();
    assert!(shipments.get(Route::new(0, 1)) >= 3.0 - TOL);
    // 5 * 1 + 3 * 9 + 2 * 1
    assert!((result.total_cost().unwrap() - 34.0).abs() < TOL);
    assert_feasible(&request, &result);
}

#[test]
fn test_capacities_can_make_balanced_problem_infeasible() {
    let request = TransportRequest::new(vec![vec![1.0, 1.0]], vec![10.0], vec![5.0, 5.0])
        .with_capacities(vec![vec![5.0, 4.0]]);
    let result = run(&request);

    assert_eq!(result.status(), TransportStatus::Infeasible);
}

#[test]
fn test_capacity_spreads_flow() {
    let request = TransportRequest::new(
        vec![vec![1.0], vec![3.0]],
        vec![10.0, 10.0],
        vec![8.0],
    )
    .with_capacities(vec![vec![5.0], vec![10.0]]);
    let result = run(&request);

    assert!(result.is_optimal());
    let shipments = result.shipments().unwrap();
    assert!((shipments.get(Route::new(0, 0)) - 5.0).abs() < TOL);
    assert!((shipments.get(Route::new(1, 0)) - 3.0).abs() < TOL);
    assert!((result.total_cost().unwrap() - 14.0).abs() < TOL);
}

#[test]
fn test_negative_cost_ships_up_to_supply() {
    // Supply is only a cap, so a profitable route is used beyond demand
    let request = TransportRequest::new(vec![vec![-1.0]], vec![10.0], vec![4.0]);
    let result = run(&request);

    assert!(result.is_optimal());
    assert!((result.shipments().unwrap().get(Route::new(0, 0)) - 10.0).abs() < TOL);
    assert!((result.total_cost().unwrap() + 10.0).abs() < TOL);
}

#[test]
fn test_zero_demand_ships_nothing() {
    let request = TransportRequest::new(vec![vec![2.0, 3.0]], vec![7.0], vec![0.0, 0.0]);
    let result = run(&request);

    assert!(result.is_optimal());
    assert_eq!(result.total_cost(), Some(0.0));
    assert_eq!(result.shipments().unwrap().total_quantity(), 0.0);
}

#[test]
fn test_export_records_cover_every_route() {
    let request = TransportRequest::new(
        vec![vec![4.0, 6.0], vec![8.0, 5.0]],
        vec![20.0, 30.0],
        vec![10.0, 15.0],
    );
    let result = run(&request);

    let records: Vec<_> = result
        .shipments()
        .unwrap()
        .records()
        .into_iter()
        .map(|r| r.one_based())
        .collect();
    let indices: Vec<_> = records.iter().map(|r| (r.origin_index, r.destination_index)).collect();
    assert_eq!(indices, vec![(1, 1), (1, 2), (2, 1), (2, 2)]);
    assert!((records[0].quantity - 10.0).abs() < TOL);
}

#[test]
fn test_independent_solves_share_a_backend_across_threads() {
    init_tracing();
    let interpreter = &Interpreter::new(SimplexBackend::new());
    let requests: Vec<_> = (1..=4)
        .map(|k| {
            let k = k as f64;
            TransportRequest::new(vec![vec![k, 2.0 * k]], vec![10.0 * k], vec![k, k])
        })
        .collect();

    let costs: Vec<f64> = std::thread::scope(|scope| {
        let handles: Vec<_> = requests
            .iter()
            .map(|request| scope.spawn(move || interpreter.solve(request).unwrap()))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap().total_cost().unwrap())
            .collect()
    });

    for (k, cost) in (1..=4).zip(costs) {
        let k = k as f64;
        // k * k + 2k * k
        assert!((cost - 3.0 * k * k).abs() < TOL, "cost = {cost}");
    }
}

#[cfg(feature = "serde")]
#[test]
fn test_request_deserializes_from_json() {
    let json = r#"{
        "costs": [[4, 6], [8, 5]],
        "supply": [20, 30],
        "demand": [10, 15],
        "prohibited": [{"origin": 1, "destination": 0}]
    }"#;
    let request: TransportRequest = serde_json::from_str(json).unwrap();

    assert!(request.capacities.is_none());
    assert_eq!(request.prohibited, Some(vec![Route::new(1, 0)]));
    assert!(run(&request).is_optimal());
}
