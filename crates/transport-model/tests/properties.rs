use proptest::prelude::*;
use transport_model::{Route, SimplexBackend, TransportRequest, TransportStatus, solve};

const TOL: f64 = 1e-6;

/// Random instance where total supply always covers total demand.
fn covered_request() -> impl Strategy<Value = TransportRequest> {
    (1usize..=4, 1usize..=4).prop_flat_map(|(m, n)| {
        (
            prop::collection::vec(prop::collection::vec(0u32..20, n), m),
            prop::collection::vec(0u32..15, m),
            prop::collection::vec(0u32..15, n),
        )
            .prop_map(|(costs, supply, demand)| {
                let mut supply: Vec<f64> = supply.into_iter().map(f64::from).collect();
                let demand: Vec<f64> = demand.into_iter().map(f64::from).collect();
                supply[0] += demand.iter().sum::<f64>();
                let costs = costs
                    .into_iter()
                    .map(|row| row.into_iter().map(f64::from).collect())
                    .collect();
                TransportRequest::new(costs, supply, demand)
            })
    })
}

fn recomputed_cost(request: &TransportRequest, shipments: &transport_model::ShipmentMatrix) -> f64 {
    shipments
        .records()
        .iter()
        .map(|r| request.costs[r.origin_index][r.destination_index] * r.quantity)
        .sum()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_covered_demand_is_optimal_and_feasible(request in covered_request()) {
        let result = solve(&request, SimplexBackend::new()).unwrap();
        prop_assert_eq!(result.status(), TransportStatus::Optimal);

        let shipments = result.shipments().unwrap();
        for (i, &supply) in request.supply.iter().enumerate() {
            prop_assert!(shipments.origin_outflow(i) <= supply + TOL);
        }
        for (j, &demand) in request.demand.iter().enumerate() {
            prop_assert!(shipments.destination_inflow(j) >= demand - TOL);
        }
        for record in shipments.records() {
            prop_assert!(record.quantity >= 0.0);
        }
    }

    #[test]
    fn test_total_cost_matches_shipments(request in covered_request()) {
        let result = solve(&request, SimplexBackend::new()).unwrap();
        let cost = result.total_cost().unwrap();
        let recomputed = recomputed_cost(&request, result.shipments().unwrap());

        prop_assert!((cost - recomputed).abs() <= TOL * cost.abs().max(1.0));
        prop_assert!(result.warnings().is_empty());
    }

    #[test]
    fn test_prohibited_route_carries_nothing(
        request in covered_request(),
        pick in (0usize..16, 0usize..16),
    ) {
        let route = Route::new(pick.0 % request.num_origins(), pick.1 % request.num_destinations());
        let request = request.with_prohibited([(route.origin, route.destination)]);
        let result = solve(&request, SimplexBackend::new()).unwrap();

        if let Some(shipments) = result.shipments() {
            prop_assert!(shipments.get(route).abs() <= TOL);
        }
    }

    #[test]
    fn test_minimums_are_respected(
        request in covered_request(),
        pick in (0usize..16, 0usize..16),
        minimum in 0u32..10,
    ) {
        let (m, n) = (request.num_origins(), request.num_destinations());
        let route = Route::new(pick.0 % m, pick.1 % n);
        let minimum = f64::from(minimum);
        let mut minimums = vec![vec![0.0; n]; m];
        minimums[route.origin][route.destination] = minimum;

        let mut request = request.with_minimums(minimums);
        request.supply[route.origin] += minimum;
        let result = solve(&request, SimplexBackend::new()).unwrap();

        prop_assert_eq!(result.status(), TransportStatus::Optimal);
        prop_assert!(result.shipments().unwrap().get(route) >= minimum - TOL);
    }

    #[test]
    fn test_uncovered_demand_is_infeasible(request in covered_request(), extra in 1u32..10) {
        let mut request = request;
        let shortfall = request.total_supply() - request.total_demand() + f64::from(extra);
        request.demand[0] += shortfall;
        let result = solve(&request, SimplexBackend::new()).unwrap();

        prop_assert_eq!(result.status(), TransportStatus::Infeasible);
        prop_assert!(result.shipments().is_none());
    }
}
