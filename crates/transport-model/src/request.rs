use std::fmt;

/// A directed origin → destination pair, 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    pub origin: usize,
    pub destination: usize,
}

impl Route {
    pub fn new(origin: usize, destination: usize) -> Self {
        Self { origin, destination }
    }
}

impl From<(usize, usize)> for Route {
    fn from((origin, destination): (usize, usize)) -> Self {
        Self { origin, destination }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.origin, self.destination)
    }
}

/// Everything needed to describe one transportation problem.
///
/// `supply` fixes the number of origins and `demand` the number of
/// destinations; every matrix is indexed `[origin][destination]`. The
/// optional sets are `None` when the caller imposes no such constraint,
/// which is not the same as an all-zero matrix.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransportRequest {
    pub costs: Vec<Vec<f64>>,
    pub supply: Vec<f64>,
    pub demand: Vec<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub capacities: Option<Vec<Vec<f64>>>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub minimums: Option<Vec<Vec<f64>>>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub prohibited: Option<Vec<Route>>,
}

impl TransportRequest {
    pub fn new(costs: Vec<Vec<f64>>, supply: Vec<f64>, demand: Vec<f64>) -> Self {
        Self {
            costs,
            supply,
            demand,
            capacities: None,
            minimums: None,
            prohibited: None,
        }
    }

    pub fn with_capacities(mut self, capacities: Vec<Vec<f64>>) -> Self {
        self.capacities = Some(capacities);
        self
    }

    pub fn with_minimums(mut self, minimums: Vec<Vec<f64>>) -> Self {
        self.minimums = Some(minimums);
        self
    }

    /// Prohibit routes given as `(origin, destination)` pairs.
    pub fn with_prohibited(mut self, routes: impl IntoIterator<Item = (usize, usize)>) -> Self {
        self.prohibited = Some(routes.into_iter().map(Route::from).collect());
        self
    }

    pub fn num_origins(&self) -> usize {
        self.supply.len()
    }

    pub fn num_destinations(&self) -> usize {
        self.demand.len()
    }

    pub fn total_supply(&self) -> f64 {
        self.supply.iter().sum()
    }

    pub fn total_demand(&self) -> f64 {
        self.demand.iter().sum()
    }
}
