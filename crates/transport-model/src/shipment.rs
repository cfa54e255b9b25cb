use crate::request::Route;

/// Dense `origins × destinations` table of resolved shipment quantities.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ShipmentMatrix {
    origins: usize,
    destinations: usize,
    /// Row-major quantities
    quantities: Vec<f64>,
}

/// One row of the flat export table.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShipmentRecord {
    pub origin_index: usize,
    pub destination_index: usize,
    pub quantity: f64,
}

impl ShipmentMatrix {
    pub(crate) fn from_row_major(origins: usize, destinations: usize, quantities: Vec<f64>) -> Self {
        debug_assert_eq!(
            quantities.len(),
            origins * destinations,
            "shipment matrix needs {origins}x{destinations} values"
        );
        Self {
            origins,
            destinations,
            quantities,
        }
    }

    pub fn num_origins(&self) -> usize {
        self.origins
    }

    pub fn num_destinations(&self) -> usize {
        self.destinations
    }

    pub fn get(&self, route: Route) -> f64 {
        self.quantities[route.origin * self.destinations + route.destination]
    }

    /// Rows in origin order. Yields nothing when there are no destinations.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.quantities.chunks(self.destinations.max(1))
    }

    pub fn to_nested(&self) -> Vec<Vec<f64>> {
        self.rows().map(<[f64]>::to_vec).collect()
    }

    /// Total shipped out of origin `i`.
    pub fn origin_outflow(&self, origin: usize) -> f64 {
        (0..self.destinations)
            .map(|j| self.get(Route::new(origin, j)))
            .sum()
    }

    /// Total received by destination `j`.
    pub fn destination_inflow(&self, destination: usize) -> f64 {
        (0..self.origins)
            .map(|i| self.get(Route::new(i, destination)))
            .sum()
    }

    pub fn total_quantity(&self) -> f64 {
        self.quantities.iter().sum()
    }

    /// Every cell as a record, row-major with 0-based indices.
    pub fn records(&self) -> Vec<ShipmentRecord> {
        self.quantities
            .iter()
            .enumerate()
            .map(|(k, &quantity)| ShipmentRecord {
                origin_index: k / self.destinations,
                destination_index: k % self.destinations,
                quantity,
            })
            .collect()
    }
}

impl ShipmentRecord {
    /// Shift both indices to 1-based for display.
    pub fn one_based(self) -> Self {
        Self {
            origin_index: self.origin_index + 1,
            destination_index: self.destination_index + 1,
            quantity: self.quantity,
        }
    }

    pub fn route(&self) -> Route {
        Route::new(self.origin_index, self.destination_index)
    }
}
