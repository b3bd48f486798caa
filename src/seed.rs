//! Demo fleet seeding. Lives outside the dispatch core: the registry
//! knows nothing about sample data, `main` injects it when configured.

use rand::Rng;
use tracing::warn;

use crate::engine::fleet::FleetRegistry;
use crate::geo::GeoPoint;
use crate::models::vehicle::VehicleSpec;

// San Francisco bounding box.
const SF_LAT_MIN: f64 = 37.7075;
const SF_LAT_MAX: f64 = 37.8075;
const SF_LNG_MIN: f64 = -122.5125;
const SF_LNG_MAX: f64 = -122.3525;

const DRIVER_NAMES: &[&str] = &[
    "Emily Williams",
    "John Smith",
    "Sarah Davis",
    "Michael Chen",
    "David Brown",
    "Kevin Jones",
    "Lisa Wilson",
    "Robert Lee",
    "Maria Garcia",
    "James Miller",
];

const CAR_MODELS: &[&str] = &[
    "Toyota Prius",
    "Honda Civic",
    "Tesla Model 3",
    "Ford Fusion",
    "Nissan Leaf",
    "Chevrolet Bolt",
    "Hyundai Ioniq",
    "Kia Niro",
    "Toyota Camry",
    "Honda Accord",
];

const NEIGHBORHOODS: &[&str] = &[
    "Downtown",
    "Mission District",
    "SoMa",
    "Marina",
    "North Beach",
    "Castro",
    "Haight-Ashbury",
    "Chinatown",
    "Sunset District",
    "Richmond District",
];

const STREET_NAMES: &[&str] = &[
    "Market St",
    "Valencia St",
    "Van Ness Ave",
    "Mission St",
    "Geary Blvd",
    "Fillmore St",
    "Divisadero St",
    "Columbus Ave",
    "Folsom St",
    "Bryant St",
];

/// Registers `count` random demo vehicles. Plates are sequential so the
/// batch never collides with itself; anything the registry still rejects
/// is logged and skipped. Returns the number actually registered.
pub fn seed_fleet(fleet: &FleetRegistry, count: usize) -> usize {
    let mut rng = rand::thread_rng();
    let mut seeded = 0;

    for i in 0..count {
        let latitude = rng.gen_range(SF_LAT_MIN..SF_LAT_MAX);
        let longitude = rng.gen_range(SF_LNG_MIN..SF_LNG_MAX);
        let street_number = rng.gen_range(100..2000);
        let street = STREET_NAMES[rng.gen_range(0..STREET_NAMES.len())];
        let neighborhood = NEIGHBORHOODS[rng.gen_range(0..NEIGHBORHOODS.len())];
        let label = format!("{street_number} {street}, {neighborhood}, San Francisco");

        let spec = VehicleSpec {
            driver_name: DRIVER_NAMES[rng.gen_range(0..DRIVER_NAMES.len())].to_string(),
            plate: format!("QR{}", 1000 + i),
            model: CAR_MODELS[rng.gen_range(0..CAR_MODELS.len())].to_string(),
            location: GeoPoint::new(latitude, longitude, label),
        };

        match fleet.register(spec) {
            Ok(_) => seeded += 1,
            Err(err) => warn!(error = %err, "skipped seed vehicle"),
        }
    }

    seeded
}
