pub mod cycle_routes;
pub mod target_routes;
