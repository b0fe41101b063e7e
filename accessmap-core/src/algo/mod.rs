pub mod circles;
pub mod comparison;
pub mod outline;
pub mod planner;
pub mod stats;
pub mod union;
