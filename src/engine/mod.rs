pub mod alerts;
pub mod intake;
pub mod lifecycle;
pub mod sequencing;
