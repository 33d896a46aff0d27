pub mod detection;
pub mod input;
pub mod mission;
pub mod motion;
pub mod pose;
