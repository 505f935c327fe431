//! Station-day derivations: humidity estimation and weather type labeling

pub mod humidity;
pub mod labeler;

pub use humidity::{estimate_humidity, fahrenheit_to_celsius};
pub use labeler::{label, retain_trainable};
