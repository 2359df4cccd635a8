pub mod client;

pub use client::ArmClient;
