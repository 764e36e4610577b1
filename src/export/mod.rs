pub mod dae;
