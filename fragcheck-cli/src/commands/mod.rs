//! CLI Commands

pub mod address;
pub mod run;

pub use address::run as address;
pub use run::run;
