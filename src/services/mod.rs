pub mod collections;
pub mod history;
pub mod matcher;
pub mod providers;
pub mod recommendations;
pub mod runner;
pub mod watchlist;

pub use runner::run;
