//! Gmail labeler: keeps "needs reply" and "archived" thread labels in step
//! with read state and age.

pub mod config;
pub mod error;
pub mod gmail;
pub mod labeler;
