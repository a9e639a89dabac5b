pub mod apply;
pub mod check;
pub mod effects;
pub mod graph;
pub mod simulate;
