mod board;

pub use board::{DistractionBoard, FocusSummary, FocusTally};
