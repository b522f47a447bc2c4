//! Unit test modules.

mod chief_scout_test;
mod deficit_test;
mod evaluator_test;
mod staged_thresholds_test;
