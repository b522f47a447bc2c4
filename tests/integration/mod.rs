//! Integration test modules.

mod award_flow_test;
mod database_file_test;
mod progress_flow_test;
mod shopping_list_test;
mod staged_badges_test;
