//! Integration tests for leader election, reconfiguration and scheduling.

mod election_test;
mod helpers;
mod reconfigure_test;
mod scheduler_test;
