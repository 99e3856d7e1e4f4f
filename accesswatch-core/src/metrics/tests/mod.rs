mod manager_tests;
mod rate_tests;
