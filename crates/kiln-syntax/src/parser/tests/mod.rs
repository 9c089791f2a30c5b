mod grammar;
mod recovery_tests;
